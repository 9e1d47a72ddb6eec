pub mod consumption_log;
pub mod items;
