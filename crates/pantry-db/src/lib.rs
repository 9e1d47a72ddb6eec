//! Persistence layer for the pantry: connection config, pool management,
//! embedded migrations, row models and query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
