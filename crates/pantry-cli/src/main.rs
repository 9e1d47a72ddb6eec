mod config;
mod consumption_cmds;
mod item_cmds;
mod plan_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use pantry_core::{InventoryLedger, PgStore};
use pantry_db::pool;

use config::PantryConfig;

#[derive(Parser)]
#[command(name = "pantry", about = "Personal pantry ledger and meal-planning wizard")]
struct Cli {
    /// Database URL (overrides PANTRY_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Whose pantry to operate on (overrides PANTRY_OWNER env var)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a pantry config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/pantry")]
        db_url: String,
        /// Default owner id
        #[arg(long = "owner-id", default_value = config::DEFAULT_OWNER)]
        owner_id: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the pantry database (requires config file or env vars)
    DbInit,
    /// Inventory management
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Stock the pantry with the built-in demo basket
    Seed,
    /// Record eating part of one item
    Eat {
        /// Item ID to eat from
        item_id: i64,
        /// Grams or millilitres eaten
        quantity: f64,
        /// Log label (defaults to the item name)
        #[arg(long)]
        label: Option<String>,
        /// Informational magnitude, e.g. kcal
        #[arg(long)]
        magnitude: Option<f64>,
    },
    /// Show the consumption log, newest first
    Log {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Show per-day consumption totals
    Report {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Plan meals interactively from what is in the pantry
    Plan {
        /// Number of days to plan
        #[arg(long, default_value_t = 1)]
        days: usize,
        /// Comma-separated meal slots (e.g. "Lunch,Dinner")
        #[arg(long, value_delimiter = ',', default_value = "Lunch,Dinner")]
        slots: Vec<String>,
        /// Candidates to request per meal
        #[arg(long, default_value_t = 3)]
        count: usize,
        /// Free-text dietary preferences forwarded to the suggester
        #[arg(long)]
        preferences: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add an item
    Add {
        /// Item name
        name: String,
        /// Grams or millilitres
        quantity: f64,
        /// meat, dairy, vegetables, fruit, shelf_stable, other, or any label
        #[arg(long, default_value = "other")]
        category: String,
        /// Purchase date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        added_at: Option<NaiveDate>,
    },
    /// List live items, oldest purchase first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Apply edited quantities, e.g. `12=350 15=0` (0 removes the item)
    Edit {
        /// ID=QUANTITY pairs
        #[arg(required = true, value_parser = item_cmds::parse_edited_row)]
        rows: Vec<pantry_core::EditedRow>,
    },
    /// Delete one item
    Delete {
        /// Item ID to delete
        item_id: i64,
    },
    /// Delete every item
    DiscardAll {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },
}

/// Execute the `pantry init` command: write config file.
fn cmd_init(db_url: &str, owner_id: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        owner: config::OwnerSection {
            id: owner_id.to_string(),
        },
        suggest: config::SuggestSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  owner.id = {owner_id}");
    println!(
        "  suggest.command = {} {}",
        cfg.suggest.command,
        cfg.suggest.args.join(" ")
    );
    println!();
    println!("Next: run `pantry db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `pantry db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &PantryConfig) -> anyhow::Result<()> {
    println!("Initializing pantry database...");

    let created = pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;
    let summary = pool::summarize(&db_pool).await?;
    db_pool.close().await;

    info!(created, items = summary.items, "database initialized");
    if created {
        println!("Created an empty pantry database.");
    } else {
        println!(
            "Database ready: {} item(s) and {} log entries across {} owner(s).",
            summary.items, summary.log_entries, summary.owners
        );
    }
    println!("pantry db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Init {
        db_url,
        owner_id,
        force,
    } = &cli.command
    {
        return cmd_init(db_url, owner_id, *force);
    }

    let resolved = PantryConfig::resolve(cli.database_url.as_deref(), cli.owner.as_deref())?;
    if let Commands::DbInit = cli.command {
        return cmd_db_init(&resolved).await;
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let ledger = InventoryLedger::new(Arc::new(PgStore::new(db_pool.clone())));
    let owner = resolved.owner_id.as_str();
    debug!(owner, db = ?resolved.db_config.database_name(), "connected");

    let result = match cli.command {
        Commands::Init { .. } | Commands::DbInit => Ok(()),
        Commands::Item { command } => item_cmds::run_item_command(command, &ledger, owner).await,
        Commands::Seed => item_cmds::cmd_seed(&ledger, owner).await,
        Commands::Eat {
            item_id,
            quantity,
            label,
            magnitude,
        } => {
            consumption_cmds::cmd_eat(&ledger, owner, item_id, quantity, label.as_deref(), magnitude)
                .await
        }
        Commands::Log { since, until } => {
            consumption_cmds::cmd_log(&ledger, owner, since, until).await
        }
        Commands::Report { since, until } => {
            consumption_cmds::cmd_report(&ledger, owner, since, until).await
        }
        Commands::Plan {
            days,
            slots,
            count,
            preferences,
        } => {
            let options = plan_cmd::PlanOptions {
                days,
                slots,
                count,
                preferences,
            };
            let suggester = Arc::new(resolved.suggest.suggester());
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            plan_cmd::run_plan(&ledger, suggester, owner, options, &mut input, &mut output).await
        }
    };

    db_pool.close().await;
    result
}
