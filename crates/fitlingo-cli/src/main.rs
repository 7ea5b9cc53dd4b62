mod config;
mod generate_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use fitlingo_core::generator::GeminiClient;
use fitlingo_core::{PgUserStore, PlanGenerator};
use fitlingo_db::config::DbConfig;
use fitlingo_db::pool;
use fitlingo_db::queries::users;

use config::FitlingoConfig;

#[derive(Parser)]
#[command(name = "fitlingo", about = "Personalized workout plan backend")]
struct Cli {
    /// Database URL (overrides FITLINGO_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a fitlingo config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Gemini API key
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the fitlingo database and run migrations
    DbInit,
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 5000)]
        port: u16,
    },
    /// Generate a plan for a profile JSON file and print it
    Generate {
        /// Path to the profile JSON file
        file: PathBuf,
        /// Print the prompt without calling the generator
        #[arg(long)]
        prompt_only: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            force,
        } => {
            cmd_init(&db_url, api_key, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = FitlingoConfig::resolve(cli.database_url.as_deref());
            let client = GeminiClient::new(resolved.gemini_config()?);
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let state = serve_cmd::AppState {
                store: Arc::new(PgUserStore::new(db_pool.clone())),
                planner: PlanGenerator::with_model(Arc::new(client), &resolved.model),
            };
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Generate { file, prompt_only } => {
            let resolved = FitlingoConfig::resolve(cli.database_url.as_deref());
            generate_cmd::run_generate(&resolved, &file, prompt_only).await?;
        }
    }

    Ok(())
}

/// Execute the `fitlingo init` command: write config file.
fn cmd_init(db_url: &str, api_key: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        generator: config::GeneratorSection {
            api_key,
            ..Default::default()
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if has_key {
        println!("  generator.api_key = (set)");
    } else {
        println!(
            "  generator.api_key not set; export {} before `fitlingo serve`.",
            config::API_KEY_ENV
        );
    }
    println!();
    println!("Next: run `fitlingo db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `fitlingo db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = FitlingoConfig::resolve(cli_db_url);

    println!("Initializing fitlingo database...");

    // 1. Create the database if it does not exist.
    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!(
            "Created database {}.",
            resolved.db_config.database_name().unwrap_or_default()
        );
    }

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Report what is already there.
    let count = users::count_users(&db_pool).await?;
    println!("Database ready. users: {count} rows");

    db_pool.close().await;

    println!("fitlingo db-init complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn parses_serve_defaults() {
        let cli = Cli::try_parse_from(["fitlingo", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind, "127.0.0.1");
                assert_eq!(port, 5000);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn parses_global_database_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fitlingo",
            "db-init",
            "--database-url",
            "postgresql://h:5432/x",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("postgresql://h:5432/x"));
        assert!(matches!(cli.command, Commands::DbInit));
    }

    #[test]
    fn parses_generate_with_prompt_only() {
        let cli =
            Cli::try_parse_from(["fitlingo", "generate", "me.json", "--prompt-only"]).unwrap();
        match cli.command {
            Commands::Generate { file, prompt_only } => {
                assert_eq!(file.to_str(), Some("me.json"));
                assert!(prompt_only);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn init_defaults_to_local_database() {
        let cli = Cli::try_parse_from(["fitlingo", "init"]).unwrap();
        match cli.command {
            Commands::Init {
                db_url,
                api_key,
                force,
            } => {
                assert_eq!(db_url, "postgresql://localhost:5432/fitlingo");
                assert!(api_key.is_none());
                assert!(!force);
            }
            _ => panic!("expected init"),
        }
    }
}
