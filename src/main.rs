use std::process::ExitCode;

use tracing::{error, info};

use dreamboard::{BoardRepository, CommentRepository, Config, Database, UserRepository};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = dreamboard::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        dreamboard::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    info!("Dreamboard - bulletin board storage");

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> dreamboard::Result<()> {
    let db = Database::open_with_config(&config.database).await?;
    let schema_version = db.schema_version().await?;
    info!(schema_version, "Database ready at {}", config.database.path);

    let users = UserRepository::new(&db).count().await?;
    let boards = BoardRepository::new(&db).count().await?;
    let comments = CommentRepository::new(&db).count().await?;
    info!(users, boards, comments, "Storage statistics");

    db.close().await;
    Ok(())
}
