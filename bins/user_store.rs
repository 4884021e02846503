use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info};

use configs::AppConfig;
use models::user::NewUser;
use service::readiness::{wait_until_ready, ReadinessPolicy};
use service::store::StoreClient;
use service::user_service::UserService;

#[derive(Parser)]
#[command(name = "user-store", about = "User records on a key-value store")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml", env = "CONFIG_PATH")]
    config: String,

    /// Emit JSON logs instead of compact text
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait until the store accepts commands
    Ping(PingArgs),
    #[command(flatten)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a user and print it as JSON
    Create(CreateArgs),
    /// Print a user as JSON
    Get { id: String },
    /// Delete a user; prints whether it existed
    Delete { id: String },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
}

#[derive(Args)]
struct PingArgs {
    #[arg(long, default_value_t = 5)]
    attempts: u32,
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

fn init_logging(json: bool) {
    if json {
        common::utils::logging::init_logging_json();
    } else {
        common::utils::logging::init_logging_default();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cfg = AppConfig::load_and_validate(&cli.config)?;
    let store = Arc::new(StoreClient::new(&cfg.store));

    let command = match cli.command {
        Command::Ping(args) => {
            let policy = ReadinessPolicy::new(args.attempts, Duration::from_millis(args.interval_ms));
            wait_until_ready(&store, &policy).await?;
            store.disconnect().await;
            println!("PONG");
            return Ok(ExitCode::SUCCESS);
        }
        Command::User(command) => command,
    };

    store.connect().await?;
    let users = UserService::new(store.clone());
    let outcome = execute(&users, command).await;
    store.disconnect().await;
    outcome
}

async fn execute(users: &UserService, command: UserCommand) -> anyhow::Result<ExitCode> {
    match command {
        UserCommand::Create(args) => {
            let user = users.create(NewUser::new(args.username, args.email)).await?;
            info!(event = "user_created", user_id = %user.id, "user created");
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserCommand::Get { id } => match users.find_by_id(&id).await? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => {
                eprintln!("user {id} not found");
                return Ok(ExitCode::FAILURE);
            }
        },
        UserCommand::Delete { id } => {
            let deleted = users.delete_by_id(&id).await?;
            println!("{deleted}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env first so CONFIG_PATH, RUST_LOG and REDIS_* take effect
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(event = "command_failed", error = %e, "user-store command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
