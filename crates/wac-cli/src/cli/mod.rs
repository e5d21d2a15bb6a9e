//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use wac_core::config::{self, paths};
use wac_core::validation::ReminderForm;

mod commands;

const LOG_FILE: &str = "wac.log";
const LOG_ENV: &str = "WAC_LOG";

#[derive(Parser)]
#[command(name = "wac")]
#[command(version)]
#[command(about = "WAC reminders client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL from config
    #[arg(long, global = true, env = "WAC_API_URL", value_name = "URL")]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create an account (does not log in)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "WAC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Defaults to the password
        #[arg(long)]
        password_confirmation: Option<String>,
    },

    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "WAC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Drop the stored session
    Logout,

    /// Show the logged-in user
    Profile,

    /// Show the navigation bar, optionally resolving a route
    Nav {
        /// Client route to resolve (e.g. /reminders/3)
        #[arg(value_name = "ROUTE")]
        route: Option<String>,
    },

    /// Manage reminders
    Reminders {
        #[command(subcommand)]
        command: ReminderCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ReminderCommands {
    /// List your reminders
    List,
    /// Create a reminder
    Add {
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long)]
        city: String,
        /// Location coordinates (e.g. "20.67,-103.35")
        #[arg(long = "coordinates", value_name = "COORDS")]
        location_coordinates: String,
    },
    /// Delete a reminder
    Delete {
        #[arg(value_name = "ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Persist the API base URL
    SetApiUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to `$WAC_HOME/logs/wac.log`; stdout stays clean for command output.
fn init_logging() -> Option<WorkerGuard> {
    let dir = paths::logs_dir();
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, api_url } = cli;

    // Config commands never need a loaded config or a session.
    let app = || -> Result<commands::App> {
        let config = config::Config::load()
            .context("load config")?
            .with_api_url(api_url.clone());
        commands::App::build(config)
    };

    match command {
        Commands::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            commands::auth::register(&app()?, &name, &email, password, password_confirmation)
                .await
        }
        Commands::Login { email, password } => {
            commands::auth::login(&app()?, &email, password).await
        }
        Commands::Logout => commands::auth::logout(&app()?),
        Commands::Profile => {
            commands::auth::profile(&app()?);
            Ok(())
        }
        Commands::Nav { route } => {
            commands::auth::nav(&app()?, route.as_deref());
            Ok(())
        }
        Commands::Reminders { command } => match command {
            ReminderCommands::List => commands::reminders::list(&app()?).await,
            ReminderCommands::Add {
                description,
                date,
                time,
                city,
                location_coordinates,
            } => {
                let form = ReminderForm {
                    description,
                    date,
                    time,
                    city,
                    location_coordinates,
                };
                commands::reminders::add(&app()?, &form).await
            }
            ReminderCommands::Delete { id } => commands::reminders::delete(&app()?, id).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetApiUrl { url } => commands::config::set_api_url(&url),
        },
    }
}
