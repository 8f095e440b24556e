mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use newsdesk_core::config::NewsdeskConfig;
use newsdesk_core::session::{SessionState, SessionStatus};
use newsdesk_core::window::{Window, today_in};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::commands::Context;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Browse newsroom events by day or as a filterable table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show events as one column per day
    Grid {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days")]
        to: Option<String>,

        /// Number of days to show (1-7)
        #[arg(short, long)]
        days: Option<u32>,

        /// Keep redrawing, revalidating through the cache
        #[arg(short, long)]
        watch: bool,
    },
    /// Show events as a table
    List {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days")]
        to: Option<String>,

        /// Number of days to show (1-7)
        #[arg(short, long)]
        days: Option<u32>,

        /// Only show rows whose column has one of the values, e.g. "section=Sport,Kultur"
        #[arg(short, long = "filter", value_name = "COLUMN=VALUES")]
        filters: Vec<String>,
    },
    /// List table columns and the values they can be filtered by
    Columns,
    /// Store an access token issued by the newsroom identity provider
    Auth {
        /// Access token
        #[arg(long)]
        token: String,

        /// Token lifetime (e.g. "8h"), unbounded if omitted
        #[arg(long)]
        expires_in: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Print the config file location
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Grid {
            from,
            to,
            days,
            watch,
        } => {
            let config = load_config()?;
            let Some(session) = require_session(&config)? else {
                return Ok(());
            };
            let ctx = Context::new(&config, session)?;
            let window = resolve_window(&ctx, from.as_deref(), to.as_deref(), days)?;
            commands::grid::run(&ctx, window, watch).await
        }
        Commands::List {
            from,
            to,
            days,
            filters,
        } => {
            let config = load_config()?;
            let Some(session) = require_session(&config)? else {
                return Ok(());
            };
            let ctx = Context::new(&config, session)?;
            let window = resolve_window(&ctx, from.as_deref(), to.as_deref(), days)?;
            commands::list::run(&ctx, window, &filters).await
        }
        Commands::Columns => commands::list::columns(&load_config()?),
        Commands::Auth { token, expires_in } => {
            commands::auth::login(&load_config()?, &token, expires_in.as_deref())
        }
        Commands::Logout => commands::auth::logout(&load_config()?),
        // Reports the location without reading it, so a broken file can still be found
        Commands::Config => {
            println!("{}", NewsdeskConfig::config_path()?.display());
            Ok(())
        }
    }
}

fn load_config() -> Result<NewsdeskConfig> {
    let config = NewsdeskConfig::load()?;
    init_tracing(&config.log_level);
    Ok(config)
}

/// Logs go to stderr so they never mix with rendered views.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Views are only shown to signed-in users. Anyone else gets a hint and
/// nothing is fetched.
fn require_session(config: &NewsdeskConfig) -> Result<Option<SessionState>> {
    let state = SessionState::load(&config.session_path())?;

    match state.status {
        SessionStatus::Authenticated => Ok(Some(state)),
        SessionStatus::Loading | SessionStatus::Unauthenticated => {
            println!(
                "{}\n\n\
                Sign in to the newsroom and store your access token with:\n  \
                newsdesk auth --token <TOKEN>",
                "Not signed in.".bold()
            );
            Ok(None)
        }
    }
}

fn resolve_window(
    ctx: &Context,
    from: Option<&str>,
    to: Option<&str>,
    days: Option<u32>,
) -> Result<Window> {
    let tz = ctx.registry.time_zone;
    Ok(Window::from_args(from, to, days, tz, today_in(tz))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    // dirs resolves the config directory from XDG_CONFIG_HOME on linux only
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn config_path_is_printed_even_when_config_is_broken() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("newsdesk");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), "index_url = [unterminated").unwrap();

        // SAFETY: no other test in this crate reads the config directory
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };

        let config = Cli::try_parse_from(["newsdesk", "config"]).unwrap();
        assert!(run(config).await.is_ok());

        let logout = Cli::try_parse_from(["newsdesk", "logout"]).unwrap();
        assert!(run(logout).await.is_err());
    }
}
