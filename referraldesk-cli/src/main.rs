//! Main entry point for the ReferralDesk CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::{ClientConfig, LogFormat};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt};
use url::Url;

mod commands;
mod console;

/// ReferralDesk CLI
#[derive(Parser)]
#[command(name = "referraldesk")]
#[command(about = "Command-line interface for the ReferralDesk member app", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (optional)
    #[arg(
        long,
        short,
        global = true,
        help = "Path to the configuration file (config.yaml, config.json or config.toml). If not provided, defaults will be used."
    )]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(
        long,
        global = true,
        help = "Base URL of the ReferralDesk API (e.g., https://api.referraldesk.in/api/)"
    )]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the ReferralDesk CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login(commands::session::LoginArgs),
    /// Sign out and remove the stored token
    Logout,
    /// Show whether a session is active and who it belongs to
    Status,
    /// Register a new member (contact, personal and payment sections)
    Register(commands::register::RegisterArgs),
    /// Show or edit the member profile
    Profile(commands::profile::ProfileArgs),
    /// Submit KYC documents
    Kyc(commands::kyc::KycArgs),
    /// Update nominee details
    Nominee(commands::nominee::NomineeArgs),
    /// Change the account password
    Password,
    /// Show referral totals
    Dashboard,
    /// List referred members or referral income
    Referrals(commands::referrals::ReferralsArgs),

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(
            long,
            short,
            help = "The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)"
        )]
        shell: clap_complete::Shell,
    },

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml, json or toml). Defaults to yaml.
        #[arg(
            long,
            short,
            help = "Format of the configuration file to generate (yaml, json or toml). Defaults to yaml."
        )]
        format: Option<String>,
    },
}

/// Initializes the tracing subscriber. Logs go to stderr so command output
/// stays pipeable.
fn initialize_tracing(config: &ClientConfig) {
    let default_level = config
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::WARN);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    });

    let fmt_builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if matches!(config.log_format, LogFormat::Json) {
        fmt_builder.json().with_ansi(false).init();
    } else {
        fmt_builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // Commands that never touch the API do not need a resolved config.
    match cli.command {
        Commands::Completion { shell } => {
            commands::completion::generate_completion(shell);
            return Ok(());
        }
        Commands::Config { format } => {
            let format = format.unwrap_or_else(|| "yaml".to_string());
            return commands::config::generate_config(&format);
        }
        _ => {}
    }

    let config = ClientConfig::load_config(cli.config, cli.base_url)?;
    initialize_tracing(&config);
    let ctx = commands::AppContext::new(config)?;

    match cli.command {
        Commands::Login(args) => commands::session::login(&ctx, args).await,
        Commands::Logout => commands::session::logout(&ctx),
        Commands::Status => commands::session::status(&ctx).await,
        Commands::Register(args) => commands::register::register(&ctx, args).await,
        Commands::Profile(args) => commands::profile::run(&ctx, args).await,
        Commands::Kyc(args) => commands::kyc::submit(&ctx, args).await,
        Commands::Nominee(args) => commands::nominee::update(&ctx, args).await,
        Commands::Password => commands::password::change(&ctx).await,
        Commands::Dashboard => commands::referrals::dashboard(&ctx).await,
        Commands::Referrals(args) => commands::referrals::run(&ctx, args).await,
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}
