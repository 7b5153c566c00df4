//! org-lifecycle: AWS Organizations member-account lifecycle CLI
//!
//! Subcommands map onto the two engine entry points. The structured
//! result is printed to stdout as a single JSON document; all progress
//! and diagnostics go to stderr so callers can split the two streams.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use org_lifecycle_cli::config::{CliOverrides, Config};
use org_lifecycle_cli::engine::{self, ClosureTarget};

#[derive(Parser, Debug)]
#[command(name = "org-lifecycle")]
#[command(about = "Member-account lifecycle management for AWS Organizations")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the create-account command
#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Name for the new account
    account_name: String,

    /// Path to config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Use a specific email address (skips the shared counter)
    #[arg(long)]
    email: Option<String>,

    /// AWS profile for the management account
    #[arg(long)]
    mgmt_profile: Option<String>,

    /// AWS profile for the automation account
    #[arg(long)]
    automation_profile: Option<String>,

    /// Role ARN for the management account (alternative to a profile)
    #[arg(long)]
    management_role_arn: Option<String>,

    /// Role ARN for the automation account (alternative to a profile)
    #[arg(long)]
    automation_role_arn: Option<String>,

    /// Override target OU name
    #[arg(long)]
    ou_name: Option<String>,

    /// Target OU ID (bypasses the name lookup)
    #[arg(long, conflicts_with = "ou_name")]
    ou_id: Option<String>,

    /// Show the plan without making changes
    #[arg(long)]
    dry_run: bool,
}

/// Arguments for the close-account command
#[derive(clap::Args, Debug)]
#[command(group = ArgGroup::new("target").required(true).args(["account_id", "email", "all"]))]
struct CloseArgs {
    /// Account ID to close
    #[arg(long)]
    account_id: Option<String>,

    /// Close the account matching this email address
    #[arg(long)]
    email: Option<String>,

    /// Close ALL member accounts (interactive confirmation required)
    #[arg(long)]
    all: bool,

    /// Path to config file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// AWS profile for the management account
    #[arg(long)]
    mgmt_profile: Option<String>,

    /// Role ARN for the management account (alternative to a profile)
    #[arg(long)]
    management_role_arn: Option<String>,

    /// Show what would be closed without closing
    #[arg(long)]
    dry_run: bool,

    /// Return after the close request without polling
    #[arg(long)]
    no_wait: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new member account
    CreateAccount(CreateArgs),

    /// Close a member account, or all member accounts
    CloseAccount(CloseArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    }
}

async fn run() -> Result<()> {
    // Diagnostics on stderr; stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::CreateAccount(create) => {
            let config = Config::load(&create.config)?.merge_overrides(CliOverrides {
                management_role_arn: create.management_role_arn,
                automation_role_arn: create.automation_role_arn,
                mgmt_profile: create.mgmt_profile,
                automation_profile: create.automation_profile,
                ou_name: create.ou_name,
                ou_id: create.ou_id,
                email: create.email,
            });
            config.validate_for_create()?;

            let record = engine::run_create(&config, &create.account_name, create.dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Command::CloseAccount(close) => {
            let config = Config::load(&close.config)?.merge_overrides(CliOverrides {
                management_role_arn: close.management_role_arn,
                mgmt_profile: close.mgmt_profile,
                ..CliOverrides::default()
            });
            config.validate_for_close()?;

            let target = if close.all {
                ClosureTarget::All
            } else if let Some(email) = close.email {
                ClosureTarget::Email(email)
            } else {
                let id = close
                    .account_id
                    .context("One of --account-id, --email, or --all is required")?;
                ClosureTarget::AccountId(id)
            };
            let bulk = matches!(target, ClosureTarget::All);

            let outcomes = engine::run_close(&config, target, close.dry_run, close.no_wait).await?;

            if bulk {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                let outcome = outcomes.first().context("No closure outcome produced")?;
                println!("{}", serde_json::to_string_pretty(outcome)?);
            }

            let failed = outcomes.iter().filter(|o| o.is_failure()).count();
            if failed > 0 {
                anyhow::bail!("{failed} account(s) failed to close");
            }
            Ok(())
        }
    }
}
