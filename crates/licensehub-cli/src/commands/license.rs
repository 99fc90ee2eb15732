//! License management CLI commands.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use licensehub_core::config::StoreBackend;
use licensehub_core::error::AppError;
use licensehub_core::traits::SystemClock;
use licensehub_core::types::PageRequest;
use licensehub_database::LicenseStoreDispatch;
use licensehub_entity::license::{License, MAX_ALLOTTED_SECONDS};
use licensehub_entity::order::quote::SECONDS_PER_HOUR;
use licensehub_service::LicenseManager;
use licensehub_service::license::LicenseTokenSigner;

use crate::output::{self, OutputFormat};

/// Arguments for license commands
#[derive(Debug, Args)]
pub struct LicenseArgs {
    /// License subcommand
    #[command(subcommand)]
    pub command: LicenseCommand,
}

/// License subcommands
#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Grant a wall-clock license
    Grant {
        /// Recipient e-mail
        #[arg(short, long)]
        email: String,
        /// Length in hours (at most one year)
        #[arg(
            long,
            conflicts_with = "seconds",
            required_unless_present = "seconds",
            value_parser = clap::value_parser!(u32).range(1..=8760)
        )]
        hours: Option<u32>,
        /// Length in seconds (at most one year)
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_ALLOTTED_SECONDS))]
        seconds: Option<i64>,
    },
    /// Show one license
    Show {
        /// License key
        key: String,
    },
    /// List licenses, newest first
    List {
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u64,
        /// Items per page
        #[arg(long, default_value = "25")]
        per_page: u64,
    },
    /// Revoke a license
    Revoke {
        /// License key
        key: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Count licenses by status
    Stats,
}

/// One license in CLI output.
#[derive(Debug, Serialize, Tabled)]
struct LicenseRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Order")]
    order_id: String,
    #[tabled(rename = "Issued")]
    issued_at: String,
}

impl LicenseRow {
    fn new(license: &License, now: DateTime<Utc>) -> Self {
        Self {
            key: license.key.clone(),
            email: license.email.clone(),
            kind: license.kind.to_string(),
            status: license.effective_status(now).to_string(),
            remaining: format_seconds(license.remaining_seconds(now)),
            order_id: license.order_id.clone(),
            issued_at: license.issued_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Execute license commands
pub async fn execute(
    args: &LicenseArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    if config.license.store == StoreBackend::Memory {
        output::print_warning(
            "license.store is \"memory\"; changes made here are not visible to a running server",
        );
    }

    let db = licensehub_api::app::connect_database(&config).await?;
    let store = Arc::new(LicenseStoreDispatch::from_config(&config, db.as_ref())?);
    let tokens = LicenseTokenSigner::from_config(&config.token)?;
    let manager = LicenseManager::new(store, Arc::new(SystemClock), config.license.clone())
        .with_tokens(tokens);

    let result = run(&manager, &args.command, format).await;

    if let Some(db) = db {
        db.close().await;
    }
    result
}

async fn run(
    manager: &LicenseManager,
    command: &LicenseCommand,
    format: OutputFormat,
) -> Result<(), AppError> {
    match command {
        LicenseCommand::Grant {
            email,
            hours,
            seconds,
        } => {
            let duration = grant_duration(*hours, *seconds)?;
            let license = manager.grant(email, duration).await?;
            output::print_success(&format!("Granted license {}", license.key));
            output::print_item(&LicenseRow::new(&license, manager.now()), format);
            if let Some(token) = manager.token_for(&license)? {
                output::print_kv("Token", &token);
            }
        }
        LicenseCommand::Show { key } => {
            let license = manager.get(key).await?;
            output::print_item(&LicenseRow::new(&license, manager.now()), format);
        }
        LicenseCommand::List { page, per_page } => {
            let now = manager.now();
            let result = manager.list(PageRequest::new(*page, *per_page)).await?;
            let rows: Vec<LicenseRow> = result
                .items
                .iter()
                .map(|l| LicenseRow::new(l, now))
                .collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                println!(
                    "Page {} of {} ({} licenses)",
                    result.page,
                    result.total_pages.max(1),
                    result.total_items
                );
            }
        }
        LicenseCommand::Revoke { key, force } => {
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Revoke license {key}? The holder loses access immediately."))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let license = manager.revoke(key).await?;
            output::print_success(&format!("License {} is {}", license.key, license.status));
        }
        LicenseCommand::Stats => {
            let stats = manager.stats().await?;
            match format {
                OutputFormat::Table => {
                    println!("Licenses ({}):", manager.backend());
                    output::print_kv("Total", &stats.total.to_string());
                    output::print_kv("Active", &stats.active.to_string());
                    output::print_kv("Expired", &stats.expired.to_string());
                    output::print_kv("Revoked", &stats.revoked.to_string());
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&stats)?;
                    println!("{json}");
                }
            }
        }
    }

    Ok(())
}

fn grant_duration(hours: Option<u32>, seconds: Option<i64>) -> Result<Duration, AppError> {
    let total = match (hours, seconds) {
        (Some(h), _) => i64::from(h) * SECONDS_PER_HOUR,
        (None, Some(s)) => s,
        (None, None) => return Err(AppError::validation("--hours or --seconds is required")),
    };
    Duration::try_seconds(total).ok_or_else(|| AppError::validation("Grant length is out of range"))
}

/// `3725` -> `1h 2m 5s`.
fn format_seconds(total: i64) -> String {
    let total = total.max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "0s");
        assert_eq!(format_seconds(59), "59s");
        assert_eq!(format_seconds(61), "1m 1s");
        assert_eq!(format_seconds(3725), "1h 2m 5s");
        assert_eq!(format_seconds(-4), "0s");
    }

    #[test]
    fn test_grant_duration() {
        assert_eq!(grant_duration(Some(2), None).unwrap(), Duration::hours(2));
        assert_eq!(grant_duration(None, Some(90)).unwrap(), Duration::seconds(90));
        assert!(grant_duration(None, None).is_err());
        assert!(grant_duration(None, Some(i64::MAX)).is_err());
    }

    #[test]
    fn test_grant_length_is_bounded_at_parse_time() {
        use clap::Parser;

        #[derive(Debug, Parser)]
        struct Harness {
            #[command(subcommand)]
            command: LicenseCommand,
        }

        assert!(
            Harness::try_parse_from(["t", "grant", "-e", "a@example.com", "--hours", "8760"]).is_ok()
        );
        assert!(
            Harness::try_parse_from(["t", "grant", "-e", "a@example.com", "--hours", "8761"]).is_err()
        );
        assert!(
            Harness::try_parse_from([
                "t",
                "grant",
                "-e",
                "a@example.com",
                "--seconds",
                "10000000000000"
            ])
            .is_err()
        );
    }
}
