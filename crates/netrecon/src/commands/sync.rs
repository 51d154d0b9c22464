//! `netrecon sync`: replay a telemetry capture into the inventory.

use std::sync::Arc;

use tracing::info;

use netrecon_core::{Reconciler, SnapshotSource, SyncReport, apply_migrations};

use crate::cli::{GlobalOpts, OutputFormat, SyncArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output::{self, KvRow};

fn report_rows(report: &SyncReport) -> Vec<KvRow> {
    vec![
        KvRow::new("processed", report.processed),
        KvRow::new("createdIPs", report.created_ips),
        KvRow::new("updatedIPs", report.updated_ips),
        KvRow::new("createdDevices", report.created_devices),
        KvRow::new("updatedDevices", report.updated_devices),
        KvRow::new("createdSubnets", report.created_subnets),
        KvRow::new("upsertedServices", report.upserted_services),
        KvRow::new("errors", report.errors.len()),
    ]
}

/// Errors listed under the summary for the human-oriented formats.
fn error_section(report: &SyncReport, format: OutputFormat, color: bool) -> Option<String> {
    if !report.has_errors() {
        return None;
    }
    match format {
        OutputFormat::Table => {
            let mut lines = vec![output::heading("Errors:", color)];
            lines.extend(
                report
                    .errors
                    .iter()
                    .map(|e| output::error_line(&format!("  - {e}"), color)),
            );
            Some(lines.join("\n"))
        }
        OutputFormat::Plain => Some(
            report
                .errors
                .iter()
                .map(|e| format!("error={e}"))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => None,
    }
}

pub async fn handle(args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = util::load_config(global)?;
    let mut policy = util::policy(&cfg, args.subnet_match)?;
    if args.create_subnets {
        policy.auto_create_subnets = true;
    }
    if let Some(prefix) = args.subnet_prefix {
        policy.auto_subnet_prefix = prefix;
    }

    let telemetry = args
        .telemetry
        .or_else(|| cfg.paths.telemetry.clone())
        .ok_or_else(|| CliError::NoTelemetry {
            config_path: util::config_file(global).display().to_string(),
        })?;
    let source = SnapshotSource::from_path(&telemetry)?;
    let devices = source.descriptors().to_vec();

    let inventory = util::inventory_path(global, &cfg);
    let store = Arc::new(util::load_inventory(&inventory)?);
    let migrated = apply_migrations(&*store)?;
    if !migrated.applied.is_empty() {
        info!(applied = ?migrated.applied, version = migrated.version, "inventory schema migrated");
    }

    tracing::debug!(?policy, devices = devices.len(), "running sync");
    let reconciler = Reconciler::new(Arc::clone(&store), source);
    let report = reconciler.run_sync(&devices, &policy).await;
    util::save_inventory(&store, &inventory)?;

    let format = util::output_format(global, &cfg);
    let color = output::should_color(util::color_mode(global, &cfg));
    let mut rendered = output::render_single(format, &report, report_rows);
    if let Some(errors) = error_section(&report, format, color) {
        rendered.push('\n');
        rendered.push_str(&errors);
    }
    output::print_output(&rendered, global.quiet);
    Ok(())
}
