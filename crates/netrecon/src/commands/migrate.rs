//! `netrecon migrate`: bring the inventory schema up to date.

use netrecon_core::apply_migrations;
use netrecon_core::store::migrate::MigrationReport;

use crate::cli::GlobalOpts;
use crate::commands::util;
use crate::error::CliError;
use crate::output::{self, KvRow};

fn migration_rows(report: &MigrationReport) -> Vec<KvRow> {
    let applied = if report.applied.is_empty() {
        "none".to_owned()
    } else {
        report
            .applied
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    vec![
        KvRow::new("applied", applied),
        KvRow::new("version", report.version),
    ]
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = util::load_config(global)?;
    let inventory = util::inventory_path(global, &cfg);
    let store = util::load_inventory(&inventory)?;

    let report = apply_migrations(&store)?;
    util::save_inventory(&store, &inventory)?;

    let format = util::output_format(global, &cfg);
    output::print_output(
        &output::render_single(format, &report, migration_rows),
        global.quiet,
    );
    Ok(())
}
