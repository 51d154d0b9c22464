//! Config subcommand handlers.

use netrecon_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output::{self, KvRow};

fn config_rows(cfg: &Config, global: &GlobalOpts) -> Vec<KvRow> {
    vec![
        KvRow::new("defaults.output", &cfg.defaults.output),
        KvRow::new("defaults.color", &cfg.defaults.color),
        KvRow::new("sync.auto_create_subnets", cfg.sync.auto_create_subnets),
        KvRow::new("sync.subnet_match", cfg.sync.subnet_match),
        KvRow::new("sync.auto_subnet_prefix", cfg.sync.auto_subnet_prefix),
        KvRow::new(
            "paths.inventory",
            util::inventory_path(global, cfg).display(),
        ),
        KvRow::new(
            "paths.telemetry",
            cfg.paths
                .telemetry
                .as_ref()
                .map_or_else(|| "-".to_owned(), |p| p.display().to_string()),
        ),
    ]
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = util::config_file(global);
    match args.command {
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::Conflict {
                    resource_type: "Config file".into(),
                    identifier: path.display().to_string(),
                    hint: "Use --force to overwrite it, or edit it directly.".into(),
                });
            }
            let written = match &global.config {
                Some(explicit) => {
                    netrecon_config::save_config_to(&Config::default(), explicit)?;
                    explicit.clone()
                }
                None => netrecon_config::save_config(&Config::default())?,
            };
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", written.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = util::load_config(global)?;
            let format = util::output_format(global, &cfg);
            let rendered = output::render_single(format, &cfg, |c| config_rows(c, global));
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
