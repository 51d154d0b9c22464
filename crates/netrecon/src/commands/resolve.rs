//! `netrecon resolve`: classify one address against the inventory's subnets.

use std::net::IpAddr;

use serde::Serialize;

use netrecon_core::IpamRepository;
use netrecon_core::reconcile::SubnetResolver;

use crate::cli::{GlobalOpts, ResolveArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output::{self, KvRow};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resolution {
    address: String,
    subnet_id: String,
    cidr: String,
    name: Option<String>,
    description: Option<String>,
}

fn resolution_rows(r: &Resolution) -> Vec<KvRow> {
    vec![
        KvRow::new("address", &r.address),
        KvRow::new("subnet", &r.subnet_id),
        KvRow::new("cidr", &r.cidr),
        KvRow::new("name", r.name.as_deref().unwrap_or("-")),
        KvRow::new("description", r.description.as_deref().unwrap_or("-")),
    ]
}

pub fn handle(args: &ResolveArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let address = match args.address.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4,
        Ok(IpAddr::V6(_)) => {
            return Err(CliError::Validation {
                field: "address".into(),
                reason: "IPv6 addresses are not tracked".into(),
            });
        }
        Err(_) => {
            return Err(CliError::Validation {
                field: "address".into(),
                reason: format!("'{}' is not an IP address", args.address),
            });
        }
    };

    let cfg = util::load_config(global)?;
    let policy = util::policy(&cfg, args.subnet_match)?;
    let store = util::load_inventory(&util::inventory_path(global, &cfg))?;
    let resolver = SubnetResolver::new(store.list_subnets()?, &policy);

    let subnet = resolver
        .resolve(address)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "Subnet".into(),
            identifier: address.to_string(),
            hint: "Run: netrecon sync --create-subnets to provision one".into(),
        })?;

    let resolution = Resolution {
        address: address.to_string(),
        subnet_id: subnet.id.to_string(),
        cidr: subnet.cidr.clone(),
        name: subnet.name.clone(),
        description: subnet.description.clone(),
    };
    let format = util::output_format(global, &cfg);
    output::print_output(
        &output::render_single(format, &resolution, resolution_rows),
        global.quiet,
    );
    Ok(())
}
