//! `beaver validate` and `beaver repair`

use anyhow::{bail, Result};
use clap::Args;

use beaver_core::{BeaverConfig, RepairMode};
use beaver_graph::deadline::bounded;
use beaver_graph::{IntegrityRepair, IntegrityValidator};

use super::{step_timeout, Stores};
use crate::output;

#[derive(Args)]
pub struct ValidateArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RepairArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Abort on the first failing correction
    #[arg(long)]
    pub fail_fast: bool,
}

pub async fn validate(args: ValidateArgs, config: &BeaverConfig) -> Result<()> {
    let stores = Stores::open(config).await?;
    let validator = IntegrityValidator::new(stores.records(), stores.graph_store());

    let report = bounded(step_timeout(config), "validation", validator.validate()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_validation_report(&report);
    }

    if !report.valid {
        bail!("{} discrepancies found", report.discrepancies.len());
    }
    Ok(())
}

pub async fn repair(args: RepairArgs, config: &BeaverConfig) -> Result<()> {
    let stores = Stores::open(config).await?;
    let mode = if args.fail_fast {
        RepairMode::FailFast
    } else {
        config.sync.repair_mode
    };
    let repairer = IntegrityRepair::new(stores.records(), stores.graph_store(), mode);

    let report = bounded(step_timeout(config), "repair", repairer.repair()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_repair_report(&report);
    }

    if !report.fixed {
        bail!("{} discrepancies remain after repair", report.remaining.len());
    }
    Ok(())
}
