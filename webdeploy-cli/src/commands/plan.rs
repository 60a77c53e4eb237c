//! `webdeploy plan <source>` — dry comparison of a source tree and container.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use webdeploy_core::BlobName;
use webdeploy_sync::{Deployment, SyncPlan};

use super::TargetArgs;
use crate::GlobalArgs;

/// Arguments for `webdeploy plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Local directory holding the built site.
    pub source: PathBuf,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let cfg = self.target.load(global)?;
        let deployment = Deployment::init(cfg, false).context("failed to open container")?;
        let plan = deployment
            .plan(&self.source)
            .with_context(|| format!("plan failed for '{}'", self.source.display()))?;

        if self.json {
            print_json(&plan)
        } else {
            print_table(&plan);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct PlanJson<'a> {
    summary: PlanSummaryJson,
    new: Vec<&'a BlobName>,
    updated: Vec<&'a BlobName>,
    unchanged: Vec<&'a BlobName>,
    deleted: Vec<&'a BlobName>,
}

#[derive(Serialize)]
struct PlanSummaryJson {
    new: usize,
    updated: usize,
    unchanged: usize,
    deleted: usize,
}

#[derive(Tabled)]
struct PlanTableRow {
    #[tabled(rename = "blob")]
    blob: String,
    #[tabled(rename = "action")]
    action: String,
}

fn print_json(plan: &SyncPlan) -> Result<()> {
    let payload = PlanJson {
        summary: PlanSummaryJson {
            new: plan.new.len(),
            updated: plan.updated.len(),
            unchanged: plan.unchanged.len(),
            deleted: plan.deleted.len(),
        },
        new: plan.new.iter().collect(),
        updated: plan.updated.iter().collect(),
        unchanged: plan.unchanged.iter().collect(),
        deleted: plan.deleted.iter().collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
    );
    Ok(())
}

fn print_table(plan: &SyncPlan) {
    println!(
        "{} new | {} updated | {} unchanged | {} to delete",
        plan.new.len(),
        plan.updated.len(),
        plan.unchanged.len(),
        plan.deleted.len(),
    );
    if plan.is_noop() {
        println!("{}", "✓ container is up to date".green());
        return;
    }

    let rows: Vec<PlanTableRow> = plan
        .new
        .iter()
        .map(|n| (n, "NEW".green().to_string()))
        .chain(plan.updated.iter().map(|n| (n, "UPDATE".yellow().to_string())))
        .chain(plan.deleted.iter().map(|n| (n, "DELETE".red().to_string())))
        .map(|(name, action)| PlanTableRow {
            blob: name.to_string(),
            action,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("Run 'webdeploy sync' to apply.");
}
