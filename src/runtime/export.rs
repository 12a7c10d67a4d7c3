use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::compare::ComparisonReport;
use crate::model::{ModelKind, ModelRun, Route};

/// Model whose routes are preferred whenever it ran cleanly.
pub const PREFERRED_MODEL: ModelKind = ModelKind::MultiCommodityFlow;

pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value).context("failed to serialize json output")?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn file_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn save_results(dir: &Path, results: &BTreeMap<ModelKind, ModelRun>) -> Result<PathBuf> {
    let path = dir.join(format!("model_results_{}.json", file_stamp()));
    save_json(&path, results)?;
    info!("results saved to {}", path.display());
    Ok(path)
}

pub fn save_comparison_report(dir: &Path, report: &ComparisonReport) -> Result<PathBuf> {
    let path = dir.join(format!("comparison_report_{}.json", file_stamp()));
    save_json(&path, report)?;
    info!("comparison report saved to {}", path.display());
    Ok(path)
}

/// The one routing table handed to downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSelection {
    pub model: Option<ModelKind>,
    pub reason: String,
    pub routes: Vec<Route>,
}

impl RoutingSelection {
    pub fn empty(reason: impl Into<String>) -> Self {
        Self {
            model: None,
            reason: reason.into(),
            routes: Vec::new(),
        }
    }

    pub fn from_run(run: &ModelRun, reason: impl Into<String>) -> Self {
        if run.is_error() {
            return Self::empty(format!("{} failed", run.model()));
        }
        Self {
            model: Some(run.model()),
            reason: reason.into(),
            routes: run.routes().to_vec(),
        }
    }
}

/// Multi-commodity routes when that model completed, otherwise the completed
/// model with the highest `success_rate` (earliest model wins ties).
pub fn select_routing_table(results: &BTreeMap<ModelKind, ModelRun>) -> RoutingSelection {
    if let Some(run) = results.get(&PREFERRED_MODEL).filter(|run| !run.is_error()) {
        return RoutingSelection::from_run(run, "preferred model completed");
    }

    let mut best: Option<(&ModelRun, f64)> = None;
    for run in results.values().filter(|run| !run.is_error()) {
        let success_rate = run.metric("success_rate").unwrap_or(0.0);
        if best.map_or(true, |(_, top)| success_rate > top) {
            best = Some((run, success_rate));
        }
    }

    match best {
        Some((run, success_rate)) => {
            RoutingSelection::from_run(run, format!("highest success rate ({success_rate:.2})"))
        }
        None => RoutingSelection::empty("no successful model"),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutingMetadata {
    pub model_used: Option<ModelKind>,
    pub total_routes: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutingTable {
    pub routes: Vec<Route>,
    pub metadata: RoutingMetadata,
}

impl From<RoutingSelection> for RoutingTable {
    fn from(selection: RoutingSelection) -> Self {
        let total_routes = selection.routes.len();
        Self {
            routes: selection.routes,
            metadata: RoutingMetadata {
                model_used: selection.model,
                total_routes,
                timestamp: Local::now().to_rfc3339(),
            },
        }
    }
}

pub fn write_routing_table(path: &Path, selection: RoutingSelection) -> Result<RoutingTable> {
    let table = RoutingTable::from(selection);
    save_json(path, &table)?;
    info!(
        "routing table with {} routes written to {}",
        table.metadata.total_routes,
        path.display()
    );
    Ok(table)
}
