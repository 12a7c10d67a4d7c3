use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::model::{Demand, Topology};

const SRC_COLUMN: &str = "src_idx";
const DST_COLUMN: &str = "dst_idx";
const THROUGHPUT_COLUMN: &str = "throughput_mbps";
const DEFAULT_THROUGHPUT: f64 = 1.0;

pub fn load_topology(path: &Path) -> Result<Topology> {
    let raw_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read topology file {}", path.display()))?;
    let topology: Topology = serde_json::from_str(&raw_text)
        .with_context(|| format!("failed to parse topology json {}", path.display()))?;
    info!(
        "loaded topology {}: {} nodes, {} links",
        path.display(),
        topology.nodes,
        topology.links.len()
    );
    Ok(topology)
}

/// Reads raw per-flow records. Duplicates are kept; the caller aggregates them.
pub fn load_demands_csv(path: &Path) -> Result<Vec<Demand>> {
    let raw_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read demand file {}", path.display()))?;
    let demands = parse_demands_csv(&raw_text)
        .with_context(|| format!("invalid demand file {}", path.display()))?;
    info!("loaded {} demand records from {}", demands.len(), path.display());
    Ok(demands)
}

pub fn parse_demands_csv(raw_text: &str) -> Result<Vec<Demand>> {
    let mut lines = raw_text.lines().filter(|line| !line.trim().is_empty());
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| anyhow!("missing csv header"))?
        .split(',')
        .map(str::trim)
        .collect();

    let column = |name: &str| header.iter().position(|col| *col == name);
    let src_col = column(SRC_COLUMN).ok_or_else(|| anyhow!("missing column {SRC_COLUMN}"))?;
    let dst_col = column(DST_COLUMN).ok_or_else(|| anyhow!("missing column {DST_COLUMN}"))?;
    let throughput_col = column(THROUGHPUT_COLUMN);

    let mut demands = Vec::new();
    for (row, line) in lines.enumerate() {
        // Plain comma splitting cannot honour quoted fields.
        if line.contains('"') {
            debug!("skip quoted demand row {}: {line:?}", row + 1);
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match parse_row(&fields, src_col, dst_col, throughput_col) {
            Some(demand) => demands.push(demand),
            None => debug!("skip demand row {}: {line:?}", row + 1),
        }
    }
    Ok(demands)
}

fn parse_row(
    fields: &[&str],
    src_col: usize,
    dst_col: usize,
    throughput_col: Option<usize>,
) -> Option<Demand> {
    let src = fields.get(src_col)?.parse::<u32>().ok()?;
    let dst = fields.get(dst_col)?.parse::<u32>().ok()?;
    if src == dst {
        return None;
    }
    let volume = match throughput_col.and_then(|col| fields.get(col)) {
        Some(raw) if !raw.is_empty() => raw.parse::<f64>().ok()?,
        _ => DEFAULT_THROUGHPUT,
    };
    Some(Demand::new(src, dst, volume))
}
