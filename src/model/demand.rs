use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MIN_VOLUME: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub src: u32,
    pub dst: u32,
    pub volume: f64,
}

impl Demand {
    pub fn new(src: u32, dst: u32, volume: f64) -> Self {
        Self { src, dst, volume }
    }
}

/// Aggregated traffic demands: one entry per `(src, dst)` pair, `src != dst`,
/// every volume strictly positive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandSet {
    demands: Vec<Demand>,
}

impl DemandSet {
    /// Replaces non-positive (or NaN) volumes with `min_volume`, drops
    /// self-pairs and sums duplicate pairs in first-occurrence order.
    pub fn aggregate<I>(entries: I, min_volume: f64) -> Self
    where
        I: IntoIterator<Item = Demand>,
    {
        let mut index: BTreeMap<(u32, u32), usize> = BTreeMap::new();
        let mut demands: Vec<Demand> = Vec::new();

        for entry in entries {
            if entry.src == entry.dst {
                debug!("drop self demand on node {}", entry.src);
                continue;
            }
            let volume = if entry.volume > 0.0 {
                entry.volume
            } else {
                min_volume
            };
            match index.get(&(entry.src, entry.dst)) {
                Some(pos) => demands[*pos].volume += volume,
                None => {
                    index.insert((entry.src, entry.dst), demands.len());
                    demands.push(Demand::new(entry.src, entry.dst, volume));
                }
            }
        }

        Self { demands }
    }

    pub fn len(&self) -> usize {
        self.demands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Demand> + '_ {
        self.demands.iter()
    }

    pub fn as_slice(&self) -> &[Demand] {
        &self.demands
    }

    pub fn total_volume(&self) -> f64 {
        self.demands.iter().map(|demand| demand.volume).sum()
    }

    /// Demands ordered by descending volume; equal volumes keep input order.
    pub fn by_descending_volume(&self) -> Vec<Demand> {
        let mut sorted = self.demands.clone();
        sorted.sort_by(|a, b| b.volume.total_cmp(&a.volume));
        sorted
    }
}
