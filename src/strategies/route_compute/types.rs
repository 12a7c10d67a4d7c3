use std::collections::BTreeMap;

use serde::Serialize;

/// Scalar-weighted adjacency: `graph[u][v]` is the weight of arc `u -> v`.
pub type Graph = BTreeMap<u32, BTreeMap<u32, f64>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkAttrs {
    pub capacity: f64,
    pub delay: f64,
}

pub type LinkGraph = BTreeMap<u32, BTreeMap<u32, LinkAttrs>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// One arc per direction, each with its own capacity.
    Directed,
    /// One shared edge per node pair.
    Undirected,
}

/// Unordered endpoint pair, smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(u32, u32);

impl EdgeKey {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn endpoints(&self) -> (u32, u32) {
        (self.0, self.1)
    }

    pub fn other(&self, node: u32) -> Option<u32> {
        if self.0 == node {
            Some(self.1)
        } else if self.1 == node {
            Some(self.0)
        } else {
            None
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathCandidate {
    pub nodes: Vec<u32>,
    pub cost: f64,
}

impl PathCandidate {
    pub fn hop_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn next_hop(&self) -> Option<u32> {
        self.nodes.get(1).copied()
    }

    pub fn arcs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.arcs().map(|(u, v)| EdgeKey::new(u, v))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpfTreeResult {
    pub dist: BTreeMap<u32, f64>,
    pub first_hop: BTreeMap<u32, u32>,
    pub parent: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowArc {
    pub from: u32,
    pub to: u32,
    pub flow: f64,
    pub capacity: f64,
}

impl FlowArc {
    pub fn utilization(&self) -> f64 {
        if self.capacity > 0.0 {
            self.flow / self.capacity
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaxFlowResult {
    pub value: f64,
    /// Arcs carrying positive flow, ordered by `(from, to)`.
    pub arcs: Vec<FlowArc>,
}

impl MaxFlowResult {
    pub fn first_hop_from(&self, source: u32) -> Option<u32> {
        self.arcs
            .iter()
            .find(|arc| arc.from == source && arc.flow > 0.0)
            .map(|arc| arc.to)
    }

    pub fn flow_on(&self, from: u32, to: u32) -> f64 {
        self.arcs
            .iter()
            .find(|arc| arc.from == from && arc.to == to)
            .map_or(0.0, |arc| arc.flow)
    }
}
