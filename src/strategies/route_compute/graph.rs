use std::collections::BTreeMap;

use crate::error::BaselineError;
use crate::model::Topology;

use super::{EdgeKey, Graph, LinkAttrs, LinkGraph, Orientation};

/// Capacity/delay graph derived from a topology, one instance per model.
///
/// Both orientations store an entry in each direction; they differ in how
/// [`NetworkGraph::edges`] enumerates them and in how callers key edge state.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    orientation: Orientation,
    links: LinkGraph,
}

impl NetworkGraph {
    pub fn from_topology(
        topology: &Topology,
        orientation: Orientation,
    ) -> Result<Self, BaselineError> {
        topology.validate()?;

        let mut links: LinkGraph = BTreeMap::new();
        for node in 0..topology.nodes {
            links.entry(node).or_default();
        }

        for link in &topology.links {
            let capacity = link
                .capacity_mbps()
                .map_err(|err| BaselineError::ModelInit(err.to_string()))?;
            let delay = link
                .delay_ms()
                .map_err(|err| BaselineError::ModelInit(err.to_string()))?;
            let attrs = LinkAttrs { capacity, delay };
            links.entry(link.src).or_default().insert(link.dst, attrs);
            links.entry(link.dst).or_default().insert(link.src, attrs);
        }

        Ok(Self { orientation, links })
    }

    pub fn node_count(&self) -> usize {
        self.links.len()
    }

    pub fn contains(&self, node: u32) -> bool {
        self.links.contains_key(&node)
    }

    pub fn attrs(&self, u: u32, v: u32) -> Option<LinkAttrs> {
        self.links.get(&u).and_then(|neighbors| neighbors.get(&v)).copied()
    }

    pub fn capacity(&self, u: u32, v: u32) -> Option<f64> {
        self.attrs(u, v).map(|attrs| attrs.capacity)
    }

    pub fn delay(&self, u: u32, v: u32) -> Option<f64> {
        self.attrs(u, v).map(|attrs| attrs.delay)
    }

    /// Directed graphs yield every arc; undirected graphs yield each node pair once.
    pub fn edges(&self) -> Vec<(u32, u32, LinkAttrs)> {
        let mut out = Vec::new();
        for (u, neighbors) in &self.links {
            for (v, attrs) in neighbors {
                if self.orientation == Orientation::Undirected && u > v {
                    continue;
                }
                out.push((*u, *v, *attrs));
            }
        }
        out
    }

    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    /// Projects every arc to a scalar weight.
    pub fn weight_graph<F>(&self, mut weight: F) -> Graph
    where
        F: FnMut(u32, u32, LinkAttrs) -> f64,
    {
        self.links
            .iter()
            .map(|(u, neighbors)| {
                let out = neighbors
                    .iter()
                    .map(|(v, attrs)| (*v, weight(*u, *v, *attrs)))
                    .collect();
                (*u, out)
            })
            .collect()
    }

    pub fn capacity_graph(&self) -> Graph {
        self.weight_graph(|_, _, attrs| attrs.capacity)
    }

    pub fn edge_attrs(&self, edge: EdgeKey) -> Option<LinkAttrs> {
        let (u, v) = edge.endpoints();
        self.attrs(u, v)
    }
}
