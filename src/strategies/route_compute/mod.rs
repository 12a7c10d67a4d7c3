mod frontier;
mod graph;
mod max_flow;
mod spf;
mod types;

pub use frontier::DistanceFrontier;
pub use graph::NetworkGraph;
pub use max_flow::compute_max_flow;
pub use spf::{compute_spf_tree, reconstruct_path, shortest_path};
pub use types::{
    EdgeKey, FlowArc, Graph, LinkAttrs, LinkGraph, MaxFlowResult, Orientation, PathCandidate,
    SpfTreeResult,
};
