pub mod demand;
pub mod routing;
pub mod topology;

pub use demand::{Demand, DemandSet, DEFAULT_MIN_VOLUME};
pub use routing::{
    CompletedRun, FailedRun, ModelKind, ModelMetrics, ModelOutput, ModelRun, Route, RouteDetail,
};
pub use topology::{
    parse_bandwidth_mbps, parse_delay_ms, Link, Topology, DEFAULT_BANDWIDTH_MBPS, DEFAULT_DELAY_MS,
};
