pub mod config;
pub mod export;
pub mod ingest;
pub mod manager;
pub mod training;

pub use config::{load_baseline_config, BaselineConfig};
pub use export::{select_routing_table, RoutingSelection, RoutingTable};
pub use manager::{DataSummary, ModelManager};
