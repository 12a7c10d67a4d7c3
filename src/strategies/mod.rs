pub mod base;
pub mod cost;
pub mod load_balanced_sp;
pub mod max_flow;
pub mod min_cost_max_flow;
pub mod multi_commodity;
pub mod route_compute;

pub use base::{BaselineModel, ModelParams, RoutingModel};
pub use load_balanced_sp::{EdgeUtilization, LoadBalancedSpModel};
pub use max_flow::{Bottleneck, MaxFlowModel};
pub use min_cost_max_flow::{AllocatedArc, MinCostMaxFlowModel, PathAllocation};
pub use multi_commodity::{
    jain_fairness_index, CommodityAllocation, EdgeLoad, MultiCommodityFlowModel,
    MultiCommoditySolution,
};
