use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::BaselineError;
use crate::model::{DemandSet, ModelKind, ModelMetrics, ModelOutput, Route, Topology};

use super::load_balanced_sp::LoadBalancedSpModel;
use super::max_flow::MaxFlowModel;
use super::min_cost_max_flow::MinCostMaxFlowModel;
use super::multi_commodity::MultiCommodityFlowModel;
use super::route_compute::NetworkGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    /// Utilization weight of the min-cost model's penalty cost.
    pub alpha: f64,
    /// Congestion weight of the load-balanced model's edge cost.
    pub beta: f64,
    pub bottleneck_threshold: f64,
    pub max_reported_bottlenecks: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
            bottleneck_threshold: 0.8,
            max_reported_bottlenecks: 5,
        }
    }
}

/// Produces routes and metrics for a demand set over the model's own graph.
pub trait RoutingModel {
    fn kind(&self) -> ModelKind;
    fn evaluate(&mut self, demands: &DemandSet) -> Result<ModelOutput, BaselineError>;
}

#[derive(Debug, Clone)]
pub enum BaselineModel {
    MaxFlow(MaxFlowModel),
    MinCostMaxFlow(MinCostMaxFlowModel),
    MultiCommodityFlow(MultiCommodityFlowModel),
    LoadBalancedSp(LoadBalancedSpModel),
}

impl BaselineModel {
    pub fn build(
        kind: ModelKind,
        topology: &Topology,
        params: &ModelParams,
    ) -> Result<Self, BaselineError> {
        Ok(match kind {
            ModelKind::MaxFlow => BaselineModel::MaxFlow(MaxFlowModel::new(
                topology,
                params.bottleneck_threshold,
                params.max_reported_bottlenecks,
            )?),
            ModelKind::MinCostMaxFlow => {
                BaselineModel::MinCostMaxFlow(MinCostMaxFlowModel::new(topology, params.alpha)?)
            }
            ModelKind::MultiCommodityFlow => {
                BaselineModel::MultiCommodityFlow(MultiCommodityFlowModel::new(topology)?)
            }
            ModelKind::LoadBalancedSp => {
                BaselineModel::LoadBalancedSp(LoadBalancedSpModel::new(topology, params.beta)?)
            }
        })
    }
}

impl RoutingModel for BaselineModel {
    fn kind(&self) -> ModelKind {
        match self {
            BaselineModel::MaxFlow(model) => model.kind(),
            BaselineModel::MinCostMaxFlow(model) => model.kind(),
            BaselineModel::MultiCommodityFlow(model) => model.kind(),
            BaselineModel::LoadBalancedSp(model) => model.kind(),
        }
    }

    fn evaluate(&mut self, demands: &DemandSet) -> Result<ModelOutput, BaselineError> {
        match self {
            BaselineModel::MaxFlow(model) => model.evaluate(demands),
            BaselineModel::MinCostMaxFlow(model) => model.evaluate(demands),
            BaselineModel::MultiCommodityFlow(model) => model.evaluate(demands),
            BaselineModel::LoadBalancedSp(model) => model.evaluate(demands),
        }
    }
}

/// Every demand endpoint must be a node of the model's graph.
pub(crate) fn check_demand_endpoints(
    kind: ModelKind,
    graph: &NetworkGraph,
    demands: &DemandSet,
) -> Result<(), BaselineError> {
    for demand in demands.iter() {
        for node in [demand.src, demand.dst] {
            if !graph.contains(node) {
                return Err(BaselineError::execution(
                    kind,
                    format!(
                        "demand {}->{} references node {node} outside the topology",
                        demand.src, demand.dst
                    ),
                ));
            }
        }
    }
    Ok(())
}

pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub(crate) fn metric_map<const N: usize>(entries: [(&str, f64); N]) -> ModelMetrics {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub(crate) fn output(
    routes: Vec<Route>,
    metrics: ModelMetrics,
    diagnostics: BTreeMap<String, Value>,
) -> ModelOutput {
    ModelOutput {
        routes,
        metrics,
        diagnostics,
    }
}
