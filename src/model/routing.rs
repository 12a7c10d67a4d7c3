use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BaselineError;

/// The closed set of routing strategies under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    MaxFlow,
    MinCostMaxFlow,
    MultiCommodityFlow,
    #[serde(rename = "load_balanced_sp")]
    LoadBalancedSp,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::MaxFlow,
        ModelKind::MinCostMaxFlow,
        ModelKind::MultiCommodityFlow,
        ModelKind::LoadBalancedSp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::MaxFlow => "max_flow",
            ModelKind::MinCostMaxFlow => "min_cost_max_flow",
            ModelKind::MultiCommodityFlow => "multi_commodity_flow",
            ModelKind::LoadBalancedSp => "load_balanced_sp",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = BaselineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| BaselineError::UnknownModel(s.to_string()))
    }
}

/// Model-specific figures attached to a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RouteDetail {
    MaxFlow {
        max_flow: f64,
    },
    MinCostMaxFlow {
        flow: f64,
        cost: f64,
        avg_delay: f64,
    },
    MultiCommodityFlow {
        allocated_flow: f64,
        allocation_ratio: f64,
    },
    LoadBalancedSp {
        path_cost: f64,
        total_delay: f64,
        max_utilization: f64,
        hop_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub src: u32,
    pub dst: u32,
    pub next_hop: Option<u32>,
    pub model: ModelKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<u32>,
    pub demand: f64,
    #[serde(flatten)]
    pub detail: RouteDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Route {
    pub fn is_routed(&self) -> bool {
        self.next_hop.is_some()
    }
}

pub type ModelMetrics = BTreeMap<String, f64>;

/// What one model produces for one demand set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub routes: Vec<Route>,
    pub metrics: ModelMetrics,
    pub diagnostics: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedRun {
    pub model_name: ModelKind,
    pub routes: Vec<Route>,
    pub metrics: ModelMetrics,
    pub diagnostics: BTreeMap<String, Value>,
    pub timestamp: String,
    pub flow_demands: usize,
    pub topology_nodes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub error: String,
    pub model_name: ModelKind,
    pub routes: Vec<Route>,
    pub metrics: ModelMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModelRun {
    Completed(CompletedRun),
    Failed(FailedRun),
}

impl ModelRun {
    pub fn failed(model: ModelKind, error: &BaselineError) -> Self {
        ModelRun::Failed(FailedRun {
            error: error.to_string(),
            model_name: model,
            routes: Vec::new(),
            metrics: ModelMetrics::new(),
        })
    }

    pub fn model(&self) -> ModelKind {
        match self {
            ModelRun::Completed(run) => run.model_name,
            ModelRun::Failed(run) => run.model_name,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ModelRun::Completed(_) => None,
            ModelRun::Failed(run) => Some(&run.error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    pub fn routes(&self) -> &[Route] {
        match self {
            ModelRun::Completed(run) => &run.routes,
            ModelRun::Failed(run) => &run.routes,
        }
    }

    pub fn metrics(&self) -> &ModelMetrics {
        match self {
            ModelRun::Completed(run) => &run.metrics,
            ModelRun::Failed(run) => &run.metrics,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics().get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_round_trips_through_names() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().ok(), Some(kind));
            assert_eq!(
                serde_json::to_value(kind).ok(),
                Some(Value::String(kind.as_str().to_string()))
            );
        }
        assert!(matches!(
            "dijkstra".parse::<ModelKind>(),
            Err(BaselineError::UnknownModel(_))
        ));
    }

    #[test]
    fn route_serializes_detail_inline() {
        let route = Route {
            src: 0,
            dst: 2,
            next_hop: None,
            model: ModelKind::LoadBalancedSp,
            path: Vec::new(),
            demand: 1.5,
            detail: RouteDetail::LoadBalancedSp {
                path_cost: f64::INFINITY,
                total_delay: f64::INFINITY,
                max_utilization: 1.0,
                hop_count: 0,
            },
            error: Some("No path available".to_string()),
        };
        let value = serde_json::to_value(&route).expect("route json");
        assert_eq!(value["model"], "load_balanced_sp");
        assert_eq!(value["next_hop"], Value::Null);
        assert_eq!(value["path_cost"], Value::Null);
        assert_eq!(value["max_utilization"], 1.0);
        assert_eq!(value["error"], "No path available");
        assert!(value.get("path").is_none());
    }

    #[test]
    fn failed_run_serializes_error_shape() {
        let run = ModelRun::failed(
            ModelKind::MaxFlow,
            &BaselineError::ModelInit("self-loop link on node 1".to_string()),
        );
        let value = serde_json::to_value(&run).expect("run json");
        assert_eq!(value["model_name"], "max_flow");
        assert_eq!(value["routes"], serde_json::json!([]));
        assert_eq!(value["metrics"], serde_json::json!({}));
        assert!(value["error"]
            .as_str()
            .is_some_and(|msg| msg.contains("self-loop")));
    }
}
