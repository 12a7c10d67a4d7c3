use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::BaselineError;
use crate::model::{CompletedRun, Demand, DemandSet, ModelKind, ModelRun, Topology};
use crate::runtime::config::BaselineConfig;
use crate::strategies::{BaselineModel, ModelParams, RoutingModel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub topology_nodes: u32,
    pub topology_links: usize,
    pub flow_demands: usize,
    pub total_demand: f64,
    pub available_models: Vec<ModelKind>,
}

/// Runs every strategy over one topology and one aggregated demand set.
///
/// Each run builds a fresh model instance, so no routing state leaks between
/// runs and a failing model never affects its siblings.
#[derive(Debug, Clone)]
pub struct ModelManager {
    topology: Topology,
    demands: DemandSet,
    params: ModelParams,
}

impl ModelManager {
    pub fn new(topology: Topology, raw_demands: Vec<Demand>, cfg: &BaselineConfig) -> Self {
        let records = raw_demands.len();
        let demands = DemandSet::aggregate(raw_demands, cfg.min_demand);
        info!(
            "model manager: {} demand records aggregated into {} flows",
            records,
            demands.len()
        );
        Self {
            topology,
            demands,
            params: cfg.params,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn demands(&self) -> &DemandSet {
        &self.demands
    }

    pub fn available_models(&self) -> Vec<ModelKind> {
        ModelKind::ALL.to_vec()
    }

    pub fn data_summary(&self) -> DataSummary {
        DataSummary {
            topology_nodes: self.topology.nodes,
            topology_links: self.topology.links.len(),
            flow_demands: self.demands.len(),
            total_demand: self.demands.total_volume(),
            available_models: self.available_models(),
        }
    }

    pub fn run_model(&self, kind: ModelKind) -> ModelRun {
        match self.evaluate(kind) {
            Ok(run) => {
                info!(
                    "{kind}: {} routes, success_rate {:.3}",
                    run.routes.len(),
                    run.metrics.get("success_rate").copied().unwrap_or(0.0)
                );
                ModelRun::Completed(run)
            }
            Err(err) => {
                warn!("{kind}: {err}");
                ModelRun::failed(kind, &err)
            }
        }
    }

    fn evaluate(&self, kind: ModelKind) -> Result<CompletedRun, BaselineError> {
        let mut model = BaselineModel::build(kind, &self.topology, &self.params)?;
        let output = model.evaluate(&self.demands)?;
        Ok(CompletedRun {
            model_name: kind,
            routes: output.routes,
            metrics: output.metrics,
            diagnostics: output.diagnostics,
            timestamp: Local::now().to_rfc3339(),
            flow_demands: self.demands.len(),
            topology_nodes: self.topology.nodes,
        })
    }

    pub fn run_models(&self, kinds: &[ModelKind]) -> BTreeMap<ModelKind, ModelRun> {
        info!(
            "running {} models on {} flow demands",
            kinds.len(),
            self.demands.len()
        );
        kinds.iter().map(|kind| (*kind, self.run_model(*kind))).collect()
    }

    pub fn run_all(&self) -> BTreeMap<ModelKind, ModelRun> {
        self.run_models(&ModelKind::ALL)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::model::{Link, RouteDetail};

    fn line() -> Topology {
        Topology::new(
            3,
            vec![Link::new(0, 1, "5Mbps", "2ms"), Link::new(1, 2, "5Mbps", "2ms")],
        )
    }

    #[test]
    fn duplicate_demands_reach_every_model_as_one() {
        let manager = ModelManager::new(
            line(),
            vec![Demand::new(0, 2, 2.0), Demand::new(0, 2, 3.0)],
            &BaselineConfig::default(),
        );
        assert_eq!(manager.demands().as_slice(), &[Demand::new(0, 2, 5.0)]);

        for (kind, run) in manager.run_all() {
            assert!(!run.is_error(), "{kind} failed");
            assert_eq!(run.routes().len(), 1, "{kind}");
            assert_abs_diff_eq!(run.routes()[0].demand, 5.0);
            assert_eq!(run.routes()[0].next_hop, Some(1), "{kind}");
        }
    }

    #[test]
    fn non_positive_volumes_are_floored() {
        let manager = ModelManager::new(
            line(),
            vec![Demand::new(0, 2, 0.0), Demand::new(2, 0, -4.0)],
            &BaselineConfig::default(),
        );
        assert!(manager.demands().iter().all(|demand| demand.volume == 0.1));
        let run = manager.run_model(ModelKind::MinCostMaxFlow);
        match &run.routes()[0].detail {
            RouteDetail::MinCostMaxFlow { flow, .. } => assert_abs_diff_eq!(*flow, 0.1),
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn failing_model_does_not_block_the_rest() {
        let manager = ModelManager::new(
            line(),
            vec![Demand::new(0, 2, 1.0), Demand::new(0, 9, 1.0)],
            &BaselineConfig::default(),
        );
        let results = manager.run_all();
        assert_eq!(results.len(), 4);
        for run in results.values() {
            assert!(run.is_error());
            assert!(run.routes().is_empty());
            assert!(run.metrics().is_empty());
        }
    }

    #[test]
    fn malformed_link_fails_each_model_inline() {
        let topology = Topology::new(2, vec![Link::new(0, 1, "fast", "2ms")]);
        let manager = ModelManager::new(
            topology,
            vec![Demand::new(0, 1, 1.0)],
            &BaselineConfig::default(),
        );
        let results = manager.run_models(&[ModelKind::MaxFlow, ModelKind::LoadBalancedSp]);
        assert_eq!(results.len(), 2);
        for run in results.values() {
            let error = run.error().expect("model should fail");
            assert!(error.contains("bandwidth"), "{error}");
        }
    }

    #[test]
    fn completed_run_records_context() {
        let manager = ModelManager::new(
            line(),
            vec![Demand::new(0, 2, 1.0)],
            &BaselineConfig::default(),
        );
        let summary = manager.data_summary();
        assert_eq!(summary.topology_nodes, 3);
        assert_eq!(summary.topology_links, 2);
        assert_eq!(summary.flow_demands, 1);
        assert_eq!(summary.available_models.len(), 4);

        match manager.run_model(ModelKind::MaxFlow) {
            ModelRun::Completed(run) => {
                assert_eq!(run.flow_demands, 1);
                assert_eq!(run.topology_nodes, 3);
                assert!(!run.timestamp.is_empty());
            }
            ModelRun::Failed(run) => panic!("max_flow failed: {}", run.error),
        }
    }
}
