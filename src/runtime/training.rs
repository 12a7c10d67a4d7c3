use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::model::{ModelKind, ModelRun};
use crate::runtime::export::save_json;

const HIGH_PERFORMANCE_SUCCESS_RATE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceClass {
    High,
    Medium,
}

impl PerformanceClass {
    pub fn from_success_rate(success_rate: f64) -> Self {
        if success_rate > HIGH_PERFORMANCE_SUCCESS_RATE {
            PerformanceClass::High
        } else {
            PerformanceClass::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputFeatures {
    pub src_node: u32,
    pub dst_node: u32,
    pub model_used: ModelKind,
    pub topology_nodes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputLabels {
    pub next_hop: Option<u32>,
    pub model_confidence: f64,
    pub performance_class: PerformanceClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingExample {
    pub input_features: InputFeatures,
    pub output_labels: OutputLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMetadata {
    pub purpose: String,
    pub baseline_models: Vec<ModelKind>,
    pub features: Vec<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingData {
    pub metadata: TrainingMetadata,
    pub training_examples: Vec<TrainingExample>,
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// One labelled example per route of every completed model.
pub fn build_training_data(
    results: &BTreeMap<ModelKind, ModelRun>,
    topology_nodes: u32,
) -> TrainingData {
    let mut training_examples = Vec::new();
    for (kind, run) in results {
        if run.is_error() {
            continue;
        }
        let performance_class =
            PerformanceClass::from_success_rate(run.metric("success_rate").unwrap_or(0.0));
        training_examples.extend(run.routes().iter().map(|route| TrainingExample {
            input_features: InputFeatures {
                src_node: route.src,
                dst_node: route.dst,
                model_used: *kind,
                topology_nodes,
            },
            output_labels: OutputLabels {
                next_hop: route.next_hop,
                model_confidence: 1.0,
                performance_class,
            },
        }));
    }

    TrainingData {
        metadata: TrainingMetadata {
            purpose: "Training data for ML routing models".to_string(),
            baseline_models: results.keys().copied().collect(),
            features: names(&["topology_nodes", "flow_demands", "link_utilization", "delay_patterns"]),
            labels: names(&["optimal_next_hop", "flow_allocation", "performance_metrics"]),
        },
        training_examples,
    }
}

pub fn save_training_data(dir: &Path, data: &TrainingData) -> Result<PathBuf> {
    let path = dir.join("training_data.json");
    save_json(&path, data)?;
    info!(
        "{} training examples saved to {}",
        data.training_examples.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Demand, Link, Topology};
    use crate::runtime::config::BaselineConfig;
    use crate::runtime::manager::ModelManager;

    #[test]
    fn examples_cover_completed_models_only() {
        let topology = Topology::new(
            3,
            vec![Link::new(0, 1, "5Mbps", "2ms"), Link::new(1, 2, "5Mbps", "2ms")],
        );
        let manager = ModelManager::new(
            topology,
            vec![Demand::new(0, 2, 1.0), Demand::new(2, 1, 1.0)],
            &BaselineConfig::default(),
        );
        let mut results = manager.run_all();
        results.insert(
            ModelKind::MaxFlow,
            ModelRun::failed(
                ModelKind::MaxFlow,
                &crate::error::BaselineError::execution(ModelKind::MaxFlow, "skipped"),
            ),
        );

        let data = build_training_data(&results, 3);
        assert_eq!(data.metadata.baseline_models.len(), 4);
        assert_eq!(data.training_examples.len(), 6);
        assert!(data
            .training_examples
            .iter()
            .all(|ex| ex.input_features.model_used != ModelKind::MaxFlow));
        assert!(data.training_examples.iter().all(|ex| {
            ex.output_labels.performance_class == PerformanceClass::High
                && ex.input_features.topology_nodes == 3
        }));
    }

    #[test]
    fn success_rate_threshold_is_exclusive() {
        assert_eq!(PerformanceClass::from_success_rate(0.81), PerformanceClass::High);
        assert_eq!(PerformanceClass::from_success_rate(0.8), PerformanceClass::Medium);
        assert_eq!(PerformanceClass::from_success_rate(0.0), PerformanceClass::Medium);
    }

    #[test]
    fn saves_to_results_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data = build_training_data(&BTreeMap::new(), 0);
        let path = save_training_data(dir.path(), &data).expect("save");
        assert!(path.ends_with("training_data.json"));
        assert!(path.exists());
    }
}
