use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::model::DEFAULT_MIN_VOLUME;
use crate::strategies::ModelParams;

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineConfig {
    pub params: ModelParams,
    /// Floor applied to non-positive demand volumes.
    pub min_demand: f64,
    pub results_dir: PathBuf,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            params: ModelParams::default(),
            min_demand: DEFAULT_MIN_VOLUME,
            results_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawMaxFlow {
    bottleneck_threshold: Option<f64>,
    max_reported_bottlenecks: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct RawMinCostMaxFlow {
    alpha: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawLoadBalancedSp {
    beta: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawModels {
    max_flow: Option<RawMaxFlow>,
    min_cost_max_flow: Option<RawMinCostMaxFlow>,
    load_balanced_sp: Option<RawLoadBalancedSp>,
}

#[derive(Debug, Deserialize, Default)]
struct RawDemand {
    min_volume: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawOutput {
    results_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct RawBaselineConfig {
    models: Option<RawModels>,
    demand: Option<RawDemand>,
    output: Option<RawOutput>,
}

pub fn load_baseline_config(path: &Path) -> Result<BaselineConfig> {
    let raw_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_baseline_config(&raw_text)
        .with_context(|| format!("invalid baseline config {}", path.display()))
}

pub fn parse_baseline_config(raw_text: &str) -> Result<BaselineConfig> {
    // An empty document deserializes to unit, not to a mapping.
    let raw_cfg: RawBaselineConfig = if raw_text.trim().is_empty() {
        RawBaselineConfig::default()
    } else {
        serde_yaml::from_str(raw_text).context("failed to parse baseline config yaml")?
    };

    let defaults = BaselineConfig::default();
    let models = raw_cfg.models.unwrap_or_default();
    let max_flow = models.max_flow.unwrap_or_default();
    let min_cost = models.min_cost_max_flow.unwrap_or_default();
    let load_balanced = models.load_balanced_sp.unwrap_or_default();
    let demand = raw_cfg.demand.unwrap_or_default();
    let output = raw_cfg.output.unwrap_or_default();

    let params = ModelParams {
        alpha: min_cost.alpha.unwrap_or(defaults.params.alpha),
        beta: load_balanced.beta.unwrap_or(defaults.params.beta),
        bottleneck_threshold: max_flow
            .bottleneck_threshold
            .unwrap_or(defaults.params.bottleneck_threshold),
        max_reported_bottlenecks: max_flow
            .max_reported_bottlenecks
            .unwrap_or(defaults.params.max_reported_bottlenecks),
    };

    let cfg = BaselineConfig {
        params,
        min_demand: demand.min_volume.unwrap_or(defaults.min_demand),
        results_dir: output.results_dir.unwrap_or(defaults.results_dir),
    };
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &BaselineConfig) -> Result<()> {
    let params = &cfg.params;
    if !(params.alpha.is_finite() && params.alpha >= 0.0) {
        bail!("models.min_cost_max_flow.alpha must be >= 0, got {}", params.alpha);
    }
    if !(params.beta.is_finite() && params.beta >= 0.0) {
        bail!("models.load_balanced_sp.beta must be >= 0, got {}", params.beta);
    }
    if !(params.bottleneck_threshold > 0.0 && params.bottleneck_threshold <= 1.0) {
        bail!(
            "models.max_flow.bottleneck_threshold must be in (0, 1], got {}",
            params.bottleneck_threshold
        );
    }
    if !(cfg.min_demand.is_finite() && cfg.min_demand > 0.0) {
        bail!("demand.min_volume must be > 0, got {}", cfg.min_demand);
    }
    Ok(())
}
