use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{ModelKind, ModelMetrics, ModelRun};

/// Metrics pulled from every completed model; absent ones read as 0.0.
pub const COMPARISON_METRICS: [&str; 12] = [
    "success_rate",
    "total_flow",
    "total_allocated",
    "allocation_ratio",
    "avg_delay_per_flow",
    "total_cost",
    "cost_efficiency",
    "fairness_index",
    "avg_edge_utilization",
    "max_edge_utilization",
    "avg_hops_per_flow",
    "total_flows_routed",
];

/// Derived from the route list rather than the model's own metrics.
pub const ROUTE_COUNT_METRICS: [&str; 2] = ["routes_generated", "successful_routes"];

pub const ERROR_METRIC: &str = "error";

const LOWER_IS_BETTER: [&str; 4] = [
    "avg_delay_per_flow",
    "total_cost",
    "max_edge_utilization",
    "avg_hops_per_flow",
];

/// A zero here means the model did not route anything, never a good outcome.
const SHOULD_BE_POSITIVE: [&str; 7] = [
    "total_flow",
    "total_allocated",
    "allocation_ratio",
    "total_flows_routed",
    "cost_efficiency",
    "fairness_index",
    "avg_edge_utilization",
];

const METRIC_WEIGHTS: [(&str, f64); 14] = [
    ("total_flow", 15.0),
    ("total_allocated", 15.0),
    ("allocation_ratio", 12.0),
    ("total_flows_routed", 12.0),
    ("cost_efficiency", 10.0),
    ("fairness_index", 10.0),
    ("avg_edge_utilization", 8.0),
    ("success_rate", 8.0),
    ("avg_delay_per_flow", 5.0),
    ("avg_hops_per_flow", 3.0),
    ("max_edge_utilization", 2.0),
    ("total_cost", 2.0),
    ("routes_generated", 1.0),
    ("successful_routes", 1.0),
];

const ZERO_FLOOR_SCORE: f64 = 0.1;
const TIE_SCORE: f64 = 0.5;

pub fn lower_is_better(metric: &str) -> bool {
    LOWER_IS_BETTER.contains(&metric)
}

pub fn metric_weight(metric: &str) -> Option<f64> {
    METRIC_WEIGHTS
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, weight)| *weight)
}

pub fn ranked_metrics() -> impl Iterator<Item = &'static str> {
    COMPARISON_METRICS.into_iter().chain(ROUTE_COUNT_METRICS)
}

/// One model's value on a metric, seen next to every other model's value.
#[derive(Debug, Clone, Copy)]
pub struct MetricSample<'a> {
    pub metric: &'a str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub lower_is_better: bool,
}

/// Normalization rules, tried in order; the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationRule {
    /// An exact zero on a should-be-positive metric scores 0.1, even when
    /// every model ties at zero.
    ZeroFloor,
    /// Every model has the same value: 0.5 each.
    Tie,
    /// Min-max scaling to [0, 1], inverted when lower is better.
    MinMax,
}

pub const NORMALIZATION_ORDER: [NormalizationRule; 3] = [
    NormalizationRule::ZeroFloor,
    NormalizationRule::Tie,
    NormalizationRule::MinMax,
];

impl NormalizationRule {
    pub fn apply(&self, sample: &MetricSample<'_>) -> Option<f64> {
        match self {
            NormalizationRule::ZeroFloor => (SHOULD_BE_POSITIVE.contains(&sample.metric)
                && sample.value == 0.0)
                .then_some(ZERO_FLOOR_SCORE),
            NormalizationRule::Tie => (sample.max == sample.min).then_some(TIE_SCORE),
            NormalizationRule::MinMax => {
                let scaled = (sample.value - sample.min) / (sample.max - sample.min);
                Some(if sample.lower_is_better {
                    1.0 - scaled
                } else {
                    scaled
                })
            }
        }
    }
}

pub fn normalized_score(sample: &MetricSample<'_>) -> f64 {
    NORMALIZATION_ORDER
        .iter()
        .find_map(|rule| rule.apply(sample))
        .unwrap_or(0.0)
}

/// Standard metric set per model; a failed model carries only `error: 1.0`.
pub fn extract_metrics(results: &BTreeMap<ModelKind, ModelRun>) -> BTreeMap<ModelKind, ModelMetrics> {
    results
        .iter()
        .map(|(kind, run)| {
            let mut extracted = ModelMetrics::new();
            if run.is_error() {
                extracted.insert(ERROR_METRIC.to_string(), 1.0);
                return (*kind, extracted);
            }
            for metric in COMPARISON_METRICS {
                extracted.insert(metric.to_string(), run.metric(metric).unwrap_or(0.0));
            }
            let routes = run.routes();
            let successful = routes.iter().filter(|route| route.is_routed()).count();
            extracted.insert("routes_generated".to_string(), routes.len() as f64);
            extracted.insert("successful_routes".to_string(), successful as f64);
            (*kind, extracted)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRanking {
    pub model: ModelKind,
    pub value: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub rankings: Vec<MetricRanking>,
    pub best_model: Option<ModelKind>,
    pub best_value: Option<f64>,
    pub lower_is_better: bool,
}

impl MetricComparison {
    fn sample<'a>(&self, metric: &'a str, value: f64) -> MetricSample<'a> {
        let values = self.rankings.iter().map(|entry| entry.value);
        MetricSample {
            metric,
            value,
            min: values.clone().fold(f64::INFINITY, f64::min),
            max: values.fold(f64::NEG_INFINITY, f64::max),
            lower_is_better: self.lower_is_better,
        }
    }
}

fn is_valid(metrics: &ModelMetrics) -> bool {
    !metrics.contains_key(ERROR_METRIC)
}

/// Full ranking per metric over the models that completed. Equal values keep
/// model order.
pub fn create_comparison_table(
    metrics: &BTreeMap<ModelKind, ModelMetrics>,
) -> BTreeMap<String, MetricComparison> {
    let mut table = BTreeMap::new();
    for metric in ranked_metrics() {
        let mut values: Vec<(ModelKind, f64)> = metrics
            .iter()
            .filter(|(_, model_metrics)| is_valid(model_metrics))
            .filter_map(|(kind, model_metrics)| {
                model_metrics.get(metric).map(|value| (*kind, *value))
            })
            .collect();
        if values.is_empty() {
            continue;
        }

        let lower = lower_is_better(metric);
        values.sort_by(|a, b| {
            if lower {
                a.1.total_cmp(&b.1)
            } else {
                b.1.total_cmp(&a.1)
            }
        });

        let rankings: Vec<MetricRanking> = values
            .iter()
            .enumerate()
            .map(|(i, (model, value))| MetricRanking {
                model: *model,
                value: *value,
                rank: i + 1,
            })
            .collect();
        let best = rankings.first();
        let comparison = MetricComparison {
            best_model: best.map(|entry| entry.model),
            best_value: best.map(|entry| entry.value),
            rankings,
            lower_is_better: lower,
        };
        table.insert(metric.to_string(), comparison);
    }
    table
}

/// Weighted sum of normalized scores, rescaled so the best model lands on
/// exactly 100. Failed models score 0.
pub fn calculate_overall_scores(
    table: &BTreeMap<String, MetricComparison>,
    metrics: &BTreeMap<ModelKind, ModelMetrics>,
) -> BTreeMap<ModelKind, f64> {
    let mut scores: BTreeMap<ModelKind, f64> = metrics.keys().map(|kind| (*kind, 0.0)).collect();

    for (metric, comparison) in table {
        let Some(weight) = metric_weight(metric) else {
            continue;
        };
        for entry in &comparison.rankings {
            let score = normalized_score(&comparison.sample(metric, entry.value));
            *scores.entry(entry.model).or_insert(0.0) += weight * score;
        }
    }

    let max_score = scores.values().copied().fold(0.0, f64::max);
    if max_score > 0.0 {
        for score in scores.values_mut() {
            *score = 100.0 * (*score / max_score);
        }
    }
    scores
}

/// Models by descending score; failed models go last whatever their score.
pub fn overall_rankings(
    scores: &BTreeMap<ModelKind, f64>,
    metrics: &BTreeMap<ModelKind, ModelMetrics>,
) -> Vec<(ModelKind, f64)> {
    let failed = |kind: &ModelKind| metrics.get(kind).map_or(false, |m| !is_valid(m));
    let mut ranked: Vec<(ModelKind, f64)> = scores.iter().map(|(k, s)| (*k, *s)).collect();
    ranked.sort_by(|a, b| {
        failed(&a.0)
            .cmp(&failed(&b.0))
            .then_with(|| b.1.total_cmp(&a.1))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::BaselineError;
    use crate::model::{CompletedRun, Route, RouteDetail};

    fn sample<'a>(metric: &'a str, value: f64, values: &[f64]) -> MetricSample<'a> {
        MetricSample {
            metric,
            value,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            lower_is_better: lower_is_better(metric),
        }
    }

    #[test]
    fn normalization_rules_apply_in_order() {
        let cases: [(&str, f64, &[f64], f64); 10] = [
            // zero floor wins over tie
            ("total_flow", 0.0, &[0.0, 0.0, 0.0], 0.1),
            // zero floor wins over min-max
            ("total_flow", 0.0, &[0.0, 5.0], 0.1),
            ("fairness_index", 0.0, &[0.0, 1.0], 0.1),
            // zero is an ordinary value outside the should-be-positive set
            ("total_cost", 0.0, &[0.0, 5.0], 1.0),
            ("success_rate", 0.0, &[0.0, 0.0], 0.5),
            ("success_rate", 1.0, &[1.0, 1.0], 0.5),
            ("avg_delay_per_flow", 2.0, &[2.0, 4.0, 6.0], 1.0),
            ("avg_delay_per_flow", 4.0, &[2.0, 4.0, 6.0], 0.5),
            ("avg_delay_per_flow", 6.0, &[2.0, 4.0, 6.0], 0.0),
            ("fairness_index", 0.5, &[0.5, 1.0], 0.0),
        ];
        for (metric, value, values, expected) in cases {
            let score = normalized_score(&sample(metric, value, values));
            assert_abs_diff_eq!(score, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn only_the_four_cost_like_metrics_are_lower_is_better() {
        let lower: Vec<&str> = ranked_metrics().filter(|m| lower_is_better(m)).collect();
        assert_eq!(
            lower,
            vec!["avg_delay_per_flow", "total_cost", "max_edge_utilization", "avg_hops_per_flow"]
        );
        assert!(ranked_metrics().all(|m| metric_weight(m).is_some()));
    }

    fn run(kind: ModelKind, metrics: &[(&str, f64)], routed: usize, failed: usize) -> ModelRun {
        let route = |next_hop: Option<u32>| Route {
            src: 0,
            dst: 1,
            next_hop,
            model: kind,
            path: Vec::new(),
            demand: 1.0,
            detail: RouteDetail::MaxFlow { max_flow: 0.0 },
            error: None,
        };
        let mut routes = vec![route(Some(1)); routed];
        routes.extend(vec![route(None); failed]);
        ModelRun::Completed(CompletedRun {
            model_name: kind,
            routes,
            metrics: metrics
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            diagnostics: BTreeMap::new(),
            timestamp: String::new(),
            flow_demands: routed + failed,
            topology_nodes: 2,
        })
    }

    fn failed(kind: ModelKind) -> ModelRun {
        ModelRun::failed(kind, &BaselineError::execution(kind, "boom"))
    }

    #[test]
    fn extraction_fills_missing_metrics_and_counts_routes() {
        let results = BTreeMap::from([
            (
                ModelKind::MaxFlow,
                run(ModelKind::MaxFlow, &[("success_rate", 0.5)], 1, 1),
            ),
            (ModelKind::LoadBalancedSp, failed(ModelKind::LoadBalancedSp)),
        ]);
        let metrics = extract_metrics(&results);

        let max_flow = &metrics[&ModelKind::MaxFlow];
        assert_eq!(max_flow.len(), 14);
        assert_eq!(max_flow["success_rate"], 0.5);
        assert_eq!(max_flow["total_flow"], 0.0);
        assert_eq!(max_flow["routes_generated"], 2.0);
        assert_eq!(max_flow["successful_routes"], 1.0);

        let lbsp = &metrics[&ModelKind::LoadBalancedSp];
        assert_eq!(lbsp.len(), 1);
        assert_eq!(lbsp[ERROR_METRIC], 1.0);
    }

    #[test]
    fn rankings_follow_polarity_and_skip_failed_models() {
        let results = BTreeMap::from([
            (
                ModelKind::MaxFlow,
                run(ModelKind::MaxFlow, &[("avg_delay_per_flow", 4.0), ("success_rate", 1.0)], 1, 0),
            ),
            (
                ModelKind::MinCostMaxFlow,
                run(
                    ModelKind::MinCostMaxFlow,
                    &[("avg_delay_per_flow", 2.0), ("success_rate", 1.0)],
                    1,
                    0,
                ),
            ),
            (ModelKind::LoadBalancedSp, failed(ModelKind::LoadBalancedSp)),
        ]);
        let table = create_comparison_table(&extract_metrics(&results));

        let delay = &table["avg_delay_per_flow"];
        assert!(delay.lower_is_better);
        assert_eq!(delay.best_model, Some(ModelKind::MinCostMaxFlow));
        assert_eq!(delay.best_value, Some(2.0));
        assert_eq!(delay.rankings.len(), 2);
        assert_eq!(delay.rankings[1].rank, 2);

        // A tie keeps model order.
        let success = &table["success_rate"];
        assert_eq!(success.rankings[0].model, ModelKind::MaxFlow);
        assert_eq!(success.rankings[1].model, ModelKind::MinCostMaxFlow);
    }

    #[test]
    fn best_model_scores_exactly_one_hundred() {
        let results = BTreeMap::from([
            (
                ModelKind::MinCostMaxFlow,
                run(
                    ModelKind::MinCostMaxFlow,
                    &[
                        ("total_flow", 7.3),
                        ("total_cost", 19.1),
                        ("cost_efficiency", 0.382),
                        ("success_rate", 0.9),
                        ("avg_delay_per_flow", 2.7),
                    ],
                    9,
                    1,
                ),
            ),
            (
                ModelKind::MultiCommodityFlow,
                run(
                    ModelKind::MultiCommodityFlow,
                    &[
                        ("total_allocated", 11.0),
                        ("allocation_ratio", 0.77),
                        ("fairness_index", 0.93),
                        ("avg_edge_utilization", 0.31),
                        ("max_edge_utilization", 0.9),
                        ("success_rate", 1.0),
                    ],
                    10,
                    0,
                ),
            ),
            (ModelKind::MaxFlow, failed(ModelKind::MaxFlow)),
        ]);
        let metrics = extract_metrics(&results);
        let table = create_comparison_table(&metrics);
        let scores = calculate_overall_scores(&table, &metrics);

        let best = scores.values().copied().fold(0.0, f64::max);
        assert_eq!(best, 100.0);
        assert!(scores.values().all(|score| (0.0..=100.0).contains(score)));
        assert_eq!(scores[&ModelKind::MaxFlow], 0.0);

        let ranked = overall_rankings(&scores, &metrics);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].1, 100.0);
        assert_eq!(ranked[2].0, ModelKind::MaxFlow);
    }

    #[test]
    fn doing_nothing_is_not_rewarded() {
        let results = BTreeMap::from([
            (
                ModelKind::MaxFlow,
                run(ModelKind::MaxFlow, &[("success_rate", 0.0)], 0, 4),
            ),
            (
                ModelKind::MinCostMaxFlow,
                run(
                    ModelKind::MinCostMaxFlow,
                    &[
                        ("total_flow", 4.0),
                        ("total_cost", 8.0),
                        ("cost_efficiency", 0.5),
                        ("avg_delay_per_flow", 2.0),
                        ("success_rate", 1.0),
                    ],
                    4,
                    0,
                ),
            ),
        ]);
        let metrics = extract_metrics(&results);
        let table = create_comparison_table(&metrics);
        let scores = calculate_overall_scores(&table, &metrics);
        assert_eq!(scores[&ModelKind::MinCostMaxFlow], 100.0);
        assert!(scores[&ModelKind::MaxFlow] < 50.0);
    }

    #[test]
    fn failed_model_ranks_last_even_against_zero_scores() {
        let scores = BTreeMap::from([
            (ModelKind::MaxFlow, 0.0),
            (ModelKind::MinCostMaxFlow, 0.0),
            (ModelKind::LoadBalancedSp, 100.0),
        ]);
        let metrics = BTreeMap::from([
            (
                ModelKind::MaxFlow,
                ModelMetrics::from([(ERROR_METRIC.to_string(), 1.0)]),
            ),
            (ModelKind::MinCostMaxFlow, ModelMetrics::new()),
            (ModelKind::LoadBalancedSp, ModelMetrics::new()),
        ]);
        let ranked = overall_rankings(&scores, &metrics);
        let order: Vec<ModelKind> = ranked.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            order,
            vec![
                ModelKind::LoadBalancedSp,
                ModelKind::MinCostMaxFlow,
                ModelKind::MaxFlow
            ]
        );
    }
}
