use std::collections::BTreeMap;
use std::fmt;

use chrono::Local;
use serde::Serialize;

use crate::model::{ModelKind, ModelMetrics, ModelRun};

use super::comparator::{
    calculate_overall_scores, create_comparison_table, extract_metrics, overall_rankings,
    MetricComparison, ERROR_METRIC,
};

const SIMILAR_SCORE_STDEV: f64 = 10.0;

/// Headline and use case quoted for the winner of each metric.
const METRIC_RECOMMENDATIONS: [(&str, &str, &str); 14] = [
    ("total_flow", "Highest actual throughput", "For maximum data transfer"),
    ("total_allocated", "Most bandwidth allocated", "For high utilization"),
    ("allocation_ratio", "Best demand fulfillment", "For meeting traffic requirements"),
    ("total_flows_routed", "Most flows actually routed", "For comprehensive routing"),
    ("cost_efficiency", "Most cost-efficient", "For resource-constrained environments"),
    ("fairness_index", "Highest fairness", "For fair bandwidth distribution"),
    ("avg_edge_utilization", "Best network utilization", "For efficient resource use"),
    ("success_rate", "Highest success rate", "For reliability-critical applications"),
    ("avg_delay_per_flow", "Lowest delay", "For latency-sensitive applications"),
    ("max_edge_utilization", "Best load balancing", "For avoiding congestion"),
    ("total_cost", "Lowest routing cost", "For cost-sensitive deployments"),
    ("avg_hops_per_flow", "Shortest paths", "For minimal forwarding overhead"),
    ("routes_generated", "Most routes generated", "For full routing table coverage"),
    ("successful_routes", "Most successful routes", "For dependable next hops"),
];

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub timestamp: String,
    pub models_evaluated: usize,
    pub total_flows: usize,
    pub metrics_comparison: BTreeMap<String, MetricComparison>,
    pub overall_rankings: Vec<(ModelKind, f64)>,
    pub model_scores: BTreeMap<ModelKind, f64>,
    pub recommendations: Vec<String>,
    pub detailed_metrics: BTreeMap<ModelKind, ModelMetrics>,
}

fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

pub fn generate_recommendations(
    table: &BTreeMap<String, MetricComparison>,
    rankings: &[(ModelKind, f64)],
    detailed: &BTreeMap<ModelKind, ModelMetrics>,
) -> Vec<String> {
    let any_valid = detailed
        .values()
        .any(|metrics| !metrics.contains_key(ERROR_METRIC));
    let Some((best, _)) = rankings.first().filter(|_| any_valid) else {
        return vec!["No valid models to compare".to_string()];
    };

    let mut recommendations = vec![format!("Best overall performer: {best}")];
    for (metric, title, use_case) in METRIC_RECOMMENDATIONS {
        if let Some(winner) = table.get(metric).and_then(|cmp| cmp.best_model) {
            recommendations.push(format!("{title}: {winner} ({use_case})"));
        }
    }

    let valid_scores: Vec<f64> = rankings
        .iter()
        .filter(|(kind, _)| {
            detailed
                .get(kind)
                .is_some_and(|metrics| !metrics.contains_key(ERROR_METRIC))
        })
        .map(|(_, score)| *score)
        .collect();
    if valid_scores.len() > 1 {
        if sample_stdev(&valid_scores) < SIMILAR_SCORE_STDEV {
            recommendations.push(
                "Models show similar performance - consider other factors like complexity"
                    .to_string(),
            );
        } else {
            recommendations.push(
                "Significant performance differences exist - model selection matters".to_string(),
            );
        }
    }
    recommendations
}

pub fn generate_report(results: &BTreeMap<ModelKind, ModelRun>) -> ComparisonReport {
    let detailed_metrics = extract_metrics(results);
    let metrics_comparison = create_comparison_table(&detailed_metrics);
    let model_scores = calculate_overall_scores(&metrics_comparison, &detailed_metrics);
    let overall_rankings = overall_rankings(&model_scores, &detailed_metrics);
    let recommendations =
        generate_recommendations(&metrics_comparison, &overall_rankings, &detailed_metrics);

    ComparisonReport {
        timestamp: Local::now().to_rfc3339(),
        models_evaluated: results.len(),
        total_flows: results.values().map(|run| run.routes().len()).sum(),
        metrics_comparison,
        overall_rankings,
        model_scores,
        recommendations,
        detailed_metrics,
    }
}

/// Plain-text digest of a report for the terminal.
pub fn render_summary(report: &ComparisonReport) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_summary(&mut out, report);
    out
}

fn write_summary(out: &mut impl fmt::Write, report: &ComparisonReport) -> fmt::Result {
    let rule = "=".repeat(60);
    writeln!(out, "{rule}")?;
    writeln!(out, "ROUTING MODELS PERFORMANCE COMPARISON")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Models evaluated: {}", report.models_evaluated)?;
    writeln!(out, "Total routes generated: {}", report.total_flows)?;

    writeln!(out, "\nOVERALL RANKINGS:")?;
    for (i, (model, score)) in report.overall_rankings.iter().enumerate() {
        writeln!(out, "{}. {model}: {score:.1}/100", i + 1)?;
    }

    writeln!(out, "\nRECOMMENDATIONS:")?;
    for recommendation in &report.recommendations {
        writeln!(out, "- {recommendation}")?;
    }

    writeln!(out, "\nKEY METRICS WINNERS:")?;
    for (metric, comparison) in &report.metrics_comparison {
        if let (Some(model), Some(value)) = (comparison.best_model, comparison.best_value) {
            let direction = if comparison.lower_is_better { "↓" } else { "↑" };
            writeln!(out, "{metric}: {model} {direction} ({value:.3})")?;
        }
    }
    writeln!(out, "{rule}")
}
