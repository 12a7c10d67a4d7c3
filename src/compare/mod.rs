pub mod comparator;
pub mod report;

pub use comparator::{
    calculate_overall_scores, create_comparison_table, extract_metrics, normalized_score,
    MetricComparison, MetricRanking, MetricSample, NormalizationRule, COMPARISON_METRICS,
};
pub use report::{generate_report, render_summary, ComparisonReport};
