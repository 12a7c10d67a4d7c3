//! Edge cost formulas shared by the path-based strategies.

use super::route_compute::LinkAttrs;

/// Static cost: the link delay in milliseconds.
pub fn static_delay_cost(attrs: LinkAttrs) -> f64 {
    attrs.delay
}

/// `delay + alpha * (current_utilization / capacity)^2`.
pub fn utilization_penalty_cost(attrs: LinkAttrs, current_utilization: f64, alpha: f64) -> f64 {
    let penalty = (current_utilization / attrs.capacity).powi(2);
    attrs.delay + alpha * penalty
}

/// Share of capacity the edge would carry once `demand` is added.
pub fn projected_utilization(attrs: LinkAttrs, accumulated: f64, demand: f64) -> f64 {
    (accumulated + demand) / attrs.capacity
}

/// `delay * (1 + beta * ((accumulated + demand) / capacity)^2)`.
pub fn congestion_cost(attrs: LinkAttrs, accumulated: f64, demand: f64, beta: f64) -> f64 {
    let utilization = projected_utilization(attrs, accumulated, demand);
    attrs.delay * (1.0 + beta * utilization.powi(2))
}
