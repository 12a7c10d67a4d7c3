use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::BaselineError;
use crate::model::{DemandSet, ModelKind, ModelOutput, Route, RouteDetail, Topology};

use super::base::{check_demand_endpoints, metric_map, output, ratio, RoutingModel};
use super::cost::static_delay_cost;
use super::route_compute::{shortest_path, EdgeKey, Graph, NetworkGraph, Orientation, PathCandidate};

/// Jain's fairness index `(Σx)² / (n·Σx²)`, 0.0 for an empty or all-zero input.
pub fn jain_fairness_index(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|x| x * x).sum();
    let denominator = values.len() as f64 * sum_sq;
    if denominator > 0.0 {
        sum * sum / denominator
    } else {
        0.0
    }
}

/// One commodity's share of every edge on its shortest-delay path.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityAllocation {
    pub src: u32,
    pub dst: u32,
    pub demand: f64,
    pub path: Vec<u32>,
    /// Allocated flow per path edge, in path order.
    pub edge_flows: Vec<(EdgeKey, f64)>,
}

impl CommodityAllocation {
    pub fn total(&self) -> f64 {
        self.edge_flows.iter().map(|(_, flow)| flow).sum()
    }

    /// First edge leaving `src` with positive allocation, as `(next_hop, flow)`.
    pub fn first_hop(&self) -> Option<(u32, f64)> {
        self.edge_flows
            .iter()
            .filter(|(_, flow)| *flow > 0.0)
            .find_map(|(edge, flow)| edge.other(self.src).map(|hop| (hop, *flow)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLoad {
    pub link: String,
    pub demand: f64,
    pub capacity: f64,
    pub allocation_ratio: f64,
    pub allocated: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiCommoditySolution {
    /// One entry per demand, in demand order.
    pub commodities: Vec<CommodityAllocation>,
    pub edges: BTreeMap<EdgeKey, EdgeLoad>,
    pub total_allocated: f64,
    pub fairness_index: f64,
}

/// Proportional fair-share allocation over independent shortest-delay paths.
#[derive(Debug, Clone)]
pub struct MultiCommodityFlowModel {
    graph: NetworkGraph,
    delays: Graph,
}

impl MultiCommodityFlowModel {
    pub fn new(topology: &Topology) -> Result<Self, BaselineError> {
        let graph = NetworkGraph::from_topology(topology, Orientation::Undirected)?;
        let delays = graph.weight_graph(|_, _, attrs| static_delay_cost(attrs));
        Ok(Self { graph, delays })
    }

    pub fn solve(&self, demands: &DemandSet) -> MultiCommoditySolution {
        // Paths are fixed for the whole pass, so each is computed once.
        let paths: Vec<Option<PathCandidate>> = demands
            .iter()
            .map(|demand| {
                shortest_path(&self.delays, demand.src, demand.dst)
                    .filter(|path| path.hop_count() > 0)
            })
            .collect();

        let mut edge_demands: BTreeMap<EdgeKey, f64> = BTreeMap::new();
        for (demand, path) in demands.iter().zip(&paths) {
            if let Some(path) = path {
                for edge in path.edges() {
                    *edge_demands.entry(edge).or_insert(0.0) += demand.volume;
                }
            }
        }

        let allocation_ratios: BTreeMap<EdgeKey, f64> = edge_demands
            .iter()
            .map(|(edge, total)| {
                let capacity = self.graph.edge_attrs(*edge).map_or(0.0, |attrs| attrs.capacity);
                let share = if *total <= capacity { 1.0 } else { capacity / total };
                (*edge, share)
            })
            .collect();

        let mut allocated: BTreeMap<EdgeKey, f64> = BTreeMap::new();
        let commodities: Vec<CommodityAllocation> = demands
            .iter()
            .zip(paths)
            .map(|(demand, path)| {
                let path = path.map(|p| p.nodes).unwrap_or_default();
                let edge_flows: Vec<(EdgeKey, f64)> = path
                    .windows(2)
                    .map(|pair| {
                        let edge = EdgeKey::new(pair[0], pair[1]);
                        let share = allocation_ratios.get(&edge).copied().unwrap_or(0.0);
                        let flow = demand.volume * share;
                        *allocated.entry(edge).or_insert(0.0) += flow;
                        (edge, flow)
                    })
                    .collect();
                CommodityAllocation {
                    src: demand.src,
                    dst: demand.dst,
                    demand: demand.volume,
                    path,
                    edge_flows,
                }
            })
            .collect();

        let edges = edge_demands
            .iter()
            .map(|(edge, total)| {
                let capacity = self.graph.edge_attrs(*edge).map_or(0.0, |attrs| attrs.capacity);
                let flow = allocated.get(edge).copied().unwrap_or(0.0);
                let load = EdgeLoad {
                    link: edge.label(),
                    demand: *total,
                    capacity,
                    allocation_ratio: allocation_ratios.get(edge).copied().unwrap_or(0.0),
                    allocated: flow,
                    utilization: ratio(flow, capacity),
                };
                (*edge, load)
            })
            .collect();

        let totals: Vec<f64> = commodities.iter().map(CommodityAllocation::total).collect();
        MultiCommoditySolution {
            total_allocated: totals.iter().sum(),
            fairness_index: jain_fairness_index(&totals),
            commodities,
            edges,
        }
    }
}

impl RoutingModel for MultiCommodityFlowModel {
    fn kind(&self) -> ModelKind {
        ModelKind::MultiCommodityFlow
    }

    fn evaluate(&mut self, demands: &DemandSet) -> Result<ModelOutput, BaselineError> {
        check_demand_endpoints(self.kind(), &self.graph, demands)?;

        let solution = self.solve(demands);
        let mut routes = Vec::with_capacity(solution.commodities.len());
        for commodity in &solution.commodities {
            let hop = commodity.first_hop();
            if hop.is_none() {
                debug!(
                    "multi_commodity_flow: nothing allocated {} -> {}",
                    commodity.src, commodity.dst
                );
            }
            let (next_hop, flow) = match hop {
                Some((next_hop, flow)) => (Some(next_hop), flow),
                None => (None, 0.0),
            };
            routes.push(Route {
                src: commodity.src,
                dst: commodity.dst,
                next_hop,
                model: self.kind(),
                path: if next_hop.is_some() {
                    commodity.path.clone()
                } else {
                    Vec::new()
                },
                demand: commodity.demand,
                detail: RouteDetail::MultiCommodityFlow {
                    allocated_flow: flow,
                    allocation_ratio: ratio(flow, commodity.demand),
                },
                error: next_hop.is_none().then(|| "No allocation possible".to_string()),
            });
        }

        let active = solution
            .commodities
            .iter()
            .filter(|commodity| commodity.total() > 0.0)
            .count();
        let utilizations: Vec<f64> = solution.edges.values().map(|load| load.utilization).collect();
        let total_demand = demands.total_volume();
        let commodities = solution.commodities.len() as f64;

        info!(
            "multi_commodity_flow: {}/{} commodities active, allocated {:.3} of {:.3} Mbps, fairness {:.3}",
            active,
            solution.commodities.len(),
            solution.total_allocated,
            total_demand,
            solution.fairness_index
        );

        let metrics = metric_map([
            ("total_demand", total_demand),
            ("total_allocated", solution.total_allocated),
            ("allocation_ratio", ratio(solution.total_allocated, total_demand)),
            ("fairness_index", solution.fairness_index),
            ("success_rate", ratio(active as f64, commodities)),
            (
                "avg_edge_utilization",
                ratio(utilizations.iter().sum(), utilizations.len() as f64),
            ),
            (
                "max_edge_utilization",
                utilizations.iter().copied().fold(0.0, f64::max),
            ),
            ("num_active_flows", active as f64),
        ]);

        let loads: Vec<&EdgeLoad> = solution.edges.values().collect();
        let mut diagnostics: BTreeMap<String, Value> = BTreeMap::new();
        diagnostics.insert("edge_allocations".to_string(), json!(loads));

        Ok(output(routes, metrics, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::model::{Demand, Link};

    #[test]
    fn jain_index_bounds() {
        assert_abs_diff_eq!(jain_fairness_index(&[2.0, 2.0, 2.0, 2.0]), 1.0);
        assert_abs_diff_eq!(jain_fairness_index(&[5.0, 0.0, 0.0]), 1.0 / 3.0);
        assert_abs_diff_eq!(jain_fairness_index(&[4.0, 0.0, 0.0, 0.0, 0.0]), 0.2);
    }

    #[test]
    fn jain_index_degenerate_inputs_are_zero() {
        assert_eq!(jain_fairness_index(&[]), 0.0);
        assert_eq!(jain_fairness_index(&[0.0]), 0.0);
        assert_eq!(jain_fairness_index(&[0.0, 0.0]), 0.0);
    }

    fn shared_bottleneck() -> Topology {
        Topology::new(
            3,
            vec![
                Link::new(0, 1, "4Mbps", "1ms"),
                Link::new(1, 2, "100Mbps", "1ms"),
            ],
        )
    }

    #[test]
    fn oversubscribed_edge_is_shared_proportionally() {
        let model = MultiCommodityFlowModel::new(&shared_bottleneck()).expect("valid topology");
        let demands = DemandSet::aggregate([Demand::new(0, 1, 6.0), Demand::new(0, 2, 2.0)], 0.1);
        let solution = model.solve(&demands);

        let shared = &solution.edges[&EdgeKey::new(0, 1)];
        assert_abs_diff_eq!(shared.demand, 8.0);
        assert_abs_diff_eq!(shared.allocation_ratio, 0.5);
        assert_abs_diff_eq!(shared.allocated, 4.0);
        assert_abs_diff_eq!(shared.utilization, 1.0);

        let spare = &solution.edges[&EdgeKey::new(1, 2)];
        assert_abs_diff_eq!(spare.allocation_ratio, 1.0);
        assert_abs_diff_eq!(spare.allocated, 2.0);

        // Per-commodity totals sum every edge share along the path.
        assert_abs_diff_eq!(solution.commodities[0].total(), 3.0);
        assert_abs_diff_eq!(solution.commodities[1].total(), 3.0);
        assert_abs_diff_eq!(solution.total_allocated, 6.0);
        assert_abs_diff_eq!(solution.fairness_index, 1.0);
    }

    #[test]
    fn routes_and_metrics_follow_the_allocation() {
        let mut model = MultiCommodityFlowModel::new(&shared_bottleneck()).expect("valid topology");
        let demands = DemandSet::aggregate([Demand::new(0, 1, 6.0), Demand::new(0, 2, 2.0)], 0.1);
        let out = model.evaluate(&demands).expect("evaluate");

        assert_eq!(out.routes[1].next_hop, Some(1));
        assert_eq!(out.routes[1].path, vec![0, 1, 2]);
        match out.routes[1].detail {
            RouteDetail::MultiCommodityFlow {
                allocated_flow,
                allocation_ratio,
            } => {
                assert_abs_diff_eq!(allocated_flow, 1.0);
                assert_abs_diff_eq!(allocation_ratio, 0.5);
            }
            ref other => panic!("unexpected detail {other:?}"),
        }

        assert_abs_diff_eq!(out.metrics["total_demand"], 8.0);
        assert_abs_diff_eq!(out.metrics["total_allocated"], 6.0);
        assert_abs_diff_eq!(out.metrics["allocation_ratio"], 0.75);
        assert_abs_diff_eq!(out.metrics["success_rate"], 1.0);
        assert_abs_diff_eq!(out.metrics["max_edge_utilization"], 1.0);
        assert_abs_diff_eq!(out.metrics["avg_edge_utilization"], 0.51, epsilon = 1e-12);
        assert_abs_diff_eq!(out.metrics["num_active_flows"], 2.0);
    }

    #[test]
    fn unreachable_commodity_gets_error_route() {
        let topology = Topology::new(3, vec![Link::new(0, 1, "5Mbps", "2ms")]);
        let mut model = MultiCommodityFlowModel::new(&topology).expect("valid topology");
        let demands = DemandSet::aggregate([Demand::new(0, 2, 1.0), Demand::new(0, 1, 1.0)], 0.1);
        let out = model.evaluate(&demands).expect("evaluate");

        assert_eq!(out.routes[0].next_hop, None);
        assert_eq!(out.routes[0].error.as_deref(), Some("No allocation possible"));
        assert!(out.routes[0].path.is_empty());
        assert_eq!(out.routes[1].next_hop, Some(1));
        assert_abs_diff_eq!(out.metrics["success_rate"], 0.5);
        // One commodity gets everything, the other nothing.
        assert_abs_diff_eq!(out.metrics["fairness_index"], 0.5);
    }
}
