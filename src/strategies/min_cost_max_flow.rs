use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::BaselineError;
use crate::model::{Demand, DemandSet, ModelKind, ModelOutput, Route, RouteDetail, Topology};

use super::base::{check_demand_endpoints, metric_map, output, ratio, RoutingModel};
use super::cost::{static_delay_cost, utilization_penalty_cost};
use super::route_compute::{shortest_path, Graph, NetworkGraph, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocatedArc {
    pub from: u32,
    pub to: u32,
    pub flow: f64,
    pub capacity: f64,
    pub delay: f64,
}

/// Flow placed on the single shortest-delay path of one demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathAllocation {
    pub src: u32,
    pub dst: u32,
    pub demand: f64,
    pub path: Vec<u32>,
    pub flow: f64,
    pub path_delay: f64,
    pub total_cost: f64,
    pub arcs: Vec<AllocatedArc>,
}

/// Shortest-delay path per demand, flow capped by the path's narrowest link.
#[derive(Debug, Clone)]
pub struct MinCostMaxFlowModel {
    graph: NetworkGraph,
    delays: Graph,
    alpha: f64,
}

impl MinCostMaxFlowModel {
    pub fn new(topology: &Topology, alpha: f64) -> Result<Self, BaselineError> {
        let graph = NetworkGraph::from_topology(topology, Orientation::Directed)?;
        let delays = graph.weight_graph(|_, _, attrs| static_delay_cost(attrs));
        Ok(Self {
            graph,
            delays,
            alpha,
        })
    }

    /// Delay plus the alpha-weighted utilization penalty of arc `u -> v`.
    ///
    /// Path selection in [`MinCostMaxFlowModel::allocate`] uses plain delay;
    /// this cost is exposed for callers comparing against the congestion-aware
    /// strategies.
    pub fn dynamic_cost(&self, u: u32, v: u32, current_utilization: f64) -> Option<f64> {
        self.graph
            .attrs(u, v)
            .map(|attrs| utilization_penalty_cost(attrs, current_utilization, self.alpha))
    }

    pub fn allocate(&self, demand: &Demand) -> Option<PathAllocation> {
        let path = shortest_path(&self.delays, demand.src, demand.dst)?;
        if path.hop_count() == 0 {
            return None;
        }

        let mut min_capacity = f64::INFINITY;
        let mut path_delay = 0.0;
        for (u, v) in path.arcs() {
            let attrs = self.graph.attrs(u, v)?;
            min_capacity = min_capacity.min(attrs.capacity);
            path_delay += attrs.delay;
        }

        let flow = demand.volume.min(min_capacity);
        let arcs = path
            .arcs()
            .filter_map(|(u, v)| {
                self.graph.attrs(u, v).map(|attrs| AllocatedArc {
                    from: u,
                    to: v,
                    flow,
                    capacity: attrs.capacity,
                    delay: attrs.delay,
                })
            })
            .collect();

        Some(PathAllocation {
            src: demand.src,
            dst: demand.dst,
            demand: demand.volume,
            path: path.nodes,
            flow,
            path_delay,
            total_cost: flow * path_delay,
            arcs,
        })
    }
}

impl RoutingModel for MinCostMaxFlowModel {
    fn kind(&self) -> ModelKind {
        ModelKind::MinCostMaxFlow
    }

    fn evaluate(&mut self, demands: &DemandSet) -> Result<ModelOutput, BaselineError> {
        check_demand_endpoints(self.kind(), &self.graph, demands)?;

        let mut routes = Vec::with_capacity(demands.len());
        let mut allocations = Vec::new();
        let mut total_flow = 0.0;
        let mut total_cost = 0.0;
        let mut total_delay = 0.0;
        let mut successful = 0_usize;

        for demand in demands.iter() {
            match self.allocate(demand).filter(|alloc| alloc.flow > 0.0) {
                Some(alloc) => {
                    successful += 1;
                    total_flow += alloc.flow;
                    total_cost += alloc.total_cost;
                    total_delay += alloc.path_delay;
                    routes.push(Route {
                        src: demand.src,
                        dst: demand.dst,
                        next_hop: alloc.path.get(1).copied(),
                        model: self.kind(),
                        path: alloc.path.clone(),
                        demand: demand.volume,
                        detail: RouteDetail::MinCostMaxFlow {
                            flow: alloc.flow,
                            cost: alloc.total_cost,
                            avg_delay: alloc.path_delay,
                        },
                        error: None,
                    });
                    allocations.push(alloc);
                }
                None => {
                    debug!("min_cost_max_flow: no path {} -> {}", demand.src, demand.dst);
                    routes.push(Route {
                        src: demand.src,
                        dst: demand.dst,
                        next_hop: None,
                        model: self.kind(),
                        path: Vec::new(),
                        demand: demand.volume,
                        detail: RouteDetail::MinCostMaxFlow {
                            flow: 0.0,
                            cost: 0.0,
                            avg_delay: 0.0,
                        },
                        error: Some("No feasible path".to_string()),
                    });
                }
            }
        }

        let pairs = demands.len() as f64;
        info!(
            "min_cost_max_flow: {}/{} pairs allocated, flow {:.3} Mbps, cost {:.3}",
            successful,
            demands.len(),
            total_flow,
            total_cost
        );

        let metrics = metric_map([
            ("total_flow", total_flow),
            ("total_cost", total_cost),
            ("avg_delay_per_flow", ratio(total_delay, pairs)),
            ("success_rate", ratio(successful as f64, pairs)),
            ("cost_efficiency", ratio(total_flow, total_cost)),
            ("alpha", self.alpha),
        ]);

        let mut diagnostics: BTreeMap<String, Value> = BTreeMap::new();
        diagnostics.insert("flow_allocations".to_string(), json!(allocations));

        Ok(output(routes, metrics, diagnostics))
    }
}
