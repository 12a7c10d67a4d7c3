use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::BaselineError;
use crate::model::{Demand, DemandSet, ModelKind, ModelOutput, Route, RouteDetail, Topology};

use super::base::{check_demand_endpoints, metric_map, output, ratio, RoutingModel};
use super::cost::{congestion_cost, projected_utilization};
use super::route_compute::{shortest_path, EdgeKey, NetworkGraph, Orientation, PathCandidate};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeUtilization {
    pub link: String,
    pub load: f64,
    pub capacity: f64,
    pub utilization: f64,
}

/// Congestion-aware shortest path. Each routed demand raises the cost of the
/// edges it used for every later demand in the same pass.
#[derive(Debug, Clone)]
pub struct LoadBalancedSpModel {
    graph: NetworkGraph,
    beta: f64,
    /// Accumulated demand per undirected edge; only this instance touches it.
    utilization: BTreeMap<EdgeKey, f64>,
}

impl LoadBalancedSpModel {
    pub fn new(topology: &Topology, beta: f64) -> Result<Self, BaselineError> {
        let graph = NetworkGraph::from_topology(topology, Orientation::Undirected)?;
        Ok(Self {
            graph,
            beta,
            utilization: BTreeMap::new(),
        })
    }

    pub fn utilization(&self) -> &BTreeMap<EdgeKey, f64> {
        &self.utilization
    }

    pub fn reset_utilization(&mut self) {
        self.utilization.clear();
    }

    fn accumulated(&self, u: u32, v: u32) -> f64 {
        self.utilization
            .get(&EdgeKey::new(u, v))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn edge_cost(&self, u: u32, v: u32, demand: f64) -> Option<f64> {
        self.graph
            .attrs(u, v)
            .map(|attrs| congestion_cost(attrs, self.accumulated(u, v), demand, self.beta))
    }

    /// Cheapest path under the current utilization. Weights are rebuilt on
    /// every call.
    pub fn find_path(&self, src: u32, dst: u32, demand: f64) -> Option<PathCandidate> {
        let weights = self.graph.weight_graph(|u, v, attrs| {
            congestion_cost(attrs, self.accumulated(u, v), demand, self.beta)
        });
        shortest_path(&weights, src, dst).filter(|path| path.hop_count() > 0)
    }

    pub fn update_utilization(&mut self, path: &[u32], demand: f64) {
        for pair in path.windows(2) {
            *self
                .utilization
                .entry(EdgeKey::new(pair[0], pair[1]))
                .or_insert(0.0) += demand;
        }
    }

    /// Routes one demand against the current state and records its load.
    pub fn route_demand(&mut self, demand: &Demand) -> Route {
        let Some(path) = self.find_path(demand.src, demand.dst, demand.volume) else {
            debug!("load_balanced_sp: no path {} -> {}", demand.src, demand.dst);
            return Route {
                src: demand.src,
                dst: demand.dst,
                next_hop: None,
                model: ModelKind::LoadBalancedSp,
                path: Vec::new(),
                demand: demand.volume,
                detail: RouteDetail::LoadBalancedSp {
                    path_cost: f64::INFINITY,
                    total_delay: f64::INFINITY,
                    max_utilization: 1.0,
                    hop_count: 0,
                },
                error: Some("No path available".to_string()),
            };
        };

        let mut total_delay = 0.0;
        let mut max_utilization: f64 = 0.0;
        for (u, v) in path.arcs() {
            if let Some(attrs) = self.graph.attrs(u, v) {
                total_delay += attrs.delay;
                let projected = projected_utilization(attrs, self.accumulated(u, v), demand.volume);
                max_utilization = max_utilization.max(projected);
            }
        }

        self.update_utilization(&path.nodes, demand.volume);

        Route {
            src: demand.src,
            dst: demand.dst,
            next_hop: path.next_hop(),
            model: ModelKind::LoadBalancedSp,
            demand: demand.volume,
            detail: RouteDetail::LoadBalancedSp {
                path_cost: path.cost,
                total_delay,
                max_utilization,
                hop_count: path.hop_count(),
            },
            path: path.nodes,
            error: None,
        }
    }

    /// One full pass: clears utilization, then routes the largest demands first.
    pub fn route_all(&mut self, demands: &DemandSet) -> Vec<Route> {
        self.reset_utilization();
        demands
            .by_descending_volume()
            .into_iter()
            .map(|demand| self.route_demand(&demand))
            .collect()
    }

    pub fn edge_utilizations(&self) -> Vec<EdgeUtilization> {
        self.utilization
            .iter()
            .map(|(edge, load)| {
                let capacity = self.graph.edge_attrs(*edge).map_or(0.0, |attrs| attrs.capacity);
                EdgeUtilization {
                    link: edge.label(),
                    load: *load,
                    capacity,
                    utilization: ratio(*load, capacity),
                }
            })
            .collect()
    }
}

impl RoutingModel for LoadBalancedSpModel {
    fn kind(&self) -> ModelKind {
        ModelKind::LoadBalancedSp
    }

    fn evaluate(&mut self, demands: &DemandSet) -> Result<ModelOutput, BaselineError> {
        check_demand_endpoints(self.kind(), &self.graph, demands)?;

        let routes = self.route_all(demands);

        let mut routed = 0_usize;
        let mut total_delay = 0.0;
        let mut total_cost = 0.0;
        let mut total_hops = 0_usize;
        let mut max_utilization: f64 = 0.0;
        for route in &routes {
            if let RouteDetail::LoadBalancedSp {
                path_cost,
                total_delay: delay,
                max_utilization: utilization,
                hop_count,
            } = route.detail
            {
                max_utilization = max_utilization.max(utilization);
                if route.is_routed() {
                    routed += 1;
                    total_delay += delay;
                    total_cost += path_cost;
                    total_hops += hop_count;
                }
            }
        }

        let edges = self.edge_utilizations();
        let edge_values: Vec<f64> = edges.iter().map(|edge| edge.utilization).collect();
        let routed_f = routed as f64;

        info!(
            "load_balanced_sp: routed {}/{} flows over {} edges (beta {})",
            routed,
            routes.len(),
            edges.len(),
            self.beta
        );

        let metrics = metric_map([
            ("avg_delay_per_flow", ratio(total_delay, routed_f)),
            ("avg_cost_per_flow", ratio(total_cost, routed_f)),
            ("avg_hops_per_flow", ratio(total_hops as f64, routed_f)),
            ("max_utilization", max_utilization),
            (
                "max_edge_utilization",
                edge_values.iter().copied().fold(0.0, f64::max),
            ),
            (
                "avg_edge_utilization",
                ratio(edge_values.iter().sum(), edge_values.len() as f64),
            ),
            ("success_rate", ratio(routed_f, routes.len() as f64)),
            ("total_flows_routed", routed_f),
            ("beta", self.beta),
        ]);

        let mut diagnostics: BTreeMap<String, Value> = BTreeMap::new();
        diagnostics.insert("edge_utilization".to_string(), json!(edges));

        Ok(output(routes, metrics, diagnostics))
    }
}
