use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::BaselineError;
use crate::model::{DemandSet, ModelKind, ModelOutput, Route, RouteDetail, Topology};

use super::base::{check_demand_endpoints, metric_map, output, ratio, RoutingModel};
use super::route_compute::{compute_max_flow, Graph, MaxFlowResult, NetworkGraph, Orientation};

/// An arc whose used/capacity ratio crossed the bottleneck threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bottleneck {
    pub link: String,
    pub utilization: f64,
    pub capacity: f64,
    pub used: f64,
}

/// Reports the network's achievable max-flow per demand pair. The requested
/// volume never bounds the computed flow.
#[derive(Debug, Clone)]
pub struct MaxFlowModel {
    graph: NetworkGraph,
    capacities: Graph,
    bottleneck_threshold: f64,
    max_reported_bottlenecks: usize,
}

impl MaxFlowModel {
    pub fn new(
        topology: &Topology,
        bottleneck_threshold: f64,
        max_reported_bottlenecks: usize,
    ) -> Result<Self, BaselineError> {
        let graph = NetworkGraph::from_topology(topology, Orientation::Directed)?;
        let capacities = graph.capacity_graph();
        Ok(Self {
            graph,
            capacities,
            bottleneck_threshold,
            max_reported_bottlenecks,
        })
    }

    pub fn compute_pair(&self, source: u32, sink: u32) -> MaxFlowResult {
        compute_max_flow(&self.capacities, source, sink)
    }

    pub fn bottlenecks(&self, result: &MaxFlowResult) -> Vec<Bottleneck> {
        result
            .arcs
            .iter()
            .filter(|arc| arc.utilization() > self.bottleneck_threshold)
            .map(|arc| Bottleneck {
                link: format!("{}->{}", arc.from, arc.to),
                utilization: arc.utilization(),
                capacity: arc.capacity,
                used: arc.flow,
            })
            .collect()
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }
}

impl RoutingModel for MaxFlowModel {
    fn kind(&self) -> ModelKind {
        ModelKind::MaxFlow
    }

    fn evaluate(&mut self, demands: &DemandSet) -> Result<ModelOutput, BaselineError> {
        check_demand_endpoints(self.kind(), &self.graph, demands)?;

        let mut routes = Vec::with_capacity(demands.len());
        let mut total_max_flow = 0.0;
        let mut successful = 0_usize;
        let mut bottlenecks: Vec<Bottleneck> = Vec::new();

        for demand in demands.iter() {
            let result = self.compute_pair(demand.src, demand.dst);
            total_max_flow += result.value;
            bottlenecks.extend(self.bottlenecks(&result));

            let next_hop = if result.value > 0.0 {
                result.first_hop_from(demand.src)
            } else {
                None
            };
            if next_hop.is_some() {
                successful += 1;
            } else {
                debug!("max_flow: no path {} -> {}", demand.src, demand.dst);
            }

            routes.push(Route {
                src: demand.src,
                dst: demand.dst,
                next_hop,
                model: self.kind(),
                path: Vec::new(),
                demand: demand.volume,
                detail: RouteDetail::MaxFlow {
                    max_flow: if next_hop.is_some() { result.value } else { 0.0 },
                },
                error: next_hop.is_none().then(|| "No path available".to_string()),
            });
        }

        let pairs = demands.len() as f64;
        let num_bottlenecks = bottlenecks.len();
        bottlenecks.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
        bottlenecks.truncate(self.max_reported_bottlenecks);

        info!(
            "max_flow: {} pairs, total {:.3} Mbps, {} bottleneck arcs",
            demands.len(),
            total_max_flow,
            num_bottlenecks
        );

        let metrics = metric_map([
            ("total_max_flow", total_max_flow),
            ("success_rate", ratio(successful as f64, pairs)),
            ("num_bottlenecks", num_bottlenecks as f64),
            ("avg_flow_per_pair", ratio(total_max_flow, pairs)),
        ]);

        let mut diagnostics: BTreeMap<String, Value> = BTreeMap::new();
        diagnostics.insert("bottleneck_links".to_string(), json!(bottlenecks));

        Ok(output(routes, metrics, diagnostics))
    }
}
