use std::collections::{BTreeMap, BTreeSet};

use super::frontier::DistanceFrontier;
use super::{Graph, PathCandidate, SpfTreeResult};

const EPS: f64 = 1e-9;

fn edge_cost_supported(edge_cost: f64) -> bool {
    edge_cost.is_finite() && edge_cost >= 0.0
}

/// Dijkstra from `src`. Equal-cost ties prefer the lower first hop, then the
/// lower parent, so repeated runs on the same graph pick the same tree.
pub fn compute_spf_tree(graph: &Graph, src: u32) -> SpfTreeResult {
    let mut dist: BTreeMap<u32, f64> = BTreeMap::new();
    let mut first_hop: BTreeMap<u32, u32> = BTreeMap::new();
    let mut parent: BTreeMap<u32, u32> = BTreeMap::new();
    let mut settled: BTreeSet<u32> = BTreeSet::new();
    let mut frontier = DistanceFrontier::new();

    dist.insert(src, 0.0);
    frontier.push(src, 0.0);

    while let Some((u, cost_u)) = frontier.pop_min(|node, cost| {
        settled.contains(&node)
            || dist
                .get(&node)
                .map_or(true, |best| cost > *best + EPS)
    }) {
        settled.insert(u);

        let Some(neighbors) = graph.get(&u) else {
            continue;
        };
        for (v, edge_cost) in neighbors {
            if settled.contains(v) || !edge_cost_supported(*edge_cost) {
                continue;
            }

            let candidate_metric = cost_u + *edge_cost;
            let candidate_hop = if u == src {
                *v
            } else {
                first_hop.get(&u).copied().unwrap_or(*v)
            };

            let best_metric = dist.get(v).copied().unwrap_or(f64::INFINITY);
            let best_hop = first_hop.get(v).copied().unwrap_or(u32::MAX);
            let best_parent = parent.get(v).copied().unwrap_or(u32::MAX);

            let better_metric = candidate_metric + EPS < best_metric;
            let equal_metric = (candidate_metric - best_metric).abs() <= EPS;
            let better_hop = equal_metric && candidate_hop < best_hop;
            let better_parent = equal_metric && candidate_hop == best_hop && u < best_parent;

            if better_metric || better_hop || better_parent {
                dist.insert(*v, candidate_metric);
                first_hop.insert(*v, candidate_hop);
                parent.insert(*v, u);
                if better_metric {
                    frontier.push(*v, candidate_metric);
                }
            }
        }
    }

    SpfTreeResult {
        dist,
        first_hop,
        parent,
    }
}

/// Walks the parent chain of a finished SPF tree back from `dst`.
pub fn reconstruct_path(tree: &SpfTreeResult, src: u32, dst: u32) -> Option<PathCandidate> {
    let cost = tree.dist.get(&dst).copied().filter(|c| c.is_finite())?;

    let mut nodes = vec![dst];
    let mut current = dst;
    let max_steps = tree.parent.len() + 1;
    for _ in 0..max_steps {
        if current == src {
            nodes.reverse();
            return Some(PathCandidate { nodes, cost });
        }
        current = tree.parent.get(&current).copied()?;
        nodes.push(current);
    }

    None
}

pub fn shortest_path(graph: &Graph, src: u32, dst: u32) -> Option<PathCandidate> {
    let tree = compute_spf_tree(graph, src);
    reconstruct_path(&tree, src, dst)
}
