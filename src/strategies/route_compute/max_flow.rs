use std::collections::{BTreeMap, VecDeque};

use super::{FlowArc, Graph, MaxFlowResult};

const EPS: f64 = 1e-9;

type Residual = BTreeMap<u32, BTreeMap<u32, f64>>;

fn residual_of(residual: &Residual, u: u32, v: u32) -> f64 {
    residual
        .get(&u)
        .and_then(|neighbors| neighbors.get(&v))
        .copied()
        .unwrap_or(0.0)
}

fn adjust(residual: &mut Residual, u: u32, v: u32, delta: f64) {
    *residual.entry(u).or_default().entry(v).or_insert(0.0) += delta;
}

fn build_residual(capacities: &Graph) -> Residual {
    let mut residual: Residual = BTreeMap::new();
    for (u, neighbors) in capacities {
        residual.entry(*u).or_default();
        for (v, capacity) in neighbors {
            if !capacity.is_finite() || *capacity <= 0.0 {
                continue;
            }
            adjust(&mut residual, *u, *v, *capacity);
            residual.entry(*v).or_default().entry(*u).or_insert(0.0);
        }
    }
    residual
}

/// Breadth-first search for the shortest augmenting path in the residual graph.
fn augmenting_path(residual: &Residual, source: u32, sink: u32) -> Option<Vec<u32>> {
    let mut pred: BTreeMap<u32, u32> = BTreeMap::new();
    let mut queue = VecDeque::from([source]);

    while let Some(u) = queue.pop_front() {
        let Some(neighbors) = residual.get(&u) else {
            continue;
        };
        for (v, remaining) in neighbors {
            if *v == source || pred.contains_key(v) || *remaining <= EPS {
                continue;
            }
            pred.insert(*v, u);
            if *v == sink {
                let mut path = vec![sink];
                let mut current = sink;
                while current != source {
                    current = *pred.get(&current)?;
                    path.push(current);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(*v);
        }
    }

    None
}

/// Edmonds-Karp maximum flow over independent directed arc capacities.
///
/// Every call starts from an empty flow; nothing carries over between pairs.
pub fn compute_max_flow(capacities: &Graph, source: u32, sink: u32) -> MaxFlowResult {
    if source == sink || !capacities.contains_key(&source) || !capacities.contains_key(&sink) {
        return MaxFlowResult::default();
    }

    let mut residual = build_residual(capacities);
    let mut value = 0.0;

    while let Some(path) = augmenting_path(&residual, source, sink) {
        let bottleneck = path
            .windows(2)
            .map(|pair| residual_of(&residual, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min);
        if !bottleneck.is_finite() || bottleneck <= EPS {
            break;
        }
        for pair in path.windows(2) {
            adjust(&mut residual, pair[0], pair[1], -bottleneck);
            adjust(&mut residual, pair[1], pair[0], bottleneck);
        }
        value += bottleneck;
    }

    let mut arcs = Vec::new();
    for (u, neighbors) in capacities {
        for (v, capacity) in neighbors {
            let used = capacity - residual_of(&residual, *u, *v);
            if used > EPS {
                arcs.push(FlowArc {
                    from: *u,
                    to: *v,
                    flow: used.min(*capacity),
                    capacity: *capacity,
                });
            }
        }
    }

    MaxFlowResult { value, arcs }
}
