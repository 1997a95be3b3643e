//! Turns a solver assignment into per-agent clusters.

use crate::error::PlannerError;
use crate::matrix::TravelMatrices;
use crate::model::Stop;
use crate::response::{Cluster, RoutedStop};
use crate::traits::RouteAssignment;

/// Build one cluster per agent, in agent order.
///
/// Cumulative time and distance are summed edge by edge from the depot using
/// the same matrices the optimizer saw. Agents without a route, or with an
/// empty one, still get an (empty) cluster. Node 0 is skipped; any other node
/// must map to a stop (`stops[node - 1]`) and be served at most once.
pub fn extract_clusters(
    assignment: &RouteAssignment,
    matrices: &TravelMatrices,
    stops: &[Stop],
    n_agents: usize,
    return_to_depot: bool,
) -> Result<Vec<Cluster>, PlannerError> {
    if assignment.routes.len() > n_agents {
        return Err(PlannerError::Internal(format!(
            "solver returned {} routes for {} agents",
            assignment.routes.len(),
            n_agents
        )));
    }
    if matrices.size() != stops.len() + 1 {
        return Err(PlannerError::Internal(format!(
            "matrix covers {} locations but there are {} stops",
            matrices.size(),
            stops.len()
        )));
    }

    let mut served = vec![false; matrices.size()];
    let mut clusters = Vec::with_capacity(n_agents);

    for agent_id in 0..n_agents {
        let route = assignment.routes.get(agent_id).map(Vec::as_slice).unwrap_or(&[]);
        let mut cluster = Cluster::empty(agent_id);
        let mut prev = 0;

        for &node in route {
            if node == 0 {
                continue;
            }
            if node >= matrices.size() {
                return Err(PlannerError::Internal(format!("route of agent {} visits unknown node {}", agent_id, node)));
            }
            if served[node] {
                return Err(PlannerError::Internal(format!("node {} is visited more than once", node)));
            }
            served[node] = true;

            cluster.total_time_sec += matrices.time(prev, node);
            cluster.total_distance_m += matrices.distance(prev, node);
            cluster.addresses.push(RoutedStop {
                stop: stops[node - 1].clone(),
                sequence: cluster.addresses.len(),
                walk_time_sec: cluster.total_time_sec,
                distance_m: cluster.total_distance_m,
            });
            prev = node;
        }

        cluster.n_addresses = cluster.addresses.len();
        cluster.estimated_walk_time_min = (cluster.total_time_sec as f64 / 60.0).round() as i64;
        if return_to_depot && prev != 0 {
            cluster.return_time_sec = matrices.time(prev, 0);
            cluster.return_distance_m = matrices.distance(prev, 0);
        }
        clusters.push(cluster);
    }

    Ok(clusters)
}

/// Ids of stops whose node is on no route, in stop order.
///
/// Works on node indices, so stops sharing an id are still told apart.
pub fn unassigned_ids(assignment: &RouteAssignment, stops: &[Stop]) -> Vec<String> {
    let mut served = vec![false; stops.len() + 1];
    for &node in assignment.routes.iter().flatten() {
        if let Some(slot) = served.get_mut(node) {
            *slot = true;
        }
    }
    stops
        .iter()
        .enumerate()
        .filter(|(i, _)| !served[i + 1])
        .map(|(_, stop)| stop.id.clone())
        .collect()
}
