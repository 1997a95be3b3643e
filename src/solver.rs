//! Guided local search routing backend.
//!
//! Formulation: one vehicle per agent starting at node 0, arc cost is travel
//! time, a capacity dimension (demand 1 per stop), a time dimension with an
//! absolute per-route ceiling, and an optional penalty for dropping a stop.
//!
//! Search: a path-cheapest-arc first solution, first-improvement descent over
//! relocate / exchange / 2-opt / reinsertion moves, then guided local search
//! that penalizes the highest-utility arcs of each local optimum.
//! Single-threaded and deterministic apart from where the time limit cuts in.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::PlannerError;
use crate::matrix::TravelMatrices;
use crate::traits::{RouteAssignment, RoutingConstraints, RoutingModel, SolverBackend};

/// Marker for the route end node. Maps to the depot on closed routes and to a
/// free arc on open ones.
const END: usize = usize::MAX;

#[derive(Debug, Clone)]
pub struct SearchParameters {
    /// Stop after this many improving solutions (the first local optimum
    /// counts as one). `None` searches until the time budget runs out.
    pub solution_limit: Option<u32>,
    /// Scales the arc penalty weight against the average arc cost.
    pub lambda_coefficient: f64,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            solution_limit: Some(1),
            lambda_coefficient: 0.1,
        }
    }
}

/// The default backend.
#[derive(Debug, Clone, Default)]
pub struct GuidedLocalSearch {
    pub parameters: SearchParameters,
}

impl GuidedLocalSearch {
    pub fn new(parameters: SearchParameters) -> Self {
        Self { parameters }
    }
}

impl SolverBackend for GuidedLocalSearch {
    type Model = GlsModel;

    fn build_model(
        &self,
        matrices: &TravelMatrices,
        constraints: &RoutingConstraints,
    ) -> Result<GlsModel, PlannerError> {
        if matrices.size() < 2 {
            return Err(PlannerError::Internal(format!(
                "routing model needs a depot and at least one stop, got {} locations",
                matrices.size()
            )));
        }
        if constraints.n_agents == 0 {
            return Err(PlannerError::Internal("routing model needs at least one agent".into()));
        }

        Ok(GlsModel {
            times: matrices.times().to_vec(),
            constraints: constraints.clone(),
            parameters: self.parameters.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GlsModel {
    times: Vec<Vec<i64>>,
    constraints: RoutingConstraints,
    parameters: SearchParameters,
}

impl RoutingModel for GlsModel {
    fn solve(self, budget: Duration) -> Result<RouteAssignment, PlannerError> {
        let deadline = Instant::now().checked_add(budget).ok_or_else(|| {
            PlannerError::Configuration(format!("search time limit of {:?} is out of range", budget))
        })?;
        let mut search = Search::new(&self.times, &self.constraints);

        let mut current = search.construct(deadline)?;
        search.descend(&mut current, deadline);

        let mut best = current.clone();
        let mut best_cost = search.objective(&best);
        let mut solutions = 1u32;
        debug!(objective = best_cost, "first local optimum");

        let limit_reached = |count: u32| self.parameters.solution_limit.is_some_and(|limit| count >= limit);

        if !limit_reached(solutions) && search.init_lambda(&best, self.parameters.lambda_coefficient) {
            let mut iterations = 0u64;
            while Instant::now() < deadline {
                if !search.penalize(&current) {
                    break;
                }
                search.descend(&mut current, deadline);
                iterations += 1;

                let cost = search.objective(&current);
                if cost < best_cost {
                    best = current.clone();
                    best_cost = cost;
                    solutions += 1;
                    debug!(objective = best_cost, iterations, "improved solution");
                    if limit_reached(solutions) {
                        break;
                    }
                }
            }
            debug!(iterations, "guided local search finished");
        }

        info!(
            objective = best_cost,
            dropped = best.dropped.len(),
            solutions,
            "routing search complete"
        );

        let mut dropped = best.dropped;
        dropped.sort_unstable();
        Ok(RouteAssignment {
            routes: best.routes,
            dropped,
            objective: best_cost,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Solution {
    routes: Vec<Vec<usize>>,
    dropped: Vec<usize>,
}

struct Search<'a> {
    times: &'a [Vec<i64>],
    constraints: &'a RoutingConstraints,
    /// GLS feature penalties keyed by undirected arc.
    penalties: HashMap<(usize, usize), i64>,
    lambda: i64,
}

fn prev_of(route: &[usize], i: usize) -> usize {
    if i == 0 { 0 } else { route[i - 1] }
}

fn next_of(route: &[usize], i: usize) -> usize {
    if i + 1 == route.len() { END } else { route[i + 1] }
}

impl<'a> Search<'a> {
    fn new(times: &'a [Vec<i64>], constraints: &'a RoutingConstraints) -> Self {
        Self {
            times,
            constraints,
            penalties: HashMap::new(),
            lambda: 0,
        }
    }

    fn travel(&self, from: usize, to: usize) -> i64 {
        if to == END {
            if self.constraints.return_to_depot { self.times[from][0] } else { 0 }
        } else {
            self.times[from][to]
        }
    }

    fn arc_key(&self, from: usize, to: usize) -> Option<(usize, usize)> {
        let to = if to == END {
            if !self.constraints.return_to_depot {
                return None;
            }
            0
        } else {
            to
        };
        Some((from.min(to), from.max(to)))
    }

    fn penalty(&self, from: usize, to: usize) -> i64 {
        self.arc_key(from, to)
            .and_then(|key| self.penalties.get(&key).copied())
            .unwrap_or(0)
    }

    fn augmented(&self, from: usize, to: usize) -> i64 {
        self.travel(from, to) + self.lambda * self.penalty(from, to)
    }

    fn route_time(&self, route: &[usize]) -> i64 {
        let mut prev = 0;
        let mut total = 0;
        for &node in route {
            total += self.travel(prev, node);
            prev = node;
        }
        total + self.travel(prev, END)
    }

    fn drop_cost(&self) -> i64 {
        self.constraints.drop_penalty.unwrap_or(0)
    }

    /// Real objective: travel time plus drop penalties.
    fn objective(&self, solution: &Solution) -> i64 {
        let travel: i64 = solution.routes.iter().map(|route| self.route_time(route)).sum();
        let dropped = i64::try_from(solution.dropped.len()).unwrap_or(i64::MAX);
        travel.saturating_add(self.drop_cost().saturating_mul(dropped))
    }

    fn fits(&self, len: usize, time: i64) -> bool {
        len <= self.constraints.capacity && time <= self.constraints.route_time_ceiling
    }

    // ========================================================================
    // First solution
    // ========================================================================

    /// Path cheapest arc: extend each agent's path with the cheapest feasible
    /// arc from its last node until nothing fits, then move to the next agent.
    fn construct(&self, deadline: Instant) -> Result<Solution, PlannerError> {
        let n = self.times.len();
        let mut routed = vec![false; n];
        routed[0] = true;
        let mut routes = Vec::with_capacity(self.constraints.n_agents);

        for _ in 0..self.constraints.n_agents {
            let mut route = Vec::new();
            let mut last = 0;
            let mut elapsed = 0;

            while route.len() < self.constraints.capacity {
                if Instant::now() >= deadline {
                    return Err(PlannerError::NoSolution(
                        "time limit reached before a first solution was built".into(),
                    ));
                }

                let mut best: Option<(usize, i64)> = None;
                for node in 1..n {
                    if routed[node] {
                        continue;
                    }
                    let arc = self.times[last][node];
                    if elapsed + arc + self.travel(node, END) > self.constraints.route_time_ceiling {
                        continue;
                    }
                    if best.is_none_or(|(_, cost)| arc < cost) {
                        best = Some((node, arc));
                    }
                }

                let Some((node, arc)) = best else { break };
                routed[node] = true;
                route.push(node);
                elapsed += arc;
                last = node;
            }

            routes.push(route);
        }

        let dropped: Vec<usize> = (1..n).filter(|&node| !routed[node]).collect();
        if !dropped.is_empty() && self.constraints.drop_penalty.is_none() {
            return Err(PlannerError::NoSolution(format!(
                "{} stops cannot be placed within capacity {} and route time ceiling {}s",
                dropped.len(),
                self.constraints.capacity,
                self.constraints.route_time_ceiling
            )));
        }

        Ok(Solution { routes, dropped })
    }

    // ========================================================================
    // Local search
    // ========================================================================

    fn descend(&self, solution: &mut Solution, deadline: Instant) {
        while Instant::now() < deadline && self.improve_once(solution) {}
    }

    /// Apply the first improving move found. Moves are judged on augmented
    /// cost and must keep every route within capacity and the time ceiling.
    fn improve_once(&self, solution: &mut Solution) -> bool {
        let times: Vec<i64> = solution.routes.iter().map(|route| self.route_time(route)).collect();

        self.insert_dropped(solution, &times)
            || self.relocate_between(solution, &times)
            || self.exchange_between(solution, &times)
            || self.relocate_within(solution, &times)
            || self.two_opt(solution, &times)
    }

    /// Cost change of inserting `node` before position `at` of `route`.
    fn insertion_delta(&self, route: &[usize], at: usize, node: usize, cost: impl Fn(usize, usize) -> i64) -> i64 {
        let before = if at == 0 { 0 } else { route[at - 1] };
        let after = if at == route.len() { END } else { route[at] };
        cost(before, node) + cost(node, after) - cost(before, after)
    }

    /// Cost change of removing the node at position `at` of `route`.
    fn removal_delta(&self, route: &[usize], at: usize, cost: impl Fn(usize, usize) -> i64) -> i64 {
        let (prev, node, next) = (prev_of(route, at), route[at], next_of(route, at));
        cost(prev, next) - cost(prev, node) - cost(node, next)
    }

    /// Cost change of putting `node` in place of position `at` of `route`.
    fn replace_delta(&self, route: &[usize], at: usize, node: usize, cost: impl Fn(usize, usize) -> i64) -> i64 {
        let (prev, old, next) = (prev_of(route, at), route[at], next_of(route, at));
        cost(prev, node) + cost(node, next) - cost(prev, old) - cost(old, next)
    }

    fn insert_dropped(&self, solution: &mut Solution, times: &[i64]) -> bool {
        let Some(drop_penalty) = self.constraints.drop_penalty else {
            return false;
        };

        for slot in 0..solution.dropped.len() {
            let node = solution.dropped[slot];
            let mut best: Option<(usize, usize, i64)> = None;

            for (r, route) in solution.routes.iter().enumerate() {
                if route.len() >= self.constraints.capacity {
                    continue;
                }
                for at in 0..=route.len() {
                    let time = times[r] + self.insertion_delta(route, at, node, |a, b| self.travel(a, b));
                    if !self.fits(route.len() + 1, time) {
                        continue;
                    }
                    let delta = self.insertion_delta(route, at, node, |a, b| self.augmented(a, b));
                    if best.is_none_or(|(_, _, d)| delta < d) {
                        best = Some((r, at, delta));
                    }
                }
            }

            if let Some((r, at, delta)) = best {
                if delta < drop_penalty {
                    solution.routes[r].insert(at, node);
                    solution.dropped.swap_remove(slot);
                    return true;
                }
            }
        }

        false
    }

    fn relocate_between(&self, solution: &mut Solution, times: &[i64]) -> bool {
        let routes = &solution.routes;

        for from in 0..routes.len() {
            for i in 0..routes[from].len() {
                let node = routes[from][i];
                let removed_time = times[from] + self.removal_delta(&routes[from], i, |a, b| self.travel(a, b));
                if removed_time > self.constraints.route_time_ceiling {
                    continue;
                }
                let removal = self.removal_delta(&routes[from], i, |a, b| self.augmented(a, b));

                for to in 0..routes.len() {
                    if to == from || routes[to].len() >= self.constraints.capacity {
                        continue;
                    }
                    for at in 0..=routes[to].len() {
                        let time = times[to] + self.insertion_delta(&routes[to], at, node, |a, b| self.travel(a, b));
                        if !self.fits(routes[to].len() + 1, time) {
                            continue;
                        }
                        let insertion = self.insertion_delta(&routes[to], at, node, |a, b| self.augmented(a, b));
                        if removal + insertion < 0 {
                            solution.routes[from].remove(i);
                            solution.routes[to].insert(at, node);
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    fn exchange_between(&self, solution: &mut Solution, times: &[i64]) -> bool {
        let routes = &solution.routes;

        for r1 in 0..routes.len() {
            for r2 in (r1 + 1)..routes.len() {
                for i in 0..routes[r1].len() {
                    for j in 0..routes[r2].len() {
                        let (x, y) = (routes[r1][i], routes[r2][j]);
                        let time1 = times[r1] + self.replace_delta(&routes[r1], i, y, |a, b| self.travel(a, b));
                        let time2 = times[r2] + self.replace_delta(&routes[r2], j, x, |a, b| self.travel(a, b));
                        if time1 > self.constraints.route_time_ceiling || time2 > self.constraints.route_time_ceiling {
                            continue;
                        }
                        let delta = self.replace_delta(&routes[r1], i, y, |a, b| self.augmented(a, b))
                            + self.replace_delta(&routes[r2], j, x, |a, b| self.augmented(a, b));
                        if delta < 0 {
                            solution.routes[r1][i] = y;
                            solution.routes[r2][j] = x;
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    fn relocate_within(&self, solution: &mut Solution, times: &[i64]) -> bool {
        for r in 0..solution.routes.len() {
            let route = &solution.routes[r];
            for i in 0..route.len() {
                let removal_time = self.removal_delta(route, i, |a, b| self.travel(a, b));
                let removal = self.removal_delta(route, i, |a, b| self.augmented(a, b));
                let mut reduced = route.clone();
                let node = reduced.remove(i);

                for at in 0..=reduced.len() {
                    if at == i {
                        continue;
                    }
                    let time = times[r] + removal_time + self.insertion_delta(&reduced, at, node, |a, b| self.travel(a, b));
                    if time > self.constraints.route_time_ceiling {
                        continue;
                    }
                    let insertion = self.insertion_delta(&reduced, at, node, |a, b| self.augmented(a, b));
                    if removal + insertion < 0 {
                        reduced.insert(at, node);
                        solution.routes[r] = reduced;
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Reverse `route[i..=j]`. Inner arcs keep their cost because the
    /// matrices and arc penalties are symmetric; only the two boundary arcs
    /// change.
    fn two_opt(&self, solution: &mut Solution, times: &[i64]) -> bool {
        for r in 0..solution.routes.len() {
            let route = &solution.routes[r];
            let n = route.len();
            for i in 0..n {
                let prev = prev_of(route, i);
                for j in (i + 1)..n {
                    let next = next_of(route, j);
                    let delta_with = |cost: &dyn Fn(usize, usize) -> i64| {
                        cost(prev, route[j]) + cost(route[i], next) - cost(prev, route[i]) - cost(route[j], next)
                    };
                    let time = times[r] + delta_with(&|a, b| self.travel(a, b));
                    if time > self.constraints.route_time_ceiling {
                        continue;
                    }
                    if delta_with(&|a, b| self.augmented(a, b)) < 0 {
                        solution.routes[r][i..=j].reverse();
                        return true;
                    }
                }
            }
        }

        false
    }

    // ========================================================================
    // Guided local search
    // ========================================================================

    fn arcs(solution: &Solution) -> Vec<(usize, usize)> {
        let mut arcs = Vec::new();
        for route in &solution.routes {
            let mut prev = 0;
            for &node in route {
                arcs.push((prev, node));
                prev = node;
            }
            if !route.is_empty() {
                arcs.push((prev, END));
            }
        }
        arcs
    }

    /// Set the penalty weight from the first local optimum. Returns false
    /// when there is nothing to penalize.
    fn init_lambda(&mut self, solution: &Solution, coefficient: f64) -> bool {
        let arcs = Self::arcs(solution);
        if arcs.is_empty() {
            return false;
        }
        let travel: i64 = arcs.iter().map(|&(a, b)| self.travel(a, b)).sum();
        self.lambda = ((coefficient * travel as f64 / arcs.len() as f64).round() as i64).max(1);
        true
    }

    /// Penalize the arcs of `solution` with maximal utility
    /// `cost / (1 + penalty)`. Returns false when every arc is free.
    fn penalize(&mut self, solution: &Solution) -> bool {
        let mut best_utility = 0.0;
        let mut chosen: Vec<(usize, usize)> = Vec::new();

        for (from, to) in Self::arcs(solution) {
            let Some(key) = self.arc_key(from, to) else { continue };
            let cost = self.travel(from, to);
            if cost == 0 {
                continue;
            }
            let utility = cost as f64 / (1 + self.penalty(from, to)) as f64;
            if utility > best_utility {
                best_utility = utility;
                chosen.clear();
                chosen.push(key);
            } else if utility == best_utility && !chosen.contains(&key) {
                chosen.push(key);
            }
        }

        if chosen.is_empty() {
            return false;
        }
        for key in chosen {
            *self.penalties.entry(key).or_insert(0) += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Nodes on a line; travel time is the gap between positions.
    fn line_matrices(positions: &[i64]) -> TravelMatrices {
        let n = positions.len();
        let mut grid = vec![vec![0; n]; n];
        for i in 0..n {
            for j in 0..n {
                grid[i][j] = (positions[i] - positions[j]).abs();
            }
        }
        TravelMatrices::from_grids(grid.clone(), grid).unwrap()
    }

    fn constraints(n_agents: usize, capacity: usize) -> RoutingConstraints {
        RoutingConstraints {
            n_agents,
            capacity,
            route_time_ceiling: 14_400,
            return_to_depot: true,
            drop_penalty: Some(1_000_000),
        }
    }

    fn solve(matrices: &TravelMatrices, constraints: &RoutingConstraints, parameters: SearchParameters) -> RouteAssignment {
        GuidedLocalSearch::new(parameters)
            .build_model(matrices, constraints)
            .unwrap()
            .solve(Duration::from_secs(2))
            .unwrap()
    }

    fn served(assignment: &RouteAssignment) -> Vec<usize> {
        let mut nodes: Vec<usize> = assignment.routes.iter().flatten().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    #[test]
    fn test_single_agent_visits_line_in_order() {
        let matrices = line_matrices(&[0, 10, 20, 30, 40]);
        let assignment = solve(&matrices, &constraints(1, 10), SearchParameters::default());

        assert_eq!(assignment.routes, vec![vec![1, 2, 3, 4]]);
        assert!(assignment.dropped.is_empty());
        assert_eq!(assignment.objective, 80);
    }

    #[test]
    fn test_capacity_respected() {
        let matrices = line_matrices(&[0, 10, 20, 30, 40, 50, 60]);
        let assignment = solve(&matrices, &constraints(3, 2), SearchParameters::default());

        assert_eq!(assignment.routes.len(), 3);
        for route in &assignment.routes {
            assert!(route.len() <= 2);
        }
        assert_eq!(served(&assignment), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_drops_when_capacity_short() {
        let matrices = line_matrices(&[0, 10, 20, 30, 40, 50]);
        let assignment = solve(&matrices, &constraints(1, 1), SearchParameters::default());

        assert_eq!(assignment.routes[0].len(), 1);
        assert_eq!(assignment.dropped.len(), 4);
        // Cheapest stop to serve is the nearest one.
        assert_eq!(assignment.routes[0], vec![1]);
        assert_eq!(assignment.objective, 20 + 4 * 1_000_000);
    }

    #[test]
    fn test_mandatory_stops_fail_when_capacity_short() {
        let matrices = line_matrices(&[0, 10, 20, 30]);
        let mut constraints = constraints(1, 1);
        constraints.drop_penalty = None;

        let result = GuidedLocalSearch::default()
            .build_model(&matrices, &constraints)
            .unwrap()
            .solve(Duration::from_secs(1));
        assert!(matches!(result, Err(PlannerError::NoSolution(_))));
    }

    #[test]
    fn test_time_ceiling_respected() {
        // Round trip to the far stop (2 x 5000) exceeds a 6000s ceiling.
        let matrices = line_matrices(&[0, 100, 200, 5000]);
        let mut constraints = constraints(2, 10);
        constraints.route_time_ceiling = 6000;

        let assignment = solve(&matrices, &constraints, SearchParameters::default());
        assert_eq!(assignment.dropped, vec![3]);
        for route in &assignment.routes {
            let search = Search::new(matrices.times(), &constraints);
            assert!(search.route_time(route) <= 6000);
        }
    }

    #[test]
    fn test_open_routes_ignore_return_leg() {
        let matrices = line_matrices(&[0, 10, 20, 30]);
        let mut constraints = constraints(1, 10);
        constraints.return_to_depot = false;

        let assignment = solve(&matrices, &constraints, SearchParameters::default());
        assert_eq!(assignment.routes, vec![vec![1, 2, 3]]);
        assert_eq!(assignment.objective, 30);
    }

    #[test]
    fn test_guided_search_never_worse_than_first_optimum() {
        let positions = [0, 70, 15, 90, 40, 5, 60, 25, 85, 50];
        let matrices = line_matrices(&positions);
        let constraints = constraints(3, 4);

        let first = solve(&matrices, &constraints, SearchParameters::default());
        let guided = GuidedLocalSearch::new(SearchParameters {
            solution_limit: None,
            ..SearchParameters::default()
        })
        .build_model(&matrices, &constraints)
        .unwrap()
        .solve(Duration::from_millis(200))
        .unwrap();

        assert!(guided.objective <= first.objective);
        assert_eq!(served(&guided), (1..positions.len()).collect::<Vec<_>>());
        for route in &guided.routes {
            assert!(route.len() <= 4);
        }
    }

    #[test]
    fn test_solve_is_deterministic() {
        let matrices = line_matrices(&[0, 33, 12, 48, 7, 21, 40]);
        let constraints = constraints(2, 4);
        let a = solve(&matrices, &constraints, SearchParameters::default());
        let b = solve(&matrices, &constraints, SearchParameters::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unrepresentable_budget_is_configuration_error() {
        let matrices = line_matrices(&[0, 10, 20]);
        let result = GuidedLocalSearch::default()
            .build_model(&matrices, &constraints(1, 10))
            .unwrap()
            .solve(Duration::MAX);
        assert!(matches!(result, Err(PlannerError::Configuration(_))));
    }

    #[test]
    fn test_objective_saturates_on_huge_penalty() {
        let matrices = line_matrices(&[0, 10, 20, 30]);
        let mut constraints = constraints(1, 1);
        constraints.drop_penalty = Some(i64::MAX / 2);
        let search = Search::new(matrices.times(), &constraints);
        let solution = Solution {
            routes: vec![vec![1]],
            dropped: vec![2, 3],
        };
        assert_eq!(search.objective(&solution), i64::MAX);
    }

    #[test]
    fn test_build_model_rejects_missing_agents() {
        let matrices = line_matrices(&[0, 10]);
        let result = GuidedLocalSearch::default().build_model(&matrices, &constraints(0, 1));
        assert!(result.is_err());
    }

    #[test]
    fn test_penalize_targets_longest_arc() {
        let matrices = line_matrices(&[0, 10, 100]);
        let constraints = constraints(1, 10);
        let mut search = Search::new(matrices.times(), &constraints);
        let solution = Solution {
            routes: vec![vec![1, 2]],
            dropped: Vec::new(),
        };

        assert!(search.penalize(&solution));
        // 0-1 costs 10, 1-2 costs 90, 2-end costs 100.
        assert_eq!(search.penalties.get(&(0, 2)), Some(&1));
        assert_eq!(search.penalties.len(), 1);
    }
}
