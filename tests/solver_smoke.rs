use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use canvass_planner::error::PlannerError;
use canvass_planner::matrix::TravelMatrices;
use canvass_planner::model::Stop;
use canvass_planner::response::{PlanOutcome, INTERNAL_FAILURE_MESSAGE};
use canvass_planner::traits::{RouteAssignment, RoutingConstraints, RoutingModel, SolverBackend};
use canvass_planner::{Planner, PlannerConfig, RouteRequest};

/// What the mock model does when solved.
#[derive(Clone, Copy)]
enum Behaviour {
    /// Deal stops round-robin over the agents in node order.
    RoundRobin,
    NoSolution,
    Panic,
    /// Return a node that does not exist.
    Garbage,
}

struct MockBackend {
    behaviour: Behaviour,
    calls: Rc<Cell<usize>>,
}

struct MockModel {
    behaviour: Behaviour,
    n_nodes: usize,
    n_agents: usize,
}

impl SolverBackend for MockBackend {
    type Model = MockModel;

    fn build_model(
        &self,
        matrices: &TravelMatrices,
        constraints: &RoutingConstraints,
    ) -> Result<MockModel, PlannerError> {
        self.calls.set(self.calls.get() + 1);
        Ok(MockModel {
            behaviour: self.behaviour,
            n_nodes: matrices.size(),
            n_agents: constraints.n_agents,
        })
    }
}

impl RoutingModel for MockModel {
    fn solve(self, _budget: Duration) -> Result<RouteAssignment, PlannerError> {
        match self.behaviour {
            Behaviour::RoundRobin => {
                let mut routes = vec![Vec::new(); self.n_agents];
                for node in 1..self.n_nodes {
                    routes[(node - 1) % self.n_agents].push(node);
                }
                Ok(RouteAssignment {
                    routes,
                    dropped: Vec::new(),
                    objective: 0,
                })
            }
            Behaviour::NoSolution => Err(PlannerError::NoSolution("mock gave up".into())),
            Behaviour::Panic => panic!("mock solver exploded"),
            Behaviour::Garbage => Ok(RouteAssignment {
                routes: vec![vec![self.n_nodes + 5]],
                dropped: Vec::new(),
                objective: 0,
            }),
        }
    }
}

fn planner(behaviour: Behaviour) -> (Planner<MockBackend>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let backend = MockBackend {
        behaviour,
        calls: Rc::clone(&calls),
    };
    (Planner::with_backend(PlannerConfig::default(), backend), calls)
}

fn stops(n: usize) -> Vec<Stop> {
    (0..n)
        .map(|i| Stop::new(format!("s{}", i), 43.70 + i as f64 * 0.0004, -79.40, (10 + i).to_string(), "Dupont St"))
        .collect()
}

#[test]
fn swapped_backend_drives_the_pipeline() {
    let (planner, calls) = planner(Behaviour::RoundRobin);
    let response = planner.plan(&RouteRequest::new(stops(5), 2)).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(response.clusters.len(), 2);
    assert_eq!(response.clusters[0].n_addresses, 3);
    assert_eq!(response.clusters[1].n_addresses, 2);
    assert_eq!(response.summary.n_assigned, 5);
}

#[test]
fn degenerate_request_never_reaches_solver() {
    let (planner, calls) = planner(Behaviour::RoundRobin);
    let outcome = planner.handle(&RouteRequest::new(stops(1), 1));

    assert!(!outcome.is_success());
    assert_eq!(outcome.status_code(), 400);
    assert_eq!(calls.get(), 0);
}

#[test]
fn solver_failure_is_distinct_from_input_error() {
    let (planner, _) = planner(Behaviour::NoSolution);
    match planner.handle(&RouteRequest::new(stops(4), 2)) {
        PlanOutcome::Failure(failure) => {
            assert_eq!(failure.error_code, "solver_failed");
            assert!(failure.error.contains("mock gave up"));
        }
        PlanOutcome::Success(_) => panic!("expected solver failure"),
    }
}

#[test]
fn solver_panic_becomes_internal_failure() {
    let (planner, _) = planner(Behaviour::Panic);
    match planner.handle(&RouteRequest::new(stops(4), 2)) {
        PlanOutcome::Failure(failure) => {
            assert_eq!(failure.error_code, "internal");
            assert_eq!(failure.error, INTERNAL_FAILURE_MESSAGE);
        }
        PlanOutcome::Success(_) => panic!("expected internal failure"),
    }
}

#[test]
fn inconsistent_assignment_is_internal_failure() {
    let (planner, _) = planner(Behaviour::Garbage);
    let outcome = planner.handle(&RouteRequest::new(stops(3), 1));
    match outcome {
        PlanOutcome::Failure(failure) => {
            assert_eq!(failure.error_code, "internal");
            assert!(!failure.error.contains("node"), "internal detail leaked: {}", failure.error);
        }
        PlanOutcome::Success(_) => panic!("expected internal failure"),
    }
}
