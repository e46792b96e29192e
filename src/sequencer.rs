//! Per-vehicle stop sequencing over a closed depot tour.
//!
//! Each vehicle sub-problem gets a local cost matrix remapped from the
//! global one, then a bounded-time solver picks the visiting order. Solver
//! non-convergence falls back to the input order, never an error.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::distance::DistanceMatrix;

/// Directed arc costs for one vehicle sub-problem. Index 0 is the depot.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    costs: Vec<Vec<u32>>,
}

impl CostMatrix {
    /// Remaps the global matrix onto one vehicle's rider subset.
    /// `global_rows[k]` is the global row of local stop `k + 1`; local
    /// index 0 stays the facility.
    pub fn for_subset(matrix: &DistanceMatrix, global_rows: &[usize]) -> Self {
        let n = global_rows.len() + 1;
        let map = |local: usize| if local == 0 { 0 } else { global_rows[local - 1] };
        let mut costs = vec![vec![0u32; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    costs[i][j] = matrix.seconds(map(i), map(j));
                }
            }
        }
        Self { costs }
    }

    pub fn from_raw(costs: Vec<Vec<u32>>) -> Self {
        Self { costs }
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn cost(&self, from: usize, to: usize) -> u32 {
        self.costs[from][to]
    }

    /// Total directed cost of the closed loop through `tour`, including the
    /// return arc to the first stop.
    fn tour_cost(&self, tour: &[usize]) -> u64 {
        let mut total: u64 = tour
            .windows(2)
            .map(|pair| self.cost(pair[0], pair[1]) as u64)
            .sum();
        if tour.len() > 1 {
            total += self.cost(tour[tour.len() - 1], tour[0]) as u64;
        }
        total
    }
}

/// Capability interface for closed-tour solvers, so alternatives can be
/// substituted without touching the sequencing contract.
pub trait TourSolver {
    /// Returns a tour visiting every index exactly once, starting at the
    /// depot (index 0) and minimizing total directed arc cost over the
    /// closed loop. `None` means no solution within `time_limit`.
    fn solve_closed_tour(&self, costs: &CostMatrix, time_limit: Duration) -> Option<Vec<usize>>;
}

/// Cheapest-arc construction from the depot followed by 2-opt improvement
/// under a wall-clock deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestArcSolver;

impl TourSolver for CheapestArcSolver {
    fn solve_closed_tour(&self, costs: &CostMatrix, time_limit: Duration) -> Option<Vec<usize>> {
        let n = costs.len();
        if n == 0 {
            return None;
        }
        let deadline = Instant::now() + time_limit;

        let mut tour = vec![0usize];
        let mut visited = vec![false; n];
        visited[0] = true;
        while tour.len() < n {
            let current = tour[tour.len() - 1];
            let next = (0..n)
                .filter(|&candidate| !visited[candidate])
                .min_by_key(|&candidate| costs.cost(current, candidate))?;
            visited[next] = true;
            tour.push(next);
        }

        two_opt(&mut tour, costs, deadline);
        Some(tour)
    }
}

/// Reverses tour segments while doing so strictly lowers the closed-loop
/// cost, stopping at the deadline.
fn two_opt(tour: &mut [usize], costs: &CostMatrix, deadline: Instant) {
    let n = tour.len();
    if n < 3 {
        return;
    }
    let mut best = costs.tour_cost(tour);
    let mut improved = true;
    while improved {
        improved = false;
        for i in 1..n - 1 {
            for j in i + 1..n {
                if Instant::now() >= deadline {
                    return;
                }
                tour[i..=j].reverse();
                let cost = costs.tour_cost(tour);
                if cost < best {
                    best = cost;
                    improved = true;
                } else {
                    tour[i..=j].reverse();
                }
            }
        }
    }
}

/// Visiting order for one vehicle sub-problem: depot first, each local
/// index exactly once. Falls back to the identity order when the solver
/// finds no tour within the time limit.
pub fn sequence_stops<S: TourSolver>(
    solver: &S,
    costs: &CostMatrix,
    time_limit: Duration,
) -> Vec<usize> {
    match solver.solve_closed_tour(costs, time_limit) {
        Some(tour) => tour,
        None => {
            debug!(stops = costs.len(), "tour solver found no solution, keeping input order");
            (0..costs.len()).collect()
        }
    }
}
