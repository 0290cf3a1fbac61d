use std::fmt;

use log::debug;
use serde::Serialize;

use crate::grid::{Cell, Coord, Direction, Grid, GridError};

/// One grid instance to search: the board, the entry and goal cells, the
/// seed value, and the value the goal cell must read on arrival.
#[derive(Debug, Clone, Serialize)]
pub struct Puzzle {
    pub grid: Grid,
    pub start: Coord,
    pub end: Coord,
    pub initial: i64,
    pub target: i64,
    /// Stops the search after this many generations. Unbounded revisits
    /// mean the frontier of a solution-free grid never drains on its own.
    pub max_generations: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub direction: Direction,
    pub coord: Coord,
    pub cell: Cell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub path: Vec<Coord>,
    pub steps: Vec<Step>,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Solved(Solution),
    Exhausted { generations: usize },
}

struct Candidate {
    at: Coord,
    value: i64,
    path: Vec<Coord>,
}

impl Puzzle {
    /// The vault lock: carry the orb from the antechamber to the door so
    /// that its weight reads 30 on arrival.
    pub fn vault() -> Result<Self, GridError> {
        let grid = Grid::parse([
            ["*", "8", "-", "1"],
            ["4", "*", "11", "*"],
            ["+", "4", "-", "18"],
            ["=22", "-", "9", "*"],
        ])?;
        Ok(Self {
            grid,
            start: Coord::new(3, 0),
            end: Coord::new(0, 3),
            initial: 22,
            target: 30,
            max_generations: None,
        })
    }

    /// Value after moving the accumulator from `prev` onto `next`.
    ///
    /// Arriving on the reset cell discards the accumulator. Arriving on an
    /// operator cell leaves it untouched; the operator is only applied on
    /// the following move, when an operand cell is entered.
    ///
    /// Panics if an operand cell is entered from a non-operator cell. Paths
    /// built by [`Puzzle::solve`] over a validated [`Grid`] never do that;
    /// hand-built paths must keep the same alternation.
    fn step_value(&self, value: i64, prev: Coord, next: Coord) -> i64 {
        match self.grid.cell(next) {
            Cell::Reset(reset) => reset,
            Cell::Add | Cell::Sub | Cell::Mul => value,
            Cell::Num(operand) => match self.grid.cell(prev) {
                Cell::Add => value + operand,
                Cell::Sub => value - operand,
                Cell::Mul => value * operand,
                cell => panic!(
                    "operand cell {next} entered from {prev} which holds {cell}, not an operator"
                ),
            },
        }
    }

    /// Evaluates a full path from scratch; a path of one cell (or none) is
    /// worth the initial value.
    pub fn evaluate(&self, path: &[Coord]) -> i64 {
        path.windows(2)
            .fold(self.initial, |value, pair| {
                self.step_value(value, pair[0], pair[1])
            })
    }

    /// Breadth-first expansion over partial paths, one generation at a
    /// time, in the fixed direction order. Returns the first path that
    /// arrives at the end cell worth the target value.
    pub fn solve(&self) -> Outcome {
        let mut frontier = vec![Candidate {
            at: self.start,
            value: self.initial,
            path: vec![self.start],
        }];
        let mut generation = 0;

        while !frontier.is_empty() {
            if let Some(limit) = self.max_generations {
                if generation >= limit {
                    debug!("generation limit {limit} reached without a solution");
                    return Outcome::Exhausted { generations: generation };
                }
            }
            generation += 1;

            let mut next_frontier = Vec::new();
            for candidate in &frontier {
                for direction in Direction::ALL {
                    let Some(coord) = candidate.at.step(direction) else {
                        continue;
                    };
                    // The start cell may never be re-entered.
                    if coord == self.start {
                        continue;
                    }
                    let value = self.step_value(candidate.value, candidate.at, coord);
                    if coord == self.end {
                        if value == self.target {
                            let mut path = candidate.path.clone();
                            path.push(coord);
                            return Outcome::Solved(self.solution(path, value));
                        }
                        // The end cell is a dead end for every other value.
                        continue;
                    }
                    let mut path = candidate.path.clone();
                    path.push(coord);
                    next_frontier.push(Candidate { at: coord, value, path });
                }
            }

            debug!(
                "generation {generation}: {} live paths",
                next_frontier.len()
            );
            frontier = next_frontier;
        }

        Outcome::Exhausted { generations: generation }
    }

    fn solution(&self, path: Vec<Coord>, value: i64) -> Solution {
        let steps = path
            .windows(2)
            .map(|pair| {
                let Some(direction) = pair[0].direction_to(pair[1]) else {
                    panic!("solution path jumps from {} to {}", pair[0], pair[1]);
                };
                Step {
                    direction,
                    coord: pair[1],
                    cell: self.grid.cell(pair[1]),
                }
            })
            .collect();
        Solution { path, steps, value }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "value {} reached after {} moves:",
            self.value,
            self.steps.len()
        )?;
        for step in &self.steps {
            writeln!(f, "  {} -> {} holds {}", step.direction, step.coord, step.cell)?;
        }
        let names: Vec<&str> = self.steps.iter().map(|step| step.direction.name()).collect();
        write!(f, "directions: {}", names.join(" "))
    }
}

#[cfg(test)]
fn vault() -> Puzzle {
    Puzzle::vault().unwrap()
}

#[cfg(test)]
fn solved(puzzle: &Puzzle) -> Solution {
    match puzzle.solve() {
        Outcome::Solved(solution) => solution,
        Outcome::Exhausted { generations } => {
            panic!("search exhausted after {generations} generations")
        }
    }
}

#[test]
fn a_single_cell_path_is_worth_the_initial_value() {
    let puzzle = vault();
    assert_eq!(puzzle.evaluate(&[puzzle.start]), 22);
    assert_eq!(puzzle.evaluate(&[]), 22);
}

#[test]
fn arriving_on_the_reset_cell_discards_the_accumulator() {
    let puzzle = vault();
    let out_and_back = [
        Coord::new(3, 0),
        Coord::new(2, 0),
        Coord::new(2, 1),
        Coord::new(2, 0),
        Coord::new(3, 0),
    ];
    assert_eq!(puzzle.evaluate(&out_and_back[..3]), 26);
    assert_eq!(puzzle.evaluate(&out_and_back), 22);
}

#[test]
fn prefix_evaluation_plus_one_step_matches_full_evaluation() {
    let puzzle = vault();
    let path = solved(&puzzle).path;
    for len in 1..path.len() {
        let stepped = puzzle.step_value(
            puzzle.evaluate(&path[..len]),
            path[len - 1],
            path[len],
        );
        assert_eq!(stepped, puzzle.evaluate(&path[..len + 1]));
    }
}

#[test]
fn the_vault_is_opened_in_twelve_moves() {
    let puzzle = vault();
    let solution = solved(&puzzle);

    assert_eq!(solution.value, 30);
    assert_eq!(solution.steps.len(), 12);
    assert_eq!(solution.path.len(), 13);
    assert_eq!(solution.path[0], puzzle.start);
    assert_eq!(*solution.path.last().unwrap(), puzzle.end);
    assert_eq!(puzzle.evaluate(&solution.path), puzzle.target);
}

#[test]
fn the_explorer_stays_on_the_board_and_off_the_start_cell() {
    let puzzle = vault();
    let solution = solved(&puzzle);

    for pair in solution.path.windows(2) {
        assert!(pair[0].direction_to(pair[1]).is_some());
        assert_ne!(pair[1], puzzle.start);
    }
    for coord in &solution.path {
        assert!(coord.row < crate::grid::SIDE && coord.col < crate::grid::SIDE);
    }
}

#[test]
fn repeated_runs_find_the_same_solution() {
    let puzzle = vault();
    assert_eq!(puzzle.solve(), puzzle.solve());
}

#[test]
fn an_adjacent_start_and_end_solve_in_one_generation() {
    let grid = Grid::parse([
        ["+", "8", "+", "5"],
        ["5", "*", "2", "+"],
        ["+", "3", "-", "4"],
        ["9", "+", "=22", "+"],
    ])
    .unwrap();
    let puzzle = Puzzle {
        grid,
        start: Coord::new(0, 0),
        end: Coord::new(0, 1),
        initial: 22,
        target: 30,
        max_generations: None,
    };

    let solution = solved(&puzzle);
    assert_eq!(solution.value, 30);
    assert_eq!(solution.steps.len(), 1);
    assert_eq!(solution.steps[0].direction, Direction::East);
    assert_eq!(solution.steps[0].cell, Cell::Num(8));
}

#[test]
fn a_capped_search_reports_exhaustion() {
    let puzzle = Puzzle {
        target: 1_000_000,
        max_generations: Some(5),
        ..vault()
    };
    assert_eq!(puzzle.solve(), Outcome::Exhausted { generations: 5 });
}

#[test]
fn the_report_names_every_move() {
    let solution = solved(&vault());
    let report = solution.to_string();
    assert!(report.starts_with("value 30 reached after 12 moves:"));
    assert!(report.contains("directions: "));
    for step in &solution.steps {
        assert!(report.contains(step.direction.name()));
    }
}
