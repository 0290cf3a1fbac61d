use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const SIDE: usize = 4;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
pub enum Cell {
    Num(i64),
    Add,
    Sub,
    Mul,
    Reset(i64),
}

impl Cell {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Cell::Add),
            "-" => Some(Cell::Sub),
            "*" => Some(Cell::Mul),
            _ => match token.strip_prefix('=') {
                Some(value) => value.parse().ok().map(Cell::Reset),
                None => token.parse().ok().map(Cell::Num),
            },
        }
    }

    pub fn is_operator(self) -> bool {
        matches!(self, Cell::Add | Cell::Sub | Cell::Mul)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Num(n) => write!(f, "{n}"),
            Cell::Add => write!(f, "+"),
            Cell::Sub => write!(f, "-"),
            Cell::Mul => write!(f, "*"),
            Cell::Reset(v) => write!(f, "={v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn step(self, direction: Direction) -> Option<Self> {
        let stepped = match direction {
            Direction::South => Self::new(self.row + 1, self.col),
            Direction::East => Self::new(self.row, self.col + 1),
            Direction::North => Self::new(self.row.checked_sub(1)?, self.col),
            Direction::West => Self::new(self.row, self.col.checked_sub(1)?),
        };
        (stepped.row < SIDE && stepped.col < SIDE).then_some(stepped)
    }

    pub fn direction_to(self, other: Self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&direction| self.step(direction) == Some(other))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
pub enum Direction {
    South,
    East,
    North,
    West,
}

impl Direction {
    // Expansion order of the search; changing it changes which solution
    // is found first.
    pub const ALL: [Self; 4] = [Self::South, Self::East, Self::North, Self::West];

    pub fn name(self) -> &'static str {
        match self {
            Direction::South => "south",
            Direction::East => "east",
            Direction::North => "north",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error("cell {coord} holds unrecognized token {token:?}")]
    UnknownToken { coord: Coord, token: String },
    #[error("grid has no reset cell")]
    MissingReset,
    #[error("grid has a second reset cell at {second} (first at {first})")]
    ExtraReset { first: Coord, second: Coord },
    #[error("operand cell {operand} is adjacent to {neighbor} holding {cell}; operands may only neighbor operator cells")]
    AdjacentOperand {
        operand: Coord,
        neighbor: Coord,
        cell: Cell,
    },
}

/// A 4×4 grid of operator and operand cells with exactly one reset cell.
///
/// Construction validates that every operand cell only neighbors operator
/// cells, so any adjacency-valid walk alternates operators and operands and
/// can be evaluated without hitting a malformed step.
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    cells: [[Cell; SIDE]; SIDE],
}

impl Grid {
    pub fn parse(tokens: [[&str; SIDE]; SIDE]) -> Result<Self, GridError> {
        let mut cells = [[Cell::Add; SIDE]; SIDE];
        for (row, row_tokens) in tokens.iter().enumerate() {
            for (col, token) in row_tokens.iter().enumerate() {
                cells[row][col] = Cell::parse(token).ok_or_else(|| GridError::UnknownToken {
                    coord: Coord::new(row, col),
                    token: (*token).to_owned(),
                })?;
            }
        }
        Self::from_cells(cells)
    }

    pub fn from_cells(cells: [[Cell; SIDE]; SIDE]) -> Result<Self, GridError> {
        let grid = Self { cells };
        grid.check_reset_count()?;
        grid.check_operand_adjacency()?;
        Ok(grid)
    }

    pub fn cell(&self, coord: Coord) -> Cell {
        self.cells[coord.row][coord.col]
    }

    fn coords() -> impl Iterator<Item = Coord> {
        (0..SIDE).flat_map(|row| (0..SIDE).map(move |col| Coord::new(row, col)))
    }

    fn check_reset_count(&self) -> Result<(), GridError> {
        let mut reset = None;
        for coord in Self::coords() {
            if let Cell::Reset(_) = self.cell(coord) {
                match reset {
                    None => reset = Some(coord),
                    Some(first) => {
                        return Err(GridError::ExtraReset {
                            first,
                            second: coord,
                        })
                    }
                }
            }
        }
        reset.map(|_| ()).ok_or(GridError::MissingReset)
    }

    fn check_operand_adjacency(&self) -> Result<(), GridError> {
        for coord in Self::coords() {
            if !matches!(self.cell(coord), Cell::Num(_)) {
                continue;
            }
            for direction in Direction::ALL {
                let Some(neighbor) = coord.step(direction) else {
                    continue;
                };
                let cell = self.cell(neighbor);
                if !cell.is_operator() {
                    return Err(GridError::AdjacentOperand {
                        operand: coord,
                        neighbor,
                        cell,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
const VAULT_TOKENS: [[&str; SIDE]; SIDE] = [
    ["*", "8", "-", "1"],
    ["4", "*", "11", "*"],
    ["+", "4", "-", "18"],
    ["=22", "-", "9", "*"],
];

#[test]
fn parses_the_vault_grid() {
    let grid = Grid::parse(VAULT_TOKENS).unwrap();
    assert_eq!(grid.cell(Coord::new(0, 0)), Cell::Mul);
    assert_eq!(grid.cell(Coord::new(1, 2)), Cell::Num(11));
    assert_eq!(grid.cell(Coord::new(3, 0)), Cell::Reset(22));
}

#[test]
fn rejects_unrecognized_tokens() {
    let mut tokens = VAULT_TOKENS;
    tokens[1][2] = "%";
    match Grid::parse(tokens) {
        Err(GridError::UnknownToken { coord, token }) => {
            assert_eq!(coord, Coord::new(1, 2));
            assert_eq!(token, "%");
        }
        other => panic!("expected an unknown-token error, got {other:?}"),
    }
}

#[test]
fn rejects_grids_without_exactly_one_reset_cell() {
    let mut tokens = VAULT_TOKENS;
    tokens[3][0] = "+";
    assert!(matches!(Grid::parse(tokens), Err(GridError::MissingReset)));

    let mut tokens = VAULT_TOKENS;
    tokens[1][1] = "=5";
    match Grid::parse(tokens) {
        Err(GridError::ExtraReset { first, second }) => {
            assert_eq!(first, Coord::new(1, 1));
            assert_eq!(second, Coord::new(3, 0));
        }
        other => panic!("expected an extra-reset error, got {other:?}"),
    }
}

#[test]
fn rejects_touching_operands() {
    let mut tokens = VAULT_TOKENS;
    tokens[0][2] = "7";
    match Grid::parse(tokens) {
        Err(GridError::AdjacentOperand {
            operand, neighbor, ..
        }) => {
            assert_eq!(operand, Coord::new(0, 1));
            assert_eq!(neighbor, Coord::new(0, 2));
        }
        other => panic!("expected an adjacent-operand error, got {other:?}"),
    }
}

#[test]
fn stepping_respects_the_grid_bounds() {
    let corner = Coord::new(0, 0);
    assert_eq!(corner.step(Direction::North), None);
    assert_eq!(corner.step(Direction::West), None);
    assert_eq!(corner.step(Direction::South), Some(Coord::new(1, 0)));
    assert_eq!(corner.step(Direction::East), Some(Coord::new(0, 1)));

    let corner = Coord::new(3, 3);
    assert_eq!(corner.step(Direction::South), None);
    assert_eq!(corner.step(Direction::East), None);
}

#[test]
fn directions_between_neighbors() {
    let at = Coord::new(2, 1);
    assert_eq!(at.direction_to(Coord::new(3, 1)), Some(Direction::South));
    assert_eq!(at.direction_to(Coord::new(2, 2)), Some(Direction::East));
    assert_eq!(at.direction_to(Coord::new(1, 1)), Some(Direction::North));
    assert_eq!(at.direction_to(Coord::new(2, 0)), Some(Direction::West));
    assert_eq!(at.direction_to(Coord::new(0, 0)), None);
    assert_eq!(at.direction_to(at), None);
}
