//! Grid model: the edge/cell/point graph for one instance.
use crate::error::ConfigError;
use crate::registry::{VarId, VariableRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A unit segment between two adjacent lattice points.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub id: VarId,
    pub orientation: Orientation,
}

/// A unit square at grid coordinates `(row, col)`, optionally clued.
#[derive(Debug, Clone)]
pub struct Cell {
    pub up: VarId,
    pub right: VarId,
    pub down: VarId,
    pub left: VarId,
    pub clue: Option<u8>,
    pub row: usize,
    pub col: usize,
}

impl Cell {
    /// The four bounding edges, in up/right/down/left order.
    pub fn edges(&self) -> [VarId; 4] {
        [self.up, self.right, self.down, self.left]
    }
}

/// A lattice intersection. Edges are absent in directions off the grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    pub up: Option<VarId>,
    pub right: Option<VarId>,
    pub down: Option<VarId>,
    pub left: Option<VarId>,
}

impl Point {
    /// Incident edges in up/right/down/left order, absent slots dropped.
    pub fn incident_edges(&self) -> Vec<VarId> {
        [self.up, self.right, self.down, self.left]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// The full edge/cell/point graph for one Slitherlink instance.
pub struct GridModel {
    pub cells: Vec<Vec<Cell>>,
    pub points: Vec<Vec<Point>>,
    pub h_edges: Vec<Vec<Edge>>,
    pub v_edges: Vec<Vec<Edge>>,
    pub height: usize,
    pub width: usize,
    registry: VariableRegistry,
}

impl GridModel {
    /// Total number of SAT variables: one per edge, `(H+1)*W + H*(W+1)`.
    pub fn num_vars(&self) -> u32 {
        self.registry.count()
    }

    /// All cells in row-major order.
    pub fn cells_row_major(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    /// All points in row-major order.
    pub fn points_row_major(&self) -> impl Iterator<Item = &Point> {
        self.points.iter().flatten()
    }

    /// Builds the cell/point/edge graph for a rectangular instance.
    ///
    /// `instance[row][col]` is `Some(clue)` with `clue` in `0..=3`, or `None`
    /// for an unclued cell. Variable ids are assigned eagerly, horizontal
    /// grid row-major then vertical grid row-major.
    pub fn build(instance: &[Vec<Option<u8>>]) -> Result<Self, ConfigError> {
        let height = instance.len();
        if height == 0 {
            return Err(ConfigError::NonPositiveDimensions { height: 0, width: 0 });
        }
        let width = instance[0].len();
        if width == 0 {
            return Err(ConfigError::NonPositiveDimensions {
                height: height as i64,
                width: 0,
            });
        }
        for (row, cells) in instance.iter().enumerate() {
            if cells.len() != width {
                return Err(ConfigError::RowWidthMismatch {
                    row,
                    found: cells.len(),
                    expected: width,
                });
            }
            for (col, clue) in cells.iter().enumerate() {
                if let Some(v) = clue {
                    if *v > 3 {
                        return Err(ConfigError::InvalidClue {
                            row,
                            col,
                            token: v.to_string(),
                        });
                    }
                }
            }
        }

        let mut registry = VariableRegistry::new();

        // Horizontal grid: (H+1) rows x W columns, row-major.
        let mut h_edges = Vec::with_capacity(height + 1);
        for _ in 0..=height {
            let mut row = Vec::with_capacity(width);
            for _ in 0..width {
                row.push(Edge {
                    id: registry.fresh(),
                    orientation: Orientation::Horizontal,
                });
            }
            h_edges.push(row);
        }

        // Vertical grid: H rows x (W+1) columns, row-major.
        let mut v_edges = Vec::with_capacity(height);
        for _ in 0..height {
            let mut row = Vec::with_capacity(width + 1);
            for _ in 0..=width {
                row.push(Edge {
                    id: registry.fresh(),
                    orientation: Orientation::Vertical,
                });
            }
            v_edges.push(row);
        }

        let mut cells = Vec::with_capacity(height);
        for (row, clue_row) in instance.iter().enumerate() {
            let mut cell_row = Vec::with_capacity(width);
            for (col, clue) in clue_row.iter().enumerate() {
                cell_row.push(Cell {
                    up: h_edges[row][col].id,
                    right: v_edges[row][col + 1].id,
                    down: h_edges[row + 1][col].id,
                    left: v_edges[row][col].id,
                    clue: *clue,
                    row,
                    col,
                });
            }
            cells.push(cell_row);
        }

        let mut points = vec![vec![Point::default(); width + 1]; height + 1];
        for (i, point_row) in points.iter_mut().enumerate() {
            for (j, point) in point_row.iter_mut().enumerate() {
                *point = Point {
                    up: (i > 0).then(|| v_edges[i - 1][j].id),
                    down: (i < height).then(|| v_edges[i][j].id),
                    left: (j > 0).then(|| h_edges[i][j - 1].id),
                    right: (j < width).then(|| h_edges[i][j].id),
                };
            }
        }

        Ok(GridModel {
            cells,
            points,
            h_edges,
            v_edges,
            height,
            width,
            registry,
        })
    }
}
