use std::fmt;

use gridwatch_logging::watch_warn;
use thiserror::Error;

use crate::query::Category;
use crate::Cell;

/// Which heading list an operation addresses. Rows are search terms
/// ("side" headings), columns are site regions ("top" headings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Structural misuse of a grid. Returned before any mutation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("no {axis} heading left to remove")]
    EmptyGrid { axis: Axis },
    #[error("{axis} index {index} out of range (have {len})")]
    IndexOutOfRange { axis: Axis, index: usize, len: usize },
}

/// Row and column headings with a cell matrix kept in lockstep:
/// `cells.len() == row_headings.len()` and every row holds
/// `column_headings.len()` cells once any public method returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    row_headings: Vec<String>,
    column_headings: Vec<String>,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// A 1x1 grid with its single cell already allocated.
    pub fn new(row_label: &str, column_label: &str, category: &Category) -> Self {
        Self {
            row_headings: vec![row_label.to_string()],
            column_headings: vec![column_label.to_string()],
            cells: vec![vec![Cell::fresh(row_label, column_label, category)]],
        }
    }

    /// Rebuilds a grid from persisted parts, padding missing cells with fresh
    /// ones and dropping surplus cells so the lockstep invariant holds.
    pub fn restore(
        row_headings: Vec<String>,
        column_headings: Vec<String>,
        mut cells: Vec<Vec<Cell>>,
        category: &Category,
    ) -> Self {
        let mut repaired = 0usize;

        if cells.len() > row_headings.len() {
            repaired += cells.len() - row_headings.len();
            cells.truncate(row_headings.len());
        }
        while cells.len() < row_headings.len() {
            cells.push(Vec::new());
        }

        for (row_label, row) in row_headings.iter().zip(cells.iter_mut()) {
            if row.len() > column_headings.len() {
                repaired += row.len() - column_headings.len();
                row.truncate(column_headings.len());
            }
            for column_label in &column_headings[row.len()..] {
                row.push(Cell::fresh(row_label, column_label, category));
                repaired += 1;
            }
        }

        if repaired > 0 {
            watch_warn!(
                "Grid restore repaired {} cell(s) to match {}x{} headings",
                repaired,
                row_headings.len(),
                column_headings.len()
            );
        }

        Self {
            row_headings,
            column_headings,
            cells,
        }
    }

    pub fn row_headings(&self) -> &[String] {
        &self.row_headings
    }

    pub fn column_headings(&self) -> &[String] {
        &self.column_headings
    }

    /// Row-major cell matrix, `rows()[row][column]`.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        self.cells.get_mut(row).and_then(|r| r.get_mut(column))
    }

    /// Every cell with its `(row, column)` coordinates, row-major.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut Cell)> {
        self.cells.iter_mut().enumerate().flat_map(|(row, cells)| {
            cells
                .iter_mut()
                .enumerate()
                .map(move |(column, cell)| ((row, column), cell))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_consistent(&self) -> bool {
        self.cells.len() == self.row_headings.len()
            && self
                .cells
                .iter()
                .all(|row| row.len() == self.column_headings.len())
    }

    pub fn add_column_heading(&mut self, label: &str, category: &Category) {
        self.column_headings.push(label.to_string());
        for (row_label, row) in self.row_headings.iter().zip(self.cells.iter_mut()) {
            row.push(Cell::fresh(row_label, label, category));
        }
    }

    pub fn add_row_heading(&mut self, label: &str, category: &Category) {
        let row = self
            .column_headings
            .iter()
            .map(|column_label| Cell::fresh(label, column_label, category))
            .collect();
        self.row_headings.push(label.to_string());
        self.cells.push(row);
    }

    /// Drops the last column and its cells. Returns the removed label.
    pub fn remove_last_column_heading(&mut self) -> Result<String, GridError> {
        let label = self.column_headings.pop().ok_or(GridError::EmptyGrid {
            axis: Axis::Column,
        })?;
        for row in &mut self.cells {
            row.truncate(self.column_headings.len());
        }
        Ok(label)
    }

    /// Drops the last row and its cells. Returns the removed label.
    pub fn remove_last_row_heading(&mut self) -> Result<String, GridError> {
        let label = self
            .row_headings
            .pop()
            .ok_or(GridError::EmptyGrid { axis: Axis::Row })?;
        self.cells.truncate(self.row_headings.len());
        Ok(label)
    }

    /// Relabels one heading and rebuilds every cell of the grid: the query
    /// targets changed, so prior hit counts and seen sets no longer apply.
    pub fn edit_heading(
        &mut self,
        axis: Axis,
        index: usize,
        label: &str,
        category: &Category,
    ) -> Result<(), GridError> {
        let headings = match axis {
            Axis::Row => &mut self.row_headings,
            Axis::Column => &mut self.column_headings,
        };
        let len = headings.len();
        let slot = headings
            .get_mut(index)
            .ok_or(GridError::IndexOutOfRange { axis, index, len })?;
        *slot = label.to_string();
        self.rebuild(category);
        Ok(())
    }

    /// Replaces every cell with a fresh one built from the current headings.
    pub fn rebuild(&mut self, category: &Category) {
        self.cells = self
            .row_headings
            .iter()
            .map(|row_label| {
                self.column_headings
                    .iter()
                    .map(|column_label| Cell::fresh(row_label, column_label, category))
                    .collect()
            })
            .collect();
    }
}
