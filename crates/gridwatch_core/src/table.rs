use crate::grid::{Axis, Grid, GridError};
use crate::query::Category;

pub type TableId = u64;

pub const DEFAULT_ROW_HEADING: &str = "SideHeading";
pub const DEFAULT_COLUMN_HEADING: &str = "TopHeading";

/// A named grid of watched searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub category: Category,
    pub grid: Grid,
}

/// Entry of the table picker: id and name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub id: TableId,
    pub name: String,
}

impl Table {
    pub fn new(id: TableId) -> Self {
        let category = Category::unset();
        Self {
            id,
            name: format!("New Table id {id}"),
            grid: Grid::new(DEFAULT_ROW_HEADING, DEFAULT_COLUMN_HEADING, &category),
            category,
        }
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn add_column_heading(&mut self, label: &str) {
        self.grid.add_column_heading(label, &self.category);
    }

    pub fn add_row_heading(&mut self, label: &str) {
        self.grid.add_row_heading(label, &self.category);
    }

    pub fn remove_last_column_heading(&mut self) -> Result<String, GridError> {
        self.grid.remove_last_column_heading()
    }

    pub fn remove_last_row_heading(&mut self) -> Result<String, GridError> {
        self.grid.remove_last_row_heading()
    }

    pub fn edit_heading(&mut self, axis: Axis, index: usize, label: &str) -> Result<(), GridError> {
        self.grid.edit_heading(axis, index, label, &self.category)
    }

    /// Regenerates every cell from the current headings and category.
    pub fn rebuild_queries(&mut self) {
        self.grid.rebuild(&self.category);
    }
}
