use std::sync::Once;

use gridwatch_core::{
    Axis, Category, Grid, GridError, Table, DEFAULT_COLUMN_HEADING, DEFAULT_ROW_HEADING,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(gridwatch_logging::initialize_for_tests);
}

fn assert_lockstep(grid: &Grid) {
    assert_eq!(grid.rows().len(), grid.row_headings().len());
    for row in grid.rows() {
        assert_eq!(row.len(), grid.column_headings().len());
    }
}

#[test]
fn new_table_is_one_by_one_and_never_refreshed() {
    init_logging();
    let table = Table::new(1);

    assert_eq!(DEFAULT_ROW_HEADING, "SideHeading");
    assert_eq!(DEFAULT_COLUMN_HEADING, "TopHeading");
    assert_eq!(table.grid.row_headings(), [DEFAULT_ROW_HEADING.to_string()]);
    assert_eq!(table.grid.column_headings(), [DEFAULT_COLUMN_HEADING.to_string()]);
    assert_eq!(table.grid.cell_count(), 1);
    assert_eq!(table.grid.cell(0, 0).unwrap().hits(), None);
    assert!(table.grid.cell(0, 0).unwrap().seen().is_empty());
    assert!(table.category.is_unset());
}

#[test]
fn adding_a_column_extends_every_row() {
    init_logging();
    let mut table = Table::new(1);

    table.add_column_heading("B");

    assert_eq!(table.grid.rows().len(), 1);
    assert_eq!(table.grid.rows()[0].len(), 2);
    assert_lockstep(&table.grid);
    let new_cell = table.grid.cell(0, 1).unwrap();
    assert_eq!(new_cell.hits(), None);
    assert_eq!(
        new_cell.query_url(),
        "https://b.craigslist.org/search/?query=SideHeading"
    );
}

#[test]
fn adding_a_row_fills_one_cell_per_column() {
    init_logging();
    let category = Category::new("jobs");
    let mut grid = Grid::new("rust", "seattle", &category);
    grid.add_column_heading("portland", &category);

    grid.add_row_heading("golang", &category);

    assert_lockstep(&grid);
    assert_eq!(
        grid.cell(1, 1).unwrap().query_url(),
        "https://portland.craigslist.org/search/jjj?query=golang"
    );
}

#[test]
fn lockstep_holds_through_mixed_heading_sequences() {
    init_logging();
    let category = Category::new("for sale");
    let mut grid = Grid::new("bike", "sfbay", &category);

    for step in 0..40 {
        match step % 7 {
            0 | 3 => grid.add_column_heading(&format!("c{step}"), &category),
            1 | 5 => grid.add_row_heading(&format!("r{step}"), &category),
            2 => {
                let _ = grid.remove_last_column_heading();
            }
            4 => {
                let _ = grid.remove_last_row_heading();
            }
            _ => {
                let _ = grid.remove_last_column_heading();
                let _ = grid.remove_last_row_heading();
            }
        }
        assert_lockstep(&grid);
    }
}

#[test]
fn edit_heading_resets_every_cell_grid_wide() {
    init_logging();
    let category = Category::new("for sale");
    let mut grid = Grid::new("bike", "sfbay", &category);
    grid.add_column_heading("seattle", &category);
    grid.add_row_heading("desk", &category);
    for (_, cell) in grid.cells_mut() {
        cell.record_results(["a", "b"]);
    }

    grid.edit_heading(Axis::Row, 0, "tandem", &category).unwrap();

    assert_eq!(grid.row_headings()[0], "tandem");
    for row in grid.rows() {
        for cell in row {
            assert_eq!(cell.hits(), None);
            assert!(cell.seen().is_empty());
        }
    }
    // The untouched row was rebuilt too.
    assert_eq!(
        grid.cell(1, 1).unwrap().query_url(),
        "https://seattle.craigslist.org/search/sss?query=desk"
    );
    assert_eq!(
        grid.cell(0, 0).unwrap().query_url(),
        "https://sfbay.craigslist.org/search/sss?query=tandem"
    );
}

#[test]
fn edit_heading_on_columns_resets_rows_too() {
    init_logging();
    let category = Category::unset();
    let mut grid = Grid::new("bike", "sfbay", &category);
    grid.add_row_heading("desk", &category);
    grid.cell_mut(1, 0).unwrap().record_results(["x"]);

    grid.edit_heading(Axis::Column, 0, "boston", &category).unwrap();

    assert_eq!(grid.cell(1, 0).unwrap().hits(), None);
    assert!(grid.cell(1, 0).unwrap().seen().is_empty());
}

#[test]
fn edit_heading_out_of_range_is_rejected() {
    init_logging();
    let mut table = Table::new(1);
    let before = table.clone();

    let err = table.edit_heading(Axis::Row, 1, "nope").unwrap_err();

    assert_eq!(
        err,
        GridError::IndexOutOfRange {
            axis: Axis::Row,
            index: 1,
            len: 1
        }
    );
    assert_eq!(table, before);
}

#[test]
fn removing_the_only_column_leaves_empty_rows() {
    init_logging();
    let mut table = Table::new(1);

    let removed = table.remove_last_column_heading().unwrap();

    assert_eq!(removed, "TopHeading");
    assert!(table.grid.column_headings().is_empty());
    assert_eq!(table.grid.rows().len(), 1);
    assert!(table.grid.rows()[0].is_empty());
    assert_eq!(table.grid.cell_count(), 0);
    assert_eq!(
        table.remove_last_column_heading(),
        Err(GridError::EmptyGrid { axis: Axis::Column })
    );
}

#[test]
fn category_change_needs_an_explicit_rebuild() {
    init_logging();
    let mut table = Table::new(1);
    let before = table.grid.cell(0, 0).unwrap().query_url().to_string();

    table.category = Category::new("jobs");
    assert_eq!(table.grid.cell(0, 0).unwrap().query_url(), before);

    table.rebuild_queries();
    assert_eq!(
        table.grid.cell(0, 0).unwrap().query_url(),
        "https://topheading.craigslist.org/search/jjj?query=SideHeading"
    );
}
