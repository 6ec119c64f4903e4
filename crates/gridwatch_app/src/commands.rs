use std::io::Write;

use anyhow::{Context, Result};
use gridwatch_core::{Category, StorePort, Table, TableId, TableStore};
use gridwatch_engine::{
    ProgressSink, RefreshEngine, RefreshEvent, RefreshOutcome, RefreshReport, ScrapingFetcher,
};
use gridwatch_logging::{watch_debug, watch_info};

use crate::cli::Command;
use crate::config::AppConfig;

const UNKNOWN_HITS: &str = "-";

/// Runs one command against the store, writing human-readable output to `out`.
pub fn execute<P: StorePort>(
    command: Command,
    store: &mut TableStore<P>,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<()> {
    watch_debug!("Executing {:?}", command);
    let active = store.active_table_id();
    match command {
        Command::Tables => write_tables(store, out)?,
        Command::Show { id } => {
            let id = id.unwrap_or(active);
            let table = store
                .table(id)
                .with_context(|| format!("Cannot show table {id}"))?;
            write_grid(table, out)?;
        }
        Command::NewTable => {
            let id = store.create_table()?;
            writeln!(out, "Created table {id}")?;
        }
        Command::DeleteTable => match store.delete_active_table()? {
            Some(removed) => writeln!(out, "Deleted table {} ({})", removed.id, removed.name)?,
            None => writeln!(out, "No table with id {active}; nothing deleted")?,
        },
        Command::Select { id } => {
            store.set_active_table_id(id)?;
            if store.table(id).is_err() {
                writeln!(out, "Selected table {id}, which does not exist")?;
            } else {
                writeln!(out, "Selected table {id}")?;
            }
        }
        Command::Rename { name } => {
            store.rename_active_table(&name)?;
            writeln!(out, "Renamed table {active} to {name}")?;
        }
        Command::Category { name } => {
            let category = Category::new(name);
            if category.code().is_empty() {
                writeln!(
                    out,
                    "Unknown category {:?}; URLs get no category code",
                    category.as_str()
                )?;
            }
            store.set_active_table_category(category)?;
            writeln!(out, "Category updated; run `rebuild` to regenerate the queries")?;
        }
        Command::AddColumn { label } => {
            store.add_column_heading(active, &label)?;
            write_grid(store.table(active)?, out)?;
        }
        Command::AddRow { label } => {
            store.add_row_heading(active, &label)?;
            write_grid(store.table(active)?, out)?;
        }
        Command::RemoveColumn => {
            let label = store.remove_last_column_heading(active)?;
            writeln!(out, "Removed column {label}")?;
        }
        Command::RemoveRow => {
            let label = store.remove_last_row_heading(active)?;
            writeln!(out, "Removed row {label}")?;
        }
        Command::Edit { axis, index, label } => {
            store.edit_heading(active, axis.into(), index, &label)?;
            write_grid(store.table(active)?, out)?;
        }
        Command::Rebuild => {
            store.rebuild_queries(active)?;
            writeln!(out, "Rebuilt queries of table {active}")?;
        }
        Command::Refresh { id } => refresh(store, id.unwrap_or(active), config, out)?,
    }
    Ok(())
}

fn refresh<P: StorePort>(
    store: &mut TableStore<P>,
    id: TableId,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<()> {
    let fetcher = ScrapingFetcher::new(config.fetch.to_settings())
        .context("Failed to build the HTTP client")?;
    let engine = RefreshEngine::new(fetcher).with_cell_timeout(config.cell_timeout());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let report = runtime
        .block_on(engine.refresh_table(store, id, &ConsoleSink))
        .with_context(|| format!("Refresh of table {id} failed"))?;

    write_report(store.table(id)?, &report, out)
}

/// Prints one line per cell to stderr while a refresh runs.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: RefreshEvent) {
        match event {
            RefreshEvent::CellStarted { row, column, url } => {
                eprint!("[{row},{column}] {url} ... ");
            }
            RefreshEvent::CellFinished { new_items, .. } => match new_items {
                Some(count) => eprintln!("{count} new"),
                None => eprintln!("failed"),
            },
        }
    }
}

fn write_tables<P: StorePort>(store: &TableStore<P>, out: &mut impl Write) -> Result<()> {
    let active = store.active_table_id();
    for summary in store.table_summaries() {
        let marker = if summary.id == active { '*' } else { ' ' };
        writeln!(out, "{marker} {:>3}  {}", summary.id, summary.name)?;
    }
    Ok(())
}

fn write_grid(table: &Table, out: &mut impl Write) -> Result<()> {
    let category = if table.category.is_unset() {
        "none"
    } else {
        table.category.as_str()
    };
    writeln!(out, "Table {}: {} [category: {category}]", table.id, table.name)?;

    let grid = &table.grid;
    let columns = grid.column_headings();
    let side_width = grid
        .row_headings()
        .iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(column, label)| {
            grid.rows()
                .iter()
                .filter_map(|row| row.get(column))
                .map(|cell| hits_text(cell.hits()).len())
                .chain(std::iter::once(label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    write!(out, "{:side_width$}", "")?;
    for (label, width) in columns.iter().zip(&widths) {
        write!(out, " | {label:width$}")?;
    }
    writeln!(out)?;

    for (label, row) in grid.row_headings().iter().zip(grid.rows()) {
        write!(out, "{label:side_width$}")?;
        for (cell, width) in row.iter().zip(&widths) {
            write!(out, " | {:>width$}", hits_text(cell.hits()))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_report(table: &Table, report: &RefreshReport, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "Refreshed table {} at {}: {} cell(s) ok, {} failed, {} new listing(s)",
        table.id,
        report.finished_utc,
        report.refreshed(),
        report.degraded(),
        report.total_new()
    )?;

    let rows = table.grid.row_headings();
    let columns = table.grid.column_headings();
    for cell in &report.cells {
        let terms = rows.get(cell.row).map_or("?", String::as_str);
        let region = columns.get(cell.column).map_or("?", String::as_str);
        match &cell.outcome {
            RefreshOutcome::Updated { new_items, .. } if new_items.is_empty() => {}
            RefreshOutcome::Updated { new_items, .. } => {
                writeln!(out, "  {terms} @ {region}: {} new", new_items.len())?;
                for item in new_items {
                    writeln!(out, "    {}  {}", item.title, item.identifier)?;
                }
            }
            RefreshOutcome::Degraded { error } => {
                writeln!(out, "  {terms} @ {region}: failed ({error})")?;
            }
        }
    }
    watch_info!("Reported refresh of table {}", table.id);
    Ok(())
}

fn hits_text(hits: Option<usize>) -> String {
    hits.map_or_else(|| UNKNOWN_HITS.to_string(), |count| count.to_string())
}
