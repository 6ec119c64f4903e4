//! Gridwatch core: the grid model, per-cell change detection and the table
//! store. Pure and synchronous; IO lives behind [`StorePort`].
mod cell;
mod grid;
mod query;
mod seen;
mod store;
mod table;

pub use cell::Cell;
pub use grid::{Axis, Grid, GridError};
pub use query::{build_query_url, Category, SEARCH_DOMAIN};
pub use seen::IdentifierSet;
pub use store::{
    MemoryPort, PersistenceError, StoreDocument, StoreError, StorePort, TableStore,
    DEFAULT_ACTIVE_TABLE_ID,
};
pub use table::{Table, TableId, TableSummary, DEFAULT_COLUMN_HEADING, DEFAULT_ROW_HEADING};
