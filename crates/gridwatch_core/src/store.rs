use std::io;
use std::path::PathBuf;

use gridwatch_logging::{watch_debug, watch_error, watch_info, watch_warn};
use thiserror::Error;

use crate::grid::{Axis, GridError};
use crate::query::Category;
use crate::table::{Table, TableId, TableSummary};

/// Active id the store falls back to after the active table is deleted.
pub const DEFAULT_ACTIVE_TABLE_ID: TableId = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store document io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store document could not be encoded: {0}")]
    Encode(String),
    #[error("store document could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no table with id {id}")]
    NotFound { id: TableId },
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The mutation is applied in memory but the snapshot was not written.
    /// `TableStore::is_dirty` stays true until a later flush succeeds.
    #[error("change kept in memory but not persisted: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Complete, self-consistent snapshot of the store. This is the unit that
/// gets persisted; there are no partial writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDocument {
    pub active_table_id: TableId,
    pub next_table_id: TableId,
    pub tables: Vec<Table>,
}

impl StoreDocument {
    /// A store holding one default table, which is active.
    pub fn with_default_table() -> Self {
        Self {
            active_table_id: DEFAULT_ACTIVE_TABLE_ID,
            next_table_id: DEFAULT_ACTIVE_TABLE_ID + 1,
            tables: vec![Table::new(DEFAULT_ACTIVE_TABLE_ID)],
        }
    }

    /// Raises `next_table_id` above every id in use, so ids are never reused
    /// even for documents written without the counter.
    fn normalized(mut self) -> Self {
        let floor = self
            .tables
            .iter()
            .map(|t| t.id + 1)
            .max()
            .unwrap_or(1);
        if self.next_table_id < floor {
            self.next_table_id = floor;
        }
        self
    }
}

/// Durable home of the store document.
pub trait StorePort {
    /// `Ok(None)` when no snapshot has been written yet.
    fn load(&self) -> Result<Option<StoreDocument>, PersistenceError>;
    fn save(&mut self, document: &StoreDocument) -> Result<(), PersistenceError>;
}

/// In-memory port: keeps the last saved document and counts saves. Used by
/// tests and by callers that do not want disk IO.
#[derive(Debug, Default)]
pub struct MemoryPort {
    pub saved: Option<StoreDocument>,
    pub save_count: usize,
    pub fail_saves: bool,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            saved: Some(document),
            ..Self::default()
        }
    }
}

impl StorePort for MemoryPort {
    fn load(&self) -> Result<Option<StoreDocument>, PersistenceError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, document: &StoreDocument) -> Result<(), PersistenceError> {
        if self.fail_saves {
            return Err(PersistenceError::Io {
                path: PathBuf::from("<memory>"),
                source: io::Error::other("saves disabled"),
            });
        }
        self.saved = Some(document.clone());
        self.save_count += 1;
        Ok(())
    }
}

/// Ordered tables plus the active selection. Every mutating call writes a
/// full snapshot through the port before returning.
#[derive(Debug)]
pub struct TableStore<P: StorePort> {
    document: StoreDocument,
    port: P,
    dirty: bool,
}

impl<P: StorePort> TableStore<P> {
    /// Loads the persisted document, or starts from a single default table
    /// when nothing was persisted or the document cannot be read.
    ///
    /// An unreadable document is left on disk: the default store is only
    /// written once something is changed.
    pub fn open(port: P) -> Self {
        match port.load() {
            Ok(Some(document)) => {
                watch_info!("Loaded store with {} table(s)", document.tables.len());
                Self::from_document(document, port)
            }
            Ok(None) => {
                watch_info!("No persisted store found; starting with a default table");
                Self::fresh(port, true)
            }
            Err(err) => {
                watch_warn!("Failed to load persisted store, starting fresh: {}", err);
                Self::fresh(port, false)
            }
        }
    }

    pub fn from_document(document: StoreDocument, port: P) -> Self {
        Self {
            document: document.normalized(),
            port,
            dirty: false,
        }
    }

    fn fresh(port: P, dirty: bool) -> Self {
        Self {
            document: StoreDocument::with_default_table(),
            port,
            dirty,
        }
    }

    pub fn document(&self) -> &StoreDocument {
        &self.document
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn tables(&self) -> &[Table] {
        &self.document.tables
    }

    pub fn active_table_id(&self) -> TableId {
        self.document.active_table_id
    }

    pub fn table_summaries(&self) -> Vec<TableSummary> {
        self.document.tables.iter().map(Table::summary).collect()
    }

    /// Lookup by the `id` field; positions drift after deletions.
    pub fn table(&self, id: TableId) -> Result<&Table, StoreError> {
        self.document
            .tables
            .iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })
    }

    pub fn active_table(&self) -> Result<&Table, StoreError> {
        self.table(self.document.active_table_id)
    }

    /// Mutable access without an implicit save. Call [`TableStore::commit`]
    /// once the changes are complete.
    pub fn table_mut(&mut self, id: TableId) -> Result<&mut Table, StoreError> {
        let table = self
            .document
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })?;
        self.dirty = true;
        Ok(table)
    }

    /// True while the in-memory state differs from the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the current snapshot if it has unsaved changes.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist()
    }

    /// Persists changes made through [`TableStore::table_mut`].
    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.dirty = true;
        if let Err(err) = self.port.save(&self.document) {
            watch_error!("Failed to persist store: {}", err);
            return Err(err.into());
        }
        self.dirty = false;
        Ok(())
    }

    /// Appends a default table and makes it active. Ids come from a
    /// monotonic counter and are never reused.
    ///
    /// If only the save fails, the new table is still active in memory.
    pub fn create_table(&mut self) -> Result<TableId, StoreError> {
        let id = self.document.next_table_id;
        self.document.next_table_id += 1;
        self.document.tables.push(Table::new(id));
        self.document.active_table_id = id;
        watch_info!("Created table {}", id);
        self.persist()?;
        Ok(id)
    }

    /// Removes the active table and resets the selection to
    /// [`DEFAULT_ACTIVE_TABLE_ID`]. Nothing happens when no table matches.
    pub fn delete_active_table(&mut self) -> Result<Option<Table>, StoreError> {
        let active = self.document.active_table_id;
        let Some(position) = self.document.tables.iter().position(|t| t.id == active) else {
            watch_debug!("Delete ignored: no table with active id {}", active);
            return Ok(None);
        };
        let removed = self.document.tables.remove(position);
        self.document.active_table_id = DEFAULT_ACTIVE_TABLE_ID;
        watch_info!("Deleted table {} ({})", removed.id, removed.name);
        self.persist()?;
        Ok(Some(removed))
    }

    /// Pure selection change. The id is not validated; lookups through
    /// [`TableStore::active_table`] report a missing table.
    pub fn set_active_table_id(&mut self, id: TableId) -> Result<(), StoreError> {
        if self.table(id).is_err() {
            watch_debug!("Selecting table id {} which does not exist (yet)", id);
        }
        self.document.active_table_id = id;
        self.persist()
    }

    pub fn rename_active_table(&mut self, name: &str) -> Result<(), StoreError> {
        let table = self.active_table_mut()?;
        table.name = name.to_string();
        self.persist()
    }

    /// Changes the category only. Existing cell URLs are NOT regenerated;
    /// call [`TableStore::rebuild_queries`] or edit a heading for that.
    pub fn set_active_table_category(&mut self, category: Category) -> Result<(), StoreError> {
        let table = self.active_table_mut()?;
        table.category = category;
        self.persist()
    }

    pub fn add_column_heading(&mut self, id: TableId, label: &str) -> Result<(), StoreError> {
        self.table_entry(id)?.add_column_heading(label);
        self.persist()
    }

    pub fn add_row_heading(&mut self, id: TableId, label: &str) -> Result<(), StoreError> {
        self.table_entry(id)?.add_row_heading(label);
        self.persist()
    }

    pub fn remove_last_column_heading(&mut self, id: TableId) -> Result<String, StoreError> {
        let label = self.table_entry(id)?.remove_last_column_heading()?;
        self.persist()?;
        Ok(label)
    }

    pub fn remove_last_row_heading(&mut self, id: TableId) -> Result<String, StoreError> {
        let label = self.table_entry(id)?.remove_last_row_heading()?;
        self.persist()?;
        Ok(label)
    }

    pub fn edit_heading(
        &mut self,
        id: TableId,
        axis: Axis,
        index: usize,
        label: &str,
    ) -> Result<(), StoreError> {
        self.table_entry(id)?.edit_heading(axis, index, label)?;
        self.persist()
    }

    pub fn rebuild_queries(&mut self, id: TableId) -> Result<(), StoreError> {
        self.table_entry(id)?.rebuild_queries();
        self.persist()
    }

    fn active_table_mut(&mut self) -> Result<&mut Table, StoreError> {
        let id = self.document.active_table_id;
        self.table_entry(id)
    }

    // Unlike `table_mut`, does not flag the store dirty: callers persist
    // right after a successful change.
    fn table_entry(&mut self, id: TableId) -> Result<&mut Table, StoreError> {
        self.document
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })
    }
}
