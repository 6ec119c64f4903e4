use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gridwatch_core::{
    Category, Cell, Grid, IdentifierSet, PersistenceError, StoreDocument, StorePort, Table,
    TableId, DEFAULT_ACTIVE_TABLE_ID,
};
use gridwatch_logging::{watch_debug, watch_info, watch_warn};
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;

/// Writes `content` to `target` through a temp file in the same directory
/// followed by a rename, so readers see either the old or the new document.
pub fn write_atomically(target: &Path, content: &str) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Store document kept as one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // Copies an undecodable document aside so a later save cannot lose it.
    fn keep_backup(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".bak");
        let backup = PathBuf::from(backup);
        match fs::copy(&self.path, &backup) {
            Ok(_) => watch_warn!("Kept unreadable store document as {:?}", backup),
            Err(err) => watch_warn!("Could not back up {:?}: {}", self.path, err),
        }
    }
}

impl StorePort for JsonFileStore {
    fn load(&self) -> Result<Option<StoreDocument>, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watch_debug!("No store document at {:?}", self.path);
                return Ok(None);
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let document = document_from_json(&content).inspect_err(|_| self.keep_backup())?;
        watch_info!("Loaded store document from {:?}", self.path);
        Ok(Some(document))
    }

    fn save(&mut self, document: &StoreDocument) -> Result<(), PersistenceError> {
        let content = document_to_json(document)?;
        write_atomically(&self.path, &content).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        watch_debug!("Saved store document to {:?}", self.path);
        Ok(())
    }
}

pub fn document_to_json(document: &StoreDocument) -> Result<String, PersistenceError> {
    serde_json::to_string_pretty(&PersistedStore::from(document))
        .map_err(|err| PersistenceError::Encode(err.to_string()))
}

pub fn document_from_json(content: &str) -> Result<StoreDocument, PersistenceError> {
    serde_json::from_str::<PersistedStore>(content)
        .map(StoreDocument::from)
        .map_err(|err| PersistenceError::Decode(err.to_string()))
}

pub fn table_to_json(table: &Table) -> Result<String, PersistenceError> {
    serde_json::to_string_pretty(&PersistedTable::from(table))
        .map_err(|err| PersistenceError::Encode(err.to_string()))
}

pub fn table_from_json(content: &str) -> Result<Table, PersistenceError> {
    serde_json::from_str::<PersistedTable>(content)
        .map(Table::from)
        .map_err(|err| PersistenceError::Decode(err.to_string()))
}

const UNKNOWN_HITS: i64 = -1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStore {
    #[serde(rename = "activetablemodelid", default = "default_active_table")]
    active_table_id: TableId,
    #[serde(rename = "nexttableid", default)]
    next_table_id: TableId,
    #[serde(rename = "tablemodels", default, deserialize_with = "null_as_default")]
    tables: Vec<PersistedTable>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTable {
    name: String,
    id: TableId,
    #[serde(default, deserialize_with = "null_as_default")]
    category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    top_headings: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    side_headings: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    rows: Vec<Vec<PersistedCell>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCell {
    #[serde(rename = "pageUrl", default)]
    page_url: String,
    // Early documents stored the RSS feed address instead.
    #[serde(rename = "feedUrl", default, skip_serializing)]
    feed_url: String,
    #[serde(default = "unknown_hits")]
    hits: i64,
    #[serde(
        rename = "linksAlreadySeen",
        alias = "LinksAlreadySeen",
        default,
        deserialize_with = "null_as_default"
    )]
    links_already_seen: Vec<String>,
}

fn default_active_table() -> TableId {
    DEFAULT_ACTIVE_TABLE_ID
}

fn unknown_hits() -> i64 {
    UNKNOWN_HITS
}

// Older documents wrote `null` for empty lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&StoreDocument> for PersistedStore {
    fn from(document: &StoreDocument) -> Self {
        Self {
            active_table_id: document.active_table_id,
            next_table_id: document.next_table_id,
            tables: document.tables.iter().map(PersistedTable::from).collect(),
        }
    }
}

impl From<PersistedStore> for StoreDocument {
    fn from(store: PersistedStore) -> Self {
        Self {
            active_table_id: store.active_table_id,
            next_table_id: store.next_table_id,
            tables: store.tables.into_iter().map(Table::from).collect(),
        }
    }
}

impl From<&Table> for PersistedTable {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            id: table.id,
            category: table.category.as_str().to_string(),
            top_headings: table.grid.column_headings().to_vec(),
            side_headings: table.grid.row_headings().to_vec(),
            rows: table
                .grid
                .rows()
                .iter()
                .map(|row| row.iter().map(PersistedCell::from).collect())
                .collect(),
        }
    }
}

impl From<PersistedTable> for Table {
    fn from(table: PersistedTable) -> Self {
        let category = Category::new(table.category);
        let cells = table
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Cell::from).collect())
            .collect();
        let grid = Grid::restore(table.side_headings, table.top_headings, cells, &category);
        Self {
            id: table.id,
            name: table.name,
            category,
            grid,
        }
    }
}

impl From<&Cell> for PersistedCell {
    fn from(cell: &Cell) -> Self {
        Self {
            page_url: cell.query_url().to_string(),
            feed_url: String::new(),
            hits: cell
                .hits()
                .and_then(|hits| i64::try_from(hits).ok())
                .unwrap_or(UNKNOWN_HITS),
            links_already_seen: cell.seen().iter().map(str::to_string).collect(),
        }
    }
}

impl From<PersistedCell> for Cell {
    fn from(cell: PersistedCell) -> Self {
        let hits = usize::try_from(cell.hits).ok();
        let seen: IdentifierSet = cell.links_already_seen.into_iter().collect();
        let url = if cell.page_url.is_empty() {
            cell.feed_url
        } else {
            cell.page_url
        };
        Cell::from_parts(url, hits, seen)
    }
}
