use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::table::Table;

/// Metadata for one stored dataset. `hash` is the BLAKE3 digest of the
/// table's JSON form, so identical tables share an address.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetHandle {
    pub hash: String,
    pub collection: String,
    pub name: String,
    pub tag: String,
    pub message: String,
    pub rows: usize,
    pub columns: usize,
    pub saved_at: DateTime<Utc>,
}

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS datasets (
            collection  TEXT NOT NULL,
            hash        TEXT NOT NULL,
            name        TEXT NOT NULL,
            tag         TEXT NOT NULL,
            message     TEXT NOT NULL,
            row_count   INTEGER NOT NULL,
            col_count   INTEGER NOT NULL,
            payload     TEXT NOT NULL,
            saved_at    TEXT NOT NULL,
            PRIMARY KEY (collection, hash)
        );
        CREATE INDEX IF NOT EXISTS idx_datasets_tag ON datasets(collection, tag);
        ",
    )?;
    Ok(())
}

pub fn content_hash(payload: &str) -> String {
    blake3::hash(payload.as_bytes()).to_hex().to_string()
}

/// Store a table. Saving content that is already in the collection keeps the
/// first copy and returns its handle.
pub fn save(
    conn: &Connection,
    table: &Table,
    collection: &str,
    name: &str,
    tag: &str,
    message: &str,
) -> Result<DatasetHandle> {
    let payload = serde_json::to_string(table)?;
    let hash = content_hash(&payload);

    if let Some(existing) = find(conn, collection, &hash)? {
        info!(hash = %existing.hash, "Dataset already stored");
        return Ok(existing);
    }

    let handle = DatasetHandle {
        hash,
        collection: collection.to_string(),
        name: name.to_string(),
        tag: tag.to_string(),
        message: message.to_string(),
        rows: table.len(),
        columns: table.width(),
        saved_at: Utc::now().trunc_subsecs(6),
    };
    conn.execute(
        "INSERT INTO datasets (collection, hash, name, tag, message, row_count, col_count, payload, saved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            handle.collection,
            handle.hash,
            handle.name,
            handle.tag,
            handle.message,
            handle.rows as i64,
            handle.columns as i64,
            payload,
            handle.saved_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        ],
    )
    .context("Failed to save dataset")?;

    info!(hash = %handle.hash, rows = handle.rows, "Saved dataset {}/{}", collection, name);
    Ok(handle)
}

pub fn load(conn: &Connection, collection: &str, hash: &str) -> Result<Table> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM datasets WHERE collection = ?1 AND hash = ?2",
            params![collection, hash],
            |row| row.get(0),
        )
        .optional()?;
    let Some(payload) = payload else {
        bail!("No dataset {} in collection {}", hash, collection);
    };
    let table: Table = serde_json::from_str(&payload).context("Corrupt dataset payload")?;
    info!(rows = table.len(), "Loaded dataset {}/{}", collection, hash);
    Ok(table)
}

const HANDLE_COLUMNS: &str = "hash, collection, name, tag, message, row_count, col_count, saved_at";

fn handle_from_row(row: &Row) -> rusqlite::Result<DatasetHandle> {
    let saved_at: String = row.get(7)?;
    let saved_at = DateTime::parse_from_rfc3339(&saved_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;
    Ok(DatasetHandle {
        hash: row.get(0)?,
        collection: row.get(1)?,
        name: row.get(2)?,
        tag: row.get(3)?,
        message: row.get(4)?,
        rows: row.get::<_, i64>(5)? as usize,
        columns: row.get::<_, i64>(6)? as usize,
        saved_at,
    })
}

pub fn find(conn: &Connection, collection: &str, hash: &str) -> Result<Option<DatasetHandle>> {
    let handle = conn
        .query_row(
            &format!("SELECT {HANDLE_COLUMNS} FROM datasets WHERE collection = ?1 AND hash = ?2"),
            params![collection, hash],
            handle_from_row,
        )
        .optional()?;
    Ok(handle)
}

/// Most recently saved dataset carrying `tag`.
pub fn latest(conn: &Connection, collection: &str, tag: &str) -> Result<Option<DatasetHandle>> {
    let handle = conn
        .query_row(
            &format!(
                "SELECT {HANDLE_COLUMNS} FROM datasets WHERE collection = ?1 AND tag = ?2
                 ORDER BY saved_at DESC, rowid DESC LIMIT 1"
            ),
            params![collection, tag],
            handle_from_row,
        )
        .optional()?;
    Ok(handle)
}

pub fn list(conn: &Connection, collection: &str) -> Result<Vec<DatasetHandle>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HANDLE_COLUMNS} FROM datasets WHERE collection = ?1 ORDER BY saved_at, rowid"
    ))?;
    let rows = stmt
        .query_map(params![collection], handle_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
