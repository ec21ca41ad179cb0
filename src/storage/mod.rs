//! SQLite-backed persistence.
//!
//! Every function takes a borrowed connection so callers decide whether it
//! runs on its own or inside a transaction. Multi-statement mutations open
//! their own transaction and take `&mut Connection`.

pub mod assets;
pub mod events;
pub mod instructors;
pub mod parks;
pub mod roles;
pub mod sponsorships;
pub mod trees;

use crate::codes::{CodeIndex, CodeKind};
use crate::error::{ParksError, Result};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, Row};

fn code_column(kind: CodeKind) -> (&'static str, &'static str) {
    match kind {
        CodeKind::Park => ("parks", "code_prefix"),
        CodeKind::Area => ("park_areas", "code"),
        CodeKind::Species => ("species", "code"),
        CodeKind::Tree => ("trees", "code"),
    }
}

impl CodeIndex for Connection {
    fn code_exists(&self, kind: CodeKind, code: &str) -> Result<bool> {
        let (table, column) = code_column(kind);
        let sql = format!("SELECT 1 FROM {table} WHERE {column} = ?1 LIMIT 1");
        let mut stmt = self.prepare_cached(&sql)?;
        Ok(stmt.exists(params![code])?)
    }

    fn codes_with_prefix(&self, kind: CodeKind, prefix: &str) -> Result<Vec<String>> {
        let (table, column) = code_column(kind);
        // Codes are [A-Z0-9-] only, so the prefix carries no LIKE wildcards.
        let sql = format!("SELECT {column} FROM {table} WHERE {column} LIKE ?1 || '%'");
        let mut stmt = self.prepare_cached(&sql)?;
        let codes = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(codes)
    }
}

/// 404 for an id taken from the request path.
pub(crate) fn ensure_exists(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> Result<()> {
    let sql = format!("SELECT 1 FROM {table} WHERE id = ?1");
    if conn.prepare_cached(&sql)?.exists(params![id])? {
        Ok(())
    } else {
        Err(ParksError::not_found(entity, id))
    }
}

/// 400 for an id referenced from a request body.
pub(crate) fn require_reference(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> Result<()> {
    ensure_exists(conn, table, entity, id).map_err(as_reference)
}

/// Turn a lookup miss into a validation failure.
pub(crate) fn as_reference(err: ParksError) -> ParksError {
    match err {
        ParksError::NotFound { entity, id } => {
            ParksError::Validation(format!("{entity} {id} does not exist"))
        }
        other => other,
    }
}

/// Fail with 404 when a write touched no rows.
pub(crate) fn expect_changed(changed: usize, entity: &'static str, id: i64) -> Result<()> {
    if changed == 0 {
        Err(ParksError::not_found(entity, id))
    } else {
        Ok(())
    }
}

/// Optional `AND` conditions for list queries.
#[derive(Default)]
pub(crate) struct Filters {
    clauses: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl Filters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add `clause` (with one `?` placeholder) when `value` is present.
    pub(crate) fn push<T: ToSql + 'static>(&mut self, clause: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.clauses.push(clause);
            self.values.push(Box::new(value));
        }
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Run `base` + the accumulated conditions + `suffix`, mapping each row.
    pub(crate) fn query<T, F>(
        &self,
        conn: &Connection,
        base: &str,
        suffix: &str,
        map: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = format!("{base}{}{suffix}", self.where_sql());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(self.values.iter()), map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Ids from a single-column query, in row order.
pub(crate) fn query_ids(conn: &Connection, sql: &str, id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let ids = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}
