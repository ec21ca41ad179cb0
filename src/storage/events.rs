use super::{ensure_exists, expect_changed, query_ids, require_reference, Filters};
use crate::db::{date_to_sql, get_date, get_datetime, get_opt_date, get_opt_time, get_parsed};
use crate::db::{now_sql, time_to_sql};
use crate::domain::{Event, EventFilter, EventInput};
use crate::error::{ParksError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const EVENT_COLUMNS: &str = "SELECT id, title, description, event_type, target_audience, \
     start_date, end_date, start_time, location, capacity, status, created_at, updated_at \
     FROM events";

// Link ids are filled in afterwards by `with_links`.
fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        event_type: row.get(3)?,
        target_audience: row.get(4)?,
        start_date: get_date(row, 5)?,
        end_date: get_opt_date(row, 6)?,
        start_time: get_opt_time(row, 7)?,
        location: row.get(8)?,
        capacity: row.get(9)?,
        status: get_parsed(row, 10)?,
        park_ids: Vec::new(),
        instructor_ids: Vec::new(),
        created_at: get_datetime(row, 11)?,
        updated_at: get_datetime(row, 12)?,
    })
}

fn with_links(conn: &Connection, mut event: Event) -> Result<Event> {
    event.park_ids = query_ids(
        conn,
        "SELECT park_id FROM event_parks WHERE event_id = ?1 ORDER BY park_id",
        event.id,
    )?;
    event.instructor_ids = query_ids(
        conn,
        "SELECT instructor_id FROM event_instructors WHERE event_id = ?1 ORDER BY instructor_id",
        event.id,
    )?;
    Ok(event)
}

pub fn list_events(conn: &Connection, filter: &EventFilter) -> Result<Vec<Event>> {
    let mut filters = Filters::new();
    filters.push(
        "id IN (SELECT event_id FROM event_parks WHERE park_id = ?)",
        filter.park_id,
    );
    filters.push("event_type = ?", filter.event_type.clone());
    filters.push("COALESCE(end_date, start_date) >= ?", date_to_sql(filter.from));
    filters.push("start_date <= ?", date_to_sql(filter.to));
    filters
        .query(conn, EVENT_COLUMNS, " ORDER BY start_date, start_time, id", event_from_row)?
        .into_iter()
        .map(|event| with_links(conn, event))
        .collect()
}

pub fn get_event(conn: &Connection, id: i64) -> Result<Event> {
    let event = conn
        .query_row(
            &format!("{EVENT_COLUMNS} WHERE id = ?1"),
            params![id],
            event_from_row,
        )
        .optional()?
        .ok_or_else(|| ParksError::not_found("event", id))?;
    with_links(conn, event)
}

fn replace_parks(conn: &Connection, event_id: i64, park_ids: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM event_parks WHERE event_id = ?1", params![event_id])?;
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO event_parks (event_id, park_id) VALUES (?1, ?2)")?;
    for park_id in park_ids {
        require_reference(conn, "parks", "park", *park_id)?;
        stmt.execute(params![event_id, park_id])?;
    }
    Ok(())
}

pub fn insert_event(conn: &mut Connection, input: &EventInput) -> Result<Event> {
    input.validate()?;
    let tx = conn.transaction()?;
    let now = now_sql();
    tx.execute(
        "INSERT INTO events (title, description, event_type, target_audience, start_date,
                             end_date, start_time, location, capacity, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            input.title.trim(),
            input.description,
            input.event_type,
            input.target_audience,
            date_to_sql(Some(input.start_date)),
            date_to_sql(input.end_date),
            time_to_sql(input.start_time),
            input.location,
            input.capacity,
            input.status.as_str(),
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    replace_parks(&tx, id, &input.park_ids)?;
    let event = get_event(&tx, id)?;
    tx.commit()?;
    info!(event_id = id, parks = event.park_ids.len(), "Created event");
    Ok(event)
}

/// Full update; the park list is replaced, instructor assignments are kept.
pub fn update_event(conn: &mut Connection, id: i64, input: &EventInput) -> Result<Event> {
    input.validate()?;
    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE events SET title = ?1, description = ?2, event_type = ?3, target_audience = ?4,
                start_date = ?5, end_date = ?6, start_time = ?7, location = ?8, capacity = ?9,
                status = ?10, updated_at = ?11
         WHERE id = ?12",
        params![
            input.title.trim(),
            input.description,
            input.event_type,
            input.target_audience,
            date_to_sql(Some(input.start_date)),
            date_to_sql(input.end_date),
            time_to_sql(input.start_time),
            input.location,
            input.capacity,
            input.status.as_str(),
            now_sql(),
            id,
        ],
    )?;
    expect_changed(changed, "event", id)?;
    replace_parks(&tx, id, &input.park_ids)?;
    let event = get_event(&tx, id)?;
    tx.commit()?;
    Ok(event)
}

pub fn delete_event(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
    expect_changed(changed, "event", id)
}

/// Idempotent: assigning an already assigned instructor is a no-op.
pub fn assign_instructor(conn: &Connection, event_id: i64, instructor_id: i64) -> Result<Event> {
    ensure_exists(conn, "events", "event", event_id)?;
    require_reference(conn, "instructors", "instructor", instructor_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO event_instructors (event_id, instructor_id) VALUES (?1, ?2)",
        params![event_id, instructor_id],
    )?;
    get_event(conn, event_id)
}

pub fn unassign_instructor(conn: &Connection, event_id: i64, instructor_id: i64) -> Result<()> {
    ensure_exists(conn, "events", "event", event_id)?;
    let changed = conn.execute(
        "DELETE FROM event_instructors WHERE event_id = ?1 AND instructor_id = ?2",
        params![event_id, instructor_id],
    )?;
    expect_changed(changed, "instructor assignment", instructor_id)
}
