use super::{expect_changed, Filters};
use crate::db::{get_datetime, get_json, get_parsed, now_sql};
use crate::domain::{Instructor, InstructorInput};
use crate::error::{ParksError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const INSTRUCTOR_COLUMNS: &str = "SELECT id, full_name, email, phone, specialties, \
     experience_years, hourly_rate, status, bio, created_at FROM instructors";

fn instructor_from_row(row: &Row<'_>) -> rusqlite::Result<Instructor> {
    Ok(Instructor {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        specialties: get_json(row, 4)?,
        experience_years: row.get(5)?,
        hourly_rate: row.get(6)?,
        status: get_parsed(row, 7)?,
        bio: row.get(8)?,
        created_at: get_datetime(row, 9)?,
    })
}

pub fn list_instructors(conn: &Connection) -> Result<Vec<Instructor>> {
    Filters::new().query(conn, INSTRUCTOR_COLUMNS, " ORDER BY full_name", instructor_from_row)
}

pub fn get_instructor(conn: &Connection, id: i64) -> Result<Instructor> {
    conn.query_row(
        &format!("{INSTRUCTOR_COLUMNS} WHERE id = ?1"),
        params![id],
        instructor_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("instructor", id))
}

pub fn insert_instructor(conn: &Connection, input: &InstructorInput) -> Result<Instructor> {
    input.validate()?;
    conn.execute(
        "INSERT INTO instructors (full_name, email, phone, specialties, experience_years,
                                  hourly_rate, status, bio, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            input.full_name.trim(),
            input.email.trim(),
            input.phone,
            serde_json::to_string(&input.specialties)?,
            input.experience_years,
            input.hourly_rate,
            input.status.as_str(),
            input.bio,
            now_sql(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(instructor_id = id, "Created instructor");
    get_instructor(conn, id)
}

pub fn update_instructor(conn: &Connection, id: i64, input: &InstructorInput) -> Result<Instructor> {
    input.validate()?;
    let changed = conn.execute(
        "UPDATE instructors SET full_name = ?1, email = ?2, phone = ?3, specialties = ?4,
                experience_years = ?5, hourly_rate = ?6, status = ?7, bio = ?8
         WHERE id = ?9",
        params![
            input.full_name.trim(),
            input.email.trim(),
            input.phone,
            serde_json::to_string(&input.specialties)?,
            input.experience_years,
            input.hourly_rate,
            input.status.as_str(),
            input.bio,
            id,
        ],
    )?;
    expect_changed(changed, "instructor", id)?;
    get_instructor(conn, id)
}

pub fn delete_instructor(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM instructors WHERE id = ?1", params![id])?;
    expect_changed(changed, "instructor", id)
}
