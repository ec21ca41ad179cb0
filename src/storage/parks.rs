use super::{ensure_exists, expect_changed, require_reference, Filters};
use crate::codes::{normalize_explicit_code, CodeGenerator, CodeIndex, CodeKind};
use crate::config::CodeSettings;
use crate::db::{get_datetime, get_opt_json, now_sql};
use crate::domain::{
    AreaInput, Municipality, MunicipalityInput, Park, ParkArea, ParkFilter, ParkInput,
};
use crate::error::{ParksError, Result};
use crate::geo::{self, Point, Polygon};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{info, warn};

pub fn list_municipalities(conn: &Connection) -> Result<Vec<Municipality>> {
    let mut stmt = conn.prepare("SELECT id, name, state FROM municipalities ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Municipality {
                id: row.get(0)?,
                name: row.get(1)?,
                state: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn insert_municipality(conn: &Connection, input: &MunicipalityInput) -> Result<Municipality> {
    input.validate()?;
    let name = input.name.trim();
    conn.execute(
        "INSERT INTO municipalities (name, state) VALUES (?1, ?2)",
        params![name, input.state],
    )?;
    Ok(Municipality {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        state: input.state.clone(),
    })
}

const PARK_COLUMNS: &str = "SELECT id, name, municipality_id, park_type, address, latitude, \
     longitude, area_sqm, conservation_status, code_prefix, created_at, updated_at FROM parks";

fn park_from_row(row: &Row<'_>) -> rusqlite::Result<Park> {
    Ok(Park {
        id: row.get(0)?,
        name: row.get(1)?,
        municipality_id: row.get(2)?,
        park_type: row.get(3)?,
        address: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        area_sqm: row.get(7)?,
        conservation_status: row.get(8)?,
        code_prefix: row.get(9)?,
        created_at: get_datetime(row, 10)?,
        updated_at: get_datetime(row, 11)?,
    })
}

pub fn list_parks(conn: &Connection, filter: &ParkFilter) -> Result<Vec<Park>> {
    let mut filters = Filters::new();
    filters.push("municipality_id = ?", filter.municipality_id);
    filters.push("park_type = ?", filter.park_type.clone());
    filters.query(conn, PARK_COLUMNS, " ORDER BY name", park_from_row)
}

pub fn get_park(conn: &Connection, id: i64) -> Result<Park> {
    conn.query_row(
        &format!("{PARK_COLUMNS} WHERE id = ?1"),
        params![id],
        park_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("park", id))
}

fn explicit_prefix(conn: &Connection, raw: &str, current: Option<&str>) -> Result<String> {
    let code = normalize_explicit_code(raw)?;
    if current != Some(code.as_str()) && conn.code_exists(CodeKind::Park, &code)? {
        return Err(ParksError::Conflict(format!(
            "code prefix {code} is already in use"
        )));
    }
    Ok(code)
}

pub fn insert_park(conn: &Connection, input: &ParkInput, settings: CodeSettings) -> Result<Park> {
    input.validate()?;
    if let Some(municipality_id) = input.municipality_id {
        require_reference(conn, "municipalities", "municipality", municipality_id)?;
    }
    let code_prefix = match input.code_prefix.as_deref() {
        Some(raw) => explicit_prefix(conn, raw, None)?,
        None => CodeGenerator::new(conn, settings).park_prefix(&input.name)?,
    };

    let now = now_sql();
    conn.execute(
        "INSERT INTO parks (name, municipality_id, park_type, address, latitude, longitude,
                            area_sqm, conservation_status, code_prefix, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            input.name.trim(),
            input.municipality_id,
            input.park_type,
            input.address,
            input.latitude,
            input.longitude,
            input.area_sqm,
            input.conservation_status,
            code_prefix,
            now,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(park_id = id, code_prefix = %code_prefix, "Created park");
    get_park(conn, id)
}

/// Full update. The code prefix only changes when the caller sends a new one.
pub fn update_park(conn: &Connection, id: i64, input: &ParkInput) -> Result<Park> {
    input.validate()?;
    let current = get_park(conn, id)?;
    if let Some(municipality_id) = input.municipality_id {
        require_reference(conn, "municipalities", "municipality", municipality_id)?;
    }
    let code_prefix = match input.code_prefix.as_deref() {
        Some(raw) => explicit_prefix(conn, raw, Some(&current.code_prefix))?,
        None => current.code_prefix,
    };

    conn.execute(
        "UPDATE parks SET name = ?1, municipality_id = ?2, park_type = ?3, address = ?4,
                latitude = ?5, longitude = ?6, area_sqm = ?7, conservation_status = ?8,
                code_prefix = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            input.name.trim(),
            input.municipality_id,
            input.park_type,
            input.address,
            input.latitude,
            input.longitude,
            input.area_sqm,
            input.conservation_status,
            code_prefix,
            now_sql(),
            id,
        ],
    )?;
    get_park(conn, id)
}

pub fn delete_park(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM parks WHERE id = ?1", params![id])?;
    expect_changed(changed, "park", id)?;
    info!(park_id = id, "Deleted park");
    Ok(())
}

const AREA_COLUMNS: &str = "SELECT id, park_id, name, code, description, polygon FROM park_areas";

fn area_from_row(row: &Row<'_>) -> rusqlite::Result<ParkArea> {
    Ok(ParkArea {
        id: row.get(0)?,
        park_id: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        description: row.get(4)?,
        polygon: get_opt_json(row, 5)?,
    })
}

pub fn list_areas(conn: &Connection, park_id: i64) -> Result<Vec<ParkArea>> {
    ensure_exists(conn, "parks", "park", park_id)?;
    let mut stmt = conn.prepare(&format!("{AREA_COLUMNS} WHERE park_id = ?1 ORDER BY id"))?;
    let rows = stmt
        .query_map(params![park_id], area_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get_area(conn: &Connection, id: i64) -> Result<ParkArea> {
    conn.query_row(
        &format!("{AREA_COLUMNS} WHERE id = ?1"),
        params![id],
        area_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("area", id))
}

/// Validate a submitted polygon and serialize it as a `{lat, lng}` list.
fn canonical_polygon(raw: Option<&serde_json::Value>) -> Result<Option<String>> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => {
            let polygon = Polygon::from_json(value)?;
            Ok(Some(serde_json::to_string(polygon.vertices())?))
        }
    }
}

pub fn insert_area(
    conn: &Connection,
    park_id: i64,
    input: &AreaInput,
    settings: CodeSettings,
) -> Result<ParkArea> {
    input.validate()?;
    let park = get_park(conn, park_id)?;
    let polygon = canonical_polygon(input.polygon.as_ref())?;
    let code = CodeGenerator::new(conn, settings).area_code(&park.code_prefix, &input.name)?;

    conn.execute(
        "INSERT INTO park_areas (park_id, name, code, description, polygon)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![park_id, input.name.trim(), code, input.description, polygon],
    )?;
    let id = conn.last_insert_rowid();
    info!(park_id, area_id = id, code = %code, "Created park area");
    get_area(conn, id)
}

/// Renaming an area keeps its code so existing tree codes stay meaningful.
pub fn update_area(conn: &Connection, id: i64, input: &AreaInput) -> Result<ParkArea> {
    input.validate()?;
    let polygon = canonical_polygon(input.polygon.as_ref())?;
    let changed = conn.execute(
        "UPDATE park_areas SET name = ?1, description = ?2, polygon = ?3 WHERE id = ?4",
        params![input.name.trim(), input.description, polygon, id],
    )?;
    expect_changed(changed, "area", id)?;
    get_area(conn, id)
}

pub fn delete_area(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM park_areas WHERE id = ?1", params![id])?;
    expect_changed(changed, "area", id)
}

/// A park's areas that have an outline, in id order.
pub(crate) fn area_polygons(conn: &Connection, park_id: i64) -> Result<Vec<(ParkArea, Polygon)>> {
    let mut out = Vec::new();
    for area in list_areas(conn, park_id)? {
        let Some(vertices) = area.polygon.clone() else {
            continue;
        };
        match Polygon::new(vertices) {
            Ok(polygon) => out.push((area, polygon)),
            Err(e) => warn!(area_id = area.id, error = %e, "Skipping area with unusable polygon"),
        }
    }
    Ok(out)
}

/// The first of the park's areas whose outline contains `point`.
pub fn locate_area(conn: &Connection, park_id: i64, point: Point) -> Result<Option<ParkArea>> {
    let areas = area_polygons(conn, park_id)?;
    let found = geo::locate_area(areas.iter().map(|(area, poly)| (area.id, poly)), point);
    Ok(found.and_then(|id| areas.into_iter().find(|(area, _)| area.id == id).map(|(a, _)| a)))
}
