use super::{ensure_exists, require_reference, Filters};
use crate::db::{date_to_sql, get_datetime, get_opt_date, get_opt_json, get_parsed, now_sql};
use crate::domain::{
    Amenity, AmenityInput, Asset, AssetFilter, AssetHistoryEntry, AssetInput, HistoryChange,
};
use crate::error::{ParksError, Result};
use crate::metrics;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{json, Map, Value};
use tracing::info;

pub fn list_amenities(conn: &Connection) -> Result<Vec<Amenity>> {
    Filters::new().query(
        conn,
        "SELECT id, name, category FROM amenities",
        " ORDER BY name",
        |row| {
            Ok(Amenity {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
            })
        },
    )
}

pub fn insert_amenity(conn: &Connection, input: &AmenityInput) -> Result<Amenity> {
    input.validate()?;
    let name = input.name.trim();
    conn.execute(
        "INSERT INTO amenities (name, category) VALUES (?1, ?2)",
        params![name, input.category],
    )?;
    Ok(Amenity {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        category: input.category.clone(),
    })
}

const ASSET_COLUMNS: &str = "SELECT id, name, category, park_id, amenity_id, status, condition, \
     serial_number, acquisition_date, acquisition_cost, last_maintenance_date, \
     next_maintenance_date, latitude, longitude, notes, created_at, updated_at FROM assets";

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        park_id: row.get(3)?,
        amenity_id: row.get(4)?,
        status: get_parsed(row, 5)?,
        condition: get_parsed(row, 6)?,
        serial_number: row.get(7)?,
        acquisition_date: get_opt_date(row, 8)?,
        acquisition_cost: row.get(9)?,
        last_maintenance_date: get_opt_date(row, 10)?,
        next_maintenance_date: get_opt_date(row, 11)?,
        latitude: row.get(12)?,
        longitude: row.get(13)?,
        notes: row.get(14)?,
        created_at: get_datetime(row, 15)?,
        updated_at: get_datetime(row, 16)?,
    })
}

pub fn list_assets(conn: &Connection, filter: &AssetFilter) -> Result<Vec<Asset>> {
    let mut filters = Filters::new();
    filters.push("park_id = ?", filter.park_id);
    filters.push("status = ?", filter.status.map(|s| s.as_str()));
    filters.push("category = ?", filter.category.clone());
    filters.query(conn, ASSET_COLUMNS, " ORDER BY name, id", asset_from_row)
}

pub fn get_asset(conn: &Connection, id: i64) -> Result<Asset> {
    conn.query_row(
        &format!("{ASSET_COLUMNS} WHERE id = ?1"),
        params![id],
        asset_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("asset", id))
}

fn check_references(conn: &Connection, input: &AssetInput) -> Result<()> {
    require_reference(conn, "parks", "park", input.park_id)?;
    if let Some(amenity_id) = input.amenity_id {
        require_reference(conn, "amenities", "amenity", amenity_id)?;
    }
    Ok(())
}

fn record_history(
    conn: &Connection,
    asset_id: i64,
    change: HistoryChange,
    description: &str,
    changes: Option<&Value>,
    changed_by: Option<&str>,
) -> Result<()> {
    let changes = changes.map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO asset_history (asset_id, change_type, description, changes, changed_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            asset_id,
            change.as_str(),
            description,
            changes,
            changed_by,
            now_sql()
        ],
    )?;
    metrics::record_asset_history(change.as_str());
    Ok(())
}

pub fn insert_asset(
    conn: &mut Connection,
    input: &AssetInput,
    changed_by: Option<&str>,
) -> Result<Asset> {
    input.validate()?;
    let tx = conn.transaction()?;
    check_references(&tx, input)?;

    let now = now_sql();
    tx.execute(
        "INSERT INTO assets (name, category, park_id, amenity_id, status, condition, serial_number,
                             acquisition_date, acquisition_cost, last_maintenance_date,
                             next_maintenance_date, latitude, longitude, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
        params![
            input.name.trim(),
            input.category,
            input.park_id,
            input.amenity_id,
            input.status.as_str(),
            input.condition.as_str(),
            input.serial_number,
            date_to_sql(input.acquisition_date),
            input.acquisition_cost,
            date_to_sql(input.last_maintenance_date),
            date_to_sql(input.next_maintenance_date),
            input.latitude,
            input.longitude,
            input.notes,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    record_history(
        &tx,
        id,
        HistoryChange::Created,
        &format!("Created asset '{}'", input.name.trim()),
        None,
        changed_by,
    )?;
    let asset = get_asset(&tx, id)?;
    tx.commit()?;
    info!(asset_id = id, "Created asset");
    Ok(asset)
}

/// `{field: {"from": old, "to": new}}` for every field that differs.
fn field_changes(before: &Asset, after: &Asset) -> Result<Map<String, Value>> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;
    let mut changes = Map::new();
    if let (Value::Object(before), Value::Object(after)) = (before, after) {
        for (field, old) in before {
            if matches!(field.as_str(), "id" | "created_at" | "updated_at") {
                continue;
            }
            let new = after.get(&field).cloned().unwrap_or(Value::Null);
            if old != new {
                changes.insert(field, json!({ "from": old, "to": new }));
            }
        }
    }
    Ok(changes)
}

/// Full update; an update that changes nothing writes nothing.
pub fn update_asset(
    conn: &mut Connection,
    id: i64,
    input: &AssetInput,
    changed_by: Option<&str>,
) -> Result<Asset> {
    input.validate()?;
    let tx = conn.transaction()?;
    let current = get_asset(&tx, id)?;
    check_references(&tx, input)?;

    let proposed = Asset {
        id,
        name: input.name.trim().to_string(),
        category: input.category.clone(),
        park_id: input.park_id,
        amenity_id: input.amenity_id,
        status: input.status,
        condition: input.condition,
        serial_number: input.serial_number.clone(),
        acquisition_date: input.acquisition_date,
        acquisition_cost: input.acquisition_cost,
        last_maintenance_date: input.last_maintenance_date,
        next_maintenance_date: input.next_maintenance_date,
        latitude: input.latitude,
        longitude: input.longitude,
        notes: input.notes.clone(),
        created_at: current.created_at,
        updated_at: current.updated_at,
    };
    let changes = field_changes(&current, &proposed)?;
    if changes.is_empty() {
        return Ok(current);
    }

    tx.execute(
        "UPDATE assets SET name = ?1, category = ?2, park_id = ?3, amenity_id = ?4, status = ?5,
                condition = ?6, serial_number = ?7, acquisition_date = ?8, acquisition_cost = ?9,
                last_maintenance_date = ?10, next_maintenance_date = ?11, latitude = ?12,
                longitude = ?13, notes = ?14, updated_at = ?15
         WHERE id = ?16",
        params![
            proposed.name,
            proposed.category,
            proposed.park_id,
            proposed.amenity_id,
            proposed.status.as_str(),
            proposed.condition.as_str(),
            proposed.serial_number,
            date_to_sql(proposed.acquisition_date),
            proposed.acquisition_cost,
            date_to_sql(proposed.last_maintenance_date),
            date_to_sql(proposed.next_maintenance_date),
            proposed.latitude,
            proposed.longitude,
            proposed.notes,
            now_sql(),
            id,
        ],
    )?;
    let mut fields: Vec<&str> = changes.keys().map(String::as_str).collect();
    fields.sort_unstable();
    let description = format!("Updated {}", fields.join(", "));
    record_history(
        &tx,
        id,
        HistoryChange::Updated,
        &description,
        Some(&Value::Object(changes.clone())),
        changed_by,
    )?;
    let asset = get_asset(&tx, id)?;
    tx.commit()?;
    info!(asset_id = id, "{}", description);
    Ok(asset)
}

/// Delete the row and log its final state. History rows are kept.
pub fn delete_asset(conn: &mut Connection, id: i64, changed_by: Option<&str>) -> Result<()> {
    let tx = conn.transaction()?;
    let current = get_asset(&tx, id)?;
    tx.execute("DELETE FROM assets WHERE id = ?1", params![id])?;
    let snapshot = serde_json::to_value(&current)?;
    record_history(
        &tx,
        id,
        HistoryChange::Deleted,
        &format!("Deleted asset '{}'", current.name),
        Some(&snapshot),
        changed_by,
    )?;
    tx.commit()?;
    info!(asset_id = id, "Deleted asset");
    Ok(())
}

/// Newest first. Works for deleted assets as long as they left history.
pub fn asset_history(conn: &Connection, asset_id: i64) -> Result<Vec<AssetHistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, asset_id, change_type, description, changes, changed_by, created_at
         FROM asset_history WHERE asset_id = ?1 ORDER BY id DESC",
    )?;
    let entries = stmt
        .query_map(params![asset_id], |row| {
            Ok(AssetHistoryEntry {
                id: row.get(0)?,
                asset_id: row.get(1)?,
                change_type: get_parsed(row, 2)?,
                description: row.get(3)?,
                changes: get_opt_json(row, 4)?,
                changed_by: row.get(5)?,
                created_at: get_datetime(row, 6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if entries.is_empty() {
        ensure_exists(conn, "assets", "asset", asset_id)?;
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodeSettings;
    use crate::db::test_connection;
    use crate::domain::{AssetCondition, AssetStatus};
    use crate::storage::parks::insert_park;
    use crate::storage::parks::tests::park_input;

    fn setup() -> (Connection, i64) {
        let conn = test_connection();
        let park = insert_park(&conn, &park_input("Agua Azul"), CodeSettings::default()).unwrap();
        (conn, park.id)
    }

    fn bench(park_id: i64) -> AssetInput {
        serde_json::from_value(json!({
            "name": "Bench 12",
            "category": "furniture",
            "park_id": park_id,
            "acquisition_cost": 1200.0
        }))
        .unwrap()
    }

    fn history_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM asset_history", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn each_mutation_writes_one_history_row() {
        let (mut conn, park_id) = setup();
        let asset = insert_asset(&mut conn, &bench(park_id), Some("user-7")).unwrap();
        assert_eq!(history_count(&conn), 1);

        let mut input = bench(park_id);
        input.status = AssetStatus::Damaged;
        input.condition = AssetCondition::Poor;
        let updated = update_asset(&mut conn, asset.id, &input, None).unwrap();
        assert_eq!(updated.status, AssetStatus::Damaged);
        assert_eq!(history_count(&conn), 2);

        delete_asset(&mut conn, asset.id, Some("user-9")).unwrap();
        assert_eq!(history_count(&conn), 3);
        assert!(matches!(
            get_asset(&conn, asset.id),
            Err(ParksError::NotFound { .. })
        ));

        let history = asset_history(&conn, asset.id).unwrap();
        let kinds: Vec<_> = history.iter().map(|h| h.change_type).collect();
        assert_eq!(
            kinds,
            vec![
                HistoryChange::Deleted,
                HistoryChange::Updated,
                HistoryChange::Created
            ]
        );
        assert_eq!(history[0].changed_by.as_deref(), Some("user-9"));
        assert_eq!(history[2].changed_by.as_deref(), Some("user-7"));

        let diff = history[1].changes.as_ref().unwrap();
        assert_eq!(diff["status"], json!({"from": "active", "to": "damaged"}));
        assert_eq!(diff["condition"], json!({"from": "good", "to": "poor"}));
        assert!(diff.get("name").is_none());
        assert_eq!(history[1].description, "Updated condition, status");

        let snapshot = history[0].changes.as_ref().unwrap();
        assert_eq!(snapshot["name"], "Bench 12");
    }

    #[test]
    fn unchanged_update_writes_nothing() {
        let (mut conn, park_id) = setup();
        let asset = insert_asset(&mut conn, &bench(park_id), None).unwrap();
        let same = update_asset(&mut conn, asset.id, &bench(park_id), None).unwrap();
        assert_eq!(same, asset);
        assert_eq!(history_count(&conn), 1);
    }

    #[test]
    fn failed_history_write_rolls_back_the_asset() {
        let (mut conn, park_id) = setup();
        conn.execute_batch(
            "CREATE TRIGGER refuse_history BEFORE INSERT ON asset_history
             BEGIN SELECT RAISE(ABORT, 'history unavailable'); END;",
        )
        .unwrap();

        assert!(insert_asset(&mut conn, &bench(park_id), None).is_err());
        let assets: i64 = conn
            .query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(assets, 0);
        assert_eq!(history_count(&conn), 0);
    }

    #[test]
    fn references_are_checked_before_writing() {
        let (mut conn, park_id) = setup();
        let mut input = bench(park_id);
        input.amenity_id = Some(5);
        let err = insert_asset(&mut conn, &input, None).unwrap_err();
        assert_eq!(err.to_string(), "amenity 5 does not exist");
        assert_eq!(history_count(&conn), 0);

        assert!(matches!(
            asset_history(&conn, 77),
            Err(ParksError::NotFound { .. })
        ));
    }

    #[test]
    fn list_filters_by_status() {
        let (mut conn, park_id) = setup();
        insert_asset(&mut conn, &bench(park_id), None).unwrap();
        let mut broken = bench(park_id);
        broken.name = "Swing".to_string();
        broken.status = AssetStatus::Maintenance;
        insert_asset(&mut conn, &broken, None).unwrap();

        let filter = AssetFilter {
            status: Some(AssetStatus::Maintenance),
            ..AssetFilter::default()
        };
        let found = list_assets(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Swing");
        assert_eq!(list_assets(&conn, &AssetFilter::default()).unwrap().len(), 2);
    }
}
