use super::parks::{self, get_area, get_park};
use super::{as_reference, expect_changed, Filters};
use crate::codes::{tree_code_prefix, CodeGenerator};
use crate::config::CodeSettings;
use crate::db::{date_to_sql, get_datetime, get_opt_date, now_sql};
use crate::domain::{
    LinkSummary, Park, ParkArea, Species, SpeciesInput, Tree, TreeFilter, TreeInput,
};
use crate::error::{ParksError, Result};
use crate::geo;
use crate::metrics;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

const SPECIES_COLUMNS: &str =
    "SELECT id, common_name, scientific_name, family, origin, code FROM species";

fn species_from_row(row: &Row<'_>) -> rusqlite::Result<Species> {
    Ok(Species {
        id: row.get(0)?,
        common_name: row.get(1)?,
        scientific_name: row.get(2)?,
        family: row.get(3)?,
        origin: row.get(4)?,
        code: row.get(5)?,
    })
}

pub fn list_species(conn: &Connection) -> Result<Vec<Species>> {
    Filters::new().query(conn, SPECIES_COLUMNS, " ORDER BY common_name", species_from_row)
}

pub fn get_species(conn: &Connection, id: i64) -> Result<Species> {
    conn.query_row(
        &format!("{SPECIES_COLUMNS} WHERE id = ?1"),
        params![id],
        species_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("species", id))
}

pub fn insert_species(
    conn: &Connection,
    input: &SpeciesInput,
    settings: CodeSettings,
) -> Result<Species> {
    input.validate()?;
    let code = CodeGenerator::new(conn, settings).species_code(input.code_source())?;
    conn.execute(
        "INSERT INTO species (common_name, scientific_name, family, origin, code)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            input.common_name.trim(),
            input.scientific_name,
            input.family,
            input.origin,
            code
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(species_id = id, code = %code, "Created species");
    get_species(conn, id)
}

/// Species codes are kept on update; tree codes embed them.
pub fn update_species(conn: &Connection, id: i64, input: &SpeciesInput) -> Result<Species> {
    input.validate()?;
    let changed = conn.execute(
        "UPDATE species SET common_name = ?1, scientific_name = ?2, family = ?3, origin = ?4
         WHERE id = ?5",
        params![
            input.common_name.trim(),
            input.scientific_name,
            input.family,
            input.origin,
            id
        ],
    )?;
    expect_changed(changed, "species", id)?;
    get_species(conn, id)
}

pub fn delete_species(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM species WHERE id = ?1", params![id])?;
    expect_changed(changed, "species", id)
}

const TREE_COLUMNS: &str = "SELECT id, code, species_id, park_id, area_id, latitude, longitude, \
     planting_date, height_m, trunk_diameter_cm, health_status, notes, created_at, updated_at \
     FROM trees";

fn tree_from_row(row: &Row<'_>) -> rusqlite::Result<Tree> {
    Ok(Tree {
        id: row.get(0)?,
        code: row.get(1)?,
        species_id: row.get(2)?,
        park_id: row.get(3)?,
        area_id: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        planting_date: get_opt_date(row, 7)?,
        height_m: row.get(8)?,
        trunk_diameter_cm: row.get(9)?,
        health_status: row.get(10)?,
        notes: row.get(11)?,
        created_at: get_datetime(row, 12)?,
        updated_at: get_datetime(row, 13)?,
    })
}

pub fn list_trees(conn: &Connection, filter: &TreeFilter) -> Result<Vec<Tree>> {
    let mut filters = Filters::new();
    filters.push("park_id = ?", filter.park_id);
    filters.push("area_id = ?", filter.area_id);
    filters.push("species_id = ?", filter.species_id);
    filters.query(conn, TREE_COLUMNS, " ORDER BY code", tree_from_row)
}

pub fn get_tree(conn: &Connection, id: i64) -> Result<Tree> {
    conn.query_row(
        &format!("{TREE_COLUMNS} WHERE id = ?1"),
        params![id],
        tree_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("tree", id))
}

/// The references a tree code is built from.
struct Placement {
    park: Park,
    species: Species,
    area: Option<ParkArea>,
}

impl Placement {
    fn resolve(conn: &Connection, input: &TreeInput) -> Result<Self> {
        let park = get_park(conn, input.park_id).map_err(as_reference)?;
        let species = get_species(conn, input.species_id).map_err(as_reference)?;
        let area = match (input.area_id, input.location()) {
            (Some(area_id), _) => {
                let area = get_area(conn, area_id).map_err(as_reference)?;
                if area.park_id != park.id {
                    return Err(ParksError::validation(format!(
                        "area {} belongs to park {}, not park {}",
                        area.id, area.park_id, park.id
                    )));
                }
                Some(area)
            }
            (None, Some(point)) => {
                let located = parks::locate_area(conn, park.id, point)?;
                if located.is_some() {
                    metrics::record_tree_area_link("polygon");
                }
                located
            }
            (None, None) => None,
        };
        Ok(Self {
            park,
            species,
            area,
        })
    }

    fn area_id(&self) -> Option<i64> {
        self.area.as_ref().map(|a| a.id)
    }

    fn next_code(&self, conn: &Connection, settings: CodeSettings) -> Result<String> {
        let prefix = tree_code_prefix(
            self.area.as_ref().map(|a| a.code.as_str()),
            &self.park.code_prefix,
            &self.species.code,
        );
        CodeGenerator::new(conn, settings).tree_code(&prefix)
    }
}

pub fn insert_tree(
    conn: &mut Connection,
    input: &TreeInput,
    settings: CodeSettings,
) -> Result<Tree> {
    input.validate()?;
    let tx = conn.transaction()?;
    let placement = Placement::resolve(&tx, input)?;
    let code = placement.next_code(&tx, settings)?;

    let now = now_sql();
    tx.execute(
        "INSERT INTO trees (code, species_id, park_id, area_id, latitude, longitude,
                            planting_date, height_m, trunk_diameter_cm, health_status, notes,
                            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        params![
            code,
            input.species_id,
            input.park_id,
            placement.area_id(),
            input.latitude,
            input.longitude,
            date_to_sql(input.planting_date),
            input.height_m,
            input.trunk_diameter_cm,
            input.health_status,
            input.notes,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    info!(tree_id = id, code = %code, "Created tree");
    get_tree(conn, id)
}

/// Full update. The code is regenerated only when species, park or area change.
pub fn update_tree(
    conn: &mut Connection,
    id: i64,
    input: &TreeInput,
    settings: CodeSettings,
) -> Result<Tree> {
    input.validate()?;
    let tx = conn.transaction()?;
    let current = get_tree(&tx, id)?;
    let placement = Placement::resolve(&tx, input)?;

    let moved = current.species_id != placement.species.id
        || current.park_id != placement.park.id
        || current.area_id != placement.area_id();
    let code = if moved {
        let code = placement.next_code(&tx, settings)?;
        debug!(tree_id = id, old = %current.code, new = %code, "Recoding moved tree");
        code
    } else {
        current.code
    };

    tx.execute(
        "UPDATE trees SET code = ?1, species_id = ?2, park_id = ?3, area_id = ?4,
                latitude = ?5, longitude = ?6, planting_date = ?7, height_m = ?8,
                trunk_diameter_cm = ?9, health_status = ?10, notes = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            code,
            input.species_id,
            input.park_id,
            placement.area_id(),
            input.latitude,
            input.longitude,
            date_to_sql(input.planting_date),
            input.height_m,
            input.trunk_diameter_cm,
            input.health_status,
            input.notes,
            now_sql(),
            id,
        ],
    )?;
    tx.commit()?;
    get_tree(conn, id)
}

pub fn delete_tree(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM trees WHERE id = ?1", params![id])?;
    expect_changed(changed, "tree", id)
}

/// Assign every area-less tree of a park to an area, by outline first and
/// by code prefix second. Tree codes are left as they are.
pub fn link_areas(conn: &mut Connection, park_id: i64) -> Result<LinkSummary> {
    let tx = conn.transaction()?;
    let areas = parks::list_areas(&tx, park_id)?;
    let outlined = parks::area_polygons(&tx, park_id)?;
    let orphans = list_trees(
        &tx,
        &TreeFilter {
            park_id: Some(park_id),
            ..TreeFilter::default()
        },
    )?
    .into_iter()
    .filter(|tree| tree.area_id.is_none())
    .collect::<Vec<_>>();

    let mut summary = LinkSummary::default();
    let now = now_sql();
    for tree in &orphans {
        summary.examined += 1;
        let by_polygon = tree.location().and_then(|point| {
            geo::locate_area(outlined.iter().map(|(a, poly)| (a.id, poly)), point)
        });
        let (area_id, method) = match by_polygon {
            Some(area_id) => (Some(area_id), "polygon"),
            None => (
                geo::area_by_code_prefix(
                    areas.iter().map(|a| (a.id, a.code.as_str())),
                    &tree.code,
                ),
                "prefix",
            ),
        };
        let Some(area_id) = area_id else {
            summary.unmatched += 1;
            continue;
        };

        tx.execute(
            "UPDATE trees SET area_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![area_id, now, tree.id],
        )?;
        metrics::record_tree_area_link(method);
        if method == "polygon" {
            summary.linked_by_polygon += 1;
        } else {
            summary.linked_by_prefix += 1;
        }
    }
    tx.commit()?;

    info!(
        park_id,
        examined = summary.examined,
        linked_by_polygon = summary.linked_by_polygon,
        linked_by_prefix = summary.linked_by_prefix,
        unmatched = summary.unmatched,
        "Linked trees to areas"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::storage::parks::tests::{area_input, park_input};
    use crate::storage::parks::{insert_area, insert_park};
    use serde_json::json;

    fn species_input(common: &str, scientific: &str) -> SpeciesInput {
        SpeciesInput {
            common_name: common.to_string(),
            scientific_name: Some(scientific.to_string()),
            family: None,
            origin: None,
        }
    }

    fn tree_input(species_id: i64, park_id: i64, at: Option<(f64, f64)>) -> TreeInput {
        TreeInput {
            species_id,
            park_id,
            area_id: None,
            latitude: at.map(|(lat, _)| lat),
            longitude: at.map(|(_, lng)| lng),
            planting_date: None,
            height_m: Some(4.5),
            trunk_diameter_cm: None,
            health_status: None,
            notes: None,
        }
    }

    struct Fixture {
        conn: Connection,
        park_id: i64,
        north_id: i64,
        species_id: i64,
    }

    fn fixture() -> Fixture {
        let conn = test_connection();
        let settings = CodeSettings::default();
        let park = insert_park(&conn, &park_input("Bosque Urbano"), settings).unwrap();
        let north = insert_area(
            &conn,
            park.id,
            &area_input(
                "Zona Norte",
                Some(json!([[5.0, 0.0], [5.0, 10.0], [10.0, 10.0], [10.0, 0.0]])),
            ),
            settings,
        )
        .unwrap();
        let species =
            insert_species(&conn, &species_input("Jacaranda", "Jacaranda mimosifolia"), settings)
                .unwrap();
        Fixture {
            conn,
            park_id: park.id,
            north_id: north.id,
            species_id: species.id,
        }
    }

    #[test]
    fn trees_are_located_and_numbered() {
        let Fixture {
            mut conn,
            park_id,
            north_id,
            species_id,
        } = fixture();
        let settings = CodeSettings::default();

        let inside =
            insert_tree(&mut conn, &tree_input(species_id, park_id, Some((7.0, 2.0))), settings)
                .unwrap();
        assert_eq!(inside.area_id, Some(north_id));
        assert_eq!(inside.code, "BOU-NO-JAM-001");

        let second =
            insert_tree(&mut conn, &tree_input(species_id, park_id, Some((8.0, 9.0))), settings)
                .unwrap();
        assert_eq!(second.code, "BOU-NO-JAM-002");

        let outside =
            insert_tree(&mut conn, &tree_input(species_id, park_id, Some((1.0, 1.0))), settings)
                .unwrap();
        assert_eq!(outside.area_id, None);
        assert_eq!(outside.code, "BOU-XX-JAM-001");
    }

    #[test]
    fn area_must_belong_to_the_tree_park() {
        let Fixture {
            mut conn,
            north_id,
            species_id,
            ..
        } = fixture();
        let settings = CodeSettings::default();
        let other = insert_park(&conn, &park_input("Los Colomos"), settings).unwrap();

        let mut input = tree_input(species_id, other.id, None);
        input.area_id = Some(north_id);
        let err = insert_tree(&mut conn, &input, settings).unwrap_err();
        assert!(matches!(err, ParksError::Validation(_)));

        let missing_species = tree_input(999, other.id, None);
        let err = insert_tree(&mut conn, &missing_species, settings).unwrap_err();
        assert_eq!(err.to_string(), "species 999 does not exist");
    }

    #[test]
    fn moving_a_tree_regenerates_its_code() {
        let Fixture {
            mut conn,
            park_id,
            north_id,
            species_id,
        } = fixture();
        let settings = CodeSettings::default();
        let tree =
            insert_tree(&mut conn, &tree_input(species_id, park_id, None), settings).unwrap();
        assert_eq!(tree.code, "BOU-XX-JAM-001");

        // same placement, only measurements change
        let mut input = tree_input(species_id, park_id, None);
        input.height_m = Some(6.0);
        let same = update_tree(&mut conn, tree.id, &input, settings).unwrap();
        assert_eq!(same.code, "BOU-XX-JAM-001");
        assert_eq!(same.height_m, Some(6.0));

        input.area_id = Some(north_id);
        let moved = update_tree(&mut conn, tree.id, &input, settings).unwrap();
        assert_eq!(moved.code, "BOU-NO-JAM-001");
        assert_eq!(moved.area_id, Some(north_id));
    }

    #[test]
    fn link_areas_uses_polygons_then_prefixes() {
        let Fixture {
            mut conn,
            park_id,
            north_id,
            species_id,
        } = fixture();
        let settings = CodeSettings::default();
        let now = now_sql();

        // Imported rows: one with coordinates, one carrying an area code, one neither.
        conn.execute(
            "INSERT INTO trees (code, species_id, park_id, latitude, longitude, created_at, updated_at)
             VALUES ('BOU-XX-JAM-010', ?1, ?2, 6.0, 6.0, ?3, ?3),
                    ('BOU-NO-JAM-020', ?1, ?2, NULL, NULL, ?3, ?3),
                    ('BOU-XX-JAM-030', ?1, ?2, NULL, NULL, ?3, ?3)",
            params![species_id, park_id, now],
        )
        .unwrap();
        let assigned =
            insert_tree(&mut conn, &tree_input(species_id, park_id, Some((7.0, 7.0))), settings)
                .unwrap();

        let summary = link_areas(&mut conn, park_id).unwrap();
        assert_eq!(
            summary,
            LinkSummary {
                examined: 3,
                linked_by_polygon: 1,
                linked_by_prefix: 1,
                unmatched: 1,
            }
        );

        let in_north = list_trees(
            &conn,
            &TreeFilter {
                area_id: Some(north_id),
                ..TreeFilter::default()
            },
        )
        .unwrap();
        let codes: Vec<_> = in_north.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["BOU-NO-JAM-020", assigned.code.as_str(), "BOU-XX-JAM-010"]);

        assert!(matches!(
            link_areas(&mut conn, 404),
            Err(ParksError::NotFound { .. })
        ));
    }

    #[test]
    fn unassigned_trees_never_match_an_area_by_prefix() {
        let Fixture {
            mut conn,
            park_id,
            species_id,
            ..
        } = fixture();
        let settings = CodeSettings::default();
        let xochitl = insert_area(
            &conn,
            park_id,
            &area_input("Xochitl Xalapa", None),
            settings,
        )
        .unwrap();
        assert_eq!(xochitl.code, "BOU-XO");

        let stray =
            insert_tree(&mut conn, &tree_input(species_id, park_id, None), settings).unwrap();
        assert_eq!(stray.code, "BOU-XX-JAM-001");

        let summary = link_areas(&mut conn, park_id).unwrap();
        assert_eq!(summary.examined, 1);
        assert_eq!(summary.linked_by_prefix, 0);
        assert_eq!(summary.unmatched, 1);
        assert_eq!(get_tree(&conn, stray.id).unwrap().area_id, None);
    }

    #[test]
    fn exhausted_sequence_is_an_error_not_a_panic() {
        let Fixture {
            mut conn,
            park_id,
            species_id,
            ..
        } = fixture();
        let settings = CodeSettings::default();
        conn.execute(
            "INSERT INTO trees (code, species_id, park_id, created_at, updated_at)
             VALUES ('BOU-XX-JAM-18446744073709551615', ?1, ?2, ?3, ?3)",
            params![species_id, park_id, now_sql()],
        )
        .unwrap();

        let err = insert_tree(&mut conn, &tree_input(species_id, park_id, None), settings)
            .unwrap_err();
        assert!(matches!(err, ParksError::CodeExhausted { kind: "tree", .. }));

        // Trees inside an area use their own sequence.
        let inside =
            insert_tree(&mut conn, &tree_input(species_id, park_id, Some((7.0, 2.0))), settings)
                .unwrap();
        assert_eq!(inside.code, "BOU-NO-JAM-001");
    }

    #[test]
    fn species_in_use_cannot_be_deleted() {
        let Fixture {
            mut conn,
            park_id,
            species_id,
            ..
        } = fixture();
        insert_tree(
            &mut conn,
            &tree_input(species_id, park_id, None),
            CodeSettings::default(),
        )
        .unwrap();
        let err = delete_species(&conn, species_id).unwrap_err();
        assert!(matches!(err, ParksError::Conflict(_)));
    }
}
