use super::{expect_changed, require_reference, Filters};
use crate::db::{get_datetime, get_json, now_sql};
use crate::domain::{Role, RoleInput, UserRole};
use crate::error::{ParksError, Result};
use crate::permissions;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use tracing::info;

const ROLE_COLUMNS: &str = "SELECT id, name, description, permissions, created_at FROM roles";

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        permissions: get_json(row, 3)?,
        created_at: get_datetime(row, 4)?,
    })
}

pub fn list_roles(conn: &Connection) -> Result<Vec<Role>> {
    Filters::new().query(conn, ROLE_COLUMNS, " ORDER BY name", role_from_row)
}

pub fn get_role(conn: &Connection, id: i64) -> Result<Role> {
    conn.query_row(
        &format!("{ROLE_COLUMNS} WHERE id = ?1"),
        params![id],
        role_from_row,
    )
    .optional()?
    .ok_or_else(|| ParksError::not_found("role", id))
}

pub fn insert_role(conn: &Connection, input: &RoleInput) -> Result<Role> {
    input.validate()?;
    conn.execute(
        "INSERT INTO roles (name, description, permissions, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            input.name.trim(),
            input.description,
            serde_json::to_string(&input.permissions)?,
            now_sql()
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(role_id = id, name = %input.name.trim(), "Created role");
    get_role(conn, id)
}

pub fn update_role(conn: &Connection, id: i64, input: &RoleInput) -> Result<Role> {
    input.validate()?;
    let changed = conn.execute(
        "UPDATE roles SET name = ?1, description = ?2, permissions = ?3 WHERE id = ?4",
        params![
            input.name.trim(),
            input.description,
            serde_json::to_string(&input.permissions)?,
            id
        ],
    )?;
    expect_changed(changed, "role", id)?;
    get_role(conn, id)
}

pub fn delete_role(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM roles WHERE id = ?1", params![id])?;
    expect_changed(changed, "role", id)
}

pub fn user_roles(conn: &Connection, user_id: &str) -> Result<Vec<UserRole>> {
    let mut stmt = conn.prepare(
        "SELECT ur.user_id, ur.role_id, r.name, ur.assigned_at
         FROM user_roles ur JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ?1 ORDER BY r.name",
    )?;
    let roles = stmt
        .query_map(params![user_id], |row| {
            Ok(UserRole {
                user_id: row.get(0)?,
                role_id: row.get(1)?,
                role_name: row.get(2)?,
                assigned_at: get_datetime(row, 3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(roles)
}

/// Re-assigning a held role keeps the original assignment time.
pub fn assign_role(conn: &Connection, user_id: &str, role_id: i64) -> Result<Vec<UserRole>> {
    if user_id.trim().is_empty() {
        return Err(ParksError::validation("user id must not be empty"));
    }
    require_reference(conn, "roles", "role", role_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role_id, assigned_at) VALUES (?1, ?2, ?3)",
        params![user_id, role_id, now_sql()],
    )?;
    info!(user_id, role_id, "Assigned role");
    user_roles(conn, user_id)
}

pub fn revoke_role(conn: &Connection, user_id: &str, role_id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM user_roles WHERE user_id = ?1 AND role_id = ?2",
        params![user_id, role_id],
    )?;
    expect_changed(changed, "role assignment", role_id)
}

/// The merge of every role the user holds; `{}` for unknown users.
pub fn effective_permissions(conn: &Connection, user_id: &str) -> Result<Value> {
    let mut stmt = conn.prepare(
        "SELECT r.permissions FROM user_roles ur JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ?1 ORDER BY r.id",
    )?;
    let blobs = stmt
        .query_map(params![user_id], |row| get_json::<Value>(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(permissions::merge_all(&blobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use serde_json::json;

    fn role(name: &str, permissions: Value) -> RoleInput {
        RoleInput {
            name: name.to_string(),
            description: None,
            permissions,
        }
    }

    #[test]
    fn permissions_merge_across_roles() {
        let conn = test_connection();
        let viewer = insert_role(&conn, &role("viewer", json!({"parks": {"view": true}}))).unwrap();
        let arborist = insert_role(
            &conn,
            &role("arborist", json!({"parks": {"trees": true}, "assets": {"view": false}})),
        )
        .unwrap();

        assign_role(&conn, "auth0|42", viewer.id).unwrap();
        let held = assign_role(&conn, "auth0|42", arborist.id).unwrap();
        assert_eq!(held.len(), 2);

        let perms = effective_permissions(&conn, "auth0|42").unwrap();
        assert!(permissions::is_granted(&perms, "parks.view"));
        assert!(permissions::is_granted(&perms, "parks.trees.edit"));
        assert!(!permissions::is_granted(&perms, "assets.view"));
        assert_eq!(effective_permissions(&conn, "nobody").unwrap(), json!({}));

        revoke_role(&conn, "auth0|42", arborist.id).unwrap();
        let perms = effective_permissions(&conn, "auth0|42").unwrap();
        assert!(!permissions::is_granted(&perms, "parks.trees.edit"));
    }

    #[test]
    fn role_rules() {
        let conn = test_connection();
        let err = insert_role(&conn, &role("broken", json!(["parks"]))).unwrap_err();
        assert!(matches!(err, ParksError::Validation(_)));

        let admin = insert_role(&conn, &role("admin", json!({"*": true}))).unwrap();
        assert!(matches!(
            insert_role(&conn, &role("admin", json!({}))),
            Err(ParksError::Conflict(_))
        ));
        assert!(matches!(
            assign_role(&conn, "u1", 99),
            Err(ParksError::Validation(_))
        ));

        assign_role(&conn, "u1", admin.id).unwrap();
        delete_role(&conn, admin.id).unwrap();
        assert!(user_roles(&conn, "u1").unwrap().is_empty());
    }
}
