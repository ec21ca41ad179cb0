use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use parks_backoffice::config::CodeSettings;
use parks_backoffice::db::DatabaseManager;
use parks_backoffice::server::{create_server, AppState};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

async fn test_app() -> Result<Router> {
    let db = DatabaseManager::open_in_memory()?;
    db.run_migrations().await?;
    Ok(create_server(AppState::new(db, CodeSettings::default()), None))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    user: Option<&str>,
) -> Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn get(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    send(app, Method::GET, uri, None, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    send(app, Method::POST, uri, Some(body), None).await
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = test_app().await?;
    let (status, body) = get(&app, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn test_tree_inventory_codes_and_areas() -> Result<()> {
    let app = test_app().await?;

    let (status, park) = post(
        &app,
        "/api/parks",
        json!({"name": "Parque Bosque Urbano", "park_type": "urban"}),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(park["code_prefix"], "BOU");
    let park_id = park["id"].as_i64().unwrap();

    let (status, area) = post(
        &app,
        &format!("/api/parks/{park_id}/areas"),
        json!({
            "name": "Zona Norte",
            "polygon": [[20.70, -103.40], [20.70, -103.38], [20.72, -103.38], [20.72, -103.40]]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(area["code"], "BOU-NO");
    let area_id = area["id"].as_i64().unwrap();

    let (status, species) = post(
        &app,
        "/api/species",
        json!({"common_name": "Jacaranda", "scientific_name": "Jacaranda mimosifolia"}),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(species["code"], "JAM");
    let species_id = species["id"].as_i64().unwrap();

    let (status, tree) = post(
        &app,
        "/api/trees",
        json!({
            "species_id": species_id,
            "park_id": park_id,
            "latitude": 20.71,
            "longitude": -103.39,
            "planting_date": "2019-07-14"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tree["code"], "BOU-NO-JAM-001");
    assert_eq!(tree["area_id"].as_i64(), Some(area_id));

    let (status, stray) = post(
        &app,
        "/api/trees",
        json!({"species_id": species_id, "park_id": park_id}),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(stray["code"], "BOU-XX-JAM-001");

    let (status, located) = get(
        &app,
        &format!("/api/parks/{park_id}/areas/locate?lat=20.715&lng=-103.385"),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(located["area"]["id"].as_i64(), Some(area_id));

    let (_, nowhere) = get(
        &app,
        &format!("/api/parks/{park_id}/areas/locate?lat=20.0&lng=-103.0"),
    )
    .await?;
    assert!(nowhere["area"].is_null());

    let (status, summary) = post(
        &app,
        &format!("/api/parks/{park_id}/trees/link-areas"),
        json!({}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["examined"], 1);
    assert_eq!(summary["unmatched"], 1);

    let (_, in_area) = get(&app, &format!("/api/trees?area_id={area_id}")).await?;
    assert_eq!(in_area.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_moving_a_tree_regenerates_its_code() -> Result<()> {
    let app = test_app().await?;
    let (_, park) = post(&app, "/api/parks", json!({"name": "Bosque Urbano", "park_type": "urban"})).await?;
    let park_id = park["id"].as_i64().unwrap();
    let (_, area) = post(
        &app,
        &format!("/api/parks/{park_id}/areas"),
        json!({"name": "Zona Norte"}),
    )
    .await?;
    let area_id = area["id"].as_i64().unwrap();
    let (_, species) = post(
        &app,
        "/api/species",
        json!({"common_name": "Jacaranda", "scientific_name": "Jacaranda mimosifolia"}),
    )
    .await?;
    let species_id = species["id"].as_i64().unwrap();

    let (_, tree) = post(
        &app,
        "/api/trees",
        json!({"species_id": species_id, "park_id": park_id}),
    )
    .await?;
    assert_eq!(tree["code"], "BOU-XX-JAM-001");
    let tree_id = tree["id"].as_i64().unwrap();

    let (status, measured) = send(
        &app,
        Method::PUT,
        &format!("/api/trees/{tree_id}"),
        Some(json!({"species_id": species_id, "park_id": park_id, "height_m": 3.2})),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(measured["code"], "BOU-XX-JAM-001");

    let (status, moved) = send(
        &app,
        Method::PUT,
        &format!("/api/trees/{tree_id}"),
        Some(json!({"species_id": species_id, "park_id": park_id, "area_id": area_id})),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["code"], "BOU-NO-JAM-001");
    assert_eq!(moved["area_id"].as_i64(), Some(area_id));

    let (_, fetched) = get(&app, &format!("/api/trees/{tree_id}")).await?;
    assert_eq!(fetched["code"], "BOU-NO-JAM-001");
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_uses_bounded_route_labels() -> Result<()> {
    parks_backoffice::metrics::init().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let app = test_app().await?;

    get(&app, "/health").await?;
    let (status, _) = get(&app, "/api/no-such-thing-7f3a9c").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let text = String::from_utf8(bytes.to_vec())?;
    assert!(text.contains("parks_http_requests_total"));
    assert!(text.contains(r#"route="/health""#));
    assert!(!text.contains("no-such-thing-7f3a9c"));
    Ok(())
}

#[tokio::test]
async fn test_asset_history_is_audited() -> Result<()> {
    let app = test_app().await?;
    let (_, park) = post(&app, "/api/parks", json!({"name": "Agua Azul", "park_type": "urban"})).await?;
    let park_id = park["id"].as_i64().unwrap();

    let (status, asset) = send(
        &app,
        Method::POST,
        "/api/assets",
        Some(json!({"name": "Fountain", "category": "water", "park_id": park_id})),
        Some("auth0|ana"),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let asset_id = asset["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/assets/{asset_id}"),
        Some(json!({
            "name": "Fountain",
            "category": "water",
            "park_id": park_id,
            "status": "maintenance"
        })),
        Some("auth0|luis"),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "maintenance");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/assets/{asset_id}"),
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, history) = get(&app, &format!("/api/assets/{asset_id}/history")).await?;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().cloned().unwrap_or_default();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["change_type"], "deleted");
    assert_eq!(history[1]["changed_by"], "auth0|luis");
    assert_eq!(
        history[1]["changes"]["status"],
        json!({"from": "active", "to": "maintenance"})
    );
    assert_eq!(history[2]["changed_by"], "auth0|ana");
    Ok(())
}

#[tokio::test]
async fn test_error_envelope() -> Result<()> {
    let app = test_app().await?;

    let (status, body) = get(&app, "/api/parks/999").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "park 999 not found");

    let (status, body) = get(&app, "/api/parks/abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = post(&app, "/api/parks", json!({"name": "No type"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = post(
        &app,
        "/api/parks",
        json!({"name": "Colomos", "park_type": "urban", "latitude": 120.0, "longitude": 0.0}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/municipalities", json!({"name": "Zapopan"})).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = post(&app, "/api/municipalities", json!({"name": "Zapopan"})).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = get(&app, "/api/does-not-exist").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_events_and_sponsorships() -> Result<()> {
    let app = test_app().await?;
    let (_, park) = post(&app, "/api/parks", json!({"name": "Los Colomos", "park_type": "forest"})).await?;
    let park_id = park["id"].as_i64().unwrap();

    let (status, event) = post(
        &app,
        "/api/events",
        json!({
            "title": "Noche de cine",
            "event_type": "culture",
            "start_date": "2024-08-02",
            "start_time": "20:00:00",
            "park_ids": [park_id]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["id"].as_i64().unwrap();

    let (_, instructor) = post(
        &app,
        "/api/instructors",
        json!({"full_name": "Marta Gil", "email": "marta@example.com"}),
    )
    .await?;
    let instructor_id = instructor["id"].as_i64().unwrap();
    let (status, assigned) = post(
        &app,
        &format!("/api/events/{event_id}/instructors"),
        json!({"instructor_id": instructor_id}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["instructor_ids"], json!([instructor_id]));

    let (_, in_park) = get(&app, &format!("/api/events?park_id={park_id}")).await?;
    assert_eq!(in_park.as_array().map(Vec::len), Some(1));

    let (_, sponsor) = post(&app, "/api/sponsors", json!({"name": "Tequilera Azul"})).await?;
    let (_, package) = post(
        &app,
        "/api/sponsorship-packages",
        json!({"name": "Plata", "tier": "silver", "price": 40000.0, "duration_months": 6}),
    )
    .await?;
    let (status, contract) = post(
        &app,
        "/api/sponsorship-contracts",
        json!({
            "sponsor_id": sponsor["id"],
            "package_id": package["id"],
            "start_date": "2024-08-01",
            "end_date": "2025-01-31",
            "amount": 40000.0
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let contract_id = contract["id"].as_i64().unwrap();

    let (status, linked) = post(
        &app,
        &format!("/api/sponsorship-contracts/{contract_id}/events"),
        json!({"event_id": event_id}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(linked["event_ids"], json!([event_id]));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/sponsorship-contracts/{contract_id}/events/{event_id}"),
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_permissions() -> Result<()> {
    let app = test_app().await?;
    let (_, viewer) = post(
        &app,
        "/api/roles",
        json!({"name": "viewer", "permissions": {"parks": {"view": true}}}),
    )
    .await?;
    let (_, events_admin) = post(
        &app,
        "/api/roles",
        json!({"name": "events-admin", "permissions": {"events": {"*": true}}}),
    )
    .await?;

    for role in [&viewer, &events_admin] {
        let (status, _) = post(
            &app,
            "/api/users/auth0%7C7/roles",
            json!({"role_id": role["id"]}),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, merged) = get(&app, "/api/users/auth0%7C7/permissions").await?;
    assert_eq!(
        merged,
        json!({"parks": {"view": true}, "events": {"*": true}})
    );

    let (_, check) = get(
        &app,
        "/api/users/auth0%7C7/permissions/check?path=events.instructors.assign",
    )
    .await?;
    assert_eq!(check, json!({"path": "events.instructors.assign", "granted": true}));

    let (_, check) = get(&app, "/api/users/auth0%7C7/permissions/check?path=parks.edit").await?;
    assert_eq!(check["granted"], false);

    let (_, check) = get(&app, "/api/users/auth0%7C7/permissions/check?path=events").await?;
    assert_eq!(check["granted"], true);

    let (status, _) = post(
        &app,
        "/api/roles",
        json!({"name": "broken", "permissions": ["parks"]}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_static_dashboard_fallback() -> Result<()> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("index.html"), "<h1>dashboard</h1>")?;

    let db = DatabaseManager::open_in_memory()?;
    db.run_migrations().await?;
    let app = create_server(
        AppState::new(db, CodeSettings::default()),
        Some(dir.path()),
    );

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"<h1>dashboard</h1>");
    Ok(())
}
