use super::{created, Created};
use crate::domain::{
    require_coordinates, AreaInput, Municipality, MunicipalityInput, Park, ParkArea, ParkFilter,
    ParkInput,
};
use crate::error::Result;
use crate::geo::Point;
use crate::server::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::storage::parks;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

pub async fn list_municipalities(State(state): State<AppState>) -> Result<Json<Vec<Municipality>>> {
    let rows = state
        .db
        .call(|conn| parks::list_municipalities(conn))
        .await?;
    Ok(Json(rows))
}

pub async fn create_municipality(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MunicipalityInput>,
) -> Result<Created<Municipality>> {
    let municipality = state
        .db
        .call(move |conn| parks::insert_municipality(conn, &input))
        .await?;
    Ok(created(municipality))
}

pub async fn list_parks(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ParkFilter>,
) -> Result<Json<Vec<Park>>> {
    let rows = state
        .db
        .call(move |conn| parks::list_parks(conn, &filter))
        .await?;
    Ok(Json(rows))
}

pub async fn get_park(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Park>> {
    Ok(Json(state.db.call(move |conn| parks::get_park(conn, id)).await?))
}

pub async fn create_park(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ParkInput>,
) -> Result<Created<Park>> {
    let settings = state.codes;
    let park = state
        .db
        .call(move |conn| parks::insert_park(conn, &input, settings))
        .await?;
    Ok(created(park))
}

pub async fn update_park(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ParkInput>,
) -> Result<Json<Park>> {
    let park = state
        .db
        .call(move |conn| parks::update_park(conn, id, &input))
        .await?;
    Ok(Json(park))
}

pub async fn delete_park(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| parks::delete_park(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_areas(
    State(state): State<AppState>,
    ApiPath(park_id): ApiPath<i64>,
) -> Result<Json<Vec<ParkArea>>> {
    let rows = state
        .db
        .call(move |conn| parks::list_areas(conn, park_id))
        .await?;
    Ok(Json(rows))
}

pub async fn create_area(
    State(state): State<AppState>,
    ApiPath(park_id): ApiPath<i64>,
    ApiJson(input): ApiJson<AreaInput>,
) -> Result<Created<ParkArea>> {
    let settings = state.codes;
    let area = state
        .db
        .call(move |conn| parks::insert_area(conn, park_id, &input, settings))
        .await?;
    Ok(created(area))
}

pub async fn get_area(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ParkArea>> {
    Ok(Json(state.db.call(move |conn| parks::get_area(conn, id)).await?))
}

pub async fn update_area(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<AreaInput>,
) -> Result<Json<ParkArea>> {
    let area = state
        .db
        .call(move |conn| parks::update_area(conn, id, &input))
        .await?;
    Ok(Json(area))
}

pub async fn delete_area(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| parks::delete_area(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct LocateQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct LocateResult {
    pub park_id: i64,
    pub point: Point,
    /// `null` when no outline contains the point.
    pub area: Option<ParkArea>,
}

pub async fn locate_area(
    State(state): State<AppState>,
    ApiPath(park_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<LocateQuery>,
) -> Result<Json<LocateResult>> {
    let point = Point {
        lat: query.lat,
        lng: query.lng,
    };
    require_coordinates(Some(point.lat), Some(point.lng))?;
    let area = state
        .db
        .call(move |conn| parks::locate_area(conn, park_id, point))
        .await?;
    Ok(Json(LocateResult {
        park_id,
        point,
        area,
    }))
}
