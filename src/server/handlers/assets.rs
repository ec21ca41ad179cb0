use super::{created, Created};
use crate::domain::{Amenity, AmenityInput, Asset, AssetFilter, AssetHistoryEntry, AssetInput};
use crate::error::Result;
use crate::server::{ApiJson, ApiPath, ApiQuery, AppState, ChangedBy};
use crate::storage::assets;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn list_amenities(State(state): State<AppState>) -> Result<Json<Vec<Amenity>>> {
    Ok(Json(state.db.call(|conn| assets::list_amenities(conn)).await?))
}

pub async fn create_amenity(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AmenityInput>,
) -> Result<Created<Amenity>> {
    let amenity = state
        .db
        .call(move |conn| assets::insert_amenity(conn, &input))
        .await?;
    Ok(created(amenity))
}

pub async fn list_assets(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AssetFilter>,
) -> Result<Json<Vec<Asset>>> {
    let rows = state
        .db
        .call(move |conn| assets::list_assets(conn, &filter))
        .await?;
    Ok(Json(rows))
}

pub async fn get_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Asset>> {
    Ok(Json(state.db.call(move |conn| assets::get_asset(conn, id)).await?))
}

pub async fn create_asset(
    State(state): State<AppState>,
    ChangedBy(user): ChangedBy,
    ApiJson(input): ApiJson<AssetInput>,
) -> Result<Created<Asset>> {
    let asset = state
        .db
        .call(move |conn| assets::insert_asset(conn, &input, user.as_deref()))
        .await?;
    Ok(created(asset))
}

pub async fn update_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ChangedBy(user): ChangedBy,
    ApiJson(input): ApiJson<AssetInput>,
) -> Result<Json<Asset>> {
    let asset = state
        .db
        .call(move |conn| assets::update_asset(conn, id, &input, user.as_deref()))
        .await?;
    Ok(Json(asset))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ChangedBy(user): ChangedBy,
) -> Result<StatusCode> {
    state
        .db
        .call(move |conn| assets::delete_asset(conn, id, user.as_deref()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn asset_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<AssetHistoryEntry>>> {
    let entries = state
        .db
        .call(move |conn| assets::asset_history(conn, id))
        .await?;
    Ok(Json(entries))
}
