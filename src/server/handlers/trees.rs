use super::{created, Created};
use crate::domain::{LinkSummary, Species, SpeciesInput, Tree, TreeFilter, TreeInput};
use crate::error::Result;
use crate::server::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::storage::trees;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn list_species(State(state): State<AppState>) -> Result<Json<Vec<Species>>> {
    Ok(Json(state.db.call(|conn| trees::list_species(conn)).await?))
}

pub async fn get_species(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Species>> {
    Ok(Json(state.db.call(move |conn| trees::get_species(conn, id)).await?))
}

pub async fn create_species(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SpeciesInput>,
) -> Result<Created<Species>> {
    let settings = state.codes;
    let species = state
        .db
        .call(move |conn| trees::insert_species(conn, &input, settings))
        .await?;
    Ok(created(species))
}

pub async fn update_species(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<SpeciesInput>,
) -> Result<Json<Species>> {
    let species = state
        .db
        .call(move |conn| trees::update_species(conn, id, &input))
        .await?;
    Ok(Json(species))
}

pub async fn delete_species(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| trees::delete_species(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_trees(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TreeFilter>,
) -> Result<Json<Vec<Tree>>> {
    let rows = state
        .db
        .call(move |conn| trees::list_trees(conn, &filter))
        .await?;
    Ok(Json(rows))
}

pub async fn get_tree(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Tree>> {
    Ok(Json(state.db.call(move |conn| trees::get_tree(conn, id)).await?))
}

pub async fn create_tree(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TreeInput>,
) -> Result<Created<Tree>> {
    let settings = state.codes;
    let tree = state
        .db
        .call(move |conn| trees::insert_tree(conn, &input, settings))
        .await?;
    Ok(created(tree))
}

pub async fn update_tree(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TreeInput>,
) -> Result<Json<Tree>> {
    let settings = state.codes;
    let tree = state
        .db
        .call(move |conn| trees::update_tree(conn, id, &input, settings))
        .await?;
    Ok(Json(tree))
}

pub async fn delete_tree(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| trees::delete_tree(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn link_areas(
    State(state): State<AppState>,
    ApiPath(park_id): ApiPath<i64>,
) -> Result<Json<LinkSummary>> {
    let summary = state
        .db
        .call(move |conn| trees::link_areas(conn, park_id))
        .await?;
    Ok(Json(summary))
}
