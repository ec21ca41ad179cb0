use super::{created, Created};
use crate::domain::{
    AssetLink, ContractFilter, ContractInput, EventLink, PackageInput, Sponsor, SponsorInput,
    SponsorshipContract, SponsorshipPackage,
};
use crate::error::Result;
use crate::server::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::storage::sponsorships as store;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn list_sponsors(State(state): State<AppState>) -> Result<Json<Vec<Sponsor>>> {
    Ok(Json(state.db.call(|conn| store::list_sponsors(conn)).await?))
}

pub async fn get_sponsor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Sponsor>> {
    Ok(Json(state.db.call(move |conn| store::get_sponsor(conn, id)).await?))
}

pub async fn create_sponsor(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SponsorInput>,
) -> Result<Created<Sponsor>> {
    let sponsor = state
        .db
        .call(move |conn| store::insert_sponsor(conn, &input))
        .await?;
    Ok(created(sponsor))
}

pub async fn update_sponsor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<SponsorInput>,
) -> Result<Json<Sponsor>> {
    let sponsor = state
        .db
        .call(move |conn| store::update_sponsor(conn, id, &input))
        .await?;
    Ok(Json(sponsor))
}

pub async fn delete_sponsor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| store::delete_sponsor(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_packages(State(state): State<AppState>) -> Result<Json<Vec<SponsorshipPackage>>> {
    Ok(Json(state.db.call(|conn| store::list_packages(conn)).await?))
}

pub async fn get_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SponsorshipPackage>> {
    Ok(Json(state.db.call(move |conn| store::get_package(conn, id)).await?))
}

pub async fn create_package(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PackageInput>,
) -> Result<Created<SponsorshipPackage>> {
    let package = state
        .db
        .call(move |conn| store::insert_package(conn, &input))
        .await?;
    Ok(created(package))
}

pub async fn delete_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| store::delete_package(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_contracts(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ContractFilter>,
) -> Result<Json<Vec<SponsorshipContract>>> {
    let rows = state
        .db
        .call(move |conn| store::list_contracts(conn, &filter))
        .await?;
    Ok(Json(rows))
}

pub async fn get_contract(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SponsorshipContract>> {
    Ok(Json(state.db.call(move |conn| store::get_contract(conn, id)).await?))
}

pub async fn create_contract(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ContractInput>,
) -> Result<Created<SponsorshipContract>> {
    let contract = state
        .db
        .call(move |conn| store::insert_contract(conn, &input))
        .await?;
    Ok(created(contract))
}

pub async fn update_contract(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ContractInput>,
) -> Result<Json<SponsorshipContract>> {
    let contract = state
        .db
        .call(move |conn| store::update_contract(conn, id, &input))
        .await?;
    Ok(Json(contract))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| store::delete_contract(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn link_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(link): ApiJson<AssetLink>,
) -> Result<Json<SponsorshipContract>> {
    let contract = state
        .db
        .call(move |conn| store::link_asset(conn, id, link.asset_id))
        .await?;
    Ok(Json(contract))
}

pub async fn unlink_asset(
    State(state): State<AppState>,
    ApiPath((id, asset_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    state
        .db
        .call(move |conn| store::unlink_asset(conn, id, asset_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn link_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(link): ApiJson<EventLink>,
) -> Result<Json<SponsorshipContract>> {
    let contract = state
        .db
        .call(move |conn| store::link_event(conn, id, link.event_id))
        .await?;
    Ok(Json(contract))
}

pub async fn unlink_event(
    State(state): State<AppState>,
    ApiPath((id, event_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    state
        .db
        .call(move |conn| store::unlink_event(conn, id, event_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
