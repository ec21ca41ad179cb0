use super::{created, Created};
use crate::domain::{Event, EventFilter, EventInput, Instructor, InstructorAssignment, InstructorInput};
use crate::error::Result;
use crate::server::{ApiJson, ApiPath, ApiQuery, AppState};
use crate::storage::{events, instructors};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<EventFilter>,
) -> Result<Json<Vec<Event>>> {
    let rows = state
        .db
        .call(move |conn| events::list_events(conn, &filter))
        .await?;
    Ok(Json(rows))
}

pub async fn get_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Event>> {
    Ok(Json(state.db.call(move |conn| events::get_event(conn, id)).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Created<Event>> {
    let event = state
        .db
        .call(move |conn| events::insert_event(conn, &input))
        .await?;
    Ok(created(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Json<Event>> {
    let event = state
        .db
        .call(move |conn| events::update_event(conn, id, &input))
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state.db.call(move |conn| events::delete_event(conn, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_instructor(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<i64>,
    ApiJson(assignment): ApiJson<InstructorAssignment>,
) -> Result<Json<Event>> {
    let event = state
        .db
        .call(move |conn| events::assign_instructor(conn, event_id, assignment.instructor_id))
        .await?;
    Ok(Json(event))
}

pub async fn unassign_instructor(
    State(state): State<AppState>,
    ApiPath((event_id, instructor_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    state
        .db
        .call(move |conn| events::unassign_instructor(conn, event_id, instructor_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_instructors(State(state): State<AppState>) -> Result<Json<Vec<Instructor>>> {
    Ok(Json(
        state
            .db
            .call(|conn| instructors::list_instructors(conn))
            .await?,
    ))
}

pub async fn get_instructor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Instructor>> {
    let instructor = state
        .db
        .call(move |conn| instructors::get_instructor(conn, id))
        .await?;
    Ok(Json(instructor))
}

pub async fn create_instructor(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<InstructorInput>,
) -> Result<Created<Instructor>> {
    let instructor = state
        .db
        .call(move |conn| instructors::insert_instructor(conn, &input))
        .await?;
    Ok(created(instructor))
}

pub async fn update_instructor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<InstructorInput>,
) -> Result<Json<Instructor>> {
    let instructor = state
        .db
        .call(move |conn| instructors::update_instructor(conn, id, &input))
        .await?;
    Ok(Json(instructor))
}

pub async fn delete_instructor(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    state
        .db
        .call(move |conn| instructors::delete_instructor(conn, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
