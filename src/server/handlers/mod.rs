mod assets;
mod events;
mod parks;
mod roles;
mod sponsorships;
mod trees;

use super::AppState;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

type Created<T> = (StatusCode, Json<T>);

fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        // Parks, areas, species, trees
        .route(
            "/municipalities",
            get(parks::list_municipalities).post(parks::create_municipality),
        )
        .route("/parks", get(parks::list_parks).post(parks::create_park))
        .route(
            "/parks/:id",
            get(parks::get_park)
                .put(parks::update_park)
                .delete(parks::delete_park),
        )
        .route(
            "/parks/:id/areas",
            get(parks::list_areas).post(parks::create_area),
        )
        .route("/parks/:id/areas/locate", get(parks::locate_area))
        .route("/parks/:id/trees/link-areas", post(trees::link_areas))
        .route(
            "/areas/:id",
            get(parks::get_area)
                .put(parks::update_area)
                .delete(parks::delete_area),
        )
        .route("/species", get(trees::list_species).post(trees::create_species))
        .route(
            "/species/:id",
            get(trees::get_species)
                .put(trees::update_species)
                .delete(trees::delete_species),
        )
        .route("/trees", get(trees::list_trees).post(trees::create_tree))
        .route(
            "/trees/:id",
            get(trees::get_tree)
                .put(trees::update_tree)
                .delete(trees::delete_tree),
        )
        // Assets
        .route(
            "/amenities",
            get(assets::list_amenities).post(assets::create_amenity),
        )
        .route("/assets", get(assets::list_assets).post(assets::create_asset))
        .route(
            "/assets/:id",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/assets/:id/history", get(assets::asset_history))
        // Events and instructors
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/instructors",
            post(events::assign_instructor),
        )
        .route(
            "/events/:id/instructors/:instructor_id",
            delete(events::unassign_instructor),
        )
        .route(
            "/instructors",
            get(events::list_instructors).post(events::create_instructor),
        )
        .route(
            "/instructors/:id",
            get(events::get_instructor)
                .put(events::update_instructor)
                .delete(events::delete_instructor),
        )
        // Sponsorships
        .route(
            "/sponsors",
            get(sponsorships::list_sponsors).post(sponsorships::create_sponsor),
        )
        .route(
            "/sponsors/:id",
            get(sponsorships::get_sponsor)
                .put(sponsorships::update_sponsor)
                .delete(sponsorships::delete_sponsor),
        )
        .route(
            "/sponsorship-packages",
            get(sponsorships::list_packages).post(sponsorships::create_package),
        )
        .route(
            "/sponsorship-packages/:id",
            get(sponsorships::get_package).delete(sponsorships::delete_package),
        )
        .route(
            "/sponsorship-contracts",
            get(sponsorships::list_contracts).post(sponsorships::create_contract),
        )
        .route(
            "/sponsorship-contracts/:id",
            get(sponsorships::get_contract)
                .put(sponsorships::update_contract)
                .delete(sponsorships::delete_contract),
        )
        .route(
            "/sponsorship-contracts/:id/assets",
            post(sponsorships::link_asset),
        )
        .route(
            "/sponsorship-contracts/:id/assets/:asset_id",
            delete(sponsorships::unlink_asset),
        )
        .route(
            "/sponsorship-contracts/:id/events",
            post(sponsorships::link_event),
        )
        .route(
            "/sponsorship-contracts/:id/events/:event_id",
            delete(sponsorships::unlink_event),
        )
        // Roles and permissions
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/:id",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route(
            "/users/:user_id/roles",
            get(roles::list_user_roles).post(roles::assign_role),
        )
        .route(
            "/users/:user_id/roles/:role_id",
            delete(roles::revoke_role),
        )
        .route("/users/:user_id/permissions", get(roles::user_permissions))
        .route(
            "/users/:user_id/permissions/check",
            get(roles::check_permission),
        )
}
