use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::{events, inventory, locations, reports, system};
use crate::AppState;

fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::list_inventory).post(inventory::create_inventory))
        .route("/stats/summary", get(inventory::inventory_stats))
        .route(
            "/:id",
            get(inventory::get_inventory)
                .put(inventory::update_inventory)
                .delete(inventory::delete_inventory),
        )
}

fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(locations::list_locations).post(locations::create_location))
        .route("/stats/summary", get(locations::location_stats))
        .route(
            "/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/:id/items", post(events::assign_item))
        .route("/:id/items/:item_id", put(events::update_item_condition))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(reports::inventory_report))
        .route("/inventory/export/pdf", get(reports::export_inventory_pdf))
        .route("/inventory/export/excel", get(reports::export_inventory_excel))
        .route("/events", get(reports::event_report))
        .route("/events/export/pdf", get(reports::export_events_pdf))
        .route("/events/export/excel", get(reports::export_events_excel))
}

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .nest("/inventory", inventory_routes())
        .nest("/locations", location_routes())
        .nest("/kegiatan", event_routes())
        .nest("/reports", report_routes())
        .route("/backup", post(system::backup))
        .route("/restore", post(system::restore));

    let router = Router::new()
        .route("/health", get(system::health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(state);

    apply_security_headers(router)
}
