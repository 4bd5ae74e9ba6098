use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, auth, clients, records, summary, users};

/// All API routes. `/user` (POST) and `/login` are public; everything else
/// requires a `Bearer` token, enforced by the `Principal` extractor.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/user",
            post(auth::register)
                .get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/user/newPassword", put(users::new_password))
        .route("/login", post(auth::login))
        .route(
            "/client",
            post(clients::register_client).get(clients::list_clients),
        )
        .route(
            "/client/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route(
            "/record",
            post(records::register_record).get(records::list_records),
        )
        .route(
            "/record/{id}",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/home", get(summary::home))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
