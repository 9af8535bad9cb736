mod devices;
pub mod error;
mod payments;
mod plans;
mod sessions;
mod subscriptions;
mod users;
mod validation;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/", post(users::create_user))
        .route("/", get(users::list_users))
        .route("/login", post(users::login))
        .route("/me", get(users::me))
        .route("/:user_id", get(users::get_user))
        .route("/:user_id", put(users::update_user))
        .route("/:user_id", delete(users::delete_user));

    let plan_routes = Router::new()
        .route("/", post(plans::create_plan))
        .route("/:plan_id", get(plans::get_plan));

    let subscription_routes = Router::new()
        .route("/", post(subscriptions::create_subscription))
        .route("/:subscription_id", get(subscriptions::get_subscription));

    let device_routes = Router::new()
        .route("/", post(devices::create_device))
        .route("/:device_id", get(devices::get_device))
        .route("/user/:user_id", get(devices::list_for_user));

    let payment_routes = Router::new()
        .route("/", post(payments::create_payment))
        .route("/:payment_id", get(payments::get_payment));

    let session_routes = Router::new()
        .route("/login", post(sessions::login))
        .route("/me/:token", get(sessions::get_session))
        .route("/logout/:token", delete(sessions::logout))
        .route("/user/:user_id", get(sessions::list_for_user));

    Router::new()
        .route("/health", get(health_check))
        .nest("/users", user_routes)
        .nest("/plans", plan_routes)
        .nest("/subscriptions", subscription_routes)
        .nest("/devices", device_routes)
        .nest("/payments", payment_routes)
        .nest("/sessions", session_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
