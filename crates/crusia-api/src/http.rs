use axum::middleware;
use axum::{routing::get, routing::post, Router};

use crate::auth;
use crate::handlers::{crossdomain, get_save, login, register, set_save, version};
use crate::state::AppState;
use crate::telemetry::correlation_layer;

pub fn router(state: AppState) -> Router {
    let save = save_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::http_layer,
    ));

    Router::new()
        .route("/version", get(version))
        .route("/crossdomain.xml", get(crossdomain))
        .route("/login", post(login))
        .route("/register", post(register))
        .merge(save)
        .layer(middleware::from_fn(correlation_layer))
        .with_state(state)
}

fn save_routes() -> Router<AppState> {
    Router::new()
        .route("/save/get", post(get_save))
        .route("/save/set", post(set_save))
}
