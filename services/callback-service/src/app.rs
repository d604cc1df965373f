use axum::{routing::any, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{hello, streams};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // The streams hook inspects the method itself; every other path
    // answers with the greeting, whatever the method.
    Router::new()
        .route("/api/v1/streams", any(streams))
        .fallback(hello)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
