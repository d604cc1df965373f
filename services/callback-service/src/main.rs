mod app;
mod error;
mod handlers;
mod models;
mod recognizer;
mod state;

use std::sync::Arc;

use streamhook_common::{bind_listener, env_or, init_tracing, shutdown_signal, StopSignal};

use crate::recognizer::{Recognizer, RecognizerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() {
    let _guards = init_tracing("callback-service");

    let port = env_or("PORT", 8085u16);
    let config = RecognizerConfig::from_env();
    tracing::info!(
        port,
        recognizer_bin = config.bin.as_deref().unwrap_or(""),
        recognizer_dir = config.dir.as_deref().unwrap_or(""),
        "callback service starting"
    );

    let stop = StopSignal::new();
    let recognizer = Recognizer::start(&config, stop.clone()).expect("start recognizer");

    let state = AppState {
        notifier: Arc::new(recognizer),
    };

    let app = app::build_router(state);
    let listener = bind_listener(port).await;

    // Serve until a shutdown signal arrives or the recognizer goes away.
    let shutdown = async move {
        tokio::select! {
            _ = shutdown_signal() => stop.stop(),
            _ = stop.wait() => {}
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("serve");
}
