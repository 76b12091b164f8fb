mod api;
mod dto;
mod state;

use crate::state::AppState;
use axum::routing::{get, post};
use depot::store::Store;
use std::sync::Arc;
use tracing::info;

const PORT: u32 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let args: Vec<_> = std::env::args().collect();
    let db_path = args.get(1).map(String::as_str).unwrap_or("depot.db");

    info!(db_path, "opening store");
    let store = match Store::open(db_path).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("failed to open store: {err}");
            std::process::exit(1);
        }
    };
    let state = Arc::new(AppState::new(store));

    let app = axum::Router::new()
        .route("/feeds", post(api::upload).get(api::feeds))
        .route("/stops/near", get(api::near))
        .route("/departures", get(api::departures))
        .route("/shapes", get(api::shapes))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", PORT))
        .await
        .unwrap();
    info!("Listening to port {PORT}");
    axum::serve(listener, app).await.unwrap();
}
