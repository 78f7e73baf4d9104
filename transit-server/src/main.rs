use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_server::planner::PlannerConfig;
use transit_server::store::load_gtfs_dir;
use transit_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load the schedule before serving anything; a server without data is
    // useless, so fail fast.
    let gtfs_dir = std::env::var("GTFS_DIR").unwrap_or_else(|_| "gtfs".to_string());
    let store = load_gtfs_dir(&gtfs_dir).expect("failed to load GTFS feed");
    info!(
        stops = store.stop_count(),
        routes = store.route_count(),
        trips = store.trip_count(),
        "schedule loaded from {gtfs_dir}"
    );

    let state = AppState::new(store, PlannerConfig::default());
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("transit journey planner listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
