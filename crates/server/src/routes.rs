//! Route configuration.

use crate::cors::cors_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Unsupported methods on a known path answer like an unknown route.
    let api_routes = Router::new()
        .route(
            "/api/rating",
            get(handlers::get_rating)
                .post(handlers::set_rating)
                .fallback(handlers::not_found),
        )
        .route(
            "/api/stats",
            get(handlers::get_stats).fallback(handlers::not_found),
        )
        .route(
            "/api/health",
            get(handlers::health_check).fallback(handlers::not_found),
        );

    let mut router = Router::new().merge(api_routes);

    // When enabled, restrict /metrics to the scraper at the network level.
    if state.config.server.metrics_enabled {
        router = router.route(
            "/metrics",
            get(metrics_handler).fallback(handlers::not_found),
        );
    }

    // Order of execution: TraceLayer -> CORS -> Handler
    router
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
