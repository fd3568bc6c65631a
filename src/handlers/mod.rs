mod urls;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

pub use urls::*;

use crate::models::AppState;

/// `/shorten/list` is a static route and wins over `/shorten/:code`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/shorten", post(create_url_handler))
        .route("/shorten/", post(create_url_handler))
        .route("/shorten/list", get(list_urls_handler))
        .route(
            "/shorten/:code",
            get(get_url_handler)
                .put(update_url_handler)
                .delete(delete_url_handler),
        )
        .route("/shorten/:code/stats", get(url_stats_handler))
        .fallback(fallback_handler)
        .with_state(state)
}
