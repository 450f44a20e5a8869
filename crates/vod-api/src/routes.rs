//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::health;
use crate::handlers::videos::{
    archive_video, get_video, list_videos, rename_video, upload_video,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/video", get(list_videos).post(upload_video))
        .route(
            "/video/:id",
            get(get_video).patch(rename_video).delete(archive_video),
        );

    // Converted artifacts, served directly off disk. Playlists of in-progress
    // conversions change under the client, so nothing here may be cached.
    let media_prefix = media_route_prefix(&state.config.public_media_url);
    let media_routes = Router::new()
        .nest_service(&media_prefix, ServeDir::new(&state.config.pipeline.converted_dir))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ));

    Router::new()
        .nest("/api", api_routes)
        .merge(media_routes)
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Local path under which media is mounted. `PUBLIC_MEDIA_URL` may be a full
/// URL when a CDN fronts the service; only its path matters here.
fn media_route_prefix(public_media_url: &str) -> String {
    let path = match public_media_url.split_once("://") {
        Some((_, rest)) => match rest.split_once('/') {
            Some((_, path)) => format!("/{path}"),
            None => "/".to_string(),
        },
        None => public_media_url.to_string(),
    };

    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_prefix_strips_scheme_and_host() {
        assert_eq!(media_route_prefix("/media"), "/media");
        assert_eq!(media_route_prefix("media"), "/media");
        assert_eq!(
            media_route_prefix("https://cdn.example.com/media"),
            "/media"
        );
    }
}
