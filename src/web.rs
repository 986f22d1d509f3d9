use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::history::HistoryStore;
use crate::service::WeatherAggregationService;

/// REST API under `/api`, static files for everything else
pub fn app(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(state))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run(
    config: &AppConfig,
    service: WeatherAggregationService,
    history: Arc<HistoryStore>,
) -> anyhow::Result<()> {
    let app = app(AppState { service, history }, &config.server.static_dir);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", config.server.port);

    axum::serve(listener, app)
        .await
        .context("Web server terminated unexpectedly")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastAggregator;
    use crate::models::{LocationRecord, WeatherSample};
    use crate::provider::{GeocodingProvider, WeatherProvider};
    use crate::{Result, WeatherError};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Unreachable;

    #[async_trait]
    impl GeocodingProvider for Unreachable {
        async fn search(&self, text: &str) -> Result<Vec<LocationRecord>> {
            Err(WeatherError::not_found(text))
        }

        async fn reverse(&self, _latitude: f64, _longitude: f64) -> Result<Vec<LocationRecord>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl WeatherProvider for Unreachable {
        async fn current_weather(&self, _latitude: f64, _longitude: f64) -> Result<WeatherSample> {
            Err(WeatherError::transport("offline"))
        }

        async fn forecast(&self, _latitude: f64, _longitude: f64) -> Result<Vec<WeatherSample>> {
            Err(WeatherError::transport("offline"))
        }
    }

    fn test_app(static_dir: &TempDir, data_dir: &TempDir) -> Router {
        let history = Arc::new(HistoryStore::open(data_dir.path(), 10).unwrap());
        let service = WeatherAggregationService::new(
            Arc::new(Unreachable),
            Arc::new(Unreachable),
            history.clone(),
            ForecastAggregator::default(),
            Duration::from_secs(1),
        );
        app(
            AppState { service, history },
            static_dir.path().to_str().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_static_fallback_and_api_nesting() {
        let static_dir = TempDir::new().unwrap();
        let data_dir = TempDir::new().unwrap();
        std::fs::write(static_dir.path().join("index.html"), "<h1>WeatherDeck</h1>").unwrap();
        let app = test_app(&static_dir, &data_dir);

        let response = app
            .clone()
            .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>WeatherDeck</h1>");

        let response = app
            .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let static_dir = TempDir::new().unwrap();
        let data_dir = TempDir::new().unwrap();
        let app = test_app(&static_dir, &data_dir);

        let response = app
            .oneshot(
                Request::get("/api/favorites")
                    .header("Origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}
