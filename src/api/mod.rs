use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::Deserialize;
use serde_json::json;

use crate::history::{HistoryStore, into_weather_error};
use crate::models::{Favorite, LocationRecord, NewFavorite, SearchHistoryEntry, WeatherResult};
use crate::service::WeatherAggregationService;
use crate::{Result, WeatherError};

/// Number of searches returned by `/api/history`
const HISTORY_PAGE: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub service: WeatherAggregationService,
    pub history: Arc<HistoryStore>,
}

#[derive(Deserialize)]
struct CoordinatesQuery {
    lat: Option<String>,
    lon: Option<String>,
}

impl CoordinatesQuery {
    fn parse(&self) -> Result<(f64, f64)> {
        let (Some(lat), Some(lon)) = (self.lat.as_deref(), self.lon.as_deref()) else {
            return Err(WeatherError::validation(
                "Both \"lat\" and \"lon\" query parameters are required",
            ));
        };
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| WeatherError::validation(format!("Invalid latitude: {lat}")))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|_| WeatherError::validation(format!("Invalid longitude: {lon}")))?;
        Ok((lat, lon))
    }
}

#[derive(Deserialize)]
struct GeocodeQuery {
    q: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather_by_coordinates))
        .route("/weather/{city}", get(get_weather_by_city))
        .route("/geocode", get(geocode))
        .route("/reverse-geocode", get(reverse_geocode))
        .route("/history", get(get_history))
        .route("/favorites", get(get_favorites).post(add_favorite))
        .route("/favorites/{id}", delete(remove_favorite))
        .with_state(state)
}

impl WeatherError {
    fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::Validation { .. } => StatusCode::BAD_REQUEST,
            WeatherError::NotFound { .. } => StatusCode::NOT_FOUND,
            WeatherError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            WeatherError::Config { .. } | WeatherError::Storage { .. } | WeatherError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for WeatherError {
    fn from(rejection: JsonRejection) -> Self {
        WeatherError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for WeatherError {
    fn from(rejection: PathRejection) -> Self {
        WeatherError::validation(rejection.body_text())
    }
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "request failed");
        } else {
            tracing::info!(error = %self, status = %status, "request rejected");
        }
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

async fn get_weather_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<WeatherResult>> {
    Ok(Json(state.service.get_weather_by_name(&city).await?))
}

async fn get_weather_by_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<WeatherResult>> {
    let (lat, lon) = query.parse()?;
    Ok(Json(state.service.get_weather_by_coordinates(lat, lon).await?))
}

async fn geocode(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Vec<LocationRecord>>> {
    let q = query.q.unwrap_or_default();
    Ok(Json(state.service.resolver().candidates(&q).await?))
}

async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<CoordinatesQuery>,
) -> Result<Json<Vec<LocationRecord>>> {
    let (lat, lon) = query.parse()?;
    Ok(Json(state.service.resolver().reverse_candidates(lat, lon).await?))
}

async fn get_history(State(state): State<AppState>) -> Result<Json<Vec<SearchHistoryEntry>>> {
    let entries = state
        .history
        .recent_searches(HISTORY_PAGE)
        .await
        .map_err(into_weather_error)?;
    Ok(Json(entries))
}

async fn get_favorites(State(state): State<AppState>) -> Result<Json<Vec<Favorite>>> {
    let favorites = state.history.favorites().await.map_err(into_weather_error)?;
    Ok(Json(favorites))
}

async fn add_favorite(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewFavorite>, JsonRejection>,
) -> Result<(StatusCode, Json<Favorite>)> {
    let Json(payload) = payload?;
    let favorite = state
        .history
        .add_favorite(&payload.city, payload.country_code.as_deref().unwrap_or_default())
        .await
        .map_err(into_weather_error)?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

async fn remove_favorite(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Json<serde_json::Value>> {
    let Path(id) = id?;
    let removed = state
        .history
        .remove_favorite(id)
        .await
        .map_err(into_weather_error)?;
    if !removed {
        tracing::debug!("Favorite {} was already absent", id);
    }
    Ok(Json(json!({ "message": "Removed from favorites" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastAggregator;
    use crate::models::WeatherSample;
    use crate::provider::{GeocodingProvider, WeatherProvider};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, header};
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct FakeGeocoder;

    #[async_trait]
    impl GeocodingProvider for FakeGeocoder {
        async fn search(&self, text: &str) -> Result<Vec<LocationRecord>> {
            if text == "London" {
                Ok(vec![
                    LocationRecord::new("London", "GB", 51.5, -0.12),
                    LocationRecord::new("London", "CA", 42.98, -81.23),
                ])
            } else {
                Ok(Vec::new())
            }
        }

        async fn reverse(&self, _latitude: f64, _longitude: f64) -> Result<Vec<LocationRecord>> {
            Ok(vec![LocationRecord::new("Paris", "FR", 48.85, 2.35)])
        }
    }

    struct FakeWeather {
        fail: bool,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn current_weather(&self, _latitude: f64, _longitude: f64) -> Result<WeatherSample> {
            if self.fail {
                return Err(WeatherError::upstream(500, "provider exploded"));
            }
            Ok(WeatherSample {
                timestamp_utc: 1_704_067_200,
                temperature_c: 21.6,
                condition_code: "01d".into(),
                description: "clear sky".into(),
                humidity_pct: 40,
                wind_speed_ms: 2.0,
                pressure_hpa: 1020,
            })
        }

        async fn forecast(&self, _latitude: f64, _longitude: f64) -> Result<Vec<WeatherSample>> {
            let current = self.current_weather(0.0, 0.0).await?;
            Ok(vec![current])
        }
    }

    fn app(dir: &TempDir, fail: bool) -> (Router, Arc<HistoryStore>) {
        let history = Arc::new(HistoryStore::open(dir.path(), 100).unwrap());
        let service = WeatherAggregationService::new(
            Arc::new(FakeGeocoder),
            Arc::new(FakeWeather { fail }),
            history.clone(),
            ForecastAggregator::default(),
            Duration::from_secs(5),
        );
        let state = AppState {
            service,
            history: history.clone(),
        };
        (router(state), history)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_weather_by_city() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, body) = send(app, Method::GET, "/weather/London", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"]["name"], "London");
        assert_eq!(body["location"]["countryCode"], "GB");
        assert_eq!(body["temperature"]["celsius"], 22.0);
        assert_eq!(body["temperature"]["fahrenheit"], 72.0);
        assert_eq!(body["icon"], "sun");
        assert_eq!(body["dailyForecasts"][0]["dayLabel"], "Mon");
    }

    #[tokio::test]
    async fn test_unknown_city_is_404() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, body) = send(app, Method::GET, "/weather/Atlantis", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Location not found");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_502() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, true);

        let (status, body) = send(app, Method::GET, "/weather/London", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("provider exploded"));
    }

    #[tokio::test]
    async fn test_weather_by_coordinates() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, body) =
            send(app.clone(), Method::GET, "/weather?lat=48.85&lon=2.35", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"]["name"], "Paris");

        let (status, body) = send(app.clone(), Method::GET, "/weather?lat=48.85", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("lat"));

        let (status, _) = send(app, Method::GET, "/weather?lat=north&lon=2", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_geocode_returns_all_candidates() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, body) = send(app.clone(), Method::GET, "/geocode?q=London", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["countryCode"], "CA");

        let (status, _) = send(app.clone(), Method::GET, "/geocode", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(app, Method::GET, "/reverse-geocode?lat=48.85&lon=2.35", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Paris");
    }

    #[tokio::test]
    async fn test_history_lists_recorded_searches() {
        let dir = TempDir::new().unwrap();
        let (app, history) = app(&dir, false);

        history.record_search("London", "GB").await.unwrap();
        history.record_search("Paris", "FR").await.unwrap();

        let (status, body) = send(app, Method::GET, "/history", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["city"], "Paris");
        assert_eq!(body[1]["countryCode"], "GB");
    }

    #[tokio::test]
    async fn test_favorites_round_trip() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/favorites",
            Some(json!({"city": "London", "countryCode": "GB"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_u64().unwrap();

        let (_, list) = send(app.clone(), Method::GET, "/favorites", None).await;
        assert_eq!(list[0]["city"], "London");

        let (status, body) =
            send(app.clone(), Method::DELETE, &format!("/favorites/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Removed from favorites");

        let (_, list) = send(app.clone(), Method::GET, "/favorites", None).await;
        assert!(list.as_array().unwrap().is_empty());

        let (status, _) = send(
            app,
            Method::POST,
            "/favorites",
            Some(json!({"city": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    async fn send_raw(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_favorite_body_is_json_error() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, body) = send_raw(
            app.clone(),
            Request::post("/favorites")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input: "));

        let (status, body) = send_raw(
            app,
            Request::post("/favorites")
                .body(Body::from(r#"{"city": "London"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Content-Type"));
    }

    #[tokio::test]
    async fn test_non_numeric_favorite_id_is_json_error() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, false);

        let (status, body) = send_raw(
            app,
            Request::delete("/favorites/abc").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("abc"));
    }
}
