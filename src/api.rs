//! HTTP API exposing the lookup coordinator and pollen estimator

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LookupError, PollenMapError};
use crate::geocode::NominatimClient;
use crate::lookup::LookupService;
use crate::models::{Coordinate, LocationInfo, WeatherSnapshot};
use crate::pollen::{self, Recommendations, RiskTier};
use crate::weather::weather_code_to_description;

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub lookup: Arc<LookupService>,
    pub geocoder: Arc<NominatimClient>,
}

#[derive(Debug, Deserialize)]
pub struct ConditionsQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Everything the details panel needs for one point
#[derive(Debug, Serialize)]
pub struct ConditionsResponse {
    pub coordinate: Coordinate,
    pub place: String,
    pub location: LocationInfo,
    pub weather: WeatherSnapshot,
    pub condition: &'static str,
    pub pollen_index: f64,
    pub risk: RiskTier,
    pub recommendations: Recommendations,
}

/// User-facing error payload
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Handler error: either a bare status (outcomes with nothing to tell the
/// user, like a superseded lookup) or a status with a user-facing message
pub(crate) enum ApiError {
    Status(StatusCode),
    WithMessage(StatusCode, PollenMapError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Status(status) => status.into_response(),
            ApiError::WithMessage(status, err) => (
                status,
                Json(ErrorBody {
                    error: err.user_message(),
                }),
            )
                .into_response(),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/conditions", get(get_conditions))
        .route("/search", get(search_place))
        .with_state(state)
}

async fn get_conditions(
    State(state): State<ApiState>,
    Query(query): Query<ConditionsQuery>,
) -> Result<Json<ConditionsResponse>, ApiError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lon) {
        return Err(ApiError::WithMessage(
            StatusCode::BAD_REQUEST,
            PollenMapError::validation("coordinates out of range"),
        ));
    }

    let coordinate = Coordinate::new(query.lat, query.lon);

    let result = match state.lookup.lookup(coordinate).await {
        Ok(result) => result,
        // A superseded lookup is a silent outcome, never an error message
        Err(LookupError::Superseded) => return Err(ApiError::Status(StatusCode::CONFLICT)),
        Err(err) => {
            warn!("Lookup failed for {}: {}", coordinate, err);
            return Err(ApiError::WithMessage(
                StatusCode::BAD_GATEWAY,
                PollenMapError::api(err.to_string()),
            ));
        }
    };

    let current = &result.weather.current;
    let pollen_index = pollen::estimate(
        current.temperature,
        current.relative_humidity,
        current.wind_speed,
    );

    Ok(Json(ConditionsResponse {
        coordinate: result.coordinate,
        place: result.location.display_name(),
        condition: weather_code_to_description(current.weather_code),
        pollen_index,
        risk: RiskTier::for_index(pollen_index),
        recommendations: Recommendations::for_conditions(pollen_index, current.uv_index),
        location: result.location,
        weather: result.weather,
    }))
}

async fn search_place(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Coordinate>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::WithMessage(
            StatusCode::BAD_REQUEST,
            PollenMapError::validation("search query cannot be empty"),
        ));
    }

    match state.geocoder.search(query.q.trim()).await {
        Ok(Some(coordinate)) => Ok(Json(coordinate)),
        // No match carries no message; wording is the frontend's concern
        Ok(None) => Err(ApiError::Status(StatusCode::NOT_FOUND)),
        Err(err) => {
            warn!("Place search failed for '{}': {}", query.q, err);
            Err(ApiError::WithMessage(
                StatusCode::BAD_GATEWAY,
                PollenMapError::api(err.to_string()),
            ))
        }
    }
}
