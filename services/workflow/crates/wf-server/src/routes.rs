//! HTTP routes and request handlers.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::Query;
use chrono::NaiveDateTime;
use serde::Deserialize;

use ionwf_common::{Measurement, Product};

use crate::error::ApiError;
use crate::state::AppState;
use crate::workflow::{self, WorkflowQuery};
use crate::{dlr, plot};

/// F10.7 flux used by the standalone model endpoint, which runs without a
/// grid lookup to supply the real value.
const DLR_DEFAULT_F10P7_SFU: f64 = 100.0;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/run_workflow", get(run_workflow))
        .route("/plot_data", post(plot_data))
        .route("/dlr_data", get(dlr_data))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct WorkflowParams {
    date: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    measurements: Vec<Measurement>,
}

impl WorkflowParams {
    fn into_query(self) -> Result<WorkflowQuery, ApiError> {
        let query = WorkflowQuery {
            date: parse_timestamp(&self.date)?,
            lat: self.lat,
            lon: self.lon,
            products: self.products,
            measurements: self.measurements,
        };
        query.validate()?;
        Ok(query)
    }
}

#[derive(Debug, Deserialize)]
pub struct PointParams {
    date: String,
    lat: f64,
    lon: f64,
}

/// Parse an ISO timestamp, with or without fractional seconds.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| {
            ApiError::Validation(format!(
                "date must be an ISO timestamp like 2025-02-01T10:45:00, got {raw:?}"
            ))
        })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn run_workflow(
    State(state): State<AppState>,
    Query(params): Query<WorkflowParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query()?;
    let output = workflow::run(&state, &query).await?;
    Ok(Json(output))
}

async fn plot_data(
    State(state): State<AppState>,
    Query(params): Query<WorkflowParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query()?;
    let output = workflow::run(&state, &query).await?;
    let png = plot::render_png(&output)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        png,
    ))
}

async fn dlr_data(
    State(state): State<AppState>,
    Query(params): Query<PointParams>,
) -> Result<impl IntoResponse, ApiError> {
    let date = parse_timestamp(&params.date)?;
    if !(ionwf_common::LAT_MIN..=ionwf_common::LAT_MAX).contains(&params.lat) {
        return Err(ApiError::Validation(format!(
            "lat must be between {} and {}, got {}",
            ionwf_common::LAT_MIN,
            ionwf_common::LAT_MAX,
            params.lat
        )));
    }
    if !(ionwf_common::LON_MIN..=ionwf_common::LON_MAX).contains(&params.lon) {
        return Err(ApiError::Validation(format!(
            "lon must be between {} and {}, got {}",
            ionwf_common::LON_MIN,
            ionwf_common::LON_MAX,
            params.lon
        )));
    }

    let profile = dlr::fetch_nedm_profile(
        &state.http,
        &state.nedm_url,
        DLR_DEFAULT_F10P7_SFU,
        params.lat,
        params.lon,
        date,
    )
    .await?;

    let mut body = std::collections::BTreeMap::new();
    body.insert(Product::Nedm2020, profile);
    Ok(Json(body))
}
