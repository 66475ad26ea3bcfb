//! Client for the DIAS `odc_edensity` grid database.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Deserialize;

use ionwf_common::{GridConditions, Measurement, Product};

use crate::error::UpstreamError;
use crate::state::AppState;

/// Raw per-product profile exactly as the grid database returns it.
///
/// Arrays the caller did not request are simply absent upstream, so every
/// field defaults to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub theight: Vec<i64>,
    #[serde(default)]
    pub frequency: Vec<f64>,
    #[serde(default)]
    pub edensity: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct DiasResponse {
    grid_params: GridParams,
    model_data: ModelData,
}

#[derive(Debug, Deserialize)]
struct GridParams {
    #[serde(rename = "SolCycle")]
    sol_cycle: SolCycle,
    #[serde(rename = "Kp")]
    kp: KpIndex,
}

#[derive(Debug, Deserialize)]
struct SolCycle {
    ssn: f64,
    f10_7: f64,
}

#[derive(Debug, Deserialize)]
struct KpIndex {
    kp: f64,
}

#[derive(Debug, Deserialize)]
struct ModelData {
    vprofile: BTreeMap<String, RawProfile>,
}

/// Grid conditions plus the vertical profiles keyed by product wire name.
#[derive(Debug)]
pub struct GridProfiles {
    pub conditions: GridConditions,
    pub profiles: BTreeMap<String, RawProfile>,
}

/// Fetch the electron-density grid data for one timestamp and location.
///
/// The upstream request always names the two grid products; which of them
/// the caller actually asked for is filtered locally by the workflow.
///
/// # Errors
///
/// Returns [`UpstreamError::Transport`] on HTTP failures and
/// [`UpstreamError::Shape`] when the payload lacks `grid_params` or
/// `model_data` (the grid database reports its own errors that way).
pub async fn fetch_grid_profiles(
    state: &AppState,
    date: NaiveDateTime,
    lat: f64,
    lon: f64,
    measurements: &[Measurement],
) -> Result<GridProfiles, UpstreamError> {
    let url = format!("{}/dias_db/odc_edensity", state.dias_base_url);

    let mut query: Vec<(&str, String)> = vec![
        ("date", date.format("%Y-%m-%dT%H:%M:%S").to_string()),
        ("lat", lat.to_string()),
        ("lon", lon.to_string()),
    ];
    for product in Product::GRID {
        query.push(("products", product.as_str().to_string()));
    }
    for measurement in measurements {
        query.push(("measurements", measurement.as_str().to_string()));
    }

    tracing::debug!(%url, %date, lat, lon, "querying grid database");

    let value: serde_json::Value = state
        .http
        .get(&url)
        .query(&query)
        .header("accept", "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    parse_grid_response(value)
}

/// Validate and deserialize the grid-database payload.
fn parse_grid_response(value: serde_json::Value) -> Result<GridProfiles, UpstreamError> {
    if value.get("grid_params").is_none() || value.get("model_data").is_none() {
        return Err(UpstreamError::Shape(format!(
            "grid database returned {value}"
        )));
    }

    let response: DiasResponse =
        serde_json::from_value(value).map_err(|e| UpstreamError::Shape(e.to_string()))?;

    Ok(GridProfiles {
        conditions: GridConditions {
            ssn: response.grid_params.sol_cycle.ssn,
            f10_7: response.grid_params.sol_cycle.f10_7,
            kp: response.grid_params.kp.kp,
        },
        profiles: response.model_data.vprofile,
    })
}
