//! Client for the DLR NEDM2020 electron-density model.
//!
//! NEDM2020 is not served by the grid database; it is computed on demand by
//! a DLR web service that returns a GeoJSON feature collection of samples
//! along the receiver-satellite ray.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use ionwf_common::{
    plasma_frequency_mhz, VerticalProfile, MAX_PROFILE_HEIGHT_KM, NEDM_MIN_HEIGHT_KM,
};

use crate::error::UpstreamError;

/// Satellite altitude used for the model ray (km).
pub const SATELLITE_ALT_KM: f64 = 20_000.0;

#[derive(Debug, Serialize)]
struct NedmRequest {
    f10p7_sfu: f64,
    receiver: NedmPoint,
    satellite: NedmPoint,
    time: String,
}

#[derive(Debug, Serialize)]
struct NedmPoint {
    alt_km: f64,
    lat_deg: f64,
    lon_deg: f64,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    /// `[lon, lat, alt_km]`.
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Properties {
    #[serde(rename = "electron_density_10^12/m^3")]
    pub electron_density: f64,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// Fetch the NEDM2020 vertical profile for one timestamp and location.
///
/// # Errors
///
/// Returns [`UpstreamError::Transport`] on HTTP failures and
/// [`UpstreamError::Shape`] when the response carries no features.
pub async fn fetch_nedm_profile(
    http: &reqwest::Client,
    url: &str,
    f10p7_sfu: f64,
    lat: f64,
    lon: f64,
    time: NaiveDateTime,
) -> Result<VerticalProfile, UpstreamError> {
    let request = NedmRequest {
        f10p7_sfu,
        receiver: NedmPoint {
            alt_km: 0.0,
            lat_deg: lat,
            lon_deg: lon,
        },
        satellite: NedmPoint {
            alt_km: SATELLITE_ALT_KM,
            lat_deg: lat,
            lon_deg: lon,
        },
        time: time.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
    };

    tracing::debug!(%url, f10p7_sfu, lat, lon, "querying NEDM model");

    let value: serde_json::Value = http
        .post(url)
        .header("accept", "application/json")
        .json(&request)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if value.get("features").is_none() {
        return Err(UpstreamError::Shape(
            "no features in NEDM response".to_string(),
        ));
    }
    let collection: FeatureCollection =
        serde_json::from_value(value).map_err(|e| UpstreamError::Shape(e.to_string()))?;
    if collection.features.is_empty() {
        return Err(UpstreamError::Shape(
            "no features in NEDM response".to_string(),
        ));
    }

    Ok(profile_from_features(&collection.features))
}

/// Convert model features into a vertical profile.
///
/// Heights are rounded to whole km and clamped to the
/// [`NEDM_MIN_HEIGHT_KM`], [`MAX_PROFILE_HEIGHT_KM`] window; density is
/// converted from 10^12 el/m^3 to el/cm^3 and the plasma frequency derived
/// from it.
#[must_use]
pub fn profile_from_features(features: &[Feature]) -> VerticalProfile {
    let mut theight = Vec::new();
    let mut frequency = Vec::new();
    let mut edensity = Vec::new();

    for feature in features {
        let Some(&alt_km) = feature.geometry.coordinates.get(2) else {
            continue;
        };
        #[allow(clippy::cast_possible_truncation)]
        let height = alt_km.round() as i64;
        if (NEDM_MIN_HEIGHT_KM..=MAX_PROFILE_HEIGHT_KM).contains(&height) {
            let density = feature.properties.electron_density;
            theight.push(height);
            edensity.push(density * 1e6);
            frequency.push(plasma_frequency_mhz(density));
        }
    }

    VerticalProfile {
        theight,
        frequency: Some(frequency),
        edensity: Some(edensity),
    }
}
