//! Workflow orchestration: fetch, filter and assemble the profile set.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use ionwf_common::{
    Measurement, Product, VerticalProfile, WorkflowOutput, LAT_MAX, LAT_MIN, LON_MAX, LON_MIN,
    MAX_PROFILE_HEIGHT_KM,
};

use crate::dias::{self, RawProfile};
use crate::dlr;
use crate::error::{ApiError, UpstreamError};
use crate::state::AppState;

/// Validated workflow request parameters.
#[derive(Debug, Clone)]
pub struct WorkflowQuery {
    pub date: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    pub products: Vec<Product>,
    pub measurements: Vec<Measurement>,
}

impl WorkflowQuery {
    /// Check coordinate bounds and parameter presence.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(LAT_MIN..=LAT_MAX).contains(&self.lat) {
            return Err(ApiError::Validation(format!(
                "lat must be between {LAT_MIN} and {LAT_MAX}, got {}",
                self.lat
            )));
        }
        if !(LON_MIN..=LON_MAX).contains(&self.lon) {
            return Err(ApiError::Validation(format!(
                "lon must be between {LON_MIN} and {LON_MAX}, got {}",
                self.lon
            )));
        }
        if self.products.is_empty() {
            return Err(ApiError::Validation(
                "at least one product must be selected".to_string(),
            ));
        }
        if self.measurements.is_empty() {
            return Err(ApiError::Validation(
                "at least one measurement must be selected".to_string(),
            ));
        }
        Ok(())
    }
}

/// Run the full workflow for a validated query.
///
/// # Errors
///
/// Propagates upstream transport and shape errors from either provider.
pub async fn run(state: &AppState, query: &WorkflowQuery) -> Result<WorkflowOutput, UpstreamError> {
    let grid =
        dias::fetch_grid_profiles(state, query.date, query.lat, query.lon, &query.measurements)
            .await?;

    let mut plot_data: BTreeMap<Product, VerticalProfile> = BTreeMap::new();

    for product in Product::GRID {
        if !query.products.contains(&product) {
            continue;
        }
        if let Some(raw) = grid.profiles.get(product.as_str()) {
            let mut profile = profile_from_raw(raw);
            if product == Product::Tadm {
                truncate_above(&mut profile, MAX_PROFILE_HEIGHT_KM);
            }
            plot_data.insert(product, profile);
        }
    }

    if query.products.contains(&Product::Nedm2020) {
        let profile = dlr::fetch_nedm_profile(
            &state.http,
            &state.nedm_url,
            grid.conditions.f10_7,
            query.lat,
            query.lon,
            query.date,
        )
        .await?;
        plot_data.insert(Product::Nedm2020, profile);
    }

    for profile in plot_data.values_mut() {
        strip_measurements(profile, &query.measurements);
    }

    Ok(WorkflowOutput {
        timestamp: query.date,
        location: [query.lat, query.lon],
        ssn: grid.conditions.ssn,
        f10_7: grid.conditions.f10_7,
        kp: grid.conditions.kp,
        products: query.products.clone(),
        measurements: query.measurements.clone(),
        plot_data,
    })
}

/// Lift a raw grid profile into the output shape. Empty measurement arrays
/// mean the measurement was never requested upstream.
#[must_use]
pub fn profile_from_raw(raw: &RawProfile) -> VerticalProfile {
    VerticalProfile {
        theight: raw.theight.clone(),
        frequency: (!raw.frequency.is_empty()).then(|| raw.frequency.clone()),
        edensity: (!raw.edensity.is_empty()).then(|| raw.edensity.clone()),
    }
}

/// Drop height samples above `max_height_km` and truncate the measurement
/// arrays to the surviving sample count.
pub fn truncate_above(profile: &mut VerticalProfile, max_height_km: i64) {
    profile.theight.retain(|&h| h <= max_height_km);
    let len = profile.theight.len();
    if let Some(frequency) = profile.frequency.as_mut() {
        frequency.truncate(len);
    }
    if let Some(edensity) = profile.edensity.as_mut() {
        edensity.truncate(len);
    }
}

/// Remove measurement arrays the caller did not ask for.
pub fn strip_measurements(profile: &mut VerticalProfile, requested: &[Measurement]) {
    if !requested.contains(&Measurement::Frequency) {
        profile.frequency = None;
    }
    if !requested.contains(&Measurement::Edensity) {
        profile.edensity = None;
    }
}
