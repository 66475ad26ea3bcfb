use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Latitude bounds of the European grid served by the workflow (degrees).
pub const LAT_MIN: f64 = 34.0;
pub const LAT_MAX: f64 = 60.0;

/// Longitude bounds of the European grid (degrees).
pub const LON_MIN: f64 = -5.0;
pub const LON_MAX: f64 = 40.0;

/// Profiles are cut off above this height (km).
pub const MAX_PROFILE_HEIGHT_KM: i64 = 1000;

/// NEDM2020 samples below this height are discarded (km).
pub const NEDM_MIN_HEIGHT_KM: i64 = 100;

/// Coefficient of the plasma-frequency formula, MHz per sqrt(10^12 el/m^3).
pub const PLASMA_FREQ_COEFF: f64 = 8.9803;

/// Plasma frequency in MHz for an electron density given in 10^12 el/m^3.
#[must_use]
pub fn plasma_frequency_mhz(density: f64) -> f64 {
    PLASMA_FREQ_COEFF * density.sqrt()
}

/// Ionospheric model product identifiers, using the upstream wire names.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Product {
    #[serde(rename = "NEQUICK.ALG")]
    Nequick,
    #[serde(rename = "TADM.ALG")]
    Tadm,
    #[serde(rename = "NEDM2020.ALG")]
    Nedm2020,
}

impl Product {
    /// All known products, in display order.
    pub const ALL: [Product; 3] = [Product::Nequick, Product::Tadm, Product::Nedm2020];

    /// The two products served directly by the DIAS grid database.
    pub const GRID: [Product; 2] = [Product::Nequick, Product::Tadm];

    /// Upstream wire name (also the JSON map key).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Product::Nequick => "NEQUICK.ALG",
            Product::Tadm => "TADM.ALG",
            Product::Nedm2020 => "NEDM2020.ALG",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement kinds a caller may request.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Frequency,
    Edensity,
}

impl Measurement {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Measurement::Frequency => "frequency",
            Measurement::Edensity => "edensity",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical profile of one model product.
///
/// `theight` is always present; the measurement arrays are omitted from the
/// JSON output when the caller did not request them. Where present, each
/// array has the same length as `theight`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerticalProfile {
    /// Sample heights in km.
    pub theight: Vec<i64>,
    /// Plasma frequency in MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Vec<f64>>,
    /// Electron density in el/cm^3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edensity: Option<Vec<f64>>,
}

/// Solar and geomagnetic indices reported by the grid database.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridConditions {
    /// Sunspot number.
    pub ssn: f64,
    /// 10.7 cm solar radio flux in sfu.
    pub f10_7: f64,
    /// Planetary K index.
    pub kp: f64,
}

/// Complete workflow response for one (timestamp, location) query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub timestamp: NaiveDateTime,
    /// `[lat, lon]` in degrees.
    pub location: [f64; 2],
    pub ssn: f64,
    pub f10_7: f64,
    pub kp: f64,
    pub products: Vec<Product>,
    pub measurements: Vec<Measurement>,
    pub plot_data: BTreeMap<Product, VerticalProfile>,
}

/// systemd unit state as reported by `systemctl is-active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Active,
    Inactive,
    Activating,
    Deactivating,
    Failed,
    Unknown,
}

impl ServiceState {
    /// Parse trimmed `systemctl is-active` output. Anything unrecognised
    /// maps to [`ServiceState::Unknown`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "active" => ServiceState::Active,
            "inactive" => ServiceState::Inactive,
            "activating" => ServiceState::Activating,
            "deactivating" => ServiceState::Deactivating,
            "failed" => ServiceState::Failed,
            _ => ServiceState::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Active => "active",
            ServiceState::Inactive => "inactive",
            ServiceState::Activating => "activating",
            ServiceState::Deactivating => "deactivating",
            ServiceState::Failed => "failed",
            ServiceState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable `ionwf status --json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Unit name, e.g. `ionwf-server.service`.
    pub unit: String,
    /// Whether the unit is enabled to start on boot.
    pub enabled: bool,
    pub state: ServiceState,
    /// Seconds since the unit last entered the active state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    /// Configured `host:port` the service binds to.
    pub listen_addr: String,
    /// Result of probing `GET /health`, `None` when the probe was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_ok: Option<bool>,
}
