//! Shared application state.

use std::time::Duration;

use anyhow::{Context, Result};

/// Shared handles for all request handlers: one pooled HTTP client and the
/// upstream endpoints it talks to.
#[derive(Debug, Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    /// DIAS API base, without a trailing slash.
    pub dias_base_url: String,
    /// Full URL of the DLR NEDM model endpoint.
    pub nedm_url: String,
}

impl AppState {
    /// Build the state with a request timeout applied to every upstream call.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(dias_base_url: &str, nedm_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            dias_base_url: dias_base_url.trim_end_matches('/').to_string(),
            nedm_url: nedm_url.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_dias_base() {
        let state = AppState::new(
            "https://dias.example/api/v2/",
            "https://nedm.example/api/v1/nedm",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(state.dias_base_url, "https://dias.example/api/v2");
    }
}
