//! ION ED workflow service.
//!
//! Retrieves ionospheric electron-density vertical profiles from the DIAS
//! grid database and the DLR NEDM2020 model, merges and filters them per
//! request, and serves the result as JSON or as a rendered PNG chart.

pub mod dias;
pub mod dlr;
pub mod error;
pub mod plot;
pub mod routes;
pub mod state;
pub mod workflow;
