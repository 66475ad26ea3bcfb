//! End-to-end API tests with mocked DIAS and DLR upstreams.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use tower::ServiceExt;

use ionwf_server::routes;
use ionwf_server::state::AppState;

fn app(server: &MockServer) -> axum::Router {
    let state = AppState::new(
        &server.base_url(),
        &format!("{}/nedm/api/v1/nedm", server.base_url()),
        Duration::from_secs(5),
    )
    .expect("client should build");
    routes::router(state)
}

fn grid_payload() -> serde_json::Value {
    serde_json::json!({
        "grid_params": {
            "SolCycle": { "ssn": 120.0, "f10_7": 153.2 },
            "Kp": { "kp": 2.3 }
        },
        "model_data": {
            "vprofile": {
                "NEQUICK.ALG": {
                    "theight": [100, 400, 800, 1200],
                    "frequency": [2.1, 7.8, 4.2, 2.0],
                    "edensity": [5.4e4, 7.5e5, 2.2e5, 4.9e4]
                },
                "TADM.ALG": {
                    "theight": [100, 400, 800, 1200, 1600],
                    "frequency": [2.0, 7.1, 3.9, 1.8, 1.1],
                    "edensity": [5.0e4, 6.3e5, 1.9e5, 4.0e4, 1.5e4]
                }
            }
        }
    })
}

fn nedm_payload() -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "geometry": { "coordinates": [12.0, 45.0, 50.0] },
                "properties": { "electron_density_10^12/m^3": 0.5 }
            },
            {
                "geometry": { "coordinates": [12.0, 45.0, 250.0] },
                "properties": { "electron_density_10^12/m^3": 4.0 }
            },
            {
                "geometry": { "coordinates": [12.0, 45.0, 900.0] },
                "properties": { "electron_density_10^12/m^3": 1.0 }
            },
            {
                "geometry": { "coordinates": [12.0, 45.0, 5000.0] },
                "properties": { "electron_density_10^12/m^3": 0.1 }
            }
        ]
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_responds_ok() {
    let server = MockServer::start_async().await;
    let response = app(&server)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn run_workflow_merges_grid_products() {
    let server = MockServer::start_async().await;
    let grid = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/dias_db/odc_edensity")
                .query_param("date", "2025-02-01T10:45:00")
                .query_param("lat", "45")
                .query_param("lon", "12");
            then.status(200).json_body(grid_payload());
        })
        .await;

    let uri = "/run_workflow?date=2025-02-01T10:45:00&lat=45&lon=12\
               &products=NEQUICK.ALG&products=TADM.ALG\
               &measurements=frequency&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    grid.assert_async().await;

    assert_eq!(body["ssn"], 120.0);
    assert_eq!(body["kp"], 2.3);
    assert_eq!(body["location"], serde_json::json!([45.0, 12.0]));

    // NEQUICK comes through untouched.
    assert_eq!(
        body["plot_data"]["NEQUICK.ALG"]["theight"],
        serde_json::json!([100, 400, 800, 1200])
    );
    // TADM is cut off at 1000 km, measurement arrays included.
    assert_eq!(
        body["plot_data"]["TADM.ALG"]["theight"],
        serde_json::json!([100, 400, 800])
    );
    assert_eq!(
        body["plot_data"]["TADM.ALG"]["edensity"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn run_workflow_filters_unrequested_measurements() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dias_db/odc_edensity");
            then.status(200).json_body(grid_payload());
        })
        .await;

    let uri = "/run_workflow?date=2025-02-01T10:45:00&lat=45&lon=12\
               &products=NEQUICK.ALG&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let profile = &body["plot_data"]["NEQUICK.ALG"];
    assert!(profile["edensity"].is_array());
    assert!(profile.get("frequency").is_none());
    assert!(body["plot_data"].get("TADM.ALG").is_none());
}

#[tokio::test]
async fn run_workflow_includes_nedm_when_requested() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dias_db/odc_edensity");
            then.status(200).json_body(grid_payload());
        })
        .await;
    let nedm = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/nedm/api/v1/nedm")
                .json_body_partial(r#"{ "f10p7_sfu": 153.2 }"#);
            then.status(200).json_body(nedm_payload());
        })
        .await;

    let uri = "/run_workflow?date=2025-02-01T10:45:00&lat=45&lon=12\
               &products=NEDM2020.ALG&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    nedm.assert_async().await;

    // Only the 250 km and 900 km samples fall inside the model window.
    assert_eq!(
        body["plot_data"]["NEDM2020.ALG"]["theight"],
        serde_json::json!([250, 900])
    );
    // 4.0e12 el/m^3 is 4.0e6 el/cm^3.
    let edensity = body["plot_data"]["NEDM2020.ALG"]["edensity"]
        .as_array()
        .unwrap();
    assert!((edensity[0].as_f64().unwrap() - 4.0e6).abs() < 1.0);
}

#[tokio::test]
async fn latitude_out_of_range_is_rejected_before_upstream() {
    let server = MockServer::start_async().await;
    let grid = server
        .mock_async(|when, then| {
            when.method(GET).path("/dias_db/odc_edensity");
            then.status(200).json_body(grid_payload());
        })
        .await;

    let uri = "/run_workflow?date=2025-02-01T10:45:00&lat=75&lon=12\
               &products=NEQUICK.ALG&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("lat"));
    grid.assert_hits_async(0).await;
}

#[tokio::test]
async fn empty_product_list_is_rejected() {
    let server = MockServer::start_async().await;
    let uri = "/run_workflow?date=2025-02-01T10:45:00&lat=45&lon=12&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("product"));
}

#[tokio::test]
async fn upstream_error_envelope_maps_to_bad_gateway() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dias_db/odc_edensity");
            then.status(200)
                .json_body(serde_json::json!({ "detail": "no data for date" }));
        })
        .await;

    let uri = "/run_workflow?date=2025-02-01T10:45:00&lat=45&lon=12\
               &products=NEQUICK.ALG&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("no data for date"));
}

#[tokio::test]
async fn dlr_data_derives_plasma_frequency() {
    let server = MockServer::start_async().await;
    let nedm = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/nedm/api/v1/nedm")
                .json_body_partial(r#"{ "f10p7_sfu": 100.0 }"#);
            then.status(200).json_body(nedm_payload());
        })
        .await;

    let uri = "/dlr_data?date=2025-02-01T10:45:00&lat=45&lon=12";
    let response = app(&server)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    nedm.assert_async().await;

    // 8.9803 * sqrt(4.0) at the 250 km sample.
    let frequency = body["NEDM2020.ALG"]["frequency"].as_array().unwrap();
    assert!((frequency[0].as_f64().unwrap() - 17.9606).abs() < 1e-4);
}

#[tokio::test]
async fn plot_data_returns_png() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dias_db/odc_edensity");
            then.status(200).json_body(grid_payload());
        })
        .await;

    let uri = "/plot_data?date=2025-02-01T10:45:00&lat=45&lon=12\
               &products=NEQUICK.ALG&products=TADM.ALG\
               &measurements=frequency&measurements=edensity";
    let response = app(&server)
        .oneshot(Request::post(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..4], b"\x89PNG");
}
