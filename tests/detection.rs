//! End-to-end detection runs against local stand-ins for the external
//! lookup services and a real backend router.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use geoflags::client::BackendClient;
use geoflags::config::Config;
use geoflags::location::providers::{BigDataCloud, FixedPosition, IpApi, IpInfo, IpLookup};
use geoflags::location::{LocationMethod, LocationResolver, PresetChoice, SkipManual};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// ipinfo answers 500, ip-api answers France/Paris, reverse geocoding works.
fn lookup_stubs() -> Router {
    Router::new()
        .route("/ipinfo/json", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route(
            "/ip-api/json/",
            get(|| async { Json(json!({"status": "success", "country": "France", "city": "Paris"})) }),
        )
        .route(
            "/reverse",
            get(|| async { Json(json!({"countryName": "United States of America", "city": "Mountain View"})) }),
        )
}

/// Every lookup fails.
fn failing_stubs() -> Router {
    Router::new()
        .route("/ipinfo/json", get(|| async { Json(json!({"country": "", "city": ""})) }))
        .route("/ip-api/json/", get(|| async { Json(json!({"status": "fail", "message": "reserved range"})) }))
        .route("/reverse", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
}

/// A loopback origin whose port was just released.
fn closed_origin() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn resolver_for(lookups: &str, backend: &str) -> LocationResolver {
    let ip_services: Vec<Box<dyn IpLookup>> = vec![
        Box::new(IpInfo::new(format!("{}/ipinfo/json", lookups))),
        Box::new(IpApi::new(format!("{}/ip-api/json/", lookups))),
    ];
    LocationResolver::new()
        .with_geocoder(BigDataCloud::new(format!("{}/reverse", lookups)))
        .with_ip_services(ip_services)
        .with_catalog(BackendClient::new(backend))
}

#[tokio::test(flavor = "multi_thread")]
async fn ip_fallback_reaches_second_service() {
    let lookups = spawn(lookup_stubs()).await;
    let backend = spawn(geoflags::server::build_router(&Config::default())).await;

    let (estimate, flags) = tokio::task::spawn_blocking(move || {
        let res = resolver_for(&lookups, &backend).with_picker(SkipManual).resolve();
        let flags = BackendClient::new(&backend).feature_flags(&res.estimate).unwrap();
        (res.estimate, flags)
    })
    .await
    .unwrap();

    assert_eq!(estimate.method, LocationMethod::Ip);
    assert_eq!(estimate.country.as_deref(), Some("France"));
    assert_eq!(estimate.city.as_deref(), Some("Paris"));
    assert_eq!(flags.location, "Paris, France");
    assert_eq!(flags.detection_method, "ip");
    assert!(!flags.dark_mode);
}

#[tokio::test(flavor = "multi_thread")]
async fn device_fix_is_reverse_geocoded() {
    let lookups = spawn(lookup_stubs()).await;
    let backend = spawn(geoflags::server::build_router(&Config::default())).await;

    let (estimate, flags) = tokio::task::spawn_blocking(move || {
        let res = resolver_for(&lookups, &backend)
            .with_device(FixedPosition::fresh(37.3861, -122.0839))
            .resolve();
        let flags = BackendClient::new(&backend).feature_flags(&res.estimate).unwrap();
        (res.estimate, flags)
    })
    .await
    .unwrap();

    assert_eq!(estimate.method, LocationMethod::Browser);
    assert_eq!(estimate.city.as_deref(), Some("Mountain View"));
    assert!(flags.beta_features);
    assert_eq!(flags.detection_method, "browser");
}

#[tokio::test(flavor = "multi_thread")]
async fn manual_pick_from_backend_catalog() {
    let lookups = spawn(failing_stubs()).await;
    let backend = spawn(geoflags::server::build_router(&Config::default())).await;

    let (estimate, flags) = tokio::task::spawn_blocking(move || {
        let res = resolver_for(&lookups, &backend)
            .with_picker(PresetChoice("Mumbai".into()))
            .resolve();
        let flags = BackendClient::new(&backend).feature_flags(&res.estimate).unwrap();
        (res.estimate, flags)
    })
    .await
    .unwrap();

    assert_eq!(estimate.method, LocationMethod::Manual);
    assert_eq!(estimate.country.as_deref(), Some("IN"));
    assert!(flags.dark_mode);
    assert!(flags.premium_features);
    assert_eq!(flags.location, "Mumbai, IN");
}

#[tokio::test(flavor = "multi_thread")]
async fn declined_manual_falls_back_to_timezone() {
    let lookups = spawn(failing_stubs()).await;
    let backend = spawn(geoflags::server::build_router(&Config::default())).await;

    let estimate = tokio::task::spawn_blocking(move || {
        resolver_for(&lookups, &backend)
            .with_device(FixedPosition::fresh(48.85, 2.35))
            .with_picker(SkipManual)
            .with_timezone(Some("Europe/Paris".into()))
            .resolve()
            .estimate
    })
    .await
    .unwrap();

    // The device fix survives a failed reverse geocode.
    assert_eq!(estimate.method, LocationMethod::Browser);
    assert!(estimate.city.is_none());

    let lookups = spawn(failing_stubs()).await;
    let backend = spawn(geoflags::server::build_router(&Config::default())).await;
    let estimate = tokio::task::spawn_blocking(move || {
        resolver_for(&lookups, &backend)
            .with_picker(SkipManual)
            .with_timezone(Some("Europe/Paris".into()))
            .resolve()
            .estimate
    })
    .await
    .unwrap();

    assert_eq!(estimate.method, LocationMethod::Default);
    assert_eq!(estimate.country.as_deref(), Some("FR"));
    assert_eq!(estimate.city.as_deref(), Some("Unknown"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_means_empty_catalog() {
    let lookups = spawn(failing_stubs()).await;
    let backend = closed_origin();

    let estimate = tokio::task::spawn_blocking(move || {
        resolver_for(&lookups, &backend)
            .with_picker(PresetChoice("Tokyo".into()))
            .with_timezone(Some("Asia/Tokyo".into()))
            .resolve()
            .estimate
    })
    .await
    .unwrap();

    assert_eq!(estimate.method, LocationMethod::Default);
    assert_eq!(estimate.country.as_deref(), Some("JP"));
}
