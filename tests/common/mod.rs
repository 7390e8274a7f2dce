#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub const SYSTEM_INFO: &str = r#"{
    "hashRate": 1234.0,
    "temp": 61.25,
    "power": 12.34567,
    "voltage": 5123,
    "current": 2450,
    "coreVoltage": 1200,
    "coreVoltageActual": 1187,
    "frequency": 525,
    "smallCoreCount": 894,
    "asicCount": 1,
    "bestDiff": "4.5G",
    "uptimeSeconds": 3725,
    "stratumURL": "public-pool.io",
    "stratumUser": "bc1qexample.worker1",
    "ASICModel": "BM1366",
    "autotune_preset": "balanced",
    "macAddr": "AA:BB:CC:DD:EE:FF",
    "hostname": "bitaxe",
    "ipAddress": "192.168.1.40",
    "fanspeed": 65,
    "fanrpm": 4100,
    "status": "mining"
}"#;

pub fn theme_json(name: &str) -> Value {
    json!({
        "themeName": name,
        "primaryColor": "#F80421",
        "secondaryColor": "#FC4D62",
        "backgroundColor": "#070D17",
        "textColor": "#F80421",
        "borderColor": "#FC4D62",
    })
}

/// A device that answers every endpoint the way real firmware does.
pub fn healthy_device() -> Router {
    Router::new()
        .route(
            "/api/system/info",
            get(|| async { ([("content-type", "application/json")], SYSTEM_INFO) }),
        )
        .route(
            "/api/themes",
            get(|| async {
                Json(json!({ "themes": ["THEME_ACS_DEFAULT", "THEME_BITAXE_RED"] }))
            }),
        )
        .route(
            "/api/themes/:name",
            get(|Path(name): Path<String>| async move {
                if name == "current" {
                    Ok(Json(theme_json("THEME_ACS_DEFAULT")))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            })
            .patch(|Path(name): Path<String>| async move { Json(theme_json(&name)) }),
        )
}

pub fn failing_device(status: StatusCode, body: &'static str) -> Router {
    Router::new().route("/api/system/info", get(move || async move { (status, body) }))
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An address nothing listens on.
pub async fn closed_port() -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
