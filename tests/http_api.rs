// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP adapter, driven through the router.

mod common;

use axum::Router;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode, header};
use common::{FakeRadio, dispatcher};
use fireplace_bridge::protocol::http::router;
use fireplace_bridge::radio::TransmissionResult;
use fireplace_bridge::{CommandCatalog, CommandName, PowerState};
use tower::ServiceExt;

async fn request(app: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> serde_json::Value {
    let (status, body) = request(app, Method::GET, uri).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}");
    serde_json::from_str(&body).unwrap()
}

// ============================================================================
// Command endpoints
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn every_command_has_a_route() {
        let radio = FakeRadio::new();
        let app = router(dispatcher(&radio));
        let catalog = CommandCatalog::builtin();

        for command in CommandName::ALL {
            let json = get_json(&app, &format!("/{}", command.path())).await;
            assert_eq!(json, serde_json::json!({ "result": command.as_str() }));

            let frame = catalog.frame_for(command);
            if !frame.is_empty() {
                assert_eq!(radio.sent().last(), Some(frame));
            }
        }
        assert_eq!(radio.sent().len(), 7);
    }

    #[tokio::test]
    async fn on_and_off_update_state() {
        let radio = FakeRadio::new();
        let d = dispatcher(&radio);
        let app = router(d.clone());

        get_json(&app, "/on").await;
        assert_eq!(d.state(), PowerState::On);
        assert_eq!(get_json(&app, "/state").await["state"], "ON");

        get_json(&app, "/off").await;
        assert_eq!(d.state(), PowerState::Off);
        assert_eq!(get_json(&app, "/state").await["state"], "OFF");
    }

    #[tokio::test]
    async fn failures_still_answer_ok() {
        let radio = FakeRadio::new().reporting(TransmissionResult::TransmitFailed);
        let app = router(dispatcher(&radio));

        let json = get_json(&app, "/flame").await;
        assert_eq!(json["result"], "FLAME");
        assert_eq!(radio.sent().len(), 1);
    }

    #[tokio::test]
    async fn json_content_type() {
        let app = router(dispatcher(&FakeRadio::new()));
        let response = app
            .oneshot(Request::builder().uri("/plus").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }
}

// ============================================================================
// Panel and routing
// ============================================================================

mod routing {
    use super::*;

    #[tokio::test]
    async fn index_serves_control_panel() {
        let app = router(dispatcher(&FakeRadio::new()));
        let (status, body) = request(&app, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("fetch('/state')"));
    }

    #[tokio::test]
    async fn state_starts_off() {
        let app = router(dispatcher(&FakeRadio::new()));
        assert_eq!(
            get_json(&app, "/state").await,
            serde_json::json!({ "state": "OFF" })
        );
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let radio = FakeRadio::new();
        let app = router(dispatcher(&radio));

        let (status, _) = request(&app, Method::GET, "/toggle").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(radio.sent().is_empty());
    }

    #[tokio::test]
    async fn commands_are_get_only() {
        let radio = FakeRadio::new();
        let app = router(dispatcher(&radio));

        let (status, _) = request(&app, Method::POST, "/on").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(radio.sent().is_empty());
    }
}
