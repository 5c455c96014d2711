// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP adapter: control panel and one endpoint per command.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | HTML control panel |
//! | `GET /on`, `/off`, `/flame`, ... | `{"result":"<COMMAND>"}` |
//! | `GET /state` | `{"state":"ON"}` or `{"state":"OFF"}` |
//!
//! Command endpoints always answer 200: transmission failures are logged by
//! the dispatcher, never reported to the caller.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::dispatcher::Dispatcher;
use crate::error::ProtocolError;
use crate::radio::RadioLink;
use crate::types::{CommandName, PowerState};

/// Body of a command endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    /// Token of the command that was dispatched, e.g. `FLAME`.
    pub result: &'static str,
}

/// Body of `GET /state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateResponse {
    /// Last commanded power state.
    pub state: PowerState,
}

/// Builds the router for a dispatcher.
pub fn router<R>(dispatcher: Arc<Dispatcher<R>>) -> Router
where
    R: RadioLink + Send + 'static,
{
    let mut router = Router::new()
        .route("/", get(index))
        .route("/state", get(state::<R>));

    for command in CommandName::ALL {
        let path = format!("/{}", command.path());
        router = router.route(
            &path,
            get(move |State(dispatcher): State<Arc<Dispatcher<R>>>| async move {
                run_command(dispatcher, command).await
            }),
        );
    }
    router.with_state(dispatcher)
}

/// Binds the listen socket.
///
/// Kept separate from [`serve`] so that a bind failure aborts startup before
/// the radio is touched.
///
/// # Errors
///
/// Returns `ProtocolError::Bind` if the address cannot be bound.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ProtocolError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ProtocolError::Bind { addr, source })?;
    tracing::info!(%addr, "HTTP listener bound");
    Ok(listener)
}

/// Serves the router on an already bound listener until an I/O error.
///
/// # Errors
///
/// Returns `ProtocolError::Server` if the server stops with an error.
pub async fn serve<R>(listener: TcpListener, dispatcher: Arc<Dispatcher<R>>) -> Result<(), ProtocolError>
where
    R: RadioLink + Send + 'static,
{
    axum::serve(listener, router(dispatcher))
        .await
        .map_err(ProtocolError::Server)
}

async fn run_command<R>(dispatcher: Arc<Dispatcher<R>>, command: CommandName) -> Json<CommandResponse>
where
    R: RadioLink + Send + 'static,
{
    tracing::debug!(command = %command, "HTTP command received");
    if let Err(e) = tokio::task::spawn_blocking(move || dispatcher.dispatch(command)).await {
        tracing::error!(command = %command, error = %e, "Dispatch task failed");
    }
    Json(CommandResponse {
        result: command.as_str(),
    })
}

async fn state<R>(State(dispatcher): State<Arc<Dispatcher<R>>>) -> Json<StateResponse>
where
    R: RadioLink + Send + 'static,
{
    Json(StateResponse {
        state: dispatcher.state(),
    })
}

async fn index() -> Html<String> {
    Html(control_panel())
}

/// Renders the control panel: buttons in pairs, state polled every 3 s.
fn control_panel() -> String {
    const ROWS: [[CommandName; 2]; 4] = [
        [CommandName::PowerOn, CommandName::PowerOff],
        [CommandName::Sound, CommandName::Flame],
        [CommandName::Left, CommandName::Right],
        [CommandName::Plus, CommandName::Minus],
    ];

    let mut page = String::from(concat!(
        "<!DOCTYPE html><html><head>",
        "<meta name='viewport' content='width=device-width,initial-scale=1'/>",
        "<title>Fireplace Controller</title>",
        "<style>",
        "body{font-family:sans-serif;background:#111;color:#eee;text-align:center;padding:2rem;}",
        "button{font-size:1.2rem;padding:0.7rem 1.5rem;margin:0.5rem;border-radius:0.5rem;border:none;cursor:pointer;}",
        ".on{background:#2ecc71;color:#000;}",
        ".off{background:#e74c3c;color:#000;}",
        ".state{margin-top:1rem;font-size:1.1rem;}",
        "</style></head><body>",
        "<h1>Fireplace Controller</h1>",
    ));

    for row in ROWS {
        page.push_str("<div>");
        for command in row {
            let _ = write!(
                page,
                "<button class='{path}' onclick=\"fetch('/{path}')\">{label}</button>",
                path = command.path(),
                label = command.as_str(),
            );
        }
        page.push_str("</div>");
    }

    page.push_str(concat!(
        "<div class='state'>Current state: <span id='st'></span></div>",
        "<script>",
        "async function updateState(){",
        "let r = await fetch('/state');",
        "let j = await r.json();",
        "document.getElementById('st').innerText = j.state;",
        "}",
        "updateState();",
        "setInterval(updateState, 3000);",
        "</script></body></html>",
    ));
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_has_a_button_per_command() {
        let page = control_panel();
        for command in CommandName::ALL {
            assert!(
                page.contains(&format!("fetch('/{}')", command.path())),
                "missing {command}"
            );
        }
        assert!(page.contains("setInterval(updateState, 3000)"));
    }

    #[test]
    fn responses_serialize_like_the_panel_expects() {
        let body = serde_json::to_string(&StateResponse {
            state: PowerState::On,
        })
        .unwrap();
        assert_eq!(body, r#"{"state":"ON"}"#);

        let body = serde_json::to_string(&CommandResponse { result: "FLAME" }).unwrap();
        assert_eq!(body, r#"{"result":"FLAME"}"#);
    }
}
