//! HTTP boundary: decodes push events and hands them to the rule table

use axum::Form;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::error;

use crate::SharedState;
use crate::error::{HookError, Result};
use crate::payload::GithubPayload;

/// Form-encoded deliveries carry the JSON document in a `payload` field.
#[derive(Deserialize)]
struct EventForm {
    payload: String,
}

/// Handles a webhook POST on any path.
///
/// Decode failure aborts the request with nothing executed. Execution
/// failure still returns the captured command output when there is any,
/// so operators can see what a failed trigger printed.
pub async fn handle_webhook(State(state): State<SharedState>, req: Request) -> Response {
    let payload = match decode_event(req).await {
        Ok(payload) => payload,
        Err(e) => {
            error!("{}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    match state.rules.execute_payload(&payload).await {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err(e) => {
            let body = match e {
                HookError::Execution { output, .. } if !output.is_empty() => output,
                other => other.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

/// Accepts either a JSON body or a form body with a `payload` field, so
/// callers don't have to know which encoding their provider uses.
async fn decode_event(req: Request) -> Result<GithubPayload> {
    if is_form_encoded(&req) {
        let Form(form) = Form::<EventForm>::from_request(req, &())
            .await
            .map_err(|e| HookError::PayloadDecode(e.to_string()))?;
        GithubPayload::from_json(form.payload.as_bytes())
    } else {
        let body = Bytes::from_request(req, &())
            .await
            .map_err(|e| HookError::PayloadDecode(e.to_string()))?;
        GithubPayload::from_json(&body)
    }
}

fn is_form_encoded(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
