// Response decoding shared by the Identity and Firestore clients.
//
// Google APIs report failures as `{"error": {"code", "message", "status"}}`
// regardless of surface; only the resulting `Error` variant differs.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::Error;

/// Which REST surface produced a response.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Surface {
    Identity,
    Firestore,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Check the status and deserialize the body, keeping the raw text on failure.
pub(crate) async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
    surface: Surface,
) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    trace!(%status, bytes = body.len(), "response received");

    if !status.is_success() {
        return Err(api_error(surface, status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

fn api_error(surface: Surface, status: u16, body: &str) -> Error {
    let parsed = serde_json::from_str::<GoogleErrorEnvelope>(body)
        .ok()
        .map(|env| env.error);

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_owned()
            }
        });

    match surface {
        Surface::Identity => Error::Identity { status, message },
        Surface::Firestore => Error::Firestore {
            status,
            code: parsed.and_then(|e| e.status),
            message,
        },
    }
}
