//! Authenticated snapshot fetch.
//!
//! One HTTP GET with a bounded timeout. If the camera answers `401` with a
//! digest challenge, the request is re-issued exactly once with the computed
//! `Authorization` header; that handshake is part of digest auth, not a
//! retry policy. Any other failure is fatal, single attempt by design.

use std::io::Read;
use std::time::Duration;

use image::RgbImage;

use crate::digest::DigestChallenge;
use crate::error::{CaptureError, Result};
use crate::onvif::SnapshotUri;

/// Upper bound on the response body. A full-resolution JPEG from a 12 MP
/// sensor stays well under this.
const MAX_SNAPSHOT_BYTES: usize = 32 * 1024 * 1024;

/// Fetches and decodes the snapshot behind `uri`, normalized to RGB.
pub fn fetch(
    uri: &SnapshotUri,
    user: &str,
    password: &str,
    timeout: Duration,
) -> Result<RgbImage> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let bytes = fetch_bytes(&agent, &uri.url, user, password)?;
    log::debug!("fetched {} bytes from {}", bytes.len(), uri.url);
    decode(&bytes)
}

fn fetch_bytes(agent: &ureq::Agent, url: &str, user: &str, password: &str) -> Result<Vec<u8>> {
    match agent.get(url).call() {
        Ok(response) => read_body(response),
        Err(ureq::Error::Status(401, response)) => {
            let challenge = response
                .header("WWW-Authenticate")
                .ok_or_else(|| {
                    CaptureError::Fetch("401 response without WWW-Authenticate".to_string())
                })
                .and_then(|header| {
                    DigestChallenge::parse(header)
                        .map_err(|e| CaptureError::Fetch(format!("{:#}", e)))
                })?;
            let authorization =
                challenge.authorize("GET", &request_uri(url)?, user, password);
            match agent.get(url).set("Authorization", &authorization).call() {
                Ok(response) => read_body(response),
                Err(ureq::Error::Status(code, _)) => Err(CaptureError::Fetch(format!(
                    "http {} after digest authentication",
                    code
                ))),
                Err(e) => Err(CaptureError::Fetch(e.to_string())),
            }
        }
        Err(ureq::Error::Status(code, _)) => {
            Err(CaptureError::Fetch(format!("http {} from {}", code, url)))
        }
        Err(e) => Err(CaptureError::Fetch(e.to_string())),
    }
}

/// The request-URI (path plus query) digest responses are computed over.
fn request_uri(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)
        .map_err(|e| CaptureError::Fetch(format!("invalid snapshot url {}: {}", url, e)))?;
    Ok(match parsed.query() {
        Some(query) => format!("{}?{}", parsed.path(), query),
        None => parsed.path().to_string(),
    })
}

fn read_body(response: ureq::Response) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_SNAPSHOT_BYTES as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| CaptureError::Fetch(format!("read snapshot body: {}", e)))?;
    if bytes.is_empty() {
        return Err(CaptureError::Fetch("empty snapshot body".to_string()));
    }
    if bytes.len() > MAX_SNAPSHOT_BYTES {
        return Err(CaptureError::Fetch(format!(
            "snapshot body exceeded {} byte cap",
            MAX_SNAPSHOT_BYTES
        )));
    }
    Ok(bytes)
}

/// Decodes image bytes and collapses any source channel layout to RGB.
fn decode(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| CaptureError::Decode(e.to_string()))?;
    Ok(image.to_rgb8())
}
