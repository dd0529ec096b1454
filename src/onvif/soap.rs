//! SOAP plumbing for the ONVIF device and media services.
//!
//! Requests are plain HTTP POSTs of hand-built envelopes; authentication is
//! the WS-Security UsernameToken password digest
//! (`Base64(SHA1(nonce + created + password))`), which ONVIF devices accept
//! in place of HTTP-level auth for these calls.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::Rng;
use sha1::{Digest, Sha1};

use super::xml;

/// Builds a WS-Security header with a fresh nonce and created timestamp.
pub fn ws_security_header(username: &str, password: &str) -> String {
    let nonce: [u8; 16] = rand::thread_rng().gen();
    let created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    let password_digest = BASE64.encode(hasher.finalize());

    format!(
        r#"<wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd" xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <wsse:UsernameToken>
    <wsse:Username>{}</wsse:Username>
    <wsse:Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest">{}</wsse:Password>
    <wsse:Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">{}</wsse:Nonce>
    <wsu:Created>{}</wsu:Created>
  </wsse:UsernameToken>
</wsse:Security>"#,
        xml_escape(username),
        password_digest,
        BASE64.encode(nonce),
        created
    )
}

/// Wraps a body element in a SOAP 1.2 envelope with the given header.
pub fn envelope(header: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
  <s:Header>{}</s:Header>
  <s:Body>{}</s:Body>
</s:Envelope>"#,
        header, body
    )
}

/// POSTs an envelope and returns the response body.
///
/// Non-2xx statuses and SOAP fault bodies are both errors; callers decide
/// whether an error at their stage is fatal or triggers the fallback URL.
pub fn post(agent: &ureq::Agent, url: &str, envelope: &str) -> Result<String> {
    let response = agent
        .post(url)
        .set("Content-Type", "application/soap+xml; charset=utf-8")
        .send_string(envelope)
        .map_err(|e| match e {
            ureq::Error::Status(code, _) => anyhow!("{} returned http {}", url, code),
            other => anyhow!("request to {} failed: {}", url, other),
        })?;

    let body = response
        .into_string()
        .with_context(|| format!("read soap response from {}", url))?;

    if let Some(reason) = fault_reason(&body) {
        return Err(anyhow!("soap fault from {}: {}", url, reason));
    }
    Ok(body)
}

/// Reads the reason out of a fault envelope, `None` for non-fault bodies.
/// Detection is by element local name, so payload text that merely contains
/// the word cannot trip it.
fn fault_reason(body: &str) -> Option<String> {
    if !xml::has_element(body, "Fault") {
        return None;
    }
    Some(
        xml::element_text(body, "Text")
            .or_else(|| xml::element_text(body, "Reason"))
            .unwrap_or_else(|| "unspecified fault".to_string()),
    )
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
