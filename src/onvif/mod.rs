//! Snapshot URI resolution over ONVIF-style SOAP services.
//!
//! The resolver is responsible for:
//! - Querying device identity (manufacturer/model) for diagnostics
//! - Discovering the media service address via `GetCapabilities`
//! - Enumerating media profiles and selecting one by configured index
//! - Requesting a snapshot URI for the selected profile token
//! - Falling back to the vendor ISAPI picture path when issuance fails
//!
//! Failure policy: anything that goes wrong before a profile token is in
//! hand is a fatal [`CaptureError::Resolution`]. Only the final
//! `GetSnapshotUri` step has a fallback, and the fallback is attempted
//! exactly once; constructing it is pure string formatting and cannot fail.

pub mod soap;
pub mod xml;

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};

use crate::error::{CaptureError, Result};

/// Identifies the device to query. Immutable per invocation.
#[derive(Debug, Clone)]
pub struct CameraEndpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl CameraEndpoint {
    pub fn device_service_url(&self) -> String {
        format!("http://{}:{}/onvif/device_service", self.host, self.port)
    }

    fn default_media_service_url(&self) -> String {
        format!("http://{}:{}/onvif/media_service", self.host, self.port)
    }
}

/// How a snapshot URL was obtained. Diagnostic only; fetch behavior does
/// not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriProvenance {
    /// Issued by the device's media service (possibly short-lived).
    Issued,
    /// Constructed from the known vendor ISAPI path convention.
    Fallback,
}

impl fmt::Display for UriProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriProvenance::Issued => write!(f, "issued"),
            UriProvenance::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved snapshot URL tagged with its provenance.
#[derive(Debug, Clone)]
pub struct SnapshotUri {
    pub url: String,
    pub provenance: UriProvenance,
}

/// Device identity fields extracted for logging. Anything the device did
/// not report stays `None`.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// Blocking SOAP client for one camera.
pub struct OnvifClient {
    endpoint: CameraEndpoint,
    agent: ureq::Agent,
    fallback_channel: u32,
    profile_index: usize,
}

impl OnvifClient {
    pub fn new(
        endpoint: CameraEndpoint,
        timeout: Duration,
        fallback_channel: u32,
        profile_index: usize,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint,
            agent,
            fallback_channel,
            profile_index,
        }
    }

    /// Resolves a snapshot URI for the configured camera.
    pub fn resolve(&self) -> Result<SnapshotUri> {
        let info = self
            .device_information()
            .map_err(|e| CaptureError::Resolution(format!("{:#}", e)))?;
        log::info!(
            "device: {} {}",
            info.manufacturer.as_deref().unwrap_or("unknown"),
            info.model.as_deref().unwrap_or("unknown")
        );

        let media_url = self.media_service_url();
        let tokens = self
            .profile_tokens(&media_url)
            .map_err(|e| CaptureError::Resolution(format!("{:#}", e)))?;
        if tokens.is_empty() {
            return Err(CaptureError::Resolution(
                "device reported no media profiles".to_string(),
            ));
        }
        let token = tokens.get(self.profile_index).ok_or_else(|| {
            CaptureError::Resolution(format!(
                "profile index {} out of range ({} profiles)",
                self.profile_index,
                tokens.len()
            ))
        })?;
        log::debug!(
            "selected profile {} of {}: {}",
            self.profile_index,
            tokens.len(),
            token
        );

        match self.snapshot_uri(&media_url, token) {
            Ok(url) => Ok(SnapshotUri {
                url,
                provenance: UriProvenance::Issued,
            }),
            Err(e) => {
                let url = self.fallback_url();
                log::warn!("snapshot uri request failed ({:#}); using fallback {}", e, url);
                Ok(SnapshotUri {
                    url,
                    provenance: UriProvenance::Fallback,
                })
            }
        }
    }

    /// The vendor ISAPI picture URL for the configured channel.
    pub fn fallback_url(&self) -> String {
        format!(
            "http://{}/ISAPI/Streaming/channels/{}/picture",
            self.endpoint.host, self.fallback_channel
        )
    }

    fn device_information(&self) -> AnyResult<DeviceInfo> {
        let body = self
            .call(
                &self.endpoint.device_service_url(),
                r#"<GetDeviceInformation xmlns="http://www.onvif.org/ver10/device/wsdl"/>"#,
            )
            .context("query device information")?;
        let info = DeviceInfo {
            manufacturer: xml::element_text(&body, "Manufacturer"),
            model: xml::element_text(&body, "Model"),
        };
        if info.manufacturer.is_none() && info.model.is_none() {
            log::debug!("device information response carried no identity fields");
        }
        Ok(info)
    }

    /// Media service address via `GetCapabilities`. Soft: any failure falls
    /// back to the conventional path so that profile enumeration remains
    /// the fatal/non-fatal boundary.
    fn media_service_url(&self) -> String {
        let request = r#"<GetCapabilities xmlns="http://www.onvif.org/ver10/device/wsdl"><Category>Media</Category></GetCapabilities>"#;
        match self.call(&self.endpoint.device_service_url(), request) {
            Ok(body) => match xml::capability_xaddr(&body, "Media") {
                Some(xaddr) => xaddr,
                None => {
                    log::debug!("capabilities response had no media XAddr; using default path");
                    self.endpoint.default_media_service_url()
                }
            },
            Err(e) => {
                log::debug!("capabilities query failed ({:#}); using default media path", e);
                self.endpoint.default_media_service_url()
            }
        }
    }

    fn profile_tokens(&self, media_url: &str) -> AnyResult<Vec<String>> {
        let body = self
            .call(
                media_url,
                r#"<GetProfiles xmlns="http://www.onvif.org/ver10/media/wsdl"/>"#,
            )
            .context("enumerate media profiles")?;
        Ok(xml::attribute_values(&body, "Profiles", "token"))
    }

    fn snapshot_uri(&self, media_url: &str, token: &str) -> AnyResult<String> {
        let request = format!(
            r#"<GetSnapshotUri xmlns="http://www.onvif.org/ver10/media/wsdl"><ProfileToken>{}</ProfileToken></GetSnapshotUri>"#,
            token
        );
        let body = self
            .call(media_url, &request)
            .context("request snapshot uri")?;
        xml::element_text(&body, "Uri")
            .ok_or_else(|| anyhow::anyhow!("snapshot uri response carried no Uri element"))
    }

    fn call(&self, url: &str, request_body: &str) -> AnyResult<String> {
        let header = soap::ws_security_header(&self.endpoint.user, &self.endpoint.password);
        soap::post(&self.agent, url, &soap::envelope(&header, request_body))
    }
}
