//! One capture invocation: resolve, fetch, persist.
//!
//! Strictly sequential with no branching back; any stage error aborts the
//! invocation and the error kind names the stage. The resolver's internal
//! issued-URI -> fallback transition is the only recovery anywhere.

use std::path::PathBuf;

use crate::config::CaptureConfig;
use crate::error::Result;
use crate::fetch;
use crate::onvif::{OnvifClient, SnapshotUri};
use crate::persist;

/// Outcome of a successful capture. Transient; nothing is retained across
/// invocations beyond the files on disk.
#[derive(Debug)]
pub struct CaptureReport {
    pub uri: SnapshotUri,
    pub original_path: PathBuf,
    pub cropped_path: PathBuf,
    /// Decoded source frame dimensions.
    pub width: u32,
    pub height: u32,
}

/// Runs a single acquire-and-persist pass for the configured camera.
pub fn run_capture(cfg: &CaptureConfig) -> Result<CaptureReport> {
    let client = OnvifClient::new(
        cfg.camera.clone(),
        cfg.soap_timeout,
        cfg.fallback_channel,
        cfg.profile_index,
    );

    let uri = client.resolve()?;
    log::info!("snapshot url: {} ({})", uri.url, uri.provenance);

    let image = fetch::fetch(&uri, &cfg.camera.user, &cfg.camera.password, cfg.fetch_timeout)?;
    let (width, height) = (image.width(), image.height());
    log::info!("fetched snapshot {}x{}", width, height);

    let (original_path, cropped_path) = persist::persist(&image, &cfg.crop, &cfg.output)?;

    Ok(CaptureReport {
        uri,
        original_path,
        cropped_path,
        width,
        height,
    })
}
