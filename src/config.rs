//! Deployment configuration.
//!
//! One TOML file per deployment describes the camera endpoint, the fixed
//! crop rectangle for the camera mounting, the two output directories, and
//! network timeouts. Credentials can be overridden through `CAMSNAP_*`
//! environment variables so the file itself does not have to carry them.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::onvif::CameraEndpoint;
use crate::persist::{CropRect, OutputDirs};

const DEFAULT_PORT: u16 = 80;
const DEFAULT_FALLBACK_CHANNEL: u32 = 101;
const DEFAULT_PROFILE_INDEX: usize = 0;
const DEFAULT_ORIGINAL_DIR: &str = "snapshots_ori";
const DEFAULT_CROPPED_DIR: &str = "snapshots";
const DEFAULT_SOAP_TIMEOUT_SECS: u64 = 5;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    camera: Option<CameraConfigFile>,
    crop: Option<CropConfigFile>,
    output: Option<OutputConfigFile>,
    timeouts: Option<TimeoutConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    channel: Option<u32>,
    profile_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CropConfigFile {
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    original_dir: Option<PathBuf>,
    cropped_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct TimeoutConfigFile {
    soap_secs: Option<u64>,
    fetch_secs: Option<u64>,
}

/// Fully resolved configuration, immutable for the duration of one capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub camera: CameraEndpoint,
    /// ISAPI channel number used when constructing the fallback URL.
    pub fallback_channel: u32,
    /// Which media profile to request a snapshot URI for.
    pub profile_index: usize,
    pub crop: CropRect,
    pub output: OutputDirs,
    pub soap_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl CaptureConfig {
    /// Loads configuration from `path`, then applies `CAMSNAP_*` env
    /// overrides and validates the result.
    pub fn load(path: &Path) -> Result<Self> {
        let file_cfg = read_config_file(path)?;
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CaptureConfigFile) -> Result<Self> {
        let camera_file = file.camera.unwrap_or_default();
        let camera = CameraEndpoint {
            host: camera_file.host.unwrap_or_default(),
            port: camera_file.port.unwrap_or(DEFAULT_PORT),
            user: camera_file.user.unwrap_or_default(),
            password: camera_file.password.unwrap_or_default(),
        };
        let crop_file = file
            .crop
            .ok_or_else(|| anyhow!("config missing [crop] section"))?;
        let crop = CropRect {
            left: crop_file.left,
            top: crop_file.top,
            right: crop_file.right,
            bottom: crop_file.bottom,
        };
        let output_file = file.output.unwrap_or_default();
        let output = OutputDirs {
            original_dir: output_file
                .original_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ORIGINAL_DIR)),
            cropped_dir: output_file
                .cropped_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CROPPED_DIR)),
        };
        let timeouts = file.timeouts.unwrap_or_default();
        Ok(Self {
            camera,
            fallback_channel: camera_file.channel.unwrap_or(DEFAULT_FALLBACK_CHANNEL),
            profile_index: camera_file.profile_index.unwrap_or(DEFAULT_PROFILE_INDEX),
            crop,
            output,
            soap_timeout: Duration::from_secs(
                timeouts.soap_secs.unwrap_or(DEFAULT_SOAP_TIMEOUT_SECS),
            ),
            fetch_timeout: Duration::from_secs(
                timeouts.fetch_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("CAMSNAP_HOST") {
            if !host.trim().is_empty() {
                self.camera.host = host;
            }
        }
        if let Ok(port) = std::env::var("CAMSNAP_PORT") {
            self.camera.port = port
                .parse()
                .map_err(|_| anyhow!("CAMSNAP_PORT must be a port number"))?;
        }
        if let Ok(user) = std::env::var("CAMSNAP_USER") {
            if !user.trim().is_empty() {
                self.camera.user = user;
            }
        }
        if let Ok(password) = std::env::var("CAMSNAP_PASSWORD") {
            if !password.is_empty() {
                self.camera.password = password;
            }
        }
        if let Ok(dir) = std::env::var("CAMSNAP_ORIGINAL_DIR") {
            if !dir.trim().is_empty() {
                self.output.original_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = std::env::var("CAMSNAP_CROPPED_DIR") {
            if !dir.trim().is_empty() {
                self.output.cropped_dir = PathBuf::from(dir);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.host.trim().is_empty() {
            return Err(anyhow!("camera host must be set (file or CAMSNAP_HOST)"));
        }
        if self.camera.port == 0 {
            return Err(anyhow!("camera port must be non-zero"));
        }
        if self.camera.user.trim().is_empty() {
            return Err(anyhow!("camera user must be set (file or CAMSNAP_USER)"));
        }
        if self.soap_timeout.as_secs() == 0 || self.fetch_timeout.as_secs() == 0 {
            return Err(anyhow!("timeouts must be greater than zero"));
        }
        // Degenerate rectangles are also rejected at crop time; catching them
        // here fails the run before any network traffic.
        self.crop
            .validate_shape()
            .map_err(|e| anyhow!("config [crop]: {}", e))?;
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CaptureConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg: CaptureConfigFile = toml::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(cfg)
}
