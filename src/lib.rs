//! camsnap - single-shot IP camera snapshot capture.
//!
//! One invocation walks a fixed sequence:
//! 1. Resolve a snapshot URL from the camera's ONVIF device and media
//!    services, falling back to the vendor ISAPI picture path if the
//!    snapshot-URI request fails.
//! 2. Fetch the image over HTTP with digest authentication and a bounded
//!    timeout, decoding to an RGB raster.
//! 3. Persist the full frame and a configured crop under one shared
//!    timestamp token, as JPEG at quality 95.
//!
//! There is no retry, no looping, and no state across invocations; the tool
//! is re-invoked externally (e.g. from cron) and downstream scripts pick up
//! the emitted files by filename convention.

pub mod capture;
pub mod config;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod onvif;
pub mod persist;

pub use capture::{run_capture, CaptureReport};
pub use config::CaptureConfig;
pub use error::CaptureError;
pub use onvif::{CameraEndpoint, OnvifClient, SnapshotUri, UriProvenance};
pub use persist::{CropRect, OutputDirs};
