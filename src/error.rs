//! Error taxonomy for the capture pipeline.
//!
//! Each variant maps to one stage of the pipeline, so a failed invocation
//! names the stage that aborted it. Nothing is recovered internally except
//! the single issued-URI -> fallback transition inside the resolver.

/// Result type alias for the capture pipeline.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Fatal capture pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Cannot establish device identity or enumerate media profiles.
    /// Raised for anything that fails before a profile token is in hand;
    /// there is no fallback at this stage.
    #[error("snapshot uri resolution failed: {0}")]
    Resolution(String),

    /// HTTP failure fetching the snapshot. Single attempt by design.
    #[error("snapshot fetch failed: {0}")]
    Fetch(String),

    /// Response body is not a decodable image.
    #[error("snapshot decode failed: {0}")]
    Decode(String),

    /// Crop rectangle is degenerate or exceeds the frame bounds.
    #[error("crop rectangle invalid: {0}")]
    Crop(String),

    /// Filesystem or encoder failure while writing an artifact.
    #[error("persist failed: {0}")]
    Persist(String),
}
