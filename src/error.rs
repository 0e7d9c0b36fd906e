//! Error types for wavmix
//!
//! Defines engine-wide error types using thiserror for clear error propagation.
//! Variants fall into four groups: asset errors (catalog and container
//! parsing), usage errors (caller mistakes), device errors (translated from
//! the device's accumulated fault flags), and file I/O.

use thiserror::Error;

/// Main error type for wavmix
#[derive(Error, Debug)]
pub enum Error {
    /// Named asset does not exist in the catalog
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Same file name appears twice across the asset directories
    #[error("Duplicate asset name: {0}")]
    DuplicateAsset(String),

    /// Container header could not be parsed
    #[error("Malformed WAV container: {0}")]
    MalformedContainer(String),

    /// PCM layout is not one of mono/stereo x 8/16-bit
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Streaming slot index is outside the fixed slot array
    #[error("Stream slot {0} out of range")]
    SlotOutOfRange(usize),

    /// Operation requires a bound track on the slot
    #[error("Stream slot {0} has no track bound")]
    SlotNotBound(usize),

    /// Listener gain outside [0.0, 1.0]
    #[error("Volume {0} outside [0.0, 1.0]")]
    VolumeOutOfRange(f32),

    /// Device reported fault flags after an operation
    #[error("Device error during {operation}: {faults}")]
    Device {
        operation: &'static str,
        faults: String,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the wavmix Error
pub type Result<T> = std::result::Result<T, Error>;
