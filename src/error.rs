//! Error taxonomy for the engine.

/// Everything that can go wrong between probing a device and drawing a frame.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No usable compute device. Terminal for the view instance.
    #[error("GPU compute unavailable: {0}")]
    CapabilityUnavailable(String),
    /// A dispatch, submission or readback failed. Swallowed per frame.
    #[error("device operation failed: {0}")]
    DeviceOperation(String),
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("view is not mounted")]
    NotMounted,
}

pub type EngineResult<T> = Result<T, EngineError>;
