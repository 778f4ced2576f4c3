use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),
}

/// Recoverable conversion failures.
///
/// The `Display` text is what the UI shows verbatim; none of these is fatal.
///
/// # Example
/// ```
/// use aimg_core::error::ConvertError;
/// let err = ConvertError::InvalidConfig("max output size must be > 0".into());
/// assert_eq!(err.to_string(), "Invalid configuration: max output size must be > 0");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Non-positive output size or frame rate.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Zero-dimension or unreadable source frame.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// A destination surface is missing or was detached by its owner.
    #[error("Render target unavailable: {0}")]
    RenderTargetUnavailable(String),

    /// `convert` was called before the process-wide engine setup.
    #[error("Conversion engine not initialized (call init() first)")]
    NotInitialized,
}

/// Frame capture failures reported by a [`crate::traits::VideoSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Expected while seeking, restarting or tearing down. Swallowed by the scheduler.
    #[error("Capture transitoire : {0}")]
    Transient(String),

    /// Anything else. Logged by the scheduler, which keeps running.
    #[error("Échec de capture : {0}")]
    Fault(String),
}

/// Failures raised by a [`crate::traits::RenderTarget`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The owner tore the surface down.
    #[error("surface detached")]
    Detached,

    /// The surface rejected the operation (bad size, bad buffer).
    #[error("surface rejected the operation: {0}")]
    Invalid(String),
}
