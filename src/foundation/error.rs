/// Convenience result type used across reelpress.
pub type ReelpressResult<T> = Result<T, ReelpressError>;

/// Top-level error taxonomy used by compositing and export APIs.
///
/// Only a subset of these ever reaches an `export` caller: asset decode failures are absorbed by
/// the compositor into per-frame warnings, and engine initialisation failures are absorbed by the
/// engine factory while it walks its fallback chain.
#[derive(thiserror::Error, Debug)]
pub enum ReelpressError {
    /// Invalid user-provided timeline or export settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating timeline state or rendering a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A single element's source could not produce a raster.
    #[error("asset decode error for element '{element}': {message}")]
    AssetDecode {
        /// Id of the element that was skipped.
        element: String,
        /// Underlying decoder message.
        message: String,
    },

    /// An export engine failed its capability probe or constructor.
    #[error("engine '{engine}' failed to initialise: {message}")]
    EngineInit {
        /// Engine label.
        engine: String,
        /// Reason reported by the probe or constructor.
        message: String,
    },

    /// The external encoder exited unsuccessfully.
    #[error("encoder process failed ({}): {diagnostics}", status_label(.status))]
    EncodeProcess {
        /// Exit code when the process terminated normally.
        status: Option<i32>,
        /// Captured stderr of the encoder.
        diagnostics: String,
    },

    /// Another export is already running on the same session manager.
    #[error("an export is already in progress")]
    ExportInProgress,

    /// The export was aborted through its abort signal.
    #[error("export cancelled")]
    Cancelled,

    /// Every engine candidate failed to initialise.
    #[error("no usable export engine: {}", .attempts.join("; "))]
    NoUsableEngine {
        /// One message per rejected candidate, in probe order.
        attempts: Vec<String>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelpressError {
    /// Build a [`ReelpressError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelpressError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelpressError::AssetDecode`] value.
    pub fn asset_decode(element: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::AssetDecode {
            element: element.into(),
            message: msg.into(),
        }
    }

    /// Build a [`ReelpressError::EngineInit`] value.
    pub fn engine_init(engine: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::EngineInit {
            engine: engine.into(),
            message: msg.into(),
        }
    }

    /// Build a [`ReelpressError::EncodeProcess`] value.
    pub fn encode_process(status: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::EncodeProcess {
            status,
            diagnostics: diagnostics.into(),
        }
    }

    /// Return `true` for [`ReelpressError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Return `true` when the error terminates an export job.
    ///
    /// Cancellation is not a failure, and asset decode and engine init errors are recoverable
    /// inside the crate.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Cancelled | Self::AssetDecode { .. } | Self::EngineInit { .. }
        )
    }
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
