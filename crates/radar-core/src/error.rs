use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process unavailable: {0}")]
    ProcessUnavailable(String),

    #[error("Module not mapped: {0}")]
    ModuleNotMapped(String),

    #[error("Malformed ELF image at {base:#x}: {message}")]
    MalformedImage { base: u64, message: String },

    #[error("Exported symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Pattern is {pattern} bytes, mask is {mask} bytes")]
    PatternMaskMismatch { pattern: usize, mask: usize },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Registry entry not found: {0}")]
    RegistryEntryNotFound(String),

    #[error("Offset resolution incomplete, missing: {}", missing.join(", "))]
    OffsetResolutionIncomplete { missing: Vec<&'static str> },

    #[error("No entity at handle {0:#x}")]
    InvalidHandle(u32),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Resolution failed while resolving {stage}: {source}")]
    ResolutionFailed {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(base: u64, message: impl Into<String>) -> Self {
        Error::MalformedImage {
            base,
            message: message.into(),
        }
    }

    /// Check if this error means the target process is gone or unreachable
    pub fn is_process_gone(&self) -> bool {
        match self {
            Error::ProcessUnavailable(_) => true,
            Error::ResolutionFailed { source, .. } => source.is_process_gone(),
            _ => false,
        }
    }
}

/// Attach the name of a resolution stage to a failure.
pub(crate) trait StageContext<T> {
    fn stage(self, stage: &'static str) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|source| match source {
            wrapped @ Error::ResolutionFailed { .. } => wrapped,
            other => Error::ResolutionFailed {
                stage,
                source: Box::new(other),
            },
        })
    }
}
