use std::fmt;
use thiserror::Error;

/// Which translation backend produced a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Generative-language backend used by the structured translator
    Generative,
    /// Plain-text machine translation backend
    Machine,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Generative => write!(f, "Generative"),
            Backend::Machine => write!(f, "Machine translation"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{backend} backend error: {message}")]
    Backend { backend: Backend, message: String },

    #[error("Source document not found: {0}")]
    SourceNotFound(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Extension not found: {0}")]
    ExtensionNotFound(String),
}

impl LensError {
    pub fn generative<S: Into<String>>(message: S) -> Self {
        LensError::Backend {
            backend: Backend::Generative,
            message: message.into(),
        }
    }

    pub fn machine<S: Into<String>>(message: S) -> Self {
        LensError::Backend {
            backend: Backend::Machine,
            message: message.into(),
        }
    }

    /// True when this is a fault raised by the given backend
    pub fn is_backend(&self, which: Backend) -> bool {
        matches!(self, LensError::Backend { backend, .. } if *backend == which)
    }
}

pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_classification() {
        let err = LensError::generative("quota exceeded");
        assert!(err.is_backend(Backend::Generative));
        assert!(!err.is_backend(Backend::Machine));
        assert_eq!(err.to_string(), "Generative backend error: quota exceeded");

        let err = LensError::Config("missing".to_string());
        assert!(!err.is_backend(Backend::Generative));
    }
}
