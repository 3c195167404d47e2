use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriftError {
    #[error("habitat set is empty: {context}")]
    EmptyHabitat { context: &'static str },

    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl DriftError {
    pub(crate) fn option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriftError>;
