use thiserror::Error;

#[derive(Debug, Error)]
pub enum PmError {
    #[error("validation error for {field} '{value}': {message}")]
    Validation {
        field: String,
        value: String,
        message: String,
    },

    #[error("pm {op} {name}: work item not found")]
    NotFound { op: &'static str, name: String },

    #[error("cannot advance {item} from {current} to {target}: {reason}")]
    Phase {
        item: String,
        current: String,
        target: String,
        reason: String,
    },

    #[error("pm {op} {name}: {source}")]
    Storage {
        op: &'static str,
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command}: {message}")]
    Vcs { command: String, message: String },

    #[error("invalid config value for {key} '{value}': {message}")]
    Config {
        key: String,
        value: String,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl PmError {
    pub fn validation(
        field: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        PmError::Validation {
            field: field.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    pub fn storage(op: &'static str, name: impl Into<String>, source: std::io::Error) -> Self {
        PmError::Storage {
            op,
            name: name.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PmError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, PmError>;
