use std::fmt;

use thiserror::Error;

use crate::model::ModelKind;

/// Which textual link attribute failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Bandwidth,
    Delay,
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkField::Bandwidth => write!(f, "bandwidth"),
            LinkField::Delay => write!(f, "delay"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BaselineError {
    /// A capacity or delay string could not be turned into a positive number.
    #[error("link {src}-{dst}: malformed {field} {raw:?}")]
    Parse {
        src: u32,
        dst: u32,
        field: LinkField,
        raw: String,
    },
    /// The topology cannot back a model instance.
    #[error("invalid topology: {0}")]
    ModelInit(String),
    /// A model failed while evaluating a demand set.
    #[error("{model} failed: {reason}")]
    ModelExecution { model: ModelKind, reason: String },
    #[error("unknown model {0:?}")]
    UnknownModel(String),
}

impl BaselineError {
    pub fn execution(model: ModelKind, reason: impl Into<String>) -> Self {
        Self::ModelExecution {
            model,
            reason: reason.into(),
        }
    }
}

