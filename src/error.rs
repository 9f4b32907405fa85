use serde::Serialize;

use crate::flow::Page;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub field: String,
    pub issue: String,
}

impl ErrorDetail {
    pub fn new(field: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: issue.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("quiz settings not found in storage")]
    SettingsMissing,
    #[error("quiz results not found in storage")]
    ResultsMissing,
    #[error("no questions available for subjects {subjects:?}")]
    NoQuestionsAvailable { subjects: Vec<String> },
    #[error("quiz settings are invalid")]
    InvalidSettings { details: Vec<ErrorDetail> },
    #[error("failed to write `{key}` to storage: {source}")]
    StorageWriteFailure {
        key: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("stored `{key}` is corrupt: {message}")]
    StorageReadCorrupt { key: &'static str, message: String },
    #[error("result record is invalid")]
    InvalidResultRecord { details: Vec<ErrorDetail> },
    #[error("question store is unavailable: {message}")]
    StoreUnavailable {
        message: String,
        details: Vec<ErrorDetail>,
    },
}

impl QuizError {
    pub fn code(&self) -> &'static str {
        match self {
            QuizError::SettingsMissing => "SETTINGS_MISSING",
            QuizError::ResultsMissing => "RESULTS_MISSING",
            QuizError::NoQuestionsAvailable { .. } => "NO_QUESTIONS_AVAILABLE",
            QuizError::InvalidSettings { .. } => "VALIDATION_ERROR",
            QuizError::StorageWriteFailure { .. } => "STORAGE_WRITE_FAILURE",
            QuizError::StorageReadCorrupt { .. } => "STORAGE_READ_CORRUPT",
            QuizError::InvalidResultRecord { .. } => "INVALID_RESULT_RECORD",
            QuizError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
        }
    }

    pub fn details(&self) -> &[ErrorDetail] {
        match self {
            QuizError::InvalidSettings { details }
            | QuizError::InvalidResultRecord { details }
            | QuizError::StoreUnavailable { details, .. } => details,
            _ => &[],
        }
    }

    /// Storage write failures are the only recoverable kind: the caller warns
    /// and keeps navigating.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, QuizError::StorageWriteFailure { .. })
    }

    /// Page a fatal error sends the user to, `None` when the current page
    /// should render an inline error state instead.
    pub fn redirect(&self) -> Option<Page> {
        match self {
            QuizError::SettingsMissing
            | QuizError::NoQuestionsAvailable { .. }
            | QuizError::InvalidSettings { .. } => Some(Page::Setup),
            QuizError::StorageReadCorrupt { key, .. } if *key == crate::storage::SETTINGS_KEY => {
                Some(Page::Setup)
            }
            _ => None,
        }
    }
}
