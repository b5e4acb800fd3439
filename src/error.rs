use std::error::Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotepadError {
    #[error("RequestFailed: {action} returned HTTP {status}")]
    RequestFailed { action: &'static str, status: u16 },

    #[error("UpdateFailed: update returned HTTP {status}")]
    UpdateFailed { status: u16 },

    #[error("EmptyOrMalformedBody: {action}: {reason}")]
    EmptyOrMalformedBody { action: &'static str, reason: String },

    #[error("InvalidDetailResponse: notepad detail is missing data.notepad")]
    InvalidDetailResponse,

    #[error("NotepadNotFound: no notepad titled {0:?}")]
    NotepadNotFound(String),

    #[error("DuplicateWord: {0:?} is already in the notepad")]
    DuplicateWord(String),

    #[error("EmptyWord")]
    EmptyWord,

    #[error("MissingOption: {0}")]
    MissingOption(&'static str),

    #[error("Transport: {0}")]
    Transport(#[from] reqwest::Error),
}

impl NotepadError {
    pub fn malformed(action: &'static str, reason: impl ToString) -> Self {
        NotepadError::EmptyOrMalformedBody {
            action,
            reason: reason.to_string(),
        }
    }
}

pub type NotepadResult<T> = Result<T, NotepadError>;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
