// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a call to one of the backend collaborators.
///
/// Transport failures and server rejections stay distinguishable so callers
/// can tell "the backend is unreachable" from "the backend said no".
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused, reset...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("rejected by server ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// A 2xx response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// A well-formed response that carried nothing usable.
    #[error("empty result")]
    Empty,
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }

    /// HTTP status of a rejection, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Rejected {
                status,
                message: err.to_string(),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
