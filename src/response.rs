//! Status envelope around a comparison result.
//!
//! Callers that exchange diffs with other services wrap them as
//! `{"status": "SUCCESS" | "ERROR", "message": ..., "data": <tree> | null}`.

use crate::diff::DiffTree;
use crate::error::DiffError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    pub data: Option<DiffTree>,
}

impl Response {
    pub fn success(data: DiffTree) -> Self {
        Self {
            status: Status::Success,
            message: "Successfully found difference".to_string(),
            data: Some(data),
        }
    }

    pub fn failure(error: &DiffError) -> Self {
        Self {
            status: Status::Error,
            message: format!("Comparison failed: {}", error),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl From<Result<DiffTree, DiffError>> for Response {
    fn from(result: Result<DiffTree, DiffError>) -> Self {
        match result {
            Ok(tree) => Self::success(tree),
            Err(error) => Self::failure(&error),
        }
    }
}
