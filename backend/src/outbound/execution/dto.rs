//! Wire types for the Piston execute endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{ExecutionOutcome, ExecutionRequest};

/// Request body for `POST /execute`.
#[derive(Debug, Serialize)]
pub(super) struct ExecuteRequestDto<'a> {
    pub language: &'a str,
    pub version: &'a str,
    pub files: Vec<FileDto<'a>>,
}

/// One submitted source file.
#[derive(Debug, Serialize)]
pub(super) struct FileDto<'a> {
    pub name: &'a str,
    pub content: &'a str,
}

impl<'a> ExecuteRequestDto<'a> {
    pub fn from_domain(request: &'a ExecutionRequest) -> Self {
        Self {
            language: request.language.as_str(),
            version: &request.version,
            files: vec![FileDto {
                name: &request.file_name,
                content: &request.content,
            }],
        }
    }
}

/// Response body for `POST /execute`. Fields the adapter does not use
/// (exit code, signal, compile stage) are ignored on decode.
#[derive(Debug, Deserialize)]
pub(super) struct ExecuteResponseDto {
    pub run: RunDto,
}

/// Captured output of the run stage.
#[derive(Debug, Default, Deserialize)]
pub(super) struct RunDto {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl ExecuteResponseDto {
    pub fn into_outcome(self) -> ExecutionOutcome {
        ExecutionOutcome {
            stdout: self.run.stdout,
            stderr: self.run.stderr,
        }
    }
}
