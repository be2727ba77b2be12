//! Error types for refbuild

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for refbuild operations
pub type Result<T> = std::result::Result<T, RefbuildError>;

/// Everything that can abort a run.
#[derive(Debug, Error)]
pub enum RefbuildError {
    /// A required path argument does not exist on disk
    #[error("{field} does not exist: {}", path.display())]
    MissingResource {
        /// Argument name, e.g. `genome_fasta`
        field: &'static str,
        /// Path as supplied on the command line
        path: PathBuf,
    },

    /// A numeric argument is not an integer
    #[error("{field} must be an integer, got '{value}'")]
    InvalidNumeric {
        /// Argument name, e.g. `threads`
        field: &'static str,
        /// Value as supplied on the command line
        value: String,
    },

    /// Reporter FASTA could not be interpreted
    #[error("Invalid FASTA format at line {line}: {msg}")]
    MalformedInput {
        /// 1-based line number
        line: usize,
        /// Error message
        msg: String,
    },

    /// A staged file would overwrite another staged file
    #[error("staging conflict: {0}")]
    StagingConflict(String),

    /// Every workspace candidate name was already taken
    #[error("could not allocate a workspace under {} after {attempts} attempts", base.display())]
    WorkspaceExhausted { base: PathBuf, attempts: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path
    #[error("I/O error on {}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The builder command has no executable
    #[error("builder command is empty: '{builder}'")]
    EmptyBuilder { builder: String },

    /// The builder executable could not be found
    #[error("builder executable not found: {program}")]
    ToolNotFound { program: String },

    /// The builder ran but did not exit cleanly
    #[error("{program} exited with {}", describe_exit(code))]
    ExternalToolFailure { program: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl RefbuildError {
    /// Attach `path` to an I/O error.
    pub fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RefbuildError::IoAt { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resource_names_field_and_path() {
        let e = RefbuildError::MissingResource {
            field: "genome_fasta",
            path: PathBuf::from("/nope/g.fa"),
        };
        let msg = e.to_string();
        assert!(msg.contains("genome_fasta"));
        assert!(msg.contains("/nope/g.fa"));
    }

    #[test]
    fn external_failure_reports_code_or_signal() {
        let e = RefbuildError::ExternalToolFailure {
            program: "cellranger".into(),
            code: Some(2),
        };
        assert_eq!(e.to_string(), "cellranger exited with status 2");

        let e = RefbuildError::ExternalToolFailure {
            program: "cellranger".into(),
            code: None,
        };
        assert!(e.to_string().contains("signal"));
    }
}
