//! Builder command construction and execution.
//!
//! The builder is run directly from an argument vector, never through a
//! shell, so genome names and paths need no quoting.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use log::info;

use crate::error::{RefbuildError, Result};
use crate::validate::ResourceBundle;

/// Builder used when none is configured.
pub const DEFAULT_BUILDER: &str = "cellranger mkref";

/// A fully-resolved builder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    /// Build the invocation for `bundle`.
    ///
    /// `builder` is split on whitespace: the first word is the executable,
    /// the rest lead the argument list (e.g. `cellranger mkref`). Any
    /// `extra_args` follow, then the reference flags.
    pub fn from_bundle(builder: &str, extra_args: &[String], bundle: &ResourceBundle) -> Result<Self> {
        let mut words = builder.split_whitespace().map(str::to_string);
        let program = words.next().ok_or_else(|| RefbuildError::EmptyBuilder {
            builder: builder.to_string(),
        })?;

        let mut args: Vec<String> = words.collect();
        args.extend(extra_args.iter().cloned());
        args.push(format!("--genome={}", bundle.genome_name));
        args.push(flag_path("--fasta", &bundle.genome_fasta));
        args.push(flag_path("--genes", &bundle.annotation_gtf));
        args.push(format!("--nthreads={}", bundle.threads));
        args.push(format!("--memgb={}", bundle.memory));

        Ok(BuildCommand { program, args })
    }

    /// Run the builder, inheriting stdout/stderr, and wait for it to finish.
    ///
    /// # Errors
    /// `ToolNotFound` if the executable cannot be found, `ExternalToolFailure`
    /// if it exits non-zero or is killed.
    pub fn run(&self) -> Result<()> {
        info!("running: {}", self);
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    RefbuildError::ToolNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    RefbuildError::Io(e)
                }
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(RefbuildError::ExternalToolFailure {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

fn flag_path(flag: &str, path: &Path) -> String {
    format!("{}={}", flag, path.display())
}

/// Shell-like rendering for logs. Words containing whitespace or quotes are
/// single-quoted.
impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(word: &str) -> String {
    if word.is_empty() || word.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", word.replace('\'', r"'\''"))
    } else {
        word.to_string()
    }
}
