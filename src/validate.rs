//! Argument validation.
//!
//! Turns the raw strings handed over by the CLI into a [`ResourceBundle`].
//! Nothing here touches the filesystem beyond existence checks.

use std::path::{Path, PathBuf};

use crate::error::{RefbuildError, Result};

/// Unvalidated inputs, exactly as they arrived on the command line.
#[derive(Debug, Clone)]
pub struct RawArgs {
    pub threads: String,
    pub memory: String,
    pub genome_name: String,
    pub genome_fasta: PathBuf,
    pub annotation_gtf: PathBuf,
    pub reporter_fasta: Option<PathBuf>,
}

/// Validated inputs for one reference build.
///
/// `threads` and `memory` are checked to be integers but keep their original
/// string form, since they are only ever forwarded to the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBundle {
    pub threads: String,
    pub memory: String,
    pub genome_name: String,
    pub genome_fasta: PathBuf,
    pub annotation_gtf: PathBuf,
    pub reporter_fasta: Option<PathBuf>,
}

impl ResourceBundle {
    /// Same bundle, pointing at different FASTA/GTF files.
    pub fn with_staged(&self, genome_fasta: PathBuf, annotation_gtf: PathBuf) -> Self {
        ResourceBundle {
            genome_fasta,
            annotation_gtf,
            ..self.clone()
        }
    }
}

/// Validate `raw`, returning the first problem found.
///
/// Fields are checked in order: threads, memory, genome_fasta,
/// annotation_gtf, reporter_fasta.
pub fn validate(raw: RawArgs) -> Result<ResourceBundle> {
    check_integer("threads", &raw.threads)?;
    check_integer("memory", &raw.memory)?;
    check_exists("genome_fasta", &raw.genome_fasta)?;
    check_exists("annotation_gtf", &raw.annotation_gtf)?;
    if let Some(reporters) = &raw.reporter_fasta {
        check_exists("reporter_fasta", reporters)?;
    }

    Ok(ResourceBundle {
        threads: raw.threads,
        memory: raw.memory,
        genome_name: raw.genome_name,
        genome_fasta: raw.genome_fasta,
        annotation_gtf: raw.annotation_gtf,
        reporter_fasta: raw.reporter_fasta,
    })
}

fn check_integer(field: &'static str, value: &str) -> Result<()> {
    value
        .trim()
        .parse::<i64>()
        .map(|_| ())
        .map_err(|_| RefbuildError::InvalidNumeric {
            field,
            value: value.to_string(),
        })
}

fn check_exists(field: &'static str, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(RefbuildError::MissingResource {
            field,
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn raw_in(dir: &Path) -> RawArgs {
        let fasta = dir.join("g.fa");
        let gtf = dir.join("g.gtf");
        fs::write(&fasta, ">chr1\nACGT\n").unwrap();
        fs::write(&gtf, "").unwrap();
        RawArgs {
            threads: "4".into(),
            memory: "16".into(),
            genome_name: "test".into(),
            genome_fasta: fasta,
            annotation_gtf: gtf,
            reporter_fasta: None,
        }
    }

    #[test]
    fn accepts_valid_args() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_in(dir.path());
        let bundle = validate(raw.clone()).unwrap();
        assert_eq!(bundle.threads, "4");
        assert_eq!(bundle.genome_fasta, raw.genome_fasta);
    }

    #[test]
    fn keeps_numeric_strings_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_in(dir.path());
        raw.threads = " 8".into();
        raw.memory = "-3".into();
        let bundle = validate(raw).unwrap();
        assert_eq!(bundle.threads, " 8");
        assert_eq!(bundle.memory, "-3");
    }

    #[test]
    fn rejects_non_integer_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_in(dir.path());
        raw.memory = "16G".into();
        match validate(raw) {
            Err(RefbuildError::InvalidNumeric { field, value }) => {
                assert_eq!(field, "memory");
                assert_eq!(value, "16G");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_reporter_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_in(dir.path());
        raw.reporter_fasta = Some(dir.path().join("absent.fa"));
        match validate(raw) {
            Err(RefbuildError::MissingResource { field, .. }) => {
                assert_eq!(field, "reporter_fasta")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn numeric_checked_before_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = raw_in(dir.path());
        raw.threads = "four".into();
        raw.genome_fasta = dir.path().join("absent.fa");
        assert!(matches!(
            validate(raw),
            Err(RefbuildError::InvalidNumeric { field: "threads", .. })
        ));
    }
}
