//! Staging of the genome FASTA/GTF inside a workspace.
//!
//! Originals are only ever opened for reading: they are copied into the
//! workspace and the reporter data is appended to the copies.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{RefbuildError, Result};
use crate::reporter::{read_reporters, write_reporter_gtf};
use crate::validate::ResourceBundle;

/// Append buffer size.
pub const CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// File name of the synthesized reporter annotation inside the workspace.
pub const REPORTER_GTF_NAME: &str = "reporters.gtf";

/// What staging did, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingReport {
    pub reporters: usize,
    pub fasta_bytes_appended: u64,
    pub gtf_bytes_appended: u64,
}

/// Append the whole of `src` onto the end of `dest`, `CHUNK_SIZE` bytes at a
/// time. Returns the number of bytes appended.
pub fn append_file(src: &Path, dest: &Path) -> Result<u64> {
    let mut input = File::open(src).map_err(RefbuildError::io_at(src))?;
    let mut output = OpenOptions::new()
        .append(true)
        .open(dest)
        .map_err(RefbuildError::io_at(dest))?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = input.read(&mut buf).map_err(RefbuildError::io_at(src))?;
        if n == 0 {
            break;
        }
        output
            .write_all(&buf[..n])
            .map_err(RefbuildError::io_at(dest))?;
        total += n as u64;
    }
    output.flush().map_err(RefbuildError::io_at(dest))?;
    Ok(total)
}

/// Copy `src` into `workspace` under its own file name.
///
/// Read failures are reported against `src`, write failures against the
/// staged copy.
fn stage_copy(src: &Path, workspace: &Path) -> Result<PathBuf> {
    let dest = workspace.join(file_name(src)?);
    File::create(&dest).map_err(RefbuildError::io_at(&dest))?;
    append_file(src, &dest)?;
    debug!("staged {} -> {}", src.display(), dest.display());
    Ok(dest)
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| {
        RefbuildError::StagingConflict(format!("{} has no file name", path.display()))
    })
}

fn check_names(bundle: &ResourceBundle) -> Result<()> {
    let fasta = file_name(&bundle.genome_fasta)?;
    let gtf = file_name(&bundle.annotation_gtf)?;
    if fasta == gtf {
        return Err(RefbuildError::StagingConflict(format!(
            "genome_fasta and annotation_gtf share the file name {}",
            fasta.to_string_lossy()
        )));
    }
    for name in [fasta, gtf] {
        if name == REPORTER_GTF_NAME {
            return Err(RefbuildError::StagingConflict(format!(
                "input file name {} is reserved for the reporter annotation",
                REPORTER_GTF_NAME
            )));
        }
    }
    Ok(())
}

/// Merge the bundle's reporter FASTA into staged copies of its genome FASTA
/// and GTF.
///
/// Returns a bundle pointing at the staged files. With no reporter FASTA the
/// input bundle is returned unchanged and nothing is written.
pub fn inject_reporters(
    bundle: &ResourceBundle,
    workspace: &Path,
) -> Result<(ResourceBundle, StagingReport)> {
    let Some(reporter_fasta) = &bundle.reporter_fasta else {
        return Ok((
            bundle.clone(),
            StagingReport {
                reporters: 0,
                fasta_bytes_appended: 0,
                gtf_bytes_appended: 0,
            },
        ));
    };
    check_names(bundle)?;

    let reporters = read_reporters(reporter_fasta)?;
    info!(
        "read {} reporter(s) from {}",
        reporters.len(),
        reporter_fasta.display()
    );

    let reporter_gtf = workspace.join(REPORTER_GTF_NAME);
    write_reporter_gtf(&reporters, &reporter_gtf)?;

    let staged_fasta = stage_copy(&bundle.genome_fasta, workspace)?;
    let fasta_bytes_appended = append_file(reporter_fasta, &staged_fasta)?;

    let staged_gtf = stage_copy(&bundle.annotation_gtf, workspace)?;
    let gtf_bytes_appended = append_file(&reporter_gtf, &staged_gtf)?;

    Ok((
        bundle.with_staged(staged_fasta, staged_gtf),
        StagingReport {
            reporters: reporters.len(),
            fasta_bytes_appended,
            gtf_bytes_appended,
        },
    ))
}
