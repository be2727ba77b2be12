//! Workspace allocation.
//!
//! Each run gets a fresh directory named after the wall clock. Creation goes
//! through `fs::create_dir`, which refuses to reuse an existing path, so a
//! collision is detected atomically and retried with a random suffix.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use rand::{Rng, thread_rng};

use crate::error::{RefbuildError, Result};

/// Total number of names tried before giving up.
pub const MAX_ATTEMPTS: usize = 16;

const PREFIX: &str = "refbuild";

/// Create a new, empty workspace directory under `base`.
///
/// `base` must already exist. The returned directory is not removed when
/// the run ends.
pub fn allocate(base: &Path) -> Result<PathBuf> {
    let mut rng = thread_rng();
    allocate_from(base, &timestamp_stem(), || format!("{:08x}", rng.r#gen::<u32>()))
}

/// Try `stem`, then `stem_<suffix>` with a fresh suffix per attempt, until a
/// directory is created or `MAX_ATTEMPTS` names have been tried.
fn allocate_from(
    base: &Path,
    stem: &str,
    mut suffix: impl FnMut() -> String,
) -> Result<PathBuf> {
    for attempt in 0..MAX_ATTEMPTS {
        let name = if attempt == 0 {
            stem.to_string()
        } else {
            format!("{}_{}", stem, suffix())
        };
        let candidate = base.join(name);

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("workspace {} already exists, retrying", candidate.display());
            }
            Err(e) => return Err(RefbuildError::io_at(candidate)(e)),
        }
    }

    Err(RefbuildError::WorkspaceExhausted {
        base: base.to_path_buf(),
        attempts: MAX_ATTEMPTS,
    })
}

fn timestamp_stem() -> String {
    // A clock before 1970 only costs us uniqueness, which the retry covers.
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}_{}_{:09}", PREFIX, now.as_secs(), now.subsec_nanos())
}
