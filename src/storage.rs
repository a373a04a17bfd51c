//! Output file placement.
//!
//! Encoded bytes go to an anonymous temp file in the output directory and are
//! renamed to their final `<prefix>_<id>.jpg` name only once the encoder has
//! finished. A failed encode therefore never leaves a partial file under a
//! name a caller could pick up; the temp file is removed when dropped.

use crate::imaging::{ImagingError, OutputTarget};
use crate::naming::{fresh_output_name, parse_output_name};
use image::ImageResult;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

/// A file that landed in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Write a new output file through `write`, publishing it atomically.
///
/// Errors from directory creation, the writer, or the final rename are all
/// reported as [`ImagingError::Encode`] against the intended final path.
pub fn write_output<F>(target: &OutputTarget, write: F) -> Result<StoredFile, ImagingError>
where
    F: FnOnce(&mut dyn Write) -> ImageResult<()>,
{
    let path = target.directory.join(fresh_output_name(&target.prefix));
    let encode_error = |reason: String| ImagingError::Encode {
        path: path.clone(),
        reason,
    };

    fs::create_dir_all(&target.directory)
        .map_err(|e| encode_error(format!("cannot create output directory: {e}")))?;
    let mut tmp = temp_file_in(&target.directory).map_err(|e| encode_error(e.to_string()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(|e| encode_error(e.to_string()))?;
        writer.flush().map_err(|e| encode_error(e.to_string()))?;
    }

    let file = tmp
        .persist_noclobber(&path)
        .map_err(|e| encode_error(e.error.to_string()))?;
    let size_bytes = file
        .metadata()
        .map_err(|e| encode_error(e.to_string()))?
        .len();

    debug!(path = %path.display(), size_bytes, "output persisted");
    Ok(StoredFile { path, size_bytes })
}

/// Create the staging file with the mode a plain `File::create` would get.
///
/// `tempfile` defaults to 0600 on Unix; outputs are ordinary files, so ask for
/// 0666 and let the process umask trim it.
fn temp_file_in(directory: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(directory)
}

/// Delete every produced file under `prefix` in `directory`.
///
/// Only names that parse as `<prefix>_<uuid>.jpg` are touched. A missing
/// directory counts as empty. Returns how many files were removed.
pub fn purge_outputs(directory: &Path, prefix: &str) -> io::Result<usize> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let matches = name
            .to_str()
            .and_then(parse_output_name)
            .is_some_and(|parsed| parsed.prefix == prefix);
        if matches && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    info!(directory = %directory.display(), prefix, removed, "purged outputs");
    Ok(removed)
}
