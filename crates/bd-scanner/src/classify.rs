//! File type detection and entry construction.

use bd_core::{FileEntry, UNKNOWN_TYPE, file_type_from_name};
use camino::Utf8Path;

use crate::error::ScanError;

/// Determines the file type of `path`.
///
/// The lower-cased extension wins. Extensionless files are sniffed by
/// content and get the subtype of the detected mime type (`png` for
/// `image/png`). Anything else is `"unknown"`.
///
/// # Examples
///
/// ```
/// use bd_scanner::file_type_for;
/// use camino::Utf8Path;
///
/// assert_eq!(file_type_for(Utf8Path::new("/p/Hero.BLEND")), "blend");
/// assert_eq!(file_type_for(Utf8Path::new("/p/no-such-file")), "unknown");
/// ```
#[must_use]
pub fn file_type_for(path: &Utf8Path) -> String {
    if let Some(ty) = path.file_name().and_then(file_type_from_name) {
        return ty;
    }

    infer::get_from_path(path)
        .ok()
        .flatten()
        .and_then(|kind| kind.mime_type().rsplit('/').next().map(str::to_owned))
        .unwrap_or_else(|| UNKNOWN_TYPE.to_owned())
}

/// Builds an unprocessed [`FileEntry`] for an existing file.
///
/// # Errors
///
/// Returns [`ScanError::Access`] if the file cannot be inspected or is not a
/// regular file.
pub fn entry_for_path(path: &Utf8Path) -> Result<FileEntry, ScanError> {
    let meta = path.metadata().map_err(|e| ScanError::access(path, e))?;
    if !meta.is_file() {
        return Err(ScanError::access(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let (Some(folder), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(ScanError::access(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        ));
    };

    Ok(FileEntry::new(name, folder, meta.len(), file_type_for(path)))
}
