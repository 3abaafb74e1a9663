use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `text` next to `path` first and renames it into place, so readers never see a
/// half-written report.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging_path = staging_path_for(path);
    if let Err(error) = fs::write(&staging_path, text) {
        let _ = fs::remove_file(&staging_path);
        return Err(error);
    }
    promote(&staging_path, path)
}

fn promote(staging_path: &Path, final_path: &Path) -> io::Result<()> {
    // rename does not overwrite on every platform
    match fs::remove_file(final_path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            let _ = fs::remove_file(staging_path);
            return Err(error);
        }
    }

    fs::rename(staging_path, final_path).map_err(|error| {
        let _ = fs::remove_file(staging_path);
        error
    })
}

fn staging_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("report");
    path.with_file_name(format!("{file_name}.partial"))
}
