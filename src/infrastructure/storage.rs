// ============================================================
// STORAGE
// ============================================================
// Upload directory layout: one directory per session under the configured
// root. Nothing here knows about formats or sessions beyond their ids.

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn ensure_upload_root(upload_root: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(upload_root)?;
    Ok(upload_root.to_path_buf())
}

pub fn ensure_session_dir(upload_root: &Path, session_id: Uuid) -> std::io::Result<PathBuf> {
    let session_dir = upload_root.join(session_id.to_string());
    ensure_dir(&session_dir)?;
    Ok(session_dir)
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
