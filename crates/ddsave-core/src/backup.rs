use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{Result, SavError};

/// Zip a save file, or a whole save directory, to `<name>_<timestamp>.zip`
/// next to it. The source is left untouched.
pub fn zip_backup(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(SavError::NotFound { path: path.to_path_buf() });
    }
    let parent = path.parent().unwrap_or(Path::new("."));
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("save");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = parent.join(format!("{}_{}.zip", name, ts));

    let file = fs::File::create(&dest)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let zerr = |e: zip::result::ZipError| SavError::Backup(e.to_string());

    if path.is_file() {
        zip.start_file(name, options).map_err(zerr)?;
        zip.write_all(&fs::read(path)?)?;
    } else {
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(|e| SavError::Backup(e.to_string()))?;
            let p = entry.path();
            let rel = p.strip_prefix(path).map_err(|e| SavError::Backup(e.to_string()))?;
            if rel.as_os_str().is_empty() {
                continue;
            }
            let rel_name = rel.to_string_lossy().replace('\\', "/");
            if p.is_dir() {
                zip.add_directory(rel_name, options).map_err(zerr)?;
            } else {
                zip.start_file(rel_name, options).map_err(zerr)?;
                zip.write_all(&fs::read(p)?)?;
            }
        }
    }
    zip.finish().map_err(zerr)?;
    log::info!("backup written to {}", dest.display());
    Ok(dest)
}
