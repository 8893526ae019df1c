//! ZIP bundles of a manifest and its echo log.

use crate::error::{ModelError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default bundle location: `<manifest-stem>_bundle.zip` in the working directory.
pub fn default_bundle_path(manifest_path: &Path) -> PathBuf {
    let stem = manifest_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "glyph".to_string());
    PathBuf::from(format!("{stem}_bundle.zip"))
}

/// Package a manifest and optional echo log into a deflated ZIP archive.
///
/// Both files are stored under their base names with no directory prefix.
/// A partially written archive is removed if packaging fails.
pub fn export_bundle(
    manifest_path: &Path,
    echo_log_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<PathBuf> {
    let mut sources = vec![(manifest_path, "manifest")];
    if let Some(log) = echo_log_path {
        sources.push((log, "echo log"));
    }
    for (path, kind) in &sources {
        if !path.is_file() {
            return Err(ModelError::NotFound {
                kind: *kind,
                path: path.to_path_buf(),
            });
        }
    }

    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_bundle_path(manifest_path));

    if let Err(err) = write_archive(&output, &sources) {
        fs::remove_file(&output).ok();
        return Err(err);
    }
    info!(bundle = %output.display(), files = sources.len(), "bundle written");
    Ok(output)
}

fn write_archive(output: &Path, sources: &[(&Path, &'static str)]) -> Result<()> {
    let io_err = |source| ModelError::Io {
        path: output.to_path_buf(),
        source,
    };
    let zip_err = |source| ModelError::Archive {
        path: output.to_path_buf(),
        source,
    };

    let file = File::create(output).map_err(io_err)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, _) in sources {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(entry = %name, bytes = bytes.len(), "adding bundle entry");
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(&bytes).map_err(io_err)?;
    }
    zip.finish().map_err(zip_err)?;
    Ok(())
}
