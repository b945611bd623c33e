//! Project archive creation.
//!
//! The finished project directory becomes one `.tar.gz`. The archive is
//! written under a temporary sibling name and renamed into place, so the
//! final path either holds a complete archive or nothing.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::error::PackageError;

/// Top-level project entries left out of the archive.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".next"];

/// A finished archive on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArchive {
    pub path: PathBuf,
    pub size: u64,
    /// Lowercase hex SHA-256 of the archive bytes.
    pub sha256: String,
    /// Number of files stored.
    pub files: usize,
}

/// Archive `project_dir` into `archive_path`.
///
/// Entries are stored under `prefix/`. `output_dir` must exist; it is the
/// build tool's output and an archive without it is useless.
pub async fn package_project(
    project_dir: &Path,
    output_dir: &Path,
    archive_path: &Path,
    prefix: &str,
) -> Result<PackagedArchive, PackageError> {
    if !tokio::fs::metadata(output_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(PackageError::MissingOutput(output_dir.to_path_buf()));
    }

    let project_dir = project_dir.to_path_buf();
    let archive_path = archive_path.to_path_buf();
    let prefix = prefix.to_string();
    tokio::task::spawn_blocking(move || write_archive(&project_dir, &archive_path, &prefix))
        .await
        .map_err(|e| PackageError::Join(e.to_string()))?
}

fn write_archive(
    project_dir: &Path,
    archive_path: &Path,
    prefix: &str,
) -> Result<PackagedArchive, PackageError> {
    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent).map_err(io_at(parent))?;
    }
    let partial = partial_path(archive_path);

    let written = match create_archive(project_dir, &partial, prefix) {
        Ok(written) => written,
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            return Err(e);
        }
    };

    if let Err(source) = std::fs::rename(&partial, archive_path) {
        let _ = std::fs::remove_file(&partial);
        return Err(PackageError::Io {
            path: archive_path.to_path_buf(),
            source,
        });
    }

    tracing::debug!(
        archive = %archive_path.display(),
        files = written.files,
        size = written.size,
        "archive written"
    );
    Ok(PackagedArchive {
        path: archive_path.to_path_buf(),
        size: written.size,
        sha256: written.sha256,
        files: written.files,
    })
}

/// `dir/name.tar.gz` → `dir/.name.tar.gz.partial`.
fn partial_path(archive_path: &Path) -> PathBuf {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    archive_path.with_file_name(format!(".{}.partial", name))
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError {
    let path = path.to_path_buf();
    move |source| PackageError::Io { path, source }
}

struct Written {
    files: usize,
    size: u64,
    sha256: String,
}

/// Feeds every byte written through to a SHA-256 digest.
struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    size: u64,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        HashingWriter {
            inner,
            hasher: Sha256::new(),
            size: 0,
        }
    }

    fn finish(mut self) -> std::io::Result<(u64, String)> {
        self.inner.flush()?;
        Ok((self.size, hex(&self.hasher.finalize())))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn create_archive(project_dir: &Path, archive_path: &Path, prefix: &str) -> Result<Written, PackageError> {
    let archive_file = std::fs::File::create(archive_path).map_err(io_at(archive_path))?;
    let gz = GzEncoder::new(HashingWriter::new(archive_file), Compression::default());
    let mut tar = tar::Builder::new(gz);

    let files = add_dir(&mut tar, project_dir, prefix, true)?;

    let (size, sha256) = tar
        .into_inner()
        .map_err(io_at(archive_path))?
        .finish()
        .map_err(io_at(archive_path))?
        .finish()
        .map_err(io_at(archive_path))?;
    Ok(Written { files, size, sha256 })
}

/// Recursively add a directory under `archive_prefix`. Returns the number of
/// files added.
fn add_dir<W: Write>(
    tar: &mut tar::Builder<W>,
    dir: &Path,
    archive_prefix: &str,
    top_level: bool,
) -> Result<usize, PackageError> {
    let read_dir = std::fs::read_dir(dir).map_err(io_at(dir))?;
    let mut entries = read_dir
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_at(dir))?;
    entries.sort_by_key(|e| e.file_name());

    let mut files = 0;
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if top_level && EXCLUDED_DIRS.contains(&name.as_str()) {
            continue;
        }
        let archive_path = format!("{}/{}", archive_prefix, name);

        if path.is_dir() {
            files += add_dir(tar, &path, &archive_path, false)?;
        } else if path.is_file() {
            let mut file = std::fs::File::open(&path).map_err(io_at(&path))?;
            let metadata = file.metadata().map_err(io_at(&path))?;

            // append_data writes a GNU long-name record for paths over 100 bytes.
            let mut header = tar::Header::new_gnu();
            header.set_metadata(&metadata);
            tar.append_data(&mut header, &archive_path, &mut file)
                .map_err(io_at(&path))?;
            files += 1;
        }
    }
    Ok(files)
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
