//! Archive extraction for downloaded release assets.
//!
//! Formats are dispatched on the normalized file extension:
//!
//! | Extension              | Format         | Handled by                  |
//! |------------------------|----------------|-----------------------------|
//! | `.zip`                 | ZIP            | `zip` crate, in-process     |
//! | `.tar`                 | tar            | `tar` crate, in-process     |
//! | `.tar.gz`, `.tgz`      | gzipped tar    | `flate2` + `tar`            |
//! | `.gz`                  | gzip (1 file)  | `flate2`                    |
//! | `.rar`                 | RAR            | external `unrar` process    |
//!
//! Anything else is rejected with [`ManagerError::UnsupportedArchive`]
//! before the destination is touched.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};
use std::process::{Command, Stdio};

use flate2::read::MultiGzDecoder;
use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};

/// Default external tool used for RAR archives.
pub const DEFAULT_UNRAR_TOOL: &str = "unrar";

/// Extension table, longest suffixes first.
const EXTENSIONS: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".tar", ArchiveFormat::Tar),
    (".gz", ArchiveFormat::Gzip),
    (".zip", ArchiveFormat::Zip),
    (".rar", ArchiveFormat::Rar),
];

/// Archive formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// ZIP container.
    Zip,
    /// Uncompressed tarball.
    Tar,
    /// Gzip-compressed tarball.
    TarGz,
    /// A single gzip-compressed file.
    Gzip,
    /// RAR container, unpacked by an external tool.
    Rar,
}

impl ArchiveFormat {
    /// Detect the format from a file name or path.
    ///
    /// # Example
    ///
    /// ```
    /// use relsync::manager::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::from_path("Tool-1.0.TAR.GZ"), Some(ArchiveFormat::TarGz));
    /// assert_eq!(ArchiveFormat::from_path("tool.7z"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        Self::split_name(path.as_ref()).map(|(_, format)| format)
    }

    /// File name with the archive extension removed.
    ///
    /// Returns `None` when the name has no recognized extension.
    pub fn strip_extension(path: impl AsRef<Path>) -> Option<String> {
        Self::split_name(path.as_ref()).map(|(stem, _)| stem)
    }

    fn split_name(path: &Path) -> Option<(String, Self)> {
        let name = path.file_name()?.to_string_lossy().to_string();
        let lower = name.to_ascii_lowercase();
        EXTENSIONS.iter().find_map(|(ext, format)| {
            lower
                .ends_with(ext)
                .then(|| (name[..name.len() - ext.len()].to_string(), *format))
        })
    }

    /// Human-readable format name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Gzip => "gzip",
            Self::Rar => "rar",
        }
    }

    /// Whether extraction is delegated to an external process.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Rar)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Multi-format archive extractor.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    unrar_tool: PathBuf,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractor {
    /// Create an extractor using `unrar` from `PATH` for RAR archives.
    pub fn new() -> Self {
        Self {
            unrar_tool: PathBuf::from(DEFAULT_UNRAR_TOOL),
        }
    }

    /// Use a specific executable for RAR archives.
    pub fn with_unrar_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.unrar_tool = tool.into();
        self
    }

    /// The configured RAR tool.
    pub fn unrar_tool(&self) -> &Path {
        &self.unrar_tool
    }

    /// Whether the external RAR tool can be spawned.
    pub fn unrar_available(&self) -> bool {
        Command::new(&self.unrar_tool)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Extract an archive into `dest_dir`.
    ///
    /// The format is checked first: an unsupported extension fails with
    /// [`ManagerError::UnsupportedArchive`] and leaves `dest_dir` untouched.
    /// Otherwise `dest_dir` is created and the archive unpacked into it.
    /// On failure the partially extracted destination is left in place for
    /// the caller to clean up.
    ///
    /// # Returns
    ///
    /// The number of files present under `dest_dir` after extraction.
    pub fn extract(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        let format =
            ArchiveFormat::from_path(archive).ok_or_else(|| ManagerError::UnsupportedArchive {
                path: archive.to_path_buf(),
            })?;

        fs::create_dir_all(dest_dir).map_err(|e| ManagerError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        debug!(archive = %archive.display(), %format, "Extracting archive");

        match format {
            ArchiveFormat::Zip => self.extract_zip(archive, dest_dir)?,
            ArchiveFormat::Tar => {
                let reader = open_archive(archive)?;
                self.extract_tar(archive, reader, dest_dir)?
            }
            ArchiveFormat::TarGz => {
                let reader = MultiGzDecoder::new(open_archive(archive)?);
                self.extract_tar(archive, reader, dest_dir)?
            }
            ArchiveFormat::Gzip => self.extract_gzip(archive, dest_dir)?,
            ArchiveFormat::Rar => self.extract_rar(archive, dest_dir)?,
        }

        count_files_recursive(dest_dir)
    }

    fn extract_zip(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<()> {
        let mut zip = zip::ZipArchive::new(open_archive(archive)?)
            .map_err(|e| extraction_failed(archive, format!("invalid zip archive: {}", e)))?;

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| extraction_failed(archive, format!("zip entry {}: {}", index, e)))?;

            let relative = match entry.enclosed_name() {
                Some(path) => path.to_path_buf(),
                None => {
                    warn!(entry = entry.name(), "Skipping zip entry outside destination");
                    continue;
                }
            };
            let out_path = dest_dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)
                    .map_err(|e| extraction_failed(archive, io_reason(&out_path, &e)))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| extraction_failed(archive, io_reason(parent, &e)))?;
            }
            let mut out_file = File::create(&out_path)
                .map_err(|e| extraction_failed(archive, io_reason(&out_path, &e)))?;
            io::copy(&mut entry, &mut out_file)
                .map_err(|e| extraction_failed(archive, io_reason(&out_path, &e)))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    // Keep the owner able to overwrite the file on the next merge.
                    let mode = (mode & 0o7777) | 0o600;
                    fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                        .map_err(|e| extraction_failed(archive, io_reason(&out_path, &e)))?;
                }
            }
        }

        Ok(())
    }

    fn extract_tar<R: Read>(&self, archive: &Path, reader: R, dest_dir: &Path) -> ManagerResult<()> {
        tar::Archive::new(reader)
            .unpack(dest_dir)
            .map_err(|e| extraction_failed(archive, format!("tar extraction failed: {}", e)))
    }

    fn extract_gzip(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<()> {
        let stem = ArchiveFormat::strip_extension(archive)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "content".to_string());
        let out_path = dest_dir.join(stem);

        let mut decoder = MultiGzDecoder::new(open_archive(archive)?);
        let mut out_file = File::create(&out_path)
            .map_err(|e| extraction_failed(archive, io_reason(&out_path, &e)))?;
        io::copy(&mut decoder, &mut out_file)
            .map_err(|e| extraction_failed(archive, format!("gzip decode failed: {}", e)))?;

        Ok(())
    }

    /// Delegate to the external RAR tool; stderr is only surfaced on failure.
    fn extract_rar(&self, archive: &Path, dest_dir: &Path) -> ManagerResult<()> {
        // unrar treats the target as a directory only with a trailing separator.
        let mut target = OsString::from(dest_dir.as_os_str());
        target.push(MAIN_SEPARATOR_STR);

        let output = Command::new(&self.unrar_tool)
            .args(["x", "-o+", "-y"])
            .arg(archive)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                extraction_failed(
                    archive,
                    format!("failed to run {}: {}", self.unrar_tool.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(extraction_failed(
                archive,
                format!(
                    "{} exited with {}: {}",
                    self.unrar_tool.display(),
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}

/// Pick the directory whose contents should be merged.
///
/// Archives frequently wrap everything in one top-level folder
/// (`tool-1.0/...`). When `extract_dir` holds exactly one entry, that entry
/// is a directory, its name is not hidden and does not contain `dist`, the
/// inner directory is returned; otherwise `extract_dir` itself.
pub fn effective_root(extract_dir: &Path) -> ManagerResult<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extract_dir)
        .map_err(|e| ManagerError::ReadFailed {
            path: extract_dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .collect();

    if let [only] = entries.as_slice() {
        let name = only.file_name().to_string_lossy().to_lowercase();
        // file_type() does not follow links, so a linked top-level folder is
        // never taken as the root.
        let is_dir = only.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir && !name.starts_with('.') && !name.contains("dist") {
            return Ok(only.path());
        }
    }

    Ok(extract_dir.to_path_buf())
}

fn open_archive(archive: &Path) -> ManagerResult<BufReader<File>> {
    File::open(archive)
        .map(BufReader::new)
        .map_err(|e| ManagerError::ReadFailed {
            path: archive.to_path_buf(),
            source: e,
        })
}

fn extraction_failed(archive: &Path, reason: String) -> ManagerError {
    ManagerError::ExtractionFailed {
        path: archive.to_path_buf(),
        reason,
    }
}

fn io_reason(path: &Path, error: &io::Error) -> String {
    format!("{}: {}", path.display(), error)
}

/// Count files recursively in a directory.
fn count_files_recursive(dir: &Path) -> ManagerResult<usize> {
    let mut count = 0;

    if !dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(dir).map_err(|e| ManagerError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        match entry.file_type() {
            Ok(t) if t.is_file() => count += 1,
            Ok(t) if t.is_dir() => count += count_files_recursive(&entry.path())?,
            _ => {}
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in files {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let encoder =
            flate2::write::GzEncoder::new(File::create(path).unwrap(), flate2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ArchiveFormat::from_path("a.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("a.ZIP"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("a.tar"), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_path("a.tar.gz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path("a.tgz"), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_path("a.gz"), Some(ArchiveFormat::Gzip));
        assert_eq!(ArchiveFormat::from_path("/tmp/dl/a.rar"), Some(ArchiveFormat::Rar));
        assert_eq!(ArchiveFormat::from_path("a.7z"), None);
        assert_eq!(ArchiveFormat::from_path("zip"), None);
        assert_eq!(ArchiveFormat::from_path(""), None);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(
            ArchiveFormat::strip_extension("v1.2.0.tar.gz").as_deref(),
            Some("v1.2.0")
        );
        assert_eq!(
            ArchiveFormat::strip_extension("/dl/Tool-2.ZIP").as_deref(),
            Some("Tool-2")
        );
        assert_eq!(ArchiveFormat::strip_extension("tool.exe"), None);
    }

    #[test]
    fn test_only_rar_is_external() {
        assert!(ArchiveFormat::Rar.is_external());
        assert!(!ArchiveFormat::Zip.is_external());
        assert_eq!(ArchiveFormat::TarGz.to_string(), "tar.gz");
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tool.zip");
        write_zip(
            &archive,
            &[
                ("bin/", b""),
                ("bin/tool.dll", b"binary"),
                ("readme.txt", b"hello"),
            ],
        );

        let dest = temp.path().join("out");
        let count = ArchiveExtractor::new().extract(&archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(dest.join("bin/tool.dll")).unwrap(), b"binary");
        assert_eq!(fs::read_to_string(dest.join("readme.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_extract_zip_skips_entries_escaping_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escaped.txt", b"x"), ("ok.txt", b"y")]);

        let dest = temp.path().join("out");
        let count = ArchiveExtractor::new().extract(&archive, &dest).unwrap();

        assert_eq!(count, 1);
        assert!(dest.join("ok.txt").exists());
        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_extract_corrupt_zip_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"not a zip file").unwrap();

        let result = ArchiveExtractor::new().extract(&archive, &temp.path().join("out"));

        assert!(matches!(result, Err(ManagerError::ExtractionFailed { .. })));
    }

    #[test]
    fn test_extract_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tool-1.0.tar.gz");
        write_tar_gz(
            &archive,
            &[("tool-1.0/bin/tool", b"elf"), ("tool-1.0/LICENSE", b"MIT")],
        );

        let dest = temp.path().join("out");
        let count = ArchiveExtractor::new().extract(&archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(dest.join("tool-1.0/bin/tool")).unwrap(), b"elf");
    }

    #[test]
    fn test_extract_single_gzip_file() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("settings.json.gz");
        let mut encoder =
            flate2::write::GzEncoder::new(File::create(&archive).unwrap(), flate2::Compression::fast());
        encoder.write_all(b"{\"a\":1}").unwrap();
        encoder.finish().unwrap();

        let dest = temp.path().join("out");
        let count = ArchiveExtractor::new().extract(&archive, &dest).unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            fs::read_to_string(dest.join("settings.json")).unwrap(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn test_unsupported_extension_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tool.7z");
        fs::write(&archive, b"7z").unwrap();
        let dest = temp.path().join("out");

        let result = ArchiveExtractor::new().extract(&archive, &dest);

        assert!(matches!(result, Err(ManagerError::UnsupportedArchive { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_rar_with_missing_tool_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tool.rar");
        fs::write(&archive, b"Rar!").unwrap();

        let extractor =
            ArchiveExtractor::new().with_unrar_tool(temp.path().join("no-such-unrar"));
        let result = extractor.extract(&archive, &temp.path().join("out"));

        match result {
            Err(ManagerError::ExtractionFailed { reason, .. }) => {
                assert!(reason.contains("failed to run"));
            }
            other => panic!("Expected ExtractionFailed, got {:?}", other),
        }
        assert!(!extractor.unrar_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_rar_nonzero_exit_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("fake-unrar");
        fs::write(&tool, "#!/bin/sh\necho 'CRC failed in tool.dll' >&2\nexit 3\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let archive = temp.path().join("tool.rar");
        fs::write(&archive, b"Rar!").unwrap();

        let result = ArchiveExtractor::new()
            .with_unrar_tool(&tool)
            .extract(&archive, &temp.path().join("out"));

        match result {
            Err(ManagerError::ExtractionFailed { reason, .. }) => {
                assert!(reason.contains("CRC failed in tool.dll"));
            }
            other => panic!("Expected ExtractionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_effective_root_unwraps_single_folder() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("tool-1.0/bin")).unwrap();

        assert_eq!(
            effective_root(temp.path()).unwrap(),
            temp.path().join("tool-1.0")
        );
    }

    #[test]
    fn test_effective_root_keeps_dist_and_hidden_folders() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("Dist")).unwrap();
        assert_eq!(effective_root(temp.path()).unwrap(), temp.path());

        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".github")).unwrap();
        assert_eq!(effective_root(temp.path()).unwrap(), temp.path());
    }

    #[cfg(unix)]
    #[test]
    fn test_effective_root_does_not_follow_linked_folder() {
        let host = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(host.path(), temp.path().join("tool-1.0")).unwrap();

        assert_eq!(effective_root(temp.path()).unwrap(), temp.path());
    }

    #[test]
    fn test_effective_root_keeps_multiple_entries_or_single_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("bin")).unwrap();
        fs::create_dir(temp.path().join("r6")).unwrap();
        assert_eq!(effective_root(temp.path()).unwrap(), temp.path());

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("only.txt"), "x").unwrap();
        assert_eq!(effective_root(temp.path()).unwrap(), temp.path());
    }

    #[test]
    fn test_count_files_recursive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("file1.txt"), "a").unwrap();
        let subdir = temp.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("file2.txt"), "b").unwrap();

        assert_eq!(count_files_recursive(temp.path()).unwrap(), 2);
        assert_eq!(count_files_recursive(Path::new("/nonexistent/path")).unwrap(), 0);
    }
}
