use std::fs::File;
use std::io;
use std::path::Path;

use tempfile::TempPath;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::RegistryError;

/// Turns a module's working directory into a single archive file.
pub trait Archiver: Send + Sync {
    /// Archive `source_dir` into a temporary file.
    ///
    /// The file is deleted when the returned [`TempPath`] is dropped.
    fn archive(&self, source_dir: &Path) -> Result<TempPath, RegistryError>;
}

/// Zip archiver producing byte-stable output for identical trees.
///
/// Entries are written in file-name order with a fixed timestamp, and the
/// `.git` directory is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    /// Create a new `ZipArchiver`.
    pub fn new() -> Self {
        Self
    }
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == ".git"
}

fn archive_error(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::Archive(err.to_string())
}

impl Archiver for ZipArchiver {
    fn archive(&self, source_dir: &Path) -> Result<TempPath, RegistryError> {
        if !source_dir.is_dir() {
            return Err(RegistryError::Archive(format!(
                "'{}' is not a directory",
                source_dir.display()
            )));
        }

        let (file, path) = tempfile::Builder::new()
            .prefix("modreg-")
            .suffix(".zip")
            .tempfile()?
            .into_parts();

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut writer = zip::ZipWriter::new(file);
        let mut files = 0usize;
        let walker = WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_git_dir(entry));

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            let Ok(relative) = entry.path().strip_prefix(source_dir) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                writer
                    .add_directory(format!("{name}/"), options)
                    .map_err(archive_error)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options).map_err(archive_error)?;
                io::copy(&mut File::open(entry.path())?, &mut writer)?;
                files += 1;
            }
        }

        writer.finish().map_err(archive_error)?;
        info!(source = %source_dir.display(), files, "module archived");
        debug!(archive = %path.display(), "archive written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn entry_names(archive: &Path) -> Vec<String> {
        let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_owned())
            .collect()
    }

    #[test]
    fn archives_tree_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.tf", "resource {}");
        write(dir.path(), "modules/net/vars.tf", "variable {}");
        write(dir.path(), "README.md", "# vpc");

        let archive = ZipArchiver::new().archive(dir.path()).unwrap();
        assert_eq!(
            entry_names(&archive),
            [
                "README.md",
                "main.tf",
                "modules/",
                "modules/net/",
                "modules/net/vars.tf"
            ]
        );
    }

    #[test]
    fn skips_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.tf", "x");
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main");
        write(dir.path(), ".gitignore", "*.zip");

        let archive = ZipArchiver::new().archive(dir.path()).unwrap();
        let names = entry_names(&archive);
        assert!(names.iter().all(|n| !n.starts_with(".git/")));
        assert!(names.contains(&".gitignore".to_owned()));
    }

    #[test]
    fn preserves_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.tf", "resource \"aws_vpc\" \"this\" {}");

        let archive = ZipArchiver::new().archive(dir.path()).unwrap();
        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut contents = String::new();
        zip.by_name("main.tf")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "resource \"aws_vpc\" \"this\" {}");
    }

    #[test]
    fn identical_trees_give_identical_archives() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for dir in [&first, &second] {
            write(dir.path(), "b.tf", "b");
            write(dir.path(), "a/c.tf", "c");
        }
        let a = ZipArchiver::new().archive(first.path()).unwrap();
        let b = ZipArchiver::new().archive(second.path()).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }

    #[test]
    fn archive_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.tf", "x");
        let archive = ZipArchiver::new().archive(dir.path()).unwrap();
        let path = archive.to_path_buf();
        assert!(path.exists());
        drop(archive);
        assert!(!path.exists());
    }

    #[test]
    fn missing_directory_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZipArchiver::new()
            .archive(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Archive(_)));
    }
}
