//! [`TestTree`] builder for temporary directory trees.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// Relative path (forward slashes) to file content, `None` for directories.
pub type Snapshot = BTreeMap<String, Option<Vec<u8>>>;

/// A temporary directory with helpers to lay out files and inspect the result.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write("docs/readme.txt", "hello");
/// tree.assert_file("docs/readme.txt", "hello");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file, creating parent directories as needed.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("TestTree::write: mkdir {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestTree::write: {}: {e}", path.display()));
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("TestTree::mkdir: {}: {e}", path.display()));
        path
    }

    /// Pin the modification time of an existing file.
    pub fn set_mtime(&self, relative: &str, time: SystemTime) {
        let path = self.path(relative);
        File::options()
            .write(true)
            .open(&path)
            .and_then(|f| f.set_modified(time))
            .unwrap_or_else(|e| panic!("TestTree::set_mtime: {}: {e}", path.display()));
    }

    /// Pin the modification time to `secs` seconds after the Unix epoch.
    pub fn set_mtime_secs(&self, relative: &str, secs: u64) {
        self.set_mtime(relative, SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
    }

    pub fn mtime(&self, relative: &str) -> SystemTime {
        fs::metadata(self.path(relative))
            .and_then(|m| m.modified())
            .unwrap_or_else(|e| panic!("TestTree::mtime: {relative}: {e}"))
    }

    pub fn remove(&self, relative: &str) {
        let path = self.path(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).unwrap();
        } else {
            fs::remove_file(&path).unwrap();
        }
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("TestTree::read: {relative}: {e}"))
    }

    pub fn assert_file(&self, relative: &str, expected: &str) {
        assert_eq!(self.read(relative), expected, "content of {relative}");
    }

    pub fn assert_missing(&self, relative: &str) {
        assert!(
            !self.path(relative).exists(),
            "expected {relative} to be absent"
        );
    }

    /// Every entry below the root, keyed by forward-slash relative path.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        collect(self.root(), "", &mut snapshot);
        snapshot
    }
}

fn collect(dir: &Path, prefix: &str, out: &mut Snapshot) {
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();

        if path.is_dir() {
            out.insert(relative.clone(), None);
            collect(&path, &relative, out);
        } else {
            out.insert(relative, Some(fs::read(&path).unwrap()));
        }
    }
}
