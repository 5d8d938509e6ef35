//! Directory-backed key-value stores for the two session tiers.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use swiftread_core::storage::{LargeStore, SmallStore, StoreError};

/// One file per key inside `root`. An optional byte quota covers the whole
/// directory, mimicking a browser-style local storage limit.
pub(super) struct FileStore {
    root: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileStore {
    pub(super) fn with_quota(root: PathBuf, quota_bytes: usize) -> Self {
        Self {
            root,
            quota_bytes: Some(quota_bytes),
        }
    }

    pub(super) fn unlimited(root: PathBuf) -> Self {
        Self {
            root,
            quota_bytes: None,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|ch| match ch {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => ch,
                _ => '_',
            })
            .collect();
        self.root.join(name)
    }

    fn used_bytes_except(&self, skip: &Path) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(map_io(err)),
        };

        let mut used = 0usize;
        for entry in entries {
            let entry = entry.map_err(map_io)?;
            if entry.path() == skip {
                continue;
            }
            let len = entry.metadata().map_err(map_io)?.len();
            used = used.saturating_add(usize::try_from(len).unwrap_or(usize::MAX));
        }
        Ok(used)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(quota) = self.quota_bytes {
            let used = self.used_bytes_except(&path)?;
            if used.saturating_add(value.len()) > quota {
                debug!(
                    "file-store: quota exceeded key={key} bytes={} used={used} quota={quota}",
                    value.len()
                );
                return Err(StoreError::QuotaExceeded);
            }
        }

        fs::create_dir_all(&self.root).map_err(map_io)?;
        // readers only ever see whole files
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, value).map_err(map_io)?;
        fs::rename(&staging, &path).map_err(map_io)
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io(err)),
        }
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.path_for(key).try_exists().map_err(map_io)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(map_io(err)),
        }
    }
}

fn map_io(err: io::Error) -> StoreError {
    match err.kind() {
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => StoreError::QuotaExceeded,
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            StoreError::Unavailable
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

impl SmallStore for FileStore {
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key)
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.contains(key)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.remove(key)
    }
}

impl LargeStore for FileStore {
    async fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(key, value)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read(key)
    }

    async fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.contains(key)
    }

    async fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.remove(key)
    }
}
