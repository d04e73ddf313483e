use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use crate::chronicle::project::ProjectRecord;
use crate::error::StoreError;

/// Persistence sink for synced projects.
///
/// `replace` must swap the whole record for a slug at once; readers never see
/// a mix of old and new seasons.
pub trait SeasonStore {
    fn replace(&self, project: &ProjectRecord) -> Result<(), StoreError>;
    fn load(&self, slug: &str) -> Result<Option<ProjectRecord>, StoreError>;
    fn slugs(&self) -> Result<Vec<String>, StoreError>;
    fn remove(&self, slug: &str) -> Result<(), StoreError>;
}

/// One pretty-printed JSON document per project under a directory.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, slug: &str) -> Result<PathBuf, StoreError> {
        let valid = !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(StoreError::InvalidSlug(slug.to_string()));
        }
        Ok(self.root.join(format!("{}.json", slug)))
    }
}

impl SeasonStore for JsonFileStore {
    fn replace(&self, project: &ProjectRecord) -> Result<(), StoreError> {
        let target = self.path_for(&project.slug)?;
        let body = serde_json::to_vec_pretty(project)?;

        // Uniquely named in the same directory; removed on drop if never persisted.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;

        tracing::debug!(slug = %project.slug, path = %target.display(), "stored project");
        Ok(())
    }

    fn load(&self, slug: &str) -> Result<Option<ProjectRecord>, StoreError> {
        let path = self.path_for(slug)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn slugs(&self) -> Result<Vec<String>, StoreError> {
        let mut slugs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    slugs.push(stem.to_string());
                }
            }
        }
        slugs.sort();
        Ok(slugs)
    }

    fn remove(&self, slug: &str) -> Result<(), StoreError> {
        let path = self.path_for(slug)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
