//! Baseline storage backends
//!
//! Baselines are immutable once written: saving a version that already exists
//! fails with [`KolosalError::BaselineExists`]. The file backend writes each
//! baseline to a temporary sibling and links it into place once complete, so
//! a failed write never leaves a partial `<version>.json` behind.

use super::BaselineStatistics;
use crate::error::{KolosalError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Source of previously computed baselines
pub trait BaselineRepository: Send + Sync {
    /// Baseline for a dataset version, `None` when unknown
    fn get(&self, dataset_version: &str) -> Result<Option<Arc<BaselineStatistics>>>;

    /// Most recently created baseline, `None` when the repository is empty
    fn latest(&self) -> Result<Option<Arc<BaselineStatistics>>>;

    /// Store a new baseline
    fn save(&self, baseline: BaselineStatistics) -> Result<()>;
}

fn newest(baselines: impl Iterator<Item = Arc<BaselineStatistics>>) -> Option<Arc<BaselineStatistics>> {
    baselines.max_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.dataset_version.cmp(&b.dataset_version))
    })
}

/// Process-local baseline store
#[derive(Debug, Default)]
pub struct InMemoryBaselineRepository {
    baselines: RwLock<BTreeMap<String, Arc<BaselineStatistics>>>,
}

impl InMemoryBaselineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.baselines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.read().is_empty()
    }
}

impl BaselineRepository for InMemoryBaselineRepository {
    fn get(&self, dataset_version: &str) -> Result<Option<Arc<BaselineStatistics>>> {
        Ok(self.baselines.read().get(dataset_version).cloned())
    }

    fn latest(&self) -> Result<Option<Arc<BaselineStatistics>>> {
        Ok(newest(self.baselines.read().values().cloned()))
    }

    fn save(&self, baseline: BaselineStatistics) -> Result<()> {
        let mut baselines = self.baselines.write();
        if baselines.contains_key(&baseline.dataset_version) {
            return Err(KolosalError::BaselineExists(baseline.dataset_version));
        }
        baselines.insert(baseline.dataset_version.clone(), Arc::new(baseline));
        Ok(())
    }
}

/// One JSON file per dataset version under a base directory
#[derive(Debug, Clone)]
pub struct FileBaselineRepository {
    base_dir: PathBuf,
}

impl FileBaselineRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn baseline_file(&self, dataset_version: &str) -> Result<PathBuf> {
        let valid = !dataset_version.is_empty()
            && !dataset_version.starts_with('.')
            && !dataset_version.contains(['/', '\\']);
        if !valid {
            return Err(KolosalError::ValidationError(format!(
                "Invalid dataset version for file storage: '{}'",
                dataset_version
            )));
        }
        Ok(self.base_dir.join(format!("{}.json", dataset_version)))
    }
}

impl BaselineRepository for FileBaselineRepository {
    fn get(&self, dataset_version: &str) -> Result<Option<Arc<BaselineStatistics>>> {
        let path = self.baseline_file(dataset_version)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Arc::new(BaselineStatistics::load(&path)?)))
    }

    fn latest(&self) -> Result<Option<Arc<BaselineStatistics>>> {
        if !self.base_dir.exists() {
            return Ok(None);
        }

        let mut baselines = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if !is_baseline_file(&path) {
                continue;
            }
            debug!(path = %path.display(), "Reading baseline");
            baselines.push(Arc::new(BaselineStatistics::load(&path)?));
        }

        Ok(newest(baselines.into_iter()))
    }

    fn save(&self, baseline: BaselineStatistics) -> Result<()> {
        let json = baseline.to_json()?;
        let path = self.store(&baseline.dataset_version, |file| file.write_all(json.as_bytes()))?;

        info!(
            dataset_version = %baseline.dataset_version,
            path = %path.display(),
            "Saved baseline"
        );
        Ok(())
    }
}

impl FileBaselineRepository {
    /// Write a new baseline file through a temporary sibling. The temporary is
    /// removed whether or not the write succeeds.
    fn store<F>(&self, dataset_version: &str, write: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let path = self.baseline_file(dataset_version)?;
        fs::create_dir_all(&self.base_dir)?;
        if path.exists() {
            return Err(KolosalError::BaselineExists(dataset_version.to_string()));
        }

        let temp = self.base_dir.join(format!(
            ".{}.{}.{}.tmp",
            dataset_version,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let result = write_and_link(&temp, &path, write);

        if let Err(e) = fs::remove_file(&temp) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %temp.display(), error = %e, "Failed to remove temporary baseline file");
            }
        }

        match result {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(KolosalError::BaselineExists(dataset_version.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Hard-linking fails if `path` exists, so a version is never overwritten
fn write_and_link<F>(temp: &Path, path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = OpenOptions::new().write(true).create_new(true).open(temp)?;
    write(&mut file)?;
    file.sync_all()?;
    drop(file);
    fs::hard_link(temp, path)
}

fn is_baseline_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    !hidden && path.extension().and_then(|e| e.to_str()) == Some("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::FeatureStatistics;
    use chrono::{DateTime, Utc};

    fn baseline(version: &str, created_at: &str) -> BaselineStatistics {
        BaselineStatistics::new(
            version,
            created_at.parse::<DateTime<Utc>>().unwrap(),
            vec![FeatureStatistics::numeric("age", 40.0, 10.0, 18.0, 90.0, 0, 50, 100)],
        )
    }

    #[test]
    fn test_in_memory_get_and_latest() {
        let repo = InMemoryBaselineRepository::new();
        assert!(repo.latest().unwrap().is_none());

        repo.save(baseline("v1", "2024-01-01T00:00:00Z")).unwrap();
        repo.save(baseline("v2", "2024-03-01T00:00:00Z")).unwrap();

        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get("v1").unwrap().unwrap().dataset_version, "v1");
        assert!(repo.get("v3").unwrap().is_none());
        assert_eq!(repo.latest().unwrap().unwrap().dataset_version, "v2");
    }

    #[test]
    fn test_in_memory_rejects_overwrite() {
        let repo = InMemoryBaselineRepository::new();
        repo.save(baseline("v1", "2024-01-01T00:00:00Z")).unwrap();
        let result = repo.save(baseline("v1", "2024-02-01T00:00:00Z"));
        assert!(matches!(result, Err(KolosalError::BaselineExists(_))));
    }

    #[test]
    fn test_file_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileBaselineRepository::new(dir.path().join("baselines"));
        assert!(repo.latest().unwrap().is_none());

        let first = baseline("v1", "2024-01-01T00:00:00Z");
        repo.save(first.clone()).unwrap();
        repo.save(baseline("v2", "2024-05-01T00:00:00Z")).unwrap();

        assert_eq!(*repo.get("v1").unwrap().unwrap(), first);
        assert_eq!(repo.latest().unwrap().unwrap().dataset_version, "v2");
        assert!(matches!(
            repo.save(first),
            Err(KolosalError::BaselineExists(_))
        ));
    }

    #[test]
    fn test_file_repository_rejects_path_versions() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileBaselineRepository::new(dir.path());
        assert!(matches!(
            repo.get("../escape"),
            Err(KolosalError::ValidationError(_))
        ));
        assert!(matches!(
            repo.get(".hidden"),
            Err(KolosalError::ValidationError(_))
        ));
    }

    #[test]
    fn test_failed_write_leaves_version_free() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileBaselineRepository::new(dir.path());

        let result = repo.store("v1", |file| {
            file.write_all(b"{\"dataset_version\":")?;
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        });
        assert!(matches!(result, Err(KolosalError::IoError(_))));
        assert!(!dir.path().join("v1.json").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(repo.get("v1").unwrap().is_none());
        assert!(repo.latest().unwrap().is_none());

        repo.save(baseline("v1", "2024-01-01T00:00:00Z")).unwrap();
        assert_eq!(repo.latest().unwrap().unwrap().dataset_version, "v1");
    }

    #[test]
    fn test_latest_ignores_stray_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileBaselineRepository::new(dir.path());
        repo.save(baseline("v1", "2024-01-01T00:00:00Z")).unwrap();

        fs::write(dir.path().join(".v2.41.0.tmp"), "{\"dataset_version\":").unwrap();
        fs::write(dir.path().join(".v3.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        assert_eq!(repo.latest().unwrap().unwrap().dataset_version, "v1");
    }
}
