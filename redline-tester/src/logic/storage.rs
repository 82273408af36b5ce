use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use redline_game::{PlayerProfile, ProfileStorage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where simulated careers are committed.
#[derive(Debug)]
pub enum SaveTarget {
    Memory(RefCell<HashMap<String, PlayerProfile>>),
    /// One pretty-printed JSON file per profile.
    Directory(PathBuf),
}

impl SaveTarget {
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(RefCell::new(HashMap::new()))
    }

    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn directory(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self::Directory(root))
    }

    fn profile_path(root: &std::path::Path, profile_id: &str) -> PathBuf {
        let safe: String = profile_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        root.join(format!("{safe}.json"))
    }
}

impl ProfileStorage for SaveTarget {
    type Error = StorageError;

    fn save_profile(&self, profile_id: &str, profile: &PlayerProfile) -> Result<(), Self::Error> {
        match self {
            Self::Memory(saves) => {
                saves
                    .borrow_mut()
                    .insert(profile_id.to_string(), profile.clone());
                Ok(())
            }
            Self::Directory(root) => {
                let path = Self::profile_path(root, profile_id);
                let payload = serde_json::to_vec_pretty(profile).map_err(|source| StorageError::Json {
                    path: path.clone(),
                    source,
                })?;
                fs::write(&path, payload).map_err(|source| StorageError::Io { path, source })
            }
        }
    }

    fn load_profile(&self, profile_id: &str) -> Result<Option<PlayerProfile>, Self::Error> {
        match self {
            Self::Memory(saves) => Ok(saves.borrow().get(profile_id).cloned()),
            Self::Directory(root) => {
                let path = Self::profile_path(root, profile_id);
                if !path.exists() {
                    return Ok(None);
                }
                let raw = fs::read(&path).map_err(|source| StorageError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_slice(&raw)
                    .map(Some)
                    .map_err(|source| StorageError::Json { path, source })
            }
        }
    }

    fn delete_profile(&self, profile_id: &str) -> Result<(), Self::Error> {
        match self {
            Self::Memory(saves) => {
                saves.borrow_mut().remove(profile_id);
                Ok(())
            }
            Self::Directory(root) => {
                let path = Self::profile_path(root, profile_id);
                match fs::remove_file(&path) {
                    Err(source) if source.kind() != std::io::ErrorKind::NotFound => {
                        Err(StorageError::Io { path, source })
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_game::{DealerCatalog, EngineConfig};

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "redline-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn profile() -> PlayerProfile {
        let cfg = EngineConfig::default();
        let starter = DealerCatalog::default_catalog()
            .cheapest()
            .unwrap()
            .build("car-0", &cfg);
        PlayerProfile::new_career("seed/42", starter, &cfg)
    }

    #[test]
    fn directory_roundtrips_profiles() {
        let root = temp_dir("roundtrip");
        let storage = SaveTarget::directory(root.clone()).expect("create dir");
        let profile = profile();
        storage.save_profile(&profile.id, &profile).unwrap();
        assert!(root.join("seed_42.json").exists());
        assert_eq!(storage.load_profile(&profile.id).unwrap(), Some(profile.clone()));
        storage.delete_profile(&profile.id).unwrap();
        assert_eq!(storage.load_profile(&profile.id).unwrap(), None);
        storage.delete_profile(&profile.id).unwrap();
    }

    #[test]
    fn corrupt_files_surface_as_json_errors() {
        let root = temp_dir("corrupt");
        let storage = SaveTarget::directory(root.clone()).expect("create dir");
        fs::write(root.join("broken.json"), b"{ not json").unwrap();
        assert!(matches!(
            storage.load_profile("broken"),
            Err(StorageError::Json { .. })
        ));
    }

    #[test]
    fn memory_target_keeps_latest_save() {
        let storage = SaveTarget::memory();
        let mut profile = profile();
        storage.save_profile("p", &profile).unwrap();
        profile.money = 1;
        storage.save_profile("p", &profile).unwrap();
        assert_eq!(storage.load_profile("p").unwrap().map(|p| p.money), Some(1));
    }
}
