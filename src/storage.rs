use anyhow::bail;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ErrorDetail, QuizError};
use crate::models::{validate_settings, QuizSettings, ResultRecord};

pub const SETTINGS_KEY: &str = "quizSettings_see";
pub const RESULTS_KEY: &str = "quizResults_see";

static RESULT_SCHEMA_RAW: &str = include_str!("../contracts/result_record.schema.json");

/// String key/value storage with the semantics of the browser's
/// `localStorage`.
pub trait LocalStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&mut self, key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes once keys plus values would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if let Some(quota) = self.quota_bytes {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                bail!("storage quota exceeded: {} of {} bytes", needed, quota);
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// A missing file starts empty; a corrupt one is logged and ignored.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(items) => items,
                Err(err) => {
                    warn!("failed to read storage snapshot {}: {}", path.display(), err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!("failed to read storage snapshot {}: {}", path.display(), err);
                BTreeMap::new()
            }
        };
        Self { path, items }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> anyhow::Result<()> {
        let serialized = serde_json::to_vec_pretty(&self.items)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let previous = self.items.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist() {
            // Leave the old value in place, as a failed setItem does.
            match previous {
                Some(old) => self.items.insert(key.to_string(), old),
                None => self.items.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        if self.items.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

fn save_json<S, T>(storage: &mut S, key: &'static str, value: &T) -> Result<(), QuizError>
where
    S: LocalStorage + ?Sized,
    T: Serialize,
{
    let raw = serde_json::to_string(value).map_err(|e| QuizError::StorageWriteFailure {
        key,
        source: e.into(),
    })?;
    storage
        .set_item(key, &raw)
        .map_err(|e| QuizError::StorageWriteFailure {
            key,
            source: e.into(),
        })?;
    debug!("saved {} ({} bytes)", key, raw.len());
    Ok(())
}

fn read_raw<S>(storage: &S, key: &'static str) -> Result<Option<String>, QuizError>
where
    S: LocalStorage + ?Sized,
{
    storage
        .get_item(key)
        .map_err(|e| QuizError::StorageReadCorrupt {
            key,
            message: e.to_string(),
        })
}

pub fn save_settings<S: LocalStorage + ?Sized>(storage: &mut S, settings: &QuizSettings) -> Result<(), QuizError> {
    save_json(storage, SETTINGS_KEY, settings)
}

pub fn load_settings<S: LocalStorage + ?Sized>(storage: &S) -> Result<QuizSettings, QuizError> {
    let raw = read_raw(storage, SETTINGS_KEY)?.ok_or(QuizError::SettingsMissing)?;
    let settings: QuizSettings = serde_json::from_str(&raw).map_err(|e| QuizError::StorageReadCorrupt {
        key: SETTINGS_KEY,
        message: e.to_string(),
    })?;
    validate_settings(&settings).map_err(|issues| {
        warn!("stored quiz settings out of range with {} issue(s)", issues.len());
        QuizError::InvalidSettings {
            details: issues.into_iter().map(Into::into).collect(),
        }
    })?;
    Ok(settings)
}

pub fn clear_settings<S: LocalStorage + ?Sized>(storage: &mut S) -> Result<(), QuizError> {
    storage
        .remove_item(SETTINGS_KEY)
        .map_err(|e| QuizError::StorageWriteFailure {
            key: SETTINGS_KEY,
            source: e.into(),
        })?;
    info!("quiz settings cleared from storage");
    Ok(())
}

pub fn save_results<S: LocalStorage + ?Sized>(storage: &mut S, result: &ResultRecord) -> Result<(), QuizError> {
    save_json(storage, RESULTS_KEY, result)
}

fn schema_failure(message: String) -> QuizError {
    QuizError::InvalidResultRecord {
        details: vec![ErrorDetail::new("$schema", message)],
    }
}

/// Parses, schema-checks and integrity-checks the stored result. Nothing is
/// returned from a record that fails any step.
pub fn load_results<S: LocalStorage + ?Sized>(storage: &S) -> Result<ResultRecord, QuizError> {
    let raw = read_raw(storage, RESULTS_KEY)?.ok_or(QuizError::ResultsMissing)?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| QuizError::StorageReadCorrupt {
        key: RESULTS_KEY,
        message: e.to_string(),
    })?;

    let schema: Value =
        serde_json::from_str(RESULT_SCHEMA_RAW).map_err(|e| schema_failure(e.to_string()))?;
    let compiled = jsonschema::draft202012::new(&schema).map_err(|e| schema_failure(e.to_string()))?;
    if compiled.validate(&value).is_err() {
        let details: Vec<ErrorDetail> = compiled
            .iter_errors(&value)
            .map(|e| ErrorDetail {
                field: e.instance_path.to_string(),
                issue: e.to_string(),
            })
            .collect();
        warn!("stored result failed schema validation with {} issue(s)", details.len());
        return Err(QuizError::InvalidResultRecord { details });
    }

    let record: ResultRecord = serde_json::from_value(value).map_err(|e| QuizError::InvalidResultRecord {
        details: vec![ErrorDetail::new("", e.to_string())],
    })?;
    record
        .check_integrity()
        .map_err(|issues| QuizError::InvalidResultRecord {
            details: issues.into_iter().map(Into::into).collect(),
        })?;
    Ok(record)
}
