use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::path::{Path, PathBuf};

const STORE_DIR_ENV_VAR: &str = "TASKLIST_STORE_DIR";
const APP_DIR_NAME: &str = "tasklist";

/// File-backed key-value store: each key is kept in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

pub fn store_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    app_dir()
}

pub(crate) fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn validate_key(key: &str) -> Result<(), AppError> {
    if key.trim().is_empty() {
        return Err(AppError::invalid_input("storage key is required"));
    }
    if key.contains(['/', '\\']) || key.contains("..") {
        return Err(AppError::invalid_input(format!(
            "storage key must not contain path separators: {key}"
        )));
    }
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        std::fs::write(&path, value)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileStore;
    use crate::storage::KeyValueStore;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasklist-{nanos}-{name}"))
    }

    #[test]
    fn get_missing_key_returns_none() {
        let dir = temp_dir("missing");
        let store = JsonFileStore::new(&dir);

        assert_eq!(store.get("taskState").unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let dir = temp_dir("set-get");
        let store = JsonFileStore::new(&dir);

        store.set("taskState", "{\"tasks\":[]}").unwrap();
        let loaded = store.get("taskState").unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.as_deref(), Some("{\"tasks\":[]}"));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let dir = temp_dir("overwrite");
        let store = JsonFileStore::new(&dir);

        store.set("taskState", "first").unwrap();
        store.set("taskState", "second").unwrap();
        let loaded = store.get("taskState").unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.as_deref(), Some("second"));
    }

    #[test]
    fn keys_map_to_json_files_in_dir() {
        let dir = temp_dir("layout");
        let store = JsonFileStore::new(&dir);

        assert_eq!(store.path_for("taskState").unwrap(), dir.join("taskState.json"));
    }

    #[test]
    fn rejects_keys_with_path_separators() {
        let store = JsonFileStore::new(temp_dir("bad-key"));

        for key in ["../escape", "nested/key", "win\\key", "  "] {
            let err = store.set(key, "{}").unwrap_err();
            assert_eq!(err.code(), "invalid_input");
        }
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("perms");
        let store = JsonFileStore::new(&dir);
        store.set("taskState", "{}").unwrap();
        let mode = fs::metadata(dir.join("taskState.json"))
            .unwrap()
            .permissions()
            .mode();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(mode & 0o777, 0o600);
    }
}
