//! Server credential storage.
//!
//! Reads/writes ~/.config/labgrid/credentials.json (0600 on Unix).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Where the query API lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCredentials {
    /// Server root (e.g., "https://lims.example.org")
    pub base_url: String,
    /// Container (project/folder) path the grid reads from
    #[serde(default = "default_container")]
    pub container_path: String,
    /// API key, sent as basic auth with the user name "apikey"
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_container() -> String {
    "/".to_string()
}

/// Returns the path to the credentials file.
pub fn credentials_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("labgrid/credentials.json"))
}

/// Load saved credentials. Returns None if absent or invalid.
pub fn load_credentials() -> Option<ServerCredentials> {
    load_credentials_from(&credentials_file_path()?)
}

pub(crate) fn load_credentials_from(path: &Path) -> Option<ServerCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(creds) => Some(creds),
        Err(e) => {
            log::warn!("Ignoring invalid credentials file {}: {}", path.display(), e);
            None
        }
    }
}

/// Save credentials to the default path.
pub fn save_credentials(creds: &ServerCredentials) -> Result<(), QueryError> {
    let path = credentials_file_path()
        .ok_or_else(|| QueryError::Io("Could not determine config directory".into()))?;
    save_credentials_to(creds, &path)
}

pub(crate) fn save_credentials_to(
    creds: &ServerCredentials,
    path: &Path,
) -> Result<(), QueryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| QueryError::Io(format!("Failed to create config directory: {}", e)))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| QueryError::Io(format!("Failed to serialize credentials: {}", e)))?;

    std::fs::write(path, &contents)
        .map_err(|e| QueryError::Io(format!("Failed to write credentials file: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| QueryError::Io(format!("Failed to set file permissions: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{"base_url":"https://lims.example.org"}"#;
        let parsed: ServerCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.container_path, "/");
        assert!(parsed.api_key.is_none());
    }

    #[test]
    fn test_credentials_file_path() {
        let path = credentials_file_path().unwrap();
        assert!(path.to_string_lossy().contains("labgrid"));
        assert!(path.to_string_lossy().ends_with("credentials.json"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("credentials.json");
        let creds = ServerCredentials {
            base_url: "https://lims.example.org".into(),
            container_path: "/Lab".into(),
            api_key: Some("apikey|abc".into()),
        };
        save_credentials_to(&creds, &path).unwrap();
        assert_eq!(load_credentials_from(&path), Some(creds));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_invalid_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "nope").unwrap();
        assert!(load_credentials_from(&path).is_none());
    }
}
