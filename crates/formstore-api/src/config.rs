use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use formstore_core::{DocumentProperties, IgnoreRules};
use serde::{Deserialize, Serialize};

/// Application settings.
///
/// Sources, later ones winning: built-in defaults, an optional TOML file
/// (`formstore.toml` unless a path is given), `FORMSTORE__*` environment
/// variables with `__` between nested keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub resources: ResourceSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: crate::routes::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://formstore.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub root: PathBuf,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
        }
    }
}

/// Listing and export options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub items_per_page: u32,
    /// chrono strftime pattern for displayed and exported timestamps
    pub datetime_format: String,
    pub creator: String,
    pub title: String,
    pub subject: String,
    pub ignored_fields: IgnoreRules,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            items_per_page: 10,
            datetime_format: "%d.%m.%Y %H:%M:%S".to_string(),
            creator: "Form Storage".to_string(),
            title: "Form Submissions".to_string(),
            subject: "Form Submissions Export".to_string(),
            ignored_fields: IgnoreRules::default(),
        }
    }
}

impl StorageSettings {
    pub fn document_properties(&self) -> DocumentProperties {
        DocumentProperties {
            creator: self.creator.clone(),
            title: self.title.clone(),
            subject: self.subject.clone(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("formstore").required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("FORMSTORE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.ignored_fields.keys")
                    .with_list_parse_key("storage.ignored_fields.prefixes")
                    .with_list_parse_key("storage.ignored_fields.element_types")
                    .with_list_parse_key("storage.ignored_fields.allow"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.items_per_page < 1 {
            return Err(ConfigError::Message(
                "storage.items_per_page must be at least 1".to_string(),
            ));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::Message("database.url must be set".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.storage.items_per_page, 10);
        assert_eq!(settings.server.port, 3000);
        assert!(settings.storage.ignored_fields.is_ignored("__csrfToken"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[storage]
items_per_page = 25
title = "Contact requests"

[storage.ignored_fields]
keys = ["privacy"]
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.storage.items_per_page, 25);
        assert_eq!(settings.storage.title, "Contact requests");
        assert_eq!(settings.storage.creator, "Form Storage");
        assert!(settings.storage.ignored_fields.is_ignored("privacy"));
        // Unset rule lists keep their defaults
        assert!(settings.storage.ignored_fields.is_ignored("__state"));
    }

    #[test]
    fn test_zero_items_per_page_is_rejected() {
        let mut settings = Settings::default();
        settings.storage.items_per_page = 0;

        assert!(settings.validate().is_err());
    }
}
