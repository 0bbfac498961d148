//! Run configuration — JSON file listing the participating sites and an
//! optional explicit page list.
//!
//! ```json
//! {
//!   "wiki": {
//!     "reko":   { "name": "Reko Wiki", "url": "https://reko.example/api.php",
//!                 "botName": "SyncBot@sync", "botPassword": "..." },
//!     "fandom": { "name": "Fandom",    "url": "https://example.fandom.com/api.php",
//!                 "botName": "SyncBot@sync", "botPassword": "..." }
//!   },
//!   "pages": ["Foo", "Bar"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Credentials, SiteId, WikiSite};

/// One site entry in the config file. Field names match the original
/// deployment's `config.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    /// Display name used in provenance markers.
    pub name: String,
    /// Full `api.php` endpoint URL.
    pub url: String,
    #[serde(rename = "botName")]
    pub bot_name: String,
    #[serde(rename = "botPassword")]
    pub bot_password: String,
}

/// Parsed config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Site key → site entry. `BTreeMap` keeps site iteration (and with it
    /// timestamp tie-breaking downstream) deterministic.
    #[serde(rename = "wiki")]
    pub wikis: BTreeMap<String, SiteConfig>,
    /// Explicit titles for a page run; discovery is used when absent.
    #[serde(default)]
    pub pages: Option<Vec<String>>,
}

impl Config {
    /// Load and validate a config file. All validation failures are fatal
    /// and happen before any network activity.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.wikis.len() < 2 {
            return Err(ConfigError::TooFewSites {
                found: self.wikis.len(),
            });
        }
        for (key, site) in &self.wikis {
            let missing = |reason: &str| ConfigError::InvalidSite {
                key: key.clone(),
                reason: reason.to_owned(),
            };
            if site.url.trim().is_empty() {
                return Err(missing("empty url"));
            }
            if site.name.trim().is_empty() {
                return Err(missing("empty display name"));
            }
            if site.bot_name.trim().is_empty() || site.bot_password.trim().is_empty() {
                return Err(missing("missing bot credentials"));
            }
        }
        if let Some(pages) = &self.pages {
            if pages.iter().all(|t| t.trim().is_empty()) {
                return Err(ConfigError::EmptyPageList);
            }
        }
        Ok(())
    }

    /// Materialize the site registry entries in key order.
    pub fn sites(&self) -> Vec<WikiSite> {
        self.wikis
            .iter()
            .map(|(key, site)| WikiSite {
                id: SiteId::from(key.as_str()),
                base_url: site.url.clone(),
                display_name: site.name.clone(),
                credentials: Credentials {
                    bot_name: site.bot_name.clone(),
                    bot_password: site.bot_password.clone(),
                },
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn two_sites(pages: &str) -> String {
        format!(
            r#"{{
              "wiki": {{
                "fandom": {{ "name": "Fandom", "url": "https://f.example/api.php",
                             "botName": "Bot@sync", "botPassword": "pw" }},
                "reko":   {{ "name": "Reko Wiki", "url": "https://r.example/api.php",
                             "botName": "Bot@sync", "botPassword": "pw" }}
              }}{pages}
            }}"#
        )
    }

    #[test]
    fn loads_valid_config_with_pages() {
        let file = write_config(&two_sites(r#", "pages": ["Foo", "Bar"]"#));
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.wikis.len(), 2);
        assert_eq!(config.pages.as_deref(), Some(&["Foo".to_string(), "Bar".to_string()][..]));
    }

    #[test]
    fn sites_are_emitted_in_key_order() {
        let file = write_config(&two_sites(""));
        let config = Config::load(file.path()).unwrap();
        let sites = config.sites();
        assert_eq!(sites[0].id, SiteId::from("fandom"));
        assert_eq!(sites[1].id, SiteId::from("reko"));
        assert_eq!(sites[1].display_name, "Reko Wiki");
    }

    #[test]
    fn single_site_is_rejected() {
        let file = write_config(
            r#"{ "wiki": { "reko": { "name": "Reko", "url": "https://r/api.php",
                 "botName": "b", "botPassword": "p" } } }"#,
        );
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TooFewSites { found: 1 }));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let file = write_config(
            r#"{ "wiki": {
                 "a": { "name": "A", "url": "https://a/api.php", "botName": "", "botPassword": "p" },
                 "b": { "name": "B", "url": "https://b/api.php", "botName": "b", "botPassword": "p" }
               } }"#,
        );
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSite { ref key, .. } if key == "a"));
    }

    #[test]
    fn empty_page_list_is_rejected() {
        let file = write_config(&two_sites(r#", "pages": ["", "  "]"#));
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPageList));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
