use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PreferencesError;
use crate::ledger::store::to_json_pretty;

/// Remembered tenant per property (`default_tenants.json`).
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTenants {
    path: PathBuf,
    tenants: BTreeMap<String, String>,
}

impl DefaultTenants {
    /// Reads the preference file. An absent file is an empty mapping.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let tenants = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| PreferencesError::Malformed {
                path: path.clone(),
                source: e,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(PreferencesError::Io { path, source: e }),
        };
        Ok(Self { path, tenants })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.tenants.get(property).map(String::as_str)
    }

    /// The remembered tenant, but only while it is still one of `available`.
    pub fn preselect<'a>(&self, property: &str, available: &'a [String]) -> Option<&'a str> {
        let remembered = self.get(property)?;
        available
            .iter()
            .find(|t| t.as_str() == remembered)
            .map(String::as_str)
    }

    /// Remembers `tenant` for `property` and rewrites the file right away.
    /// Both are stored exactly as given; blank values are rejected.
    pub fn set_default(&mut self, property: &str, tenant: &str) -> Result<(), PreferencesError> {
        if property.trim().is_empty() {
            return Err(PreferencesError::MissingProperty);
        }
        if tenant.trim().is_empty() {
            return Err(PreferencesError::MissingTenant);
        }

        self.tenants.insert(property.to_string(), tenant.to_string());
        self.save()?;
        tracing::info!(property, tenant, "default tenant set");
        Ok(())
    }

    fn save(&self) -> Result<(), PreferencesError> {
        let json = to_json_pretty(&self.tenants).map_err(PreferencesError::Encode)?;
        fs::write(&self.path, json).map_err(|e| PreferencesError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = DefaultTenants::load(dir.path().join("default_tenants.json")).unwrap();
        assert_eq!(prefs.get("anything"), None);
    }

    #[test]
    fn set_default_persists_immediately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default_tenants.json");

        let mut prefs = DefaultTenants::load(&path).unwrap();
        prefs.set_default("3306 Seminole Ave", "Hector Garcia").unwrap();

        let reloaded = DefaultTenants::load(&path).unwrap();
        assert_eq!(reloaded.get("3306 Seminole Ave"), Some("Hector Garcia"));
    }

    #[test]
    fn blank_selections_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default_tenants.json");
        let mut prefs = DefaultTenants::load(&path).unwrap();

        assert!(matches!(
            prefs.set_default("  ", "Hector Garcia"),
            Err(PreferencesError::MissingProperty)
        ));
        assert!(matches!(
            prefs.set_default("3306 Seminole Ave", ""),
            Err(PreferencesError::MissingTenant)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn stored_keys_match_later_lookups() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default_tenants.json");
        let mut prefs = DefaultTenants::load(&path).unwrap();
        prefs.set_default(" 3306 Seminole Ave", "Hector Garcia ").unwrap();

        let reloaded = DefaultTenants::load(&path).unwrap();
        assert_eq!(reloaded.get(" 3306 Seminole Ave"), Some("Hector Garcia "));

        let present = vec!["Hector Garcia ".to_string()];
        assert_eq!(reloaded.preselect(" 3306 Seminole Ave", &present), Some("Hector Garcia "));
    }

    #[test]
    fn preselect_requires_tenant_to_still_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut prefs = DefaultTenants::load(dir.path().join("default_tenants.json")).unwrap();
        prefs.set_default("3306 Seminole Ave", "Hector Garcia").unwrap();

        let present = vec!["Ana Lopez".to_string(), "Hector Garcia".to_string()];
        assert_eq!(prefs.preselect("3306 Seminole Ave", &present), Some("Hector Garcia"));

        let moved_out = vec!["Ana Lopez".to_string()];
        assert_eq!(prefs.preselect("3306 Seminole Ave", &moved_out), None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default_tenants.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            DefaultTenants::load(&path),
            Err(PreferencesError::Malformed { .. })
        ));
    }
}
