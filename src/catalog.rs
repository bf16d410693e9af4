use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CatalogError;

/// `<root>/<property folder>/tenants`
pub fn tenants_dir(config: &Config, property_name: &str) -> Result<(String, PathBuf), CatalogError> {
    let folder = config
        .property_catalog
        .get(property_name)
        .ok_or_else(|| CatalogError::UnknownProperty(property_name.to_string()))?;
    let dir = config.root_directory().join(folder).join("tenants");
    Ok((folder.clone(), dir))
}

/// Tenant names for a property: the sub-directories of its `tenants` folder,
/// sorted by name. Plain files are ignored.
pub fn tenants(config: &Config, property_name: &str) -> Result<Vec<String>, CatalogError> {
    let (folder, dir) = tenants_dir(config, property_name)?;
    if !dir.is_dir() {
        return Err(CatalogError::TenantsFolderMissing(folder));
    }

    let entries = fs::read_dir(&dir).map_err(|e| CatalogError::Io {
        path: dir.clone(),
        source: e,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CatalogError::Io {
            path: dir.clone(),
            source: e,
        })?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROPERTY: &str = "3306 Seminole Ave, Lynwood Property";

    fn config_in(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.root_directory = root.to_path_buf();
        config
            .property_catalog
            .insert(PROPERTY.to_string(), "3306 Seminole".to_string());
        config
    }

    #[test]
    fn lists_tenant_directories_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tenants_root = dir.path().join("3306 Seminole").join("tenants");
        std::fs::create_dir_all(tenants_root.join("Hector Garcia")).unwrap();
        std::fs::create_dir_all(tenants_root.join("Ana Lopez")).unwrap();
        std::fs::write(tenants_root.join("notes.txt"), "not a tenant").unwrap();

        let names = tenants(&config_in(dir.path()), PROPERTY).unwrap();
        assert_eq!(names, vec!["Ana Lopez", "Hector Garcia"]);
    }

    #[test]
    fn missing_tenants_folder_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = tenants(&config_in(dir.path()), PROPERTY).unwrap_err();
        assert!(matches!(err, CatalogError::TenantsFolderMissing(ref f) if f == "3306 Seminole"));
    }

    #[test]
    fn unknown_property_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = tenants(&config_in(dir.path()), "Elsewhere").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownProperty(_)));
    }
}
