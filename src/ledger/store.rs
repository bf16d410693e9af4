use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::PropertyRecord;
use crate::error::LedgerError;

/// The whole `properties_data.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerDocument {
    /// First record whose renter key equals the key of `tenant_name`.
    pub fn find_record(&self, tenant_name: &str) -> Result<&PropertyRecord, LedgerError> {
        self.properties
            .iter()
            .find(|p| p.matches_tenant(tenant_name))
            .ok_or_else(|| LedgerError::NoMatchingTenant(tenant_name.to_string()))
    }

    pub fn find_record_mut(&mut self, tenant_name: &str) -> Result<&mut PropertyRecord, LedgerError> {
        self.properties
            .iter_mut()
            .find(|p| p.matches_tenant(tenant_name))
            .ok_or_else(|| LedgerError::NoMatchingTenant(tenant_name.to_string()))
    }
}

/// File-backed ledger: load the whole document, mutate it, rewrite it.
///
/// `save` overwrites the file in place. It is not atomic (a failure halfway
/// through can leave a truncated file) and nothing locks the file, so two
/// running instances race and the last writer wins.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<LedgerDocument, LedgerError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                LedgerError::Missing(self.path.clone())
            } else {
                LedgerError::Io {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;
        serde_json::from_str(&content).map_err(|e| LedgerError::Malformed {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Like `load`, but an absent file is the empty first-run ledger.
    pub fn load_or_empty(&self) -> Result<LedgerDocument, LedgerError> {
        match self.load() {
            Err(LedgerError::Missing(path)) => {
                tracing::warn!(path = %path.display(), "ledger not found, starting empty");
                Ok(LedgerDocument::default())
            }
            other => other,
        }
    }

    pub fn save(&self, document: &LedgerDocument) -> Result<(), LedgerError> {
        let json = to_json_pretty(document).map_err(LedgerError::Encode)?;
        fs::write(&self.path, json).map_err(|e| LedgerError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::info!(path = %self.path.display(), records = document.properties.len(), "ledger saved");
        Ok(())
    }
}

/// Pretty JSON with four-space indentation, the layout the ledger files use.
pub(crate) fn to_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
