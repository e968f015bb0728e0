use std::path::PathBuf;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::errors::AttestError;
use super::catalog::Catalog;
use super::snapshots::*;

/// External sources an agent can declare as prerequisites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSourceKind {
    Assessments,
    Implementations,
    Poam,
    Inventory,
    Inheritance,
}

impl DataSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assessments => "assessments",
            Self::Implementations => "implementations",
            Self::Poam => "poam",
            Self::Inventory => "inventory",
            Self::Inheritance => "inheritance",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Assessments => "Assessment statuses",
            Self::Implementations => "Implementation notes",
            Self::Poam => "POA&M entries",
            Self::Inventory => "Organizational inventory",
            Self::Inheritance => "Shared responsibility matrix",
        }
    }
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time, read-only view of every data collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComplianceData {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub assessments: AssessmentSnapshot,
    #[serde(default)]
    pub implementations: ImplementationSnapshot,
    #[serde(default)]
    pub poam: PoamSnapshot,
    #[serde(default)]
    pub inventory: InventorySnapshot,
    #[serde(default)]
    pub inheritance: InheritanceSnapshot,
}

impl ComplianceData {
    /// Current cardinality of a source; zero means absent.
    pub fn count(&self, kind: DataSourceKind) -> usize {
        match kind {
            DataSourceKind::Assessments => self.assessments.len(),
            DataSourceKind::Implementations => self.implementations.len(),
            DataSourceKind::Poam => self.poam.len(),
            DataSourceKind::Inventory => self.inventory.len(),
            DataSourceKind::Inheritance => self.inheritance.len(),
        }
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read the current state of every collaborator.
    async fn snapshot(&self) -> Result<ComplianceData, AttestError>;
}

/// Fixed in-memory data, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    data: ComplianceData,
}

impl StaticDataSource {
    pub fn new(data: ComplianceData) -> Self {
        Self { data }
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    async fn snapshot(&self) -> Result<ComplianceData, AttestError> {
        Ok(self.data.clone())
    }
}

/// Reads one JSON file per collaborator from a directory on every snapshot.
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub const CATALOG_FILE: &'static str = "catalog.json";
    pub const ASSESSMENTS_FILE: &'static str = "assessments.json";
    pub const IMPLEMENTATIONS_FILE: &'static str = "implementations.json";
    pub const POAM_FILE: &'static str = "poam.json";
    pub const INVENTORY_FILE: &'static str = "inventory.json";
    pub const INHERITANCE_FILE: &'static str = "inheritance.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Partitions come from the catalog, so unlike the collaborator files it must exist.
    async fn read_catalog(&self) -> Result<Catalog, AttestError> {
        let path = self.dir.join(Self::CATALOG_FILE);
        if !tokio::fs::try_exists(&path).await? {
            return Err(AttestError::Data(format!(
                "reference catalog {} not found",
                path.display()
            )));
        }
        let catalog: Catalog = self.read_or_default(Self::CATALOG_FILE).await?;
        if catalog.is_empty() {
            warn!(file = %path.display(), "Reference catalog has no families; fan-out agents will make no calls");
        }
        Ok(catalog)
    }

    async fn read_or_default<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, AttestError> {
        let path = self.dir.join(file);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = %path.display(), "Data file absent, using empty snapshot");
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| AttestError::Data(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl DataSource for JsonDirSource {
    async fn snapshot(&self) -> Result<ComplianceData, AttestError> {
        Ok(ComplianceData {
            catalog: self.read_catalog().await?,
            assessments: self.read_or_default(Self::ASSESSMENTS_FILE).await?,
            implementations: self.read_or_default(Self::IMPLEMENTATIONS_FILE).await?,
            poam: self.read_or_default(Self::POAM_FILE).await?,
            inventory: self.read_or_default(Self::INVENTORY_FILE).await?,
            inheritance: self.read_or_default(Self::INHERITANCE_FILE).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_dir_missing_files_are_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(JsonDirSource::CATALOG_FILE), "{}").unwrap();
        let data = JsonDirSource::new(dir.path()).snapshot().await.unwrap();
        assert_eq!(data, ComplianceData::default());
        assert_eq!(data.count(DataSourceKind::Inheritance), 0);
    }

    #[tokio::test]
    async fn test_json_dir_reads_present_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(JsonDirSource::CATALOG_FILE),
            r#"{"families": [{"id": "AC", "name": "Access Control"}]}"#,
        ).unwrap();
        std::fs::write(
            dir.path().join(JsonDirSource::ASSESSMENTS_FILE),
            r#"{"3.1.1[a]": "met", "3.1.2[a]": "partial"}"#,
        ).unwrap();
        std::fs::write(
            dir.path().join(JsonDirSource::INHERITANCE_FILE),
            r#"{"3.1.1": {"responsibility": "shared", "provider": "CloudCo"}}"#,
        ).unwrap();

        let data = JsonDirSource::new(dir.path()).snapshot().await.unwrap();
        assert_eq!(data.count(DataSourceKind::Assessments), 2);
        assert_eq!(data.count(DataSourceKind::Inheritance), 1);
        assert_eq!(data.count(DataSourceKind::Poam), 0);
        assert_eq!(data.catalog.partitions().count(), 1);
    }

    #[tokio::test]
    async fn test_json_dir_missing_catalog_is_data_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(JsonDirSource::ASSESSMENTS_FILE),
            r#"{"3.1.1[a]": "met"}"#,
        ).unwrap();
        let err = JsonDirSource::new(dir.path()).snapshot().await.unwrap_err();
        match err {
            AttestError::Data(msg) => assert!(msg.contains(JsonDirSource::CATALOG_FILE)),
            other => panic!("expected Data error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_json_dir_malformed_file_is_data_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(JsonDirSource::CATALOG_FILE), "{}").unwrap();
        std::fs::write(dir.path().join(JsonDirSource::POAM_FILE), "{not json").unwrap();
        let err = JsonDirSource::new(dir.path()).snapshot().await.unwrap_err();
        assert!(matches!(err, AttestError::Data(_)));
    }
}
