pub mod catalog;
pub mod snapshots;
pub mod source;

pub use catalog::{Catalog, Control, Family, Objective, PartitionKey};
pub use snapshots::*;
pub use source::{ComplianceData, DataSource, DataSourceKind, JsonDirSource, StaticDataSource};
