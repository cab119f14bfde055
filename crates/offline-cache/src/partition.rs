//! Versioned cache partitions.
//!
//! Every logical partition maps to one physical store named
//! `<logical>-<version>`. Bumping the version is the only invalidation
//! mechanism: on activation every physical store outside the expected set is
//! deleted wholesale.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The logical partitions managed by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionKind {
    /// HTML entry points, precached on install.
    AppShell,
    /// Scripts, styles, images, wasm and anything else fetched by the app.
    StaticAssets,
    /// Web fonts, precached on install.
    Fonts,
}

impl PartitionKind {
    /// All partition kinds.
    pub const ALL: [PartitionKind; 3] = [Self::AppShell, Self::StaticAssets, Self::Fonts];

    /// The unversioned partition name.
    pub fn logical_name(&self) -> &'static str {
        match self {
            Self::AppShell => "app-shell",
            Self::StaticAssets => "static-assets",
            Self::Fonts => "fonts",
        }
    }
}

impl std::fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.logical_name())
    }
}

/// A logical partition bound to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    logical_name: String,
    version: String,
    physical_name: String,
}

impl Partition {
    /// Create a partition; the physical name is derived from the other two.
    pub fn new(logical_name: impl Into<String>, version: impl Into<String>) -> Self {
        let logical_name = logical_name.into();
        let version = version.into();
        let physical_name = format!("{}-{}", logical_name, version);
        Self {
            logical_name,
            version,
            physical_name,
        }
    }

    /// The unversioned name.
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// The version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The name of the backing store.
    pub fn physical_name(&self) -> &str {
        &self.physical_name
    }
}

/// Maps partition kinds to physical store names for one cache version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRegistry {
    version: String,
}

impl PartitionRegistry {
    /// Create a registry for the given version tag.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// The current version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The partition for `kind` at the current version.
    pub fn partition(&self, kind: PartitionKind) -> Partition {
        Partition::new(kind.logical_name(), self.version.clone())
    }

    /// The physical store name for `kind`.
    pub fn physical_name(&self, kind: PartitionKind) -> String {
        self.partition(kind).physical_name
    }

    /// Physical names of every partition the current version expects.
    pub fn expected_partitions(&self) -> BTreeSet<String> {
        PartitionKind::ALL
            .iter()
            .map(|kind| self.physical_name(*kind))
            .collect()
    }

    /// Names in `existing` that are not expected and must be deleted.
    pub fn reconcile<I, S>(&self, existing: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let expected = self.expected_partitions();
        existing
            .into_iter()
            .map(Into::into)
            .filter(|name| !expected.contains(name))
            .collect()
    }
}
