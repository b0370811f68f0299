use modreg_store::StoreError;
use thiserror::Error;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No metadata or artifact matches the requested module (and version).
    #[error("module not found in the given backend: {}", describe(.name, .version.as_deref()))]
    ModuleNotFound {
        name: String,
        version: Option<String>,
    },

    /// A publish without overwrite hit an existing release.
    #[error("module already exists in the given backend: {}", describe(.name, .version.as_deref()))]
    ModuleAlreadyExists {
        name: String,
        version: Option<String>,
    },

    /// The version token could not be mapped to a release.
    #[error("cannot resolve version '{target}' of module '{name}'")]
    VersionResolution { name: String, target: String },

    /// The module name does not satisfy the naming rules.
    #[error("invalid module name: {0}")]
    InvalidModuleName(String),

    /// Project or backend configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Building the module archive failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// The underlying blob store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Metadata could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{name}@{version}"),
        None => name.to_owned(),
    }
}

impl RegistryError {
    /// Create a [`RegistryError::ModuleNotFound`].
    pub fn not_found(name: impl Into<String>, version: Option<&str>) -> Self {
        Self::ModuleNotFound {
            name: name.into(),
            version: version.map(str::to_owned),
        }
    }

    /// Returns `true` for errors caused by the request rather than the
    /// environment. These are never worth retrying.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotFound { .. }
                | Self::ModuleAlreadyExists { .. }
                | Self::VersionResolution { .. }
                | Self::InvalidModuleName(_)
                | Self::Config(_)
        )
    }
}
