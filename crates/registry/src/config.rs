use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use modreg_core::{validate_module_name, validate_version_label};

use crate::error::RegistryError;
use crate::factory::BackendConfig;

/// Name of the project configuration file inside the work directory.
pub const CONFIG_FILE: &str = "modreg.toml";

/// The module a project publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub version: String,
}

/// Contents of `modreg.toml`.
///
/// ```toml
/// [backend]
/// type = "s3"
/// bucket = "modules"
/// region = "eu-west-1"
///
/// [module]
/// name = "vpc"
/// version = "1.2.3"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub module: Option<ModuleConfig>,
}

impl ProjectConfig {
    /// Load `modreg.toml` from `dir`, applying `key=value` overrides first.
    ///
    /// Override keys are dotted paths (`backend.bucket`, `module.version`).
    /// Relative local backend paths resolve against `dir`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Config`] if the file is missing or malformed, an
    /// override is not `key=value`, or the module section is invalid.
    pub fn load(dir: &Path, overrides: &[String]) -> Result<Self, RegistryError> {
        let path = dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            RegistryError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::parse(&contents, overrides)?;
        debug!(path = %path.display(), backend = config.backend.kind(), "project config loaded");
        Ok(Self {
            backend: config.backend.relative_to(dir),
            module: config.module,
        })
    }

    /// Parse TOML `contents` with `overrides` applied.
    ///
    /// # Errors
    ///
    /// See [`ProjectConfig::load`].
    pub fn parse(contents: &str, overrides: &[String]) -> Result<Self, RegistryError> {
        let mut value: toml::Value = toml::from_str(contents)
            .map_err(|e| RegistryError::Config(format!("invalid {CONFIG_FILE}: {e}")))?;
        for entry in overrides {
            apply_override(&mut value, entry)?;
        }
        let config: Self = value
            .try_into()
            .map_err(|e| RegistryError::Config(format!("invalid {CONFIG_FILE}: {e}")))?;
        if let Some(module) = &config.module {
            module.validate()?;
        }
        Ok(config)
    }

    /// The module section, required by `publish`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Config`] if `[module]` is absent.
    pub fn require_module(&self) -> Result<&ModuleConfig, RegistryError> {
        self.module.as_ref().ok_or_else(|| {
            RegistryError::Config(format!("{CONFIG_FILE} has no [module] section"))
        })
    }
}

impl ModuleConfig {
    fn validate(&self) -> Result<(), RegistryError> {
        validate_module_name(&self.name).map_err(RegistryError::InvalidModuleName)?;
        validate_version_label(&self.version).map_err(RegistryError::Config)
    }
}

fn apply_override(root: &mut toml::Value, entry: &str) -> Result<(), RegistryError> {
    let Some((key, raw)) = entry.split_once('=') else {
        return Err(RegistryError::Config(format!(
            "override '{entry}' is not key=value"
        )));
    };
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(RegistryError::Config(format!(
            "override '{entry}' has an empty key"
        )));
    }

    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return Err(RegistryError::Config(format!(
            "override '{entry}' has an empty key"
        )));
    };

    let mut table = root.as_table_mut().ok_or_else(|| {
        RegistryError::Config(format!("{CONFIG_FILE} is not a table"))
    })?;
    for segment in segments {
        let next = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        table = next.as_table_mut().ok_or_else(|| {
            RegistryError::Config(format!("override '{entry}': '{segment}' is not a table"))
        })?;
    }
    table.insert(leaf.to_owned(), toml::Value::String(raw.trim().to_owned()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const S3_PROJECT: &str = r#"
        [backend]
        type = "s3"
        bucket = "modules"
        region = "eu-west-1"

        [module]
        name = "vpc"
        version = "1.2.3"
    "#;

    #[test]
    fn parse_full_project() {
        let config = ProjectConfig::parse(S3_PROJECT, &[]).unwrap();
        assert_eq!(config.backend.kind(), "s3");
        let module = config.require_module().unwrap();
        assert_eq!(module.name, "vpc");
        assert_eq!(module.version, "1.2.3");
    }

    #[test]
    fn overrides_replace_values() {
        let overrides = vec![
            "module.version=2.0.0".to_owned(),
            "backend.bucket = other".to_owned(),
        ];
        let config = ProjectConfig::parse(S3_PROJECT, &overrides).unwrap();
        assert_eq!(config.require_module().unwrap().version, "2.0.0");
        let BackendConfig::S3(s3) = &config.backend else {
            panic!("expected s3");
        };
        assert_eq!(s3.bucket, "other");
    }

    #[test]
    fn overrides_create_missing_tables() {
        let src = "[backend]\ntype = \"memory\"\n";
        let overrides = vec!["module.name=vpc".to_owned(), "module.version=1.0.0".to_owned()];
        let config = ProjectConfig::parse(src, &overrides).unwrap();
        assert_eq!(
            config.module,
            Some(ModuleConfig {
                name: "vpc".into(),
                version: "1.0.0".into()
            })
        );
    }

    #[test]
    fn override_can_switch_backend() {
        let overrides = vec![
            "backend.type=local".to_owned(),
            "backend.path=/srv/modules".to_owned(),
        ];
        let config = ProjectConfig::parse(S3_PROJECT, &overrides).unwrap();
        let BackendConfig::Local(local) = &config.backend else {
            panic!("expected local");
        };
        assert_eq!(local.path, std::path::PathBuf::from("/srv/modules"));
    }

    #[test]
    fn malformed_override_is_rejected() {
        for bad in ["module.version", "=1.0", "module..version=1"] {
            let err = ProjectConfig::parse(S3_PROJECT, &[bad.to_owned()]).unwrap_err();
            assert!(matches!(err, RegistryError::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn override_through_scalar_is_rejected() {
        let err = ProjectConfig::parse(S3_PROJECT, &["module.name.x=1".to_owned()]).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn missing_module_section() {
        let config = ProjectConfig::parse("[backend]\ntype = \"memory\"\n", &[]).unwrap();
        assert!(matches!(
            config.require_module(),
            Err(RegistryError::Config(_))
        ));
    }

    #[test]
    fn invalid_module_name_is_rejected() {
        let err =
            ProjectConfig::parse(S3_PROJECT, &["module.name=has space".to_owned()]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidModuleName(_)));
    }

    #[test]
    fn path_like_version_is_rejected() {
        let err = ProjectConfig::parse(S3_PROJECT, &["module.version=../../x".to_owned()])
            .unwrap_err();
        assert!(matches!(err, RegistryError::Config(ref m) if m.contains("../../x")));
    }

    #[test]
    fn empty_version_is_rejected() {
        let err = ProjectConfig::parse(S3_PROJECT, &["module.version=".to_owned()]).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn load_reads_file_and_resolves_local_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[backend]\ntype = \"local\"\npath = \"store\"\n",
        )
        .unwrap();
        let config = ProjectConfig::load(dir.path(), &[]).unwrap();
        let BackendConfig::Local(local) = &config.backend else {
            panic!("expected local");
        };
        assert_eq!(local.path, dir.path().join("store"));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProjectConfig::load(dir.path(), &[]).unwrap_err();
        assert!(matches!(err, RegistryError::Config(ref m) if m.contains(CONFIG_FILE)));
    }
}
