use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_FD_BIN: &str = "fd";
pub const DEFAULT_FZF_BIN: &str = "fzf";
pub const DEFAULT_MAX_ITEMS: usize = 10;
pub const DEFAULT_MAX_SIZE: usize = 10_000;
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    ".git",
    ".cache",
    "dist",
    "target",
    "android-studio",
    "Android",
];

/// Bounds applied when turning a tool's stdout into picker items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_items: usize,
    pub max_size: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerConfig {
    pub base_dir: PathBuf,
    pub fd_bin: String,
    pub fzf_bin: String,
    pub exclude: Vec<String>,
    pub limits: DecodeLimits,
}

impl Default for PickerConfig {
    fn default() -> Self {
        let base_dir = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));

        Self {
            base_dir,
            fd_bin: DEFAULT_FD_BIN.to_string(),
            fzf_bin: DEFAULT_FZF_BIN.to_string(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            limits: DecodeLimits::default(),
        }
    }
}

impl PickerConfig {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_dir.is_dir() {
            return Err(Error::InvalidPath(
                self.base_dir.to_string_lossy().into_owned(),
            ));
        }
        if self.fd_bin.trim().is_empty() {
            return Err(Error::InvalidConfig("fd_bin must not be empty".into()));
        }
        if self.fzf_bin.trim().is_empty() {
            return Err(Error::InvalidConfig("fzf_bin must not be empty".into()));
        }
        if self.limits.max_items == 0 {
            return Err(Error::InvalidConfig("max_items must be at least 1".into()));
        }
        if self.limits.max_size == 0 {
            return Err(Error::InvalidConfig("max_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolves a picker label (a path relative to `base_dir`) to the folder it names.
    pub fn resolve(&self, label: &str) -> PathBuf {
        let trimmed = label.trim_end_matches('/');
        let relative = if trimmed.is_empty() { label } else { trimmed };
        self.base_dir.join(Path::new(relative))
    }
}

#[cfg(feature = "nvim")]
impl mlua::FromLua for PickerConfig {
    fn from_lua(value: mlua::Value, _lua: &mlua::Lua) -> mlua::Result<Self> {
        let mut config = PickerConfig::default();
        let table = match value {
            mlua::Value::Nil => return Ok(config),
            mlua::Value::Table(table) => table,
            other => {
                return Err(mlua::Error::RuntimeError(format!(
                    "setup() expects a table, got {}",
                    other.type_name()
                )))
            }
        };

        if let Some(base_dir) = table.get::<Option<String>>("base_dir")? {
            config.base_dir = PathBuf::from(base_dir);
        }
        if let Some(fd_bin) = table.get::<Option<String>>("fd_bin")? {
            config.fd_bin = fd_bin;
        }
        if let Some(fzf_bin) = table.get::<Option<String>>("fzf_bin")? {
            config.fzf_bin = fzf_bin;
        }
        if let Some(exclude) = table.get::<Option<Vec<String>>>("exclude")? {
            config.exclude = exclude;
        }
        if let Some(max_items) = table.get::<Option<usize>>("max_items")? {
            config.limits.max_items = max_items;
        }
        if let Some(max_size) = table.get::<Option<usize>>("max_size")? {
            config.limits.max_size = max_size;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_stock_exclusions() {
        let config = PickerConfig::default();
        assert_eq!(config.fd_bin, "fd");
        assert_eq!(config.fzf_bin, "fzf");
        assert_eq!(config.limits, DecodeLimits { max_items: 10, max_size: 10_000 });
        assert!(config.exclude.iter().any(|e| e == "node_modules"));
        assert_eq!(config.exclude.len(), DEFAULT_EXCLUDES.len());
    }

    #[test]
    fn validate_rejects_missing_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = PickerConfig::with_base_dir(dir.path().join("missing"));
        assert!(matches!(config.validate(), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn validate_rejects_zero_limits_and_empty_binaries() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = PickerConfig::with_base_dir(dir.path());
        assert!(config.validate().is_ok());

        config.limits.max_items = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = PickerConfig::with_base_dir(dir.path());
        config.limits.max_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = PickerConfig::with_base_dir(dir.path());
        config.fzf_bin = "  ".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn resolve_joins_labels_onto_base_dir() {
        let config = PickerConfig::with_base_dir("/srv/home");
        assert_eq!(config.resolve("src/a"), PathBuf::from("/srv/home/src/a"));
        assert_eq!(config.resolve("src/a/"), PathBuf::from("/srv/home/src/a"));
    }
}
