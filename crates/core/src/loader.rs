use crate::dialect::Dialect;
use crate::error::ConfigError;
use crate::registry::Registry;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of one dialect file: any number of `[[dialect]]` tables.
#[derive(Debug, Default, Deserialize)]
struct DialectFile {
    #[serde(default)]
    dialect: Vec<Dialect>,
}

/// Loader for caller dialect files
///
/// Dialects are read from `*.toml` files in the standard directory first and
/// the custom directory second, each directory in lexical file order, so a
/// later file overrides an earlier one for the same item root.
///
/// ```toml
/// [[dialect]]
/// name = "Podcast"
/// item_root = "rss/channel/item"
///
/// [dialect.namespaces]
/// itunes = "http://www.itunes.com/dtds/podcast-1.0.dtd"
///
/// [dialect.fields]
/// duration = "string(itunes:duration)"
/// ```
#[derive(Debug, Clone, Default)]
pub struct DialectLoader {
    /// Custom dialect directory path
    custom_dir: Option<PathBuf>,
    /// Standard dialect directory path
    standard_dir: Option<PathBuf>,
}

impl DialectLoader {
    /// Loader that reads no directories
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None }
    }

    pub fn builder() -> DialectLoaderBuilder {
        DialectLoaderBuilder::new()
    }

    /// Loader for the default directory (`~/.config/syndicate/dialects`)
    pub fn with_default_dir() -> Self {
        DialectLoaderBuilder::new().default_standard_dir().build()
    }

    /// Parse dialects from TOML text
    pub fn parse_str(content: &str, path: &Path) -> Result<Vec<Dialect>, ConfigError> {
        let file: DialectFile = toml::from_str(content)
            .map_err(|e| ConfigError::Load { path: path.to_path_buf(), reason: e.to_string() })?;
        Ok(file.dialect)
    }

    /// Load dialects from one file
    pub fn load_file(path: &Path) -> Result<Vec<Dialect>, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load { path: path.to_path_buf(), reason: e.to_string() })?;
        let dialects = Self::parse_str(&content, path)?;
        tracing::debug!("Loaded {} dialect(s) from {}", dialects.len(), path.display());
        Ok(dialects)
    }

    /// Load every `*.toml` file of a directory in lexical order
    ///
    /// A missing directory yields no dialects.
    pub fn load_dir(dir: &Path) -> Result<Vec<Dialect>, ConfigError> {
        if !dir.is_dir() {
            tracing::debug!("Dialect directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(dir).map_err(|e| ConfigError::Load { path: dir.to_path_buf(), reason: e.to_string() })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort();

        let mut dialects = Vec::new();
        for file in &files {
            dialects.extend(Self::load_file(file)?);
        }
        Ok(dialects)
    }

    /// Load all configured dialects, standard directory first
    pub fn load(&self) -> Result<Vec<Dialect>, ConfigError> {
        let mut dialects = Vec::new();

        if let Some(standard_dir) = &self.standard_dir {
            dialects.extend(Self::load_dir(standard_dir)?);
        }

        if let Some(custom_dir) = &self.custom_dir {
            dialects.extend(Self::load_dir(custom_dir)?);
        }

        Ok(dialects)
    }

    /// Load all configured dialects and build a registry from them
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        Registry::build(self.load()?)
    }

    /// Get default dialect directory (~/.config/syndicate/dialects)
    fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("syndicate").join("dialects"))
    }
}

/// Builder for DialectLoader
#[derive(Debug, Default)]
pub struct DialectLoaderBuilder {
    custom_dir: Option<PathBuf>,
    standard_dir: Option<PathBuf>,
}

impl DialectLoaderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None }
    }

    /// Set custom dialect directory
    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set standard dialect directory
    pub fn standard_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.standard_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use `~/.config/syndicate/dialects` as the standard directory, if there is a home directory
    pub fn default_standard_dir(mut self) -> Self {
        self.standard_dir = DialectLoader::default_dir();
        self
    }

    /// Build the DialectLoader
    pub fn build(self) -> DialectLoader {
        DialectLoader { custom_dir: self.custom_dir, standard_dir: self.standard_dir }
    }
}
