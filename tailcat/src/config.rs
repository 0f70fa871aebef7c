use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tailer::{CursorOptions, FileSource};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,

    #[serde(default)]
    pub cursor: CursorOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Only lines containing this text are printed.
    #[serde(default)]
    pub filter: Option<String>,
    /// Byte offset to start reading from.
    #[serde(default)]
    pub offset: u64,
}

impl SourceConfig {
    pub fn build(&self) -> FileSource {
        let source = FileSource::new(&self.path).starting_at(self.offset);
        match &self.filter {
            Some(pattern) => source.with_filter(pattern.clone()),
            None => source,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
