// Global configuration for locating precomputed shower tables
use crate::error::Result;
use crate::process::Process;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

// Global configuration for table file paths
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Where the per-process table files live.
///
/// Explicit per-process paths take precedence; any process without one is
/// looked up as `<table_dir>/<Process>.json` when a default directory is set.
/// A single global instance is exposed via the `CONFIG` static and should be
/// reached through [`Config::global`].
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Process name -> path to its JSON table file
    pub tables: HashMap<String, String>,
    /// Directory searched for processes without an explicit path
    pub table_dir: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            tables: HashMap::new(),
            table_dir: None,
        }
    }

    /// Set the table file for one process, or the default directory when only
    /// a directory is given.
    pub fn set_table(&mut self, process_or_dir: &str, path: Option<&str>) -> Result<()> {
        match path {
            Some(p) => {
                let process: Process = process_or_dir.parse()?;
                self.tables.insert(process.name().to_string(), p.to_string());
            }
            None => {
                self.table_dir = Some(process_or_dir.to_string());
            }
        }
        Ok(())
    }

    /// Path to the table file for `process`, falling back to the directory.
    pub fn get_table(&self, process: Process) -> Option<PathBuf> {
        self.tables
            .get(process.name())
            .map(PathBuf::from)
            .or_else(|| {
                self.table_dir
                    .as_ref()
                    .map(|dir| PathBuf::from(dir).join(format!("{}.json", process.name())))
            })
    }

    /// Set several table paths at once, or the default directory.
    pub fn set_tables<T>(&mut self, input: T) -> Result<()>
    where
        T: IntoTableSources,
    {
        input.apply(self)
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.table_dir = None;
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Inputs accepted by [`Config::set_tables`]
pub trait IntoTableSources {
    fn apply(self, config: &mut Config) -> Result<()>;
}

impl IntoTableSources for HashMap<String, String> {
    fn apply(self, config: &mut Config) -> Result<()> {
        for (process, path) in self {
            config.set_table(&process, Some(&path))?;
        }
        Ok(())
    }
}

impl IntoTableSources for &str {
    fn apply(self, config: &mut Config) -> Result<()> {
        config.set_table(self, None)
    }
}

impl IntoTableSources for String {
    fn apply(self, config: &mut Config) -> Result<()> {
        IntoTableSources::apply(self.as_str(), config)
    }
}
