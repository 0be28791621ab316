// Loading and sharing of precomputed per-process tables
use crate::config::Config;
use crate::cross_section::CrossSectionTable;
use crate::error::{Result, ShowerError};
use crate::ladder::{LadderData, SampleLadder};
use crate::material::Material;
use crate::process::Process;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// Global cache of parsed table files, keyed by path
static TABLE_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<ProcessTables>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Source of total cross section tables.
pub trait CrossSectionProvider {
    fn cross_section_table(&self, process: Process, material: &str) -> Result<Arc<CrossSectionTable>>;
}

/// Source of importance-sampling ladders.
pub trait LadderProvider {
    fn ladder(&self, process: Process) -> Result<Arc<SampleLadder>>;
}

/// JSON layout of one table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTableData {
    pub process: String,
    /// Material name -> [[energy GeV, cross section GeV^-2], ...]
    pub cross_sections: BTreeMap<String, Vec<[f64; 2]>>,
    pub ladder: LadderData,
}

/// Everything precomputed for one process: its cross section in each
/// material plus its sampling ladder. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProcessTables {
    process: Process,
    cross_sections: HashMap<String, Arc<CrossSectionTable>>,
    ladder: Arc<SampleLadder>,
}

impl ProcessTables {
    pub fn new(
        process: Process,
        cross_sections: HashMap<String, CrossSectionTable>,
        ladder: SampleLadder,
    ) -> Result<Self> {
        let mismatch = || ShowerError::InvalidTable {
            process: process.name().to_string(),
            reason: "table belongs to a different process".to_string(),
        };
        if ladder.process() != process {
            return Err(mismatch());
        }
        let mut tables = HashMap::new();
        for (material, table) in cross_sections {
            let material = Material::from_name(&material)?;
            if table.process() != process {
                return Err(mismatch());
            }
            tables.insert(material.name, Arc::new(table));
        }
        Ok(Self {
            process,
            cross_sections: tables,
            ladder: Arc::new(ladder),
        })
    }

    pub fn from_data(data: ProcessTableData) -> Result<Self> {
        let process: Process = data.process.parse()?;
        let mut cross_sections = HashMap::new();
        for (material, pairs) in &data.cross_sections {
            cross_sections.insert(material.clone(), CrossSectionTable::new(process, pairs)?);
        }
        let ladder = SampleLadder::new(process, data.ladder)?;
        Self::new(process, cross_sections, ladder)
    }

    pub fn to_data(&self) -> ProcessTableData {
        let cross_sections = self
            .cross_sections
            .iter()
            .map(|(name, table)| {
                let pairs = table
                    .energies()
                    .iter()
                    .zip(table.values())
                    .map(|(&e, &s)| [e, s])
                    .collect();
                (name.clone(), pairs)
            })
            .collect();
        ProcessTableData {
            process: self.process.name().to_string(),
            cross_sections,
            ladder: self.ladder.to_data(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: ProcessTableData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ShowerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: ProcessTableData =
            serde_json::from_str(&text).map_err(|source| ShowerError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_data(data)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string(&self.to_data()).map_err(|source| ShowerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| ShowerError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn materials(&self) -> Vec<&str> {
        self.cross_sections.keys().map(String::as_str).collect()
    }

    pub fn cross_section(&self, material: &str) -> Option<&Arc<CrossSectionTable>> {
        self.cross_sections.get(&material.trim().to_lowercase())
    }

    pub fn ladder(&self) -> &Arc<SampleLadder> {
        &self.ladder
    }
}

/// Load a table file once per process; later calls share the parsed copy.
pub fn get_or_load_tables<P: AsRef<Path>>(path: P) -> Result<Arc<ProcessTables>> {
    let path = path.as_ref().to_path_buf();
    {
        let cache = TABLE_CACHE.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(tables) = cache.get(&path) {
            return Ok(Arc::clone(tables));
        }
    }
    let tables = Arc::new(ProcessTables::read_json(&path)?);
    log::debug!("loaded {} tables from {}", tables.process(), path.display());
    let mut cache = TABLE_CACHE.lock().unwrap_or_else(|p| p.into_inner());
    Ok(Arc::clone(cache.entry(path).or_insert(tables)))
}

pub fn clear_table_cache() {
    TABLE_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clear();
}

/// The set of process tables a shower draws on.
#[derive(Debug, Clone, Default)]
pub struct TableLibrary {
    tables: HashMap<Process, Arc<ProcessTables>>,
}

impl TableLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the listed processes from the paths a configuration points at.
    pub fn from_config(config: &Config, processes: &[Process]) -> Result<Self> {
        let mut library = Self::new();
        for &process in processes {
            let path = config
                .get_table(process)
                .ok_or(ShowerError::NoTableSource(process))?;
            let tables = get_or_load_tables(&path)?;
            if tables.process() != process {
                return Err(ShowerError::InvalidTable {
                    process: process.name().to_string(),
                    reason: format!("{} holds {} tables", path.display(), tables.process()),
                });
            }
            library.tables.insert(process, tables);
        }
        Ok(library)
    }

    /// Same as [`TableLibrary::from_config`] using the global [`Config`].
    pub fn from_global_config(processes: &[Process]) -> Result<Self> {
        let config = Config::global().clone();
        Self::from_config(&config, processes)
    }

    pub fn insert(&mut self, tables: ProcessTables) {
        self.tables.insert(tables.process(), Arc::new(tables));
    }

    pub fn with(mut self, tables: ProcessTables) -> Self {
        self.insert(tables);
        self
    }

    pub fn get(&self, process: Process) -> Option<&Arc<ProcessTables>> {
        self.tables.get(&process)
    }

    pub fn processes(&self) -> Vec<Process> {
        let mut out: Vec<Process> = self.tables.keys().copied().collect();
        out.sort();
        out
    }
}

impl CrossSectionProvider for TableLibrary {
    fn cross_section_table(&self, process: Process, material: &str) -> Result<Arc<CrossSectionTable>> {
        let missing = || ShowerError::MissingTable {
            process,
            material: material.to_string(),
        };
        let tables = self.tables.get(&process).ok_or_else(missing)?;
        tables.cross_section(material).cloned().ok_or_else(missing)
    }
}

impl LadderProvider for TableLibrary {
    fn ladder(&self, process: Process) -> Result<Arc<SampleLadder>> {
        self.tables
            .get(&process)
            .map(|t| Arc::clone(t.ladder()))
            .ok_or(ShowerError::MissingLadder(process))
    }
}
