// Electromagnetic and dark-sector shower simulation
pub mod adaptive_map;
pub mod config;
pub mod constants;
pub mod cross_section;
pub mod dark_shower;
pub mod differential;
pub mod error;
pub mod fast_rng;
pub mod kinematics;
pub mod ladder;
pub mod library;
pub mod material;
pub mod particle;
pub mod physics;
pub mod population;
pub mod process;
pub mod sampler;
pub mod settings;
pub mod shower;
pub mod transport;
mod utilities;

pub use adaptive_map::AdaptiveMap;
pub use config::Config;
pub use cross_section::{CrossSectionInterpolant, CrossSectionTable, ProcessRates};
pub use dark_shower::{DarkShower, DarkShowerSource};
pub use error::{Result, ShowerError};
pub use fast_rng::ShowerRng;
pub use kinematics::EventInfo;
pub use ladder::{LadderData, LadderEntry, SampleLadder};
pub use library::{
    clear_table_cache, get_or_load_tables, CrossSectionProvider, LadderProvider, ProcessTableData,
    ProcessTables, TableLibrary,
};
pub use material::Material;
pub use particle::{EndState, Fate, FourMomentum, Particle, SeedParticle, Species};
pub use process::Process;
pub use sampler::{Draw, SampleOutcome, Sampler};
pub use settings::{ExhaustionPolicy, ShowerSettings};
pub use shower::Shower;
pub use transport::{Propagation, Transport};
