// Table files on disk: writing, loading through the configuration, caching

mod common;

use emshower::{
    clear_table_cache, get_or_load_tables, Config, CrossSectionProvider, LadderProvider, Process,
    ProcessTables, Shower, ShowerError, TableLibrary,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write_all(dir: &Path, processes: &[Process]) {
    for &process in processes {
        let tables = common::library().get(process).unwrap();
        let path = dir.join(format!("{}.json", process.name()));
        tables.write_json(&path).unwrap();
    }
}

#[test]
fn test_written_tables_load_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Brem.json");
    let original = common::library().get(Process::Brem).unwrap();
    original.write_json(&path).unwrap();

    let loaded = ProcessTables::read_json(&path).unwrap();
    assert_eq!(loaded.process(), Process::Brem);
    assert_eq!(loaded.ladder().lower_cutoff(), common::LOWER_CUTOFF);
    assert_eq!(loaded.ladder().entries(), original.ladder().entries());
    let (a, b) = (
        loaded.cross_section(common::MATERIAL).unwrap(),
        original.cross_section(common::MATERIAL).unwrap(),
    );
    for e in [0.03, 0.5, 12.0, 99.0] {
        assert_eq!(a.evaluate(e), b.evaluate(e));
    }
}

#[test]
fn test_library_from_config_directory() {
    let dir = tempdir().unwrap();
    write_all(dir.path(), &Process::STANDARD);
    let mut config = Config::new();
    config.set_tables(dir.path().to_str().unwrap()).unwrap();

    let library = TableLibrary::from_config(&config, &Process::STANDARD).unwrap();
    assert_eq!(library.processes().len(), 6);
    assert!(library.cross_section_table(Process::Moller, "Graphite").is_ok());
    assert!(library.ladder(Process::DarkBrem).is_err());

    let shower = Shower::new(&library, &common::material(), common::settings(8)).unwrap();
    let particles = shower.generate_shower(&common::seed(22, 2.0)).unwrap();
    assert!(particles.iter().all(|p| p.ended()));
}

#[test]
fn test_explicit_path_overrides_directory() {
    let dir = tempdir().unwrap();
    let other = tempdir().unwrap();
    write_all(dir.path(), &[Process::Compton]);
    let custom = other.path().join("my_compton.json");
    common::library()
        .get(Process::Compton)
        .unwrap()
        .write_json(&custom)
        .unwrap();

    let mut config = Config::new();
    config.set_tables(dir.path().to_str().unwrap()).unwrap();
    config.set_table("Comp", Some(custom.to_str().unwrap())).unwrap();
    assert_eq!(config.get_table(Process::Compton), Some(custom.clone()));
    assert!(TableLibrary::from_config(&config, &[Process::Compton]).is_ok());
}

#[test]
fn test_cache_shares_parsed_tables() {
    let dir = tempdir().unwrap();
    write_all(dir.path(), &[Process::Annihilation]);
    let path = dir.path().join("Ann.json");

    let first = get_or_load_tables(&path).unwrap();
    let second = get_or_load_tables(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    clear_table_cache();
    let third = get_or_load_tables(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let mut config = Config::new();
    config.set_tables(dir.path().to_str().unwrap()).unwrap();
    assert!(matches!(
        TableLibrary::from_config(&config, &[Process::Bhabha]),
        Err(ShowerError::Io { .. })
    ));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("PairProd.json");
    fs::write(&path, "{\"process\": \"PairProd\", \"cross_sections\": ").unwrap();
    assert!(matches!(
        ProcessTables::read_json(&path),
        Err(ShowerError::Parse { .. })
    ));
}

#[test]
fn test_file_for_wrong_process_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Moller.json");
    common::library()
        .get(Process::Bhabha)
        .unwrap()
        .write_json(&path)
        .unwrap();
    let mut config = Config::new();
    config.set_table("Moller", Some(path.to_str().unwrap())).unwrap();
    assert!(matches!(
        TableLibrary::from_config(&config, &[Process::Moller]),
        Err(ShowerError::InvalidTable { .. })
    ));
}

#[test]
fn test_invalid_contents_are_configuration_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Comp.json");
    let mut data = common::library().get(Process::Compton).unwrap().to_data();
    data.cross_sections
        .get_mut(common::MATERIAL)
        .unwrap()
        .reverse();
    fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();
    assert!(matches!(
        ProcessTables::read_json(&path),
        Err(ShowerError::InvalidTable { .. })
    ));
}

#[test]
fn test_unknown_material_is_rejected_at_construction() {
    assert!(matches!(
        Shower::for_material(common::library(), "unobtainium", common::settings(1)),
        Err(ShowerError::UnknownMaterial(_))
    ));
    // known material without tables
    assert!(matches!(
        Shower::for_material(common::library(), "lead", common::settings(1)),
        Err(ShowerError::MissingTable { .. })
    ));
}
