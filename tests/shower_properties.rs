// Structural properties every generated shower must satisfy

mod common;

use emshower::constants::M_ELECTRON;
use emshower::{
    ExhaustionPolicy, Fate, Particle, Process, Shower, ShowerError, ShowerRng, ShowerSettings, Species,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

fn shower(settings: ShowerSettings) -> Shower {
    Shower::new(common::library(), &common::material(), settings).unwrap()
}

fn run(pdg: i32, energy: f64, seed: u64) -> Vec<Particle> {
    common::init_logging();
    let shower = shower(common::settings(seed));
    shower.generate_shower(&common::seed(pdg, energy)).unwrap()
}

fn by_id(particles: &[Particle]) -> HashMap<u128, &Particle> {
    particles.iter().map(|p| (p.id, p)).collect()
}

fn children_of(particles: &[Particle]) -> HashMap<u128, Vec<&Particle>> {
    let mut out: HashMap<u128, Vec<&Particle>> = HashMap::new();
    for p in particles.iter().filter(|p| p.generation > 0) {
        out.entry(p.parent_id).or_default().push(p);
    }
    out
}

#[test]
fn test_every_particle_ends() {
    for (pdg, seed) in [(22, 1), (11, 2), (-11, 3)] {
        let particles = run(pdg, 5.0, seed);
        assert!(particles.len() > 1, "pdg {} produced no secondaries", pdg);
        assert!(particles.iter().all(Particle::ended));
        assert!(particles.iter().all(|p| p.end().is_some()));
    }
}

#[test]
fn test_lineage_is_consistent() {
    let particles = run(22, 10.0, 7);
    let ids: HashSet<u128> = particles.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), particles.len(), "duplicate ids");

    let index = by_id(&particles);
    assert_eq!(index[&1].generation, 0);
    assert_eq!(index[&1].parent_id, 0);
    for p in particles.iter().filter(|p| p.generation > 0) {
        let parent = index.get(&p.parent_id).expect("parent missing from shower");
        assert_eq!(p.generation, parent.generation + 1);
        assert_eq!(p.id / 2, parent.id);
        assert_eq!(p.parent_pdg, parent.pdg());
        let creator = p.creator.expect("secondary without creating process");
        assert_eq!(parent.end().unwrap().fate, Fate::Interacted { process: creator });
        assert!(creator.incident().contains(&parent.species));
        // secondaries start where the parent interacted
        assert_eq!(&p.r0, parent.rf().unwrap());
    }
    for siblings in children_of(&particles).values() {
        assert!(siblings.len() <= 2);
        if siblings.len() == 2 {
            assert_ne!(siblings[0].id % 2, siblings[1].id % 2);
        }
    }
}

#[test]
fn test_energy_conserved_at_branchings() {
    for (pdg, seed) in [(22, 11), (11, 12), (-11, 13)] {
        let particles = run(pdg, 8.0, seed);
        let index = by_id(&particles);
        for (parent_id, kids) in children_of(&particles) {
            let parent = index[&parent_id];
            let incident = parent.pf().unwrap().e;
            let process = kids[0].creator.unwrap();
            // two-body processes take an atomic electron's rest energy too
            let target = match process.target() {
                emshower::process::TargetKind::Electrons => M_ELECTRON,
                emshower::process::TargetKind::Nuclei => 0.0,
            };
            let out: f64 = kids.iter().map(|k| k.p0.e).sum();
            assert!(
                out <= incident + target + 1e-9,
                "{}: {} -> {} GeV",
                process,
                incident,
                out
            );
        }
    }
}

#[test]
fn test_children_are_on_shell_and_above_minimum() {
    let particles = run(11, 6.0, 21);
    for p in particles.iter().filter(|p| p.generation > 0) {
        assert!(p.p0.e > common::MIN_ENERGY);
        assert!(p.p0.e >= p.mass);
        assert!((p.p0.mass() - p.mass).abs() < 1e-5, "{} {:?}", p.species, p.p0);
        assert_eq!(p.weight, 1.0);
    }
}

#[test]
fn test_photon_below_thresholds_is_terminal() {
    let settings = ShowerSettings {
        min_energy: 0.010,
        ..common::settings(5)
    };
    let shower = shower(settings);
    assert!(shower.threshold(Species::Photon) > 0.015);
    let particles = shower.generate_shower(&common::seed(22, 0.015)).unwrap();
    assert_eq!(particles.len(), 1);
    let end = particles[0].end().unwrap();
    assert_eq!(end.fate, Fate::BelowThreshold);
    assert_eq!(end.pf, Some(particles[0].p0));
    assert_eq!(end.rf, particles[0].r0);
}

#[test]
fn test_positron_at_minimum_energy_terminates() {
    let particles = run(-11, common::MIN_ENERGY, 6);
    assert_eq!(particles.len(), 1);
    let positron = &particles[0];
    assert_eq!(positron.pf(), Some(&positron.p0));
    assert_eq!(positron.end().unwrap().fate, Fate::BelowThreshold);
}

#[test]
fn test_graphite_photon_shower_terminates_below_minimum() {
    let particles = run(22, 20.0, 99);
    assert!(particles.len() > 10);
    for p in &particles {
        let end = p.end().unwrap();
        match end.fate {
            Fate::BelowThreshold | Fate::RangedOut { .. } => {
                assert!(end.final_energy() <= common::MIN_ENERGY + 1e-12)
            }
            Fate::Interacted { .. } | Fate::NoViableSecondaries => {}
            other => panic!("unexpected fate {:?}", other),
        }
    }
    let ranged = particles
        .iter()
        .filter(|p| matches!(p.end().unwrap().fate, Fate::RangedOut { .. }))
        .count();
    assert!(ranged > 0);
}

#[test]
fn test_seed_direction_carries_to_first_interaction() {
    let mut rng = StdRng::seed_from_u64(31);
    let shower = shower(common::settings(31));
    for _ in 0..5 {
        let dir = common::random_direction(&mut rng);
        let seed = common::seed_along(22, 3.0, dir);
        let particles = shower.generate_shower_with_rng(&seed, &mut rng).unwrap();
        let first = &particles[0];
        let rf = first.rf().unwrap();
        // photons fly straight
        let along = rf.dot(&nalgebra::Vector3::from(dir));
        assert!((along - rf.norm()).abs() < 1e-9 * rf.norm().max(1.0));
        // the secondaries' momenta add up to the photon's (nuclear recoil is tiny)
        if let Fate::Interacted { process: Process::PairProd } = first.end().unwrap().fate {
            let total: nalgebra::Vector3<f64> = particles[1..]
                .iter()
                .filter(|p| p.generation == 1)
                .map(|p| p.p0.p)
                .sum();
            if particles.iter().filter(|p| p.generation == 1).count() == 2 {
                let cos = total.normalize().dot(&first.p0.p.normalize());
                assert!(cos > 0.99, "cos = {}", cos);
            }
        }
    }
}

#[test]
fn test_sample_counts_recorded_as_weights() {
    let settings = ShowerSettings {
        record_sample_counts: true,
        ..common::settings(41)
    };
    let particles = shower(settings).generate_shower(&common::seed(22, 4.0)).unwrap();
    let secondaries: Vec<_> = particles.iter().filter(|p| p.generation > 0).collect();
    assert!(!secondaries.is_empty());
    for p in secondaries {
        assert!(p.weight >= 1.0);
        assert_eq!(p.weight.fract(), 0.0);
    }
}

fn starved(policy: ExhaustionPolicy) -> Shower {
    common::init_logging();
    let settings = ShowerSettings {
        peak_scale: 1e15,
        max_attempts: 1,
        exhaustion_policy: policy,
        ..common::settings(51)
    };
    shower(settings)
}

#[test]
fn test_exhaustion_ends_without_secondaries_by_default() {
    let particles = starved(ExhaustionPolicy::EndWithoutSecondaries)
        .generate_shower(&common::seed(22, 2.0))
        .unwrap();
    assert_eq!(particles.len(), 1);
    assert_eq!(particles[0].end().unwrap().fate, Fate::NoViableSecondaries);
    assert!(particles[0].pf().is_some());
}

#[test]
fn test_exhaustion_drop_policy_removes_particle() {
    let particles = starved(ExhaustionPolicy::DropParticle)
        .generate_shower(&common::seed(22, 2.0))
        .unwrap();
    assert!(particles.is_empty());
}

#[test]
fn test_exhaustion_abort_policy_fails_shower() {
    let result = starved(ExhaustionPolicy::Abort).generate_shower(&common::seed(11, 2.0));
    assert!(matches!(
        result,
        Err(ShowerError::SamplingExhausted { energy, .. }) if energy < 2.0
    ));
}

#[test]
fn test_diagnostics() {
    let shower = shower(common::settings(1));
    let mfp = shower.mean_free_path(Species::Photon, 1.0);
    let rate = shower.rate(Process::PairProd, 1.0) + shower.rate(Process::Compton, 1.0);
    assert!((mfp * rate - 1.0).abs() < 1e-12);
    assert_eq!(shower.rate(Process::Brem, 0.001), 0.0);
    assert_eq!(shower.mean_free_path(Species::Electron, 0.001), f64::INFINITY);
    assert!((shower.threshold(Species::Positron) - common::TABLE_MIN).abs() < 1e-12);
    assert_eq!(shower.material().name, common::MATERIAL);
}

#[test]
fn test_unseeded_shower_runs() {
    let settings = ShowerSettings {
        seed: None,
        ..common::settings(0)
    };
    let particles = shower(settings).generate_shower(&common::seed(22, 1.0)).unwrap();
    assert!(particles.iter().all(Particle::ended));
    let mut rng = ShowerRng::new(3);
    let again = shower(common::settings(0))
        .generate_shower_with_rng(&common::seed(22, 1.0), &mut rng)
        .unwrap();
    assert!(!again.is_empty());
}
