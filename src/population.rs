// Growing population of shower particles
//
// Particles are only ever appended. A cursor walks the list in creation
// order, so every particle is handed out for propagation exactly once and
// the list itself ends up as the shower output.

use crate::particle::{Fate, Particle};

/// The particles of one shower, in creation order.
#[derive(Debug, Clone)]
pub struct ShowerPopulation {
    particles: Vec<Particle>,
    /// Index of the next particle to propagate
    cursor: usize,
}

impl ShowerPopulation {
    fn with_capacity(capacity: usize) -> Self {
        ShowerPopulation {
            particles: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Start a population from its seed particle.
    pub fn seeded(seed: Particle) -> Self {
        let mut population = Self::with_capacity(64);
        population.push(seed);
        population
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Index of the next particle awaiting propagation.
    pub fn next_pending(&mut self) -> Option<usize> {
        while self.cursor < self.particles.len() {
            let idx = self.cursor;
            self.cursor += 1;
            if !self.particles[idx].ended() {
                return Some(idx);
            }
        }
        None
    }

    pub fn get(&self, idx: usize) -> Option<&Particle> {
        self.particles.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Particle> {
        self.particles.get_mut(idx)
    }

    pub fn all_ended(&self) -> bool {
        self.particles.iter().all(Particle::ended)
    }

    /// The finished shower, without particles the exhaustion policy dropped.
    pub fn into_particles(self) -> Vec<Particle> {
        self.particles
            .into_iter()
            .filter(|p| !matches!(p.end().map(|e| e.fate), Some(Fate::Dropped)))
            .collect()
    }
}
