//! Population state (C3).
//!
//! Mapping `individual_id -> compartment`, plus a counts cache kept in sync
//! by the single point that mutates compartment. Population is dense (ids are
//! `0..N-1`), so a flat `Vec` is the natural backing store.

use crate::prelude::Id;

/// The epidemiological compartment of an individual at a given instant.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
    Dead,
}

impl Compartment {
    fn slot(self) -> usize {
        match self {
            Compartment::Susceptible => 0,
            Compartment::Exposed => 1,
            Compartment::Infectious => 2,
            Compartment::Recovered => 3,
            Compartment::Dead => 4,
        }
    }
}

/// Aggregate counts per compartment, always in sync with the population
/// vector.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Counts {
    pub susceptible: u32,
    pub exposed: u32,
    pub infectious: u32,
    pub recovered: u32,
    pub dead: u32,
}

impl Counts {
    fn bump(&mut self, compartment: Compartment, delta: i32) {
        let field = match compartment {
            Compartment::Susceptible => &mut self.susceptible,
            Compartment::Exposed => &mut self.exposed,
            Compartment::Infectious => &mut self.infectious,
            Compartment::Recovered => &mut self.recovered,
            Compartment::Dead => &mut self.dead,
        };
        *field = (*field as i32 + delta) as u32;
    }

    pub fn total(&self) -> u32 {
        self.susceptible + self.exposed + self.infectious + self.recovered + self.dead
    }
}

/// Returns true iff `from -> to` is one of the permitted transitions
/// (S->E, E->I, I->R, I->D). No reinfection, no direct S->I.
fn is_permitted_transition(from: Compartment, to: Compartment) -> bool {
    use Compartment::*;
    matches!(
        (from, to),
        (Susceptible, Exposed) | (Exposed, Infectious) | (Infectious, Recovered) | (Infectious, Dead)
    )
}

/// Dense per-individual compartment storage with a synced counts cache.
#[derive(Debug, Clone)]
pub struct PopulationState {
    compartments: Vec<Compartment>,
    counts: Counts,
}

impl PopulationState {
    /// Build a population of `n` individuals, all Susceptible.
    pub fn new(n: usize) -> Self {
        PopulationState {
            compartments: vec![Compartment::Susceptible; n],
            counts: Counts {
                susceptible: n as u32,
                ..Counts::default()
            },
        }
    }

    pub fn len(&self) -> usize {
        self.compartments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }

    /// Current compartment of `id`.
    pub fn get(&self, id: Id) -> Compartment {
        self.compartments[id]
    }

    /// Set `id`'s compartment to `to`. Debug builds assert the transition is
    /// permitted; release builds apply it unconditionally. Internal invariant
    /// violations are a debug-time assertion, not a release-time abort.
    pub fn set(&mut self, id: Id, to: Compartment) {
        let from = self.compartments[id];
        debug_assert!(
            is_permitted_transition(from, to),
            "illegal transition {:?} -> {:?} for id {}",
            from,
            to,
            id
        );
        self.counts.bump(from, -1);
        self.counts.bump(to, 1);
        self.compartments[id] = to;
    }

    /// Current aggregate counts per compartment.
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Iterate over every (id, compartment) pair, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, Compartment)> + '_ {
        self.compartments.iter().copied().enumerate()
    }
}
