//! Zone contamination map (C4).
//!
//! Mapping `zone_id -> load`, the airborne model's environmental state.
//! Zones are sparse and few, so an insertion-ordered map is the right
//! structure: it keeps `decay`/`shed` cheap and keeps `zone_updates` output
//! in a deterministic order without an explicit sort.

use indexmap::IndexMap;

pub type ZoneId = u32;

/// Per-zone airborne viral concentration ("load" / "AQI").
#[derive(Debug, Clone, Default)]
pub struct ZoneMap {
    loads: IndexMap<ZoneId, f64>,
}

impl ZoneMap {
    /// Create a zone map with one entry per distinct zone id, load 0.
    pub fn new<I: IntoIterator<Item = ZoneId>>(zone_ids: I) -> Self {
        let mut loads = IndexMap::new();
        for z in zone_ids {
            loads.entry(z).or_insert(0.0);
        }
        ZoneMap { loads }
    }

    pub fn load(&self, zone: ZoneId) -> f64 {
        self.loads.get(&zone).copied().unwrap_or(0.0)
    }

    /// Multiplicative ventilation decay applied to every zone.
    pub fn decay(&mut self, rate: f64) {
        for load in self.loads.values_mut() {
            *load *= 1.0 - rate;
            debug_assert!(load.is_finite() && *load >= 0.0);
        }
    }

    /// Add `amount` of shedding to `zone`'s load.
    pub fn shed(&mut self, zone: ZoneId, amount: f64) {
        let load = self.loads.entry(zone).or_insert(0.0);
        *load += amount;
        debug_assert!(load.is_finite() && *load >= 0.0);
    }

    /// Probability of airborne infection for a susceptible in `zone`, given
    /// the airborne transmission coefficient `beta_air`.
    pub fn sample_infection_prob(&self, zone: ZoneId, beta_air: f64) -> f64 {
        1.0 - (-beta_air * self.load(zone)).exp()
    }

    /// Zones whose load exceeds `epsilon`, in insertion order.
    pub fn above(&self, epsilon: f64) -> impl Iterator<Item = (ZoneId, f64)> + '_ {
        self.loads
            .iter()
            .filter(move |&(_, &load)| load > epsilon)
            .map(|(&z, &load)| (z, load))
    }

    /// `{mean load across nonzero zones, total load, count of contaminated
    /// zones}`, the environmental summary emitted with every airborne delta.
    pub fn summary(&self) -> (f64, f64, usize) {
        let total: f64 = self.loads.values().sum();
        let contaminated = self.loads.values().filter(|&&l| l > 0.0).count();
        let mean = if contaminated > 0 {
            total / contaminated as f64
        } else {
            0.0
        };
        (mean, total, contaminated)
    }
}
