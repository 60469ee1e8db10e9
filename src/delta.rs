//! Delta / output shapes.
//!
//! A [`Delta`] is the unit the driver yields: one per observed-change
//! timestamp, plus a terminating `Done` and an `Error` for the two abort
//! paths. Shapes mirror the flat JSON dicts a consumer expects, field for
//! field, via `#[serde(untagged)]` so a caller serializing with
//! `serde_json` gets exactly the flat shape described, no enum tag
//! wrapper.

use crate::prelude::{Id, Time, ZoneId};
use indexmap::IndexMap;
use serde::Serialize;

/// How an individual was exposed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InfectionMethod {
    Contact,
    Airborne,
}

/// One new-infection record: who, by what method, and the attributable
/// source (a contact's id for `Contact`, a zone id for `Airborne`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InfectionRecord {
    pub id: Id,
    pub method: InfectionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneId>,
}

impl InfectionRecord {
    pub fn contact(id: Id, source: Id) -> Self {
        InfectionRecord {
            id,
            method: InfectionMethod::Contact,
            source: Some(source),
            zone: None,
        }
    }

    pub fn airborne(id: Id, zone: ZoneId) -> Self {
        InfectionRecord {
            id,
            method: InfectionMethod::Airborne,
            source: None,
            zone: Some(zone),
        }
    }
}

/// `{avg_aqi, total_aqi, contaminated_zones}`, the environmental summary
/// emitted with every airborne delta.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EnvironmentalSummary {
    pub avg_aqi: f64,
    pub total_aqi: f64,
    pub contaminated_zones: usize,
}

impl EnvironmentalSummary {
    pub fn from_zone_summary(mean: f64, total: f64, contaminated: usize) -> Self {
        EnvironmentalSummary {
            avg_aqi: mean,
            total_aqi: total,
            contaminated_zones: contaminated,
        }
    }
}

/// The full output of the engine: every shape a consumer can receive.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Delta {
    /// Initial delta for the direct-contact SEIR model.
    SeirInitial {
        time: Time,
        infected: Vec<Id>,
        exposed: Vec<Id>,
        recovered: Vec<Id>,
    },
    /// Subsequent delta for the direct-contact SEIR model.
    SeirStep {
        time: Time,
        new_exposed: Vec<Id>,
        new_infected: Vec<Id>,
        new_recovered: Vec<Id>,
        total_exposed: u32,
        total_infected: u32,
        total_recovered: u32,
    },
    /// Initial delta for the airborne model.
    AirborneInitial {
        time: Time,
        infected: Vec<Id>,
        exposed: Vec<Id>,
        recovered: Vec<Id>,
        zone_updates: IndexMap<ZoneId, f64>,
        stats: EnvironmentalSummary,
        total_exposed: u32,
        total_infected: u32,
        total_recovered: u32,
        total_dead: u32,
    },
    /// Subsequent delta for the airborne model.
    AirborneStep {
        time: Time,
        new_infections: Vec<InfectionRecord>,
        new_exposed: Vec<Id>,
        new_infected: Vec<Id>,
        new_recovered: Vec<Id>,
        new_dead: Vec<Id>,
        zone_updates: IndexMap<ZoneId, f64>,
        stats: EnvironmentalSummary,
        total_exposed: u32,
        total_infected: u32,
        total_recovered: u32,
        total_dead: u32,
    },
    /// Terminating marker.
    Done { done: bool },
    /// Configuration, input, or other abort-worthy error. No partial delta
    /// is ever emitted before or after this one.
    Error { error: String },
}

impl Delta {
    pub fn done() -> Self {
        Delta::Done { done: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Delta::Error {
            error: message.into(),
        }
    }

    /// `true` for any delta that should actually be forwarded to the
    /// consumer. Empty intermediate steps (no new exposures, infections,
    /// recoveries, deaths, or zone changes) are not emitted.
    pub fn is_empty_step(&self) -> bool {
        match self {
            Delta::SeirStep {
                new_exposed,
                new_infected,
                new_recovered,
                ..
            } => new_exposed.is_empty() && new_infected.is_empty() && new_recovered.is_empty(),
            Delta::AirborneStep {
                new_infections,
                new_infected,
                new_recovered,
                new_dead,
                zone_updates,
                ..
            } => {
                new_infections.is_empty()
                    && new_infected.is_empty()
                    && new_recovered.is_empty()
                    && new_dead.is_empty()
                    && zone_updates.is_empty()
            }
            _ => false,
        }
    }
}
