//! Common types re-exported for convenient `use epitrace::prelude::*;`.

pub use crate::contact::{ContactEvent, ContactGroups};
pub use crate::delta::{Delta, EnvironmentalSummary, InfectionMethod, InfectionRecord};
pub use crate::driver::Driver;
pub use crate::event::{EventKind, ScheduledEvent};
pub use crate::params::{AirborneParams, ConfigError, SeirParams};
pub use crate::population::{Compartment, PopulationState};
pub use crate::rng::Rng;
pub use crate::zone::{ZoneId, ZoneMap};

/// Individual id. Dense, 0..N-1.
pub type Id = usize;

/// Seconds since epoch. Signed so drain-phase arithmetic and synthetic
/// fixtures with pre-epoch timestamps never silently wrap.
pub type Time = i64;
