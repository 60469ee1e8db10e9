//! Event-driven SEIR / airborne contagion engine.
//!
//! Consumes a temporal contact log and a handful of epidemiological
//! parameters and produces a lazily-pulled stream of [`delta::Delta`]
//! records describing every state transition in the simulated population.

pub mod contact;
pub mod delta;
pub mod driver;
pub mod event;
pub mod params;
pub mod population;
pub mod prelude;
pub mod rng;
pub mod stepper;
pub mod zone;

pub use prelude::*;
