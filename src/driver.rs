//! Simulation driver (C8).
//!
//! Glues the contact iterator to the stepper: validates parameters and the
//! contact stream, seeds patient zero, pulls one delta per contact group,
//! then drains outstanding scheduled events on a fixed clock. `Driver` is a
//! plain `Iterator<Item = Delta>`; dropping it mid-stream releases
//! everything normally, no explicit teardown required.

use crate::contact::{is_sorted_by_timestamp, ContactEvent, ContactGroups};
use crate::delta::Delta;
use crate::params::{AirborneParams, ConfigError, SeirParams};
use crate::prelude::{Id, Time};
use crate::rng::Rng;
use crate::stepper::{Airborne, Engine, ModelHooks, Seir};
use crate::zone::ZoneId;
use log::debug;
use std::collections::HashMap;

const DRAIN_STEP: Time = 20;
const MAX_DRAIN_ITERATIONS: u32 = 1_000;

fn population_size(events: &[ContactEvent]) -> usize {
    events.iter().map(|e| e.u.max(e.v) + 1).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Unvalidated,
    Streaming,
    Draining(u32),
    Terminating,
    Finished,
}

/// Pull-based driver over one simulation run. Built via [`Driver::seir`] or
/// [`Driver::airborne`]; yields one [`Delta`] per call to `next()` until a
/// `Done` or `Error` delta is reached, after which it yields `None` forever.
pub struct Driver<'a, H: ModelHooks> {
    groups: ContactGroups<'a>,
    core: SeirParams,
    hooks: Option<H>,
    engine: Option<Engine<H>>,
    n: usize,
    zone_of: Vec<ZoneId>,
    start_time: Time,
    last_time: Time,
    rng: Rng,
    phase: Phase,
    validation_error: Option<String>,
}

impl<'a, H: ModelHooks> Driver<'a, H> {
    fn new(
        events: &'a [ContactEvent],
        core: SeirParams,
        zone_of: Vec<ZoneId>,
        hooks: H,
        config_error: Option<ConfigError>,
    ) -> Self {
        let n = population_size(events);
        let start_time = events.first().map(|e| e.timestamp).unwrap_or(0);

        let validation_error = if events.is_empty() {
            Some("Data not loaded".to_string())
        } else if !is_sorted_by_timestamp(events) {
            Some("contact stream is not sorted by timestamp".to_string())
        } else if let Some(err) = config_error {
            Some(err.to_string())
        } else if core.patient_zero_count > n {
            Some(
                ConfigError::TooManyPatientZero {
                    requested: core.patient_zero_count,
                    population: n,
                }
                .to_string(),
            )
        } else {
            None
        };

        Driver {
            groups: ContactGroups::new(events),
            core,
            hooks: Some(hooks),
            engine: None,
            n,
            zone_of,
            start_time,
            last_time: start_time,
            rng: Rng::from_seed(core.seed),
            phase: Phase::Unvalidated,
            validation_error,
        }
    }
}

impl<'a> Driver<'a, Seir> {
    /// Build a driver for the direct-contact SEIR model. The run is seeded
    /// from `params.seed`, the single seed source spec.md §6 describes.
    pub fn seir(events: &'a [ContactEvent], params: SeirParams) -> Self {
        let config_error = params.validate().err();
        Driver::new(events, params, Vec::new(), Seir, config_error)
    }
}

impl<'a> Driver<'a, Airborne> {
    /// Build a driver for the airborne (measles) model. `community` maps an
    /// individual id to its zone; ids absent from the map fall into zone 0,
    /// matching the source's `communities.get(node, 0)` default. The run is
    /// seeded from `params.seir.seed`.
    pub fn airborne(
        events: &'a [ContactEvent],
        params: AirborneParams,
        community: &HashMap<Id, ZoneId>,
    ) -> Self {
        let config_error = params.validate().err();
        let n = population_size(events);
        let zone_of: Vec<ZoneId> = (0..n)
            .map(|id| community.get(&id).copied().unwrap_or(0))
            .collect();
        let hooks = Airborne {
            ventilation_rate: params.ventilation_rate,
            shedding_rate: params.shedding_rate,
            beta_air: params.beta_air,
            mortality_rate: params.mortality_rate,
        };
        Driver::new(events, params.seir, zone_of, hooks, config_error)
    }
}

impl<'a, H: ModelHooks> Iterator for Driver<'a, H> {
    type Item = Delta;

    fn next(&mut self) -> Option<Delta> {
        loop {
            match self.phase {
                Phase::Unvalidated => {
                    if let Some(message) = self.validation_error.take() {
                        self.phase = Phase::Finished;
                        return Some(Delta::error(message));
                    }
                    self.phase = Phase::Streaming;

                    let hooks = self.hooks.take().expect("engine built at most once");
                    let mut engine = Engine::new(self.n, self.core, self.zone_of.clone(), hooks);
                    let ids = self
                        .rng
                        .sample_without_replacement(self.n, self.core.patient_zero_count);
                    engine.seed_patient_zero(&ids, self.start_time, &mut self.rng);
                    let delta = engine.initial_delta(self.start_time, ids);
                    self.engine = Some(engine);
                    return Some(delta);
                }
                Phase::Streaming => match self.groups.next() {
                    Some((t, group)) => {
                        self.last_time = t;
                        let contacts: Vec<(Id, Id)> = group.iter().map(|e| (e.u, e.v)).collect();
                        let engine = self.engine.as_mut().expect("engine built before streaming");
                        let outcome = engine.step(t, &contacts, &mut self.rng);
                        let delta = engine.step_delta(t, outcome);
                        if delta.is_empty_step() {
                            continue;
                        }
                        return Some(delta);
                    }
                    None => {
                        debug!("contact stream exhausted at {}, entering drain phase", self.last_time);
                        self.phase = Phase::Draining(MAX_DRAIN_ITERATIONS);
                    }
                },
                Phase::Draining(remaining) => {
                    let engine = self.engine.as_ref().expect("engine built before draining");
                    if remaining == 0 || engine.queue_is_empty() {
                        self.phase = Phase::Terminating;
                        continue;
                    }
                    self.phase = Phase::Draining(remaining - 1);
                    self.last_time += DRAIN_STEP;
                    let engine = self.engine.as_mut().unwrap();
                    let outcome = engine.step(self.last_time, &[], &mut self.rng);
                    let delta = engine.step_delta(self.last_time, outcome);
                    if delta.is_empty_step() {
                        continue;
                    }
                    return Some(delta);
                }
                Phase::Terminating => {
                    self.phase = Phase::Finished;
                    return Some(Delta::done());
                }
                Phase::Finished => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::Delta;

    fn ev(t: Time, u: Id, v: Id) -> ContactEvent {
        ContactEvent::new(t, u, v)
    }

    #[test]
    fn empty_stream_yields_single_error() {
        let events: Vec<ContactEvent> = vec![];
        let params = SeirParams {
            seed: 1,
            ..SeirParams::default()
        };
        let mut driver = Driver::seir(&events, params);
        match driver.next() {
            Some(Delta::Error { error }) => assert_eq!(error, "Data not loaded"),
            other => panic!("expected error delta, got {:?}", other),
        }
        assert!(driver.next().is_none());
    }

    #[test]
    fn unsorted_stream_yields_error() {
        let events = vec![ev(5, 0, 1), ev(1, 0, 2)];
        let params = SeirParams {
            patient_zero_count: 1,
            seed: 1,
            ..SeirParams::default()
        };
        let mut driver = Driver::seir(&events, params);
        assert!(matches!(driver.next(), Some(Delta::Error { .. })));
    }

    #[test]
    fn too_many_patient_zero_yields_error() {
        let events = vec![ev(1, 0, 1)];
        let params = SeirParams {
            patient_zero_count: 5,
            seed: 1,
            ..SeirParams::default()
        };
        let mut driver = Driver::seir(&events, params);
        assert!(matches!(driver.next(), Some(Delta::Error { .. })));
    }

    #[test]
    fn invalid_config_yields_error_before_any_step() {
        let events = vec![ev(1, 0, 1)];
        let params = SeirParams {
            patient_zero_count: 1,
            transmission_prob: 2.0,
            seed: 1,
            ..SeirParams::default()
        };
        let mut driver = Driver::seir(&events, params);
        assert!(matches!(driver.next(), Some(Delta::Error { .. })));
        assert!(driver.next().is_none());
    }

    #[test]
    fn certain_transmission_streams_then_drains_then_done() {
        let events = vec![ev(100, 0, 1)];
        let params = SeirParams {
            patient_zero_count: 1,
            transmission_prob: 1.0,
            recovery_days: 2.0,
            incubation_days: 0.0,
            seed: 7,
        };
        let mut driver = Driver::seir(&events, params);

        let patient_zero = match driver.next().unwrap() {
            Delta::SeirInitial { time: 100, infected, .. } => {
                assert_eq!(infected.len(), 1);
                infected[0]
            }
            other => panic!("unexpected delta {:?}", other),
        };
        let other_id = 1 - patient_zero;

        let exposed_step = driver.next().unwrap();
        match exposed_step {
            Delta::SeirStep { time, new_exposed, .. } => {
                assert_eq!(time, 100);
                assert_eq!(new_exposed, vec![other_id]);
            }
            other => panic!("unexpected delta {:?}", other),
        }

        // Subsequent deltas (infectious onset, recoveries) arrive from the
        // drain phase; the stream always ends in exactly one `Done`.
        let mut saw_done = false;
        for delta in driver.by_ref() {
            if matches!(delta, Delta::Done { .. }) {
                saw_done = true;
                break;
            }
        }
        assert!(saw_done);
        assert!(driver.next().is_none());
    }

    #[test]
    fn no_transmission_recovers_patient_zero_only() {
        // A second, much later contact keeps the stream (rather than the
        // bounded 1000-iteration drain phase) alive long enough to observe
        // patient zero's recovery, which fires days after seeding.
        let events = vec![ev(0, 0, 1), ev(10_000_000, 2, 3)];
        let params = SeirParams {
            patient_zero_count: 1,
            transmission_prob: 0.0,
            recovery_days: 2.0,
            incubation_days: 10.0,
            seed: 3,
        };
        let mut driver = Driver::seir(&events, params);
        let _initial = driver.next().unwrap();

        let mut recovered_ids: Vec<Id> = Vec::new();
        for delta in driver.by_ref() {
            if let Delta::SeirStep { new_recovered, .. } = &delta {
                recovered_ids.extend(new_recovered.iter().copied());
            }
            if matches!(delta, Delta::Done { .. }) {
                break;
            }
        }
        assert_eq!(recovered_ids.len(), 1);
    }

    #[test]
    fn airborne_driver_builds_zone_of_from_community_map() {
        let events = vec![ev(0, 0, 1)];
        let mut community = HashMap::new();
        community.insert(0, 7);
        community.insert(1, 3);
        let params = AirborneParams {
            seir: SeirParams {
                patient_zero_count: 1,
                seed: 2,
                ..SeirParams::default()
            },
            ..AirborneParams::default()
        };
        let mut driver = Driver::airborne(&events, params, &community);
        let initial = driver.next().unwrap();
        assert!(matches!(initial, Delta::AirborneInitial { .. }));
    }
}
