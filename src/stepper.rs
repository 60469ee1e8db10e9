//! SEIR stepper (C6) and airborne stepper (C7).
//!
//! Both models share most of their per-step work: draining due events,
//! processing contacts, emitting a delta. That shared structure is factored
//! into one routine parameterized by two variant hooks (pre-contacts,
//! post-contacts); in SEIR both hooks are no-ops. `Engine<H>` is that
//! routine, generic over `H: ModelHooks`, parameterizing the shared update
//! logic over a model type rather than branching on a runtime tag.

use crate::delta::{Delta, EnvironmentalSummary, InfectionRecord};
use crate::event::{EventKind, EventQueue};
use crate::params::SeirParams;
use crate::population::{Compartment, Counts, PopulationState};
use crate::prelude::{Id, Time};
use crate::rng::Rng;
use crate::zone::{ZoneId, ZoneMap};
use log::trace;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Samples a duration in seconds from `truncated_normal(mean_days * 86400,
/// 0.2 * mean_days * 86400, lower = 86400)`. Note this has no floor on the
/// standard deviation: `mean_days = 0` (e.g. an incubation period of zero)
/// yields `sd = 0`, so the draw is deterministically `lower`, the "lower
/// bounded to 1 day" behavior.
fn sample_duration(rng: &mut Rng, mean_days: f64) -> f64 {
    rng.truncated_normal(
        mean_days * SECONDS_PER_DAY,
        0.2 * mean_days * SECONDS_PER_DAY,
        SECONDS_PER_DAY,
    )
}

/// The two variant hooks a model plugs into the shared stepper.
pub trait ModelHooks {
    /// Runs once per step, before the event queue is drained. SEIR: no-op.
    /// Airborne: ventilation decay, then shedding from every infectious
    /// resident into its zone.
    fn pre_contacts(&self, zones: &mut ZoneMap, population: &PopulationState, zone_of: &[ZoneId]);

    /// Runs once per step, after contact transmission. SEIR: no new
    /// infections. Airborne: one Bernoulli roll per susceptible against
    /// its zone's current load. Returns `(id, zone)` for every newly
    /// exposed individual.
    fn post_contacts(
        &self,
        zones: &ZoneMap,
        population: &PopulationState,
        zone_of: &[ZoneId],
        rng: &mut Rng,
    ) -> Vec<(Id, ZoneId)>;

    /// Probability that an I->Recover event becomes I->Dead instead.
    fn mortality_rate(&self) -> f64;

    /// Shape the initial delta emitted once patient zero is seeded.
    /// `infected` is the seeded patient-zero cohort.
    fn initial_delta(&self, time: Time, infected: Vec<Id>, zones: &ZoneMap) -> Delta;

    /// Shape one subsequent delta from a step's outcome and the engine's
    /// current counts.
    fn step_delta(&self, time: Time, outcome: StepOutcome, counts: Counts, zones: &ZoneMap) -> Delta;
}

/// Direct-contact SEIR: no zones, no mortality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Seir;

impl ModelHooks for Seir {
    fn pre_contacts(&self, _zones: &mut ZoneMap, _population: &PopulationState, _zone_of: &[ZoneId]) {}

    fn post_contacts(
        &self,
        _zones: &ZoneMap,
        _population: &PopulationState,
        _zone_of: &[ZoneId],
        _rng: &mut Rng,
    ) -> Vec<(Id, ZoneId)> {
        Vec::new()
    }

    fn mortality_rate(&self) -> f64 {
        0.0
    }

    fn initial_delta(&self, time: Time, infected: Vec<Id>, _zones: &ZoneMap) -> Delta {
        Delta::SeirInitial {
            time,
            infected,
            exposed: Vec::new(),
            recovered: Vec::new(),
        }
    }

    fn step_delta(&self, time: Time, outcome: StepOutcome, counts: Counts, _zones: &ZoneMap) -> Delta {
        Delta::SeirStep {
            time,
            new_exposed: outcome.new_exposed,
            new_infected: outcome.new_infected,
            new_recovered: outcome.new_recovered,
            total_exposed: counts.exposed,
            total_infected: counts.infectious,
            total_recovered: counts.recovered,
        }
    }
}

/// Airborne (measles) extension: zone shedding/decay and an airborne
/// transmission channel, plus a nonzero chance of death on recovery.
#[derive(Debug, Clone, Copy)]
pub struct Airborne {
    pub ventilation_rate: f64,
    pub shedding_rate: f64,
    pub beta_air: f64,
    pub mortality_rate: f64,
}

impl ModelHooks for Airborne {
    fn pre_contacts(&self, zones: &mut ZoneMap, population: &PopulationState, zone_of: &[ZoneId]) {
        zones.decay(self.ventilation_rate);
        for (id, compartment) in population.iter() {
            if compartment == Compartment::Infectious {
                zones.shed(zone_of[id], self.shedding_rate);
            }
        }
    }

    fn post_contacts(
        &self,
        zones: &ZoneMap,
        population: &PopulationState,
        zone_of: &[ZoneId],
        rng: &mut Rng,
    ) -> Vec<(Id, ZoneId)> {
        let mut newly_exposed = Vec::new();
        for (id, compartment) in population.iter() {
            if compartment != Compartment::Susceptible {
                continue;
            }
            let zone = zone_of[id];
            let load = zones.load(zone);
            if load <= 0.0 {
                continue;
            }
            let prob = zones.sample_infection_prob(zone, self.beta_air);
            if rng.bernoulli(prob) {
                newly_exposed.push((id, zone));
            }
        }
        newly_exposed
    }

    fn mortality_rate(&self) -> f64 {
        self.mortality_rate
    }

    fn initial_delta(&self, time: Time, infected: Vec<Id>, zones: &ZoneMap) -> Delta {
        let (mean, total, contaminated) = zones.summary();
        Delta::AirborneInitial {
            time,
            total_infected: infected.len() as u32,
            infected,
            exposed: Vec::new(),
            recovered: Vec::new(),
            zone_updates: Default::default(),
            stats: EnvironmentalSummary::from_zone_summary(mean, total, contaminated),
            total_exposed: 0,
            total_recovered: 0,
            total_dead: 0,
        }
    }

    fn step_delta(&self, time: Time, outcome: StepOutcome, counts: Counts, zones: &ZoneMap) -> Delta {
        let (mean, total, contaminated) = zones.summary();
        Delta::AirborneStep {
            time,
            new_infections: outcome.new_infections,
            new_exposed: outcome.new_exposed,
            new_infected: outcome.new_infected,
            new_recovered: outcome.new_recovered,
            new_dead: outcome.new_dead,
            zone_updates: zones.above(0.1).collect(),
            stats: EnvironmentalSummary::from_zone_summary(mean, total, contaminated),
            total_exposed: counts.exposed,
            total_infected: counts.infectious,
            total_recovered: counts.recovered,
            total_dead: counts.dead,
        }
    }
}

/// Everything a single step produced. Empty vectors mean "nothing to
/// report"; the driver decides whether to emit a delta.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    pub new_exposed: Vec<Id>,
    pub new_infected: Vec<Id>,
    pub new_recovered: Vec<Id>,
    pub new_dead: Vec<Id>,
    pub new_infections: Vec<InfectionRecord>,
}

/// Owns the population, event queue, and zone map for the duration of a run,
/// generic over the model-specific hooks.
pub struct Engine<H: ModelHooks> {
    population: PopulationState,
    queue: EventQueue,
    zone_of: Vec<ZoneId>,
    zones: ZoneMap,
    core: SeirParams,
    hooks: H,
}

impl<H: ModelHooks> Engine<H> {
    /// `zone_of` is dense (one entry per id, `0..n`); for the plain SEIR
    /// model it may be empty since `Seir`'s hooks never read it.
    pub fn new(n: usize, core: SeirParams, zone_of: Vec<ZoneId>, hooks: H) -> Self {
        let zones = ZoneMap::new(zone_of.iter().copied());
        Engine {
            population: PopulationState::new(n),
            queue: EventQueue::new(),
            zone_of,
            zones,
            core,
            hooks,
        }
    }

    pub fn population(&self) -> &PopulationState {
        &self.population
    }

    pub fn zones(&self) -> &ZoneMap {
        &self.zones
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Shape the initial delta for the seeded `infected` cohort, delegating
    /// to the model-specific hook.
    pub fn initial_delta(&self, time: Time, infected: Vec<Id>) -> Delta {
        self.hooks.initial_delta(time, infected, &self.zones)
    }

    /// Shape a subsequent delta from a step's outcome and the engine's
    /// current state, delegating to the model-specific hook.
    pub fn step_delta(&self, time: Time, outcome: StepOutcome) -> Delta {
        self.hooks
            .step_delta(time, outcome, self.population.counts(), &self.zones)
    }

    /// Seed the initial cohort of patient-zero individuals: set them
    /// Infectious and schedule each a Recover event.
    pub fn seed_patient_zero(&mut self, ids: &[Id], start_time: Time, rng: &mut Rng) {
        for &id in ids {
            self.population.set(id, Compartment::Exposed);
            self.population.set(id, Compartment::Infectious);
            let duration = sample_duration(rng, self.core.recovery_days);
            self.queue
                .push(start_time + duration as Time, EventKind::Recover, id);
        }
    }

    /// Execute one step for timestamp `t` and its contact group: drain due
    /// events, process contacts, then (for models whose `post_contacts` is
    /// non-trivial) the airborne roll.
    pub fn step(
        &mut self,
        t: Time,
        contacts: &[(Id, Id)],
        rng: &mut Rng,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();

        self.hooks.pre_contacts(&mut self.zones, &self.population, &self.zone_of);
        self.drain_due_events(t, rng, &mut outcome);
        self.process_contacts(t, contacts, rng, &mut outcome);

        for (id, zone) in self
            .hooks
            .post_contacts(&self.zones, &self.population, &self.zone_of, rng)
        {
            self.expose(id, t, rng, &mut outcome);
            outcome.new_infections.push(InfectionRecord::airborne(id, zone));
        }

        outcome
    }

    fn drain_due_events(&mut self, t: Time, rng: &mut Rng, outcome: &mut StepOutcome) {
        while let Some(top) = self.queue.peek() {
            if top.fire_time > t {
                break;
            }
            let event = self.queue.pop().unwrap();
            match event.kind {
                EventKind::BecomeInfectious => {
                    if self.population.get(event.subject) == Compartment::Exposed {
                        self.population.set(event.subject, Compartment::Infectious);
                        outcome.new_infected.push(event.subject);
                        let duration = sample_duration(rng, self.core.recovery_days);
                        self.queue
                            .push(t + duration as Time, EventKind::Recover, event.subject);
                        trace!("{} became infectious at {}", event.subject, t);
                    }
                }
                EventKind::Recover => {
                    if self.population.get(event.subject) == Compartment::Infectious {
                        if rng.bernoulli(self.hooks.mortality_rate()) {
                            self.population.set(event.subject, Compartment::Dead);
                            outcome.new_dead.push(event.subject);
                        } else {
                            self.population.set(event.subject, Compartment::Recovered);
                            outcome.new_recovered.push(event.subject);
                        }
                    }
                }
            }
        }
    }

    fn process_contacts(
        &mut self,
        t: Time,
        contacts: &[(Id, Id)],
        rng: &mut Rng,
        outcome: &mut StepOutcome,
    ) {
        for &(u, v) in contacts {
            let stat_u = self.population.get(u);
            let stat_v = self.population.get(v);

            let (infectious, susceptible) = if stat_u == Compartment::Infectious
                && stat_v == Compartment::Susceptible
            {
                (u, v)
            } else if stat_v == Compartment::Infectious && stat_u == Compartment::Susceptible {
                (v, u)
            } else {
                continue;
            };

            if rng.bernoulli(self.core.transmission_prob) {
                self.expose(susceptible, t, rng, outcome);
                outcome
                    .new_infections
                    .push(InfectionRecord::contact(susceptible, infectious));
            }
        }
    }

    fn expose(&mut self, id: Id, t: Time, rng: &mut Rng, outcome: &mut StepOutcome) {
        self.population.set(id, Compartment::Exposed);
        let duration = sample_duration(rng, self.core.incubation_days);
        self.queue
            .push(t + duration as Time, EventKind::BecomeInfectious, id);
        outcome.new_exposed.push(id);
    }
}
