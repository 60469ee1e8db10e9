//! End-to-end scenarios driving the whole `Driver`, one per seeded case.

use std::collections::HashMap;

use epitrace::prelude::*;
use epitrace::contact::ContactEvent;
use epitrace::params::{AirborneParams, SeirParams};

fn ev(t: Time, u: Id, v: Id) -> ContactEvent {
    ContactEvent::new(t, u, v)
}

#[test]
fn empty_contact_stream_yields_data_not_loaded() {
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
fn no_transmission_recovers_only_patient_zero() {
    // 100 ids, one contact per pair of neighbors at t=0, plus a far-future
    // contact to keep the stream (rather than the bounded drain phase)
    // alive long enough to observe the ~2-day recovery.
    let mut events: Vec<ContactEvent> = (0..99).map(|i| ev(0, i, i + 1)).collect();
    events.push(ev(10_000_000, 0, 1));

    let params = SeirParams {
        patient_zero_count: 1,
        transmission_prob: 0.0,
        recovery_days: 2.0,
        incubation_days: 10.0,
        seed: 11,
    };
    let mut driver = Driver::seir(&events, params);

    let patient_zero = match driver.next().unwrap() {
        Delta::SeirInitial { infected, .. } => {
            assert_eq!(infected.len(), 1);
            infected[0]
        }
        other => panic!("unexpected initial delta {:?}", other),
    };

    let mut seir_steps = Vec::new();
    let mut done = false;
    for delta in driver.by_ref() {
        match delta {
            Delta::SeirStep {
                new_exposed,
                new_recovered,
                ..
            } => {
                assert!(new_exposed.is_empty(), "transmission_prob=0 must never expose anyone");
                seir_steps.push(new_recovered);
            }
            Delta::Done { .. } => {
                done = true;
                break;
            }
            other => panic!("unexpected delta {:?}", other),
        }
    }
    assert!(done);

    let recovered: Vec<Id> = seir_steps.into_iter().flatten().collect();
    assert_eq!(recovered, vec![patient_zero]);
}

#[test]
fn certain_transmission_between_two_ids() {
    // incubation_days=0.0 makes the onset duration deterministically exactly
    // 86400 seconds (mean and sd both zero, clamped to the 1-day lower
    // bound), so the second contact at t=90000 is guaranteed to land after
    // id `other`'s exposure at t=100 becomes due (100+86400=86500) and
    // drains it during streaming rather than leaving it to the bounded
    // drain phase.
    let events = vec![ev(100, 0, 1), ev(90_000, 0, 1)];
    let params = SeirParams {
        patient_zero_count: 1,
        transmission_prob: 1.0,
        recovery_days: 2.0,
        incubation_days: 0.0,
        seed: 5,
    };
    let mut driver = Driver::seir(&events, params);

    let patient_zero = match driver.next().unwrap() {
        Delta::SeirInitial { time: 100, infected, .. } => infected[0],
        other => panic!("unexpected initial delta {:?}", other),
    };
    let other = 1 - patient_zero;

    match driver.next().unwrap() {
        Delta::SeirStep { time: 100, new_exposed, .. } => {
            assert_eq!(new_exposed, vec![other]);
        }
        other => panic!("unexpected delta {:?}", other),
    }

    // The rest (infectious onset ~1 day later, then two recoveries) arrives
    // from the drain phase; the stream always terminates in exactly one Done.
    let mut newly_infected = Vec::new();
    let mut newly_recovered = Vec::new();
    let mut done_count = 0;
    for delta in driver.by_ref() {
        match delta {
            Delta::SeirStep {
                new_infected,
                new_recovered,
                ..
            } => {
                newly_infected.extend(new_infected);
                newly_recovered.extend(new_recovered);
            }
            Delta::Done { .. } => done_count += 1,
            other => panic!("unexpected delta {:?}", other),
        }
    }
    assert_eq!(done_count, 1);
    assert!(driver.next().is_none());
    assert!(newly_infected.contains(&other));
}

#[test]
fn airborne_isolated_zone_never_gets_infected() {
    // zone 0 holds patient zero (infectious); zone 1 holds one susceptible,
    // never reached by shedding because ventilation_rate=0 never mixes it in
    // (zone_of keeps the zones disjoint; there is no cross-zone diffusion).
    let events: Vec<ContactEvent> = (0..2_000).step_by(20).map(|t| ev(t, 2, 3)).collect();
    let mut community = HashMap::new();
    community.insert(0, 0);
    community.insert(1, 1);
    community.insert(2, 0);
    community.insert(3, 0);

    let mut params = AirborneParams {
        seir: SeirParams {
            patient_zero_count: 1,
            transmission_prob: 0.0,
            recovery_days: 7.0,
            incubation_days: 10.0,
            seed: 1,
        },
        ventilation_rate: 0.0,
        shedding_rate: 10.0,
        beta_air: 0.0001,
        mortality_rate: 0.0,
    };

    // Run until a patient zero lands in zone 0; sample_without_replacement
    // over {0,1,2,3} may pick id 1 (zone 1), which would trivially satisfy
    // "zone 1 never gets infected" without exercising the isolation property,
    // so retry seeds until zero is NOT the seeded patient.
    loop {
        let mut driver = Driver::airborne(&events, params, &community);
        let infected = match driver.next().unwrap() {
            Delta::AirborneInitial { infected, .. } => infected,
            other => panic!("unexpected initial delta {:?}", other),
        };
        if !infected.contains(&1) {
            for delta in driver.by_ref() {
                if let Delta::AirborneStep { new_infections, .. } = &delta {
                    assert!(
                        new_infections.iter().all(|r| r.id != 1),
                        "zone 1 is isolated and must never receive an airborne infection"
                    );
                }
                if matches!(delta, Delta::Done { .. }) {
                    break;
                }
            }
            break;
        }
        params.seir.seed += 1;
        assert!(params.seir.seed < 20, "could not find a seed avoiding id 1 as patient zero");
    }
}

#[test]
fn mortality_one_sends_every_recovery_to_dead() {
    // recovery_days near zero makes the sampled duration deterministically
    // exactly the 1-day lower bound, so patient zero's recovery is due at
    // exactly start_time (0) + 86400; the stream comfortably outlives that.
    let events: Vec<ContactEvent> = (0..100_000).step_by(2_000).map(|t| ev(t, 2, 3)).collect();
    let community = HashMap::new();
    let params = AirborneParams {
        seir: SeirParams {
            patient_zero_count: 1,
            transmission_prob: 0.0,
            recovery_days: 0.01,
            incubation_days: 10.0,
            seed: 9,
        },
        ventilation_rate: 0.0,
        shedding_rate: 0.0,
        beta_air: 0.0,
        mortality_rate: 1.0,
    };
    let mut driver = Driver::airborne(&events, params, &community);
    let _initial = driver.next().unwrap();

    let mut total_dead = 0;
    let mut total_recovered = 0;
    for delta in driver.by_ref() {
        if let Delta::AirborneStep {
            total_dead: d,
            total_recovered: r,
            ..
        } = delta
        {
            total_dead = d;
            total_recovered = r;
        }
        if matches!(delta, Delta::Done { .. }) {
            break;
        }
    }
    assert_eq!(total_recovered, 0);
    assert_eq!(total_dead, 1);
}

#[test]
fn drain_phase_retires_outstanding_exposures() {
    // incubation_days/recovery_days near zero means the truncated-normal
    // draw almost never lands above the 1-day lower bound, so every sampled
    // duration is deterministically exactly 86400 seconds.
    //
    // id 0 exposes id 1 at t=0 (incubation due at t=86400). A filler contact
    // between two bystanders (2, 3, both susceptible, so transmission is a
    // no-op regardless of transmission_prob) at t=90000 drains that due
    // event during streaming and schedules a recovery at t=90000+86400.
    // The stream's last contact, at t=160000, is close enough to that
    // recovery time that the bounded 1000-iteration, 20-second drain phase
    // reaches it (160000 + 1000*20 = 180000 > 176400) without needing the
    // whole day-plus gap to be covered by real contacts.
    let events = vec![ev(0, 0, 1), ev(90_000, 2, 3), ev(160_000, 2, 3)];
    let params = SeirParams {
        patient_zero_count: 1,
        transmission_prob: 1.0,
        recovery_days: 0.01,
        incubation_days: 0.01,
        seed: 2,
    };
    let mut driver = Driver::seir(&events, params);
    let _initial = driver.next().unwrap();

    let mut saw_infected = false;
    let mut saw_recovered = false;
    let mut done = false;
    for delta in driver.by_ref() {
        match delta {
            Delta::SeirStep {
                new_infected,
                new_recovered,
                ..
            } => {
                saw_infected |= !new_infected.is_empty();
                saw_recovered |= !new_recovered.is_empty();
            }
            Delta::Done { .. } => {
                done = true;
                break;
            }
            other => panic!("unexpected delta {:?}", other),
        }
    }
    assert!(saw_infected, "incubation completion must be observed");
    assert!(saw_recovered, "recovery must be observed within the drain bound");
    assert!(done);
}
