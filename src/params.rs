//! Parameters & validation (ambient, §4.9 / §7).
//!
//! Out-of-domain parameters are a configuration error (§7(a)): they are
//! checked once, before any computation begins, and produce a
//! [`Delta::Error`](crate::delta::Delta::Error) rather than a panic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every way a parameter set can be out of domain.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroPatientZero,
    TooManyPatientZero { requested: usize, population: usize },
    ProbabilityOutOfRange { field: &'static str, value: f64 },
    NonPositiveDuration { field: &'static str, value: f64 },
    NegativeRate { field: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroPatientZero => {
                write!(f, "patient_zero_count must be at least 1")
            }
            ConfigError::TooManyPatientZero {
                requested,
                population,
            } => write!(
                f,
                "patient_zero_count ({}) exceeds population size ({})",
                requested, population
            ),
            ConfigError::ProbabilityOutOfRange { field, value } => write!(
                f,
                "{} must be in [0, 1], got {}",
                field, value
            ),
            ConfigError::NonPositiveDuration { field, value } => write!(
                f,
                "{} must be >= 1, got {}",
                field, value
            ),
            ConfigError::NegativeRate { field, value } => {
                write!(f, "{} must be >= 0, got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { field, value })
    }
}

fn check_nonnegative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeRate { field, value })
    }
}

/// Parameters shared by the direct-contact SEIR model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeirParams {
    pub patient_zero_count: usize,
    pub transmission_prob: f64,
    pub recovery_days: f64,
    pub incubation_days: f64,
    pub seed: u64,
}

impl Default for SeirParams {
    fn default() -> Self {
        SeirParams {
            patient_zero_count: 5,
            transmission_prob: 0.2,
            recovery_days: 7.0,
            incubation_days: 10.0,
            seed: 0,
        }
    }
}

impl SeirParams {
    /// Validate everything that does not depend on the population size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patient_zero_count == 0 {
            return Err(ConfigError::ZeroPatientZero);
        }
        check_probability("transmission_prob", self.transmission_prob)?;
        if self.recovery_days < 1.0 {
            return Err(ConfigError::NonPositiveDuration {
                field: "recovery_days",
                value: self.recovery_days,
            });
        }
        if self.incubation_days < 0.0 {
            return Err(ConfigError::NegativeRate {
                field: "incubation_days",
                value: self.incubation_days,
            });
        }
        Ok(())
    }
}

/// Parameters for the airborne (measles) model: `SeirParams` plus the
/// shedding/ventilation/mortality channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirborneParams {
    #[serde(flatten)]
    pub seir: SeirParams,
    pub ventilation_rate: f64,
    pub shedding_rate: f64,
    pub beta_air: f64,
    pub mortality_rate: f64,
}

impl Default for AirborneParams {
    fn default() -> Self {
        AirborneParams {
            seir: SeirParams {
                transmission_prob: 0.2,
                recovery_days: 7.0,
                incubation_days: 10.0,
                ..SeirParams::default()
            },
            ventilation_rate: 0.05,
            shedding_rate: 10.0,
            beta_air: 0.0001,
            mortality_rate: 0.0,
        }
    }
}

impl AirborneParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.seir.validate()?;
        check_probability("ventilation_rate", self.ventilation_rate)?;
        check_nonnegative("shedding_rate", self.shedding_rate)?;
        check_nonnegative("beta_air", self.beta_air)?;
        check_probability("mortality_rate", self.mortality_rate)?;
        Ok(())
    }
}
