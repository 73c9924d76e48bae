//! Child module parameters

use std::path::Path;

use borsh::{BorshDeserialize, BorshSerialize};
use ccv_core::time::DurationSecs;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Three weeks, the default unbonding period of a child chain
pub const DEFAULT_UNBONDING_PERIOD: DurationSecs = DurationSecs(1_814_400);

/// Child module parameters
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct ChildParams {
    /// How long the success acknowledgement of a validator-set change is
    /// held back after the change is received
    pub unbonding_period: DurationSecs,
}

impl Default for ChildParams {
    fn default() -> Self {
        Self {
            unbonding_period: DEFAULT_UNBONDING_PERIOD,
        }
    }
}

impl ChildParams {
    /// Parse and validate the parameters from a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let params: Self = toml::from_str(s).map_err(|err| {
            Error::Config(format!("Invalid child parameters TOML: {err}"))
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Load the parameters from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        let params = Self::from_toml_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            unbonding_period_secs = params.unbonding_period.0,
            "Loaded child parameters"
        );
        Ok(params)
    }

    /// Render the parameters as a TOML document
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string(self).map_err(|err| {
            Error::Config(format!("Failed to encode child parameters: {err}"))
        })
    }

    /// Check that the unbonding period is expressible in nanoseconds, which
    /// maturity times are computed in
    pub fn validate(&self) -> Result<(), Error> {
        self.unbonding_period
            .as_nanos()
            .map(|_| ())
            .map_err(|err| Error::InvalidParams(err.to_string()))
    }
}
