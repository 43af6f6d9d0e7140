use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::envelope::EnvelopeParams;
use super::error::SynthError;
use super::filter::FilterSettings;
use super::oscillator::OscillatorSettings;

/// Startup configuration. Every field is optional in JSON; missing
/// fields take the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub polyphony: usize,
    pub envelope: EnvelopeParams,
    pub oscillators: OscillatorSettings,
    pub filter: FilterSettings,
    pub master_volume: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            polyphony: 4,
            envelope: EnvelopeParams::default(),
            oscillators: OscillatorSettings::default(),
            filter: FilterSettings::default(),
            master_volume: 0.65,
        }
    }
}

impl SynthConfig {
    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SynthError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_polyphony(mut self, polyphony: usize) -> Self {
        self.polyphony = polyphony;
        self
    }
}
