use serde::{Deserialize, Serialize};

use crate::synth::prelude::{PI, TAU};

/// Oscillator shape, named the way browser oscillators name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Evaluate the waveform at `phase` (radians, any range).
    pub fn evaluate(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                if phase.sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => {
                let cycles = phase / TAU;
                2.0 * (cycles - (cycles + 0.5).floor())
            }
            Waveform::Triangle => ((2.0 / PI) * phase.sin().asin()).clamp(-1.0, 1.0),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Square,
            Waveform::Square => Waveform::Sawtooth,
            Waveform::Sawtooth => Waveform::Triangle,
            Waveform::Triangle => Waveform::Sine,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Triangle,
            Waveform::Square => Waveform::Sine,
            Waveform::Sawtooth => Waveform::Square,
            Waveform::Triangle => Waveform::Sawtooth,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

impl CycleDirection {
    pub fn apply(self, waveform: Waveform) -> Waveform {
        match self {
            CycleDirection::Forward => waveform.next(),
            CycleDirection::Backward => waveform.previous(),
        }
    }
}
