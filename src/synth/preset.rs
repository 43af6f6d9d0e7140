use serde::{Deserialize, Serialize};

use super::core::Synth;
use super::envelope::EnvelopeParams;
use super::error::SynthError;
use super::filter::FilterSettings;
use super::oscillator::{OscillatorSettings, OscillatorSlot};
use super::render::RenderContext;
use super::waveform::Waveform;

/// One generator slot as stored in a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscPreset {
    pub volume: f32,
    pub fine: f32,
    pub semi: f32,
    pub octave: f32,
    pub waveform: Waveform,
}

impl Default for OscPreset {
    fn default() -> Self {
        OscillatorSlot::default().into()
    }
}

impl From<OscillatorSlot> for OscPreset {
    fn from(slot: OscillatorSlot) -> Self {
        Self {
            volume: slot.volume,
            fine: slot.fine,
            semi: slot.semitone,
            octave: slot.octave,
            waveform: slot.waveform,
        }
    }
}

impl From<OscPreset> for OscillatorSlot {
    fn from(preset: OscPreset) -> Self {
        Self {
            waveform: preset.waveform,
            volume: preset.volume,
            fine: preset.fine,
            semitone: preset.semi,
            octave: preset.octave,
        }
    }
}

/// Snapshot of every user-facing sound setting.
///
/// ```json
/// { "osc1": { "volume": 0.5, "fine": 0, "semi": 0, "octave": 0, "waveform": "sine" },
///   "osc2": { ... },
///   "filter": { "frequency": 800, "Q": 1.2, "bypassed": false },
///   "sync": false,
///   "adsr": { "attack": 0.1, "decay": 0.3, "sustain": 0.7, "release": 0.5 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub osc1: OscPreset,
    pub osc2: OscPreset,
    pub filter: FilterSettings,
    pub sync: bool,
    pub adsr: EnvelopeParams,
}

impl Preset {
    pub fn capture(synth: &Synth<RenderContext>) -> Self {
        let oscillators = synth.oscillator_settings();
        Self {
            osc1: oscillators.slots[0].into(),
            osc2: oscillators.slots[1].into(),
            filter: synth.context().filter_settings(),
            sync: oscillators.sync,
            adsr: synth.envelope(),
        }
    }

    pub fn oscillator_settings(&self) -> OscillatorSettings {
        OscillatorSettings {
            slots: [self.osc1.into(), self.osc2.into()],
            sync: self.sync,
        }
    }

    /// Oscillator changes reach sounding voices; the envelope applies to
    /// the next note.
    pub fn apply_to(&self, synth: &mut Synth<RenderContext>) {
        synth.set_oscillator_settings(&self.oscillator_settings().to_patch());
        synth.set_envelope_params(self.adsr);
        synth.context_mut().set_filter(self.filter);
        log::info!("Preset applied");
    }

    pub fn to_json(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_browser_preset_shape() {
        let preset = Preset::from_json(
            r#"{
                "osc1": { "volume": 0.8, "fine": 5, "semi": 7, "tune": 0, "octave": -1, "waveform": "sawtooth" },
                "osc2": { "waveform": "square" },
                "filter": { "frequency": 2000, "Q": 4, "bypassed": true },
                "sync": true
            }"#,
        )
        .unwrap();

        assert_eq!(preset.osc1.volume, 0.8);
        assert_eq!(preset.osc1.semi, 7.0);
        assert_eq!(preset.osc1.octave, -1.0);
        assert_eq!(preset.osc1.waveform, Waveform::Sawtooth);
        assert_eq!(preset.osc2.waveform, Waveform::Square);
        assert_eq!(preset.osc2.volume, 0.5);
        assert!(preset.filter.bypassed);
        assert_eq!(preset.filter.q, 4.0);
        assert!(preset.sync);
        assert_eq!(preset.adsr, EnvelopeParams::default());
    }

    #[test]
    fn slot_conversion_keeps_fields() {
        let slot = OscillatorSlot {
            waveform: Waveform::Triangle,
            volume: 0.3,
            fine: -12.0,
            semitone: 4.0,
            octave: 2.0,
        };
        let back: OscillatorSlot = OscPreset::from(slot).into();
        assert_eq!(back, slot);
    }

    #[test]
    fn json_uses_capital_q() {
        let json = Preset::default().to_json().unwrap();
        assert!(json.contains("\"Q\":1.2"));
        assert!(json.contains("\"adsr\""));
    }
}
