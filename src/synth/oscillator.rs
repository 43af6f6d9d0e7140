use serde::{Deserialize, Serialize};

use super::waveform::{CycleDirection, Waveform};

/// Number of tone generators per voice.
pub const SLOTS: usize = 2;

/// Largest octave offset, also the reach of the keyboard controls.
pub const MAX_OCTAVE_SHIFT: f32 = 4.0;
pub const MAX_SEMITONE_SHIFT: f32 = 24.0;
pub const MAX_FINE_CENTS: f32 = 100.0;

/// Finite values clamped to `±limit`; NaN and infinities are dropped.
fn bounded(value: Option<f32>, limit: f32) -> Option<f32> {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(-limit, limit))
}

/// Target settings for one generator slot, shared by every voice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorSlot {
    pub waveform: Waveform,
    /// Mix level of this generator.
    pub volume: f32,
    /// Fine tune in cents, applied as detune.
    pub fine: f32,
    pub semitone: f32,
    pub octave: f32,
}

impl OscillatorSlot {
    /// `base * 2^octave * 2^(semitone / 12)`; fine tune is applied separately.
    pub fn frequency(&self, base: f32) -> f32 {
        base * 2.0_f32.powf(self.octave) * 2.0_f32.powf(self.semitone / 12.0)
    }
}

impl Default for OscillatorSlot {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            volume: 0.5,
            fine: 0.0,
            semitone: 0.0,
            octave: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorSettings {
    pub slots: [OscillatorSlot; SLOTS],
    /// Paraphonic sync: generator 2 follows generator 1 an octave up.
    pub sync: bool,
}

impl OscillatorSettings {
    /// Sounding frequencies of both generators for a note whose base
    /// frequency is `base`.
    pub fn frequencies(&self, base: f32) -> [f32; SLOTS] {
        let base2 = if self.sync { base * 2.0 } else { base };
        [self.slots[0].frequency(base), self.slots[1].frequency(base2)]
    }

    /// Merge a partial update, reporting which kinds of fields it touched.
    pub fn apply(&mut self, patch: &OscillatorPatch) -> PatchScope {
        let [first, second] = &mut self.slots;
        let mut scope = PatchScope::default();

        for (slot, waveform, volume) in [
            (&mut *first, patch.waveform1, patch.vol1),
            (&mut *second, patch.waveform2, patch.vol2),
        ] {
            if let Some(waveform) = waveform {
                slot.waveform = waveform;
                scope.timbre = true;
            }
            if let Some(volume) = volume.filter(|v| v.is_finite()) {
                slot.volume = volume.max(0.0);
                scope.timbre = true;
            }
        }

        for (slot, fine, semitone, octave) in [
            (first, patch.fine1, patch.semi1, patch.octave1),
            (second, patch.fine2, patch.semi2, patch.octave2),
        ] {
            if let Some(fine) = bounded(fine, MAX_FINE_CENTS) {
                slot.fine = fine;
                scope.pitch = true;
            }
            if let Some(semitone) = bounded(semitone, MAX_SEMITONE_SHIFT) {
                slot.semitone = semitone;
                scope.pitch = true;
            }
            if let Some(octave) = bounded(octave, MAX_OCTAVE_SHIFT) {
                slot.octave = octave;
                scope.pitch = true;
            }
        }

        if let Some(sync) = patch.sync {
            self.sync = sync;
            scope.pitch = true;
        }
        scope
    }

    /// The same settings passed through `apply`, so loaded values obey the
    /// limits of live updates. Non-finite fields keep their defaults.
    pub fn sanitized(&self) -> Self {
        let mut settings = Self::default();
        settings.apply(&self.to_patch());
        settings
    }

    /// A patch that sets every field, used when applying a full snapshot.
    pub fn to_patch(&self) -> OscillatorPatch {
        let [first, second] = self.slots;
        OscillatorPatch {
            waveform1: Some(first.waveform),
            waveform2: Some(second.waveform),
            vol1: Some(first.volume),
            vol2: Some(second.volume),
            fine1: Some(first.fine),
            fine2: Some(second.fine),
            semi1: Some(first.semitone),
            semi2: Some(second.semitone),
            octave1: Some(first.octave),
            octave2: Some(second.octave),
            sync: Some(self.sync),
        }
    }
}

/// Discrete front-panel actions sent by the keyboard handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Step both generators to the neighbouring waveform.
    CycleWaveform { direction: CycleDirection },
    ToggleSync,
    /// Shift generator 1 by whole octaves.
    ShiftOctave { delta: i8 },
}

impl OscillatorSettings {
    /// The patch that performs `event` on these settings.
    pub fn control_patch(&self, event: &ControlEvent) -> OscillatorPatch {
        let [first, second] = self.slots;
        match *event {
            ControlEvent::CycleWaveform { direction } => OscillatorPatch {
                waveform1: Some(direction.apply(first.waveform)),
                waveform2: Some(direction.apply(second.waveform)),
                ..Default::default()
            },
            ControlEvent::ToggleSync => OscillatorPatch {
                sync: Some(!self.sync),
                ..Default::default()
            },
            ControlEvent::ShiftOctave { delta } => OscillatorPatch {
                octave1: Some(
                    (first.octave + delta as f32).clamp(-MAX_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT),
                ),
                ..Default::default()
            },
        }
    }
}

/// Partial oscillator update; absent fields are left unchanged.
///
/// Field names follow the flat object the browser UI sends, so
/// `{"octave1": 1}` deserializes directly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorPatch {
    pub waveform1: Option<Waveform>,
    pub waveform2: Option<Waveform>,
    pub vol1: Option<f32>,
    pub vol2: Option<f32>,
    pub fine1: Option<f32>,
    pub fine2: Option<f32>,
    pub semi1: Option<f32>,
    pub semi2: Option<f32>,
    pub octave1: Option<f32>,
    pub octave2: Option<f32>,
    pub sync: Option<bool>,
}

/// Which parts of the voices a patch needs re-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchScope {
    /// Shape or mix level changed: re-apply to every voice.
    pub timbre: bool,
    /// Pitch offsets or sync changed: re-tune sounding voices.
    pub pitch: bool,
}
