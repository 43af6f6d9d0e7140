use serde::{Deserialize, Serialize};

use super::clock::Time;
use super::context::SynthContext;

/// Shortest ramp ever scheduled. Zero-length stages are floored to this so
/// the backend never sees a ramp ending where it starts.
pub const MIN_RAMP_SECONDS: f64 = 1e-4;

/// Global ADSR settings: times in seconds, sustain as a level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeParams {
    /// Build clamped parameters. Invalid input is corrected, never rejected.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: non_negative(attack),
            decay: non_negative(decay),
            sustain: if sustain.is_nan() {
                0.0
            } else {
                sustain.clamp(0.0, 1.0)
            },
            release: non_negative(release),
        }
    }

    /// Re-apply clamping, e.g. after deserializing untrusted values.
    pub fn clamped(self) -> Self {
        Self::new(self.attack, self.decay, self.sustain, self.release)
    }

    pub fn attack_time(&self) -> f64 {
        floor_duration(self.attack)
    }

    pub fn decay_time(&self) -> f64 {
        floor_duration(self.decay)
    }

    pub fn release_time(&self) -> f64 {
        floor_duration(self.release)
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.3,
            sustain: 0.7,
            release: 0.5,
        }
    }
}

fn non_negative(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

fn floor_duration(seconds: f32) -> f64 {
    (seconds as f64).max(MIN_RAMP_SECONDS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Idle,    // gain held at 0
    Attack,  // ramping to 1.0
    Decay,   // ramping from 1.0 to sustain
    Sustain, // holding, nothing scheduled
    Release, // ramping to 0 until the voice is freed
}

/// Envelope scheduler bound to one gain control.
///
/// Every stage is written onto the gain's timeline at trigger time; nothing
/// here runs per sample. The phase is derived from the recorded trigger and
/// release timestamps.
#[derive(Debug, Clone)]
pub struct Envelope<G> {
    gain: G,
    triggered_at: Option<Time>,
    released_at: Option<Time>,
    attack_end: Time,
    decay_end: Time,
    release_end: Time,
}

impl<G: Copy> Envelope<G> {
    pub fn new(gain: G) -> Self {
        Self {
            gain,
            triggered_at: None,
            released_at: None,
            attack_end: 0.0,
            decay_end: 0.0,
            release_end: 0.0,
        }
    }

    pub fn gain(&self) -> G {
        self.gain
    }

    /// Schedule attack and decay back to back, starting from the level the
    /// gain has right now.
    pub fn trigger<C>(&mut self, ctx: &mut C, params: &EnvelopeParams)
    where
        C: SynthContext<Gain = G>,
    {
        let now = ctx.now();
        let level = ctx.gain_value(self.gain);

        ctx.cancel_scheduled_values(self.gain, now);
        ctx.set_value_at_time(self.gain, level, now);

        self.attack_end = now + params.attack_time();
        self.decay_end = self.attack_end + params.decay_time();
        ctx.linear_ramp_to_value_at_time(self.gain, 1.0, self.attack_end);
        ctx.linear_ramp_to_value_at_time(self.gain, params.sustain, self.decay_end);

        self.triggered_at = Some(now);
        self.released_at = None;
    }

    /// Ramp from the instantaneous level to zero. Returns when the ramp ends.
    pub fn release<C>(&mut self, ctx: &mut C, params: &EnvelopeParams) -> Time
    where
        C: SynthContext<Gain = G>,
    {
        let now = ctx.now();
        let level = ctx.gain_value(self.gain);

        ctx.cancel_scheduled_values(self.gain, now);
        ctx.set_value_at_time(self.gain, level, now);

        self.release_end = now + params.release_time();
        ctx.linear_ramp_to_value_at_time(self.gain, 0.0, self.release_end);

        self.released_at = Some(now);
        self.release_end
    }

    /// Back to Idle once the owning voice has been freed.
    pub fn reset(&mut self) {
        self.triggered_at = None;
        self.released_at = None;
    }

    pub fn phase_at(&self, time: Time) -> EnvelopePhase {
        if self.released_at.is_some() {
            return EnvelopePhase::Release;
        }
        match self.triggered_at {
            None => EnvelopePhase::Idle,
            Some(_) if time < self.attack_end => EnvelopePhase::Attack,
            Some(_) if time < self.decay_end => EnvelopePhase::Decay,
            Some(_) => EnvelopePhase::Sustain,
        }
    }
}
