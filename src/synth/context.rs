use super::clock::{AudioClock, Time};
use super::waveform::Waveform;

/// The synthesis backend the voice pool drives.
///
/// A context owns tone generators and gain controls and hands out copyable
/// handles to them. The pool never renders audio itself: it only decides
/// when, and on which handle, parameters change. Everything is scheduled
/// against the context's own clock.
pub trait SynthContext: AudioClock {
    type Generator: Copy + std::fmt::Debug;
    type Gain: Copy + std::fmt::Debug;

    /// Create a generator that starts running immediately and is never stopped.
    fn create_tone_generator(&mut self) -> Self::Generator;
    /// Create a gain control initialised to `initial`.
    fn create_gain(&mut self, initial: f32) -> Self::Gain;
    /// Route `generator -> mix -> envelope -> output`.
    fn connect(&mut self, generator: Self::Generator, mix: Self::Gain, envelope: Self::Gain);

    fn set_shape(&mut self, generator: Self::Generator, waveform: Waveform);
    fn set_frequency(&mut self, generator: Self::Generator, hz: f32, at: Time);
    fn set_detune(&mut self, generator: Self::Generator, cents: f32, at: Time);

    fn set_value_at_time(&mut self, gain: Self::Gain, value: f32, at: Time);
    fn linear_ramp_to_value_at_time(&mut self, gain: Self::Gain, value: f32, at: Time);
    fn cancel_scheduled_values(&mut self, gain: Self::Gain, from: Time);
    /// Instantaneous value of `gain` at the current time.
    fn gain_value(&self, gain: Self::Gain) -> f32;
}
