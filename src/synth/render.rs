use super::automation::AutomationParam;
use super::clock::{AudioClock, Time};
use super::config::SynthConfig;
use super::context::SynthContext;
use super::filter::{FilterSettings, LowPassBiquad};
use super::prelude::TAU;
use super::waveform::Waveform;

/// Length of the ramp applied when the master volume changes.
const MASTER_RAMP_SECONDS: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GainId(usize);

#[derive(Debug, Clone)]
struct Oscillator {
    waveform: Waveform,
    frequency: AutomationParam,
    detune: AutomationParam,
    phase: f32,
}

impl Oscillator {
    fn new() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: AutomationParam::new(440.0),
            detune: AutomationParam::new(0.0),
            phase: 0.0,
        }
    }

    fn next_sample(&mut self, time: Time, sample_rate: f32) -> f32 {
        let cents = self.detune.value_at(time);
        let hz = self.frequency.value_at(time) * 2.0_f32.powf(cents / 1200.0);
        let value = self.waveform.evaluate(self.phase);
        // An unusable pitch holds the phase instead of poisoning it
        if hz.is_finite() && hz > 0.0 {
            self.phase = (self.phase + TAU * hz / sample_rate) % TAU;
        }
        value
    }
}

#[derive(Debug, Clone, Copy)]
struct Route {
    generator: GeneratorId,
    mix: GainId,
    envelope: GainId,
}

/// Built-in synthesis backend.
///
/// Owns every oscillator and gain timeline in an arena and renders them
/// block by block:
/// generator -> mix gain -> envelope gain -> shared low-pass -> master -> soft clip.
/// Its clock is the number of frames rendered so far.
#[derive(Debug)]
pub struct RenderContext {
    time: Time,
    sample_rate: f32,
    oscillators: Vec<Oscillator>,
    gains: Vec<AutomationParam>,
    routes: Vec<Route>,
    generator_out: Vec<f32>,
    filter: LowPassBiquad,
    filter_settings: FilterSettings,
    filter_dirty: bool,
    master: AutomationParam,
}

impl RenderContext {
    pub fn new(sample_rate: f32) -> Self {
        let filter_settings = FilterSettings::default();
        Self {
            time: 0.0,
            sample_rate,
            oscillators: Vec::new(),
            gains: Vec::new(),
            routes: Vec::new(),
            generator_out: Vec::new(),
            filter: LowPassBiquad::new(filter_settings.frequency, filter_settings.q, sample_rate),
            filter_settings,
            filter_dirty: false,
            master: AutomationParam::new(0.65),
        }
    }

    /// A context with the filter and master volume taken from `config`.
    pub fn with_config(sample_rate: f32, config: &SynthConfig) -> Self {
        let mut ctx = Self::new(sample_rate);
        ctx.filter_settings = config.filter;
        ctx.filter_dirty = true;
        ctx.master = AutomationParam::new(config.master_volume.clamp(0.0, 1.0));
        ctx
    }

    /// Render a mono block, advancing the clock by `output.len()` frames.
    pub fn process(&mut self, output: &mut [f32], sample_rate: f32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.filter_dirty = true;
        }
        if self.filter_dirty {
            let FilterSettings { frequency, q, .. } = self.filter_settings;
            self.filter.configure(frequency, q, self.sample_rate);
            self.filter_dirty = false;
        }

        let frame = 1.0 / self.sample_rate as f64;
        for (i, sample) in output.iter_mut().enumerate() {
            let t = self.time + i as f64 * frame;

            for (out, osc) in self.generator_out.iter_mut().zip(self.oscillators.iter_mut()) {
                *out = osc.next_sample(t, self.sample_rate);
            }

            let mut mixed = 0.0;
            for route in &self.routes {
                let gain = self.gains[route.mix.0].value_at(t) * self.gains[route.envelope.0].value_at(t);
                if gain != 0.0 {
                    mixed += self.generator_out[route.generator.0] * gain;
                }
            }

            let filtered = if self.filter_settings.bypassed {
                mixed
            } else {
                self.filter.process(mixed)
            };
            *sample = soft_clip(filtered * self.master.value_at(t));
        }

        self.advance(output.len() as f64 * frame);
    }

    /// Move the clock forward without rendering.
    pub fn advance(&mut self, seconds: f64) {
        self.time += seconds.max(0.0);
        let now = self.time;
        for gain in self.gains.iter_mut() {
            gain.prune_before(now);
        }
        for osc in self.oscillators.iter_mut() {
            osc.frequency.prune_before(now);
            osc.detune.prune_before(now);
        }
        self.master.prune_before(now);
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn filter_settings(&self) -> FilterSettings {
        self.filter_settings
    }

    pub fn set_filter(&mut self, settings: FilterSettings) {
        if settings.bypassed != self.filter_settings.bypassed {
            self.filter.reset();
        }
        self.filter_settings = settings;
        self.filter_dirty = true;
        log::info!("Filter updated: {:?}", settings);
    }

    pub fn master_volume(&self) -> f32 {
        self.master.value_at(self.time)
    }

    /// Ramp to a new master volume (0.0 to 1.0) over a few milliseconds.
    pub fn set_master_volume(&mut self, volume: f32) {
        let now = self.time;
        let current = self.master.value_at(now);
        self.master.cancel_scheduled_values(now);
        self.master.set_value_at_time(current, now);
        self.master
            .linear_ramp_to_value_at_time(volume.clamp(0.0, 1.0), now + MASTER_RAMP_SECONDS);
    }

    pub fn shape(&self, generator: GeneratorId) -> Waveform {
        self.oscillators[generator.0].waveform
    }

    pub fn frequency(&self, generator: GeneratorId) -> f32 {
        self.oscillators[generator.0].frequency.value_at(self.time)
    }

    pub fn detune(&self, generator: GeneratorId) -> f32 {
        self.oscillators[generator.0].detune.value_at(self.time)
    }

    pub fn gain_value_at(&self, gain: GainId, time: Time) -> f32 {
        self.gains[gain.0].value_at(time)
    }
}

impl AudioClock for RenderContext {
    fn now(&self) -> Time {
        self.time
    }
}

impl SynthContext for RenderContext {
    type Generator = GeneratorId;
    type Gain = GainId;

    fn create_tone_generator(&mut self) -> GeneratorId {
        self.oscillators.push(Oscillator::new());
        self.generator_out.push(0.0);
        GeneratorId(self.oscillators.len() - 1)
    }

    fn create_gain(&mut self, initial: f32) -> GainId {
        self.gains.push(AutomationParam::new(initial));
        GainId(self.gains.len() - 1)
    }

    fn connect(&mut self, generator: GeneratorId, mix: GainId, envelope: GainId) {
        self.routes.push(Route {
            generator,
            mix,
            envelope,
        });
    }

    fn set_shape(&mut self, generator: GeneratorId, waveform: Waveform) {
        self.oscillators[generator.0].waveform = waveform;
    }

    fn set_frequency(&mut self, generator: GeneratorId, hz: f32, at: Time) {
        self.oscillators[generator.0]
            .frequency
            .set_value_at_time(hz, at);
    }

    fn set_detune(&mut self, generator: GeneratorId, cents: f32, at: Time) {
        self.oscillators[generator.0].detune.set_value_at_time(cents, at);
    }

    fn set_value_at_time(&mut self, gain: GainId, value: f32, at: Time) {
        self.gains[gain.0].set_value_at_time(value, at);
    }

    fn linear_ramp_to_value_at_time(&mut self, gain: GainId, value: f32, at: Time) {
        self.gains[gain.0].linear_ramp_to_value_at_time(value, at);
    }

    fn cancel_scheduled_values(&mut self, gain: GainId, from: Time) {
        self.gains[gain.0].cancel_scheduled_values(from);
    }

    fn gain_value(&self, gain: GainId) -> f32 {
        self.gains[gain.0].value_at(self.time)
    }
}

/// Soft clipping above full scale, using a gentle tanh knee.
fn soft_clip(sample: f32) -> f32 {
    if sample.abs() <= 1.0 {
        sample
    } else {
        sample.signum() * (1.0 + (sample.abs() - 1.0).tanh() * 0.5)
    }
}
