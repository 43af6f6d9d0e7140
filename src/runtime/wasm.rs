use crate::synth::filter::FilterSettings;
use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::oscillator::{ControlEvent, OscillatorPatch};
use crate::synth::waveform::CycleDirection;
use crate::synth::{Preset, RenderContext, Synth, SynthConfig};
use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logging() {
    // Already set when a second synth is created
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// WASM Synth runtime (no threads, no channels, direct API)
#[wasm_bindgen]
pub struct WasmSynth {
    synth: Synth<RenderContext>,
    temp_buffer: Vec<f32>,
}

#[wasm_bindgen]
impl WasmSynth {
    #[wasm_bindgen(constructor)]
    pub fn new(polyphony: Option<usize>, sample_rate: Option<f32>) -> Result<WasmSynth, JsValue> {
        init_logging();
        let mut config = SynthConfig::default();
        if let Some(polyphony) = polyphony {
            config.polyphony = polyphony;
        }
        let context = RenderContext::with_config(sample_rate.unwrap_or(44_100.0), &config);
        let synth = Synth::new(context, &config).map_err(to_js)?;
        Ok(WasmSynth {
            synth,
            temp_buffer: Vec::new(),
        })
    }

    /// Render audio buffer into a JS-friendly Float32Array
    #[wasm_bindgen]
    pub fn render(&mut self, length: usize, sample_rate: f32) -> Float32Array {
        if self.temp_buffer.len() != length {
            self.temp_buffer = vec![0.0; length];
        }
        self.synth.update();
        self.synth
            .context_mut()
            .process(&mut self.temp_buffer, sample_rate);

        Float32Array::from(self.temp_buffer.as_slice())
    }

    /// `frequency` of 0 or less uses the equal-tempered pitch of `note`.
    #[wasm_bindgen]
    pub fn note_on(&mut self, note: u8, frequency: f32) {
        match NoteEvent::on(note, NoteSource::Host) {
            Ok(event) => {
                let frequency = if frequency > 0.0 {
                    frequency
                } else {
                    event.frequency
                };
                self.synth.note_on(event.note, frequency);
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    #[wasm_bindgen]
    pub fn note_off(&mut self, note: u8) {
        self.synth.note_off(note);
    }

    #[wasm_bindgen]
    pub fn all_notes_off(&mut self) {
        self.synth.all_notes_off();
    }

    #[wasm_bindgen]
    pub fn set_envelope(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.synth.set_envelope(attack, decay, sustain, release);
    }

    /// Accepts a partial object such as `{ octave1: 1, waveform2: "square" }`.
    #[wasm_bindgen]
    pub fn set_oscillator_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let patch: OscillatorPatch = serde_wasm_bindgen::from_value(settings)?;
        self.synth.set_oscillator_settings(&patch);
        Ok(())
    }

    /// 0 cycles waveforms backward, 1 forward, 2 toggles sync.
    #[wasm_bindgen]
    pub fn process_control_event(&mut self, event_code: u8) {
        let event = match event_code {
            0 => ControlEvent::CycleWaveform {
                direction: CycleDirection::Backward,
            },
            1 => ControlEvent::CycleWaveform {
                direction: CycleDirection::Forward,
            },
            2 => ControlEvent::ToggleSync,
            _ => return,
        };
        self.synth.handle_control(&event);
    }

    #[wasm_bindgen]
    pub fn set_filter(&mut self, frequency: f32, q: f32, bypassed: bool) {
        self.synth.context_mut().set_filter(FilterSettings {
            frequency,
            q,
            bypassed,
        });
    }

    #[wasm_bindgen]
    pub fn set_master_volume(&mut self, volume: f32) {
        self.synth.context_mut().set_master_volume(volume);
    }

    #[wasm_bindgen]
    pub fn active_voice_count(&self) -> usize {
        self.synth.active_voice_count()
    }

    /// `{ active, total }`
    #[wasm_bindgen]
    pub fn status(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.synth.status())?)
    }

    #[wasm_bindgen]
    pub fn export_preset(&self) -> Result<String, JsValue> {
        Preset::capture(&self.synth).to_json().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn load_preset(&mut self, json: &str) -> Result<(), JsValue> {
        let preset = Preset::from_json(json).map_err(|e| {
            log::warn!("Rejected preset: {}", e);
            to_js(e)
        })?;
        preset.apply_to(&mut self.synth);
        Ok(())
    }
}

fn to_js(e: crate::synth::SynthError) -> JsValue {
    JsValue::from_str(&e.to_string())
}
