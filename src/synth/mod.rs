pub mod automation;
pub mod clock;
pub mod config;
pub mod context;
pub mod core;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod note;
pub mod observer;
pub mod oscillator;
pub mod prelude;
pub mod preset;
pub mod render;
pub mod voice;
pub mod waveform;

pub use self::clock::{AudioClock, Time};
pub use self::config::SynthConfig;
pub use self::context::SynthContext;
pub use self::core::Synth;
pub use self::envelope::{EnvelopeParams, EnvelopePhase};
pub use self::error::SynthError;
pub use self::filter::FilterSettings;
pub use self::note::{midi_to_frequency, NoteEvent, NoteId, NoteSource};
pub use self::observer::{LogObserver, VoiceEvent, VoiceObserver, VoiceStatus};
pub use self::oscillator::{ControlEvent, OscillatorPatch, OscillatorSettings, OscillatorSlot};
pub use self::preset::Preset;
pub use self::render::RenderContext;
pub use self::waveform::{CycleDirection, Waveform};
