use crate::audio::{AudioBackend, CpalBackend};
use crate::input::{KeyboardHandler, MidiHandler};
use crate::synth::note::NoteEvent;
use crate::synth::observer::LogObserver;
use crate::synth::oscillator::ControlEvent;
use crate::synth::{RenderContext, Synth, SynthConfig, SynthError};
use std::sync::mpsc::channel;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Native runtime synth implementation for desktop/CPAL backends.
pub struct NativeSynth {
    synth: Synth<RenderContext>,
    note_receiver: Receiver<NoteEvent>,
    control_receiver: Receiver<ControlEvent>,
}

impl NativeSynth {
    pub fn new(
        synth: Synth<RenderContext>,
        note_receiver: Receiver<NoteEvent>,
        control_receiver: Receiver<ControlEvent>,
    ) -> Self {
        Self {
            synth,
            note_receiver,
            control_receiver,
        }
    }

    /// Applies queued input, frees finished voices and renders one block.
    pub fn process(&mut self, output: &mut [f32], sample_rate: f32) {
        self.process_note_events();
        self.process_control_events();
        self.synth.update();
        self.synth.context_mut().process(output, sample_rate);
    }

    fn process_note_events(&mut self) {
        while let Ok(event) = self.note_receiver.try_recv() {
            if event.is_on {
                self.synth.note_on(event.note, event.frequency);
            } else {
                self.synth.note_off(event.note);
            }
        }
    }

    fn process_control_events(&mut self) {
        while let Ok(event) = self.control_receiver.try_recv() {
            self.synth.handle_control(&event);
        }
    }

    pub fn synth(&self) -> &Synth<RenderContext> {
        &self.synth
    }
}

/// Builds the synth from `config` and runs audio, keyboard and MIDI until
/// the process is killed.
pub fn start(config: SynthConfig) -> Result<(), SynthError> {
    let (note_tx, note_rx) = channel();
    let (control_tx, control_rx) = channel();

    // The real rate is only known once the output stream is open.
    let context = RenderContext::with_config(44_100.0, &config);
    let synth = Synth::new(context, &config)?.with_observer(Box::new(LogObserver));
    let synth = Arc::new(Mutex::new(NativeSynth::new(synth, note_rx, control_rx)));

    let mut audio_backend = CpalBackend::new(synth);
    audio_backend.start();

    let mut keyboard_handler = KeyboardHandler::new(note_tx.clone(), control_tx);
    let mut midi_handler = MidiHandler::new(note_tx);

    loop {
        keyboard_handler.update();
        midi_handler.update();
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::note::NoteSource;
    use crate::synth::waveform::{CycleDirection, Waveform};

    fn native() -> (
        NativeSynth,
        std::sync::mpsc::Sender<NoteEvent>,
        std::sync::mpsc::Sender<ControlEvent>,
    ) {
        let config = SynthConfig::default();
        let synth = Synth::new(RenderContext::with_config(48_000.0, &config), &config).unwrap();
        let (note_tx, note_rx) = channel();
        let (control_tx, control_rx) = channel();
        (NativeSynth::new(synth, note_rx, control_rx), note_tx, control_tx)
    }

    #[test]
    fn queued_notes_sound_on_next_block() {
        let (mut native, notes, _) = native();
        notes.send(NoteEvent::on(69, NoteSource::Keyboard).unwrap()).unwrap();

        let mut buffer = vec![0.0; 2048];
        native.process(&mut buffer, 48_000.0);
        assert_eq!(native.synth().active_voice_count(), 1);
        assert!(buffer.iter().any(|s| s.abs() > 1e-3));

        notes.send(NoteEvent::off(69, NoteSource::Keyboard).unwrap()).unwrap();
        native.process(&mut buffer, 48_000.0);
        assert_eq!(native.synth().held_notes(), 0);
    }

    #[test]
    fn control_events_reach_the_synth() {
        let (mut native, _, controls) = native();
        controls
            .send(ControlEvent::CycleWaveform {
                direction: CycleDirection::Backward,
            })
            .unwrap();
        controls.send(ControlEvent::ToggleSync).unwrap();

        let mut buffer = vec![0.0; 64];
        native.process(&mut buffer, 48_000.0);
        let settings = native.synth().oscillator_settings();
        assert_eq!(settings.slots[0].waveform, Waveform::Triangle);
        assert!(settings.sync);
    }
}
