use super::clock::Time;
use super::config::SynthConfig;
use super::context::SynthContext;
use super::envelope::EnvelopeParams;
use super::error::SynthError;
use super::note::{midi_to_frequency, NoteId};
use super::observer::{VoiceEvent, VoiceObserver, VoiceStatus};
use super::oscillator::{ControlEvent, OscillatorPatch, OscillatorSettings};
use super::prelude::HashMap;
use super::voice::Voice;

/// The voice pool manager: maps notes onto a fixed set of voices, schedules
/// their envelopes and fans global settings out to every voice.
///
/// The synthesis context is injected at construction and owned here; the
/// application reaches it through `context()`/`context_mut()` to render.
pub struct Synth<C: SynthContext> {
    context: C,
    voices: Vec<Voice<C>>,
    note_to_voice: HashMap<NoteId, usize>,
    envelope: EnvelopeParams,
    oscillators: OscillatorSettings,
    observers: Vec<Box<dyn VoiceObserver>>,
    trigger_counter: u64,
}

impl<C: SynthContext> Synth<C> {
    /// Builds the pool, creating every voice's generators up front.
    pub fn new(mut context: C, config: &SynthConfig) -> Result<Self, SynthError> {
        if config.polyphony == 0 {
            return Err(SynthError::EmptyVoicePool);
        }

        let oscillators = config.oscillators.sanitized();
        let voices = (0..config.polyphony)
            .map(|index| Voice::new(&mut context, index, &oscillators))
            .collect();

        log::info!("Synth created with {} voices", config.polyphony);

        Ok(Self {
            context,
            voices,
            note_to_voice: HashMap::new(),
            envelope: config.envelope.clamped(),
            oscillators,
            observers: Vec::new(),
            trigger_counter: 0,
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn VoiceObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn VoiceObserver>) {
        self.observers.push(observer);
    }

    /// Starts `note` on a voice. Always succeeds: when the pool is exhausted
    /// the oldest voice is cut short and reused.
    pub fn note_on(&mut self, note: NoteId, base_frequency: f32) {
        self.update();

        let base_frequency = if base_frequency.is_finite() && base_frequency > 0.0 {
            base_frequency
        } else {
            midi_to_frequency(note)
        };

        // Re-trigger: release the held voice and restart it in place. A voice
        // still releasing this note is reclaimed so its tail stops.
        let index = match self.note_to_voice.get(&note).copied() {
            Some(index) => {
                self.note_off(note);
                index
            }
            None => match self.find_releasing_voice(note).or_else(|| self.find_free_voice()) {
                Some(index) => index,
                None => self.steal_voice(note),
            },
        };

        self.trigger_counter += 1;
        let voice = &mut self.voices[index];
        voice.assign(
            &mut self.context,
            note,
            base_frequency,
            self.trigger_counter,
            &self.oscillators,
            &self.envelope,
        );
        self.note_to_voice.insert(note, index);

        self.notify(VoiceEvent::Triggered { voice: index, note });
        self.notify_activity();
    }

    /// Convenience for callers that only know the MIDI note number.
    pub fn note_on_midi(&mut self, note: NoteId) {
        self.note_on(note, midi_to_frequency(note));
    }

    /// Releases `note`. Unknown or already released notes are ignored.
    pub fn note_off(&mut self, note: NoteId) {
        let Some(index) = self.note_to_voice.remove(&note) else {
            return;
        };
        let voice = &mut self.voices[index];
        if let Some(deadline) = voice.release(&mut self.context, &self.envelope) {
            log::trace!("note {} releases until {:.4}", note, deadline);
            self.notify(VoiceEvent::Released { voice: index, note });
        }
    }

    /// Releases every held note through the normal note-off path.
    pub fn all_notes_off(&mut self) {
        let held: Vec<NoteId> = self.note_to_voice.keys().copied().collect();
        for note in held {
            self.note_off(note);
        }
    }

    /// Frees voices whose release has finished. Cheap; runtimes call it once
    /// per rendered block and `note_on` calls it before allocating.
    pub fn update(&mut self) {
        let now = self.context.now();
        let mut freed = false;
        for index in 0..self.voices.len() {
            if let Some(note) = self.voices[index].finish_release(now) {
                freed = true;
                self.notify(VoiceEvent::Freed { voice: index, note });
            }
        }
        if freed {
            self.notify_activity();
        }
    }

    /// Stores new global envelope settings (clamped). Ramps already
    /// scheduled on sounding voices are left untouched.
    pub fn set_envelope(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.envelope = EnvelopeParams::new(attack, decay, sustain, release);
        log::info!("Envelope updated: {:?}", self.envelope);
    }

    pub fn set_envelope_params(&mut self, params: EnvelopeParams) {
        let EnvelopeParams {
            attack,
            decay,
            sustain,
            release,
        } = params;
        self.set_envelope(attack, decay, sustain, release);
    }

    /// Merges a partial oscillator update. Shape and mix reach every voice;
    /// pitch changes re-tune sounding voices without retriggering them.
    pub fn set_oscillator_settings(&mut self, patch: &OscillatorPatch) {
        let scope = self.oscillators.apply(patch);

        if scope.timbre {
            for voice in &self.voices {
                voice.apply_timbre(&mut self.context, &self.oscillators);
            }
        }
        if scope.pitch {
            for voice in self.voices.iter().filter(|v| v.is_active()) {
                voice.apply_pitch(&mut self.context, &self.oscillators);
            }
        }
        log::info!("Oscillator settings updated: {:?}", self.oscillators);
    }

    /// Front-panel action from the keyboard; routed through the same
    /// partial-update path as `set_oscillator_settings`.
    pub fn handle_control(&mut self, event: &ControlEvent) {
        let patch = self.oscillators.control_patch(event);
        self.set_oscillator_settings(&patch);
    }

    /// Number of voices sounding or releasing right now.
    pub fn active_voice_count(&self) -> usize {
        let now = self.context.now();
        self.voices.iter().filter(|v| v.is_active_at(now)).count()
    }

    pub fn status(&self) -> VoiceStatus {
        VoiceStatus {
            active: self.active_voice_count(),
            total: self.voices.len(),
        }
    }

    pub fn envelope(&self) -> EnvelopeParams {
        self.envelope
    }

    pub fn oscillator_settings(&self) -> OscillatorSettings {
        self.oscillators
    }

    pub fn voices(&self) -> &[Voice<C>] {
        &self.voices
    }

    /// The voice currently holding `note`, if it is still held.
    pub fn voice_for_note(&self, note: NoteId) -> Option<&Voice<C>> {
        self.note_to_voice.get(&note).map(|&index| &self.voices[index])
    }

    pub fn held_notes(&self) -> usize {
        self.note_to_voice.len()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn now(&self) -> Time {
        self.context.now()
    }

    /// First inactive voice in pool order.
    fn find_free_voice(&self) -> Option<usize> {
        self.voices.iter().position(|voice| !voice.is_active())
    }

    fn find_releasing_voice(&self, note: NoteId) -> Option<usize> {
        self.voices
            .iter()
            .position(|voice| voice.is_active() && voice.assigned_note() == Some(note))
    }

    /// Oldest-note-first stealing. The victim runs its normal release path
    /// and is reassigned immediately, truncating its tail.
    fn steal_voice(&mut self, incoming: NoteId) -> usize {
        let index = self
            .voices
            .iter()
            .min_by(|a, b| {
                a.start_timestamp()
                    .total_cmp(&b.start_timestamp())
                    .then(a.trigger_seq().cmp(&b.trigger_seq()))
            })
            .map(|voice| voice.index())
            .unwrap_or(0);

        let previous = self.voices[index].assigned_note();
        match previous {
            Some(note) if self.note_to_voice.get(&note) == Some(&index) => self.note_off(note),
            _ => {
                // Already in its release tail; cut it again from where it is.
                let voice = &mut self.voices[index];
                voice.release(&mut self.context, &self.envelope);
            }
        }

        log::debug!(
            "Stealing voice {} (note {:?}) for note {}",
            index,
            previous,
            incoming
        );
        self.notify(VoiceEvent::Stolen {
            voice: index,
            from: previous,
            to: incoming,
        });
        index
    }

    fn notify(&mut self, event: VoiceEvent) {
        for observer in self.observers.iter_mut() {
            observer.voice_event(&event);
        }
    }

    fn notify_activity(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let status = self.status();
        for observer in self.observers.iter_mut() {
            observer.activity_changed(status);
        }
    }
}
