use super::clock::Time;
use super::context::SynthContext;
use super::envelope::{Envelope, EnvelopeParams, EnvelopePhase};
use super::note::NoteId;
use super::oscillator::{OscillatorSettings, SLOTS};

/// One generator's route through the voice: generator -> mix -> envelope.
#[derive(Debug)]
struct SignalPath<C: SynthContext> {
    generator: C::Generator,
    mix: C::Gain,
    envelope: Envelope<C::Gain>,
}

/// Deactivation owed once a release ramp has finished.
///
/// Tied to the note and trigger that scheduled it, so a voice that has since
/// been stolen or retriggered never honours it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingRelease {
    note: NoteId,
    trigger_seq: u64,
    deadline: Time,
}

/// A single polyphonic slot: two persistent generators, their mix gains and
/// one envelope-controlled gain per generator.
///
/// Generators are created with the voice and only ever retargeted.
#[derive(Debug)]
pub struct Voice<C: SynthContext> {
    index: usize,
    active: bool,
    assigned_note: Option<NoteId>,
    base_frequency: f32,
    start_timestamp: Time,
    trigger_seq: u64,
    paths: [SignalPath<C>; SLOTS],
    pending_release: Option<PendingRelease>,
}

impl<C: SynthContext> Voice<C> {
    /// Creates a new, inactive voice and wires its signal paths.
    pub fn new(ctx: &mut C, index: usize, settings: &OscillatorSettings) -> Self {
        let paths = std::array::from_fn(|slot| {
            let generator = ctx.create_tone_generator();
            let mix = ctx.create_gain(settings.slots[slot].volume);
            let envelope = ctx.create_gain(0.0);
            ctx.connect(generator, mix, envelope);
            SignalPath {
                generator,
                mix,
                envelope: Envelope::new(envelope),
            }
        });

        let voice = Self {
            index,
            active: false,
            assigned_note: None,
            base_frequency: 0.0,
            start_timestamp: 0.0,
            trigger_seq: 0,
            paths,
            pending_release: None,
        };
        voice.apply_timbre(ctx, settings);
        voice
    }

    /// Takes ownership of `note` and starts both envelopes from their
    /// current level.
    pub(crate) fn assign(
        &mut self,
        ctx: &mut C,
        note: NoteId,
        base_frequency: f32,
        trigger_seq: u64,
        settings: &OscillatorSettings,
        envelope: &EnvelopeParams,
    ) {
        self.active = true;
        self.assigned_note = Some(note);
        self.base_frequency = base_frequency;
        self.start_timestamp = ctx.now();
        self.trigger_seq = trigger_seq;
        self.pending_release = None;

        self.apply_timbre(ctx, settings);
        self.apply_pitch(ctx, settings);
        for path in self.paths.iter_mut() {
            path.envelope.trigger(ctx, envelope);
        }
    }

    /// Starts the release ramps and records when the voice may be freed.
    /// Returns the release deadline, or `None` if nothing is assigned.
    pub(crate) fn release(&mut self, ctx: &mut C, envelope: &EnvelopeParams) -> Option<Time> {
        let note = self.assigned_note.filter(|_| self.active)?;

        let mut deadline = ctx.now();
        for path in self.paths.iter_mut() {
            deadline = deadline.max(path.envelope.release(ctx, envelope));
        }
        self.pending_release = Some(PendingRelease {
            note,
            trigger_seq: self.trigger_seq,
            deadline,
        });
        Some(deadline)
    }

    /// Frees the voice if its release has run out. Returns the note it held.
    pub(crate) fn finish_release(&mut self, now: Time) -> Option<NoteId> {
        let pending = self.pending_release?;
        if !self.owns(&pending) {
            // Reassigned in the meantime: the deactivation is stale.
            self.pending_release = None;
            return None;
        }
        if pending.deadline > now {
            return None;
        }

        self.active = false;
        self.assigned_note = None;
        self.pending_release = None;
        for path in self.paths.iter_mut() {
            path.envelope.reset();
        }
        Some(pending.note)
    }

    /// Re-applies shape and mix level; safe on idle voices.
    pub(crate) fn apply_timbre(&self, ctx: &mut C, settings: &OscillatorSettings) {
        let now = ctx.now();
        for (path, slot) in self.paths.iter().zip(settings.slots.iter()) {
            ctx.set_shape(path.generator, slot.waveform);
            ctx.set_value_at_time(path.mix, slot.volume, now);
        }
    }

    /// Re-tunes both generators for the assigned note without touching the
    /// envelopes. Does nothing on a free voice.
    pub(crate) fn apply_pitch(&self, ctx: &mut C, settings: &OscillatorSettings) {
        if self.assigned_note.is_none() {
            return;
        }
        let now = ctx.now();
        let frequencies = settings.frequencies(self.base_frequency);
        for ((path, slot), hz) in self.paths.iter().zip(settings.slots.iter()).zip(frequencies) {
            ctx.set_frequency(path.generator, hz, now);
            ctx.set_detune(path.generator, slot.fine, now);
        }
    }

    fn owns(&self, pending: &PendingRelease) -> bool {
        self.assigned_note == Some(pending.note) && self.trigger_seq == pending.trigger_seq
    }

    /// Active at `now`, counting a release that is due but not yet reaped
    /// as finished.
    pub fn is_active_at(&self, now: Time) -> bool {
        match self.pending_release {
            Some(pending) if self.owns(&pending) && pending.deadline <= now => false,
            _ => self.active,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while the voice sounds its release tail.
    pub fn is_releasing(&self) -> bool {
        self.pending_release.is_some()
    }

    pub fn assigned_note(&self) -> Option<NoteId> {
        self.assigned_note
    }

    pub fn start_timestamp(&self) -> Time {
        self.start_timestamp
    }

    pub(crate) fn trigger_seq(&self) -> u64 {
        self.trigger_seq
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn generator(&self, slot: usize) -> C::Generator {
        self.paths[slot].generator
    }

    pub fn mix_gain(&self, slot: usize) -> C::Gain {
        self.paths[slot].mix
    }

    pub fn envelope_gain(&self, slot: usize) -> C::Gain {
        self.paths[slot].envelope.gain()
    }

    pub fn envelope_phase(&self, slot: usize, now: Time) -> EnvelopePhase {
        self.paths[slot].envelope.phase_at(now)
    }
}
