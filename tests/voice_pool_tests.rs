use sonora_synth::synth::{
    AudioClock, EnvelopePhase, OscillatorPatch, RenderContext, Synth, SynthConfig, SynthContext,
    SynthError, VoiceEvent, VoiceObserver, VoiceStatus, Waveform,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn synth_with(polyphony: usize) -> Synth<RenderContext> {
    let config = SynthConfig::default().with_polyphony(polyphony);
    Synth::new(RenderContext::new(48_000.0), &config).unwrap()
}

fn voice_index(synth: &Synth<RenderContext>, note: u8) -> usize {
    synth.voice_for_note(note).expect("note is held").index()
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<VoiceEvent>>>);

impl Recorder {
    fn events(&self) -> Vec<VoiceEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl VoiceObserver for Recorder {
    fn voice_event(&mut self, event: &VoiceEvent) {
        self.0.lock().unwrap().push(*event);
    }
}

#[test]
fn distinct_notes_get_distinct_voices() {
    let mut synth = synth_with(4);
    for note in [60, 64, 67] {
        synth.note_on_midi(note);
    }

    let indices: HashSet<usize> = [60, 64, 67]
        .iter()
        .map(|note| voice_index(&synth, *note))
        .collect();
    assert_eq!(indices.len(), 3);
    assert_eq!(synth.active_voice_count(), 3);
    assert_eq!(synth.held_notes(), 3);

    let released = voice_index(&synth, 64);
    synth.note_off(64);
    // Still sounding its release tail
    assert_eq!(synth.active_voice_count(), 3);
    assert_eq!(synth.held_notes(), 2);

    synth.context_mut().advance(0.6);
    assert_eq!(synth.active_voice_count(), 2);
    synth.update();
    assert!(!synth.voices()[released].is_active());
    assert_eq!(synth.voices()[released].assigned_note(), None);
}

#[test]
fn free_voices_are_taken_in_pool_order() {
    let mut synth = synth_with(4);
    synth.note_on_midi(60);
    synth.note_on_midi(62);
    assert_eq!(voice_index(&synth, 60), 0);
    assert_eq!(voice_index(&synth, 62), 1);
}

#[test]
fn oldest_voice_is_stolen() {
    let mut synth = synth_with(4);
    for note in [60, 64, 67, 71] {
        synth.note_on_midi(note);
        synth.context_mut().advance(0.01);
    }
    assert_eq!(synth.active_voice_count(), 4);
    let victim = voice_index(&synth, 60);

    synth.note_on_midi(72);

    assert!(synth.voice_for_note(60).is_none());
    assert_eq!(voice_index(&synth, 72), victim);
    assert_eq!(synth.active_voice_count(), 4);
    assert_eq!(synth.held_notes(), 4);

    let now = synth.now();
    let voice = &synth.voices()[victim];
    assert_eq!(voice.assigned_note(), Some(72));
    assert_eq!(voice.start_timestamp(), now);
    assert_eq!(voice.envelope_phase(0, now + 0.01), EnvelopePhase::Attack);
}

#[test]
fn stealing_prefers_the_oldest_even_when_releasing() {
    let mut synth = synth_with(2);
    synth.note_on_midi(60);
    synth.context_mut().advance(0.01);
    synth.note_on_midi(64);
    synth.context_mut().advance(0.01);

    let oldest = voice_index(&synth, 60);
    synth.note_off(60);
    synth.note_on_midi(67);

    assert_eq!(voice_index(&synth, 67), oldest);
    assert_eq!(voice_index(&synth, 64), 1 - oldest);

    // The release scheduled for note 60 must not free the new owner
    synth.context_mut().advance(0.6);
    synth.update();
    let voice = &synth.voices()[oldest];
    assert!(voice.is_active());
    assert_eq!(voice.assigned_note(), Some(67));
    assert_eq!(voice_index(&synth, 67), oldest);
    assert_eq!(synth.active_voice_count(), 2);
}

#[test]
fn steal_notifies_observers() {
    let recorder = Recorder::default();
    let mut synth = synth_with(1).with_observer(Box::new(recorder.clone()));

    synth.note_on_midi(60);
    synth.note_on_midi(62);

    let events = recorder.events();
    assert!(events.contains(&VoiceEvent::Stolen {
        voice: 0,
        from: Some(60),
        to: 62,
    }));
    assert_eq!(events.last(), Some(&VoiceEvent::Triggered { voice: 0, note: 62 }));
}

#[test]
fn second_note_off_is_ignored() {
    let recorder = Recorder::default();
    let mut synth = synth_with(4).with_observer(Box::new(recorder.clone()));

    synth.note_on_midi(60);
    synth.context_mut().advance(0.2);
    synth.note_off(60);
    synth.note_off(60);
    synth.note_off(61);

    let released = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, VoiceEvent::Released { .. }))
        .count();
    assert_eq!(released, 1);
    assert_eq!(synth.held_notes(), 0);

    // Release of 0.5 s started at 0.2 s
    synth.context_mut().advance(0.49);
    assert_eq!(synth.active_voice_count(), 1);
    synth.context_mut().advance(0.02);
    assert_eq!(synth.active_voice_count(), 0);

    synth.update();
    let freed = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, VoiceEvent::Freed { .. }))
        .count();
    assert_eq!(freed, 1);
}

#[test]
fn replaying_a_releasing_note_cancels_its_release() {
    let mut synth = synth_with(4);
    synth.note_on_midi(60);
    let index = voice_index(&synth, 60);

    synth.context_mut().advance(0.2);
    synth.note_off(60);
    synth.context_mut().advance(0.1);

    let gain = synth.voices()[index].envelope_gain(0);
    let level = synth.context().gain_value(gain);
    assert!(level > 0.0 && level < 1.0);

    synth.note_on_midi(60);
    assert_eq!(voice_index(&synth, 60), index);

    let now = synth.now();
    let voice = &synth.voices()[index];
    assert!(!voice.is_releasing());
    assert_eq!(voice.envelope_phase(0, now + 0.01), EnvelopePhase::Attack);
    // Attack resumes from the in-flight level
    assert!((synth.context().gain_value(gain) - level).abs() < 1e-6);

    // Past the old release deadline the note is still sustaining
    synth.context_mut().advance(0.5);
    synth.update();
    assert_eq!(synth.active_voice_count(), 1);
    let now = synth.now();
    assert_eq!(synth.voices()[index].envelope_phase(0, now), EnvelopePhase::Sustain);
    assert!((synth.context().gain_value(gain) - 0.7).abs() < 1e-5);
}

#[test]
fn held_note_retriggers_in_place() {
    let recorder = Recorder::default();
    let mut synth = synth_with(4).with_observer(Box::new(recorder.clone()));

    synth.note_on_midi(60);
    let index = voice_index(&synth, 60);
    synth.context_mut().advance(0.05);
    synth.note_on_midi(60);

    assert_eq!(voice_index(&synth, 60), index);
    assert_eq!(synth.held_notes(), 1);
    assert_eq!(synth.active_voice_count(), 1);
    assert_eq!(
        recorder.events(),
        vec![
            VoiceEvent::Triggered { voice: index, note: 60 },
            VoiceEvent::Released { voice: index, note: 60 },
            VoiceEvent::Triggered { voice: index, note: 60 },
        ]
    );
}

#[test]
fn octave_change_retunes_held_note_without_retrigger() {
    let mut synth = synth_with(4);
    synth.note_on(69, 440.0);
    synth.context_mut().advance(0.2);

    let voice = synth.voice_for_note(69).unwrap();
    let (first, second) = (voice.generator(0), voice.generator(1));
    let gain = voice.envelope_gain(0);
    let started = voice.start_timestamp();
    let level = synth.context().gain_value(gain);
    assert!((synth.context().frequency(first) - 440.0).abs() < 1e-3);

    synth.set_oscillator_settings(&OscillatorPatch {
        octave1: Some(1.0),
        ..Default::default()
    });

    let now = synth.now();
    let voice = synth.voice_for_note(69).unwrap();
    assert!((synth.context().frequency(first) - 880.0).abs() < 1e-2);
    assert!((synth.context().frequency(second) - 440.0).abs() < 1e-3);
    assert_eq!(voice.start_timestamp(), started);
    assert_eq!(voice.envelope_phase(0, now), EnvelopePhase::Decay);
    assert_eq!(synth.context().gain_value(gain), level);

    synth.set_oscillator_settings(&OscillatorPatch {
        sync: Some(true),
        fine2: Some(-7.0),
        ..Default::default()
    });
    assert!((synth.context().frequency(second) - 880.0).abs() < 1e-2);
    assert_eq!(synth.context().detune(second), -7.0);
}

#[test]
fn extreme_pitch_settings_keep_audio_alive() {
    let mut synth = synth_with(4);
    synth.note_on_midi(69);
    synth.set_oscillator_settings(&OscillatorPatch {
        octave1: Some(200.0),
        semi2: Some(f32::NAN),
        ..Default::default()
    });
    let settings = synth.oscillator_settings();
    assert_eq!(settings.slots[0].octave, 4.0);
    assert_eq!(settings.slots[1].semitone, 0.0);

    let mut buffer = vec![0.0; 256];
    synth.context_mut().process(&mut buffer, 48_000.0);
    assert!(buffer.iter().all(|s| s.is_finite()));

    // A base frequency that overflows once shifted is held, not propagated
    synth.note_on(70, 1e38);
    synth.context_mut().process(&mut buffer, 48_000.0);
    assert!(buffer.iter().all(|s| s.is_finite()));

    synth.set_oscillator_settings(&OscillatorPatch {
        octave1: Some(0.0),
        ..Default::default()
    });
    synth.all_notes_off();
    synth.context_mut().advance(1.0);
    synth.note_on_midi(60);
    for _ in 0..20 {
        synth.update();
        synth.context_mut().process(&mut buffer, 48_000.0);
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
    assert!(buffer.iter().any(|s| s.abs() > 1e-3));
}

#[test]
fn loaded_oscillator_settings_are_sanitized() {
    let config = SynthConfig::from_json(
        r#"{ "oscillators": { "slots": [{ "volume": -2.0, "octave": 40 }, { "semitone": 99 }] } }"#,
    )
    .unwrap();
    let synth = Synth::new(RenderContext::new(48_000.0), &config).unwrap();

    let settings = synth.oscillator_settings();
    assert_eq!(settings.slots[0].volume, 0.0);
    assert_eq!(settings.slots[0].octave, 4.0);
    assert_eq!(settings.slots[1].semitone, 24.0);
    let mix = synth.voices()[0].mix_gain(0);
    assert_eq!(synth.context().gain_value(mix), 0.0);
}

#[test]
fn shape_changes_reach_idle_voices() {
    let mut synth = synth_with(3);
    synth.note_on_midi(60);

    synth.set_oscillator_settings(&OscillatorPatch {
        waveform1: Some(Waveform::Square),
        ..Default::default()
    });

    for voice in synth.voices() {
        assert_eq!(synth.context().shape(voice.generator(0)), Waveform::Square);
        assert_eq!(synth.context().shape(voice.generator(1)), Waveform::Sine);
    }
}

#[test]
fn zero_length_envelope_frees_voice_after_epsilon() {
    let mut synth = synth_with(4);
    synth.set_envelope(0.0, 0.0, 1.0, 0.0);
    synth.note_on(69, 440.0);
    synth.note_off(69);

    assert_eq!(synth.active_voice_count(), 1);
    synth.context_mut().advance(2e-4);
    assert_eq!(synth.active_voice_count(), 0);

    synth.update();
    let voice = &synth.voices()[0];
    assert!(!voice.is_active());
    assert_eq!(voice.assigned_note(), None);
    assert_eq!(synth.context().gain_value(voice.envelope_gain(0)), 0.0);
}

#[test]
fn envelope_values_are_clamped() {
    let mut synth = synth_with(1);
    synth.set_envelope(-1.0, f32::NAN, 3.0, f32::INFINITY);
    let envelope = synth.envelope();
    assert_eq!(envelope.attack, 0.0);
    assert_eq!(envelope.decay, 0.0);
    assert_eq!(envelope.sustain, 1.0);
    assert_eq!(envelope.release, 0.0);
}

#[test]
fn all_notes_off_releases_everything() {
    let mut synth = synth_with(4);
    for note in [48, 52, 55] {
        synth.note_on_midi(note);
    }
    synth.all_notes_off();

    assert_eq!(synth.held_notes(), 0);
    assert_eq!(synth.active_voice_count(), 3);
    synth.context_mut().advance(0.6);
    assert_eq!(synth.active_voice_count(), 0);
}

#[test]
fn status_reports_pool_usage() {
    let mut synth = synth_with(4);
    synth.note_on_midi(60);
    synth.note_on_midi(67);
    assert_eq!(synth.status(), VoiceStatus { active: 2, total: 4 });
}

#[test]
fn empty_pool_is_rejected() {
    let result = Synth::new(
        RenderContext::new(48_000.0),
        &SynthConfig::default().with_polyphony(0),
    );
    assert!(matches!(result, Err(SynthError::EmptyVoicePool)));
}

#[test]
fn invalid_base_frequency_uses_note_pitch() {
    let mut synth = synth_with(2);
    synth.note_on(69, f32::NAN);
    synth.note_on(57, -10.0);
    assert_eq!(synth.voice_for_note(69).unwrap().base_frequency(), 440.0);
    assert!((synth.voice_for_note(57).unwrap().base_frequency() - 220.0).abs() < 1e-3);
}

#[test]
fn rendering_full_pool_stays_bounded() {
    let mut synth = synth_with(4);
    synth.set_oscillator_settings(&OscillatorPatch {
        waveform1: Some(Waveform::Square),
        waveform2: Some(Waveform::Sawtooth),
        vol1: Some(1.0),
        vol2: Some(1.0),
        ..Default::default()
    });
    for note in [40, 47, 52, 59] {
        synth.note_on_midi(note);
    }

    let mut buffer = vec![0.0; 4800];
    for _ in 0..5 {
        synth.update();
        synth.context_mut().process(&mut buffer, 48_000.0);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.5));
    }
    assert!((synth.context().now() - 0.5).abs() < 1e-6);
}
