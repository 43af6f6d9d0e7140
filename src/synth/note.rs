use super::error::SynthError;

/// MIDI note number identifying a pitch.
pub type NoteId = u8;

pub const MAX_NOTE: NoteId = 127;

/// Converts a MIDI note number to its equal-tempered frequency (A4 = 440 Hz).
pub fn midi_to_frequency(note: NoteId) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Where a note event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSource {
    Keyboard,
    Midi,
    Host,
}

/// A validated note-on or note-off request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub note: NoteId,
    pub frequency: f32,
    pub is_on: bool,
    pub source: NoteSource,
}

impl NoteEvent {
    pub fn new(note: NoteId, is_on: bool, source: NoteSource) -> Result<Self, SynthError> {
        if note > MAX_NOTE {
            return Err(SynthError::InvalidNote(note));
        }
        Ok(Self {
            note,
            frequency: midi_to_frequency(note),
            is_on,
            source,
        })
    }

    pub fn on(note: NoteId, source: NoteSource) -> Result<Self, SynthError> {
        Self::new(note, true, source)
    }

    pub fn off(note: NoteId, source: NoteSource) -> Result<Self, SynthError> {
        Self::new(note, false, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((midi_to_frequency(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_frequency(81) - 880.0).abs() < 1e-2);
        assert!((midi_to_frequency(60) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn rejects_out_of_range_notes() {
        assert!(matches!(
            NoteEvent::on(128, NoteSource::Midi),
            Err(SynthError::InvalidNote(128))
        ));
        let event = NoteEvent::off(64, NoteSource::Keyboard).unwrap();
        assert!(!event.is_on);
        assert_eq!(event.note, 64);
    }
}
