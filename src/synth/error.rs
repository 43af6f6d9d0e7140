use super::prelude::fmt;

/// Errors raised while building a synth or parsing settings.
///
/// Nothing on the note path returns an error: out-of-range parameters are
/// clamped and unknown notes are ignored.
#[derive(Debug)]
pub enum SynthError {
    /// MIDI note numbers stop at 127.
    InvalidNote(u8),
    /// A voice pool needs at least one voice.
    EmptyVoicePool,
    /// Malformed preset or config JSON.
    Json(serde_json::Error),
    /// Config file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::InvalidNote(note) => {
                write!(f, "invalid MIDI note number {} (expected 0-127)", note)
            }
            SynthError::EmptyVoicePool => write!(f, "polyphony must be at least one voice"),
            SynthError::Json(e) => write!(f, "invalid JSON: {}", e),
            SynthError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthError::Json(e) => Some(e),
            SynthError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SynthError {
    fn from(e: serde_json::Error) -> Self {
        SynthError::Json(e)
    }
}

impl From<std::io::Error> for SynthError {
    fn from(e: std::io::Error) -> Self {
        SynthError::Io(e)
    }
}
