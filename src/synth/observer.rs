use serde::Serialize;

use super::note::NoteId;

/// Snapshot of pool usage, as shown by the UI voice counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceStatus {
    pub active: usize,
    pub total: usize,
}

/// Something that happened to a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceEvent {
    Triggered { voice: usize, note: NoteId },
    Released { voice: usize, note: NoteId },
    Stolen { voice: usize, from: Option<NoteId>, to: NoteId },
    Freed { voice: usize, note: NoteId },
}

/// Optional hooks into the voice pool.
///
/// Every method has a no-op default, so an observer implements only the
/// capabilities it actually has (a scope monitor might only care about
/// `activity_changed`).
pub trait VoiceObserver: Send {
    fn voice_event(&mut self, _event: &VoiceEvent) {}

    /// Called whenever the number of sounding voices may have changed.
    fn activity_changed(&mut self, _status: VoiceStatus) {}
}

/// Observer that forwards every voice event to the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl VoiceObserver for LogObserver {
    fn voice_event(&mut self, event: &VoiceEvent) {
        match *event {
            VoiceEvent::Triggered { voice, note } => {
                log::debug!("voice {} triggered note {}", voice, note)
            }
            VoiceEvent::Released { voice, note } => {
                log::debug!("voice {} released note {}", voice, note)
            }
            VoiceEvent::Stolen { voice, from, to } => {
                log::debug!("voice {} stolen from {:?} for note {}", voice, from, to)
            }
            VoiceEvent::Freed { voice, note } => log::debug!("voice {} freed (note {})", voice, note),
        }
    }
}
