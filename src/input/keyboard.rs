use crate::synth::note::{NoteEvent, NoteId, NoteSource};
use crate::synth::oscillator::ControlEvent;
use crate::synth::waveform::CycleDirection;
use device_query::{DeviceQuery, DeviceState, Keycode};
use std::collections::HashMap;
use std::sync::mpsc::Sender;

const CONTROL_KEYS: [Keycode; 5] = [
    Keycode::Comma,
    Keycode::Dot,
    Keycode::Y,
    Keycode::Z,
    Keycode::X,
];

pub struct KeyboardHandler {
    device_state: DeviceState,
    key_states: HashMap<Keycode, bool>,
    key_to_note: HashMap<Keycode, NoteId>,
    control_keys: HashMap<Keycode, bool>,
    note_sender: Sender<NoteEvent>,
    control_sender: Sender<ControlEvent>,
}

impl KeyboardHandler {
    pub fn new(note_sender: Sender<NoteEvent>, control_sender: Sender<ControlEvent>) -> Self {
        // Two rows laid out like a piano, A3 to C#5
        let key_to_note: HashMap<Keycode, NoteId> = [
            (Keycode::A, 57),
            (Keycode::W, 58),
            (Keycode::S, 59),
            (Keycode::D, 60),
            (Keycode::R, 61),
            (Keycode::F, 62),
            (Keycode::T, 63),
            (Keycode::G, 64),
            (Keycode::H, 65),
            (Keycode::U, 66),
            (Keycode::J, 67),
            (Keycode::I, 68),
            (Keycode::K, 69),
            (Keycode::O, 70),
            (Keycode::L, 71),
            (Keycode::Semicolon, 72),
            (Keycode::LeftBracket, 73),
        ]
        .into_iter()
        .collect();

        let key_states = key_to_note.keys().map(|key| (*key, false)).collect();
        let control_keys = CONTROL_KEYS.iter().map(|key| (*key, false)).collect();

        Self {
            device_state: DeviceState::new(),
            key_states,
            key_to_note,
            control_keys,
            note_sender,
            control_sender,
        }
    }

    pub fn update(&mut self) {
        let keys: Vec<Keycode> = self.device_state.get_keys();

        for (key, note) in &self.key_to_note {
            let is_pressed = keys.contains(key);
            let was_pressed = self.key_states.get(key).copied().unwrap_or(false);
            if is_pressed == was_pressed {
                continue;
            }

            log::debug!(
                "Key '{:?}' {} note {}",
                key,
                if is_pressed { "pressed" } else { "released" },
                note
            );
            if let Ok(event) = NoteEvent::new(*note, is_pressed, NoteSource::Keyboard) {
                if let Err(e) = self.note_sender.send(event) {
                    log::warn!("Error sending note event: {}", e);
                }
            }
            self.key_states.insert(*key, is_pressed);
        }

        for key in CONTROL_KEYS.iter() {
            let is_pressed = keys.contains(key);
            let was_pressed = self.control_keys.get(key).copied().unwrap_or(false);

            if is_pressed && !was_pressed {
                if let Some(event) = control_for_key(key) {
                    log::info!("Control: {:?}", event);
                    if let Err(e) = self.control_sender.send(event) {
                        log::warn!("Error sending control event: {}", e);
                    }
                }
            }

            self.control_keys.insert(*key, is_pressed);
        }
    }
}

fn control_for_key(key: &Keycode) -> Option<ControlEvent> {
    let event = match key {
        Keycode::Comma => ControlEvent::CycleWaveform {
            direction: CycleDirection::Backward,
        },
        Keycode::Dot => ControlEvent::CycleWaveform {
            direction: CycleDirection::Forward,
        },
        Keycode::Y => ControlEvent::ToggleSync,
        Keycode::Z => ControlEvent::ShiftOctave { delta: -1 },
        Keycode::X => ControlEvent::ShiftOctave { delta: 1 },
        _ => return None,
    };
    Some(event)
}
