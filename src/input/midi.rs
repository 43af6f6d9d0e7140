use crate::synth::note::{NoteEvent, NoteSource};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use std::error::Error;
use std::io::{stdin, stdout, Write};
use std::sync::mpsc::Sender;
use std::sync::mpsc::{self, Receiver};

pub struct MidiHandler {
    /// Holds the connection to keep it alive
    #[allow(dead_code)]
    connection: Option<MidiInputConnection<()>>,
    receiver: Option<Receiver<(u8, u8, u8)>>, // (status, data1, data2)
    note_sender: Sender<NoteEvent>,
}

impl MidiHandler {
    pub fn new(note_sender: Sender<NoteEvent>) -> Self {
        match Self::try_new(note_sender.clone()) {
            Ok(handler) => handler,
            Err(e) => {
                log::warn!(
                    "Failed to initialize MIDI: {}. MIDI functionality will be disabled.",
                    e
                );
                Self {
                    connection: None,
                    receiver: None,
                    note_sender,
                }
            }
        }
    }

    fn try_new(note_sender: Sender<NoteEvent>) -> Result<Self, Box<dyn Error>> {
        let midi_in = MidiInput::new("Sonora Input")?;
        let port = Self::select_input_port(&midi_in)?;
        let port_name = midi_in.port_name(&port)?;

        let (sender, receiver) = mpsc::channel();

        let connection = midi_in.connect(
            &port,
            "sonora-read-input",
            move |_, message, _| {
                if message.len() >= 3 {
                    let _ = sender.send((message[0], message[1], message[2]));
                }
            },
            (),
        )?;

        log::info!("Opened MIDI port: {}", port_name);

        Ok(Self {
            connection: Some(connection),
            receiver: Some(receiver),
            note_sender,
        })
    }

    fn select_input_port(midi_in: &MidiInput) -> Result<MidiInputPort, Box<dyn Error>> {
        let in_ports = midi_in.ports();
        if in_ports.is_empty() {
            return Err("No MIDI input ports found".into());
        }

        println!("Available MIDI input ports:");
        for (i, port) in in_ports.iter().enumerate() {
            println!("{}: {}", i, midi_in.port_name(port)?);
        }

        print!("Select MIDI input port: ");
        stdout().flush()?;
        let mut input = String::new();
        stdin().read_line(&mut input)?;
        let selection = input.trim().parse::<usize>().unwrap_or(0);

        let port = in_ports
            .get(selection)
            .ok_or("Invalid MIDI port selection")?
            .clone();

        Ok(port)
    }

    pub fn update(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        while let Ok((status, data1, data2)) = receiver.try_recv() {
            let Some(result) = decode_note(status, data1, data2) else {
                continue;
            };
            match result {
                Ok(event) => {
                    if let Err(e) = self.note_sender.send(event) {
                        log::warn!("Failed to send MIDI note event: {}", e);
                    }
                }
                Err(e) => log::warn!("Ignoring MIDI message: {}", e),
            }
        }
    }
}

/// Note-on with velocity 0 counts as note-off. Other messages yield `None`.
fn decode_note(
    status: u8,
    note: u8,
    velocity: u8,
) -> Option<Result<NoteEvent, crate::synth::SynthError>> {
    match status & 0xF0 {
        0x90 if velocity > 0 => Some(NoteEvent::on(note, NoteSource::Midi)),
        0x90 | 0x80 => Some(NoteEvent::off(note, NoteSource::Midi)),
        _ => None,
    }
}
