use tracing::{debug, info};

use crate::interaction::{KeyEvent, NoteSink, Outcome};
use crate::keyboard::{Piano, PianoError, PianoProps, DEFAULT_OCTAVES};

/// Caller-side state driving the piano: the notes currently sounding and
/// the sustain pedal. The piano only ever reads it and reports commands
/// back through [`NoteSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Notes currently sounding, in the order they started.
    pub active_notes: Vec<u8>,
    pub sustain_pedal_engaged: bool,
    pub octave_count: u8,
}

impl AppState {
    /// Create a new `AppState` with default values.
    pub fn new() -> Self {
        Self {
            active_notes: Vec::new(),
            sustain_pedal_engaged: false,
            octave_count: DEFAULT_OCTAVES,
        }
    }

    pub fn props(&self) -> PianoProps<'_> {
        PianoProps {
            octave_count: self.octave_count,
            active_notes: &self.active_notes,
            sustain_pedal_engaged: self.sustain_pedal_engaged,
        }
    }

    /// Deliver one input event for key `id`, rendering the piano from a
    /// snapshot of the current notes so the command can update them.
    pub fn dispatch(&mut self, id: u8, event: KeyEvent) -> Result<Outcome, PianoError> {
        let notes = self.active_notes.clone();
        let piano = Piano::new(PianoProps {
            active_notes: &notes,
            octave_count: self.octave_count,
            sustain_pedal_engaged: self.sustain_pedal_engaged,
        })?;
        Ok(match piano.key(id) {
            Some(key) => piano.handle(&key, event, self),
            None => Outcome::default(),
        })
    }

    pub fn set_sustain(&mut self, engaged: bool) {
        if self.sustain_pedal_engaged != engaged {
            info!("Sustain pedal {}", if engaged { "engaged" } else { "released" });
            self.sustain_pedal_engaged = engaged;
        }
    }

    /// Stop every sounding note.
    pub fn release_all(&mut self) {
        for id in std::mem::take(&mut self.active_notes) {
            info!("Note Off: note={}", id);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteSink for AppState {
    fn play(&mut self, id: u8) {
        if self.active_notes.contains(&id) {
            debug!("Note {} already sounding", id);
            return;
        }
        self.active_notes.push(id);
        info!("Note On: note={}", id);
    }

    fn stop(&mut self, id: u8) {
        let before = self.active_notes.len();
        self.active_notes.retain(|&n| n != id);
        if self.active_notes.len() != before {
            info!("Note Off: note={}", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_and_stop_update_active_notes() {
        let mut state = AppState::new();
        state.play(60);
        state.play(64);
        state.play(60);
        assert_eq!(state.active_notes, vec![60, 64]);

        state.stop(60);
        state.stop(61);
        assert_eq!(state.active_notes, vec![64]);
    }

    #[test]
    fn test_dispatch_reads_current_state() {
        let mut state = AppState::new();
        state.dispatch(5, KeyEvent::PointerDown).unwrap();
        state.dispatch(5, KeyEvent::PointerDown).unwrap();
        assert_eq!(state.active_notes, vec![5]);

        state.set_sustain(true);
        state.dispatch(5, KeyEvent::PointerUp).unwrap();
        assert_eq!(state.active_notes, vec![5]);
        state.dispatch(5, KeyEvent::Click).unwrap();
        assert!(state.active_notes.is_empty());
    }

    #[test]
    fn test_dispatch_ignores_hidden_keys() {
        let mut state = AppState::new();
        let outcome = state.dispatch(30, KeyEvent::PointerDown).unwrap();
        assert_eq!(outcome, Outcome::default());
        assert!(state.active_notes.is_empty());

        state.octave_count = 0;
        assert!(state.dispatch(0, KeyEvent::PointerDown).is_err());
    }

    #[test]
    fn test_release_all() {
        let mut state = AppState::new();
        state.play(1);
        state.play(2);
        state.release_all();
        assert!(state.active_notes.is_empty());
    }

    #[test]
    fn test_props_borrow_state() {
        let mut state = AppState::new();
        state.octave_count = 3;
        state.play(7);
        let props = state.props();
        assert_eq!(props.octave_count, 3);
        assert_eq!(props.active_notes, &[7]);
        assert!(!props.sustain_pedal_engaged);
    }
}
