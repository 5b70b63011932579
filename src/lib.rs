//! Interactive piano keyboard rendered as SVG.
//!
//! [`layout`] maps note indices to key geometry, [`keyboard`] builds and
//! renders the visible keys, and [`interaction`] turns pointer and keyboard
//! input into note commands for a caller-supplied [`NoteSink`]. All note
//! state lives with the caller; [`state::AppState`] is the one used by the
//! bundled egui host in [`ui`].

pub mod interaction;
pub mod keyboard;
pub mod layout;
pub mod state;
pub mod svg;
pub mod ui;

pub use interaction::{Callbacks, KeyCode, KeyEvent, NoteCommand, NoteSink, Outcome};
pub use keyboard::{KeyView, Piano, PianoError, PianoProps, SvgOptions};
pub use layout::{color_of, white_key_count, x_offset, KeyColor, KeyDescriptor, LayoutError};
