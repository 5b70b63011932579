//! Key layout calculator.
//!
//! Pure functions mapping a note index (0-127) to its key colour and
//! horizontal offset. Offsets are relative to the first key and exclude
//! any frame margin added by the view.

use thiserror::Error;

/// Number of addressable notes.
pub const NUM_NOTES: u8 = 128;
/// Notes per octave.
pub const NOTES_PER_OCTAVE: u8 = 12;

pub const WHITE_KEY_WIDTH: f32 = 24.0;
pub const BLACK_KEY_WIDTH: f32 = WHITE_KEY_WIDTH * 0.7;
pub const WHITE_KEY_HEIGHT: f32 = 120.0;
pub const BLACK_KEY_HEIGHT: f32 = WHITE_KEY_HEIGHT * 0.6;

use KeyColor::{Black, White};

/// Colour pattern of one octave, starting on C.
const NOTE_COLORS: [KeyColor; 12] = [
    White, Black, White, Black, White, White, Black, White, Black, White, Black, White,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyColor {
    White,
    Black,
}

impl KeyColor {
    pub fn is_white(self) -> bool {
        self == White
    }

    pub fn is_black(self) -> bool {
        self == Black
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Invalid note index {0}: expected a value below 128")]
    InvalidNoteIndex(u8),
}

/// Render-time description of a single key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyDescriptor {
    pub id: u8,
    pub color: KeyColor,
    /// Horizontal offset of the key's left edge.
    pub x: f32,
}

fn check(id: u8) -> Result<u8, LayoutError> {
    if id < NUM_NOTES {
        Ok(id)
    } else {
        Err(LayoutError::InvalidNoteIndex(id))
    }
}

/// Colour of the key for `id`.
pub fn color_of(id: u8) -> Result<KeyColor, LayoutError> {
    let id = check(id)?;
    Ok(NOTE_COLORS[(id % NOTES_PER_OCTAVE) as usize])
}

/// Count white keys with an index strictly below `id`.
pub fn white_key_count(id: u8) -> Result<u32, LayoutError> {
    let id = check(id)?;
    let full_octaves = u32::from(id / NOTES_PER_OCTAVE);
    let partial = NOTE_COLORS[..(id % NOTES_PER_OCTAVE) as usize]
        .iter()
        .filter(|color| color.is_white())
        .count() as u32;
    Ok(full_octaves * 7 + partial)
}

/// Left edge of the key for `id`.
///
/// Black keys straddle the boundary between the white key slot they
/// overlap and the one before it.
pub fn x_offset(id: u8) -> Result<f32, LayoutError> {
    let slot = white_key_count(id)? as f32 * WHITE_KEY_WIDTH;
    Ok(match color_of(id)? {
        White => slot,
        Black => slot - BLACK_KEY_WIDTH / 2.0,
    })
}

pub fn describe(id: u8) -> Result<KeyDescriptor, LayoutError> {
    Ok(KeyDescriptor {
        id,
        color: color_of(id)?,
        x: x_offset(id)?,
    })
}
