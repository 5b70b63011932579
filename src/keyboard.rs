//! Piano keyboard view.
//!
//! A [`Piano`] is built from caller-owned [`PianoProps`] on every render.
//! It lays out the visible keys, renders them as SVG and routes input
//! events for a key through the interaction handlers. Pressed state is
//! never stored: it is read from `active_notes` each time it is needed.

use thiserror::Error;
use tracing::{trace, warn};

use crate::interaction::{self, KeyContext, KeyEvent, NoteSink, Outcome};
use crate::layout::{
    self, KeyColor, KeyDescriptor, LayoutError, BLACK_KEY_WIDTH, NOTES_PER_OCTAVE, NUM_NOTES,
    WHITE_KEY_HEIGHT, WHITE_KEY_WIDTH,
};
use crate::svg::{fmt_num, SvgBuilder};

/// Highest octave count whose notes all fit in the note range.
pub const MAX_OCTAVES: u8 = NUM_NOTES / NOTES_PER_OCTAVE;
pub const DEFAULT_OCTAVES: u8 = 2;

/// Left margin between the frame and the first key.
pub const KEY_MARGIN: f32 = 10.0;
/// Horizontal space the frame adds around the keys.
pub const FRAME_PADDING: f32 = 20.0;
pub const FRAME_HEIGHT: f32 = WHITE_KEY_HEIGHT + 30.0;

const STRIPE_FILL: &str = "hsl(266, 82%, 70%)";
const INDICATOR_FILLS: [&str; 3] = ["#fffea6", "#fbdaff", "#dafffa"];
const WHITE_KEY_FILL: &str = "#ebebeb";

const DEFAULT_STYLE: &str = "\
.piano .frame { fill: #26232e; }\
.piano .key { cursor: pointer; outline: none; }\
.piano .outline { fill: #b4b4b4; }\
.piano .white .pressed path:first-child { fill: #c9b3f5; }\
.piano .black .key path { fill: #1c1c1c; }\
.piano .black .pressed path { fill: #8a63d2; }";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PianoError {
    #[error("Octave count must be between 1 and {max}, got {0}", max = MAX_OCTAVES)]
    InvalidOctaveCount(u8),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Caller-owned inputs for one render.
#[derive(Debug, Clone, Copy)]
pub struct PianoProps<'a> {
    /// Number of octaves shown, starting at note 0.
    pub octave_count: u8,
    /// Notes currently sounding.
    pub active_notes: &'a [u8],
    pub sustain_pedal_engaged: bool,
}

impl Default for PianoProps<'_> {
    fn default() -> Self {
        Self {
            octave_count: DEFAULT_OCTAVES,
            active_notes: &[],
            sustain_pedal_engaged: false,
        }
    }
}

/// Options for [`Piano::render_svg_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgOptions {
    /// Embed a default stylesheet so the document renders on its own.
    pub embed_style: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self { embed_style: true }
    }
}

/// A visible key together with its derived pressed state. Only a
/// [`Piano`] creates these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyView {
    descriptor: KeyDescriptor,
    pressed: bool,
}

impl KeyView {
    pub fn id(&self) -> u8 {
        self.descriptor.id
    }

    pub fn color(&self) -> KeyColor {
        self.descriptor.color
    }

    pub fn descriptor(&self) -> &KeyDescriptor {
        &self.descriptor
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    /// Left edge of the key inside the frame.
    pub fn x(&self) -> f32 {
        self.descriptor.x + KEY_MARGIN
    }
}

#[derive(Debug, Clone)]
pub struct Piano<'a> {
    props: PianoProps<'a>,
    white_keys: Vec<KeyDescriptor>,
    black_keys: Vec<KeyDescriptor>,
}

impl<'a> Piano<'a> {
    pub fn new(props: PianoProps<'a>) -> Result<Self, PianoError> {
        if props.octave_count == 0 || props.octave_count > MAX_OCTAVES {
            return Err(PianoError::InvalidOctaveCount(props.octave_count));
        }

        let note_count = props.octave_count * NOTES_PER_OCTAVE;
        let mut white_keys = Vec::new();
        let mut black_keys = Vec::new();
        for id in 0..note_count {
            let key = layout::describe(id)?;
            match key.color {
                KeyColor::White => white_keys.push(key),
                KeyColor::Black => black_keys.push(key),
            }
        }

        Ok(Self {
            props,
            white_keys,
            black_keys,
        })
    }

    pub fn props(&self) -> &PianoProps<'a> {
        &self.props
    }

    pub fn note_count(&self) -> usize {
        self.white_keys.len() + self.black_keys.len()
    }

    pub fn contains(&self, id: u8) -> bool {
        usize::from(id) < self.note_count()
    }

    /// The visible key for `id`, if any.
    pub fn key(&self, id: u8) -> Option<KeyView> {
        self.keys().find(|key| key.id() == id)
    }

    pub fn is_pressed(&self, id: u8) -> bool {
        self.props.active_notes.contains(&id)
    }

    fn view(&self, descriptor: &KeyDescriptor) -> KeyView {
        KeyView {
            descriptor: *descriptor,
            pressed: self.is_pressed(descriptor.id),
        }
    }

    pub fn white_keys(&self) -> impl Iterator<Item = KeyView> + '_ {
        self.white_keys.iter().map(|key| self.view(key))
    }

    pub fn black_keys(&self) -> impl Iterator<Item = KeyView> + '_ {
        self.black_keys.iter().map(|key| self.view(key))
    }

    /// All visible keys in paint order: white keys, then black keys.
    pub fn keys(&self) -> impl Iterator<Item = KeyView> + '_ {
        self.white_keys().chain(self.black_keys())
    }

    pub fn width(&self) -> f32 {
        self.white_keys.len() as f32 * WHITE_KEY_WIDTH + FRAME_PADDING
    }

    pub fn height(&self) -> f32 {
        FRAME_HEIGHT
    }

    pub fn context(&self, id: u8) -> KeyContext {
        KeyContext {
            id,
            sounding: self.is_pressed(id),
            pedal: self.props.sustain_pedal_engaged,
        }
    }

    /// Route an input event on `key` to `sink`. Keys outside this piano's
    /// range are ignored.
    pub fn handle(&self, key: &KeyView, event: KeyEvent, sink: &mut impl NoteSink) -> Outcome {
        if !self.contains(key.id()) {
            warn!(?event, "Key {} is not on this piano", key.id());
            return Outcome::default();
        }
        interaction::dispatch(event, &self.context(key.id()), sink)
    }

    pub fn render_svg(&self) -> String {
        self.render_svg_with(&SvgOptions::default())
    }

    pub fn render_svg_with(&self, options: &SvgOptions) -> String {
        let width = self.width();
        let mut svg = SvgBuilder::new();
        svg.root_attr("class", "piano")
            .root_attr("width", fmt_num(width))
            .root_attr("height", fmt_num(FRAME_HEIGHT));

        if options.embed_style {
            svg.style(DEFAULT_STYLE);
        }

        svg.rect(&[
            ("class", "frame".to_string()),
            ("width", fmt_num(width)),
            ("height", fmt_num(FRAME_HEIGHT)),
            ("rx", "8".to_string()),
        ]);
        svg.rect(&[
            ("x", "60".to_string()),
            ("width", "85%".to_string()),
            ("y", "10".to_string()),
            ("rx", "5".to_string()),
            ("height", "3px".to_string()),
            ("fill", STRIPE_FILL.to_string()),
        ]);
        svg.open_group(&[("id", "buttons".to_string())]);
        for (i, fill) in INDICATOR_FILLS.iter().enumerate() {
            svg.circle(15.0 * (i + 1) as f32, 12.5, 5.0, fill);
        }
        svg.close_group();

        svg.open_group(&[("class", "white".to_string())]);
        for key in self.white_keys() {
            render_key(&mut svg, &key);
        }
        svg.close_group();

        svg.open_group(&[("class", "black".to_string())]);
        for key in self.black_keys() {
            render_key(&mut svg, &key);
        }
        svg.close_group();

        trace!(width, keys = self.note_count(), "Rendered piano");
        svg.build()
    }
}

fn render_key(svg: &mut SvgBuilder, key: &KeyView) {
    let x = key.x();
    let class = if key.pressed { "key pressed" } else { "key" };
    svg.open_group(&[
        ("class", class.to_string()),
        ("role", "button".to_string()),
        ("tabindex", ((x + 10.0) as i32).to_string()),
        ("data-keyid", key.id().to_string()),
    ]);

    match key.descriptor.color {
        KeyColor::White => {
            let right = x + WHITE_KEY_WIDTH;
            let body = format!(
                "M{},141.531l0,-116.531l-24,0l0,116.531c0,1.915,1.554,3.469,3.469,3.469l17.062,0c1.915,0,3.469,-1.554,3.469,-3.469z",
                fmt_num(right)
            );
            let outline = format!(
                "{}m-1,-113.062l0,113.062c0,1.363,-1.106,2.469,-2.469,2.469l-17.062,0c-1.363,0,-2.469,-1.106,-2.469,-2.469l0,-115.531l22,0c0,0,0,2.469,0,2.469z",
                body
            );
            svg.path(&body, &[("fill", WHITE_KEY_FILL.to_string())]);
            svg.path(&outline, &[("class", "outline".to_string())]);
        }
        KeyColor::Black => {
            let right = x + BLACK_KEY_WIDTH;
            let body = format!(
                "M{},94.919v-69.919h-16.8v69.919c0,1.149,1.088,2.081,2.428,2.081h11.944c1.34,0,2.428,-0.932,2.428,-2.081z",
                fmt_num(right)
            );
            svg.path(&body, &[]);
        }
    }

    svg.close_group();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Callbacks, KeyCode, NoteCommand};
    use rstest::rstest;

    fn piano(active_notes: &[u8], pedal: bool) -> Piano<'_> {
        Piano::new(PianoProps {
            octave_count: 2,
            active_notes,
            sustain_pedal_engaged: pedal,
        })
        .unwrap()
    }

    fn key(piano: &Piano, id: u8) -> KeyView {
        piano.key(id).unwrap()
    }

    #[test]
    fn test_default_props() {
        let props = PianoProps::default();
        assert_eq!(props.octave_count, 2);
        assert!(props.active_notes.is_empty());
        assert!(!props.sustain_pedal_engaged);
    }

    #[test]
    fn test_two_octaves_have_fourteen_white_and_ten_black_keys() {
        let piano = piano(&[], false);
        assert_eq!(piano.note_count(), 24);
        assert_eq!(piano.white_keys().count(), 14);
        assert_eq!(piano.black_keys().count(), 10);
        let mut ids: Vec<u8> = piano.keys().map(|k| k.id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..24).collect::<Vec<u8>>());
    }

    #[test]
    fn test_keys_are_painted_white_first() {
        let piano = piano(&[], false);
        let colors: Vec<KeyColor> = piano.keys().map(|k| k.color()).collect();
        let first_black = colors.iter().position(|c| c.is_black()).unwrap();
        assert_eq!(first_black, 14);
        assert!(colors[first_black..].iter().all(|c| c.is_black()));
    }

    #[rstest]
    #[case(1, 188.0)]
    #[case(2, 356.0)]
    #[case(10, 70.0 * 24.0 + 20.0)]
    fn test_width(#[case] octave_count: u8, #[case] expected: f32) {
        let piano = Piano::new(PianoProps {
            octave_count,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(piano.width(), expected);
        assert_eq!(piano.height(), 150.0);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    #[case(u8::MAX)]
    fn test_rejects_octave_counts_outside_note_range(#[case] octave_count: u8) {
        let err = Piano::new(PianoProps {
            octave_count,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, PianoError::InvalidOctaveCount(octave_count));
    }

    #[test]
    fn test_pressed_state_follows_active_notes() {
        let piano = piano(&[0, 3], false);
        let pressed: Vec<u8> = piano.keys().filter(|k| k.pressed()).map(|k| k.id()).collect();
        assert_eq!(pressed, vec![0, 3]);
    }

    #[test]
    fn test_key_x_includes_margin() {
        let piano = piano(&[], false);
        assert_eq!(key(&piano, 0).x(), 10.0);
        assert_eq!(key(&piano, 2).x(), 34.0);
        assert!((key(&piano, 1).x() - 25.6).abs() < 1e-4);
    }

    #[test]
    fn test_handle_reads_active_notes() {
        let mut commands = Vec::new();
        let piano = piano(&[4], false);
        let mut sink = Callbacks::new(
            |id| commands.push(NoteCommand::Play(id)),
            |_| {},
        );
        piano.handle(&key(&piano, 4), KeyEvent::PointerDown, &mut sink);
        piano.handle(&key(&piano, 5), KeyEvent::KeyDown(KeyCode::Space), &mut sink);
        drop(sink);
        assert_eq!(commands, vec![NoteCommand::Play(5)]);
    }

    #[test]
    fn test_svg_structure() {
        let svg = piano(&[3], false).render_svg_with(&SvgOptions { embed_style: false });

        assert!(svg.contains(r#"class="piano" width="356" height="150""#));
        assert!(svg.contains(r#"<rect class="frame" width="356" height="150" rx="8"/>"#));
        assert!(!svg.contains("<style>"));
        assert_eq!(svg.matches("data-keyid=").count(), 24);
        assert_eq!(svg.matches(r#"class="key pressed""#).count(), 1);
        assert!(svg.contains(r#"<g class="key pressed" role="button" tabindex="59" data-keyid="3">"#));
        assert_eq!(svg.matches(r#"class="outline""#).count(), 14);

        let white = svg.find(r#"<g class="white">"#).unwrap();
        let black = svg.find(r#"<g class="black">"#).unwrap();
        assert!(white < black);
        // First white key starts after the margin
        assert!(svg.contains(r#"d="M34,141.531"#));
    }

    #[test]
    fn test_handle_ignores_keys_outside_the_piano() {
        let mut played = Vec::new();
        let piano = piano(&[], false);
        let outside = KeyView {
            descriptor: KeyDescriptor {
                id: 200,
                color: KeyColor::White,
                x: 0.0,
            },
            pressed: false,
        };
        let beyond_range = KeyView {
            descriptor: layout::describe(24).unwrap(),
            pressed: false,
        };

        let mut sink = Callbacks::new(|id| played.push(id), |_| {});
        let outcome = piano.handle(&outside, KeyEvent::PointerDown, &mut sink);
        assert_eq!(outcome, Outcome::default());
        piano.handle(&beyond_range, KeyEvent::PointerDown, &mut sink);
        piano.handle(&key(&piano, 23), KeyEvent::PointerDown, &mut sink);
        drop(sink);

        assert_eq!(played, vec![23]);
        assert!(piano.key(24).is_none());
    }

    #[test]
    fn test_svg_coordinates_have_no_float_noise() {
        let piano = Piano::new(PianoProps {
            octave_count: MAX_OCTAVES,
            ..Default::default()
        })
        .unwrap();
        let svg = piano.render_svg();

        // D# of the first octave: 49.6 + 16.8
        assert!(svg.contains(r#"d="M66.4,94.919"#));
        assert!(!svg.contains("9999"));
        assert!(!svg.contains("0001"));
    }

    #[test]
    fn test_svg_embeds_style_by_default() {
        let svg = piano(&[], false).render_svg();
        assert!(svg.contains("<style>"));
        assert!(svg.contains(".piano .frame"));
    }
}
