use eframe::{App, CreationContext};
use egui::{
    CentralPanel, Color32, Context, Event, Key, Painter, Pos2, Rect, Response, Rounding, Sense,
    Stroke, Ui, Vec2,
};
use tracing::{error, info};

use crate::interaction::{KeyCode, KeyEvent};
use crate::keyboard::{KeyView, Piano};
use crate::layout::{KeyColor, BLACK_KEY_HEIGHT, BLACK_KEY_WIDTH, WHITE_KEY_HEIGHT, WHITE_KEY_WIDTH};
use crate::state::AppState;

/// Distance from the top of the frame to the top of the keys.
const KEY_TOP: f32 = 25.0;

const FRAME_COLOR: Color32 = Color32::from_rgb(38, 35, 46);
const STRIPE_COLOR: Color32 = Color32::from_rgb(170, 116, 241);
const INDICATOR_COLORS: [Color32; 3] = [
    Color32::from_rgb(255, 254, 166),
    Color32::from_rgb(251, 218, 255),
    Color32::from_rgb(218, 255, 250),
];
const WHITE_KEY_COLOR: Color32 = Color32::from_rgb(235, 235, 235);
const WHITE_KEY_PRESSED: Color32 = Color32::from_rgb(201, 179, 245);
const BLACK_KEY_COLOR: Color32 = Color32::from_rgb(28, 28, 28);
const BLACK_KEY_PRESSED: Color32 = Color32::from_rgb(138, 99, 210);
const FOCUS_COLOR: Color32 = Color32::from_rgb(100, 180, 255);

/// Interactive host for the piano. Owns the caller state and turns egui
/// input into key events.
pub struct PianoApp {
    state: AppState,
    /// Key under the pointer on the previous frame.
    hovered_key: Option<u8>,
    /// Screen area covered by the keyboard on the last frame.
    keyboard_rect: Rect,
}

impl PianoApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            hovered_key: None,
            keyboard_rect: Rect::NOTHING,
        }
    }

    fn keyboard(&mut self, ui: &mut Ui) {
        let mut events = Vec::new();
        let mut hovered = None;

        {
            let piano = match Piano::new(self.state.props()) {
                Ok(piano) => piano,
                Err(e) => {
                    error!("Cannot lay out piano: {}", e);
                    ui.colored_label(Color32::RED, e.to_string());
                    return;
                }
            };

            let (rect, _) =
                ui.allocate_exact_size(Vec2::new(piano.width(), piano.height()), Sense::hover());
            self.keyboard_rect = rect;
            let painter = ui.painter_at(rect);
            paint_frame(&painter, rect);

            // Black keys come last so they win hits where they overlap white keys
            for key in piano.keys() {
                let key_rect = key_rect(rect.min, &key);
                let response = ui.interact(key_rect, ui.id().with(("piano_key", key.id())), Sense::click());
                if response.clicked() {
                    response.request_focus();
                }
                paint_key(&painter, key_rect, &key, response.has_focus());

                if response.hovered() {
                    hovered = Some(key.id());
                }
                collect_events(ui, &response, key.id(), &mut events);
            }
        }

        if let Some(previous) = self.hovered_key {
            if hovered != Some(previous) {
                events.push((previous, KeyEvent::PointerLeave));
            }
        }
        self.hovered_key = hovered;

        // Each event sees the state left behind by the previous one
        let mut prevent_default = false;
        for (id, event) in events {
            match self.state.dispatch(id, event) {
                Ok(outcome) => prevent_default |= outcome.prevent_default,
                Err(e) => error!("Dropped {:?} on key {}: {}", event, id, e),
            }
        }

        // Keep Space away from other widgets once a key has handled it
        if prevent_default {
            ui.input_mut(|i| {
                i.events
                    .retain(|event| !matches!(event, Event::Key { key: Key::Space, .. }))
            });
        }
    }
}

fn key_rect(origin: Pos2, key: &KeyView) -> Rect {
    let size = match key.color() {
        KeyColor::White => Vec2::new(WHITE_KEY_WIDTH, WHITE_KEY_HEIGHT),
        KeyColor::Black => Vec2::new(BLACK_KEY_WIDTH, BLACK_KEY_HEIGHT),
    };
    Rect::from_min_size(origin + Vec2::new(key.x(), KEY_TOP), size)
}

fn paint_frame(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 8.0, FRAME_COLOR);

    let stripe = Rect::from_min_size(
        rect.min + Vec2::new(60.0, 10.0),
        Vec2::new(rect.width() * 0.85, 3.0),
    );
    painter.rect_filled(stripe, 5.0, STRIPE_COLOR);

    for (i, color) in INDICATOR_COLORS.iter().enumerate() {
        let center = rect.min + Vec2::new(15.0 * (i + 1) as f32, 12.5);
        painter.circle_filled(center, 5.0, *color);
    }
}

fn paint_key(painter: &Painter, rect: Rect, key: &KeyView, focused: bool) {
    let (fill, corner) = match (key.color(), key.pressed()) {
        (KeyColor::White, false) => (WHITE_KEY_COLOR, 3.5),
        (KeyColor::White, true) => (WHITE_KEY_PRESSED, 3.5),
        (KeyColor::Black, false) => (BLACK_KEY_COLOR, 2.4),
        (KeyColor::Black, true) => (BLACK_KEY_PRESSED, 2.4),
    };
    let rounding = Rounding {
        nw: 0.0,
        ne: 0.0,
        sw: corner,
        se: corner,
    };

    painter.rect_filled(rect, rounding, fill);
    if key.color().is_white() {
        painter.rect_stroke(rect.shrink(0.5), rounding, Stroke::new(1.0, Color32::from_gray(180)));
    }
    if focused {
        painter.rect_stroke(rect.shrink(1.5), rounding, Stroke::new(1.5, FOCUS_COLOR));
    }
}

/// Translate this frame's input on one key into widget events, in the
/// order a browser would deliver them.
fn collect_events(ui: &Ui, response: &Response, id: u8, events: &mut Vec<(u8, KeyEvent)>) {
    let (pressed, released) = ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_released()));

    if response.hovered() && pressed {
        events.push((id, KeyEvent::PointerDown));
    }
    if response.hovered() && released {
        events.push((id, KeyEvent::PointerUp));
    }
    // egui also reports Space on a focused widget as a click; only count real pointer clicks
    if response.clicked() && released {
        events.push((id, KeyEvent::Click));
    }

    if !response.has_focus() {
        return;
    }
    ui.input(|i| {
        for event in &i.events {
            if let Event::Key {
                key, pressed, repeat, ..
            } = event
            {
                let code = if *key == Key::Space {
                    KeyCode::Space
                } else {
                    KeyCode::Other
                };
                if *pressed {
                    events.push((id, KeyEvent::KeyDown(code)));
                    if !repeat {
                        events.push((id, KeyEvent::KeyPress(code)));
                    }
                } else {
                    events.push((id, KeyEvent::KeyUp(code)));
                }
            }
        }
    });
}

impl App for PianoApp {
    fn update(&mut self, ctx: &Context, _: &mut eframe::Frame) {
        CentralPanel::default().show(ctx, |ui| {
            ui.heading("Piano");

            ui.horizontal(|ui| {
                let mut sustain = self.state.sustain_pedal_engaged;
                if ui.checkbox(&mut sustain, "Sustain pedal").changed() {
                    self.state.set_sustain(sustain);
                }
                if ui.button("Release all").clicked() {
                    self.state.release_all();
                }
            });
            ui.add_space(8.0);

            self.keyboard(ui);

            ui.add_space(8.0);
            ui.label(format!("Sounding: {:?}", self.state.active_notes));
        });
    }
}

/// Initializes and runs the eframe application.
pub fn run_ui(state: AppState) -> Result<(), eframe::Error> {
    let width = Piano::new(state.props()).map_or(800.0, |piano| piano.width());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width + 40.0, 280.0])
            .with_title("Piano"),
        ..Default::default()
    };

    info!("Starting piano window with {} octaves", state.octave_count);
    eframe::run_native(
        "Piano",
        options,
        Box::new(move |_cc: &CreationContext| Ok(Box::new(PianoApp::new(state)))),
    )
}
