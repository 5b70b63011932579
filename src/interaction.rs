//! Per-key interaction state machine.
//!
//! Host input events are classified into a small set of categories, and
//! each category maps to a pure handler deciding whether a note should
//! start or stop. The handlers never mutate note state themselves: they
//! return a [`NoteCommand`] that is forwarded to the caller's [`NoteSink`].

use tracing::{debug, trace};

/// Keys the widget distinguishes. Only Space activates a focused key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Space,
    Other,
}

/// Input events a host can deliver to a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    PointerDown,
    PointerUp,
    PointerLeave,
    Click,
    KeyDown(KeyCode),
    /// Keyboard "tap" of a focused key.
    KeyPress(KeyCode),
    KeyUp(KeyCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    PointerDown,
    /// Pointer released over the key, or left it.
    PointerRelease,
    /// Click or keyboard tap.
    Toggle,
    KeyDown,
    KeyUp,
}

impl KeyEvent {
    /// The handler category for this event, `None` if the widget ignores it.
    pub fn category(self) -> Option<EventCategory> {
        match self {
            KeyEvent::PointerDown => Some(EventCategory::PointerDown),
            KeyEvent::PointerUp | KeyEvent::PointerLeave => Some(EventCategory::PointerRelease),
            KeyEvent::Click | KeyEvent::KeyPress(KeyCode::Space) => Some(EventCategory::Toggle),
            KeyEvent::KeyDown(KeyCode::Space) => Some(EventCategory::KeyDown),
            KeyEvent::KeyUp(KeyCode::Space) => Some(EventCategory::KeyUp),
            KeyEvent::KeyDown(KeyCode::Other)
            | KeyEvent::KeyPress(KeyCode::Other)
            | KeyEvent::KeyUp(KeyCode::Other) => None,
        }
    }

    fn is_space(self) -> bool {
        matches!(
            self,
            KeyEvent::KeyDown(KeyCode::Space)
                | KeyEvent::KeyPress(KeyCode::Space)
                | KeyEvent::KeyUp(KeyCode::Space)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteCommand {
    Play(u8),
    Stop(u8),
}

impl NoteCommand {
    pub fn id(self) -> u8 {
        match self {
            NoteCommand::Play(id) | NoteCommand::Stop(id) => id,
        }
    }

    /// Forward the command to a sink.
    pub fn send(self, sink: &mut impl NoteSink) {
        match self {
            NoteCommand::Play(id) => sink.play(id),
            NoteCommand::Stop(id) => sink.stop(id),
        }
    }
}

/// Receiver of note commands, typically the caller's sound engine.
pub trait NoteSink {
    fn play(&mut self, id: u8);
    fn stop(&mut self, id: u8);
}

/// Adapts a pair of closures into a [`NoteSink`].
pub struct Callbacks<P, S> {
    pub on_play: P,
    pub on_stop: S,
}

impl<P, S> Callbacks<P, S>
where
    P: FnMut(u8),
    S: FnMut(u8),
{
    pub fn new(on_play: P, on_stop: S) -> Self {
        Self { on_play, on_stop }
    }
}

impl<P, S> NoteSink for Callbacks<P, S>
where
    P: FnMut(u8),
    S: FnMut(u8),
{
    fn play(&mut self, id: u8) {
        (self.on_play)(id)
    }

    fn stop(&mut self, id: u8) {
        (self.on_stop)(id)
    }
}

/// Snapshot of one key's state when an event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub id: u8,
    /// Whether the caller currently reports this note as sounding.
    pub sounding: bool,
    /// Whether the sustain pedal is engaged.
    pub pedal: bool,
}

type Handler = fn(&KeyContext) -> Option<NoteCommand>;

fn play_note(ctx: &KeyContext) -> Option<NoteCommand> {
    if ctx.pedal || ctx.sounding {
        None
    } else {
        Some(NoteCommand::Play(ctx.id))
    }
}

fn stop_note(ctx: &KeyContext) -> Option<NoteCommand> {
    if ctx.pedal {
        None
    } else {
        Some(NoteCommand::Stop(ctx.id))
    }
}

fn toggle_note(ctx: &KeyContext) -> Option<NoteCommand> {
    match (ctx.pedal, ctx.sounding) {
        (false, _) => None,
        (true, false) => Some(NoteCommand::Play(ctx.id)),
        (true, true) => Some(NoteCommand::Stop(ctx.id)),
    }
}

const HANDLERS: [(EventCategory, Handler); 5] = [
    (EventCategory::PointerDown, play_note),
    (EventCategory::PointerRelease, stop_note),
    (EventCategory::Toggle, toggle_note),
    (EventCategory::KeyDown, play_note),
    (EventCategory::KeyUp, stop_note),
];

fn handler_for(category: EventCategory) -> Option<Handler> {
    HANDLERS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|&(_, handler)| handler)
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub command: Option<NoteCommand>,
    /// The host should suppress its default handling of the event.
    pub prevent_default: bool,
}

/// Decide what an event on a key should do, without side effects.
pub fn resolve(event: KeyEvent, ctx: &KeyContext) -> Outcome {
    let command = event
        .category()
        .and_then(handler_for)
        .and_then(|handler| handler(ctx));
    Outcome {
        command,
        prevent_default: event.is_space(),
    }
}

/// Resolve an event and forward any resulting command to `sink`.
pub fn dispatch(event: KeyEvent, ctx: &KeyContext, sink: &mut impl NoteSink) -> Outcome {
    let outcome = resolve(event, ctx);
    match outcome.command {
        Some(command) => {
            debug!(?event, ?command, pedal = ctx.pedal, "Key {} dispatched", ctx.id);
            command.send(sink);
        }
        None => trace!(?event, sounding = ctx.sounding, pedal = ctx.pedal, "Key {} ignored event", ctx.id),
    }
    outcome
}
