//! Primitive actions the scheduler consumes.
//!
//! Builders translate caller intent into these; the scheduler drains one per
//! eligible tick. Actions are cloneable so the loop controller can archive
//! and re-queue them.

use std::fmt;
use std::rc::Rc;

use crate::config::Speed;
use crate::surface::Elements;

/// Flatten-time identity of a tag marker.
///
/// Characters produced by the flattener reference their enclosing tag by id,
/// not by surface handle: the executing `AddTagMarker` binds the id to a
/// freshly created container, so replaying an archived action sequence mints
/// new containers instead of reusing stale handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

/// Monotonic [`ContainerId`] allocator.
#[derive(Debug, Default)]
pub struct ContainerIdGen(u64);

impl ContainerIdGen {
    pub fn next_id(&mut self) -> ContainerId {
        let id = ContainerId(self.0);
        self.0 += 1;
        id
    }
}

/// Callback invoked by [`Action::CallFunction`] with the engine's root
/// element handles.
pub type CallbackFn = Rc<dyn Fn(Elements)>;

#[derive(Clone)]
pub enum Action {
    /// Render one character at the cursor, bound to `container` (root when
    /// `None`).
    TypeCharacter {
        character: String,
        container: Option<ContainerId>,
    },
    /// Flatten `markup` and insert every resulting node in a single tick.
    PasteString {
        markup: String,
        container: Option<ContainerId>,
    },
    /// Logical "delete one character"; synthesizes a [`Action::RemoveLastNode`].
    RemoveCharacter,
    /// Mechanical removal of the ledger entry before the cursor. Synthesized
    /// only, never archived for replay.
    RemoveLastNode,
    /// Suspend queue consumption for `ms` milliseconds.
    PauseFor { ms: u64 },
    /// Invoke a caller-supplied callback synchronously.
    CallFunction { callback: CallbackFn },
    /// Insert an empty tag container at the cursor and bind `id` to it.
    AddTagMarker {
        id: ContainerId,
        tag: String,
        parent: Option<ContainerId>,
    },
    /// Animated removal of everything before the cursor, optionally at a
    /// temporary speed.
    RemoveAll { speed: Speed },
    /// Immediate bulk removal of up to `amount` characters before the cursor
    /// (`0` removes all).
    Clear { amount: usize, call_on_remove: bool },
    /// Immediate bulk removal counted from the absolute end of content.
    ClearEnd { amount: usize, call_on_remove: bool },
    /// Relocate the cursor to the given logical text position.
    MoveCursor { position: usize },
    /// Mutate the live delete speed. `transient` marks the temporary
    /// overrides bracketing a `RemoveAll` burst; those never replay.
    SetDeleteSpeed { speed: Speed, transient: bool },
    /// Mutate the live typing delay.
    SetTypeDelay { delay: Speed },
    /// Mutate the cursor glyph, both in options and on the surface.
    SetCursorGlyph { glyph: String },
}

impl Action {
    /// Whether the loop controller archives this action for replay.
    pub fn replayable(&self) -> bool {
        !matches!(
            self,
            Action::RemoveLastNode
                | Action::SetDeleteSpeed {
                    transient: true,
                    ..
                }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Action::TypeCharacter { .. } => "type_character",
            Action::PasteString { .. } => "paste_string",
            Action::RemoveCharacter => "remove_character",
            Action::RemoveLastNode => "remove_last_node",
            Action::PauseFor { .. } => "pause_for",
            Action::CallFunction { .. } => "call_function",
            Action::AddTagMarker { .. } => "add_tag_marker",
            Action::RemoveAll { .. } => "remove_all",
            Action::Clear { .. } => "clear",
            Action::ClearEnd { .. } => "clear_end",
            Action::MoveCursor { .. } => "move_cursor",
            Action::SetDeleteSpeed { .. } => "set_delete_speed",
            Action::SetTypeDelay { .. } => "set_type_delay",
            Action::SetCursorGlyph { .. } => "set_cursor_glyph",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::TypeCharacter {
                character,
                container,
            } => f
                .debug_struct("TypeCharacter")
                .field("character", character)
                .field("container", container)
                .finish(),
            Action::PasteString { markup, container } => f
                .debug_struct("PasteString")
                .field("markup", markup)
                .field("container", container)
                .finish(),
            Action::RemoveCharacter => write!(f, "RemoveCharacter"),
            Action::RemoveLastNode => write!(f, "RemoveLastNode"),
            Action::PauseFor { ms } => f.debug_struct("PauseFor").field("ms", ms).finish(),
            Action::CallFunction { .. } => write!(f, "CallFunction {{ .. }}"),
            Action::AddTagMarker { id, tag, parent } => f
                .debug_struct("AddTagMarker")
                .field("id", id)
                .field("tag", tag)
                .field("parent", parent)
                .finish(),
            Action::RemoveAll { speed } => {
                f.debug_struct("RemoveAll").field("speed", speed).finish()
            }
            Action::Clear {
                amount,
                call_on_remove,
            } => f
                .debug_struct("Clear")
                .field("amount", amount)
                .field("call_on_remove", call_on_remove)
                .finish(),
            Action::ClearEnd {
                amount,
                call_on_remove,
            } => f
                .debug_struct("ClearEnd")
                .field("amount", amount)
                .field("call_on_remove", call_on_remove)
                .finish(),
            Action::MoveCursor { position } => f
                .debug_struct("MoveCursor")
                .field("position", position)
                .finish(),
            Action::SetDeleteSpeed { speed, transient } => f
                .debug_struct("SetDeleteSpeed")
                .field("speed", speed)
                .field("transient", transient)
                .finish(),
            Action::SetTypeDelay { delay } => f
                .debug_struct("SetTypeDelay")
                .field("delay", delay)
                .finish(),
            Action::SetCursorGlyph { glyph } => f
                .debug_struct("SetCursorGlyph")
                .field("glyph", glyph)
                .finish(),
        }
    }
}
