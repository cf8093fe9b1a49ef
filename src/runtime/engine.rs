//! The typewriter engine: fluent builders feed the action queue, the tick
//! scheduler drains it one action per eligible tick.
//!
//! Single-threaded by design. The host owns the tick cadence: it calls
//! [`Typewriter::tick`] periodically (an animation-frame callback, a frame
//! loop, a test driver) and stops once the engine reports it no longer
//! re-arms.

use std::collections::HashMap;

use crate::config::{dev_logging_enabled, Options, RemovedNode, Speed};
use crate::core::action::{Action, CallbackFn, ContainerId, ContainerIdGen};
use crate::core::flatten::{flatten_paste, flatten_typed, PasteNode};
use crate::core::ledger::{Entry, Ledger};
use crate::core::queue::ActionQueue;
use crate::core::text::split_graphemes;
use crate::error::{BuilderError, SurfaceError};
use crate::logging::DevLog;
use crate::markup::{MarkupParser, TagSoupParser};
use crate::runtime::clock::Clock;
use crate::surface::{Elements, NodeHandle, Surface};

use std::rc::Rc;

const DEFAULT_JITTER_SEED: u64 = 0x7479_7065;

/// Externally triggered run state. An empty queue without looping leaves the
/// state `Running` but stops re-arming; that idle condition is distinct from
/// an explicit `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

/// What a tick did, from the host's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The engine wants another tick.
    Armed,
    /// Queue drained without looping; no further tick is requested until
    /// `start` is called again.
    Idle,
    /// The engine is stopped.
    Stopped,
}

/// Deterministic LCG (Numerical Recipes constants) for natural-delay jitter.
#[derive(Debug)]
pub(crate) struct Lcg(u64);

impl Lcg {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    /// Uniform draw from `lo..=hi`.
    pub(crate) fn in_range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + u64::from(self.next_u32()) % (hi - lo + 1)
    }
}

/// Delay owed by the head action before it may execute.
///
/// Natural typing mimics a human hand: whitespace is slowest, a repeated
/// character rides the same key and is fastest, everything else falls in a
/// middle band.
pub(crate) fn delay_for(
    action: &Action,
    options: &Options,
    last_typed: Option<&str>,
    jitter: &mut Lcg,
) -> u64 {
    match action {
        Action::RemoveCharacter | Action::RemoveLastNode => match options.delete_speed {
            Speed::Natural => jitter.in_range(40, 80),
            Speed::Fixed(ms) => ms,
        },
        Action::TypeCharacter { character, .. } => match options.type_delay {
            Speed::Natural => {
                if character == " " {
                    jitter.in_range(180, 190)
                } else if last_typed == Some(character.as_str()) {
                    jitter.in_range(90, 100)
                } else {
                    jitter.in_range(120, 170)
                }
            }
            Speed::Fixed(ms) => ms,
        },
        _ => 0,
    }
}

pub struct Typewriter<S: Surface, C: Clock> {
    surface: S,
    clock: C,
    parser: Box<dyn MarkupParser>,
    options: Options,
    initial_options: Options,
    log: DevLog,
    queue: ActionQueue,
    ledger: Ledger,
    containers: HashMap<ContainerId, NodeHandle>,
    ids: ContainerIdGen,
    elements: Elements,
    state: RunState,
    armed: bool,
    last_tick: Option<u64>,
    pause_until: Option<u64>,
    last_typed: Option<String>,
    jitter: Lcg,
}

impl<S: Surface, C: Clock> Typewriter<S, C> {
    /// Build an engine inside `container` using the bundled markup parser.
    pub fn new(
        surface: S,
        clock: C,
        container: NodeHandle,
        options: Options,
    ) -> Result<Self, SurfaceError> {
        Self::with_parser(surface, clock, container, options, Box::new(TagSoupParser))
    }

    /// Build an engine with a host-supplied markup parser.
    pub fn with_parser(
        mut surface: S,
        clock: C,
        container: NodeHandle,
        options: Options,
        parser: Box<dyn MarkupParser>,
    ) -> Result<Self, SurfaceError> {
        let wrapper = surface.create_container("typetape-wrapper");
        let cursor = surface.create_container("typetape-cursor");
        surface.set_inner_content(cursor, &options.cursor_glyph)?;
        surface.append_child(container, wrapper)?;
        surface.append_child(wrapper, cursor)?;

        let log = DevLog::new(dev_logging_enabled(&options));
        let mut engine = Self {
            elements: Elements {
                container,
                wrapper,
                cursor,
            },
            ledger: Ledger::new(wrapper, cursor),
            queue: ActionQueue::new(),
            containers: HashMap::new(),
            ids: ContainerIdGen::default(),
            initial_options: options.clone(),
            options,
            log,
            state: RunState::Stopped,
            armed: false,
            last_tick: None,
            pause_until: None,
            last_typed: None,
            jitter: Lcg::new(DEFAULT_JITTER_SEED),
            surface,
            clock,
            parser,
        };

        engine.queue.push_front(Action::SetCursorGlyph {
            glyph: engine.options.cursor_glyph.clone(),
        });

        if engine.options.auto_start && !engine.options.strings.is_empty() {
            engine.type_out_all_strings();
            engine.start();
        }
        Ok(engine)
    }

    // ---- lifecycle -------------------------------------------------------

    pub fn start(&mut self) -> &mut Self {
        self.state = RunState::Running;
        self.armed = true;
        self
    }

    pub fn pause(&mut self) -> &mut Self {
        self.state = RunState::Paused;
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.state = RunState::Stopped;
        self.armed = false;
        self
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Reseed the natural-delay jitter (deterministic tests).
    pub fn seed_jitter(&mut self, seed: u64) {
        self.jitter = Lcg::new(seed);
    }

    // ---- builders --------------------------------------------------------

    /// Queue typing out `text`, flattening any tag syntax it contains.
    pub fn type_string(&mut self, text: &str) -> &mut Self {
        let split = self.splitter_fn();
        let actions = flatten_typed(
            self.parser.as_ref(),
            &|s| split(s),
            text,
            None,
            &mut self.ids,
        );
        for action in actions {
            self.queue.push_back(action);
        }
        self
    }

    /// Queue pasting `text` in a single tick, no per-character delay.
    pub fn paste_string(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.queue.push_back(Action::PasteString {
                markup: text.to_string(),
                container: None,
            });
        }
        self
    }

    /// Queue typing every configured string, pausing after each and deleting
    /// it before the next.
    pub fn type_out_all_strings(&mut self) -> &mut Self {
        let strings = self.options.strings.clone();
        let pause = self.options.pause_after_string;
        let delete_speed = self.options.delete_speed;
        for text in &strings {
            self.type_string(text);
            self.pause_for(pause);
            self.delete_all(delete_speed);
        }
        self
    }

    /// Queue deleting `amount` characters at the cursor, animated.
    pub fn delete_chars(&mut self, amount: usize) -> Result<&mut Self, BuilderError> {
        if amount == 0 {
            return Err(BuilderError::ZeroDeleteAmount);
        }
        for _ in 0..amount {
            self.queue.push_back(Action::RemoveCharacter);
        }
        Ok(self)
    }

    /// Queue one animated deletion per element of `characters`.
    pub fn remove_characters(&mut self, characters: &[String]) -> &mut Self {
        for _ in characters {
            self.queue.push_back(Action::RemoveCharacter);
        }
        self
    }

    /// Queue deleting everything before the cursor, animated at `speed`.
    pub fn delete_all(&mut self, speed: Speed) -> &mut Self {
        self.queue.push_back(Action::RemoveAll { speed });
        self
    }

    /// Queue a pause of `ms` milliseconds.
    pub fn pause_for(&mut self, ms: u64) -> &mut Self {
        self.queue.push_back(Action::PauseFor { ms });
        self
    }

    /// Queue a synchronous callback, invoked with the root element handles.
    pub fn call_function(&mut self, callback: impl Fn(Elements) + 'static) -> &mut Self {
        let callback: CallbackFn = Rc::new(callback);
        self.queue.push_back(Action::CallFunction { callback });
        self
    }

    pub fn change_delete_speed(&mut self, speed: Speed) -> Result<&mut Self, BuilderError> {
        if speed == Speed::Fixed(0) {
            return Err(BuilderError::ZeroDeleteSpeed);
        }
        self.queue.push_back(Action::SetDeleteSpeed {
            speed,
            transient: false,
        });
        Ok(self)
    }

    pub fn change_delay(&mut self, delay: Speed) -> Result<&mut Self, BuilderError> {
        if delay == Speed::Fixed(0) {
            return Err(BuilderError::ZeroDelay);
        }
        self.queue.push_back(Action::SetTypeDelay { delay });
        Ok(self)
    }

    pub fn change_cursor(&mut self, glyph: &str) -> Result<&mut Self, BuilderError> {
        if glyph.is_empty() {
            return Err(BuilderError::EmptyCursorGlyph);
        }
        self.queue.push_back(Action::SetCursorGlyph {
            glyph: glyph.to_string(),
        });
        Ok(self)
    }

    /// Queue relocating the cursor so `position` text entries precede it.
    pub fn change_cursor_position(&mut self, position: usize) -> &mut Self {
        self.queue.push_back(Action::MoveCursor { position });
        self
    }

    /// Queue an immediate (single-tick) removal of up to `amount` characters
    /// before the cursor; `0` removes all.
    pub fn clear(&mut self, amount: usize, call_on_remove: bool) -> &mut Self {
        self.queue.push_back(Action::Clear {
            amount,
            call_on_remove,
        });
        self
    }

    /// Queue an immediate removal counted from the end of content,
    /// regardless of cursor position; `0` removes all.
    pub fn clear_end(&mut self, amount: usize, call_on_remove: bool) -> &mut Self {
        self.queue.push_back(Action::ClearEnd {
            amount,
            call_on_remove,
        });
        self
    }

    // ---- scheduler -------------------------------------------------------

    /// Run one scheduler step. At most one action executes per tick; ticks
    /// arriving before the head action's delay has elapsed consume nothing.
    pub fn tick(&mut self) -> TickOutcome {
        match (self.state, self.armed) {
            (RunState::Stopped, _) => return TickOutcome::Stopped,
            (_, false) => return TickOutcome::Idle,
            _ => {}
        }

        let now = self.clock.now_ms();
        let last = *self.last_tick.get_or_insert(now);
        let elapsed = now.saturating_sub(last);

        if self.queue.is_empty() {
            if !self.options.loop_enabled {
                self.armed = false;
                return TickOutcome::Idle;
            }
            self.queue.refill_from_replay();
            self.options = self.initial_options.clone();
            self.log = DevLog::new(dev_logging_enabled(&self.options));
            if self.log.enabled() {
                self.log.record("loop: replaying archived actions");
            }
        }

        if self.state == RunState::Paused {
            return TickOutcome::Armed;
        }

        if let Some(until) = self.pause_until {
            if now < until {
                return TickOutcome::Armed;
            }
            self.pause_until = None;
        }

        let delay = match self.queue.peek() {
            Some(head) => delay_for(head, &self.options, self.last_typed.as_deref(), &mut self.jitter),
            None => return TickOutcome::Armed,
        };
        if elapsed <= delay {
            return TickOutcome::Armed;
        }

        let Some(action) = self.queue.pop_front() else {
            return TickOutcome::Armed;
        };
        if self.log.enabled() {
            self.log.record(&format!(
                "run {} (elapsed {elapsed}ms, delay {delay}ms)",
                action.kind_name()
            ));
        }
        if self.options.loop_enabled && action.replayable() {
            self.queue.archive(action.clone());
        }
        self.execute(action, now);
        self.last_tick = Some(now);
        TickOutcome::Armed
    }

    fn execute(&mut self, action: Action, now: u64) {
        match action {
            Action::TypeCharacter {
                character,
                container,
            } => {
                let rendered = self.surface.create_text_node(&character);
                let chosen = match &self.options.on_create_text_node {
                    Some(hook) => hook(&character, rendered),
                    None => Some(rendered),
                };
                if let Some(handle) = chosen {
                    let target = self.resolve_container(container);
                    let entry = Entry::text(character.clone(), handle, target);
                    if let Err(err) = self.ledger.insert_at_cursor(&mut self.surface, entry) {
                        self.log_surface_error("type_character", err);
                    }
                }
                self.last_typed = Some(character);
            }

            Action::PasteString { markup, container } => {
                let split = self.splitter_fn();
                let nodes = flatten_paste(
                    self.parser.as_ref(),
                    &|s| split(s),
                    &markup,
                    container,
                    &mut self.ids,
                );
                for node in nodes {
                    match node {
                        PasteNode::Tag { id, tag, parent } => {
                            let handle = self.surface.create_container(&tag);
                            self.containers.insert(id, handle);
                            let target = self.resolve_container(parent);
                            let entry = Entry::tag_marker(handle, target);
                            if let Err(err) = self.ledger.insert_at_cursor(&mut self.surface, entry)
                            {
                                self.log_surface_error("paste_string", err);
                            }
                        }
                        PasteNode::Text { character, parent } => {
                            let handle = self.surface.create_text_node(&character);
                            let target = self.resolve_container(parent);
                            let entry = Entry::text(character, handle, target);
                            if let Err(err) = self.ledger.insert_at_cursor(&mut self.surface, entry)
                            {
                                self.log_surface_error("paste_string", err);
                            }
                        }
                    }
                }
            }

            Action::RemoveCharacter => {
                // Kept separate from the mechanical removal so the delay
                // table can distinguish the two.
                self.queue.push_front(Action::RemoveLastNode);
            }

            Action::RemoveLastNode => {
                if let Some(removal) = self.ledger.remove_before_cursor(&mut self.surface) {
                    if let Some(err) = removal.detach_error {
                        self.log_surface_error("remove_last_node", err);
                    }
                    if let Some(hook) = &self.options.on_remove_node {
                        hook(RemovedNode {
                            handle: removal.entry.handle,
                            character: removal.entry.character.clone(),
                        });
                    }
                    if removal.container_emptied {
                        self.queue.push_front(Action::RemoveLastNode);
                    }
                }
            }

            Action::PauseFor { ms } => {
                self.pause_until = Some(now + ms);
            }

            Action::CallFunction { callback } => {
                // Opaque to the engine; failures propagate to the host.
                callback(self.elements);
            }

            Action::AddTagMarker { id, tag, parent } => {
                let handle = self.surface.create_container(&tag);
                self.containers.insert(id, handle);
                let target = self.resolve_container(parent);
                let entry = Entry::tag_marker(handle, target);
                if let Err(err) = self.ledger.insert_at_cursor(&mut self.surface, entry) {
                    self.log_surface_error("add_tag_marker", err);
                }
            }

            Action::RemoveAll { speed } => {
                let mut burst = Vec::new();
                if let Speed::Fixed(ms) = speed {
                    if ms == 0 && self.log.enabled() {
                        self.log
                            .record("delete_all with zero speed; clear() removes immediately");
                    }
                    burst.push(Action::SetDeleteSpeed {
                        speed,
                        transient: true,
                    });
                }
                for _ in 0..self.ledger.cursor_index() {
                    burst.push(Action::RemoveLastNode);
                }
                if matches!(speed, Speed::Fixed(_)) {
                    burst.push(Action::SetDeleteSpeed {
                        speed: self.options.delete_speed,
                        transient: true,
                    });
                }
                // Prepended as one block: the burst runs to completion before
                // anything that was already pending.
                self.queue.push_front_all(burst);
            }

            Action::Clear {
                amount,
                call_on_remove,
            } => {
                let hook = self.removal_hook(call_on_remove);
                let mut notify = |entry: &Entry| {
                    if let Some(hook) = &hook {
                        hook(RemovedNode {
                            handle: entry.handle,
                            character: entry.character.clone(),
                        });
                    }
                };
                let outcome =
                    self.ledger
                        .clear_from_cursor(&mut self.surface, amount, &mut notify);
                for err in outcome.errors {
                    self.log_surface_error("clear", err);
                }
            }

            Action::ClearEnd {
                amount,
                call_on_remove,
            } => {
                let hook = self.removal_hook(call_on_remove);
                let mut notify = |entry: &Entry| {
                    if let Some(hook) = &hook {
                        hook(RemovedNode {
                            handle: entry.handle,
                            character: entry.character.clone(),
                        });
                    }
                };
                let outcome = self
                    .ledger
                    .clear_from_end(&mut self.surface, amount, &mut notify);
                for err in outcome.errors {
                    self.log_surface_error("clear_end", err);
                }
            }

            Action::MoveCursor { position } => {
                if let Some(err) = self.ledger.move_cursor(&mut self.surface, position) {
                    self.log_surface_error("move_cursor", err);
                }
            }

            Action::SetDeleteSpeed { speed, .. } => {
                self.options.delete_speed = speed;
            }

            Action::SetTypeDelay { delay } => {
                self.options.type_delay = delay;
            }

            Action::SetCursorGlyph { glyph } => {
                self.options.cursor_glyph = glyph.clone();
                if let Err(err) = self.surface.set_inner_content(self.elements.cursor, &glyph) {
                    self.log_surface_error("set_cursor_glyph", err);
                }
            }
        }
    }

    // ---- helpers ---------------------------------------------------------

    fn splitter_fn(&self) -> Rc<dyn Fn(&str) -> Vec<String>> {
        match &self.options.splitter {
            Some(splitter) => splitter.clone(),
            None => Rc::new(|text: &str| split_graphemes(text)),
        }
    }

    fn removal_hook(&self, call_on_remove: bool) -> Option<crate::config::RemoveNodeFn> {
        if call_on_remove {
            self.options.on_remove_node.clone()
        } else {
            None
        }
    }

    /// A tag binding can go stale if the tag was deleted mid-flight; fall
    /// back to the root wrapper rather than rendering into a detached node.
    fn resolve_container(&self, id: Option<ContainerId>) -> NodeHandle {
        match id.and_then(|id| self.containers.get(&id).copied()) {
            Some(handle) if self.ledger.contains_handle(handle) => handle,
            _ => self.ledger.wrapper(),
        }
    }

    fn log_surface_error(&self, context: &str, err: SurfaceError) {
        if self.log.enabled() {
            self.log.record(&format!("{context}: skipped step: {err}"));
        }
    }

    // ---- inspection ------------------------------------------------------

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn elements(&self) -> Elements {
        self.elements
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_kinds(&self) -> Vec<&'static str> {
        self.queue.pending().map(Action::kind_name).collect()
    }

    pub fn replay_kinds(&self) -> Vec<&'static str> {
        self.queue.replay().iter().map(Action::kind_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{delay_for, Lcg};
    use crate::config::{Options, Speed};
    use crate::core::action::Action;

    fn type_char(ch: &str) -> Action {
        Action::TypeCharacter {
            character: ch.to_string(),
            container: None,
        }
    }

    #[test]
    fn natural_typing_bands_are_ordered() {
        let options = Options::default();
        let mut jitter = Lcg::new(7);
        for _ in 0..200 {
            let space = delay_for(&type_char(" "), &options, Some("x"), &mut jitter);
            assert!((180..=190).contains(&space), "space delay {space}");

            let repeat = delay_for(&type_char("a"), &options, Some("a"), &mut jitter);
            assert!((90..=100).contains(&repeat), "repeat delay {repeat}");

            let distinct = delay_for(&type_char("a"), &options, Some("b"), &mut jitter);
            assert!((120..=170).contains(&distinct), "distinct delay {distinct}");

            // Repeated keystrokes are strictly faster than distinct ones.
            assert!(repeat < distinct);
        }
    }

    #[test]
    fn natural_delete_band() {
        let options = Options::default();
        let mut jitter = Lcg::new(3);
        for _ in 0..200 {
            let delay = delay_for(&Action::RemoveCharacter, &options, None, &mut jitter);
            assert!((40..=80).contains(&delay));
        }
    }

    #[test]
    fn fixed_speeds_bypass_jitter() {
        let mut options = Options::default();
        options.type_delay = Speed::Fixed(5);
        options.delete_speed = Speed::Fixed(3);
        let mut jitter = Lcg::new(1);
        assert_eq!(delay_for(&type_char("a"), &options, None, &mut jitter), 5);
        assert_eq!(
            delay_for(&Action::RemoveCharacter, &options, None, &mut jitter),
            3
        );
    }

    #[test]
    fn non_typing_actions_owe_no_delay() {
        let options = Options::default();
        let mut jitter = Lcg::new(1);
        assert_eq!(
            delay_for(&Action::PauseFor { ms: 500 }, &options, None, &mut jitter),
            0
        );
        assert_eq!(
            delay_for(&Action::MoveCursor { position: 0 }, &options, None, &mut jitter),
            0
        );
    }

    #[test]
    fn lcg_in_range_is_inclusive_and_bounded() {
        let mut jitter = Lcg::new(42);
        let mut seen_lo = false;
        let mut seen_hi = false;
        for _ in 0..10_000 {
            let value = jitter.in_range(3, 5);
            assert!((3..=5).contains(&value));
            seen_lo |= value == 3;
            seen_hi |= value == 5;
        }
        assert!(seen_lo && seen_hi);
    }
}
