//! Engine configuration.

use std::env;
use std::fmt;
use std::rc::Rc;

use crate::surface::NodeHandle;

/// Delay configuration for typing or deleting.
///
/// `Natural` draws a randomized per-character delay so playback reads like a
/// human typing; `Fixed` uses the given number of milliseconds for every
/// character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Natural,
    Fixed(u64),
}

/// Payload handed to [`Options::on_remove_node`] for each removed node.
/// `character` is `None` when the removed node was a tag container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
    pub handle: NodeHandle,
    pub character: Option<String>,
}

/// Splits a string into type-able units. The default splitter segments by
/// grapheme cluster.
pub type SplitterFn = Rc<dyn Fn(&str) -> Vec<String>>;

/// Hook invoked for every created character node. Return `Some(handle)` to
/// use (or substitute) the node, `None` to suppress the character entirely.
pub type CreateTextNodeFn = Rc<dyn Fn(&str, NodeHandle) -> Option<NodeHandle>>;

/// Hook invoked for removed nodes.
pub type RemoveNodeFn = Rc<dyn Fn(RemovedNode)>;

/// Recognized engine options. Cloned at construction time; the clone is
/// restored verbatim when a loop cycle completes, so mid-run mutations issued
/// through `change_*` actions never leak into the next iteration.
#[derive(Clone)]
pub struct Options {
    /// Strings typed out by `type_out_all_strings` (and on `auto_start`).
    pub strings: Vec<String>,
    /// Cursor glyph delegated to the surface.
    pub cursor_glyph: String,
    /// Per-character typing delay.
    pub type_delay: Speed,
    /// Pause inserted after each string by `type_out_all_strings`, in ms.
    pub pause_after_string: u64,
    /// Per-character deletion delay.
    pub delete_speed: Speed,
    /// Replay the executed action log forever once the queue drains.
    pub loop_enabled: bool,
    /// Queue up `strings` and start the engine at construction.
    pub auto_start: bool,
    /// Developer logging to stderr (also enabled by `TYPETAPE_DEBUG=1`).
    pub dev_mode: bool,
    pub splitter: Option<SplitterFn>,
    pub on_create_text_node: Option<CreateTextNodeFn>,
    pub on_remove_node: Option<RemoveNodeFn>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strings: Vec::new(),
            cursor_glyph: "|".to_string(),
            type_delay: Speed::Natural,
            pause_after_string: 1500,
            delete_speed: Speed::Natural,
            loop_enabled: false,
            auto_start: false,
            dev_mode: false,
            splitter: None,
            on_create_text_node: None,
            on_remove_node: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("strings", &self.strings)
            .field("cursor_glyph", &self.cursor_glyph)
            .field("type_delay", &self.type_delay)
            .field("pause_after_string", &self.pause_after_string)
            .field("delete_speed", &self.delete_speed)
            .field("loop_enabled", &self.loop_enabled)
            .field("auto_start", &self.auto_start)
            .field("dev_mode", &self.dev_mode)
            .field("splitter", &self.splitter.is_some())
            .field("on_create_text_node", &self.on_create_text_node.is_some())
            .field("on_remove_node", &self.on_remove_node.is_some())
            .finish()
    }
}

pub(crate) fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

/// Developer logging is on when either the option or the env flag says so.
pub(crate) fn dev_logging_enabled(options: &Options) -> bool {
    options.dev_mode || env_flag("TYPETAPE_DEBUG")
}
