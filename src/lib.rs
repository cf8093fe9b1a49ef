//! typetape renders typewriter-style text animation onto a pluggable
//! surface.
//!
//! Callers describe an animation with fluent builder calls (`type_string`,
//! `pause_for`, `delete_chars`, ...), which queue primitive actions. The host
//! then drives [`Typewriter::tick`] on its own cadence; each eligible tick
//! executes at most one action, with per-character delays that imitate human
//! typing. Rendering goes through the [`Surface`] trait, so the same engine
//! runs against a DOM-like tree, a terminal, or the bundled in-memory
//! test surface.
//!
//! ```no_run
//! use typetape::{ManualClock, MemorySurface, Options, Surface, TickOutcome, Typewriter};
//!
//! let mut surface = MemorySurface::new();
//! let root = surface.create_container("root");
//! let clock = ManualClock::new();
//! let driver = clock.clone();
//!
//! let mut tape = Typewriter::new(surface, clock, root, Options::default()).unwrap();
//! tape.type_string("Hello world").pause_for(500).start();
//!
//! loop {
//!     driver.advance(16);
//!     if tape.tick() != TickOutcome::Armed {
//!         break;
//!     }
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod markup;
pub mod runtime;
pub mod surface;

pub use crate::config::{CreateTextNodeFn, Options, RemoveNodeFn, RemovedNode, SplitterFn, Speed};
pub use crate::core::action::{Action, ContainerId};
pub use crate::core::ledger::{Entry, EntryKind, Ledger};
pub use crate::error::{BuilderError, SurfaceError};
pub use crate::markup::{FragmentNode, MarkupParser, TagSoupParser};
pub use crate::runtime::clock::{Clock, ManualClock, SystemClock};
pub use crate::runtime::engine::{RunState, TickOutcome, Typewriter};
pub use crate::surface::{Elements, MemorySurface, NodeHandle, Surface};
