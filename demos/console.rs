//! Terminal playback: drives the engine off the wall clock and reprints the
//! visible text on every tick.
//!
//! Run with `cargo run --example console`.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use typetape::{MemorySurface, Options, Surface, SystemClock, TickOutcome, Typewriter};

fn main() -> io::Result<()> {
    let mut surface = MemorySurface::new();
    let root = surface.create_container("root");

    let mut options = Options::default();
    options.cursor_glyph = "_".to_string();

    let mut tape = Typewriter::new(surface, SystemClock::new(), root, options)
        .expect("handles from a fresh surface are valid");
    tape.type_string("Hello, <b>world</b>!")
        .pause_for(600);
    tape.delete_chars(6).expect("non-zero amount");
    tape.type_string("typetape!").pause_for(400);
    tape.start();

    let wrapper = tape.elements().wrapper;
    let mut stdout = io::stdout();
    loop {
        let outcome = tape.tick();
        let text = tape.surface().text_content(wrapper);
        let glyph = &tape.options().cursor_glyph;
        write!(stdout, "\r\x1b[2K{text}{glyph}")?;
        stdout.flush()?;
        if outcome != TickOutcome::Armed {
            break;
        }
        thread::sleep(Duration::from_millis(16));
    }
    writeln!(stdout)?;
    Ok(())
}
