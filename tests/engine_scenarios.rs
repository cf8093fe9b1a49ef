//! End-to-end scenarios driving the engine through a manual clock and the
//! in-memory surface.

use std::cell::Cell;
use std::rc::Rc;

use typetape::{
    BuilderError, ManualClock, MemorySurface, Options, Speed, Surface, TickOutcome, Typewriter,
};

type Tape = Typewriter<MemorySurface, ManualClock>;

fn new_tape(options: Options) -> (Tape, ManualClock) {
    let mut surface = MemorySurface::new();
    let root = surface.create_container("root");
    let clock = ManualClock::new();
    let tape = Typewriter::new(surface, clock.clone(), root, options).unwrap();
    (tape, clock)
}

/// Options with deterministic single-millisecond delays.
fn fast() -> Options {
    let mut options = Options::default();
    options.type_delay = Speed::Fixed(1);
    options.delete_speed = Speed::Fixed(1);
    options.pause_after_string = 1;
    options
}

fn visible(tape: &Tape) -> String {
    tape.surface().text_content(tape.elements().wrapper)
}

fn cursor_glyph_shown(tape: &Tape) -> String {
    tape.surface()
        .inner_content(tape.elements().cursor)
        .unwrap_or_default()
        .to_string()
}

/// Advance the clock and tick until the engine stops re-arming.
fn drive(tape: &mut Tape, clock: &ManualClock, step: u64, max_ticks: usize) -> TickOutcome {
    let mut last = TickOutcome::Armed;
    for _ in 0..max_ticks {
        clock.advance(step);
        last = tape.tick();
        if last != TickOutcome::Armed {
            break;
        }
    }
    last
}

#[test]
fn types_string_then_idles() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc").start();
    let outcome = drive(&mut tape, &clock, 16, 50);
    assert_eq!(outcome, TickOutcome::Idle);
    assert_eq!(visible(&tape), "abc");
    assert!(!tape.is_armed());
    assert_eq!(tape.queue_len(), 0);
}

#[test]
fn one_action_per_tick() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc").start();
    // First tick only records a reference time; the cursor-glyph setup
    // action takes the second.
    let expected = ["", "", "a", "ab", "abc"];
    for want in expected {
        clock.advance(16);
        assert_eq!(tape.tick(), TickOutcome::Armed);
        assert_eq!(visible(&tape), want);
    }
}

#[test]
fn early_ticks_consume_nothing() {
    let mut options = fast();
    options.type_delay = Speed::Fixed(100);
    let (mut tape, clock) = new_tape(options);
    tape.type_string("a").start();
    // Warmup and glyph setup.
    clock.advance(16);
    tape.tick();
    clock.advance(16);
    tape.tick();
    // 100ms have not elapsed yet.
    for _ in 0..5 {
        clock.advance(16);
        assert_eq!(tape.tick(), TickOutcome::Armed);
    }
    assert_eq!(visible(&tape), "");
    clock.advance(100);
    tape.tick();
    assert_eq!(visible(&tape), "a");
}

#[test]
fn delete_chars_stops_at_empty() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc");
    tape.delete_chars(5).unwrap();
    tape.start();
    let outcome = drive(&mut tape, &clock, 16, 80);
    assert_eq!(outcome, TickOutcome::Idle);
    assert_eq!(visible(&tape), "");
    // Only the cursor entry remains.
    assert_eq!(tape.ledger().entries().len(), 1);
}

#[test]
fn remove_characters_deletes_one_per_element() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abcd");
    tape.remove_characters(&["c".to_string(), "d".to_string()]);
    tape.start();
    drive(&mut tape, &clock, 16, 80);
    assert_eq!(visible(&tape), "ab");
}

#[test]
fn single_string_types_and_deletes_back() {
    let mut options = fast();
    options.strings = vec!["Hi".to_string()];
    options.pause_after_string = 0;
    options.auto_start = true;
    let (mut tape, clock) = new_tape(options);
    assert!(tape.is_armed());

    let mut saw_full = false;
    let mut outcome = TickOutcome::Armed;
    for _ in 0..80 {
        clock.advance(16);
        outcome = tape.tick();
        saw_full |= visible(&tape) == "Hi";
        if outcome != TickOutcome::Armed {
            break;
        }
    }
    assert!(saw_full);
    assert_eq!(outcome, TickOutcome::Idle);
    assert_eq!(visible(&tape), "");

    // Idle is permanent without a restart.
    clock.advance(16);
    assert_eq!(tape.tick(), TickOutcome::Idle);
}

#[test]
fn loop_replays_and_restores_options() {
    let mut options = fast();
    options.loop_enabled = true;
    let (mut tape, clock) = new_tape(options);
    tape.type_string("ab");
    tape.change_cursor("_").unwrap();
    tape.delete_all(Speed::Fixed(1));
    tape.start();

    let mut states = Vec::new();
    for _ in 0..80 {
        clock.advance(16);
        assert_eq!(tape.tick(), TickOutcome::Armed);
        states.push((visible(&tape), cursor_glyph_shown(&tape)));
    }

    // First cycle: content appears, then the glyph change lands.
    let full = states.iter().position(|(text, _)| text == "ab").unwrap();
    let changed = states.iter().position(|(_, glyph)| glyph == "_").unwrap();
    // Content drains and comes back in a later cycle.
    let empty = full
        + states[full..]
            .iter()
            .position(|(text, _)| text.is_empty())
            .unwrap();
    assert!(states[empty..].iter().any(|(text, _)| text == "ab"));
    // The archived setup action restores the original glyph each cycle, so
    // the mid-cycle change never leaks into the next iteration.
    assert!(states[changed..].iter().any(|(_, glyph)| glyph == "|"));
}

#[test]
fn clear_removes_in_one_tick_and_reports_nodes() {
    let removed = Rc::new(Cell::new(0usize));
    let hook = removed.clone();
    let mut options = fast();
    options.on_remove_node = Some(Rc::new(move |_node| hook.set(hook.get() + 1)));
    let (mut tape, clock) = new_tape(options);
    tape.type_string("abcd");
    tape.start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "abcd");

    tape.clear(0, true);
    tape.start();
    // All four characters vanish in a single tick.
    clock.advance(16);
    tape.tick();
    assert_eq!(visible(&tape), "");
    assert_eq!(removed.get(), 4);
}

#[test]
fn clear_without_notification_skips_the_hook() {
    let removed = Rc::new(Cell::new(0usize));
    let hook = removed.clone();
    let mut options = fast();
    options.on_remove_node = Some(Rc::new(move |_node| hook.set(hook.get() + 1)));
    let (mut tape, clock) = new_tape(options);
    tape.type_string("ab").clear(0, false).start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "");
    assert_eq!(removed.get(), 0);
}

#[test]
fn clear_end_counts_from_the_end_regardless_of_cursor() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc");
    tape.change_cursor_position(1);
    tape.clear_end(2, false);
    tape.start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "a");

    // The cursor kept its spot after "a"; new input lands there.
    tape.type_string("X").start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "aX");
}

#[test]
fn cursor_repositioning_redirects_typing() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc");
    tape.change_cursor_position(0);
    tape.type_string("X");
    tape.start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "Xabc");
}

#[test]
fn markup_builds_nested_structure() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("<b>hi</b>there").start();
    drive(&mut tape, &clock, 16, 80);
    assert_eq!(visible(&tape), "hithere");
    assert_eq!(
        tape.surface().render(tape.elements().wrapper),
        "<typetape-wrapper><b>hi</b>there<typetape-cursor>|</typetape-cursor></typetape-wrapper>"
    );
}

#[test]
fn deleting_through_a_tag_removes_the_emptied_container() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("<b>hi</b>there").start();
    drive(&mut tape, &clock, 16, 80);

    tape.delete_chars(2).unwrap();
    tape.start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "hithe");

    tape.delete_all(Speed::Fixed(1));
    tape.start();
    drive(&mut tape, &clock, 16, 80);
    assert_eq!(visible(&tape), "");
    assert_eq!(tape.ledger().entries().len(), 1);
    // The emptied <b> container is gone from the surface too.
    assert_eq!(
        tape.surface().render(tape.elements().wrapper),
        "<typetape-wrapper><typetape-cursor>|</typetape-cursor></typetape-wrapper>"
    );
}

#[test]
fn paste_lands_in_a_single_tick() {
    let (mut tape, clock) = new_tape(fast());
    tape.paste_string("<i>x</i>y").start();
    // Warmup, glyph setup, paste.
    for _ in 0..3 {
        clock.advance(16);
        tape.tick();
    }
    assert_eq!(visible(&tape), "xy");
    assert_eq!(
        tape.surface().render(tape.elements().wrapper),
        "<typetape-wrapper><i>x</i>y<typetape-cursor>|</typetape-cursor></typetape-wrapper>"
    );
}

#[test]
fn pause_for_gates_the_queue() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("a").pause_for(100).type_string("b").start();
    let mut a_at = None;
    let mut ab_at = None;
    for _ in 0..60 {
        clock.advance(16);
        tape.tick();
        if visible(&tape) == "a" && a_at.is_none() {
            a_at = Some(clock.get());
        }
        if visible(&tape) == "ab" {
            ab_at = Some(clock.get());
            break;
        }
    }
    let a_at = a_at.expect("first character typed");
    let ab_at = ab_at.expect("second character typed");
    assert!(ab_at - a_at >= 100, "paused {}ms", ab_at - a_at);
}

#[test]
fn call_function_receives_root_elements() {
    let seen = Rc::new(Cell::new(false));
    let flag = seen.clone();
    let (mut tape, clock) = new_tape(fast());
    let wrapper = tape.elements().wrapper;
    tape.call_function(move |elements| {
        assert_eq!(elements.wrapper, wrapper);
        flag.set(true);
    });
    tape.start();
    drive(&mut tape, &clock, 16, 20);
    assert!(seen.get());
}

#[test]
fn suppressed_characters_never_become_visible() {
    let mut options = fast();
    options.on_create_text_node = Some(Rc::new(|character: &str, handle| {
        if character == "b" {
            None
        } else {
            Some(handle)
        }
    }));
    let (mut tape, clock) = new_tape(options);
    tape.type_string("abc").start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "ac");
}

#[test]
fn custom_splitter_controls_typing_units() {
    let mut options = fast();
    options.splitter = Some(Rc::new(|text: &str| {
        text.split(' ').map(String::from).collect()
    }));
    let (mut tape, clock) = new_tape(options);
    tape.type_string("hi yo").start();
    // Two units plus the setup action.
    assert_eq!(tape.queue_len(), 3);
    drive(&mut tape, &clock, 16, 20);
    assert_eq!(visible(&tape), "hiyo");
}

#[test]
fn grapheme_clusters_type_as_single_units() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("e\u{301}x").start();
    drive(&mut tape, &clock, 16, 20);
    assert_eq!(visible(&tape), "e\u{301}x");
    assert_eq!(tape.ledger().text_count(), 2);
}

#[test]
fn mid_run_speed_changes_apply_to_later_actions() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("a");
    tape.change_delay(Speed::Fixed(200)).unwrap();
    tape.type_string("b");
    tape.start();
    let mut a_at = None;
    let mut ab_at = None;
    for _ in 0..60 {
        clock.advance(16);
        tape.tick();
        if visible(&tape) == "a" && a_at.is_none() {
            a_at = Some(clock.get());
        }
        if visible(&tape) == "ab" {
            ab_at = Some(clock.get());
            break;
        }
    }
    assert!(ab_at.unwrap() - a_at.unwrap() >= 200);
}

#[test]
fn pause_freezes_and_start_resumes() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc").start();
    for _ in 0..3 {
        clock.advance(16);
        tape.tick();
    }
    let frozen = visible(&tape);
    tape.pause();
    for _ in 0..5 {
        clock.advance(16);
        assert_eq!(tape.tick(), TickOutcome::Armed);
    }
    assert_eq!(visible(&tape), frozen);

    tape.start();
    drive(&mut tape, &clock, 16, 50);
    assert_eq!(visible(&tape), "abc");
}

#[test]
fn stop_halts_ticking() {
    let (mut tape, clock) = new_tape(fast());
    tape.type_string("abc").start();
    clock.advance(16);
    tape.tick();
    tape.stop();
    assert!(!tape.is_armed());
    clock.advance(16);
    assert_eq!(tape.tick(), TickOutcome::Stopped);
}

#[test]
fn change_cursor_updates_the_surface() {
    let (mut tape, clock) = new_tape(fast());
    assert_eq!(cursor_glyph_shown(&tape), "|");
    tape.change_cursor("_").unwrap();
    tape.start();
    drive(&mut tape, &clock, 16, 20);
    assert_eq!(cursor_glyph_shown(&tape), "_");
    assert_eq!(tape.options().cursor_glyph, "_");
}

#[test]
fn builder_validation_errors() {
    let (mut tape, _clock) = new_tape(fast());
    assert!(matches!(
        tape.delete_chars(0),
        Err(BuilderError::ZeroDeleteAmount)
    ));
    assert!(matches!(
        tape.change_delay(Speed::Fixed(0)),
        Err(BuilderError::ZeroDelay)
    ));
    assert!(matches!(
        tape.change_delete_speed(Speed::Fixed(0)),
        Err(BuilderError::ZeroDeleteSpeed)
    ));
    assert!(matches!(
        tape.change_cursor(""),
        Err(BuilderError::EmptyCursorGlyph)
    ));
}

#[test]
fn replay_log_excludes_internal_actions() {
    let mut options = fast();
    options.loop_enabled = true;
    let (mut tape, clock) = new_tape(options);
    tape.type_string("a");
    tape.delete_all(Speed::Fixed(1));
    tape.start();
    // Run most of one cycle without letting it refill.
    for _ in 0..6 {
        clock.advance(16);
        tape.tick();
    }
    let kinds = tape.replay_kinds();
    assert!(kinds.contains(&"remove_all"));
    assert!(!kinds.contains(&"remove_last_node"));
    assert!(!kinds.contains(&"set_delete_speed"));
}
