//! Ordered model of everything currently visible.
//!
//! The ledger is the sole authority on ordering: characters, tag containers,
//! and exactly one cursor entry. Surface handles are back-references, not
//! owned nodes; the ledger requests removal but never manages node lifetime.
//!
//! Ordering invariant: a tag marker always precedes the entries it contains,
//! because the flattener inserts tags before their children. Cascading
//! cleanup and bulk clears rely on this.

use crate::error::SurfaceError;
use crate::surface::{NodeHandle, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Text,
    TagMarker,
    Cursor,
}

/// One visible unit. `container` is the surface parent the entry was
/// rendered into (the root wrapper or a tag marker's handle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub character: Option<String>,
    pub handle: NodeHandle,
    pub container: NodeHandle,
}

impl Entry {
    pub fn text(character: impl Into<String>, handle: NodeHandle, container: NodeHandle) -> Self {
        Self {
            kind: EntryKind::Text,
            character: Some(character.into()),
            handle,
            container,
        }
    }

    pub fn tag_marker(handle: NodeHandle, container: NodeHandle) -> Self {
        Self {
            kind: EntryKind::TagMarker,
            character: None,
            handle,
            container,
        }
    }
}

/// Result of a single remove-before-cursor step.
#[derive(Debug)]
pub struct Removal {
    pub entry: Entry,
    /// Surface-level detach failure, if any. The ledger entry is gone either
    /// way; the caller logs and moves on.
    pub detach_error: Option<SurfaceError>,
    /// The removed entry's container is a tag marker that now has no
    /// children left. The scheduler reacts by synthesizing another removal.
    pub container_emptied: bool,
}

/// Result of an immediate bulk clear.
#[derive(Debug, Default)]
pub struct ClearOutcome {
    pub removed_text: usize,
    pub errors: Vec<SurfaceError>,
}

#[derive(Debug)]
pub struct Ledger {
    entries: Vec<Entry>,
    wrapper: NodeHandle,
    cursor: NodeHandle,
}

impl Ledger {
    pub fn new(wrapper: NodeHandle, cursor: NodeHandle) -> Self {
        Self {
            entries: vec![Entry {
                kind: EntryKind::Cursor,
                character: None,
                handle: cursor,
                container: wrapper,
            }],
            wrapper,
            cursor,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn wrapper(&self) -> NodeHandle {
        self.wrapper
    }

    pub fn cursor_handle(&self) -> NodeHandle {
        self.cursor
    }

    /// Index of the cursor entry. Exactly one exists at all times.
    pub fn cursor_index(&self) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.kind == EntryKind::Cursor)
            .expect("ledger lost its cursor entry")
    }

    /// Count of text entries in the whole ledger.
    pub fn text_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Text)
            .count()
    }

    /// Count of text entries before the cursor.
    pub fn text_before_cursor(&self) -> usize {
        let cursor = self.cursor_index();
        self.entries[..cursor]
            .iter()
            .filter(|entry| entry.kind == EntryKind::Text)
            .count()
    }

    pub fn contains_handle(&self, handle: NodeHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }

    fn has_children(&self, handle: NodeHandle) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind != EntryKind::Cursor && entry.container == handle)
    }

    /// Splice a new entry immediately before the cursor and render it.
    ///
    /// Root-bound entries are inserted before the cursor node on the surface
    /// (falling back to a plain append if the cursor is not attached);
    /// tag-bound entries are appended to their container.
    pub fn insert_at_cursor<S: Surface>(
        &mut self,
        surface: &mut S,
        entry: Entry,
    ) -> Result<(), SurfaceError> {
        let index = self.cursor_index();
        let result = if entry.container == self.wrapper {
            surface
                .insert_before(self.wrapper, entry.handle, self.cursor)
                .or_else(|_| surface.append_child(self.wrapper, entry.handle))
        } else {
            surface.append_child(entry.container, entry.handle)
        };
        self.entries.insert(index, entry);
        result
    }

    /// Remove the entry immediately preceding the cursor. Returns `None` when
    /// the cursor is at the start (nothing to delete) or when the preceding
    /// entry is a tag marker that still has children (removing it would
    /// destroy content the cursor sits inside of).
    pub fn remove_before_cursor<S: Surface>(&mut self, surface: &mut S) -> Option<Removal> {
        let index = self.cursor_index();
        if index == 0 {
            return None;
        }
        let candidate = &self.entries[index - 1];
        if candidate.kind == EntryKind::TagMarker && self.has_children(candidate.handle) {
            return None;
        }
        let entry = self.entries.remove(index - 1);
        let detach_error = surface.remove_child(entry.container, entry.handle).err();
        let container_emptied = entry.container != self.wrapper
            && self.contains_handle(entry.container)
            && !self.has_children(entry.container);
        Some(Removal {
            entry,
            detach_error,
            container_emptied,
        })
    }

    /// Immediate bulk removal of up to `amount` characters before the cursor
    /// (`0` removes all). Entries after the cursor are untouched.
    pub fn clear_from_cursor<S: Surface>(
        &mut self,
        surface: &mut S,
        amount: usize,
        on_removed: &mut dyn FnMut(&Entry),
    ) -> ClearOutcome {
        let plan = self.plan_bulk_clear(self.cursor_index(), amount);
        self.execute_plan(surface, plan, on_removed)
    }

    /// Immediate bulk removal counted from the absolute end of content,
    /// independent of the cursor position. The cursor itself is skipped.
    pub fn clear_from_end<S: Surface>(
        &mut self,
        surface: &mut S,
        amount: usize,
        on_removed: &mut dyn FnMut(&Entry),
    ) -> ClearOutcome {
        let plan = self.plan_bulk_clear(self.entries.len(), amount);
        self.execute_plan(surface, plan, on_removed)
    }

    /// Tail-first walk over `entries[..limit]`: text entries count toward
    /// `amount`, tag markers are removed uncounted once emptied, markers
    /// still holding children are kept.
    fn plan_bulk_clear(&self, limit: usize, amount: usize) -> Vec<usize> {
        let mut region: Vec<usize> = (0..limit)
            .filter(|&i| self.entries[i].kind != EntryKind::Cursor)
            .collect();
        let text_count = region
            .iter()
            .filter(|&&i| self.entries[i].kind == EntryKind::Text)
            .count();
        let target = if amount == 0 || amount > text_count {
            text_count
        } else {
            amount
        };

        let mut planned: Vec<usize> = Vec::new();
        let mut removed = 0;
        while removed < target {
            let Some(i) = region.pop() else { break };
            if planned.contains(&i) {
                continue;
            }
            let entry = &self.entries[i];
            match entry.kind {
                EntryKind::Cursor => {}
                EntryKind::TagMarker => {
                    if self.marker_keeps_children(entry.handle, &planned) {
                        continue;
                    }
                    planned.push(i);
                }
                EntryKind::Text => {
                    planned.push(i);
                    removed += 1;
                    let mut container = entry.container;
                    while container != self.wrapper {
                        if self.marker_keeps_children(container, &planned) {
                            break;
                        }
                        let Some(j) = self
                            .entries
                            .iter()
                            .position(|owner| owner.handle == container)
                        else {
                            break;
                        };
                        if planned.contains(&j) {
                            break;
                        }
                        planned.push(j);
                        container = self.entries[j].container;
                    }
                }
            }
        }
        planned
    }

    fn marker_keeps_children(&self, handle: NodeHandle, planned: &[usize]) -> bool {
        self.entries.iter().enumerate().any(|(j, entry)| {
            entry.kind != EntryKind::Cursor && entry.container == handle && !planned.contains(&j)
        })
    }

    fn execute_plan<S: Surface>(
        &mut self,
        surface: &mut S,
        planned: Vec<usize>,
        on_removed: &mut dyn FnMut(&Entry),
    ) -> ClearOutcome {
        let mut outcome = ClearOutcome::default();
        for &i in &planned {
            let entry = &self.entries[i];
            if let Err(err) = surface.remove_child(entry.container, entry.handle) {
                outcome.errors.push(err);
            }
            if entry.kind == EntryKind::Text {
                outcome.removed_text += 1;
                on_removed(entry);
            }
        }
        let mut indices = planned;
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for i in indices {
            self.entries.remove(i);
        }
        outcome
    }

    /// Relocate the cursor so that `position` text entries precede it. Tag
    /// markers are skipped when counting. Positions beyond the content place
    /// the cursor at the end; surface move failures fall back to the nearest
    /// valid neighbor.
    pub fn move_cursor<S: Surface>(
        &mut self,
        surface: &mut S,
        position: usize,
    ) -> Option<SurfaceError> {
        let cursor_at = self.cursor_index();
        let order: Vec<usize> = (0..self.entries.len())
            .filter(|&i| i != cursor_at)
            .collect();

        let mut texts = 0;
        let mut target: Option<usize> = None;
        for &i in &order {
            if texts == position {
                target = Some(i);
                break;
            }
            if self.entries[i].kind == EntryKind::Text {
                texts += 1;
            }
        }

        let mut error = None;
        match target {
            Some(i) => {
                let reference = self.entries[i].handle;
                if let Err(first) = surface.move_before(reference, self.cursor) {
                    let predecessor = order
                        .iter()
                        .take_while(|&&j| j != i)
                        .last()
                        .map(|&j| self.entries[j].handle);
                    match predecessor {
                        Some(prev) => {
                            if let Err(second) = surface.move_after(prev, self.cursor) {
                                error = Some(second);
                            }
                        }
                        None => error = Some(first),
                    }
                }
            }
            None => {
                if let Some(&last) = order.last() {
                    if let Err(err) = surface.move_after(self.entries[last].handle, self.cursor) {
                        error = Some(err);
                    }
                }
            }
        }

        let cursor_entry = self.entries.remove(cursor_at);
        match target {
            Some(i) => {
                let adjusted = if i > cursor_at { i - 1 } else { i };
                self.entries.insert(adjusted, cursor_entry);
            }
            None => self.entries.push(cursor_entry),
        }
        error
    }
}
