//! Markup flattening.
//!
//! Turns a string (possibly containing tag syntax) into primitive actions or
//! paste descriptors. Tags always come out before the characters they
//! contain, so the ledger sees containers become empty only after all of
//! their children are gone.

use crate::core::action::{Action, ContainerId, ContainerIdGen};
use crate::core::text::contains_tag;
use crate::markup::{FragmentNode, MarkupParser};

/// One node of a non-animated paste, executed in a single tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteNode {
    Tag {
        id: ContainerId,
        tag: String,
        parent: Option<ContainerId>,
    },
    Text {
        character: String,
        parent: Option<ContainerId>,
    },
}

/// Expand `text` into typing actions. Plain strings become one
/// `TypeCharacter` per split unit; markup is parsed and walked recursively,
/// each element yielding an `AddTagMarker` followed by its flattened
/// children bound to the new container id.
pub fn flatten_typed(
    parser: &dyn MarkupParser,
    split: &dyn Fn(&str) -> Vec<String>,
    text: &str,
    target: Option<ContainerId>,
    ids: &mut ContainerIdGen,
) -> Vec<Action> {
    let mut actions = Vec::new();
    if !contains_tag(text) {
        push_characters(&mut actions, split, text, target);
        return actions;
    }
    let nodes = parser.parse_fragment(text);
    walk_typed(&mut actions, split, &nodes, target, ids);
    actions
}

fn walk_typed(
    actions: &mut Vec<Action>,
    split: &dyn Fn(&str) -> Vec<String>,
    nodes: &[FragmentNode],
    target: Option<ContainerId>,
    ids: &mut ContainerIdGen,
) {
    for node in nodes {
        match node {
            FragmentNode::Text(text) => push_characters(actions, split, text, target),
            FragmentNode::Element { tag, children } => {
                let id = ids.next_id();
                actions.push(Action::AddTagMarker {
                    id,
                    tag: tag.clone(),
                    parent: target,
                });
                walk_typed(actions, split, children, Some(id), ids);
            }
        }
    }
}

fn push_characters(
    actions: &mut Vec<Action>,
    split: &dyn Fn(&str) -> Vec<String>,
    text: &str,
    target: Option<ContainerId>,
) {
    for character in split(text) {
        actions.push(Action::TypeCharacter {
            character,
            container: target,
        });
    }
}

/// Expand `text` into a flat paste descriptor list. Same shape rules as
/// [`flatten_typed`], but returned as data for single-tick insertion.
pub fn flatten_paste(
    parser: &dyn MarkupParser,
    split: &dyn Fn(&str) -> Vec<String>,
    text: &str,
    target: Option<ContainerId>,
    ids: &mut ContainerIdGen,
) -> Vec<PasteNode> {
    let mut nodes_out = Vec::new();
    if !contains_tag(text) {
        for character in split(text) {
            nodes_out.push(PasteNode::Text {
                character,
                parent: target,
            });
        }
        return nodes_out;
    }
    let nodes = parser.parse_fragment(text);
    walk_paste(&mut nodes_out, split, &nodes, target, ids);
    nodes_out
}

fn walk_paste(
    out: &mut Vec<PasteNode>,
    split: &dyn Fn(&str) -> Vec<String>,
    nodes: &[FragmentNode],
    target: Option<ContainerId>,
    ids: &mut ContainerIdGen,
) {
    for node in nodes {
        match node {
            FragmentNode::Text(text) => {
                for character in split(text) {
                    out.push(PasteNode::Text {
                        character,
                        parent: target,
                    });
                }
            }
            FragmentNode::Element { tag, children } => {
                let id = ids.next_id();
                out.push(PasteNode::Tag {
                    id,
                    tag: tag.clone(),
                    parent: target,
                });
                walk_paste(out, split, children, Some(id), ids);
            }
        }
    }
}
