//! Markup parsing boundary.
//!
//! The engine never parses markup itself; it consumes a [`MarkupParser`] and
//! recursively flattens the resulting tree. [`TagSoupParser`] is the bundled
//! default: a forgiving fragment scanner that handles nesting, self-closing
//! tags, and stray brackets without ever failing.

/// One node of a parsed markup fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Text(String),
    Element {
        /// Lowercased tag name, forwarded to the surface as a class hint.
        tag: String,
        children: Vec<FragmentNode>,
    },
}

/// Parse a markup string into an ordered forest of fragment nodes.
pub trait MarkupParser {
    fn parse_fragment(&self, markup: &str) -> Vec<FragmentNode>;
}

/// Default permissive parser.
///
/// - attributes are accepted and discarded
/// - `<x/>` is an empty element
/// - a close tag with no matching open tag is dropped
/// - tags left open at the end of input are closed implicitly
/// - `<` that does not start a tag is literal text
#[derive(Debug, Default, Clone, Copy)]
pub struct TagSoupParser;

enum TagToken {
    Open { name: String, self_closing: bool },
    Close { name: String },
}

/// Scan a tag at the start of `input` (which begins with `<`). Returns the
/// token and the number of bytes consumed.
fn scan_tag(input: &str) -> Option<(TagToken, usize)> {
    let rest = &input[1..];
    let (closing, body, prefix_len) = match rest.strip_prefix('/') {
        Some(body) => (true, body, 2),
        None => (false, rest, 1),
    };
    if !body.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();
    let tail = &body[name_end..];
    let gt = tail.find('>')?;
    let self_closing = tail[..gt].trim_end().ends_with('/');
    let consumed = prefix_len + name_end + gt + 1;
    let token = if closing {
        TagToken::Close { name }
    } else {
        TagToken::Open { name, self_closing }
    };
    Some((token, consumed))
}

impl MarkupParser for TagSoupParser {
    fn parse_fragment(&self, markup: &str) -> Vec<FragmentNode> {
        let mut frames: Vec<(String, Vec<FragmentNode>)> = Vec::new();
        let mut current: Vec<FragmentNode> = Vec::new();
        let mut text = String::new();
        let mut index = 0;

        let flush = |text: &mut String, current: &mut Vec<FragmentNode>| {
            if !text.is_empty() {
                current.push(FragmentNode::Text(std::mem::take(text)));
            }
        };

        while index < markup.len() {
            let rest = &markup[index..];
            if rest.starts_with('<') {
                if let Some((token, consumed)) = scan_tag(rest) {
                    flush(&mut text, &mut current);
                    match token {
                        TagToken::Open { name, self_closing } => {
                            if self_closing {
                                current.push(FragmentNode::Element {
                                    tag: name,
                                    children: Vec::new(),
                                });
                            } else {
                                frames.push((name, std::mem::take(&mut current)));
                            }
                        }
                        TagToken::Close { name } => {
                            if frames.iter().any(|(tag, _)| *tag == name) {
                                // Implicitly close any inner unclosed tags.
                                while let Some((tag, parent)) = frames.pop() {
                                    let element = FragmentNode::Element {
                                        tag: tag.clone(),
                                        children: std::mem::take(&mut current),
                                    };
                                    current = parent;
                                    current.push(element);
                                    if tag == name {
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    index += consumed;
                    continue;
                }
            }
            let ch = rest.chars().next().unwrap_or('\0');
            text.push(ch);
            index += ch.len_utf8();
        }

        flush(&mut text, &mut current);
        while let Some((tag, parent)) = frames.pop() {
            let element = FragmentNode::Element {
                tag,
                children: std::mem::take(&mut current),
            };
            current = parent;
            current.push(element);
        }
        current
    }
}
