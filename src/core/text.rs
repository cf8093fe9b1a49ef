//! Character splitting and markup detection.

use unicode_segmentation::UnicodeSegmentation;

/// Default splitter: one unit per extended grapheme cluster, so emoji and
/// combining sequences type as a single keystroke.
pub fn split_graphemes(text: &str) -> Vec<String> {
    UnicodeSegmentation::graphemes(text, true)
        .map(str::to_string)
        .collect()
}

/// Whether `text` contains tag syntax worth handing to the markup parser.
///
/// A tag is `<`, an optional `/`, an ASCII-alphabetic name head, and a later
/// `>`. Plain comparisons like `a < b` are not tags.
pub fn contains_tag(text: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find('<') {
        let after = &rest[pos + 1..];
        let head = after.strip_prefix('/').unwrap_or(after);
        let named = head.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if named && after.contains('>') {
            return true;
        }
        rest = after;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{contains_tag, split_graphemes};

    #[test]
    fn graphemes_keep_clusters_together() {
        assert_eq!(split_graphemes("hi"), vec!["h", "i"]);
        assert_eq!(split_graphemes("a🇺🇸b"), vec!["a", "🇺🇸", "b"]);
        assert!(split_graphemes("").is_empty());
    }

    #[test]
    fn detects_tags() {
        assert!(contains_tag("<b>hi</b>"));
        assert!(contains_tag("before <em>x</em> after"));
        assert!(contains_tag("</closing>"));
    }

    #[test]
    fn ignores_non_tag_angle_brackets() {
        assert!(!contains_tag("a < b"));
        assert!(!contains_tag("1<2"));
        assert!(!contains_tag("dangling <b"));
        assert!(!contains_tag("no brackets"));
    }
}
