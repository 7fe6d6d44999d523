//! Inline-markup validation for translated text
//!
//! Translations may carry a small set of inline tags; anything else is a
//! markup error. Tag scanning is regex-based: this is translator text, not
//! a document, so a full HTML parser would be the wrong tool.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// What went wrong with one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupErrorKind {
    /// Tag name outside the allow-list
    InvalidTag,
    /// Known tag carrying an attribute it may not have
    InvalidAttribute { attribute: String },
}

/// One markup error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupError {
    pub tag: String,
    pub kind: MarkupErrorKind,
}

impl std::fmt::Display for MarkupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            MarkupErrorKind::InvalidTag => write!(f, "invalid tag <{}>", self.tag),
            MarkupErrorKind::InvalidAttribute { attribute } => {
                write!(f, "invalid attribute '{}' on <{}>", attribute, self.tag)
            }
        }
    }
}

impl MarkupError {
    pub fn is_invalid_tag(&self) -> bool {
        self.kind == MarkupErrorKind::InvalidTag
    }
}

/// Allowed inline tags and the attributes each may carry
static ALLOWED_TAGS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut tags: HashMap<&str, &[&str]> = HashMap::new();
    for name in ["b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "pre"] {
        tags.insert(name, &[]);
    }
    tags.insert("a", &["href"]);
    tags.insert("code", &["class"]);
    tags
});

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)([^<>]*?)/?>").expect("tag regex"));

static ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_][a-zA-Z0-9_-]*)\s*=").expect("attr regex"));

/// Validate every tag in `text` against the allow-list
pub fn validate(text: &str) -> Vec<MarkupError> {
    let mut errors = Vec::new();
    for captures in TAG_RE.captures_iter(text) {
        let closing = !captures[1].is_empty();
        let name = captures[2].to_ascii_lowercase();
        let allowed = match ALLOWED_TAGS.get(name.as_str()) {
            Some(allowed) => *allowed,
            None => {
                errors.push(MarkupError {
                    tag: name,
                    kind: MarkupErrorKind::InvalidTag,
                });
                continue;
            }
        };
        if closing {
            continue;
        }
        for attr in ATTR_RE.captures_iter(&captures[3]) {
            let attribute = attr[1].to_ascii_lowercase();
            if !allowed.contains(&attribute.as_str()) {
                errors.push(MarkupError {
                    tag: name.clone(),
                    kind: MarkupErrorKind::InvalidAttribute { attribute },
                });
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_tags_pass() {
        assert!(validate("<b>bold</b> and <i>italic</i>").is_empty());
        assert!(validate("<a href=\"https://example.org\">link</a>").is_empty());
        assert!(validate("<code class=\"language-rust\">x</code>").is_empty());
        assert!(validate("plain text, no tags").is_empty());
    }

    #[test]
    fn test_unknown_tag_flagged() {
        let errors = validate("<blink>hi</blink>");
        assert_eq!(errors.len(), 2); // opening and closing
        assert!(errors[0].is_invalid_tag());
        assert_eq!(errors[0].tag, "blink");
    }

    #[test]
    fn test_disallowed_attribute_flagged() {
        let errors = validate("<b onclick=\"evil()\">x</b>");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            MarkupErrorKind::InvalidAttribute {
                attribute: "onclick".to_string()
            }
        );
    }

    #[test]
    fn test_href_only_on_anchor() {
        let errors = validate("<i href=\"x\">y</i>");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].kind,
            MarkupErrorKind::InvalidAttribute { .. }
        ));
    }

    #[test]
    fn test_case_insensitive_names() {
        assert!(validate("<B>ok</B>").is_empty());
        let errors = validate("<A HREF=\"x\">ok</A>");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_placeholder_braces_are_not_tags() {
        assert!(validate("got {1} items for {2}").is_empty());
    }
}
