//! crates/datum_core/src/markup.rs
//!
//! Turns the HTML fragments the book API puts in descriptions into plain text.

use regex::{Captures, Regex};
use std::sync::OnceLock;

struct Patterns {
    script: Regex,
    style: Regex,
    breaks: Regex,
    tags: Regex,
    entities: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        script: Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script pattern"),
        style: Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid style pattern"),
        breaks: Regex::new(r"(?i)<br\s*/?>|</?(p|div|li|ul|ol|h[1-6]|tr|blockquote)\b[^>]*>")
            .expect("valid break pattern"),
        tags: Regex::new(r"<[^>]*>").expect("valid tag pattern"),
        entities: Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);")
            .expect("valid entity pattern"),
        whitespace: Regex::new(r"\s+").expect("valid whitespace pattern"),
    })
}

/// Extracts the readable text of an HTML fragment.
///
/// Script and style bodies are dropped, line breaks and block boundaries become
/// a single space, entities are decoded and whitespace runs are collapsed.
/// Escaped markup (`&lt;b&gt;`) only becomes a tag once decoded, so passes are
/// repeated until the text stops changing. The result is a fixed point:
/// stripping it again returns it unchanged.
pub fn strip_html(html: &str) -> String {
    let mut text = strip_once(html);
    loop {
        let next = strip_once(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

/// One pass over the text. A pass never makes the text longer and only keeps
/// the same length when it swaps whitespace characters, so repeating it ends.
fn strip_once(html: &str) -> String {
    let p = patterns();
    let text = p.script.replace_all(html, "");
    let text = p.style.replace_all(&text, "");
    let text = p.breaks.replace_all(&text, " ");
    let text = p.tags.replace_all(&text, "");
    let text = p.entities.replace_all(&text, |caps: &Captures| decode_entity(caps));
    p.whitespace.replace_all(&text, " ").trim().to_string()
}

fn decode_entity(caps: &Captures) -> String {
    let body = &caps[1];
    let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match body {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "mdash" => Some('\u{2014}'),
            "ndash" => Some('\u{2013}'),
            "hellip" => Some('\u{2026}'),
            "rsquo" => Some('\u{2019}'),
            "lsquo" => Some('\u{2018}'),
            "rdquo" => Some('\u{201D}'),
            "ldquo" => Some('\u{201C}'),
            _ => None,
        }
    };

    match decoded {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}
