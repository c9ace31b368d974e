//! Candidate search over raw model text.
//!
//! Passes, cheapest first: the whole string, fenced code blocks, embedded values found by a
//! streaming prefix scan from each opening bracket, closing a cut-off array, and finally JSON5 on
//! progressively right-truncated substrings.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use serde::Serialize;
use serde_json::Value;

/// Opening brackets tried per pass. Each attempt is at most linear in the input.
const MAX_STARTS: usize = 256;
const MAX_LENIENT_STARTS: usize = 16;
const MAX_LENIENT_ENDS: usize = 256;
const MAX_REPAIR_ENDS: usize = 256;
/// Matches serde_json's recursion limit; deeper candidates are not handed to the JSON5 parser.
const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryPath {
    /// The trimmed text was the value.
    Direct,
    /// A fenced code block held the value.
    Fenced,
    /// The value was embedded in surrounding prose.
    Embedded,
    /// The array was cut off and closed after its last complete element.
    Repaired,
    /// Only the JSON5 parser accepted it.
    Lenient,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanOptions {
    pub opener: char,
    pub lenient: bool,
    pub repair_arrays: bool,
}

impl ScanOptions {
    fn closer(&self) -> char {
        if self.opener == '[' { ']' } else { '}' }
    }
}

pub(crate) fn recover<T>(
    raw: &str,
    opts: ScanOptions,
    mut accept: impl FnMut(Value) -> Option<T>,
) -> Option<(T, RecoveryPath)> {
    let trimmed = raw.trim();

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        if let Some(t) = accept(v) {
            return Some((t, RecoveryPath::Direct));
        }
    }

    for block in fenced_blocks(raw) {
        if let Ok(v) = serde_json::from_str::<Value>(block.trim()) {
            if let Some(t) = accept(v) {
                return Some((t, RecoveryPath::Fenced));
            }
        }
    }

    if let Some(t) = embedded(raw, opts.opener, &mut accept) {
        return Some((t, RecoveryPath::Embedded));
    }

    if opts.repair_arrays && opts.opener == '[' {
        if let Some(t) = close_cut_array(raw, &mut accept) {
            return Some((t, RecoveryPath::Repaired));
        }
    }

    if opts.lenient {
        if let Some(t) = lenient(raw, opts, &mut accept) {
            return Some((t, RecoveryPath::Lenient));
        }
    }

    None
}

/// Code blocks in markdown order, `json`-tagged fences first.
fn fenced_blocks(raw: &str) -> Vec<String> {
    let mut blocks: Vec<(bool, String)> = Vec::new();
    let mut current: Option<(bool, String)> = None;
    for event in Parser::new(raw) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let is_json = match &kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .is_some_and(|lang| {
                            lang.eq_ignore_ascii_case("json") || lang.eq_ignore_ascii_case("json5")
                        }),
                    CodeBlockKind::Indented => false,
                };
                current = Some((is_json, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }
    blocks.sort_by_key(|(is_json, _)| !*is_json);
    blocks.into_iter().map(|(_, text)| text).collect()
}

/// From each opening bracket, parses exactly one JSON value off the front of the remainder.
///
/// A bracketed value is self-delimiting, so the longest parseable prefix that progressive
/// right-truncation would find is exactly this value; the stream parser reports it in one pass.
fn embedded<T>(raw: &str, opener: char, accept: &mut impl FnMut(Value) -> Option<T>) -> Option<T> {
    for (start, _) in raw.match_indices(opener).take(MAX_STARTS) {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        if let Some(Ok(v)) = stream.next() {
            if let Some(t) = accept(v) {
                return Some(t);
            }
        }
    }
    None
}

/// Handles output that stopped mid-array: `[{..}, {..}, {"q": "thr` becomes `[{..}, {..}]`.
fn close_cut_array<T>(raw: &str, accept: &mut impl FnMut(Value) -> Option<T>) -> Option<T> {
    let (start, _) = raw.match_indices('[').next()?;
    let tail = &raw[start..];
    for (end, _) in tail.rmatch_indices('}').take(MAX_REPAIR_ENDS) {
        let candidate = format!("{}]", &tail[..=end]);
        if let Ok(v) = serde_json::from_str::<Value>(&candidate) {
            if let Some(t) = accept(v) {
                return Some(t);
            }
        }
    }
    None
}

/// JSON5 over `raw[start..=end]`, shrinking `end` from the right one closing bracket at a time.
fn lenient<T>(
    raw: &str,
    opts: ScanOptions,
    accept: &mut impl FnMut(Value) -> Option<T>,
) -> Option<T> {
    let closer = opts.closer();
    for (start, _) in raw.match_indices(opts.opener).take(MAX_LENIENT_STARTS) {
        let tail = &raw[start..];
        for (end, _) in tail.rmatch_indices(closer).take(MAX_LENIENT_ENDS) {
            let candidate = &tail[..=end];
            if nesting_depth(candidate) > MAX_NESTING {
                continue;
            }
            let Ok(v) = json5_value(candidate) else {
                continue;
            };
            if let Some(t) = accept(v) {
                return Some(t);
            }
        }
    }
    None
}

fn json5_value(text: &str) -> Result<Value, json5::Error> {
    json5::from_str::<Value>(text)
}

/// Bracket depth, ignoring brackets inside quoted strings.
fn nesting_depth(text: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' | '{' => {
                depth += 1;
                max = max.max(depth);
            }
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Cuts `raw` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn clip(raw: &str, max_bytes: usize) -> &str {
    if raw.len() <= max_bytes {
        return raw;
    }
    let mut end = max_bytes;
    while end > 0 && !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}
