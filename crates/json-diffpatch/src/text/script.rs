//! Hunk-based edit scripts in the diff-match-patch patch text format.
//!
//! ```text
//! @@ -1,6 +1,7 @@
//!  ab
//! -c
//! +xy
//!  def
//! ```
//!
//! A hunk header carries the 1-based start and length of the hunk on each
//! side. Start positions follow diff-match-patch: the source start of a hunk
//! is measured in the text with all preceding hunks already applied, so both
//! starts coincide. Line bodies are URI-encoded with spaces left literal.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use super::myers::{Edit, EditOp};
use crate::error::TextPatchError;

/// Characters of context kept around each change.
const MARGIN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
    pub edits: Vec<Edit>,
}

impl Hunk {
    fn new(start1: usize, start2: usize) -> Self {
        Self {
            start1,
            start2,
            length1: 0,
            length2: 0,
            edits: Vec::new(),
        }
    }

    fn push(&mut self, op: EditOp, text: String) {
        let len = text.chars().count();
        match op {
            EditOp::Equal => {
                self.length1 += len;
                self.length2 += len;
            }
            EditOp::Delete => self.length1 += len,
            EditOp::Insert => self.length2 += len,
        }
        self.edits.push((op, text));
    }

    /// Text this hunk expects before it is applied.
    fn source(&self) -> Vec<char> {
        self.side(EditOp::Insert)
    }

    /// Text this hunk leaves behind.
    fn target(&self) -> Vec<char> {
        self.side(EditOp::Delete)
    }

    fn side(&self, skip: EditOp) -> Vec<char> {
        self.edits
            .iter()
            .filter(|(op, _)| *op != skip)
            .flat_map(|(_, text)| text.chars())
            .collect()
    }

    fn reversed(&self) -> Hunk {
        let edits = self
            .edits
            .iter()
            .map(|(op, text)| {
                let op = match op {
                    EditOp::Delete => EditOp::Insert,
                    EditOp::Insert => EditOp::Delete,
                    EditOp::Equal => EditOp::Equal,
                };
                (op, text.clone())
            })
            .collect();
        Hunk {
            start1: self.start2,
            start2: self.start1,
            length1: self.length2,
            length2: self.length1,
            edits,
        }
    }
}

/// Groups an edit list into hunks with surrounding context.
pub fn make_hunks(edits: &[Edit]) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<Hunk> = None;
    // Positions in the text produced so far; both sides agree on the start of
    // every hunk because earlier hunks count as applied.
    let mut pos1 = 0usize;
    let mut pos2 = 0usize;

    for (index, (op, text)) in edits.iter().enumerate() {
        let len = text.chars().count();
        match op {
            EditOp::Equal => {
                if let Some(hunk) = current.as_mut() {
                    let last = index + 1 == edits.len();
                    if len <= 2 * MARGIN && !last {
                        hunk.push(EditOp::Equal, text.clone());
                    } else {
                        hunk.push(EditOp::Equal, text.chars().take(MARGIN).collect());
                        hunks.extend(current.take());
                        pos1 = pos2;
                    }
                }
                pos1 += len;
                pos2 += len;
            }
            EditOp::Delete | EditOp::Insert => {
                let hunk = current.get_or_insert_with(|| {
                    let context = match index.checked_sub(1).map(|prev| &edits[prev]) {
                        Some((EditOp::Equal, prev)) => {
                            let count = prev.chars().count();
                            prev.chars().skip(count.saturating_sub(MARGIN)).collect()
                        }
                        _ => String::new(),
                    };
                    let context_len = context.chars().count();
                    let mut hunk = Hunk::new(pos1 - context_len, pos2 - context_len);
                    if !context.is_empty() {
                        hunk.push(EditOp::Equal, context);
                    }
                    hunk
                });
                hunk.push(*op, text.clone());
                if *op == EditOp::Delete {
                    pos1 += len;
                } else {
                    pos2 += len;
                }
            }
        }
    }
    hunks.extend(current);
    hunks
}

fn coords(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{len}", start + 1),
    }
}

pub fn to_text(hunks: &[Hunk]) -> String {
    let mut out = String::new();
    for hunk in hunks {
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            coords(hunk.start1, hunk.length1),
            coords(hunk.start2, hunk.length2)
        );
        for (op, text) in &hunk.edits {
            out.push(match op {
                EditOp::Equal => ' ',
                EditOp::Delete => '-',
                EditOp::Insert => '+',
            });
            encode_into(&mut out, text);
            out.push('\n');
        }
    }
    out
}

fn header_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@@ -(\d+),?(\d*) \+(\d+),?(\d*) @@$").ok())
        .as_ref()
}

fn parse_range(line: &str, start: &str, len: &str) -> Result<(usize, usize), TextPatchError> {
    let invalid = || TextPatchError::InvalidHeader(line.to_string());
    let start: usize = start.parse().map_err(|_| invalid())?;
    let (start, len) = match len {
        "" => (start.checked_sub(1).ok_or_else(invalid)?, 1),
        "0" => (start, 0),
        len => {
            let len: usize = len.parse().map_err(|_| invalid())?;
            (start.checked_sub(1).ok_or_else(invalid)?, len)
        }
    };
    // Ranges must stay addressable in signed coordinates.
    start
        .checked_add(len)
        .and_then(|end| i64::try_from(end).ok())
        .ok_or_else(invalid)?;
    Ok((start, len))
}

pub fn from_text(script: &str) -> Result<Vec<Hunk>, TextPatchError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    for line in script.split('\n') {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('@') {
            let invalid = || TextPatchError::InvalidHeader(line.to_string());
            let caps = header_regex()
                .and_then(|re| re.captures(line))
                .ok_or_else(invalid)?;
            let (start1, length1) = parse_range(line, &caps[1], &caps[2])?;
            let (start2, length2) = parse_range(line, &caps[3], &caps[4])?;
            let mut hunk = Hunk::new(start1, start2);
            hunk.length1 = length1;
            hunk.length2 = length2;
            hunks.push(hunk);
            continue;
        }
        let Some(hunk) = hunks.last_mut() else {
            return Err(TextPatchError::InvalidLine(line.to_string()));
        };
        let mut chars = line.chars();
        let op = match chars.next() {
            Some(' ') => EditOp::Equal,
            Some('-') => EditOp::Delete,
            Some('+') => EditOp::Insert,
            _ => return Err(TextPatchError::InvalidLine(line.to_string())),
        };
        hunk.edits.push((op, decode(chars.as_str())?));
    }
    for hunk in &hunks {
        let source = hunk.source().len();
        let target = hunk.target().len();
        if source != hunk.length1 || target != hunk.length2 {
            return Err(TextPatchError::InvalidHeader(format!(
                "@@ -{} +{} @@",
                coords(hunk.start1, hunk.length1),
                coords(hunk.start2, hunk.length2)
            )));
        }
    }
    Ok(hunks)
}

/// Applies hunks in order. `forward` selects source/target roles.
pub fn apply(text: &str, hunks: &[Hunk], forward: bool) -> Result<String, TextPatchError> {
    let mut out: Vec<char> = text.chars().collect();
    let mut cursor = 0usize;
    let mut growth = 0i64;

    for (index, hunk) in hunks.iter().enumerate() {
        let (start, from, to) = if forward {
            (hunk.start1, hunk.source(), hunk.target())
        } else {
            (hunk.start2, hunk.target(), hunk.source())
        };
        // Forward starts are already in patched coordinates; reverse starts
        // still count the growth of the hunks undone so far.
        let start = i64::try_from(start).ok();
        let shifted = start.and_then(|start| start.checked_add(growth));
        let candidates = if forward {
            [start, shifted]
        } else {
            [shifted, start]
        };
        let at = locate(&out, &from, candidates, cursor)
            .ok_or(TextPatchError::Mismatch { hunk: index })?;
        out.splice(at..at + from.len(), to.iter().copied());
        cursor = at + to.len();
        growth = growth.saturating_add(signed(to.len()) - signed(from.len()));
    }
    Ok(out.into_iter().collect())
}

fn locate(
    text: &[char],
    needle: &[char],
    candidates: [Option<i64>; 2],
    cursor: usize,
) -> Option<usize> {
    let fits = |at: usize| {
        at >= cursor
            && at
                .checked_add(needle.len())
                .and_then(|end| text.get(at..end))
                == Some(needle)
    };
    if let Some(at) = candidates
        .into_iter()
        .flatten()
        .filter_map(|at| usize::try_from(at).ok())
        .find(|&at| fits(at))
    {
        return Some(at);
    }
    if needle.is_empty() {
        return None;
    }
    text.get(cursor..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| cursor + offset)
}

/// Hunks that undo `hunks`, positioned for the reverse direction.
pub fn reverse(hunks: &[Hunk]) -> Vec<Hunk> {
    let mut growth = 0i64;
    hunks
        .iter()
        .map(|hunk| {
            let mut reversed = hunk.reversed();
            reversed.start1 = shift(hunk.start2, -growth);
            reversed.start2 = shift(hunk.start1, -growth);
            growth = growth.saturating_add(signed(hunk.length2) - signed(hunk.length1));
            reversed
        })
        .collect()
}

fn signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn shift(start: usize, by: i64) -> usize {
    i64::try_from(start)
        .ok()
        .and_then(|start| start.checked_add(by))
        .and_then(|at| usize::try_from(at).ok())
        .unwrap_or(0)
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b" -_.!~*'();,/?:@&=+$#".contains(&byte)
}

fn encode_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_ascii() && is_unreserved(ch as u8) {
            out.push(ch);
            continue;
        }
        let mut buf = [0u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            let _ = write!(out, "%{byte:02X}");
        }
    }
}

fn decode(text: &str) -> Result<String, TextPatchError> {
    let invalid = || TextPatchError::InvalidEncoding(text.to_string());
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3).ok_or_else(invalid)?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| invalid())
}
