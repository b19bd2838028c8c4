//! Filename normalization for cross-script comparison.
//!
//! Every comparison in the matching engine runs over the output of
//! [`normalize_file_name`]: extension stripped, NFKC-normalized,
//! script-folded to ASCII, lowercased, with whitespace collapsed. The
//! output alphabet is exactly `[a-z0-9 ]`, which makes the transform
//! idempotent by construction.

mod translit;

use any_ascii::any_ascii_char;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use translit::CHAR_EQUIVALENTS;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// A leading run of digits (track-number prefix) and the whitespace after it.
    static ref LEADING_DIGITS: Regex = Regex::new(r"^\d+\s*").unwrap();
}

/// Normalize a raw file name (with extension) into a comparable
/// ASCII-lowercase string.
///
/// Empty or extension-only input yields an empty string.
pub fn normalize_file_name(raw: &str) -> String {
    let stem = strip_extension(raw);

    let mut folded = String::with_capacity(stem.len());
    for c in stem.nfkc() {
        fold_char(c, &mut folded);
    }

    let lowered = folded.to_ascii_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The normalized stem of a path: its file name, normalized.
pub fn normalized_stem(path: &str) -> String {
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    normalize_file_name(&file_name)
}

/// The directory part of a path in comparable form (lowercased, trailing
/// separator trimmed). Used only for equality checks between a track's
/// original location and a candidate's location.
pub fn normalized_directory(path: &str) -> String {
    Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .trim_end_matches(['/', '\\'])
        .to_string()
}

/// Strip a leading run of digits (track-number prefix) from a normalized
/// query, e.g. `"01 artist song"` becomes `"artist song"`.
pub fn strip_leading_track_number(query: &str) -> &str {
    match LEADING_DIGITS.find(query) {
        Some(m) => &query[m.end()..],
        None => query,
    }
}

fn strip_extension(raw: &str) -> &str {
    match raw.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => raw,
    }
}

/// Fold one character to its ASCII equivalent: the static table first, then
/// NFKD decomposition with combining marks dropped, then `any_ascii` for the
/// long tail (Arabic, CJK phonetic approximations, Hangul jamo, ...).
fn fold_char(c: char, out: &mut String) {
    if c.is_ascii() {
        out.push(c);
        return;
    }
    if let Some(rep) = CHAR_EQUIVALENTS.get(&c) {
        out.push_str(rep);
        return;
    }
    for piece in c.nfkd() {
        if is_combining_mark(piece) {
            continue;
        }
        if piece.is_ascii() {
            out.push(piece);
        } else if let Some(rep) = CHAR_EQUIVALENTS.get(&piece) {
            out.push_str(rep);
        } else {
            out.push_str(any_ascii_char(piece));
        }
    }
}

fn is_combining_mark(c: char) -> bool {
    matches!(
        c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F
    )
}
