//! In-place rewriting of playlist source files.
//!
//! Before the first modification of a file a `.bak` sibling is written with
//! the pristine content; an existing `.bak` is never overwritten, so it
//! always holds the state before the first fix ever applied.

use crate::library_store::PlaylistKind;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `.bak` sibling path for a playlist file.
pub fn backup_path(source_file: &str) -> PathBuf {
    let mut path = source_file.to_string();
    path.push_str(".bak");
    PathBuf::from(path)
}

/// Write the backup if none exists yet. Returns whether a new backup was
/// written.
pub fn ensure_backup(source_file: &str) -> Result<bool> {
    let backup = backup_path(source_file);
    if backup.exists() {
        return Ok(false);
    }
    let content = fs::read(source_file)
        .with_context(|| format!("Failed to read playlist {:?} for backup", source_file))?;
    fs::write(&backup, content)
        .with_context(|| format!("Failed to write backup {:?}", backup))?;
    Ok(true)
}

/// Replace `old_path` with `new_path` in a playlist file of the given kind.
/// Returns the number of entries rewritten; 0 means the file no longer
/// references `old_path`.
pub fn rewrite_path(
    source_file: &str,
    kind: PlaylistKind,
    old_path: &str,
    new_path: &str,
) -> Result<usize> {
    let content = fs::read_to_string(source_file)
        .with_context(|| format!("Failed to read playlist {:?}", source_file))?;

    let (rewritten, replaced) = match kind {
        PlaylistKind::M3u => rewrite_m3u(&content, old_path, new_path),
        PlaylistKind::VdjFolder => rewrite_vdjfolder(&content, old_path, new_path),
    };

    if replaced > 0 {
        fs::write(source_file, rewritten)
            .with_context(|| format!("Failed to write playlist {:?}", source_file))?;
    }
    Ok(replaced)
}

/// Exact-line replacement; lines starting with `#` are directives and are
/// never rewritten. The original line terminator style is preserved.
fn rewrite_m3u(content: &str, old_path: &str, new_path: &str) -> (String, usize) {
    let mut replaced = 0;
    let mut out = String::with_capacity(content.len());

    for segment in content.split_inclusive('\n') {
        let (line, terminator) = match segment.strip_suffix("\r\n") {
            Some(line) => (line, "\r\n"),
            None => match segment.strip_suffix('\n') {
                Some(line) => (line, "\n"),
                None => (segment, ""),
            },
        };
        if !line.starts_with('#') && line == old_path {
            out.push_str(new_path);
            replaced += 1;
        } else {
            out.push_str(line);
        }
        out.push_str(terminator);
    }

    (out, replaced)
}

/// Replace `path="<old>"` attribute values on `<song>` elements. The stored
/// track path is XML-unescaped, so the needle is escaped before comparison
/// and the replacement is escaped on the way in.
fn rewrite_vdjfolder(content: &str, old_path: &str, new_path: &str) -> (String, usize) {
    let needle = format!("path=\"{}\"", escape_xml_attribute(old_path));
    let replacement = format!("path=\"{}\"", escape_xml_attribute(new_path));
    let replaced = content.matches(&needle).count();
    (content.replace(&needle, &replacement), replaced)
}

fn escape_xml_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Unescape an XML attribute value read from a VDJFolder file.
pub fn unescape_xml_attribute(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
