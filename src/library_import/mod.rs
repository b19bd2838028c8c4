//! Import plumbing around the matching engine: the music directory scanner
//! and the playlist parsers that produce track references.

use crate::fixes::unescape_xml_attribute;
use crate::library_store::{MusicFileRecord, PlaylistKind, TrackReference};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions treated as music files during a scan, lowercase.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "opus", "m4a", "aac", "wav", "aiff", "wma", "alac",
];

lazy_static! {
    /// `path="..."` attribute of a `<song>` element.
    static ref SONG_PATH_ATTR: Regex = Regex::new(r#"<song\s[^>]*?\bpath="([^"]*)""#).unwrap();
}

/// Walk `root` and build a record per audio file. Unreadable entries are
/// skipped with a warning; they never abort the scan.
pub fn scan_music_directory(root: &Path) -> Result<Vec<MusicFileRecord>> {
    let mut records = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("skipping unreadable entry under {:?}: {}", root, error);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_audio_extension(entry.path()) {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!("skipping {:?}: {}", entry.path(), error);
                continue;
            }
        };
        let modified_time = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        records.push(MusicFileRecord::from_path(
            &entry.path().to_string_lossy(),
            metadata.len() as i64,
            modified_time,
        ));
    }
    debug!("scanned {:?}: {} music files", root, records.len());
    Ok(records)
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Playlist kind from a file's extension, if recognized.
pub fn playlist_kind_of(path: &Path) -> Option<PlaylistKind> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("m3u") | Some("m3u8") => Some(PlaylistKind::M3u),
        Some("vdjfolder") => Some(PlaylistKind::VdjFolder),
        _ => None,
    }
}

/// Parse one playlist file into ordered track references. The format is
/// picked from the extension; unrecognized extensions are an error.
pub fn import_playlist(path: &Path) -> Result<Vec<TrackReference>> {
    let kind = playlist_kind_of(path)
        .with_context(|| format!("Not a recognized playlist format: {:?}", path))?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read playlist {:?}", path))?;
    let source_file = path.to_string_lossy();

    let tracks = match kind {
        PlaylistKind::M3u => parse_m3u(&content, &source_file),
        PlaylistKind::VdjFolder => parse_vdjfolder(&content, &source_file),
    };
    debug!("imported {:?}: {} tracks", path, tracks.len());
    Ok(tracks)
}

/// Newline-delimited absolute paths; `#` lines (including `#EXTVDJ`
/// metadata) are directives, not tracks.
fn parse_m3u(content: &str, source_file: &str) -> Vec<TrackReference> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(i, line)| {
            TrackReference::from_playlist_entry(
                line,
                PlaylistKind::M3u,
                source_file,
                (i + 1) as i64,
            )
        })
        .collect()
}

fn parse_vdjfolder(content: &str, source_file: &str) -> Vec<TrackReference> {
    SONG_PATH_ATTR
        .captures_iter(content)
        .enumerate()
        .map(|(i, captures)| {
            TrackReference::from_playlist_entry(
                &unescape_xml_attribute(&captures[1]),
                PlaylistKind::VdjFolder,
                source_file,
                (i + 1) as i64,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library_store::TrackStatus;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn scan_picks_up_audio_files_recursively() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["a.mp3", "b.FLAC", "sub/c.ogg", "cover.jpg", "notes.txt"] {
            File::create(dir.path().join(name))
                .unwrap()
                .write_all(b"x")
                .unwrap();
        }

        let mut records = scan_music_directory(dir.path()).unwrap();
        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].file_name, "a.mp3");
        assert_eq!(records[1].extension, "flac");
        assert_eq!(records[2].file_name, "c.ogg");
        assert_eq!(records[0].size, 1);
    }

    #[test]
    fn m3u_import_skips_directives_and_keeps_order() {
        let content = "#EXTM3U\n#EXTVDJ:<Artist> - <Title> (180)\n/music/a.mp3\n\n/music/b.mp3\n";
        let tracks = parse_m3u(content, "/p.m3u");
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].path, "/music/a.mp3");
        assert_eq!(tracks[0].track_order, 1);
        assert_eq!(tracks[0].status, TrackStatus::Processing);
        assert_eq!(tracks[1].path, "/music/b.mp3");
        assert_eq!(tracks[1].track_order, 2);
    }

    #[test]
    fn vdjfolder_import_reads_path_attributes_in_order() {
        let content = r#"<VirtualFolder noDuplicates="no">
 <song path="/music/Tom &amp; Jerry.mp3" artist="Tom" title="Jerry" songlength="181.2"/>
 <song artist="B" path="/music/b.mp3"/>
</VirtualFolder>"#;
        let tracks = parse_vdjfolder(content, "/p.vdjfolder");
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].path, "/music/Tom & Jerry.mp3");
        assert_eq!(tracks[1].path, "/music/b.mp3");
        assert_eq!(tracks[1].track_order, 2);
    }

    #[test]
    fn playlist_kind_comes_from_the_extension() {
        assert_eq!(playlist_kind_of(Path::new("/p.m3u")), Some(PlaylistKind::M3u));
        assert_eq!(playlist_kind_of(Path::new("/p.M3U8")), Some(PlaylistKind::M3u));
        assert_eq!(
            playlist_kind_of(Path::new("/p.vdjfolder")),
            Some(PlaylistKind::VdjFolder)
        );
        assert_eq!(playlist_kind_of(Path::new("/p.txt")), None);
    }

    #[test]
    fn import_playlist_rejects_unknown_extensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.txt");
        fs::write(&path, "/music/a.mp3\n").unwrap();
        assert!(import_playlist(&path).is_err());
    }
}
