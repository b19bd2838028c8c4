use std::fs;
use std::path::{Path, PathBuf};

/// Write an M3U playlist with an `#EXTM3U` header and one `#EXTVDJ`
/// directive per entry, the way VirtualDJ exports them.
pub fn write_m3u(dir: &Path, name: &str, entries: &[&str]) -> PathBuf {
    let mut content = String::from("#EXTM3U\n");
    for entry in entries {
        content.push_str(&format!("#EXTVDJ:<Artist> - <Title> (180)\n{}\n", entry));
    }
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write a VDJFolder playlist with one `<song>` element per entry.
pub fn write_vdjfolder(dir: &Path, name: &str, entries: &[&str]) -> PathBuf {
    let mut content = String::from("<VirtualFolder noDuplicates=\"no\">\n");
    for entry in entries {
        content.push_str(&format!(
            " <song path=\"{}\" artist=\"A\" title=\"T\" songlength=\"180.0\"/>\n",
            entry.replace('&', "&amp;")
        ));
    }
    content.push_str("</VirtualFolder>\n");
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}
