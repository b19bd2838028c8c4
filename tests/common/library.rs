use playlist_mender::fixes::FixApplier;
use playlist_mender::library_import::{import_playlist, scan_music_directory};
use playlist_mender::library_store::{EntityClass, LibraryStore, SqliteLibraryStore};
use playlist_mender::matching::{MatcherConfig, TrackMatcher};
use playlist_mender::progress::{CancellationFlag, NoOpProgress};
use playlist_mender::suggestions::{
    SuggestionCache, SuggestionConfig, SuggestionService,
};
use playlist_mender::word_index::WordIndexBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A complete throwaway library: database, music directory and playlist
/// directory under one temp root.
pub struct TestLibrary {
    pub store: Arc<dyn LibraryStore>,
    root: TempDir,
}

impl TestLibrary {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let store: Arc<dyn LibraryStore> =
            Arc::new(SqliteLibraryStore::new(root.path().join("library.db")).unwrap());
        fs::create_dir(root.path().join("music")).unwrap();
        fs::create_dir(root.path().join("playlists")).unwrap();
        TestLibrary { store, root }
    }

    pub fn music_dir(&self) -> PathBuf {
        self.root.path().join("music")
    }

    pub fn playlist_dir(&self) -> PathBuf {
        self.root.path().join("playlists")
    }

    /// Create an empty music file at `relative` under the music directory.
    pub fn add_music_file(&self, relative: &str) -> PathBuf {
        let path = self.music_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"audio").unwrap();
        path
    }

    /// Scan the music directory into the store and rebuild the file index.
    pub fn scan(&self) {
        for record in scan_music_directory(&self.music_dir()).unwrap() {
            self.store.insert_music_file(&record).unwrap();
        }
        let names = self.store.all_music_file_names().unwrap();
        WordIndexBuilder::new(self.store.clone())
            .rebuild(
                EntityClass::MusicFiles,
                &names,
                &NoOpProgress,
                &CancellationFlag::new(),
            )
            .unwrap();
    }

    /// Import one playlist file into the store and rebuild the track index.
    pub fn import(&self, playlist: &Path) {
        for track in import_playlist(playlist).unwrap() {
            self.store.insert_track_reference(&track).unwrap();
        }
        let names = self.store.all_track_names().unwrap();
        WordIndexBuilder::new(self.store.clone())
            .rebuild(
                EntityClass::Tracks,
                &names,
                &NoOpProgress,
                &CancellationFlag::new(),
            )
            .unwrap();
    }

    pub fn matcher(&self) -> TrackMatcher {
        TrackMatcher::new(self.store.clone(), MatcherConfig::default())
    }

    pub fn suggestion_service(&self) -> SuggestionService {
        SuggestionService::new(
            self.store.clone(),
            SuggestionCache::with_default_ttl(self.store.clone()),
            self.matcher(),
            SuggestionConfig::default(),
        )
    }

    pub fn fix_applier(&self) -> FixApplier {
        FixApplier::new(self.store.clone())
    }
}
