//! End-to-end tests for suggestion generation, caching and statistics.

mod common;

use common::{write_m3u, write_vdjfolder, TestLibrary};
use playlist_mender::progress::{CancellationFlag, NoOpProgress};
use playlist_mender::suggestions::{MatchBucket, SuggestionFilters};

fn filters() -> SuggestionFilters {
    SuggestionFilters::default()
}

#[test]
fn generation_is_cached_and_stable_across_calls() {
    let library = TestLibrary::new();
    library.add_music_file("lib/Artist - Song (Remix).mp3");
    library.add_music_file("lib/Other Band - Anthem.mp3");
    library.scan();
    let playlist = write_m3u(
        &library.playlist_dir(),
        "set.m3u",
        &[
            "/gone/Artist - Song (Remix) [Radio Edit].mp3",
            "/gone/Other Band - Anthem.mp3",
        ],
    );
    library.import(&playlist);

    let service = library.suggestion_service();
    let first = service
        .generate(&filters(), &NoOpProgress, &CancellationFlag::new())
        .unwrap();
    let second = service
        .generate(&filters(), &NoOpProgress, &CancellationFlag::new())
        .unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert!(second.cached_at.is_some());
    assert_eq!(first.suggestions, second.suggestions);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn suggestions_are_sorted_by_bucket_then_score() {
    let library = TestLibrary::new();
    // One stem match (0.9, exact bucket) and one similarity match
    // (0.75, high bucket)
    library.add_music_file("lib/Artist - Song (Remix).mp3");
    library.add_music_file("lib/Moved Anthem.mp3");
    library.scan();
    let playlist = write_m3u(
        &library.playlist_dir(),
        "set.m3u",
        &[
            "/gone/Artist - Song (Remix) [Radio Edit].mp3",
            "/gone/Moved Anthem.mp3",
        ],
    );
    library.import(&playlist);

    let page = library
        .suggestion_service()
        .generate(&filters(), &NoOpProgress, &CancellationFlag::new())
        .unwrap();

    assert_eq!(page.count, 2);
    assert_eq!(page.suggestions[0].bucket, MatchBucket::Exact);
    assert!((page.suggestions[0].similarity - 0.9).abs() < 1e-9);
    assert_eq!(page.suggestions[1].bucket, MatchBucket::High);
    assert!((page.suggestions[1].similarity - 0.75).abs() < 1e-9);
    assert_eq!(page.stats.exact, 1);
    assert_eq!(page.stats.high, 1);
}

#[test]
fn bucket_filter_and_pagination_serve_from_the_cached_set() {
    let library = TestLibrary::new();
    library.add_music_file("lib/Alpha Track.mp3");
    library.add_music_file("lib/Beta Track.mp3");
    library.scan();
    let playlist = write_m3u(
        &library.playlist_dir(),
        "set.m3u",
        &["/gone/Alpha Track.mp3", "/gone/Beta Track.mp3"],
    );
    library.import(&playlist);

    let service = library.suggestion_service();
    service
        .generate(&filters(), &NoOpProgress, &CancellationFlag::new())
        .unwrap();

    let exact_only = service
        .generate(
            &SuggestionFilters {
                bucket: Some(MatchBucket::Exact),
                ..Default::default()
            },
            &NoOpProgress,
            &CancellationFlag::new(),
        )
        .unwrap();
    assert!(exact_only.cached);
    assert_eq!(exact_only.count, 2);

    let paged = service
        .generate(
            &SuggestionFilters {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
            &NoOpProgress,
            &CancellationFlag::new(),
        )
        .unwrap();
    assert_eq!(paged.count, 1);
    // full-set stats are unaffected by pagination
    assert_eq!(paged.stats.exact, 2);
}

#[test]
fn statistics_cover_both_playlist_kinds() {
    let library = TestLibrary::new();
    let here = library.add_music_file("lib/Here.mp3");
    library.scan();

    let m3u = write_m3u(
        &library.playlist_dir(),
        "set.m3u",
        &[here.to_str().unwrap(), "/gone/a.mp3"],
    );
    let vdj = write_vdjfolder(&library.playlist_dir(), "crate.vdjfolder", &["/gone/b.mp3"]);
    library.import(&m3u);
    library.import(&vdj);

    let stats = library.suggestion_service().statistics().unwrap();
    assert_eq!(stats.music_files, 1);
    assert_eq!(stats.tracks, 3);
    assert_eq!(stats.matched_tracks, 1);
    assert_eq!(stats.unmatched_tracks, 2);
    assert_eq!(stats.playlists, 2);
    assert_eq!(stats.playlists_by_kind.len(), 2);
    assert_eq!(stats.top_playlists[0].track_count, 2);
}

#[test]
fn empty_library_yields_empty_page() {
    let library = TestLibrary::new();
    let page = library
        .suggestion_service()
        .generate(&filters(), &NoOpProgress, &CancellationFlag::new())
        .unwrap();
    assert_eq!(page.total_unmatched, 0);
    assert_eq!(page.count, 0);
}
