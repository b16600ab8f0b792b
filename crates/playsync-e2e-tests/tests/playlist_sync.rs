use id3::frame::PictureType;
use id3::{Tag, TagLike};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use playsync_e2e_tests::{Entry, TestEnvironment, serve_covers, setup_test_environment};
use playsync_lib::cli::{Command, ResolvedCommand, resolve_command, run_sync, sync_all};
use playsync_lib::config::{Config, MediaFormat};
use playsync_lib::error::PlaysyncError;
use playsync_lib::lock::RunLock;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

fn build_sync_params(env: &TestEnvironment, format: MediaFormat) -> playsync_lib::cli::SyncParams {
    build_sync_params_from(env, &env.config(format))
}

fn build_sync_params_from(env: &TestEnvironment, config: &Config) -> playsync_lib::cli::SyncParams {
    let config_path = env
        .write_config_from(config)
        .expect("Failed to write test config");
    let command = Command::Sync {
        config_path: config_path.to_str().unwrap().to_string(),
        lock_path: None,
    };
    match resolve_command(command).expect("Failed to resolve sync command") {
        ResolvedCommand::Sync(params) => params,
        _ => unreachable!("Resolved command type mismatch"),
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Output directory should exist")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn read_tag(env: &TestEnvironment, file_name: &str) -> Tag {
    Tag::read_from_path(env.music_dir().join(file_name)).expect("File should carry an ID3 tag")
}

fn comment(tag: &Tag, description: &str) -> Option<String> {
    tag.comments()
        .find(|c| c.description == description)
        .map(|c| c.text.clone())
}

#[tokio::test]
async fn test_first_sync_downloads_and_tags_every_track() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Road Trip",
        &[("aaa111", "First Song", "Band A"), ("bbb222", "Second Song", "Band B")],
    )
    .unwrap();

    run_sync(build_sync_params(&env, MediaFormat::Audio))
        .await
        .expect("Sync should succeed");

    assert_eq!(
        file_names(&env.music_dir()),
        vec!["First Song.mp3", "Second Song.mp3"]
    );
    assert_eq!(env.download_calls().len(), 2);
    assert_eq!(env.gain_calls().len(), 2, "Every download should be normalised");

    let first = read_tag(&env, "First Song.mp3");
    assert_eq!(first.title(), Some("First Song"));
    assert_eq!(first.artist(), Some("Band A"));
    assert_eq!(first.album(), Some("Road Trip"));
    assert_eq!(first.album_artist(), Some("Various Artists"));
    assert_eq!(first.track(), Some(1));
    assert_eq!(comment(&first, "youtube_id").as_deref(), Some("aaa111"));

    let second = read_tag(&env, "Second Song.mp3");
    assert_eq!(second.track(), Some(2));
    assert_eq!(comment(&second, "youtube_id").as_deref(), Some("bbb222"));

    let tmp_left: Vec<_> = std::fs::read_dir(env.root().join("tmp"))
        .unwrap()
        .collect();
    assert!(tmp_left.is_empty(), "Temporary files should be moved out");
}

#[tokio::test]
async fn test_single_channel_becomes_album_artist() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Discography",
        &[("aaa111", "Opener", "Solo"), ("bbb222", "Closer", "Solo")],
    )
    .unwrap();

    run_sync(build_sync_params(&env, MediaFormat::Audio))
        .await
        .expect("Sync should succeed");

    assert_eq!(read_tag(&env, "Opener.mp3").album_artist(), Some("Solo"));
    assert_eq!(read_tag(&env, "Closer.mp3").album_artist(), Some("Solo"));
}

#[tokio::test]
async fn test_second_sync_downloads_nothing() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist("Mix", &[("aaa111", "Only Song", "Band")])
        .unwrap();

    let params = build_sync_params(&env, MediaFormat::Audio);
    run_sync(params.clone()).await.expect("First sync should succeed");
    let summary = sync_all(&params.app_config, &params.lock_path)
        .await
        .expect("Second sync should succeed")
        .expect("Lock should be free");

    assert_eq!(env.download_calls().len(), 1);
    assert_eq!(env.listing_calls(), 2);
    assert_eq!(summary.tracks.downloaded, 0);
    assert_eq!(summary.tracks.unchanged, 1);
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_remote_title_change_retags_without_downloading() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist("Mix", &[("aaa111", "Old Title", "Band")])
        .unwrap();
    let params = build_sync_params(&env, MediaFormat::Audio);
    run_sync(params.clone()).await.expect("First sync should succeed");

    env.set_playlist("Mix", &[("aaa111", "New Title", "Band")])
        .unwrap();
    let summary = sync_all(&params.app_config, &params.lock_path)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.tracks.retagged, 1);
    assert_eq!(env.download_calls().len(), 1);
    assert_eq!(file_names(&env.music_dir()), vec!["Old Title.mp3"]);
    assert_eq!(read_tag(&env, "Old Title.mp3").title(), Some("New Title"));
}

#[tokio::test]
async fn test_reordered_playlist_renumbers_tracks() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Mix",
        &[("aaa111", "Alpha", "Band"), ("bbb222", "Beta", "Band")],
    )
    .unwrap();
    let params = build_sync_params(&env, MediaFormat::Audio);
    run_sync(params.clone()).await.expect("First sync should succeed");

    env.set_playlist(
        "Mix",
        &[
            ("ccc333", "Gamma", "Band"),
            ("bbb222", "Beta", "Band"),
            ("aaa111", "Alpha", "Band"),
        ],
    )
    .unwrap();
    run_sync(params).await.expect("Second sync should succeed");

    assert_eq!(read_tag(&env, "Gamma.mp3").track(), Some(1));
    assert_eq!(read_tag(&env, "Beta.mp3").track(), Some(2));
    assert_eq!(read_tag(&env, "Alpha.mp3").track(), Some(3));
    assert_eq!(env.download_calls().len(), 3);
}

#[tokio::test]
async fn test_removed_tracks_stay_on_disk() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Mix",
        &[("aaa111", "Alpha", "Band"), ("bbb222", "Beta", "Band")],
    )
    .unwrap();
    let params = build_sync_params(&env, MediaFormat::Audio);
    run_sync(params.clone()).await.expect("First sync should succeed");

    env.set_playlist("Mix", &[("bbb222", "Beta", "Band")]).unwrap();
    run_sync(params).await.expect("Second sync should succeed");

    assert_eq!(file_names(&env.music_dir()), vec!["Alpha.mp3", "Beta.mp3"]);
}

#[tokio::test]
async fn test_failed_track_does_not_stop_the_playlist() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Mix",
        &[
            ("aaa111", "Before", "Band"),
            ("broken1", "Unavailable", "Band"),
            ("ccc333", "After", "Band"),
        ],
    )
    .unwrap();

    let result = run_sync(build_sync_params(&env, MediaFormat::Audio)).await;

    match result {
        Err(PlaysyncError::SyncIncomplete {
            failed_playlists,
            failed_tracks,
        }) => {
            assert_eq!(failed_playlists, 0);
            assert_eq!(failed_tracks, 1);
        }
        other => panic!("Expected an incomplete sync, got {other:?}"),
    }
    assert_eq!(file_names(&env.music_dir()), vec!["After.mp3", "Before.mp3"]);
    assert_eq!(read_tag(&env, "After.mp3").track(), Some(3));
}

#[tokio::test]
async fn test_duplicate_titles_get_id_suffix() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Covers",
        &[("aaa111", "Yesterday", "Band A"), ("bbb222", "Yesterday", "Band B")],
    )
    .unwrap();

    run_sync(build_sync_params(&env, MediaFormat::Audio))
        .await
        .expect("Sync should succeed");

    assert_eq!(
        file_names(&env.music_dir()),
        vec!["Yesterday - bbb222.mp3", "Yesterday.mp3"]
    );
    assert_eq!(
        comment(&read_tag(&env, "Yesterday - bbb222.mp3"), "youtube_id").as_deref(),
        Some("bbb222")
    );
}

#[tokio::test]
async fn test_video_playlist_names_files_by_id() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist("Talks", &[("vid111", "Keynote: Day 1", "Conf")])
        .unwrap();
    let params = build_sync_params(&env, MediaFormat::Video);
    run_sync(params.clone()).await.expect("First sync should succeed");
    run_sync(params).await.expect("Second sync should succeed");

    assert_eq!(file_names(&env.music_dir()), vec!["Keynote Day 1 [vid111].mp4"]);
    assert_eq!(env.download_calls().len(), 1, "Video should be recognised by name");
    assert!(env.gain_calls().is_empty(), "Video is never normalised");
}

#[tokio::test]
async fn test_held_lock_skips_the_run() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist("Mix", &[("aaa111", "Only Song", "Band")])
        .unwrap();
    let params = build_sync_params(&env, MediaFormat::Audio);

    let mut other_run = RunLock::open(&params.lock_path).unwrap();
    let guard = other_run.try_hold().unwrap();
    assert!(guard.is_some());

    let summary = sync_all(&params.app_config, &params.lock_path)
        .await
        .expect("Skipped run is not an error");

    assert!(summary.is_none());
    assert_eq!(env.listing_calls(), 0);
    assert!(!env.music_dir().exists());

    drop(guard);
    run_sync(params).await.expect("Sync should run once the lock is released");
    assert_eq!(file_names(&env.music_dir()), vec!["Only Song.mp3"]);
}

fn landscape_png() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([200, 30, 30])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_covers_are_embedded_and_missing_ones_skipped() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    let server = serve_covers(HashMap::from([("/cover.png".to_string(), landscape_png())]))
        .await
        .expect("Failed to start cover server");
    let cover_url = server.url("/cover.png");
    let missing_url = server.url("/missing.jpg");
    env.set_playlist_entries(
        "Covers",
        &[
            Entry {
                id: "aaa111",
                title: "With Cover",
                channel: "Band",
                thumbnail: Some(&cover_url),
            },
            Entry {
                id: "bbb222",
                title: "Not Found",
                channel: "Band",
                thumbnail: Some(&missing_url),
            },
            Entry {
                id: "ccc333",
                title: "Unreachable",
                channel: "Band",
                thumbnail: Some("http://127.0.0.1:9/refused.jpg"),
            },
        ],
    )
    .unwrap();
    let mut config = env.config(MediaFormat::Audio);
    config.embed_thumbnails = true;

    run_sync(build_sync_params_from(&env, &config))
        .await
        .expect("Cover failures must not fail the sync");

    let tagged = read_tag(&env, "With Cover.mp3");
    let picture = tagged
        .pictures()
        .find(|p| p.picture_type == PictureType::CoverFront)
        .expect("Cover should be embedded");
    assert_eq!(picture.mime_type, "image/png");
    let cover = image::load_from_memory(&picture.data).unwrap();
    assert_eq!(cover.dimensions(), (4, 4), "Cover should be padded to a square");
    assert_eq!(comment(&tagged, "thumbnail_url"), Some(cover_url.clone()));

    for file_name in ["Not Found.mp3", "Unreachable.mp3"] {
        let tag = read_tag(&env, file_name);
        assert_eq!(tag.pictures().count(), 0, "{file_name} should have no cover");
        assert!(tag.title().is_some(), "{file_name} should still be tagged");
        assert!(comment(&tag, "youtube_id").is_some());
        assert!(tag.track().is_some());
    }
}

#[tokio::test]
async fn test_failing_mp3gain_still_places_track() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.install_failing_mp3gain().unwrap();
    env.set_playlist("Mix", &[("aaa111", "Loud Song", "Band")])
        .unwrap();

    run_sync(build_sync_params(&env, MediaFormat::Audio))
        .await
        .expect("Normalisation failures must not fail the sync");

    assert_eq!(file_names(&env.music_dir()), vec!["Loud Song.mp3"]);
    assert_eq!(
        comment(&read_tag(&env, "Loud Song.mp3"), "youtube_id").as_deref(),
        Some("aaa111")
    );
}

#[tokio::test]
async fn test_untaggable_download_is_never_placed() {
    init_tracing();

    let env = setup_test_environment().expect("Failed to setup test environment");
    env.set_playlist(
        "Mix",
        &[("aaa111", "Good", "Band"), ("untaggable1", "Bad Header", "Band")],
    )
    .unwrap();
    let params = build_sync_params(&env, MediaFormat::Audio);

    for _ in 0..2 {
        let result = run_sync(params.clone()).await;
        assert!(
            matches!(
                result,
                Err(PlaysyncError::SyncIncomplete {
                    failed_tracks: 1,
                    ..
                })
            ),
            "Expected one failed track, got {result:?}"
        );
    }

    assert_eq!(
        file_names(&env.music_dir()),
        vec!["Good.mp3"],
        "A file that couldn't be tagged must stay out of the playlist directory"
    );
    assert_eq!(
        env.download_calls()
            .iter()
            .filter(|call| call.contains("untaggable1"))
            .count(),
        2
    );
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("playsync_lib=debug,playsync_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
