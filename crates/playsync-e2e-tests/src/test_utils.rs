use eyre::Result;
use playsync_lib::config::{Config, MediaFormat, PlaylistDef, ToolsConfig};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLplaysyncE2E";

/// Stand-in for `yt-dlp`: `-J` prints `playlist.json`, anything else
/// "downloads" the id from the watch URL into the `-o` template. Ids
/// starting with `broken` fail; ids starting with `untaggable` produce a
/// file with an unsupported ID3 header. Every invocation is appended to
/// `calls.log`.
const FAKE_YT_DLP: &str = r#"#!/bin/sh
root="__ROOT__"
echo "$*" >> "$root/calls.log"

ext=mp4
template=""
url=""
json=0
while [ $# -gt 0 ]; do
    case "$1" in
        -J) json=1 ;;
        -x) ext=mp3 ;;
        -o) shift; template="$1" ;;
        --version) echo "2099.01.01"; exit 0 ;;
        *) url="$1" ;;
    esac
    shift
done

if [ "$json" = 1 ]; then
    cat "$root/playlist.json"
    exit 0
fi

id="${url##*v=}"
case "$id" in
    broken*) echo "ERROR: [youtube] $id: Video unavailable" >&2; exit 1 ;;
esac

out=$(printf '%s' "$template" | sed "s/%(ext)s/$ext/")
case "$id" in
    untaggable*) printf 'ID3\005\000\000\000\000\000' > "$out" ;;
    *) : > "$out" ;;
esac
printf 'fake media for %s' "$id" >> "$out"
"#;

/// Stand-in for `mp3gain` that records the files it was asked to touch.
const FAKE_MP3GAIN: &str = r#"#!/bin/sh
root="__ROOT__"
for last; do :; done
echo "$last" >> "$root/gain.log"
"#;

const FAILING_MP3GAIN: &str = r#"#!/bin/sh
echo "mp3gain: can't process file" >&2
exit 1
"#;

/// One playlist entry as the fake `yt-dlp` reports it.
#[derive(Clone, Copy, Debug)]
pub struct Entry<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub channel: &'a str,
    pub thumbnail: Option<&'a str>,
}

impl<'a> From<&(&'a str, &'a str, &'a str)> for Entry<'a> {
    fn from(&(id, title, channel): &(&'a str, &'a str, &'a str)) -> Self {
        Self {
            id,
            title,
            channel,
            thumbnail: None,
        }
    }
}

pub struct TestEnvironment {
    pub dir: TempDir,
}

impl TestEnvironment {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn music_dir(&self) -> PathBuf {
        self.root().join("music")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root().join("playsync.lock")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.yaml")
    }

    pub fn config(&self, format: MediaFormat) -> Config {
        Config {
            playlists: vec![Arc::new(PlaylistDef {
                url: PLAYLIST_URL.to_string(),
                path: self.music_dir(),
                format,
            })],
            tools: ToolsConfig {
                yt_dlp: self.root().join("bin").join("yt-dlp"),
                mp3gain: Some(self.root().join("bin").join("mp3gain")),
                ffmpeg: None,
            },
            tmp_dir: self.root().join("tmp"),
            schedule: Some("*/5 * * * *".to_string()),
            lock_path: Some(self.lock_path()),
            embed_thumbnails: false,
        }
    }

    pub fn write_config(&self, format: MediaFormat) -> Result<PathBuf> {
        self.write_config_from(&self.config(format))
    }

    /// Writes the config as JSON, which the YAML loader reads as-is.
    pub fn write_config_from(&self, config: &Config) -> Result<PathBuf> {
        let path = self.config_path();
        std::fs::write(&path, serde_json::to_string_pretty(config)?)?;
        Ok(path)
    }

    /// Replaces the playlist the fake `yt-dlp` reports.
    pub fn set_playlist(&self, title: &str, entries: &[(&str, &str, &str)]) -> Result<()> {
        let entries: Vec<Entry> = entries.iter().map(Entry::from).collect();
        self.set_playlist_entries(title, &entries)
    }

    pub fn set_playlist_entries(&self, title: &str, entries: &[Entry]) -> Result<()> {
        let entries: Vec<Value> = entries
            .iter()
            .map(|entry| {
                let thumbnails: Vec<Value> = entry
                    .thumbnail
                    .iter()
                    .map(|url| json!({ "url": url, "height": 360, "width": 480 }))
                    .collect();
                json!({
                    "_type": "url",
                    "ie_key": "Youtube",
                    "id": entry.id,
                    "url": format!("https://www.youtube.com/watch?v={}", entry.id),
                    "title": entry.title,
                    "channel": entry.channel,
                    "thumbnails": thumbnails,
                })
            })
            .collect();
        let playlist = json!({
            "_type": "playlist",
            "id": "PLplaysyncE2E",
            "title": title,
            "entries": entries,
        });
        std::fs::write(
            self.root().join("playlist.json"),
            serde_json::to_vec_pretty(&playlist)?,
        )?;
        Ok(())
    }

    fn read_log(&self, name: &str) -> Vec<String> {
        std::fs::read_to_string(self.root().join(name))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Invocations of the fake `yt-dlp` that were downloads.
    pub fn download_calls(&self) -> Vec<String> {
        self.read_log("calls.log")
            .into_iter()
            .filter(|call| !call.contains("-J"))
            .collect()
    }

    pub fn listing_calls(&self) -> usize {
        self.read_log("calls.log")
            .iter()
            .filter(|call| call.contains("-J"))
            .count()
    }

    pub fn gain_calls(&self) -> Vec<String> {
        self.read_log("gain.log")
    }

    pub fn install_failing_mp3gain(&self) -> Result<()> {
        install_script(
            &self.root().join("bin").join("mp3gain"),
            FAILING_MP3GAIN,
            self.root(),
        )
    }
}

/// Minimal HTTP/1.1 server handing out fixed bodies by path; anything else
/// is a 404.
pub struct CoverServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl CoverServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for CoverServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(mut stream: tokio::net::TcpStream, covers: Arc<HashMap<String, Vec<u8>>>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/");
    let response = match covers.get(path) {
        Some(body) => {
            let mut response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            response.extend_from_slice(body);
            response
        }
        None => b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
    };
    let _ = stream.write_all(&response).await;
    let _ = stream.shutdown().await;
}

pub async fn serve_covers(covers: HashMap<String, Vec<u8>>) -> Result<CoverServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let covers = Arc::new(covers);

    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(respond(stream, Arc::clone(&covers)));
        }
    });

    Ok(CoverServer { base_url, handle })
}

fn install_script(path: &Path, template: &str, root: &Path) -> Result<()> {
    std::fs::write(path, template.replace("__ROOT__", &root.display().to_string()))?;
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions)?;
    Ok(())
}

pub fn setup_test_environment() -> Result<TestEnvironment> {
    let dir = tempfile::tempdir()?;
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin)?;

    install_script(&bin.join("yt-dlp"), FAKE_YT_DLP, dir.path())?;
    install_script(&bin.join("mp3gain"), FAKE_MP3GAIN, dir.path())?;

    let environment = TestEnvironment { dir };
    environment.set_playlist("Empty", &[])?;
    Ok(environment)
}
