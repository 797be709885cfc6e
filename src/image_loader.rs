//! # Image Fetching and Decoding
//!
//! Resolves card artwork references to decoded RGB rasters. References are
//! usually `http(s)` URLs; data URIs and local file paths are also accepted
//! so exports can point at artwork on disk.
//!
//! Every distinct reference is fetched and decoded exactly once. Fetches run
//! sequentially unless a worker count above one is requested, in which case
//! a rayon pool does the network and decode work and the calling thread
//! fills the cache in first-seen order. Once any fetch fails, workers stop
//! picking up new references.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use image::RgbImage;
use rayon::prelude::*;

use crate::error::ProxyError;
use crate::model::CardEntry;

/// Anything that can turn an artwork reference into raw bytes.
pub trait ImageSource: Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ProxyError>;
}

/// Default source: HTTP(S) through a blocking `ureq` agent, plus data URIs
/// and local files.
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("proxysheet/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>, ProxyError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, response) => ProxyError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {} {}", code, response.status_text()),
            },
            ureq::Error::Transport(t) => ProxyError::Fetch {
                url: url.to_string(),
                reason: t.to_string(),
            },
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| ProxyError::Fetch {
                url: url.to_string(),
                reason: format!("failed to read response: {}", e),
            })?;
        Ok(bytes)
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ImageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ProxyError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url)
        } else {
            read_local(url)
        }
    }
}

/// Resolve a data URI or a filesystem path.
pub fn read_local(src: &str) -> Result<Vec<u8>, ProxyError> {
    // data:image/png;base64,iVBOR...
    if src.starts_with("data:") {
        let comma_pos = src.find(',').ok_or_else(|| ProxyError::Fetch {
            url: truncate(src),
            reason: "invalid data URI: missing comma".to_string(),
        })?;
        use base64::Engine;
        return base64::engine::general_purpose::STANDARD
            .decode(src[comma_pos + 1..].trim())
            .map_err(|e| ProxyError::Fetch {
                url: truncate(src),
                reason: format!("base64 decode error: {}", e),
            });
    }

    let path = src.strip_prefix("file://").unwrap_or(src);
    log::info!("Reading local artwork {}", path);
    std::fs::read(path).map_err(|e| ProxyError::Fetch {
        url: src.to_string(),
        reason: e.to_string(),
    })
}

/// Keep data URIs readable in error messages.
fn truncate(src: &str) -> String {
    match src.char_indices().nth(48) {
        Some((idx, _)) => format!("{}...", &src[..idx]),
        None => src.to_string(),
    }
}

/// Decode image bytes to 8-bit RGB, discarding any alpha channel.
pub fn decode_image_bytes(url: &str, data: &[u8]) -> Result<RgbImage, ProxyError> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ProxyError::Decode {
            url: truncate(url),
            reason: format!("format detection error: {}", e),
        })?;

    let img = reader.decode().map_err(|e| ProxyError::Decode {
        url: truncate(url),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgb8())
}

/// Decoded artwork keyed by reference.
#[derive(Debug, Default)]
pub struct ImageCache {
    images: HashMap<String, RgbImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&RgbImage> {
        self.images.get(url)
    }

    pub fn insert(&mut self, url: String, image: RgbImage) {
        self.images.insert(url, image);
    }

    pub(crate) fn len(&self) -> usize {
        self.images.len()
    }

    /// Face images, index-aligned with `cards`.
    pub fn faces<'a>(&'a self, cards: &[CardEntry]) -> Result<Vec<&'a RgbImage>, ProxyError> {
        cards.iter().map(|c| self.lookup(&c.face_ref)).collect()
    }

    /// Back images, index-aligned with `cards`.
    pub fn backs<'a>(&'a self, cards: &[CardEntry]) -> Result<Vec<&'a RgbImage>, ProxyError> {
        cards.iter().map(|c| self.lookup(&c.back_ref)).collect()
    }

    fn lookup(&self, url: &str) -> Result<&RgbImage, ProxyError> {
        self.images
            .get(url)
            .ok_or_else(|| ProxyError::Render(format!("image '{}' was never fetched", truncate(url))))
    }
}

/// Every distinct face and back reference, in first-seen order.
pub fn distinct_refs(cards: &[CardEntry]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for card in cards {
        for url in [card.face_ref.as_str(), card.back_ref.as_str()] {
            if seen.insert(url) {
                refs.push(url);
            }
        }
    }
    refs
}

fn fetch_one(source: &dyn ImageSource, url: &str) -> Result<RgbImage, ProxyError> {
    log::debug!("Fetching {}", truncate(url));
    let bytes = source.fetch(url)?;
    decode_image_bytes(url, &bytes)
}

/// Fetch and decode all artwork the cards reference.
///
/// `jobs <= 1` fetches sequentially. The first failure, in first-seen order,
/// aborts the whole run.
pub fn fetch_all(
    cards: &[CardEntry],
    source: &dyn ImageSource,
    jobs: usize,
) -> Result<ImageCache, ProxyError> {
    let refs = distinct_refs(cards);
    let mut cache = ImageCache::new();

    if jobs <= 1 || refs.len() <= 1 {
        for url in refs {
            let image = fetch_one(source, url)?;
            cache.insert(url.to_string(), image);
        }
        return Ok(cache);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| ProxyError::Render(format!("failed to start fetch workers: {}", e)))?;

    let failed = AtomicBool::new(false);
    let results: Vec<Option<Result<RgbImage, ProxyError>>> = pool.install(|| {
        refs.par_iter()
            .map(|url| {
                if failed.load(Ordering::Acquire) {
                    return None;
                }
                let result = fetch_one(source, url);
                if result.is_err() {
                    failed.store(true, Ordering::Release);
                }
                Some(result)
            })
            .collect()
    });

    // A skipped reference implies a failure somewhere in `results`.
    for (url, result) in refs.into_iter().zip(results) {
        if let Some(result) = result {
            cache.insert(url.to_string(), result?);
        }
    }
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    struct CountingSource {
        calls: Mutex<Vec<String>>,
    }

    impl ImageSource for CountingSource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, ProxyError> {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("missing") {
                return Err(ProxyError::Fetch {
                    url: url.to_string(),
                    reason: "HTTP 404 Not Found".to_string(),
                });
            }
            if url.contains("garbage") {
                return Ok(b"not an image".to_vec());
            }
            Ok(png_bytes(2, 3, [10, 20, 30, 255]))
        }
    }

    fn card(id: i64, face: &str, back: &str) -> CardEntry {
        CardEntry {
            id,
            face_ref: face.to_string(),
            back_ref: back.to_string(),
            label: String::new(),
        }
    }

    #[test]
    fn test_distinct_refs_first_seen_order() {
        let cards = vec![card(100, "a", "back"), card(101, "a", "back"), card(200, "b", "back")];
        assert_eq!(distinct_refs(&cards), vec!["a", "back", "b"]);
    }

    #[test]
    fn test_shared_url_fetched_once() {
        let cards = vec![card(100, "a", "back"), card(101, "a", "back"), card(102, "a", "back")];
        let source = CountingSource { calls: Mutex::new(vec![]) };
        let cache = fetch_all(&cards, &source, 1).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(*source.calls.lock().unwrap(), vec!["a", "back"]);

        let faces = cache.faces(&cards).unwrap();
        let backs = cache.backs(&cards).unwrap();
        assert_eq!(faces.len(), 3);
        assert_eq!(backs.len(), 3);
        assert_eq!(faces[0].dimensions(), (2, 3));
    }

    #[test]
    fn test_parallel_fetch_matches_sequential() {
        let cards: Vec<CardEntry> = (0..12)
            .map(|i| card(i, &format!("face{}", i % 5), "back"))
            .collect();
        let source = CountingSource { calls: Mutex::new(vec![]) };
        let cache = fetch_all(&cards, &source, 4).unwrap();
        assert_eq!(cache.len(), 6);
        let mut calls = source.calls.lock().unwrap().clone();
        calls.sort();
        calls.dedup();
        assert_eq!(calls.len(), source.calls.lock().unwrap().len(), "no URL fetched twice");
    }

    #[test]
    fn test_fetch_failure_aborts() {
        let cards = vec![card(100, "a", "back"), card(200, "missing", "back")];
        let source = CountingSource { calls: Mutex::new(vec![]) };
        let err = fetch_all(&cards, &source, 1).unwrap_err();
        assert!(matches!(err, ProxyError::Fetch { ref url, .. } if url == "missing"));
    }

    struct FailingSource {
        calls: Mutex<usize>,
    }

    impl ImageSource for FailingSource {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, ProxyError> {
            *self.calls.lock().unwrap() += 1;
            Err(ProxyError::Fetch {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[test]
    fn test_parallel_fetch_stops_after_failure() {
        let cards: Vec<CardEntry> = (0..40)
            .map(|i| card(i, &format!("face{}", i), "back"))
            .collect();

        let source = FailingSource { calls: Mutex::new(0) };
        let err = fetch_all(&cards, &source, 2).unwrap_err();
        assert!(matches!(err, ProxyError::Fetch { .. }));
        let calls = *source.calls.lock().unwrap();
        assert!(calls <= 2, "{} fetches started after the first failure", calls);

        let source = FailingSource { calls: Mutex::new(0) };
        fetch_all(&cards, &source, 1).unwrap_err();
        assert_eq!(*source.calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_decode_failure_aborts() {
        let cards = vec![card(100, "garbage", "back")];
        let source = CountingSource { calls: Mutex::new(vec![]) };
        let err = fetch_all(&cards, &source, 2).unwrap_err();
        assert!(matches!(err, ProxyError::Decode { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_alpha_is_discarded() {
        let bytes = png_bytes(1, 1, [200, 100, 50, 0]);
        let img = decode_image_bytes("x.png", &bytes).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn test_data_uri() {
        use base64::Engine;
        let bytes = png_bytes(1, 1, [0, 255, 0, 255]);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        let source = HttpSource::default();
        assert_eq!(source.fetch(&uri).unwrap(), bytes);
    }

    #[test]
    fn test_invalid_data_uri() {
        let err = read_local("data:image/png;base64").unwrap_err();
        assert!(matches!(err, ProxyError::Fetch { .. }));
    }

    #[test]
    fn test_local_file_with_and_without_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        let bytes = png_bytes(1, 1, [9, 9, 9, 255]);
        std::fs::write(&path, &bytes).unwrap();

        let bare = path.to_str().unwrap();
        assert_eq!(read_local(bare).unwrap(), bytes);
        assert_eq!(read_local(&format!("file://{}", bare)).unwrap(), bytes);
    }

    #[test]
    fn test_missing_local_file() {
        let err = read_local("./definitely/not/here.png").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
