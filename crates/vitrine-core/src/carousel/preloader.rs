//! Fire-and-forget media probes.
//!
//! One detached task per slide; each reports exactly once through an mpsc
//! channel. Tasks are never aborted: after teardown their reports fail to
//! send or are rejected by the generation check in `Carousel::apply_preload`.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use image::DynamicImage;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

use super::media::{MediaItem, MediaSource};
use super::state::Readiness;
use crate::config::LoaderConfig;
use crate::{Error, Result};

const MAX_MEDIA_BYTES: usize = 32 * 1024 * 1024;

/// Outcome of one probe, tagged with the mount it belongs to
#[derive(Debug, Clone)]
pub struct PreloadReport {
    pub generation: u64,
    pub index: usize,
    pub outcome: Readiness,
}

/// Resolves a slide into a decoded image
#[async_trait::async_trait]
pub trait MediaLoader: Send + Sync {
    async fn load(&self, item: &MediaItem) -> Result<DynamicImage>;
}

/// Loads remote slides over HTTP and local slides from disk
pub struct DefaultLoader {
    client: Client,
    max_bytes: usize,
}

impl DefaultLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.user_agent)?;
        Ok(Self::with_client(client, MAX_MEDIA_BYTES))
    }

    fn with_client(client: Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }

    fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/png,image/jpeg,image/gif,image/webp,image/*;q=0.8"),
        );
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }

        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Http)
    }

    /// Download a body, giving up as soon as it passes `max_bytes`
    async fn fetch_remote(&self, url: &Url) -> Result<Bytes> {
        let mut response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(Error::MediaLoad(format!("HTTP {}", response.status())));
        }

        let too_large = || {
            Error::MediaLoad(format!(
                "{} is larger than {} bytes",
                url, self.max_bytes
            ))
        };

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(too_large());
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[async_trait::async_trait]
impl MediaLoader for DefaultLoader {
    async fn load(&self, item: &MediaItem) -> Result<DynamicImage> {
        let bytes = match &item.source {
            MediaSource::Remote(url) => self.fetch_remote(url).await?,
            MediaSource::Local(path) => Bytes::from(tokio::fs::read(path).await?),
        };

        // Decoding is CPU-bound
        tokio::task::spawn_blocking(move || decode_image_bytes(&bytes))
            .await
            .map_err(|e| Error::MediaLoad(format!("Task join error: {}", e)))?
    }
}

/// Decode image bytes with format detection
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::MediaLoad("empty data".to_string()));
    }

    if let Ok(img) = image::load_from_memory(bytes) {
        return Ok(img);
    }

    // Content sniffing failed; fall back to magic bytes
    let format = if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(image::ImageFormat::Png)
    } else if bytes.starts_with(b"\xff\xd8\xff") {
        Some(image::ImageFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(image::ImageFormat::Gif)
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some(image::ImageFormat::WebP)
    } else {
        None
    };

    match format {
        Some(format) => Ok(image::load_from_memory_with_format(bytes, format)?),
        None => Err(Error::MediaLoad(format!("unknown format ({}B)", bytes.len()))),
    }
}

/// Resolve one slide; errors and timeouts both settle as `Failed`
pub async fn probe(
    loader: &dyn MediaLoader,
    item: &MediaItem,
    probe_timeout: Option<Duration>,
) -> Readiness {
    let result = match probe_timeout {
        Some(limit) => match tokio::time::timeout(limit, loader.load(item)).await {
            Ok(result) => result,
            Err(_) => Err(Error::MediaLoad("timed out".to_string())),
        },
        None => loader.load(item).await,
    };

    match result {
        Ok(image) => Readiness::Ready(Arc::new(image)),
        Err(e) => {
            warn!("Failed to load {}: {}", item.source, e);
            Readiness::Failed(e.to_string())
        }
    }
}

/// Start one detached probe per slide
pub fn spawn_preload(
    items: &Arc<[MediaItem]>,
    generation: u64,
    loader: Arc<dyn MediaLoader>,
    probe_timeout: Option<Duration>,
    tx: mpsc::UnboundedSender<PreloadReport>,
) {
    debug!("Preloading {} slides (generation {})", items.len(), generation);

    for index in 0..items.len() {
        let items = Arc::clone(items);
        let loader = Arc::clone(&loader);
        let tx = tx.clone();

        tokio::spawn(async move {
            let outcome = probe(loader.as_ref(), &items[index], probe_timeout).await;
            // Receiver gone means the carousel was torn down
            let _ = tx.send(PreloadReport {
                generation,
                index,
                outcome,
            });
        });
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Script, ScriptedLoader};
    use super::*;
    use tokio::time::timeout;

    fn items(labels: &[&str]) -> Arc<[MediaItem]> {
        labels.iter().map(|l| MediaItem::parse(l).unwrap()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_probe_reports_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader: Arc<dyn MediaLoader> =
            Arc::new(ScriptedLoader::new(&[("b.png", Script::Fail("404"))]));

        spawn_preload(&items(&["a.png", "b.png", "c.png"]), 7, loader, None, tx);

        let mut reports = Vec::new();
        while let Some(report) = rx.recv().await {
            reports.push(report);
        }
        reports.sort_by_key(|r| r.index);

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.generation == 7));
        assert!(matches!(reports[0].outcome, Readiness::Ready(_)));
        assert!(matches!(reports[1].outcome, Readiness::Failed(ref e) if e.contains("404")));
        assert!(matches!(reports[2].outcome, Readiness::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_probe_never_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader: Arc<dyn MediaLoader> =
            Arc::new(ScriptedLoader::new(&[("b.png", Script::Hang)]));

        spawn_preload(&items(&["a.png", "b.png", "c.png"]), 1, loader, None, tx);

        let mut settled = Vec::new();
        for _ in 0..2 {
            settled.push(rx.recv().await.unwrap().index);
        }
        settled.sort();
        assert_eq!(settled, vec![0, 2]);

        assert!(timeout(Duration::from_secs(3600), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_settles_hung_load() {
        let loader = ScriptedLoader::new(&[("b.png", Script::Hang)]);
        let item = MediaItem::parse("b.png").unwrap();

        let outcome = probe(&loader, &item, Some(Duration::from_secs(5))).await;
        assert!(matches!(outcome, Readiness::Failed(ref e) if e.contains("timed out")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_probe_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader: Arc<dyn MediaLoader> = Arc::new(ScriptedLoader::new(&[(
            "slow.png",
            Script::Delay(Duration::from_secs(10)),
        )]));

        spawn_preload(&items(&["slow.png"]), 1, loader, None, tx);
        drop(rx);
        tokio::time::sleep(Duration::from_secs(20)).await;
    }

    #[tokio::test]
    async fn test_default_loader_reads_local_png() {
        let path = std::env::temp_dir().join(format!("vitrine-loader-{}.png", std::process::id()));
        image::RgbImage::new(4, 3).save(&path).unwrap();

        let loader = DefaultLoader::new(&LoaderConfig::default()).unwrap();
        let item = MediaItem::parse(path.to_str().unwrap()).unwrap();
        let image = loader.load(&item).await.unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!((image.width(), image.height()), (4, 3));
    }

    #[tokio::test]
    async fn test_default_loader_missing_file_fails() {
        let loader = DefaultLoader::new(&LoaderConfig::default()).unwrap();
        let item = MediaItem::parse("/definitely/not/here/slide.png").unwrap();
        assert!(matches!(loader.load(&item).await, Err(Error::Io(_))));
    }

    /// Serve one canned HTTP response on a loopback port
    async fn serve_once(response: Vec<u8>) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{}/slide.png", addr)).unwrap()
    }

    fn local_loader(max_bytes: usize) -> DefaultLoader {
        let client = Client::builder().no_proxy().build().unwrap();
        DefaultLoader::with_client(client, max_bytes)
    }

    fn http_response(headers: &str, body_len: usize) -> Vec<u8> {
        let mut response = format!("HTTP/1.1 200 OK\r\n{}Connection: close\r\n\r\n", headers)
            .into_bytes();
        response.extend(std::iter::repeat(b'x').take(body_len));
        response
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_is_rejected() {
        let url = serve_once(http_response("Content-Length: 64\r\n", 64)).await;
        let result = local_loader(16).fetch_remote(&url).await;
        assert!(matches!(result, Err(Error::MediaLoad(ref e)) if e.contains("larger than 16")));
    }

    #[tokio::test]
    async fn test_undeclared_body_over_limit_is_rejected() {
        let url = serve_once(http_response("", 64)).await;
        let result = local_loader(16).fetch_remote(&url).await;
        assert!(matches!(result, Err(Error::MediaLoad(ref e)) if e.contains("larger than 16")));
    }

    #[tokio::test]
    async fn test_body_within_limit_is_returned() {
        let url = serve_once(http_response("Content-Length: 8\r\n", 8)).await;
        let body = local_loader(16).fetch_remote(&url).await.unwrap();
        assert_eq!(&body[..], b"xxxxxxxx");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image_bytes(&[]), Err(Error::MediaLoad(_))));
        assert!(decode_image_bytes(b"not an image at all").is_err());
    }
}
