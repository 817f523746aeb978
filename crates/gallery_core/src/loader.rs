//! Asynchronous content loading service
//!
//! Requests are queued to a worker thread that calls into the blocking
//! `ContentProvider`; outcomes flow back over a channel drained by the
//! session pump. Every outcome carries the slide occupancy epoch it was
//! issued under so late completions of reset slides are ignored.

use crate::error::GalleryError;
use crate::provider::{CancelToken, ContentProvider, ImageInfo};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Work the provider performs for one slide
#[derive(Debug, Clone)]
pub(crate) enum LoadTask {
    Image {
        url: String,
    },
    Fragment {
        url: String,
        /// Request settings forwarded to the provider (marker field included)
        settings: serde_json::Value,
    },
    Embedded {
        src: String,
    },
}

#[derive(Debug)]
pub(crate) struct LoadRequest {
    pub position: i64,
    pub epoch: u64,
    pub task: LoadTask,
    pub cancel: CancelToken,
}

/// Successful payload per task kind
#[derive(Debug, Clone)]
pub(crate) enum LoadPayload {
    Image { url: String, info: ImageInfo },
    Fragment { body: String },
    Embedded { measured: Option<(u32, u32)> },
}

#[derive(Debug)]
pub(crate) struct LoadResult {
    pub position: i64,
    pub epoch: u64,
    pub outcome: Result<LoadPayload, GalleryError>,
    /// The request was cancelled before or during execution; never an error
    pub aborted: bool,
}

/// Content loader service
pub struct ContentLoader {
    provider: Arc<dyn ContentProvider>,
    request_tx: mpsc::UnboundedSender<LoadRequest>,
    results_rx: crossbeam_channel::Receiver<LoadResult>,
}

impl ContentLoader {
    /// Create a loader and spawn its worker thread
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<LoadRequest>();
        let (results_tx, results_rx) = crossbeam_channel::unbounded::<LoadResult>();
        let worker_provider = provider.clone();

        std::thread::spawn(move || {
            while let Some(request) = request_rx.blocking_recv() {
                let result = Self::execute(&*worker_provider, &request);
                if results_tx.send(result).is_err() {
                    break;
                }
            }
        });

        Self {
            provider,
            request_tx,
            results_rx,
        }
    }

    fn execute(provider: &dyn ContentProvider, request: &LoadRequest) -> LoadResult {
        if request.cancel.is_cancelled() {
            return LoadResult {
                position: request.position,
                epoch: request.epoch,
                outcome: Err(GalleryError::Fetch("aborted".into())),
                aborted: true,
            };
        }

        let outcome = match &request.task {
            LoadTask::Image { url } => provider
                .load_image(url, &request.cancel)
                .map(|info| LoadPayload::Image {
                    url: url.clone(),
                    info,
                }),
            LoadTask::Fragment { url, settings } => provider
                .fetch_fragment(url, settings, &request.cancel)
                .map(|body| LoadPayload::Fragment { body }),
            LoadTask::Embedded { src } => provider
                .probe_embedded(src)
                .map(|measured| LoadPayload::Embedded { measured }),
        };

        LoadResult {
            position: request.position,
            epoch: request.epoch,
            outcome,
            aborted: request.cancel.is_cancelled(),
        }
    }

    /// Queue a load; fails only when the worker is gone
    pub(crate) fn submit(&self, request: LoadRequest) -> Result<(), GalleryError> {
        self.request_tx
            .send(request)
            .map_err(|_| GalleryError::Provider("loader channel closed".into()))
    }

    /// Drain completed loads without blocking
    pub(crate) fn drain(&self) -> Vec<LoadResult> {
        self.results_rx.try_iter().collect()
    }

    /// Synchronous inline-reference resolution
    pub(crate) fn resolve_inline(&self, reference: &str) -> Option<String> {
        self.provider.resolve_inline(reference)
    }
}

/// Delay before hiding the ghost thumbnail once the full image lands.
///
/// Scales linearly with image height and caps at 300ms (a 1600px-tall image
/// hits the cap).
pub fn ghost_hide_delay(height: f32) -> Duration {
    let ms = ((height / 1600.0) * 300.0).clamp(0.0, 300.0);
    Duration::from_millis(ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockProvider;

    fn wait_for_results(loader: &ContentLoader, n: usize) -> Vec<LoadResult> {
        let mut out = Vec::new();
        for _ in 0..500 {
            out.extend(loader.drain());
            if out.len() >= n {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        out
    }

    #[test]
    fn test_image_load_round_trip() {
        let provider = Arc::new(MockProvider::new());
        provider
            .images
            .lock()
            .unwrap()
            .insert("a.jpg".into(), (1600, 900));
        let loader = ContentLoader::new(provider);

        loader
            .submit(LoadRequest {
                position: 0,
                epoch: 1,
                task: LoadTask::Image { url: "a.jpg".into() },
                cancel: CancelToken::new(),
            })
            .unwrap();

        let results = wait_for_results(&loader, 1);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.position, 0);
        assert_eq!(r.epoch, 1);
        assert!(!r.aborted);
        match r.outcome.as_ref().unwrap() {
            LoadPayload::Image { info, .. } => {
                assert_eq!((info.width, info.height), (1600, 900));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_failed_fetch_reports_error() {
        let provider = Arc::new(MockProvider::new());
        let loader = ContentLoader::new(provider);

        loader
            .submit(LoadRequest {
                position: 2,
                epoch: 1,
                task: LoadTask::Fragment {
                    url: "gone".into(),
                    settings: serde_json::Value::Null,
                },
                cancel: CancelToken::new(),
            })
            .unwrap();

        let results = wait_for_results(&loader, 1);
        assert!(results[0].outcome.is_err());
        assert!(!results[0].aborted);
    }

    #[test]
    fn test_cancelled_request_is_aborted_not_errored() {
        let provider = Arc::new(MockProvider::new());
        let loader = ContentLoader::new(provider);

        let cancel = CancelToken::new();
        cancel.cancel();
        loader
            .submit(LoadRequest {
                position: 0,
                epoch: 1,
                task: LoadTask::Fragment {
                    url: "gone".into(),
                    settings: serde_json::Value::Null,
                },
                cancel,
            })
            .unwrap();

        let results = wait_for_results(&loader, 1);
        assert!(results[0].aborted);
    }

    #[test]
    fn test_ghost_hide_delay_scales_and_caps() {
        assert_eq!(ghost_hide_delay(0.0), Duration::ZERO);
        assert_eq!(ghost_hide_delay(800.0), Duration::from_millis(150));
        assert_eq!(ghost_hide_delay(1600.0), Duration::from_millis(300));
        assert_eq!(ghost_hide_delay(5000.0), Duration::from_millis(300));
    }
}
