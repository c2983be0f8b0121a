//! Catalog load state for a mounted view
//!
//! A [`CatalogLoader`] fetches the catalog exactly once when it is mounted and
//! publishes the resulting [`CatalogLoadState`] on a watch channel. There is no
//! retry and no refetch; remounting is the only way to try again.

use crate::{Catalog, CatalogSource, Error};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Message shown when a catalog failure carries no text of its own
pub const CATALOG_FALLBACK_ERROR: &str = "Failed to load catalog";

/// Observable catalog fetch state.
///
/// `data` and `error` are never both set.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogLoadState {
    pub data: Option<Catalog>,
    pub error: Option<String>,
    pub loading: bool,
}

impl CatalogLoadState {
    fn succeeded(catalog: Catalog) -> Self {
        Self {
            data: Some(catalog),
            error: None,
            loading: false,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            data: None,
            error: Some(message),
            loading: false,
        }
    }

    /// True once the single fetch attempt has completed
    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

impl Default for CatalogLoadState {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: true,
        }
    }
}

/// Display text for a catalog failure
fn failure_message(err: &Error) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        CATALOG_FALLBACK_ERROR.to_string()
    } else {
        message
    }
}

/// One mounted instance of the catalog fetch.
///
/// Instances never share state or results. Dropping the loader unmounts it:
/// the in-flight fetch is not cancelled, but its result is discarded.
pub struct CatalogLoader {
    state_tx: Arc<watch::Sender<CatalogLoadState>>,
    state_rx: watch::Receiver<CatalogLoadState>,
    disposed: Arc<AtomicBool>,
}

impl CatalogLoader {
    /// Mount a loader and start its fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(source: Arc<dyn CatalogSource>) -> Self {
        let (state_tx, state_rx) = watch::channel(CatalogLoadState::default());
        let state_tx = Arc::new(state_tx);
        let disposed = Arc::new(AtomicBool::new(false));

        let tx = Arc::clone(&state_tx);
        let flag = Arc::clone(&disposed);
        tokio::spawn(async move {
            let next = match source.fetch_catalog().await {
                Ok(catalog) => CatalogLoadState::succeeded(catalog),
                Err(err) => {
                    error!(error = ?err, code = err.error_code(), "failed to fetch catalog");
                    CatalogLoadState::failed(failure_message(&err))
                }
            };

            // The flag is checked under the channel lock that unmount also takes
            let items = next.data.as_ref().map(Catalog::len);
            let published = tx.send_if_modified(|state| {
                if flag.load(Ordering::Acquire) {
                    return false;
                }
                *state = next;
                true
            });

            match (published, items) {
                (false, _) => debug!("Catalog settled after unmount, result dropped"),
                (true, Some(items)) => info!(items, "Catalog loaded"),
                (true, None) => {}
            }
        });

        Self {
            state_tx,
            state_rx,
            disposed,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> CatalogLoadState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<CatalogLoadState> {
        self.state_rx.clone()
    }

    /// Wait until the fetch has settled and return the final state
    pub async fn settled(&self) -> CatalogLoadState {
        let mut rx = self.state_rx.clone();
        let settled = rx.wait_for(CatalogLoadState::is_settled).await.map(|s| s.clone());
        match settled {
            Ok(state) => state,
            // Fetch task went away without publishing
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Unmount explicitly
    pub fn unmount(self) {}
}

impl Drop for CatalogLoader {
    fn drop(&mut self) {
        let disposed = &self.disposed;
        self.state_tx.send_if_modified(|_| {
            disposed.store(true, Ordering::Release);
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MediaRecord, Result};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn test_catalog() -> Catalog {
        Catalog::new(vec![
            MediaRecord {
                id: "test-1".into(),
                title: "Test Movie 1".into(),
                description: "Test description 1".into(),
                thumbnail: "https://example.com/thumb1.jpg".into(),
                stream_url: "https://example.com/test1.mp4".into(),
                duration: 1800.0,
            },
            MediaRecord {
                id: "test-2".into(),
                title: "Test Movie 2".into(),
                description: "Test description 2".into(),
                thumbnail: "https://example.com/thumb2.jpg".into(),
                stream_url: "https://example.com/test2.m3u8".into(),
                duration: 3600.0,
            },
        ])
    }

    /// Source that resolves once released
    struct GatedSource {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for GatedSource {
        async fn fetch_catalog(&self) -> Result<Catalog> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(test_catalog())
        }
    }

    struct FailingSource(fn() -> Error);

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch_catalog(&self) -> Result<Catalog> {
            Err((self.0)())
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let loader = CatalogLoader::mount(source);

        let state = loader.state();
        assert!(state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_loading_until_released() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let loader = CatalogLoader::mount(source.clone());

        tokio::task::yield_now().await;
        assert!(loader.state().loading);

        source.gate.notify_one();
        let state = loader.settled().await;

        assert!(!state.loading);
        assert_eq!(state.data, Some(test_catalog()));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_uses_failure_message() {
        let loader = CatalogLoader::mount(Arc::new(FailingSource(|| Error::network("Network error"))));

        let state = loader.settled().await;
        assert_eq!(state.error.as_deref(), Some("Network error"));
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_blank_failure_uses_fallback() {
        let loader = CatalogLoader::mount(Arc::new(FailingSource(|| Error::network(""))));

        let state = loader.settled().await;
        assert_eq!(state.error.as_deref(), Some(CATALOG_FALLBACK_ERROR));
    }

    #[tokio::test]
    async fn test_unmount_drops_late_result() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let loader = CatalogLoader::mount(source.clone());
        let mut rx = loader.subscribe();
        tokio::task::yield_now().await;

        loader.unmount();
        source.gate.notify_one();

        // The fetch task exits without publishing, closing the channel
        assert!(rx.changed().await.is_err());
        assert!(rx.borrow().loading);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unmount_racing_fetch_never_publishes() {
        for _ in 0..50 {
            let source = Arc::new(GatedSource {
                gate: Notify::new(),
                calls: AtomicUsize::new(0),
            });
            let loader = CatalogLoader::mount(source.clone());
            let mut rx = loader.subscribe();

            source.gate.notify_one();
            loader.unmount();

            // Either the result landed before unmount or nothing is ever published after it
            let before_unmount = rx.borrow_and_update().clone();
            let closed = rx.changed().await.is_err();
            assert!(closed);
            assert_eq!(*rx.borrow(), before_unmount);
        }
    }
}
