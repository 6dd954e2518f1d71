use super::{BrowserHandle, Launcher};
use crate::error::LaunchError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type LaunchResult<H> = Result<Arc<H>, LaunchError>;
type SharedLaunch<H> = Shared<BoxFuture<'static, LaunchResult<H>>>;

enum Slot<H> {
    Empty,
    /// Every caller arriving during a launch awaits this same future
    Launching(SharedLaunch<H>),
    Ready(Arc<H>),
}

/// Lazily launched, process-wide browser handle.
///
/// At most one launch runs at a time. Callers that arrive while it is in
/// flight share its outcome, and a failed launch leaves the pool empty so the
/// next call starts over.
pub struct BrowserPool<L: Launcher> {
    launcher: Arc<L>,
    slot: Mutex<Slot<L::Handle>>,
    launches: AtomicUsize,
}

impl<L: Launcher> BrowserPool<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher: Arc::new(launcher),
            slot: Mutex::new(Slot::Empty),
            launches: AtomicUsize::new(0),
        }
    }

    /// Return the live handle, launching the browser if needed
    pub async fn ensure(&self) -> Result<Arc<L::Handle>, LaunchError> {
        let launch = {
            let mut slot = self.lock_slot();
            if let Slot::Ready(handle) = &*slot {
                if handle.is_connected() {
                    return Ok(Arc::clone(handle));
                }
                ::log::warn!("Browser handle is no longer connected, relaunching");
            }

            if let Slot::Launching(inflight) = &*slot {
                ::log::debug!("Joining in-flight browser launch");
                inflight.clone()
            } else {
                let launch = self.start_launch();
                *slot = Slot::Launching(launch.clone());
                launch
            }
        };

        let result = launch.clone().await;
        self.settle(&launch, &result);
        result
    }

    /// Launch ahead of the first scrape
    pub async fn warm_up(&self) -> Result<(), LaunchError> {
        self.ensure().await.map(|_| ())
    }

    /// Close the browser if one is running. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let handle = {
            let mut slot = self.lock_slot();
            match std::mem::replace(&mut *slot, Slot::Empty) {
                Slot::Ready(handle) => Some(handle),
                other => {
                    *slot = other;
                    None
                }
            }
        };

        let Some(handle) = handle else {
            ::log::debug!("No browser running, nothing to close");
            return;
        };

        ::log::info!("Closing browser");
        if let Err(e) = handle.close().await {
            ::log::warn!("Failed to close browser: {}", e);
        }
    }

    /// Whether a connected handle is currently held
    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock_slot(), Slot::Ready(handle) if handle.is_connected())
    }

    /// Number of launches started since the pool was created
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn start_launch(&self) -> SharedLaunch<L::Handle> {
        let launcher = Arc::clone(&self.launcher);
        let attempt = self.launches.fetch_add(1, Ordering::SeqCst) + 1;

        async move {
            ::log::info!("Launching browser (attempt {})", attempt);
            let started = std::time::Instant::now();
            match launcher.launch().await {
                Ok(handle) => {
                    ::log::info!(
                        "Browser launched in {:.2} seconds",
                        started.elapsed().as_secs_f64()
                    );
                    Ok(Arc::new(handle))
                }
                Err(e) => {
                    ::log::error!("Browser launch failed: {}", e);
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Clear the in-flight marker once its launch has completed
    fn settle(&self, launch: &SharedLaunch<L::Handle>, result: &LaunchResult<L::Handle>) {
        let mut slot = self.lock_slot();
        let current = matches!(&*slot, Slot::Launching(inflight) if inflight.ptr_eq(launch));
        if !current {
            return;
        }
        *slot = match result {
            Ok(handle) => Slot::Ready(Arc::clone(handle)),
            Err(_) => Slot::Empty,
        };
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot<L::Handle>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
