//! The process-wide browser handle.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};

/// Exclusive access to the shared browser, released on drop.
pub type BrowserGuard<D> = OwnedMappedMutexGuard<Option<D>, D>;

/// The one browser the process owns.
///
/// Starting a browser is slow, so the handle is created empty and the driver
/// installed once it is ready. Everything that drives the browser goes
/// through [`SharedBrowser::acquire`], so at most one operation touches it
/// at a time.
pub struct SharedBrowser<D> {
    slot: Arc<Mutex<Option<D>>>,
}

impl<D> Clone for SharedBrowser<D> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<D> Default for SharedBrowser<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D> SharedBrowser<D> {
    /// A handle with no browser installed yet.
    pub fn empty() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn new(driver: D) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(driver))),
        }
    }

    /// Install a driver, returning the one it replaces.
    pub async fn install(&self, driver: D) -> Option<D> {
        self.slot.lock().await.replace(driver)
    }

    /// Remove the driver, e.g. to close it at shutdown.
    pub async fn take(&self) -> Option<D> {
        self.slot.lock().await.take()
    }

    /// Wait for exclusive access. `None` if no driver is installed.
    pub async fn acquire(&self) -> Option<BrowserGuard<D>> {
        let guard = Arc::clone(&self.slot).lock_owned().await;
        OwnedMutexGuard::try_map(guard, Option::as_mut).ok()
    }

    /// Exclusive access without waiting. `None` if busy or not installed.
    pub fn try_acquire(&self) -> Option<BrowserGuard<D>> {
        let guard = Arc::clone(&self.slot).try_lock_owned().ok()?;
        OwnedMutexGuard::try_map(guard, Option::as_mut).ok()
    }

    /// Whether a driver has been installed.
    pub async fn is_installed(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_until_installed() {
        let shared: SharedBrowser<u32> = SharedBrowser::empty();
        assert!(shared.acquire().await.is_none());
        assert!(!shared.is_installed().await);

        assert_eq!(shared.install(7).await, None);
        assert!(shared.is_installed().await);
        assert_eq!(*shared.acquire().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn guard_is_exclusive() {
        let shared = SharedBrowser::new(1u32);
        let other = shared.clone();

        let mut guard = shared.acquire().await.unwrap();
        assert!(other.try_acquire().is_none());
        *guard += 1;
        drop(guard);

        assert_eq!(*other.try_acquire().unwrap(), 2);
    }

    #[tokio::test]
    async fn take_removes_driver() {
        let shared = SharedBrowser::new(3u32);
        assert_eq!(shared.take().await, Some(3));
        assert!(shared.acquire().await.is_none());
    }
}
