//! Cancellable delayed actions for the player's auto-hiding overlays.

use crate::config::PlayerConfig;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// At most one pending action; scheduling again replaces it. Must be used
/// inside a tokio runtime.
#[derive(Debug, Default)]
pub struct DelayedAction {
    handle: Option<JoinHandle<()>>,
}

impl DelayedAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_async(delay, async move { action() });
    }

    pub fn schedule_async<Fut>(&mut self, delay: Duration, action: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        // The deadline is fixed now, not when the task is first polled.
        let sleep = tokio::time::sleep(delay);
        self.handle = Some(tokio::spawn(async move {
            sleep.await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DelayedAction {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Player controls: shown on any pointer activity, hidden again after a
/// quiet period.
#[derive(Debug)]
pub struct ControlsVisibility {
    visible: Arc<AtomicBool>,
    hide: DelayedAction,
    hide_after: Duration,
}

impl ControlsVisibility {
    pub fn new(hide_after: Duration) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(true)),
            hide: DelayedAction::new(),
            hide_after,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(Duration::from_millis(config.controls_hide_ms))
    }

    pub fn on_pointer_activity(&mut self) {
        self.visible.store(true, Ordering::SeqCst);
        let visible = Arc::clone(&self.visible);
        self.hide.schedule(self.hide_after, move || {
            visible.store(false, Ordering::SeqCst);
        });
    }

    /// Outside fullscreen the controls stay up once the pointer leaves.
    pub fn on_pointer_leave(&mut self, fullscreen: bool) {
        if fullscreen {
            return;
        }
        debug!("Pointer left player, pinning controls");
        self.hide.cancel();
        self.visible.store(true, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

/// The video selector panel: opens on hover, closes shortly after hover ends.
#[derive(Debug)]
pub struct SelectorPanel {
    visible: Arc<AtomicBool>,
    hide: DelayedAction,
    hide_after: Duration,
}

impl SelectorPanel {
    pub fn new(hide_after: Duration) -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(false)),
            hide: DelayedAction::new(),
            hide_after,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(Duration::from_millis(config.selector_hide_ms))
    }

    pub fn hover(&mut self, hovering: bool) {
        if hovering {
            self.hide.cancel();
            self.visible.store(true, Ordering::SeqCst);
        } else {
            let visible = Arc::clone(&self.visible);
            self.hide.schedule(self.hide_after, move || {
                visible.store(false, Ordering::SeqCst);
            });
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}
