//! The live playback context the player drives, and how it reports back.
//!
//! A [`MediaElement`] is the source of truth for playback: the player issues
//! commands to it and learns the outcome only through [`MediaEvent`]s. Events
//! are delivered to scoped [`Subscription`]s that deregister themselves when
//! dropped, so replacing a subscription can never leak a listener.

use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::{self, error::TryRecvError};

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Enough media is available to render the current position.
    LoadedData,
    TimeUpdate(f64),
    DurationChange(f64),
    Play,
    Pause,
    VolumeChange { volume: f64, muted: bool },
    RateChange(f64),
    Error(String),
}

pub trait MediaElement {
    fn events(&self) -> &MediaEventBus;

    /// Replace the source and start loading it. Loading resets position and
    /// pauses; `LoadedData` or `Error` follows asynchronously.
    fn load(&mut self, url: &str);
    fn unload(&mut self);

    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn paused(&self) -> bool;

    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&mut self, rate: f64);
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<MediaEvent>>,
}

/// Fan-out of media events to every live subscription.
#[derive(Debug, Clone, Default)]
pub struct MediaEventBus {
    listeners: Arc<Mutex<Listeners>>,
}

impl MediaEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = self.lock();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.senders.insert(id, tx);
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
            rx,
        }
    }

    pub fn emit(&self, event: MediaEvent) {
        self.lock()
            .senders
            .retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.lock().senders.len()
    }
}

/// A registration on a [`MediaEventBus`], removed when dropped.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
    rx: mpsc::UnboundedReceiver<MediaEvent>,
}

impl Subscription {
    /// Next queued event, without waiting.
    pub fn try_next(&mut self) -> Option<MediaEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub async fn next(&mut self) -> Option<MediaEvent> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .senders
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_reach_every_subscription() {
        let bus = MediaEventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(MediaEvent::Play);
        bus.emit(MediaEvent::TimeUpdate(2.5));

        assert_eq!(a.try_next(), Some(MediaEvent::Play));
        assert_eq!(a.try_next(), Some(MediaEvent::TimeUpdate(2.5)));
        assert_eq!(a.try_next(), None);
        assert_eq!(b.try_next(), Some(MediaEvent::Play));
    }

    #[test]
    fn test_drop_deregisters() {
        let bus = MediaEventBus::new();
        let first = bus.subscribe();
        let _second = bus.subscribe();
        assert_eq!(bus.listener_count(), 2);

        drop(first);
        assert_eq!(bus.listener_count(), 1);
        bus.emit(MediaEvent::Pause);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = MediaEventBus::new();
        let mut sub = bus.subscribe();
        bus.emit(MediaEvent::LoadedData);
        drop(bus);

        assert_eq!(sub.try_next(), Some(MediaEvent::LoadedData));
        assert_eq!(sub.try_next(), None);
    }

    #[tokio::test]
    async fn test_next_waits_for_event() {
        let bus = MediaEventBus::new();
        let mut sub = bus.subscribe();
        let emitter = bus.clone();
        tokio::spawn(async move {
            emitter.emit(MediaEvent::RateChange(1.5));
        });
        assert_eq!(sub.next().await, Some(MediaEvent::RateChange(1.5)));
    }
}
