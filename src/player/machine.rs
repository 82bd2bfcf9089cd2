//! Playback of one collection, with seamless switching between its videos.
//!
//! The [`Player`] never predicts playback state. Commands go to the
//! [`MediaElement`] and [`PlayerContext`] is updated only from the events the
//! element reports, so autonomous changes (a stall, an external pause) are
//! reflected the same way as requested ones. The one exception is a media
//! error, which always leaves the context stopped.

use super::media::{MediaElement, MediaEvent, Subscription};
use crate::media::catalog::{Collection, VideoAsset};
use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerState {
    /// No asset loaded.
    Idle,
    Ready,
    /// An asset swap is in flight.
    Switching,
}

/// Mirror of the live playback context, as last reported by the element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerContext {
    pub active_index: usize,
    pub is_playing: bool,
    pub is_muted: bool,
    pub volume: f64,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub playback_rate: f64,
    pub is_transitioning: bool,
}

/// Settings captured from the outgoing asset and reapplied to the incoming one.
#[derive(Debug, Clone, PartialEq)]
struct PlaybackSnapshot {
    position_seconds: f64,
    volume: f64,
    is_muted: bool,
    playback_rate: f64,
    is_playing: bool,
}

impl PlaybackSnapshot {
    fn capture(element: &impl MediaElement) -> Self {
        Self {
            position_seconds: element.current_time(),
            volume: element.volume(),
            is_muted: element.muted(),
            playback_rate: element.playback_rate(),
            is_playing: !element.paused(),
        }
    }

    fn apply(&self, element: &mut impl MediaElement) {
        element.set_current_time(self.position_seconds);
        element.set_volume(self.volume);
        element.set_muted(self.is_muted);
        element.set_playback_rate(self.playback_rate);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Started,
    AlreadyActive,
    OutOfRange,
    /// A switch is already in flight; the request is dropped.
    Busy,
    Inactive,
}

pub struct Player<'a, M: MediaElement> {
    collection: &'a Collection,
    element: M,
    state: PlayerState,
    context: PlayerContext,
    pending: Option<PlaybackSnapshot>,
    subscription: Option<Subscription>,
    fullscreen: bool,
}

impl<'a, M: MediaElement> Player<'a, M> {
    /// Starts `Ready` on the first asset. The asset is loading; its data-ready
    /// signal arrives through the event stream like any other.
    pub fn new(collection: &'a Collection, mut element: M) -> Self {
        let subscription = element.events().subscribe();
        let context = PlayerContext {
            active_index: 0,
            is_playing: false,
            is_muted: element.muted(),
            volume: element.volume(),
            position_seconds: 0.0,
            duration_seconds: 0.0,
            playback_rate: element.playback_rate(),
            is_transitioning: false,
        };
        if let Some(first) = collection.asset(0) {
            element.load(&first.playable_url);
        }
        info!(
            "Playing collection {} ({} videos)",
            collection.id(),
            collection.len()
        );
        Self {
            collection,
            element,
            state: PlayerState::Ready,
            context,
            pending: None,
            subscription: Some(subscription),
            fullscreen: false,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn context(&self) -> &PlayerContext {
        &self.context
    }

    pub fn collection(&self) -> &'a Collection {
        self.collection
    }

    pub fn active_asset(&self) -> Option<&'a VideoAsset> {
        match self.state {
            PlayerState::Idle => None,
            _ => self.collection.asset(self.context.active_index),
        }
    }

    pub fn element(&self) -> &M {
        &self.element
    }

    pub fn switch_to(&mut self, index: usize) -> SwitchOutcome {
        match self.state {
            PlayerState::Idle => return SwitchOutcome::Inactive,
            PlayerState::Switching => {
                debug!("Ignoring switch to {} while switching", index);
                return SwitchOutcome::Busy;
            }
            PlayerState::Ready => {}
        }
        let Some(asset) = self.collection.asset(index) else {
            return SwitchOutcome::OutOfRange;
        };
        if index == self.context.active_index {
            return SwitchOutcome::AlreadyActive;
        }

        self.pending = Some(PlaybackSnapshot::capture(&self.element));
        self.state = PlayerState::Switching;
        self.context.is_transitioning = true;
        self.context.active_index = index;

        // Listeners are scoped to the active asset.
        self.subscription = None;
        self.subscription = Some(self.element.events().subscribe());

        debug!("Switching to {} ({})", index, asset.display_name);
        self.element.load(&asset.playable_url);
        SwitchOutcome::Started
    }

    pub fn handle_event(&mut self, event: MediaEvent) {
        if self.state == PlayerState::Idle {
            return;
        }
        match event {
            MediaEvent::LoadedData => self.on_loaded(),
            MediaEvent::TimeUpdate(seconds) => self.context.position_seconds = seconds,
            MediaEvent::DurationChange(seconds) => {
                self.context.duration_seconds = if seconds.is_finite() { seconds } else { 0.0 };
            }
            MediaEvent::Play => self.context.is_playing = true,
            MediaEvent::Pause => self.context.is_playing = false,
            MediaEvent::VolumeChange { volume, muted } => {
                self.context.volume = volume;
                self.context.is_muted = muted;
            }
            MediaEvent::RateChange(rate) => self.context.playback_rate = rate,
            MediaEvent::Error(message) => self.on_error(&message),
        }
    }

    fn on_loaded(&mut self) {
        if self.state != PlayerState::Switching {
            return;
        }
        if let Some(snapshot) = self.pending.take() {
            snapshot.apply(&mut self.element);
            if snapshot.is_playing {
                if let Err(e) = self.element.play() {
                    warn!("Could not resume playback after switch: {}", e);
                }
            }
        }
        self.state = PlayerState::Ready;
        self.context.is_transitioning = false;
    }

    fn on_error(&mut self, message: &str) {
        error!(
            "Media error on video {} of {}: {}",
            self.context.active_index,
            self.collection.id(),
            message
        );
        self.element.pause();
        // A failed element may never report the pause.
        self.context.is_playing = false;
        if self.state == PlayerState::Switching {
            self.pending = None;
            self.state = PlayerState::Ready;
            self.context.is_transitioning = false;
        }
    }

    /// Handles every queued event without waiting. Returns how many there were.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.subscription.as_mut().and_then(Subscription::try_next) {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Waits for the next event and handles it. `None` once ejected.
    pub async fn next_event(&mut self) -> Option<MediaEvent> {
        let event = self.subscription.as_mut()?.next().await?;
        self.handle_event(event.clone());
        Some(event)
    }

    fn accepts_intents(&self) -> bool {
        self.state == PlayerState::Ready
    }

    pub fn toggle_play_pause(&mut self) -> bool {
        if !self.accepts_intents() {
            return false;
        }
        if self.element.paused() {
            if let Err(e) = self.element.play() {
                warn!("Play request rejected: {}", e);
                return false;
            }
        } else {
            self.element.pause();
        }
        true
    }

    pub fn toggle_mute(&mut self) -> bool {
        if !self.accepts_intents() {
            return false;
        }
        let muted = self.element.muted();
        self.element.set_muted(!muted);
        true
    }

    /// Volume is clamped to `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f64) -> bool {
        if !self.accepts_intents() || !volume.is_finite() {
            return false;
        }
        self.element.set_volume(volume.clamp(0.0, 1.0));
        true
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> bool {
        if !self.accepts_intents() || !rate.is_finite() || rate <= 0.0 {
            return false;
        }
        self.element.set_playback_rate(rate);
        true
    }

    /// Seeks within the known duration. Before the duration is known only
    /// negative targets are clamped.
    pub fn seek(&mut self, seconds: f64) -> bool {
        if !self.accepts_intents() || !seconds.is_finite() {
            return false;
        }
        let duration = self.element.duration();
        let target = if duration.is_finite() && duration > 0.0 {
            seconds.clamp(0.0, duration)
        } else {
            seconds.max(0.0)
        };
        self.element.set_current_time(target);
        true
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Leave the collection: stop playback, drop listeners and go `Idle`.
    pub fn eject(&mut self) {
        if self.state == PlayerState::Idle {
            return;
        }
        self.subscription = None;
        self.element.pause();
        self.element.unload();
        self.pending = None;
        self.state = PlayerState::Idle;
        self.context.is_playing = false;
        self.context.is_transitioning = false;
        self.fullscreen = false;
        info!("Left collection {}", self.collection.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::simulated::SimulatedMedia;

    fn collection() -> Collection {
        let assets = ["One", "Two", "Three"]
            .iter()
            .enumerate()
            .map(|(i, name)| VideoAsset {
                declared_filename: format!("{}.mp4", i),
                display_name: name.to_string(),
                resolved_filename: format!("{}.mp4", i),
                playable_url: format!("blob:reelshelf/{}", i + 1),
            })
            .collect();
        Collection::new("set", "Set", "blob:thumb", None, 1, assets).unwrap()
    }

    fn ready_player(collection: &Collection) -> (Player<'_, SimulatedMedia>, SimulatedMedia) {
        let media = SimulatedMedia::new();
        let mut player = Player::new(collection, media.clone());
        media.finish_loading(30.0);
        player.pump();
        (player, media)
    }

    #[test]
    fn test_starts_ready_on_first_asset() {
        let collection = collection();
        let (player, media) = ready_player(&collection);

        assert_eq!(player.state(), PlayerState::Ready);
        assert_eq!(player.context().active_index, 0);
        assert_eq!(player.context().duration_seconds, 30.0);
        assert_eq!(player.active_asset().unwrap().display_name, "One");
        assert_eq!(media.loads(), vec!["blob:reelshelf/1".to_string()]);
    }

    #[test]
    fn test_switch_preserves_playback_settings() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        assert!(player.set_volume(0.4));
        assert!(player.set_playback_rate(1.5));
        assert!(player.toggle_mute());
        assert!(player.toggle_play_pause());
        media.tick(2.0);
        player.pump();
        assert!(player.context().is_playing);
        assert_eq!(player.context().position_seconds, 3.0);

        assert_eq!(player.switch_to(1), SwitchOutcome::Started);
        player.pump();
        assert_eq!(player.state(), PlayerState::Switching);
        assert!(player.context().is_transitioning);
        assert_eq!(player.context().active_index, 1);

        media.finish_loading(20.0);
        player.pump();

        assert_eq!(player.state(), PlayerState::Ready);
        assert!(!player.context().is_transitioning);
        assert_eq!(media.source().as_deref(), Some("blob:reelshelf/2"));
        assert_eq!(media.volume(), 0.4);
        assert_eq!(media.playback_rate(), 1.5);
        assert!(media.muted());
        assert_eq!(media.current_time(), 3.0);
        assert!(!media.paused());

        let context = player.context();
        assert!(context.is_playing);
        assert!(context.is_muted);
        assert_eq!(context.volume, 0.4);
        assert_eq!(context.playback_rate, 1.5);
        assert_eq!(context.position_seconds, 3.0);
        assert_eq!(context.duration_seconds, 20.0);
    }

    #[test]
    fn test_switch_keeps_paused_state() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.switch_to(2);
        media.finish_loading(10.0);
        player.pump();

        assert_eq!(player.state(), PlayerState::Ready);
        assert!(media.paused());
        assert!(!player.context().is_playing);
    }

    #[test]
    fn test_switch_while_switching_is_dropped() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);

        assert_eq!(player.switch_to(1), SwitchOutcome::Started);
        assert_eq!(player.switch_to(2), SwitchOutcome::Busy);
        assert_eq!(player.switch_to(0), SwitchOutcome::Busy);
        assert_eq!(media.loads().len(), 2);
        assert_eq!(player.context().active_index, 1);

        media.finish_loading(10.0);
        player.pump();
        assert_eq!(player.switch_to(2), SwitchOutcome::Started);
        assert_eq!(media.loads().len(), 3);
    }

    #[test]
    fn test_switch_rejects_bad_targets() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);

        assert_eq!(player.switch_to(0), SwitchOutcome::AlreadyActive);
        assert_eq!(player.switch_to(3), SwitchOutcome::OutOfRange);
        assert_eq!(player.state(), PlayerState::Ready);
        assert_eq!(media.loads().len(), 1);
    }

    #[test]
    fn test_load_error_during_switch_returns_to_ready() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.toggle_play_pause();
        player.pump();

        player.switch_to(1);
        media.fail_loading("decode failure");
        player.pump();

        assert_eq!(player.state(), PlayerState::Ready);
        assert!(!player.context().is_transitioning);
        assert!(!player.context().is_playing);
        assert!(media.paused());
        assert_eq!(player.switch_to(2), SwitchOutcome::Started);
    }

    #[test]
    fn test_error_stops_playback_without_pause_notification() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.toggle_play_pause();
        player.pump();
        assert!(player.context().is_playing);

        player.handle_event(MediaEvent::Error("network".to_string()));
        assert!(!player.context().is_playing);
        assert!(media.paused());
        assert_eq!(player.state(), PlayerState::Ready);
    }

    #[test]
    fn test_intents_are_ignored_while_switching() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.switch_to(1);

        assert!(!player.toggle_play_pause());
        assert!(!player.toggle_mute());
        assert!(!player.set_volume(0.1));
        assert!(!player.set_playback_rate(2.0));
        assert!(!player.seek(5.0));
        assert!(media.paused());
        assert_eq!(media.volume(), 1.0);
    }

    #[test]
    fn test_autonomous_pause_is_mirrored() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.toggle_play_pause();
        player.pump();
        assert!(player.context().is_playing);

        media.stall();
        player.pump();
        assert!(!player.context().is_playing);
    }

    #[test]
    fn test_context_waits_for_element_notifications() {
        let collection = collection();
        let (mut player, _media) = ready_player(&collection);

        player.set_volume(0.2);
        assert_eq!(player.context().volume, 1.0);
        player.pump();
        assert_eq!(player.context().volume, 0.2);
    }

    #[test]
    fn test_volume_rate_and_seek_are_bounded() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);

        assert!(player.set_volume(3.0));
        assert_eq!(media.volume(), 1.0);
        assert!(!player.set_volume(f64::NAN));
        assert!(!player.set_playback_rate(0.0));
        assert!(!player.set_playback_rate(-1.0));

        assert!(player.seek(45.0));
        assert_eq!(media.current_time(), 30.0);
        assert!(player.seek(-2.0));
        assert_eq!(media.current_time(), 0.0);
        assert!(!player.seek(f64::INFINITY));
    }

    #[test]
    fn test_fullscreen_is_independent_of_switching() {
        let collection = collection();
        let (mut player, _media) = ready_player(&collection);
        player.switch_to(1);

        assert!(player.toggle_fullscreen());
        assert!(player.is_fullscreen());
        assert_eq!(player.state(), PlayerState::Switching);
        assert!(!player.toggle_fullscreen());
    }

    #[test]
    fn test_eject_releases_listeners() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.toggle_play_pause();
        assert_eq!(media.events().listener_count(), 1);

        player.eject();
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(media.events().listener_count(), 0);
        assert!(media.source().is_none());
        assert!(player.active_asset().is_none());
        assert_eq!(player.switch_to(1), SwitchOutcome::Inactive);
        assert!(!player.toggle_play_pause());
    }

    #[test]
    fn test_switching_does_not_accumulate_listeners() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        for index in [1, 2, 0, 1] {
            player.switch_to(index);
            media.finish_loading(10.0);
            player.pump();
        }
        assert_eq!(media.events().listener_count(), 1);
        assert_eq!(player.context().active_index, 1);
    }

    #[tokio::test]
    async fn test_next_event_drives_switch() {
        let collection = collection();
        let (mut player, media) = ready_player(&collection);
        player.switch_to(1);
        media.finish_loading(12.0);

        assert_eq!(
            player.next_event().await,
            Some(MediaEvent::DurationChange(12.0))
        );
        assert_eq!(player.next_event().await, Some(MediaEvent::LoadedData));
        assert_eq!(player.state(), PlayerState::Ready);

        player.eject();
        assert_eq!(player.next_event().await, None);
    }
}
