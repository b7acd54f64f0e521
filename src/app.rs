//! Application state and interaction logic for the TUI.

use std::time::{Duration, Instant};

use telewatch_types::TelemetryValue;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};

use crate::client::LinkState;
use crate::dashboard::Dashboard;
use crate::data::History;
use crate::sequence::Notification;
use crate::store::{
    SettingUpdate, Settings, SettingsStore, TelemetryFrame, TelemetrySnapshot, MAX_VOLUME,
};
use crate::transport::Connector;
use crate::ui::Theme;

/// How long status bar feedback stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);
/// Volume change per keypress.
const VOLUME_STEP: u8 = 10;

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    /// Frozen display: new frames are not pulled from the store.
    pub paused: bool,

    // Inputs
    telemetry: watch::Receiver<TelemetrySnapshot>,
    frames: broadcast::Receiver<TelemetryFrame>,
    link_rx: watch::Receiver<LinkState>,
    settings_rx: watch::Receiver<Settings>,
    settings: SettingsStore,
    notifications: mpsc::UnboundedReceiver<Notification>,
    endpoint: String,

    // Displayed state
    pub snapshot: TelemetrySnapshot,
    pub link: LinkState,
    pub history: History,
    banner: Option<(Notification, Instant)>,

    // Navigation
    pub selected_index: usize,
    pub filter_text: String,
    pub filter_active: bool,

    pub theme: Theme,
    status_message: Option<(String, Instant)>,
}

impl App {
    /// Build the TUI state on top of a running dashboard.
    ///
    /// `notifications` is the receiving end of the
    /// [`ChannelNotifier`](crate::sequence::ChannelNotifier) the dashboard was
    /// launched with.
    pub fn new<C: Connector>(
        dashboard: &Dashboard<C>,
        notifications: mpsc::UnboundedReceiver<Notification>,
    ) -> Self {
        let settings = dashboard.settings().clone();
        let mut settings_rx = settings.subscribe();
        let theme = Theme::for_mode(settings_rx.borrow_and_update().theme);
        let link_rx = dashboard.client().watch_link();
        let link = *link_rx.borrow();

        Self {
            running: true,
            show_help: false,
            paused: false,
            telemetry: dashboard.telemetry().subscribe(),
            frames: dashboard.telemetry().frames(),
            link,
            link_rx,
            settings_rx,
            settings,
            notifications,
            endpoint: dashboard.client().endpoint(),
            snapshot: TelemetrySnapshot::default(),
            history: History::new(),
            banner: None,
            selected_index: 0,
            filter_text: String::new(),
            filter_active: false,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the telemetry endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current settings.
    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    /// Pull the latest state from the stores. Called once per UI tick.
    ///
    /// History is cleared when the link drops back to connecting, so rates
    /// and sparklines never span a reconnect.
    pub fn refresh(&mut self) {
        let link = *self.link_rx.borrow();
        if link != self.link && link == LinkState::Connecting {
            self.history.clear();
        }
        self.link = link;

        if self.settings_rx.has_changed().unwrap_or(false) {
            let mode = self.settings_rx.borrow_and_update().theme;
            self.theme = Theme::for_mode(mode);
        }

        while let Ok(notification) = self.notifications.try_recv() {
            self.banner = Some((notification, Instant::now()));
        }

        loop {
            match self.frames.try_recv() {
                Ok(frame) if !self.paused => self.history.record(&frame.data, frame.received_at),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if self.paused || !self.telemetry.has_changed().unwrap_or(false) {
            return;
        }
        self.snapshot = self.telemetry.borrow_and_update().clone();

        let max = self.visible_fields().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// The notification currently on screen, if its display time has not run out.
    pub fn banner(&self) -> Option<&Notification> {
        self.banner
            .as_ref()
            .filter(|(notification, shown_at)| shown_at.elapsed() < notification.duration)
            .map(|(notification, _)| notification)
    }

    /// Fields matching the filter, in name order.
    pub fn visible_fields(&self) -> Vec<(&String, &TelemetryValue)> {
        self.snapshot
            .fields
            .iter()
            .filter(|(name, _)| self.matches_filter(name))
            .collect()
    }

    /// Name of the selected field.
    pub fn selected_field(&self) -> Option<&str> {
        self.visible_fields()
            .get(self.selected_index)
            .map(|(name, _)| name.as_str())
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_fields().len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.visible_fields().len().saturating_sub(1);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Freeze or resume the display.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        let message = if self.paused { "Paused" } else { "Resumed" };
        self.set_status_message(message.to_string());
    }

    /// Flip the notifications setting.
    pub fn toggle_notifications(&mut self) {
        let enabled = !self.settings.get().notifications;
        self.update_setting(SettingUpdate::Notifications(enabled));
    }

    /// Flip the sounds setting.
    pub fn toggle_sounds(&mut self) {
        let enabled = !self.settings.get().sounds;
        self.update_setting(SettingUpdate::Sounds(enabled));
    }

    /// Raise or lower the volume by one step, clamped to 0..=100.
    pub fn adjust_volume(&mut self, up: bool) {
        let volume = self.settings.get().volume;
        let volume = if up {
            volume.saturating_add(VOLUME_STEP).min(MAX_VOLUME)
        } else {
            volume.saturating_sub(VOLUME_STEP)
        };
        self.update_setting(SettingUpdate::Volume(volume));
    }

    /// Cycle auto → dark → light.
    pub fn cycle_theme(&mut self) {
        let next = self.settings.get().theme.next();
        self.update_setting(SettingUpdate::Theme(next));
    }

    fn update_setting(&mut self, update: SettingUpdate) {
        self.settings.apply(update);
        let settings = self.settings.get();
        let value = match update.key() {
            "notifications" => on_off(settings.notifications).to_string(),
            "sounds" => on_off(settings.sounds).to_string(),
            "volume" => settings.volume.to_string(),
            "theme" => settings.theme.to_string(),
            _ => settings.refresh_rate.to_string(),
        };
        self.set_status_message(format!("{}: {}", update.key(), value));
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_index = 0;
    }

    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a field name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::sequence::ChannelNotifier;
    use crate::store::{TelemetrySink, ThemeMode};
    use crate::transport::memory::{self, MemoryConnector, ServerHandle};
    use std::sync::Arc;
    use telewatch_types::TelemetryData;

    pub(crate) fn test_app() -> (App, Dashboard<MemoryConnector>, ServerHandle) {
        let mut config = AppConfig::load(None).unwrap();
        config.settings.theme = ThemeMode::Dark;
        let (connector, server) = memory::pair();
        let (notifier, notifications) = ChannelNotifier::create();
        let dashboard = Dashboard::launch(&config, connector, Arc::new(notifier), None).unwrap();
        let app = App::new(&dashboard, notifications);
        (app, dashboard, server)
    }

    #[tokio::test]
    async fn test_refresh_pulls_frames_and_records_history() {
        let (mut app, dashboard, _server) = test_app();

        dashboard.telemetry().update(TelemetryData::new().with("speed", 1.0).with("mode", "auto"));
        dashboard.telemetry().update(TelemetryData::new().with("speed", 2.0));
        app.refresh();

        assert_eq!(app.snapshot.frames, 2);
        assert_eq!(app.visible_fields().len(), 2);
        assert_eq!(app.selected_field(), Some("mode"));
    }

    #[tokio::test]
    async fn test_back_to_back_frames_all_reach_history() {
        let (mut app, dashboard, _server) = test_app();

        dashboard.telemetry().update(TelemetryData::new().with("speed", 1.0));
        dashboard.telemetry().update(TelemetryData::new().with("speed", 3.0));
        dashboard.telemetry().update(TelemetryData::new().with("speed", 2.0));
        app.refresh();

        assert_eq!(app.history.sparkline("speed"), vec![0, 7, 4]);
    }

    #[tokio::test]
    async fn test_reconnect_clears_history() {
        let (mut app, dashboard, server) = test_app();
        let mut link = dashboard.client().watch_link();

        server.connect().await;
        server.subscribed().await;
        server.telemetry(r#"{"speed": 1.0}"#).await;
        server.telemetry(r#"{"speed": 2.0}"#).await;
        dashboard.telemetry().wait_for(|s| s.frames == 2).await;
        app.refresh();
        assert_eq!(app.link, LinkState::Streaming);
        assert_eq!(app.history.sparkline("speed").len(), 2);

        server.disconnect("eof").await;
        link.wait_for(|state| *state == LinkState::Connecting).await.unwrap();
        app.refresh();

        assert_eq!(app.link, LinkState::Connecting);
        assert!(app.history.sparkline("speed").is_empty());
        assert_eq!(app.history.frame_rate(), None);
    }

    #[tokio::test]
    async fn test_pause_freezes_display() {
        let (mut app, dashboard, _server) = test_app();
        app.toggle_pause();

        dashboard.telemetry().update(TelemetryData::new().with("speed", 1.0));
        app.refresh();
        assert_eq!(app.snapshot.frames, 0);

        app.toggle_pause();
        app.refresh();
        assert_eq!(app.snapshot.frames, 1);
    }

    #[tokio::test]
    async fn test_filter_and_selection() {
        let (mut app, dashboard, _server) = test_app();
        dashboard.telemetry().update(
            TelemetryData::new()
                .with("battery", 80.0)
                .with("speed_left", 1.0)
                .with("speed_right", 1.0),
        );
        app.refresh();

        app.select_last();
        assert_eq!(app.selected_field(), Some("speed_right"));

        for c in "SPEED".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.visible_fields().len(), 2);
        assert_eq!(app.selected_field(), Some("speed_left"));

        app.clear_filter();
        assert_eq!(app.visible_fields().len(), 3);
    }

    #[tokio::test]
    async fn test_setting_toggles() {
        let (mut app, _dashboard, _server) = test_app();

        app.toggle_notifications();
        assert!(!app.settings().notifications);
        assert_eq!(app.get_status_message(), Some("notifications: off"));

        for _ in 0..20 {
            app.adjust_volume(true);
        }
        assert_eq!(app.settings().volume, MAX_VOLUME);
        app.adjust_volume(false);
        assert_eq!(app.settings().volume, MAX_VOLUME - VOLUME_STEP);

        app.cycle_theme();
        assert_eq!(app.settings().theme, ThemeMode::Light);
    }
}
