//! Notification sink: in-terminal toasts plus optional desktop notifications

use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

pub const TOAST_SHORT: Duration = Duration::from_secs(3);
pub const TOAST_MEDIUM: Duration = Duration::from_secs(5);
pub const TOAST_LONG: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

impl ToastLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }

    /// Errors linger; everything else uses the medium duration.
    pub const fn default_duration(self) -> Duration {
        match self {
            Self::Error => TOAST_LONG,
            Self::Success | Self::Info => TOAST_MEDIUM,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

/// Where notifications are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationBackend {
    /// No notifications
    None,
    /// In-terminal toast overlay only
    #[default]
    Toast,
    /// Desktop notifications only (via notify-rust)
    System,
    /// Both toast overlay and desktop notifications
    Both,
}

impl NotificationBackend {
    /// Parse backend from settings value (case-insensitive)
    pub fn from_settings_value(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Toast => "toast",
            Self::System => "system",
            Self::Both => "both",
        }
    }

    /// Next backend in cycling order: toast -> both -> system -> none -> toast
    pub fn next(&self) -> Self {
        match self {
            Self::Toast => Self::Both,
            Self::Both => Self::System,
            Self::System => Self::None,
            Self::None => Self::Toast,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Self::Toast => Self::None,
            Self::None => Self::System,
            Self::System => Self::Both,
            Self::Both => Self::Toast,
        }
    }
}

impl FromStr for NotificationBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "toast" => Ok(Self::Toast),
            "system" => Ok(Self::System),
            "both" => Ok(Self::Both),
            _ => Err(()),
        }
    }
}

fn backend_targets(backend: NotificationBackend) -> (bool, bool) {
    match backend {
        NotificationBackend::None => (false, false),
        NotificationBackend::Toast => (true, false),
        NotificationBackend::System => (false, true),
        NotificationBackend::Both => (true, true),
    }
}

/// Fire-and-forget message queue rendered as an overlay. Messages auto-expire
/// on sweep; nothing here ever blocks or reports back to the caller.
#[derive(Debug, Default)]
pub struct Toasts {
    entries: Vec<Toast>,
    backend: NotificationBackend,
}

impl Toasts {
    pub fn new(backend: NotificationBackend) -> Self {
        Self {
            entries: Vec::new(),
            backend,
        }
    }

    pub fn backend(&self) -> NotificationBackend {
        self.backend
    }

    pub fn set_backend(&mut self, backend: NotificationBackend) {
        self.backend = backend;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message.into());
    }

    fn push(&mut self, level: ToastLevel, message: String) {
        let (show_toast, show_system) = backend_targets(self.backend);
        debug!(level = level.as_str(), message = %message, "notification");

        if show_toast {
            self.entries.push(Toast {
                expires_at: Instant::now() + level.default_duration(),
                level,
                message: message.clone(),
            });
        }

        if show_system {
            send_system_notification(level, &message);
        }
    }

    /// Drop expired entries; called from the tick handler.
    pub fn sweep(&mut self, now: Instant) {
        self.entries.retain(|toast| toast.expires_at > now);
    }

    /// Explicit user dismissal of everything currently visible.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[Toast] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn send_system_notification(level: ToastLevel, message: &str) {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        let timeout_ms = level.default_duration().as_millis().min(u32::MAX as u128) as u32;
        let icon = match level {
            ToastLevel::Error => "dialog-error",
            ToastLevel::Success | ToastLevel::Info => "dialog-information",
        };

        let result = notify_rust::Notification::new()
            .summary("taskdeck")
            .body(message)
            .icon(icon)
            .timeout(notify_rust::Timeout::Milliseconds(timeout_ms))
            .show();

        if let Err(err) = result {
            warn!(error = %err, "failed to send system notification");
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        debug!(
            level = level.as_str(),
            "system notifications not supported on this OS"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(
            NotificationBackend::from_settings_value("toast"),
            Some(NotificationBackend::Toast)
        );
        assert_eq!(
            NotificationBackend::from_settings_value("SYSTEM"),
            Some(NotificationBackend::System)
        );
        assert_eq!(
            NotificationBackend::from_settings_value("Both"),
            Some(NotificationBackend::Both)
        );
        assert_eq!(
            NotificationBackend::from_settings_value("none"),
            Some(NotificationBackend::None)
        );
        assert_eq!(NotificationBackend::from_settings_value("popup"), None);
        assert_eq!(NotificationBackend::from_settings_value(""), None);
    }

    #[test]
    fn test_backend_cycling_roundtrip() {
        for backend in [
            NotificationBackend::None,
            NotificationBackend::Toast,
            NotificationBackend::System,
            NotificationBackend::Both,
        ] {
            assert_eq!(backend.next().previous(), backend);
            assert_eq!(
                NotificationBackend::from_settings_value(backend.as_str()),
                Some(backend)
            );
        }
    }

    #[test]
    fn test_backend_targets() {
        assert_eq!(backend_targets(NotificationBackend::None), (false, false));
        assert_eq!(backend_targets(NotificationBackend::Toast), (true, false));
        assert_eq!(backend_targets(NotificationBackend::System), (false, true));
        assert_eq!(backend_targets(NotificationBackend::Both), (true, true));
    }

    #[test]
    fn test_error_toasts_use_long_duration() {
        assert_eq!(ToastLevel::Error.default_duration(), TOAST_LONG);
        assert_eq!(ToastLevel::Success.default_duration(), TOAST_MEDIUM);
        assert_eq!(ToastLevel::Info.default_duration(), TOAST_MEDIUM);
    }

    #[test]
    fn test_toasts_queue_and_sweep() {
        let mut toasts = Toasts::new(NotificationBackend::Toast);
        toasts.success("task created");
        toasts.error("upload failed");
        assert_eq!(toasts.entries().len(), 2);

        toasts.sweep(Instant::now());
        assert_eq!(toasts.entries().len(), 2);

        toasts.sweep(Instant::now() + Duration::from_secs(60));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_none_backend_drops_messages() {
        let mut toasts = Toasts::new(NotificationBackend::None);
        toasts.info("invisible");
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_clear_dismisses_everything() {
        let mut toasts = Toasts::new(NotificationBackend::Toast);
        toasts.info("one");
        toasts.info("two");
        toasts.clear();
        assert!(toasts.is_empty());
    }
}
