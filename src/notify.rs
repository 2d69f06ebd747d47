//! User-visible notifications.
//!
//! Background failures (failed cycles, panicking tasks) are routed to a
//! [`Notifier`]. The TUI installs a [`StatusLine`], whose latest message is
//! shown in the status bar for a few seconds; without one, messages go to
//! stderr.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// Destination for user-visible messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);
}

/// A notification waiting to be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
    pub at: Instant,
}

/// Single-slot notifier read by the status bar. Newer messages replace
/// older ones. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    slot: Arc<Mutex<Option<Notice>>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current message, if it was posted less than `ttl` ago.
    pub fn current(&self, ttl: Duration) -> Option<Notice> {
        self.slot
            .lock()
            .as_ref()
            .filter(|n| n.at.elapsed() < ttl)
            .cloned()
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

impl Notifier for StatusLine {
    fn notify(&self, level: Level, message: &str) {
        *self.slot.lock() = Some(Notice {
            level,
            message: message.to_string(),
            at: Instant::now(),
        });
    }
}

/// Fallback when no status line is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, level: Level, message: &str) {
        eprintln!("envwatch {}: {}", level, message);
    }
}

/// Extract the message from a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Route panics on background threads to `notifier`.
///
/// Panics on the main thread still go to `on_main` (which typically
/// restores the terminal) and then to the previously installed hook.
pub fn install_panic_hook<F>(notifier: Arc<dyn Notifier>, on_main: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if std::thread::current().name() == Some("main") {
            on_main();
            original_hook(info);
            return;
        }
        let location = info
            .location()
            .map(|l| format!(" at {}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let message = panic_message(info.payload());
        tracing::error!("Background task panicked{}: {}", location, message);
        notifier.notify(Level::Error, &format!("Falha interna: {}", message));
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_keeps_latest() {
        let status = StatusLine::new();
        assert!(status.current(STATUS_TTL).is_none());

        status.notify(Level::Info, "first");
        status.notify(Level::Warning, "second");
        let notice = status.current(STATUS_TTL).unwrap();
        assert_eq!(notice.message, "second");
        assert_eq!(notice.level, Level::Warning);

        // Clones share the slot
        let other = status.clone();
        other.clear();
        assert!(status.current(STATUS_TTL).is_none());
    }

    #[test]
    fn test_status_line_expires() {
        let status = StatusLine::new();
        status.notify(Level::Error, "boom");
        assert!(status.current(Duration::ZERO).is_none());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert!(panic_message(payload.as_ref()).contains("non-string"));
    }
}
