use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    /// The server answered but refused or garbled the write.
    Error,
    /// The request never completed.
    Network,
}

/// A transient, auto-dismissing message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Notice {
    pub fn is_dismissed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Keeps notices until their display time runs out.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self { Self { ttl, notices: Mutex::new(Vec::new()) } }

    /// Notices still on screen; dismissed ones are dropped.
    pub fn active(&self) -> Vec<Notice> {
        let now = Instant::now();
        let mut notices = self.lock();
        notices.retain(|n| !n.is_dismissed(now));
        notices.clone()
    }

    pub fn latest(&self) -> Option<Notice> { self.active().pop() }

    fn lock(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.lock().push(Notice { kind, message: message.to_string(), shown_at: Instant::now(), ttl: self.ttl });
    }
}

/// Sends notices to the log; used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => tracing::info!("{message}"),
            NoticeKind::Error | NoticeKind::Network => tracing::error!(?kind, "{message}"),
        }
    }
}
