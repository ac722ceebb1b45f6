use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppEvent;

/// How long a toast stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget transient messages
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn success(&self, message: &str) {
        self.notify(Toast::success(message));
    }

    fn error(&self, message: &str) {
        self.notify(Toast::error(message));
    }
}

pub struct ChannelNotifier {
    tx: UnboundedSender<AppEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        let _ = self.tx.send(AppEvent::Toast(toast));
    }
}

/// Toasts currently on screen, oldest first
#[derive(Debug, Default)]
pub struct ToastQueue {
    entries: Vec<(Toast, Instant)>,
}

impl ToastQueue {
    pub fn push(&mut self, toast: Toast, now: Instant) {
        self.entries.push((toast, now));
    }

    /// Drop toasts older than [`TOAST_TTL`]
    pub fn expire(&mut self, now: Instant) {
        self.entries
            .retain(|(_, shown_at)| now.saturating_duration_since(*shown_at) < TOAST_TTL);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.entries.iter().map(|(toast, _)| toast)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
