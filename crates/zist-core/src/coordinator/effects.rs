//! Side effects a settled mutation asks the UI to perform.

use tokio::sync::mpsc;
use tracing::debug;

/// Sink for navigation and failure notifications.
pub trait UiEffects: Send + Sync {
    fn navigate(&self, route: &str);

    fn notify_failure(&self, message: &str);
}

/// Discards every effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEffects;

impl UiEffects for NoopEffects {
    fn navigate(&self, route: &str) {
        debug!("Ignoring navigation to {}", route);
    }

    fn notify_failure(&self, message: &str) {
        debug!("Ignoring failure notification: {}", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    Navigate(String),
    Failure(String),
}

/// Forwards effects to a channel the UI drains.
#[derive(Debug, Clone)]
pub struct ChannelEffects {
    tx: mpsc::UnboundedSender<UiEffect>,
}

impl ChannelEffects {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEffect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, effect: UiEffect) {
        if self.tx.send(effect).is_err() {
            debug!("UI effect receiver dropped");
        }
    }
}

impl UiEffects for ChannelEffects {
    fn navigate(&self, route: &str) {
        self.send(UiEffect::Navigate(route.to_string()));
    }

    fn notify_failure(&self, message: &str) {
        self.send(UiEffect::Failure(message.to_string()));
    }
}
