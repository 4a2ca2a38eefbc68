//! Latest-token channel between the token manager and its readers.

use std::sync::Arc;
use tokio::sync::watch;

use crate::spotify::AccessToken;

/// Create a connected publisher/watcher pair with no token yet.
pub fn token_channel() -> (TokenPublisher, TokenWatcher) {
    let (tx, rx) = watch::channel(None);
    (
        TokenPublisher { tx: Arc::new(tx) },
        TokenWatcher { rx, current: None },
    )
}

/// Write side. Publishing overwrites any unread value and never blocks.
#[derive(Clone)]
pub struct TokenPublisher {
    tx: Arc<watch::Sender<Option<AccessToken>>>,
}

impl TokenPublisher {
    pub fn publish(&self, token: AccessToken) {
        self.tx.send_replace(Some(token));
    }
}

/// Read side. Holds the last token it picked up.
pub struct TokenWatcher {
    rx: watch::Receiver<Option<AccessToken>>,
    current: Option<AccessToken>,
}

impl TokenWatcher {
    /// The newest published token, or the one already held if nothing new arrived.
    ///
    /// Never waits on the channel.
    pub fn latest(&mut self) -> Option<&AccessToken> {
        if let Ok(true) = self.rx.has_changed() {
            self.current = self.rx.borrow_and_update().clone();
            tracing::debug!("Picked up new access token");
        }
        self.current.as_ref()
    }
}
