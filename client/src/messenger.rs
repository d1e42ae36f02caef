/// Messenger facade — wires the session store, REST client, polling hub
/// and notification aggregator together for the front-ends.
use crate::composer::Composer;
use crate::config::Config;
use crate::error::Result;
use crate::notify::{self, Notification, NotificationKind};
use crate::poll::{PollHandle, PollHub, Resource};
use crate::rest::ApiClient;
use crate::scroll::ScrollAnchor;
use crate::session::{SessionStore, SessionUser};
use crate::types::SendReceipt;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Messenger {
    config: Config,
    api: Arc<ApiClient>,
    hub: PollHub,
    session: SessionStore,
}

impl Messenger {
    pub fn new(config: Config) -> Self {
        let session = SessionStore::new(&config.data_dir);
        let api = Arc::new(ApiClient::new(
            &config.api_url,
            session.clone(),
            config.request_timeout,
        ));
        let hub = PollHub::new(api.clone());
        Self {
            config,
            api,
            hub,
            session,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn hub(&self) -> &PollHub {
        &self.hub
    }

    // ── Auth ────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<SessionUser> {
        let resp = self.api.login(email, password, remember_me).await?;
        self.session.save(&resp.token, Some(resp.user.clone()))?;
        info!("Logged in as {}", resp.user.name);
        Ok(resp.user)
    }

    pub fn logout(&self) -> Result<()> {
        self.session.clear()
    }

    pub async fn current_user(&self) -> Result<SessionUser> {
        self.api.current_user().await
    }

    // ── Live views ──────────────────────────────────────────────────────

    /// Conversation list at the badge/notification cadence (30 s default).
    pub fn watch_conversations_badge(&self) -> PollHandle {
        self.hub
            .subscribe(Resource::Conversations, self.config.badge_poll_interval)
    }

    /// Conversation list at the full-page cadence (10 s default).
    pub fn watch_conversations_page(&self) -> PollHandle {
        self.hub
            .subscribe(Resource::Conversations, self.config.page_poll_interval)
    }

    /// One peer's thread at the open-thread cadence (5 s default).
    pub fn watch_thread(&self, peer_id: &str) -> PollHandle {
        self.hub.subscribe(
            Resource::Thread(peer_id.to_string()),
            self.config.thread_poll_interval,
        )
    }

    // ── Messaging ───────────────────────────────────────────────────────

    /// Send the composer's draft to a peer. The draft is cleared before
    /// the network call and restored on failure; on success both the
    /// thread and the conversation list are refreshed immediately and the
    /// view is pinned to the newest message. Returns `Ok(None)` when the
    /// draft was empty or a send was already in flight.
    pub async fn send_from_composer(
        &self,
        recipient_id: &str,
        trip_id: Option<&str>,
        composer: &mut Composer,
        anchor: &mut ScrollAnchor,
    ) -> Result<Option<SendReceipt>> {
        let Some(text) = composer.take() else {
            return Ok(None);
        };

        match self.api.send_message(recipient_id, &text, trip_id).await {
            Ok(receipt) => {
                composer.finish();
                self.hub.refresh(&Resource::Thread(recipient_id.to_string()));
                self.hub.refresh(&Resource::Conversations);
                anchor.pin_to_bottom();
                Ok(Some(receipt))
            }
            Err(err) => {
                warn!("Failed to send message to {}: {}", recipient_id, err);
                composer.restore(text);
                Err(err)
            }
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// One-shot feed rebuild from a fresh conversation fetch.
    pub async fn notifications(&self) -> Result<Vec<Notification>> {
        let conversations = self.api.conversations().await?;
        Ok(notify::aggregate(&conversations))
    }

    /// Mark one feed entry read, then reload the backing list.
    pub async fn mark_notification_read(&self, notification: &Notification) -> Result<()> {
        if notification.kind == NotificationKind::Chat {
            if let Some(conversation_id) = notify::conversation_id(notification) {
                self.api.mark_read(conversation_id).await?;
            }
        }
        self.hub.refresh(&Resource::Conversations);
        Ok(())
    }

    /// Mark every chat entry in the feed read, one call per entry, then
    /// reload. A failure aborts the remaining calls; the next poll will
    /// show whatever actually stuck.
    pub async fn mark_all_read(&self, feed: &[Notification]) -> Result<()> {
        for notification in feed.iter().filter(|n| n.kind == NotificationKind::Chat) {
            if let Some(conversation_id) = notify::conversation_id(notification) {
                self.api.mark_read(conversation_id).await?;
            }
        }
        self.hub.refresh(&Resource::Conversations);
        Ok(())
    }
}

impl Clone for Messenger {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            api: self.api.clone(),
            hub: self.hub.clone(),
            session: self.session.clone(),
        }
    }
}
