/// Message router for the background service
///
/// The store, notifier, and clock are injected so every handler can run
/// against fakes on the host target. The wasm listener in `background`
/// wires in the real chrome-backed implementations.
use crate::clock::{self, Clock};
use crate::messages::{InstallReason, Request, Response};
use crate::notify::{Notification, Notifier};
use crate::prefs::{CurrentQuestion, LearningMode, Preferences, SessionRecord, keys};
use crate::store::{PreferenceStore, StoreError, get_value};
use serde_json::{Map, Value};

pub struct Router<S, N, C> {
    store: S,
    notifier: N,
    clock: C,
}

impl<S, N, C> Router<S, N, C>
where
    S: PreferenceStore,
    N: Notifier,
    C: Clock,
{
    pub fn new(store: S, notifier: N, clock: C) -> Router<S, N, C> {
        Router { store, notifier, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Entry point for raw messages from the content script. Every
    /// message gets a response: protocol and store failures come back
    /// as `{status: "error", reason}` instead of a silent drop.
    pub async fn dispatch(&self, message: Value) -> Response {
        let request = match Request::parse(&message) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("rejected message: {}", e);
                return Response::error(e.to_string());
            }
        };

        match self.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("handler failed: {}", e);
                Response::error(e.to_string())
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Result<Response, StoreError> {
        match request {
            Request::SetQuestion { question } => self.set_question(question).await,
            Request::StartSession => self.start_session().await,
        }
    }

    /// Store the captured question with a strictly increasing lastUpdated stamp
    async fn set_question(&self, question: String) -> Result<Response, StoreError> {
        let values = self
            .store
            .get(&[keys::LAST_UPDATED, keys::NOTIFICATIONS_ENABLED])
            .await?;

        let previous = values.get(keys::LAST_UPDATED).and_then(Value::as_str);
        let stamp = clock::strictly_after(previous, self.clock.now());

        let record = CurrentQuestion {
            current_question: question,
            last_updated: clock::to_iso8601(stamp),
        };
        self.store.set(question_entries(&record)?).await?;

        let notifications_enabled = values
            .get(keys::NOTIFICATIONS_ENABLED)
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if notifications_enabled {
            self.notifier
                .notify(Notification::question_captured(&record.current_question));
        }

        Ok(Response::ok())
    }

    /// Reply with the configured learning mode and record the session
    async fn start_session(&self) -> Result<Response, StoreError> {
        let mode: LearningMode = get_value(&self.store, keys::LEARNING_MODE)
            .await?
            .unwrap_or_default();

        let mut history: Vec<SessionRecord> = get_value(&self.store, keys::SESSION_HISTORY)
            .await?
            .unwrap_or_default();
        history.push(SessionRecord::new(mode, clock::to_iso8601(self.clock.now())));

        let mut entries = Map::new();
        entries.insert(
            keys::SESSION_HISTORY.to_string(),
            serde_json::to_value(&history).map_err(|e| StoreError::Malformed {
                key: keys::SESSION_HISTORY.to_string(),
                reason: e.to_string(),
            })?,
        );
        self.store.set(entries).await?;

        log::info!("session started in {} mode", mode.as_str());
        Ok(Response::session_started(mode))
    }

    /// Initialize default preferences on a fresh install. Updates and
    /// browser upgrades leave existing preferences untouched.
    pub async fn handle_install(&self, reason: InstallReason) -> Result<(), StoreError> {
        if reason != InstallReason::Install {
            log::debug!("ignoring install event: {:?}", reason);
            return Ok(());
        }

        log::info!("fresh install, writing default preferences");
        self.store.set(Preferences::default_entries()).await
    }
}

/// Flat storage entries for the captured-question record
fn question_entries(record: &CurrentQuestion) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(entries)) => Ok(entries),
        Ok(_) => Err(StoreError::Malformed {
            key: keys::CURRENT_QUESTION.to_string(),
            reason: "record did not serialize to an object".to_string(),
        }),
        Err(e) => Err(StoreError::Malformed {
            key: keys::CURRENT_QUESTION.to_string(),
            reason: e.to_string(),
        }),
    }
}
