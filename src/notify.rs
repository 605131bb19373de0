/// System notification emitter
use serde::Serialize;

/// Icon shipped with the extension bundle
pub const NOTIFICATION_ICON: &str = "icons/icon48.png";

/// How much of a captured question the notification body shows
const MESSAGE_PREVIEW_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Notification {
        Notification {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Notification shown when a question is captured from a page
    pub fn question_captured(question: &str) -> Notification {
        Notification::new("Question captured", preview(question))
    }

    /// Options object for chrome.notifications.create
    pub fn to_options(&self) -> NotificationOptions {
        NotificationOptions {
            kind: "basic",
            icon_url: NOTIFICATION_ICON,
            title: self.title.clone(),
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub icon_url: &'static str,
    pub title: String,
    pub message: String,
}

/// Fire-and-forget: no acknowledgement, no error surfaced to the caller
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MESSAGE_PREVIEW_LEN) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
