/// Outbound messaging.
///
/// The poll loop hands finished text to a `Notifier`. `TelegramNotifier`
/// posts to a channel through the Bot API `sendMessage` method:
///   https://core.telegram.org/bots/api#sendmessage
///
/// MarkdownV2 requires reserved characters to be backslash-escaped.
/// `escape_markdown` escapes all of them, `*` included, so it is applied to
/// data and literal text only, never to markup the renderer adds itself.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Characters MarkdownV2 treats as markup.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// How the notifier should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Plain,
    MarkdownV2,
}

impl RenderMode {
    fn parse_mode(self) -> Option<&'static str> {
        match self {
            RenderMode::Plain => None,
            RenderMode::MarkdownV2 => Some("MarkdownV2"),
        }
    }
}

/// Outbound message transport.
pub trait Notifier {
    fn send(&self, channel: &str, text: &str, mode: RenderMode) -> Result<(), NotifyError>;
}

/// Prefixes every reserved MarkdownV2 character with a backslash.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Telegram Bot API
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: String,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Public channels are addressed as `@name`.
pub fn channel_chat_id(channel: &str) -> String {
    if channel.starts_with('@') || channel.starts_with('-') {
        channel.to_string()
    } else {
        format!("@{}", channel)
    }
}

pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    token: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_api_base(token, TELEGRAM_API_BASE)
    }

    /// No request timeout: a send completes or fails outright.
    pub fn with_api_base(
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
            api_base: api_base.into(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), self.token)
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, channel: &str, text: &str, mode: RenderMode) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: channel_chat_id(channel),
            text,
            parse_mode: mode.parse_mode(),
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let api: ApiResponse = response
            .json()
            .map_err(|e| NotifyError::Transport(format!("HTTP {}: {}", status, e.without_url())))?;

        if !api.ok {
            return Err(NotifyError::Rejected(
                api.description.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_reserved_characters() {
        assert_eq!(escape_markdown("Cases: 8 (-2)"), "Cases: 8 \\(\\-2\\)");
        assert_eq!(escape_markdown("a_b.c!"), "a\\_b\\.c\\!");
        assert_eq!(escape_markdown("[x]{y}|z=#>~`"), "\\[x\\]\\{y\\}\\|z\\=\\#\\>\\~\\`");
    }

    #[test]
    fn test_escape_asterisk() {
        assert_eq!(escape_markdown("Taiwan*"), "Taiwan\\*");
        assert_eq!(escape_markdown("Total Cases: 5 (+1)"), "Total Cases: 5 \\(\\+1\\)");
    }

    #[test]
    fn test_escape_backslash() {
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_escape_leaves_plain_text_alone() {
        let text = "⚠ New Outbreak ⚠\nUpdate for Hubei, China";
        assert_eq!(escape_markdown(text), text);
    }

    #[test]
    fn test_channel_chat_id() {
        assert_eq!(channel_chat_id("outbreak_updates"), "@outbreak_updates");
        assert_eq!(channel_chat_id("@outbreak_updates"), "@outbreak_updates");
        assert_eq!(channel_chat_id("-1001234567890"), "-1001234567890");
    }

    #[test]
    fn test_send_message_body() {
        let body = SendMessage {
            chat_id: channel_chat_id("news"),
            text: "hi",
            parse_mode: RenderMode::MarkdownV2.parse_mode(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chat_id"], "@news");
        assert_eq!(json["parse_mode"], "MarkdownV2");

        let plain = SendMessage { chat_id: "@news".to_string(), text: "hi", parse_mode: None };
        assert!(serde_json::to_value(&plain).unwrap().get("parse_mode").is_none());
    }

    #[test]
    fn test_send_message_url() {
        let notifier = TelegramNotifier::with_api_base("123:abc", "http://localhost:9/").unwrap();
        assert_eq!(notifier.send_message_url(), "http://localhost:9/bot123:abc/sendMessage");
    }
}
