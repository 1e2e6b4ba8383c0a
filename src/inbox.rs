//! Passcode delivery channels.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use mailparse::{MailHeader, MailHeaderMap, ParsedMail};
use regex::Regex;

use crate::error::{PennyError, Result};

const PASSCODE_PATTERN: &str = r"passcode is \*(\d{6})\*";

fn passcode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PASSCODE_PATTERN).expect("passcode pattern is valid"))
}

/// Pull the six-digit code out of a passcode email body.
pub fn extract_passcode(body: &str) -> Option<String> {
    passcode_regex()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub trait Inbox {
    /// Find the newest unread passcode message, consume it and return its code.
    /// `PasscodeNotFound` when nothing has arrived yet.
    fn take_passcode(&mut self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Maildir
// ---------------------------------------------------------------------------

/// Reads unread messages from the `new/` folder of a local maildir.
pub struct MaildirInbox {
    root: PathBuf,
    sender: String,
    subject: String,
}

struct Message {
    path: PathBuf,
    received: SystemTime,
    body: String,
}

/// Decoded text of every leaf part, in order. Transfer encodings and
/// charsets are undone so the code pattern sees plain text.
fn message_text(mail: &ParsedMail) -> String {
    if mail.subparts.is_empty() {
        return mail.get_body().unwrap_or_default();
    }
    mail.subparts
        .iter()
        .map(message_text)
        .collect::<Vec<_>>()
        .join("\n")
}

impl MaildirInbox {
    pub fn new(root: &Path, sender: &str, subject: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            sender: sender.to_lowercase(),
            subject: subject.to_lowercase(),
        }
    }

    /// Sender and subject are compared after RFC 2047 decoding, so an
    /// encoded subject line matches its plain-text setting.
    fn matches(&self, headers: &[MailHeader]) -> bool {
        let value = |name: &str| headers.get_first_value(name).unwrap_or_default().to_lowercase();
        value("From").contains(&self.sender) && value("Subject").contains(&self.subject)
    }

    fn newest_match(&self) -> Result<Option<Message>> {
        let new_dir = self.root.join("new");
        if !new_dir.is_dir() {
            return Err(PennyError::Settings(format!(
                "{} is not a maildir (no new/ folder)",
                self.root.display()
            )));
        }

        let mut newest: Option<Message> = None;
        for entry in std::fs::read_dir(&new_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let raw = std::fs::read(entry.path())?;
            let mail = match mailparse::parse_mail(&raw) {
                Ok(mail) => mail,
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), "skipping unparseable message: {err}");
                    continue;
                }
            };
            if !self.matches(&mail.headers) {
                continue;
            }
            let received = entry.metadata()?.modified()?;
            if newest.as_ref().map_or(true, |m| received > m.received) {
                newest = Some(Message {
                    path: entry.path(),
                    received,
                    body: message_text(&mail),
                });
            }
        }
        Ok(newest)
    }
}

impl Inbox for MaildirInbox {
    fn take_passcode(&mut self) -> Result<String> {
        let Some(message) = self.newest_match()? else {
            return Err(PennyError::PasscodeNotFound(
                "no unread passcode email".to_string(),
            ));
        };
        // Consumed either way so a message without a code is not read again.
        std::fs::remove_file(&message.path)?;
        extract_passcode(&message.body).ok_or_else(|| {
            PennyError::PasscodeNotFound("passcode email did not contain a code".to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// Terminal prompt
// ---------------------------------------------------------------------------

/// Asks the operator to type the code from the email.
#[cfg(feature = "prompt")]
pub struct PromptInbox;

#[cfg(feature = "prompt")]
impl Inbox for PromptInbox {
    fn take_passcode(&mut self) -> Result<String> {
        let answer = rpassword::prompt_password("Passcode from email (blank if not arrived yet): ")?;
        let code = answer.trim();
        if code.is_empty() {
            return Err(PennyError::PasscodeNotFound("no passcode entered".to_string()));
        }
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(PennyError::PasscodeNotFound(
                "expected a 6-digit passcode".to_string(),
            ));
        }
        Ok(code.to_string())
    }
}
