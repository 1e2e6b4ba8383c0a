//! Session token lifecycle: cache check, passcode login, persistence.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{PennyError, Result};
use crate::inbox::Inbox;
use crate::models::Credential;
use crate::session::SessionClient;
use crate::workbook::{Workbook, SETTINGS};

/// How long a token is reused before logging in again.
pub const TOKEN_TTL_HOURS: i64 = 20;

/// Wait before each passcode check. Delivery is asynchronous, so the first
/// check comes a few seconds after the session is started.
pub const LOGIN_BACKOFF: [Duration; 3] = [
    Duration::from_secs(5),
    Duration::from_secs(15),
    Duration::from_secs(30),
];

const TOKEN_KEY: &str = "auth_token";
const ISSUED_AT_KEY: &str = "auth_issued_at";

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Single-slot storage for the current credential.
pub trait CredentialStore {
    fn get(&self) -> Result<Option<Credential>>;
    fn set(&mut self, credential: &Credential) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Settings-sheet store
// ---------------------------------------------------------------------------

/// Keeps the credential as two key/value rows in the Settings sheet.
pub struct SheetCredentialStore<'a> {
    workbook: &'a mut dyn Workbook,
}

impl<'a> SheetCredentialStore<'a> {
    pub fn new(workbook: &'a mut dyn Workbook) -> Self {
        Self { workbook }
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .workbook
            .rows(SETTINGS)?
            .into_iter()
            .find(|row| row.first().map(String::as_str) == Some(key))
            .and_then(|row| row.into_iter().nth(1)))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let cells = vec![key.to_string(), value.to_string()];
        let rows = self.workbook.rows(SETTINGS)?;
        match rows.iter().position(|row| row.first().map(String::as_str) == Some(key)) {
            Some(i) => self.workbook.write_row(SETTINGS, i, &cells),
            None => self.workbook.append_rows(SETTINGS, &[cells]),
        }
    }
}

impl CredentialStore for SheetCredentialStore<'_> {
    fn get(&self) -> Result<Option<Credential>> {
        let token = self.read(TOKEN_KEY)?.unwrap_or_default();
        let issued_at = self
            .read(ISSUED_AT_KEY)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Ok(match issued_at {
            Some(issued_at) if !token.is_empty() => Some(Credential { token, issued_at }),
            _ => None,
        })
    }

    fn set(&mut self, credential: &Credential) -> Result<()> {
        self.write(TOKEN_KEY, &credential.token)?;
        self.write(ISSUED_AT_KEY, &credential.issued_at.to_rfc3339())
    }

    fn clear(&mut self) -> Result<()> {
        self.write(TOKEN_KEY, "")?;
        self.write(ISSUED_AT_KEY, "")
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

pub fn is_fresh(credential: &Credential, now: DateTime<Utc>) -> bool {
    now - credential.issued_at < TimeDelta::hours(TOKEN_TTL_HOURS)
}

/// Outcome of one passcode check.
#[derive(Debug)]
enum Attempt {
    Token(String),
    Retryable(PennyError),
    Fatal(PennyError),
}

fn classify(err: PennyError) -> Attempt {
    match err {
        PennyError::Db(_)
        | PennyError::Io(_)
        | PennyError::StoreNotFound(_)
        | PennyError::Settings(_) => Attempt::Fatal(err),
        _ => Attempt::Retryable(err),
    }
}

fn attempt_login(session: &SessionClient, inbox: &mut dyn Inbox) -> Attempt {
    let passcode = match inbox.take_passcode() {
        Ok(code) => code,
        Err(err) => return classify(err),
    };
    match session.upgrade(&passcode) {
        Ok(token) => Attempt::Token(token),
        Err(err) => classify(err),
    }
}

/// Return a usable credential, reusing the cached one while it is fresh.
/// Otherwise start a session and poll the inbox on the [`LOGIN_BACKOFF`]
/// schedule; once every attempt has failed the last reason comes back as
/// [`PennyError::Auth`].
pub fn acquire_token(
    store: &mut dyn CredentialStore,
    clock: &dyn Clock,
    session: &SessionClient,
    inbox: &mut dyn Inbox,
) -> Result<Credential> {
    if let Some(cached) = store.get()? {
        if is_fresh(&cached, clock.now()) {
            tracing::info!("using cached login");
            return Ok(cached);
        }
    }

    tracing::info!("starting login");
    session.start()?;

    let mut last_error: Option<PennyError> = None;
    for (i, delay) in LOGIN_BACKOFF.iter().enumerate() {
        clock.sleep(*delay);
        let attempt = i + 1;
        tracing::info!(attempt, "checking for passcode");
        match attempt_login(session, inbox) {
            Attempt::Token(token) => {
                let credential = Credential {
                    token,
                    issued_at: clock.now(),
                };
                store.set(&credential)?;
                tracing::info!(attempt, "logged in");
                return Ok(credential);
            }
            Attempt::Retryable(err) => {
                tracing::warn!(attempt, "login attempt failed: {err}");
                last_error = Some(err);
            }
            Attempt::Fatal(err) => return Err(err),
        }
    }

    Err(PennyError::Auth(
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no login attempts were made".to_string()),
    ))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// A clock that only moves when slept on.
    pub(crate) struct FakeClock {
        now: Cell<DateTime<Utc>>,
        pub(crate) sleeps: RefCell<Vec<Duration>>,
    }

    impl FakeClock {
        pub(crate) fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Cell::new(now),
                sleeps: RefCell::new(Vec::new()),
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
            let step = TimeDelta::from_std(duration).unwrap_or_default();
            self.now.set(self.now.get() + step);
        }
    }

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub(crate) credential: Option<Credential>,
    }

    impl CredentialStore for MemoryStore {
        fn get(&self) -> Result<Option<Credential>> {
            Ok(self.credential.clone())
        }

        fn set(&mut self, credential: &Credential) -> Result<()> {
            self.credential = Some(credential.clone());
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.credential = None;
            Ok(())
        }
    }
}
