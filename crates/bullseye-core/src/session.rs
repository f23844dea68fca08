//! Browser-like session state persisted between batches.
//!
//! The signal site tracks returning visitors, so a batch presents itself
//! the same way a desktop browser would: one user agent and viewport per
//! session, with cookies carried across runs through a JSON session file
//! under the bullseye home directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use bullseye_ledger::resolve_bullseye_home;

const SESSION_FILE: &str = "session.json";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
];

pub const VIEWPORT_WIDTH: std::ops::RangeInclusive<u32> = 1180..=1480;
pub const VIEWPORT_HEIGHT: std::ops::RangeInclusive<u32> = 680..=980;

/// Uniform pick from a built-in pool of desktop browser user agents.
#[derive(Debug, Default)]
pub struct UserAgentPool;

impl UserAgentPool {
    pub fn pick() -> &'static str {
        USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
    }
}

/// One browsing identity: user agent, viewport, and accumulated cookies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub cookies: BTreeMap<String, String>,
}

impl SessionState {
    /// Create a fresh identity with a random user agent and viewport.
    pub fn fresh() -> Self {
        Self {
            user_agent: UserAgentPool::pick().to_owned(),
            viewport: (
                fastrand::u32(VIEWPORT_WIDTH),
                fastrand::u32(VIEWPORT_HEIGHT),
            ),
            cookies: BTreeMap::new(),
        }
    }

    /// Render accumulated cookies as a `cookie` request header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }

    /// Fold `set-cookie` header values into the session.
    ///
    /// Only the leading `name=value` pair is kept; attributes such as
    /// Path and Expires are dropped.
    pub fn absorb_set_cookies(&mut self, set_cookies: &[String]) {
        for raw in set_cookies {
            let pair = raw.split(';').next().unwrap_or_default().trim();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            self.cookies
                .insert(name.trim().to_owned(), value.trim().to_owned());
        }
    }
}

/// Loads and saves the session file under the bullseye home directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under `$BULLSEYE_HOME/session.json`.
    pub fn default_location() -> Self {
        Self::new(resolve_bullseye_home().join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Load the persisted session, falling back to a fresh identity when
    /// the file is missing or unreadable. A corrupt file is never fatal.
    pub fn load(&self) -> SessionState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), %error, "session file unreadable, starting fresh");
                }
                return SessionState::fresh();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "session file corrupt, starting fresh");
                SessionState::fresh()
            }
        }
    }

    /// Persist the session as pretty JSON.
    pub fn save(&self, state: &SessionState) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(state)
            .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
        fs::write(&self.path, serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fresh_session_stays_within_viewport_bounds() {
        for _ in 0..32 {
            let session = SessionState::fresh();
            assert!(VIEWPORT_WIDTH.contains(&session.viewport.0));
            assert!(VIEWPORT_HEIGHT.contains(&session.viewport.1));
            assert!(USER_AGENTS.contains(&session.user_agent.as_str()));
        }
    }

    #[test]
    fn absorbs_set_cookie_values_dropping_attributes() {
        let mut session = SessionState::fresh();
        session.absorb_set_cookies(&[
            "ASP.NET_SessionId=abc123; path=/; HttpOnly".to_string(),
            "pref=en; Expires=Wed, 01 Jan 2031 00:00:00 GMT".to_string(),
            "malformed-no-equals".to_string(),
        ]);

        assert_eq!(
            session.cookies.get("ASP.NET_SessionId").map(String::as_str),
            Some("abc123")
        );
        assert_eq!(session.cookies.get("pref").map(String::as_str), Some("en"));
        assert_eq!(session.cookies.len(), 2);

        let header = session.cookie_header().expect("header should render");
        assert!(header.contains("ASP.NET_SessionId=abc123"));
        assert!(header.contains("pref=en"));
    }

    #[test]
    fn round_trips_through_the_session_file() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::new(temp.path().join("nested").join("session.json"));

        let mut state = SessionState::fresh();
        state
            .cookies
            .insert("token".to_string(), "xyz".to_string());
        store.save(&state).expect("save");

        let loaded = store.load();
        assert_eq!(loaded, state);
    }

    #[test]
    fn corrupt_session_file_yields_fresh_state() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("session.json");
        fs::write(&path, "{not json").expect("write corrupt file");

        let store = SessionStore::new(path);
        let loaded = store.load();
        assert!(loaded.cookies.is_empty());
    }
}
