//! Page fetching with session replay and jittered pacing.
//!
//! The fetcher makes exactly one attempt per page. Failures are isolated
//! by the pipeline; there is no retry loop, because hammering the signal
//! site is what gets a session blocked.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::http_client::{HttpClient, HttpRequest};
use crate::session::SessionState;
use crate::ValidationError;

const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(6);

/// Failure fetching one page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch failed for {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Transport,
    Status(u16),
}

/// Uniform random delay between consecutive page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ValidationError> {
        if min > max {
            return Err(ValidationError::InvalidPacing);
        }
        Ok(Self { min, max })
    }

    /// Zero delay, for tests and dry runs.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Pick a delay uniformly from `[min, max]`.
    pub fn jittered_delay(&self) -> Duration {
        let spread = self.max.saturating_sub(self.min);
        if spread.is_zero() {
            return self.min;
        }
        let jitter = fastrand::u64(0..=spread.as_millis() as u64);
        self.min + Duration::from_millis(jitter)
    }

    /// Sleep for one jittered delay.
    pub async fn pause(&self) {
        let delay = self.jittered_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DELAY,
            max: DEFAULT_MAX_DELAY,
        }
    }
}

/// Fetches pages through a transport while presenting one consistent
/// browsing identity and accumulating cookies across requests.
pub struct PageFetcher {
    client: Arc<dyn HttpClient>,
    session: SessionState,
}

impl PageFetcher {
    pub fn new(client: Arc<dyn HttpClient>, session: SessionState) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn into_session(self) -> SessionState {
        self.session
    }

    /// Fetch one page, replaying session cookies and absorbing any new
    /// ones from the response.
    pub async fn fetch_page(&mut self, url: &str) -> Result<String, FetchError> {
        let mut request = HttpRequest::get(url)
            .with_header("user-agent", &self.session.user_agent)
            .with_header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .with_header("accept-language", "en-US,en;q=0.9")
            .with_header("viewport-width", self.session.viewport.0.to_string());
        if let Some(cookie) = self.session.cookie_header() {
            request = request.with_header("cookie", cookie);
        }

        let response = self.client.execute(request).await.map_err(|error| {
            let kind = if error.is_timeout() {
                FetchErrorKind::Timeout
            } else {
                FetchErrorKind::Transport
            };
            FetchError {
                url: url.to_owned(),
                kind,
                message: error.message().to_owned(),
            }
        })?;

        if !response.is_success() {
            return Err(FetchError {
                url: url.to_owned(),
                kind: FetchErrorKind::Status(response.status),
                message: format!("unexpected status {}", response.status),
            });
        }

        self.session.absorb_set_cookies(&response.set_cookies);
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<Result<HttpResponse, HttpError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.seen.lock().expect("seen lock").push(request);
            let next = self
                .responses
                .lock()
                .expect("responses lock")
                .remove(0);
            Box::pin(async move { next })
        }
    }

    #[tokio::test]
    async fn replays_cookies_from_earlier_responses() {
        let first = HttpResponse {
            status: 200,
            body: "<html>one</html>".to_string(),
            set_cookies: vec!["sid=abc; HttpOnly".to_string()],
        };
        let second = HttpResponse::ok_html("<html>two</html>");
        let client = Arc::new(ScriptedClient::new(vec![Ok(first), Ok(second)]));

        let mut fetcher = PageFetcher::new(client.clone(), SessionState::fresh());
        fetcher
            .fetch_page("https://example.test/a")
            .await
            .expect("first fetch");
        fetcher
            .fetch_page("https://example.test/b")
            .await
            .expect("second fetch");

        let seen = client.seen.lock().expect("seen lock");
        assert!(seen[0].headers.get("cookie").is_none());
        assert_eq!(
            seen[1].headers.get("cookie").map(String::as_str),
            Some("sid=abc")
        );
        assert!(seen[1].headers.contains_key("user-agent"));
        assert!(seen[1].headers.contains_key("viewport-width"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_fetch_error() {
        let blocked = HttpResponse {
            status: 403,
            body: String::new(),
            set_cookies: Vec::new(),
        };
        let client = Arc::new(ScriptedClient::new(vec![Ok(blocked)]));

        let mut fetcher = PageFetcher::new(client, SessionState::fresh());
        let error = fetcher
            .fetch_page("https://example.test/a")
            .await
            .expect_err("must fail");
        assert_eq!(error.kind, FetchErrorKind::Status(403));
    }

    #[tokio::test]
    async fn rendering_transports_plug_in_behind_the_client_trait() {
        // A headless-browser transport returns post-render HTML through
        // the same trait; the fetcher and extractors are none the wiser.
        let rendered = r#"
            <div class="note-button">
              <a data-symbol='{"symbolName":"AAPL","lastPrice":"187.50","percentChange":"1.25%","priceChange":"2.31","opinion":"88% Buy"}'>notes</a>
            </div>"#;
        let client = Arc::new(ScriptedClient::new(vec![Ok(HttpResponse::ok_html(rendered))]));

        let mut fetcher = PageFetcher::new(client, SessionState::fresh());
        let symbol = crate::Symbol::parse("AAPL").expect("valid symbol");
        let html = fetcher
            .fetch_page(&crate::sites::opinion_url(&symbol))
            .await
            .expect("fetch");

        let snapshot = crate::extract::extract_opinion(&html).expect("opinion present");
        assert_eq!(snapshot.symbol_name, "AAPL");
        assert_eq!(snapshot.opinion, "88% Buy");
    }

    #[test]
    fn jittered_delay_stays_in_range() {
        let pacing = Pacing::new(Duration::from_millis(100), Duration::from_millis(300))
            .expect("valid pacing");
        for _ in 0..64 {
            let delay = pacing.jittered_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[test]
    fn inverted_pacing_is_rejected() {
        let err = Pacing::new(Duration::from_secs(5), Duration::from_secs(1))
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidPacing));
    }
}
