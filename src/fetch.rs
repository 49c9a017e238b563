//! Fetch a JSON document, once.
//!
//! # Example
//! ```no_run
//! use async_std::task;
//! use fetchonce::FetchOnce;
//!
//! let value = task::block_on(FetchOnce::new().run()).unwrap();
//! println!("{}", value);
//! ```

use std::io::Write;
use std::time::Duration;

use serde_json::Value;

use super::constants;
use super::request::{Request, RequestBuilder};
use super::results::FetchResult;
use super::session::Session;
use super::transport::{NetTransport, Transport};

/// Progress of a [FetchOnce](struct.FetchOnce.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    AwaitingResponse,
    Done,
    Failed,
}

/// GET a url and decode its body as JSON, through a session that lives
/// for that single round-trip.
pub struct FetchOnce {
    url: String,
    check_status: bool,
    timeout: Option<Duration>,
    state: FetchState,
}

impl Default for FetchOnce {
    fn default() -> Self {
        FetchOnce::new()
    }
}

impl FetchOnce {
    /// Fetch the [PROFILE_URL](../constants/constant.PROFILE_URL.html).
    pub fn new() -> Self {
        FetchOnce::with_url(constants::PROFILE_URL)
    }

    pub fn with_url(url: &str) -> Self {
        FetchOnce {
            url: url.to_owned(),
            check_status: false,
            timeout: None,
            state: FetchState::Idle,
        }
    }

    /// Fail with `HttpStatusError` instead of decoding non-2xx bodies.
    pub fn check_status(mut self, check_status: bool) -> Self {
        self.check_status = check_status;
        self
    }

    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Run over the network.
    pub async fn run(&mut self) -> FetchResult<Value> {
        self.run_with(NetTransport::new()).await
    }

    /// Run over `transport`. The session opened over it is closed before
    /// returning, whatever the outcome.
    pub async fn run_with<T: Transport + 'static>(&mut self, transport: T) -> FetchResult<Value> {
        self.state = FetchState::AwaitingResponse;
        let outcome = self.fetch(transport).await;
        self.state = match outcome {
            Ok(_) => FetchState::Done,
            Err(ref err) => {
                warn!("Fetching {} failed: {}", self.url, err);
                FetchState::Failed
            }
        };
        outcome
    }

    async fn fetch<T: Transport + 'static>(&self, transport: T) -> FetchResult<Value> {
        let request = RequestBuilder::new(self.url())
            .add_header("Accept: */*")
            .build()?;
        let mut session = Session::open(transport)?;
        if let Some(timeout) = self.timeout {
            session.set_timeout(timeout);
        }
        let outcome = self.fetch_json(&mut session, &request).await;
        session.close();
        outcome
    }

    async fn fetch_json(&self, session: &mut Session, request: &Request) -> FetchResult<Value> {
        info!("Fetching {}", self.url);
        let mut response = session.execute(request).await?;
        info!("Response status {}", response.status_line());
        if self.check_status {
            response = response.error_for_status()?;
        }
        response.body_as_json()
    }
}

/// Fetch the profile document over the network.
pub async fn fetch_once() -> FetchResult<Value> {
    FetchOnce::new().run().await
}

/// Write `value` followed by a newline.
pub fn write_json<W: Write>(out: &mut W, value: &Value) -> FetchResult<()> {
    writeln!(out, "{}", value)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let fetch = FetchOnce::new();
        assert_eq!(fetch.url(), constants::PROFILE_URL);
        assert_eq!(fetch.state(), FetchState::Idle);
    }

    #[test]
    fn test_write_json() {
        let mut out: Vec<u8> = Vec::new();
        write_json(&mut out, &json!({"id": "302604426781261824"})).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"id\":\"302604426781261824\"}\n"
        );
    }

    #[async_std::test]
    async fn test_invalid_url_fails_before_session() {
        let mut fetch = FetchOnce::with_url("::not an url::");
        let err = fetch.run_with(NetTransport::new()).await.unwrap_err();
        assert_eq!(err.kind(), crate::results::ErrorKind::Request);
        assert_eq!(fetch.state(), FetchState::Failed);
    }
}
