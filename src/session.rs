//! The client session that perform queries

use std::time::Duration;

use async_std::future;
use async_std::prelude::*;
use log::Level::Info;

use super::constants;
use super::http;
use super::request::{Request, RequestBuilder};
use super::response::Response;
use super::results::{FetchError, FetchResult};
use super::transport::{Connection, NetTransport, Transport};

/// A scoped network resource. The transport is released by
/// [close](struct.Session.html#method.close) or when the session is dropped.
pub struct Session {
    transport: Box<dyn Transport>,
    timeout: Option<Duration>,
    closed: bool,
}

impl Session {
    /// Open a session over the network.
    pub fn new() -> FetchResult<Self> {
        Session::open(NetTransport::new())
    }

    /// Open a session over the given transport.
    pub fn open<T: Transport + 'static>(transport: T) -> FetchResult<Self> {
        let mut transport: Box<dyn Transport> = Box::new(transport);
        transport.open()?;
        debug!("Session opened");
        Ok(Session {
            transport,
            timeout: None,
            closed: false,
        })
    }

    /// Bound the duration of every request. Unbounded by default.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// GET `url`.
    pub async fn get(&mut self, url: &str) -> FetchResult<Response> {
        let request = RequestBuilder::new(url).add_header("Accept: */*").build()?;
        self.execute(&request).await
    }

    /// Execute the query [Request](../request/struct.Request.html) and
    /// return the associate [Response](../response/struct.Response.html).
    pub async fn execute(&mut self, request: &Request) -> FetchResult<Response> {
        if self.closed {
            return Err(FetchError::SessionClosed);
        }
        debug!(
            "HTTP Query {} {}",
            request.http_method(),
            request.request_uri()
        );
        match self.timeout {
            Some(timeout) => {
                future::timeout(timeout, self.round_trip(request))
                    .await
                    .map_err(|_| FetchError::Timeout(timeout))?
            }
            None => self.round_trip(request).await,
        }
    }

    async fn round_trip(&mut self, request: &Request) -> FetchResult<Response> {
        let mut connection = self.transport.connect(request).await?;
        let response = exchange(&mut connection, request).await;
        if let Err(err) = futures::AsyncWriteExt::close(&mut connection).await {
            debug!("Unable to close the connection: {}", err);
        }
        if let Err(err) = connection.release() {
            debug!("Connection already closed: {}", err);
        }
        response
    }

    /// Release the transport. Calling it again does nothing.
    pub fn close(&mut self) {
        if !self.closed {
            self.transport.close();
            self.closed = true;
            debug!("Session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn log_request(request: &[u8]) {
    if !log_enabled!(Info) {
        return;
    }
    let head_len = request
        .windows(constants::HEADERS_END.len())
        .position(|window| window == constants::HEADERS_END)
        .unwrap_or_else(|| request.len());
    let headers = String::from_utf8_lossy(&request[..head_len]);
    for header in headers.split("\r\n") {
        info!("> {}", header);
    }
    let bodylen = request
        .len()
        .saturating_sub(head_len + constants::HEADERS_END.len());
    if bodylen > 0 {
        info!("> [{} bytes]", bodylen);
    }
    info!(">");
}

async fn exchange(
    connection: &mut Box<dyn Connection>,
    request: &Request,
) -> FetchResult<Response> {
    let raw_request = request.to_bytes();
    log_request(&raw_request);

    debug!("Sending request...");
    connection.write_all(&raw_request).await?;
    connection.flush().await?;

    debug!("Reading response...");
    let response = http::read_response(connection).await?;
    info!("< {} {}", response.http_version(), response.status_line());
    Ok(response)
}
