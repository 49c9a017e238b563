//! HTTP Request handling.
//!
//! # Example
//! ```
//! use fetchonce::request::RequestBuilder;
//!
//! let request = RequestBuilder::new("http://localhost:8080/api/profiles/1")
//!     .add_header("Accept: */*")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.authority(), "localhost:8080");
//! assert_eq!(request.request_uri(), "/api/profiles/1");
//! ```

use url::Url;

use super::constants;
use super::results::{FetchError, FetchResult};

/// An HTTP/1.1 request ready to be written on a connection.
#[derive(Debug, Clone)]
pub struct Request {
    host: String,
    port: u16,
    authority: String,
    default_port: bool,
    scheme: String,
    http_method: String,
    request_uri: String,
    http_version: String,
    headers: Vec<String>,
    body: Option<Vec<u8>>,
}

impl Request {
    #[allow(clippy::too_many_arguments)]
    fn new(
        host: String,
        port: u16,
        authority: String,
        default_port: bool,
        scheme: String,
        http_method: String,
        request_uri: String,
        http_version: String,
        headers: Vec<String>,
        body: Option<Vec<u8>>,
    ) -> Request {
        Request {
            host,
            port,
            authority,
            default_port,
            scheme,
            http_method,
            request_uri,
            http_version,
            headers,
            body,
        }
    }

    pub fn http_method(&self) -> &str {
        self.http_method.as_str()
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn http_version(&self) -> &str {
        self.http_version.as_str()
    }

    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, the key used to resolve and connect.
    pub fn authority(&self) -> &str {
        self.authority.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.scheme.as_str()
    }

    pub fn request_uri(&self) -> &str {
        self.request_uri.as_str()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().map(|s| s.as_ref()).collect()
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|header| {
            header
                .split(':')
                .next()
                .map(|hname| hname.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
    }

    /// The request head, `Host`, `User-Agent` and `Connection` headers
    /// are added here.
    pub fn to_string(&self) -> String {
        let mut resp = format!(
            "{} {} {}\r\n",
            self.http_method(),
            self.request_uri(),
            self.http_version()
        );
        if !self.headers.is_empty() {
            resp.push_str(self.headers.as_slice().join("\r\n").as_str());
            resp.push_str("\r\n");
        }
        if !self.has_header("Host") {
            if self.default_port {
                resp.push_str(format!("Host: {}\r\n", self.host()).as_str());
            } else {
                resp.push_str(format!("Host: {}\r\n", self.authority()).as_str());
            }
        }
        if !self.has_header("User-Agent") {
            resp.push_str(format!("User-Agent: {}\r\n", constants::USER_AGENT).as_str());
        }
        resp.push_str("Connection: close\r\n");
        if let Some(payload) = self.body() {
            resp.push_str(format!("Content-Length: {}\r\n", payload.len()).as_str());
        }
        resp.push_str("\r\n");
        resp
    }

    /// The raw request as sent on the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.to_string().into_bytes();
        if let Some(payload) = self.body() {
            bytes.extend_from_slice(payload);
        }
        bytes
    }
}

/// Build a [Request](struct.Request.html); the url is validated in `build`.
pub struct RequestBuilder {
    http_method: String,
    url: Result<Url, url::ParseError>,
    http_version: String,
    headers: Vec<String>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    pub fn new(url: &str) -> Self {
        let url = url.parse::<Url>();
        RequestBuilder {
            http_method: "GET".to_owned(),
            url,
            http_version: "HTTP/1.1".to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn set_url(mut self, url: &str) -> Self {
        self.url = url.parse::<Url>();
        self
    }

    pub fn set_http_method(mut self, http_method: &str) -> Self {
        self.http_method = http_method.to_owned();
        self
    }

    pub fn set_http_version(mut self, http_version: &str) -> Self {
        self.http_version = http_version.to_owned();
        self
    }

    pub fn add_header(mut self, header: &str) -> Self {
        self.headers.push(header.to_owned());
        self
    }

    pub fn add_headers(mut self, headers: &[&str]) -> Self {
        for header in headers {
            self.headers.push((*header).to_owned());
        }
        self
    }

    pub fn set_body(mut self, buf: &[u8]) -> Self {
        self.body = Some(buf.to_vec());
        self
    }

    pub fn set_body_as_str(self, body: &str) -> Self {
        self.set_body(body.as_bytes())
    }

    pub fn build(&self) -> FetchResult<Request> {
        let url = match self.url {
            Ok(ref url) => url,
            Err(ref err) => return Err(FetchError::UrlParseError(*err)),
        };

        let host = url
            .host_str()
            .ok_or_else(|| FetchError::OpaqueUrlError("Unable to find host".to_owned()))?;

        let port = url
            .port_or_known_default()
            .ok_or_else(|| FetchError::OpaqueUrlError("Unable to determine a port".to_owned()))?;

        let mut request_uri = url.path().to_owned();
        if let Some(querystring) = url.query() {
            request_uri.push('?');
            request_uri.push_str(querystring);
        }

        Ok(Request::new(
            host.to_owned(),
            port,
            format!("{}:{}", host, port),
            url.port().is_none(),
            url.scheme().to_owned(),
            self.http_method.clone(),
            request_uri,
            self.http_version.clone(),
            self.headers.clone(),
            self.body.clone(),
        ))
    }
}
