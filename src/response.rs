//! HTTP Response handling.
//! The TCP response stream is converted to a
//! [Response](../response/struct.Response.html) structure.
//!
//! # Example
//! ```
//! use fetchonce::response::ResponseBuilder;
//!
//! let response = ResponseBuilder::new()
//!     .set_status_line("HTTP/1.1 200 Ok")
//!     .add_header("Content-Type: application/json")
//!     .set_body(br#"{"id": "302604426781261824"}"#)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(response.http_version(), "HTTP/1.1");
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.status_line(), "200 Ok");
//! assert_eq!(response.header("content-type"), Some("application/json"));
//! assert_eq!(response.body_as_json().unwrap()["id"], "302604426781261824");
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::results::{FetchError, FetchResult};

/// Represent the parsed HTTP response.
#[derive(Debug)]
pub struct Response {
    http_version: String,
    status_code: usize,
    status_line: String,
    headers: Vec<String>,
    body: Option<Vec<u8>>,
}

impl Response {
    fn new(
        http_version: String,
        status_code: usize,
        status_line: String,
        headers: Vec<String>,
        body: Option<Vec<u8>>,
    ) -> Response {
        Response {
            http_version,
            status_code,
            status_line,
            headers,
            body,
        }
    }

    /// The response http version such as `HTTP/1.1` extracted from the
    /// repsonse status line.
    pub fn http_version(&self) -> &str {
        self.http_version.as_str()
    }

    /// The status status code such as `200` extracted from the response status
    /// line.
    pub fn status_code(&self) -> usize {
        self.status_code
    }

    /// The status line such as `200 Ok`. The status line as defined in
    /// [rfc7230](https://tools.ietf.org/html/rfc7230#section-3.1.1) also
    /// contains the http version, but, for convenience, it has been stripped
    /// here but is available using the `http_version()` method.
    pub fn status_line(&self) -> &str {
        self.status_line.as_str()
    }

    /// `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Response headers.
    /// Headers are not key/value parsed here to avoid deduplicates them.
    /// But multiline headers
    /// ([obsolete line folding](https://tools.ietf.org/html/rfc7230#section-3.2]))
    /// are implemented as specified and CRLF separator are preserved.
    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().map(|s| s.as_ref()).collect()
    }

    /// Value of the first header named `name`, compared case insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|header| {
            let mut parts = header.splitn(2, ':');
            let hname = parts.next()?;
            if hname.trim().eq_ignore_ascii_case(name) {
                parts.next().map(|value| value.trim())
            } else {
                None
            }
        })
    }

    /// Get the body in raw format.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Clone the body and retrieve it in a String object.
    ///
    /// Important: Currently assume the body is encoded in utf-8.
    ///
    /// Errors:
    ///
    ///  - FetchError::EncodingError in case the body is not an utf-8 string
    ///
    pub fn body_as_string(&self) -> FetchResult<String> {
        let body = match self.body {
            None => "".to_owned(),
            Some(ref body) => String::from_utf8(body.clone())?,
        };
        Ok(body)
    }

    /// Deserialize the body. The status code is not looked at.
    ///
    /// Errors:
    ///
    ///  - FetchError::DecodeError in case the body is missing or is not
    ///    a valid document for `T`
    ///
    pub fn json<T: DeserializeOwned>(&self) -> FetchResult<T> {
        let body = self.body().unwrap_or(&[]);
        let value = serde_json::from_slice(body)?;
        Ok(value)
    }

    /// Decode the body as an untyped JSON value.
    pub fn body_as_json(&self) -> FetchResult<Value> {
        self.json()
    }

    /// Turn a non-2xx response into `FetchError::HttpStatusError`.
    pub fn error_for_status(self) -> FetchResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::HttpStatusError(
                self.status_code,
                self.status_line,
            ))
        }
    }
}

#[derive(Debug, Default)]
/// An internal class used to build response.
///
///
pub struct ResponseBuilder {
    status_line: Option<String>,
    headers: Vec<String>,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    /// Construct a ResponseBuilder
    pub fn new() -> Self {
        ResponseBuilder {
            status_line: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// initialize the status line
    pub fn set_status_line(mut self, status_line: &str) -> Self {
        self.status_line = Some(status_line.to_string());
        self
    }

    /// Append an header
    pub fn add_header(mut self, header: &str) -> Self {
        self.headers.push(header.to_owned());
        self
    }

    /// Set a response body
    pub fn set_body(mut self, buf: &[u8]) -> Self {
        self.body = Some(buf.to_vec());
        self
    }

    /// Build the Response with the initialized data.
    pub fn build(&self) -> FetchResult<Response> {
        let status_line = self
            .status_line
            .as_ref()
            .ok_or_else(|| FetchError::HttpResponseParseError("No Status Line".to_owned()))?;

        let mut vec_status_line: Vec<&str> = status_line.splitn(3, ' ').collect();

        if vec_status_line.len() < 2 {
            return Err(FetchError::HttpResponseParseError(format!(
                "Malformed Status Line: {}",
                status_line
            )));
        }

        let http_version = vec_status_line.remove(0);
        if !http_version.starts_with("HTTP/") {
            return Err(FetchError::HttpResponseParseError(format!(
                "Unkown Protocol in Status \
                 Line: {}",
                status_line
            )));
        }

        let status_code = &vec_status_line[0];
        if status_code.len() != 3 {
            return Err(FetchError::HttpResponseParseError(format!(
                "Malformed status code: {}",
                status_line
            )));
        }
        let status_code = status_code.parse().map_err(|_| {
            FetchError::HttpResponseParseError(format!("Malformed status code: {}", status_line))
        })?;
        let status_line = vec_status_line.as_slice().join(" ");

        Ok(Response::new(
            http_version.to_owned(),
            status_code,
            status_line,
            self.headers.to_owned(),
            self.body.to_owned(),
        ))
    }
}
