//! Define results and error. `Result<T, FetchError>`
use std::error::Error;
use std::fmt::{self, Display};
use std::string::FromUtf8Error;
use std::time::Duration;

use async_std::io::Error as IOError;
use rustls::TLSError;
use serde_json::Error as JsonError;
use url::ParseError as UrlParseError;

/// Coarse classification of a [FetchError](enum.FetchError.html).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The round-trip did not complete: DNS, connect, TLS, IO, timeout or
    /// a response that is not HTTP.
    Network,
    /// The response body is not the expected document.
    Decode,
    /// The server answered with a non-success status and the caller asked
    /// for it to be checked.
    HttpStatus,
    /// The request could not be built or sent through this session.
    Request,
}

#[derive(Debug)]
/// Errors in fetchonce
pub enum FetchError {
    DNSLookupError(String),
    HostnameParseError(String),
    HttpResponseParseError(String),
    HttpStatusError(usize, String),
    OpaqueUrlError(String),
    SchemeError(String),
    SessionClosed,
    Timeout(Duration),
    // Wrapped errors
    CertificateError(TLSError),
    DecodeError(JsonError),
    EncodingError(FromUtf8Error),
    IOError(IOError),
    UrlParseError(UrlParseError),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::DNSLookupError(_)
            | FetchError::HttpResponseParseError(_)
            | FetchError::Timeout(_)
            | FetchError::CertificateError(_)
            | FetchError::IOError(_) => ErrorKind::Network,
            FetchError::DecodeError(_) | FetchError::EncodingError(_) => ErrorKind::Decode,
            FetchError::HttpStatusError(_, _) => ErrorKind::HttpStatus,
            FetchError::HostnameParseError(_)
            | FetchError::OpaqueUrlError(_)
            | FetchError::SchemeError(_)
            | FetchError::SessionClosed
            | FetchError::UrlParseError(_) => ErrorKind::Request,
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    pub fn is_decode_error(&self) -> bool {
        self.kind() == ErrorKind::Decode
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let description = match self {
            FetchError::DNSLookupError(err) => format!("DNS Lookup Error: {}", err),
            FetchError::HostnameParseError(name) => format!("Invalid Hostname: {}", name),
            FetchError::HttpResponseParseError(err) => {
                format!("HTTP Response Parse Error: {}", err)
            }
            FetchError::HttpStatusError(code, line) => {
                format!("HTTP Status Error: {} ({})", code, line)
            }
            FetchError::OpaqueUrlError(url) => format!("Opaque URL Error: {}", url),
            FetchError::SchemeError(scheme) => format!("Unmanaged Scheme: {}", scheme),
            FetchError::SessionClosed => "Session Closed".to_owned(),
            FetchError::Timeout(duration) => format!("Timeout after {:?}", duration),
            // Wrapped errors
            FetchError::CertificateError(err) => format!("Certificate Error: {}", err),
            FetchError::DecodeError(err) => format!("JSON Decode Error: {}", err),
            FetchError::EncodingError(err) => format!("Utf8 Encoding Error: {}", err),
            FetchError::IOError(err) => format!("IO Error: {}", err),
            FetchError::UrlParseError(err) => format!("URL Parse Error: {}", err),
        };
        write!(f, "{}", description)
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let err: Option<&(dyn Error + 'static)> = match self {
            FetchError::CertificateError(err) => Some(err),
            FetchError::DecodeError(err) => Some(err),
            FetchError::EncodingError(err) => Some(err),
            FetchError::IOError(err) => Some(err),
            FetchError::UrlParseError(err) => Some(err),
            _ => None,
        };
        err
    }
}

impl From<TLSError> for FetchError {
    fn from(err: TLSError) -> FetchError {
        FetchError::CertificateError(err)
    }
}

impl From<JsonError> for FetchError {
    fn from(err: JsonError) -> FetchError {
        FetchError::DecodeError(err)
    }
}

impl From<FromUtf8Error> for FetchError {
    fn from(err: FromUtf8Error) -> FetchError {
        FetchError::EncodingError(err)
    }
}

impl From<IOError> for FetchError {
    fn from(err: IOError) -> FetchError {
        FetchError::IOError(err)
    }
}

impl From<UrlParseError> for FetchError {
    fn from(err: UrlParseError) -> FetchError {
        FetchError::UrlParseError(err)
    }
}
