//! Default values
//!
//! [see whats inside](../../src/fetchonce/constants.rs.html).

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Version of fetchonce
pub const VERSION: &str = "0.1.0";

/// Default user agent `fetchonce/{fetchonce-version}`
pub const USER_AGENT: &str = "fetchonce/0.1.0";

/// The document fetched by the `fetchonce` binary.
pub const PROFILE_URL: &str = "https://discordsbestbots.xyz/api/profiles/302604426781261824";

/// Separator between the response head and its body.
pub const HEADERS_END: &[u8] = b"\r\n\r\n";

/// Line separator in the response head and in chunked bodies.
pub const CRLF: &[u8] = b"\r\n";

/// Header line `Name: value`, the value is trimmed.
pub static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([!#$%&'*+.^_`|~0-9A-Za-z-]+):[ \t]*(.*?)[ \t]*$").unwrap()
});

/// Chunk size line, extensions after `;` are ignored.
pub static CHUNK_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Fa-f]+)[ \t]*(?:;.*)?$").unwrap());
