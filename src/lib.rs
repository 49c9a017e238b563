//! # fetchonce
//!
//! fetchonce is a command line tool and a rust library that GET a JSON
//! document over HTTP or HTTPS and decode it.
//! The HTTP/1.1 protocol is implemented here on top of async-std for TCP and
//! DNS query, and use rustls for handling HTTPS connection.
//!
//! # Examples:
//!
//! ## Command Line:
//!
//! ```bash
//! $ fetchonce
//! {"id":"302604426781261824", ...}
//! ```
//!
//! ## Library:
//!
//! ```no_run
//! use async_std::task;
//! use fetchonce::Session;
//!
//! task::block_on(async {
//!     let mut session = Session::new().unwrap();
//!     let response = session
//!         .get("https://discordsbestbots.xyz/api/profiles/302604426781261824")
//!         .await
//!         .unwrap();
//!     session.close();
//!     println!("{}", response.body_as_json().unwrap());
//! });
//! ```
//!
//! # License
//!
//! BSD 3-Clause License
//!

#[macro_use]
extern crate log;

mod asynctls;
mod dns;
mod http;

pub mod constants;
pub mod errors;
pub mod fetch;
pub mod request;
pub mod response;
pub mod results;
pub mod session;
pub mod transport;

// Rexport
pub use fetch::{fetch_once, write_json, FetchOnce, FetchState};
pub use request::RequestBuilder;
pub use results::{ErrorKind, FetchError, FetchResult};
pub use session::Session;
pub use transport::{Connection, NetTransport, Transport};
