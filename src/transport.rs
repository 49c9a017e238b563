//! Byte streams carrying requests.
//!
//! A [Session](../session/struct.Session.html) owns one
//! [Transport](trait.Transport.html) and asks it for a
//! [Connection](trait.Connection.html) per request.
//! [NetTransport](struct.NetTransport.html) is the real implementation:
//! DNS, TCP and, for `https`, TLS.

use std::collections::HashMap;
use std::net::Shutdown;
use std::sync::Arc;

use async_std::io::{Read, Result as IoResult, Write};
use async_std::net::{SocketAddr, TcpStream};
use futures::future::{BoxFuture, FutureExt};
use rustls::ClientConfig;

use super::asynctls::{self, TLSStream};
use super::dns::Resolver;
use super::request::Request;
use super::results::{FetchError, FetchResult};

/// A duplex byte stream for one request.
pub trait Connection: Read + Write + Unpin + Send {
    /// Shut the stream down. Dropping the connection also closes it.
    fn release(&mut self) -> IoResult<()>;
}

impl Connection for TcpStream {
    fn release(&mut self) -> IoResult<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

impl Connection for TLSStream {
    fn release(&mut self) -> IoResult<()> {
        self.shutdown()
    }
}

/// The resources shared by the requests of a session.
pub trait Transport: Send {
    /// Acquire the resources, called once when the session is opened.
    fn open(&mut self) -> FetchResult<()>;

    /// Open a connection to the authority of the request.
    fn connect<'a>(
        &'a mut self,
        request: &'a Request,
    ) -> BoxFuture<'a, FetchResult<Box<dyn Connection>>>;

    /// Release the resources, called once when the session is closed.
    fn close(&mut self);
}

/// Connect using the system resolver, TCP and rustls.
pub struct NetTransport {
    tls_config: Option<Arc<ClientConfig>>,
    authorities: HashMap<String, SocketAddr>,
    ipv4: bool,
    ipv6: bool,
}

impl Default for NetTransport {
    fn default() -> Self {
        NetTransport::new()
    }
}

impl NetTransport {
    pub fn new() -> Self {
        NetTransport {
            tls_config: None,
            authorities: HashMap::new(),
            ipv4: true,
            ipv6: true,
        }
    }

    /// Bypass the resolver for `authority`, a `host:port` string.
    pub fn resolve(mut self, authority: &str, addr: SocketAddr) -> Self {
        self.authorities.insert(authority.to_owned(), addr);
        self
    }

    /// Restrict the address families used when resolving.
    pub fn set_ip_preference(mut self, ipv4: bool, ipv6: bool) -> Self {
        self.ipv4 = ipv4;
        self.ipv6 = ipv6;
        self
    }

    pub fn is_open(&self) -> bool {
        self.tls_config.is_some()
    }

    async fn get_addr(&self, authority: &str) -> FetchResult<SocketAddr> {
        match self.authorities.get(authority) {
            Some(val) => {
                info!("Fetch authority {} using autorities map", authority);
                Ok(*val)
            }
            None => {
                info!("Fetch authority {} using resolver", authority);
                let resolver = Resolver::new(self.ipv4, self.ipv6);
                resolver.get_addr(authority).await
            }
        }
    }

    async fn connect_to(&self, request: &Request) -> FetchResult<Box<dyn Connection>> {
        let tls_config = self.tls_config.as_ref().ok_or(FetchError::SessionClosed)?;
        let scheme = request.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::SchemeError(format!(
                "Unrecognized scheme {}",
                scheme
            )));
        }

        let addr = self.get_addr(request.authority()).await?;
        info!("Connecting to {}", addr);
        let tcpstream = TcpStream::connect(addr).await?;

        if scheme == "http" {
            return Ok(Box::new(tcpstream));
        }
        let mut tls_client = TLSStream::new(tcpstream, tls_config, request.host())?;
        tls_client.handshake().await?;
        Ok(Box::new(tls_client))
    }
}

impl Transport for NetTransport {
    fn open(&mut self) -> FetchResult<()> {
        debug!("Loading TLS root certificates");
        self.tls_config = Some(asynctls::create_config());
        Ok(())
    }

    fn connect<'a>(
        &'a mut self,
        request: &'a Request,
    ) -> BoxFuture<'a, FetchResult<Box<dyn Connection>>> {
        self.connect_to(request).boxed()
    }

    fn close(&mut self) {
        debug!("Releasing TLS configuration");
        self.tls_config = None;
    }
}
