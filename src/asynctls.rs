//! Handle the decrypt TCP async via rust TLS and expose HTTP
//! TCP <=> TLS <-> HTTP
//! <=> is async
//! <-> is sync

use std::io::{self as sync_io, Read as SyncRead, Write as SyncWrite};
use std::net::Shutdown;
use std::pin::Pin;
use std::sync::Arc;

use async_std::io::{Read, Result as IoResult, Write};
use async_std::net::TcpStream;
use async_std::prelude::*;
use async_std::task::{Context, Poll};
use futures::future::poll_fn;
use futures::ready;
use rustls::{ClientConfig, ClientSession, ProtocolVersion, Session};
use webpki::DNSNameRef;

use super::results::{FetchError, FetchResult};

const BUFFER_PAGE_SIZE: usize = 4096;

/// The client configuration trusting the Mozilla root store.
pub fn create_config() -> Arc<ClientConfig> {
    let mut config = ClientConfig::new();
    config
        .root_store
        .add_server_trust_anchors(&webpki_roots::TLS_SERVER_ROOTS);
    Arc::new(config)
}

fn create_client(config: &Arc<ClientConfig>, host: &str) -> FetchResult<ClientSession> {
    let host = DNSNameRef::try_from_ascii_str(host)
        .map_err(|_| FetchError::HostnameParseError(host.to_string()))?;
    Ok(ClientSession::new(config, host))
}

fn protocol_name(protocol: Option<ProtocolVersion>) -> String {
    match protocol {
        Some(ProtocolVersion::SSLv2) => "SSL v2".to_owned(),
        Some(ProtocolVersion::SSLv3) => "SSL v3".to_owned(),
        Some(ProtocolVersion::TLSv1_0) => "TLS v1.0".to_owned(),
        Some(ProtocolVersion::TLSv1_1) => "TLS v1.1".to_owned(),
        Some(ProtocolVersion::TLSv1_2) => "TLS v1.2".to_owned(),
        Some(ProtocolVersion::TLSv1_3) => "TLS v1.3".to_owned(),
        Some(ProtocolVersion::Unknown(num)) => format!("Unknown TLS Protocol {}", num),
        None => "No TLS Protocol".to_owned(),
    }
}

/// A TLS client session over an owned TCP stream.
pub struct TLSStream {
    tcpstream: TcpStream,
    tlsclient: ClientSession,
    buf_tlswrite: Vec<u8>,
    tcp_eof: bool,
    close_notify_sent: bool,
}

impl TLSStream {
    pub fn new(tcpstream: TcpStream, config: &Arc<ClientConfig>, host: &str) -> FetchResult<Self> {
        Ok(TLSStream {
            tcpstream,
            tlsclient: create_client(config, host)?,
            buf_tlswrite: Vec::with_capacity(BUFFER_PAGE_SIZE),
            tcp_eof: false,
            close_notify_sent: false,
        })
    }

    /// Decode TLS records received from the TCP stream.
    fn feed(&mut self, data: &[u8]) -> FetchResult<()> {
        let mut data = data;
        while !data.is_empty() {
            let count = self.tlsclient.read_tls(&mut data)?;
            debug!("Decode {} TLS bytes", count);
            self.tlsclient.process_new_packets()?;
            if count == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Move the pending TLS records to the TCP stream.
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        while self.tlsclient.wants_write() {
            let count = self.tlsclient.write_tls(&mut self.buf_tlswrite)?;
            debug!("Write {} TLS bytes", count);
        }
        while !self.buf_tlswrite.is_empty() {
            let count = ready!(Pin::new(&mut self.tcpstream).poll_write(cx, &self.buf_tlswrite))?;
            if count == 0 {
                return Poll::Ready(Err(sync_io::Error::new(
                    sync_io::ErrorKind::WriteZero,
                    "TCP stream refused TLS records",
                )));
            }
            self.buf_tlswrite.drain(..count);
        }
        Poll::Ready(Ok(()))
    }

    async fn drain(&mut self) -> IoResult<()> {
        poll_fn(|cx| self.poll_drain(cx)).await?;
        self.tcpstream.flush().await
    }

    pub async fn handshake(&mut self) -> FetchResult<()> {
        while self.tlsclient.is_handshaking() {
            self.drain().await?;
            if !self.tlsclient.is_handshaking() {
                break;
            }
            if !self.tlsclient.wants_read() {
                return Err(FetchError::IOError(sync_io::Error::new(
                    sync_io::ErrorKind::Other,
                    "TLS handshake stalled",
                )));
            }
            let mut buf = [0; BUFFER_PAGE_SIZE];
            let count = self.tcpstream.read(&mut buf[..]).await?;
            if count == 0 {
                return Err(FetchError::IOError(sync_io::Error::new(
                    sync_io::ErrorKind::UnexpectedEof,
                    "Connection closed during TLS handshake",
                )));
            }
            debug!("Read {} TCP bytes", count);
            self.feed(&buf[..count])?;
        }
        // the last flight of the client may still be pending
        self.drain().await?;
        info!(
            "Handshake complete, {} negociated",
            protocol_name(self.tlsclient.get_protocol_version())
        );
        Ok(())
    }

    /// Shut the TCP stream down. The close_notify alert is sent by
    /// `close`, not here.
    pub fn shutdown(&mut self) -> IoResult<()> {
        self.tcpstream.shutdown(Shutdown::Both)
    }
}

impl Read for TLSStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<IoResult<usize>> {
        let self_ = Pin::get_mut(self);

        loop {
            match self_.tlsclient.read(buf) {
                Ok(0) => {}
                Ok(count) => return Poll::Ready(Ok(count)),
                // close_notify received
                Err(ref err) if err.kind() == sync_io::ErrorKind::ConnectionAborted => {
                    return Poll::Ready(Ok(0))
                }
                Err(err) => return Poll::Ready(Err(err)),
            }
            if self_.tcp_eof {
                return Poll::Ready(Ok(0));
            }

            let mut buf_tlsread = [0; BUFFER_PAGE_SIZE];
            let count = ready!(Pin::new(&mut self_.tcpstream).poll_read(cx, &mut buf_tlsread))?;
            if count == 0 {
                debug!("TCP stream closed");
                self_.tcp_eof = true;
                continue;
            }
            debug!("Read {} TCP bytes", count);
            if let Err(err) = self_.feed(&buf_tlsread[..count]) {
                return Poll::Ready(Err(sync_io::Error::new(
                    sync_io::ErrorKind::InvalidData,
                    format!("{}", err),
                )));
            }
        }
    }
}

impl Write for TLSStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context, buf: &[u8]) -> Poll<IoResult<usize>> {
        let self_ = Pin::get_mut(self);
        ready!(self_.poll_drain(cx))?;
        let count = self_.tlsclient.write(buf)?;
        // The records are sent on the next write or on flush.
        while self_.tlsclient.wants_write() {
            self_.tlsclient.write_tls(&mut self_.buf_tlswrite)?;
        }
        Poll::Ready(Ok(count))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context) -> Poll<IoResult<()>> {
        let self_ = Pin::get_mut(self);
        ready!(self_.poll_drain(cx))?;
        Pin::new(&mut self_.tcpstream).poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context) -> Poll<IoResult<()>> {
        let self_ = Pin::get_mut(self);
        if !self_.close_notify_sent {
            debug!("Sending close_notify");
            self_.tlsclient.send_close_notify();
            self_.close_notify_sent = true;
        }
        ready!(self_.poll_drain(cx))?;
        Pin::new(&mut self_.tcpstream).poll_close(cx)
    }
}

#[cfg(test)]
mod tests {
    use async_std::net::TcpListener;
    use async_std::task;

    use super::*;

    #[async_std::test]
    async fn test_close_sends_close_notify() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = task::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        });

        let tcpstream = TcpStream::connect(addr).await.unwrap();
        let config = create_config();
        let mut tls_client = TLSStream::new(tcpstream, &config, "localhost").unwrap();
        futures::AsyncWriteExt::close(&mut tls_client).await.unwrap();
        drop(tls_client);

        // ClientHello then a single plaintext warning alert: close_notify
        let received = server.await;
        let len = received.len();
        assert!(len > 7, "only {} bytes received", len);
        assert_eq!(received[len - 7], 0x15);
        assert_eq!(&received[len - 4..], &[0x00, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_create_client_invalid_hostname() {
        let config = create_config();
        let err = create_client(&config, "not a hostname!").unwrap_err();
        assert_eq!(format!("{}", err), "Invalid Hostname: not a hostname!");
    }

    #[test]
    fn test_create_client() {
        let config = create_config();
        let client = create_client(&config, "discordsbestbots.xyz").unwrap();
        assert!(client.is_handshaking());
        assert!(client.wants_write());
    }

    #[test]
    fn test_protocol_name() {
        assert_eq!(protocol_name(Some(ProtocolVersion::TLSv1_3)), "TLS v1.3");
        assert_eq!(protocol_name(None), "No TLS Protocol");
    }
}
