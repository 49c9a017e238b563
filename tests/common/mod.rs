#![allow(dead_code)]

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_std::io::{self, Cursor, Read, Write};
use async_std::net::{SocketAddr, TcpListener};
use async_std::prelude::*;
use async_std::task::{self, Context, JoinHandle, Poll};
use futures::future::BoxFuture;

use fetchonce::request::Request;
use fetchonce::{Connection, FetchResult, Transport};

pub const PROFILE: &str = r#"{"id": "302604426781261824"}"#;

/// A complete HTTP/1.1 response with a Content-Length.
pub fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub connected: AtomicUsize,
    pub shut: AtomicUsize,
    pub released: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }
    pub fn shut(&self) -> usize {
        self.shut.load(Ordering::SeqCst)
    }
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

pub struct MemoryConnection {
    input: Cursor<Vec<u8>>,
    stalled: bool,
    counters: Arc<Counters>,
}

impl Read for MemoryConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        if self.stalled {
            return Poll::Pending;
        }
        Pin::new(&mut self.input).poll_read(cx, buf)
    }
}

impl Write for MemoryConnection {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.counters.shut.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

impl Connection for MemoryConnection {
    fn release(&mut self) -> io::Result<()> {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A transport answering every request with the same bytes, or refusing
/// to connect when there are none.
pub struct CountingTransport {
    response: Option<Vec<u8>>,
    stalled: bool,
    counters: Arc<Counters>,
}

impl CountingTransport {
    pub fn responding(response: &str) -> (Self, Arc<Counters>) {
        CountingTransport::new(Some(response.as_bytes().to_vec()), false)
    }

    pub fn refusing() -> (Self, Arc<Counters>) {
        CountingTransport::new(None, false)
    }

    /// Connections accept the request and never answer.
    pub fn stalling() -> (Self, Arc<Counters>) {
        CountingTransport::new(Some(Vec::new()), true)
    }

    fn new(response: Option<Vec<u8>>, stalled: bool) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let transport = CountingTransport {
            response,
            stalled,
            counters: counters.clone(),
        };
        (transport, counters)
    }
}

impl Transport for CountingTransport {
    fn open(&mut self) -> FetchResult<()> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn connect<'a>(
        &'a mut self,
        _request: &'a Request,
    ) -> BoxFuture<'a, FetchResult<Box<dyn Connection>>> {
        let outcome: FetchResult<Box<dyn Connection>> = match self.response {
            Some(ref response) => {
                self.counters.connected.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MemoryConnection {
                    input: Cursor::new(response.clone()),
                    stalled: self.stalled,
                    counters: self.counters.clone(),
                }))
            }
            None => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into()),
        };
        Box::pin(async move { outcome })
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serve `response` to the first client, the handle returns the request
/// it sent.
pub async fn serve_once(response: String) -> (SocketAddr, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = task::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let count = stream.read(&mut buf).await.unwrap();
            if count == 0 {
                break;
            }
            request.extend_from_slice(&buf[..count]);
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
        request
    });
    (addr, handle)
}

/// Accept one client and keep the connection open without answering.
pub async fn serve_nothing() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = task::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0; 1024];
        // returns once the client gives up
        while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
    });
    (addr, handle)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
