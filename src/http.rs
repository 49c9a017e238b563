//! Low level and internal HTTP/1.1 response decoding.

use async_std::io::{Read, Result as IoResult};
use async_std::prelude::*;

use super::constants;
use super::response::{Response, ResponseBuilder};
use super::results::{FetchError, FetchResult};

const BUFFER_PAGE_SIZE: usize = 2048;

#[derive(Debug, PartialEq)]
enum TransferEncoding {
    ContentLength(usize),
    Chunked,
    NoBody,
    UntilClose,
}

impl TransferEncoding {
    fn from_response(response: &Response) -> FetchResult<Self> {
        let status_code = response.status_code();
        if status_code < 200 || status_code == 204 || status_code == 304 {
            return Ok(TransferEncoding::NoBody);
        }
        if let Some(tenc) = response.header("Transfer-Encoding") {
            let chunked = tenc
                .split(',')
                .last()
                .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
                .unwrap_or(false);
            if chunked {
                return Ok(TransferEncoding::Chunked);
            }
            warn!("Unmanaged Transfer-Encoding {}, reading until close", tenc);
            return Ok(TransferEncoding::UntilClose);
        }
        if let Some(clength) = response.header("Content-Length") {
            let clength = clength.parse::<usize>().map_err(|_| {
                FetchError::HttpResponseParseError(format!("Invalid Content-Length: {}", clength))
            })?;
            return Ok(TransferEncoding::ContentLength(clength));
        }
        warn!("Neither Content-Length, not chunk is response header");
        Ok(TransferEncoding::UntilClose)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn truncated(what: &str) -> FetchError {
    FetchError::HttpResponseParseError(format!("Connection closed while reading {}", what))
}

struct HttpDecoder<'a, R: Read + Unpin + ?Sized> {
    reader: &'a mut R,
    buffer: Vec<u8>,
}

impl<'a, R: Read + Unpin + ?Sized> HttpDecoder<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        HttpDecoder {
            reader,
            buffer: Vec::with_capacity(BUFFER_PAGE_SIZE),
        }
    }

    async fn chunk_read(&mut self) -> IoResult<usize> {
        let mut buf = [0; BUFFER_PAGE_SIZE];
        let count = self.reader.read(&mut buf[..]).await?;
        if count > 0 {
            self.buffer.extend_from_slice(&buf[0..count]);
        }
        Ok(count)
    }

    /// Read until `needle` is buffered and return its position,
    /// `None` if the peer closed the connection before.
    async fn fill_until(&mut self, needle: &[u8]) -> IoResult<Option<usize>> {
        let mut from = 0;
        loop {
            if let Some(pos) = find(&self.buffer[from..], needle) {
                return Ok(Some(from + pos));
            }
            from = self.buffer.len().saturating_sub(needle.len() - 1);
            if self.chunk_read().await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Read until at least `size` bytes are buffered.
    async fn fill_to(&mut self, size: usize) -> IoResult<bool> {
        while self.buffer.len() < size {
            if self.chunk_read().await? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn read_head(&mut self) -> FetchResult<ResponseBuilder> {
        info!("Reading headers");
        let pos = self
            .fill_until(constants::HEADERS_END)
            .await?
            .ok_or_else(|| truncated("headers"))?;
        let head = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        self.buffer.drain(..pos + constants::HEADERS_END.len());

        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap_or("");
        debug!("Adding status line {}", status_line);

        let mut headers: Vec<String> = Vec::new();
        for line in lines {
            if line.starts_with(' ') || line.starts_with('\t') {
                match headers.last_mut() {
                    Some(header) => {
                        header.push_str("\r\n");
                        header.push_str(line);
                        continue;
                    }
                    None => {
                        return Err(FetchError::HttpResponseParseError(format!(
                            "Continuation line without header: {}",
                            line
                        )))
                    }
                }
            }
            if !constants::HEADER_LINE.is_match(line.as_bytes()) {
                return Err(FetchError::HttpResponseParseError(format!(
                    "Malformed header: {}",
                    line
                )));
            }
            headers.push(line.to_owned());
        }

        let mut builder = ResponseBuilder::new().set_status_line(status_line);
        for header in headers.iter() {
            debug!("Adding header {}", header);
            builder = builder.add_header(header);
        }
        info!("Headers read");
        Ok(builder)
    }

    async fn read_content_length(&mut self, size: usize) -> FetchResult<Vec<u8>> {
        if !self.fill_to(size).await? {
            return Err(truncated("body"));
        }
        let body: Vec<u8> = self.buffer.drain(..size).collect();
        if !self.buffer.is_empty() {
            warn!("{} bytes received after the body", self.buffer.len());
        }
        Ok(body)
    }

    async fn read_until_close(&mut self) -> FetchResult<Vec<u8>> {
        while self.chunk_read().await? > 0 {}
        Ok(self.buffer.drain(..).collect())
    }

    async fn read_chunk_size(&mut self) -> FetchResult<usize> {
        let pos = self
            .fill_until(constants::CRLF)
            .await?
            .ok_or_else(|| truncated("chunk size"))?;
        let size = {
            let line = &self.buffer[..pos];
            let caps = constants::CHUNK_SIZE.captures(line).ok_or_else(|| {
                FetchError::HttpResponseParseError(format!(
                    "Malformed chunk size: {}",
                    String::from_utf8_lossy(line)
                ))
            })?;
            let size = String::from_utf8_lossy(&caps[1]).into_owned();
            usize::from_str_radix(size.as_str(), 16).map_err(|_| {
                FetchError::HttpResponseParseError(format!("Chunk size overflow: {}", size))
            })?
        };
        self.buffer.drain(..pos + constants::CRLF.len());
        Ok(size)
    }

    async fn read_trailers(&mut self) -> FetchResult<()> {
        loop {
            match self.fill_until(constants::CRLF).await? {
                None => {
                    // peer closed right after the last chunk
                    self.buffer.clear();
                    return Ok(());
                }
                Some(0) => {
                    self.buffer.drain(..constants::CRLF.len());
                    return Ok(());
                }
                Some(pos) => {
                    debug!(
                        "Ignoring trailer {}",
                        String::from_utf8_lossy(&self.buffer[..pos])
                    );
                    self.buffer.drain(..pos + constants::CRLF.len());
                }
            }
        }
    }

    async fn read_chunked(&mut self) -> FetchResult<Vec<u8>> {
        let mut body = Vec::new();
        loop {
            let size = self.read_chunk_size().await?;
            debug!("Reading chunk of {} bytes", size);
            if size == 0 {
                self.read_trailers().await?;
                return Ok(body);
            }
            let chunk_end = size.checked_add(constants::CRLF.len()).ok_or_else(|| {
                FetchError::HttpResponseParseError(format!("Chunk size overflow: {:x}", size))
            })?;
            if !self.fill_to(chunk_end).await? {
                return Err(truncated("chunk"));
            }
            body.extend_from_slice(&self.buffer[..size]);
            if &self.buffer[size..chunk_end] != constants::CRLF {
                return Err(FetchError::HttpResponseParseError(
                    "Missing CRLF after chunk".to_owned(),
                ));
            }
            self.buffer.drain(..chunk_end);
        }
    }

    async fn read_response(&mut self) -> FetchResult<Response> {
        let (builder, transfer_encoding) = loop {
            let builder = self.read_head().await?;
            let head = builder.build()?;
            // 101 hands the connection over to another protocol
            let status_code = head.status_code();
            if (100..200).contains(&status_code) && status_code != 101 {
                info!("Skipping interim response {}", head.status_line());
                continue;
            }
            break (builder, TransferEncoding::from_response(&head)?);
        };

        info!("Reading body {:?}", transfer_encoding);
        let body = match transfer_encoding {
            TransferEncoding::NoBody => return builder.build(),
            TransferEncoding::ContentLength(size) => self.read_content_length(size).await?,
            TransferEncoding::Chunked => self.read_chunked().await?,
            TransferEncoding::UntilClose => self.read_until_close().await?,
        };
        info!("< [[{} bytes]]", body.len());
        builder.set_body(body.as_slice()).build()
    }
}

/// Decode one HTTP/1.1 response from `reader`.
pub async fn read_response<R>(reader: &mut R) -> FetchResult<Response>
where
    R: Read + Unpin + ?Sized,
{
    let mut decoder = HttpDecoder::new(reader);
    decoder.read_response().await
}
