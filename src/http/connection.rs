use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::files::StaticFiles;
use crate::http::parser::{
    MAX_REQUEST_BYTES, ParseError, parse_http_request, parse_http_request_eof,
};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

/// Per-connection I/O deadlines. `None` waits forever.
///
/// `read` bounds the whole request, not each read from the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadlines {
    pub read: Option<Duration>,
    pub write: Option<Duration>,
}

/// Serves exactly one request on one accepted stream, then closes it.
pub struct Connection<S> {
    stream: S,
    peer: String,
    files: Arc<StaticFiles>,
    deadlines: Deadlines,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        files: Arc<StaticFiles>,
        deadlines: Deadlines,
    ) -> Self {
        Self {
            stream,
            peer: peer.into(),
            files,
            deadlines,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
        }
    }

    /// Drives the connection to `Closed`.
    ///
    /// The stream is shut down on every exit path, including failed writes,
    /// and released when the connection is dropped at the end of this call.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.state = ConnectionState::Closed;

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(peer = %self.peer, error = %e, "Stream shutdown failed");
        }

        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => {
                    let request = match self.deadlines.read {
                        Some(limit) => timeout(limit, self.read_request())
                            .await
                            .context("timed out reading request")??,
                        None => self.read_request().await?,
                    };

                    match request {
                        Some(req) => ConnectionState::Processing(req),
                        None => ConnectionState::Closed,
                    }
                }

                ConnectionState::Processing(req) => {
                    let response = self.handle_request(&req).await;

                    tracing::info!(
                        peer = %self.peer,
                        method = %req.method,
                        path = %req.path,
                        version = %req.version,
                        status = response.status.as_u16(),
                        "Serving request"
                    );
                    tracing::debug!(request = %req, headers = ?response.headers, "Request and response heads");

                    ConnectionState::Writing(ResponseWriter::new(&response))
                }

                ConnectionState::Writing(mut writer) => {
                    self.write_response(&mut writer).await?;
                    tracing::debug!(peer = %self.peer, bytes = writer.len(), "Response sent");
                    ConnectionState::Closed
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    /// Reads until a request parses.
    ///
    /// `Ok(None)` means the bytes were not an acceptable request; the caller
    /// closes without answering.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    self.reject(&e);
                    return Ok(None);
                }
            }

            if self.buffer.len() >= MAX_REQUEST_BYTES {
                self.reject(&ParseError::TooLarge);
                return Ok(None);
            }

            if self.read_more().await? == 0 {
                // Client closed its side, decide with what we have
                return match parse_http_request_eof(&self.buffer) {
                    Ok((request, consumed)) => {
                        self.buffer.advance(consumed);
                        Ok(Some(request))
                    }
                    Err(ParseError::Incomplete) => Err(anyhow::anyhow!(
                        "connection closed before the declared body arrived"
                    )),
                    Err(e) => {
                        self.reject(&e);
                        Ok(None)
                    }
                };
            }
        }
    }

    async fn handle_request(&self, req: &Request) -> Response {
        if !req.method.is_supported() {
            return Response::not_implemented();
        }

        let outcome = self.files.resolve(&req.path).await;
        Response::for_method(&req.method, &req.path, outcome)
    }

    async fn read_more(&mut self) -> anyhow::Result<usize> {
        self.buffer.reserve(READ_CHUNK);
        let n = self.stream.read_buf(&mut self.buffer).await?;
        Ok(n)
    }

    async fn write_response(&mut self, writer: &mut ResponseWriter) -> anyhow::Result<()> {
        let limit = self.deadlines.write;

        let write = writer.write_to_stream(&mut self.stream);
        match limit {
            Some(limit) => timeout(limit, write)
                .await
                .context("timed out writing response")??,
            None => write.await?,
        }

        Ok(())
    }

    fn reject(&self, error: &ParseError) {
        tracing::warn!(peer = %self.peer, error = %error, buffered = self.buffer.len(), "Dropping request");
    }
}
