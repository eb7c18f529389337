//! Line framing for the stdio transport.
//!
//! A line that cannot be decoded (invalid UTF-8, or longer than the limit)
//! is answered with a parse error and skipped; only I/O failures on the
//! input stream end the loop.

use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};

use crate::RpcHandler;

/// Longest accepted request line, in bytes.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    Rejected(String),
}

/// `LinesCodec` that reports undecodable lines as frames instead of errors.
pub struct RequestLines {
    inner: LinesCodec,
}

impl RequestLines {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_line_length),
        }
    }

    fn frame(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Frame>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Frame::Rejected("line exceeds the maximum length".to_string())))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(Frame::Rejected(e.to_string())))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for RequestLines {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::frame(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        Self::frame(self.inner.decode_eof(buf))
    }
}

/// Answer requests read from `input` line by line until it ends.
pub async fn serve<R, W>(
    handler: RpcHandler,
    input: R,
    mut output: W,
    max_line_length: usize,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = FramedRead::new(input, RequestLines::new(max_line_length));

    while let Some(frame) = reader.next().await.transpose()? {
        let reply = match frame {
            Frame::Line(line) => {
                tracing::debug!("--> {}", line);
                let handler = handler.clone();
                tokio::task::spawn_blocking(move || handler.handle_line(&line)).await?
            }
            Frame::Rejected(reason) => {
                tracing::warn!("unreadable input line: {reason}");
                crate::parse_error_reply(&reason)
            }
        };

        if let Some(reply) = reply {
            tracing::debug!("<-- {}", reply);

            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
    }

    Ok(())
}
