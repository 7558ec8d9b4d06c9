//! Length-prefixed frame codec for the binary transport.
//!
//! Wire shape: a big-endian `u32` length, followed by exactly that many
//! bytes of an [`crate::envelope::McpEnvelope`] serialized with `prost`.

use crate::envelope::McpEnvelope;
use crate::error::{McpError, McpResult};
use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads one length-prefixed frame and decodes it as an `McpEnvelope`.
///
/// Fails with `InvalidFraming` if the declared length is zero, with
/// `MessageTooLarge` if it exceeds `max_message_size`, and with
/// `ShortRead` if the stream ends before the declared length is read.
pub async fn read_envelope<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_message_size: usize,
) -> McpResult<Option<McpEnvelope>> {
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(McpError::Io(e)),
    };

    if len == 0 {
        return Err(McpError::InvalidFraming("zero-length frame".into()));
    }
    let len = len as usize;
    if len > max_message_size {
        return Err(McpError::MessageTooLarge(len, max_message_size));
    }

    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|_| McpError::ShortRead(len))?;

    let envelope = McpEnvelope::decode(buf.as_slice())
        .map_err(|e| McpError::MalformedMessage(e.to_string()))?;
    Ok(Some(envelope))
}

/// Encodes `envelope` and writes it as a length-prefixed frame.
pub async fn write_envelope<W: AsyncWrite + Unpin>(
    writer: &mut W,
    envelope: &McpEnvelope,
) -> McpResult<()> {
    let mut buf = Vec::with_capacity(envelope.encoded_len());
    envelope
        .encode(&mut buf)
        .map_err(|e| McpError::Internal(e.to_string()))?;

    writer.write_u32(buf.len() as u32).await?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{mcp_envelope::Payload, InitializeRequest};
    use std::io::Cursor;

    fn sample_envelope() -> McpEnvelope {
        McpEnvelope::new(
            1,
            Payload::InitializeRequest(InitializeRequest {
                protocol_version: "1.0.0".into(),
            }),
        )
    }

    #[tokio::test]
    async fn round_trips_through_encode_and_decode() {
        let envelope = sample_envelope();
        let mut buf = Vec::new();
        write_envelope(&mut buf, &envelope).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_envelope(&mut cursor, 1024).await.unwrap().unwrap();
        assert_eq!(decoded, envelope);
    }

    #[tokio::test]
    async fn trailing_bytes_remain_readable_after_one_frame() {
        let envelope = sample_envelope();
        let mut buf = Vec::new();
        write_envelope(&mut buf, &envelope).await.unwrap();
        buf.extend_from_slice(b"extra-trailer");

        let mut cursor = Cursor::new(buf);
        let _ = read_envelope(&mut cursor, 1024).await.unwrap().unwrap();
        let mut rest = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut cursor, &mut rest)
            .await
            .unwrap();
        assert_eq!(rest, b"extra-trailer");
    }

    #[tokio::test]
    async fn zero_length_is_invalid_framing() {
        let mut cursor = Cursor::new(0u32.to_be_bytes().to_vec());
        let err = read_envelope(&mut cursor, 1024).await.unwrap_err();
        assert!(matches!(err, McpError::InvalidFraming(_)));
    }

    #[tokio::test]
    async fn length_at_cap_is_accepted_length_over_cap_is_rejected() {
        let envelope = sample_envelope();
        let mut buf = Vec::new();
        write_envelope(&mut buf, &envelope).await.unwrap();
        let payload_len = buf.len() - 4;

        let mut cursor = Cursor::new(buf.clone());
        assert!(read_envelope(&mut cursor, payload_len).await.is_ok());

        let mut cursor = Cursor::new(buf);
        let err = read_envelope(&mut cursor, payload_len - 1).await.unwrap_err();
        assert!(matches!(err, McpError::MessageTooLarge(_, _)));
    }

    #[tokio::test]
    async fn short_stream_mid_frame_is_short_read() {
        let mut buf = 10u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"abc");
        let mut cursor = Cursor::new(buf);
        let err = read_envelope(&mut cursor, 1024).await.unwrap_err();
        assert!(matches!(err, McpError::ShortRead(10)));
    }

    #[tokio::test]
    async fn clean_eof_before_any_bytes_is_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let result = read_envelope(&mut cursor, 1024).await.unwrap();
        assert!(result.is_none());
    }
}
