//! Reads one JSON-RPC request body per call, accepting either
//! newline-delimited JSON or LSP-style `Content-Length:`-framed bodies on
//! the same stream.

use crate::error::{McpError, McpResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Reads one request body. Returns `Ok(None)` on clean EOF before any
/// bytes of a new request are seen.
pub async fn read_request<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_body_size: usize,
) -> McpResult<Option<Vec<u8>>> {
    let mut first_line = String::new();
    loop {
        first_line.clear();
        let n = reader.read_line(&mut first_line).await?;
        if n == 0 {
            return Ok(None);
        }
        if first_line.trim().is_empty() {
            // Tolerate stray blank lines between requests.
            continue;
        }
        break;
    }

    if let Some(rest) = strip_ci_prefix(first_line.trim_end(), "Content-Length:") {
        return read_lsp_body(reader, rest.trim(), max_body_size).await.map(Some);
    }

    // Newline-delimited: the line we already read is the whole request.
    Ok(Some(first_line.trim_end().as_bytes().to_vec()))
}

async fn read_lsp_body<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    first_content_length: &str,
    max_body_size: usize,
) -> McpResult<Vec<u8>> {
    let mut content_length: Option<usize> = parse_content_length(first_content_length)?;

    // Consume any remaining headers until the blank line.
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(McpError::InvalidFraming("stream ended mid-headers".into()));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(rest) = strip_ci_prefix(trimmed, "Content-Length:") {
            content_length = parse_content_length(rest.trim())?;
        }
    }

    let len = content_length
        .ok_or_else(|| McpError::InvalidFraming("missing Content-Length header".into()))?;
    if len == 0 {
        return Err(McpError::InvalidFraming("Content-Length: 0 is rejected".into()));
    }
    if len > max_body_size {
        return Err(McpError::MessageTooLarge(len, max_body_size));
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|_| McpError::ShortRead(len))?;
    Ok(body)
}

fn parse_content_length(s: &str) -> McpResult<Option<usize>> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<i64>()
        .map_err(|_| McpError::InvalidFraming(format!("invalid Content-Length value: {s}")))
        .map(|n| if n <= 0 { None } else { Some(n as usize) })
}

fn strip_ci_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
