//! Dispatches a session to the handler matching its sniffed protocol.

use crate::error::{McpError, McpResult};
use crate::sniffer::{Protocol, Sniffer};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncWrite};

/// A small interface every protocol handler implements. Kept deliberately
/// narrow: the sniffer hands out a tagged `Protocol`, not an overloaded
/// reader type, so handlers never need to re-detect anything.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        reader: Box<dyn AsyncRead + Send + Unpin>,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> McpResult<()>;
}

/// Maps sniffed protocol tags to handlers and drives one session.
#[derive(Default)]
pub struct Router {
    handlers: HashMap<Protocol, std::sync::Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, protocol: Protocol, handler: std::sync::Arc<dyn Handler>) {
        self.handlers.insert(protocol, handler);
    }

    /// Sniffs `reader`, looks up the matching handler, and invokes it with
    /// a reader that replays the peeked bytes and the original writer.
    pub async fn route<R, W>(&self, reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut sniffer = Sniffer::new(reader);
        let protocol = sniffer.detect().await.map_err(McpError::Io)?;

        let handler = self
            .handlers
            .get(&protocol)
            .ok_or_else(|| {
                McpError::Internal(format!("no handler registered for protocol: {protocol}"))
            })?
            .clone();

        handler
            .handle(Box::new(sniffer), Box::new(writer))
            .await
    }
}
