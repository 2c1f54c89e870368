use async_trait::async_trait;
use futures::{future, stream::BoxStream, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close(Option<String>),
}

pub type FrameStream = BoxStream<'static, Result<Frame, TransportError>>;

/// End of stream, a `Close` frame or an `Err` item means the connection is lost.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &Url) -> Result<FrameStream, TransportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &Url) -> Result<FrameStream, TransportError> {
        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        }

        let (ws_stream, _) =
            connect_async(endpoint.as_str())
                .await
                .map_err(|err| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    reason: err.to_string(),
                })?;
        // Receive-only: the write half is dropped, control frames are still
        // answered by the reader.
        let (_, ws_reader) = ws_stream.split();

        let frames = ws_reader.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text))),
                Ok(Message::Binary(bytes)) => Some(Ok(Frame::Binary(bytes))),
                Ok(Message::Close(close)) => {
                    Some(Ok(Frame::Close(close.map(|frame| frame.reason.into_owned()))))
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
                Err(err) => Some(Err(TransportError::Receive(err.to_string()))),
            })
        });

        Ok(frames.boxed())
    }
}
