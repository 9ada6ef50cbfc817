// WebSocket server: accepts browser and tool clients and answers each JSON
// request with a JSON envelope.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use statline_core::RecordStore;
use statline_engine::StatsService;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::app;

/// Bind the TCP listener. Split from [`run`] so callers can bind port 0 and
/// read back the chosen address.
pub async fn bind(addr: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("WebSocket server listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept connections forever, serving each on its own task.
///
/// Browser clients whose `Origin` differs from `allowed_origin` are refused
/// during the handshake.
pub async fn run<S>(
    listener: TcpListener,
    service: Arc<StatsService<S>>,
    allowed_origin: String,
) -> anyhow::Result<()>
where
    S: RecordStore + Send + Sync + 'static,
{
    let allowed_origin = Arc::new(allowed_origin);
    loop {
        let (stream, addr) = listener.accept().await?;
        info!("Accepted TCP connection from {addr}");

        let service = Arc::clone(&service);
        let allowed_origin = Arc::clone(&allowed_origin);
        tokio::spawn(async move {
            serve_connection(stream, addr, service, &allowed_origin).await;
        });
    }
}

/// Whether a handshake carrying `origin` may proceed. Requests without an
/// `Origin` header come from non-browser clients and are accepted.
pub fn origin_allowed(origin: Option<&str>, allowed_origin: &str) -> bool {
    origin.is_none_or(|o| o.trim_end_matches('/') == allowed_origin.trim_end_matches('/'))
}

async fn serve_connection<S>(
    stream: TcpStream,
    addr: SocketAddr,
    service: Arc<StatsService<S>>,
    allowed_origin: &str,
) where
    S: RecordStore + Send + Sync + 'static,
{
    let check_origin = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let origin = req
            .headers()
            .get("origin")
            .and_then(|value| value.to_str().ok());
        if origin_allowed(origin, allowed_origin) {
            Ok(response)
        } else {
            warn!("Refusing WebSocket from {addr}: origin {origin:?} not allowed");
            let mut refusal = ErrorResponse::new(Some("origin not allowed".into()));
            *refusal.status_mut() = StatusCode::FORBIDDEN;
            Err(refusal)
        }
    };

    let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, check_origin).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    let addr_str = addr.to_string();
    let (mut write, read) = ws_stream.split();
    let result = process_message_stream(read, &mut write, &addr_str, |raw| {
        app::handle_message(&service, raw)
    })
    .await;

    match result {
        Ok(replies) => info!("Client {addr_str} disconnected after {replies} requests"),
        Err(e) => warn!("Failed to write to {addr_str}: {e}"),
    }
}

/// Answer every text message from `stream` with `handler`'s reply, written
/// to `sink`. Stops at a close frame, a read error, or the end of the
/// stream, and returns the number of replies sent.
///
/// Generic over the stream and sink so it can be tested without opening
/// TCP ports.
pub async fn process_message_stream<St, Si, F>(
    mut stream: St,
    sink: &mut Si,
    addr: &str,
    mut handler: F,
) -> Result<usize, Si::Error>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    Si: Sink<Message> + Unpin,
    F: FnMut(&str) -> String,
{
    let mut replies = 0;
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                debug!("Request from {addr}: {} bytes", text.len());
                let reply = handler(text.as_str());
                sink.send(Message::Text(reply.into())).await?;
                replies += 1;
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Binary, Ping, Pong and raw frames carry no requests.
            }
        }
    }
    Ok(replies)
}
