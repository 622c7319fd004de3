use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use anyhow::anyhow;
use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::sync::{serve_viewer, LiveSync, ViewerTransport};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(subscribe);
}

#[get("/subscribe")]
async fn subscribe(req: HttpRequest, body: web::Payload, live: web::Data<LiveSync>) -> actix_web::Result<HttpResponse> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;

    let cancel = live.shutdown.child_token();
    let live = live.into_inner();

    actix_web::rt::spawn(watch_inbound(stream, session.clone(), cancel.clone()));
    actix_web::rt::spawn(async move {
        let transport = WebSocketTransport { session: Some(session) };
        serve_viewer(&live.broadcaster, transport, live.deadlines, cancel.clone()).await;
        cancel.cancel();
    });

    Ok(response)
}

/// Viewers never send anything meaningful; keep answering pings and cancel once the peer closes.
async fn watch_inbound(mut stream: MessageStream, mut session: Session, cancel: CancellationToken) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Ping(bytes))) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Close(reason))) => {
                debug!(?reason, "Viewer closed the connection");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                debug!(%error, "Viewer protocol error");
                break;
            }
            None => break,
        }
    }

    cancel.cancel();
}

struct WebSocketTransport {
    session: Option<Session>,
}

#[async_trait]
impl ViewerTransport for WebSocketTransport {
    async fn send_text(&mut self, text: String) -> anyhow::Result<()> {
        let session = self.session.as_mut().ok_or_else(|| anyhow!("web socket already closed"))?;

        session.text(text).await.map_err(|_| anyhow!("web socket closed"))
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.close(None).await;
        }
    }
}
