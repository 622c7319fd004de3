use std::time::Duration;

use async_trait::async_trait;
use derive_more::IsVariant;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::*;

use gigsync_api::{SyncFrame, ViewerId};

use crate::sync::{Broadcaster, Subscription};

/// Outbound half of a viewer's duplex stream.
#[async_trait]
pub trait ViewerTransport {
    async fn send_text(&mut self, text: String) -> anyhow::Result<()>;

    async fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerDeadlines {
    /// For the initial `sub` frame.
    pub subscribe: Duration,
    /// For every frame after that.
    pub send:      Duration,
}

/// Why a viewer connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum ViewerExit {
    /// The remote side went away, or the server is shutting down.
    Cancelled,
    /// The viewer's queue was closed under it.
    QueueClosed,
    SendFailed,
    TimedOut,
}

/// Run one viewer connection to completion.
///
/// Registers with the broadcaster, sends the `sub` acknowledgement, then forwards queued frames
/// until the transport fails, a write misses its deadline, or `cancel` fires. The viewer is
/// unregistered exactly once on every one of those paths.
pub async fn serve_viewer<T>(broadcaster: &Broadcaster,
                             mut transport: T,
                             deadlines: ViewerDeadlines,
                             cancel: CancellationToken)
                             -> ViewerExit
    where T: ViewerTransport + Send
{
    let mut subscription = broadcaster.register(ViewerId::random());
    let viewer_id = subscription.viewer_id().clone();

    let exit = forward(&mut subscription, &mut transport, deadlines, &cancel).await;

    drop(subscription);

    if timeout(deadlines.send, transport.close()).await.is_err() {
        debug!(%viewer_id, "Viewer transport did not close in time");
    }

    debug!(%viewer_id, ?exit, "Viewer disconnected");

    exit
}

async fn forward<T>(subscription: &mut Subscription,
                    transport: &mut T,
                    deadlines: ViewerDeadlines,
                    cancel: &CancellationToken)
                    -> ViewerExit
    where T: ViewerTransport + Send
{
    let hello = SyncFrame::Sub { id: subscription.viewer_id().clone() };
    if let Err(exit) = deliver(transport, &hello, deadlines.subscribe).await {
        return exit;
    }

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ViewerExit::Cancelled,
            frame = subscription.recv() => match frame {
                Some(frame) => frame,
                None => return ViewerExit::QueueClosed,
            },
        };

        if let Err(exit) = deliver(transport, &frame, deadlines.send).await {
            return exit;
        }
    }
}

async fn deliver<T>(transport: &mut T, frame: &SyncFrame, deadline: Duration) -> Result<(), ViewerExit>
    where T: ViewerTransport + Send
{
    let text = match frame.to_text() {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, ?frame, "Failed to encode sync frame");
            return Err(ViewerExit::SendFailed);
        }
    };

    match timeout(deadline, transport.send_text(text)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => {
            debug!(%error, "Viewer write failed");
            Err(ViewerExit::SendFailed)
        }
        Err(_) => {
            debug!(?deadline, "Viewer write timed out");
            Err(ViewerExit::TimedOut)
        }
    }
}
