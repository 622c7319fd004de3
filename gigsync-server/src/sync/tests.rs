use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::{web, App};
use anyhow::anyhow;
use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use gigsync_api::{PauseSignal, SyncFrame, ViewerId, WaiterToken};

use crate::sync::{configure, serve_viewer, Broadcaster, LiveSync, SyncOpts, ViewerDeadlines, ViewerExit,
                  ViewerTransport};

const DEADLINES: ViewerDeadlines = ViewerDeadlines { subscribe: Duration::from_secs(1),
                                                     send:      Duration::from_secs(5), };

struct ChannelTransport {
    frames: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl ViewerTransport for ChannelTransport {
    async fn send_text(&mut self, text: String) -> anyhow::Result<()> {
        self.frames.send(text).map_err(|_| anyhow!("receiver gone"))
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn channel_transport() -> (ChannelTransport, mpsc::UnboundedReceiver<String>, Arc<AtomicBool>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    (ChannelTransport { frames: tx,
                        closed: closed.clone(), },
     rx,
     closed)
}

/// Accepts the first `accepted` frames, then never completes another write.
struct StallingTransport {
    accepted: usize,
}

#[async_trait]
impl ViewerTransport for StallingTransport {
    async fn send_text(&mut self, _text: String) -> anyhow::Result<()> {
        if self.accepted == 0 {
            futures::future::pending::<()>().await;
        }

        self.accepted -= 1;
        Ok(())
    }

    async fn close(&mut self) {}
}

struct BrokenTransport;

#[async_trait]
impl ViewerTransport for BrokenTransport {
    async fn send_text(&mut self, _text: String) -> anyhow::Result<()> {
        Err(anyhow!("connection reset"))
    }

    async fn close(&mut self) {}
}

fn signal(body: &str) -> PauseSignal {
    body.parse().unwrap()
}

fn parse_frame(text: &str) -> SyncFrame {
    serde_json::from_str(text).unwrap()
}

#[test]
fn waiting_participants_drive_the_next_tick() {
    let broadcaster = Broadcaster::new(16);
    let mut viewer = broadcaster.register(ViewerId::new("00000001".to_string()));

    assert_eq!(broadcaster.tick().frame, SyncFrame::Proceed);
    assert_eq!(viewer.try_recv().unwrap(), SyncFrame::Proceed);

    broadcaster.apply(signal("key1=wait"));
    assert_eq!(viewer.try_recv().unwrap_err(), TryRecvError::Empty);

    broadcaster.tick();
    assert_eq!(viewer.try_recv().unwrap(), SyncFrame::Wait);

    broadcaster.apply(signal("key1=ready"));
    broadcaster.tick();
    assert_eq!(viewer.try_recv().unwrap(), SyncFrame::Proceed);
}

#[test]
fn any_waiting_token_holds_everyone() {
    let broadcaster = Broadcaster::new(16);

    broadcaster.apply(signal("drums=wait"));
    broadcaster.apply(signal("bass=wait"));
    broadcaster.apply(signal("drums=wait"));
    assert_eq!(broadcaster.waiting_count(), 2);

    broadcaster.apply(signal("drums=ready"));
    assert_eq!(broadcaster.status(), SyncFrame::Wait);

    broadcaster.apply(signal("bass=ready"));
    broadcaster.apply(signal("bass=ready"));
    assert_eq!(broadcaster.status(), SyncFrame::Proceed);
}

#[test]
fn unrecognized_values_are_ignored() {
    let broadcaster = Broadcaster::new(16);

    broadcaster.apply(signal("keys=maybe"));

    assert_eq!(broadcaster.waiting_count(), 0);
    assert!(!broadcaster.clear_waiting(&WaiterToken::new("keys")));
}

#[test]
fn full_queue_drops_frames_for_that_viewer_only() {
    let broadcaster = Broadcaster::new(2);
    let mut slow = broadcaster.register(ViewerId::new("0000000A".to_string()));
    let mut fast = broadcaster.register(ViewerId::new("0000000B".to_string()));

    for _ in 0..2 {
        broadcaster.tick();
        fast.try_recv().unwrap();
    }

    let report = broadcaster.tick();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(fast.try_recv().unwrap(), SyncFrame::Proceed);

    assert!(slow.try_recv().is_ok());
    assert!(slow.try_recv().is_ok());
    assert_eq!(slow.try_recv().unwrap_err(), TryRecvError::Empty);
    assert_eq!(broadcaster.subscriber_count(), 2);
}

#[test]
fn dropping_a_subscription_unregisters_it() {
    let broadcaster = Broadcaster::new(16);
    let first = broadcaster.register(ViewerId::random());
    let second = broadcaster.register(ViewerId::random());
    assert_eq!(broadcaster.subscriber_count(), 2);

    drop(first);
    assert_eq!(broadcaster.subscriber_count(), 1);
    assert_eq!(broadcaster.tick().delivered, 1);

    drop(second);
    assert_eq!(broadcaster.subscriber_count(), 0);
    assert_eq!(broadcaster.tick().delivered, 0);
}

#[tokio::test]
async fn viewer_gets_sub_frame_then_heartbeats() {
    let broadcaster = Broadcaster::new(16);
    let (transport, mut frames, closed) = channel_transport();
    let cancel = CancellationToken::new();

    let task = {
        let broadcaster = broadcaster.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { serve_viewer(&broadcaster, transport, DEADLINES, cancel).await })
    };

    let hello = frames.recv().await.unwrap();
    match parse_frame(&hello) {
        SyncFrame::Sub { id } => assert!(id.as_str().len() >= 8),
        other => panic!("expected sub frame, got {other:?}"),
    }
    assert_eq!(broadcaster.subscriber_count(), 1);

    broadcaster.tick();
    assert_eq!(frames.recv().await.unwrap(), r#"{"type":"proceed"}"#);

    broadcaster.apply(signal("key1=wait"));
    broadcaster.tick();
    assert_eq!(frames.recv().await.unwrap(), r#"{"type":"wait"}"#);

    cancel.cancel();
    assert_eq!(task.await.unwrap(), ViewerExit::Cancelled);
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn handshake_that_stalls_times_out() {
    let broadcaster = Broadcaster::new(16);

    let exit = serve_viewer(&broadcaster,
                            StallingTransport { accepted: 0 },
                            DEADLINES,
                            CancellationToken::new()).await;

    assert_eq!(exit, ViewerExit::TimedOut);
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_viewer_is_dropped_after_the_send_deadline() {
    let broadcaster = Broadcaster::new(16);

    let task = {
        let broadcaster = broadcaster.clone();
        tokio::spawn(async move {
            serve_viewer(&broadcaster,
                         StallingTransport { accepted: 1 },
                         DEADLINES,
                         CancellationToken::new()).await
        })
    };

    while broadcaster.subscriber_count() == 0 {
        tokio::task::yield_now().await;
    }

    broadcaster.tick();

    assert_eq!(task.await.unwrap(), ViewerExit::TimedOut);
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[tokio::test]
async fn failed_write_ends_the_viewer() {
    let broadcaster = Broadcaster::new(16);

    let exit = serve_viewer(&broadcaster, BrokenTransport, DEADLINES, CancellationToken::new()).await;

    assert_eq!(exit, ViewerExit::SendFailed);
    assert_eq!(broadcaster.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn run_ticks_once_per_period() {
    let broadcaster = Broadcaster::new(16);
    let mut viewer = broadcaster.register(ViewerId::random());
    let cancel = CancellationToken::new();

    let ticker = broadcaster.spawn(Duration::from_millis(500), cancel.clone());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(viewer.try_recv().unwrap_err(), TryRecvError::Empty);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(viewer.try_recv().unwrap(), SyncFrame::Proceed);
    assert_eq!(viewer.try_recv().unwrap(), SyncFrame::Proceed);
    assert_eq!(viewer.try_recv().unwrap_err(), TryRecvError::Empty);

    cancel.cancel();
    ticker.await.unwrap();
}

fn live_sync() -> LiveSync {
    let opts = SyncOpts { sync_tick_ms:              500,
                          sync_queue_capacity:       16,
                          sync_subscribe_timeout_ms: 1000,
                          sync_send_timeout_ms:      5000, };

    LiveSync::new(&opts, CancellationToken::new())
}

#[actix_web::test]
async fn wait_and_ready_endpoints_update_the_waiting_set() {
    let live = live_sync();
    let app = actix_test::init_service(App::new().app_data(web::Data::new(live.clone()))
                                           .configure(configure)).await;

    let req = actix_test::TestRequest::post().uri("/wait").set_payload("key1=wait").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(live.broadcaster.status(), SyncFrame::Wait);

    let req = actix_test::TestRequest::post().uri("/ready").set_payload("key1=ready").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(live.broadcaster.status(), SyncFrame::Proceed);

    // either path accepts either value
    let req = actix_test::TestRequest::post().uri("/ready").set_payload("key2=wait").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(live.broadcaster.waiting_count(), 1);
}

#[actix_web::test]
async fn malformed_and_oversized_signals_are_rejected() {
    let live = live_sync();
    let app = actix_test::init_service(App::new().app_data(web::Data::new(live.clone()))
                                           .configure(configure)).await;

    for body in ["key1", "key1=wait=now", "=wait", ""] {
        let req = actix_test::TestRequest::post().uri("/wait").set_payload(body).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body:?}");
    }

    let oversized = format!("{}=wait", "k".repeat(600));
    let req = actix_test::TestRequest::post().uri("/wait").set_payload(oversized).to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(live.broadcaster.waiting_count(), 0);
}

#[actix_web::test]
async fn subscribe_requires_a_web_socket_upgrade() {
    let live = live_sync();
    let app = actix_test::init_service(App::new().app_data(web::Data::new(live.clone()))
                                           .configure(configure)).await;

    let req = actix_test::TestRequest::get().uri("/subscribe").to_request();
    let resp = actix_test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(live.broadcaster.subscriber_count(), 0);
}

fn churn_ops() -> impl Strategy<Value = Vec<(bool, usize)>> {
    prop::collection::vec((any::<bool>(), 0usize..16), 0..64)
}

fn cancel_orders() -> impl Strategy<Value = Vec<usize>> {
    (1usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn registry_is_empty_after_any_churn(ops in churn_ops()) {
        let broadcaster = Broadcaster::new(4);
        let mut connected = vec![];

        for (connect, index) in ops {
            if connect || connected.is_empty() {
                connected.push(broadcaster.register(ViewerId::random()));
            } else {
                connected.swap_remove(index % connected.len());
            }

            broadcaster.tick();
            prop_assert_eq!(broadcaster.subscriber_count(), connected.len());
        }

        connected.clear();
        prop_assert_eq!(broadcaster.subscriber_count(), 0);
        prop_assert_eq!(broadcaster.tick().pruned, 0);
    }

    #[test]
    fn viewers_cancelled_in_any_order_all_unregister(order in cancel_orders()) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

        runtime.block_on(async {
            let broadcaster = Broadcaster::new(4);
            let mut viewers = vec![];

            for _ in 0..order.len() {
                let (transport, mut frames, _closed) = channel_transport();
                let cancel = CancellationToken::new();
                let task = {
                    let broadcaster = broadcaster.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move { serve_viewer(&broadcaster, transport, DEADLINES, cancel).await })
                };

                frames.recv().await.unwrap();
                viewers.push((cancel, Some(task), frames));
            }

            assert_eq!(broadcaster.subscriber_count(), order.len());
            broadcaster.tick();

            for index in order {
                let (cancel, task, _) = &mut viewers[index];
                cancel.cancel();
                assert_eq!(task.take().unwrap().await.unwrap(), ViewerExit::Cancelled);
            }

            assert_eq!(broadcaster.subscriber_count(), 0);
        });
    }
}
