use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{SharedState, change_detector::ChangeEvent, codes::GameId},
};

/// Subscribe to change events emitted by later refreshes.
pub fn subscribe_changes(state: &SharedState) -> broadcast::Receiver<ChangeEvent> {
    state.subscribe_changes()
}

/// First message sent to a freshly connected client.
pub fn handshake(state: &SharedState) -> Option<ServerEvent> {
    let handshake = Handshake {
        message: "codes stream connected".into(),
        degraded: state.is_degraded(),
        games: GameId::ALL.to_vec(),
    };
    match ServerEvent::handshake(&handshake) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to encode SSE handshake");
            None
        }
    }
}

/// Forward change events from `receiver` into a bounded stream, starting with
/// `handshake` when given. The forwarder exits once the stream is dropped.
pub fn forward_changes(
    mut receiver: broadcast::Receiver<ChangeEvent>,
    handshake: Option<ServerEvent>,
) -> ReceiverStream<ServerEvent> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);

    tokio::spawn(async move {
        if let Some(handshake) = handshake {
            if tx.send(handshake).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(change) => {
                            let payload = match ServerEvent::new_codes(&change) {
                                Ok(payload) => payload,
                                Err(err) => {
                                    warn!(error = %err, "failed to encode change event");
                                    continue;
                                }
                            };
                            if tx.send(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "codes SSE subscriber lagged; dropping events");
                            continue;
                        }
                    }
                }
            }
        }

        info!("codes SSE stream disconnected");
    });

    ReceiverStream::new(rx)
}

/// Convert a change subscription into an SSE response.
pub fn to_sse_stream(
    receiver: broadcast::Receiver<ChangeEvent>,
    handshake: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = forward_changes(receiver, handshake)
        .map(|payload| Ok(Event::default().event(payload.name).data(payload.data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
