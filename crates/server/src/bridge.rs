use futures::StreamExt;
use spin_core::*;
use spin_lobby::Lobby;
use spin_records::Match;
use std::time::Duration;
use std::time::Instant;

/// Snapshot cadence when the event channel is quiet.
const FALLBACK: Duration = Duration::from_millis(300);

/// Spawns the WebSocket pump for one spectator of one match.
///
/// Pushes the initial snapshot, then relays the Redis event channel
/// verbatim; when no event has fired recently the latest snapshot is
/// re-sent so a viewer behind a dropped pub/sub message still converges.
/// Disconnecting tears down the subscription and touches nothing else.
pub fn bridge(
    lobby: Lobby,
    id: ID<Match>,
    session: actix_ws::Session,
    stream: actix_ws::MessageStream,
) {
    actix_web::rt::spawn(pump(lobby, id, session, stream));
}

async fn pump(
    lobby: Lobby,
    id: ID<Match>,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    log::debug!("[ws {}] connected", id);
    if let Some(state) = lobby.live().read(id).await {
        if let Ok(json) = serde_json::to_string(&state) {
            if session.text(json).await.is_err() {
                return;
            }
        }
    }
    let mut events = match lobby.live().subscribe(id).await {
        Ok(pubsub) => Some(Box::pin(pubsub.into_on_message())),
        Err(e) => {
            log::warn!("[ws {}] pubsub unavailable, polling only: {}", id, e);
            None
        }
    };
    let mut last_push = Instant::now();
    let mut poll = tokio::time::interval(FALLBACK);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    'sesh: loop {
        tokio::select! {
            biased;
            msg = async {
                match events.as_mut() {
                    Some(events) => events.next().await,
                    None => std::future::pending().await,
                }
            } => match msg {
                Some(msg) => match msg.get_payload::<String>() {
                    Ok(payload) => {
                        if session.text(payload).await.is_err() { break 'sesh }
                        last_push = Instant::now();
                    }
                    Err(_) => continue 'sesh,
                },
                None => break 'sesh,
            },
            msg = stream.next() => match msg {
                Some(Ok(actix_ws::Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() { break 'sesh }
                }
                Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                Some(Err(_)) => break 'sesh,
                None => break 'sesh,
                _ => continue 'sesh,
            },
            _ = poll.tick() => {
                if last_push.elapsed() >= FALLBACK {
                    if let Some(state) = lobby.live().read(id).await {
                        if let Ok(json) = serde_json::to_string(&state) {
                            if session.text(json).await.is_err() { break 'sesh }
                            last_push = Instant::now();
                        }
                    }
                }
            }
        }
    }
    // Dropping the message stream closes the pubsub connection, which
    // unsubscribes server-side.
    let _ = session.close(None).await;
    log::debug!("[ws {}] disconnected", id);
}
