//! SSE streaming of `CrawlProgress` events, grounded on the teacher's
//! `kernel/sse.rs` (`BroadcastStream` -> `axum::response::sse::Event`).

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use ragcore::types::{CrawlPhase, CrawlProgress};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Streams a progress channel as SSE. The receiver must be subscribed
/// before the job that publishes to it starts, so the `starting` frame
/// isn't lost to a subscribe-after-publish race. The stream ends after
/// the first `complete` or `error` frame: those are terminal per the
/// `CrawlPhase` contract.
pub fn progress_stream(rx: broadcast::Receiver<CrawlProgress>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let raw = BroadcastStream::new(rx);
    let stream = stream::unfold((raw, false), |(mut raw, done)| async move {
        if done {
            return None;
        }
        match raw.next().await {
            Some(Ok(progress)) => {
                let terminal = matches!(progress.phase, CrawlPhase::Complete | CrawlPhase::Error);
                Some((Ok(to_event(&progress)), (raw, terminal)))
            }
            Some(Err(BroadcastStreamRecvError::Lagged(_))) => Some((Ok(Event::default().event("lagged").data("{}")), (raw, false))),
            None => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_event(progress: &CrawlProgress) -> Event {
    let event_type = match progress.phase {
        CrawlPhase::Complete => "complete",
        CrawlPhase::Error => "error",
        _ => "progress",
    };
    Event::default().event(event_type).data(serde_json::to_string(progress).unwrap_or_default())
}
