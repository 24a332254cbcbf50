use std::fmt;

use futures::{Stream, StreamExt, stream::BoxStream};
use k8s_openapi::api::batch::v1::Job;
use tracing::trace;

use super::ClusterError;

/// Event delivered by a job watch.
///
/// Only `Applied` and `Deleted` carry a job. Markers are bookkeeping of the underlying
/// stream; an `Error` ends the subscription for the consumer.
#[derive(Debug, Clone)]
pub enum ClusterEvent {
    Applied(Job),
    Deleted(Job),
    /// Stream bookkeeping (initial list markers, bookmarks).
    Marker(&'static str),
    /// Failure reported in-band by the stream.
    Error(ClusterError),
}

impl ClusterEvent {
    /// The job carried by this event, if any.
    pub fn job(&self) -> Option<&Job> {
        match self {
            ClusterEvent::Applied(job) | ClusterEvent::Deleted(job) => Some(job),
            ClusterEvent::Marker(_) | ClusterEvent::Error(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClusterEvent::Applied(_) => "applied",
            ClusterEvent::Deleted(_) => "deleted",
            ClusterEvent::Marker(kind) => *kind,
            ClusterEvent::Error(_) => "error",
        }
    }
}

/// Live job subscription.
///
/// The underlying event source is released by [`JobWatch::close`] or on drop, whichever
/// comes first; closing is idempotent.
pub struct JobWatch {
    events: Option<BoxStream<'static, ClusterEvent>>,
}

impl JobWatch {
    pub fn new<S>(events: S) -> Self
    where
        S: Stream<Item = ClusterEvent> + Send + 'static,
    {
        Self {
            events: Some(events.boxed()),
        }
    }

    /// Next event, or `None` once the source ended or the watch was closed.
    pub async fn next(&mut self) -> Option<ClusterEvent> {
        match self.events.as_mut() {
            Some(events) => events.next().await,
            None => None,
        }
    }

    pub fn close(&mut self) {
        if self.events.take().is_some() {
            trace!("job watch released");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_none()
    }
}

impl Drop for JobWatch {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for JobWatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobWatch")
            .field("closed", &self.is_closed())
            .finish()
    }
}
