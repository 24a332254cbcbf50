use checkup_core::cluster::{ClusterError, ClusterEvent, JobWatch};
use futures::StreamExt;
use k8s_openapi::api::batch::v1::Job;
use kube::{Api, runtime::watcher};

use crate::error::classify;

/// Status code of an expired watch; the watcher relists by itself on its next poll.
const GONE: u16 = 410;

pub(crate) fn to_event(
    item: Result<watcher::Event<Job>, watcher::Error>,
    label_selector: &str,
) -> ClusterEvent {
    match item {
        Ok(watcher::Event::Apply(job) | watcher::Event::InitApply(job)) => ClusterEvent::Applied(job),
        Ok(watcher::Event::Delete(job)) => ClusterEvent::Deleted(job),
        Ok(watcher::Event::Init) => ClusterEvent::Marker("init"),
        Ok(watcher::Event::InitDone) => ClusterEvent::Marker("init-done"),
        Err(err) => match classify_watch(err, label_selector) {
            Some(err) => ClusterEvent::Error(err),
            None => ClusterEvent::Marker("resync"),
        },
    }
}

/// `None` for an expired watch, the only error the stream recovers from.
fn classify_watch(err: watcher::Error, label_selector: &str) -> Option<ClusterError> {
    match err {
        watcher::Error::WatchError(resp) if resp.code == GONE => None,
        watcher::Error::WatchError(resp) => Some(classify(kube::Error::Api(resp), "Job", label_selector)),
        watcher::Error::InitialListFailed(e)
        | watcher::Error::WatchStartFailed(e)
        | watcher::Error::WatchFailed(e) => Some(classify(e, "Job", label_selector)),
        other => Some(ClusterError::Transport(other.to_string())),
    }
}

/// Label-filtered job watch. Any error other than an expired watch is handed to the
/// consumer, which ends the wait; nothing is retried here.
pub(crate) fn job_watch(api: Api<Job>, label_selector: &str) -> JobWatch {
    let config = watcher::Config::default().labels(label_selector);
    let selector = label_selector.to_string();
    JobWatch::new(watcher(api, config).map(move |item| to_event(item, &selector)))
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::error::ErrorResponse;

    use super::*;

    const SELECTOR: &str = "job-name=checkup-job";

    fn job(name: &str) -> Job {
        Job {
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn watch_error(code: u16, reason: &str) -> watcher::Error {
        watcher::Error::WatchError(ErrorResponse {
            status: "Failure".into(),
            message: format!("watch failed: {reason}"),
            reason: reason.into(),
            code,
        })
    }

    #[test]
    fn only_object_events_carry_jobs() {
        let ev = |e| to_event(Ok(e), SELECTOR);

        assert!(matches!(ev(watcher::Event::Apply(job("a"))), ClusterEvent::Applied(_)));
        assert!(matches!(ev(watcher::Event::InitApply(job("a"))), ClusterEvent::Applied(_)));
        assert!(matches!(ev(watcher::Event::Delete(job("a"))), ClusterEvent::Deleted(_)));
        assert!(ev(watcher::Event::Init).job().is_none());
        assert_eq!(ev(watcher::Event::InitDone).kind(), "init-done");
    }

    #[test]
    fn expired_watch_is_a_resync_marker() {
        let event = to_event(Err(watch_error(410, "Expired")), SELECTOR);
        assert_eq!(event.kind(), "resync");
    }

    #[test]
    fn other_watch_errors_are_classified() {
        let event = to_event(Err(watch_error(403, "Forbidden")), SELECTOR);
        assert!(matches!(event, ClusterEvent::Error(ClusterError::Forbidden(_))));

        let event = to_event(Err(watcher::Error::NoResourceVersion), SELECTOR);
        assert!(matches!(event, ClusterEvent::Error(ClusterError::Transport(_))));
    }
}
