use checkup_core::cluster::ClusterError;

const REASON_ALREADY_EXISTS: &str = "AlreadyExists";

/// Map a `kube` error for the object `kind`/`name` onto a [`ClusterError`].
pub fn classify(err: kube::Error, kind: &'static str, name: &str) -> ClusterError {
    match err {
        kube::Error::Api(resp) => match resp.code {
            404 => ClusterError::not_found(kind, name),
            409 if resp.reason == REASON_ALREADY_EXISTS => ClusterError::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            409 => ClusterError::Conflict(resp.message),
            403 => ClusterError::Forbidden(resp.message),
            code => ClusterError::Api {
                code,
                message: resp.message,
            },
        },
        other => ClusterError::Transport(other.to_string()),
    }
}
