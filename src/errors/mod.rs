mod status;

pub use status::StatusCode;

/// Errors that can occur while dispatching an event to its handlers.
///
/// These never escape as panics; the dispatcher folds every variant into the
/// `err_msg` of the result returned to the ingress transport.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// The project named in the ingress path does not exist
    ProjectNotFound(String),

    /// The event token is missing, malformed, or carries a bad signature
    InvalidAuthValue,

    /// The token's embedded project id could not be parsed
    InvalidAuthProjectId,

    /// The token belongs to a different project
    NoProjectPermission,

    /// The publisher key does not resolve under the project
    PublisherNotFound {
        pub_id: String,
        project_name: String,
    },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::ProjectNotFound(name) => {
                write!(f, "project '{}' not found", name)
            }
            DispatchError::InvalidAuthValue => {
                write!(f, "message token is invalid")
            }
            DispatchError::InvalidAuthProjectId => {
                write!(f, "invalid project id in token")
            }
            DispatchError::NoProjectPermission => {
                write!(f, "no project permission")
            }
            DispatchError::PublisherNotFound {
                pub_id,
                project_name,
            } => {
                write!(
                    f,
                    "publisher '{}' not found under project '{}'",
                    pub_id, project_name
                )
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Errors surfaced to lifecycle-controller callers.
///
/// The dispatcher never sees these: a failed deploy simply never registers an
/// instance, and per-event lookups of a missing instance are reported as
/// synthetic handler results instead.
#[derive(Debug)]
pub enum LifecycleError {
    /// The applet referenced by a deploy does not exist
    AppletNotFound(u64),

    /// No instance is registered under the given id
    InstanceNotFound(u64),

    /// The requested transition is not part of the state machine
    InvalidTransition {
        from: crate::vm::InstanceState,
        to: crate::vm::InstanceState,
    },

    /// The runtime backend failed to compile or instantiate the module
    RuntimeFailed { applet_id: u64, error: String },
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::AppletNotFound(id) => {
                write!(f, "applet '{}' not found", id)
            }
            LifecycleError::InstanceNotFound(id) => {
                write!(f, "instance '{}' not found", id)
            }
            LifecycleError::InvalidTransition { from, to } => {
                write!(f, "invalid instance transition {:?} -> {:?}", from, to)
            }
            LifecycleError::RuntimeFailed { applet_id, error } => {
                write!(f, "runtime failed for applet '{}': {}", applet_id, error)
            }
        }
    }
}

impl std::error::Error for LifecycleError {}
