//! Request/response correlation
//!
//! Every picker or export request gets a token the host echoes back with its
//! result. Only one request of each kind is outstanding: a new one supersedes
//! the old, whose late reply then resolves as stale. Hosts are not required to
//! answer at all, so nothing here waits on a reply.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::event::EventKind;

/// Correlation token echoed by the host with the matching result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(Uuid);

impl RequestToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound operations that complete through a later host event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    ImportMarkdown,
    ExportMarkdown,
    PickImage,
}

impl RequestKind {
    /// Request a successful result of `kind` answers; `None` for `ERROR`
    pub fn answered_by(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::ImportMdResult => Some(RequestKind::ImportMarkdown),
            EventKind::PickImageResult => Some(RequestKind::PickImage),
            EventKind::ExportSuccess => Some(RequestKind::ExportMarkdown),
            EventKind::Error => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::ImportMarkdown => "import",
            RequestKind::ExportMarkdown => "export",
            RequestKind::PickImage => "image pick",
        };
        f.write_str(name)
    }
}

/// How an inbound event relates to the outstanding requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Answers this request, which is now closed
    Matched(RequestKind),
    /// Untokened result with nothing pending (host-initiated flow)
    Unsolicited,
    /// Token matches no outstanding request; the event must be dropped
    Stale,
    /// Untokened error; every outstanding request was abandoned
    Cleared(usize),
}

/// Outstanding requests, at most one per kind
#[derive(Debug, Default)]
pub struct PendingRequests {
    by_kind: HashMap<RequestKind, RequestToken>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a request, superseding any unanswered one of the same kind
    pub fn begin(&mut self, kind: RequestKind) -> RequestToken {
        let token = RequestToken::new();
        if let Some(old) = self.by_kind.insert(kind, token) {
            warn!("Superseding unanswered {} request {}", kind, old);
        }
        debug!("Opened {} request {}", kind, token);
        token
    }

    /// Abandon the outstanding request of `kind`, if any
    pub fn cancel(&mut self, kind: RequestKind) -> Option<RequestToken> {
        self.by_kind.remove(&kind)
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Match an inbound event against the table, closing what it answers
    pub fn resolve(&mut self, token: Option<RequestToken>, kind: EventKind) -> Resolution {
        match (token, RequestKind::answered_by(kind)) {
            (Some(token), _) => {
                let found = self
                    .by_kind
                    .iter()
                    .find(|(_, t)| **t == token)
                    .map(|(k, _)| *k);

                // An ERROR may answer any kind; a result only its own
                let answers = |request: RequestKind| {
                    kind == EventKind::Error || RequestKind::answered_by(kind) == Some(request)
                };

                match found {
                    Some(request) if answers(request) => {
                        self.by_kind.remove(&request);
                        Resolution::Matched(request)
                    }
                    _ => Resolution::Stale,
                }
            }
            (None, Some(request)) => {
                if self.by_kind.remove(&request).is_some() {
                    Resolution::Matched(request)
                } else {
                    Resolution::Unsolicited
                }
            }
            (None, None) => {
                let count = self.by_kind.len();
                self.by_kind.clear();
                Resolution::Cleared(count)
            }
        }
    }
}
