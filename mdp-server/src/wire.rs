//! Abstractions over the wire framework: the concrete codec and transport
//! are external collaborators (§1), consumed only through the message
//! shapes and the [`WireSink`] trait defined here.

use mdp_types::{DataState, FieldEntry, RejectReason, RequestToken, ServiceInfoView, StreamState};

/// A directory response body: the full directory, or a single filtered
/// service entry (§4.1.2).
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryView {
    Full(Vec<ServiceInfoView>),
    Filtered(ServiceInfoView),
}

/// One outbound message the provider hands to the wire framework for a
/// given session. This is the shape `submit`/`sendReply` wrap and forward;
/// the framework's own encoding of it onto the wire is out of scope.
#[derive(Debug, Clone, PartialEq)]
pub enum WireOutbound {
    LoginRefresh {
        token: RequestToken,
    },
    LoginReject {
        token: RequestToken,
        stream: StreamState,
        data: DataState,
        reason: RejectReason,
    },
    Directory {
        token: RequestToken,
        view: DirectoryView,
    },
    Snapshot {
        token: RequestToken,
        fields: Vec<FieldEntry>,
    },
    Close {
        token: RequestToken,
        reason: RejectReason,
    },
}

/// The wire framework's submit capability, as consumed by the provider.
/// `submit` is defined by the wire framework as safe to call from any
/// task (§5), so implementations must be `Send + Sync` and not assume a
/// particular caller thread.
pub trait WireSink: Send + Sync {
    fn send(&self, session: u64, message: WireOutbound);
}
