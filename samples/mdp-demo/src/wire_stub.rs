//! An in-process stand-in for the wire session: records every outbound
//! message it is handed instead of putting bytes on a socket. Good enough
//! to drive the library crates end to end without a real wire framework.

use mdp_server::WireSink;
use parking_lot::Mutex;

/// One recorded outbound delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub session: u64,
    pub message: mdp_server::wire::WireOutbound,
}

#[derive(Default)]
pub struct RecordingWireStub {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingWireStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.deliveries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.lock().is_empty()
    }
}

impl WireSink for RecordingWireStub {
    fn send(&self, session: u64, message: mdp_server::wire::WireOutbound) {
        log::debug!("wire stub: session {session} <- {message:?}");
        self.deliveries.lock().push(Delivery { session, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp_types::{RejectReason, RequestToken};

    #[test]
    fn records_every_delivery_in_order() {
        let stub = RecordingWireStub::new();
        stub.send(
            1,
            mdp_server::wire::WireOutbound::Close {
                token: RequestToken(1),
                reason: RejectReason::NotFound,
            },
        );
        stub.send(
            1,
            mdp_server::wire::WireOutbound::LoginRefresh { token: RequestToken(2) },
        );
        assert_eq!(stub.len(), 2);
        assert_eq!(stub.deliveries()[0].session, 1);
    }
}
