use crate::protocol::{InboundMessage, OutboundMessage};

/// Handle to the shared relay bus.
///
/// Sends are fire-and-forget: delivery failures are the channel's business
/// and are never reported back to the caller. Inbound traffic is delivered
/// separately as [`RelayEvent`]s by whatever drives the channel.
pub trait RelayChannel {
    fn send(&mut self, msg: OutboundMessage);
}

impl<C: RelayChannel + ?Sized> RelayChannel for &mut C {
    fn send(&mut self, msg: OutboundMessage) {
        (**self).send(msg)
    }
}

impl<C: RelayChannel + ?Sized> RelayChannel for Box<C> {
    fn send(&mut self, msg: OutboundMessage) {
        (**self).send(msg)
    }
}

/// Something the relay connection reports to the node.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Connected,
    Disconnected,
    Message(InboundMessage),
}
