use runtime::EventBus;

use crate::channel::RelayChannel;
use crate::protocol::OutboundMessage;

/// In-memory relay channel that records every frame sent through it.
///
/// Nothing is delivered anywhere; owners inspect or drain what was sent.
#[derive(Debug, Default)]
pub struct LoopbackChannel {
    sent: EventBus<OutboundMessage>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames sent since the last drain, oldest first.
    pub fn pending(&self) -> Vec<&OutboundMessage> {
        self.sent.events().iter().collect()
    }

    /// Message names sent since the last drain, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.sent.events().iter().map(OutboundMessage::name).collect()
    }

    pub fn drain(&mut self) -> Vec<OutboundMessage> {
        self.sent.drain()
    }
}

impl RelayChannel for LoopbackChannel {
    fn send(&mut self, msg: OutboundMessage) {
        self.sent.emit(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::Viewpoint;

    #[test]
    fn records_in_send_order() {
        let mut ch = LoopbackChannel::new();
        ch.send(OutboundMessage::Refresh {});
        ch.send(OutboundMessage::Pov(Viewpoint::new(1.0, 2.0, 0)));
        assert_eq!(ch.names(), vec!["refresh", "pov"]);

        let drained = ch.drain();
        assert_eq!(drained.len(), 2);
        assert!(ch.pending().is_empty());
        assert!(ch.names().is_empty());
    }

    #[test]
    fn usable_through_trait_object() {
        let mut ch = LoopbackChannel::new();
        {
            let mut dyn_ch: Box<dyn RelayChannel + '_> = Box::new(&mut ch);
            dyn_ch.send(OutboundMessage::Refresh {});
        }
        assert_eq!(ch.names(), vec!["refresh"]);
    }
}
