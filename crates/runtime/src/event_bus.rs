/// Single-threaded event outbox.
///
/// Producers `emit` while handling an input; the owner `drain`s after the
/// handler returns, receiving events in emission order.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<E>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    /// Pending events, oldest first.
    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn keeps_emit_order() {
        let mut bus = EventBus::new();
        bus.emit("a");
        bus.emit("b");
        assert_eq!(bus.events(), &["a", "b"]);
    }

    #[test]
    fn drain_clears() {
        let mut bus = EventBus::new();
        bus.emit(1);
        bus.emit(2);
        assert_eq!(bus.drain(), vec![1, 2]);
        assert!(bus.events().is_empty());

        bus.emit(3);
        assert_eq!(bus.drain(), vec![3]);
    }
}
