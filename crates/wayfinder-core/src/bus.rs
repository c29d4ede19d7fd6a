//! Fan-out of [`CoreEvent`]s to subscribers.

use crossbeam_channel::Sender;

use crate::events::CoreEvent;

/// Receives every event the session publishes.
pub trait EventSink {
    fn publish(&mut self, event: &CoreEvent);
}

/// Blanket implementation for closures.
impl<F> EventSink for F
where
    F: FnMut(&CoreEvent),
{
    fn publish(&mut self, event: &CoreEvent) {
        self(event);
    }
}

/// Forwards events to a channel, e.g. a UI or transport thread.
impl EventSink for Sender<CoreEvent> {
    fn publish(&mut self, event: &CoreEvent) {
        if self.send(event.clone()).is_err() {
            tracing::debug!("event receiver dropped");
        }
    }
}

/// Ordered list of sinks. Every sink sees every event, in subscription
/// order.
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<S: EventSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn publish(&mut self, event: CoreEvent) {
        for sink in &mut self.sinks {
            sink.publish(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_every_sink_sees_every_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (tx, rx) = crossbeam_channel::unbounded();

        let mut bus = EventBus::new();
        let log = Rc::clone(&seen);
        bus.subscribe(move |e: &CoreEvent| log.borrow_mut().push(e.clone()));
        bus.subscribe(tx);
        assert_eq!(bus.len(), 2);

        bus.publish(CoreEvent::SendToServer("north".to_string()));
        bus.publish(CoreEvent::SendToServer("east".to_string()));

        assert_eq!(seen.borrow().len(), 2);
        let received: Vec<CoreEvent> = rx.try_iter().collect();
        assert_eq!(received, *seen.borrow());
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut bus = EventBus::new();
        bus.subscribe(tx);
        bus.publish(CoreEvent::SendToServer("look".to_string()));
    }
}
