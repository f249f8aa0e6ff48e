//! Per-tick consumer of the injection queue.
//!
//! Runs on the host's frame loop. This is the only place queued requests
//! reach the host.

use crate::chat::{InjectionQueue, NewMessageRequest};

/// Something that can deliver an outbound request to the host.
pub trait ChatDispatcher {
    /// Deliver one request. Called on the host's frame-loop thread.
    fn dispatch(&self, ui_module: usize, request: &NewMessageRequest);
}

/// Host session data sampled at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    /// Handle of the host's UI module, 0 when unavailable.
    pub ui_module: usize,
    /// Whether a local player is logged in.
    pub local_player_present: bool,
}

impl TickContext {
    /// Create a tick context.
    pub fn new(ui_module: usize, local_player_present: bool) -> Self {
        Self {
            ui_module,
            local_player_present,
        }
    }

    /// Whether messages can be typed into the host right now.
    pub fn is_ready(&self) -> bool {
        self.local_player_present && self.ui_module != 0
    }
}

/// Drain the queue and dispatch in FIFO order.
///
/// When the session is not ready the batch is put back untouched for the
/// next tick. Returns the number of requests dispatched.
pub fn process_pending<D: ChatDispatcher + ?Sized>(
    queue: &InjectionQueue,
    dispatcher: &D,
    ctx: TickContext,
) -> usize {
    let batch = queue.drain_batch();
    if batch.is_empty() {
        return 0;
    }

    let mut dispatched = 0;
    let mut pending = batch.into_iter();
    while let Some(request) = pending.next() {
        if !ctx.is_ready() {
            tracing::debug!(
                remaining = pending.len() + 1,
                "session not ready, deferring messages"
            );
            let mut rest = vec![request];
            rest.extend(pending);
            queue.requeue_front(rest);
            break;
        }
        dispatcher.dispatch(ctx.ui_module, &request);
        dispatched += 1;
    }
    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::InputChannel;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(usize, String)>>,
    }

    impl ChatDispatcher for Recorder {
        fn dispatch(&self, ui_module: usize, request: &NewMessageRequest) {
            self.seen
                .lock()
                .unwrap()
                .push((ui_module, request.text.clone()));
        }
    }

    fn queue_with(texts: &[&str]) -> InjectionQueue {
        let queue = InjectionQueue::new(16);
        for text in texts {
            queue
                .enqueue(NewMessageRequest::new(InputChannel::Say, *text))
                .unwrap();
        }
        queue
    }

    #[test]
    fn test_ready_requires_both() {
        assert!(TickContext::new(1, true).is_ready());
        assert!(!TickContext::new(0, true).is_ready());
        assert!(!TickContext::new(1, false).is_ready());
    }

    #[test]
    fn test_dispatches_in_order() {
        let queue = queue_with(&["a", "b", "c"]);
        let recorder = Recorder::default();

        let count = process_pending(&queue, &recorder, TickContext::new(0x40, true));

        assert_eq!(count, 3);
        assert!(queue.is_empty());
        let seen = recorder.seen.lock().unwrap();
        let texts: Vec<&str> = seen.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(seen.iter().all(|(ui, _)| *ui == 0x40));
    }

    #[test]
    fn test_not_ready_keeps_messages() {
        let queue = queue_with(&["a", "b"]);
        let recorder = Recorder::default();

        let count = process_pending(&queue, &recorder, TickContext::new(0x40, false));

        assert_eq!(count, 0);
        assert_eq!(queue.len(), 2);
        assert!(recorder.seen.lock().unwrap().is_empty());

        // The next ready tick delivers them exactly once.
        process_pending(&queue, &recorder, TickContext::new(0x40, true));
        process_pending(&queue, &recorder, TickContext::new(0x40, true));
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_queue() {
        let queue = InjectionQueue::new(4);
        let recorder = Recorder::default();
        assert_eq!(
            process_pending(&queue, &recorder, TickContext::new(1, true)),
            0
        );
    }
}
