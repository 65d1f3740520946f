//! Message emitter used to hand work back to the runtime.

use flume::Sender;

use crate::hook::HookMessage;
use crate::routing::SlotId;

/// A [`HookMessage`] addressed to one mount.
pub(crate) struct Envelope {
    pub(crate) slot: SlotId,
    pub(crate) message: HookMessage,
}

/// Handle that queues messages for the runtime.
///
/// Completed futures, elapsed timers and DOM listeners all report back
/// through an `Emitter`. Messages are processed on the thread that drives the
/// runtime, in the order they were queued, so an emitter can be cloned into
/// callbacks freely.
///
/// Adapters never see an `Emitter` directly; they get one indirectly through
/// [`HookContext::listener`](crate::HookContext::listener) and the
/// [`Effect`](crate::Effect)s they return.
pub struct Emitter<Message: Send>(pub(crate) Sender<Message>);

impl<Message: Send> Clone for Emitter<Message> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<Message: Send> Emitter<Message> {
    /// Create a new emitter from a channel sender.
    pub(crate) fn new(sender: Sender<Message>) -> Self {
        Self(sender)
    }

    /// Queue a message.
    ///
    /// Messages sent after the runtime is dropped are discarded.
    pub fn emit(&self, message: Message) {
        self.0.send(message).ok();
    }
}

impl Emitter<Envelope> {
    /// Queue a message for the hook mounted in `slot`.
    pub(crate) fn emit_to(&self, slot: SlotId, message: HookMessage) {
        self.emit(Envelope { slot, message });
    }
}
