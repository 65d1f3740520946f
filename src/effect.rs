//! Declarative effect system for describing deferred work.

use core::future::Future;
use core::pin::Pin;
use core::time::Duration;

/// A boxed, sendable future resolving to `T`.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub(crate) enum Task<Message> {
    Emit(Message),
    Await(BoxFuture<Message>),
    Delay(Duration, Message),
}

/// Declarative description of work that produces messages later.
///
/// Hooks return an `Effect` from their lifecycle callbacks instead of
/// spawning anything themselves. The runtime executes it: immediate messages
/// are queued, futures go to the [`Spawner`](crate::Spawner), delays go to the
/// [`Timer`](crate::Timer). Every message produced is delivered back to the
/// hook that returned the effect.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use oxide_hooks::{Effect, HookMessage};
///
/// // Nothing to do
/// let effect: Effect<HookMessage> = Effect::none();
///
/// // Come back in 50 ms
/// let effect = Effect::delay(Duration::from_millis(50), HookMessage::NavigationSettled);
///
/// // Combine
/// let effect = Effect::batch(vec![
///     Effect::just(HookMessage::NavigationSettled),
///     Effect::task(async { HookMessage::NavigationSettled }),
/// ]);
/// ```
pub struct Effect<Message>(Vec<Task<Message>>);

impl<Message> Effect<Message> {
    /// Create an empty effect.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Queue `message` for immediate delivery.
    pub fn just(message: Message) -> Self {
        Self(vec![Task::Emit(message)])
    }

    /// Run `future` on the spawner and deliver its output.
    pub fn task<F>(future: F) -> Self
    where
        F: Future<Output = Message> + Send + 'static,
    {
        Self(vec![Task::Await(Box::pin(future))])
    }

    /// Deliver `message` once `duration` has elapsed on the runtime's timer.
    pub fn delay(duration: Duration, message: Message) -> Self {
        Self(vec![Task::Delay(duration, message)])
    }

    /// Combine multiple effects into a single effect.
    pub fn batch(effects: Vec<Effect<Message>>) -> Self {
        Self(effects.into_iter().flat_map(|effect| effect.0).collect())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_tasks(self) -> Vec<Task<Message>> {
        self.0
    }
}

impl<Message> Default for Effect<Message> {
    fn default() -> Self {
        Self::none()
    }
}
