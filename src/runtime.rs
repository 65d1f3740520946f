//! The hook runtime that dispatches host lifecycle calls to hooks.

use core::future::Future;
use core::pin::Pin;
use core::time::Duration;
use std::collections::HashMap;

use flume::Receiver;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::bus::HostBus;
use crate::effect::{BoxFuture, Effect, Task};
use crate::element::{ViewElement, ViewId};
use crate::emitter::{Emitter, Envelope};
use crate::error::{HookError, HookResult};
use crate::hook::{HookContext, HookMessage, ViewHook};
use crate::registry::HookRegistry;
use crate::routing::{Channel, SlotId, Subscriptions, VisibilityObservers};

/// A spawner trait for executing futures on the host's event loop.
///
/// Function pointers and closures automatically implement this trait via the blanket implementation.
pub trait Spawner {
    /// Spawn a future on the event loop.
    fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>);
}

impl<F> Spawner for F
where
    F: Fn(Pin<Box<dyn Future<Output = ()> + Send>>),
{
    fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>) {
        self(future)
    }
}

/// A timer that produces futures resolving after a delay.
///
/// Closures of the right shape implement this trait via the blanket implementation.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> BoxFuture<()>;
}

impl<F> Timer for F
where
    F: Fn(Duration) -> BoxFuture<()>,
{
    fn sleep(&self, duration: Duration) -> BoxFuture<()> {
        self(duration)
    }
}

struct MountedView {
    id: ViewId,
    hook_name: String,
    element: Box<dyn ViewElement>,
    hook: Box<dyn ViewHook>,
    /// Destroyed, waiting for its hook to settle.
    retiring: bool,
}

/// The runtime that owns mounted hooks and routes everything to them.
///
/// The host forwards its lifecycle callbacks ([`mount`](Self::mount),
/// [`update`](Self::update), [`destroy`](Self::destroy)), server events
/// ([`push_event`](Self::push_event)), window events
/// ([`dispatch_window_event`](Self::dispatch_window_event)) and intersection
/// reports ([`report_intersection`](Self::report_intersection)). Each call
/// runs to completion and then drains the message queue.
///
/// Work declared by hooks as [`Effect`]s runs on the [`Spawner`] and
/// [`Timer`]; its results are queued and delivered to the hook that asked for
/// them the next time the queue is drained, either by a host call,
/// [`process_pending`](Self::process_pending) or [`pump`](Self::pump).
///
/// Errors never unwind into the host. They are logged and delivered to
/// [`HostBus::report_error`].
///
/// For testing with manual control, use [`TestHookRuntime`].
pub struct HookRuntime<Spawn, Clock>
where
    Spawn: Spawner,
    Clock: Timer,
{
    registry: HookRegistry,
    bus: Box<dyn HostBus>,
    spawner: Spawn,
    timer: Clock,
    views: HashMap<ViewId, SlotId>,
    slots: HashMap<SlotId, MountedView>,
    next_slot: u64,
    subscriptions: Subscriptions,
    observers: VisibilityObservers,
    emitter: Emitter<Envelope>,
    receiver: Receiver<Envelope>,
}

impl<Spawn, Clock> HookRuntime<Spawn, Clock>
where
    Spawn: Spawner,
    Clock: Timer,
{
    /// Create a new runtime.
    ///
    /// # Arguments
    ///
    /// * `registry` - Hook factories, keyed by the names elements declare
    /// * `bus` - Outbound events and the error channel
    /// * `spawner` - Executes futures on the host's event loop
    /// * `timer` - Produces delays for deferred hook work
    pub fn new(registry: HookRegistry, bus: Box<dyn HostBus>, spawner: Spawn, timer: Clock) -> Self {
        let (sender, receiver) = flume::unbounded();

        HookRuntime {
            registry,
            bus,
            spawner,
            timer,
            views: HashMap::new(),
            slots: HashMap::new(),
            next_slot: 0,
            subscriptions: Subscriptions::default(),
            observers: VisibilityObservers::default(),
            emitter: Emitter::new(sender),
            receiver,
        }
    }

    /// Mount the hook registered as `hook_name` on `element`.
    ///
    /// A failing mount leaves nothing behind: no view, no subscriptions.
    pub fn mount(&mut self, hook_name: &str, element: Box<dyn ViewElement>) {
        let id = element.id();
        if let Err(error) = self.try_mount(hook_name, element) {
            self.report(&id, error);
        }
        self.process_pending();
    }

    fn try_mount(&mut self, hook_name: &str, element: Box<dyn ViewElement>) -> HookResult<()> {
        let id = element.id();
        if self.views.contains_key(&id) {
            return Err(HookError::AlreadyMounted(id));
        }
        let hook = self.registry.create(hook_name)?;

        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        self.slots.insert(
            slot,
            MountedView {
                id: id.clone(),
                hook_name: hook_name.to_owned(),
                element,
                hook,
                retiring: false,
            },
        );

        match self.with_hook(slot, |hook, ctx| hook.mounted(ctx)) {
            Some(Ok(effect)) => {
                debug!(view = %id, hook = hook_name, "mounted view");
                self.views.insert(id, slot);
                self.execute(slot, effect);
                Ok(())
            }
            Some(Err(error)) => {
                self.release(slot);
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// The host patched the element of `id`.
    pub fn update(&mut self, id: &ViewId) {
        let Some(&slot) = self.views.get(id) else {
            self.report(id, HookError::NotMounted(id.clone()));
            return;
        };
        match self.with_hook(slot, |hook, ctx| hook.updated(ctx)) {
            Some(Ok(effect)) => self.execute(slot, effect),
            Some(Err(error)) => self.report(id, error),
            None => {}
        }
        self.process_pending();
    }

    /// The host removed the element of `id`.
    ///
    /// The hook's subscriptions and visibility observer are dropped. A hook
    /// that still has work in flight keeps receiving its messages until it
    /// reports itself settled.
    pub fn destroy(&mut self, id: &ViewId) {
        let Some(slot) = self.views.remove(id) else {
            self.report(id, HookError::NotMounted(id.clone()));
            return;
        };
        let effect = self.with_hook(slot, |hook, ctx| hook.destroyed(ctx));
        self.subscriptions.remove_slot(slot);
        self.observers.disconnect(slot);
        if let Some(effect) = effect {
            self.execute(slot, effect);
        }

        if let Some(view) = self.slots.get_mut(&slot) {
            if view.hook.is_settled() {
                debug!(view = %id, hook = %view.hook_name, "destroyed view");
                self.slots.remove(&slot);
            } else {
                debug!(view = %id, hook = %view.hook_name, "view retiring with work in flight");
                view.retiring = true;
            }
        }
        self.process_pending();
    }

    /// Deliver a server-pushed event to every hook subscribed to `name`.
    pub fn push_event(&mut self, name: &str, payload: &Value) {
        self.route(Channel::Server, name, payload);
        self.process_pending();
    }

    /// Deliver a window event to every hook listening for `name`.
    pub fn dispatch_window_event(&mut self, name: &str, payload: &Value) {
        self.route(Channel::Window, name, payload);
        self.process_pending();
    }

    /// Report the current intersection ratio of the element of `id`.
    ///
    /// May be called as often as the host likes; hooks hear about threshold
    /// crossings only.
    pub fn report_intersection(&mut self, id: &ViewId, ratio: f64) {
        let Some(&slot) = self.views.get(id) else {
            trace!(view = %id, "intersection for unmounted view ignored");
            return;
        };
        if let Some(visible) = self.observers.report(slot, ratio) {
            trace!(view = %id, visible, ratio, "visibility threshold crossed");
            self.emitter
                .emit_to(slot, HookMessage::VisibilityChanged { visible });
        }
        self.process_pending();
    }

    /// Deliver every queued message. Returns how many were processed.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            self.deliver(envelope);
            processed += 1;
        }
        processed
    }

    /// Wait for the next message, then deliver everything queued.
    pub async fn pump(&mut self) -> usize {
        match self.receiver.recv_async().await {
            Ok(envelope) => {
                self.deliver(envelope);
                1 + self.process_pending()
            }
            Err(_) => 0,
        }
    }

    pub fn is_mounted(&self, id: &ViewId) -> bool {
        self.views.contains_key(id)
    }

    /// Number of live (not destroyed) views.
    pub fn mounted_count(&self) -> usize {
        self.views.len()
    }

    /// Number of destroyed views whose hooks still have work in flight.
    pub fn retiring_count(&self) -> usize {
        self.slots.values().filter(|view| view.retiring).count()
    }

    /// Number of server and window events the view of `id` is subscribed to.
    pub fn subscription_count(&self, id: &ViewId) -> usize {
        self.views
            .get(id)
            .map(|&slot| self.subscriptions.count_for(slot))
            .unwrap_or(0)
    }

    pub fn is_observing_visibility(&self, id: &ViewId) -> bool {
        self.views
            .get(id)
            .is_some_and(|&slot| self.observers.is_observing(slot))
    }

    fn route(&mut self, channel: Channel, name: &str, payload: &Value) {
        let subscribers = self.subscriptions.subscribers(channel, name);
        if subscribers.is_empty() {
            trace!(?channel, event = name, "no subscribers");
        }
        for slot in subscribers {
            match self.with_hook(slot, |hook, ctx| hook.handle_event(ctx, name, payload)) {
                Some(Ok(effect)) => self.execute(slot, effect),
                Some(Err(error)) => {
                    if let Some(id) = self.slots.get(&slot).map(|view| view.id.clone()) {
                        self.report(&id, error);
                    }
                }
                None => {}
            }
        }
    }

    fn deliver(&mut self, envelope: Envelope) {
        let Envelope { slot, message } = envelope;
        if !self.slots.contains_key(&slot) {
            trace!(?slot, "dropping message for released view");
            if let HookMessage::SpecSettled {
                outcome: Ok(mut view),
                ..
            } = message
            {
                view.finalize();
            }
            return;
        }

        if let Some(effect) = self.with_hook(slot, |hook, ctx| hook.handle_message(ctx, message)) {
            self.execute(slot, effect);
        }

        let settled = self
            .slots
            .get(&slot)
            .is_some_and(|view| view.retiring && view.hook.is_settled());
        if settled {
            if let Some(view) = self.slots.remove(&slot) {
                debug!(view = %view.id, hook = %view.hook_name, "retired view settled");
            }
        }
    }

    /// Run `f` against the hook in `slot` with a context over its element.
    fn with_hook<R>(
        &mut self,
        slot: SlotId,
        f: impl FnOnce(&mut dyn ViewHook, &mut HookContext<'_>) -> R,
    ) -> Option<R> {
        let view = self.slots.get_mut(&slot)?;
        let mut ctx = HookContext {
            view: &view.id,
            slot,
            element: &mut *view.element,
            bus: &*self.bus,
            emitter: &self.emitter,
            subscriptions: &mut self.subscriptions,
            observers: &mut self.observers,
        };
        Some(f(&mut *view.hook, &mut ctx))
    }

    fn execute(&self, slot: SlotId, effect: Effect<HookMessage>) {
        for task in effect.into_tasks() {
            match task {
                Task::Emit(message) => self.emitter.emit_to(slot, message),
                Task::Await(future) => {
                    let emitter = self.emitter.clone();
                    self.spawner.spawn(Box::pin(async move {
                        let message = future.await;
                        emitter.emit_to(slot, message);
                    }));
                }
                Task::Delay(duration, message) => {
                    let emitter = self.emitter.clone();
                    let sleep = self.timer.sleep(duration);
                    self.spawner.spawn(Box::pin(async move {
                        sleep.await;
                        emitter.emit_to(slot, message);
                    }));
                }
            }
        }
    }

    fn release(&mut self, slot: SlotId) {
        self.subscriptions.remove_slot(slot);
        self.observers.disconnect(slot);
        self.slots.remove(&slot);
    }

    fn report(&self, id: &ViewId, error: HookError) {
        warn!(view = %id, %error, "hook error");
        self.bus.report_error(id, &error);
    }
}

#[cfg(any(test, feature = "testing"))]
pub use self::testing::{TestHookDriver, TestHookRuntime, TestSpawner, TestTimer};

#[cfg(any(test, feature = "testing"))]
mod testing {
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll, Waker};
    use core::time::Duration;
    use std::ops::{Deref, DerefMut};

    use futures::executor::{LocalPool, LocalSpawner};
    use futures::task::LocalSpawnExt;
    use portable_atomic_util::Arc;
    use spin::Mutex;

    use super::{HookRuntime, Spawner, Timer};
    use crate::bus::HostBus;
    use crate::effect::BoxFuture;
    use crate::registry::HookRegistry;

    /// Spawner that queues futures on a [`LocalPool`] driven by the test.
    pub struct TestSpawner(LocalSpawner);

    impl Spawner for TestSpawner {
        fn spawn(&self, future: Pin<Box<dyn Future<Output = ()> + Send>>) {
            self.0.spawn_local(future).ok();
        }
    }

    struct ClockState {
        now: Duration,
        wakers: Vec<Waker>,
    }

    /// Manual clock. Sleeps resolve only when the test advances time.
    #[derive(Clone)]
    pub struct TestTimer {
        state: Arc<Mutex<ClockState>>,
    }

    impl Default for TestTimer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestTimer {
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(ClockState {
                    now: Duration::ZERO,
                    wakers: Vec::new(),
                })),
            }
        }

        /// Time elapsed since the timer was created.
        pub fn now(&self) -> Duration {
            self.state.lock().now
        }

        /// Move the clock forward and wake every pending sleep.
        pub fn advance(&self, duration: Duration) {
            let wakers = {
                let mut state = self.state.lock();
                state.now += duration;
                core::mem::take(&mut state.wakers)
            };
            for waker in wakers {
                waker.wake();
            }
        }
    }

    impl Timer for TestTimer {
        fn sleep(&self, duration: Duration) -> BoxFuture<()> {
            Box::pin(Sleep {
                deadline: self.now() + duration,
                state: self.state.clone(),
            })
        }
    }

    struct Sleep {
        deadline: Duration,
        state: Arc<Mutex<ClockState>>,
    }

    impl Future for Sleep {
        type Output = ();

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            let mut state = self.state.lock();
            if state.now >= self.deadline {
                Poll::Ready(())
            } else {
                state.wakers.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }

    /// Test runtime with manual control over futures and time.
    ///
    /// Only available with the `testing` feature or during tests.
    ///
    /// Futures spawned by hooks run on a [`LocalPool`] that only makes
    /// progress when the driver settles, and delays only elapse when the
    /// driver advances its [`TestTimer`].
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use oxide_hooks::{HookRegistry, TestHookRuntime, TestHostBus};
    ///
    /// let bus = TestHostBus::new();
    /// let mut driver = TestHookRuntime::new(HookRegistry::new(), bus.boxed()).run();
    ///
    /// driver.settle();
    /// driver.advance(Duration::from_millis(50));
    ///
    /// assert_eq!(driver.mounted_count(), 0);
    /// ```
    pub struct TestHookRuntime {
        runtime: HookRuntime<TestSpawner, TestTimer>,
        pool: LocalPool,
        timer: TestTimer,
    }

    impl TestHookRuntime {
        pub fn new(registry: HookRegistry, bus: Box<dyn HostBus>) -> Self {
            let pool = LocalPool::new();
            let timer = TestTimer::new();
            let runtime = HookRuntime::new(
                registry,
                bus,
                TestSpawner(pool.spawner()),
                timer.clone(),
            );

            TestHookRuntime {
                runtime,
                pool,
                timer,
            }
        }

        /// Returns a [`TestHookDriver`] for manual scheduling.
        pub fn run(self) -> TestHookDriver {
            TestHookDriver { inner: self }
        }
    }

    /// Driver returned by [`TestHookRuntime::run`].
    ///
    /// Dereferences to the underlying [`HookRuntime`], so host calls are made
    /// directly on the driver.
    pub struct TestHookDriver {
        inner: TestHookRuntime,
    }

    impl TestHookDriver {
        /// Poll spawned futures and deliver their messages until nothing
        /// can make progress.
        pub fn settle(&mut self) {
            loop {
                self.inner.pool.run_until_stalled();
                if self.inner.runtime.process_pending() == 0 {
                    break;
                }
            }
        }

        /// Advance the clock, then settle.
        pub fn advance(&mut self, duration: Duration) {
            self.inner.timer.advance(duration);
            self.settle();
        }

        pub fn timer(&self) -> &TestTimer {
            &self.inner.timer
        }
    }

    impl Deref for TestHookDriver {
        type Target = HookRuntime<TestSpawner, TestTimer>;

        fn deref(&self) -> &Self::Target {
            &self.inner.runtime
        }
    }

    impl DerefMut for TestHookDriver {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.inner.runtime
        }
    }
}
