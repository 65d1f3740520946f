use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use oxide_hooks::{
    BoxFuture, ChartInstance, ChartLibrary, Container, EmbedOptions, HookError, HookRegistry,
    HostBus, OutboundEvent, RenderConfig, RenderConstructionError, RuntimeConfig, SpecRenderer,
    SpecView, TestHookDriver, TestHookRuntime, TestHostBus, ViewElement, ViewId,
};
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub(crate) type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: String) {
    log.lock().unwrap().push(entry);
}

#[derive(Clone, Default)]
pub(crate) struct RecordingChartLibrary {
    log: Log,
    live: Arc<AtomicUsize>,
}

impl RecordingChartLibrary {
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

struct RecordingChart {
    label: String,
    log: Log,
    live: Arc<AtomicUsize>,
}

impl ChartLibrary for RecordingChartLibrary {
    fn create(&self, element: &dyn ViewElement, config: &RenderConfig) -> Box<dyn ChartInstance> {
        let label = config.as_value()["label"]
            .as_str()
            .unwrap_or("unlabelled")
            .to_owned();
        push(&self.log, format!("create:{}@{}", label, element.id()));
        self.live.fetch_add(1, Ordering::SeqCst);
        Box::new(RecordingChart {
            label,
            log: self.log.clone(),
            live: self.live.clone(),
        })
    }
}

impl ChartInstance for RecordingChart {
    fn destroy(&mut self) {
        push(&self.log, format!("destroy:{}", self.label));
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

type Embedding = Result<Box<dyn SpecView>, RenderConstructionError>;

#[derive(Default)]
struct RendererState {
    pending: VecDeque<(usize, oneshot::Sender<Embedding>)>,
    embeds: Vec<(Value, EmbedOptions)>,
}

/// Spec renderer whose constructions resolve only when the test says so.
#[derive(Clone, Default)]
pub(crate) struct ScriptedSpecRenderer {
    state: Arc<Mutex<RendererState>>,
    log: Log,
}

struct RecordingSpecView {
    number: usize,
    log: Log,
}

impl SpecView for RecordingSpecView {
    fn finalize(&mut self) {
        push(&self.log, format!("finalize:{}", self.number));
    }
}

impl ScriptedSpecRenderer {
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn embed_count(&self) -> usize {
        self.state.lock().unwrap().embeds.len()
    }

    pub(crate) fn embed(&self, index: usize) -> (Value, EmbedOptions) {
        self.state.lock().unwrap().embeds[index].clone()
    }

    pub(crate) fn finalize_count(&self, number: usize) -> usize {
        let entry = format!("finalize:{}", number);
        self.log().iter().filter(|e| **e == entry).count()
    }

    /// Resolve the oldest pending construction with a view.
    pub(crate) fn resolve_next(&self) {
        let (number, sender) = self.next_pending();
        let view = RecordingSpecView {
            number,
            log: self.log.clone(),
        };
        sender.send(Ok(Box::new(view))).ok();
    }

    /// Reject the oldest pending construction.
    pub(crate) fn reject_next(&self, message: &str) {
        let (_, sender) = self.next_pending();
        sender.send(Err(RenderConstructionError::new(message))).ok();
    }

    fn next_pending(&self) -> (usize, oneshot::Sender<Embedding>) {
        self.state
            .lock()
            .unwrap()
            .pending
            .pop_front()
            .expect("no pending construction")
    }
}

impl SpecRenderer for ScriptedSpecRenderer {
    fn embed(
        &self,
        _container: Arc<dyn Container>,
        spec: RenderConfig,
        options: &EmbedOptions,
    ) -> BoxFuture<Embedding> {
        let (sender, receiver) = oneshot::channel();
        let number = {
            let mut state = self.state.lock().unwrap();
            let number = state.embeds.len();
            state.embeds.push((spec.into_value(), options.clone()));
            state.pending.push_back((number, sender));
            number
        };
        push(&self.log, format!("embed:{}", number));

        Box::pin(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(RenderConstructionError::new("renderer dropped")))
        })
    }
}

mockall::mock! {
    pub(crate) Bus {}

    impl HostBus for Bus {
        fn push_event(&self, event: OutboundEvent);
        fn report_error(&self, view: &ViewId, error: &HookError);
    }
}

pub(crate) struct IntegrationTest {
    pub(crate) driver: TestHookDriver,
    pub(crate) bus: TestHostBus,
    pub(crate) charts: RecordingChartLibrary,
    pub(crate) specs: ScriptedSpecRenderer,
}

pub(crate) fn build_integration_test() -> IntegrationTest {
    let bus = TestHostBus::new();
    let (driver, charts, specs) = build_driver_with_bus(bus.boxed());
    IntegrationTest {
        driver,
        bus,
        charts,
        specs,
    }
}

pub(crate) fn build_driver_with_bus(
    bus: Box<dyn HostBus>,
) -> (TestHookDriver, RecordingChartLibrary, ScriptedSpecRenderer) {
    let charts = RecordingChartLibrary::default();
    let specs = ScriptedSpecRenderer::default();
    let registry = HookRegistry::standard(
        &RuntimeConfig::default(),
        Arc::new(charts.clone()),
        Arc::new(specs.clone()),
    )
    .unwrap();
    let driver = TestHookRuntime::new(registry, bus).run();
    (driver, charts, specs)
}

/// Captures events emitted while installed as the default subscriber.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturedLogs {
    pub(crate) fn at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}
