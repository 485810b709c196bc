use std::any::TypeId;
use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Session-wide event bus
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Events raised during an interaction cycle
pub mod events {
    use super::Event;

    /// A dataset was written to the table store
    #[derive(Debug, Clone)]
    pub struct TableRegistered {
        pub table_name: String,
        pub row_count: usize,
        pub column_count: usize,
    }

    /// An uploaded file had a type the workbench does not read
    #[derive(Debug, Clone)]
    pub struct IngestSkipped {
        pub file_name: String,
        pub mime_type: String,
    }

    /// A file was recognized but could not be decoded or stored
    #[derive(Debug, Clone)]
    pub struct IngestFailed {
        pub file_name: String,
        pub error: String,
    }

    /// A remote fetch did not produce a payload
    #[derive(Debug, Clone)]
    pub struct FetchFailed {
        pub url: String,
        pub error: String,
    }

    /// The active table changed
    #[derive(Debug, Clone)]
    pub struct SelectionChanged {
        pub previous: Option<String>,
        pub current: Option<String>,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        TableRegistered,
        IngestSkipped,
        IngestFailed,
        FetchFailed,
        SelectionChanged
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let mut handlers = self.handlers.lock();
        handlers.entry(TypeId::of::<E>()).or_default().push(handler);
    }

    /// Publish an event to every handler subscribed to its type.
    ///
    /// Handlers run synchronously under the bus lock and must not publish.
    pub fn publish<E: Event>(&self, event: E) {
        let mut handlers = self.handlers.lock();
        if let Some(event_handlers) = handlers.get_mut(&TypeId::of::<E>()) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }

    /// Number of handlers subscribed to `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.lock().len())
            .finish()
    }
}

/// Adapter turning a closure into an [`EventHandler`]
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
