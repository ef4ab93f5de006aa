//! Lifecycle events published by the grid view-model

use std::any::{Any, TypeId};
use std::sync::Arc;
use parking_lot::RwLock;
use ahash::AHashMap;

/// Marker for values that can be published on an [`EventBus`]
pub trait Event: Any + Send + Sync {}

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Typed event bus for grid lifecycle events.
///
/// Handlers run on the publishing thread after the handler table is
/// unlocked, so a handler may publish or subscribe itself.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<AHashMap<TypeId, Vec<Handler>>>,
}

/// Grid lifecycle events
pub mod events {
    use super::Event;
    
    /// A window was served, from the store or from the remote source
    #[derive(Debug, Clone, PartialEq)]
    pub struct WindowLoaded {
        pub offset: usize,
        pub count: usize,
        pub rows: usize,
        pub from_cache: bool,
        pub fully_loaded: bool,
    }
    
    /// A remote fetch failed
    #[derive(Debug, Clone, PartialEq)]
    pub struct FetchFailed {
        pub offset: usize,
        pub count: usize,
        pub error: String,
    }
    
    /// Pending edits were saved and reconciled
    #[derive(Debug, Clone, PartialEq)]
    pub struct ChangesCommitted {
        pub row_indices: Vec<usize>,
    }
    
    /// Pending edits were discarded and their source rows restored
    #[derive(Debug, Clone, PartialEq)]
    pub struct ChangesReverted {
        pub row_indices: Vec<usize>,
    }
    
    /// All rows were dropped by a reset
    #[derive(Debug, Clone, PartialEq)]
    pub struct DataReset {
        pub generation: u64,
    }
    
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(impl Event for $t {})*
        }
    }
    
    impl_event!(
        WindowLoaded,
        FetchFailed,
        ChangesCommitted,
        ChangesReverted,
        DataReset
    );
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Call `handler` for every published event of type `E`
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event);
            }
        });
        self.handlers.write().entry(TypeId::of::<E>()).or_default().push(handler);
    }
    
    pub fn publish<E: Event>(&self, event: E) {
        let handlers = match self.handlers.read().get(&TypeId::of::<E>()) {
            Some(handlers) => handlers.clone(),
            None => return,
        };
        for handler in handlers {
            handler(&event);
        }
    }
    
    /// Number of handlers subscribed to `E`
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers.read().get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }
}
