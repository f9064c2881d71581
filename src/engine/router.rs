//! Monitoring event routing with centralized fan-out.
//!
//! Two implementations of the same trait: [`EventRouterStd`] over
//! standard library mpsc channels, and [`EventRouterTokio`] over Tokio
//! channels for async consumers. Both move listener invocation off the
//! trading threads: publishers only enqueue.

use super::events::EngineEvent;
use std::sync::{Arc, RwLock};
use tracing::{error, info};

/// Callback invoked for every published engine event.
pub type EngineEventListener = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Fan-out router for [`EngineEvent`]s.
pub trait EventRouter {
    /// Register a listener; takes effect for events processed after the
    /// call.
    fn add_listener(&self, listener: EngineEventListener);

    /// A cheap cloneable publisher handle for the trading threads.
    fn publisher(&self) -> Arc<dyn Fn(EngineEvent) + Send + Sync>;
}

/// Event router backed by `std::sync::mpsc` and a dedicated thread.
pub struct EventRouterStd {
    sender: std::sync::mpsc::Sender<EngineEvent>,
    receiver: Option<std::sync::mpsc::Receiver<EngineEvent>>,
    listeners: Arc<RwLock<Vec<EngineEventListener>>>,
}

impl EventRouterStd {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = std::sync::mpsc::channel();
        Self {
            sender,
            receiver: Some(receiver),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start the fan-out processor in its own thread. The thread exits
    /// when every publisher handle has been dropped.
    pub fn start_processor(&mut self) -> std::thread::JoinHandle<()> {
        let receiver = self
            .receiver
            .take()
            .expect("event processor already started");
        let listeners = Arc::clone(&self.listeners);

        std::thread::spawn(move || {
            info!("engine event processor started");
            while let Ok(event) = receiver.recv() {
                dispatch(&listeners, &event);
            }
            info!("engine event processor stopped");
        })
    }
}

impl Default for EventRouterStd {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter for EventRouterStd {
    fn add_listener(&self, listener: EngineEventListener) {
        if let Ok(mut slot) = self.listeners.write() {
            slot.push(listener);
        }
    }

    fn publisher(&self) -> Arc<dyn Fn(EngineEvent) + Send + Sync> {
        let sender = self.sender.clone();
        Arc::new(move |event| {
            if let Err(e) = sender.send(event) {
                error!("failed to publish engine event: {}", e);
            }
        })
    }
}

/// Event router backed by Tokio unbounded channels and an async task.
pub struct EventRouterTokio {
    sender: tokio::sync::mpsc::UnboundedSender<EngineEvent>,
    receiver: Option<tokio::sync::mpsc::UnboundedReceiver<EngineEvent>>,
    listeners: Arc<RwLock<Vec<EngineEventListener>>>,
}

impl EventRouterTokio {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Some(receiver),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start the fan-out processor as an async task on the current
    /// runtime.
    pub fn start_processor(&mut self) -> tokio::task::JoinHandle<()> {
        let mut receiver = self
            .receiver
            .take()
            .expect("event processor already started");
        let listeners = Arc::clone(&self.listeners);

        tokio::spawn(async move {
            info!("engine event processor started (tokio)");
            while let Some(event) = receiver.recv().await {
                dispatch(&listeners, &event);
            }
            info!("engine event processor stopped (tokio)");
        })
    }
}

impl Default for EventRouterTokio {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter for EventRouterTokio {
    fn add_listener(&self, listener: EngineEventListener) {
        if let Ok(mut slot) = self.listeners.write() {
            slot.push(listener);
        }
    }

    fn publisher(&self) -> Arc<dyn Fn(EngineEvent) + Send + Sync> {
        let sender = self.sender.clone();
        Arc::new(move |event| {
            if let Err(e) = sender.send(event) {
                error!("failed to publish engine event: {}", e);
            }
        })
    }
}

fn dispatch(listeners: &RwLock<Vec<EngineEventListener>>, event: &EngineEvent) {
    let Ok(listeners) = listeners.read() else {
        return;
    };
    for listener in listeners.iter() {
        listener(event);
    }
}
