//! Shared server state.
//!
//! One `ServerState` owns the registry, the output router, and the
//! interpreter gate; there are no process-wide singletons, so tests can run
//! several independent servers side by side.

use crate::config::Config;
use climux_core::{ConnRegistry, Interpreter, OutputRouter, SerialSink, SharedInterpreter};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ServerState {
    pub config: Config,
    pub registry: Arc<ConnRegistry>,
    pub router: Arc<OutputRouter>,
    pub interpreter: SharedInterpreter,
    /// The always-on local output leg, kept for input echo.
    pub serial: Arc<dyn SerialSink>,
}

impl ServerState {
    pub fn new(
        config: Config,
        registry: Arc<ConnRegistry>,
        interpreter: Box<dyn Interpreter>,
        serial: Arc<dyn SerialSink>,
    ) -> Arc<Self> {
        let router = Arc::new(OutputRouter::new(serial.clone(), registry.clone()));
        Arc::new(Self {
            config,
            registry,
            router,
            interpreter: Arc::new(Mutex::new(interpreter)),
            serial,
        })
    }
}
