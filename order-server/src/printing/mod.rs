//! Kitchen-ticket rendering and fire-and-forget dispatch.
//!
//! The Print Dispatcher is an external collaborator: the engine renders a
//! text payload and hands it off without waiting. Dispatch failures are
//! logged, never block order mutation. Renderer backends (Epson vs Star
//! paper widths) sit behind one capability interface, selected by
//! configuration — no inline branching on a printer type tag.

mod renderer;

pub use renderer::{
    EpsonRenderer, PrintJob, PrintLine, RendererBackend, StarRenderer, TicketRenderer,
};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use shared::order::Order;

#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("Printer offline: {0}")]
    Offline(String),

    #[error("Print I/O error: {0}")]
    Io(String),
}

/// External dispatch boundary — receives a rendered ticket.
#[async_trait]
pub trait PrintDispatcher: Send + Sync {
    async fn dispatch(&self, ticket: String) -> Result<(), PrintError>;
}

/// In-process stand-in that logs rendered tickets.
#[derive(Debug, Default)]
pub struct LogDispatcher;

#[async_trait]
impl PrintDispatcher for LogDispatcher {
    async fn dispatch(&self, ticket: String) -> Result<(), PrintError> {
        debug!(ticket = %ticket, "Kitchen ticket dispatched");
        Ok(())
    }
}

/// Renders and dispatches kitchen tickets.
pub struct PrintService {
    renderer: RendererBackend,
    dispatcher: Arc<dyn PrintDispatcher>,
}

impl PrintService {
    pub fn new(renderer: RendererBackend, dispatcher: Arc<dyn PrintDispatcher>) -> Self {
        Self {
            renderer,
            dispatcher,
        }
    }

    /// Fire-and-forget: rendering is synchronous, the dispatch itself runs
    /// in a detached task and only ever logs its failure.
    pub fn dispatch_ticket(&self, order: &Order) {
        let ticket = self.renderer.render(&PrintJob::from_order(order));
        let dispatcher = self.dispatcher.clone();
        let order_no = order.order_no.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.dispatch(ticket).await {
                warn!(order_no = %order_no, error = %e, "Kitchen ticket dispatch failed");
            }
        });
    }
}
