//! Ticket renderer backends.
//!
//! Uses enum_dispatch for zero-cost static dispatch: [`RendererBackend`] is
//! the ONLY place that matches on the configured backend name.

use chrono::{DateTime, Utc};
use enum_dispatch::enum_dispatch;

use shared::order::{Order, OrderKind};

/// A ticket ready for rendering, decoupled from the full order shape.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub order_no: String,
    pub store_id: String,
    pub kind: OrderKind,
    pub table_no: Option<String>,
    pub lines: Vec<PrintLine>,
    pub note: Option<String>,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PrintLine {
    pub name: String,
    pub quantity: u32,
    pub addons: Vec<String>,
    pub note: Option<String>,
}

impl PrintJob {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_no: order.order_no.clone(),
            store_id: order.store_id.clone(),
            kind: order.kind,
            table_no: order.table_no.clone(),
            lines: order
                .items
                .iter()
                .map(|item| PrintLine {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    addons: item
                        .addons
                        .iter()
                        .map(|a| format!("+ {} x{}", a.name, a.quantity))
                        .collect(),
                    note: item.note.clone(),
                })
                .collect(),
            note: order.note.clone(),
            placed_at: order.created_at,
        }
    }
}

/// Capability interface: one backend renders one job into printable text.
#[enum_dispatch]
pub trait TicketRenderer {
    fn render(&self, job: &PrintJob) -> String;
}

/// Renderer dispatch enum, selected by configuration.
#[enum_dispatch(TicketRenderer)]
#[derive(Debug, Clone)]
pub enum RendererBackend {
    Epson(EpsonRenderer),
    Star(StarRenderer),
}

impl RendererBackend {
    /// `PRINTER_BACKEND` config value → backend. Unknown names fall back to
    /// Epson, the most common deployment.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "star" => RendererBackend::Star(StarRenderer),
            _ => RendererBackend::Epson(EpsonRenderer),
        }
    }
}

fn kind_label(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::DineIn => "DINE-IN",
        OrderKind::Takeout => "TAKEOUT",
        OrderKind::Delivery => "DELIVERY",
        OrderKind::External => "EXTERNAL",
    }
}

fn render_with_width(job: &PrintJob, width: usize) -> String {
    let rule = "-".repeat(width);
    let mut out = String::new();

    out.push_str(&center(&format!("ORDER {}", job.order_no), width));
    out.push('\n');
    out.push_str(&center(kind_label(job.kind), width));
    out.push('\n');
    if let Some(table) = &job.table_no {
        out.push_str(&center(&format!("TABLE {}", table), width));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');

    for line in &job.lines {
        out.push_str(&format!("{:>2}x {}\n", line.quantity, line.name));
        for addon in &line.addons {
            out.push_str(&format!("    {}\n", addon));
        }
        if let Some(note) = &line.note {
            out.push_str(&format!("    * {}\n", note));
        }
    }

    if let Some(note) = &job.note {
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("NOTE: {}\n", note));
    }

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&center(
        &job.placed_at.format("%Y-%m-%d %H:%M").to_string(),
        width,
    ));
    out.push('\n');
    out
}

fn center(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let pad = (width - text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// 58mm 纸宽，32 列
#[derive(Debug, Clone, Default)]
pub struct EpsonRenderer;

impl TicketRenderer for EpsonRenderer {
    fn render(&self, job: &PrintJob) -> String {
        render_with_width(job, 32)
    }
}

/// 80mm 纸宽，48 列
#[derive(Debug, Clone, Default)]
pub struct StarRenderer;

impl TicketRenderer for StarRenderer {
    fn render(&self, job: &PrintJob) -> String {
        render_with_width(job, 48)
    }
}
