//! Notification bus
//!
//! Fire-and-forget broadcast of domain events. Delivery (email, push, ...)
//! is a downstream subscriber's concern; emission never blocks or fails the
//! primary operation.

use dashmap::DashMap;
use serde::Serialize;
use shared::models::{Order, OrderStatus, Payment};
use shared::util::now_millis;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Domain events pushed to delivery collaborators
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    OrderPlaced {
        order_id: i64,
        order_code: String,
        buyer_id: i64,
        seller_id: i64,
        total_amount: f64,
    },
    OrderStatusChanged {
        order_id: i64,
        order_code: String,
        previous_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCancelled {
        order_id: i64,
        order_code: String,
        buyer_id: i64,
        seller_id: i64,
    },
    PaymentSucceeded {
        order_id: i64,
        order_code: String,
        payment_id: i64,
        amount: f64,
    },
    PaymentFailed {
        order_id: i64,
        order_code: String,
        payment_id: i64,
        message: Option<String>,
    },
}

impl MarketEvent {
    /// Category key for per-category sequencing
    fn category(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "order_placed",
            Self::OrderStatusChanged { .. } => "order_status",
            Self::OrderCancelled { .. } => "order_cancelled",
            Self::PaymentSucceeded { .. } | Self::PaymentFailed { .. } => "payment",
        }
    }
}

/// One emitted notification
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Monotonic per-category sequence, so subscribers can spot gaps
    pub sequence: u64,
    pub emitted_at: i64,
    pub event: MarketEvent,
}

/// Fire-and-forget notifier
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
    sequences: Arc<DashMap<&'static str, u64>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tx,
            sequences: Arc::new(DashMap::new()),
        }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    fn emit(&self, event: MarketEvent) {
        let sequence = {
            let mut entry = self.sequences.entry(event.category()).or_insert(0);
            *entry += 1;
            *entry
        };
        let notification = Notification {
            sequence,
            emitted_at: now_millis(),
            event,
        };
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification dropped: no active receivers");
        }
    }

    pub fn notify_order_placed(&self, order: &Order) {
        self.emit(MarketEvent::OrderPlaced {
            order_id: order.id,
            order_code: order.code.clone(),
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            total_amount: order.total_amount,
        });
    }

    pub fn notify_status_changed(&self, order: &Order, previous_status: OrderStatus) {
        self.emit(MarketEvent::OrderStatusChanged {
            order_id: order.id,
            order_code: order.code.clone(),
            previous_status,
            new_status: order.status,
        });
    }

    pub fn notify_cancelled(&self, order: &Order) {
        self.emit(MarketEvent::OrderCancelled {
            order_id: order.id,
            order_code: order.code.clone(),
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
        });
    }

    pub fn notify_payment_succeeded(&self, order: &Order, payment: &Payment) {
        self.emit(MarketEvent::PaymentSucceeded {
            order_id: order.id,
            order_code: order.code.clone(),
            payment_id: payment.id,
            amount: payment.amount,
        });
    }

    pub fn notify_payment_failed(&self, order: &Order, payment: &Payment) {
        self.emit(MarketEvent::PaymentFailed {
            order_id: order.id,
            order_code: order.code.clone(),
            payment_id: payment.id,
            message: payment.gateway_message.clone(),
        });
    }
}
