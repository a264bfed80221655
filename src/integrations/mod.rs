use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Booking, HostPayout, Refund, RefundTicket};
use crate::error::Result;

pub mod webhook;

/// Domain events the core emits. Delivery (mail, push, whatever) is an
/// external system's job; the core only fans the event out to registered
/// notifiers.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    BookingConfirmed(Booking),
    BookingCancelled(Booking),
    BookingExpired(Booking),
    RefundApproved(RefundTicket),
    RefundExecuted(Refund),
    PayoutPaid(HostPayout),
    PayoutFailed(HostPayout),
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::BookingConfirmed(_) => "booking.confirmed",
            DomainEvent::BookingCancelled(_) => "booking.cancelled",
            DomainEvent::BookingExpired(_) => "booking.expired",
            DomainEvent::RefundApproved(_) => "refund.approved",
            DomainEvent::RefundExecuted(_) => "refund.executed",
            DomainEvent::PayoutPaid(_) => "payout.paid",
            DomainEvent::PayoutFailed(_) => "payout.failed",
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    async fn health_check(&self) -> Result<()>;
    async fn handle_event(&self, event: &DomainEvent) -> Result<()>;
}

pub struct NotifierManager {
    notifiers: RwLock<Vec<Arc<dyn Notifier>>>,
}

impl NotifierManager {
    pub fn new() -> Self {
        Self {
            notifiers: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, notifier: Arc<dyn Notifier>) {
        if notifier.is_enabled() {
            let mut notifiers = self.notifiers.write().await;
            tracing::info!("Registered notifier: {}", notifier.name());
            notifiers.push(notifier);
        }
    }

    pub async fn dispatch(&self, event: DomainEvent) {
        let notifiers = self.notifiers.read().await;

        for notifier in notifiers.iter() {
            if !notifier.is_enabled() {
                continue;
            }

            match notifier.handle_event(&event).await {
                Ok(_) => {
                    tracing::debug!(
                        "Notifier {} handled {} successfully",
                        notifier.name(),
                        event.name()
                    );
                }
                Err(e) => {
                    // One failing notifier never blocks the others, and
                    // never fails the originating operation.
                    tracing::error!(
                        "Notifier {} failed to handle {}: {:?}",
                        notifier.name(),
                        event.name(),
                        e
                    );
                }
            }
        }
    }

    pub async fn health_check_all(&self) -> Vec<(String, Result<()>)> {
        let notifiers = self.notifiers.read().await;
        let mut results = Vec::new();

        for notifier in notifiers.iter() {
            let name = notifier.name().to_string();
            let result = notifier.health_check().await;
            results.push((name, result));
        }

        results
    }
}

impl Default for NotifierManager {
    fn default() -> Self {
        Self::new()
    }
}
