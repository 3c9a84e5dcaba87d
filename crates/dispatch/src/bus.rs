//! Notification bus trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::AggregateId;
use domain::{JobId, VehicleId, WarehouseId};
use fleet::RouteKind;

/// Notifications published to downstream consumers (billing, tracking,
/// external queues).
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchNotice {
    /// A vehicle job was created for a warehouse and date.
    JobCreated {
        job_id: JobId,
        warehouse_id: WarehouseId,
        vehicle_id: VehicleId,
        kind: RouteKind,
        date: NaiveDate,
    },

    /// A new nightly transfer job was opened for a connection.
    TransferJobCreated {
        job_id: JobId,
        connection: String,
        date: NaiveDate,
    },

    /// A parcel lifecycle event was recorded.
    ParcelLifecycle {
        parcel_id: AggregateId,
        event_type: &'static str,
    },
}

/// Fire-and-forget publication of dispatch notices.
///
/// Delivery is at-least-once and failures must not break the publishing
/// unit of work; implementations swallow and log their own errors.
#[async_trait]
pub trait NoticeBus: Send + Sync {
    /// Publishes a notice.
    async fn publish(&self, notice: DispatchNotice);
}

/// In-memory bus that records everything published, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNoticeBus {
    notices: Arc<RwLock<Vec<DispatchNotice>>>,
}

impl InMemoryNoticeBus {
    /// Creates a new empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything published so far.
    pub fn notices(&self) -> Vec<DispatchNotice> {
        self.notices.read().unwrap().clone()
    }

    /// Counts published parcel lifecycle notices of one event type.
    pub fn lifecycle_count(&self, event_type: &str) -> usize {
        self.notices
            .read()
            .unwrap()
            .iter()
            .filter(|n| {
                matches!(n, DispatchNotice::ParcelLifecycle { event_type: e, .. } if *e == event_type)
            })
            .count()
    }
}

#[async_trait]
impl NoticeBus for InMemoryNoticeBus {
    async fn publish(&self, notice: DispatchNotice) {
        self.notices.write().unwrap().push(notice);
    }
}
