//! Imaging order aggregate.
//!
//! Lifecycle `ordered → in_progress → completed`. The server owns the record;
//! the client replays the same transition rules to decide which actions to
//! offer and to reject an action locally before issuing the request.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hmis_core::date::option_timestamp;
use hmis_core::{Aggregate, AggregateRoot, DomainError, Entity, ImagingOrderId};

use crate::report::{ParsedReport, RadiologyReport};

/// Imaging order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Ordered,
    InProgress,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Ordered,
        OrderStatus::InProgress,
        OrderStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Ordered => "ordered",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Ordered => "Ordered",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
        }
    }

    /// Still on the worklist (not yet reported).
    pub fn is_pending(self) -> bool {
        matches!(self, OrderStatus::Ordered | OrderStatus::InProgress)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown order status: {s}")))
    }
}

/// Clinical urgency. Worklists sort `stat` first, then `urgent`, then `routine`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Stat,
    Urgent,
    #[default]
    #[serde(other)]
    Routine,
}

impl Priority {
    /// Sort rank; lower is more urgent. Unrecognized priorities rank as routine.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Stat => 1,
            Priority::Urgent => 2,
            Priority::Routine => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Stat => "stat",
            Priority::Urgent => "urgent",
            Priority::Routine => "routine",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Stat => "STAT",
            Priority::Urgent => "Urgent",
            Priority::Routine => "Routine",
        }
    }
}

/// Imaging service the order was placed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagingService {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub modality: Option<String>,
}

/// Aggregate root: one imaging study as listed on the worklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagingOrder {
    id: ImagingOrderId,
    status: OrderStatus,
    #[serde(default)]
    priority: Priority,
    #[serde(default, rename = "lab_service")]
    service: Option<ImagingService>,
    #[serde(default, with = "option_timestamp")]
    ordered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    result_notes: Option<String>,
    #[serde(default)]
    has_images: bool,
    #[serde(skip)]
    version: u64,
}

impl ImagingOrder {
    /// A freshly placed order, as the worklist first sees it.
    pub fn ordered(id: ImagingOrderId, priority: Priority) -> Self {
        Self {
            id,
            status: OrderStatus::Ordered,
            priority,
            service: None,
            ordered_at: None,
            result_notes: None,
            has_images: false,
            version: 0,
        }
    }

    pub fn with_service(mut self, service: ImagingService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn with_ordered_at(mut self, at: DateTime<Utc>) -> Self {
        self.ordered_at = Some(at);
        self
    }

    pub fn id_typed(&self) -> ImagingOrderId {
        self.id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn service(&self) -> Option<&ImagingService> {
        self.service.as_ref()
    }

    pub fn modality(&self) -> Option<&str> {
        self.service.as_ref().and_then(|s| s.modality.as_deref())
    }

    pub fn ordered_at(&self) -> Option<DateTime<Utc>> {
        self.ordered_at
    }

    pub fn result_notes(&self) -> Option<&str> {
        self.result_notes.as_deref()
    }

    pub fn has_images(&self) -> bool {
        self.has_images
    }

    /// Stored report split into sections (empty when not yet reported).
    pub fn report(&self) -> ParsedReport {
        self.result_notes
            .as_deref()
            .map(RadiologyReport::parse)
            .unwrap_or_default()
    }

    pub fn can_mark_in_progress(&self) -> bool {
        self.status == OrderStatus::Ordered
    }

    pub fn can_upload_images(&self) -> bool {
        self.status.is_pending()
    }

    pub fn can_complete(&self) -> bool {
        self.status.is_pending()
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }
}

impl AggregateRoot for ImagingOrder {
    type Id = ImagingOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for ImagingOrder {
    type Id = ImagingOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: CompleteOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteOrder {
    pub report: RadiologyReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagingOrderCommand {
    MarkInProgress,
    Complete(CompleteOrder),
}

/// Event: OrderCompleted. Carries the composed `result_notes` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub order_id: ImagingOrderId,
    pub result_notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagingOrderEvent {
    MarkedInProgress { order_id: ImagingOrderId },
    Completed(OrderCompleted),
}

impl Aggregate for ImagingOrder {
    type Command = ImagingOrderCommand;
    type Event = ImagingOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ImagingOrderEvent::MarkedInProgress { .. } => {
                self.status = OrderStatus::InProgress;
            }
            ImagingOrderEvent::Completed(e) => {
                self.status = OrderStatus::Completed;
                self.result_notes = Some(e.result_notes.clone());
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ImagingOrderCommand::MarkInProgress => self.handle_mark_in_progress(),
            ImagingOrderCommand::Complete(cmd) => self.handle_complete(cmd),
        }
    }
}

impl ImagingOrder {
    fn handle_mark_in_progress(&self) -> Result<Vec<ImagingOrderEvent>, DomainError> {
        if !self.can_mark_in_progress() {
            return Err(DomainError::invalid_transition(
                self.status.as_str(),
                "start processing",
            ));
        }

        Ok(vec![ImagingOrderEvent::MarkedInProgress { order_id: self.id }])
    }

    fn handle_complete(&self, cmd: &CompleteOrder) -> Result<Vec<ImagingOrderEvent>, DomainError> {
        if !self.can_complete() {
            return Err(DomainError::invalid_transition(self.status.as_str(), "complete"));
        }

        if cmd.report.is_blank() {
            return Err(DomainError::validation(
                "findings or impression is required",
            ));
        }

        Ok(vec![ImagingOrderEvent::Completed(OrderCompleted {
            order_id: self.id,
            result_notes: cmd.report.compose(),
        })])
    }
}
