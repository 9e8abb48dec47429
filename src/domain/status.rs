use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle state of an order. A `Pending` order is the user's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Position along the forward path. `Cancelled` sits off the path.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::Completed => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The timestamp column stamped the first time an order reaches this state.
    pub fn stamp(&self) -> Option<StatusStamp> {
        match self {
            OrderStatus::Confirmed => Some(StatusStamp::ConfirmedAt),
            OrderStatus::Preparing => Some(StatusStamp::PreparingAt),
            OrderStatus::Ready => Some(StatusStamp::ReadyAt),
            OrderStatus::Completed => Some(StatusStamp::CompletedAt),
            OrderStatus::Pending | OrderStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Statuses a staff member may advance an order to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceTarget {
    Confirmed,
    Preparing,
    Ready,
    Completed,
}

impl AdvanceTarget {
    pub fn status(&self) -> OrderStatus {
        match self {
            AdvanceTarget::Confirmed => OrderStatus::Confirmed,
            AdvanceTarget::Preparing => OrderStatus::Preparing,
            AdvanceTarget::Ready => OrderStatus::Ready,
            AdvanceTarget::Completed => OrderStatus::Completed,
        }
    }
}

impl FromStr for AdvanceTarget {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(AdvanceTarget::Confirmed),
            "preparing" => Ok(AdvanceTarget::Preparing),
            "ready" => Ok(AdvanceTarget::Ready),
            "completed" => Ok(AdvanceTarget::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStamp {
    ConfirmedAt,
    PreparingAt,
    ReadyAt,
    CompletedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Checkout,
    PaymentSucceeded,
    Advance(AdvanceTarget),
    Cancel,
}

/// Outcome of applying an event to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: OrderStatus,
    /// Timestamp to set if it is still empty. `None` for idempotent re-applies.
    pub stamp: Option<StatusStamp>,
}

impl Transition {
    fn to(next: OrderStatus) -> Self {
        Self {
            next,
            stamp: next.stamp(),
        }
    }

    fn stay(current: OrderStatus) -> Self {
        Self {
            next: current,
            stamp: None,
        }
    }

    pub fn changes_status(&self, current: OrderStatus) -> bool {
        self.next != current
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("order is already {0}")]
    Terminal(OrderStatus),
    #[error("cannot move order from {from} back to {to}")]
    Backward { from: OrderStatus, to: OrderStatus },
    #[error("order must be checked out before it can be {0}")]
    NotCheckedOut(OrderStatus),
    #[error("only pending orders can be checked out (order is {0})")]
    AlreadyCheckedOut(OrderStatus),
    #[error("only pending orders can be cancelled (order is {0})")]
    NotCancellable(OrderStatus),
}

/// Transition table for the order state machine.
pub fn transition(current: OrderStatus, event: OrderEvent) -> Result<Transition, TransitionError> {
    use OrderStatus::*;

    match (current, event) {
        (Pending, OrderEvent::Checkout) => Ok(Transition::to(Confirmed)),
        (_, OrderEvent::Checkout) => Err(TransitionError::AlreadyCheckedOut(current)),

        (Pending, OrderEvent::PaymentSucceeded) => Ok(Transition::to(Confirmed)),
        (Completed | Cancelled, OrderEvent::PaymentSucceeded) => {
            Err(TransitionError::Terminal(current))
        }
        // Duplicate webhook deliveries for an order already moving forward.
        (_, OrderEvent::PaymentSucceeded) => Ok(Transition::stay(current)),

        (Pending, OrderEvent::Cancel) => Ok(Transition::to(Cancelled)),
        (Completed | Cancelled, OrderEvent::Cancel) => Err(TransitionError::Terminal(current)),
        (_, OrderEvent::Cancel) => Err(TransitionError::NotCancellable(current)),

        (_, OrderEvent::Advance(target)) => advance(current, target.status()),
    }
}

fn advance(current: OrderStatus, target: OrderStatus) -> Result<Transition, TransitionError> {
    if current == target {
        return Ok(Transition::stay(current));
    }
    if current.is_terminal() {
        return Err(TransitionError::Terminal(current));
    }
    if current == OrderStatus::Pending && target != OrderStatus::Confirmed {
        return Err(TransitionError::NotCheckedOut(target));
    }
    match (current.rank(), target.rank()) {
        (Some(from), Some(to)) if to > from => Ok(Transition::to(target)),
        _ => Err(TransitionError::Backward {
            from: current,
            to: target,
        }),
    }
}
