//! Risk parameters and the per-account risk state.

use crate::definitions::{CurrencyId, Money};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of an account's trading permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStateType {
    /// Not yet evaluated.
    None,
    /// Trading normally.
    Active,
    /// Only position-closing orders are permitted; a transition timer to
    /// DISABLED is armed.
    CloseOrders,
    /// All trading disabled.
    Disabled,
}

impl fmt::Display for RiskStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskStateType::None => write!(f, "NONE"),
            RiskStateType::Active => write!(f, "ACTIVE"),
            RiskStateType::CloseOrders => write!(f, "CLOSE_ORDERS"),
            RiskStateType::Disabled => write!(f, "DISABLED"),
        }
    }
}

/// An account's risk state, with the expiry of the CLOSE_ORDERS window
/// when one is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskState {
    /// The state's type.
    pub state_type: RiskStateType,
    /// When a CLOSE_ORDERS state transitions to DISABLED.
    pub expiry: Option<DateTime<Utc>>,
}

impl RiskState {
    /// The unevaluated state.
    pub fn none() -> Self {
        RiskState {
            state_type: RiskStateType::None,
            expiry: None,
        }
    }

    /// The ACTIVE state.
    pub fn active() -> Self {
        RiskState {
            state_type: RiskStateType::Active,
            expiry: None,
        }
    }

    /// A CLOSE_ORDERS state expiring at `expiry`.
    pub fn close_orders(expiry: DateTime<Utc>) -> Self {
        RiskState {
            state_type: RiskStateType::CloseOrders,
            expiry: Some(expiry),
        }
    }

    /// The DISABLED state.
    pub fn disabled() -> Self {
        RiskState {
            state_type: RiskStateType::Disabled,
            expiry: None,
        }
    }
}

impl fmt::Display for RiskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expiry {
            Some(expiry) => write!(f, "{}({expiry})", self.state_type),
            None => write!(f, "{}", self.state_type),
        }
    }
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::seconds(i64::deserialize(deserializer)?))
    }
}

/// The admin-configured risk limits for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// The currency risk is evaluated in.
    pub currency: CurrencyId,
    /// The maximum combined position and open-order notional. Zero means
    /// no limit.
    pub buying_power: Money,
    /// The state the administrator allows the account to be in.
    pub allowed_state: RiskStateType,
    /// The largest tolerated net loss.
    pub net_loss: Money,
    /// The largest tolerated drawdown from the session's peak.
    pub loss_from_top: Money,
    /// How long an account stays in CLOSE_ORDERS before it is DISABLED.
    #[serde(with = "duration_seconds")]
    pub transition_time: Duration,
}

impl RiskParameters {
    /// Parameters that never trip, evaluated in `currency`.
    pub fn unlimited(currency: CurrencyId) -> Self {
        RiskParameters {
            currency,
            buying_power: Money::ZERO,
            allowed_state: RiskStateType::Active,
            net_loss: Money::MAX,
            loss_from_top: Money::MAX,
            transition_time: Duration::seconds(60),
        }
    }
}
