//! Parking charge calculation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Tariff applied by the booking and gate services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    /// Balance a user must hold to open a booking
    pub reserve_minimum: i64,
    /// Points per started hour
    pub hourly_rate: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            reserve_minimum: 300,
            hourly_rate: 100,
        }
    }
}

/// Amount owed for one stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingCharge {
    pub billed_hours: i64,
    pub amount: i64,
}

impl PricingPolicy {
    /// Started hours between `start` and `end`, never less than one. A clock
    /// that ran backwards still bills the minimum.
    pub fn billed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        let millis = (end - start).num_milliseconds();
        if millis <= 0 {
            return 1;
        }
        ((millis + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR).max(1)
    }

    pub fn charge_for(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ParkingCharge {
        let billed_hours = Self::billed_hours(start, end);
        ParkingCharge {
            billed_hours,
            amount: billed_hours.saturating_mul(self.hourly_rate),
        }
    }
}
