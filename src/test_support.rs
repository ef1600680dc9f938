//! Shared fixtures for unit tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Clock frozen at 2026-01-15T09:30:00Z.
    pub fn reference() -> Self {
        Self(
            Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0)
                .single()
                .expect("valid reference timestamp"),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
