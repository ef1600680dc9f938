//! Status reports returned by the generation service.

use serde_json::Value;

/// Classified progress of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobProgress {
    /// The job finished successfully.
    Succeeded,
    /// The job reached a terminal failure status.
    Failed {
        /// Reported status code.
        status: i64,
    },
    /// The job is still running, or reported something unrecognised.
    Running,
}

/// One status reply: the numeric indicators plus the raw data object used
/// for output extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    status: Option<i64>,
    success_flag: Option<i64>,
    data: Value,
}

impl StatusReport {
    /// Builds a report from the `data` object of a status reply.
    ///
    /// Missing or non-integer indicators are treated as absent.
    #[must_use]
    pub fn from_data(data: Value) -> Self {
        let status = data.get("status").and_then(Value::as_i64);
        let success_flag = data.get("successFlag").and_then(Value::as_i64);
        Self {
            status,
            success_flag,
            data,
        }
    }

    /// Returns the reported status code.
    #[must_use]
    pub const fn status(&self) -> Option<i64> {
        self.status
    }

    /// Returns the reported success flag.
    #[must_use]
    pub const fn success_flag(&self) -> Option<i64> {
        self.success_flag
    }

    /// Returns the raw data object.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Classifies the report.
    ///
    /// Success wins when either indicator says so; statuses 2 and 3 are
    /// terminal failures; everything else means keep polling.
    #[must_use]
    pub const fn progress(&self) -> JobProgress {
        if matches!(self.status, Some(1)) || matches!(self.success_flag, Some(1)) {
            return JobProgress::Succeeded;
        }
        match self.status {
            Some(status @ (2 | 3)) => JobProgress::Failed { status },
            _ => JobProgress::Running,
        }
    }
}
