// src/config/schedule.rs

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use croner::Cron;

use crate::errors::{CronsyncError, Result};

/// A parsed cron expression.
///
/// Accepts the classic 5-field form (`min hour dom month dow`) as well as a
/// 6-field form with a leading seconds column. Fire times are computed in the
/// local timezone.
#[derive(Clone)]
pub struct CronSchedule {
    expr: String,
    cron: Arc<Cron>,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(CronsyncError::CronError {
                expr: expr.to_string(),
                reason: "expression is empty".to_string(),
            });
        }

        let cron = Cron::new(expr)
            .with_seconds_optional()
            .parse()
            .map_err(|e| CronsyncError::CronError {
                expr: expr.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            expr: expr.to_string(),
            cron: Arc::new(cron),
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First fire time strictly after `after`, if the expression can ever
    /// fire again.
    pub fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.cron.find_next_occurrence(after, false).ok()
    }

    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.next_after(&Local::now())
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expr).finish()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}
