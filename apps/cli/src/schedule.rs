//! Daily trigger: cron evaluation and input file resolution.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};
use color_eyre::eyre::{Result, eyre};
use contactsync_shared::ScheduleConfig;
use cron::Schedule;

/// Parse a six-field (seconds-first) cron expression.
pub(crate) fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr).map_err(|e| eyre!("invalid cron expression '{expr}': {e}"))
}

/// First tick strictly after `now`.
pub(crate) fn next_tick(schedule: &Schedule, now: DateTime<Local>) -> Option<DateTime<Local>> {
    schedule.after(&now).next()
}

/// The export for `date`, if it has landed.
pub(crate) fn daily_input(config: &ScheduleConfig, date: NaiveDate) -> Option<PathBuf> {
    let path = config.input_path_for(date);
    path.is_file().then_some(path)
}
