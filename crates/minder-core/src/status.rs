//! The ticket status value and its canonical string form.
//!
//! Statuses cross three boundaries (REST payloads, feed events, database
//! columns) and every producer spells them a little differently. All inbound
//! strings funnel through [`TicketStatus::parse`]; everything downstream works
//! with the enum.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::error::Error;

/// The lifecycle state of a tracked ticket.
///
/// The canonical wire and storage form is lowercase snake_case
/// (e.g. `in_progress`).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
  Open,
  InProgress,
  Resolved,
  Closed,
  Deleted,
}

impl TicketStatus {
  /// Parse an inbound status string leniently.
  ///
  /// Surrounding whitespace is trimmed, ASCII case is folded, and hyphens are
  /// treated as underscores, so `"In-Progress"` and `" OPEN "` both parse.
  /// Anything else is rejected with [`Error::UnknownStatus`] carrying the
  /// original input.
  pub fn parse(raw: &str) -> Result<Self, Error> {
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    Self::from_str(&normalized)
      .map_err(|_| Error::UnknownStatus(raw.to_owned()))
  }
}
