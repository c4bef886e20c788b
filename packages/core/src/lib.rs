// ABOUTME: Core types and utilities shared across Taskhive packages
// ABOUTME: Id generation, priority levels, and calendar-date helpers

pub mod ids;
pub mod priority;

pub use ids::entity_id;
pub use priority::Priority;

use chrono::NaiveDate;

/// Today's calendar date in the server's local time zone.
///
/// Deadline validation and overdue checks both compare against this, so the
/// boundary (today is valid, yesterday is not) is decided in one place.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
