//! Endpoint wrappers, one `impl ApiClient` block per backend resource.

mod auth;
mod board_groups;
mod career;
mod chinba;
mod keywords;
mod notices;
mod timetable;
mod users;

pub use chinba::LoadedEvent;
pub use timetable::TimetableImage;
