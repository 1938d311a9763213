pub mod html_pbp;
pub mod json_pbp;
pub mod schedule;
pub mod shifts;

pub use html_pbp::HtmlPbpParser;
pub use json_pbp::JsonPbpParser;
pub use schedule::{ScheduleClient, ScheduledGame};
pub use shifts::ShiftParser;
