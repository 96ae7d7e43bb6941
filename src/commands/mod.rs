pub mod calendars;
pub mod config;
pub mod decisions;
pub mod events;
pub mod new;
pub mod upcoming;
