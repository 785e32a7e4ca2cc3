//! Background processing - scheduled feed ingestion.

mod rss;
mod scheduler;

pub use rss::start_feed_scheduler;
pub use scheduler::{Scheduler, SchedulerConfig};
