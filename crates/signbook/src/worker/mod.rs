pub mod job;
pub mod scanner;
pub mod scheduler;
pub mod task;

pub use job::{Job, JobResult};
pub use scanner::DirectoryScanner;
pub use scheduler::{CycleOutcome, IntervalScheduler};
pub use task::{CycleReport, IngestTask, ScheduledTask};
