pub mod extractor;
pub mod inputs;
pub mod job;
pub mod report;
pub mod research;
pub mod run_log;
pub mod runner;
pub mod scheduler;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use extractor::{extract, extract_report, ExtractionReport};
pub use job::{JobRun, JobStats, WeeklyJob};
pub use research::{PromptTemplate, ResearchClient, ResearchError, Researcher};
pub use runner::{BatchRun, BatchRunner, RawResearchText};
pub use scheduler::{BatchSelection, RotationScheduler};
