// Signal detection services: classification, the evaluation cycle, its driver and its report
pub mod classifier;
pub mod report;
pub mod scheduler;
pub mod signal_engine;

pub use classifier::{classify_point, Evaluation, SignalClassifier};
pub use report::{ConsoleReporter, CycleReporter, ReportFormat, StopReason};
pub use scheduler::{CycleState, Scheduler};
pub use signal_engine::{CycleOutcome, SignalEngine};
