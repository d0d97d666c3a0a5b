pub mod error;
pub mod progress;
pub mod types;
pub mod url_filter;

pub use error::{AuditError, CrawlErrorKind, PageFailure};
pub use progress::{ProgressEvent, ProgressSender, ProgressStep};
pub use types::{
    AggregateScore, AnalyzerResult, AuditContext, BusinessContext, CategoryScores, CrawledPage,
    DimensionBreakdown, DiscoverySource, Grade, Issue, LeadPriority, LeadTier, ModuleName,
    ModuleOutcome, PageCandidate, PageType, QuickWin, Screenshots, SelectionSet, Severity,
};
