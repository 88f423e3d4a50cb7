//! 自适应网页检索：静态分析 → 交互式会话（井字棋自动化）

#[cfg(feature = "browser")]
pub mod chrome;
pub mod escalator;
pub mod interactive;
pub mod page;
pub mod solver;
pub mod static_analyzer;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "browser")]
pub use chrome::ChromePageDriver;
pub use escalator::RetrievalEscalator;
pub use interactive::{InteractiveConfig, InteractiveSession, SessionOutcome, SessionState};
pub use page::{extract_domain, HttpPageFetcher, LiveSession, PageDriver, PageFetcher, UnavailableDriver};
pub use solver::{best_move, Board, Cell, Mark};
pub use static_analyzer::{is_valid_answer, AnswerCandidate, Stage, StaticAnalyzer, NOT_FOUND_SENTINEL};
