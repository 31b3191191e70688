pub mod matching;
pub mod paper;
pub mod query;
pub mod review_signal;

pub use matching::{KeywordGroup, MatchOutcome, match_paper};
pub use paper::{PaperRecord, Review, decision_strength};
pub use query::{Query, QueryError, detect_language, normalize_term, normalize_terms};
pub use review_signal::{ReviewScale, extract_review_signal, review_score_avg};
