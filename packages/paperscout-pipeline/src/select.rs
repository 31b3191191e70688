use std::{cmp::Ordering, collections::HashMap};

use paperscout_config::Selection;

use crate::matcher::CandidateScore;

/// Descending float order with NaN sorted last.
pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// The documented tie-break chain: initial score descending, corpus review
/// average descending (signal-free papers last), paper id ascending. Both the
/// selector and the aggregator break ties through this one function.
pub fn tie_break(
	left: (&str, f32),
	right: (&str, f32),
	review_avg: &HashMap<String, f32>,
) -> Ordering {
	cmp_f32_desc(left.1, right.1)
		.then_with(|| {
			let lhs = review_avg.get(left.0).copied().unwrap_or(f32::NEG_INFINITY);
			let rhs = review_avg.get(right.0).copied().unwrap_or(f32::NEG_INFINITY);

			cmp_f32_desc(lhs, rhs)
		})
		.then_with(|| left.0.cmp(right.0))
}

/// Orders candidates and truncates to the working set. A small or zero-match
/// set is valid output; papers below `min_relevance_score` are filtered out
/// before truncation.
pub fn select_candidates(
	mut candidates: Vec<CandidateScore>,
	review_avg: &HashMap<String, f32>,
	cfg: &Selection,
) -> Vec<CandidateScore> {
	candidates.retain(|candidate| candidate.initial_score >= cfg.min_relevance_score);
	candidates.sort_by(|left, right| {
		tie_break(
			(left.paper_id.as_str(), left.initial_score),
			(right.paper_id.as_str(), right.initial_score),
			review_avg,
		)
	});
	candidates.truncate(cfg.top_k as usize);

	candidates
}

#[cfg(test)]
mod tests {
	use super::*;

	fn candidate(id: &str, score: f32) -> CandidateScore {
		CandidateScore { paper_id: id.to_string(), initial_score: score, matched_terms: Vec::new() }
	}

	fn ids(candidates: &[CandidateScore]) -> Vec<&str> {
		candidates.iter().map(|candidate| candidate.paper_id.as_str()).collect()
	}

	#[test]
	fn orders_by_score_then_review_then_id() {
		let review_avg = HashMap::from([("b".to_string(), 7.0), ("c".to_string(), 5.0)]);
		let candidates =
			vec![candidate("a", 0.5), candidate("c", 0.8), candidate("b", 0.8), candidate("d", 0.8)];
		let cfg = Selection { top_k: 10, min_relevance_score: 0.0 };
		let selected = select_candidates(candidates, &review_avg, &cfg);

		// Equal scores: b beats c on review average, d has no reviews and sorts
		// after both, a trails on score alone.
		assert_eq!(ids(&selected), vec!["b", "c", "d", "a"]);
	}

	#[test]
	fn truncates_to_top_k() {
		let candidates = vec![candidate("a", 0.9), candidate("b", 0.8), candidate("c", 0.7)];
		let cfg = Selection { top_k: 2, min_relevance_score: 0.0 };
		let selected = select_candidates(candidates, &HashMap::new(), &cfg);

		assert_eq!(ids(&selected), vec!["a", "b"]);
	}

	#[test]
	fn zero_scores_survive_the_default_threshold() {
		let candidates = vec![candidate("a", 0.0)];
		let cfg = Selection::default();
		let selected = select_candidates(candidates, &HashMap::new(), &cfg);

		assert_eq!(selected.len(), 1);
	}

	#[test]
	fn threshold_filters_before_truncation() {
		let candidates = vec![candidate("a", 0.9), candidate("b", 0.1), candidate("c", 0.5)];
		let cfg = Selection { top_k: 2, min_relevance_score: 0.3 };
		let selected = select_candidates(candidates, &HashMap::new(), &cfg);

		assert_eq!(ids(&selected), vec!["a", "c"]);
	}

	#[test]
	fn reselection_is_idempotent() {
		let candidates = vec![candidate("b", 0.8), candidate("a", 0.8), candidate("c", 0.2)];
		let cfg = Selection { top_k: 10, min_relevance_score: 0.0 };
		let first = select_candidates(candidates, &HashMap::new(), &cfg);
		let second = select_candidates(first.clone(), &HashMap::new(), &cfg);

		assert_eq!(ids(&first), ids(&second));
	}
}
