use crate::paper::{PaperRecord, decision_strength};

const SCORE_WEIGHT: f32 = 0.7;
const DECISION_WEIGHT: f32 = 0.3;

/// The numeric scale a venue's review scores live on. Venues expose different
/// score fields with different ranges; the tag on the record's venue selects
/// the strategy that normalizes them onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewScale {
	/// `rating`-style venues (NeurIPS, ICLR): 0-10.
	Rating10,
	/// `overall_recommendation`-style venues (ICML): 0-4.
	Recommendation4,
}

impl ReviewScale {
	pub fn for_venue(venue: &str) -> Self {
		let venue = venue.to_lowercase();

		if venue.contains("icml") { Self::Recommendation4 } else { Self::Rating10 }
	}

	pub fn max_score(self) -> f32 {
		match self {
			Self::Rating10 => 10.0,
			Self::Recommendation4 => 4.0,
		}
	}

	pub fn normalize(self, score: f32) -> f32 {
		(score / self.max_score()).clamp(0.0, 1.0)
	}
}

/// Mean raw review score, if the record carries any scored reviews.
pub fn review_score_avg(paper: &PaperRecord) -> Option<f32> {
	let scores: Vec<f32> = paper.reviews.iter().filter_map(|review| review.score).collect();

	if scores.is_empty() {
		return None;
	}

	Some(scores.iter().sum::<f32>() / scores.len() as f32)
}

/// Normalized corpus review signal in [0, 1], or None when the record carries
/// no scored reviews. The score average carries most of the weight; the
/// acceptance tier (oral/spotlight > accept > unknown > reject) contributes the
/// rest, so an oral outranks an identically-scored poster. Never errors: a
/// schema-violating record is just signal-free.
pub fn extract_review_signal(paper: &PaperRecord) -> Option<f32> {
	let avg = review_score_avg(paper)?;
	let scale = ReviewScale::for_venue(&paper.venue);
	let decision =
		decision_strength(paper.decision.as_deref(), paper.presentation_type.as_deref());

	Some(SCORE_WEIGHT * scale.normalize(avg) + DECISION_WEIGHT * decision)
}
