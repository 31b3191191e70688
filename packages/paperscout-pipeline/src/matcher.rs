use serde::Serialize;

use paperscout_domain::{KeywordGroup, PaperRecord, match_paper};

/// Retrieval-stage score for one paper. Zero-match papers are kept at 0 rather
/// than dropped, so downstream stages can still promote them on corpus signal.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
	pub paper_id: String,
	pub initial_score: f32,
	pub matched_terms: Vec<String>,
}

/// Scores the whole corpus slice against the expanded term set. Pure CPU work
/// over read-only input; one outcome per paper, in corpus order.
pub fn score_corpus(groups: &[KeywordGroup], papers: &[PaperRecord]) -> Vec<CandidateScore> {
	papers
		.iter()
		.map(|paper| {
			let outcome = match_paper(groups, paper);

			CandidateScore {
				paper_id: paper.id.clone(),
				initial_score: outcome.initial_score(),
				matched_terms: outcome.matched_terms,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn paper(id: &str, title: &str) -> PaperRecord {
		PaperRecord {
			id: id.to_string(),
			title: title.to_string(),
			authors: Vec::new(),
			abstract_text: String::new(),
			keywords: Vec::new(),
			venue: "neurips".to_string(),
			year: 2024,
			decision: None,
			presentation_type: None,
			reviews: Vec::new(),
			meta_review_text: None,
			pdf_url: None,
			forum_url: None,
		}
	}

	#[test]
	fn every_paper_gets_a_score() {
		let groups = vec![KeywordGroup::bare("diffusion".to_string())];
		let papers = vec![paper("a", "Diffusion models"), paper("b", "Optimal transport")];
		let scores = score_corpus(&groups, &papers);

		assert_eq!(scores.len(), 2);
		assert!((scores[0].initial_score - 1.0).abs() < f32::EPSILON);
		assert_eq!(scores[1].initial_score, 0.0);
		assert_eq!(scores[1].matched_terms.len(), 0);
	}
}
