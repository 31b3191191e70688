use std::{collections::HashMap, fmt::Write};

use paperscout_domain::PaperRecord;
use paperscout_pipeline::RunOutcome;

/// Renders the top of the final ranking as markdown. Presentation glue only;
/// every number comes straight from the run outcome.
pub fn render_markdown(outcome: &RunOutcome, top_n: usize) -> String {
	let papers: HashMap<&str, &PaperRecord> =
		outcome.papers.iter().map(|paper| (paper.id.as_str(), paper)).collect();
	let matched: HashMap<&str, &[String]> = outcome
		.candidates
		.iter()
		.map(|candidate| (candidate.paper_id.as_str(), candidate.matched_terms.as_slice()))
		.collect();
	let mut out = String::new();
	let _ = writeln!(out, "# Paper ranking: {} {}", outcome.venue, outcome.year);
	let _ = writeln!(out);

	if let Some(description) = outcome.query.raw_description.as_deref() {
		let _ = writeln!(out, "Interest: {description}");
	}

	let _ = writeln!(out, "Keywords: {}", outcome.keywords.join(", "));
	let _ = writeln!(
		out,
		"Corpus: {} papers, {} candidates ranked, {} degraded.",
		outcome.papers.len(),
		outcome.ranked.len(),
		outcome.degraded
	);
	let _ = writeln!(out);

	for result in outcome.ranked.iter().take(top_n) {
		let title = papers
			.get(result.paper_id.as_str())
			.map(|paper| paper.title.as_str())
			.unwrap_or(result.paper_id.as_str());
		let _ = writeln!(out, "## {}. {title} ({:.4})", result.rank, result.final_score);
		let _ = writeln!(out, "- initial score: {:.4}", result.components.initial_score);

		if let Some(signal) = result.components.review_signal {
			let _ = writeln!(out, "- review signal: {signal:.4}");
		}
		if let Some(terms) = matched.get(result.paper_id.as_str())
			&& !terms.is_empty()
		{
			let _ = writeln!(out, "- matched terms: {}", terms.join(", "));
		}
		if let Some(rubric) = result.components.rubric.as_ref() {
			let _ = writeln!(
				out,
				"- rubric: relevance {:.2}, novelty {:.2}, impact {:.2}, practicality {:.2}{}",
				rubric.relevance,
				rubric.novelty,
				rubric.impact,
				rubric.practicality,
				if rubric.schema_valid { "" } else { " (degraded)" },
			);

			if !rubric.rationale.is_empty() {
				let _ = writeln!(out, "- rationale: {}", rubric.rationale);
			}
			if let Some(summary) = rubric.review_summary.as_deref() {
				let _ = writeln!(out, "- reviews: {summary}");
			}
		}
		if let Some(paper) = papers.get(result.paper_id.as_str()) {
			if let Some(decision) = paper.decision.as_deref() {
				let _ = writeln!(out, "- decision: {decision}");
			}
			if let Some(url) = paper.forum_url.as_deref().or(paper.pdf_url.as_deref()) {
				let _ = writeln!(out, "- link: {url}");
			}
		}

		let _ = writeln!(out);
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	use paperscout_domain::Query;
	use paperscout_pipeline::{CandidateScore, RankComponents, RankedResult, RunState};
	use paperscout_testkit::PaperBuilder;
	use uuid::Uuid;

	fn outcome() -> RunOutcome {
		let papers = vec![
			PaperBuilder::new("a", "Molecular graph synthesis")
				.decision("Accept (poster)")
				.build(),
			PaperBuilder::new("b", "Unrelated work").build(),
		];

		RunOutcome {
			run_id: Uuid::new_v4(),
			state: RunState::Done,
			venue: "neurips".to_string(),
			year: 2024,
			query: Query::new(vec!["graph generation".to_string()], None).expect("query"),
			keywords: vec!["graph generation".to_string()],
			groups: Vec::new(),
			papers,
			candidates: vec![CandidateScore {
				paper_id: "a".to_string(),
				initial_score: 1.0,
				matched_terms: vec!["graph generation".to_string()],
			}],
			rubric_scores: Vec::new(),
			ranked: vec![RankedResult {
				paper_id: "a".to_string(),
				final_score: 0.87625,
				rank: 1,
				components: RankComponents {
					initial_score: 1.0,
					rubric: None,
					review_signal: None,
				},
			}],
			degraded: 0,
		}
	}

	#[test]
	fn report_lists_ranked_titles_with_scores() {
		let rendered = render_markdown(&outcome(), 20);

		assert!(rendered.contains("# Paper ranking: neurips 2024"));
		assert!(rendered.contains("## 1. Molecular graph synthesis (0.8762"));
		assert!(rendered.contains("matched terms: graph generation"));
		assert!(rendered.contains("decision: Accept (poster)"));
	}

	#[test]
	fn report_truncates_to_the_requested_depth() {
		let mut full = outcome();

		full.ranked.push(RankedResult {
			paper_id: "b".to_string(),
			final_score: 0.1,
			rank: 2,
			components: RankComponents { initial_score: 0.0, rubric: None, review_signal: None },
		});

		let rendered = render_markdown(&full, 1);

		assert!(!rendered.contains("Unrelated work"));
	}
}
