use std::collections::HashMap;

use serde::Serialize;

use paperscout_config::Ranking;

use crate::{
	evaluate::RubricScore,
	matcher::CandidateScore,
	select::{cmp_f32_desc, tie_break},
};

/// The inputs a final score was computed from, kept for explainability.
#[derive(Debug, Clone, Serialize)]
pub struct RankComponents {
	pub initial_score: f32,
	pub rubric: Option<RubricScore>,
	pub review_signal: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
	pub paper_id: String,
	pub final_score: f32,
	pub rank: u32,
	pub components: RankComponents,
}

pub struct AggregateArgs<'a> {
	pub cfg: &'a Ranking,
	pub skip_llm_evaluation: bool,
	pub candidates: &'a [CandidateScore],
	pub rubric: &'a HashMap<String, RubricScore>,
	pub review_signal: &'a HashMap<String, f32>,
	pub review_avg: &'a HashMap<String, f32>,
}

/// Combines rubric dimensions, the retrieval-stage score, and the corpus
/// review signal into one final ordering. The rubric part is a convex
/// combination under the configured weights; optional blends are renormalized
/// over whichever components are present. Idempotent over fixed inputs.
pub fn aggregate(args: AggregateArgs<'_>) -> Vec<RankedResult> {
	let AggregateArgs { cfg, skip_llm_evaluation, candidates, rubric, review_signal, review_avg } =
		args;
	let mut out: Vec<RankedResult> = candidates
		.iter()
		.map(|candidate| {
			let rubric = rubric.get(&candidate.paper_id).cloned();
			let review_signal = review_signal.get(&candidate.paper_id).copied();
			let components =
				RankComponents { initial_score: candidate.initial_score, rubric, review_signal };
			let final_score = final_score(cfg, skip_llm_evaluation, &components);

			RankedResult { paper_id: candidate.paper_id.clone(), final_score, rank: 0, components }
		})
		.collect();

	out.sort_by(|left, right| {
		cmp_f32_desc(left.final_score, right.final_score).then_with(|| {
			tie_break(
				(left.paper_id.as_str(), left.components.initial_score),
				(right.paper_id.as_str(), right.components.initial_score),
				review_avg,
			)
		})
	});

	for (idx, result) in out.iter_mut().enumerate() {
		result.rank = idx as u32 + 1;
	}

	out
}

fn final_score(cfg: &Ranking, skip_llm_evaluation: bool, components: &RankComponents) -> f32 {
	let mut parts: Vec<(f32, f32)> = Vec::with_capacity(3);

	if !skip_llm_evaluation && let Some(rubric) = components.rubric.as_ref() {
		parts.push((1.0, rubric_combination(cfg, rubric)));
	}
	if cfg.initial_blend > 0.0 {
		parts.push((cfg.initial_blend, components.initial_score));
	}
	if cfg.review_blend > 0.0 && let Some(signal) = components.review_signal {
		parts.push((cfg.review_blend, signal));
	}
	// Fast mode with no blends configured falls back to the retrieval score.
	if parts.is_empty() {
		parts.push((1.0, components.initial_score));
	}

	let total: f32 = parts.iter().map(|(weight, _)| weight).sum();

	parts.iter().map(|(weight, value)| weight * value).sum::<f32>() / total
}

fn rubric_combination(cfg: &Ranking, rubric: &RubricScore) -> f32 {
	cfg.weight_relevance * rubric.relevance
		+ cfg.weight_novelty * rubric.novelty
		+ cfg.weight_impact * rubric.impact
		+ cfg.weight_practicality * rubric.practicality
}
