use std::{collections::HashMap, fmt::Write, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

use paperscout_config::{Evaluation, GenerationProviderConfig};
use paperscout_domain::PaperRecord;
use paperscout_store::{CacheKind, CacheStore, fingerprint, key_prefix};

use crate::{
	CancelFlag, GenerationProvider, PipelineService, decode::extract_json, matcher::CandidateScore,
};

pub const DEGRADED_RATIONALE: &str = "Rubric evaluation unavailable; degraded fallback score.";

const NEUTRAL_DIMENSION: f32 = 0.5;

/// Structured rubric result for one candidate. Degraded entries are flagged
/// with `schema_valid = false`, never silently mixed with genuine scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricScore {
	pub paper_id: String,
	pub relevance: f32,
	pub novelty: f32,
	pub impact: f32,
	pub practicality: f32,
	pub rationale: String,
	#[serde(default)]
	pub review_summary: Option<String>,
	pub schema_valid: bool,
}

#[derive(Debug, Deserialize)]
struct RubricResponse {
	relevance: f32,
	novelty: f32,
	impact: f32,
	practicality: f32,
	#[serde(default)]
	rationale: String,
	#[serde(default)]
	review_summary: Option<String>,
}

/// Scores every selected candidate through the generation capability, at most
/// `eval_workers` calls in flight. One candidate's failure degrades that
/// candidate only; the batch always completes. Cancellation stops new dispatch
/// and leaves the remaining candidates on their degraded fallback.
pub async fn evaluate_candidates(
	svc: &PipelineService,
	interest: &str,
	candidates: &[CandidateScore],
	papers: &[PaperRecord],
	cancel: &CancelFlag,
) -> Vec<RubricScore> {
	let eval_cfg = &svc.cfg.evaluation;
	let by_id: HashMap<&str, &PaperRecord> =
		papers.iter().map(|paper| (paper.id.as_str(), paper)).collect();
	let semaphore = Arc::new(Semaphore::new(eval_cfg.eval_workers.max(1) as usize));
	let mut scores: Vec<RubricScore> = candidates
		.iter()
		.map(|candidate| degraded_score(&candidate.paper_id, candidate.initial_score))
		.collect();
	let mut set = JoinSet::new();

	for (idx, candidate) in candidates.iter().enumerate() {
		if cancel.is_cancelled() {
			break;
		}

		let Some(paper) = by_id.get(candidate.paper_id.as_str()) else {
			warn!(paper_id = %candidate.paper_id, "Candidate has no corpus record; kept degraded.");

			continue;
		};
		let semaphore = semaphore.clone();
		let generation = svc.providers.generation.clone();
		let gen_cfg = svc.cfg.providers.generation.clone();
		let cache = svc.cache.clone();
		let cache_enabled = svc.cfg.cache.enabled;
		let eval_cfg = eval_cfg.clone();
		let interest = interest.to_string();
		let context = build_context(paper, &eval_cfg);
		let paper_id = candidate.paper_id.clone();
		let initial_score = candidate.initial_score;
		let cancel = cancel.clone();

		set.spawn(async move {
			let _permit = semaphore.acquire_owned().await.expect("semaphore closed");

			if cancel.is_cancelled() {
				return (idx, degraded_score(&paper_id, initial_score));
			}

			let score = evaluate_one(EvaluateOneArgs {
				generation,
				gen_cfg: &gen_cfg,
				cache,
				cache_enabled,
				eval_cfg: &eval_cfg,
				interest: &interest,
				context: &context,
				paper_id: &paper_id,
				initial_score,
			})
			.await;

			(idx, score)
		});
	}

	while let Some(joined) = set.join_next().await {
		match joined {
			Ok((idx, score)) => scores[idx] = score,
			Err(err) => warn!(error = %err, "Evaluation task failed; candidate kept degraded."),
		}
	}

	scores
}

struct EvaluateOneArgs<'a> {
	generation: Arc<dyn GenerationProvider>,
	gen_cfg: &'a GenerationProviderConfig,
	cache: Arc<dyn CacheStore>,
	cache_enabled: bool,
	eval_cfg: &'a Evaluation,
	interest: &'a str,
	context: &'a str,
	paper_id: &'a str,
	initial_score: f32,
}

async fn evaluate_one(args: EvaluateOneArgs<'_>) -> RubricScore {
	let EvaluateOneArgs {
		generation,
		gen_cfg,
		cache,
		cache_enabled,
		eval_cfg,
		interest,
		context,
		paper_id,
		initial_score,
	} = args;
	let key = fingerprint(CacheKind::Rubric, &[paper_id, &gen_cfg.model, interest, context]);

	if cache_enabled {
		match cache.get(CacheKind::Rubric, &key) {
			Ok(Some(payload)) => match serde_json::from_value::<RubricScore>(payload) {
				Ok(score) if score.paper_id == paper_id => {
					debug!(paper_id, cache_key_prefix = key_prefix(&key), "Rubric cache hit.");

					return score;
				},
				Ok(_) => warn!(paper_id, "Rubric cache entry names another paper; ignored."),
				Err(err) => warn!(error = %err, paper_id, "Rubric cache payload decode failed."),
			},
			Ok(None) => {},
			Err(err) => warn!(error = %err, paper_id, "Rubric cache read failed."),
		}
	}

	let messages = build_rubric_messages(interest, context);
	let attempts = 1 + eval_cfg.max_retries;

	for attempt in 1..=attempts {
		let raw = match generation.generate(gen_cfg, &messages).await {
			Ok(raw) => raw,
			Err(err) => {
				warn!(error = %err, paper_id, attempt, "Rubric call failed.");

				continue;
			},
		};

		match parse_rubric(&raw, paper_id) {
			Some(score) => {
				if cache_enabled {
					match serde_json::to_value(&score) {
						Ok(payload) =>
							if let Err(err) = cache.put(CacheKind::Rubric, &key, payload) {
								warn!(error = %err, paper_id, "Rubric cache write failed.");
							},
						Err(err) => {
							warn!(error = %err, paper_id, "Rubric cache payload encode failed.");
						},
					}
				}

				return score;
			},
			None => warn!(paper_id, attempt, "Rubric response violated the schema."),
		}
	}

	warn!(paper_id, attempts, "Rubric evaluation exhausted retries; degraded score applied.");

	degraded_score(paper_id, initial_score)
}

/// Deterministic fallback after the retry budget: relevance carries the
/// retrieval-stage score, the other dimensions sit at the neutral midpoint.
pub fn degraded_score(paper_id: &str, initial_score: f32) -> RubricScore {
	RubricScore {
		paper_id: paper_id.to_string(),
		relevance: initial_score,
		novelty: NEUTRAL_DIMENSION,
		impact: NEUTRAL_DIMENSION,
		practicality: NEUTRAL_DIMENSION,
		rationale: DEGRADED_RATIONALE.to_string(),
		review_summary: None,
		schema_valid: false,
	}
}

fn parse_rubric(raw: &str, paper_id: &str) -> Option<RubricScore> {
	let value = extract_json(raw)?;
	let response: RubricResponse = serde_json::from_value(value).ok()?;
	let dimensions =
		[response.relevance, response.novelty, response.impact, response.practicality];

	if dimensions.iter().any(|dim| !dim.is_finite() || !(0.0..=1.0).contains(dim)) {
		return None;
	}

	Some(RubricScore {
		paper_id: paper_id.to_string(),
		relevance: response.relevance,
		novelty: response.novelty,
		impact: response.impact,
		practicality: response.practicality,
		rationale: response.rationale,
		review_summary: response.review_summary,
		schema_valid: true,
	})
}

/// Flattens one paper into the evaluation context: title, truncated abstract,
/// decision, presentation tier, and a distilled review digest.
fn build_context(paper: &PaperRecord, cfg: &Evaluation) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Title: {}", paper.title);
	let _ = writeln!(
		out,
		"Abstract: {}",
		truncate_chars(&paper.abstract_text, cfg.abstract_budget_chars as usize)
	);

	if let Some(decision) = paper.decision.as_deref() {
		let _ = writeln!(out, "Decision: {decision}");
	}
	if let Some(presentation) = paper.presentation_type.as_deref() {
		let _ = writeln!(out, "Presentation: {presentation}");
	}
	for (idx, review) in paper.reviews.iter().enumerate() {
		let score = review.score.map(|s| s.to_string()).unwrap_or_else(|| "n/a".to_string());
		let text = truncate_chars(&review.text, cfg.review_budget_chars as usize);
		let _ = writeln!(out, "Review {} (score {score}): {text}", idx + 1);
	}
	if let Some(meta) = paper.meta_review_text.as_deref() {
		let _ =
			writeln!(out, "Meta review: {}", truncate_chars(meta, cfg.review_budget_chars as usize));
	}

	out
}

fn build_rubric_messages(interest: &str, context: &str) -> Vec<Value> {
	let system = "You evaluate a peer-reviewed paper against a research interest. Return a \
	              single JSON object with numeric fields relevance, novelty, impact, and \
	              practicality, each between 0 and 1, plus a short rationale string and an \
	              optional review_summary string. Return only the JSON object.";
	let user = format!("Research interest: {interest}\n\n{context}");

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

fn truncate_chars(text: &str, budget: usize) -> &str {
	match text.char_indices().nth(budget) {
		Some((offset, _)) => &text[..offset],
		None => text,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use paperscout_domain::Review;

	fn paper() -> PaperRecord {
		PaperRecord {
			id: "p1".to_string(),
			title: "Molecular graph synthesis".to_string(),
			authors: Vec::new(),
			abstract_text: "a".repeat(2_000),
			keywords: Vec::new(),
			venue: "neurips".to_string(),
			year: 2024,
			decision: Some("Accept (poster)".to_string()),
			presentation_type: None,
			reviews: vec![Review {
				score: Some(7.0),
				confidence: None,
				text: "b".repeat(400),
			}],
			meta_review_text: None,
			pdf_url: None,
			forum_url: None,
		}
	}

	#[test]
	fn context_respects_truncation_budgets() {
		let cfg = Evaluation::default();
		let context = build_context(&paper(), &cfg);

		assert!(context.contains(&"a".repeat(1_500)));
		assert!(!context.contains(&"a".repeat(1_501)));
		assert!(context.contains(&"b".repeat(300)));
		assert!(!context.contains(&"b".repeat(301)));
		assert!(context.contains("Decision: Accept (poster)"));
	}

	#[test]
	fn truncation_is_char_safe() {
		assert_eq!(truncate_chars("héllo", 2), "hé");
		assert_eq!(truncate_chars("ab", 10), "ab");
	}

	#[test]
	fn valid_response_parses() {
		let raw = r#"{"relevance": 0.9, "novelty": 0.8, "impact": 0.7, "practicality": 0.6, "rationale": "close match"}"#;
		let score = parse_rubric(raw, "p1").expect("score");

		assert!(score.schema_valid);
		assert_eq!(score.paper_id, "p1");
		assert!((score.relevance - 0.9).abs() < f32::EPSILON);
		assert_eq!(score.rationale, "close match");
	}

	#[test]
	fn out_of_range_dimension_is_a_violation() {
		let raw = r#"{"relevance": 1.4, "novelty": 0.8, "impact": 0.7, "practicality": 0.6}"#;

		assert!(parse_rubric(raw, "p1").is_none());
	}

	#[test]
	fn missing_dimension_is_a_violation() {
		let raw = r#"{"relevance": 0.9, "novelty": 0.8, "impact": 0.7}"#;

		assert!(parse_rubric(raw, "p1").is_none());
	}

	#[test]
	fn degraded_score_copies_the_initial_score() {
		let score = degraded_score("p9", 0.75);

		assert!(!score.schema_valid);
		assert!((score.relevance - 0.75).abs() < f32::EPSILON);
		assert!((score.novelty - 0.5).abs() < f32::EPSILON);
	}
}
