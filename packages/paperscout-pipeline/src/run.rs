use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use paperscout_domain::{KeywordGroup, PaperRecord, Query, extract_review_signal, review_score_avg};
use paperscout_store::{CacheKind, fingerprint, key_prefix};

use crate::{
	CancelFlag, Error, PipelineService, Result, Stage,
	aggregate::{AggregateArgs, RankedResult, aggregate},
	evaluate::{RubricScore, evaluate_candidates},
	keywords::extract_keywords,
	matcher::{CandidateScore, score_corpus},
	select::select_candidates,
	synonyms::expand_keywords,
};

/// Per-run lifecycle. Transitions are strictly forward; a fatal error before
/// `CandidatesSelected` ends in `Failed`, later failures degrade per candidate
/// and the run still reaches `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Init,
	KeywordsReady,
	SynonymsReady,
	CandidatesScored,
	CandidatesSelected,
	RubricScored,
	Ranked,
	Done,
	Failed,
}

impl RunState {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Init => "init",
			Self::KeywordsReady => "keywords_ready",
			Self::SynonymsReady => "synonyms_ready",
			Self::CandidatesScored => "candidates_scored",
			Self::CandidatesSelected => "candidates_selected",
			Self::RubricScored => "rubric_scored",
			Self::Ranked => "ranked",
			Self::Done => "done",
			Self::Failed => "failed",
		}
	}
}

impl std::fmt::Display for RunState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone)]
pub struct RunRequest {
	pub venue: String,
	pub year: i32,
	pub query: Query,
}

/// Everything a run produced, handed to the report stage: the final ordering
/// plus the intermediate sets for explainability.
#[derive(Debug)]
pub struct RunOutcome {
	pub run_id: Uuid,
	pub state: RunState,
	pub venue: String,
	pub year: i32,
	pub query: Query,
	pub keywords: Vec<String>,
	pub groups: Vec<KeywordGroup>,
	pub papers: Vec<PaperRecord>,
	pub candidates: Vec<CandidateScore>,
	pub rubric_scores: Vec<RubricScore>,
	pub ranked: Vec<RankedResult>,
	pub degraded: usize,
}

impl PipelineService {
	/// Executes one full pipeline run. See `RunState` for the stage order.
	pub async fn run(&self, req: RunRequest, cancel: &CancelFlag) -> Result<RunOutcome> {
		let run_id = Uuid::new_v4();

		match self.run_inner(run_id, req, cancel).await {
			Ok(outcome) => Ok(outcome),
			Err(err) => {
				warn!(run_id = %run_id, error = %err, state = %RunState::Failed, "Run failed.");

				Err(err)
			},
		}
	}

	async fn run_inner(
		&self,
		run_id: Uuid,
		req: RunRequest,
		cancel: &CancelFlag,
	) -> Result<RunOutcome> {
		let RunRequest { venue, year, query } = req;

		info!(run_id = %run_id, venue, year, state = %RunState::Init, "Run started.");

		let papers = self.fetch_corpus(&venue, year).await?;

		if papers.is_empty() {
			return Err(Error::CorpusEmpty { venue, year });
		}

		let keywords = extract_keywords(self, &query).await?;

		info!(run_id = %run_id, count = keywords.len(), state = %RunState::KeywordsReady, "Keywords ready.");

		let groups = expand_keywords(self, &keywords, cancel).await;
		let variant_count: usize = groups.iter().map(|group| group.variants.len()).sum();

		info!(run_id = %run_id, variant_count, state = %RunState::SynonymsReady, "Synonyms ready.");

		let scored = score_corpus(&groups, &papers);

		info!(run_id = %run_id, corpus = papers.len(), state = %RunState::CandidatesScored, "Corpus scored.");

		let review_avg: HashMap<String, f32> = papers
			.iter()
			.filter_map(|paper| review_score_avg(paper).map(|avg| (paper.id.clone(), avg)))
			.collect();
		let review_signal: HashMap<String, f32> = papers
			.iter()
			.filter_map(|paper| extract_review_signal(paper).map(|sig| (paper.id.clone(), sig)))
			.collect();
		let candidates = select_candidates(scored, &review_avg, &self.cfg.selection);

		info!(run_id = %run_id, selected = candidates.len(), state = %RunState::CandidatesSelected, "Candidates selected.");

		let skip_llm_evaluation = self.cfg.evaluation.skip_llm_evaluation;
		let rubric_scores = if skip_llm_evaluation {
			Vec::new()
		} else {
			let interest = query
				.raw_description
				.clone()
				.unwrap_or_else(|| keywords.join(", "));
			let scores = evaluate_candidates(self, &interest, &candidates, &papers, cancel).await;

			info!(run_id = %run_id, scored = scores.len(), state = %RunState::RubricScored, "Rubric scored.");

			scores
		};
		let degraded = rubric_scores.iter().filter(|score| !score.schema_valid).count();

		if degraded > 0 {
			warn!(run_id = %run_id, degraded, "Some candidates carry degraded rubric scores.");
		}

		let rubric_by_id: HashMap<String, RubricScore> = rubric_scores
			.iter()
			.map(|score| (score.paper_id.clone(), score.clone()))
			.collect();
		let ranked = aggregate(AggregateArgs {
			cfg: &self.cfg.ranking,
			skip_llm_evaluation,
			candidates: &candidates,
			rubric: &rubric_by_id,
			review_signal: &review_signal,
			review_avg: &review_avg,
		});

		info!(run_id = %run_id, ranked = ranked.len(), state = %RunState::Ranked, "Ranking complete.");
		info!(run_id = %run_id, state = %RunState::Done, "Run finished.");

		Ok(RunOutcome {
			run_id,
			state: RunState::Done,
			venue,
			year,
			query,
			keywords,
			groups,
			papers,
			candidates,
			rubric_scores,
			ranked,
			degraded,
		})
	}

	async fn fetch_corpus(&self, venue: &str, year: i32) -> Result<Vec<PaperRecord>> {
		let cfg = &self.cfg.providers.corpus;
		let key = fingerprint(
			CacheKind::Corpus,
			&[venue, &year.to_string(), &cfg.accepted_only.to_string()],
		);

		if self.cfg.cache.enabled {
			match self.cache.get(CacheKind::Corpus, &key) {
				Ok(Some(payload)) => match serde_json::from_value::<Vec<PaperRecord>>(payload) {
					Ok(papers) => {
						info!(venue, year, cache_key_prefix = key_prefix(&key), "Corpus cache hit.");

						return Ok(papers);
					},
					Err(err) => warn!(error = %err, venue, "Corpus cache payload decode failed."),
				},
				Ok(None) => {},
				Err(err) => warn!(error = %err, venue, "Corpus cache read failed."),
			}
		}

		let papers = self
			.providers
			.corpus
			.fetch(cfg, venue, year)
			.await
			.map_err(|err| Error::Upstream { stage: Stage::CorpusFetch, message: err.to_string() })?;

		if self.cfg.cache.enabled {
			match serde_json::to_value(&papers) {
				Ok(payload) =>
					if let Err(err) = self.cache.put(CacheKind::Corpus, &key, payload) {
						warn!(error = %err, venue, "Corpus cache write failed.");
					},
				Err(err) => warn!(error = %err, venue, "Corpus cache payload encode failed."),
			}
		}

		Ok(papers)
	}
}
