use std::sync::Arc;

use paperscout_config::Config;
use paperscout_domain::Query;
use paperscout_pipeline::{
	CancelFlag, CorpusProvider, Error, PipelineService, Providers, RunRequest, Stage,
};
use paperscout_store::MemoryStore;
use paperscout_testkit::{PaperBuilder, ScriptedGenerator, StaticCorpus, UnreachableCorpus, test_config};

const VALID_RUBRIC: &str = r#"{"relevance": 0.8, "novelty": 0.6, "impact": 0.6, "practicality": 0.5, "rationale": "solid match"}"#;

fn service(
	cfg: Config,
	generator: Arc<ScriptedGenerator>,
	corpus: Arc<dyn CorpusProvider>,
) -> PipelineService {
	PipelineService::with_providers(
		cfg,
		Arc::new(MemoryStore::new()),
		Providers::new(generator, corpus),
	)
}

fn request(terms: &[&str]) -> RunRequest {
	let query = Query::new(terms.iter().map(|term| term.to_string()).collect(), None)
		.expect("query must build");

	RunRequest { venue: "neurips".to_string(), year: 2024, query }
}

#[tokio::test]
async fn synonym_variant_match_ranks_above_no_overlap() {
	let generator = Arc::new(ScriptedGenerator::new());

	// Rubric calls carry a Title line and must be matched before keyword rules,
	// since the interest line repeats the keywords.
	generator.respond_when(
		"Title: Chemistry applications",
		r#"{"relevance": 0.95, "novelty": 0.8, "impact": 0.8, "practicality": 0.7, "rationale": "variant hit"}"#,
	);
	generator.respond_when("Title:", VALID_RUBRIC);
	generator.respond_when("graph generation", "```json\n[\"molecular graph synthesis\"]\n```");
	generator.respond_when("drug discovery", "[\"pharmaceutical development\"]");

	let papers = vec![
		PaperBuilder::new("x", "Chemistry applications")
			.abstract_text("We study molecular graph synthesis for small molecules.")
			.build(),
		PaperBuilder::new("y", "Optimal transport theory")
			.abstract_text("Couplings and dual formulations.")
			.build(),
		PaperBuilder::new("z", "Drug discovery pipelines")
			.abstract_text("Screening workflows.")
			.build(),
	];
	let svc = service(test_config(), generator, Arc::new(StaticCorpus::new(papers)));
	let outcome = svc
		.run(request(&["graph generation", "drug discovery"]), &CancelFlag::new())
		.await
		.expect("run must complete");

	assert_eq!(outcome.ranked.len(), 3);

	let rank_of = |id: &str| outcome.ranked.iter().position(|r| r.paper_id == id).unwrap();
	let y = &outcome.ranked[rank_of("y")];

	assert!(rank_of("x") < rank_of("y"));
	assert_eq!(y.components.initial_score, 0.0);
	assert_eq!(outcome.degraded, 0);
	assert!(
		outcome.ranked[rank_of("x")]
			.components
			.rubric
			.as_ref()
			.is_some_and(|rubric| rubric.schema_valid)
	);
}

#[tokio::test]
async fn unparsable_rubric_degrades_without_dropping_the_candidate() {
	let generator = Arc::new(ScriptedGenerator::new());

	generator.respond_when("Title:", "I would rather not score this paper.");
	generator.respond_when("diffusion", "[\"denoising diffusion\"]");

	let papers = vec![
		PaperBuilder::new("p", "Diffusion models at scale")
			.abstract_text("Large-scale denoising diffusion.")
			.build(),
	];
	let svc = service(test_config(), generator.clone(), Arc::new(StaticCorpus::new(papers)));
	let outcome =
		svc.run(request(&["diffusion"]), &CancelFlag::new()).await.expect("run must complete");

	assert_eq!(outcome.degraded, 1);

	let rubric = &outcome.rubric_scores[0];

	assert!(!rubric.schema_valid);
	assert_eq!(rubric.relevance, outcome.candidates[0].initial_score);
	assert_eq!(outcome.ranked.len(), 1);
	// One synonym call plus the initial rubric attempt and two retries.
	assert_eq!(generator.calls(), 4);
}

#[tokio::test]
async fn warm_cache_rerun_is_identical_and_call_free() {
	let generator = Arc::new(ScriptedGenerator::new());

	generator.respond_when("Title:", VALID_RUBRIC);
	generator.respond_when("graph generation", "[\"molecular graph synthesis\"]");

	let papers = vec![
		PaperBuilder::new("a", "Molecular graph synthesis").build(),
		PaperBuilder::new("b", "Unrelated work").build(),
	];
	let svc = service(test_config(), generator.clone(), Arc::new(StaticCorpus::new(papers)));
	let cancel = CancelFlag::new();
	let first = svc.run(request(&["graph generation"]), &cancel).await.expect("first run");
	let calls_after_first = generator.calls();
	let second = svc.run(request(&["graph generation"]), &cancel).await.expect("second run");

	let order = |outcome: &paperscout_pipeline::RunOutcome| {
		outcome.ranked.iter().map(|r| (r.paper_id.clone(), r.rank)).collect::<Vec<_>>()
	};

	assert_eq!(order(&first), order(&second));
	assert_eq!(generator.calls(), calls_after_first);
}

#[tokio::test]
async fn empty_corpus_is_fatal() {
	let generator = Arc::new(ScriptedGenerator::new());
	let svc = service(test_config(), generator, Arc::new(StaticCorpus::new(Vec::new())));
	let err = svc.run(request(&["diffusion"]), &CancelFlag::new()).await.unwrap_err();

	assert!(matches!(err, Error::CorpusEmpty { .. }));
}

#[tokio::test]
async fn unreachable_corpus_surfaces_as_upstream_error() {
	let mut cfg = test_config();

	cfg.cache.enabled = false;

	let generator = Arc::new(ScriptedGenerator::new());
	let svc = service(cfg, generator, Arc::new(UnreachableCorpus));
	let err = svc.run(request(&["diffusion"]), &CancelFlag::new()).await.unwrap_err();

	assert!(matches!(err, Error::Upstream { stage: Stage::CorpusFetch, .. }));
}

#[tokio::test]
async fn description_only_query_extracts_keywords_via_generation() {
	let generator = Arc::new(ScriptedGenerator::new());

	generator.respond_when("Title:", VALID_RUBRIC);
	generator.respond_when(
		"extract research keywords",
		"```json\n[\"graph generation\", \"drug discovery\", \"molecule design\"]\n```",
	);
	generator.respond_when("expand a research keyword", "[]");

	let papers = vec![PaperBuilder::new("a", "Graph generation methods").build()];
	let svc = service(test_config(), generator, Arc::new(StaticCorpus::new(papers)));
	let query = Query::new(
		Vec::new(),
		Some("I want recent work on graph generation for drug discovery.".to_string()),
	)
	.expect("query");
	let outcome = svc
		.run(RunRequest { venue: "neurips".to_string(), year: 2024, query }, &CancelFlag::new())
		.await
		.expect("run must complete");

	assert_eq!(
		outcome.keywords,
		vec!["graph generation", "drug discovery", "molecule design"]
	);
}

#[tokio::test]
async fn empty_keyword_extraction_is_fatal_input() {
	let generator = Arc::new(ScriptedGenerator::new());

	generator.respond_when("extract research keywords", "[]");

	let papers = vec![PaperBuilder::new("a", "Anything").build()];
	let svc = service(test_config(), generator, Arc::new(StaticCorpus::new(papers)));
	let query = Query::new(Vec::new(), Some("something vague".to_string())).expect("query");
	let err = svc
		.run(RunRequest { venue: "neurips".to_string(), year: 2024, query }, &CancelFlag::new())
		.await
		.unwrap_err();

	assert!(matches!(err, Error::FatalInput { .. }));
}

#[tokio::test]
async fn fast_mode_skips_generation_for_evaluation() {
	let mut cfg = test_config();

	cfg.evaluation.skip_llm_evaluation = true;
	cfg.ranking.review_blend = 0.4;
	cfg.ranking.initial_blend = 0.6;

	let generator = Arc::new(ScriptedGenerator::new());

	generator.respond_when("diffusion", "[\"denoising diffusion\"]");

	let papers = vec![
		PaperBuilder::new("scored", "Diffusion models").review(8.0, "strong").build(),
		PaperBuilder::new("weaker", "Diffusion models too").review(4.0, "mixed").build(),
	];
	let svc = service(cfg, generator.clone(), Arc::new(StaticCorpus::new(papers)));
	let outcome =
		svc.run(request(&["diffusion"]), &CancelFlag::new()).await.expect("run must complete");

	assert!(outcome.rubric_scores.is_empty());
	// Both papers match fully; the better-reviewed one wins on the blended signal.
	assert_eq!(outcome.ranked[0].paper_id, "scored");
	// The only generation call is the synonym expansion.
	assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn decision_tier_breaks_equal_reviews_in_fast_mode() {
	let mut cfg = test_config();

	cfg.evaluation.skip_llm_evaluation = true;
	cfg.ranking.review_blend = 0.4;
	cfg.ranking.initial_blend = 0.6;

	let generator = Arc::new(ScriptedGenerator::new());

	generator.respond_when("diffusion", "[\"denoising diffusion\"]");

	let papers = vec![
		PaperBuilder::new("rejected", "Diffusion models")
			.review(7.0, "mixed")
			.decision("Reject")
			.build(),
		PaperBuilder::new("oral", "Diffusion models too")
			.review(7.0, "mixed")
			.decision("Accept (oral)")
			.build(),
	];
	let svc = service(cfg, generator, Arc::new(StaticCorpus::new(papers)));
	let outcome =
		svc.run(request(&["diffusion"]), &CancelFlag::new()).await.expect("run must complete");

	// Identical scores and review averages; the acceptance tier decides.
	assert_eq!(outcome.ranked[0].paper_id, "oral");
	assert!(outcome.ranked[0].final_score > outcome.ranked[1].final_score);
}

#[tokio::test]
async fn cancellation_degrades_remaining_candidates_but_completes() {
	let generator = Arc::new(ScriptedGenerator::new());
	let papers = vec![
		PaperBuilder::new("a", "Diffusion models").build(),
		PaperBuilder::new("b", "More diffusion models").build(),
	];
	let svc = service(test_config(), generator.clone(), Arc::new(StaticCorpus::new(papers)));
	let cancel = CancelFlag::new();

	cancel.cancel();

	let outcome = svc.run(request(&["diffusion"]), &cancel).await.expect("run must complete");

	assert_eq!(outcome.ranked.len(), 2);
	assert_eq!(outcome.degraded, 2);
	assert_eq!(generator.calls(), 0);
}
