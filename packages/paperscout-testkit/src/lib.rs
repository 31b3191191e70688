use std::{
	collections::VecDeque,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use color_eyre::eyre;
use serde_json::{Map, Value};

use paperscout_config::{
	Cache, Config, CorpusProviderConfig, Evaluation, GenerationProviderConfig, Providers, Query,
	Ranking, Selection, Service,
};
use paperscout_domain::{PaperRecord, Review};
use paperscout_pipeline::{BoxFuture, CorpusProvider, GenerationProvider};

/// One scripted generation outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
	Reply(String),
	Fail(String),
}

#[derive(Debug)]
struct Rule {
	pattern: String,
	responses: VecDeque<Scripted>,
}

/// A generation provider driven entirely by the test. Calls are answered by
/// the first rule whose pattern appears in the prompt; a rule's responses play
/// in order and its last response repeats. Calls matching no rule drain the
/// fallback queue, and an empty queue is a failure.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
	rules: Mutex<Vec<Rule>>,
	fallback: Mutex<VecDeque<Scripted>>,
	calls: AtomicUsize,
}

impl ScriptedGenerator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn respond_when(&self, pattern: &str, response: &str) {
		self.script_when(pattern, Scripted::Reply(response.to_string()));
	}

	pub fn fail_when(&self, pattern: &str, message: &str) {
		self.script_when(pattern, Scripted::Fail(message.to_string()));
	}

	pub fn script_when(&self, pattern: &str, scripted: Scripted) {
		let mut rules = self.rules.lock().expect("rules lock poisoned");

		if let Some(rule) = rules.iter_mut().find(|rule| rule.pattern == pattern) {
			rule.responses.push_back(scripted);
		} else {
			rules.push(Rule {
				pattern: pattern.to_string(),
				responses: VecDeque::from([scripted]),
			});
		}
	}

	pub fn push(&self, scripted: Scripted) {
		self.fallback.lock().expect("fallback lock poisoned").push_back(scripted);
	}

	/// Total generation calls observed.
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::Relaxed)
	}

	fn answer(&self, prompt: &str) -> Scripted {
		let mut rules = self.rules.lock().expect("rules lock poisoned");

		if let Some(rule) = rules.iter_mut().find(|rule| prompt.contains(rule.pattern.as_str())) {
			return if rule.responses.len() > 1 {
				rule.responses.pop_front().expect("non-empty responses")
			} else {
				rule.responses.front().cloned().expect("non-empty responses")
			};
		}

		drop(rules);

		self.fallback
			.lock()
			.expect("fallback lock poisoned")
			.pop_front()
			.unwrap_or_else(|| Scripted::Fail("Scripted generator has no response queued.".to_string()))
	}
}

impl GenerationProvider for ScriptedGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::Relaxed);

			let prompt = messages
				.iter()
				.filter_map(|message| message.get("content").and_then(Value::as_str))
				.collect::<Vec<_>>()
				.join("\n");

			match self.answer(&prompt) {
				Scripted::Reply(text) => Ok(text),
				Scripted::Fail(message) => Err(eyre::eyre!(message)),
			}
		})
	}
}

/// A corpus provider serving a fixed in-memory slice.
#[derive(Debug, Default)]
pub struct StaticCorpus {
	papers: Vec<PaperRecord>,
}

impl StaticCorpus {
	pub fn new(papers: Vec<PaperRecord>) -> Self {
		Self { papers }
	}
}

impl CorpusProvider for StaticCorpus {
	fn fetch<'a>(
		&'a self,
		_cfg: &'a CorpusProviderConfig,
		_venue: &'a str,
		_year: i32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PaperRecord>>> {
		Box::pin(async move { Ok(self.papers.clone()) })
	}
}

/// A corpus provider that always fails, for upstream-error paths.
#[derive(Debug, Default)]
pub struct UnreachableCorpus;

impl CorpusProvider for UnreachableCorpus {
	fn fetch<'a>(
		&'a self,
		_cfg: &'a CorpusProviderConfig,
		_venue: &'a str,
		_year: i32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PaperRecord>>> {
		Box::pin(async move { Err(eyre::eyre!("Corpus provider unreachable.")) })
	}
}

pub struct PaperBuilder {
	record: PaperRecord,
}

impl PaperBuilder {
	pub fn new(id: &str, title: &str) -> Self {
		Self {
			record: PaperRecord {
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
			},
		}
	}

	pub fn abstract_text(mut self, text: &str) -> Self {
		self.record.abstract_text = text.to_string();

		self
	}

	pub fn keywords(mut self, keywords: &[&str]) -> Self {
		self.record.keywords = keywords.iter().map(|keyword| keyword.to_string()).collect();

		self
	}

	pub fn venue(mut self, venue: &str) -> Self {
		self.record.venue = venue.to_string();

		self
	}

	pub fn year(mut self, year: i32) -> Self {
		self.record.year = year;

		self
	}

	pub fn decision(mut self, decision: &str) -> Self {
		self.record.decision = Some(decision.to_string());

		self
	}

	pub fn review(mut self, score: f32, text: &str) -> Self {
		self.record.reviews.push(Review {
			score: Some(score),
			confidence: None,
			text: text.to_string(),
		});

		self
	}

	pub fn build(self) -> PaperRecord {
		self.record
	}
}

/// A complete config for in-process tests; providers point at localhost and
/// are never actually dialed when the fake providers are injected.
pub fn test_config() -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		providers: Providers {
			generation: GenerationProviderConfig {
				provider_id: "scripted".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-model".to_string(),
				temperature: 0.0,
				timeout_ms: 5_000,
				default_headers: Map::new(),
			},
			corpus: CorpusProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: None,
				path: "/papers".to_string(),
				timeout_ms: 5_000,
				max_retries: 1,
				accepted_only: false,
				default_headers: Map::new(),
			},
		},
		query: Query::default(),
		selection: Selection::default(),
		evaluation: Evaluation::default(),
		ranking: Ranking::default(),
		cache: Cache { enabled: true, ttl_hours: 24, dir: "storage/cache".to_string() },
	}
}
