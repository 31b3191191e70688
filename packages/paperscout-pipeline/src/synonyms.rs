use std::sync::Arc;

use serde_json::Value;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

use paperscout_config::GenerationProviderConfig;
use paperscout_domain::{KeywordGroup, normalize_terms};
use paperscout_store::{CacheKind, CacheStore, fingerprint, key_prefix};

use crate::{CancelFlag, GenerationProvider, PipelineService, decode::extract_json};

/// Expands every seed keyword into its synonym group, concurrently up to the
/// configured worker bound. Expansion is an accuracy enhancement: any failure
/// degrades that keyword to a bare group and the run continues.
pub async fn expand_keywords(
	svc: &PipelineService,
	keywords: &[String],
	cancel: &CancelFlag,
) -> Vec<KeywordGroup> {
	let workers = svc.cfg.query.synonym_workers.max(1) as usize;
	let semaphore = Arc::new(Semaphore::new(workers));
	let mut groups: Vec<KeywordGroup> =
		keywords.iter().map(|keyword| KeywordGroup::bare(keyword.clone())).collect();
	let mut set = JoinSet::new();

	for (idx, keyword) in keywords.iter().enumerate() {
		if cancel.is_cancelled() {
			break;
		}

		let semaphore = semaphore.clone();
		let generation = svc.providers.generation.clone();
		let gen_cfg = svc.cfg.providers.generation.clone();
		let cache = svc.cache.clone();
		let cache_enabled = svc.cfg.cache.enabled;
		let max_variants = svc.cfg.query.max_synonyms_per_keyword as usize;
		let keyword = keyword.clone();

		set.spawn(async move {
			let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
			let group =
				expand_one(generation, &gen_cfg, cache, cache_enabled, &keyword, max_variants)
					.await;

			(idx, group)
		});
	}

	while let Some(joined) = set.join_next().await {
		match joined {
			Ok((idx, group)) => groups[idx] = group,
			Err(err) => warn!(error = %err, "Synonym expansion task failed; keyword kept bare."),
		}
	}

	groups
}

async fn expand_one(
	generation: Arc<dyn GenerationProvider>,
	gen_cfg: &GenerationProviderConfig,
	cache: Arc<dyn CacheStore>,
	cache_enabled: bool,
	keyword: &str,
	max_variants: usize,
) -> KeywordGroup {
	let key =
		fingerprint(CacheKind::Synonyms, &[keyword, &gen_cfg.model, &max_variants.to_string()]);

	if cache_enabled {
		match cache.get(CacheKind::Synonyms, &key) {
			Ok(Some(payload)) => match serde_json::from_value::<Vec<String>>(payload) {
				Ok(variants) => {
					debug!(keyword, cache_key_prefix = key_prefix(&key), "Synonym cache hit.");

					return KeywordGroup::new(keyword.to_string(), variants);
				},
				Err(err) => {
					warn!(error = %err, keyword, "Synonym cache payload decode failed.");
				},
			},
			Ok(None) => {},
			Err(err) => warn!(error = %err, keyword, "Synonym cache read failed."),
		}
	}

	let messages = build_expansion_messages(keyword, max_variants);
	let raw = match generation.generate(gen_cfg, &messages).await {
		Ok(raw) => raw,
		Err(err) => {
			warn!(error = %err, keyword, "Synonym expansion failed; keyword kept bare.");

			return KeywordGroup::bare(keyword.to_string());
		},
	};
	let variants = match parse_variants(&raw, max_variants) {
		Some(variants) => variants,
		None => {
			warn!(keyword, "Synonym response is not a JSON string array; keyword kept bare.");

			return KeywordGroup::bare(keyword.to_string());
		},
	};
	let group = KeywordGroup::new(keyword.to_string(), variants);

	if cache_enabled {
		match serde_json::to_value(&group.variants) {
			Ok(payload) =>
				if let Err(err) = cache.put(CacheKind::Synonyms, &key, payload) {
					warn!(error = %err, keyword, "Synonym cache write failed.");
				},
			Err(err) => warn!(error = %err, keyword, "Synonym cache payload encode failed."),
		}
	}

	group
}

fn parse_variants(raw: &str, max_variants: usize) -> Option<Vec<String>> {
	let value = extract_json(raw)?;
	let terms: Vec<String> = serde_json::from_value(value).ok()?;
	let mut variants = normalize_terms(terms);

	variants.truncate(max_variants);

	Some(variants)
}

fn build_expansion_messages(keyword: &str, max_variants: usize) -> Vec<Value> {
	let system = format!(
		"You expand a research keyword into close synonyms and common phrasings. \
		 Return at most {max_variants} lowercase variants as a JSON array of strings. \
		 Return only the JSON array."
	);

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": keyword }),
	]
}
