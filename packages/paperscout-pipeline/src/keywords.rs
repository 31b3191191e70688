use serde_json::Value;
use tracing::warn;

use paperscout_domain::{Query, normalize_terms};

use crate::{Error, PipelineService, Result, Stage, decode::extract_json};

/// Derives the seed keyword set for a run. Explicit terms pass through as-is
/// (they were normalized when the query was built); a free-text description
/// goes through one generation call. An empty result is fatal to the run.
pub async fn extract_keywords(svc: &PipelineService, query: &Query) -> Result<Vec<String>> {
	let cfg = &svc.cfg.query;
	let mut keywords = if query.explicit_terms.is_empty() {
		let Some(description) = query.raw_description.as_deref() else {
			return Err(Error::FatalInput {
				message: "Query has neither explicit terms nor a description.".to_string(),
			});
		};

		derive_from_description(svc, description).await?
	} else {
		query.explicit_terms.clone()
	};

	keywords.truncate(cfg.max_keywords as usize);

	if keywords.is_empty() {
		return Err(Error::FatalInput {
			message: "No keywords survived normalization.".to_string(),
		});
	}
	if (keywords.len() as u32) < cfg.min_keywords {
		warn!(
			count = keywords.len(),
			min = cfg.min_keywords,
			"Keyword set is smaller than the configured minimum."
		);
	}

	Ok(keywords)
}

async fn derive_from_description(svc: &PipelineService, description: &str) -> Result<Vec<String>> {
	let cfg = &svc.cfg.query;
	let messages = build_extraction_messages(description, cfg.min_keywords, cfg.max_keywords);
	let raw = svc
		.providers
		.generation
		.generate(&svc.cfg.providers.generation, &messages)
		.await
		.map_err(|err| Error::Upstream {
			stage: Stage::KeywordExtraction,
			message: err.to_string(),
		})?;
	let Some(value) = extract_json(&raw) else {
		return Err(Error::SchemaViolation {
			stage: Stage::KeywordExtraction,
			message: "Response does not contain a JSON keyword array.".to_string(),
		});
	};
	let terms: Vec<String> = serde_json::from_value(value).map_err(|err| Error::SchemaViolation {
		stage: Stage::KeywordExtraction,
		message: format!("Keyword array is malformed: {err}."),
	})?;

	Ok(normalize_terms(terms))
}

fn build_extraction_messages(description: &str, min: u32, max: u32) -> Vec<Value> {
	let system = format!(
		"You extract research keywords. Given a research interest, return between \
		 {min} and {max} short lowercase keywords as a JSON array of strings. \
		 Return only the JSON array."
	);

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": description }),
	]
}
