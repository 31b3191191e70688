use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A research-interest query. Built once per run and immutable afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Query {
	pub raw_description: Option<String>,
	pub explicit_terms: Vec<String>,
	pub language_hint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
	#[error("Query has neither explicit terms nor a description.")]
	Empty,
}

impl Query {
	/// Builds a query from explicit terms and/or a free-text description. The
	/// language hint is detected from the description when one is present.
	pub fn new(
		explicit_terms: Vec<String>,
		raw_description: Option<String>,
	) -> Result<Self, QueryError> {
		let explicit_terms = normalize_terms(explicit_terms);
		let raw_description =
			raw_description.map(|text| text.trim().to_string()).filter(|text| !text.is_empty());

		if explicit_terms.is_empty() && raw_description.is_none() {
			return Err(QueryError::Empty);
		}

		let language_hint = raw_description.as_deref().and_then(detect_language);

		Ok(Self { raw_description, explicit_terms, language_hint })
	}
}

/// NFKC-normalizes, lowercases, and trims a term. Empty results collapse to an
/// empty string, which callers drop.
pub fn normalize_term(term: &str) -> String {
	term.nfkc().collect::<String>().to_lowercase().trim().to_string()
}

/// Normalizes an ordered term list, dropping empties and duplicates while
/// preserving first-seen order.
pub fn normalize_terms(terms: Vec<String>) -> Vec<String> {
	let mut out = Vec::with_capacity(terms.len());

	for term in terms {
		let normalized = normalize_term(&term);

		if normalized.is_empty() {
			continue;
		}
		if out.contains(&normalized) {
			continue;
		}

		out.push(normalized);
	}

	out
}

pub fn detect_language(text: &str) -> Option<String> {
	whatlang::detect(text)
		.filter(|info| info.is_reliable())
		.map(|info| info.lang().code().to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalization_lowercases_and_folds_width() {
		assert_eq!(normalize_term("  Graph Generation  "), "graph generation");
		// Fullwidth forms fold to ASCII under NFKC.
		assert_eq!(normalize_term("\u{FF27}\u{FF2E}\u{FF2E}"), "gnn");
	}

	#[test]
	fn term_list_drops_empties_and_duplicates_in_order() {
		let terms = vec![
			"Drug Discovery".to_string(),
			"  ".to_string(),
			"graph generation".to_string(),
			"drug discovery".to_string(),
		];

		assert_eq!(normalize_terms(terms), vec!["drug discovery", "graph generation"]);
	}

	#[test]
	fn query_requires_terms_or_description() {
		assert!(Query::new(Vec::new(), None).is_err());
		assert!(Query::new(Vec::new(), Some("  ".to_string())).is_err());
		assert!(Query::new(vec!["llm".to_string()], None).is_ok());
	}

	#[test]
	fn language_hint_detected_from_description() {
		let query = Query::new(
			Vec::new(),
			Some("I am interested in molecular graph generation for drug discovery.".to_string()),
		)
		.expect("query");

		assert_eq!(query.language_hint.as_deref(), Some("eng"));
	}
}
