use serde::{Deserialize, Serialize};

/// One peer review as delivered by the corpus provider. Venues disagree on which
/// fields exist; only the score and free text survive into the core.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Review {
	#[serde(default)]
	pub score: Option<f32>,
	#[serde(default)]
	pub confidence: Option<f32>,
	#[serde(default)]
	pub text: String,
}

/// A paper record as supplied by the corpus provider. Read-only within the core.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaperRecord {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub authors: Vec<String>,
	#[serde(default, rename = "abstract")]
	pub abstract_text: String,
	#[serde(default)]
	pub keywords: Vec<String>,
	pub venue: String,
	pub year: i32,
	#[serde(default)]
	pub decision: Option<String>,
	#[serde(default)]
	pub presentation_type: Option<String>,
	#[serde(default)]
	pub reviews: Vec<Review>,
	#[serde(default)]
	pub meta_review_text: Option<String>,
	#[serde(default)]
	pub pdf_url: Option<String>,
	#[serde(default)]
	pub forum_url: Option<String>,
}

impl PaperRecord {
	pub fn is_accepted(&self) -> bool {
		let Some(decision) = self.decision.as_deref() else { return false };
		let decision = decision.to_lowercase();

		decision.contains("accept") || decision.contains("oral") || decision.contains("spotlight")
	}
}

/// Maps an acceptance decision (plus presentation tier) onto [0, 1]. Orals and
/// spotlights outrank plain accepts; rejects sit near the floor; unknown
/// decisions stay neutral.
pub fn decision_strength(decision: Option<&str>, presentation_type: Option<&str>) -> f32 {
	let combined = format!(
		"{} {}",
		decision.unwrap_or_default().to_lowercase(),
		presentation_type.unwrap_or_default().to_lowercase(),
	);

	if combined.contains("oral") || combined.contains("spotlight") {
		1.0
	} else if combined.contains("accept") {
		0.7
	} else if combined.contains("reject") {
		0.2
	} else {
		0.5
	}
}
