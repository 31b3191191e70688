use crate::paper::PaperRecord;
use crate::query::normalize_term;

/// One matching unit: a seed keyword plus its expanded variants. The keyword
/// itself is always a member of `variants`.
#[derive(Debug, Clone)]
pub struct KeywordGroup {
	pub keyword: String,
	pub variants: Vec<String>,
}

impl KeywordGroup {
	pub fn new(keyword: String, mut variants: Vec<String>) -> Self {
		if !variants.contains(&keyword) {
			variants.insert(0, keyword.clone());
		}

		Self { keyword, variants }
	}

	/// A group with no expansion beyond the keyword itself.
	pub fn bare(keyword: String) -> Self {
		Self { variants: vec![keyword.clone()], keyword }
	}
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
	pub matched_groups: usize,
	pub total_groups: usize,
	pub matched_terms: Vec<String>,
}

impl MatchOutcome {
	/// Fraction of keyword groups that matched. A group counts at most once no
	/// matter how many of its variants hit.
	pub fn initial_score(&self) -> f32 {
		if self.total_groups == 0 {
			return 0.0;
		}

		self.matched_groups as f32 / self.total_groups as f32
	}
}

/// Scores one paper against the expanded term set. Variants are checked
/// case-insensitively: exact match against the paper's own keyword set,
/// substring match against title + abstract.
pub fn match_paper(groups: &[KeywordGroup], paper: &PaperRecord) -> MatchOutcome {
	let paper_keywords: Vec<String> =
		paper.keywords.iter().map(|keyword| normalize_term(keyword)).collect();
	let paper_text = format!("{} {}", paper.title, paper.abstract_text).to_lowercase();

	let mut outcome =
		MatchOutcome { matched_groups: 0, total_groups: groups.len(), matched_terms: Vec::new() };

	for group in groups {
		let mut group_hit = false;

		for variant in &group.variants {
			let hit = paper_keywords.iter().any(|keyword| keyword == variant)
				|| paper_text.contains(variant.as_str());

			if hit {
				group_hit = true;

				if !outcome.matched_terms.contains(variant) {
					outcome.matched_terms.push(variant.clone());
				}
			}
		}

		if group_hit {
			outcome.matched_groups += 1;
		}
	}

	outcome
}
