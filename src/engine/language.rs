use crate::error::EngineError;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// A `lhs|rhs` substitution rule: replace a matched prefix or suffix (`lhs`)
/// of a word with `rhs`. Mirrors the original's `"lhs|rhs"` rule text, parsed
/// with `str::split_once` rather than by mutating the separator byte in
/// place (the original's `replace_word` trick of clobbering then restoring
/// the `|` is not reproduced — nothing here needs the rule text back).
#[derive(Debug, Clone)]
pub struct Rule {
	pub lhs: String,
	pub rhs: String,
}

impl Rule {
	fn parse(text: &str) -> Result<Self, EngineError> {
		let (lhs, rhs) = text
			.split_once('|')
			.ok_or_else(|| EngineError::InvalidRule(text.to_string()))?;
		if rhs.len() >= lhs.len() {
			return Err(EngineError::InvalidRule(text.to_string()));
		}
		Ok(Rule { lhs: lhs.to_string(), rhs: rhs.to_string() })
	}
}

/// Rules, synonyms, and exclusions for one language, loaded once per worker
/// (see SPEC_FULL §4.3.x) from a dictionary XML document.
#[derive(Debug, Default)]
pub struct Language {
	pub pre1: Vec<Rule>,
	pub post1: Vec<Rule>,
	pub manual: Vec<Rule>,
	pub synonyms: Vec<Rule>,
	pub pre: Vec<Rule>,
	pub post: Vec<Rule>,
	pub line_break: Vec<String>,
	pub line_dont_break: Vec<String>,
	pub exclude: Vec<String>,
}

impl Language {
	pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
		let text = fs::read_to_string(path.as_ref())
			.map_err(|err| EngineError::InvalidDictionary(format!("{}: {err}", path.as_ref().display())))?;
		let doc = roxmltree::Document::parse(&text)
			.map_err(|err| EngineError::InvalidDictionary(err.to_string()))?;
		let root = doc.root_element();
		if root.tag_name().name() != "dictionary" {
			return Err(EngineError::InvalidDictionary("root element must be <dictionary>".to_string()));
		}

		let mut lang = Language::default();
		for child in root.children().filter(|n| n.is_element()) {
			match child.tag_name().name() {
				"stemmer" => parse_stemmer(child, &mut lang)?,
				"parser" => parse_parser(child, &mut lang)?,
				"exclude" => lang.exclude = collect_leaves(child, "word")?,
				other => return Err(EngineError::InvalidDictionary(format!("unexpected <{other}> under <dictionary>"))),
			}
		}

		lang.manual.sort_by(|a, b| compare_rule_text(&a.lhs, &b.lhs));
		lang.synonyms.sort_by(|a, b| compare_rule_text(&a.lhs, &b.lhs));
		lang.exclude.sort();
		Ok(lang)
	}

	/// Is `word` excluded from scoring (a stop word)? Matched
	/// case-insensitively, the same way `MATCH_AT_END`/`MATCH_AT_BEG` treat
	/// word text, so a capitalized stop word at the start of a sentence is
	/// still recognized.
	pub fn is_excluded(&self, word: &str) -> bool {
		let lower = word.to_ascii_lowercase();
		self.exclude.binary_search_by(|w| w.as_str().cmp(lower.as_str())).is_ok()
	}

	/// Does `word` end a sentence? The line-break rule set matches word
	/// suffixes (e.g. `.`, `!`, `?`); the veto set matches abbreviations (e.g.
	/// `Mr.`, `etc.`) whose own suffix would otherwise look like a break.
	pub fn end_of_line(&self, word: &str) -> bool {
		let breaks = self.line_break.iter().any(|rule| match_at_end(word, rule));
		let vetoed = self.line_dont_break.iter().any(|rule| match_at_end(word, rule));
		breaks && !vetoed
	}

	/// Exact whole-word lookup in `manual`, applied before `pre`/`post` in
	/// `get_word_stem`.
	pub fn find_manual(&self, word: &str) -> Option<&str> {
		self.manual.binary_search_by(|r| compare_rule_text(&r.lhs, word)).ok().map(|idx| self.manual[idx].rhs.as_str())
	}

	/// Exact whole-word lookup in `synonyms`, applied after `pre`/`post` in
	/// `get_word_stem`.
	pub fn find_synonym(&self, word: &str) -> Option<&str> {
		self.synonyms.binary_search_by(|r| compare_rule_text(&r.lhs, word)).ok().map(|idx| self.synonyms[idx].rhs.as_str())
	}
}

/// `MATCH_AT_END`: true when `ending` is no longer than `word` and `word`
/// ends with it, case-insensitively.
pub fn match_at_end(word: &str, ending: &str) -> bool {
	ending.len() < word.len() && word.to_ascii_lowercase().ends_with(&ending.to_ascii_lowercase())
}

/// `MATCH_AT_BEG`: true when `prefix` is no longer than `word` and `word`
/// begins with it, case-insensitively.
pub fn match_at_beg(word: &str, prefix: &str) -> bool {
	prefix.len() < word.len() && word.to_ascii_lowercase().starts_with(&prefix.to_ascii_lowercase())
}

/// `manual`/`synonyms` rules are ordered by the length of their left-hand
/// side, matching the original's `comp_string_with_rule`; longer, more
/// specific entries are found first in a tie.
fn compare_rule_text(rule_lhs: &str, word: &str) -> Ordering {
	match rule_lhs.len().cmp(&word.len()) {
		Ordering::Equal => rule_lhs.to_ascii_lowercase().cmp(&word.to_ascii_lowercase()),
		other => other,
	}
}

fn parse_stemmer(node: roxmltree::Node, lang: &mut Language) -> Result<(), EngineError> {
	for child in node.children().filter(|n| n.is_element()) {
		let rules = collect_leaves(child, "rule")?.into_iter().map(|text| Rule::parse(&text)).collect::<Result<Vec<_>, _>>()?;
		match child.tag_name().name() {
			"pre1" => lang.pre1 = rules,
			"post1" => lang.post1 = rules,
			"manual" => lang.manual = rules,
			"synonyms" => lang.synonyms = rules,
			"pre" => lang.pre = rules,
			"post" => lang.post = rules,
			other => return Err(EngineError::InvalidDictionary(format!("unexpected <{other}> under <stemmer>"))),
		}
	}
	Ok(())
}

fn parse_parser(node: roxmltree::Node, lang: &mut Language) -> Result<(), EngineError> {
	for child in node.children().filter(|n| n.is_element()) {
		match child.tag_name().name() {
			"linebreak" => lang.line_break = collect_leaves(child, "rule")?,
			"linedontbreak" => lang.line_dont_break = collect_leaves(child, "rule")?,
			other => return Err(EngineError::InvalidDictionary(format!("unexpected <{other}> under <parser>"))),
		}
	}
	Ok(())
}


fn collect_leaves(node: roxmltree::Node, leaf_name: &str) -> Result<Vec<String>, EngineError> {
	let mut out = Vec::new();
	for child in node.children().filter(|n| n.is_element()) {
		if child.tag_name().name() != leaf_name {
			return Err(EngineError::InvalidDictionary(format!(
				"unexpected <{}> under <{}>",
				child.tag_name().name(),
				node.tag_name().name()
			)));
		}
		let text = child.text().unwrap_or("").trim().to_string();
		out.push(text);
	}
	Ok(out)
}
