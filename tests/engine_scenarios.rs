//! End-to-end engine scenarios from the summarization design's testable
//! properties: exclusion bypass, proper-noun preservation, paragraph boost,
//! and ratio-budget overshoot.

use std::io::Write as _;
use summarizerd::engine::article::Article;
use summarizerd::engine::grader;
use summarizerd::engine::language::{Language, Rule};
use summarizerd::engine::summary;

fn write_article(text: &str) -> (tempfile::TempDir, std::path::PathBuf) {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("article.txt");
	let mut file = std::fs::File::create(&path).unwrap();
	write!(file, "{text}").unwrap();
	(dir, path)
}

fn stripping_period_post1() -> Vec<Rule> {
	vec![Rule { lhs: ".".to_string(), rhs: String::new() }]
}

#[test]
fn exclusion_bypass_scores_but_does_not_render_around_stop_words() {
	let lang = Language { exclude: vec!["the".to_string()], line_break: vec![".".to_string()], ..Language::default() };
	let (_dir, path) = write_article("The cat. The dog.");

	let mut article = Article::parse(&path, &lang).unwrap();
	grader::grade(&mut article, &lang, 1.0).unwrap();
	let rendered = summary::render(&article);

	assert_eq!(rendered, "The cat. The dog. ");
}

#[test]
fn proper_nouns_are_preserved_and_tallied_across_occurrences() {
	let lang = Language { post1: stripping_period_post1(), line_break: vec![".".to_string()], ..Language::default() };
	let (_dir, path) = write_article("Paris sparkles. Paris shines.");

	let article = Article::parse(&path, &lang).unwrap();

	let mut stems: Vec<&str> = article.words.iter().map(|w| w.stem.as_str()).collect();
	stems.sort_unstable();
	assert_eq!(stems, vec!["Paris", "shines", "sparkles"]);

	let paris = article.words.iter().find(|w| w.stem == "Paris").unwrap();
	assert_eq!(paris.num_occ, 2);
}

#[test]
fn paragraph_boost_outranks_a_middle_sentence_of_the_prior_paragraph() {
	let lang = Language { post1: stripping_period_post1(), line_break: vec![".".to_string()], ..Language::default() };
	// Three sentences, six words each all the same stem so every sentence
	// scores identically before boosts: sentence 0 (first overall) gets the
	// first-sentence doubling, sentence 1 is an unboosted middle sentence of
	// paragraph one, and sentence 2 opens paragraph two after the blank line.
	let (_dir, path) = write_article("cat cat. cat cat.\n\ncat cat.\n");

	let mut article = Article::parse(&path, &lang).unwrap();
	assert_eq!(article.sentences.len(), 3);
	assert!(!article.sentences[0].is_para_begin);
	assert!(!article.sentences[1].is_para_begin);
	assert!(article.sentences[2].is_para_begin, "third sentence must open the second paragraph");

	grader::grade(&mut article, &lang, 0.5).unwrap();

	assert!(article.sentences[2].score > article.sentences[1].score, "paragraph-opening boost must outscore a plain middle sentence");
	assert!(article.sentences[2].is_selected, "the paragraph-opening sentence must be selected ahead of the middle sentence");
	assert!(!article.sentences[1].is_selected, "the middle sentence loses out to the paragraph-opening boost under this budget");
}

#[test]
fn ratio_budget_overshoots_by_at_most_one_sentence() {
	let lang = Language { line_break: vec![".".to_string()], ..Language::default() };
	let mut text = String::new();
	for _ in 0..10 {
		text.push_str("apple apple apple apple apple apple apple apple apple apple. ");
	}
	let (_dir, path) = write_article(&text);

	let mut article = Article::parse(&path, &lang).unwrap();
	assert_eq!(article.sentences.len(), 10);
	assert_eq!(article.num_words, 100);

	// 0.25 is exactly representable in binary floating point, so the
	// budget computation below can't be thrown off by rounding the way a
	// ratio like 0.3 could be.
	grader::grade(&mut article, &lang, 0.25).unwrap();

	let selected_words: usize = article.sentences.iter().filter(|s| s.is_selected).map(|s| s.num_words).sum();
	// budget = 100 * 0.25 = 25; every sentence is 10 words, so the greedy
	// pick overshoots by exactly one sentence: 20 words were banked (still
	// under budget) before the third and last pick brings the total to 30.
	assert_eq!(selected_words, 30);
	assert_eq!(article.sentences.iter().filter(|s| s.is_selected).count(), 3);
}

#[test]
fn stemming_survives_manual_prefix_and_suffix_rules_together() {
	let lang = Language {
		pre1: vec![Rule { lhs: "un".to_string(), rhs: String::new() }],
		post1: stripping_period_post1(),
		pre: vec![Rule { lhs: "dis".to_string(), rhs: String::new() }],
		post: vec![Rule { lhs: "ing".to_string(), rhs: String::new() }],
		line_break: vec![".".to_string()],
		..Language::default()
	};
	let (_dir, path) = write_article("unhappy disliking.");
	let article = Article::parse(&path, &lang).unwrap();

	let mut stems: Vec<&str> = article.words.iter().map(|w| w.stem.as_str()).collect();
	stems.sort_unstable();
	assert_eq!(stems, vec!["happy", "lik"]);
}
