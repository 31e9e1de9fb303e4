use crate::engine::article::{get_word_core, get_word_stem, Article, WordTally};
use crate::engine::language::Language;
use crate::engine::typed_buffer::SortedBuffer;
use crate::error::EngineError;

/// Occurrence-count weight buckets: the single most frequent stem's
/// occurrence count earns weight 3, the next three distinct occurrence
/// counts earn weight 2, and every stem below that earns the default weight
/// of 1. A sentence's raw score is the sum of its words' weights.
const WEIGHTS: [u32; 4] = [3, 2, 2, 2];
const DEFAULT_WEIGHT: u32 = 1;

#[derive(Clone, Copy)]
struct RankedSentence {
	index: usize,
	score: u32,
}

/// Score every sentence and mark a ratio-bounded, greedily selected subset as
/// part of the summary.
pub fn grade(article: &mut Article, lang: &Language, ratio: f32) -> Result<(), EngineError> {
	// A ratio of exactly 0 is a normal, if degenerate, request: it selects no
	// sentences and yields an empty summary, the same way `grade_article`
	// applies no ratio floor at all. Only the batch CLI rejects `-r 0`
	// (`summarize.rs`'s own check) — that's a CLI-specific usage restriction,
	// not an engine precondition.
	if ratio < 0.0 || ratio > 1.0 {
		return Err(EngineError::InvalidRatio(ratio));
	}

	let weight_of = occurrence_weights(&article.words);

	for (idx, sentence) in article.sentences.iter_mut().enumerate() {
		let mut score = 0u32;
		for raw_word in article.stream.words_in(sentence.start, sentence.end) {
			let core = get_word_core(raw_word, lang);
			let stem = get_word_stem(&core, lang);
			// A stem absent from `weight_of` means it was excluded during
			// parsing and never tallied into `article.words`; skip it the same
			// way the original's `array_search` miss does, rather than
			// re-deriving exclusion from `core` here.
			if let Some((num_occ, weight)) = weight_of.get(stem.as_str()) {
				score += *num_occ as u32 * *weight;
			}
		}
		if sentence.is_para_begin {
			score = (score as f32 * 1.6) as u32;
		} else if idx == 0 {
			score *= 2;
		}
		sentence.score = score;
	}

	let mut ranked: SortedBuffer<RankedSentence> = SortedBuffer::new();
	for (index, sentence) in article.sentences.iter().enumerate() {
		ranked.insert_before_equal(RankedSentence { index, score: sentence.score }, |a, b| b.score.cmp(&a.score));
	}

	// `(size_t)(num_words * ratio)` in the original truncates toward zero.
	let budget = (article.num_words as f32 * ratio) as usize;
	let mut used = 0usize;
	for ranked_sentence in ranked.iter() {
		if used >= budget {
			break;
		}
		let sentence = &mut article.sentences[ranked_sentence.index];
		sentence.is_selected = true;
		used += sentence.num_words;
	}

	Ok(())
}

/// Maps each stem to `(num_occ, weight)`, where `weight` depends on which of
/// the top four distinct occurrence counts (if any) that stem's count is.
fn occurrence_weights(words: &[WordTally]) -> std::collections::HashMap<&str, (usize, u32)> {
	let mut counts: Vec<usize> = words.iter().map(|w| w.num_occ).collect();
	counts.sort_unstable_by(|a, b| b.cmp(a));
	counts.dedup();

	let mut weight_for_count = std::collections::HashMap::new();
	for (rank, count) in counts.iter().enumerate() {
		let weight = if rank == 0 { WEIGHTS[0] } else if rank < WEIGHTS.len() { WEIGHTS[rank] } else { DEFAULT_WEIGHT };
		weight_for_count.insert(*count, weight);
	}

	words
		.iter()
		.map(|w| (w.stem.as_str(), (w.num_occ, *weight_for_count.get(&w.num_occ).unwrap_or(&DEFAULT_WEIGHT))))
		.collect()
}
