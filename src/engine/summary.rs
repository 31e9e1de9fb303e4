use crate::engine::article::Article;

/// Render the selected sentences back into document order. Mirrors
/// `print_summary` exactly: a selected sentence that begins a paragraph gets
/// a leading `\n` (no separating space), and every word — including the
/// summary's very last one — is followed by a single trailing space.
pub fn render(article: &Article) -> String {
	let mut out = String::new();
	for sentence in &article.sentences {
		if !sentence.is_selected {
			continue;
		}
		if sentence.is_para_begin {
			out.push('\n');
		}
		for word in article.stream.words_in(sentence.start, sentence.end) {
			out.push_str(word);
			out.push(' ');
		}
	}
	out
}
