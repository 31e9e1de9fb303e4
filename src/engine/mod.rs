pub mod article;
pub mod grader;
pub mod language;
pub mod stream;
pub mod summary;
pub mod typed_buffer;

pub use article::Article;
pub use language::Language;

use crate::error::EngineError;
use std::path::Path;

/// Run the whole pipeline parse -> grade -> render for one file, the way
/// both the batch CLI and each daemon worker do.
pub fn summarize(path: impl AsRef<Path>, lang: &Language, ratio: f32) -> Result<String, EngineError> {
	let mut article = Article::parse(path, lang).map_err(EngineError::Article)?;
	grader::grade(&mut article, lang, ratio)?;
	Ok(summary::render(&article))
}
