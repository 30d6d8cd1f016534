use ecow::eco_format;
use texdep_syntax::{Annotation, Document, Environment};

use crate::Edit;

/// Plan the annotation of an environment with a language, so that editors
/// can highlight its body as code in that language.
///
/// The cursor must be inside the `\begin{..}` of an environment. The
/// annotation `%! language = <id>` is inserted on its own line right before
/// the `\begin`. Returns `None` if the cursor is not on a `\begin` or the
/// language id is not a single word.
pub fn inject_language(document: &Document, cursor: usize, language: &str) -> Option<Edit> {
    let language = language.trim();
    if language.is_empty() || language.contains(char::is_whitespace) {
        return None;
    }

    let env = document
        .environments()
        .iter()
        .rfind(|env| begin_range(document, env).contains(&cursor))?;

    let annotation = Annotation::new(Annotation::INJECT_LANGUAGE, Some(language.into()));
    Some(Edit::new(env.span().start(), eco_format!("{annotation}\n")))
}

/// The language injected into an environment, if it is annotated with one.
pub fn injected_language(env: &Environment) -> Option<&str> {
    env.annotation(Annotation::INJECT_LANGUAGE)?.value()
}

/// The range of an environment's `\begin{..}`, including its closing brace.
fn begin_range(document: &Document, env: &Environment) -> std::ops::RangeInclusive<usize> {
    let start = env.span().start();
    let mut end = env.name_span().end();
    if let Some(rest) = document.get(end..env.span().end()) {
        end += rest.find('}').unwrap_or(0);
    }
    start..=end
}
