use logos::Logos;
use snailquote::unescape;

use crate::MdceError;
use crate::MdceResult;

/// Raw tokens produced by logos for directive text. Whitespace is kept as a
/// token so that adjacent pieces (`--args="a b"`) can be glued into a single
/// word the way a shell would.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'[^']*'")]
	SingleQuotedString,
	#[regex(r#"[^ \t\r\n"']+"#)]
	Bare,
}

/// Split directive text into shell-like words.
///
/// Single quoted sections are taken literally, double quoted sections honour
/// backslash escapes, and anything else is split on whitespace. A quote that
/// is never closed is a [`MdceError::DirectiveSyntax`] error.
pub fn split_words(source: &str) -> MdceResult<Vec<String>> {
	let mut words = Vec::new();
	let mut current: Option<String> = None;

	for (result, span) in RawToken::lexer(source).spanned() {
		let slice = &source[span.clone()];

		let Ok(token) = result else {
			return Err(MdceError::DirectiveSyntax {
				message: format!("unbalanced quote at column {}", span.start + 1),
			});
		};

		let piece = match token {
			RawToken::Whitespace => {
				if let Some(word) = current.take() {
					words.push(word);
				}
				continue;
			}
			RawToken::Bare => slice.to_string(),
			RawToken::SingleQuotedString => slice[1..slice.len() - 1].to_string(),
			RawToken::DoubleQuotedString => unquote_double(slice, span.start)?,
		};

		current.get_or_insert_with(String::new).push_str(&piece);
	}

	if let Some(word) = current {
		words.push(word);
	}

	Ok(words)
}

/// Strip the surrounding double quotes and unescape if needed.
fn unquote_double(slice: &str, offset: usize) -> MdceResult<String> {
	let inner = &slice[1..slice.len() - 1];

	if !inner.contains('\\') {
		return Ok(inner.to_string());
	}

	unescape(slice).map_err(|e| {
		MdceError::DirectiveSyntax {
			message: format!("invalid escape in string at column {}: {e}", offset + 1),
		}
	})
}
