use logos::Logos;

use crate::ForgeError;
use crate::ForgeResult;

/// Raw tokens produced by logos for flat tokenization of a template body.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
	#[token("${")]
	ExpressionOpen,
	#[token("\\${")]
	EscapedOpen,
	#[token("\\\\${")]
	BackslashOpen,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("\"")]
	DoubleQuote,
	#[token("'")]
	SingleQuote,
	#[token("\\")]
	Backslash,
	#[token("$")]
	Dollar,
	#[regex(r#"[^${}"'\\]+"#)]
	Text,
}

/// Context states for the walker over the raw token stream.
#[derive(Debug, Clone, Copy)]
enum LexerContext {
	/// Outside of any expression, collecting literal text.
	Literal,
	/// Inside `${ ... }`, tracking nested braces.
	Expression { depth: usize },
	/// Inside a quoted string within an expression.
	Quoted {
		depth: usize,
		quote: RawToken,
		escaped: bool,
	},
}

/// An expression hole found in a template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionSource {
	/// The expression text between `${` and the matching `}`, trimmed.
	pub source: String,
	/// 1-indexed line of the opening `${`.
	pub line: usize,
	/// 1-indexed column of the opening `${`.
	pub column: usize,
}

/// A template body split into literal chunks and expression holes.
///
/// There is always exactly one more literal than there are expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedTemplate {
	pub literals: Vec<String>,
	pub expressions: Vec<ExpressionSource>,
}

/// Split `source` into literal text and `${ expression }` holes.
///
/// Braces and quoted strings inside an expression are balanced, so
/// `${ "}" }` and `${ {"a": 1}.a }` are single expressions. A literal `${`
/// is written as `\${`, and `\\${` is a literal backslash followed by an
/// expression. Other backslashes in literal text are kept as written.
pub fn lex_template(template: &str, source: &str) -> ForgeResult<LexedTemplate> {
	let mut literals = Vec::new();
	let mut expressions = Vec::new();
	let mut literal = String::new();
	let mut expression = String::new();
	let mut expression_start = 0;
	let mut context = LexerContext::Literal;

	for (token, span) in RawToken::lexer(source).spanned() {
		let slice = &source[span.clone()];
		let token = token.unwrap_or(RawToken::Text);

		context = match context {
			LexerContext::Literal => {
				match token {
					RawToken::ExpressionOpen => {
						literals.push(std::mem::take(&mut literal));
						expression_start = span.start;
						LexerContext::Expression { depth: 1 }
					}
					RawToken::EscapedOpen => {
						literal.push_str("${");
						LexerContext::Literal
					}
					RawToken::BackslashOpen => {
						literal.push('\\');
						literals.push(std::mem::take(&mut literal));
						expression_start = span.start + 2;
						LexerContext::Expression { depth: 1 }
					}
					_ => {
						literal.push_str(slice);
						LexerContext::Literal
					}
				}
			}
			LexerContext::Expression { depth } => {
				match token {
					RawToken::BraceClose if depth == 1 => {
						let (line, column) = line_column(source, expression_start);
						expressions.push(ExpressionSource {
							source: std::mem::take(&mut expression).trim().to_string(),
							line,
							column,
						});
						LexerContext::Literal
					}
					RawToken::BraceClose => {
						expression.push_str(slice);
						LexerContext::Expression { depth: depth - 1 }
					}
					RawToken::BraceOpen
					| RawToken::ExpressionOpen
					| RawToken::EscapedOpen
					| RawToken::BackslashOpen => {
						expression.push_str(slice);
						LexerContext::Expression { depth: depth + 1 }
					}
					RawToken::DoubleQuote | RawToken::SingleQuote => {
						expression.push_str(slice);
						LexerContext::Quoted {
							depth,
							quote: token,
							escaped: false,
						}
					}
					_ => {
						expression.push_str(slice);
						LexerContext::Expression { depth }
					}
				}
			}
			LexerContext::Quoted {
				depth,
				quote,
				escaped,
			} => {
				expression.push_str(slice);
				if escaped {
					LexerContext::Quoted {
						depth,
						quote,
						escaped: false,
					}
				} else if token == RawToken::Backslash {
					LexerContext::Quoted {
						depth,
						quote,
						escaped: true,
					}
				} else if token == quote {
					LexerContext::Expression { depth }
				} else {
					LexerContext::Quoted {
						depth,
						quote,
						escaped: false,
					}
				}
			}
		};
	}

	if !matches!(context, LexerContext::Literal) {
		let (line, column) = line_column(source, expression_start);
		return Err(ForgeError::TemplateSyntax {
			template: template.to_string(),
			line,
			column,
			message: "missing closing `}` for `${`".to_string(),
		});
	}

	literals.push(literal);

	Ok(LexedTemplate {
		literals,
		expressions,
	})
}

/// 1-indexed line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
	let before = &source[..offset];
	let line = before.matches('\n').count() + 1;
	let column = before
		.rfind('\n')
		.map_or(before, |newline| &before[newline + 1..])
		.chars()
		.count() + 1;
	(line, column)
}

/// The text of an expression that is nothing but a single string literal,
/// with the common escapes resolved.
///
/// Used to find directives statically without evaluating expressions.
pub(crate) fn string_literal(source: &str) -> Option<String> {
	let source = source.trim();
	let quote = source.chars().next().filter(|c| matches!(c, '"' | '\''))?;
	let body = source.strip_prefix(quote)?.strip_suffix(quote)?;

	let mut text = String::with_capacity(body.len());
	let mut chars = body.chars();
	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				match chars.next()? {
					'n' => text.push('\n'),
					't' => text.push('\t'),
					other => text.push(other),
				}
			}
			// An unescaped quote ends the literal early, so this is not a
			// single literal.
			c if c == quote => return None,
			c => text.push(c),
		}
	}

	Some(text)
}
