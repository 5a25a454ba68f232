// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
	/// Bare identifier or `{Braced Column Title}`.
	Ident(String),
	Integer(i64),
	Float(f64),
	StringLit(String),
	Plus,       // +
	Minus,      // -
	Asterisk,   // *
	Slash,      // /
	Percent,    // %
	Ampersand,  // & (concat shorthand)
	Comma,      // ,
	OpenParen,  // (
	CloseParen, // )
}

/// Hand-rolled tokenizer for the formula expression grammar. Column titles
/// may be wrapped in curly braces to allow spaces; string literals use
/// single or double quotes with backslash escapes.
pub fn tokenize(expression: &str) -> Result<Vec<Token>> {
	let mut tokens = Vec::new();
	let mut chars = expression.char_indices().peekable();

	while let Some((start, ch)) = chars.next() {
		match ch {
			' ' | '\t' | '\r' | '\n' => {}
			'+' => tokens.push(Token::Plus),
			'-' => tokens.push(Token::Minus),
			'*' => tokens.push(Token::Asterisk),
			'/' => tokens.push(Token::Slash),
			'%' => tokens.push(Token::Percent),
			'&' => tokens.push(Token::Ampersand),
			',' => tokens.push(Token::Comma),
			'(' => tokens.push(Token::OpenParen),
			')' => tokens.push(Token::CloseParen),
			'{' => {
				let mut title = String::new();
				let mut closed = false;
				for (_, ch) in chars.by_ref() {
					if ch == '}' {
						closed = true;
						break;
					}
					title.push(ch);
				}
				if !closed {
					return Err(Error::Parse {
						fragment: expression[start..].to_string(),
						reason: "unterminated column reference".to_string(),
					});
				}
				tokens.push(Token::Ident(title));
			}
			'\'' | '"' => {
				let quote = ch;
				let mut literal = String::new();
				let mut closed = false;
				while let Some((_, ch)) = chars.next() {
					if ch == '\\' {
						if let Some((_, escaped)) = chars.next() {
							literal.push(escaped);
						}
						continue;
					}
					if ch == quote {
						closed = true;
						break;
					}
					literal.push(ch);
				}
				if !closed {
					return Err(Error::Parse {
						fragment: expression[start..].to_string(),
						reason: "unterminated string literal".to_string(),
					});
				}
				tokens.push(Token::StringLit(literal));
			}
			'0'..='9' => {
				let mut number = String::from(ch);
				let mut is_float = false;
				while let Some((_, next)) = chars.peek() {
					if next.is_ascii_digit() {
						number.push(*next);
						chars.next();
					} else if *next == '.' && !is_float {
						is_float = true;
						number.push('.');
						chars.next();
					} else {
						break;
					}
				}
				if is_float {
					let value = number.parse().map_err(|_| Error::Parse {
						fragment: number.clone(),
						reason: "invalid numeric literal".to_string(),
					})?;
					tokens.push(Token::Float(value));
				} else {
					let value = number.parse().map_err(|_| Error::Parse {
						fragment: number.clone(),
						reason: "invalid numeric literal".to_string(),
					})?;
					tokens.push(Token::Integer(value));
				}
			}
			ch if ch.is_alphabetic() || ch == '_' => {
				let mut ident = String::from(ch);
				while let Some((_, next)) = chars.peek() {
					if next.is_alphanumeric() || *next == '_' {
						ident.push(*next);
						chars.next();
					} else {
						break;
					}
				}
				tokens.push(Token::Ident(ident));
			}
			other => {
				return Err(Error::Parse {
					fragment: other.to_string(),
					reason: "unexpected character".to_string(),
				});
			}
		}
	}

	Ok(tokens)
}
