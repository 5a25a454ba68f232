// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 Gridbase

use std::cmp::PartialOrd;

use gridbase_type::Value;

use crate::{
	Error, Result,
	ast::{BinaryOp, FormulaNode, UnaryOp},
	token::{Token, tokenize},
};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
enum Precedence {
	None,
	Concat,
	Term,
	Factor,
	Prefix,
}

const fn precedence_of(token: &Token) -> Precedence {
	match token {
		Token::Ampersand => Precedence::Concat,
		Token::Plus | Token::Minus => Precedence::Term,
		Token::Asterisk | Token::Slash | Token::Percent => Precedence::Factor,
		_ => Precedence::None,
	}
}

/// Parse an expression string into a formula AST.
pub fn parse(expression: &str) -> Result<FormulaNode> {
	let tokens = tokenize(expression)?;
	let mut parser = Parser::new(tokens);
	let node = parser.expression(Precedence::None)?;
	if let Some(token) = parser.peek() {
		return Err(Error::Parse {
			fragment: format!("{token:?}"),
			reason: "trailing input after expression".to_string(),
		});
	}
	Ok(node)
}

struct Parser {
	tokens: Vec<Token>,
	position: usize,
}

impl Parser {
	fn new(tokens: Vec<Token>) -> Self {
		Self {
			tokens,
			position: 0,
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.position)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.position).cloned();
		if token.is_some() {
			self.position += 1;
		}
		token
	}

	fn expect(&mut self, expected: &Token) -> Result<()> {
		match self.advance() {
			Some(ref token) if token == expected => Ok(()),
			other => Err(Error::Parse {
				fragment: format!("{other:?}"),
				reason: format!("expected {expected:?}"),
			}),
		}
	}

	fn expression(&mut self, min: Precedence) -> Result<FormulaNode> {
		let mut left = self.primary()?;

		while let Some(token) = self.peek() {
			let precedence = precedence_of(token);
			if precedence == Precedence::None || precedence <= min {
				break;
			}
			let op = match self.advance() {
				Some(Token::Plus) => BinaryOp::Add,
				Some(Token::Minus) => BinaryOp::Sub,
				Some(Token::Asterisk) => BinaryOp::Mul,
				Some(Token::Slash) => BinaryOp::Div,
				Some(Token::Percent) => BinaryOp::Mod,
				Some(Token::Ampersand) => BinaryOp::Concat,
				_ => unreachable!("precedence table admits only binary operators"),
			};
			let right = self.expression(precedence)?;
			// `&` is surface shorthand for CONCAT; rewriting here keeps
			// Binary::Concat reserved for the lowering's `||` chains
			left = if op == BinaryOp::Concat {
				FormulaNode::Call {
					name: "CONCAT".to_string(),
					args: vec![left, right],
				}
			} else {
				FormulaNode::Binary {
					op,
					left: Box::new(left),
					right: Box::new(right),
				}
			};
		}

		Ok(left)
	}

	fn primary(&mut self) -> Result<FormulaNode> {
		match self.advance() {
			Some(Token::Integer(value)) => Ok(FormulaNode::Literal(Value::Int(value))),
			Some(Token::Float(value)) => Ok(FormulaNode::Literal(Value::Float(value))),
			Some(Token::StringLit(value)) => Ok(FormulaNode::Literal(Value::Text(value))),
			Some(Token::Minus) => {
				let arg = self.expression(Precedence::Prefix)?;
				Ok(FormulaNode::Unary {
					op: UnaryOp::Neg,
					arg: Box::new(arg),
				})
			}
			Some(Token::OpenParen) => {
				let inner = self.expression(Precedence::None)?;
				self.expect(&Token::CloseParen)?;
				Ok(inner)
			}
			Some(Token::Ident(name)) => {
				if self.peek() == Some(&Token::OpenParen) {
					self.advance();
					let args = self.arguments()?;
					Ok(FormulaNode::Call {
						name: name.to_uppercase(),
						args,
					})
				} else {
					Ok(FormulaNode::Identifier(name))
				}
			}
			other => Err(Error::Parse {
				fragment: format!("{other:?}"),
				reason: "expected literal, column reference or function call".to_string(),
			}),
		}
	}

	fn arguments(&mut self) -> Result<Vec<FormulaNode>> {
		let mut args = Vec::new();
		if self.peek() == Some(&Token::CloseParen) {
			self.advance();
			return Ok(args);
		}
		loop {
			args.push(self.expression(Precedence::None)?);
			match self.advance() {
				Some(Token::Comma) => {}
				Some(Token::CloseParen) => break,
				other => {
					return Err(Error::Parse {
						fragment: format!("{other:?}"),
						reason: "expected `,` or `)` in argument list".to_string(),
					});
				}
			}
		}
		Ok(args)
	}
}
