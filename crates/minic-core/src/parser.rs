//! Recursive-descent parser: turns a token stream into a list of statement
//! trees, resolving local-variable offsets as identifiers are first seen.

use crate::ast::{BinOp, Node};
use crate::lexer::Token;
use crate::symtab::SymbolTable;
use thiserror::Error;

/// Parse errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token at byte {offset}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("missing ';' at byte {offset}")]
    MissingSemicolon { offset: usize },

    #[error("missing ')' at byte {offset}")]
    MissingCloseParen { offset: usize },

    #[error("invalid assignment target at byte {offset}: left side of '=' must be a variable")]
    InvalidAssignmentTarget { offset: usize },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A hand-written recursive-descent parser over a materialized token vector
/// with a position cursor.
pub struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
    symtab: SymbolTable,
}

impl Parser {
    fn new(tokens: Vec<(Token, usize)>) -> Self {
        Self {
            tokens,
            position: 0,
            symtab: SymbolTable::new(),
        }
    }

    /// Parse a full token stream, returning one AST root per statement plus
    /// the stack frame size required for locals.
    pub fn parse(tokens: Vec<(Token, usize)>) -> Result<(Vec<Node>, usize)> {
        let mut parser = Self::new(tokens);
        let program = parser.parse_program()?;
        Ok((program, parser.symtab.frame_size()))
    }

    fn parse_program(&mut self) -> Result<Vec<Node>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Node> {
        let node = if self.check(&Token::Return) {
            self.advance();
            Node::Return(Box::new(self.parse_expr()?))
        } else {
            self.parse_expr()?
        };
        self.expect_semi()?;
        Ok(node)
    }

    fn parse_expr(&mut self) -> Result<Node> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<Node> {
        let offset = self.current_offset();
        let lhs = self.parse_equality()?;
        if self.check(&Token::Eq) {
            self.advance();
            if !matches!(lhs, Node::LocalVar { .. }) {
                return Err(ParseError::InvalidAssignmentTarget { offset });
            }
            let rhs = self.parse_assign()?;
            return Ok(Node::assign(lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Node> {
        let mut lhs = self.parse_relational()?;
        loop {
            if self.check(&Token::EqEq) {
                self.advance();
                lhs = Node::bin_op(BinOp::Eq, lhs, self.parse_relational()?);
            } else if self.check(&Token::NotEq) {
                self.advance();
                lhs = Node::bin_op(BinOp::Neq, lhs, self.parse_relational()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_relational(&mut self) -> Result<Node> {
        let mut lhs = self.parse_add()?;
        loop {
            if self.check(&Token::Lt) {
                self.advance();
                lhs = Node::bin_op(BinOp::Lt, lhs, self.parse_add()?);
            } else if self.check(&Token::LtEq) {
                self.advance();
                lhs = Node::bin_op(BinOp::Le, lhs, self.parse_add()?);
            } else if self.check(&Token::Gt) {
                self.advance();
                let rhs = self.parse_add()?;
                lhs = Node::bin_op(BinOp::Lt, rhs, lhs);
            } else if self.check(&Token::GtEq) {
                self.advance();
                let rhs = self.parse_add()?;
                lhs = Node::bin_op(BinOp::Le, rhs, lhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_add(&mut self) -> Result<Node> {
        let mut lhs = self.parse_mul()?;
        loop {
            if self.check(&Token::Plus) {
                self.advance();
                lhs = Node::bin_op(BinOp::Add, lhs, self.parse_mul()?);
            } else if self.check(&Token::Minus) {
                self.advance();
                lhs = Node::bin_op(BinOp::Sub, lhs, self.parse_mul()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    /// Unlike the source this is reworked from, this is a true
    /// left-associative loop: `a*b*c` parses as `Mul(Mul(a,b), c)`, not a
    /// single operator per call.
    fn parse_mul(&mut self) -> Result<Node> {
        let mut lhs = self.parse_unary()?;
        loop {
            if self.check(&Token::Star) {
                self.advance();
                lhs = Node::bin_op(BinOp::Mul, lhs, self.parse_unary()?);
            } else if self.check(&Token::Slash) {
                self.advance();
                lhs = Node::bin_op(BinOp::Div, lhs, self.parse_unary()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Node> {
        if self.check(&Token::Plus) {
            self.advance();
            return self.parse_primary();
        }
        if self.check(&Token::Minus) {
            self.advance();
            let rhs = self.parse_primary()?;
            return Ok(Node::bin_op(BinOp::Sub, Node::Num(0), rhs));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node> {
        if self.check(&Token::LParen) {
            self.advance();
            let node = self.parse_expr()?;
            let offset = self.current_offset();
            if !self.check(&Token::RParen) {
                return Err(ParseError::MissingCloseParen { offset });
            }
            self.advance();
            return Ok(node);
        }

        let (token, offset) = self.peek()?;
        match token {
            Token::Number(n) => {
                self.advance();
                Ok(Node::Num(n))
            }
            Token::Identifier(name) => {
                self.advance();
                let offset = self.symtab.resolve(&name);
                Ok(Node::LocalVar { name, offset })
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "number, identifier, or '('".to_string(),
                found: format!("{other:?}"),
                offset,
            }),
        }
    }

    fn expect_semi(&mut self) -> Result<()> {
        let offset = self.current_offset();
        if self.check(&Token::Semi) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::MissingSemicolon { offset })
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.tokens
            .get(self.position)
            .map(|(t, _)| t == token)
            .unwrap_or(false)
    }

    fn peek(&self) -> Result<(Token, usize)> {
        self.tokens
            .get(self.position)
            .cloned()
            .ok_or(ParseError::UnexpectedEof)
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map(|(_, o)| *o)
            .unwrap_or_else(|| self.tokens.last().map(|(_, o)| *o).unwrap_or(0))
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> (Vec<Node>, usize) {
        Parser::parse(tokenize(source).unwrap()).unwrap()
    }

    #[test]
    fn single_number_statement() {
        let (nodes, frame) = parse("1;");
        assert_eq!(nodes, vec![Node::Num(1)]);
        assert_eq!(frame, 0);
    }

    #[test]
    fn add_is_left_associative() {
        let (nodes, _) = parse("1+2+3;");
        assert_eq!(
            nodes,
            vec![Node::bin_op(
                BinOp::Add,
                Node::bin_op(BinOp::Add, Node::Num(1), Node::Num(2)),
                Node::Num(3)
            )]
        );
    }

    #[test]
    fn mul_is_left_associative_loop() {
        let (nodes, _) = parse("2*3*4;");
        assert_eq!(
            nodes,
            vec![Node::bin_op(
                BinOp::Mul,
                Node::bin_op(BinOp::Mul, Node::Num(2), Node::Num(3)),
                Node::Num(4)
            )]
        );
    }

    #[test]
    fn sub_parses() {
        let (nodes, _) = parse("3-2;");
        assert_eq!(nodes, vec![Node::bin_op(BinOp::Sub, Node::Num(3), Node::Num(2))]);
    }

    #[test]
    fn assignment_is_right_associative() {
        let (nodes, frame) = parse("a=1;");
        assert_eq!(
            nodes,
            vec![Node::assign(
                Node::LocalVar {
                    name: "a".to_string(),
                    offset: 8
                },
                Node::Num(1)
            )]
        );
        assert_eq!(frame, 8);
    }

    #[test]
    fn chained_assignment_is_right_associative() {
        let (nodes, _) = parse("a=b=1;");
        assert_eq!(
            nodes,
            vec![Node::assign(
                Node::LocalVar {
                    name: "a".to_string(),
                    offset: 8
                },
                Node::assign(
                    Node::LocalVar {
                        name: "b".to_string(),
                        offset: 16
                    },
                    Node::Num(1)
                )
            )]
        );
    }

    #[test]
    fn gt_rewritten_as_swapped_lt() {
        let (nodes, _) = parse("x>y;");
        assert_eq!(
            nodes,
            vec![Node::bin_op(
                BinOp::Lt,
                Node::LocalVar {
                    name: "y".to_string(),
                    offset: 16
                },
                Node::LocalVar {
                    name: "x".to_string(),
                    offset: 8
                }
            )]
        );
    }

    #[test]
    fn ge_rewritten_as_swapped_le() {
        let (nodes, _) = parse("x>=y;");
        assert_eq!(
            nodes,
            vec![Node::bin_op(
                BinOp::Le,
                Node::LocalVar {
                    name: "y".to_string(),
                    offset: 16
                },
                Node::LocalVar {
                    name: "x".to_string(),
                    offset: 8
                }
            )]
        );
    }

    #[test]
    fn unary_minus_is_sub_from_zero() {
        let (nodes, _) = parse("-10;");
        assert_eq!(
            nodes,
            vec![Node::bin_op(BinOp::Sub, Node::Num(0), Node::Num(10))]
        );
    }

    #[test]
    fn unary_plus_is_identity() {
        let (nodes, _) = parse("+10;");
        assert_eq!(nodes, vec![Node::Num(10)]);
    }

    #[test]
    fn variables_get_increasing_offsets_in_first_appearance_order() {
        let (nodes, frame) = parse("a=3; b=4; a+b;");
        assert_eq!(frame, 16);
        match &nodes[2] {
            Node::BinOp { lhs, rhs, .. } => {
                assert!(matches!(**lhs, Node::LocalVar { offset: 8, .. }));
                assert!(matches!(**rhs, Node::LocalVar { offset: 16, .. }));
            }
            other => panic!("expected BinOp, got {other:?}"),
        }
    }

    #[test]
    fn return_statement_wraps_expression() {
        let (nodes, _) = parse("return 1+2;");
        assert_eq!(
            nodes,
            vec![Node::Return(Box::new(Node::bin_op(
                BinOp::Add,
                Node::Num(1),
                Node::Num(2)
            )))]
        );
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let err = Parser::parse(tokenize("1+2").unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::MissingSemicolon { .. }));
    }

    #[test]
    fn missing_close_paren_is_an_error() {
        let err = Parser::parse(tokenize("(1+2;").unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::MissingCloseParen { .. }));
    }

    #[test]
    fn assigning_to_a_non_variable_is_an_error() {
        let err = Parser::parse(tokenize("1=2;").unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidAssignmentTarget { .. }));
    }
}
