//! Expression parsing implementation
//!
//! This module handles parsing of HostLang expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: numbers, BigInts, strings, booleans, `null`, arrays, objects
//! - Identifiers and variables
//! - Binary operators: arithmetic, `**`, comparison, logical, `??`, bitwise
//! - Unary operators: `-`, `+`, `!`, `~`, `typeof`, `await`, `++`, `--`
//! - Postfix: `[]`, `.`, `()`, `++`, `--`
//! - Ternary: `? :`
//! - `new Callee(args)`
//! - Function expressions and arrow functions
//!
//! # Precedence
//!
//! From loosest to tightest: assignment, ternary, `??`, `||`, `&&`, `|`, `^`,
//! `&`, equality, relational, shift, additive, multiplicative, `**`, unary,
//! postfix.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use std::sync::Arc;

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment or ternary (right-associative)
    fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        if self.at_arrow_function() {
            return self.parse_arrow_function();
        }

        let expr = self.parse_ternary()?;

        let loc = self.current_location();
        if self.match_token(&Token::Eq(loc)) {
            if !Self::is_assignable(&expr, true) {
                return Err(ParseError {
                    message: "Invalid left-hand side in assignment".to_string(),
                    location: loc,
                });
            }
            let rhs = Box::new(self.parse_assignment()?);
            return Ok(AstNode::Assignment {
                lhs: Box::new(expr),
                rhs,
                location: loc,
            });
        }

        // Compound assignments
        let compound_op = if self.match_token(&Token::PlusEq(loc)) {
            Some(BinOp::Add)
        } else if self.match_token(&Token::MinusEq(loc)) {
            Some(BinOp::Sub)
        } else if self.match_token(&Token::StarEq(loc)) {
            Some(BinOp::Mul)
        } else if self.match_token(&Token::SlashEq(loc)) {
            Some(BinOp::Div)
        } else if self.match_token(&Token::PercentEq(loc)) {
            Some(BinOp::Mod)
        } else {
            None
        };

        if let Some(op) = compound_op {
            if !Self::is_assignable(&expr, false) {
                return Err(ParseError {
                    message: "Invalid left-hand side in assignment".to_string(),
                    location: loc,
                });
            }
            let rhs = Box::new(self.parse_assignment()?);
            return Ok(AstNode::CompoundAssignment {
                lhs: Box::new(expr),
                op,
                rhs,
                location: loc,
            });
        }

        Ok(expr)
    }

    fn is_assignable(node: &AstNode, allow_pattern: bool) -> bool {
        match node {
            AstNode::Variable(..) | AstNode::ArrayAccess { .. } | AstNode::MemberAccess { .. } => {
                true
            }
            AstNode::ArrayLiteral { elements, .. } if allow_pattern => {
                elements.iter().all(|e| Self::is_assignable(e, false))
            }
            _ => false,
        }
    }

    /// Lookahead: does an arrow function start at the current token?
    fn at_arrow_function(&self) -> bool {
        let offset = usize::from(matches!(self.peek(), Token::Async(_)));
        match self.peek_ahead(offset) {
            Some(Token::Ident(..)) => self.check_ahead(offset + 1, &Token::FatArrow(Default::default())),
            Some(Token::LParen(_)) => {
                let mut depth = 0usize;
                let mut i = offset;
                while let Some(token) = self.peek_ahead(i) {
                    match token {
                        Token::LParen(_) => depth += 1,
                        Token::RParen(_) => {
                            depth -= 1;
                            if depth == 0 {
                                return self.check_ahead(i + 1, &Token::FatArrow(Default::default()));
                            }
                        }
                        Token::Eof(_) => return false,
                        _ => {}
                    }
                    i += 1;
                }
                false
            }
            _ => false,
        }
    }

    /// Parse `async? (a, b) => body` or `x => body`
    fn parse_arrow_function(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let is_async = self.match_token(&Token::Async(loc));

        let params = if self.match_token(&Token::LParen(self.current_location())) {
            let params = self.parse_parameter_list()?;
            self.expect_rparen("after arrow parameters")?;
            params
        } else {
            vec![self.expect_identifier()?]
        };
        self.expect_token(
            &Token::FatArrow(self.current_location()),
            "Expected '=>' after arrow parameters",
        )?;

        let body = if self.match_token(&Token::LBrace(self.current_location())) {
            let statements = self.parse_block_statements()?;
            self.expect_rbrace("after arrow body")?;
            statements
        } else {
            let expr_loc = self.current_location();
            let expr = self.parse_assignment()?;
            vec![AstNode::Return {
                expr: Some(Box::new(expr)),
                location: expr_loc,
            }]
        };

        Ok(AstNode::FunctionExpr {
            func: Arc::new(FunctionDef {
                name: None,
                params,
                body,
                is_async,
                is_arrow: true,
            }),
            location: loc,
        })
    }

    /// Parse ternary: condition ? true_expr : false_expr
    fn parse_ternary(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_nullish()?;

        if self.match_token(&Token::Question(self.current_location())) {
            let loc = self.previous_location();
            let true_expr = Box::new(self.parse_assignment()?);
            self.expect_token(
                &Token::Colon(self.current_location()),
                "Expected ':' in ternary expression",
            )?;
            let false_expr = Box::new(self.parse_assignment()?);

            return Ok(AstNode::TernaryOp {
                condition: Box::new(expr),
                true_expr,
                false_expr,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Left-associative binary level: `next (op next)*`
    fn parse_binary_level(
        &mut self,
        ops: &[(fn(SourceLocation) -> Token, BinOp)],
        next: fn(&mut Self) -> Result<AstNode, ParseError>,
    ) -> Result<AstNode, ParseError> {
        let mut left = next(self)?;

        'outer: loop {
            let loc = self.current_location();
            for (make, op) in ops {
                if self.match_token(&make(loc)) {
                    let right = Box::new(next(self)?);
                    left = AstNode::BinaryOp {
                        op: *op,
                        left: Box::new(left),
                        right,
                        location: loc,
                    };
                    continue 'outer;
                }
            }
            break;
        }

        Ok(left)
    }

    /// Parse nullish coalescing (??)
    fn parse_nullish(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(&[(Token::QuestionQuestion, BinOp::Nullish)], Self::parse_logical_or)
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(&[(Token::OrOr, BinOp::Or)], Self::parse_logical_and)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(&[(Token::AndAnd, BinOp::And)], Self::parse_bitwise_or)
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(&[(Token::Pipe, BinOp::BitOr)], Self::parse_bitwise_xor)
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(&[(Token::Caret, BinOp::BitXor)], Self::parse_bitwise_and)
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(&[(Token::Amp, BinOp::BitAnd)], Self::parse_equality)
    }

    /// Parse equality (== != === !==)
    fn parse_equality(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(
            &[
                (Token::EqEqEq, BinOp::StrictEq),
                (Token::NotEqEq, BinOp::StrictNe),
                (Token::EqEq, BinOp::Eq),
                (Token::NotEq, BinOp::Ne),
            ],
            Self::parse_relational,
        )
    }

    /// Parse relational (< <= > >=)
    fn parse_relational(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(
            &[
                (Token::Lt, BinOp::Lt),
                (Token::Le, BinOp::Le),
                (Token::Gt, BinOp::Gt),
                (Token::Ge, BinOp::Ge),
            ],
            Self::parse_shift,
        )
    }

    /// Parse bitwise shift (<< >>)
    fn parse_shift(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(
            &[(Token::LtLt, BinOp::BitShl), (Token::GtGt, BinOp::BitShr)],
            Self::parse_additive,
        )
    }

    /// Parse additive (+ -)
    fn parse_additive(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(
            &[(Token::Plus, BinOp::Add), (Token::Minus, BinOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(&mut self) -> Result<AstNode, ParseError> {
        self.parse_binary_level(
            &[
                (Token::Star, BinOp::Mul),
                (Token::Slash, BinOp::Div),
                (Token::Percent, BinOp::Mod),
            ],
            Self::parse_exponent,
        )
    }

    /// Parse exponentiation (**), right-associative
    fn parse_exponent(&mut self) -> Result<AstNode, ParseError> {
        let base = self.parse_unary()?;

        let loc = self.current_location();
        if self.match_token(&Token::StarStar(loc)) {
            let exponent = Box::new(self.parse_exponent()?);
            return Ok(AstNode::BinaryOp {
                op: BinOp::Pow,
                left: Box::new(base),
                right: exponent,
                location: loc,
            });
        }

        Ok(base)
    }

    /// Parse unary (! ~ - + typeof await ++ --)
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.match_token(&Token::Await(loc)) {
            let expr = Box::new(self.parse_unary()?);
            return Ok(AstNode::Await {
                expr,
                location: loc,
            });
        }

        let prefix = if self.match_token(&Token::Bang(loc)) {
            Some(UnOp::Not)
        } else if self.match_token(&Token::Tilde(loc)) {
            Some(UnOp::BitNot)
        } else if self.match_token(&Token::Minus(loc)) {
            Some(UnOp::Neg)
        } else if self.match_token(&Token::Plus(loc)) {
            Some(UnOp::Plus)
        } else if self.match_token(&Token::Typeof(loc)) {
            Some(UnOp::Typeof)
        } else if self.match_token(&Token::PlusPlus(loc)) {
            Some(UnOp::PreInc)
        } else if self.match_token(&Token::MinusMinus(loc)) {
            Some(UnOp::PreDec)
        } else {
            None
        };

        if let Some(op) = prefix {
            let operand = self.parse_unary()?;
            if matches!(op, UnOp::PreInc | UnOp::PreDec) && !Self::is_assignable(&operand, false) {
                return Err(ParseError {
                    message: "Invalid left-hand side expression in prefix operation".to_string(),
                    location: loc,
                });
            }
            return Ok(AstNode::UnaryOp {
                op,
                operand: Box::new(operand),
                location: loc,
            });
        }

        self.parse_postfix()
    }

    /// Parse postfix (++ -- [] . ())
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = if self.check(&Token::New(self.current_location())) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            let loc = self.current_location();
            let same_line = loc.line == self.previous_location().line;

            // A line break before `++`/`--` ends the expression
            if same_line
                && (self.check(&Token::PlusPlus(loc)) || self.check(&Token::MinusMinus(loc)))
            {
                let op = if self.match_token(&Token::PlusPlus(loc)) {
                    UnOp::PostInc
                } else {
                    self.advance();
                    UnOp::PostDec
                };
                if !Self::is_assignable(&expr, false) {
                    return Err(ParseError {
                        message: "Invalid left-hand side expression in postfix operation"
                            .to_string(),
                        location: loc,
                    });
                }
                expr = AstNode::UnaryOp {
                    op,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&Token::LBracket(loc)) {
                let index = Box::new(self.parse_expression()?);
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after index",
                )?;
                expr = AstNode::ArrayAccess {
                    array: Box::new(expr),
                    index,
                    location: loc,
                };
            } else if self.match_token(&Token::Dot(loc)) {
                let member = self.expect_identifier()?;
                expr = AstNode::MemberAccess {
                    object: Box::new(expr),
                    member,
                    location: loc,
                };
            } else if self.match_token(&Token::LParen(loc)) {
                let args = self.parse_argument_list()?;
                self.expect_rparen("after function arguments")?;
                expr = AstNode::Call {
                    callee: Box::new(expr),
                    args,
                    location: loc,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse `new Callee.path(args)`; the argument list is optional
    fn parse_new(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        self.advance(); // consume 'new'

        let mut callee = self.parse_primary()?;
        while self.match_token(&Token::Dot(self.current_location())) {
            let member_loc = self.previous_location();
            let member = self.expect_identifier()?;
            callee = AstNode::MemberAccess {
                object: Box::new(callee),
                member,
                location: member_loc,
            };
        }

        let args = if self.match_token(&Token::LParen(self.current_location())) {
            let args = self.parse_argument_list()?;
            self.expect_rparen("after constructor arguments")?;
            args
        } else {
            Vec::new()
        };

        Ok(AstNode::New {
            callee: Box::new(callee),
            args,
            location: loc,
        })
    }

    /// Comma-separated expressions up to a closing `)` or `]`, with spreads
    /// and an optional trailing comma
    fn parse_element_list(&mut self, close: &Token) -> Result<Vec<AstNode>, ParseError> {
        let mut items = Vec::new();

        while !self.check(close) && !self.is_at_end() {
            let loc = self.current_location();
            if self.match_token(&Token::Ellipsis(loc)) {
                let expr = Box::new(self.parse_assignment()?);
                items.push(AstNode::Spread {
                    expr,
                    location: loc,
                });
            } else {
                items.push(self.parse_assignment()?);
            }

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(items)
    }

    /// Parse argument list: (expr, expr, ...)
    fn parse_argument_list(&mut self) -> Result<Vec<AstNode>, ParseError> {
        self.parse_element_list(&Token::RParen(self.current_location()))
    }

    /// Parse `{ key: value, shorthand, "quoted": value }`
    fn parse_object_literal(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        let mut properties = Vec::new();

        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            let key_loc = self.current_location();
            let key = match self.peek_token() {
                Token::Ident(name, _) | Token::StringLiteral(name, _) => name,
                Token::Number(n, _) => crate::memory::value::format_number(n),
                other => {
                    return Err(self.error_here(format!("Unexpected {} in object literal", other)))
                }
            };
            self.advance();

            let value = if self.match_token(&Token::Colon(self.current_location())) {
                self.parse_assignment()?
            } else {
                AstNode::Variable(key.clone(), key_loc)
            };
            properties.push((key, value));

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }
        self.expect_rbrace("after object literal")?;

        Ok(AstNode::ObjectLiteral {
            properties,
            location: loc,
        })
    }

    /// Parse primary (literals, variables, parenthesized expressions)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek_token() {
            Token::Number(n, loc) => {
                self.advance();
                return Ok(AstNode::NumberLiteral(n, loc));
            }
            Token::BigInt(digits, loc) => {
                self.advance();
                return Ok(AstNode::BigIntLiteral(digits, loc));
            }
            Token::StringLiteral(s, loc) => {
                self.advance();
                return Ok(AstNode::StringLiteral(s, loc));
            }
            Token::Ident(name, loc) => {
                self.advance();
                return Ok(AstNode::Variable(name, loc));
            }
            Token::True(loc) => {
                self.advance();
                return Ok(AstNode::BoolLiteral(true, loc));
            }
            Token::False(loc) => {
                self.advance();
                return Ok(AstNode::BoolLiteral(false, loc));
            }
            Token::Null(loc) => {
                self.advance();
                return Ok(AstNode::Null { location: loc });
            }
            _ => {}
        }

        // Function expression, optionally async and optionally named
        if self.check(&Token::Function(loc))
            || (self.check(&Token::Async(loc)) && self.check_ahead(1, &Token::Function(loc)))
        {
            let is_async = self.match_token(&Token::Async(loc));
            self.advance(); // consume 'function'
            let name = match self.peek_token() {
                Token::Ident(name, _) => {
                    self.advance();
                    Some(name)
                }
                _ => None,
            };
            let func = self.parse_function_rest(name, is_async)?;
            return Ok(AstNode::FunctionExpr {
                func: Arc::new(func),
                location: loc,
            });
        }

        if self.match_token(&Token::LBracket(loc)) {
            let elements = self.parse_element_list(&Token::RBracket(loc))?;
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' after array elements",
            )?;
            return Ok(AstNode::ArrayLiteral {
                elements,
                location: loc,
            });
        }

        if self.match_token(&Token::LBrace(loc)) {
            return self.parse_object_literal(loc);
        }

        // Parenthesized expression
        if self.match_token(&Token::LParen(loc)) {
            let expr = self.parse_expression()?;
            self.expect_rparen("after expression")?;
            return Ok(expr);
        }

        Err(ParseError {
            message: format!("Unexpected {}", self.peek()),
            location: loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> AstNode {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        match program.nodes.into_iter().next() {
            Some(AstNode::ExpressionStatement { expr, .. }) => *expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        match expr("1 + 2 * 3;") {
            AstNode::BinaryOp {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::Mul, .. })),
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        match expr("2 ** 3 ** 2;") {
            AstNode::BinaryOp {
                op: BinOp::Pow,
                left,
                right,
                ..
            } => {
                assert!(matches!(*left, AstNode::NumberLiteral(n, _) if n == 2.0));
                assert!(matches!(*right, AstNode::BinaryOp { op: BinOp::Pow, .. }));
            }
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_arrow_functions() {
        match expr("xs.map((x, i) => x * i);") {
            AstNode::Call { args, .. } => match &args[0] {
                AstNode::FunctionExpr { func, .. } => {
                    assert!(func.is_arrow);
                    assert_eq!(func.params.len(), 2);
                    assert!(matches!(func.body[0], AstNode::Return { .. }));
                }
                other => panic!("Expected arrow, got {:?}", other),
            },
            other => panic!("Unexpected tree {:?}", other),
        }
        assert!(matches!(expr("f = async x => { return x; };"), AstNode::Assignment { .. }));
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(expr("(a + b) * c;"), AstNode::BinaryOp { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_new_with_chained_call() {
        match expr("new Array(3).fill(0);") {
            AstNode::Call { callee, .. } => match *callee {
                AstNode::MemberAccess { object, member, .. } => {
                    assert_eq!(member, "fill");
                    assert!(matches!(*object, AstNode::New { .. }));
                }
                other => panic!("Unexpected callee {:?}", other),
            },
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_destructuring_assignment() {
        match expr("[a[i], a[j]] = [a[j], a[i]];") {
            AstNode::Assignment { lhs, .. } => {
                assert!(matches!(*lhs, AstNode::ArrayLiteral { ref elements, .. } if elements.len() == 2));
            }
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_object_literal_and_spread() {
        match expr("f({ length: n, k }, ...rest);") {
            AstNode::Call { args, .. } => {
                assert!(matches!(&args[0], AstNode::ObjectLiteral { properties, .. } if properties.len() == 2));
                assert!(matches!(&args[1], AstNode::Spread { .. }));
            }
            other => panic!("Unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let result = Parser::new("1 = x;").unwrap().parse_program();
        assert!(result.is_err());
    }

    #[test]
    fn test_await_and_ternary() {
        match expr("y = await f() ? 1 : 2;") {
            AstNode::Assignment { rhs, .. } => match *rhs {
                AstNode::TernaryOp { condition, .. } => {
                    assert!(matches!(*condition, AstNode::Await { .. }))
                }
                other => panic!("Unexpected rhs {:?}", other),
            },
            other => panic!("Unexpected tree {:?}", other),
        }
    }
}
