//! Declaration parsing implementation
//!
//! This module handles parsing of binding and function declarations:
//!
//! - Variable declarations: `let x = 1, y;`, `const [a, b] = pair;`
//! - Function declarations: `function name(a, b) { ... }`, `async function ...`
//! - Parameter lists shared with function expressions and arrows
//!
//! # Grammar
//!
//! ```text
//! var_decl      ::= ("let" | "const" | "var") declarator ("," declarator)*
//! declarator    ::= pattern ("=" expression)?
//! pattern       ::= identifier | "[" identifier ("," identifier)* "]"
//! function_decl ::= "async"? "function" identifier "(" params ")" "{" statements "}"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};
use std::sync::Arc;

impl Parser {
    /// Consume `let`, `const` or `var` if present
    pub(crate) fn match_decl_kind(&mut self) -> Option<DeclKind> {
        let loc = self.current_location();
        if self.match_token(&Token::Let(loc)) {
            Some(DeclKind::Let)
        } else if self.match_token(&Token::Const(loc)) {
            Some(DeclKind::Const)
        } else if self.match_token(&Token::Var(loc)) {
            Some(DeclKind::Var)
        } else {
            None
        }
    }

    /// Parse the declarator list after the binding keyword (no terminator)
    pub(crate) fn parse_var_declaration(
        &mut self,
        kind: DeclKind,
        location: SourceLocation,
    ) -> Result<AstNode, ParseError> {
        let mut declarators = Vec::new();

        loop {
            let target = self.parse_pattern()?;
            let init = if self.match_token(&Token::Eq(self.current_location())) {
                Some(self.parse_expression()?)
            } else {
                None
            };

            if init.is_none() && (kind == DeclKind::Const || matches!(target, Pattern::Array(_)))
            {
                return Err(self.error_here("Missing initializer in declaration"));
            }

            declarators.push(Declarator { target, init });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(AstNode::VarDecl {
            kind,
            declarators,
            location,
        })
    }

    /// Parse a binding target: `name` or `[a, b, c]`
    pub(crate) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        if self.match_token(&Token::LBracket(self.current_location())) {
            let mut names = Vec::new();
            while !self.check(&Token::RBracket(self.current_location())) {
                names.push(self.expect_identifier()?);
                if !self.match_token(&Token::Comma(self.current_location())) {
                    break;
                }
            }
            self.expect_token(
                &Token::RBracket(self.current_location()),
                "Expected ']' after destructuring pattern",
            )?;
            return Ok(Pattern::Array(names));
        }

        Ok(Pattern::Ident(self.expect_identifier()?))
    }

    /// Parse `async? function name(params) { body }`
    pub(crate) fn parse_function_declaration(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();
        let is_async = self.match_token(&Token::Async(loc));
        self.expect_token(
            &Token::Function(self.current_location()),
            "Expected 'function'",
        )?;

        let name = self.expect_identifier()?;
        let func = self.parse_function_rest(Some(name), is_async)?;

        Ok(AstNode::FunctionDecl {
            func: Arc::new(func),
            location: loc,
        })
    }

    /// Parse `(params) { body }` after the function name
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<String>,
        is_async: bool,
    ) -> Result<FunctionDef, ParseError> {
        self.expect_lparen("before parameters")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        self.expect_lbrace("before function body")?;
        let body = self.parse_block_statements()?;
        self.expect_rbrace("after function body")?;

        Ok(FunctionDef {
            name,
            params,
            body,
            is_async,
            is_arrow: false,
        })
    }

    /// Parse a comma-separated list of parameter names (without the parentheses)
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(params);
        }

        loop {
            params.push(self.expect_identifier()?);
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_multiple_declarators() {
        let program = parse("let a = 1, b, c = a;");
        match &program.nodes[0] {
            AstNode::VarDecl {
                kind, declarators, ..
            } => {
                assert_eq!(*kind, DeclKind::Let);
                let names: Vec<_> = declarators.iter().flat_map(|d| d.target.names()).collect();
                assert_eq!(names, vec!["a", "b", "c"]);
                assert!(declarators[1].init.is_none());
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_array_pattern() {
        let program = parse("const [lo, hi] = [1, 2];");
        match &program.nodes[0] {
            AstNode::VarDecl { declarators, .. } => {
                assert_eq!(
                    declarators[0].target,
                    Pattern::Array(vec!["lo".to_string(), "hi".to_string()])
                );
            }
            other => panic!("Expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_const_requires_initializer() {
        let result = Parser::new("const k;").unwrap().parse_program();
        assert!(result.is_err());
    }

    #[test]
    fn test_plain_function_is_not_async() {
        let program = parse("function helper() {}");
        match &program.nodes[0] {
            AstNode::FunctionDecl { func, .. } => assert!(!func.is_async),
            other => panic!("Expected function, got {:?}", other),
        }
    }
}
