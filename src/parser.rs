use std::rc::Rc;

use crate::ast::{Expr, NodeId, Stmt};
use crate::error::SharedErrorReporter;
use crate::object::Object;
use crate::token::{Token, TokenType};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_node_id: NodeId,
    loop_depth: usize,
    error_reporter: Option<SharedErrorReporter>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0, next_node_id: 0, loop_depth: 0, error_reporter: None }
    }

    pub fn with_error_reporting(self, error_reporter: SharedErrorReporter) -> Self {
        Self { error_reporter: Some(error_reporter), ..self }
    }

    /// Start numbering nodes at `first` instead of zero. A driver that
    /// keeps one interpreter across several parses (the REPL) must pass
    /// the previous parser's `next_node_id`, or distances recorded for
    /// earlier lines would be clobbered.
    pub fn with_first_node_id(self, first: NodeId) -> Self {
        Self { next_node_id: first, ..self }
    }

    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// Parse the whole token stream. Statements that fail to parse are
    /// reported and skipped; the parser synchronizes at the next
    /// statement boundary and keeps going, so one bad statement yields
    /// exactly one diagnostic and the rest of the file still parses.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = vec![];
        while !self.is_at_end() {
            if let Some(decl) = self.declaration() {
                statements.push(decl);
            }
        }

        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_tt(&[TokenType::Class]) {
            self.class_declaration()
        } else if self.match_tt(&[TokenType::Var]) {
            self.var_declaration()
        } else if self.match_tt(&[TokenType::Fun]) {
            self.function("function")
        } else {
            self.statement()
        };

        if result.is_none() {
            self.synchronize();
        }

        result
    }

    fn class_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect class name.")?;

        let superclass = if self.match_tt(&[TokenType::Less]) {
            let super_name = self.consume(TokenType::Identifier, "Expect superclass name.")?;
            Some(Expr::Variable { id: self.node_id(), name: super_name })
        } else {
            None
        };

        self.consume(TokenType::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = vec![];
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after class body.")?;
        Some(Stmt::Class { name, superclass, methods })
    }

    fn var_declaration(&mut self) -> Option<Stmt> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;

        let initializer = if self.match_tt(&[TokenType::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;

        Some(Stmt::Var { name, initializer })
    }

    fn function(&mut self, kind: &str) -> Option<Stmt> {
        let name =
            self.consume(TokenType::Identifier, format!("Expect {} name.", kind).as_str())?;

        self.consume(TokenType::LeftParen, format!("Expect '(' after {} name.", kind).as_str())?;

        let mut parameters = vec![];
        if !self.check(&TokenType::RightParen) {
            loop {
                if parameters.len() >= 255 {
                    self.error(self.peek().clone(), "Can't have more than 255 parameters.");
                }

                parameters.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);
                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenType::LeftBrace, format!("Expect '{{' before {} body.", kind).as_str())?;

        // A function body is a new lexical context: 'break' inside it
        // does not belong to a loop outside it.
        let enclosing_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loop_depth;

        let body = body?.into_iter().map(Rc::new).collect::<Vec<_>>();

        Some(Stmt::Function { name, params: parameters, body })
    }

    fn statement(&mut self) -> Option<Stmt> {
        if self.match_tt(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_tt(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_tt(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_tt(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_tt(&[TokenType::Print]) {
            self.print_statement()
        } else if self.match_tt(&[TokenType::Break]) {
            self.break_statement()
        } else if self.match_tt(&[TokenType::Continue]) {
            self.continue_statement()
        } else if self.match_tt(&[TokenType::LeftBrace]) {
            Some(Stmt::Block { statements: self.block()? })
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_tt(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Some(Stmt::If { condition, then_branch, else_branch })
    }

    fn return_statement(&mut self) -> Option<Stmt> {
        let keyword = self.previous();
        let value = if !self.check(&TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
        Some(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after while condition.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Some(Stmt::While { condition, body: Box::new(body?), increment: None })
    }

    /// Desugar `for (init; cond; inc) body` into
    /// `{ init; while (cond) body :inc }`. The increment rides on the
    /// `While` node itself instead of being appended to the body, so
    /// `continue` still reaches it.
    fn for_statement(&mut self) -> Option<Stmt> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_tt(&[TokenType::Semicolon]) {
            None
        } else if self.match_tt(&[TokenType::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::Semicolon) {
            self.expression()?
        } else {
            Expr::Literal { value: Object::Boolean(true) }
        };
        self.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(&TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        let mut stmt = Stmt::While { condition, body: Box::new(body?), increment };

        if let Some(initializer) = initializer {
            stmt = Stmt::Block { statements: vec![initializer, stmt] };
        }

        Some(stmt)
    }

    fn print_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Some(Stmt::Print { expr })
    }

    fn break_statement(&mut self) -> Option<Stmt> {
        let token = self.previous();
        if self.loop_depth == 0 {
            self.error(token.clone(), "Must be inside a loop to use 'break'.");
        }
        self.consume(TokenType::Semicolon, "Expect ';' after 'break'.")?;
        Some(Stmt::Break { token })
    }

    fn continue_statement(&mut self) -> Option<Stmt> {
        let token = self.previous();
        if self.loop_depth == 0 {
            self.error(token.clone(), "Must be inside a loop to use 'continue'.");
        }
        self.consume(TokenType::Semicolon, "Expect ';' after 'continue'.")?;
        Some(Stmt::Continue { token })
    }

    fn block(&mut self) -> Option<Vec<Stmt>> {
        let mut statements = vec![];

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Some(statements)
    }

    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Some(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.or()?;

        if self.match_tt(&[TokenType::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;

            match expr {
                Expr::Variable { name, .. } => {
                    return Some(Expr::Assignment {
                        id: self.node_id(),
                        name,
                        value: Box::new(value),
                    });
                }
                Expr::Get { object, name } => {
                    return Some(Expr::Set { object, name, value: Box::new(value) });
                }
                _ => {
                    // Report but keep parsing; no need to panic here.
                    self.error(equals, "Invalid assignment target.");
                }
            }
        }

        Some(expr)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut expr = self.and()?;

        while self.match_tt(&[TokenType::Or]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;

        while self.match_tt(&[TokenType::And]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Some(expr)
    }

    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;

        while self.match_tt(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator: Token = self.previous();
            let right = self.comparison()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.term()?;

        while self.match_tt(&[
            TokenType::GreaterEqual,
            TokenType::Greater,
            TokenType::LessEqual,
            TokenType::Less,
        ]) {
            let operator: Token = self.previous();
            let right = self.term()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn term(&mut self) -> Option<Expr> {
        let mut expr = self.factor()?;

        while self.match_tt(&[TokenType::Minus, TokenType::Plus]) {
            let operator: Token = self.previous();
            let right = self.factor()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn factor(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;

        while self.match_tt(&[TokenType::Slash, TokenType::Star]) {
            let operator: Token = self.previous();
            let right = self.unary()?;
            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }
        Some(expr)
    }

    fn unary(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Some(Expr::Unary { operator, right: Box::new(right) });
        }

        self.call()
    }

    fn call(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_tt(&[TokenType::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tt(&[TokenType::Dot]) {
                let name =
                    self.consume(TokenType::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get { object: Box::new(expr), name };
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut arguments = vec![];

        if !self.check(&TokenType::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    // Just report the error, but don't return None yet
                    self.error(self.peek().clone(), "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.match_tt(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;
        Some(Expr::Call { callee: Box::new(callee), paren, arguments })
    }

    fn primary(&mut self) -> Option<Expr> {
        if self.match_tt(&[TokenType::False]) {
            return Some(Expr::Literal { value: Object::Boolean(false) });
        }
        if self.match_tt(&[TokenType::True]) {
            return Some(Expr::Literal { value: Object::Boolean(true) });
        }
        if self.match_tt(&[TokenType::Nil]) {
            return Some(Expr::Literal { value: Object::Null });
        }
        if self.match_tt(&[TokenType::Number, TokenType::StringLiteral]) {
            return Some(Expr::Literal {
                value: self.previous().literal.expect("expecting a number or string here"),
            });
        }
        if self.match_tt(&[TokenType::Super]) {
            let keyword = self.previous();
            self.consume(TokenType::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenType::Identifier, "Expect superclass method name.")?;
            return Some(Expr::Super { id: self.node_id(), keyword, method });
        }
        if self.match_tt(&[TokenType::This]) {
            return Some(Expr::This { id: self.node_id(), keyword: self.previous() });
        }
        if self.match_tt(&[TokenType::Identifier]) {
            return Some(Expr::Variable { id: self.node_id(), name: self.previous() });
        }
        if self.match_tt(&[TokenType::LeftParen]) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Some(Expr::Grouping { expr: Box::new(expr) });
        }

        self.error(self.peek().clone(), "Expect expression.");
        None
    }

    fn node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Return the next token if its `token_type` matches the given type as input.
    /// Otherwise, print the error message and return `None`.
    fn consume(&mut self, token_type: TokenType, message: &str) -> Option<Token> {
        if self.check(&token_type) {
            return Some(self.advance());
        }

        self.error(self.peek().clone(), message);
        None
    }

    fn error(&self, token: Token, message: &str) {
        if let Some(reporter) = self.error_reporter.as_ref() {
            reporter.borrow_mut().error_at(&token, message);
        }
    }

    fn match_tt(&mut self, types: &[TokenType]) -> bool {
        for tt in types {
            if self.check(tt) {
                self.advance();
                return true;
            }
        }

        false
    }

    /// Check to see if the next token's type matches the given `token_type`.
    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == *token_type
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&mut self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    fn synchronize(&mut self) {
        self.advance();

        // Move and discard tokens until we find a statement boundary
        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(source).scan_tokens();
        Parser::new(tokens).parse()
    }

    fn parse_with_reporter(source: &str) -> (Vec<Stmt>, crate::error::SharedErrorReporter) {
        let reporter = ErrorReporter::new().as_shared();
        let tokens =
            Scanner::new(source).with_error_reporting(reporter.clone()).scan_tokens();
        let stmts = Parser::new(tokens).with_error_reporting(reporter.clone()).parse();
        (stmts, reporter)
    }

    #[test]
    fn for_loop_desugars_to_while_with_increment() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(stmts.len(), 1);

        let Stmt::Block { statements } = &stmts[0] else {
            panic!("expected the initializer block");
        };
        assert!(matches!(statements[0], Stmt::Var { .. }));
        let Stmt::While { increment, .. } = &statements[1] else {
            panic!("expected the desugared while loop");
        };
        assert!(increment.is_some());
    }

    #[test]
    fn for_loop_without_clauses() {
        let stmts = parse("for (;;) break;");
        let Stmt::While { condition, increment, .. } = &stmts[0] else {
            panic!("expected a bare while loop");
        };
        assert!(matches!(condition, Expr::Literal { value: Object::Boolean(true) }));
        assert!(increment.is_none());
    }

    #[test]
    fn assignment_to_property_becomes_set() {
        let stmts = parse("a.b = 1;");
        let Stmt::Expression { expr } = &stmts[0] else { panic!("expected expression") };
        assert!(matches!(expr, Expr::Set { .. }));
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        let (_, reporter) = parse_with_reporter("1 = 2;");
        assert!(reporter.borrow().had_error);
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let (_, reporter) = parse_with_reporter("break;");
        assert!(reporter.borrow().had_error);
    }

    #[test]
    fn continue_inside_loop_parses() {
        let (_, reporter) = parse_with_reporter("while (true) continue;");
        assert!(!reporter.borrow().had_error);
    }

    #[test]
    fn break_inside_function_inside_loop_is_an_error() {
        let (_, reporter) = parse_with_reporter("while (true) { fun f() { break; } }");
        assert!(reporter.borrow().had_error);
    }

    #[test]
    fn parser_recovers_after_error() {
        let (stmts, reporter) = parse_with_reporter("var = 1; print 2;");
        assert!(reporter.borrow().had_error);
        // The second statement still parses after synchronization
        assert_eq!(stmts.len(), 1);
        assert!(matches!(stmts[0], Stmt::Print { .. }));
    }

    #[test]
    fn class_with_superclass_and_methods() {
        let stmts = parse("class Cruller < Doughnut { cook() { return; } }");
        let Stmt::Class { name, superclass, methods } = &stmts[0] else {
            panic!("expected a class declaration");
        };
        assert_eq!(name.lexeme, "Cruller");
        assert!(superclass.is_some());
        assert_eq!(methods.len(), 1);
    }

    #[test]
    fn each_variable_occurrence_gets_its_own_node_id() {
        let stmts = parse("a; a;");
        let ids: Vec<_> = stmts
            .iter()
            .map(|s| match s {
                Stmt::Expression { expr: Expr::Variable { id, .. } } => *id,
                _ => panic!("expected a variable expression"),
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
    }
}
