//! Recursive descent parser for the adder language
//!
//! The parser pulls tokens straight from the lexer with a single token
//! of lookahead. Blocks follow the layout tokens: a suite is either one
//! simple statement on the same line or a `Newline Indent ... Dedent`
//! block.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{CmpOp, Expr, Statement};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::runtime::{Class, ClassRef, Method};
use crate::token::Token;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Classes defined so far, so a later definition can name a parent
    classes: HashMap<String, Rc<Class>>,
    /// References to classes named before their definition completed,
    /// e.g. a method constructing an instance of its own class
    pending: HashMap<String, ClassRef>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            classes: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Parse a whole program into a `Compound` statement
    pub fn parse_program(mut self) -> Result<Statement, ParseError> {
        let mut statements = Vec::new();
        loop {
            match self.lexer.current() {
                Token::Eof => break,
                Token::Newline => {
                    self.advance()?;
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
        if let Some(name) = self.pending.keys().next() {
            return Err(self.error(format!("unknown class {name}")));
        }
        Ok(Statement::Compound(statements))
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.lexer.current() {
            Token::Class => self.parse_class_definition(),
            Token::If => self.parse_if(),
            _ => {
                let statement = self.parse_simple_statement()?;
                self.end_of_line()?;
                Ok(statement)
            }
        }
    }

    /// `class Name(Parent):` followed by an indented block of methods
    fn parse_class_definition(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // class
        let name = self.expect_id("a class name")?;
        let parent = if self.eat(&Token::Char('('))? {
            let parent_name = self.expect_id("a base class name")?;
            self.expect_char(')')?;
            match self.classes.get(&parent_name) {
                Some(class) => Some(Rc::clone(class)),
                None => return Err(self.error(format!("unknown base class {parent_name}"))),
            }
        } else {
            None
        };
        self.expect_char(':')?;
        self.expect(Token::Newline, "end of line")?;
        self.expect(Token::Indent, "an indented class body")?;

        let mut methods = Vec::new();
        while *self.lexer.current() != Token::Dedent {
            methods.push(self.parse_method()?);
        }
        self.advance()?; // dedent

        let class = Rc::new(Class::new(name.clone(), methods, parent));
        if let Some(pending) = self.pending.remove(&name) {
            pending.fill(Rc::clone(&class));
        }
        self.classes.insert(name, Rc::clone(&class));
        Ok(Statement::ClassDefinition(class))
    }

    /// `def name(self, ...):` and its suite. The receiver parameter is
    /// required and stripped; dispatch rebinds it.
    fn parse_method(&mut self) -> Result<Method, ParseError> {
        self.expect(Token::Def, "'def'")?;
        let name = self.expect_id("a method name")?;
        self.expect_char('(')?;
        let receiver = self.expect_id("'self' as the first parameter")?;
        if receiver != "self" {
            return Err(self.error(format!(
                "expected 'self' as the first parameter, found '{receiver}'"
            )));
        }
        let mut formal_params = Vec::new();
        while self.eat(&Token::Char(','))? {
            formal_params.push(self.expect_id("a parameter name")?);
        }
        self.expect_char(')')?;
        self.expect_char(':')?;
        let body = self.parse_suite()?;
        Ok(Method {
            name,
            formal_params,
            body: Statement::MethodBody(Box::new(body)),
        })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // if
        let condition = self.parse_expr()?;
        self.expect_char(':')?;
        let then_body = Box::new(self.parse_suite()?);
        let else_body = if self.eat(&Token::Else)? {
            self.expect_char(':')?;
            Some(Box::new(self.parse_suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition,
            then_body,
            else_body,
        })
    }

    /// A suite is either a single statement on the same line or an
    /// indented block on the following lines.
    fn parse_suite(&mut self) -> Result<Statement, ParseError> {
        if self.eat(&Token::Newline)? {
            self.expect(Token::Indent, "an indented block")?;
            let mut statements = Vec::new();
            while *self.lexer.current() != Token::Dedent {
                statements.push(self.parse_statement()?);
            }
            self.advance()?; // dedent
            Ok(Statement::Compound(statements))
        } else {
            let statement = self.parse_simple_statement()?;
            self.end_of_line()?;
            Ok(statement)
        }
    }

    fn parse_simple_statement(&mut self) -> Result<Statement, ParseError> {
        match self.lexer.current() {
            Token::Print => {
                self.advance()?;
                let mut args = Vec::new();
                if !self.at_line_end() {
                    args.push(self.parse_expr()?);
                    while self.eat(&Token::Char(','))? {
                        args.push(self.parse_expr()?);
                    }
                }
                Ok(Statement::Print(args))
            }
            Token::Return => {
                self.advance()?;
                if self.at_line_end() {
                    Ok(Statement::Return(Expr::None))
                } else {
                    Ok(Statement::Return(self.parse_expr()?))
                }
            }
            Token::Id(_) => self.parse_assignment_or_expr(),
            _ => Ok(Statement::Expression(self.parse_expr()?)),
        }
    }

    /// A statement beginning with an identifier is an assignment when a
    /// plain dotted path is followed by `=`, otherwise an expression
    /// statement.
    fn parse_assignment_or_expr(&mut self) -> Result<Statement, ParseError> {
        let mut path = vec![self.expect_id("a name")?];

        // A call right after the bare name is a constructor
        if *self.lexer.current() == Token::Char('(') {
            let name = path.remove(0);
            let atom = self.parse_constructor(name)?;
            let expr = self.continue_expr(atom)?;
            return Ok(Statement::Expression(expr));
        }

        // Collect `.name` segments while they stay a plain path
        while *self.lexer.current() == Token::Char('.') {
            self.advance()?;
            let segment = self.expect_id("a field or method name")?;
            if *self.lexer.current() == Token::Char('(') {
                // Method call: the path so far is the receiver
                let call = self.parse_call(Expr::Variable(path), segment)?;
                let expr = self.continue_expr(call)?;
                return Ok(Statement::Expression(expr));
            }
            path.push(segment);
        }

        if self.eat(&Token::Char('='))? {
            let value = self.parse_expr()?;
            if path.len() == 1 {
                let name = path.remove(0);
                return Ok(Statement::Assignment { name, value });
            }
            let field = match path.pop() {
                Some(field) => field,
                None => return Err(self.error("assignment needs a target".to_string())),
            };
            return Ok(Statement::FieldAssignment {
                object: Expr::Variable(path),
                field,
                value,
            });
        }

        let expr = self.continue_expr(Expr::Variable(path))?;
        Ok(Statement::Expression(expr))
    }

    fn end_of_line(&mut self) -> Result<(), ParseError> {
        self.expect(Token::Newline, "end of line")
    }

    fn at_line_end(&self) -> bool {
        matches!(self.lexer.current(), Token::Newline | Token::Eof)
    }

    // Expressions. Each level takes an optional already-parsed postfix
    // expression as its seed, so statement parsing can hand over a path
    // or call it consumed while disambiguating.

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or(None)
    }

    /// Finish an expression whose first postfix chain is already parsed
    fn continue_expr(&mut self, atom: Expr) -> Result<Expr, ParseError> {
        let seed = self.parse_postfix(atom)?;
        self.parse_or(Some(seed))
    }

    fn parse_or(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and(seed)?;
        while self.eat(&Token::Or)? {
            let rhs = self.parse_and(None)?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_not_test(seed)?;
        while self.eat(&Token::And)? {
            let rhs = self.parse_not_test(None)?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not_test(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        if seed.is_none() && self.eat(&Token::Not)? {
            let operand = self.parse_not_test(None)?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison(seed)
    }

    fn parse_comparison(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        let lhs = self.parse_additive(seed)?;
        let op = match self.lexer.current() {
            Token::Eq => CmpOp::Eq,
            Token::NotEq => CmpOp::NotEq,
            Token::Char('<') => CmpOp::Less,
            Token::Char('>') => CmpOp::Greater,
            Token::LessOrEq => CmpOp::LessOrEq,
            Token::GreaterOrEq => CmpOp::GreaterOrEq,
            _ => return Ok(lhs),
        };
        self.advance()?;
        let rhs = self.parse_additive(None)?;
        Ok(Expr::Comparison(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_additive(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative(seed)?;
        loop {
            let make: fn(Box<Expr>, Box<Expr>) -> Expr = match self.lexer.current() {
                Token::Char('+') => Expr::Add,
                Token::Char('-') => Expr::Sub,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_multiplicative(None)?;
            lhs = make(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary(seed)?;
        loop {
            let make: fn(Box<Expr>, Box<Expr>) -> Expr = match self.lexer.current() {
                Token::Char('*') => Expr::Mult,
                Token::Char('/') => Expr::Div,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_unary(None)?;
            lhs = make(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self, seed: Option<Expr>) -> Result<Expr, ParseError> {
        if let Some(expr) = seed {
            return Ok(expr);
        }
        if self.eat(&Token::Char('-'))? {
            let operand = self.parse_unary(None)?;
            return Ok(Expr::Sub(Box::new(Expr::Number(0)), Box::new(operand)));
        }
        let atom = self.parse_atom()?;
        self.parse_postfix(atom)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        match self.lexer.current().clone() {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::True => {
                self.advance()?;
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance()?;
                Ok(Expr::Bool(false))
            }
            Token::None => {
                self.advance()?;
                Ok(Expr::None)
            }
            Token::Char('(') => {
                self.advance()?;
                let expr = self.parse_expr()?;
                self.expect_char(')')?;
                Ok(expr)
            }
            Token::Id(name) => {
                self.advance()?;
                if *self.lexer.current() == Token::Char('(') {
                    self.parse_constructor(name)
                } else {
                    Ok(Expr::Variable(vec![name]))
                }
            }
            other => Err(self.error(format!("unexpected {other}"))),
        }
    }

    /// `.name(args)` chains and plain `.name` path segments
    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        while *self.lexer.current() == Token::Char('.') {
            self.advance()?;
            let name = self.expect_id("a field or method name")?;
            if *self.lexer.current() == Token::Char('(') {
                expr = self.parse_call(expr, name)?;
            } else if let Expr::Variable(ref mut path) = expr {
                // Field reads exist only on plain dotted paths
                path.push(name);
            } else {
                return Err(self.error(format!("expected '(' after '.{name}'")));
            }
        }
        Ok(expr)
    }

    /// `str(...)` is the stringify builtin; any other called name
    /// constructs a class instance.
    fn parse_constructor(&mut self, name: String) -> Result<Expr, ParseError> {
        let mut args = self.parse_args()?;
        if name == "str" {
            if args.len() != 1 {
                return Err(self.error("str() takes exactly one argument".to_string()));
            }
            let arg = args.remove(0);
            return Ok(Expr::Stringify(Box::new(arg)));
        }
        Ok(Expr::NewInstance {
            class: self.class_ref(name),
            args,
        })
    }

    /// Resolve a class name, deferring to a shared slot when the
    /// definition has not been seen yet
    fn class_ref(&mut self, name: String) -> ClassRef {
        if let Some(class) = self.classes.get(&name) {
            return ClassRef::resolved(Rc::clone(class));
        }
        self.pending
            .entry(name.clone())
            .or_insert_with(|| ClassRef::unresolved(name))
            .clone()
    }

    fn parse_call(&mut self, receiver: Expr, method: String) -> Result<Expr, ParseError> {
        let args = self.parse_args()?;
        Ok(Expr::MethodCall {
            receiver: Box::new(receiver),
            method,
            args,
        })
    }

    /// A parenthesized, comma-separated argument list
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect_char('(')?;
        let mut args = Vec::new();
        if *self.lexer.current() != Token::Char(')') {
            args.push(self.parse_expr()?);
            while self.eat(&Token::Char(','))? {
                args.push(self.parse_expr()?);
            }
        }
        self.expect_char(')')?;
        Ok(args)
    }

    // Token helpers

    fn advance(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.advance()?)
    }

    /// Consume `token` if it is current
    fn eat(&mut self, token: &Token) -> Result<bool, ParseError> {
        if self.lexer.current() == token {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), ParseError> {
        if *self.lexer.current() == token {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {}", what, self.lexer.current())))
        }
    }

    fn expect_char(&mut self, c: char) -> Result<(), ParseError> {
        self.expect(Token::Char(c), &format!("'{c}'"))
    }

    fn expect_id(&mut self, what: &str) -> Result<String, ParseError> {
        match self.lexer.current().clone() {
            Token::Id(name) => {
                self.advance()?;
                Ok(name)
            }
            other => Err(self.error(format!("expected {what}, found {other}"))),
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError::Syntax {
            line: self.lexer.line(),
            message,
        }
    }
}
