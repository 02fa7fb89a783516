use std::rc::Rc;

use tracing::debug;

use crate::{
    ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement},
    error::{ParseError, ParseErrorKind, ParseErrors},
    lexer::Lexer,
    stack::ensure_sufficient_stack,
    token::{Token, TokenKind},
};

/// Deepest nesting of expressions accepted, counting every sub-expression
/// and function body on the way down.
pub const MAX_NESTING_DEPTH: usize = 1000;

type ParseResult<O> = Result<O, ParseError>;

type PrefixRule<'a> = fn(&mut Parser<'a>) -> ParseResult<Expression>;
type InfixRule<'a> = fn(&mut Parser<'a>, Expression) -> ParseResult<Expression>;

/// Binding power of infix positions, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Equal | TokenKind::NotEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::Greater => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LeftParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn prefix_rule<'a>(kind: TokenKind) -> Option<PrefixRule<'a>> {
    let rule: PrefixRule<'a> = match kind {
        TokenKind::Ident => Parser::parse_identifier,
        TokenKind::Int => Parser::parse_integer_literal,
        TokenKind::String => Parser::parse_string_literal,
        TokenKind::True | TokenKind::False => Parser::parse_boolean,
        TokenKind::Bang | TokenKind::Minus => Parser::parse_prefix_expression,
        TokenKind::LeftParen => Parser::parse_grouped_expression,
        TokenKind::If => Parser::parse_if_expression,
        TokenKind::Function => Parser::parse_function_literal,
        _ => return None,
    };
    Some(rule)
}

fn infix_rule<'a>(kind: TokenKind) -> Option<InfixRule<'a>> {
    let rule: InfixRule<'a> = match kind {
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Asterisk
        | TokenKind::Slash
        | TokenKind::Equal
        | TokenKind::NotEqual
        | TokenKind::Less
        | TokenKind::Greater => Parser::parse_infix_expression,
        TokenKind::LeftParen => Parser::parse_call_expression,
        _ => return None,
    };
    Some(rule)
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    Some(match kind {
        TokenKind::Plus => InfixOperator::Plus,
        TokenKind::Minus => InfixOperator::Minus,
        TokenKind::Asterisk => InfixOperator::Asterisk,
        TokenKind::Slash => InfixOperator::Slash,
        TokenKind::Equal => InfixOperator::Equal,
        TokenKind::NotEqual => InfixOperator::NotEqual,
        TokenKind::Less => InfixOperator::Less,
        TokenKind::Greater => InfixOperator::Greater,
        _ => return None,
    })
}

/// Pratt parser over the token stream of one source text.
///
/// Rule functions start with the first token of their construct as the
/// current token and return with the last token of it as the current token.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    depth: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            tokens: lexer.collect(),
            position: 0,
            depth: 0,
            errors: Vec::new(),
        }
    }

    // The lexer always ends with EOF, reading past the end keeps yielding it
    fn token_at(&self, index: usize) -> Token<'a> {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[index.min(last)]
    }

    fn current(&self) -> Token<'a> {
        self.token_at(self.position)
    }

    fn peek(&self) -> Token<'a> {
        self.token_at(self.position + 1)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn error_at(token: Token<'a>, kind: ParseErrorKind) -> ParseError {
        ParseError { kind, position: token.position }
    }

    fn expect_peek(&mut self, expected: TokenKind) -> ParseResult<()> {
        let peek = self.peek();
        if !peek.is(expected) {
            return Err(Self::error_at(peek, ParseErrorKind::UnexpectedToken { expected, got: peek.kind }))
        }
        self.advance();
        Ok(())
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek().is(TokenKind::Semicolon) {
            self.advance();
        }
    }

    // Skips the rest of the broken statement that began at `start`, so the
    // next one can be parsed. Semicolons inside braces opened by the statement
    // don't end it.
    fn synchronize(&mut self, start: usize) {
        let end = self.position.min(self.tokens.len());
        let mut depth = self.tokens[start.min(end)..end].iter().fold(0isize, |depth, token| match token.kind {
            TokenKind::LeftBrace => depth + 1,
            TokenKind::RightBrace => depth - 1,
            _ => depth,
        });

        loop {
            match self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth <= 0 => break,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    /// Parses the whole token stream. Any error makes the program unusable,
    /// but parsing carries on after it to report as many errors as possible.
    pub fn parse_program(mut self) -> Result<Program, ParseErrors> {
        let mut program = Program::default();

        while !self.current().is(TokenKind::Eof) {
            let start = self.position;
            match self.parse_statement() {
                Ok(statement) => program.statements.push(statement),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize(start);
                }
            }
            self.advance();
        }

        if self.errors.is_empty() {
            Ok(program)
        } else {
            debug!(errors = self.errors.len(), "parsing failed");
            Err(ParseErrors(self.errors))
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.current().kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> ParseResult<Statement> {
        self.expect_peek(TokenKind::Ident)?;
        let name = self.current().literal.to_owned();
        self.expect_peek(TokenKind::Assign)?;
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Statement> {
        self.advance();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Ok(Statement::Expression(expression))
    }

    fn parse_block_statement(&mut self) -> ParseResult<BlockStatement> {
        let mut block = BlockStatement::default();
        self.advance();

        while !self.current().is(TokenKind::RightBrace) {
            if self.current().is(TokenKind::Eof) {
                return Err(Self::error_at(self.current(), ParseErrorKind::UnexpectedToken {
                    expected: TokenKind::RightBrace,
                    got: TokenKind::Eof,
                }))
            }
            block.statements.push(self.parse_statement()?);
            self.advance();
        }

        Ok(block)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Self::error_at(self.current(), ParseErrorKind::NestingTooDeep(MAX_NESTING_DEPTH)))
        }

        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.parse_expression_inner(precedence));
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self, precedence: Precedence) -> ParseResult<Expression> {
        let current = self.current();
        let prefix = prefix_rule(current.kind)
            .ok_or_else(|| Self::error_at(current, ParseErrorKind::NoPrefixRule(current.kind)))?;
        let mut left = prefix(self)?;

        while !self.peek().is(TokenKind::Semicolon) && precedence < precedence_of(self.peek().kind) {
            let Some(infix) = infix_rule(self.peek().kind) else { return Ok(left) };
            self.advance();
            left = infix(self, left)?;
        }

        Ok(left)
    }

    fn parse_identifier(&mut self) -> ParseResult<Expression> {
        Ok(Expression::Identifier(self.current().literal.to_owned()))
    }

    fn parse_integer_literal(&mut self) -> ParseResult<Expression> {
        let current = self.current();
        current.literal.parse()
            .map(Expression::IntegerLiteral)
            .map_err(|_| Self::error_at(current, ParseErrorKind::InvalidInteger(current.literal.to_owned())))
    }

    fn parse_string_literal(&mut self) -> ParseResult<Expression> {
        Ok(Expression::StringLiteral(self.current().literal.to_owned()))
    }

    fn parse_boolean(&mut self) -> ParseResult<Expression> {
        Ok(Expression::Boolean(self.current().is(TokenKind::True)))
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Expression> {
        let operator = match self.current().kind {
            TokenKind::Bang => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };
        self.advance();

        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix { operator, right: Box::new(right) })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> ParseResult<Expression> {
        let current = self.current();
        let operator = infix_operator(current.kind)
            .ok_or_else(|| Self::error_at(current, ParseErrorKind::NoPrefixRule(current.kind)))?;
        let precedence = precedence_of(current.kind);
        self.advance();

        // Parsing the right side at the operator's own precedence makes
        // operators of equal precedence associate to the left
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix { operator, left: Box::new(left), right: Box::new(right) })
    }

    fn parse_grouped_expression(&mut self) -> ParseResult<Expression> {
        self.advance();

        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        Ok(expression)
    }

    fn parse_if_expression(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.advance();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek().is(TokenKind::Else) {
            self.advance();
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If { condition: Box::new(condition), consequence, alternative })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expression> {
        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expression::FunctionLiteral { parameters: parameters.into(), body: Rc::new(body) })
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek().is(TokenKind::RightParen) {
            self.advance();
            return Ok(parameters)
        }

        self.expect_peek(TokenKind::Ident)?;
        parameters.push(self.current().literal.to_owned());

        while self.peek().is(TokenKind::Comma) {
            self.advance();
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(self.current().literal.to_owned());
        }

        self.expect_peek(TokenKind::RightParen)?;
        Ok(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> ParseResult<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;
        Ok(Expression::Call { function: Box::new(function), arguments })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek().is(end) {
            self.advance();
            return Ok(list)
        }

        self.advance();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek().is(TokenKind::Comma) {
            self.advance();
            self.advance();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }
}

/// Lexes and parses a source text.
pub fn parse(source: &str) -> Result<Program, ParseErrors> {
    Parser::new(Lexer::new(source)).parse_program()
}
