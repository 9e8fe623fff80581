//! Recursive descent parser.
//!
//! Precedence, lowest first:
//!
//! ```text
//! assignment (right assoc)  = += -= *= /= &= |= ^=
//! ternary                   ?:
//! ||  &&  |  ^  &           (one level each)
//! == !=
//! < > <= >=
//! + -
//! * /
//! prefix                    - + ! ~ ++ --
//! postfix                   call, index, member, ++, --
//! primary
//! ```
//!
//! Statement terminators are optional.

use quill_value::{BinaryOp, UnaryOp};

use crate::ast::{
    DeclScope, Declarator, Expr, ExprKind, FunctionLit, Literal, Script, Stmt, StmtKind, UpdateOp,
};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token};
use crate::span::Span;
use crate::stack::with_stack_room;

/// Parse a whole source unit.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str) -> Result<Script, ParseError> {
    let tokens = tokenize(source)?;
    tracing::trace!(tokens = tokens.len(), "lexed");
    let mut parser = Parser {
        tokens,
        pos: 0,
        eof: Span::point(source.len() as u32),
    };
    parser.parse_script()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: Span,
}

/// Binding power of a binary operator token.
fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    Some(match token {
        Token::PipePipe => (BinaryOp::Or, 1),
        Token::AmpAmp => (BinaryOp::And, 2),
        Token::Pipe => (BinaryOp::BitOr, 3),
        Token::Caret => (BinaryOp::BitXor, 4),
        Token::Amp => (BinaryOp::BitAnd, 5),
        Token::EqEq => (BinaryOp::Eq, 6),
        Token::NotEq => (BinaryOp::NotEq, 6),
        Token::Lt => (BinaryOp::Lt, 7),
        Token::Gt => (BinaryOp::Gt, 7),
        Token::LtEq => (BinaryOp::LtEq, 7),
        Token::GtEq => (BinaryOp::GtEq, 7),
        Token::Plus => (BinaryOp::Add, 8),
        Token::Minus => (BinaryOp::Sub, 8),
        Token::Star => (BinaryOp::Mul, 9),
        Token::Slash => (BinaryOp::Div, 9),
        _ => return None,
    })
}

/// `None` for `=`, `Some(op)` for a compound assignment.
fn assign_op(token: &Token) -> Option<Option<BinaryOp>> {
    Some(match token {
        Token::Eq => None,
        Token::PlusEq => Some(BinaryOp::Add),
        Token::MinusEq => Some(BinaryOp::Sub),
        Token::StarEq => Some(BinaryOp::Mul),
        Token::SlashEq => Some(BinaryOp::Div),
        Token::AmpEq => Some(BinaryOp::BitAnd),
        Token::PipeEq => Some(BinaryOp::BitOr),
        Token::CaretEq => Some(BinaryOp::BitXor),
        _ => return None,
    })
}

impl Parser {
    // === Token cursor ===

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |(_, span)| *span)
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, span)) => *span,
            None => self.eof,
        }
    }

    fn bump(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let found = self
            .peek()
            .map_or_else(|| "end of input".to_owned(), Token::describe);
        ParseError::unexpected(&found, expected, self.span())
    }

    fn expect(&mut self, token: &Token) -> Result<Span, ParseError> {
        if self.at(token) {
            let span = self.span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.error_here(&token.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        if let Some(Token::Ident(name)) = self.peek() {
            let name = name.clone();
            let span = self.span();
            self.pos += 1;
            Ok((name, span))
        } else {
            Err(self.error_here("identifier"))
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Semicolon | Token::RBrace))
    }

    // === Statements ===

    fn parse_script(&mut self) -> Result<Script, ParseError> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.parse_statement()?);
        }
        Ok(Script { body })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        with_stack_room(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        let start = self.span();
        let kind = match self.peek() {
            None => return Err(self.error_here("statement")),
            Some(Token::Semicolon) => {
                self.pos += 1;
                return Ok(Stmt::new(StmtKind::Empty, start));
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                StmtKind::Block(self.parse_block_body()?)
            }
            Some(Token::If) => {
                self.pos += 1;
                let cond = self.parse_condition()?;
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.eat(&Token::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            Some(Token::While) => {
                self.pos += 1;
                let cond = self.parse_condition()?;
                let body = Box::new(self.parse_statement()?);
                StmtKind::While { cond, body }
            }
            Some(Token::For) => self.parse_for()?,
            Some(Token::Foreach) => self.parse_foreach()?,
            Some(Token::Return) => {
                self.pos += 1;
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expr()?))
                }
            }
            Some(Token::Break) => {
                self.pos += 1;
                StmtKind::Break
            }
            Some(Token::Continue) => {
                self.pos += 1;
                StmtKind::Continue
            }
            Some(Token::Throw) => {
                self.pos += 1;
                StmtKind::Throw(self.parse_expr()?)
            }
            Some(Token::DebugBreak) => {
                self.pos += 1;
                StmtKind::DebugBreak
            }
            Some(Token::Var | Token::Let) => self.parse_declaration()?,
            Some(_) => StmtKind::Expr(self.parse_expr()?),
        };
        let span = start.merge(self.prev_span());
        self.eat(&Token::Semicolon);
        Ok(Stmt::new(kind, span))
    }

    /// Statements up to and including the closing `}`.
    fn parse_block_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.error_here("`}`"));
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    /// A parenthesised condition is taken as exactly `( expr )`, so the
    /// statement that follows cannot extend it.
    fn parse_condition(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::LParen) {
            let cond = self.parse_expr()?;
            self.expect(&Token::RParen)?;
            Ok(cond)
        } else {
            self.parse_expr()
        }
    }

    fn parse_declaration(&mut self) -> Result<StmtKind, ParseError> {
        let scope = match self.bump() {
            Some((Token::Let, _)) => DeclScope::Local,
            _ => DeclScope::Global,
        };
        let mut items = Vec::new();
        loop {
            let (name, name_span) = self.expect_ident()?;
            let init = if self.eat(&Token::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            let span = init
                .as_ref()
                .map_or(name_span, |e| name_span.merge(e.span));
            items.push(Declarator { name, init, span });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(StmtKind::Declare { scope, items })
    }

    fn parse_for(&mut self) -> Result<StmtKind, ParseError> {
        self.pos += 1;
        self.expect(&Token::LParen)?;

        let init = if self.at(&Token::Semicolon) {
            None
        } else {
            let start = self.span();
            let kind = if matches!(self.peek(), Some(Token::Var | Token::Let)) {
                self.parse_declaration()?
            } else {
                StmtKind::Expr(self.parse_expr()?)
            };
            Some(Box::new(Stmt::new(kind, start.merge(self.prev_span()))))
        };
        self.expect(&Token::Semicolon)?;

        let cond = if self.at(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::Semicolon)?;

        let step = if self.at(&Token::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn parse_foreach(&mut self) -> Result<StmtKind, ParseError> {
        self.pos += 1;
        self.expect(&Token::LParen)?;
        let binding = self.parse_unary()?;
        if !binding.is_assignable() {
            return Err(ParseError::invalid_target(binding.span));
        }
        self.expect(&Token::Colon)?;
        let iterable = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::ForEach {
            binding,
            iterable,
            body,
        })
    }

    // === Expressions ===

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        with_stack_room(|| {
            let target = self.parse_ternary()?;
            let Some(op) = self.peek().and_then(assign_op) else {
                return Ok(target);
            };
            if !target.is_assignable() {
                return Err(ParseError::invalid_target(target.span));
            }
            self.pos += 1;
            let value = self.parse_assignment()?;
            let span = target.span.merge(value.span);
            Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ))
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(1)?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_assignment()?;
        self.expect(&Token::Colon)?;
        let else_expr = self.parse_assignment()?;
        let span = cond.span.merge(else_expr.span);
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    fn parse_binary(&mut self, min_power: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, power)) = self.peek().and_then(binary_op) {
            if power < min_power {
                break;
            }
            self.pos += 1;
            let rhs = self.parse_binary(power + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        with_stack_room(|| {
            let start = self.span();
            let op = match self.peek() {
                Some(Token::Minus) => UnaryOp::Neg,
                Some(Token::Bang) => UnaryOp::Not,
                Some(Token::Tilde) => UnaryOp::BitNot,
                Some(Token::Plus) => {
                    self.pos += 1;
                    let mut operand = self.parse_unary()?;
                    operand.span = start.merge(operand.span);
                    return Ok(operand);
                }
                Some(Token::PlusPlus | Token::MinusMinus) => {
                    let op = if self.at(&Token::PlusPlus) {
                        UpdateOp::Inc
                    } else {
                        UpdateOp::Dec
                    };
                    self.pos += 1;
                    let target = self.parse_unary()?;
                    if !target.is_assignable() {
                        return Err(ParseError::invalid_target(target.span));
                    }
                    let span = start.merge(target.span);
                    return Ok(Expr::new(
                        ExprKind::Update {
                            op,
                            prefix: true,
                            target: Box::new(target),
                        },
                        span,
                    ));
                }
                _ => return self.parse_postfix(),
            };
            self.pos += 1;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ))
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    while !self.at(&Token::RParen) {
                        args.push(self.parse_assignment()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    let end = self.expect(&Token::RParen)?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_expr()?;
                    let end = self.expect(&Token::RBracket)?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let (name, end) = self.expect_ident()?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                Some(Token::PlusPlus | Token::MinusMinus) => {
                    let op = if self.at(&Token::PlusPlus) {
                        UpdateOp::Inc
                    } else {
                        UpdateOp::Dec
                    };
                    if !expr.is_assignable() {
                        return Err(ParseError::invalid_target(expr.span));
                    }
                    let end = self.span();
                    self.pos += 1;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Update {
                            op,
                            prefix: false,
                            target: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.span();
        let kind = match self.peek() {
            Some(Token::Int(v)) => ExprKind::Literal(Literal::integer(*v)),
            Some(Token::Float(v)) => ExprKind::Literal(Literal::Float64(*v)),
            Some(Token::Str(text)) => ExprKind::Literal(Literal::Str(text.clone())),
            Some(Token::Ident(name)) => ExprKind::Ident(name.clone()),
            Some(Token::Var) => {
                self.pos += 1;
                let (name, end) = self.expect_ident()?;
                return Ok(Expr::new(ExprKind::GlobalIdent(name), start.merge(end)));
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Some(Token::Function) => {
                self.pos += 1;
                let function = self.parse_function()?;
                return Ok(Expr::new(
                    ExprKind::Function(Box::new(function)),
                    start.merge(self.prev_span()),
                ));
            }
            _ => return Err(self.error_here("expression")),
        };
        self.pos += 1;
        Ok(Expr::new(kind, start))
    }

    fn parse_function(&mut self) -> Result<FunctionLit, ParseError> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        while !self.at(&Token::RParen) {
            let (name, _) = self.expect_ident()?;
            params.push(name);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        self.expect(&Token::LBrace)?;
        let body = self.parse_block_body()?;
        Ok(FunctionLit { params, body })
    }
}

#[cfg(test)]
mod tests;
