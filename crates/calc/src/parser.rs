//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, loosest first: lambda / conditional, `or`, `and`, `not`,
//! comparisons, `|`, `^`, `&`, shifts, `+ -`, `* / // % @`, unary
//! `- + ~`, `**` (right associative), then calls, subscripts and attribute
//! access.

use crate::ast::{
    BinaryOp, BoolOp, CompareOp, ComprehensionKind, Expr, Generator, Keyword, UnaryOp,
};
use crate::error::{EvalError, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;

/// Maximum nesting of sub-expressions before parsing gives up.
pub const MAX_DEPTH: usize = 50;

/// Maximum tokens in one expression. Operator chains such as `1+1+...`
/// nest the tree without nesting the parser, so the token count is what
/// bounds the height of the tree the evaluator walks.
pub const MAX_TOKENS: usize = 1000;

const RESERVED: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Parse `input` as exactly one expression.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = Lexer::new(input).tokenize()?;
    // the trailing Eof does not count
    if tokens.len() > MAX_TOKENS + 1 {
        return Err(EvalError::syntax(
            tokens[MAX_TOKENS].position,
            format!("expression too long (more than {MAX_TOKENS} tokens)"),
        ));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    // ── token cursor ────────────────────────────────────────────────────

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_next(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens[self.pos].position
    }

    /// Return the current token and move past it; `Eof` is never passed.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(EvalError::syntax(self.position(), format!("expected {what}")))
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            TokenKind::Eof => Ok(()),
            TokenKind::Assign => Err(EvalError::syntax(
                self.position(),
                "assignment is a statement, not an expression",
            )),
            other => Err(EvalError::syntax(
                self.position(),
                format!("unexpected {other:?} after expression"),
            )),
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::syntax(
                self.position(),
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn ascend<T>(&mut self, result: Result<T>) -> Result<T> {
        self.depth -= 1;
        result
    }

    // ── expressions ─────────────────────────────────────────────────────

    /// Top level: a bare comma list is a tuple, as in `1, 2`.
    fn parse_expression(&mut self) -> Result<Expr> {
        let first = self.parse_named()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::Eof) {
                break;
            }
            items.push(self.parse_named()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_named(&mut self) -> Result<Expr> {
        if let (TokenKind::Name(name), Some(TokenKind::Walrus)) = (self.peek(), self.peek_next()) {
            if !is_reserved(name) {
                let target = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_test()?;
                return Ok(Expr::NamedExpr {
                    target,
                    value: Box::new(value),
                });
            }
        }
        self.parse_test()
    }

    /// An element of a list, tuple, set or argument list.
    fn parse_element(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::Star) {
            let value = self.parse_bitor()?;
            return Ok(Expr::Starred(Box::new(value)));
        }
        self.parse_named()
    }

    fn parse_test(&mut self) -> Result<Expr> {
        self.descend()?;
        let result = self.parse_test_inner();
        self.ascend(result)
    }

    fn parse_test_inner(&mut self) -> Result<Expr> {
        if self.eat_keyword("lambda") {
            return self.parse_lambda();
        }
        let body = self.parse_or()?;
        if !self.eat_keyword("if") {
            return Ok(body);
        }
        let test = self.parse_or()?;
        if !self.eat_keyword("else") {
            return Err(EvalError::syntax(self.position(), "expected 'else'"));
        }
        let orelse = self.parse_test()?;
        Ok(Expr::IfElse {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::Colon) {
            let token = self.advance();
            match token.kind {
                TokenKind::Name(name) if !is_reserved(&name) => {
                    params.push(name);
                    if self.eat(&TokenKind::Assign) {
                        self.parse_test()?;
                    }
                }
                TokenKind::Star | TokenKind::DoubleStar | TokenKind::Comma => {}
                _ => {
                    return Err(EvalError::syntax(
                        token.position,
                        "invalid lambda parameters",
                    ));
                }
            }
        }
        self.expect(&TokenKind::Colon, "':'")?;
        let body = self.parse_test()?;
        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn parse_or(&mut self) -> Result<Expr> {
        self.parse_bool_chain(BoolOp::Or, "or", Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        self.parse_bool_chain(BoolOp::And, "and", Self::parse_not)
    }

    fn parse_bool_chain(
        &mut self,
        op: BoolOp,
        keyword: &str,
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let first = next(self)?;
        if !self.check_keyword(keyword) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_keyword(keyword) {
            values.push(next(self)?);
        }
        Ok(Expr::BoolOp { op, values })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if !self.check_keyword("not") {
            return self.parse_comparison();
        }
        self.advance();
        self.descend()?;
        let operand = self.parse_not();
        let operand = self.ascend(operand)?;
        Ok(Expr::Not(Box::new(operand)))
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_bitor()?;
        let mut comparisons = Vec::new();
        while let Some(op) = self.comparison_op() {
            comparisons.push((op, self.parse_bitor()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            comparisons,
        })
    }

    fn comparison_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Less => CompareOp::Less,
            TokenKind::LessEq => CompareOp::LessEq,
            TokenKind::Greater => CompareOp::Greater,
            TokenKind::GreaterEq => CompareOp::GreaterEq,
            kind if kind.is_keyword("in") => CompareOp::In,
            kind if kind.is_keyword("is") => {
                self.advance();
                return Some(if self.eat_keyword("not") {
                    CompareOp::IsNot
                } else {
                    CompareOp::Is
                });
            }
            kind if kind.is_keyword("not")
                && self.peek_next().is_some_and(|next| next.is_keyword("in")) =>
            {
                self.advance();
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr> {
        let mut left = next(self)?;
        while let Some(op) = op_for(self.peek()) {
            self.advance();
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_bitxor, |kind| {
            (*kind == TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn parse_bitxor(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_bitand, |kind| {
            (*kind == TokenKind::Caret).then_some(BinaryOp::BitXor)
        })
    }

    fn parse_bitand(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_shift, |kind| {
            (*kind == TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn parse_shift(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_arith, |kind| match kind {
            TokenKind::LeftShift => Some(BinaryOp::LeftShift),
            TokenKind::RightShift => Some(BinaryOp::RightShift),
            _ => None,
        })
    }

    fn parse_arith(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_term, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_term(&mut self) -> Result<Expr> {
        self.parse_binary_level(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::DoubleSlash => Some(BinaryOp::FloorDiv),
            TokenKind::Percent => Some(BinaryOp::Mod),
            TokenKind::At => Some(BinaryOp::MatMul),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        self.descend()?;
        let operand = self.parse_unary();
        let operand = self.ascend(operand)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if !self.eat(&TokenKind::DoubleStar) {
            return Ok(base);
        }
        self.descend()?;
        let exponent = self.parse_unary();
        let exponent = self.ascend(exponent)?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                TokenKind::LeftParen => {
                    self.advance();
                    expr = self.parse_call(expr)?;
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_subscript()?;
                    self.expect(&TokenKind::RightBracket, "']'")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let token = self.advance();
                    let TokenKind::Name(attr) = token.kind else {
                        return Err(EvalError::syntax(
                            token.position,
                            "expected attribute name",
                        ));
                    };
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_call(&mut self, func: Expr) -> Result<Expr> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            if let (TokenKind::Name(name), Some(TokenKind::Assign)) =
                (self.peek(), self.peek_next())
            {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_test()?;
                keywords.push(Keyword { name, value });
            } else if self.eat(&TokenKind::DoubleStar) {
                let value = self.parse_test()?;
                args.push(Expr::Starred(Box::new(value)));
            } else {
                let arg = self.parse_element()?;
                if self.check_keyword("for") {
                    let generators = self.parse_generators()?;
                    args.push(Expr::Comprehension {
                        kind: ComprehensionKind::Generator,
                        element: Box::new(arg),
                        generators,
                    });
                } else {
                    args.push(arg);
                }
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(Expr::Call {
            func: Box::new(func),
            args,
            keywords,
        })
    }

    fn parse_subscript(&mut self) -> Result<Expr> {
        let first = self.parse_slice_item()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RightBracket) {
                break;
            }
            items.push(self.parse_slice_item()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_slice_item(&mut self) -> Result<Expr> {
        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_named()?;
            if !self.check(&TokenKind::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.expect(&TokenKind::Colon, "':'")?;
        let upper = self.parse_slice_bound()?;
        let step = if self.eat(&TokenKind::Colon) {
            self.parse_slice_bound()?
        } else {
            None
        };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn parse_slice_bound(&mut self) -> Result<Option<Box<Expr>>> {
        match self.peek() {
            TokenKind::Colon | TokenKind::Comma | TokenKind::RightBracket => Ok(None),
            _ => Ok(Some(Box::new(self.parse_test()?))),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(i) => Ok(Expr::Number(Value::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Number(Value::Float(f))),
            TokenKind::Str(mut text) => {
                // Adjacent literals concatenate: 'a' 'b'
                while let TokenKind::Str(next) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::Str(text))
            }
            TokenKind::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Bool(true)),
                "False" => Ok(Expr::Bool(false)),
                "None" => Ok(Expr::NoneLiteral),
                keyword if is_reserved(keyword) => Err(EvalError::syntax(
                    token.position,
                    format!("invalid syntax near '{keyword}'"),
                )),
                _ => Ok(Expr::Name(name)),
            },
            TokenKind::LeftParen => self.parse_paren(),
            TokenKind::LeftBracket => self.parse_list(),
            TokenKind::LeftBrace => self.parse_brace(),
            TokenKind::Eof => Err(EvalError::syntax(
                token.position,
                "unexpected end of expression",
            )),
            other => Err(EvalError::syntax(
                token.position,
                format!("unexpected {other:?}"),
            )),
        }
    }

    fn parse_paren(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RightParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.parse_element()?;
        if self.check_keyword("for") {
            let generators = self.parse_generators()?;
            self.expect(&TokenKind::RightParen, "')'")?;
            return Ok(Expr::Comprehension {
                kind: ComprehensionKind::Generator,
                element: Box::new(first),
                generators,
            });
        }
        if self.eat(&TokenKind::RightParen) {
            return Ok(first);
        }
        let items = self.parse_rest_of_sequence(first, &TokenKind::RightParen)?;
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(Expr::Tuple(items))
    }

    fn parse_list(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RightBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_element()?;
        if self.check_keyword("for") {
            let generators = self.parse_generators()?;
            self.expect(&TokenKind::RightBracket, "']'")?;
            return Ok(Expr::Comprehension {
                kind: ComprehensionKind::List,
                element: Box::new(first),
                generators,
            });
        }
        let items = self.parse_rest_of_sequence(first, &TokenKind::RightBracket)?;
        self.expect(&TokenKind::RightBracket, "']'")?;
        Ok(Expr::List(items))
    }

    fn parse_brace(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RightBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.parse_element()?;

        if !self.eat(&TokenKind::Colon) {
            if self.check_keyword("for") {
                let generators = self.parse_generators()?;
                self.expect(&TokenKind::RightBrace, "'}'")?;
                return Ok(Expr::Comprehension {
                    kind: ComprehensionKind::Set,
                    element: Box::new(first),
                    generators,
                });
            }
            let items = self.parse_rest_of_sequence(first, &TokenKind::RightBrace)?;
            self.expect(&TokenKind::RightBrace, "'}'")?;
            return Ok(Expr::Set(items));
        }

        let value = self.parse_test()?;
        if self.check_keyword("for") {
            let generators = self.parse_generators()?;
            self.expect(&TokenKind::RightBrace, "'}'")?;
            return Ok(Expr::Comprehension {
                kind: ComprehensionKind::Dict,
                element: Box::new(Expr::Tuple(vec![first, value])),
                generators,
            });
        }

        let mut entries = vec![(first, value)];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::RightBrace) {
                break;
            }
            let key = self.parse_test()?;
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.parse_test()?;
            entries.push((key, value));
        }
        self.expect(&TokenKind::RightBrace, "'}'")?;
        Ok(Expr::Dict(entries))
    }

    /// Continue a comma-separated display after its first element.
    fn parse_rest_of_sequence(&mut self, first: Expr, close: &TokenKind) -> Result<Vec<Expr>> {
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(close) {
                break;
            }
            items.push(self.parse_element()?);
        }
        Ok(items)
    }

    fn parse_generators(&mut self) -> Result<Vec<Generator>> {
        let mut generators = Vec::new();
        while self.eat_keyword("for") {
            let target = self.parse_target_list()?;
            if !self.eat_keyword("in") {
                return Err(EvalError::syntax(self.position(), "expected 'in'"));
            }
            let iter = self.parse_or()?;
            let mut conditions = Vec::new();
            while self.eat_keyword("if") {
                conditions.push(self.parse_or()?);
            }
            generators.push(Generator {
                target,
                iter,
                conditions,
            });
        }
        Ok(generators)
    }

    fn parse_target_list(&mut self) -> Result<Expr> {
        let first = self.parse_bitor()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check_keyword("in") {
                break;
            }
            items.push(self.parse_bitor()?);
        }
        Ok(Expr::Tuple(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Expr {
        Expr::Number(Value::Int(i))
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("2 + 3 * 4").unwrap(),
            binary(BinaryOp::Add, int(2), binary(BinaryOp::Mul, int(3), int(4)))
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse("10 - 2 - 3").unwrap(),
            binary(BinaryOp::Sub, binary(BinaryOp::Sub, int(10), int(2)), int(3))
        );
    }

    #[test]
    fn power_is_right_associative_and_beats_unary_minus() {
        assert_eq!(
            parse("2 ** 3 ** 2").unwrap(),
            binary(BinaryOp::Pow, int(2), binary(BinaryOp::Pow, int(3), int(2)))
        );
        assert_eq!(
            parse("-2 ** 2").unwrap(),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(binary(BinaryOp::Pow, int(2), int(2))),
            }
        );
    }

    #[test]
    fn tuples_and_parentheses() {
        assert_eq!(parse("(1)").unwrap(), int(1));
        assert_eq!(parse("(1,)").unwrap(), Expr::Tuple(vec![int(1)]));
        assert_eq!(parse("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(parse("1, 2").unwrap(), Expr::Tuple(vec![int(1), int(2)]));
    }

    #[test]
    fn chained_call_keeps_attribute_callee() {
        let expr = parse("__import__('os').system('ls')").unwrap();
        let Expr::Call { func, .. } = expr else {
            panic!("expected call");
        };
        assert!(matches!(*func, Expr::Attribute { ref attr, .. } if attr == "system"));
    }

    #[test]
    fn rejected_constructs_still_parse() {
        assert!(matches!(parse("lambda x: x + 1").unwrap(), Expr::Lambda { .. }));
        assert!(matches!(
            parse("[x for x in range(10)]").unwrap(),
            Expr::Comprehension {
                kind: ComprehensionKind::List,
                ..
            }
        ));
        assert!(matches!(parse("1 if 2 else 3").unwrap(), Expr::IfElse { .. }));
        assert!(matches!(parse("1 < 2 < 3").unwrap(), Expr::Compare { .. }));
        assert!(matches!(parse("x[1:2]").unwrap(), Expr::Subscript { .. }));
        assert!(matches!(parse("(y := 3)").unwrap(), Expr::NamedExpr { .. }));
        assert!(matches!(parse("{1: 2}").unwrap(), Expr::Dict(_)));
        assert!(matches!(parse("not 1").unwrap(), Expr::Not(_)));
    }

    #[test]
    fn keyword_arguments_are_collected() {
        let Expr::Call { args, keywords, .. } = parse("round(2.5, ndigits=1)").unwrap() else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert_eq!(keywords[0].name, "ndigits");
    }

    #[test]
    fn statements_are_syntax_errors() {
        assert!(matches!(parse("x = 1"), Err(EvalError::Syntax { .. })));
        assert!(matches!(parse("import os"), Err(EvalError::Syntax { .. })));
        assert!(matches!(parse("1 2"), Err(EvalError::Syntax { .. })));
        assert!(matches!(parse(""), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 5), ")".repeat(MAX_DEPTH + 5));
        assert!(matches!(parse(&deep), Err(EvalError::Syntax { .. })));

        let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(parse(&shallow).unwrap(), int(1));
    }

    #[test]
    fn long_operator_chains_are_rejected() {
        let sum = vec!["1"; 200_000].join("+");
        assert!(matches!(parse(&sum), Err(EvalError::Syntax { .. })));

        let tower = vec!["2"; MAX_DEPTH + 5].join("**");
        assert!(matches!(parse(&tower), Err(EvalError::Syntax { .. })));

        let attributes = format!("x{}", ".y".repeat(MAX_TOKENS));
        assert!(matches!(parse(&attributes), Err(EvalError::Syntax { .. })));
    }
}
