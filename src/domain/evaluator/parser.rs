//! Recursive descent parser for expressions and statements.
//!
//! Produces [`Expr`]/[`Stmt`] trees with errors that carry the character
//! offset of the offending token.

use crate::domain::error::SyntaxError;
use crate::domain::evaluator::ast::{BinaryOp, CompareOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::domain::evaluator::lexer::{Tok, Token, tokenize};

/// Words that introduce a statement the language does not execute.
const STATEMENT_KEYWORDS: &[&str] = &[
    "import", "from", "for", "while", "def", "class", "return", "pass", "del", "global",
    "nonlocal", "with", "try", "except", "finally", "raise", "assert", "yield", "break",
    "continue", "async", "await", "if", "elif", "else",
];

/// Words that can never be used as a variable name.
const RESERVED: &[&str] = &["and", "or", "not", "in", "is", "lambda", "if", "else"];

/// Deepest expression tree the parser will build.
pub const MAX_NESTING: usize = 100;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Tok {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].tok
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].pos
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn peek_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Tok::Punct(p) if *p == punct)
    }

    fn consume_punct(&mut self, punct: &str) -> bool {
        if self.peek_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Tok::Name(n) if n == keyword)
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn describe(&self) -> String {
        match self.peek() {
            Tok::Number(n) => format!("number {}", n),
            Tok::Str(_) => "string literal".to_string(),
            Tok::Name(n) => format!("'{}'", n),
            Tok::Punct(p) => format!("'{}'", p),
            Tok::Newline => "newline".to_string(),
            Tok::End => "end of input".to_string(),
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            position: self.position(),
        }
    }

    /// Enter one tree level. Callers undo it with `ascend` on success only;
    /// an error aborts the whole parse.
    fn descend(&mut self) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), SyntaxError> {
        if self.consume_punct(punct) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {}", punct, self.describe())))
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Tok::Newline) {
            self.advance();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), Tok::Newline | Tok::End) || self.peek_punct(";")
    }

    // ---- statements ----

    fn parse_statements(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            while matches!(self.peek(), Tok::Newline) || self.peek_punct(";") {
                self.advance();
            }
            if matches!(self.peek(), Tok::End) {
                return Ok(statements);
            }
            statements.push(self.parse_statement()?);
            if !self.at_statement_end() {
                return Err(self.error(format!("unexpected {}", self.describe())));
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        if let Tok::Name(word) = self.peek()
            && STATEMENT_KEYWORDS.contains(&word.as_str())
        {
            let keyword = word.clone();
            while !self.at_statement_end() {
                self.advance();
            }
            return Ok(Stmt::Keyword(keyword));
        }

        let first = self.parse_testlist()?;

        if let Some(op) = self.augmented_op() {
            self.advance();
            let value = self.parse_testlist()?;
            return Ok(Stmt::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if self.peek_punct("=") {
            let mut targets = vec![first];
            let mut value;
            loop {
                self.expect_punct("=")?;
                value = self.parse_testlist()?;
                if self.peek_punct("=") {
                    targets.push(value);
                } else {
                    break;
                }
            }
            return Ok(Stmt::Assign { targets, value });
        }

        Ok(Stmt::Expr(first))
    }

    fn augmented_op(&self) -> Option<BinaryOp> {
        let Tok::Punct(p) = self.peek() else {
            return None;
        };
        let op = match *p {
            "+=" => BinaryOp::Add,
            "-=" => BinaryOp::Sub,
            "*=" => BinaryOp::Mul,
            "/=" => BinaryOp::Div,
            "//=" => BinaryOp::FloorDiv,
            "%=" => BinaryOp::Mod,
            "**=" => BinaryOp::Pow,
            "&=" => BinaryOp::BitAnd,
            "|=" => BinaryOp::BitOr,
            "^=" => BinaryOp::BitXor,
            "<<=" => BinaryOp::LeftShift,
            ">>=" => BinaryOp::RightShift,
            _ => return None,
        };
        Some(op)
    }

    // ---- expressions ----

    /// `test (',' test)* [',']`, a tuple when a comma is present.
    fn parse_testlist(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_test()?;
        if !self.peek_punct(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.consume_punct(",") {
            if self.at_statement_end()
                || self.peek_punct("=")
                || self.peek_punct(")")
                || self.peek_punct("]")
            {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_test(&mut self) -> Result<Expr, SyntaxError> {
        self.descend()?;
        let expr = self.parse_test_body()?;
        self.ascend(1);
        Ok(expr)
    }

    fn parse_test_body(&mut self) -> Result<Expr, SyntaxError> {
        if self.consume_keyword("lambda") {
            let mut params = Vec::new();
            while !self.peek_punct(":") {
                match self.advance() {
                    Tok::Name(n) if !RESERVED.contains(&n.as_str()) => params.push(n),
                    _ => return Err(self.error("invalid lambda parameter")),
                }
                if !self.consume_punct(",") {
                    break;
                }
            }
            self.expect_punct(":")?;
            let body = self.parse_test()?;
            return Ok(Expr::Lambda {
                params,
                body: Box::new(body),
            });
        }

        let body = self.parse_or()?;
        if self.consume_keyword("if") {
            let test = self.parse_or()?;
            if !self.consume_keyword("else") {
                return Err(self.error(format!("expected 'else', found {}", self.describe())));
            }
            let orelse = self.parse_test()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_and()?;
        if !self.peek_keyword("or") {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.consume_keyword("or") {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::Logical {
            op: LogicalOp::Or,
            operands,
        })
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_not()?;
        if !self.peek_keyword("and") {
            return Ok(first);
        }
        let mut operands = vec![first];
        while self.consume_keyword("and") {
            operands.push(self.parse_not()?);
        }
        Ok(Expr::Logical {
            op: LogicalOp::And,
            operands,
        })
    }

    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        if self.consume_keyword("not") {
            self.descend()?;
            let operand = self.parse_not()?;
            self.ascend(1);
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn peek_next(&self) -> &Tok {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].tok
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek() {
            Tok::Punct(">") => CompareOp::Gt,
            Tok::Punct(">=") => CompareOp::Ge,
            Tok::Punct("<") => CompareOp::Lt,
            Tok::Punct("<=") => CompareOp::Le,
            Tok::Punct("==") => CompareOp::Eq,
            Tok::Punct("!=") => CompareOp::Ne,
            Tok::Name(n) if n == "in" => CompareOp::In,
            Tok::Name(n) if n == "is" => CompareOp::Is,
            Tok::Name(n) if n == "not" && matches!(self.peek_next(), Tok::Name(w) if w == "in") => {
                CompareOp::NotIn
            }
            _ => return None,
        };
        self.advance();
        match op {
            CompareOp::Is if self.consume_keyword("not") => Some(CompareOp::IsNot),
            CompareOp::NotIn => {
                self.advance();
                Some(op)
            }
            _ => Some(op),
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_bitor()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            rest.push((op, self.parse_bitor()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_binary_level(
        &mut self,
        ops: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, SyntaxError>,
    ) -> Result<Expr, SyntaxError> {
        let mut left = next(self)?;
        let mut levels = 0;
        'outer: loop {
            for (punct, op) in ops {
                if self.consume_punct(punct) {
                    self.descend()?;
                    levels += 1;
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            self.ascend(levels);
            return Ok(left);
        }
    }

    fn parse_bitor(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(&[("|", BinaryOp::BitOr)], Self::parse_bitxor)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(&[("^", BinaryOp::BitXor)], Self::parse_bitand)
    }

    fn parse_bitand(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(&[("&", BinaryOp::BitAnd)], Self::parse_shift)
    }

    fn parse_shift(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[("<<", BinaryOp::LeftShift), (">>", BinaryOp::RightShift)],
            Self::parse_arith,
        )
    }

    fn parse_arith(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            Self::parse_term,
        )
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary_level(
            &[
                ("*", BinaryOp::Mul),
                ("/", BinaryOp::Div),
                ("//", BinaryOp::FloorDiv),
                ("%", BinaryOp::Mod),
            ],
            Self::parse_factor,
        )
    }

    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        let op = if self.peek_punct("+") {
            UnaryOp::Plus
        } else if self.peek_punct("-") {
            UnaryOp::Minus
        } else if self.peek_punct("~") {
            UnaryOp::Invert
        } else {
            return self.parse_power();
        };
        self.advance();
        self.descend()?;
        let operand = self.parse_factor()?;
        self.ascend(1);
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` is right-associative and binds tighter than a unary sign on its left.
    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_primary()?;
        if self.consume_punct("**") {
            self.descend()?;
            let exponent = self.parse_factor()?;
            self.ascend(1);
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_atom()?;
        let mut levels = 0;
        loop {
            if !(self.peek_punct("(") || self.peek_punct("[") || self.peek_punct(".")) {
                self.ascend(levels);
                return Ok(expr);
            }
            self.descend()?;
            levels += 1;
            if self.consume_punct("(") {
                let (args, keywords) = self.parse_arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    keywords,
                };
            } else if self.consume_punct("[") {
                let index = self.parse_testlist()?;
                self.expect_punct("]")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.advance();
                match self.advance() {
                    Tok::Name(attr) => {
                        expr = Expr::Attribute {
                            value: Box::new(expr),
                            attr,
                        }
                    }
                    _ => return Err(self.error("expected attribute name after '.'")),
                }
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), SyntaxError> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.peek_punct(")") {
            if let Tok::Name(name) = self.peek().clone()
                && matches!(self.peek_next(), Tok::Punct("="))
            {
                self.advance();
                self.advance();
                keywords.push((name, self.parse_test()?));
            } else {
                if !keywords.is_empty() {
                    return Err(self.error("positional argument follows keyword argument"));
                }
                args.push(self.parse_test()?);
            }
            if !self.consume_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok((args, keywords))
    }

    fn parse_atom(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek().clone() {
            Tok::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Tok::Str(s) => {
                self.advance();
                let mut text = s;
                while let Tok::Str(more) = self.peek().clone() {
                    self.advance();
                    text.push_str(&more);
                }
                Ok(Expr::Text(text))
            }
            Tok::Name(name) => match name.as_str() {
                "True" => {
                    self.advance();
                    Ok(Expr::Bool(true))
                }
                "False" => {
                    self.advance();
                    Ok(Expr::Bool(false))
                }
                "None" => {
                    self.advance();
                    Ok(Expr::None)
                }
                n if RESERVED.contains(&n) || STATEMENT_KEYWORDS.contains(&n) => {
                    Err(self.error(format!("unexpected keyword '{}'", n)))
                }
                _ => {
                    self.advance();
                    Ok(Expr::Name(name))
                }
            },
            Tok::Punct("(") => {
                self.advance();
                if self.consume_punct(")") {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.parse_testlist()?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            Tok::Punct("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.peek_punct("]") {
                    items.push(self.parse_test()?);
                    if !self.consume_punct(",") {
                        break;
                    }
                }
                self.expect_punct("]")?;
                Ok(Expr::List(items))
            }
            _ => Err(self.error(format!("expected expression, found {}", self.describe()))),
        }
    }
}

/// Parse a single expression; trailing newlines are allowed.
pub fn parse_expression(input: &str) -> Result<Expr, SyntaxError> {
    let mut parser = Parser::new(tokenize(input)?);
    parser.skip_newlines();
    let expr = parser.parse_testlist()?;
    parser.skip_newlines();
    if !matches!(parser.peek(), Tok::End) {
        return Err(parser.error(format!("unexpected {}", parser.describe())));
    }
    Ok(expr)
}

/// Parse a statement sequence separated by newlines or `;`.
pub fn parse_statements(input: &str) -> Result<Vec<Stmt>, SyntaxError> {
    Parser::new(tokenize(input)?).parse_statements()
}
