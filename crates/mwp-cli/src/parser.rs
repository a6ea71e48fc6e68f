//! C-subset front end
//!
//! A hand-written lexer and recursive-descent parser for the statement
//! shapes the analysis gives rules for: integer functions, declarations,
//! assignments, unary and binary expressions, conditionals and the three
//! loop forms. Preprocessor line markers and comments are skipped, so
//! preprocessed translation units feed straight in. Declarations with
//! initializers are lowered to a declaration followed by an assignment.

use crate::error::{ParseError, Result};
use mwp_core::ast::{BinOp, Expr, Function, Program, Stmt, UnOp};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(i64),
    Sym(Sym),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sym {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    Not,
    Assign,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
    Inc,
    Dec,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier {name:?}"),
            Token::Number(value) => format!("number {value}"),
            Token::Sym(sym) => format!("{sym:?}"),
        }
    }
}

/// Parse a full translation unit.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = lex(source)?;
    Parser { tokens, pos: 0 }.program()
}

/// Parse a single function body given as a statement sequence; used by
/// tests and snippets.
pub fn parse_statements(source: &str) -> Result<Vec<Stmt>> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut stmts = Vec::new();
    while parser.peek().is_some() {
        stmts.extend(parser.statement()?);
    }
    Ok(stmts)
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

fn lex(source: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut at_line_start = true;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                line += 1;
                at_line_start = true;
                continue;
            }
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            // preprocessor line markers and directives
            '#' if at_line_start => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        break;
                    }
                }
                continue;
            }
            '/' => {
                chars.next();
                match chars.peek() {
                    Some('/') => {
                        for skipped in chars.by_ref() {
                            if skipped == '\n' {
                                line += 1;
                                break;
                            }
                        }
                        continue;
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = '\0';
                        for skipped in chars.by_ref() {
                            if skipped == '\n' {
                                line += 1;
                            }
                            if prev == '*' && skipped == '/' {
                                break;
                            }
                            prev = skipped;
                        }
                    }
                    _ => tokens.push((Token::Sym(Sym::Slash), line)),
                }
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = text
                    .parse::<i64>()
                    .map_err(|_| ParseError::NumberOverflow { line })?;
                tokens.push((Token::Number(value), line));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(text), line));
            }
            _ => {
                chars.next();
                let two = |chars: &mut std::iter::Peekable<std::str::Chars>, next: char| {
                    if chars.peek() == Some(&next) {
                        chars.next();
                        true
                    } else {
                        false
                    }
                };
                let sym = match c {
                    '+' => {
                        if two(&mut chars, '+') {
                            Sym::Inc
                        } else {
                            Sym::Plus
                        }
                    }
                    '-' => {
                        if two(&mut chars, '-') {
                            Sym::Dec
                        } else {
                            Sym::Minus
                        }
                    }
                    '*' => Sym::Star,
                    '%' => Sym::Percent,
                    '<' => {
                        if two(&mut chars, '=') {
                            Sym::Le
                        } else {
                            Sym::Lt
                        }
                    }
                    '>' => {
                        if two(&mut chars, '=') {
                            Sym::Ge
                        } else {
                            Sym::Gt
                        }
                    }
                    '=' => {
                        if two(&mut chars, '=') {
                            Sym::EqEq
                        } else {
                            Sym::Assign
                        }
                    }
                    '!' => {
                        if two(&mut chars, '=') {
                            Sym::Ne
                        } else {
                            Sym::Not
                        }
                    }
                    '&' => {
                        if two(&mut chars, '&') {
                            Sym::AndAnd
                        } else {
                            return Err(ParseError::UnexpectedChar { found: '&', line });
                        }
                    }
                    '|' => {
                        if two(&mut chars, '|') {
                            Sym::OrOr
                        } else {
                            return Err(ParseError::UnexpectedChar { found: '|', line });
                        }
                    }
                    '(' => Sym::LParen,
                    ')' => Sym::RParen,
                    '{' => Sym::LBrace,
                    '}' => Sym::RBrace,
                    ';' => Sym::Semi,
                    ',' => Sym::Comma,
                    other => return Err(ParseError::UnexpectedChar { found: other, line }),
                };
                tokens.push((Token::Sym(sym), line));
            }
        }
        at_line_start = false;
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|(_, l)| *l)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_sym(&mut self, sym: Sym) -> bool {
        if self.peek() == Some(&Token::Sym(sym)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_sym(&mut self, sym: Sym, expected: &str) -> Result<()> {
        if self.eat_sym(sym) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(other) => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: expected.to_string(),
                line: self.line(),
            }),
            None => Err(ParseError::UnexpectedEof { expected: expected.to_string() }),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.describe(),
                expected: expected.to_string(),
                line: self.line(),
            },
            None => ParseError::UnexpectedEof { expected: expected.to_string() },
        }
    }

    fn at_type_keyword(&self) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == "int" || name == "void")
    }

    fn program(&mut self) -> Result<Program> {
        let mut program = Program::default();
        while self.peek().is_some() {
            if !self.at_type_keyword() {
                return Err(self.unexpected("a function definition"));
            }
            self.pos += 1; // return type
            let name = self.expect_ident("a function name")?;
            self.expect_sym(Sym::LParen, "(")?;
            let params = self.parameters()?;
            if self.eat_sym(Sym::Semi) {
                // prototype, nothing to analyze
                continue;
            }
            self.expect_sym(Sym::LBrace, "{")?;
            let body = self.block_items()?;
            program.functions.push(Function { name, params, body });
        }
        Ok(program)
    }

    fn parameters(&mut self) -> Result<Vec<String>> {
        let mut params = Vec::new();
        if self.eat_sym(Sym::RParen) {
            return Ok(params);
        }
        loop {
            if !self.at_type_keyword() {
                return Err(self.unexpected("a parameter type"));
            }
            self.pos += 1;
            // `void` as the lone parameter list
            if params.is_empty() && self.peek() == Some(&Token::Sym(Sym::RParen)) {
                break;
            }
            params.push(self.expect_ident("a parameter name")?);
            if !self.eat_sym(Sym::Comma) {
                break;
            }
        }
        self.expect_sym(Sym::RParen, ")")?;
        Ok(params)
    }

    /// Statements until the closing brace.
    fn block_items(&mut self) -> Result<Vec<Stmt>> {
        let mut items = Vec::new();
        while !self.eat_sym(Sym::RBrace) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof { expected: "}".to_string() });
            }
            items.extend(self.statement()?);
        }
        Ok(items)
    }

    /// One source statement; declarations may expand to several nodes.
    fn statement(&mut self) -> Result<Vec<Stmt>> {
        if self.eat_sym(Sym::Semi) {
            return Ok(vec![Stmt::Empty]);
        }
        if self.eat_sym(Sym::LBrace) {
            return Ok(vec![Stmt::Block(self.block_items()?)]);
        }
        if self.at_type_keyword() {
            return self.declaration();
        }
        if self.eat_keyword("return") {
            let expr = if self.peek() == Some(&Token::Sym(Sym::Semi)) {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect_sym(Sym::Semi, ";")?;
            return Ok(vec![Stmt::Return(expr)]);
        }
        if self.eat_keyword("break") {
            self.expect_sym(Sym::Semi, ";")?;
            return Ok(vec![Stmt::Break]);
        }
        if self.eat_keyword("continue") {
            self.expect_sym(Sym::Semi, ";")?;
            return Ok(vec![Stmt::Continue]);
        }
        if self.eat_keyword("if") {
            return Ok(vec![self.if_statement()?]);
        }
        if self.eat_keyword("while") {
            self.expect_sym(Sym::LParen, "(")?;
            let cond = self.expression()?;
            self.expect_sym(Sym::RParen, ")")?;
            let body = self.braced_or_single()?;
            return Ok(vec![Stmt::While { cond, body: Box::new(body) }]);
        }
        if self.eat_keyword("do") {
            let body = self.braced_or_single()?;
            if !self.eat_keyword("while") {
                return Err(self.unexpected("while"));
            }
            self.expect_sym(Sym::LParen, "(")?;
            let cond = self.expression()?;
            self.expect_sym(Sym::RParen, ")")?;
            self.expect_sym(Sym::Semi, ";")?;
            return Ok(vec![Stmt::DoWhile { cond, body: Box::new(body) }]);
        }
        if self.eat_keyword("for") {
            return Ok(vec![self.for_statement()?]);
        }

        let stmt = self.simple_statement()?;
        self.expect_sym(Sym::Semi, ";")?;
        Ok(vec![stmt])
    }

    /// `int x, y = e, z;` becomes declarations with initializers lowered to
    /// assignments.
    fn declaration(&mut self) -> Result<Vec<Stmt>> {
        self.pos += 1; // type keyword
        let mut stmts = Vec::new();
        loop {
            let name = self.expect_ident("a variable name")?;
            stmts.push(Stmt::Decl(name.clone()));
            if self.eat_sym(Sym::Assign) {
                let rhs = self.expression()?;
                stmts.push(Stmt::Assign { lhs: name, rhs });
            }
            if !self.eat_sym(Sym::Comma) {
                break;
            }
        }
        self.expect_sym(Sym::Semi, ";")?;
        Ok(stmts)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.expect_sym(Sym::LParen, "(")?;
        let cond = self.expression()?;
        self.expect_sym(Sym::RParen, ")")?;
        let then_branch = self.braced_or_single()?;
        let else_branch = if self.eat_keyword("else") {
            Some(Box::new(self.braced_or_single()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch: Some(Box::new(then_branch)),
            else_branch,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.expect_sym(Sym::LParen, "(")?;
        let init = if self.eat_sym(Sym::Semi) {
            None
        } else if self.at_type_keyword() {
            let mut decls = self.declaration()?;
            Some(Box::new(if decls.len() == 1 {
                decls.remove(0)
            } else {
                Stmt::Block(decls)
            }))
        } else {
            let stmt = self.simple_statement()?;
            self.expect_sym(Sym::Semi, ";")?;
            Some(Box::new(stmt))
        };
        let cond = if self.peek() == Some(&Token::Sym(Sym::Semi)) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_sym(Sym::Semi, ";")?;
        let step = if self.peek() == Some(&Token::Sym(Sym::RParen)) {
            None
        } else {
            Some(Box::new(self.simple_statement()?))
        };
        self.expect_sym(Sym::RParen, ")")?;
        let body = self.braced_or_single()?;
        Ok(Stmt::For { init, cond, step, body: Box::new(body) })
    }

    /// An assignment or a bare expression, without the trailing semicolon.
    fn simple_statement(&mut self) -> Result<Stmt> {
        if let Some(Token::Ident(name)) = self.peek() {
            if self.tokens.get(self.pos + 1).map(|(t, _)| t) == Some(&Token::Sym(Sym::Assign)) {
                let lhs = name.clone();
                self.pos += 2;
                let rhs = self.expression()?;
                return Ok(Stmt::Assign { lhs, rhs });
            }
        }
        Ok(Stmt::Expr(self.expression()?))
    }

    fn braced_or_single(&mut self) -> Result<Stmt> {
        let mut stmts = self.statement()?;
        Ok(if stmts.len() == 1 {
            stmts.remove(0)
        } else {
            Stmt::Block(stmts)
        })
    }

    // precedence climbing, lowest first
    fn expression(&mut self) -> Result<Expr> {
        self.binary_level(0)
    }

    fn binary_level(&mut self, level: usize) -> Result<Expr> {
        const LEVELS: [&[(Sym, BinOp)]; 5] = [
            &[(Sym::OrOr, BinOp::Or)],
            &[(Sym::AndAnd, BinOp::And)],
            &[(Sym::EqEq, BinOp::Eq), (Sym::Ne, BinOp::Ne)],
            &[
                (Sym::Lt, BinOp::Lt),
                (Sym::Gt, BinOp::Gt),
                (Sym::Le, BinOp::Le),
                (Sym::Ge, BinOp::Ge),
            ],
            &[(Sym::Plus, BinOp::Add), (Sym::Minus, BinOp::Sub)],
        ];
        if level == LEVELS.len() {
            return self.multiplicative();
        }
        let mut left = self.binary_level(level + 1)?;
        'outer: loop {
            for &(sym, op) in LEVELS[level] {
                if self.eat_sym(sym) {
                    let right = self.binary_level(level + 1)?;
                    left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat_sym(Sym::Star) {
                BinOp::Mul
            } else if self.eat_sym(Sym::Slash) {
                BinOp::Div
            } else if self.eat_sym(Sym::Percent) {
                BinOp::Mod
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = if self.eat_sym(Sym::Inc) {
            Some(UnOp::PreInc)
        } else if self.eat_sym(Sym::Dec) {
            Some(UnOp::PreDec)
        } else if self.eat_sym(Sym::Not) {
            Some(UnOp::Not)
        } else if self.eat_sym(Sym::Minus) {
            Some(UnOp::Neg)
        } else if self.eat_sym(Sym::Plus) {
            Some(UnOp::Pos)
        } else if self.eat_keyword("sizeof") {
            Some(UnOp::Sizeof)
        } else {
            None
        };
        let Some(op) = op else {
            return self.postfix();
        };
        let expr = self.unary()?;
        // fold a sign applied to a literal into the constant
        if let (UnOp::Neg, Expr::Constant(value)) = (op, &expr) {
            return Ok(Expr::Constant(-value));
        }
        if let (UnOp::Pos, Expr::Constant(value)) = (op, &expr) {
            return Ok(Expr::Constant(*value));
        }
        Ok(Expr::Unary { op, expr: Box::new(expr) })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr = self.primary()?;
        if self.eat_sym(Sym::Inc) {
            return Ok(Expr::Unary { op: UnOp::PostInc, expr: Box::new(expr) });
        }
        if self.eat_sym(Sym::Dec) {
            return Ok(Expr::Unary { op: UnOp::PostDec, expr: Box::new(expr) });
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Constant(value)),
            Some(Token::Ident(name)) => {
                if self.eat_sym(Sym::LParen) {
                    let mut args = Vec::new();
                    if !self.eat_sym(Sym::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.eat_sym(Sym::Comma) {
                                break;
                            }
                        }
                        self.expect_sym(Sym::RParen, ")")?;
                    }
                    return Ok(Expr::Call { name, args });
                }
                Ok(Expr::Id(name))
            }
            Some(Token::Sym(Sym::LParen)) => {
                let expr = self.expression()?;
                self.expect_sym(Sym::RParen, ")")?;
                Ok(expr)
            }
            Some(other) => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "an expression".to_string(),
                line: self.line(),
            }),
            None => Err(ParseError::UnexpectedEof { expected: "an expression".to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_main() {
        let program = parse("int main(){}").expect("parses");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "main");
        assert!(program.functions[0].body.is_empty());
    }

    #[test]
    fn test_parse_parameters() {
        let program = parse("int f(int x, int y) { return x; }").expect("parses");
        assert_eq!(program.functions[0].params, vec!["x", "y"]);
    }

    #[test]
    fn test_void_parameter_list_is_empty() {
        let program = parse("int f(void) {}").expect("parses");
        assert!(program.functions[0].params.is_empty());
    }

    #[test]
    fn test_declaration_with_initializer_is_lowered() {
        let stmts = parse_statements("int x = 1;").expect("parses");
        assert_eq!(stmts, vec![
            Stmt::Decl("x".into()),
            Stmt::assign("x", Expr::Constant(1)),
        ]);
    }

    #[test]
    fn test_binary_precedence() {
        let stmts = parse_statements("x = y + z * y;").expect("parses");
        let Stmt::Assign { rhs: Expr::Binary { op, right, .. }, .. } = &stmts[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_negative_literal_folds() {
        let stmts = parse_statements("x = y * -1;").expect("parses");
        let Stmt::Assign { rhs: Expr::Binary { right, .. }, .. } = &stmts[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(**right, Expr::Constant(-1));
    }

    #[test]
    fn test_loops_and_conditionals() {
        let source = r#"
            int main() {
                int i;
                for (i = 0; i < n; i++) { x = x + 1; }
                while (x < 10) x = x * 2;
                do { x--; } while (x > 0);
                if (x > 0) x = 0; else x = 1;
            }
        "#;
        let program = parse(source).expect("parses");
        let body = &program.functions[0].body;
        assert!(matches!(body[1], Stmt::For { .. }));
        assert!(matches!(body[2], Stmt::While { .. }));
        assert!(matches!(body[3], Stmt::DoWhile { .. }));
        assert!(matches!(body[4], Stmt::If { .. }));
    }

    #[test]
    fn test_comments_and_line_markers_are_skipped() {
        let source = "# 1 \"prog.c\"\nint main() {\n// line comment\n/* block\ncomment */ int x;\n}";
        let program = parse(source).expect("parses");
        assert_eq!(program.functions[0].body, vec![Stmt::Decl("x".into())]);
    }

    #[test]
    fn test_calls_parse() {
        let stmts = parse_statements("assert(x > 0);").expect("parses");
        assert!(matches!(
            &stmts[0],
            Stmt::Expr(Expr::Call { name, .. }) if name == "assert"
        ));
    }

    #[test]
    fn test_unexpected_token_is_reported() {
        let err = parse("int main() { x = ; }").expect_err("invalid");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_prototypes_are_skipped() {
        let program = parse("int f(int x); int main() {}").expect("parses");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "main");
    }
}
