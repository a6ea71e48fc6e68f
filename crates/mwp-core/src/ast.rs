//! The node vocabulary consumed by the derivation
//!
//! The analysis never sees surface syntax: an adapter (the CLI's C-subset
//! parser, or hand-built trees in tests) produces these tagged variants and
//! the derivation dispatches on them exhaustively. Constant values are kept
//! only for display; the calculus treats every constant alike.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    /// Operators the binary-op derivation rule covers.
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    PreInc,
    PostInc,
    PreDec,
    PostDec,
    Not,
    Neg,
    Pos,
    Sizeof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Id(String),
    Constant(i64),
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnOp, expr: Box<Expr> },
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn id(name: &str) -> Expr {
        Expr::Id(name.to_string())
    }

    /// The variable name, for identifier expressions.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Expr::Id(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Declaration without data flow; initializers are lowered to a
    /// following assignment by the adapter.
    Decl(String),
    Assign { lhs: String, rhs: Expr },
    /// Standalone expression statement, e.g. `x++;` or a call.
    Expr(Expr),
    If { cond: Expr, then_branch: Option<Box<Stmt>>, else_branch: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    DoWhile { cond: Expr, body: Box<Stmt> },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Return(Option<Expr>),
    Break,
    Continue,
    Empty,
}

impl Stmt {
    pub fn assign(lhs: &str, rhs: Expr) -> Stmt {
        Stmt::Assign { lhs: lhs.to_string(), rhs }
    }

    /// The statements of a block, or the statement itself as a singleton.
    pub fn body_items(&self) -> &[Stmt] {
        match self {
            Stmt::Block(items) => items,
            _ => std::slice::from_ref(self),
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, Stmt::While { .. } | Stmt::DoWhile { .. } | Stmt::For { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Program {
    pub functions: Vec<Function>,
}

/// All variable names occurring in a statement list, sorted and
/// deduplicated. This fixes the axis of the function's relations.
pub fn variables(stmts: &[Stmt]) -> Vec<String> {
    let mut vars = Vec::new();
    for stmt in stmts {
        collect_stmt(stmt, &mut vars);
    }
    vars.sort();
    vars.dedup();
    vars
}

/// Variables of a function: parameters plus everything the body mentions.
pub fn function_variables(func: &Function) -> Vec<String> {
    let mut vars = func.params.clone();
    for stmt in &func.body {
        collect_stmt(stmt, &mut vars);
    }
    vars.sort();
    vars.dedup();
    vars
}

fn collect_stmt(stmt: &Stmt, vars: &mut Vec<String>) {
    match stmt {
        Stmt::Decl(name) => vars.push(name.clone()),
        Stmt::Assign { lhs, rhs } => {
            vars.push(lhs.clone());
            collect_expr(rhs, vars);
        }
        Stmt::Expr(expr) => collect_expr(expr, vars),
        Stmt::If { cond, then_branch, else_branch } => {
            collect_expr(cond, vars);
            if let Some(stmt) = then_branch {
                collect_stmt(stmt, vars);
            }
            if let Some(stmt) = else_branch {
                collect_stmt(stmt, vars);
            }
        }
        Stmt::While { cond, body } | Stmt::DoWhile { cond, body } => {
            collect_expr(cond, vars);
            collect_stmt(body, vars);
        }
        Stmt::For { init, cond, step, body } => {
            if let Some(stmt) = init {
                collect_stmt(stmt, vars);
            }
            if let Some(expr) = cond {
                collect_expr(expr, vars);
            }
            if let Some(stmt) = step {
                collect_stmt(stmt, vars);
            }
            collect_stmt(body, vars);
        }
        Stmt::Block(items) => {
            for item in items {
                collect_stmt(item, vars);
            }
        }
        Stmt::Return(Some(expr)) => collect_expr(expr, vars),
        Stmt::Return(None) | Stmt::Break | Stmt::Continue | Stmt::Empty => {}
    }
}

fn collect_expr(expr: &Expr, vars: &mut Vec<String>) {
    match expr {
        Expr::Id(name) => vars.push(name.clone()),
        Expr::Constant(_) => {}
        Expr::Binary { left, right, .. } => {
            collect_expr(left, vars);
            collect_expr(right, vars);
        }
        Expr::Unary { expr, .. } => collect_expr(expr, vars),
        Expr::Call { args, .. } => {
            for arg in args {
                collect_expr(arg, vars);
            }
        }
    }
}

/// Every loop statement of the function, nested loops included; each is
/// analyzed independently by the loop analysis.
pub fn find_loops(func: &Function) -> Vec<&Stmt> {
    let mut loops = Vec::new();
    for stmt in &func.body {
        collect_loops(stmt, &mut loops);
    }
    loops
}

fn collect_loops<'a>(stmt: &'a Stmt, loops: &mut Vec<&'a Stmt>) {
    if stmt.is_loop() {
        loops.push(stmt);
    }
    match stmt {
        Stmt::If { then_branch, else_branch, .. } => {
            if let Some(s) = then_branch {
                collect_loops(s, loops);
            }
            if let Some(s) = else_branch {
                collect_loops(s, loops);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => collect_loops(body, loops),
        Stmt::For { body, .. } => collect_loops(body, loops),
        Stmt::Block(items) => {
            for item in items {
                collect_loops(item, loops);
            }
        }
        _ => {}
    }
}

/// Controlling variable of a recognized for-loop shape: a comparison guard
/// bounded by a plain variable, e.g. `for (…; i < n; …)` yields `n`.
pub fn loop_controller(stmt: &Stmt) -> Option<&str> {
    let Stmt::For { cond: Some(cond), .. } = stmt else {
        return None;
    };
    let Expr::Binary { op, left, right } = cond else {
        return None;
    };
    match op {
        // i < n, i <= n: the bound is on the right
        BinOp::Lt | BinOp::Le => match (left.as_id(), right.as_id()) {
            (Some(l), Some(r)) if l != r => Some(r),
            _ => None,
        },
        // n > i, n >= i: the bound is on the left
        BinOp::Gt | BinOp::Ge => match (left.as_id(), right.as_id()) {
            (Some(l), Some(r)) if l != r => Some(l),
            _ => None,
        },
        _ => None,
    }
}

/// Syntax coverage report: the constructs of a function the derivation
/// cannot give a rule for. Strict mode refuses functions with findings.
#[derive(Clone, Debug, Default)]
pub struct Coverage {
    pub unsupported: Vec<String>,
}

impl Coverage {
    pub fn full(&self) -> bool {
        self.unsupported.is_empty()
    }
}

/// Scan a function for constructs outside the supported subset.
pub fn coverage(func: &Function) -> Coverage {
    let mut report = Coverage::default();
    for stmt in &func.body {
        scan_stmt(stmt, &mut report);
    }
    report
}

fn scan_stmt(stmt: &Stmt, report: &mut Coverage) {
    match stmt {
        Stmt::Assign { rhs, .. } => match rhs {
            Expr::Id(_) | Expr::Constant(_) => {}
            Expr::Unary { expr, .. } if matches!(**expr, Expr::Id(_) | Expr::Constant(_)) => {}
            Expr::Binary { op, left, right } if op.is_arithmetic() => {
                for side in [left, right] {
                    if !matches!(**side, Expr::Id(_) | Expr::Constant(_)) {
                        report.unsupported.push(stmt.to_string());
                        return;
                    }
                }
            }
            _ => report.unsupported.push(stmt.to_string()),
        },
        Stmt::Expr(expr) => match expr {
            Expr::Unary { expr: inner, op }
                if matches!(op, UnOp::PreInc | UnOp::PostInc | UnOp::PreDec | UnOp::PostDec)
                    && matches!(**inner, Expr::Id(_)) => {}
            Expr::Call { name, .. } if name == "assert" || name == "assume" => {}
            _ => report.unsupported.push(stmt.to_string()),
        },
        Stmt::If { then_branch, else_branch, .. } => {
            if let Some(s) = then_branch {
                scan_stmt(s, report);
            }
            if let Some(s) = else_branch {
                scan_stmt(s, report);
            }
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => scan_stmt(body, report),
        Stmt::For { body, .. } => scan_stmt(body, report),
        Stmt::Block(items) => {
            for item in items {
                scan_stmt(item, report);
            }
        }
        Stmt::Decl(_) | Stmt::Return(_) | Stmt::Break | Stmt::Continue | Stmt::Empty => {}
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Id(name) => write!(f, "{name}"),
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Binary { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            Expr::Unary { op, expr } => match op {
                UnOp::PreInc => write!(f, "++{expr}"),
                UnOp::PostInc => write!(f, "{expr}++"),
                UnOp::PreDec => write!(f, "--{expr}"),
                UnOp::PostDec => write!(f, "{expr}--"),
                UnOp::Not => write!(f, "!{expr}"),
                UnOp::Neg => write!(f, "-{expr}"),
                UnOp::Pos => write!(f, "+{expr}"),
                UnOp::Sizeof => write!(f, "sizeof({expr})"),
            },
            Expr::Call { name, args } => {
                let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{name}({})", rendered.join(", "))
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Decl(name) => write!(f, "int {name};"),
            Stmt::Assign { lhs, rhs } => write!(f, "{lhs} = {rhs};"),
            Stmt::Expr(expr) => write!(f, "{expr};"),
            Stmt::If { cond, then_branch, else_branch } => {
                write!(f, "if ({cond})")?;
                if let Some(stmt) = then_branch {
                    write!(f, " {stmt}")?;
                }
                if let Some(stmt) = else_branch {
                    write!(f, " else {stmt}")?;
                }
                Ok(())
            }
            Stmt::While { cond, body } => write!(f, "while ({cond}) {body}"),
            Stmt::DoWhile { cond, body } => write!(f, "do {body} while ({cond});"),
            Stmt::For { init, cond, step, body } => {
                write!(f, "for (")?;
                if let Some(stmt) = init {
                    write!(f, "{stmt}")?;
                } else {
                    write!(f, ";")?;
                }
                if let Some(expr) = cond {
                    write!(f, " {expr}")?;
                }
                write!(f, ";")?;
                if let Some(stmt) = step {
                    let rendered = stmt.to_string();
                    write!(f, " {}", rendered.trim_end_matches(';'))?;
                }
                write!(f, ") {body}")
            }
            Stmt::Block(items) => {
                write!(f, "{{ ")?;
                for item in items {
                    write!(f, "{item} ")?;
                }
                write!(f, "}}")
            }
            Stmt::Return(Some(expr)) => write!(f, "return {expr};"),
            Stmt::Return(None) => write!(f, "return;"),
            Stmt::Break => write!(f, "break;"),
            Stmt::Continue => write!(f, "continue;"),
            Stmt::Empty => write!(f, ";"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loop() -> Stmt {
        Stmt::For {
            init: Some(Box::new(Stmt::assign("i", Expr::Constant(0)))),
            cond: Some(Expr::Binary {
                op: BinOp::Lt,
                left: Box::new(Expr::id("i")),
                right: Box::new(Expr::id("n")),
            }),
            step: Some(Box::new(Stmt::Expr(Expr::Unary {
                op: UnOp::PostInc,
                expr: Box::new(Expr::id("i")),
            }))),
            body: Box::new(Stmt::Block(vec![Stmt::assign("x", Expr::id("y"))])),
        }
    }

    #[test]
    fn test_variables_are_sorted_and_unique() {
        let stmts = vec![
            Stmt::assign("X2", Expr::Binary {
                op: BinOp::Add,
                left: Box::new(Expr::id("X3")),
                right: Box::new(Expr::id("X1")),
            }),
            Stmt::assign("X4", Expr::id("X2")),
        ];
        assert_eq!(variables(&stmts), vec!["X1", "X2", "X3", "X4"]);
    }

    #[test]
    fn test_find_loops_includes_nested() {
        let inner = Stmt::While {
            cond: Expr::Constant(1),
            body: Box::new(Stmt::Empty),
        };
        let outer = Stmt::While {
            cond: Expr::Constant(1),
            body: Box::new(Stmt::Block(vec![inner.clone()])),
        };
        let func = Function {
            name: "f".into(),
            params: vec![],
            body: vec![outer.clone()],
        };
        let loops = find_loops(&func);
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0], &outer);
        assert_eq!(loops[1], &inner);
    }

    #[test]
    fn test_loop_controller_recognition() {
        assert_eq!(loop_controller(&sample_loop()), Some("n"));

        let reversed = Stmt::For {
            init: None,
            cond: Some(Expr::Binary {
                op: BinOp::Gt,
                left: Box::new(Expr::id("n")),
                right: Box::new(Expr::id("i")),
            }),
            step: None,
            body: Box::new(Stmt::Empty),
        };
        assert_eq!(loop_controller(&reversed), Some("n"));

        let constant_bound = Stmt::For {
            init: None,
            cond: Some(Expr::Binary {
                op: BinOp::Lt,
                left: Box::new(Expr::id("i")),
                right: Box::new(Expr::Constant(10)),
            }),
            step: None,
            body: Box::new(Stmt::Empty),
        };
        assert_eq!(loop_controller(&constant_bound), None);
    }

    #[test]
    fn test_coverage_flags_unsupported() {
        let func = Function {
            name: "f".into(),
            params: vec![],
            body: vec![
                Stmt::assign("x", Expr::id("y")),
                Stmt::assign("x", Expr::Binary {
                    op: BinOp::Div,
                    left: Box::new(Expr::id("y")),
                    right: Box::new(Expr::id("z")),
                }),
            ],
        };
        let report = coverage(&func);
        assert!(!report.full());
        assert_eq!(report.unsupported.len(), 1);
    }

    #[test]
    fn test_display_round_trips_readably() {
        assert_eq!(
            sample_loop().to_string(),
            "for (i = 0; i < n; i++) { x = y; }"
        );
    }
}
