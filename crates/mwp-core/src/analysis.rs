//! Syntax-directed derivation
//!
//! Walks a function body and builds the relation list encoding every
//! possible derivation, deferring non-deterministic rule instances to delta
//! indices. Loops trigger fixpoints and feed the delta graph; once the
//! graph derives the empty clause the derivation is unrecoverable and the
//! translation can stop early.

use crate::ast::{self, BinOp, Expr, Function, Program, Stmt, UnOp};
use crate::bound::Bound;
use crate::choice::Choices;
use crate::delta_graph::DeltaGraph;
use crate::errors::AnalysisError;
use crate::polynomial::Polynomial;
use crate::relation_list::RelationList;
use crate::result::{AnalysisResult, FuncResult, LoopResult};
use crate::semiring::Scalar;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;

/// Values a derivation choice can take.
pub const CHOICE_DOMAIN: [usize; 3] = [0, 1, 2];

/// Analyze every function of the program.
///
/// With `fin` the analysis always runs to completion, even when the delta
/// graph already rules out every bound; `strict` refuses functions using
/// unsupported syntax instead of treating the offending nodes as no-ops.
pub fn run(program: &Program, fin: bool, strict: bool) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    result.on_start();
    debug!("started analysis");
    for func in &program.functions {
        match syntax_check(func, strict) {
            Ok(()) => result.add_function(analyze_function(func, !fin)),
            Err(err) => info!("skipping: {err}"),
        }
    }
    result.on_end();
    result.log_result();
    result
}

/// Reject (strict) or tolerate (default) functions with unsupported
/// constructs; tolerated nodes are handled as no-ops by the derivation.
pub fn syntax_check(func: &Function, strict: bool) -> Result<(), AnalysisError> {
    let cover = ast::coverage(func);
    if cover.full() {
        return Ok(());
    }
    if strict {
        return Err(AnalysisError::NotAnalyzable {
            name: func.name.clone(),
            construct: cover.unsupported.join("; "),
        });
    }
    warn!(
        "{} uses unsupported syntax; {} node(s) ignored",
        func.name,
        cover.unsupported.len()
    );
    Ok(())
}

/// Analyze a single function. With `stop` the derivation halts as soon as
/// the delta graph becomes unrecoverable.
pub fn analyze_function(func: &Function, stop: bool) -> FuncResult {
    info!("Analyzing {}", func.name);
    let mut result = FuncResult::new(&func.name);

    let variables = ast::function_variables(func);
    debug!("{} variables: {}", func.name, variables.join(", "));
    debug!("{} top-level commands to analyze", func.body.len());
    let mut relations = RelationList::identity(&variables);

    let mut translator = Translator::new();
    let delta_infty = translator.statements(&mut relations, &func.body, stop);
    let index = translator.index;

    // evaluate choices and calculate a bound
    let mut choices: Option<Choices> = None;
    let mut bound: Option<Bound> = None;
    if !delta_infty {
        let evaluated = relations.first().eval(&CHOICE_DOMAIN, index);
        if let Some(first) = evaluated.first() {
            bound = Some(Bound::calculate(&relations.first().apply_choice(&first)));
        }
        choices = Some(evaluated);
    }
    let infinite = delta_infty || choices.as_ref().is_some_and(|c| c.infinite());

    result.index = index;
    result.infinite = infinite;
    result.variables = relations.first().variables.clone();
    if !(infinite && stop) {
        result.relation = Some(relations.first().clone());
    }
    if infinite && !stop {
        let by_var = relations.first().var_eval(&CHOICE_DOMAIN, index, &[]);
        let failing: Vec<String> = by_var
            .into_iter()
            .filter(|(_, c)| c.infinite())
            .map(|(v, _)| v)
            .collect();
        result.inf_flows = relations.first().infty_pairs(&failing);
    }
    if !infinite {
        result.bound = bound;
        result.choices = choices;
    }
    result.finish();
    result
}

/// Analyze every loop of every function independently, always to
/// completion, recording the minimal attainable class per variable.
pub fn run_loops(program: &Program, strict: bool) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    result.on_start();
    debug!("started loop analysis");
    for func in &program.functions {
        let loops = ast::find_loops(func);
        debug!("{}: {} analyzable loop(s)", func.name, loops.len());
        if strict && !ast::coverage(func).full() {
            info!("skipping loops of {}: unsupported syntax", func.name);
            continue;
        }
        for stmt in loops {
            result.add_loop(analyze_loop(stmt, &func.name));
        }
    }
    result.on_end();
    result.log_result();
    result
}

/// Analyze one loop statement in isolation.
pub fn analyze_loop(stmt: &Stmt, func_name: &str) -> LoopResult {
    debug_assert!(stmt.is_loop());
    let variables = ast::variables(std::slice::from_ref(stmt));
    let mut relations = RelationList::identity(&variables);

    let mut translator = Translator::new();
    let delta_infty = translator.statements(&mut relations, std::slice::from_ref(stmt), false);
    let index = translator.index;
    let relation = relations.first();

    let infinite = delta_infty
        || relation.eval(&CHOICE_DOMAIN, index).infinite();

    // minimal class per variable: tightest failure floor that still leaves
    // a valid choice for the variable's column
    let floors: [(&[Scalar], Scalar); 4] = [
        (&[Scalar::Unit, Scalar::Weak, Scalar::Poly], Scalar::Zero),
        (&[Scalar::Weak, Scalar::Poly], Scalar::Unit),
        (&[Scalar::Poly], Scalar::Weak),
        (&[], Scalar::Poly),
    ];
    let mut classes: BTreeMap<String, Scalar> = relation
        .variables
        .iter()
        .map(|v| (v.clone(), Scalar::Infty))
        .collect();
    for (fail, class) in floors {
        for (var, choices) in relation.var_eval(&CHOICE_DOMAIN, index, fail) {
            if let Some(current) = classes.get_mut(&var) {
                if current.is_infty() && !choices.infinite() {
                    *current = class;
                }
            }
        }
    }

    LoopResult {
        func_name: func_name.to_string(),
        loop_code: stmt.to_string(),
        variables: relation.variables.clone(),
        index,
        infinite,
        classes,
    }
}

/// Mutable derivation state: the next delta index and the accumulated
/// delta graph.
struct Translator {
    index: usize,
    dg: DeltaGraph,
}

impl Translator {
    fn new() -> Self {
        Translator { index: 0, dg: DeltaGraph::new(&CHOICE_DOMAIN) }
    }

    /// Translate a statement list, composing into `relations` left to
    /// right. Returns true when the delta graph became unrecoverable.
    fn statements(&mut self, relations: &mut RelationList, stmts: &[Stmt], stop: bool) -> bool {
        let mut delta_infty = false;
        for (i, stmt) in stmts.iter().enumerate() {
            debug!("computing relation {} of {}", i + 1, stmts.len());
            let (rel_list, exit) = self.compute_relation(stmt);
            delta_infty = delta_infty || exit;
            if stop && delta_infty {
                debug!("delta graph unrecoverable, stopping early");
                break;
            }
            relations.composition(&rel_list);
        }
        delta_infty
    }

    /// The dispatch table: one relation list per statement shape.
    fn compute_relation(&mut self, stmt: &Stmt) -> (RelationList, bool) {
        match stmt {
            Stmt::Decl(_) | Stmt::Return(_) | Stmt::Break | Stmt::Continue | Stmt::Empty => {
                skip()
            }
            Stmt::Assign { lhs, rhs } => match rhs {
                Expr::Binary { op, left, right } => self.binary_op(stmt, lhs, *op, left, right),
                Expr::Constant(_) => self.constant(lhs),
                Expr::Unary { op, expr } => self.unary_assign(stmt, lhs, *op, expr),
                Expr::Id(name) => self.assign_id(lhs, name),
                Expr::Call { .. } => unsupported(stmt),
            },
            Stmt::Expr(expr) => self.expr_stmt(stmt, expr),
            Stmt::If { then_branch, else_branch, .. } => {
                self.if_stmt(then_branch.as_deref(), else_branch.as_deref())
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => self.while_loop(body),
            Stmt::For { .. } => self.for_loop(stmt),
            Stmt::Block(items) => self.block(items),
        }
    }

    /// `x = c`: the constant becomes a fresh input to `x`.
    fn constant(&mut self, x: &str) -> (RelationList, bool) {
        debug!("constant value node");
        (RelationList::identity(&[x.to_string()]), false)
    }

    /// `x = y`: data flows between two distinct variables.
    fn assign_id(&mut self, x: &str, y: &str) -> (RelationList, bool) {
        if x == y {
            return skip();
        }
        debug!("computing relation {x} = {y}");
        let variables = vec![x.to_string(), y.to_string()];
        let vector = [Polynomial::zero(), Polynomial::unit()];
        let mut rel_list = RelationList::identity(&variables);
        rel_list.replace_column(&vector, x);
        (rel_list, false)
    }

    /// `x = y op z` with operands that are variables or constants.
    fn binary_op(
        &mut self,
        stmt: &Stmt,
        x: &str,
        op: BinOp,
        left: &Expr,
        right: &Expr,
    ) -> (RelationList, bool) {
        debug!("computing relation: binary op");
        if !matches!(left, Expr::Id(_) | Expr::Constant(_))
            || !matches!(right, Expr::Id(_) | Expr::Constant(_))
        {
            return unsupported(stmt);
        }
        if !op.is_arithmetic() {
            return unsupported(stmt);
        }
        let y = left.as_id();
        let z = right.as_id();
        if y.is_none() && z.is_none() {
            // both operands constant: same treatment as `x = c`
            return self.constant(x);
        }

        // unique variables of (x, y, z), in order of appearance
        let mut variables = vec![x.to_string()];
        for name in [y, z].into_iter().flatten() {
            if !variables.iter().any(|v| v == name) {
                variables.push(name.to_string());
            }
        }
        let vector = self.create_vector(x, op, y, z);
        let mut rel_list = RelationList::identity(&variables);
        rel_list.replace_column(&vector, x);
        (rel_list, false)
    }

    /// Polynomial column for a binary operation, consuming one delta
    /// index. Entries follow the order of the unique-variable list built
    /// by [`Self::binary_op`].
    fn create_vector(&mut self, x: &str, op: BinOp, y: Option<&str>, z: Option<&str>) -> Vec<Polynomial> {
        use Scalar::{Poly, Unit, Weak};
        let index = self.index;
        self.index += 1;

        let mut vector = Vec::with_capacity(3);
        // x does not occur on the right side: its prior value is erased
        if y != Some(x) && z != Some(x) {
            vector.push(Polynomial::zero());
        }
        match (op, y, z) {
            (_, Some(_), None) | (_, None, Some(_)) => {
                vector.push(Polynomial::from_scalars(index, &[Unit, Unit, Unit]));
            }
            (BinOp::Mul, Some(a), Some(b)) if a == b => {
                vector.push(Polynomial::from_scalars(index, &[Weak, Weak, Weak]));
            }
            (BinOp::Mul, Some(_), Some(_)) => {
                vector.push(Polynomial::from_scalars(index, &[Weak, Weak, Weak]));
                vector.push(Polynomial::from_scalars(index, &[Weak, Weak, Weak]));
            }
            (_, Some(a), Some(b)) if a == b => {
                vector.push(Polynomial::from_scalars(index, &[Poly, Poly, Weak]));
            }
            (_, Some(_), Some(_)) => {
                vector.push(Polynomial::from_scalars(index, &[Unit, Poly, Weak]));
                vector.push(Polynomial::from_scalars(index, &[Poly, Unit, Weak]));
            }
            (_, None, None) => unreachable!("handled as a constant assignment"),
        }
        vector
    }

    /// Assignment whose right side is a unary operation, lowered onto the
    /// other rules.
    fn unary_assign(
        &mut self,
        stmt: &Stmt,
        x: &str,
        op: UnOp,
        inner: &Expr,
    ) -> (RelationList, bool) {
        debug!("computing relation: unary");
        if inner.is_constant() {
            return self.constant(x);
        }
        let Some(y) = inner.as_id() else {
            return unsupported(stmt);
        };
        match op {
            UnOp::PreInc | UnOp::PostInc => self.lowered_binary(x, BinOp::Add, y, 1),
            UnOp::PreDec | UnOp::PostDec => self.lowered_binary(x, BinOp::Sub, y, 1),
            // integer negation yields 0 or 1
            UnOp::Not => self.constant(x),
            // the size of any integer is a constant 8..64 bytes
            UnOp::Sizeof => self.constant(x),
            // an explicit sign does nothing
            UnOp::Pos => self.assign_id(x, y),
            UnOp::Neg => self.lowered_binary(x, BinOp::Mul, y, -1),
        }
    }

    fn lowered_binary(&mut self, x: &str, op: BinOp, y: &str, constant: i64) -> (RelationList, bool) {
        debug!("{x} = {y} {} {constant} (lowered)", op.symbol());
        let left = Expr::id(y);
        let right = Expr::Constant(constant);
        let lowered = Stmt::assign(x, Expr::Binary {
            op,
            left: Box::new(left.clone()),
            right: Box::new(right.clone()),
        });
        self.binary_op(&lowered, x, op, &left, &right)
    }

    /// Standalone expression statements: increments and decrements update
    /// their operand, assertion intrinsics and everything else are no-ops.
    fn expr_stmt(&mut self, stmt: &Stmt, expr: &Expr) -> (RelationList, bool) {
        match expr {
            Expr::Unary { op, expr: inner } => match (op, inner.as_id()) {
                (UnOp::PreInc | UnOp::PostInc, Some(y)) => {
                    let y = y.to_string();
                    self.lowered_binary(&y, BinOp::Add, &y, 1)
                }
                (UnOp::PreDec | UnOp::PostDec, Some(y)) => {
                    let y = y.to_string();
                    self.lowered_binary(&y, BinOp::Sub, &y, 1)
                }
                _ => skip(),
            },
            Expr::Call { name, .. } if name == "assert" || name == "assume" => skip(),
            _ => unsupported(stmt),
        }
    }

    /// Conditionals join the two branch translations with the relation
    /// list sum.
    fn if_stmt(
        &mut self,
        then_branch: Option<&Stmt>,
        else_branch: Option<&Stmt>,
    ) -> (RelationList, bool) {
        debug!("computing relation: conditional");
        let mut true_list = RelationList::new();
        if self.if_branch(then_branch, &mut true_list) {
            return (true_list, true);
        }
        let mut false_list = RelationList::new();
        if self.if_branch(else_branch, &mut false_list) {
            return (false_list, true);
        }
        (false_list.sum(&true_list), false)
    }

    fn if_branch(&mut self, branch: Option<&Stmt>, list: &mut RelationList) -> bool {
        let Some(branch) = branch else { return false };
        for child in branch.body_items() {
            let (rel_list, exit) = self.compute_relation(child);
            if exit {
                return true;
            }
            list.composition(&rel_list);
        }
        false
    }

    /// While loops: translate the body, take the fixpoint and apply the
    /// while correction to the delta graph.
    fn while_loop(&mut self, body: &Stmt) -> (RelationList, bool) {
        debug!("analyzing while");
        let mut relations = RelationList::new();
        for child in body.body_items() {
            let (rel_list, exit) = self.compute_relation(child);
            if exit {
                return (rel_list, true);
            }
            relations.composition(&rel_list);
        }
        debug!("while loop fixpoint");
        relations.fixpoint();
        relations.while_correction(&mut self.dg);
        self.dg.fusion();
        (relations, self.dg.unavoidable())
    }

    /// For loops with a recognized controlling variable; other shapes are
    /// not covered by the loop rule and translate to a no-op.
    fn for_loop(&mut self, stmt: &Stmt) -> (RelationList, bool) {
        let Some(controller) = ast::loop_controller(stmt) else {
            return unsupported(stmt);
        };
        let controller = controller.to_string();
        let Stmt::For { body, .. } = stmt else {
            return skip();
        };
        let mut relations = RelationList::identity(&[controller.clone()]);
        for child in body.body_items() {
            let (rel_list, exit) = self.compute_relation(child);
            if exit {
                return (rel_list, true);
            }
            relations.composition(&rel_list);
        }
        debug!("loop fixpoint");
        relations.fixpoint();
        relations.loop_correction(&controller, &mut self.dg);
        self.dg.fusion();
        (relations, self.dg.unavoidable())
    }

    /// Braced blocks translate their children in sequence.
    fn block(&mut self, items: &[Stmt]) -> (RelationList, bool) {
        let mut relations = RelationList::new();
        for item in items {
            let (rel_list, exit) = self.compute_relation(item);
            relations.composition(&rel_list);
            if exit {
                return (relations, true);
            }
        }
        (relations, false)
    }
}

/// A no-op relation: the unit of composition, no index change.
fn skip() -> (RelationList, bool) {
    (RelationList::new(), false)
}

fn unsupported(node: &dyn fmt::Display) -> (RelationList, bool) {
    warn!("unsupported syntax not evaluated: {node}");
    skip()
}
