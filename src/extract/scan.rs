//! Inspection-mode scanner
//!
//! Walks a parsed module in document order and reports what extraction
//! would touch, without modifying anything.

use crate::config::Config;
use crate::syntax::{Block, Expr, Module, Stmt, StmtKind};

/// One translatable call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// 1-based source line of the call
    pub line: usize,
    /// Literal text of the first argument
    pub literal: String,
    pub is_formatting: bool,
    /// Name of the enclosing function
    pub enclosing_fn: String,
}

/// A call site the scanner refuses to touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// First argument is built from `+` concatenation; never rewritten
    Concatenation { line: usize, enclosing_fn: String },
    /// First argument is some other non-literal expression
    NonLiteral {
        line: usize,
        enclosing_fn: String,
        found: String,
    },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::Concatenation { line, .. } | Diagnostic::NonLiteral { line, .. } => *line,
        }
    }
}

/// Scanner output for one module
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub matches: Vec<Match>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan a module for translatable call sites
pub fn scan(module: &Module, config: &Config) -> ScanReport {
    let mut report = ScanReport::default();
    for decl in module.fns() {
        scan_block(&decl.body, &decl.name, config, &mut report);
    }
    report
}

fn scan_block(block: &Block, enclosing: &str, config: &Config, report: &mut ScanReport) {
    for stmt in &block.stmts {
        scan_stmt(stmt, enclosing, config, report);
    }
}

fn scan_stmt(stmt: &Stmt, enclosing: &str, config: &Config, report: &mut ScanReport) {
    match &stmt.kind {
        StmtKind::Let { value, .. } => scan_expr(value, enclosing, config, report),
        StmtKind::Assign { target, value } => {
            scan_expr(target, enclosing, config, report);
            scan_expr(value, enclosing, config, report);
        }
        StmtKind::Expr(expr) => scan_expr(expr, enclosing, config, report),
        StmtKind::Return(value) => {
            if let Some(expr) = value {
                scan_expr(expr, enclosing, config, report);
            }
        }
        StmtKind::If {
            cond,
            then_block,
            else_ifs,
            else_block,
        } => {
            scan_expr(cond, enclosing, config, report);
            scan_block(then_block, enclosing, config, report);
            for (elif_cond, elif_block) in else_ifs {
                scan_expr(elif_cond, enclosing, config, report);
                scan_block(elif_block, enclosing, config, report);
            }
            if let Some(block) = else_block {
                scan_block(block, enclosing, config, report);
            }
        }
        StmtKind::While { cond, body } => {
            scan_expr(cond, enclosing, config, report);
            scan_block(body, enclosing, config, report);
        }
    }
}

fn scan_expr(expr: &Expr, enclosing: &str, config: &Config, report: &mut ScanReport) {
    match expr {
        Expr::Call { func, args, span } => {
            let name = func.last().map(String::as_str).unwrap_or("");
            if config.is_translatable(name) && !args.is_empty() {
                match &args[0] {
                    Expr::Str(literal, _) => report.matches.push(Match {
                        line: span.start.line,
                        literal: literal.clone(),
                        is_formatting: config.is_formatting(name),
                        enclosing_fn: enclosing.to_string(),
                    }),
                    Expr::Binary {
                        op: crate::syntax::BinOp::Add,
                        ..
                    } => report.diagnostics.push(Diagnostic::Concatenation {
                        line: span.start.line,
                        enclosing_fn: enclosing.to_string(),
                    }),
                    other if !super::rewrite::is_lookup_call(other, config) => {
                        report.diagnostics.push(Diagnostic::NonLiteral {
                            line: span.start.line,
                            enclosing_fn: enclosing.to_string(),
                            found: describe(other),
                        })
                    }
                    _ => {}
                }
            }
            for arg in args {
                scan_expr(arg, enclosing, config, report);
            }
        }
        Expr::Binary { lhs, rhs, .. } => {
            scan_expr(lhs, enclosing, config, report);
            scan_expr(rhs, enclosing, config, report);
        }
        Expr::Unary { expr, .. } => scan_expr(expr, enclosing, config, report),
        Expr::Map { entries, .. } => {
            for (_, value) in entries {
                scan_expr(value, enclosing, config, report);
            }
        }
        Expr::Str(..) | Expr::Int(..) | Expr::Bool(..) | Expr::Path(..) => {}
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Str(..) => "string literal",
        Expr::Int(..) => "integer literal",
        Expr::Bool(..) => "boolean literal",
        Expr::Path(..) => "variable reference",
        Expr::Call { .. } => "call expression",
        Expr::Binary { .. } => "binary expression",
        Expr::Unary { .. } => "unary expression",
        Expr::Map { .. } => "map literal",
    }
    .to_string()
}
