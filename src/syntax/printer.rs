//! Canonical source printer
//!
//! Emits exactly one textual form per tree: 4-space indents, one statement
//! per line, imports separated from declarations by a blank line, one blank
//! line between functions. `parse(print(tree))` reproduces `tree` (modulo
//! spans), which is what makes whole-file rewriting byte-stable on re-runs.

use super::ast::*;

/// Print a module to canonical source text
pub fn print(module: &Module) -> String {
    let mut printer = Printer::new();
    printer.print_module(module);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn comments(&mut self, comments: &[String]) {
        for comment in comments {
            self.line(&format!("//{}", comment));
        }
    }

    fn print_module(&mut self, module: &Module) {
        let mut prev_was_import = false;
        let mut first = true;
        for item in &module.items {
            match item {
                Item::Import { name, comments, .. } => {
                    if !first && !prev_was_import {
                        self.blank();
                    }
                    self.comments(comments);
                    self.line(&format!("import {}", name));
                    prev_was_import = true;
                }
                Item::Fn(decl) => {
                    if !first {
                        self.blank();
                    }
                    self.print_fn(decl);
                    prev_was_import = false;
                }
            }
            first = false;
        }
    }

    fn print_fn(&mut self, decl: &FnDecl) {
        self.comments(&decl.comments);
        self.line(&format!(
            "fn {}({}) {{",
            decl.name,
            decl.params.join(", ")
        ));
        self.indent += 1;
        for stmt in &decl.body.stmts {
            self.print_stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn print_block_body(&mut self, block: &Block) {
        self.indent += 1;
        for stmt in &block.stmts {
            self.print_stmt(stmt);
        }
        self.indent -= 1;
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        self.comments(&stmt.comments);
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let value = print_expr(value);
                self.line(&format!("let {} = {}", name, value));
            }
            StmtKind::Assign { target, value } => {
                let target = print_expr(target);
                let value = print_expr(value);
                self.line(&format!("{} = {}", target, value));
            }
            StmtKind::Expr(expr) => {
                let expr = print_expr(expr);
                self.line(&expr);
            }
            StmtKind::Return(value) => match value {
                Some(expr) => {
                    let expr = print_expr(expr);
                    self.line(&format!("return {}", expr));
                }
                None => self.line("return"),
            },
            StmtKind::If {
                cond,
                then_block,
                else_ifs,
                else_block,
            } => {
                self.line(&format!("if {} {{", print_expr(cond)));
                self.print_block_body(then_block);
                for (elif_cond, elif_block) in else_ifs {
                    self.line(&format!("}} else if {} {{", print_expr(elif_cond)));
                    self.print_block_body(elif_block);
                }
                if let Some(block) = else_block {
                    self.line("} else {");
                    self.print_block_body(block);
                }
                self.line("}");
            }
            StmtKind::While { cond, body } => {
                self.line(&format!("while {} {{", print_expr(cond)));
                self.print_block_body(body);
                self.line("}");
            }
        }
    }
}

/// Print a single expression
pub fn print_expr(expr: &Expr) -> String {
    print_expr_prec(expr, 0)
}

fn print_expr_prec(expr: &Expr, parent_prec: u8) -> String {
    match expr {
        Expr::Str(value, _) => format!("\"{}\"", escape(value)),
        Expr::Int(value, _) => value.to_string(),
        Expr::Bool(value, _) => value.to_string(),
        Expr::Path(segments, _) => segments.join("."),
        Expr::Call { func, args, .. } => {
            let args: Vec<String> = args.iter().map(|a| print_expr_prec(a, 0)).collect();
            format!("{}({})", func.join("."), args.join(", "))
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            let prec = op.precedence();
            // right operand needs parens at equal precedence (left-assoc)
            let text = format!(
                "{} {} {}",
                print_expr_prec(lhs, prec - 1),
                op.symbol(),
                print_expr_prec(rhs, prec)
            );
            if prec <= parent_prec {
                format!("({})", text)
            } else {
                text
            }
        }
        Expr::Unary { op, expr, .. } => {
            format!("{}{}", op.symbol(), print_expr_prec(expr, 7))
        }
        Expr::Map { entries, .. } => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("\"{}\": {}", escape(key), print_expr_prec(value, 0)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
