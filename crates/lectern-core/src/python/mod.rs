//! Parse-tree helpers for embedded Python snippets.
//!
//! Lesson code blocks are parsed with `rustpython-parser` into an
//! inspectable tree; nothing in this module ever executes snippet
//! code. The walkers below cover the fixed node-kind set the rules and
//! hint inspection care about (imports, calls, attributes, expression
//! statements) and recurse through nested bodies.

use rustpython_parser::ast::{self, Expr, Ranged, Stmt};
use rustpython_parser::text_size::TextSize;
use rustpython_parser::Parse;
use thiserror::Error;

/// A parsed module body.
pub type Suite = Vec<Stmt>;

/// Syntax failure with an optional source position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxIssue {
    pub message: String,
    pub line: Option<u32>,
    pub col: Option<u32>,
}

/// Parse a snippet into a module body.
pub fn parse(source: &str) -> Result<Suite, SyntaxIssue> {
    match ast::Suite::parse(source, "<embedded>") {
        Ok(suite) => Ok(suite),
        Err(err) => {
            let offset = to_offset(err.offset).min(source.len());
            let (line, col) = line_col(source, offset);
            Err(SyntaxIssue {
                message: err.error.to_string(),
                line: Some(line),
                col: Some(col),
            })
        }
    }
}

fn to_offset(size: TextSize) -> usize {
    u32::from(size) as usize
}

/// Convert a byte offset into a 1-based line and 0-based column.
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let bytes = &source.as_bytes()[..offset.min(source.len())];
    let line = bytes.iter().filter(|b| **b == b'\n').count() as u32 + 1;
    let col = match bytes.iter().rposition(|b| *b == b'\n') {
        Some(pos) => (bytes.len() - pos - 1) as u32,
        None => bytes.len() as u32,
    };
    (line, col)
}

/// Source position of a node as `(line, col)` options.
pub fn location(source: &str, node: &impl Ranged) -> (Option<u32>, Option<u32>) {
    let (line, col) = line_col(source, to_offset(node.start()));
    (Some(line), Some(col))
}

/// Original source text of a node, when its range is sliceable.
pub fn segment<'a>(source: &'a str, node: &impl Ranged) -> Option<&'a str> {
    let start = to_offset(node.start());
    let end = to_offset(node.end());
    if end > source.len() || start > end {
        return None;
    }
    if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
        return None;
    }
    Some(&source[start..end])
}

/// Name a call target: `print` for names, `show` for attributes.
pub fn call_func_name(func: &Expr) -> Option<&str> {
    match func {
        Expr::Name(name) => Some(name.id.as_str()),
        Expr::Attribute(attr) => Some(attr.attr.as_str()),
        _ => None,
    }
}

/// Dotted name of an expression, e.g. `os.system` for the call target
/// in `os.system('ls')`. Used by the hint inspection layer.
pub fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.id.to_string()),
        Expr::Attribute(attr) => match dotted_name(&attr.value) {
            Some(base) => Some(format!("{}.{}", base, attr.attr.as_str())),
            None => Some(attr.attr.to_string()),
        },
        _ => None,
    }
}

/// Chained attribute names from a call or attribute expression,
/// innermost first: `df.groupby('a').sum()` yields `[groupby, sum]`.
pub fn attribute_chain(expr: &Expr) -> Vec<String> {
    let mut methods = Vec::new();
    let mut current = expr;

    loop {
        match current {
            Expr::Call(call) => current = &call.func,
            Expr::Attribute(attr) => {
                methods.push(attr.attr.to_string());
                current = &attr.value;
            }
            Expr::Subscript(sub) => current = &sub.value,
            _ => break,
        }
    }

    methods.reverse();
    methods
}

/// True for the module's leading docstring expression statement.
pub fn is_docstring(stmt: &Stmt, index: usize) -> bool {
    if index != 0 {
        return false;
    }
    match stmt {
        Stmt::Expr(expr_stmt) => matches!(
            &*expr_stmt.value,
            Expr::Constant(constant) if matches!(constant.value, ast::Constant::Str(_))
        ),
        _ => false,
    }
}

/// True when any statement anywhere in the tree is an import.
pub fn contains_import(suite: &[Stmt]) -> bool {
    let mut found = false;
    walk_stmts(suite, &mut |stmt| {
        if matches!(stmt, Stmt::Import(_) | Stmt::ImportFrom(_)) {
            found = true;
        }
    });
    found
}

/// Root module names imported anywhere in the tree, in source order,
/// deduplicated.
pub fn imported_roots(suite: &[Stmt]) -> Vec<String> {
    let mut roots: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        let root = name.split('.').next().unwrap_or(name).to_string();
        if !root.is_empty() && !roots.contains(&root) {
            roots.push(root);
        }
    };

    let mut collected: Vec<String> = Vec::new();
    walk_stmts(suite, &mut |stmt| match stmt {
        Stmt::Import(import) => {
            for alias in &import.names {
                collected.push(alias.name.to_string());
            }
        }
        Stmt::ImportFrom(import) => {
            if let Some(module) = &import.module {
                collected.push(module.to_string());
            }
        }
        _ => {}
    });

    for name in &collected {
        push(name);
    }
    roots
}

/// Visit every statement in the suite, recursing into nested bodies.
pub fn walk_stmts<'a>(suite: &'a [Stmt], visit: &mut dyn FnMut(&'a Stmt)) {
    for stmt in suite {
        walk_stmt(stmt, visit);
    }
}

fn walk_stmt<'a>(stmt: &'a Stmt, visit: &mut dyn FnMut(&'a Stmt)) {
    visit(stmt);
    match stmt {
        Stmt::FunctionDef(def) => walk_stmts(&def.body, visit),
        Stmt::AsyncFunctionDef(def) => walk_stmts(&def.body, visit),
        Stmt::ClassDef(def) => walk_stmts(&def.body, visit),
        Stmt::For(stmt) => {
            walk_stmts(&stmt.body, visit);
            walk_stmts(&stmt.orelse, visit);
        }
        Stmt::AsyncFor(stmt) => {
            walk_stmts(&stmt.body, visit);
            walk_stmts(&stmt.orelse, visit);
        }
        Stmt::While(stmt) => {
            walk_stmts(&stmt.body, visit);
            walk_stmts(&stmt.orelse, visit);
        }
        Stmt::If(stmt) => {
            walk_stmts(&stmt.body, visit);
            walk_stmts(&stmt.orelse, visit);
        }
        Stmt::With(stmt) => walk_stmts(&stmt.body, visit),
        Stmt::AsyncWith(stmt) => walk_stmts(&stmt.body, visit),
        Stmt::Try(stmt) => {
            walk_stmts(&stmt.body, visit);
            for handler in &stmt.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                walk_stmts(&handler.body, visit);
            }
            walk_stmts(&stmt.orelse, visit);
            walk_stmts(&stmt.finalbody, visit);
        }
        Stmt::TryStar(stmt) => {
            walk_stmts(&stmt.body, visit);
            for handler in &stmt.handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                walk_stmts(&handler.body, visit);
            }
            walk_stmts(&stmt.orelse, visit);
            walk_stmts(&stmt.finalbody, visit);
        }
        Stmt::Match(stmt) => {
            for case in &stmt.cases {
                walk_stmts(&case.body, visit);
            }
        }
        _ => {}
    }
}

/// Visit every expression in the suite, including nested ones.
pub fn walk_exprs<'a>(suite: &'a [Stmt], visit: &mut dyn FnMut(&'a Expr)) {
    walk_stmts(suite, &mut |stmt| {
        for expr in stmt_exprs(stmt) {
            walk_expr(expr, visit);
        }
    });
}

/// Direct child expressions of a statement (bodies are handled by the
/// statement walker).
fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    let mut exprs: Vec<&Expr> = Vec::new();
    match stmt {
        Stmt::Expr(s) => exprs.push(&s.value),
        Stmt::Return(s) => {
            if let Some(value) = &s.value {
                exprs.push(value);
            }
        }
        Stmt::Assign(s) => {
            exprs.extend(s.targets.iter());
            exprs.push(&s.value);
        }
        Stmt::AugAssign(s) => {
            exprs.push(&s.target);
            exprs.push(&s.value);
        }
        Stmt::AnnAssign(s) => {
            exprs.push(&s.target);
            exprs.push(&s.annotation);
            if let Some(value) = &s.value {
                exprs.push(value);
            }
        }
        Stmt::Delete(s) => exprs.extend(s.targets.iter()),
        Stmt::For(s) => {
            exprs.push(&s.target);
            exprs.push(&s.iter);
        }
        Stmt::AsyncFor(s) => {
            exprs.push(&s.target);
            exprs.push(&s.iter);
        }
        Stmt::While(s) => exprs.push(&s.test),
        Stmt::If(s) => exprs.push(&s.test),
        Stmt::With(s) => {
            for item in &s.items {
                exprs.push(&item.context_expr);
            }
        }
        Stmt::AsyncWith(s) => {
            for item in &s.items {
                exprs.push(&item.context_expr);
            }
        }
        Stmt::Raise(s) => {
            if let Some(exc) = &s.exc {
                exprs.push(exc);
            }
            if let Some(cause) = &s.cause {
                exprs.push(cause);
            }
        }
        Stmt::Assert(s) => {
            exprs.push(&s.test);
            if let Some(msg) = &s.msg {
                exprs.push(msg);
            }
        }
        Stmt::Match(s) => exprs.push(&s.subject),
        Stmt::FunctionDef(s) => exprs.extend(s.decorator_list.iter()),
        Stmt::AsyncFunctionDef(s) => exprs.extend(s.decorator_list.iter()),
        Stmt::ClassDef(s) => {
            exprs.extend(s.bases.iter());
            exprs.extend(s.decorator_list.iter());
        }
        _ => {}
    }
    exprs
}

fn walk_expr<'a>(expr: &'a Expr, visit: &mut dyn FnMut(&'a Expr)) {
    visit(expr);
    match expr {
        Expr::BoolOp(e) => {
            for value in &e.values {
                walk_expr(value, visit);
            }
        }
        Expr::NamedExpr(e) => {
            walk_expr(&e.target, visit);
            walk_expr(&e.value, visit);
        }
        Expr::BinOp(e) => {
            walk_expr(&e.left, visit);
            walk_expr(&e.right, visit);
        }
        Expr::UnaryOp(e) => walk_expr(&e.operand, visit),
        Expr::Lambda(e) => walk_expr(&e.body, visit),
        Expr::IfExp(e) => {
            walk_expr(&e.test, visit);
            walk_expr(&e.body, visit);
            walk_expr(&e.orelse, visit);
        }
        Expr::Dict(e) => {
            for key in e.keys.iter().flatten() {
                walk_expr(key, visit);
            }
            for value in &e.values {
                walk_expr(value, visit);
            }
        }
        Expr::Set(e) => {
            for elt in &e.elts {
                walk_expr(elt, visit);
            }
        }
        Expr::ListComp(e) => {
            walk_expr(&e.elt, visit);
            walk_comprehensions(&e.generators, visit);
        }
        Expr::SetComp(e) => {
            walk_expr(&e.elt, visit);
            walk_comprehensions(&e.generators, visit);
        }
        Expr::DictComp(e) => {
            walk_expr(&e.key, visit);
            walk_expr(&e.value, visit);
            walk_comprehensions(&e.generators, visit);
        }
        Expr::GeneratorExp(e) => {
            walk_expr(&e.elt, visit);
            walk_comprehensions(&e.generators, visit);
        }
        Expr::Await(e) => walk_expr(&e.value, visit),
        Expr::Yield(e) => {
            if let Some(value) = &e.value {
                walk_expr(value, visit);
            }
        }
        Expr::YieldFrom(e) => walk_expr(&e.value, visit),
        Expr::Compare(e) => {
            walk_expr(&e.left, visit);
            for comparator in &e.comparators {
                walk_expr(comparator, visit);
            }
        }
        Expr::Call(e) => {
            walk_expr(&e.func, visit);
            for arg in &e.args {
                walk_expr(arg, visit);
            }
            for keyword in &e.keywords {
                walk_expr(&keyword.value, visit);
            }
        }
        Expr::FormattedValue(e) => {
            walk_expr(&e.value, visit);
            if let Some(spec) = &e.format_spec {
                walk_expr(spec, visit);
            }
        }
        Expr::JoinedStr(e) => {
            for value in &e.values {
                walk_expr(value, visit);
            }
        }
        Expr::Attribute(e) => walk_expr(&e.value, visit),
        Expr::Subscript(e) => {
            walk_expr(&e.value, visit);
            walk_expr(&e.slice, visit);
        }
        Expr::Starred(e) => walk_expr(&e.value, visit),
        Expr::List(e) => {
            for elt in &e.elts {
                walk_expr(elt, visit);
            }
        }
        Expr::Tuple(e) => {
            for elt in &e.elts {
                walk_expr(elt, visit);
            }
        }
        Expr::Slice(e) => {
            if let Some(lower) = &e.lower {
                walk_expr(lower, visit);
            }
            if let Some(upper) = &e.upper {
                walk_expr(upper, visit);
            }
            if let Some(step) = &e.step {
                walk_expr(step, visit);
            }
        }
        _ => {}
    }
}

fn walk_comprehensions<'a>(
    generators: &'a [ast::Comprehension],
    visit: &mut dyn FnMut(&'a Expr),
) {
    for generator in generators {
        walk_expr(&generator.target, visit);
        walk_expr(&generator.iter, visit);
        for cond in &generator.ifs {
            walk_expr(cond, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_position_for_broken_syntax() {
        let err = parse("def broken(:\n  pass").unwrap_err();
        assert!(err.line.is_some());
        assert!(!err.message.is_empty());
    }

    #[test]
    fn attribute_chain_is_innermost_first() {
        let suite = parse("df.groupby('a').sum()\n").unwrap();
        let Stmt::Expr(stmt) = &suite[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(attribute_chain(&stmt.value), vec!["groupby", "sum"]);
    }

    #[test]
    fn attribute_chain_skips_subscripts() {
        let suite = parse("df[0].filter(x).collect()\n").unwrap();
        let Stmt::Expr(stmt) = &suite[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(attribute_chain(&stmt.value), vec!["filter", "collect"]);
    }

    #[test]
    fn contains_import_sees_nested_imports() {
        let suite = parse("def helper():\n    import os\n    return os\n").unwrap();
        assert!(contains_import(&suite));

        let clean = parse("x = 1\nprint(x)\n").unwrap();
        assert!(!contains_import(&clean));
    }

    #[test]
    fn imported_roots_deduplicates() {
        let suite = parse("import pandas as pd\nfrom pandas import DataFrame\nimport numpy\n")
            .unwrap();
        assert_eq!(imported_roots(&suite), vec!["pandas", "numpy"]);
    }

    #[test]
    fn docstring_is_recognized_only_at_index_zero() {
        let suite = parse("\"\"\"Doc.\"\"\"\n'late string'\n").unwrap();
        assert!(is_docstring(&suite[0], 0));
        assert!(!is_docstring(&suite[1], 1));
    }

    #[test]
    fn line_col_is_one_based_lines() {
        let source = "a = 1\nb = 2\n";
        assert_eq!(line_col(source, 0), (1, 0));
        assert_eq!(line_col(source, 6), (2, 0));
    }

    #[test]
    fn segment_extracts_expression_source() {
        let source = "df.head()\n";
        let suite = parse(source).unwrap();
        let Stmt::Expr(stmt) = &suite[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(segment(source, &*stmt.value), Some("df.head()"));
    }
}
