// src/extract/syntax.rs
// Syntactic completeness check using the tree-sitter Python grammar
//
// Parse only. Model-generated code is never executed here. The grammar is
// more permissive than CPython (it still knows Python 2 forms and recovers
// from odd indentation), so the tree is also checked against the Python 3
// rules it lets through.

use serde::Serialize;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{ProtocolError, Result};

/// Kind of problem found in the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SyntaxIssueKind {
    /// Tokens the grammar could not place
    Error,
    /// A token the grammar had to invent, e.g. a closing paren
    Missing,
    /// Python 2 only: `print x`, `exec code`, `<>`, `[a for a in x, y]`
    Python2,
    /// `:=` used where Python 3 requires parentheses around it
    UnparenthesizedWalrus,
    /// `return` or `yield` with no enclosing function
    OutsideFunction,
    /// A module-level statement that does not start at column 0
    UnexpectedIndent,
    /// Indentation that only lines up for some tab widths, or a dedent to a
    /// level that was never opened
    InconsistentIndent,
}

/// One syntax problem, 1-based line and column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxIssue {
    pub kind: SyntaxIssueKind,
    pub line: usize,
    pub column: usize,
    pub node_kind: String,
}

impl SyntaxIssue {
    fn at(kind: SyntaxIssueKind, node: Node) -> Self {
        let pos = node.start_position();
        Self {
            kind,
            line: pos.row + 1,
            column: pos.column + 1,
            node_kind: node.kind().to_string(),
        }
    }
}

/// Innermost definition a node sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Class,
    Function,
    Lambda,
}

/// Walrus is a syntax error as the direct child of these
const BARE_WALRUS_PARENTS: &[&str] = &[
    "expression_statement",
    "assignment",
    "augmented_assignment",
    "return_statement",
    "keyword_argument",
];

/// Statement that begins a physical line
#[derive(Debug, Clone, Copy)]
struct LineStart<'t> {
    node: Node<'t>,
    /// Indent width with tabs to multiples of 8, and with tabs as 1
    widths: (usize, usize),
}

fn python_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|_| ProtocolError::TreeSitter)?;
    Ok(parser)
}

pub fn parse_python(code: &str) -> Result<Tree> {
    python_parser()?
        .parse(code, None)
        .ok_or(ProtocolError::TreeSitter)
}

/// Every problem in the code, in source order
pub fn syntax_issues(code: &str) -> Result<Vec<SyntaxIssue>> {
    let tree = parse_python(code)?;
    let lines: Vec<&str> = code.split('\n').collect();
    let mut issues = Vec::new();
    let mut starts = Vec::new();
    visit(tree.root_node(), Scope::Module, &lines, &mut starts, &mut issues);
    check_indentation(starts, &mut issues);
    issues.sort_by_key(|i| (i.line, i.column));
    Ok(issues)
}

fn visit<'t>(
    node: Node<'t>,
    scope: Scope,
    lines: &[&str],
    starts: &mut Vec<LineStart<'t>>,
    issues: &mut Vec<SyntaxIssue>,
) {
    if node.is_missing() {
        issues.push(SyntaxIssue::at(SyntaxIssueKind::Missing, node));
    } else if node.is_error() {
        issues.push(SyntaxIssue::at(SyntaxIssueKind::Error, node));
    }

    match node.kind() {
        "print_statement" | "exec_statement" | "<>" => {
            issues.push(SyntaxIssue::at(SyntaxIssueKind::Python2, node));
        }
        // `for a in x, y` inside a comprehension needs `(x, y)` in Python 3
        "for_in_clause" if has_child_kind(node, ",") => {
            issues.push(SyntaxIssue::at(SyntaxIssueKind::Python2, node));
        }
        "return_statement" if scope != Scope::Function => {
            issues.push(SyntaxIssue::at(SyntaxIssueKind::OutsideFunction, node));
        }
        "yield" if node.is_named() && !matches!(scope, Scope::Function | Scope::Lambda) => {
            issues.push(SyntaxIssue::at(SyntaxIssueKind::OutsideFunction, node));
        }
        kind if BARE_WALRUS_PARENTS.contains(&kind) => {
            for child in node.named_children(&mut node.walk()) {
                if child.kind() == "named_expression" {
                    issues.push(SyntaxIssue::at(SyntaxIssueKind::UnparenthesizedWalrus, child));
                }
            }
        }
        "module" | "block" => {
            for child in node.named_children(&mut node.walk()) {
                let Some(start) = line_start(child, lines) else {
                    continue;
                };
                if node.kind() == "module" && start.widths.0 > 0 {
                    issues.push(SyntaxIssue::at(SyntaxIssueKind::UnexpectedIndent, child));
                }
                starts.push(start);
            }
        }
        _ => {}
    }

    let inner = match node.kind() {
        "function_definition" => Scope::Function,
        "class_definition" => Scope::Class,
        "lambda" => Scope::Lambda,
        _ => scope,
    };
    for child in node.children(&mut node.walk()) {
        visit(child, inner, lines, starts, issues);
    }
}

fn has_child_kind(node: Node, kind: &str) -> bool {
    node.children(&mut node.walk()).any(|c| c.kind() == kind)
}

/// `Some` when `node` is the first thing on its line (comments excluded)
fn line_start<'t>(node: Node<'t>, lines: &[&str]) -> Option<LineStart<'t>> {
    if matches!(node.kind(), "comment" | "ERROR") {
        return None;
    }
    let pos = node.start_position();
    let prefix = lines.get(pos.row)?.get(..pos.column)?;
    if !prefix.chars().all(|c| matches!(c, ' ' | '\t' | '\x0c')) {
        return None;
    }
    Some(LineStart {
        node,
        widths: indent_widths(prefix),
    })
}

fn indent_widths(prefix: &str) -> (usize, usize) {
    prefix.chars().fold((0, 0), |(col, alt), c| match c {
        '\t' => ((col / 8 + 1) * 8, alt + 1),
        '\x0c' => (0, 0),
        _ => (col + 1, alt + 1),
    })
}

/// Indentation must order lines the same way whatever the tab width
fn check_indentation(mut starts: Vec<LineStart>, issues: &mut Vec<SyntaxIssue>) {
    starts.sort_by_key(|s| s.node.start_position().row);
    starts.dedup_by_key(|s| s.node.start_position().row);

    let mut stack = vec![(0usize, 0usize)];
    for start in starts {
        let (col, alt) = start.widths;
        let (top, top_alt) = stack.last().copied().unwrap_or((0, 0));
        let consistent = if col > top {
            stack.push((col, alt));
            alt > top_alt
        } else {
            while stack.len() > 1 && stack.last().is_some_and(|&(c, _)| col < c) {
                stack.pop();
            }
            stack.last() == Some(&(col, alt))
        };
        if !consistent {
            issues.push(SyntaxIssue::at(SyntaxIssueKind::InconsistentIndent, start.node));
        }
    }
}

/// True when `code` contains a `return` keyword outside strings and comments
pub fn has_return_statement(code: &str) -> Result<bool> {
    let tree = parse_python(code)?;
    Ok(contains_kind(tree.root_node(), "return"))
}

fn contains_kind(node: Node, kind: &str) -> bool {
    node.kind() == kind
        || node
            .children(&mut node.walk())
            .any(|child| contains_kind(child, kind))
}

/// True when `code` is non-empty and has no syntax issues
pub fn is_syntactically_complete(code: &str) -> Result<bool> {
    if code.trim().is_empty() {
        return Ok(false);
    }
    Ok(syntax_issues(code)?.is_empty())
}
