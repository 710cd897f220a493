//! Tree-sitter based Python parser.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{ScriptError, ScriptResult};

// One parser per thread; `Parser` is not Sync.
thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = RefCell::new({
        let mut p = Parser::new();
        p.set_language(&tree_sitter_python::LANGUAGE.into())
            .ok()
            .map(|_| p)
    });
}

/// Parse a script into a syntax tree. Syntax errors are kept as ERROR nodes.
pub fn parse(source: &str) -> ScriptResult<Tree> {
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = slot.as_mut().ok_or_else(|| {
            ScriptError::ParserUnavailable("python grammar failed to load".to_string())
        })?;
        parser.parse(source, None).ok_or(ScriptError::ParseFailed)
    })
}

/// Validate that `source` is syntactically well-formed Python.
///
/// Returns the first ERROR or MISSING node as a [`ScriptError::Syntax`].
/// Constructs the grammar accepts but the Python 3 compiler rejects
/// (statement-form `print`/`exec`, `return` or `yield` outside a function)
/// are reported the same way.
pub fn check_syntax(source: &str) -> ScriptResult<()> {
    let tree = parse(source)?;
    let root = tree.root_node();

    if root.has_error() {
        let bad = first_node(root, |n| n.is_error() || n.is_missing()).unwrap_or(root);
        let pos = bad.start_position();
        let message = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            match snippet(&bad, source) {
                Some(text) => format!("invalid syntax near `{}`", text),
                None => "invalid syntax".to_string(),
            }
        };
        return Err(ScriptError::syntax(pos.row + 1, pos.column + 1, message));
    }

    match first_node(root, |n| rejected_construct(n).is_some()) {
        Some(node) => {
            let pos = node.start_position();
            let message = rejected_construct(&node).unwrap_or("invalid syntax");
            Err(ScriptError::syntax(pos.row + 1, pos.column + 1, message))
        }
        None => Ok(()),
    }
}

/// Compiler error for a node the grammar parses but Python 3 refuses.
fn rejected_construct(node: &Node) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("Missing parentheses in call to 'print'"),
        "exec_statement" => Some("Missing parentheses in call to 'exec'"),
        "return_statement" if !inside_function(node, false) => Some("'return' outside function"),
        "yield" if node.is_named() && !inside_function(node, true) => {
            Some("'yield' outside function")
        }
        _ => None,
    }
}

/// Whether `node` sits in a function body. A class body in between does not count.
fn inside_function(node: &Node, lambda_counts: bool) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "function_definition" => return true,
            "lambda" if lambda_counts => return true,
            "class_definition" => return false,
            _ => current = parent.parent(),
        }
    }
    false
}

/// Pre-order search for the first node matching `pred`.
pub(crate) fn first_node<'t>(root: Node<'t>, pred: impl Fn(&Node<'t>) -> bool) -> Option<Node<'t>> {
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        if pred(&node) {
            return Some(node);
        }

        if cursor.goto_first_child() {
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Get node text.
pub(crate) fn node_text<'s>(node: &Node, source: &'s str) -> Option<&'s str> {
    node.utf8_text(source.as_bytes()).ok()
}

fn snippet(node: &Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?.lines().next()?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(40).collect())
}
