//! Test discovery in Python source via the rustpython AST.

use super::TestCase;
use anyhow::{anyhow, Result};
use rustpython_parser::text_size::TextRange;
use rustpython_parser::{ast, Parse};

/// Parse `source` and return every test function and `TestCase` method in
/// source order.
///
/// A function is a test when its name starts with `test_` or ends with
/// `_test`, or when a decorator looks like a pytest mark (`@pytest.mark.x`,
/// `@mark.x(...)`) or is a bare name containing `test`. Methods of classes
/// deriving from something named `*TestCase*` are tests when their name
/// starts with `test`, and are reported once as `Class.method`.
pub fn extract_tests(source: &str, file: &str) -> Result<Vec<TestCase>> {
    let suite = ast::Suite::parse(source, file).map_err(|e| anyhow!("syntax error: {e}"))?;
    let mut collector = Collector { source, file, tests: Vec::new() };
    collector.visit_body(&suite);
    Ok(collector.tests)
}

struct Collector<'a> {
    source: &'a str,
    file: &'a str,
    tests: Vec<TestCase>,
}

impl Collector<'_> {
    fn visit_body(&mut self, body: &[ast::Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &ast::Stmt) {
        match stmt {
            ast::Stmt::FunctionDef(f) => {
                self.function(f.name.as_str(), &f.decorator_list, f.range);
                self.visit_body(&f.body);
            }
            ast::Stmt::AsyncFunctionDef(f) => {
                self.function(f.name.as_str(), &f.decorator_list, f.range);
                self.visit_body(&f.body);
            }
            ast::Stmt::ClassDef(c) => self.class(c),
            ast::Stmt::If(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::For(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::AsyncFor(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::While(s) => {
                self.visit_body(&s.body);
                self.visit_body(&s.orelse);
            }
            ast::Stmt::With(s) => self.visit_body(&s.body),
            ast::Stmt::AsyncWith(s) => self.visit_body(&s.body),
            ast::Stmt::Try(s) => {
                self.visit_body(&s.body);
                for ast::ExceptHandler::ExceptHandler(h) in &s.handlers {
                    self.visit_body(&h.body);
                }
                self.visit_body(&s.orelse);
                self.visit_body(&s.finalbody);
            }
            ast::Stmt::TryStar(s) => {
                self.visit_body(&s.body);
                for ast::ExceptHandler::ExceptHandler(h) in &s.handlers {
                    self.visit_body(&h.body);
                }
                self.visit_body(&s.orelse);
                self.visit_body(&s.finalbody);
            }
            ast::Stmt::Match(m) => {
                for case in &m.cases {
                    self.visit_body(&case.body);
                }
            }
            _ => {}
        }
    }

    fn function(&mut self, name: &str, decorators: &[ast::Expr], range: TextRange) {
        let named_test = name.starts_with("test_") || name.ends_with("_test");
        if named_test || decorators.iter().any(is_test_decorator) {
            self.push(name.to_string(), range, None);
        }
    }

    fn class(&mut self, class: &ast::StmtClassDef) {
        if !class.bases.iter().any(is_test_case_base) {
            self.visit_body(&class.body);
            return;
        }

        let class_name = class.name.as_str();
        for stmt in &class.body {
            let method = match stmt {
                ast::Stmt::FunctionDef(f) => Some((f.name.as_str(), f.range)),
                ast::Stmt::AsyncFunctionDef(f) => Some((f.name.as_str(), f.range)),
                _ => None,
            };
            match method {
                Some((name, range)) if name.starts_with("test") => {
                    self.push(format!("{class_name}.{name}"), range, Some(class_name));
                }
                _ => self.visit_stmt(stmt),
            }
        }
    }

    fn push(&mut self, name: String, range: TextRange, class: Option<&str>) {
        let start = usize::from(range.start());
        let end = usize::from(range.end());
        let Some(body) = self.source.get(start..end) else {
            tracing::debug!("{}: no source span for {name}", self.file);
            return;
        };
        self.tests.push(TestCase {
            name,
            body: body.to_string(),
            file: self.file.to_string(),
            class: class.map(str::to_string),
        });
    }
}

/// `a.b.c` → `["c", "b", "a"]`; stops at the first non-attribute node.
fn attribute_chain(expr: &ast::Expr) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut current = expr;
    loop {
        match current {
            ast::Expr::Attribute(a) => {
                parts.push(a.attr.as_str());
                current = a.value.as_ref();
            }
            ast::Expr::Name(n) => {
                parts.push(n.id.as_str());
                break;
            }
            _ => break,
        }
    }
    parts
}

fn is_test_decorator(expr: &ast::Expr) -> bool {
    match expr {
        ast::Expr::Name(n) => n.id.as_str().to_lowercase().contains("test"),
        ast::Expr::Call(call) => attribute_chain(&call.func).contains(&"mark"),
        ast::Expr::Attribute(_) => attribute_chain(expr).contains(&"mark"),
        _ => false,
    }
}

fn is_test_case_base(expr: &ast::Expr) -> bool {
    match expr {
        ast::Expr::Name(n) => n.id.as_str().contains("TestCase"),
        ast::Expr::Attribute(a) => a.attr.as_str().contains("TestCase"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(source: &str) -> Vec<String> {
        extract_tests(source, "tests/test_x.py").unwrap().into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn finds_pytest_functions_by_name() {
        let source = "import pytest\n\ndef test_add():\n    assert 1 + 1 == 2\n\ndef helper():\n    pass\n\ndef add_test():\n    pass\n";
        assert_eq!(names(source), vec!["test_add", "add_test"]);
    }

    #[test]
    fn body_is_the_exact_source_span() {
        let source = "def test_one():\n    x = 1\n    assert x == 1\n";
        let tests = extract_tests(source, "test_one.py").unwrap();
        assert_eq!(tests.len(), 1);
        assert!(tests[0].body.starts_with("def test_one():"));
        assert!(tests[0].body.contains("assert x == 1"));
        assert_eq!(tests[0].file, "test_one.py");
        assert_eq!(tests[0].class, None);
    }

    #[test]
    fn finds_marked_functions() {
        let source = "import pytest\n\n@pytest.mark.parametrize('x', [1, 2])\ndef check_value(x):\n    assert x\n\n@pytest.mark.slow\ndef check_slow():\n    pass\n\n@property\ndef value(self):\n    pass\n";
        assert_eq!(names(source), vec!["check_value", "check_slow"]);
    }

    #[test]
    fn bare_and_called_marks_both_count() {
        let source = "from pytest import mark\n\n@mark.slow\ndef bare():\n    pass\n\n@mark.skip(reason='x')\ndef called():\n    pass\n\n@functools.cache\ndef helper():\n    pass\n";
        assert_eq!(names(source), vec!["bare", "called"]);
    }

    #[test]
    fn test_case_methods_are_qualified_and_reported_once() {
        let source = "import unittest\n\nclass MathTest(unittest.TestCase):\n    def setUp(self):\n        self.x = 1\n\n    def test_x(self):\n        self.assertEqual(self.x, 1)\n\n    def testY(self):\n        pass\n";
        let tests = extract_tests(source, "tests/test_math.py").unwrap();
        let names: Vec<_> = tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["MathTest.test_x", "MathTest.testY"]);
        assert!(tests.iter().all(|t| t.class.as_deref() == Some("MathTest")));
    }

    #[test]
    fn finds_tests_nested_in_plain_classes_and_blocks() {
        let source = "class TestThing:\n    def test_a(self):\n        pass\n\nif True:\n    def test_b():\n        pass\n";
        assert_eq!(names(source), vec!["test_a", "test_b"]);
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(extract_tests("def test_broken(:\n", "t.py").is_err());
    }
}
