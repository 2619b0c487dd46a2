//! Host script generator: entry points and the shared emission context.

use std::cell::Cell;
use std::collections::HashSet;

use conduit_play_types::ast::*;

use crate::config::GeneratorConfig;
use crate::error::CodegenResult;
use crate::source_map::SourceMap;
use crate::stmt::emit_stmts;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Lower a parsed [`Program`] to host script text.
pub fn generate(program: &Program, config: &GeneratorConfig) -> CodegenResult<String> {
    generate_with_source_map(program, config).map(|(code, _)| code)
}

/// Lower a parsed [`Program`] and also return the generated-line → source map.
pub fn generate_with_source_map(
    program: &Program,
    config: &GeneratorConfig,
) -> CodegenResult<(String, SourceMap)> {
    let mut classes = HashSet::new();
    collect_class_names(&program.body, &mut classes);

    let mut ctx = GenContext::new(config, classes);
    emit_stmts(&program.body, &mut ctx)?;
    Ok(ctx.finish())
}

/// Every class defined anywhere in the program, so that calls written before
/// the definition are still lowered to `new`.
fn collect_class_names(stmts: &[Stmt], out: &mut HashSet<String>) {
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::ClassDef(class) => {
                out.insert(class.name.name.clone());
                collect_class_names(&class.body, out);
            }
            StmtKind::FunctionDef(def) => collect_class_names(&def.body, out),
            StmtKind::Decorator(dec) => {
                collect_class_names(std::slice::from_ref(dec.decorated.as_ref()), out)
            }
            StmtKind::If(if_stmt) => {
                collect_class_names(&if_stmt.then_body, out);
                collect_class_names(&if_stmt.else_body, out);
            }
            StmtKind::While(while_stmt) => collect_class_names(&while_stmt.body, out),
            StmtKind::For(for_stmt) => collect_class_names(&for_stmt.body, out),
            StmtKind::Import(_) | StmtKind::Return(_) | StmtKind::Pass | StmtKind::Expr(_) => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// GenContext
// ══════════════════════════════════════════════════════════════════════════════

/// Output buffer, indentation and scope state for one generation run.
pub struct GenContext<'a> {
    pub config: &'a GeneratorConfig,
    out: String,
    /// 1-based number of the next line to be written.
    next_line: u32,
    depth: usize,
    /// Names declared with `var` (or as parameters) per function scope.
    scopes: Vec<HashSet<String>>,
    /// Classes defined by the program itself.
    classes: HashSet<String>,
    source_map: SourceMap,
    /// Temporaries handed out so far; expression emission only borrows the
    /// context, hence the `Cell`.
    temps: Cell<u32>,
}

impl<'a> GenContext<'a> {
    pub fn new(config: &'a GeneratorConfig, classes: HashSet<String>) -> Self {
        Self {
            config,
            out: String::new(),
            next_line: 1,
            depth: 0,
            scopes: vec![HashSet::new()],
            classes,
            source_map: SourceMap::new(),
            temps: Cell::new(0),
        }
    }

    fn finish(self) -> (String, SourceMap) {
        (self.out, self.source_map)
    }

    // ── Output ───────────────────────────────────────────────────────────

    /// Write one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str(&self.config.indent);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
        self.next_line += 1;
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Record that `stmt` starts at the next generated line.
    pub fn mark(&mut self, stmt: &Stmt) {
        self.source_map
            .push(self.next_line, stmt.node_kind().to_string(), stmt.span);
    }

    // ── Scopes ───────────────────────────────────────────────────────────

    pub fn push_scope(&mut self, names: impl IntoIterator<Item = String>) {
        self.scopes.push(names.into_iter().collect());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare `name` in the current function scope. Returns `true` if it
    /// was not declared there before.
    pub fn declare(&mut self, name: &str) -> bool {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string()),
            None => false,
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }

    /// A fresh host variable name for a value that must be evaluated once.
    pub fn temp(&self) -> String {
        let n = self.temps.get();
        self.temps.set(n + 1);
        format!("__cmp{n}")
    }

    /// Whether calls to `name` construct an instance.
    pub fn is_class(&self, name: &str) -> bool {
        self.config.is_framework_class(name) || self.classes.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_applies_indentation_and_counts_lines() {
        let config = GeneratorConfig::default();
        let mut ctx = GenContext::new(&config, HashSet::new());
        ctx.line("a {");
        ctx.indent();
        ctx.line("b;");
        ctx.dedent();
        ctx.line("}");
        assert_eq!(ctx.next_line, 4);
        let (out, _) = ctx.finish();
        assert_eq!(out, "a {\n  b;\n}\n");
    }

    #[test]
    fn test_declare_is_per_function_scope() {
        let config = GeneratorConfig::default();
        let mut ctx = GenContext::new(&config, HashSet::new());
        assert!(ctx.declare("x"));
        assert!(!ctx.declare("x"));
        ctx.push_scope(["req".to_string()]);
        assert!(!ctx.is_declared("x"));
        assert!(ctx.is_declared("req"));
        assert!(ctx.declare("x"));
        ctx.pop_scope();
        assert!(ctx.is_declared("x"));
    }

    #[test]
    fn test_class_table_includes_program_classes() {
        let config = GeneratorConfig::default().with_framework_classes(["Conduit"]);
        let ctx = GenContext::new(&config, HashSet::from(["Point".to_string()]));
        assert!(ctx.is_class("Conduit"));
        assert!(ctx.is_class("Point"));
        assert!(!ctx.is_class("print"));
    }
}
