use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{fs, path::Path};

use crate::{
    constants::is_declaration_file,
    error::{DiscoveryError, Result},
    types::{SpecKind, Specifier},
};

/// Reads `file` and returns every module it references, in source order.
pub fn imports_for(file: &Path) -> Result<Vec<Specifier>> {
    trace!("Parsing file for imports: {}", file.display());
    let src = fs::read_to_string(file).map_err(|e| DiscoveryError::io(file, e))?;
    imports_from_source(file, &src)
}

/// Extracts module references from already-loaded source text. The syntax
/// (JavaScript, JSX, TypeScript, TSX or declaration) is picked from `file`.
pub fn imports_from_source(file: &Path, src: &str) -> Result<Vec<Specifier>> {
    let st = source_type_for(file);
    let allocator = Allocator::default();
    let ParserReturn { program, panicked, errors, .. } =
        OxcParser::new(&allocator, src, st).parse();

    if panicked {
        let message = errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
        return Err(DiscoveryError::Parse { path: file.to_path_buf(), message });
    }

    let mut collector = ImportCollector { file, specs: Vec::new() };
    collector.visit_program(&program);

    debug!("Found {} import specifiers in {}", collector.specs.len(), file.display());
    Ok(collector.specs)
}

/// Collects module references from anywhere in a program: top-level
/// declarations as well as `require()` and `import()` nested in function
/// bodies, blocks and class members.
struct ImportCollector<'f> {
    file: &'f Path,
    specs: Vec<Specifier>,
}

impl ImportCollector<'_> {
    fn push(&mut self, request: &str, kind: SpecKind) {
        trace!("Found {:?} import: '{}' in {}", kind, request, self.file.display());
        self.specs.push(Specifier::new(request, kind));
    }
}

impl<'a> Visit<'a> for ImportCollector<'_> {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        // Type-only imports still order a migration: the types must exist first.
        let kind = if decl.import_kind.is_type() || all_specifiers_type_only(decl) {
            SpecKind::Type
        } else {
            SpecKind::Static
        };
        self.push(decl.source.value.as_str(), kind);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            let kind = if decl.export_kind.is_type() { SpecKind::Type } else { SpecKind::ReExport };
            self.push(source.value.as_str(), kind);
        }
        // `export const a = require('./a')`
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        self.push(decl.source.value.as_str(), SpecKind::ReExport);
    }

    fn visit_ts_external_module_reference(&mut self, reference: &TSExternalModuleReference<'a>) {
        self.push(reference.expression.value.as_str(), SpecKind::Static);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(sl) = &expr.source {
            self.push(sl.value.as_str(), SpecKind::Dynamic);
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee
            && callee.name.as_str() == "require"
            && let Some(Expression::StringLiteral(sl)) =
                call.arguments.first().and_then(|arg| arg.as_expression())
        {
            self.push(sl.value.as_str(), SpecKind::Static);
        }
        walk::walk_call_expression(self, call);
    }
}

fn all_specifiers_type_only(decl: &ImportDeclaration) -> bool {
    match &decl.specifiers {
        Some(specifiers) if !specifiers.is_empty() => specifiers.iter().all(|spec| match spec {
            ImportDeclarationSpecifier::ImportSpecifier(s) => s.import_kind.is_type(),
            ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => false,
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => false,
        }),
        _ => false,
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx") | Some("js")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    if is_declaration_file(name) {
        st = st.with_typescript_definition(true);
    }

    // Both syntaxes are accepted in one file; sources mid-migration mix them.
    if matches!(ext, Some("cjs") | Some("cts")) {
        st = st.with_script(true);
    } else {
        st = st.with_module(true);
    }

    st
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let file_path = dir.join(name);
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn requests(specs: &[Specifier]) -> Vec<&str> {
        specs.iter().map(|s| s.request.as_str()).collect()
    }

    #[test]
    fn test_static_import_default() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "test.js", "import foo from './foo';");
        let imports = imports_for(&file).unwrap();
        assert_eq!(imports, vec![Specifier::new("./foo", SpecKind::Static)]);
    }

    #[test]
    fn test_side_effect_import() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "test.js", "import './polyfills';");
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./polyfills"]);
        assert_eq!(imports[0].kind, SpecKind::Static);
    }

    #[test]
    fn test_dynamic_import() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "test.js", "import('./lazy');");
        let imports = imports_for(&file).unwrap();
        assert_eq!(imports, vec![Specifier::new("./lazy", SpecKind::Dynamic)]);
    }

    #[test]
    fn test_awaited_dynamic_import() {
        let temp_dir = TempDir::new().unwrap();
        let file =
            create_test_file(temp_dir.path(), "test.mjs", "const mod = await import('./lazy');");
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./lazy"]);
    }

    #[test]
    fn test_require_call() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "test.cjs", "const fs = require('fs');");
        let imports = imports_for(&file).unwrap();
        assert_eq!(imports, vec![Specifier::new("fs", SpecKind::Static)]);
    }

    #[test]
    fn test_require_with_member_access() {
        let temp_dir = TempDir::new().unwrap();
        let file =
            create_test_file(temp_dir.path(), "test.js", "const a = require('./a').default;");
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./a"]);
    }

    #[test]
    fn test_require_in_nested_expressions() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "test.js",
            "const m = cond ? require('./a') : [require('./b'), { c: require('./c') }];",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./a", "./b", "./c"]);
    }

    #[test]
    fn test_type_only_import_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let file =
            create_test_file(temp_dir.path(), "test.ts", "import type { Foo } from './types';");
        let imports = imports_for(&file).unwrap();
        assert_eq!(imports, vec![Specifier::new("./types", SpecKind::Type)]);
    }

    #[test]
    fn test_inline_type_specifiers_only() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "test.ts",
            "import { type Foo, type Bar } from './types';\nimport { type Baz, qux } from './mixed';",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(imports[0].kind, SpecKind::Type);
        assert_eq!(imports[1].kind, SpecKind::Static);
    }

    #[test]
    fn test_re_exports() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "index.ts",
            "export { a } from './a';\nexport * from './b';\nexport type { C } from './c';\nexport const d = 1;",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(
            imports,
            vec![
                Specifier::new("./a", SpecKind::ReExport),
                Specifier::new("./b", SpecKind::ReExport),
                Specifier::new("./c", SpecKind::Type),
            ]
        );
    }

    #[test]
    fn test_import_equals_require() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "test.ts", "import fs = require('./fs-shim');");
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./fs-shim"]);
    }

    #[test]
    fn test_source_order_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "test.js",
            "import z from './z';\nimport a from './a';\nconst m = require('./m');",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./z", "./a", "./m"]);
    }

    #[test]
    fn test_jsx_in_plain_js_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "App.js",
            "import React from 'react';\nexport const App = () => <div />;",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["react"]);
    }

    #[test]
    fn test_tsx_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "App.tsx",
            "import { Button } from './Button';\nexport const App = (): JSX.Element => <Button />;",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./Button"]);
    }

    #[test]
    fn test_declaration_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "index.d.ts",
            "import { Foo } from './foo';\nexport declare function bar(x: Foo): void;",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./foo"]);
    }

    #[test]
    fn test_import_inside_arrow_body() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "routes.jsx",
            "import { lazy } from 'react';\nconst Page = lazy(() => import('./Page'));",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(
            imports,
            vec![
                Specifier::new("react", SpecKind::Static),
                Specifier::new("./Page", SpecKind::Dynamic),
            ]
        );
    }

    #[test]
    fn test_require_inside_function_and_block_bodies() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "test.js",
            "export default function f() { return require('./a'); }\nif (x) { require('./b'); }",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(
            imports,
            vec![Specifier::new("./a", SpecKind::Static), Specifier::new("./b", SpecKind::Static)]
        );
    }

    #[test]
    fn test_imports_inside_class_members() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "store.ts",
            "export class Store {\n  static codec = require('./codec');\n  async load() { return import('./loader'); }\n}",
        );
        let imports = imports_for(&file).unwrap();
        assert_eq!(requests(&imports), vec!["./codec", "./loader"]);
    }

    #[test]
    fn test_require_with_non_literal_argument_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            temp_dir.path(),
            "test.js",
            "const name = './a';\nrequire(name);\nmodule.require('./b');",
        );
        assert!(imports_for(&file).unwrap().is_empty());
    }

    #[test]
    fn test_no_imports() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(temp_dir.path(), "test.js", "const x = 42;");
        assert!(imports_for(&file).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = imports_for(&temp_dir.path().join("nope.js")).unwrap_err();
        assert!(matches!(err, DiscoveryError::Io { .. }));
    }
}
