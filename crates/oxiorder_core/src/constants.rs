//! File extension families and default patterns.
//!
//! Sources come in two families. The *authored* family is what a file looks
//! like once it has been converted (`.ts`, `.tsx`, `.mts`, `.cts`); the
//! *compiled* family is what it looks like before (`.js`, `.jsx`, `.mjs`,
//! `.cjs`). Declaration files (`.d.ts` and friends) carry types only.

/// Extensions of already-converted sources.
pub const AUTHORED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Extensions of sources that still need converting.
pub const COMPILED_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Every extension that makes a file a module graph candidate.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Extensions to try when resolving module imports (in priority order).
///
/// `d.ts` is last so an implementation always beats its declaration.
pub const RESOLVE_EXTENSIONS: &[&str] =
    &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "d.ts"];

/// File name suffixes of declaration-only files.
pub const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Basename tried when a specifier points at a directory.
pub const INDEX_FILE_STEM: &str = "index";

/// Alias configuration files, in lookup order within one directory.
pub const ALIAS_CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// Compiler configuration that marks a package as set up for the authored family.
pub const COMPILER_CONFIG_FILE: &str = "tsconfig.json";

pub const MANIFEST_FILE: &str = "package.json";

/// Directory names that hold installed third-party code.
pub const VENDOR_DIRS: &[&str] = &["node_modules"];

/// Directories never walked, whatever the caller's patterns say.
pub const GLOBAL_IGNORES: &[&str] = &["node_modules", ".git"];

/// Directory names that can never be workspace packages.
pub const WORKSPACE_SKIP_DIRS: &[&str] =
    &["node_modules", "dist", "build", "out", "coverage", ".git", "tmp", "temp", ".cache"];

pub const DEFAULT_INCLUDE: &str = "**/*";

/// Build output, lock files and local tooling configs.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/coverage/**",
    "**/package-lock.json",
    "**/npm-shrinkwrap.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    "**/.eslintrc*",
    "**/.prettierrc*",
    "**/.babelrc*",
    "**/jest.config.*",
    "**/babel.config.*",
    "**/webpack.config.*",
    "**/rollup.config.*",
    "**/vite.config.*",
    "**/prettier.config.*",
    "**/eslint.config.*",
];

/// Test locations, excluded unless a caller opts tests in.
pub const TEST_EXCLUDES: &[&str] =
    &["**/__tests__/**", "**/test/**", "**/tests/**", "**/*.test.*", "**/*.spec.*"];

/// Dependencies that make a manifest look like a web application.
pub const WEB_APP_FRAMEWORKS: &[&str] =
    &["next", "react-scripts", "gatsby", "nuxt", "@remix-run/react", "vite"];

/// Authored-family counterparts of a compiled extension, most likely first.
pub fn authored_counterparts(ext: &str) -> &'static [&'static str] {
    match ext {
        "js" => &["ts", "tsx"],
        "jsx" => &["tsx", "ts"],
        "mjs" => &["mts"],
        "cjs" => &["cts"],
        _ => &[],
    }
}

pub fn is_declaration_file(name: &str) -> bool {
    DECLARATION_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_extensions_cover_both_families() {
        assert_eq!(SOURCE_EXTENSIONS.len(), AUTHORED_EXTENSIONS.len() + COMPILED_EXTENSIONS.len());
        for ext in AUTHORED_EXTENSIONS.iter().chain(COMPILED_EXTENSIONS) {
            assert!(SOURCE_EXTENSIONS.contains(ext), "SOURCE_EXTENSIONS missing '{}'", ext);
        }
    }

    #[test]
    fn test_resolve_extensions_prefer_authored_family() {
        let first_compiled = RESOLVE_EXTENSIONS
            .iter()
            .position(|e| COMPILED_EXTENSIONS.contains(e))
            .unwrap();
        for ext in AUTHORED_EXTENSIONS {
            let pos = RESOLVE_EXTENSIONS.iter().position(|e| e == ext).unwrap();
            assert!(pos < first_compiled);
        }
        assert_eq!(RESOLVE_EXTENSIONS.last(), Some(&"d.ts"));
    }

    #[test]
    fn test_authored_counterparts() {
        assert_eq!(authored_counterparts("js"), &["ts", "tsx"]);
        assert_eq!(authored_counterparts("mjs"), &["mts"]);
        assert!(authored_counterparts("ts").is_empty());
        assert!(authored_counterparts("css").is_empty());
    }

    #[test]
    fn test_is_declaration_file() {
        assert!(is_declaration_file("index.d.ts"));
        assert!(is_declaration_file("mod.d.mts"));
        assert!(!is_declaration_file("index.ts"));
        assert!(!is_declaration_file("d.ts.js"));
    }
}
