/// A raw module request found in a source file, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Static,
    Dynamic,
    /// `import type` or `export type ... from`.
    Type,
    /// `export ... from` / `export * from`.
    ReExport,
}

impl Specifier {
    pub fn new(request: impl Into<String>, kind: SpecKind) -> Self {
        Self { request: request.into(), kind }
    }
}

pub fn is_relative_request(request: &str) -> bool {
    request.starts_with("./")
        || request.starts_with("../")
        || request.starts_with('/')
        || request == "."
        || request == ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_requests() {
        assert!(is_relative_request("./a"));
        assert!(is_relative_request("../lib/b.js"));
        assert!(is_relative_request("/abs/c"));
        assert!(is_relative_request("."));
        assert!(is_relative_request(".."));
        assert!(!is_relative_request("react"));
        assert!(!is_relative_request("@scope/pkg"));
        assert!(!is_relative_request(".hidden"));
    }
}
