use std::{
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::types::{DiscoveryOutcome, PackageSummary};

/// Relativize a path to the current working directory for clickable links
fn relativize_to_cwd(root: &Path, relative_to_root: &str) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return relative_to_root.to_string();
        }
    };
    trace!("Relativizing '{}' from root {:?} to cwd {:?}", relative_to_root, root, cwd);

    let abs_path = root.join(relative_to_root);
    match make_relative(&abs_path, &cwd) {
        Some(rel_path) => rel_path.to_string_lossy().to_string(),
        None => relative_to_root.to_string(),
    }
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let mut target_components = target.components();
    let mut base_components = base.components();

    let mut common_prefix_len = 0;
    let mut target_parts = Vec::new();
    let mut base_parts = Vec::new();

    loop {
        match (target_components.next(), base_components.next()) {
            (Some(t), Some(b)) if t == b => {
                common_prefix_len += 1;
            }
            (Some(t), Some(b)) => {
                target_parts.push(t);
                base_parts.push(b);
                break;
            }
            (Some(t), None) => {
                target_parts.push(t);
                break;
            }
            (None, Some(b)) => {
                base_parts.push(b);
                break;
            }
            (None, None) => return Some(PathBuf::from(".")),
        }
    }

    target_parts.extend(target_components);
    base_parts.extend(base_components);

    if common_prefix_len == 0 && target.components().next() != base.components().next() {
        return None;
    }

    // One ".." per unmatched base component, then the rest of the target.
    let mut result = PathBuf::new();
    for _ in &base_parts {
        result.push("..");
    }
    for component in target_parts {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

pub fn print_no_files_message<W: Write>(
    writer: &mut W,
    outcome: &DiscoveryOutcome,
) -> io::Result<()> {
    debug!("No files to order");
    writeln!(
        writer,
        "{} Nothing to order under {}",
        "✓".green().bold(),
        outcome.root.display().to_string().blue()
    )?;
    writer.flush()?;
    Ok(())
}

/// Prints the migration order, one path per line, grouped under a header
/// each time the owning package changes.
pub fn print_order<W: Write>(writer: &mut W, outcome: &DiscoveryOutcome) -> io::Result<()> {
    debug!("Printing order of {} files", outcome.order.files.len());
    let mut current: Option<&str> = None;
    let mut position = 0usize;

    for file in &outcome.order.files {
        if current != Some(file.package.as_str()) {
            if current.is_some() {
                writeln!(writer)?;
            }
            writeln!(writer, "{}", file.package.bright_white().bold())?;
            current = Some(file.package.as_str());
        }
        position += 1;
        let display_path = relativize_to_cwd(&outcome.root, &file.relative_path);
        writeln!(writer, "{}  {}", format!("{position:>5}").dimmed(), display_path.blue())?;
    }

    writer.flush()?;
    Ok(())
}

/// Prints packages in dependency order with their kind and conversion state.
pub fn print_packages<W: Write>(writer: &mut W, outcome: &DiscoveryOutcome) -> io::Result<()> {
    debug!("Printing {} packages", outcome.packages.len());
    for (idx, pkg) in outcome.packages.iter().enumerate() {
        let is_last = idx + 1 == outcome.packages.len();
        let prefix = if is_last { "└──" } else { "├──" };
        writeln!(
            writer,
            "{}  {} {} {}",
            prefix.dimmed(),
            pkg.name.bright_white().bold(),
            format!("({})", pkg.root).dimmed(),
            status(pkg)
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn status(pkg: &PackageSummary) -> String {
    let state = if pkg.skipped {
        "converted, skipped".green().to_string()
    } else if pkg.converted {
        "converted".green().to_string()
    } else {
        "pending".yellow().to_string()
    };
    format!("[{}, {}]", pkg.kind.to_string().cyan(), state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        package::PackageKind,
        types::{MigrationOrder, OrderedFile},
    };

    fn outcome() -> DiscoveryOutcome {
        let root = PathBuf::from("/project");
        let file = |rel: &str, package: &str| OrderedFile {
            absolute_path: root.join(rel),
            relative_path: rel.to_string(),
            package: package.to_string(),
        };
        DiscoveryOutcome {
            root: root.clone(),
            order: MigrationOrder {
                files: vec![
                    file("packages/foo/index.js", "foo"),
                    file("packages/bar/index.js", "bar"),
                    file("packages/bar/util.js", "bar"),
                    file("index.js", "root"),
                ],
                packages: vec!["foo".into(), "bar".into()],
            },
            packages: vec![
                PackageSummary {
                    name: "foo".into(),
                    root: "packages/foo".into(),
                    kind: PackageKind::Library,
                    converted: true,
                    skipped: false,
                },
                PackageSummary {
                    name: "root".into(),
                    root: ".".into(),
                    kind: PackageKind::Application,
                    converted: false,
                    skipped: false,
                },
            ],
            files_analyzed: 4,
        }
    }

    #[test]
    fn test_print_order_groups_by_package() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_order(&mut out, &outcome()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let headers: Vec<&str> =
            text.lines().filter(|l| !l.is_empty() && !l.starts_with(' ')).collect();
        assert_eq!(headers, vec!["foo", "bar", "root"]);
        assert_eq!(text.lines().filter(|l| l.contains("index.js")).count(), 3);
        assert!(text.contains("util.js"));
    }

    #[test]
    fn test_print_packages() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_packages(&mut out, &outcome()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("foo (packages/foo) [library, converted]"));
        assert!(text.contains("└──  root (.) [application, pending]"));
    }

    #[test]
    fn test_make_relative_same_dir() {
        let target = Path::new("/project/src/file.ts");
        let base = Path::new("/project/src");
        assert_eq!(make_relative(target, base), Some(PathBuf::from("file.ts")));
    }

    #[test]
    fn test_make_relative_parent_dir() {
        let target = Path::new("/project/src/file.ts");
        let base = Path::new("/project/src/components");
        assert_eq!(make_relative(target, base), Some(PathBuf::from("../file.ts")));
    }

    #[test]
    fn test_make_relative_sibling_package() {
        let target = Path::new("/project/packages/foo/index.js");
        let base = Path::new("/project/packages/bar");
        assert_eq!(make_relative(target, base), Some(PathBuf::from("../foo/index.js")));
    }

    #[test]
    fn test_make_relative_target_above_base() {
        let target = Path::new("/project");
        let base = Path::new("/project/packages/bar");
        assert_eq!(make_relative(target, base), Some(PathBuf::from("../..")));
    }

    #[test]
    fn test_make_relative_same_path() {
        let target = Path::new("/project/src");
        assert_eq!(make_relative(target, target), Some(PathBuf::from(".")));
    }
}
