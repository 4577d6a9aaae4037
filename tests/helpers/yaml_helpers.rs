//! Helpers for parsing YAML sources and locating cursors in them.

use ansible_ls::base::TextSize;
use ansible_ls::hir::{NodePath, resolve_path_at};
use ansible_ls::syntax::YamlFile;

/// Parses a file and asserts it has no errors.
pub fn parse_clean(text: &str) -> YamlFile {
    let file = YamlFile::parse(text);
    let errors: Vec<_> = file.errors().collect();
    assert!(errors.is_empty(), "Parse errors in {:?}: {:?}", text, errors);
    file
}

/// Offset of the first occurrence of `needle`.
pub fn offset_of(text: &str, needle: &str) -> TextSize {
    offset_of_nth(text, needle, 0)
}

/// Offset of the `n`-th (0-based) occurrence of `needle`.
pub fn offset_of_nth(text: &str, needle: &str, n: usize) -> TextSize {
    let (index, _) = text
        .match_indices(needle)
        .nth(n)
        .unwrap_or_else(|| panic!("{:?} occurs fewer than {} times", needle, n + 1));
    TextSize::new(index as u32)
}

/// Path to the start of the first occurrence of `needle`.
pub fn path_at<'a>(file: &'a YamlFile, text: &str, needle: &str) -> NodePath<'a> {
    path_at_nth(file, text, needle, 0)
}

pub fn path_at_nth<'a>(file: &'a YamlFile, text: &str, needle: &str, n: usize) -> NodePath<'a> {
    let offset = offset_of_nth(text, needle, n);
    resolve_path_at(&file.documents, offset, false)
        .unwrap_or_else(|| panic!("no path at {:?}", needle))
}

/// The scalar under the end of a path, for compact assertions.
pub fn last_scalar<'a>(path: &NodePath<'a>) -> Option<&'a str> {
    path.last()?.as_scalar().map(|s| s.as_str())
}
