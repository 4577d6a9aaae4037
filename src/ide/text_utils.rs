//! Text helpers that look at the raw source around the cursor.

use crate::base::{LineIndex, TextSize};
use crate::hir::PathNode;

const JINJA_OPEN: &str = "{{ ";
const JINJA_CLOSE: &str = " }}";

/// Whether the cursor sits between `{{ ` and ` }}` on its line.
///
/// `path` is the node path under the cursor. Its last node must be a scalar
/// that contains a Jinja opening (or a null scalar, while the user is still
/// typing); a value that starts with `{{` has to be quoted in YAML, so the
/// scalar carries the brackets itself. An opening after the cursor but
/// before the next closing means the cursor is between two expressions.
///
/// # Example
/// ```
/// use ansible_ls::hir::resolve_path_at;
/// use ansible_ls::ide::text_utils::is_cursor_inside_jinja_brackets;
/// use ansible_ls::syntax::YamlFile;
/// use ansible_ls::base::TextSize;
///
/// let text = "msg: \"{{ item }}\"\n";
/// let file = YamlFile::parse(text);
/// let path = resolve_path_at(&file.documents, TextSize::new(10), true).unwrap();
/// assert!(is_cursor_inside_jinja_brackets(text, TextSize::new(10), &path));
/// ```
pub fn is_cursor_inside_jinja_brackets(text: &str, offset: TextSize, path: &[PathNode<'_>]) -> bool {
    let Some(scalar) = path.last().and_then(PathNode::as_scalar) else {
        return false;
    };
    if !scalar.is_null() && !scalar.as_str().contains(JINJA_OPEN) {
        return false;
    }

    let line_index = LineIndex::new(text);
    let line = line_index.line_col(offset).line;
    let Some(line_range) = line_index.line_range(line) else {
        return false;
    };
    let offset = offset.min(line_range.end());
    let (Some(before), Some(after)) = (
        text.get(usize::from(line_range.start())..usize::from(offset)),
        text.get(usize::from(offset)..usize::from(line_range.end())),
    ) else {
        return false;
    };

    if !before.contains(JINJA_OPEN) {
        return false;
    }
    let Some(close) = after.find(JINJA_CLOSE) else {
        return false;
    };
    after.find(JINJA_OPEN).is_none_or(|open| open > close)
}
