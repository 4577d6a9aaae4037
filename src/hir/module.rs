//! Module metadata and its lazily materialized documentation.
//!
//! A [`ModuleMetadata`] is created for every discovered module or
//! documentation-fragment source file. Nothing is read until the module is
//! first resolved; then three one-shot cells fill in order:
//!
//! ```text
//! raw        ← DOCUMENTATION and other NAME = '''...''' blocks parsed as YAML
//!   │
//! fragments  ← extends_documentation_fragment names looked up in the index
//!   │
//! docs       ← raw + fragments merged, then typed into ModuleDocumentation
//! ```
//!
//! Each cell is filled at most once per object. An I/O failure leaves the
//! cells empty so the next resolution retries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};
use regex::{Captures, Regex};
use serde_yaml::{Mapping as YamlMapping, Value};
use tracing::{debug, warn};

use super::routing::split_fqcn;

static SINGLE_QUOTED_DOCS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?P<pre>[ \t]*(?P<name>[A-Z0-9_]+)\s*=\s*r?'''(?:\n---)?\n?)(?P<doc>.*?)'''").unwrap()
});

static DOUBLE_QUOTED_DOCS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(?P<pre>[ \t]*(?P<name>[A-Z0-9_]+)\s*=\s*r?"""(?:\n---)?\n?)(?P<doc>.*?)""""#).unwrap()
});

/// Name of the main documentation block of a module or fragment source.
pub const DOCUMENTATION: &str = "DOCUMENTATION";

/// Top-level documentation lists that are concatenated across fragments
/// instead of being taken from the first source that has them.
const CONCATENATED_KEYS: &[&str] = &["notes", "requirements", "seealso"];

// ============================================================================
// RAW DOCUMENTATION
// ============================================================================

/// A problem found while parsing a documentation block. Never fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentationError {
    pub message: String,
    /// 0-based line within the source file, when known.
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl fmt::Display for DocumentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{}:{}: {}", line + 1, col + 1, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// The untyped DOCUMENTATION mapping of one source file, plus its other
/// named mapping blocks (fragment variants such as `URL_WINDOWS`).
#[derive(Clone, Debug, Default)]
pub struct RawDocumentation {
    pub contents: YamlMapping,
    /// Whether the source has a DOCUMENTATION block at all.
    pub documented: bool,
    /// Mapping blocks other than DOCUMENTATION, keyed by their upper-case name.
    pub variants: IndexMap<String, YamlMapping>,
    /// 0-based first and last line of the YAML block in the source file.
    pub line_range: (u32, u32),
    pub errors: Vec<DocumentationError>,
}

impl RawDocumentation {
    /// Extract and parse the documentation blocks of a Python source.
    ///
    /// A file without a DOCUMENTATION block yields empty contents. Malformed
    /// DOCUMENTATION yields empty contents with the parse error recorded.
    /// Other blocks are kept only when they parse as a mapping.
    pub fn extract(source: &str) -> Self {
        let mut raw = Self::default();
        for block in documentation_blocks(source) {
            if block.name == DOCUMENTATION {
                if !raw.documented {
                    raw.read_main_block(source, &block);
                }
                continue;
            }
            if raw.variants.contains_key(block.name) {
                continue;
            }
            match serde_yaml::from_str::<Value>(block.doc) {
                Ok(Value::Mapping(contents)) => {
                    raw.variants.insert(block.name.to_string(), contents);
                }
                Ok(_) => {}
                Err(err) => debug!("[DOCS] skipping block {}: {}", block.name, err),
            }
        }
        raw
    }

    fn read_main_block(&mut self, source: &str, block: &DocBlock<'_>) {
        let start_line = count_newlines(&source[..block.start]) + count_newlines(block.pre);
        let end_line = start_line + count_newlines(block.doc);
        self.documented = true;
        self.line_range = (start_line as u32, end_line as u32);

        match serde_yaml::from_str::<Value>(block.doc) {
            Ok(Value::Mapping(contents)) => self.contents = contents,
            Ok(Value::Null) => {}
            Ok(_) => self.errors.push(DocumentationError {
                message: "documentation is not a mapping".to_string(),
                line: Some(start_line),
                column: None,
            }),
            Err(err) => {
                let location = err.location();
                self.errors.push(DocumentationError {
                    message: err.to_string(),
                    line: location.as_ref().map(|l| start_line + l.line().saturating_sub(1)),
                    column: location.as_ref().map(|l| l.column().saturating_sub(1)),
                });
            }
        }
    }

    /// The block a fragment reference selects: DOCUMENTATION or a variant.
    pub fn block(&self, name: &str) -> Option<&YamlMapping> {
        if name == DOCUMENTATION {
            self.documented.then_some(&self.contents)
        } else {
            self.variants.get(name)
        }
    }

    /// Names listed under `extends_documentation_fragment`, a list or a
    /// single string.
    pub fn fragment_names(&self) -> Vec<String> {
        match self.contents.get("extends_documentation_fragment") {
            Some(Value::String(name)) => vec![name.clone()],
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
            _ => Vec::new(),
        }
    }
}

/// A `NAME = '''...'''` block in a Python source.
struct DocBlock<'s> {
    name: &'s str,
    start: usize,
    end: usize,
    /// Assignment and opening quotes, up to the YAML text.
    pre: &'s str,
    doc: &'s str,
}

impl<'s> DocBlock<'s> {
    fn from_captures(captures: Captures<'s>) -> Option<Self> {
        let whole = captures.get(0)?;
        Some(Self {
            name: captures.name("name")?.as_str(),
            start: whole.start(),
            end: whole.end(),
            pre: captures.name("pre")?.as_str(),
            doc: captures.name("doc")?.as_str(),
        })
    }
}

/// Every named block in source order, whichever quote style it uses. A block
/// starting inside an earlier one is part of that block's text.
fn documentation_blocks(source: &str) -> Vec<DocBlock<'_>> {
    let mut blocks: Vec<DocBlock<'_>> = SINGLE_QUOTED_DOCS
        .captures_iter(source)
        .chain(DOUBLE_QUOTED_DOCS.captures_iter(source))
        .filter_map(DocBlock::from_captures)
        .collect();
    blocks.sort_by_key(|block| block.start);

    let mut end = 0;
    blocks.retain(|block| {
        let outside = block.start >= end;
        if outside {
            end = block.end;
        }
        outside
    });
    blocks
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

// ============================================================================
// MODULE METADATA
// ============================================================================

/// A resolved `extends_documentation_fragment` entry.
#[derive(Clone, Debug)]
pub struct FragmentRef {
    pub metadata: Arc<ModuleMetadata>,
    /// DOCUMENTATION or the upper-cased variant name.
    pub block: String,
}

/// Split a fragment reference into the fragment's name and the block it
/// selects.
pub fn split_fragment_reference(name: &str) -> (String, String) {
    let parts: Vec<&str> = name.split('.').collect();
    match parts.split_last() {
        Some((variant, rest)) if matches!(parts.len(), 2 | 4) => {
            (rest.join("."), variant.to_uppercase())
        }
        _ => (name.to_string(), DOCUMENTATION.to_string()),
    }
}

/// A discovered module (or documentation fragment) and its lazy caches.
pub struct ModuleMetadata {
    pub fqcn: String,
    pub namespace: String,
    pub collection: String,
    pub name: String,
    pub source: PathBuf,
    /// Source text held in memory instead of read from `source`.
    inline: Option<Arc<str>>,
    raw: OnceCell<RawDocumentation>,
    fragments: OnceCell<Vec<FragmentRef>>,
    documentation: OnceCell<Arc<ModuleDocumentation>>,
}

impl ModuleMetadata {
    pub fn new(
        namespace: impl Into<String>,
        collection: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        let namespace = namespace.into();
        let collection = collection.into();
        let name = name.into();
        Self {
            fqcn: format!("{namespace}.{collection}.{name}"),
            namespace,
            collection,
            name,
            source: source.into(),
            inline: None,
            raw: OnceCell::new(),
            fragments: OnceCell::new(),
            documentation: OnceCell::new(),
        }
    }

    /// Metadata whose source text is already in memory.
    pub fn from_text(fqcn: &str, text: impl Into<Arc<str>>) -> Self {
        let (collection_fqcn, name) = split_fqcn(fqcn).unwrap_or(("", fqcn));
        let (namespace, collection) = collection_fqcn.split_once('.').unwrap_or(("", ""));
        let mut metadata = Self::new(namespace, collection, name, format!("{name}.py"));
        metadata.fqcn = fqcn.to_string();
        metadata.inline = Some(text.into());
        metadata
    }

    /// The same module with every cache empty.
    pub fn fresh_copy(&self) -> Self {
        Self {
            fqcn: self.fqcn.clone(),
            namespace: self.namespace.clone(),
            collection: self.collection.clone(),
            name: self.name.clone(),
            source: self.source.clone(),
            inline: self.inline.clone(),
            raw: OnceCell::new(),
            fragments: OnceCell::new(),
            documentation: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Parsed DOCUMENTATION block, read on first use.
    ///
    /// `None` when the source cannot be read; the failure is logged and the
    /// read is retried on the next call.
    pub fn raw_documentation(&self) -> Option<&RawDocumentation> {
        let loaded = self.raw.get_or_try_init(|| {
            let text = self.read_source()?;
            let raw = RawDocumentation::extract(&text);
            debug!(
                "[DOCS] parsed {} (lines {}..{}, {} errors)",
                self.fqcn,
                raw.line_range.0,
                raw.line_range.1,
                raw.errors.len()
            );
            Ok::<_, std::io::Error>(raw)
        });
        match loaded {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!("[DOCS] cannot read {}: {}", self.source.display(), err);
                None
            }
        }
    }

    fn read_source(&self) -> std::io::Result<Arc<str>> {
        match &self.inline {
            Some(text) => Ok(Arc::clone(text)),
            None => std::fs::read_to_string(&self.source).map(Arc::from),
        }
    }

    /// 0-based line span of the documentation block, once read.
    pub fn source_line_range(&self) -> Option<(u32, u32)> {
        self.raw.get().map(|raw| raw.line_range)
    }

    /// Documentation parse errors, once read.
    pub fn errors(&self) -> &[DocumentationError] {
        self.raw.get().map_or(&[][..], |raw| raw.errors.as_slice())
    }

    /// Resolve `extends_documentation_fragment` through `lookup`.
    ///
    /// `name.variant` and `ns.coll.name.variant` select the upper-cased
    /// variant block of a fragment; other names select its DOCUMENTATION.
    /// The fragment name is tried as written, then under `ansible.builtin`.
    /// Unknown fragments and missing blocks are skipped.
    pub fn fragments<F>(&self, lookup: F) -> Option<&[FragmentRef]>
    where
        F: Fn(&str) -> Option<Arc<ModuleMetadata>>,
    {
        if let Some(fragments) = self.fragments.get() {
            return Some(fragments);
        }
        let raw = self.raw_documentation()?;
        let fragments = self.fragments.get_or_init(|| {
            raw.fragment_names()
                .iter()
                .filter_map(|name| {
                    let (fragment_name, block) = split_fragment_reference(name);
                    let found = lookup(&fragment_name)
                        .or_else(|| lookup(&format!("ansible.builtin.{fragment_name}")))
                        .filter(|fragment| {
                            fragment
                                .raw_documentation()
                                .is_some_and(|raw| raw.block(&block).is_some())
                        });
                    match found {
                        Some(metadata) => Some(FragmentRef { metadata, block }),
                        None => {
                            debug!("[DOCS] {}: unknown fragment {}", self.fqcn, name);
                            None
                        }
                    }
                })
                .collect()
        });
        Some(fragments)
    }

    /// Whether the memoized fragment list contains `fragment_fqcn`.
    pub fn depends_on_fragment(&self, fragment_fqcn: &str) -> bool {
        self.fragments
            .get()
            .is_some_and(|frags| frags.iter().any(|f| f.metadata.fqcn == fragment_fqcn))
    }

    /// Typed documentation with fragments merged in, built once.
    pub fn documentation<F>(&self, lookup: F) -> Option<Arc<ModuleDocumentation>>
    where
        F: Fn(&str) -> Option<Arc<ModuleMetadata>>,
    {
        if let Some(docs) = self.documentation.get() {
            return Some(Arc::clone(docs));
        }
        let raw = self.raw_documentation()?;
        let fragments = self.fragments(lookup)?;

        let mut sources: Vec<&YamlMapping> = vec![&raw.contents];
        sources.extend(fragments.iter().filter_map(|fragment| {
            fragment
                .metadata
                .raw_documentation()
                .and_then(|fragment_raw| fragment_raw.block(&fragment.block))
        }));
        let merged = merge_documentation(&sources);

        let docs = self
            .documentation
            .get_or_init(|| Arc::new(ModuleDocumentation::from_yaml(&merged)));
        Some(Arc::clone(docs))
    }

    /// Documentation if it has been materialized already.
    pub fn cached_documentation(&self) -> Option<Arc<ModuleDocumentation>> {
        self.documentation.get().cloned()
    }
}

impl fmt::Debug for ModuleMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleMetadata")
            .field("fqcn", &self.fqcn)
            .field("source", &self.source)
            .field("documented", &self.documentation.get().is_some())
            .finish()
    }
}

/// Merge documentation mappings, the module's own first.
///
/// Options merge per name with the first occurrence winning. The
/// [`CONCATENATED_KEYS`] lists are appended in source order. Every other
/// key is taken from the first source that has it.
fn merge_documentation(sources: &[&YamlMapping]) -> YamlMapping {
    let mut merged = YamlMapping::new();
    let mut options = YamlMapping::new();
    let mut has_options = false;

    for source in sources {
        for (key, value) in source.iter() {
            let key_str = key.as_str().unwrap_or_default();
            if key_str == "options" {
                if let Value::Mapping(opts) = value {
                    has_options = true;
                    for (name, spec) in opts {
                        if !options.contains_key(name) {
                            options.insert(name.clone(), spec.clone());
                        }
                    }
                }
            } else if CONCATENATED_KEYS.contains(&key_str) {
                let items = match value {
                    Value::Sequence(items) => items.clone(),
                    Value::Null => Vec::new(),
                    other => vec![other.clone()],
                };
                match merged.get_mut(key) {
                    Some(Value::Sequence(existing)) => existing.extend(items),
                    _ => {
                        merged.insert(key.clone(), Value::Sequence(items));
                    }
                }
            } else if !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    if has_options {
        merged.insert(Value::from("options"), Value::Mapping(options));
    }
    merged
}

// ============================================================================
// TYPED DOCUMENTATION
// ============================================================================

/// A description is written either as one string or as a list of lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Description {
    Text(String),
    Lines(Vec<String>),
}

impl Description {
    fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Sequence(items) => Some(Self::Lines(items.iter().filter_map(scalar_string).collect())),
            other => scalar_string(other).map(Self::Text),
        }
    }

    /// Lines joined with newlines.
    pub fn to_text(&self) -> String {
        match self {
            Description::Text(text) => text.clone(),
            Description::Lines(lines) => lines.join("\n"),
        }
    }
}

/// One documented module option.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionDoc {
    pub name: String,
    pub description: Option<Description>,
    pub required: bool,
    pub default: Option<Value>,
    pub choices: Vec<Value>,
    pub type_name: Option<String>,
    pub elements: Option<String>,
    pub aliases: Vec<String>,
    pub version_added: Option<String>,
    /// Keyed by name and by alias, like [`ModuleDocumentation::options`].
    pub suboptions: IndexMap<String, Arc<OptionDoc>>,
}

impl OptionDoc {
    fn from_yaml(name: &str, spec: &Value) -> Self {
        let field = |key: &str| spec.get(key);
        Self {
            name: name.to_string(),
            description: field("description").and_then(Description::from_yaml),
            required: field("required").and_then(Value::as_bool).unwrap_or(false),
            default: field("default").filter(|v| !v.is_null()).cloned(),
            choices: field("choices")
                .and_then(Value::as_sequence)
                .cloned()
                .unwrap_or_default(),
            type_name: field("type").and_then(scalar_string),
            elements: field("elements").and_then(scalar_string),
            aliases: field("aliases").map(string_list).unwrap_or_default(),
            version_added: field("version_added").and_then(scalar_string),
            suboptions: parse_options(field("suboptions")),
        }
    }

    /// Whether this option's value is a mapping (`dict`) or a list (`list`).
    pub fn is_type(&self, type_name: &str) -> bool {
        self.type_name.as_deref() == Some(type_name)
    }
}

/// A `seealso` entry: a module, a plugin, a docs reference or a link.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeeAlso {
    pub module: Option<String>,
    pub plugin: Option<String>,
    pub reference: Option<String>,
    pub link: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SeeAlso {
    fn from_yaml(value: &Value) -> Option<Self> {
        value.as_mapping()?;
        let field = |key: &str| value.get(key).and_then(scalar_string);
        Some(Self {
            module: field("module"),
            plugin: field("plugin"),
            reference: field("ref"),
            link: field("link"),
            name: field("name"),
            description: field("description"),
        })
    }
}

/// Typed module documentation, fragments already merged in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleDocumentation {
    pub module: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<Description>,
    pub version_added: Option<String>,
    pub author: Vec<String>,
    pub deprecated: bool,
    /// Keyed by option name and by every alias; aliases share the option.
    pub options: IndexMap<String, Arc<OptionDoc>>,
    pub requirements: Vec<String>,
    pub seealso: Vec<SeeAlso>,
    pub notes: Vec<String>,
}

impl ModuleDocumentation {
    pub fn from_yaml(contents: &YamlMapping) -> Self {
        let field = |key: &str| contents.get(key);
        Self {
            module: field("module").and_then(scalar_string),
            short_description: field("short_description").and_then(scalar_string),
            description: field("description").and_then(Description::from_yaml),
            version_added: field("version_added").and_then(scalar_string),
            author: field("author").map(string_list).unwrap_or_default(),
            deprecated: match field("deprecated") {
                None | Some(Value::Null) => false,
                Some(Value::Bool(flag)) => *flag,
                Some(_) => true,
            },
            options: parse_options(field("options")),
            requirements: field("requirements").map(string_list).unwrap_or_default(),
            seealso: field("seealso")
                .and_then(Value::as_sequence)
                .map(|items| items.iter().filter_map(SeeAlso::from_yaml).collect())
                .unwrap_or_default(),
            notes: field("notes").map(string_list).unwrap_or_default(),
        }
    }

    /// Option by name or alias.
    pub fn option(&self, name: &str) -> Option<&Arc<OptionDoc>> {
        self.options.get(name)
    }

    /// Each option once, under its own name.
    pub fn primary_options(&self) -> impl Iterator<Item = &Arc<OptionDoc>> {
        self.options
            .iter()
            .filter(|(key, option)| option.name == **key)
            .map(|(_, option)| option)
    }
}

fn parse_options(value: Option<&Value>) -> IndexMap<String, Arc<OptionDoc>> {
    let mut options = IndexMap::new();
    let Some(Value::Mapping(specs)) = value else {
        return options;
    };

    for (name, spec) in specs {
        let Some(name) = scalar_string(name) else {
            continue;
        };
        let option = Arc::new(OptionDoc::from_yaml(&name, spec));
        options.insert(name, Arc::clone(&option));
    }
    // Aliases go in after all real names so they never shadow one.
    let primaries: Vec<Arc<OptionDoc>> = options.values().cloned().collect();
    for option in primaries {
        for alias in &option.aliases {
            options
                .entry(alias.clone())
                .or_insert_with(|| Arc::clone(&option));
        }
    }
    options
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).into_iter().collect(),
    }
}
