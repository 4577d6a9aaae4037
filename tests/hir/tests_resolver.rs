//! Tests for module resolution through candidates, routing and the index.

use std::sync::Arc;

use ansible_ls::hir::{
    DocumentMetadataSource, ModuleIndex, ModuleMetadata, ModuleResolver, PluginRoute, RoutingTable,
};
use rstest::rstest;

use crate::helpers::collection_fixtures::{DEBUG_DOC, module_source, sample_index};
use crate::helpers::yaml_helpers::{parse_clean, path_at};

/// Role metadata answering the same collections for every document.
struct FixedCollections(Vec<String>);

impl DocumentMetadataSource for FixedCollections {
    fn collections_for(&self, _document_uri: &str) -> Vec<String> {
        self.0.clone()
    }
}

fn debug_only() -> ModuleIndex {
    let mut index = ModuleIndex::new();
    index.insert_module(ModuleMetadata::from_text(
        "ansible.builtin.debug",
        module_source(DEBUG_DOC),
    ));
    index
}

// ============================================================================
// CANDIDATES
// ============================================================================

#[rstest]
#[case("debug", None, vec!["ansible.builtin.debug"])]
#[case("ansible.builtin.debug", None, vec!["ansible.builtin.debug"])]
#[case("community.general.ufw", Some("file:///ws/roles/r/tasks/main.yml"), vec!["community.general.ufw"])]
#[case("ufw", Some("file:///ws/roles/r/tasks/main.yml"), vec!["ansible.builtin.ufw", "role.collection.ufw"])]
#[case("general.ufw", None, vec!["ansible.builtin.general.ufw"])]
#[case("community.network.net.ping", None, vec!["community.network.net.ping"])]
fn test_candidates(#[case] search: &str, #[case] uri: Option<&str>, #[case] expected: Vec<&str>) {
    let index = ModuleIndex::new();
    let metadata = FixedCollections(vec!["role.collection".to_string()]);
    let resolver = ModuleResolver::new(&index).with_metadata(&metadata);
    assert_eq!(resolver.candidates(search, None, uri), expected);
}

#[test]
fn test_candidates_role_metadata_before_declared_collections() {
    let text = "\
- hosts: all
  collections: [play.collection]
  tasks:
    - ufw: {}
";
    let file = parse_clean(text);
    let path = path_at(&file, text, "ufw");

    let index = ModuleIndex::new();
    let metadata = FixedCollections(vec!["role.collection".to_string()]);
    let resolver = ModuleResolver::new(&index).with_metadata(&metadata);
    assert_eq!(
        resolver.candidates("ufw", Some(path.as_slice()), Some("file:///ws/site.yml")),
        vec!["ansible.builtin.ufw", "role.collection.ufw", "play.collection.ufw"]
    );
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn test_short_name_resolves_to_builtin() {
    let index = debug_only();
    let resolved = ModuleResolver::new(&index).resolve("debug", None, None);

    assert!(resolved.is_found());
    assert_eq!(resolved.fqcn.as_deref(), Some("ansible.builtin.debug"));
    assert!(resolved.route.is_none());
    let module = resolved.module.unwrap();
    assert!(Arc::ptr_eq(&module, index.module("ansible.builtin.debug").unwrap()));
}

#[test]
fn test_redirect_hit_keeps_the_routed_name() {
    let index = sample_index();
    let text = "\
- hosts: all
  collections:
    - community.general
  tasks:
    - debug:
        msg: hi
";
    let file = parse_clean(text);
    let path = path_at(&file, text, "debug");

    let resolved = ModuleResolver::new(&index).resolve("debug", Some(path.as_slice()), Some("file:///ws/site.yml"));
    assert_eq!(resolved.fqcn.as_deref(), Some("community.general.debug"));
    let module = resolved.module.unwrap();
    assert!(Arc::ptr_eq(&module, index.module("ansible.builtin.debug").unwrap()));
}

#[test]
fn test_module_in_collection_sub_directory_resolves_by_full_name() {
    let mut index = ModuleIndex::new();
    index.insert_module(ModuleMetadata::new(
        "community",
        "network",
        "net.ping",
        "plugins/modules/net/ping.py",
    ));
    let resolver = ModuleResolver::new(&index);

    let resolved = resolver.resolve("community.network.net.ping", None, None);
    assert!(resolved.is_found());
    assert_eq!(resolved.fqcn.as_deref(), Some("community.network.net.ping"));

    assert!(!resolver.resolve("net.ping", None, None).is_found());
}

#[test]
fn test_tombstone_yields_name_without_module() {
    let index = sample_index();
    let resolved = ModuleResolver::new(&index).resolve("community.general.gone", None, None);
    assert!(resolved.module.is_none());
    assert!(resolved.documentation.is_none());
    assert_eq!(resolved.fqcn.as_deref(), Some("community.general.gone"));
    assert!(resolved.route.unwrap().is_tombstoned());
}

#[test]
fn test_tombstoned_builtin_with_module_present_uses_direct_pass() {
    let mut index = sample_index();
    index.insert_module(ModuleMetadata::from_text(
        "ansible.builtin.include",
        module_source("module: include\n"),
    ));
    let resolved = ModuleResolver::new(&index).resolve("include", None, None);
    assert_eq!(resolved.fqcn.as_deref(), Some("ansible.builtin.include"));
    assert!(resolved.is_found());
}

#[test]
fn test_deprecated_redirect() {
    let index = sample_index();
    let resolved = ModuleResolver::new(&index).resolve("community.general.old_ufw", None, None);
    assert!(resolved.is_deprecated());
    assert_eq!(
        resolved.module.map(|m| m.fqcn.clone()).as_deref(),
        Some("community.general.ufw")
    );
}

#[test]
fn test_redirect_to_missing_module() {
    let mut index = ModuleIndex::new();
    index.insert_routing(
        RoutingTable::new("old.collection").with_module("thing", PluginRoute::redirect("new.collection.thing")),
    );
    let resolved = ModuleResolver::new(&index).resolve("old.collection.thing", None, None);
    assert!(!resolved.is_found());
    assert_eq!(resolved.fqcn.as_deref(), Some("old.collection.thing"));
}

#[test]
fn test_unknown_name() {
    let index = sample_index();
    let resolved = ModuleResolver::new(&index).resolve("no_such_module", None, None);
    assert!(!resolved.is_found());
    assert!(resolved.fqcn.is_none());
    assert!(resolved.route.is_none());
}

#[test]
fn test_long_redirect_chain_is_bounded() {
    let mut table = RoutingTable::new("a.b");
    for hop in 0..20 {
        table = table.with_module(format!("m{hop}"), PluginRoute::redirect(format!("a.b.m{}", hop + 1)));
    }
    let mut index = ModuleIndex::new();
    index.insert_routing(table);
    index.insert_module(ModuleMetadata::from_text("a.b.m20", module_source("module: m20\n")));

    let near = ModuleResolver::new(&index).resolve("a.b.m15", None, None);
    assert!(near.is_found());

    let far = ModuleResolver::new(&index).resolve("a.b.m0", None, None);
    assert!(!far.is_found());
    assert_eq!(far.fqcn.as_deref(), Some("a.b.m0"));
}

// ============================================================================
// DOCUMENTATION
// ============================================================================

#[test]
fn test_documentation_is_shared_between_resolutions() {
    let index = sample_index();
    let resolver = ModuleResolver::new(&index);

    let first = resolver.resolve("debug", None, None).documentation.unwrap();
    let second = resolver.resolve("ansible.builtin.debug", None, None).documentation.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.short_description.as_deref(), Some("Print statements during execution"));
}

#[test]
fn test_warm_documentation_documents_every_module() {
    let index = sample_index();
    assert_eq!(index.warm_documentation(), index.len());
    for module in index.modules() {
        assert!(module.cached_documentation().is_some(), "{} not warmed", module.fqcn);
    }
}

#[test]
fn test_module_fqcns_list_names_usable_in_tasks() {
    let index = sample_index();
    let names = index.module_fqcns();
    assert!(names.contains(&"community.general.debug".to_string()));
    assert!(names.contains(&"community.general.old_ufw".to_string()));
    assert!(!names.contains(&"community.general.gone".to_string()));
    assert!(!names.contains(&"ansible.builtin.files".to_string()));
    assert!(names.windows(2).all(|w| w[0] < w[1]));
}
