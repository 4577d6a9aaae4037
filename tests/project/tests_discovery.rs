//! Tests for finding module, fragment and routing sources on disk.

use std::path::PathBuf;

use ansible_ls::project::{IndexError, WorkspaceConfig, discover_sources};

use crate::helpers::collection_fixtures::{AnsibleTree, DEBUG_DOC, UFW_DOC, sample_tree};

fn fqcns(sources: &[ansible_ls::project::SourceFile]) -> Vec<String> {
    let mut names: Vec<String> = sources.iter().map(|s| s.fqcn()).collect();
    names.sort();
    names
}

#[test]
fn test_discovers_builtins_collections_and_routing() {
    let tree = sample_tree();
    let sources = discover_sources(&tree.config());

    assert_eq!(
        fqcns(&sources.modules),
        vec!["ansible.builtin.copy", "ansible.builtin.debug", "community.general.ufw"]
    );
    assert_eq!(fqcns(&sources.fragments), vec!["ansible.builtin.files"]);

    let mut routed: Vec<&str> = sources.routing.iter().map(|r| r.collection.as_str()).collect();
    routed.sort();
    assert_eq!(routed, vec!["ansible.builtin", "community.general"]);
    assert!(sources.errors.is_empty());
}

#[test]
fn test_private_and_non_python_files_are_skipped() {
    let tree = AnsibleTree::new();
    tree.builtin_module("ping", DEBUG_DOC);
    tree.builtin_module("_deprecated_ping", DEBUG_DOC);
    tree.write("ansible/modules/__init__.py", "");
    tree.write("ansible/modules/README.md", "# modules\n");

    let sources = discover_sources(&tree.config());
    assert_eq!(fqcns(&sources.modules), vec!["ansible.builtin.ping"]);
}

#[test]
fn test_collection_sub_directories_give_dotted_names() {
    let tree = AnsibleTree::new();
    tree.collection_module("community", "network", "net/ping", DEBUG_DOC);
    tree.collection_module("community", "network", "firewall/ufw", UFW_DOC);

    let sources = discover_sources(&tree.config());
    assert_eq!(
        fqcns(&sources.modules),
        vec!["community.network.firewall.ufw", "community.network.net.ping"]
    );
    let ping = sources
        .modules
        .iter()
        .find(|s| s.name == "net.ping")
        .unwrap();
    assert_eq!(ping.namespace, "community");
    assert_eq!(ping.collection, "network");
}

#[test]
fn test_missing_locations_are_not_errors() {
    let config = WorkspaceConfig::new()
        .with_module_location("/nonexistent/ansible/modules")
        .with_collections_path("/nonexistent/collections");
    let sources = discover_sources(&config);
    assert!(sources.modules.is_empty());
    assert!(sources.routing.is_empty());
    assert!(sources.errors.is_empty());
}

#[test]
fn test_config_from_file() {
    let tree = AnsibleTree::new();
    let path = tree.write(
        "ansible-ls.yml",
        "module_locations:\n  - /opt/ansible/modules\ncollections_paths: [/opt/collections, /usr/share/collections]\n",
    );
    let config = WorkspaceConfig::from_file(&path).unwrap();
    assert_eq!(config.module_locations, vec![PathBuf::from("/opt/ansible/modules")]);
    assert_eq!(config.collections_paths.len(), 2);
    assert!(config.ansible_location.is_none());
}

#[test]
fn test_config_errors_name_the_file() {
    let tree = AnsibleTree::new();
    let broken = tree.write("broken.yml", "module_locations: [unclosed\n");
    let err = WorkspaceConfig::from_file(&broken).unwrap_err();
    assert!(matches!(err, IndexError::Yaml { .. }));
    assert_eq!(err.path(), Some(broken.as_path()));

    let missing = tree.root().join("missing.yml");
    let err = WorkspaceConfig::from_file(&missing).unwrap_err();
    assert!(matches!(err, IndexError::Io { .. }));
}
