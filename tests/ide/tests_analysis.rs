//! Tests for the AnalysisHost / Analysis query surface.

use std::sync::Arc;

use ansible_ls::base::TextSize;
use ansible_ls::ide::AnalysisHost;
use ansible_ls::project::WorkspaceIndex;
use rstest::{fixture, rstest};

use crate::helpers::collection_fixtures::sample_index;
use crate::helpers::yaml_helpers::{last_scalar, offset_of};

const URI: &str = "file:///ws/site.yml";

const PLAYBOOK: &str = "\
- hosts: all
  collections:
    - community.general
  tasks:
    - name: greet
      debug:
        msg: \"{{ greeting }} and {{ name }}\"
    - name: allow ssh
      ufw:
        rules:
          - port: '22'
    - name: mystery
      not_a_module:
        a: 1
";

#[fixture]
fn host() -> AnalysisHost {
    let mut host = AnalysisHost::with_workspace(Arc::new(WorkspaceIndex::from_index(sample_index())));
    let errors = host.set_file_content(URI, PLAYBOOK);
    assert!(errors.is_empty(), "{errors:?}");
    host
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[test]
fn test_set_and_remove_files() {
    let mut host = AnalysisHost::new();
    let errors = host.set_file_content("file:///ws/broken.yml", "a: 1\na: 2\n");
    assert_eq!(errors.len(), 1);
    assert!(host.has_file("file:///ws/broken.yml"));
    assert_eq!(host.file_count(), 1);

    assert!(host.set_file_content("file:///ws/broken.yml", "a: 1\n").is_empty());
    assert_eq!(host.file_count(), 1);

    assert!(host.remove_file("file:///ws/broken.yml"));
    assert!(!host.remove_file("file:///ws/broken.yml"));
    assert_eq!(host.file_count(), 0);
}

#[test]
fn test_unknown_documents_answer_nothing() {
    let host = AnalysisHost::new();
    let analysis = host.analysis();
    assert!(analysis.file(URI).is_none());
    assert!(analysis.path_at(URI, TextSize::new(0), false).is_none());
    assert!(analysis.yaml_diagnostics(URI).is_empty());
    assert!(!analysis.is_playbook(URI));
    assert!(analysis.module_at(URI, TextSize::new(0)).is_none());
}

#[rstest]
fn test_set_workspace_replaces_the_index(mut host: AnalysisHost) {
    let before = host.analysis().index().len();
    host.set_workspace(Arc::new(WorkspaceIndex::new()));
    assert_eq!(before, 3);
    assert_eq!(host.analysis().index().len(), 0);
}

// ============================================================================
// NAVIGATION
// ============================================================================

#[rstest]
fn test_path_at_position(host: AnalysisHost) {
    let analysis = host.analysis();
    let path = analysis.path_at_position(URI, 5, 6, false).unwrap();
    assert_eq!(last_scalar(&path), Some("debug"));

    assert!(analysis.path_at_position(URI, 500, 0, false).is_none());
}

#[rstest]
fn test_is_playbook(mut host: AnalysisHost) {
    host.set_file_content("file:///ws/roles/r/tasks/main.yml", "- debug:\n    msg: hi\n");
    let analysis = host.analysis();
    assert!(analysis.is_playbook(URI));
    assert!(!analysis.is_playbook("file:///ws/roles/r/tasks/main.yml"));
}

#[rstest]
fn test_is_inside_jinja(host: AnalysisHost) {
    let analysis = host.analysis();
    let greeting = offset_of(PLAYBOOK, "greeting");
    let and = offset_of(PLAYBOOK, " and ") + TextSize::new(2);
    let name = offset_of(PLAYBOOK, "name }}");

    assert!(analysis.is_inside_jinja(URI, greeting));
    assert!(!analysis.is_inside_jinja(URI, and));
    assert!(analysis.is_inside_jinja(URI, name));
    assert!(!analysis.is_inside_jinja(URI, offset_of(PLAYBOOK, "hosts")));
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

#[test]
fn test_yaml_diagnostics_are_merged() {
    let mut host = AnalysisHost::new();
    host.set_file_content("file:///ws/x.yml", "a: [1, 2\nb: 1\nb: 2\n");
    let analysis = host.analysis();
    let diagnostics = analysis.yaml_diagnostics("file:///ws/x.yml");

    assert!(!diagnostics.is_empty());
    for (i, a) in diagnostics.iter().enumerate() {
        for b in &diagnostics[i + 1..] {
            let hides = a.range.start() < b.range.start() && b.range.end() < a.range.end();
            assert!(!hides, "{a:?} hides {b:?}");
        }
    }
}

// ============================================================================
// MODULES
// ============================================================================

#[rstest]
fn test_module_at_task_key(host: AnalysisHost) {
    let analysis = host.analysis();

    let debug = analysis.module_at(URI, offset_of(PLAYBOOK, "debug")).unwrap();
    assert_eq!(debug.fqcn.as_deref(), Some("community.general.debug"));
    assert_eq!(
        debug.module.map(|m| m.fqcn.clone()).as_deref(),
        Some("ansible.builtin.debug")
    );

    let ufw = analysis.module_at(URI, offset_of(PLAYBOOK, "ufw")).unwrap();
    assert_eq!(ufw.fqcn.as_deref(), Some("community.general.ufw"));
}

#[rstest]
#[case("not_a_module")]
#[case("name: greet")]
#[case("hosts")]
#[case("msg")]
fn test_module_at_elsewhere_is_none(host: AnalysisHost, #[case] needle: &str) {
    let analysis = host.analysis();
    assert!(analysis.module_at(URI, offset_of(PLAYBOOK, needle)).is_none());
}

#[rstest]
fn test_options_at(host: AnalysisHost) {
    let analysis = host.analysis();

    let debug_options = analysis.options_at(URI, offset_of(PLAYBOOK, "msg")).unwrap();
    assert!(debug_options.contains_key("verbosity"));

    let rule_options = analysis.options_at(URI, offset_of(PLAYBOOK, "port")).unwrap();
    let mut names: Vec<&str> = rule_options.keys().map(String::as_str).collect();
    names.sort();
    assert_eq!(names, vec!["port", "proto", "protocol"]);

    assert!(analysis.options_at(URI, offset_of(PLAYBOOK, "a: 1")).is_none());
}
