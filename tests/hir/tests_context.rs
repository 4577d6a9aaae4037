//! Tests for task, play, block and role classification and declared collections.

use ansible_ls::hir::{
    ValueShape, get_declared_collections, get_task_param_path_with_trace, get_yaml_map_keys,
    is_block_param, is_play_param, is_playbook, is_role_param, is_task_param,
};
use rstest::rstest;

use crate::helpers::yaml_helpers::{last_scalar, parse_clean, path_at};

const PLAYBOOK: &str = "\
- hosts: webservers
  become: true
  roles:
    - role: common
      tags: base
  tasks:
    - name: install
      package:
        name: nginx
    - block:
        - name: inside
          service:
            name: nginx
      when: enabled
";

const ROLE_TASKS: &str = "\
- name: first
  copy:
    src: a
    dest: b
";

// ============================================================================
// STRUCTURAL ROLES
// ============================================================================

#[rstest]
#[case("package", true)]
#[case("service", true)]
#[case("name: install", true)]
#[case("hosts", false)]
#[case("become", false)]
#[case("tasks", false)]
#[case("role: common", false)]
#[case("when", false)]
#[case("nginx", false)]
fn test_is_task_param(#[case] needle: &str, #[case] expected: bool) {
    let file = parse_clean(PLAYBOOK);
    let path = path_at(&file, PLAYBOOK, needle);
    assert_eq!(is_task_param(&path), expected, "at {:?}", needle);
}

#[test]
fn test_task_in_role_file_is_task_param() {
    let file = parse_clean(ROLE_TASKS);
    let path = path_at(&file, ROLE_TASKS, "copy");
    assert!(is_task_param(&path));
}

#[test]
fn test_play_param_needs_play_keyword() {
    let file = parse_clean(PLAYBOOK);
    assert_eq!(is_play_param(&path_at(&file, PLAYBOOK, "become"), None), Some(true));
    assert_eq!(is_play_param(&path_at(&file, PLAYBOOK, "package"), None), Some(false));

    let role_file = parse_clean(ROLE_TASKS);
    let name = path_at(&role_file, ROLE_TASKS, "name");
    assert_eq!(is_play_param(&name, None), None);
    assert_eq!(
        is_play_param(&name, Some("file:///ws/roles/web/tasks/main.yml")),
        Some(false)
    );
    assert_eq!(is_play_param(&name, Some("file:///ws/site.yml")), None);
}

#[test]
fn test_block_and_role_params() {
    let file = parse_clean(PLAYBOOK);

    let when = path_at(&file, PLAYBOOK, "when");
    assert!(is_block_param(&when));
    assert!(!is_role_param(&when));

    let tags = path_at(&file, PLAYBOOK, "tags");
    assert!(is_role_param(&tags));
    assert!(!is_block_param(&tags));

    let service = path_at(&file, PLAYBOOK, "service");
    assert!(!is_block_param(&service));
    assert!(!is_role_param(&service));
}

#[test]
fn test_yaml_map_keys_in_order() {
    let file = parse_clean(PLAYBOOK);
    let play = file.documents[0].contents.as_ref().unwrap().as_sequence().unwrap().items[0]
        .as_mapping()
        .unwrap();
    assert_eq!(get_yaml_map_keys(play), vec!["hosts", "become", "roles", "tasks"]);
}

// ============================================================================
// DECLARED COLLECTIONS
// ============================================================================

#[test]
fn test_collections_from_block_rescue_and_play() {
    let text = "\
- hosts: all
  collections:
    - play.collection
  tasks:
    - block:
        - debug: {}
      rescue:
        - block:
            - name: nested
              ping:
          collections:
            - rescue.collection
      collections:
        - block.collection
";
    let file = parse_clean(text);
    let path = path_at(&file, text, "ping");

    let mut declared = get_declared_collections(&path);
    declared.sort();
    assert_eq!(
        declared,
        vec!["block.collection", "play.collection", "rescue.collection"]
    );
}

#[test]
fn test_collections_innermost_first_without_duplicates() {
    let text = "\
- hosts: all
  collections: [a.b, c.d]
  tasks:
    - collections: [c.d]
      shell: echo
";
    let file = parse_clean(text);
    let path = path_at(&file, text, "shell");
    assert_eq!(get_declared_collections(&path), vec!["c.d", "a.b"]);
}

#[test]
fn test_no_collections_in_role_file() {
    let file = parse_clean(ROLE_TASKS);
    let path = path_at(&file, ROLE_TASKS, "copy");
    assert!(get_declared_collections(&path).is_empty());
}

// ============================================================================
// OPTION TRACE
// ============================================================================

#[test]
fn test_trace_through_list_of_dicts() {
    let text = "\
- community.general.ufw:
    rules:
      - port: '22'
";
    let file = parse_clean(text);
    let path = path_at(&file, text, "port");

    let (task_param, trace) = get_task_param_path_with_trace(&path).unwrap();
    assert_eq!(last_scalar(&task_param), Some("community.general.ufw"));
    assert_eq!(
        trace,
        vec![
            ("rules".to_string(), ValueShape::List),
            ("community.general.ufw".to_string(), ValueShape::Dict),
        ]
    );
}

#[test]
fn test_trace_is_empty_at_the_module_key() {
    let file = parse_clean(ROLE_TASKS);
    let path = path_at(&file, ROLE_TASKS, "copy");
    let (task_param, trace) = get_task_param_path_with_trace(&path).unwrap();
    assert_eq!(task_param.len(), path.len());
    assert!(trace.is_empty());
}

#[test]
fn test_trace_fails_on_values() {
    let file = parse_clean(ROLE_TASKS);
    let path = path_at(&file, ROLE_TASKS, "first");
    assert!(get_task_param_path_with_trace(&path).is_none());
}

// ============================================================================
// DOCUMENT KIND
// ============================================================================

#[rstest]
#[case(PLAYBOOK, true)]
#[case(ROLE_TASKS, false)]
#[case("hosts: all\n", false)]
#[case("- name: setup\n  gather_facts: false\n", true)]
#[case("", false)]
fn test_is_playbook(#[case] text: &str, #[case] expected: bool) {
    let file = parse_clean(text);
    assert_eq!(is_playbook(&file.documents), expected);
}
