//! Ansible playbook keywords.
//!
//! The sets mirror the keyword reference for plays, roles, blocks and
//! tasks. Anything in a task mapping that is not a task keyword names a
//! module.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

// ============================================================================
// KEYWORD TABLES
// ============================================================================

pub const PLAY_KEYWORDS: &[&str] = &[
    "any_errors_fatal",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "diff",
    "environment",
    "fact_path",
    "force_handlers",
    "gather_facts",
    "gather_subset",
    "gather_timeout",
    "handlers",
    "hosts",
    "ignore_errors",
    "ignore_unreachable",
    "max_fail_percentage",
    "module_defaults",
    "name",
    "no_log",
    "order",
    "port",
    "post_tasks",
    "pre_tasks",
    "remote_user",
    "roles",
    "run_once",
    "serial",
    "strategy",
    "tags",
    "tasks",
    "throttle",
    "timeout",
    "vars",
    "vars_files",
    "vars_prompt",
];

pub const ROLE_KEYWORDS: &[&str] = &[
    "any_errors_fatal",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "delegate_facts",
    "delegate_to",
    "diff",
    "environment",
    "ignore_errors",
    "ignore_unreachable",
    "module_defaults",
    "name",
    "no_log",
    "port",
    "remote_user",
    "run_once",
    "tags",
    "throttle",
    "timeout",
    "vars",
    "when",
];

pub const BLOCK_KEYWORDS: &[&str] = &[
    "always",
    "any_errors_fatal",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "block",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "delegate_facts",
    "delegate_to",
    "diff",
    "environment",
    "ignore_errors",
    "ignore_unreachable",
    "module_defaults",
    "name",
    "no_log",
    "notify",
    "port",
    "remote_user",
    "rescue",
    "run_once",
    "tags",
    "throttle",
    "timeout",
    "vars",
    "when",
];

pub const TASK_KEYWORDS: &[&str] = &[
    "action",
    "any_errors_fatal",
    "args",
    "async",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "changed_when",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "delay",
    "delegate_facts",
    "delegate_to",
    "diff",
    "environment",
    "failed_when",
    "ignore_errors",
    "ignore_unreachable",
    "local_action",
    "loop",
    "loop_control",
    "module_defaults",
    "name",
    "no_log",
    "notify",
    "poll",
    "port",
    "register",
    "remote_user",
    "retries",
    "run_once",
    "tags",
    "throttle",
    "timeout",
    "until",
    "vars",
    "when",
    "listen",
];

static PLAY: Lazy<FxHashSet<&'static str>> = Lazy::new(|| PLAY_KEYWORDS.iter().copied().collect());
static ROLE: Lazy<FxHashSet<&'static str>> = Lazy::new(|| ROLE_KEYWORDS.iter().copied().collect());
static BLOCK: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| BLOCK_KEYWORDS.iter().copied().collect());
static TASK: Lazy<FxHashSet<&'static str>> = Lazy::new(|| TASK_KEYWORDS.iter().copied().collect());

/// Play keywords that no task, role or block accepts. Seeing one of these
/// in a mapping identifies the mapping as a play.
static PLAY_EXCLUSIVE: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    PLAY_KEYWORDS
        .iter()
        .copied()
        .filter(|k| !TASK.contains(k) && !ROLE.contains(k) && !BLOCK.contains(k))
        .collect()
});

/// Play keywords that are not also task keywords.
static PLAY_WITHOUT_TASK: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    PLAY_KEYWORDS
        .iter()
        .copied()
        .filter(|k| !TASK.contains(k))
        .collect()
});

// ============================================================================
// PREDICATES
// ============================================================================

pub fn is_play_keyword(key: &str) -> bool {
    PLAY.contains(key)
}

pub fn is_role_keyword(key: &str) -> bool {
    ROLE.contains(key)
}

pub fn is_block_keyword(key: &str) -> bool {
    BLOCK.contains(key)
}

/// Task keyword, including the legacy `with_*` loop keywords.
pub fn is_task_keyword(key: &str) -> bool {
    TASK.contains(key) || key.starts_with("with_")
}

pub fn is_play_exclusive_keyword(key: &str) -> bool {
    PLAY_EXCLUSIVE.contains(key)
}

pub fn is_play_without_task_keyword(key: &str) -> bool {
    PLAY_WITHOUT_TASK.contains(key)
}
