// tests/sanitize.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use execd::config::SandboxSection;
use execd::exec::{is_sandbox_path, join_under, Sanitizer};
use execd::fs::mock::MockFileSystem;

fn sanitizer() -> Sanitizer {
    Sanitizer::new(&SandboxSection::default(), PathBuf::from("/home/u")).unwrap()
}

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn inherited(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    env(pairs).into_iter().collect()
}

#[test]
fn test_sandbox_path_predicate() {
    assert!(is_sandbox_path("/sessions/abc/mnt", "/sessions/"));
    assert!(is_sandbox_path("/sessions", "/sessions/"));
    assert!(!is_sandbox_path("/sessionsfoo/x", "/sessions/"));
    assert!(!is_sandbox_path("/home/u/.config", "/sessions/"));
    assert!(!is_sandbox_path("sessions/abc", "/sessions/"));
}

#[test]
fn test_join_under_refuses_escapes() {
    let home = Path::new("/home/u");
    assert_eq!(join_under(home, "a/./b"), Some(PathBuf::from("/home/u/a/b")));
    assert_eq!(join_under(home, "a/../b"), Some(PathBuf::from("/home/u/b")));
    assert_eq!(join_under(home, ""), Some(PathBuf::from("/home/u")));
    assert_eq!(join_under(home, "../x"), None);
    assert_eq!(join_under(home, "/etc/passwd"), None);
}

#[test]
fn test_config_dir_with_sandbox_value_is_removed() {
    let s = sanitizer();
    let out = s.build_env(
        inherited(&[]),
        &env(&[("CLAUDE_CONFIG_DIR", "/sessions/abc/.claude")]),
    );
    assert!(!out.contains_key("CLAUDE_CONFIG_DIR"));
}

#[test]
fn test_config_dir_with_host_value_passes_through() {
    let s = sanitizer();
    let out = s.build_env(
        inherited(&[]),
        &env(&[("CLAUDE_CONFIG_DIR", "/home/u/.claude")]),
    );
    assert_eq!(out.get("CLAUDE_CONFIG_DIR").map(String::as_str), Some("/home/u/.claude"));
}

#[test]
fn test_sandbox_config_dir_also_hides_inherited_value() {
    let s = sanitizer();
    let out = s.build_env(
        inherited(&[("CLAUDE_CONFIG_DIR", "/home/u/.daemon-claude")]),
        &env(&[("CLAUDE_CONFIG_DIR", "/sessions/abc/.claude")]),
    );
    assert!(!out.contains_key("CLAUDE_CONFIG_DIR"));
}

#[test]
fn test_marker_and_toolkit_variables_never_reach_children() {
    let s = sanitizer();
    let out = s.build_env(
        inherited(&[
            ("CLAUDECODE", "1"),
            ("ELECTRON_RUN_AS_NODE", "1"),
            ("CHROME_DESKTOP", "app.desktop"),
            ("ORIGINAL_XDG_CURRENT_DESKTOP", "GNOME"),
            ("PATH", "/usr/bin:/bin"),
            ("TERM", "dumb"),
        ]),
        &env(&[("CLAUDECODE", "1"), ("API_KEY", "k")]),
    );

    assert_eq!(
        out,
        env(&[
            ("API_KEY", "k"),
            ("PATH", "/usr/bin:/bin"),
            ("TERM", "xterm-256color"),
        ])
    );
}

#[test]
fn test_requested_env_overrides_inherited_but_not_term() {
    let s = sanitizer();
    let out = s.build_env(
        inherited(&[("HOME", "/root"), ("LANG", "C")]),
        &env(&[("LANG", "en_US.UTF-8"), ("TERM", "vt100")]),
    );
    assert_eq!(out["LANG"], "en_US.UTF-8");
    assert_eq!(out["HOME"], "/root");
    assert_eq!(out["TERM"], "xterm-256color");
}

#[test]
fn test_sandbox_flag_pairs_are_dropped() {
    let s = sanitizer();
    let args: Vec<String> = [
        "--print",
        "--add-dir",
        "/sessions/abc/mnt/repo",
        "--plugin-dir=/sessions/abc/plugins",
        "--model",
        "opus",
        "/sessions/abc/positional",
    ]
    .iter()
    .map(|a| a.to_string())
    .collect();

    assert_eq!(
        s.filter_args(&args),
        vec!["--print", "--model", "opus", "/sessions/abc/positional"]
    );
}

#[test]
fn test_cwd_resolution_order() {
    let s = sanitizer();
    let fs = MockFileSystem::new();
    fs.add_dir("/home/u");
    fs.add_dir("/srv/project");

    // Shared cwd wins and lands under home.
    assert_eq!(
        s.resolve_cwd(&fs, Some("/srv/project"), Some("/work/repo")),
        PathBuf::from("/home/u/work/repo")
    );
    // Sandbox cwd falls back to home.
    assert_eq!(
        s.resolve_cwd(&fs, Some("/sessions/abc/mnt/repo"), None),
        PathBuf::from("/home/u")
    );
    // Existing host cwd is used as is.
    assert_eq!(
        s.resolve_cwd(&fs, Some("/srv/project"), None),
        PathBuf::from("/srv/project")
    );
    // Missing host cwd falls back to home.
    assert_eq!(s.resolve_cwd(&fs, Some("/nope"), None), PathBuf::from("/home/u"));
    assert_eq!(s.resolve_cwd(&fs, None, None), PathBuf::from("/home/u"));
}

#[test]
fn test_translate_sandbox_mount_paths() {
    let s = sanitizer();
    assert_eq!(
        s.translate_sandbox_path("/sessions/abc/mnt/docs/a.md"),
        Some(PathBuf::from("/home/u/docs/a.md"))
    );
    assert_eq!(
        s.translate_sandbox_path("/sessions/abc/mnt"),
        Some(PathBuf::from("/home/u"))
    );
    assert_eq!(s.translate_sandbox_path("/sessions/abc/tmp/a"), None);
    assert_eq!(s.translate_sandbox_path("/sessions/abc/mnt/../../etc"), None);
    assert_eq!(s.translate_sandbox_path("/home/u/a"), None);
}

#[test]
fn test_prepare_combines_all_rules() {
    let s = sanitizer();
    let fs = MockFileSystem::new();
    fs.add_dir("/home/u");

    let launch = s.prepare(
        &fs,
        inherited(&[("PATH", "/bin")]),
        &env(&[("CLAUDE_CONFIG_DIR", "/sessions/x/.claude")]),
        &["--settings".to_string(), "/sessions/x/s.json".to_string()],
        Some("/sessions/x"),
        None,
    );

    assert!(launch.args.is_empty());
    assert_eq!(launch.cwd, PathBuf::from("/home/u"));
    assert_eq!(launch.env, env(&[("PATH", "/bin"), ("TERM", "xterm-256color")]));
}
