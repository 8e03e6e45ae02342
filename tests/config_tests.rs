//! gitolite.conf parsing, management and rendering tests

use gitolite_conf::config::{Config, Group, Repo};
use gitolite_conf::error::GitoliteError;
use gitolite_conf::system::{RealSystem, System as _};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/configs")
        .join(name)
}

fn load_fixture(name: &str) -> Config {
    Config::load_from_file(&RealSystem::new(), &fixture(name)).unwrap()
}

fn users(repo: &Repo, token: &str, refex: &str) -> Vec<String> {
    repo.permission(token)
        .and_then(|block| block.users(refex))
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

#[test]
fn reads_a_simple_configuration() {
    let config = load_fixture("simple.conf");
    assert_eq!(config.filename(), "simple.conf");
    assert_eq!(config.repos().count(), 2);
    assert_eq!(config.groups().count(), 0);
    assert_eq!(users(config.get_repo("testing").unwrap(), "RW+", ""), ["@all"]);
}

#[test]
fn reads_a_complex_configuration() {
    let config = load_fixture("complicated.conf");
    assert_eq!(config.groups().count(), 5);
    assert_eq!(config.repos().count(), 6);

    let staff = config.get_group("staff").unwrap();
    assert_eq!(staff.users().collect::<Vec<_>>(), ["alice", "dilbert", "wally"]);
}

#[test]
fn rules_apply_to_every_repo_in_context() {
    let config = load_fixture("complicated.conf");
    for name in ["foo", "bar"] {
        let repo = config.get_repo(name).unwrap();
        let tokens: Vec<&str> = repo
            .permissions()
            .iter()
            .map(|block| block.permission.as_str())
            .collect();
        assert_eq!(tokens, ["RW+", "RW", "RWCD"], "{name}");
        assert_eq!(users(repo, "RWCD", "refs/heads/feature/"), ["@engineers"]);
    }
}

#[test]
fn refex_and_deny_rules_are_kept_in_order() {
    let config = load_fixture("complicated.conf");
    let repo = config.get_repo("gitolite").unwrap();
    let tokens: Vec<&str> = repo
        .permissions()
        .iter()
        .map(|block| block.permission.as_str())
        .collect();
    assert_eq!(tokens, ["RW+", "RW", "-", "R"]);
    assert_eq!(users(repo, "RW", "dev/"), ["@staff"]);
    assert_eq!(users(repo, "-", "refs/tags/"), ["@interns"]);
    assert!(repo.permission("-").unwrap().permission.is_deny());
}

#[test]
fn reads_gitweb_metadata() {
    let config = load_fixture("complicated.conf");

    let gitolite = config.get_repo("gitolite").unwrap();
    assert_eq!(gitolite.owner(), Some("Sitaram Chamarty"));
    assert_eq!(
        gitolite.description(),
        Some("fast, secure, access control for git in a corporate environment")
    );

    let foo = config.get_repo("foo").unwrap();
    assert_eq!(foo.owner(), None);
    assert_eq!(foo.description(), Some("Foo is a nice test repo"));

    let foobar = config.get_repo("foobar").unwrap();
    assert_eq!(foobar.owner(), Some("Bob Zilla"));
    assert_eq!(foobar.description(), Some("Foobar is top secret"));
    assert!(foobar.permissions().is_empty());

    let bar = config.get_repo("bar").unwrap();
    assert_eq!(bar.owner(), None);
    assert_eq!(bar.description(), Some("A nice place to get drinks"));
}

#[test]
fn reads_git_config_and_options() {
    let config = load_fixture("complicated.conf");

    let gitolite = config.get_repo("gitolite").unwrap();
    assert_eq!(gitolite.git_config().len(), 4);
    assert_eq!(gitolite.git_config()["foo.bar"], "");
    assert_eq!(gitolite.git_config()["hooks.emailprefix"], "\"[gitolite] \"");

    let foo = config.get_repo("foo").unwrap();
    assert_eq!(foo.options().len(), 3);
    assert_eq!(foo.options()["mirror.slaves"], "one two");
    assert!(config.get_repo("bar").unwrap().options().is_empty());
}

#[test]
fn gitweb_descriptions_are_sorted_by_repo() {
    let config = load_fixture("complicated.conf");
    assert_eq!(
        config.gitweb_descriptions(),
        [
            "bar = \"A nice place to get drinks\"",
            "foo = \"Foo is a nice test repo\"",
            "foobar \"Bob Zilla\" = \"Foobar is top secret\"",
            "gitolite \"Sitaram Chamarty\" = \"fast, secure, access control for git in a corporate environment\"",
        ]
    );
}

#[test]
fn parses_two_permission_blocks() {
    let config = Config::parse("repo foo\n  RW+ = bob joe\n  R = sue\n", "gitolite.conf").unwrap();
    assert_eq!(config.repos().count(), 1);

    let foo = config.get_repo("foo").unwrap();
    assert_eq!(foo.permissions().len(), 2);
    assert_eq!(users(foo, "RW+", ""), ["bob", "joe"]);
    assert_eq!(users(foo, "R", ""), ["sue"]);
}

#[test]
fn parses_groups_and_bare_gitweb_lines() {
    let config = Config::parse("@staff = alice bob\nfoo = \"desc\"\n", "gitolite.conf").unwrap();

    let staff = config.get_group("staff").unwrap();
    assert_eq!(staff.users().collect::<Vec<_>>(), ["alice", "bob"]);

    let foo = config.get_repo("foo").unwrap();
    assert_eq!(foo.description(), Some("desc"));
    assert_eq!(foo.owner(), None);
}

#[test]
fn parse_errors_carry_the_line_number() {
    let cases = [
        ("@group \"X\" = \"Y\"\n", 1),
        ("repo foo\n\n  RW+ = bob\ngitolite \"Bob Zilla\"\n", 4),
        ("repo foobar\n  option mirror.master =", 2),
        ("repo foo\n  RM = bob\n", 2),
    ];
    for (text, line) in cases {
        match Config::parse(text, "gitolite.conf") {
            Err(GitoliteError::Parse { line: actual, .. }) => assert_eq!(actual, line, "{text:?}"),
            other => panic!("expected a parse error for {text:?}, got {other:?}"),
        }
    }
}

#[test]
fn comments_and_blank_lines_are_ignored() {
    let text = "# header\n\n   \nrepo foo # trailing\n  R = \"#quoted\" bob # tail\n";
    let config = Config::parse(text, "gitolite.conf").unwrap();
    assert_eq!(
        users(config.get_repo("foo").unwrap(), "R", ""),
        ["\"#quoted\"", "bob"]
    );
}

#[test]
fn rules_before_any_repo_are_dropped() {
    let config = Config::parse("RW+ = bob\nrepo foo\n  R = sue\n", "gitolite.conf").unwrap();
    assert_eq!(config.repos().count(), 1);
    assert!(config.get_repo("foo").unwrap().permission("RW+").is_none());
}

#[test]
fn repeated_repo_declarations_accumulate() {
    let text = "repo foo\n  RW+ = bob\nrepo foo\n  RW+ = alice bob\n  R = sue\n";
    let config = Config::parse(text, "gitolite.conf").unwrap();
    let foo = config.get_repo("foo").unwrap();
    assert_eq!(users(foo, "RW+", ""), ["bob", "alice"]);
    assert_eq!(users(foo, "R", ""), ["sue"]);
}

#[test]
fn to_file_creates_missing_directories() {
    let temp = TempDir::new().unwrap();
    let system = RealSystem::new();
    let dir = temp.path().join("nested").join("conf");

    let mut config = Config::new("custom.conf");
    config.add_repo(Repo::new("foo")).unwrap();

    let path = config.to_file(&system, &dir).unwrap();
    assert_eq!(path, dir.join("custom.conf"));
    assert!(system.is_file(&path).unwrap());
}

#[test]
fn rendered_groups_follow_their_dependencies() {
    let mut config = Config::init();
    for (name, members) in [
        ("groupa", vec!["bob", "@groupb"]),
        ("groupb", vec!["joe", "sam", "susan", "andrew"]),
        ("groupc", vec!["@groupb", "brandon", "earl", "jane"]),
        ("groupd", vec!["@groupc", "larry", "moe"]),
    ] {
        let mut group = Group::new(name);
        group.add_users(members);
        config.add_group(group).unwrap();
    }

    let text = config.render().unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "@groupb             = andrew joe sam susan");
    assert_eq!(lines[1], "@groupc             = @groupb brandon earl jane");
    assert_eq!(lines[2], "@groupd             = @groupc larry moe");
    assert_eq!(lines[3], "@groupa             = @groupb bob");
}

#[test]
fn cyclic_groups_fail_to_render() {
    let mut config = Config::init();
    let mut a = Group::new("groupa");
    a.add_users(["bob", "@groupb"]);
    let mut b = Group::new("groupb");
    b.add_users(["@groupa", "joe"]);
    config.add_group(a).unwrap();
    config.add_group(b).unwrap();

    assert!(matches!(
        config.render(),
        Err(GitoliteError::GroupDependency { .. })
    ));
}

#[test]
fn fixtures_round_trip() {
    for name in ["simple.conf", "complicated.conf"] {
        let config = load_fixture(name);
        let text = config.render().unwrap();
        let reparsed = Config::parse(&text, name).unwrap();
        assert_eq!(reparsed, config, "{name}");
        assert_eq!(reparsed.render().unwrap(), text, "{name}");
    }
}

#[test]
fn rendered_fixture_is_stable_on_disk() {
    let temp = TempDir::new().unwrap();
    let system = RealSystem::new();
    let config = load_fixture("complicated.conf");

    let first = config.to_file(&system, temp.path()).unwrap();
    let first_text = fs::read_to_string(&first).unwrap();

    let reloaded = Config::load_from_file(&system, &first).unwrap();
    let second = reloaded.to_file(&system, &temp.path().join("again")).unwrap();
    assert_eq!(fs::read_to_string(second).unwrap(), first_text);
}
