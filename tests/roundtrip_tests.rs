//! Property-based tests for the render/parse round trip
//!
//! Generated configs stay inside what gitolite.conf can express: names
//! without whitespace, rules with at least one user, option values that
//! are not empty and text without `=`, `#` or quotes.

use gitolite_conf::config::{Config, Group, Repo};
use proptest::prelude::*;
use std::collections::BTreeSet;

const TOKENS: &[&str] = &["R", "RW", "RW+", "-", "C", "RWC", "RW+CD", "RWM", "RW+DCM"];

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}"
}

fn phrase() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z0-9,.]{1,6}", 1..4).prop_map(|words| words.join(" "))
}

fn config_key() -> impl Strategy<Value = String> {
    ("[a-z]{1,5}", "[a-z][a-zA-Z]{0,6}").prop_map(|(section, key)| format!("{section}.{key}"))
}

fn refex() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z]{1,6}".prop_map(|branch| format!("refs/heads/{branch}/")),
        Just("refs/tags/v[0-9]".to_owned()),
    ]
}

fn user() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => word(),
        1 => word().prop_map(|name| format!("@{name}")),
        1 => Just("@all".to_owned()),
    ]
}

/// A `(token, refex, users)` rule
fn rule() -> impl Strategy<Value = (&'static str, String, Vec<String>)> {
    (
        prop::sample::select(TOKENS),
        refex(),
        prop::collection::vec(user(), 1..4),
    )
}

fn repo() -> impl Strategy<Value = Repo> {
    (
        word().prop_filter("reserved keyword", |name| {
            !matches!(name.as_str(), "repo" | "config" | "option")
        }),
        prop::collection::vec(rule(), 0..5),
        prop::collection::btree_map(config_key(), prop_oneof![Just(String::new()), phrase()], 0..3),
        prop::collection::btree_map(config_key(), phrase(), 0..3),
        prop::option::of((prop::option::of(phrase()), phrase())),
    )
        .prop_map(|(name, rules, git_config, options, gitweb)| {
            let mut repo = Repo::new(name);
            for (token, refex, users) in rules {
                repo.add_permission(token, &refex, users).unwrap();
            }
            for (key, value) in git_config {
                repo.set_git_config(key, value);
            }
            for (key, value) in options {
                repo.set_gitolite_option(key, value);
            }
            if let Some((owner, description)) = gitweb {
                repo.set_owner(owner);
                repo.set_description(Some(description));
            }
            repo
        })
}

/// Groups that only reference groups generated before them, so the set is
/// always acyclic
fn groups() -> impl Strategy<Value = Vec<Group>> {
    prop::collection::vec(
        (
            prop::collection::vec(word(), 0..4),
            prop::collection::vec(any::<prop::sample::Index>(), 0..3),
        ),
        0..6,
    )
    .prop_map(|specs| {
        let mut groups: Vec<Group> = Vec::new();
        for (i, (users, refs)) in specs.into_iter().enumerate() {
            let mut group = Group::new(format!("group{i}"));
            group.add_users(users);
            if i > 0 {
                for index in refs {
                    group.add_user(format!("@group{}", index.index(i)));
                }
            }
            groups.push(group);
        }
        groups
    })
}

fn config() -> impl Strategy<Value = Config> {
    (groups(), prop::collection::vec(repo(), 0..5)).prop_map(|(groups, repos)| {
        let mut config = Config::init();
        for group in groups {
            config.add_group(group).unwrap();
        }
        for repo in repos {
            config.add_repo(repo).unwrap();
        }
        config
    })
}

proptest! {
    /// Rendering and re-parsing gives back the same model.
    #[test]
    fn render_then_parse_is_identity(config in config()) {
        let text = config.render().unwrap();
        let reparsed = Config::parse(&text, config.filename()).unwrap();
        prop_assert_eq!(reparsed, config);
    }

    /// Rendering the re-parsed model gives back the same text.
    #[test]
    fn render_is_idempotent(config in config()) {
        let text = config.render().unwrap();
        let again = Config::parse(&text, config.filename()).unwrap().render().unwrap();
        prop_assert_eq!(again, text);
    }

    /// Every group is ordered after the groups it references.
    #[test]
    fn group_order_respects_references(config in config()) {
        let order = config.group_order().unwrap();
        prop_assert_eq!(order.len(), config.groups().count());

        let mut seen = BTreeSet::new();
        for group in order {
            for subgroup in group.subgroups() {
                prop_assert!(
                    seen.contains(subgroup),
                    "@{} rendered before @{}",
                    subgroup,
                    group.name()
                );
            }
            seen.insert(group.name().to_owned());
        }
    }

    /// Messy but valid input survives a round trip after one normalization.
    #[test]
    fn cleanup_reaches_a_fixed_point(
        spaces in prop::collection::vec(" {0,3}", 6),
        name in word(),
        users in prop::collection::vec(word(), 1..4),
    ) {
        let text = format!(
            "{}repo{} {name}\n{}RW+{}={}{}\n",
            spaces[0],
            spaces[1],
            spaces[2],
            spaces[3],
            spaces[4],
            users.join(&format!(" {}", spaces[5])),
        );
        let config = Config::parse(&text, "gitolite.conf").unwrap();
        let repo = config.get_repo(name.as_str()).unwrap();

        let mut expected: Vec<String> = Vec::new();
        for user in users {
            if !expected.contains(&user) {
                expected.push(user);
            }
        }
        prop_assert_eq!(repo.permission("RW+").unwrap().users(""), Some(expected.as_slice()));

        let rendered = config.render().unwrap();
        prop_assert_eq!(Config::parse(&rendered, "gitolite.conf").unwrap(), config);
    }
}
