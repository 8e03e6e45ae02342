//! Group dependency ordering
//!
//! gitolite only accepts a group reference after the referenced group has
//! been defined. Groups are therefore rendered in a topological order of the
//! graph with an edge `referenced -> dependent` for every `@group` member.
//!
//! The order is a depth-first reverse postorder. Start vertices are taken in
//! name order and each vertex's edges in the order its dependents were
//! discovered (also name order), so the result depends only on the groups
//! themselves.

use super::group::{ALL_GROUP, GROUP_SIGIL, Group};
use crate::error::{GitoliteError, Result};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Adjacency lists over group vertices, indexed in name order
struct Graph<'a> {
    groups: Vec<&'a Group>,
    edges: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    fn build(groups: &'a BTreeMap<String, Group>) -> Result<Self> {
        let index: BTreeMap<&str, usize> = groups
            .keys()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut edges = vec![Vec::new(); groups.len()];
        for (dependent, group) in groups.values().enumerate() {
            for referenced in group.subgroups() {
                if referenced == ALL_GROUP {
                    continue;
                }
                let Some(&from) = index.get(referenced) else {
                    return Err(GitoliteError::group_dependency(format!(
                        "group {GROUP_SIGIL}{} references undefined group {GROUP_SIGIL}{referenced}",
                        group.name()
                    )));
                };
                edges[from].push(dependent);
            }
        }

        Ok(Self {
            groups: groups.values().collect(),
            edges,
        })
    }

    /// Iterative depth-first walk from `start`; each stack frame is
    /// `(vertex, index of the next edge to follow)`
    fn visit(&self, start: usize, marks: &mut [Mark], postorder: &mut Vec<usize>) -> Result<()> {
        marks[start] = Mark::InProgress;
        let mut stack = vec![(start, 0_usize)];

        while let Some(frame) = stack.last_mut() {
            let (vertex, cursor) = *frame;
            let Some(&next) = self.edges[vertex].get(cursor) else {
                marks[vertex] = Mark::Done;
                postorder.push(vertex);
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[next] {
                Mark::Done => {}
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => {
                    return Err(GitoliteError::group_dependency(format!(
                        "cyclic membership between groups {GROUP_SIGIL}{} and {GROUP_SIGIL}{}",
                        self.groups[vertex].name(),
                        self.groups[next].name()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Order `groups` so that every group comes after the groups it references
///
/// An empty map yields an empty order. References to the builtin `@all`
/// group are ignored.
///
/// # Errors
///
/// Returns [`GitoliteError::GroupDependency`] if membership is cyclic or a
/// member references a group that does not exist
pub fn resolve(groups: &BTreeMap<String, Group>) -> Result<Vec<&Group>> {
    let graph = Graph::build(groups)?;

    let mut marks = vec![Mark::Unvisited; graph.groups.len()];
    let mut postorder = Vec::with_capacity(graph.groups.len());
    for vertex in 0..graph.groups.len() {
        if marks[vertex] == Mark::Unvisited {
            graph.visit(vertex, &mut marks, &mut postorder)?;
        }
    }

    let order: Vec<&Group> = postorder
        .into_iter()
        .rev()
        .map(|vertex| graph.groups[vertex])
        .collect();

    debug!(
        "Group order: {}",
        order.iter().map(|g| g.name()).collect::<Vec<_>>().join(", ")
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(defs: &[(&str, &[&str])]) -> BTreeMap<String, Group> {
        defs.iter()
            .map(|(name, members)| {
                let mut group = Group::new(*name);
                group.add_users(members.iter().copied());
                ((*name).to_owned(), group)
            })
            .collect()
    }

    fn names(order: &[&Group]) -> Vec<String> {
        order.iter().map(|g| g.name().to_owned()).collect()
    }

    #[test]
    fn empty_graph_is_ok() {
        assert!(resolve(&BTreeMap::new()).unwrap().is_empty());
    }

    #[test]
    fn chained_groups_follow_their_dependencies() {
        let defs = groups(&[
            ("groupa", &["bob", "@groupb"]),
            ("groupb", &["joe", "sam"]),
            ("groupc", &["@groupb", "sue"]),
            ("groupd", &["@groupc", "jen"]),
        ]);
        assert_eq!(
            names(&resolve(&defs).unwrap()),
            ["groupb", "groupc", "groupd", "groupa"]
        );
    }

    #[test]
    fn disconnected_groups_order_is_stable() {
        let defs = groups(&[
            ("groupa", &["bob"]),
            ("groupb", &["joe"]),
            ("groupc", &["@groupa"]),
            ("groupd", &["sue"]),
        ]);
        assert_eq!(
            names(&resolve(&defs).unwrap()),
            ["groupd", "groupb", "groupa", "groupc"]
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let defs = groups(&[("a", &["@b"]), ("b", &["@a"])]);
        let err = resolve(&defs).unwrap_err();
        assert!(matches!(err, GitoliteError::GroupDependency { .. }));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let defs = groups(&[("a", &["@a", "bob"])]);
        assert!(resolve(&defs).is_err());
    }

    #[test]
    fn undefined_reference_is_rejected() {
        let defs = groups(&[("a", &["@ghost"])]);
        let err = resolve(&defs).unwrap_err();
        assert!(err.to_string().contains("@ghost"));
    }

    #[test]
    fn long_chains_do_not_exhaust_the_stack() {
        const DEPTH: usize = 50_000;
        let mut defs = BTreeMap::new();
        for i in 0..DEPTH {
            let name = format!("g{i:05}");
            let mut group = Group::new(&name);
            if i > 0 {
                group.add_user(format!("@g{:05}", i - 1));
            }
            defs.insert(name, group);
        }

        let order = names(&resolve(&defs).unwrap());
        assert_eq!(order.len(), DEPTH);
        assert_eq!(order[0], "g00000");
        assert_eq!(order[DEPTH - 1], format!("g{:05}", DEPTH - 1));
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn all_group_needs_no_definition() {
        let defs = groups(&[("everyone", &["@all"])]);
        assert_eq!(names(&resolve(&defs).unwrap()), ["everyone"]);
    }
}
