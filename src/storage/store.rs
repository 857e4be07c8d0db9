//! The persistence boundary for prerequisite trees.
//!
//! Stored rows reference their parent through a self-referencing foreign key,
//! so a tree cannot be written in a single pass: a child's parent must exist
//! before the child can point at it, and durable ids are only known once a
//! row has been inserted. [`persist_tree`] therefore writes every node with a
//! null parent first, then rewrites the parent pointers using the
//! transient-to-durable id map, all inside one transaction.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{CourseCode, NodeId, PrerequisiteNode, PrerequisiteTree};

/// Durable identifier assigned by a store.
pub type StoredId = i64;

/// Connects a course to the root of its stored prerequisite tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoursePrerequisiteLink {
    /// The course that owns the tree.
    #[serde(flatten)]
    pub course: CourseCode,
    /// Stored id of the tree's root node.
    pub root_node_id: StoredId,
}

/// A transactional store of prerequisite node rows.
///
/// Implementations own the durable id space. Nodes are always inserted
/// without a parent; parents are attached afterwards with
/// [`NodeStore::set_parent`].
pub trait NodeStore {
    /// The error type returned by store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction cannot be started.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Commits the current transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be committed.
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Abandons the current transaction, discarding its writes.
    fn rollback(&mut self);

    /// Removes every stored tree and course link.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Removes the course's current tree and link, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be removed.
    fn delete_course_tree(&mut self, course: &CourseCode) -> Result<(), Self::Error>;

    /// Inserts a node row with a null parent and returns its durable id.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be inserted.
    fn insert_node(&mut self, node: &PrerequisiteNode) -> Result<StoredId, Self::Error>;

    /// Points a stored node at its stored parent.
    ///
    /// # Errors
    ///
    /// Returns an error if either row does not exist.
    fn set_parent(&mut self, id: StoredId, parent: StoredId) -> Result<(), Self::Error>;

    /// Records the link between a course and its root node.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be written.
    fn link_course(&mut self, link: CoursePrerequisiteLink) -> Result<(), Self::Error>;
}

/// The durable ids assigned to a persisted tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTree {
    /// Stored id of the root, or `None` for an empty tree.
    pub root: Option<StoredId>,
    /// Transient node id to durable id.
    pub ids: BTreeMap<NodeId, StoredId>,
}

/// A store failure while persisting one course's tree.
///
/// The transaction has been rolled back when this is returned.
#[derive(Debug, thiserror::Error)]
#[error("failed to persist prerequisite tree for {course}")]
pub struct PersistError<E: std::error::Error + 'static> {
    /// The course whose tree was being written.
    pub course: CourseCode,
    /// The underlying store error.
    #[source]
    pub source: E,
}

/// Replaces a course's stored tree with `tree`, atomically.
///
/// The old tree is discarded, every node is inserted with a null parent, the
/// parent pointers are rewritten from the transient→durable id map, and the
/// course is linked to the new root. An empty tree discards the old one and
/// writes nothing else.
///
/// # Errors
///
/// Returns a [`PersistError`] if any store operation fails. Nothing written
/// by this call remains visible in that case.
///
/// # Panics
///
/// Panics if a node references a parent that is not part of `tree`, which
/// [`PrerequisiteTree`] rules out by construction.
#[instrument(level = "debug", skip(store, tree), fields(course = %course, nodes = tree.len()))]
pub fn persist_tree<S: NodeStore>(
    store: &mut S,
    course: &CourseCode,
    tree: &PrerequisiteTree,
) -> Result<PersistedTree, PersistError<S::Error>> {
    let wrap = |source| PersistError {
        course: course.clone(),
        source,
    };

    store.begin().map_err(wrap)?;

    let written = write_tree(store, course, tree).and_then(|persisted| {
        store.commit()?;
        Ok(persisted)
    });

    match written {
        Ok(persisted) => {
            debug!(root = ?persisted.root, "persisted tree");
            Ok(persisted)
        }
        Err(source) => {
            store.rollback();
            Err(wrap(source))
        }
    }
}

fn write_tree<S: NodeStore>(
    store: &mut S,
    course: &CourseCode,
    tree: &PrerequisiteTree,
) -> Result<PersistedTree, S::Error> {
    store.delete_course_tree(course)?;

    // Pass one: every row goes in parentless.
    let mut ids = BTreeMap::new();
    for node in tree.iter() {
        let stored = store.insert_node(node)?;
        ids.insert(node.id(), stored);
    }

    // Pass two: relink.
    for node in tree.iter() {
        let Some(parent) = node.parent_id() else {
            continue;
        };
        let stored = ids[&node.id()];
        let stored_parent = *ids
            .get(&parent)
            .unwrap_or_else(|| panic!("Parent node {parent} of {} not in tree", node.id()));
        store.set_parent(stored, stored_parent)?;
    }

    let root = tree.root().map(|root| ids[&root.id()]);
    if let Some(root_node_id) = root {
        store.link_course(CoursePrerequisiteLink {
            course: course.clone(),
            root_node_id,
        })?;
    }

    Ok(PersistedTree { root, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Relation, RequirementEntry},
        storage::memory::{InMemoryStore, MemoryStoreError},
    };

    fn entry(code: &str) -> RequirementEntry {
        RequirementEntry {
            course: code.parse().unwrap(),
            inner_relation: Relation::Or,
            min_grade: None,
            is_antireq: false,
            is_coreq: false,
        }
    }

    fn multi_department_tree() -> PrerequisiteTree {
        PrerequisiteTree::build(&[
            entry("MATH 118"),
            entry("MATH 119"),
            entry("STAT 220"),
            entry("STAT 230"),
        ])
    }

    /// Wraps the in-memory store and fails the n-th `set_parent` call.
    struct FailingStore {
        inner: InMemoryStore,
        fail_on_set_parent: usize,
        calls: usize,
    }

    impl NodeStore for FailingStore {
        type Error = MemoryStoreError;

        fn begin(&mut self) -> Result<(), Self::Error> {
            self.inner.begin()
        }

        fn commit(&mut self) -> Result<(), Self::Error> {
            self.inner.commit()
        }

        fn rollback(&mut self) {
            self.inner.rollback();
        }

        fn clear(&mut self) -> Result<(), Self::Error> {
            self.inner.clear()
        }

        fn delete_course_tree(&mut self, course: &CourseCode) -> Result<(), Self::Error> {
            self.inner.delete_course_tree(course)
        }

        fn insert_node(&mut self, node: &PrerequisiteNode) -> Result<StoredId, Self::Error> {
            self.inner.insert_node(node)
        }

        fn set_parent(&mut self, id: StoredId, parent: StoredId) -> Result<(), Self::Error> {
            self.calls += 1;
            if self.calls == self.fail_on_set_parent {
                return Err(MemoryStoreError::MissingNode(parent));
            }
            self.inner.set_parent(id, parent)
        }

        fn link_course(&mut self, link: CoursePrerequisiteLink) -> Result<(), Self::Error> {
            self.inner.link_course(link)
        }
    }

    #[test]
    fn parents_are_relinked_to_durable_ids() {
        let mut store = InMemoryStore::default();
        let course: CourseCode = "STAT 330".parse().unwrap();
        let tree = multi_department_tree();

        let persisted = persist_tree(&mut store, &course, &tree).unwrap();

        assert_eq!(persisted.ids.len(), 7);
        let root = persisted.root.unwrap();
        assert_eq!(store.link(&course).unwrap().root_node_id, root);

        for node in tree.iter() {
            let row = store.node(persisted.ids[&node.id()]).unwrap();
            assert_eq!(
                row.parent_id,
                node.parent_id().map(|parent| persisted.ids[&parent])
            );
            assert_eq!(row.relation_type, node.relation_type());
            assert_eq!(row.department.as_ref(), node.department());
        }
    }

    #[test]
    fn single_leaf_tree_links_leaf_as_root() {
        let mut store = InMemoryStore::default();
        let course: CourseCode = "MATH 119".parse().unwrap();
        let tree = PrerequisiteTree::build(&[entry("MATH 118")]);

        let persisted = persist_tree(&mut store, &course, &tree).unwrap();

        let row = store.node(persisted.root.unwrap()).unwrap();
        assert_eq!(row.parent_id, None);
        assert_eq!(row.relation_type, None);
        assert_eq!(row.course_number.as_ref().map(|n| n.as_str()), Some("118"));
    }

    #[test]
    fn reimport_replaces_old_tree() {
        let mut store = InMemoryStore::default();
        let course: CourseCode = "STAT 330".parse().unwrap();

        persist_tree(&mut store, &course, &multi_department_tree()).unwrap();
        persist_tree(
            &mut store,
            &course,
            &PrerequisiteTree::build(&[entry("STAT 230")]),
        )
        .unwrap();

        assert_eq!(store.nodes().count(), 1);
        assert_eq!(store.tree_rows(&course).len(), 1);
    }

    #[test]
    fn empty_tree_discards_old_tree() {
        let mut store = InMemoryStore::default();
        let course: CourseCode = "STAT 330".parse().unwrap();

        persist_tree(&mut store, &course, &multi_department_tree()).unwrap();
        let persisted = persist_tree(&mut store, &course, &PrerequisiteTree::default()).unwrap();

        assert_eq!(persisted.root, None);
        assert!(store.link(&course).is_none());
        assert_eq!(store.nodes().count(), 0);
    }

    #[test]
    fn failure_rolls_back_partial_tree() {
        let mut store = FailingStore {
            inner: InMemoryStore::default(),
            fail_on_set_parent: 3,
            calls: 0,
        };
        let keep: CourseCode = "CS 136".parse().unwrap();
        let course: CourseCode = "STAT 330".parse().unwrap();

        persist_tree(
            &mut store,
            &keep,
            &PrerequisiteTree::build(&[entry("CS 135")]),
        )
        .unwrap();

        let error = persist_tree(&mut store, &course, &multi_department_tree()).unwrap_err();

        assert_eq!(error.course, course);
        assert!(store.inner.link(&course).is_none());
        assert_eq!(store.inner.nodes().count(), 1);
        assert!(store.inner.link(&keep).is_some());
    }
}
