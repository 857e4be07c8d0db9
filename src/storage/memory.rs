//! An in-memory node store with snapshot transactions.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
    domain::{CourseCode, CourseNumber, Department, PrerequisiteNode, Relation},
    storage::store::{CoursePrerequisiteLink, NodeStore, StoredId},
};

/// A stored prerequisite node.
///
/// Mirrors the `prerequisite_nodes` table: logic rows carry a relation, leaf
/// rows carry a course and optional grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRow {
    /// Durable id.
    pub id: StoredId,
    /// Durable id of the parent row, or `None` for a root.
    pub parent_id: Option<StoredId>,
    /// `AND`/`OR` for logic rows.
    pub relation_type: Option<Relation>,
    /// Department for leaf rows.
    pub department: Option<Department>,
    /// Course number for leaf rows.
    pub course_number: Option<CourseNumber>,
    /// Minimum grade for leaf rows.
    pub min_grade: Option<u8>,
}

/// Errors raised by [`InMemoryStore`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// A referenced row does not exist.
    #[error("node {0} does not exist")]
    MissingNode(StoredId),

    /// A row was pointed at itself.
    #[error("node {0} cannot be its own parent")]
    SelfParent(StoredId),

    /// `begin` was called inside a transaction.
    #[error("a transaction is already in progress")]
    TransactionActive,

    /// `commit` was called outside a transaction.
    #[error("no transaction in progress")]
    NoTransaction,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    nodes: BTreeMap<StoredId, NodeRow>,
    links: BTreeMap<CourseCode, CoursePrerequisiteLink>,
    next_id: StoredId,
}

/// A [`NodeStore`] held in memory.
///
/// Transactions snapshot the tables on `begin` and restore the snapshot on
/// `rollback`. Parent references are checked like a foreign key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
}

/// A serializable view of an [`InMemoryStore`].
#[derive(Debug, Serialize)]
pub struct StoreExport<'a> {
    /// Every stored node row, ordered by id.
    pub nodes: Vec<&'a NodeRow>,
    /// Every course link, ordered by course.
    pub links: Vec<&'a CoursePrerequisiteLink>,
}

impl InMemoryStore {
    /// Iterate over every stored row, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRow> {
        self.tables.nodes.values()
    }

    /// Returns the row with the given id.
    #[must_use]
    pub fn node(&self, id: StoredId) -> Option<&NodeRow> {
        self.tables.nodes.get(&id)
    }

    /// Returns the link for a course, if its tree is stored.
    #[must_use]
    pub fn link(&self, course: &CourseCode) -> Option<&CoursePrerequisiteLink> {
        self.tables.links.get(course)
    }

    /// Iterate over every course link.
    pub fn links(&self) -> impl Iterator<Item = &CoursePrerequisiteLink> {
        self.tables.links.values()
    }

    /// Returns the rows of a course's stored tree, ordered by id.
    #[must_use]
    pub fn tree_rows(&self, course: &CourseCode) -> Vec<&NodeRow> {
        self.link(course).map_or_else(Vec::new, |link| {
            self.subtree(link.root_node_id)
                .into_iter()
                .filter_map(|id| self.tables.nodes.get(&id))
                .collect()
        })
    }

    /// A serializable view of the whole store.
    #[must_use]
    pub fn export(&self) -> StoreExport<'_> {
        StoreExport {
            nodes: self.nodes().collect(),
            links: self.links().collect(),
        }
    }

    fn subtree(&self, root: StoredId) -> BTreeSet<StoredId> {
        let mut ids = BTreeSet::from([root]);
        loop {
            let before = ids.len();
            let children: Vec<_> = self
                .tables
                .nodes
                .values()
                .filter(|row| row.parent_id.is_some_and(|parent| ids.contains(&parent)))
                .map(|row| row.id)
                .collect();
            ids.extend(children);
            if ids.len() == before {
                return ids;
            }
        }
    }
}

impl NodeStore for InMemoryStore {
    type Error = MemoryStoreError;

    fn begin(&mut self) -> Result<(), Self::Error> {
        if self.snapshot.is_some() {
            return Err(MemoryStoreError::TransactionActive);
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        if self.snapshot.take().is_none() {
            return Err(MemoryStoreError::NoTransaction);
        }
        Ok(())
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.tables = snapshot;
        }
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.tables.nodes.clear();
        self.tables.links.clear();
        Ok(())
    }

    fn delete_course_tree(&mut self, course: &CourseCode) -> Result<(), Self::Error> {
        let Some(link) = self.tables.links.remove(course) else {
            return Ok(());
        };
        for id in self.subtree(link.root_node_id) {
            self.tables.nodes.remove(&id);
        }
        Ok(())
    }

    fn insert_node(&mut self, node: &PrerequisiteNode) -> Result<StoredId, Self::Error> {
        self.tables.next_id += 1;
        let id = self.tables.next_id;
        self.tables.nodes.insert(
            id,
            NodeRow {
                id,
                parent_id: None,
                relation_type: node.relation_type(),
                department: node.department().cloned(),
                course_number: node.course_number().cloned(),
                min_grade: node.min_grade(),
            },
        );
        Ok(id)
    }

    fn set_parent(&mut self, id: StoredId, parent: StoredId) -> Result<(), Self::Error> {
        if id == parent {
            return Err(MemoryStoreError::SelfParent(id));
        }
        if !self.tables.nodes.contains_key(&parent) {
            return Err(MemoryStoreError::MissingNode(parent));
        }
        let row = self
            .tables
            .nodes
            .get_mut(&id)
            .ok_or(MemoryStoreError::MissingNode(id))?;
        row.parent_id = Some(parent);
        Ok(())
    }

    fn link_course(&mut self, link: CoursePrerequisiteLink) -> Result<(), Self::Error> {
        if !self.tables.nodes.contains_key(&link.root_node_id) {
            return Err(MemoryStoreError::MissingNode(link.root_node_id));
        }
        self.tables.links.insert(link.course.clone(), link);
        Ok(())
    }
}
