//! Parent-pointer prerequisite trees.
//!
//! A [`PrerequisiteTree`] is a flat arena of nodes addressed by transient
//! [`NodeId`]s. It knows nothing about storage: durable identifiers are only
//! assigned when the tree crosses the persistence boundary (see
//! [`crate::storage::persist_tree`]).

use std::{fmt, num::NonZeroUsize};

use serde::{Serialize, Serializer, ser::SerializeStruct};
use tracing::{debug, instrument};

use crate::domain::{
    course::{CourseCode, CourseNumber, Department},
    requirement::{Relation, RequirementEntry},
};

/// Transient identifier of a node within one [`PrerequisiteTree`].
///
/// Identifiers start at 1 and are assigned sequentially in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(NonZeroUsize);

impl NodeId {
    /// Returns the numeric identifier.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    const fn index(self) -> usize {
        self.0.get() - 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node represents.
///
/// A node is either a boolean combinator or a concrete course, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An AND/OR combinator over the node's children.
    Logic(Relation),
    /// A concrete course reference.
    Leaf {
        /// The referenced course.
        course: CourseCode,
        /// Minimum grade required, if any.
        min_grade: Option<u8>,
    },
}

/// A single node in a prerequisite tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteNode {
    id: NodeId,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl PrerequisiteNode {
    /// The node's transient identifier.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The parent node, or `None` for the root.
    #[must_use]
    pub const fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    /// What the node represents.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The combinator of a logic node; `None` for leaves.
    #[must_use]
    pub const fn relation_type(&self) -> Option<Relation> {
        match self.kind {
            NodeKind::Logic(relation) => Some(relation),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// The course of a leaf node; `None` for logic nodes.
    #[must_use]
    pub const fn course(&self) -> Option<&CourseCode> {
        match &self.kind {
            NodeKind::Leaf { course, .. } => Some(course),
            NodeKind::Logic(_) => None,
        }
    }

    /// The department of a leaf node.
    #[must_use]
    pub fn department(&self) -> Option<&Department> {
        self.course().map(CourseCode::department)
    }

    /// The course number of a leaf node.
    #[must_use]
    pub fn course_number(&self) -> Option<&CourseNumber> {
        self.course().map(CourseCode::number)
    }

    /// The minimum grade of a leaf node.
    #[must_use]
    pub const fn min_grade(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Leaf { min_grade, .. } => min_grade,
            NodeKind::Logic(_) => None,
        }
    }

    /// Whether this node is a boolean combinator.
    #[must_use]
    pub const fn is_logic(&self) -> bool {
        matches!(self.kind, NodeKind::Logic(_))
    }
}

impl Serialize for PrerequisiteNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("PrerequisiteNode", 6)?;
        node.serialize_field("id", &self.id)?;
        node.serialize_field("parentId", &self.parent)?;
        node.serialize_field("relationType", &self.relation_type())?;
        node.serialize_field("department", &self.department())?;
        node.serialize_field("courseNumber", &self.course_number())?;
        node.serialize_field("minGrade", &self.min_grade())?;
        node.end()
    }
}

/// A rooted parent-pointer tree of prerequisite nodes.
///
/// Nodes are only ever appended, and a node's parent must already exist, so
/// the structure cannot contain cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PrerequisiteTree {
    nodes: Vec<PrerequisiteNode>,
}

impl PrerequisiteTree {
    /// Builds a tree from the flat entries of a requirement group.
    ///
    /// - no entries: an empty tree
    /// - one entry: a single leaf, which is the root
    /// - several entries in one department: a logic root (AND when every entry
    ///   is AND, otherwise OR) with the entries as leaves
    /// - several departments: an AND root with one OR node per department (in
    ///   first-seen order), each holding that department's leaves
    ///
    /// The per-department grouping is a heuristic. It cannot express shapes
    /// such as "(A and B) or C".
    #[must_use]
    #[instrument(level = "debug", skip(entries), fields(entries = entries.len()))]
    pub fn build(entries: &[RequirementEntry]) -> Self {
        let mut tree = Self::default();

        match entries {
            [] => {}
            [entry] => {
                tree.push_leaf(None, entry);
            }
            [first, rest @ ..]
                if rest.iter().all(|e| e.department() == first.department()) =>
            {
                let relation = if entries.iter().all(|e| e.inner_relation == Relation::And) {
                    Relation::And
                } else {
                    Relation::Or
                };
                let root = tree.push(None, NodeKind::Logic(relation));
                for entry in entries {
                    tree.push_leaf(Some(root), entry);
                }
            }
            _ => {
                let root = tree.push(None, NodeKind::Logic(Relation::And));
                for (department, group) in group_by_department(entries) {
                    debug!(%department, courses = group.len(), "grouping department under OR");
                    let or_node = tree.push(Some(root), NodeKind::Logic(Relation::Or));
                    for entry in group {
                        tree.push_leaf(Some(or_node), entry);
                    }
                }
            }
        }

        tree
    }

    /// Appends a node and returns its identifier.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist in this tree, if it is a leaf, or if
    /// a second root is added.
    pub fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        match parent {
            Some(parent_id) => {
                let parent_node = self
                    .node(parent_id)
                    .unwrap_or_else(|| panic!("Parent node {parent_id} not found in tree"));
                assert!(
                    parent_node.is_logic(),
                    "Parent node {parent_id} is a leaf and cannot have children"
                );
            }
            None => assert!(self.nodes.is_empty(), "Tree already has a root"),
        }

        let id = NodeId(
            NonZeroUsize::new(self.nodes.len() + 1).expect("length plus one is never zero"),
        );
        self.nodes.push(PrerequisiteNode { id, parent, kind });
        id
    }

    fn push_leaf(&mut self, parent: Option<NodeId>, entry: &RequirementEntry) -> NodeId {
        self.push(
            parent,
            NodeKind::Leaf {
                course: entry.course.clone(),
                min_grade: entry.min_grade,
            },
        )
    }

    /// Looks up a node by its transient identifier.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PrerequisiteNode> {
        self.nodes.get(id.index())
    }

    /// The root node, or `None` for an empty tree.
    #[must_use]
    pub fn root(&self) -> Option<&PrerequisiteNode> {
        self.nodes.first()
    }

    /// Direct children of a node, in creation order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &PrerequisiteNode> + '_ {
        self.nodes
            .iter()
            .filter(move |node| node.parent == Some(id))
    }

    /// All nodes in creation order. Parents always precede their children.
    pub fn iter(&self) -> impl Iterator<Item = &PrerequisiteNode> + '_ {
        self.nodes.iter()
    }

    /// All leaf courses in creation order.
    pub fn courses(&self) -> impl Iterator<Item = &CourseCode> + '_ {
        self.nodes.iter().filter_map(PrerequisiteNode::course)
    }

    /// Nodes in depth-first pre-order, paired with their depth.
    #[must_use]
    pub fn depth_first(&self) -> Vec<(usize, &PrerequisiteNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &PrerequisiteNode)> =
            self.root().map(|root| (0, root)).into_iter().collect();

        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            let children: Vec<_> = self.children(node.id).collect();
            stack.extend(children.into_iter().rev().map(|child| (depth + 1, child)));
        }

        out
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Groups entries by department, preserving first-seen department order.
fn group_by_department(entries: &[RequirementEntry]) -> Vec<(&Department, Vec<&RequirementEntry>)> {
    let mut groups: Vec<(&Department, Vec<&RequirementEntry>)> = Vec::new();
    for entry in entries {
        if let Some(pos) = groups
            .iter()
            .position(|(dept, _)| *dept == entry.department())
        {
            groups[pos].1.push(entry);
        } else {
            groups.push((entry.department(), vec![entry]));
        }
    }
    groups
}
