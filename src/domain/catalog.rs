//! In-memory prerequisite queries across a whole catalog.
//!
//! The [`Catalog`] holds one [`PrerequisiteTree`] per course and a course
//! dependency graph derived from the trees' leaves. It answers the same
//! questions the relational store answers with recursive queries: whether a
//! course is satisfied, its transitive prerequisites, and what it unlocks.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::{
    Direction,
    algo::tarjan_scc,
    graphmap::DiGraphMap,
    visit::{Dfs, Walker},
};
use tracing::instrument;

use crate::domain::{
    course::CourseCode,
    requirement::Relation,
    tree::{NodeId, NodeKind, PrerequisiteTree},
};

/// Completed courses mapped to the percentage grade achieved.
pub type Transcript = BTreeMap<CourseCode, u8>;

/// Prerequisite trees for a set of courses, with a dependency graph over
/// them.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Prerequisite tree per course.
    trees: HashMap<CourseCode, PrerequisiteTree>,

    /// Interned course codes; graph nodes are indices into this vector.
    courses: Vec<CourseCode>,

    /// Reverse lookup from course code to graph node.
    index: HashMap<CourseCode, usize>,

    /// Edges point from a course to each course its tree references.
    graph: DiGraphMap<usize, ()>,
}

impl Catalog {
    /// Inserts (or replaces) the prerequisite tree for a course.
    pub fn insert(&mut self, course: CourseCode, tree: PrerequisiteTree) {
        let node = self.intern(&course);

        // Replacing a tree drops the old dependency edges.
        let stale: Vec<usize> = self.graph.neighbors(node).collect();
        for target in stale {
            self.graph.remove_edge(node, target);
        }

        let referenced: Vec<CourseCode> = tree.courses().cloned().collect();
        for prerequisite in &referenced {
            let target = self.intern(prerequisite);
            self.graph.add_edge(node, target, ());
        }

        self.trees.insert(course, tree);
    }

    /// The prerequisite tree of a course, if one was inserted.
    #[must_use]
    pub fn tree(&self, course: &CourseCode) -> Option<&PrerequisiteTree> {
        self.trees.get(course)
    }

    /// Number of courses with an inserted tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether no trees have been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Whether the completed courses satisfy a course's prerequisite tree.
    ///
    /// Courses without a tree (or with an empty one) are always satisfied. A
    /// leaf is satisfied when its course appears in the transcript with at
    /// least the leaf's minimum grade.
    #[must_use]
    pub fn is_satisfied(&self, course: &CourseCode, completed: &Transcript) -> bool {
        let Some(tree) = self.trees.get(course) else {
            return true;
        };
        tree.root()
            .is_none_or(|root| evaluate(tree, root.id(), completed))
    }

    /// Every course reachable through prerequisite links, excluding the
    /// course itself.
    #[must_use]
    #[instrument(level = "debug", skip(self), fields(course = %course))]
    pub fn transitive_prerequisites(&self, course: &CourseCode) -> BTreeSet<CourseCode> {
        let Some(&start) = self.index.get(course) else {
            return BTreeSet::new();
        };

        Dfs::new(&self.graph, start)
            .iter(&self.graph)
            .filter(|&node| node != start)
            .map(|node| self.courses[node].clone())
            .collect()
    }

    /// Courses whose prerequisite tree directly references `course`.
    #[must_use]
    pub fn unlocks(&self, course: &CourseCode) -> BTreeSet<CourseCode> {
        let Some(&node) = self.index.get(course) else {
            return BTreeSet::new();
        };

        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|dependent| self.courses[dependent].clone())
            .collect()
    }

    /// Courses unlocked by something on the transcript that are not yet
    /// completed and whose trees the transcript now satisfies.
    #[must_use]
    pub fn newly_available(&self, completed: &Transcript) -> BTreeSet<CourseCode> {
        completed
            .keys()
            .flat_map(|course| self.unlocks(course))
            .filter(|course| !completed.contains_key(course))
            .filter(|course| self.is_satisfied(course, completed))
            .collect()
    }

    /// Return all prerequisite cycles as sorted sets of course codes.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<CourseCode>> {
        let mut cycles = Vec::new();

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                let mut codes: Vec<_> = component
                    .iter()
                    .map(|&node| self.courses[node].clone())
                    .collect();
                codes.sort();
                cycles.push(codes);
                continue;
            }

            let Some(&node) = component.first() else {
                continue;
            };

            if self.graph.contains_edge(node, node) {
                cycles.push(vec![self.courses[node].clone()]);
            }
        }

        cycles.sort();
        cycles
    }

    fn intern(&mut self, course: &CourseCode) -> usize {
        if let Some(&node) = self.index.get(course) {
            return node;
        }
        let node = self.courses.len();
        self.courses.push(course.clone());
        self.index.insert(course.clone(), node);
        self.graph.add_node(node);
        node
    }
}

fn evaluate(tree: &PrerequisiteTree, id: NodeId, completed: &Transcript) -> bool {
    let Some(node) = tree.node(id) else {
        return false;
    };

    match node.kind() {
        NodeKind::Logic(Relation::And) => tree
            .children(id)
            .all(|child| evaluate(tree, child.id(), completed)),
        NodeKind::Logic(Relation::Or) => tree
            .children(id)
            .any(|child| evaluate(tree, child.id(), completed)),
        NodeKind::Leaf { course, min_grade } => completed
            .get(course)
            .is_some_and(|grade| *grade >= min_grade.unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_requirements_description;

    fn code(s: &str) -> CourseCode {
        s.parse().unwrap()
    }

    fn tree_for(description: &str) -> PrerequisiteTree {
        PrerequisiteTree::build(parse_requirements_description(Some(description)).tree_entries())
    }

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.insert(code("CS 136"), tree_for("Prereq: CS 135"));
        catalog.insert(code("CS 240"), tree_for("Prereq: CS 136 and MATH 239"));
        catalog.insert(code("CS 341"), tree_for("Prereq: CS 240"));
        catalog
    }

    #[test]
    fn course_without_tree_is_satisfied() {
        let catalog = sample_catalog();
        assert!(catalog.is_satisfied(&code("CS 135"), &Transcript::new()));
    }

    #[test]
    fn leaf_requires_completed_course() {
        let catalog = sample_catalog();
        let mut transcript = Transcript::new();
        assert!(!catalog.is_satisfied(&code("CS 136"), &transcript));
        transcript.insert(code("CS 135"), 60);
        assert!(catalog.is_satisfied(&code("CS 136"), &transcript));
    }

    #[test]
    fn min_grade_is_enforced() {
        let mut catalog = Catalog::default();
        catalog.insert(
            code("STAT 330"),
            tree_for("Prereq: STAT 230 with a grade of at least 70%"),
        );

        let mut transcript = Transcript::new();
        transcript.insert(code("STAT 230"), 65);
        assert!(!catalog.is_satisfied(&code("STAT 330"), &transcript));
        transcript.insert(code("STAT 230"), 75);
        assert!(catalog.is_satisfied(&code("STAT 330"), &transcript));
    }

    #[test]
    fn cross_department_tree_needs_one_per_department() {
        let catalog = sample_catalog();
        let mut transcript = Transcript::new();
        transcript.insert(code("CS 136"), 80);
        assert!(!catalog.is_satisfied(&code("CS 240"), &transcript));
        transcript.insert(code("MATH 239"), 80);
        assert!(catalog.is_satisfied(&code("CS 240"), &transcript));
    }

    #[test]
    fn transitive_prerequisites_follow_chains() {
        let catalog = sample_catalog();
        let prerequisites = catalog.transitive_prerequisites(&code("CS 341"));
        let expected: BTreeSet<_> = ["CS 240", "CS 136", "CS 135", "MATH 239"]
            .into_iter()
            .map(code)
            .collect();
        assert_eq!(prerequisites, expected);
    }

    #[test]
    fn unlocks_lists_direct_dependents() {
        let catalog = sample_catalog();
        let unlocked = catalog.unlocks(&code("CS 136"));
        assert_eq!(unlocked.into_iter().collect::<Vec<_>>(), vec![code("CS 240")]);
        assert!(catalog.unlocks(&code("PHYS 121")).is_empty());
    }

    #[test]
    fn newly_available_excludes_completed_and_unsatisfied() {
        let catalog = sample_catalog();
        let mut transcript = Transcript::new();
        transcript.insert(code("CS 135"), 90);
        transcript.insert(code("CS 136"), 90);

        // CS 240 still needs MATH 239.
        assert!(catalog.newly_available(&transcript).is_empty());

        transcript.insert(code("MATH 239"), 90);
        let available = catalog.newly_available(&transcript);
        assert_eq!(available.into_iter().collect::<Vec<_>>(), vec![code("CS 240")]);
    }

    #[test]
    fn replacing_a_tree_drops_old_edges() {
        let mut catalog = sample_catalog();
        catalog.insert(code("CS 240"), tree_for("Prereq: CS 136"));
        assert!(catalog.unlocks(&code("MATH 239")).is_empty());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn detects_cycles() {
        let mut catalog = Catalog::default();
        catalog.insert(code("CS 100"), tree_for("Prereq: CS 200"));
        catalog.insert(code("CS 200"), tree_for("Prereq: CS 100"));
        catalog.insert(code("CS 300"), tree_for("Prereq: CS 300"));

        assert_eq!(
            catalog.cycles(),
            vec![vec![code("CS 100"), code("CS 200")], vec![code("CS 300")]]
        );
    }
}
