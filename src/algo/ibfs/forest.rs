use alloc::collections::{BinaryHeap, VecDeque};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::id::{ArcId, VertexId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tree {
    Free,
    Source,
    Sink,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Node {
    pub tree: Tree,
    /// Arc from the parent to the vertex in the source tree, from the vertex to the parent in
    /// the sink tree.
    pub parent: Option<ArcId>,
    pub dist: usize,
    pub active: bool,
    /// First arc the next scan looks at. Arcs before it were seen since the vertex joined its
    /// tree, and any of them that becomes useful again is handed to the sweep explicitly.
    pub cursor: Option<ArcId>,
}

impl Node {
    const FREE: Self = Self {
        tree: Tree::Free,
        parent: None,
        dist: 0,
        active: false,
        cursor: None,
    };
}

/// The two search trees of the engine, their frontiers and the pending orphans.
#[derive(Clone, Debug)]
pub(crate) struct Forest {
    nodes: Vec<Node>,
    source: VertexId,
    sink: VertexId,
    source_frontier: VecDeque<VertexId>,
    sink_frontier: VecDeque<VertexId>,
    orphans: BinaryHeap<Reverse<(usize, VertexId)>>,
}

impl Forest {
    pub fn new(vertex_count: usize, source: VertexId, sink: VertexId) -> Self {
        let mut forest = Self {
            nodes: vec![Node::FREE; vertex_count],
            source,
            sink,
            source_frontier: VecDeque::new(),
            sink_frontier: VecDeque::new(),
            orphans: BinaryHeap::new(),
        };
        forest.nodes[source].tree = Tree::Source;
        forest.nodes[sink].tree = Tree::Sink;
        forest.activate(source);
        forest.activate(sink);
        forest
    }

    pub fn node(&self, v: VertexId) -> &Node {
        &self.nodes[v]
    }

    pub fn tree(&self, v: VertexId) -> Tree {
        self.nodes[v].tree
    }

    pub fn parent(&self, v: VertexId) -> Option<ArcId> {
        self.nodes[v].parent
    }

    pub fn is_root(&self, v: VertexId) -> bool {
        v == self.source || v == self.sink
    }

    /// Connected to its root, assuming every orphan of smaller distance has been handled.
    pub fn is_rooted(&self, v: VertexId) -> bool {
        self.nodes[v].parent.is_some() || self.is_root(v)
    }

    /// Hangs `v` below `parent`. A vertex joining a tree starts scanning from scratch, one
    /// re-adopted within its tree keeps its cursor.
    pub fn attach(&mut self, v: VertexId, tree: Tree, parent: ArcId, dist: usize) {
        let node = &mut self.nodes[v];
        if node.tree != tree {
            node.cursor = None;
        }
        node.tree = tree;
        node.parent = Some(parent);
        node.dist = dist;
    }

    pub fn set_cursor(&mut self, v: VertexId, arc: ArcId) {
        self.nodes[v].cursor = Some(arc);
    }

    /// Puts `v` on its tree's frontier unless it is already there.
    pub fn activate(&mut self, v: VertexId) {
        let node = &mut self.nodes[v];
        if node.active {
            return;
        }
        let frontier = match node.tree {
            Tree::Source => &mut self.source_frontier,
            Tree::Sink => &mut self.sink_frontier,
            Tree::Free => return,
        };
        node.active = true;
        frontier.push_back(v);
    }

    fn front(&mut self, tree: Tree) -> Option<(usize, VertexId)> {
        let frontier = match tree {
            Tree::Source => &mut self.source_frontier,
            Tree::Sink => &mut self.sink_frontier,
            Tree::Free => return None,
        };
        while let Some(&v) = frontier.front() {
            let node = &self.nodes[v];
            if node.active && node.tree == tree {
                return Some((node.dist, v));
            }
            frontier.pop_front();
        }
        None
    }

    /// Takes the next vertex to scan from the shallower frontier, preferring the source tree.
    pub fn next_active(&mut self) -> Option<(Tree, VertexId)> {
        let tree = match (self.front(Tree::Source), self.front(Tree::Sink)) {
            (None, None) => return None,
            (Some(_), None) => Tree::Source,
            (None, Some(_)) => Tree::Sink,
            (Some((source_dist, _)), Some((sink_dist, _))) if source_dist <= sink_dist => {
                Tree::Source
            }
            _ => Tree::Sink,
        };
        let v = match tree {
            Tree::Source => self.source_frontier.pop_front(),
            _ => self.sink_frontier.pop_front(),
        }?;
        self.nodes[v].active = false;
        Some((tree, v))
    }

    pub fn orphan(&mut self, v: VertexId) {
        let node = &mut self.nodes[v];
        if node.parent.take().is_some() {
            self.orphans.push(Reverse((node.dist, v)));
        }
    }

    /// The pending orphan closest to its root.
    pub fn next_orphan(&mut self) -> Option<VertexId> {
        self.orphans.pop().map(|Reverse((_, v))| v)
    }

    pub fn release(&mut self, v: VertexId) {
        self.nodes[v] = Node::FREE;
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Node)> + '_ {
        self.nodes.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallower_frontier_goes_first() {
        let mut forest = Forest::new(4, 0, 3);
        assert_eq!(forest.next_active(), Some((Tree::Source, 0)));
        forest.attach(1, Tree::Source, 0, 1);
        forest.activate(1);
        assert_eq!(forest.next_active(), Some((Tree::Sink, 3)));
        assert_eq!(forest.next_active(), Some((Tree::Source, 1)));
        assert_eq!(forest.next_active(), None);
    }

    #[test]
    fn released_vertices_leave_the_frontier() {
        let mut forest = Forest::new(4, 0, 3);
        forest.next_active();
        forest.next_active();
        forest.attach(2, Tree::Sink, 5, 1);
        forest.activate(2);
        forest.orphan(2);
        assert_eq!(forest.next_orphan(), Some(2));
        forest.release(2);
        assert_eq!(forest.tree(2), Tree::Free);
        assert_eq!(forest.next_active(), None);
        // orphaning a parentless vertex is a no-op
        forest.orphan(0);
        assert_eq!(forest.next_orphan(), None);
    }

    #[test]
    fn cursor_survives_adoption_but_not_a_tree_change() {
        let mut forest = Forest::new(4, 0, 3);
        forest.attach(1, Tree::Source, 0, 1);
        forest.set_cursor(1, 7);
        forest.orphan(1);
        forest.attach(1, Tree::Source, 2, 2);
        assert_eq!(forest.node(1).cursor, Some(7));

        forest.release(1);
        assert_eq!(forest.node(1).cursor, None);
        forest.attach(1, Tree::Source, 0, 1);
        forest.set_cursor(1, 7);
        forest.release(1);
        forest.attach(1, Tree::Sink, 5, 1);
        assert_eq!(forest.node(1).cursor, None);
    }
}
