use alloc::vec::Vec;

use crate::amount::{Amount, LinearAmount};
use crate::error::{Error, InvariantViolation};
use crate::id::{ArcId, VertexId};
use crate::residual::Push;

use super::forest::Tree;
use super::Sweep;

impl<'a> Sweep<'a> {
    /// Grows both trees until no pending arc and no frontier vertex is left, augmenting
    /// whenever they touch.
    pub(super) fn grow(&mut self) -> Result<(), Error> {
        loop {
            if let Some(arc) = self.pending.pop() {
                self.link(arc)?;
                continue;
            }
            let Some((tree, v)) = self.forest.next_active() else {
                return Ok(());
            };
            self.stats.scans += 1;
            let bridge = match tree {
                Tree::Source => self.scan_source(v),
                _ => self.scan_sink(v),
            };
            if let Some(bridge) = bridge {
                self.augment(bridge)?;
                self.adopt()?;
                // resume at the bridge, the vertex may have more arcs into the other tree
                self.forest.activate(v);
            }
        }
    }

    /// Follows a single arc that may have become useful to either tree.
    fn link(&mut self, arc: ArcId) -> Result<(), Error> {
        if !self.residual.is_open(arc) {
            return Ok(());
        }
        let (tail, head) = (self.network.tail(arc), self.network.head(arc));
        match (self.forest.tree(tail), self.forest.tree(head)) {
            (Tree::Source, Tree::Free) => {
                let dist = self.forest.node(tail).dist + 1;
                self.join(head, Tree::Source, arc, dist);
            }
            (Tree::Free, Tree::Sink) => {
                let dist = self.forest.node(head).dist + 1;
                self.join(tail, Tree::Sink, arc, dist);
            }
            (Tree::Source, Tree::Sink) => {
                self.augment(arc)?;
                self.adopt()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn join(&mut self, v: VertexId, tree: Tree, parent: ArcId, dist: usize) {
        self.forest.attach(v, tree, parent, dist);
        self.forest.activate(v);
        if tree == Tree::Sink && self.breakpoints[v].is_some() {
            self.entered_sink.push(v);
        }
    }

    fn scan_source(&mut self, v: VertexId) -> Option<ArcId> {
        let dist = self.forest.node(v).dist + 1;
        let arcs = self.network.out_arcs(v);
        let start = self.forest.node(v).cursor.unwrap_or(arcs.start);
        for arc in start..arcs.end {
            if !self.residual.is_open(arc) {
                continue;
            }
            let head = self.network.head(arc);
            match self.forest.tree(head) {
                Tree::Free => self.join(head, Tree::Source, arc, dist),
                Tree::Sink => {
                    self.forest.set_cursor(v, arc);
                    return Some(arc);
                }
                Tree::Source => {}
            }
        }
        self.forest.set_cursor(v, arcs.end);
        None
    }

    fn scan_sink(&mut self, v: VertexId) -> Option<ArcId> {
        let dist = self.forest.node(v).dist + 1;
        let arcs = self.network.out_arcs(v);
        let start = self.forest.node(v).cursor.unwrap_or(arcs.start);
        for arc in start..arcs.end {
            let inbound = self.network.reverse(arc);
            if !self.residual.is_open(inbound) {
                continue;
            }
            let tail = self.network.head(arc);
            match self.forest.tree(tail) {
                Tree::Free => self.join(tail, Tree::Sink, inbound, dist),
                Tree::Source => {
                    self.forest.set_cursor(v, arc);
                    return Some(inbound);
                }
                Tree::Sink => {}
            }
        }
        self.forest.set_cursor(v, arcs.end);
        None
    }

    /// Parent arcs from `start` up to the root of `tree`.
    fn path_to_root(&self, start: VertexId, tree: Tree) -> Result<Vec<ArcId>, InvariantViolation> {
        let root = match tree {
            Tree::Source => self.network.source(),
            _ => self.network.sink(),
        };
        let broken = InvariantViolation::BrokenPath {
            vertex: start,
            lambda: self.lambda(),
        };

        let mut path = Vec::new();
        let mut v = start;
        while v != root {
            let node = self.forest.node(v);
            if node.tree != tree || path.len() >= self.network.vertex_count() {
                return Err(broken);
            }
            let arc = node.parent.ok_or_else(|| broken.clone())?;
            path.push(arc);
            v = match tree {
                Tree::Source => self.network.tail(arc),
                _ => self.network.head(arc),
            };
        }
        Ok(path)
    }

    /// Pushes the bottleneck along the source-sink path through `bridge`.
    fn augment(&mut self, bridge: ArcId) -> Result<(), Error> {
        let lambda = self.lambda();
        let source_path = self.path_to_root(self.network.tail(bridge), Tree::Source)?;
        let sink_path = self.path_to_root(self.network.head(bridge), Tree::Sink)?;

        let bottleneck = source_path
            .iter()
            .chain(&sink_path)
            .map(|&arc| self.residual.residual(arc))
            .fold(self.residual.residual(bridge), LinearAmount::min);
        if !bottleneck.is_positive() {
            return Err(InvariantViolation::EmptyAugmentation { arc: bridge, lambda }.into());
        }
        if !bottleneck.is_bounded() {
            return Err(InvariantViolation::UnboundedAugmentation { arc: bridge, lambda }.into());
        }

        for &arc in source_path.iter().chain(&sink_path) {
            self.push(arc, bottleneck)?;
        }
        self.push(bridge, bottleneck)?;

        self.flow += bottleneck;
        self.stats.augmentations += 1;
        log::trace!(
            "augmented {} through arc {} along {} arcs",
            bottleneck,
            bridge,
            source_path.len() + sink_path.len() + 1
        );
        Ok(())
    }

    /// Pushes `amount` through `arc`, orphans the tree child hanging from it once it closes and
    /// hands its reverse arc to the growth loop once that opens.
    pub(super) fn push(
        &mut self,
        arc: ArcId,
        amount: LinearAmount,
    ) -> Result<Push, InvariantViolation> {
        let reverse = self.network.reverse(arc);
        let reopens = !self.residual.is_open(reverse);
        let push = self.residual.push_flow(arc, amount)?;
        self.queue.reschedule(arc, self.residual.exhausted_at(arc));
        self.queue.reschedule(reverse, self.residual.exhausted_at(reverse));

        if push.saturated {
            self.detach(arc);
        }
        if reopens && self.residual.is_open(reverse) {
            self.pending.push(reverse);
        }
        Ok(push)
    }

    /// Orphans the vertex whose parent link is the closed `arc`.
    pub(super) fn detach(&mut self, arc: ArcId) {
        let (tail, head) = (self.network.tail(arc), self.network.head(arc));
        if self.forest.tree(head) == Tree::Source && self.forest.parent(head) == Some(arc) {
            self.forest.orphan(head);
        }
        if self.forest.tree(tail) == Tree::Sink && self.forest.parent(tail) == Some(arc) {
            self.forest.orphan(tail);
        }
    }

    /// Reattaches or releases every pending orphan, closest to the roots first.
    pub(super) fn adopt(&mut self) -> Result<(), Error> {
        while let Some(v) = self.forest.next_orphan() {
            let tree = self.forest.tree(v);
            if tree == Tree::Free || self.forest.is_rooted(v) {
                continue;
            }
            self.stats.orphans += 1;
            match self.find_parent(v) {
                Some((arc, dist)) => self.forest.attach(v, tree, arc, dist),
                None => self.release(v),
            }
        }
        Ok(())
    }

    /// A rooted neighbour in the orphan's own tree that is strictly closer to the root and
    /// still connected to the orphan through an open arc.
    fn find_parent(&self, v: VertexId) -> Option<(ArcId, usize)> {
        let orphan = self.forest.node(v);
        self.network.out_arcs(v).find_map(|arc| {
            let x = self.network.head(arc);
            let candidate = self.forest.node(x);
            if candidate.tree != orphan.tree
                || candidate.dist >= orphan.dist
                || !self.forest.is_rooted(x)
            {
                return None;
            }
            let link = match orphan.tree {
                Tree::Source => self.network.reverse(arc),
                _ => arc,
            };
            self.residual
                .is_open(link)
                .then_some((link, candidate.dist + 1))
        })
    }

    /// Frees `v`, orphans its children and queues every open arc through which a tree could
    /// take it back.
    fn release(&mut self, v: VertexId) {
        let tree = self.forest.tree(v);
        self.forest.release(v);
        self.stats.releases += 1;
        if tree == Tree::Sink {
            self.left_sink.push(v);
        }

        for arc in self.network.out_arcs(v) {
            let x = self.network.head(arc);
            let reverse = self.network.reverse(arc);
            match self.forest.tree(x) {
                Tree::Source => {
                    if self.residual.is_open(reverse) {
                        self.pending.push(reverse);
                    }
                    if tree == Tree::Source && self.forest.parent(x) == Some(arc) {
                        self.forest.orphan(x);
                    }
                }
                Tree::Sink => {
                    if self.residual.is_open(arc) {
                        self.pending.push(arc);
                    }
                    if tree == Tree::Sink && self.forest.parent(x) == Some(reverse) {
                        self.forest.orphan(x);
                    }
                }
                Tree::Free => {}
            }
        }
    }
}
