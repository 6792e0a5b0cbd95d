use alloc::collections::{btree_map::Entry::Vacant, BTreeMap, VecDeque};
use core::hash::Hash;

use displaydoc::Display;
use num_traits::Zero;
use petgraph::graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences, IntoNodeIdentifiers};
use petgraph::Graph;

use crate::amount::Amount;

pub type NodePair<NodeId> = (NodeId, NodeId);

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum MaxFlowError {
    /// Excess of a node is no longer a finite amount
    UnboundedExcess,
    /// Source or target is not a node of the graph
    MissingNode,
    /// Arc between two nodes is missing from the residual graph
    MissingEdge,
    /// A node with excess has no residual arc left
    Stranded,
}

struct Node<N, A> {
    orig_id: N,
    excess: A,
    label: usize,
}

impl<N, A: Zero> Node<N, A> {
    fn new(orig_id: N) -> Node<N, A> {
        Node {
            orig_id,
            excess: A::zero(),
            label: 0,
        }
    }
}

struct Edge<A> {
    capacity: A,
    flow: A,
}

impl<A: Amount> Edge<A> {
    fn new(capacity: A) -> Edge<A> {
        Edge {
            capacity,
            flow: A::zero(),
        }
    }

    fn residual(&self) -> A {
        self.capacity - self.flow
    }
}

type PRGraph<N, A> = Graph<Node<N, A>, ()>;
type NodeId = NodeIndex<u32>;

struct State<N, A> {
    graph: PRGraph<N, A>,
    // random access by node pair is cheaper here than walking `graph`
    edges: BTreeMap<(NodeId, NodeId), Edge<A>>,
    target: NodeId,
    active_queue: VecDeque<NodeId>,
}

fn min_amount<A: Amount>(a: A, b: A) -> A {
    if b < a {
        b
    } else {
        a
    }
}

impl<N: Copy + Ord, A: Amount> State<N, A> {
    fn edge_mut(&mut self, u: NodeId, v: NodeId) -> Result<&mut Edge<A>, MaxFlowError> {
        self.edges.get_mut(&(u, v)).ok_or(MaxFlowError::MissingEdge)
    }

    fn push(&mut self, u: NodeId, v: NodeId) -> Result<(), MaxFlowError> {
        let new_flow = {
            let e_data = self.edges.get(&(u, v)).ok_or(MaxFlowError::MissingEdge)?;
            debug_assert!(self.graph[u].excess > A::zero());
            debug_assert!(self.graph[u].label == self.graph[v].label + 1);

            min_amount(self.graph[u].excess, e_data.residual())
        };
        self.add_excess(u, -new_flow)?;
        self.add_excess(v, new_flow)?;
        self.edge_mut(u, v)?.flow += new_flow;
        self.edge_mut(v, u)?.flow -= new_flow;
        Ok(())
    }

    fn has_capacity(&self, u: NodeId, v: NodeId) -> bool {
        self.edges
            .get(&(u, v))
            .map_or(false, |e| e.capacity > e.flow)
    }

    fn can_push(&self, u: NodeId, v: NodeId) -> bool {
        self.has_capacity(u, v) && self.graph[u].label == self.graph[v].label + 1
    }

    fn add_excess(&mut self, u: NodeId, amount: A) -> Result<(), MaxFlowError> {
        // the target absorbs whatever reaches it
        if u == self.target {
            return Ok(());
        }

        let node = &mut self.graph[u];
        if node.excess <= A::zero() || node.excess.is_negligible() {
            self.active_queue.push_back(u);
        }
        node.excess += amount;
        if !node.excess.is_bounded() {
            return Err(MaxFlowError::UnboundedExcess);
        }
        Ok(())
    }

    // Keep pushing excess flow to neighbors until we can't any more.
    fn discharge(&mut self, u: NodeId) -> Result<(), MaxFlowError> {
        let mut nbrs = self.graph.neighbors(u).detach();
        while self.graph[u].excess > A::zero() && !self.graph[u].excess.is_negligible() {
            if let Some(v) = nbrs.next_node(&self.graph) {
                if self.can_push(u, v) {
                    self.push(u, v)?;
                }
            } else {
                self.relabel(u)?;
                nbrs = self.graph.neighbors(u).detach();
            }
        }
        Ok(())
    }

    fn relabel(&mut self, u: NodeId) -> Result<(), MaxFlowError> {
        let min_nbr_label = self
            .graph
            .neighbors(u)
            .filter(|v| self.has_capacity(u, *v))
            .map(|v| self.graph[v].label)
            .min()
            .ok_or(MaxFlowError::Stranded)?;
        // labels never exceed 2n on exact arithmetic
        if min_nbr_label > 2 * self.graph.node_count() {
            return Err(MaxFlowError::Stranded);
        }
        self.graph[u].label = min_nbr_label + 1;
        Ok(())
    }

    fn new<G>(g: G, source: N, target: N) -> Result<State<N, A>, MaxFlowError>
    where
        G: IntoEdgeReferences<EdgeWeight = A, NodeId = N> + IntoNodeIdentifiers,
    {
        // nodes of `g` to nodes of `pr_graph`
        let mut node_map = BTreeMap::new();
        let mut pr_graph = PRGraph::new();
        let mut edges = BTreeMap::new();

        for n in g.node_identifiers() {
            let pr_id = pr_graph.add_node(Node::new(n));
            node_map.insert(n, pr_id);
        }
        for e in g.edge_references() {
            let u = node_map[&e.source()];
            let v = node_map[&e.target()];
            let capacity = *e.weight();
            pr_graph.add_edge(u, v, ());
            edges.insert(
                (u, v),
                Edge::new(if capacity > A::zero() { capacity } else { A::zero() }),
            );
        }

        // every edge needs its reversal
        for e in g.edge_references() {
            let u = node_map[&e.source()];
            let v = node_map[&e.target()];
            if let Vacant(e) = edges.entry((v, u)) {
                e.insert(Edge::new(A::zero()));
                pr_graph.add_edge(v, u, ());
            }
        }

        let pr_source = *node_map.get(&source).ok_or(MaxFlowError::MissingNode)?;
        let pr_target = *node_map.get(&target).ok_or(MaxFlowError::MissingNode)?;
        pr_graph[pr_source].label = pr_graph.node_count();
        let mut nbrs = pr_graph.neighbors(pr_source).detach();
        let mut active = VecDeque::new();

        while let Some(v) = nbrs.next_node(&pr_graph) {
            let edge = edges
                .get_mut(&(pr_source, v))
                .ok_or(MaxFlowError::MissingEdge)?;
            let cap = edge.capacity;
            if cap == A::zero() {
                continue;
            }
            edge.flow = cap;
            edges
                .get_mut(&(v, pr_source))
                .ok_or(MaxFlowError::MissingEdge)?
                .flow = -cap;
            pr_graph[v].excess += cap;
            pr_graph[pr_source].excess -= cap;
            if v != pr_target {
                active.push_back(v);
            }
        }

        Ok(State {
            edges,
            graph: pr_graph,
            target: pr_target,
            active_queue: active,
        })
    }

    fn run(&mut self) -> Result<(), MaxFlowError> {
        while let Some(u) = self.active_queue.pop_front() {
            if u != self.target {
                self.discharge(u)?;
            }
        }
        Ok(())
    }
}

/// Computes a max flow from `source` to `target` in the weighted graph `g` using the push-relabel
/// algorithm.
///
/// The edge weights in `g` are interpreted as edge capacities -- negative weights are treated the
/// same as zero weights. Capacities must be bounded.
///
/// Returns a `BTreeMap` that maps ordered pairs of vertices to the flow between them. The map only
/// contains pairs of vertices with a strictly positive flow.
pub fn push_relabel_max_flow<G, A>(
    g: G,
    source: G::NodeId,
    target: G::NodeId,
) -> Result<BTreeMap<NodePair<G::NodeId>, A>, MaxFlowError>
where
    G: IntoEdgeReferences<EdgeWeight = A> + IntoNodeIdentifiers,
    G::NodeId: Copy + Hash + Ord,
    A: Amount,
{
    let mut state = State::new(g, source, target)?;
    state.run()?;

    let graph = state.graph;
    let flow = state
        .edges
        .into_iter()
        .filter(|(_, data)| data.flow > A::zero())
        .map(|((u, v), data)| ((graph[u].orig_id, graph[v].orig_id), data.flow))
        .collect::<BTreeMap<_, _>>();

    Ok(flow)
}
