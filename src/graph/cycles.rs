//! Simple-cycle enumeration over a [`DiGraph`] (Johnson's algorithm).
//!
//! Cycles are produced lazily: the iterator pauses after each cycle and the
//! caller may drop it at any point. Each simple cycle is yielded exactly
//! once, with its least node id first, grouped by ascending least node.
//! The order is identical across runs for the same graph.

use crate::error::EnumerationError;
use crate::graph::DiGraph;

/// Returns a lazy iterator over every simple cycle in `graph`.
///
/// The graph is validated up front; enumeration itself cannot fail and
/// always terminates. Each call starts a fresh enumeration over the same
/// borrowed graph.
pub fn simple_cycles(graph: &DiGraph) -> Result<SimpleCycles<'_>, EnumerationError> {
    graph.validate()?;
    Ok(SimpleCycles {
        graph,
        next_start: 0,
        search: None,
        done: false,
    })
}

/// Whether any cycle exists, without enumerating them all.
pub fn has_cycle(graph: &DiGraph) -> Result<bool, EnumerationError> {
    Ok(simple_cycles(graph)?.next().is_some())
}

pub struct SimpleCycles<'g> {
    graph: &'g DiGraph,
    next_start: usize,
    search: Option<Search>,
    done: bool,
}

impl Iterator for SimpleCycles<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        loop {
            if let Some(search) = self.search.as_mut() {
                if let Some(cycle) = search.advance(self.graph) {
                    return Some(cycle);
                }
                self.next_start = search.root + 1;
                self.search = None;
            }
            if self.done || self.next_start >= self.graph.node_count() {
                return None;
            }
            match least_nontrivial_scc(self.graph, self.next_start) {
                Some((root, in_scc)) => {
                    self.search = Some(Search::new(self.graph, root, in_scc));
                }
                None => {
                    // No component left that could hold a cycle.
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

struct Frame {
    node: usize,
    next_edge: usize,
    found: bool,
}

/// One root's blocked-set DFS. Explicit stacks let it pause at every
/// discovered cycle and keep deep graphs off the call stack.
struct Search {
    root: usize,
    in_scc: Vec<bool>,
    blocked: Vec<bool>,
    block_list: Vec<Vec<usize>>,
    path: Vec<usize>,
    frames: Vec<Frame>,
}

impl Search {
    fn new(graph: &DiGraph, root: usize, in_scc: Vec<bool>) -> Self {
        let n = graph.node_count();
        let mut blocked = vec![false; n];
        blocked[root] = true;
        Self {
            root,
            in_scc,
            blocked,
            block_list: vec![Vec::new(); n],
            path: vec![root],
            frames: vec![Frame {
                node: root,
                next_edge: 0,
                found: false,
            }],
        }
    }

    /// Resumes the DFS until the next cycle through `self.root`, or `None`
    /// once every path from the root is exhausted.
    fn advance(&mut self, graph: &DiGraph) -> Option<Vec<usize>> {
        loop {
            let top = self.frames.len().checked_sub(1)?;
            let node = self.frames[top].node;
            let successors = graph.neighbors(node);

            let mut descend_to = None;
            while self.frames[top].next_edge < successors.len() {
                let next = successors[self.frames[top].next_edge];
                self.frames[top].next_edge += 1;
                if !self.in_scc[next] {
                    continue;
                }
                if next == self.root {
                    self.frames[top].found = true;
                    return Some(self.path.clone());
                }
                if !self.blocked[next] {
                    descend_to = Some(next);
                    break;
                }
            }

            if let Some(next) = descend_to {
                self.blocked[next] = true;
                self.path.push(next);
                self.frames.push(Frame {
                    node: next,
                    next_edge: 0,
                    found: false,
                });
                continue;
            }

            // Every successor of `node` is explored; retire its frame.
            let found = self.frames[top].found;
            if found {
                self.unblock(node);
            } else {
                for &next in successors {
                    if !self.in_scc[next] {
                        continue;
                    }
                    let list = &mut self.block_list[next];
                    if !list.contains(&node) {
                        list.push(node);
                    }
                }
            }
            self.path.pop();
            self.frames.pop();
            if let Some(parent) = self.frames.last_mut() {
                parent.found |= found;
            }
        }
    }

    /// Johnson's cascading unblock: reopening `node` reopens every node
    /// whose blocking it caused.
    fn unblock(&mut self, node: usize) {
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if !self.blocked[current] {
                continue;
            }
            self.blocked[current] = false;
            pending.append(&mut self.block_list[current]);
        }
    }
}

/// Finds, within the subgraph induced by nodes `>= start`, the strongly
/// connected component able to hold a cycle (size > 1, or a single node
/// with a self-loop) whose least member is smallest. Returns that least
/// member and the component membership, or `None` when no cycle remains
/// anywhere past `start`.
fn least_nontrivial_scc(graph: &DiGraph, start: usize) -> Option<(usize, Vec<bool>)> {
    let mut best: Option<(usize, Vec<usize>)> = None;

    for component in tarjan_components(graph, start) {
        let least = match component.iter().min() {
            Some(&least) => least,
            None => continue,
        };
        if component.len() == 1 && !graph.has_edge(least, least) {
            continue;
        }
        if best.as_ref().map_or(true, |(current, _)| least < *current) {
            best = Some((least, component));
        }
    }

    let (least, component) = best?;
    let mut in_scc = vec![false; graph.node_count()];
    for node in component {
        in_scc[node] = true;
    }
    Some((least, in_scc))
}

/// Iterative Tarjan over the subgraph induced by nodes `>= start`.
fn tarjan_components(graph: &DiGraph, start: usize) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;
    let n = graph.node_count();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<usize>> = Vec::new();

    for root in start..n {
        if index[root] != UNVISITED {
            continue;
        }
        // (node, cursor into its successor list)
        let mut call: Vec<(usize, usize)> = vec![(root, 0)];
        while !call.is_empty() {
            let top = call.len() - 1;
            let node = call[top].0;
            if call[top].1 == 0 {
                index[node] = next_index;
                lowlink[node] = next_index;
                next_index += 1;
                stack.push(node);
                on_stack[node] = true;
            }

            let successors = graph.neighbors(node);
            let mut descended = false;
            while call[top].1 < successors.len() {
                let next = successors[call[top].1];
                call[top].1 += 1;
                if next < start {
                    continue;
                }
                if index[next] == UNVISITED {
                    call.push((next, 0));
                    descended = true;
                    break;
                }
                if on_stack[next] {
                    lowlink[node] = lowlink[node].min(index[next]);
                }
            }
            if descended {
                continue;
            }

            if lowlink[node] == index[node] {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                components.push(component);
            }
            call.pop();
            if let Some(&(parent, _)) = call.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[node]);
            }
        }
    }

    components
}
