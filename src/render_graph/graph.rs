//! The render graph and its builder.

use crate::gpu::GpuContext;
use crate::render_graph::{GraphResource, RenderContext, RenderNode};

/// A render graph whose declared dependencies cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("render graph has no nodes")]
    Empty,

    /// A node reads a resource that no node writes.
    #[error("node '{node}' reads {resource:?}, which no node writes")]
    UnproducedRead {
        node: &'static str,
        resource: GraphResource,
    },

    /// The read/write declarations form a cycle.
    #[error("render graph has a dependency cycle through {nodes:?}")]
    Cycle { nodes: Vec<&'static str> },
}

/// Builder for constructing render graphs with a fluent API.
///
/// Nodes may be added in any order; [`build`](Self::build) orders them by
/// their declared reads and writes. Nodes with no dependency between them
/// keep their insertion order.
pub struct RenderGraphBuilder {
    nodes: Vec<Box<dyn RenderNode>>,
}

impl RenderGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Adds a render node to the graph.
    pub fn node<N: RenderNode + 'static>(mut self, node: N) -> Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Resolves the execution order.
    ///
    /// Fails if the graph is empty, if a node reads a resource nothing writes,
    /// or if the dependencies are cyclic.
    pub fn build(self) -> Result<RenderGraph, GraphError> {
        let order = schedule(&self.nodes)?;

        let mut slots: Vec<Option<Box<dyn RenderNode>>> =
            self.nodes.into_iter().map(Some).collect();
        let nodes = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();

        Ok(RenderGraph { nodes })
    }
}

impl Default for RenderGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Kahn's algorithm over writer-before-reader edges, lowest index first.
fn schedule(nodes: &[Box<dyn RenderNode>]) -> Result<Vec<usize>, GraphError> {
    if nodes.is_empty() {
        return Err(GraphError::Empty);
    }

    let count = nodes.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut pending = vec![0usize; count];

    for (reader, node) in nodes.iter().enumerate() {
        for &resource in node.reads() {
            let writers: Vec<usize> = (0..count)
                .filter(|&w| w != reader && nodes[w].writes().contains(&resource))
                .collect();

            if writers.is_empty() && !node.writes().contains(&resource) {
                return Err(GraphError::UnproducedRead {
                    node: node.name(),
                    resource,
                });
            }

            for writer in writers {
                if !successors[writer].contains(&reader) {
                    successors[writer].push(reader);
                    pending[reader] += 1;
                }
            }
        }
    }

    let mut order = Vec::with_capacity(count);
    let mut done = vec![false; count];

    while order.len() < count {
        let Some(next) = (0..count).find(|&i| !done[i] && pending[i] == 0) else {
            let nodes = (0..count)
                .filter(|&i| !done[i])
                .map(|i| nodes[i].name())
                .collect();
            return Err(GraphError::Cycle { nodes });
        };

        done[next] = true;
        order.push(next);
        for &succ in &successors[next] {
            pending[succ] -= 1;
        }
    }

    Ok(order)
}

/// An ordered set of render nodes sharing one command encoder per frame.
pub struct RenderGraph {
    /// Nodes in execution order.
    nodes: Vec<Box<dyn RenderNode>>,
}

impl RenderGraph {
    pub fn builder() -> RenderGraphBuilder {
        RenderGraphBuilder::new()
    }

    /// Node names in execution order.
    pub fn order(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|node| node.name()).collect()
    }

    /// Forwards a surface resize to every node.
    pub fn resize(&mut self, gpu: &GpuContext) {
        for node in &mut self.nodes {
            node.resize(gpu);
        }
    }

    /// Encodes every node, in order, into `ctx.encoder`.
    ///
    /// Submission and presentation are left to the caller.
    pub fn execute(&self, ctx: &mut RenderContext<'_>) {
        for node in &self.nodes {
            node.execute(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GraphResource::{SceneDepth, ShadowMap, Surface};

    struct Stub {
        name: &'static str,
        reads: Vec<GraphResource>,
        writes: Vec<GraphResource>,
    }

    impl Stub {
        fn new(name: &'static str, reads: &[GraphResource], writes: &[GraphResource]) -> Self {
            Self {
                name,
                reads: reads.to_vec(),
                writes: writes.to_vec(),
            }
        }
    }

    impl RenderNode for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn reads(&self) -> &[GraphResource] {
            &self.reads
        }

        fn writes(&self) -> &[GraphResource] {
            &self.writes
        }

        fn execute(&self, _ctx: &mut RenderContext<'_>) {}
    }

    #[test]
    fn shadow_pass_runs_first_regardless_of_insertion() {
        let graph = RenderGraph::builder()
            .node(Stub::new("Scene", &[ShadowMap], &[SceneDepth, Surface]))
            .node(Stub::new("Shadow", &[], &[ShadowMap]))
            .build()
            .unwrap();
        assert_eq!(graph.order(), ["Shadow", "Scene"]);
    }

    #[test]
    fn independent_nodes_keep_insertion_order() {
        let graph = RenderGraph::builder()
            .node(Stub::new("B", &[], &[Surface]))
            .node(Stub::new("A", &[], &[ShadowMap]))
            .build()
            .unwrap();
        assert_eq!(graph.order(), ["B", "A"]);
    }

    #[test]
    fn chained_readers_follow_writers() {
        let graph = RenderGraph::builder()
            .node(Stub::new("Overlay", &[Surface], &[Surface]))
            .node(Stub::new("Scene", &[ShadowMap], &[Surface]))
            .node(Stub::new("Shadow", &[], &[ShadowMap]))
            .build()
            .unwrap();
        let order = graph.order();
        let pos = |name| order.iter().position(|&n| n == name).unwrap();
        assert!(pos("Shadow") < pos("Scene"));
        assert!(pos("Scene") < pos("Overlay"));
    }

    #[test]
    fn unproduced_read_is_rejected() {
        let result = RenderGraph::builder()
            .node(Stub::new("Scene", &[ShadowMap], &[Surface]))
            .build();
        assert_eq!(
            result.err(),
            Some(GraphError::UnproducedRead {
                node: "Scene",
                resource: ShadowMap
            })
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let result = RenderGraph::builder()
            .node(Stub::new("A", &[ShadowMap], &[SceneDepth]))
            .node(Stub::new("B", &[SceneDepth], &[ShadowMap]))
            .build();
        assert!(matches!(result, Err(GraphError::Cycle { nodes }) if nodes.len() == 2));
    }

    #[test]
    fn empty_graph_is_rejected() {
        assert_eq!(
            RenderGraph::builder().build().err(),
            Some(GraphError::Empty)
        );
    }
}
