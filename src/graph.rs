//! Dependency graph of tile operations
//!
//! The blocked Cholesky algorithm has a total order across outer steps k:
//! step k+1 cannot touch the active sub-block until step k's tiles are
//! final. Within a step the structure is a small DAG:
//!
//! ```text
//! Factorize (k,k)
//!   └─> Solve (i,k)            for each i in k+1..nt
//!         ├─> UpdateSymmetric (i,i)
//!         └─> UpdateGeneral (i,j)   together with Solve (j,k), j < i
//! ```
//!
//! A [`StepGraph`] materializes exactly one step at a time, so the live
//! node set stays O(nt²) even though the whole factorization performs
//! O(nt³) operations.

use crate::error::Result;

/// The four tile operations of the blocked algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// In-place Cholesky of diagonal tile (k,k)
    Factorize,
    /// Triangular solve producing tile (i,k)
    Solve,
    /// Rank-ts update of diagonal tile (i,i)
    UpdateSymmetric,
    /// General update of off-diagonal tile (i,j)
    UpdateGeneral,
}

/// One tile operation: kind plus the (k, i, j) indices that identify it.
///
/// For `Factorize`, i = j = k. For `Solve` and `UpdateSymmetric`, j is
/// unused and set to k and i respectively so that `writes()` is always
/// the tile (i, j).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Operation kind
    pub kind: NodeKind,
    /// Outer factorization step
    pub k: usize,
    /// Tile row index
    pub i: usize,
    /// Tile column index
    pub j: usize,
}

impl Node {
    /// Tiles this operation reads. In-place operands appear here as well
    /// as in `writes()`.
    pub fn reads(&self) -> Vec<(usize, usize)> {
        match self.kind {
            NodeKind::Factorize => vec![(self.k, self.k)],
            NodeKind::Solve => vec![(self.k, self.k), (self.i, self.k)],
            NodeKind::UpdateSymmetric => vec![(self.i, self.k), (self.i, self.i)],
            NodeKind::UpdateGeneral => {
                vec![(self.i, self.k), (self.j, self.k), (self.i, self.j)]
            }
        }
    }

    /// The single tile this operation writes.
    pub fn writes(&self) -> (usize, usize) {
        (self.i, self.j)
    }
}

/// Dependency graph of one outer step: nodes, predecessor counts, and
/// successor lists.
#[derive(Debug)]
pub struct StepGraph {
    k: usize,
    nt: usize,
    nodes: Vec<Node>,
    pending: Vec<u32>,
    successors: Vec<Vec<usize>>,
}

impl StepGraph {
    /// Derive the node set and edges for outer step `k` of an nt×nt grid.
    pub fn build(k: usize, nt: usize) -> Self {
        debug_assert!(k < nt);
        let m = nt - k - 1; // trailing tile rows
        let node_count = 1 + 2 * m + m * m.saturating_sub(1) / 2;
        let mut nodes = Vec::with_capacity(node_count);
        let mut pending = Vec::with_capacity(node_count);
        let mut successors: Vec<Vec<usize>> = Vec::with_capacity(node_count);

        // Node 0: the factorization everything in this step hangs off.
        nodes.push(Node {
            kind: NodeKind::Factorize,
            k,
            i: k,
            j: k,
        });
        pending.push(0);
        successors.push(Vec::with_capacity(m));

        // Nodes 1..=m: solves, one per trailing row, mutually independent.
        let solve_id = |i: usize| 1 + (i - k - 1);
        for i in (k + 1)..nt {
            let id = nodes.len();
            nodes.push(Node {
                kind: NodeKind::Solve,
                k,
                i,
                j: k,
            });
            pending.push(1);
            successors.push(Vec::new());
            successors[0].push(id);
        }

        // Trailing updates: each consumes the solve outputs it reads.
        for i in (k + 1)..nt {
            for j in (k + 1)..i {
                let id = nodes.len();
                nodes.push(Node {
                    kind: NodeKind::UpdateGeneral,
                    k,
                    i,
                    j,
                });
                pending.push(2);
                successors.push(Vec::new());
                successors[solve_id(i)].push(id);
                successors[solve_id(j)].push(id);
            }
            let id = nodes.len();
            nodes.push(Node {
                kind: NodeKind::UpdateSymmetric,
                k,
                i,
                j: i,
            });
            pending.push(1);
            successors.push(Vec::new());
            successors[solve_id(i)].push(id);
        }

        debug_assert_eq!(nodes.len(), node_count);
        Self {
            k,
            nt,
            nodes,
            pending,
            successors,
        }
    }

    /// Outer step index this graph belongs to
    #[inline]
    pub fn step(&self) -> usize {
        self.k
    }

    /// Tile-grid dimension
    #[inline]
    pub fn nt(&self) -> usize {
        self.nt
    }

    /// Number of nodes in this step
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the step has no nodes (never happens for k < nt)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes of the step, factorize first
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Initial predecessor count per node
    #[inline]
    pub fn pending(&self) -> &[u32] {
        &self.pending
    }

    /// Node ids unlocked by the completion of `id`
    #[inline]
    pub fn successors(&self, id: usize) -> &[usize] {
        &self.successors[id]
    }

    /// Node ids that are ready as soon as the step starts
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, &p)| p == 0)
            .map(|(id, _)| id)
    }
}

/// Walk every step graph of an nt×nt factorization in dependency order,
/// invoking `run` once per node.
///
/// This is the sequential executor behind `Parallelism::None`; it keeps
/// graph generation step-by-step so the O(nt³) node total is never held
/// in memory at once.
pub(crate) fn for_each_node_sequential(
    nt: usize,
    mut run: impl FnMut(&Node) -> Result<()>,
) -> Result<()> {
    for k in 0..nt {
        let step = StepGraph::build(k, nt);
        // Built in topological order: factorize, solves, then updates.
        for node in step.nodes() {
            run(node)?;
        }
    }
    Ok(())
}
