//! Execution of the dependency graph over a worker pool
//!
//! One outer step at a time, the scheduler builds the step's
//! [`StepGraph`], seeds the pool with its root (the diagonal
//! factorization), and lets every completing node decrement its
//! successors' pending counters, spawning each one the moment its count
//! reaches zero. The step drains before the next one is generated, which
//! both enforces the total cross-step order and bounds the live node set
//! to O(nt²).
//!
//! Node execution order within an eligibility wave is whatever the pool
//! picks; the kernels' fixed accumulation order makes the arithmetic
//! outcome identical for every choice, including the single-threaded
//! [`Parallelism::None`] schedule.

#[cfg(feature = "rayon")]
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
#[cfg(feature = "rayon")]
use std::sync::Mutex;

use log::debug;

use crate::element::Element;
#[cfg(feature = "rayon")]
use crate::error::Error;
use crate::error::Result;
#[cfg(feature = "rayon")]
use crate::graph::StepGraph;
use crate::graph::{for_each_node_sequential, Node, NodeKind};
use crate::kernels;
use crate::tile::{packed_offset, TileGrid};

/// Parallelism strategy for [`factorize`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// No parallelism: every node runs sequentially on the calling thread.
    None,
    /// Rayon worker pool. Only available with the `rayon` feature.
    ///
    /// The contained value is the worker count; `0` means the ambient
    /// rayon pool (usually one worker per core), any other value builds a
    /// dedicated pool of exactly that many workers for the call.
    #[cfg(feature = "rayon")]
    Rayon(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        #[cfg(feature = "rayon")]
        {
            Parallelism::Rayon(0)
        }
        #[cfg(not(feature = "rayon"))]
        {
            Parallelism::None
        }
    }
}

/// Number of workers a strategy resolves to.
pub fn parallelism_degree(parallelism: Parallelism) -> usize {
    match parallelism {
        Parallelism::None => 1,
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(0) => rayon::current_num_threads(),
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(n) => n,
    }
}

/// Cholesky-factorize the tiled matrix in place: A = L·Lᵗ.
///
/// Blocks until every tile operation has completed or the first error is
/// observed. On success the lower triangle of the grid holds L; on error
/// the grid contents are unspecified and must not be used.
///
/// The choice of `parallelism` never changes the numerical result: the
/// dependency graph admits no data races and the kernels use a fixed
/// accumulation order, so output is bit-for-bit identical for one worker
/// or many.
pub fn factorize<T: Element>(grid: &mut TileGrid<T>, parallelism: Parallelism) -> Result<()> {
    let nt = grid.nt();
    debug!(
        "factorize: n={} ts={} nt={} workers={}",
        grid.n(),
        grid.ts(),
        nt,
        parallelism_degree(parallelism)
    );
    match parallelism {
        Parallelism::None => factorize_sequential(grid),
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(n) => {
            if parallelism_degree(parallelism) <= 1 || nt == 1 {
                factorize_sequential(grid)
            } else if n == 0 {
                factorize_parallel(grid)
            } else {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| Error::KernelFailure {
                        node: "scheduler",
                        detail: format!("failed to build worker pool: {e}"),
                    })?;
                pool.install(|| factorize_parallel(grid))
            }
        }
    }
}

fn factorize_sequential<T: Element>(grid: &mut TileGrid<T>) -> Result<()> {
    let nt = grid.nt();
    let ts = grid.ts();
    let arena = TileArenaPtr::new(grid);
    for_each_node_sequential(nt, |node| {
        // Sole thread, so exclusivity holds trivially.
        unsafe { run_node(arena, ts, node) }
    })
}

#[cfg(feature = "rayon")]
fn factorize_parallel<T: Element>(grid: &mut TileGrid<T>) -> Result<()> {
    let nt = grid.nt();
    let ts = grid.ts();
    let arena = TileArenaPtr::new(grid);
    for k in 0..nt {
        let step = StepGraph::build(k, nt);
        run_step(arena, ts, &step)?;
    }
    Ok(())
}

/// Shared state of one in-flight step.
#[cfg(feature = "rayon")]
struct StepState {
    /// Remaining predecessor count per node; a node is spawned exactly
    /// when its counter is decremented to zero.
    pending: Vec<AtomicU32>,
    /// Set once a node fails; stops all further spawning.
    failed: AtomicBool,
    /// The first error observed (later concurrent failures are dropped).
    first_error: Mutex<Option<Error>>,
}

#[cfg(feature = "rayon")]
struct StepCtx<'g, T> {
    arena: TileArenaPtr<T>,
    ts: usize,
    step: &'g StepGraph,
    state: &'g StepState,
}

#[cfg(feature = "rayon")]
impl<T> Clone for StepCtx<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

#[cfg(feature = "rayon")]
impl<T> Copy for StepCtx<'_, T> {}

#[cfg(feature = "rayon")]
fn run_step<T: Element>(arena: TileArenaPtr<T>, ts: usize, step: &StepGraph) -> Result<()> {
    let state = StepState {
        pending: step.pending().iter().map(|&p| AtomicU32::new(p)).collect(),
        failed: AtomicBool::new(false),
        first_error: Mutex::new(None),
    };
    let ctx = StepCtx {
        arena,
        ts,
        step,
        state: &state,
    };

    // The scope is the step's drain barrier: it returns once every spawned
    // node (and everything it chained) has finished.
    rayon::scope(|s| {
        for id in step.roots() {
            s.spawn(move |s| execute_and_chain(s, ctx, id));
        }
    });

    let first = state
        .first_error
        .lock()
        .expect("scheduler state poisoned")
        .take();
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Run one node, then unlock and spawn any successor whose last
/// predecessor this was. Nodes reached after a failure are abandoned
/// before running their kernel; in-flight ones finish on their own.
#[cfg(feature = "rayon")]
fn execute_and_chain<'a, T: Element>(s: &rayon::Scope<'a>, ctx: StepCtx<'a, T>, id: usize) {
    let state = ctx.state;
    if state.failed.load(Ordering::Acquire) {
        return;
    }

    let node = &ctx.step.nodes()[id];
    // SAFETY: the dependency graph gives this node exclusive write access
    // to `node.writes()` and guarantees its read tiles have no concurrent
    // writer (see `TileArenaPtr`).
    let result = unsafe { run_node(ctx.arena, ctx.ts, node) };

    match result {
        Err(err) => {
            let mut slot = state.first_error.lock().expect("scheduler state poisoned");
            if slot.is_none() {
                *slot = Some(err);
            }
            state.failed.store(true, Ordering::Release);
        }
        Ok(()) => {
            for &succ in ctx.step.successors(id) {
                if state.pending[succ].fetch_sub(1, Ordering::AcqRel) == 1
                    && !state.failed.load(Ordering::Acquire)
                {
                    s.spawn(move |s| execute_and_chain(s, ctx, succ));
                }
            }
        }
    }
}

/// Dispatch one node to its kernel through raw tile views.
///
/// # Safety
///
/// The caller must guarantee that for the duration of the call no other
/// thread writes any tile in the node's read set and no other thread
/// touches the node's write tile. The dependency graph provides exactly
/// this (single writer per tile); the sequential executor provides it
/// trivially.
unsafe fn run_node<T: Element>(arena: TileArenaPtr<T>, ts: usize, node: &Node) -> Result<()> {
    let (k, i, j) = (node.k, node.i, node.j);
    match node.kind {
        NodeKind::Factorize => {
            kernels::factorize_tile(arena.tile_mut(packed_offset(k, k, ts)), ts, k)
        }
        NodeKind::Solve => {
            kernels::triangular_solve(
                arena.tile(packed_offset(k, k, ts)),
                arena.tile_mut(packed_offset(i, k, ts)),
                ts,
            );
            Ok(())
        }
        NodeKind::UpdateSymmetric => {
            kernels::update_symmetric(
                arena.tile(packed_offset(i, k, ts)),
                arena.tile_mut(packed_offset(i, i, ts)),
                ts,
            );
            Ok(())
        }
        NodeKind::UpdateGeneral => {
            kernels::update_general(
                arena.tile(packed_offset(i, k, ts)),
                arena.tile(packed_offset(j, k, ts)),
                arena.tile_mut(packed_offset(i, j, ts)),
                ts,
            );
            Ok(())
        }
    }
}

/// Raw view of the tile arena, shareable across workers.
///
/// Soundness rests on the dependency graph, not on the type system: each
/// tile is written by at most one node at a time, and a tile being read is
/// never concurrently written. Under that protocol the disjoint tile
/// slices handed out below never alias mutably.
struct TileArenaPtr<T> {
    ptr: *mut T,
    tile_len: usize,
}

unsafe impl<T: Send> Send for TileArenaPtr<T> {}
unsafe impl<T: Sync> Sync for TileArenaPtr<T> {}

impl<T> Clone for TileArenaPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TileArenaPtr<T> {}

impl<T: Element> TileArenaPtr<T> {
    fn new(grid: &mut TileGrid<T>) -> Self {
        let tile_len = grid.ts() * grid.ts();
        Self {
            ptr: grid.arena_mut_ptr(),
            tile_len,
        }
    }

    /// # Safety
    /// `offset` must address a whole tile and no concurrent writer may
    /// exist for it.
    unsafe fn tile<'a>(&self, offset: usize) -> &'a [T] {
        std::slice::from_raw_parts(self.ptr.add(offset), self.tile_len)
    }

    /// # Safety
    /// `offset` must address a whole tile and this must be its only
    /// concurrent accessor.
    #[allow(clippy::mut_from_ref)]
    unsafe fn tile_mut<'a>(&self, offset: usize) -> &'a mut [T] {
        std::slice::from_raw_parts_mut(self.ptr.add(offset), self.tile_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parallelism_degree() {
        assert_eq!(parallelism_degree(Parallelism::None), 1);
        #[cfg(feature = "rayon")]
        {
            assert_eq!(parallelism_degree(Parallelism::Rayon(3)), 3);
            assert!(parallelism_degree(Parallelism::Rayon(0)) >= 1);
        }
    }

    #[test]
    fn test_factorize_single_tile() {
        // nt = 1 degenerates to one dense factorization.
        let dense = vec![4.0, 12.0, -16.0, 12.0, 37.0, -43.0, -16.0, -43.0, 98.0];
        let mut grid = TileGrid::from_dense(&dense, 3, 3).unwrap();
        factorize(&mut grid, Parallelism::None).unwrap();
        let t = grid.tile(0, 0);
        assert_eq!(t[0], 2.0);
        assert_eq!(t[4], 1.0);
        assert_eq!(t[8], 3.0);
    }

    #[test]
    fn test_factorize_reports_indefinite_tile() {
        let n = 4;
        let mut dense = vec![0.0f64; n * n];
        for d in 0..n {
            dense[d * n + d] = 1.0;
        }
        dense[3 * n + 3] = -5.0; // breaks positive definiteness in tile (1,1)
        let mut grid = TileGrid::from_dense(&dense, n, 2).unwrap();
        let err = factorize(&mut grid, Parallelism::None).unwrap_err();
        assert_eq!(err, Error::NotPositiveDefinite { tile: 1, column: 1 });
    }
}
