//! A* over the navigation grid using buffers that outlive a single search

use crate::pathfinding::grid::{GridCoord, NavigationGrid};
use crate::pathfinding::heap::{HeapNode, IndexedMinHeap};
use std::f32::consts::SQRT_2;

const NO_PARENT: usize = usize::MAX;

/// 8-connected moves and their physical step length
const NEIGHBOR_STEPS: [(i32, i32, f32); 8] = [
    (1, 0, 1.0),
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (0, -1, 1.0),
    (1, 1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, 1, SQRT_2),
    (-1, -1, SQRT_2),
];

/// Per-cell search state, valid only while the cell's g-score is finite
#[derive(Debug, Clone, Copy)]
pub struct SearchNode {
    pub coord: GridCoord,
    pub g: f32,
    pub h: f32,
    pub f: f32,
    /// Grid index of the predecessor on the best known route
    pub parent: usize,
    heap_index: usize,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            coord: GridCoord::new(0, 0),
            g: f32::INFINITY,
            h: 0.0,
            f: f32::INFINITY,
            parent: NO_PARENT,
            heap_index: 0,
        }
    }
}

impl HeapNode for SearchNode {
    fn key(&self) -> f32 {
        self.f
    }

    fn heap_index(&self) -> usize {
        self.heap_index
    }

    fn set_heap_index(&mut self, index: usize) {
        self.heap_index = index;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Cells from start to goal inclusive, with the accumulated cost
    Found {
        cells: Vec<GridCoord>,
        cost: f32,
        expansions: u32,
    },
    Unreachable {
        expansions: u32,
    },
    ExpansionLimit {
        expansions: u32,
    },
}

/// Euclidean distance in cells; admissible and consistent because every step
/// costs at least its physical length
pub fn heuristic(from: GridCoord, to: GridCoord) -> f32 {
    from.euclidean_distance(&to)
}

/// Scratch buffers for A*, sized to the grid and reused by every search.
///
/// Only one search may use an instance at a time. Every search resets the
/// g-scores and the closed bitmap before touching any node, so nothing leaks
/// from one search into the next. A multi-threaded host needs one instance
/// per thread or exclusive access around each call.
#[derive(Debug, Clone, Default)]
pub struct SearchScratch {
    g_scores: Vec<f32>,
    closed: Vec<u64>,
    nodes: Vec<SearchNode>,
    open: IndexedMinHeap,
}

impl SearchScratch {
    pub fn new(cell_count: usize) -> Self {
        let mut scratch = Self::default();
        scratch.ensure_capacity(cell_count);
        scratch
    }

    pub fn cell_capacity(&self) -> usize {
        self.g_scores.len()
    }

    fn ensure_capacity(&mut self, cell_count: usize) {
        if self.g_scores.len() != cell_count {
            self.g_scores = vec![f32::INFINITY; cell_count];
            self.closed = vec![0; cell_count.div_ceil(64)];
            self.nodes = vec![SearchNode::default(); cell_count];
            self.open = IndexedMinHeap::with_capacity(cell_count.min(4096));
        }
    }

    // TODO: stamp cells with a search generation instead of clearing both
    // arrays once grids get large enough for the reset to show up in profiles.
    fn reset(&mut self) {
        self.g_scores.fill(f32::INFINITY);
        self.closed.fill(0);
        self.open.clear();
    }

    fn is_closed(&self, index: usize) -> bool {
        self.closed[index / 64] & (1u64 << (index % 64)) != 0
    }

    fn close(&mut self, index: usize) {
        self.closed[index / 64] |= 1u64 << (index % 64);
    }

    /// Run A* from `start` to `goal`. Both cells must be on the grid; their
    /// passability is the caller's concern.
    pub fn search(
        &mut self,
        grid: &NavigationGrid,
        start: GridCoord,
        goal: GridCoord,
        max_expansions: u32,
    ) -> SearchOutcome {
        self.ensure_capacity(grid.cell_count());
        self.reset();

        let costs = grid.costs();
        let start_index = grid.index(start);
        let goal_index = grid.index(goal);

        let h = heuristic(start, goal);
        self.nodes[start_index] = SearchNode {
            coord: start,
            g: 0.0,
            h,
            f: h,
            parent: NO_PARENT,
            heap_index: 0,
        };
        self.g_scores[start_index] = 0.0;
        self.open.push(&mut self.nodes, start_index);

        let mut expansions = 0;
        while let Some(current) = self.open.pop(&mut self.nodes) {
            if current == goal_index {
                return SearchOutcome::Found {
                    cells: self.reconstruct(goal_index),
                    cost: self.g_scores[goal_index],
                    expansions,
                };
            }
            if expansions >= max_expansions {
                return SearchOutcome::ExpansionLimit { expansions };
            }
            expansions += 1;
            self.close(current);

            let coord = self.nodes[current].coord;
            let current_g = self.g_scores[current];

            for &(dx, dz, step) in &NEIGHBOR_STEPS {
                let Some(neighbor) = grid.offset(coord, dx, dz) else {
                    continue;
                };
                let neighbor_index = grid.index(neighbor);
                if self.is_closed(neighbor_index) {
                    continue;
                }
                let terrain_cost = costs[neighbor_index];
                if !terrain_cost.is_finite() {
                    continue;
                }

                let tentative_g = current_g + step * terrain_cost;
                let known_g = self.g_scores[neighbor_index];
                if tentative_g >= known_g {
                    continue;
                }
                self.g_scores[neighbor_index] = tentative_g;

                if known_g < f32::INFINITY {
                    // Touched this search and not closed, so still queued
                    let node = &mut self.nodes[neighbor_index];
                    node.g = tentative_g;
                    node.f = tentative_g + node.h;
                    node.parent = current;
                    self.open.decrease_key(&mut self.nodes, neighbor_index);
                } else {
                    let h = heuristic(neighbor, goal);
                    self.nodes[neighbor_index] = SearchNode {
                        coord: neighbor,
                        g: tentative_g,
                        h,
                        f: tentative_g + h,
                        parent: current,
                        heap_index: 0,
                    };
                    self.open.push(&mut self.nodes, neighbor_index);
                }
            }
        }

        SearchOutcome::Unreachable { expansions }
    }

    fn reconstruct(&self, goal_index: usize) -> Vec<GridCoord> {
        let mut cells = Vec::new();
        let mut index = goal_index;
        while index != NO_PARENT {
            let node = &self.nodes[index];
            cells.push(node.coord);
            index = node.parent;
        }
        cells.reverse();
        cells
    }
}
