//! Array-backed binary min-heap over externally stored nodes.
//!
//! The heap holds node ids; the nodes themselves live in a caller-owned slice
//! and record their own position in the heap, so a node whose key dropped can
//! be repositioned in O(log n) without searching.

/// A value the heap can order and locate
pub trait HeapNode {
    /// Ordering key, smallest first
    fn key(&self) -> f32;

    fn heap_index(&self) -> usize;

    fn set_heap_index(&mut self, index: usize);
}

#[derive(Debug, Default, Clone)]
pub struct IndexedMinHeap {
    slots: Vec<usize>,
}

impl IndexedMinHeap {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Empty the heap, keeping its allocation
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` is currently queued
    pub fn contains<N: HeapNode>(&self, nodes: &[N], id: usize) -> bool {
        self.slots.get(nodes[id].heap_index()) == Some(&id)
    }

    pub fn push<N: HeapNode>(&mut self, nodes: &mut [N], id: usize) {
        let index = self.slots.len();
        self.slots.push(id);
        nodes[id].set_heap_index(index);
        self.bubble_up(nodes, index);
    }

    pub fn pop<N: HeapNode>(&mut self, nodes: &mut [N]) -> Option<usize> {
        let last = self.slots.pop()?;
        if self.slots.is_empty() {
            return Some(last);
        }

        let top = std::mem::replace(&mut self.slots[0], last);
        nodes[last].set_heap_index(0);
        self.sink_down(nodes, 0);
        Some(top)
    }

    /// Restore ordering after the key of a queued node was lowered
    pub fn decrease_key<N: HeapNode>(&mut self, nodes: &mut [N], id: usize) {
        if self.contains(nodes, id) {
            let index = nodes[id].heap_index();
            self.bubble_up(nodes, index);
        }
    }

    fn bubble_up<N: HeapNode>(&mut self, nodes: &mut [N], mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if nodes[self.slots[index]].key() >= nodes[self.slots[parent]].key() {
                break;
            }
            self.swap(nodes, index, parent);
            index = parent;
        }
    }

    fn sink_down<N: HeapNode>(&mut self, nodes: &mut [N], mut index: usize) {
        let len = self.slots.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }

            let right = left + 1;
            let mut smallest = left;
            if right < len && nodes[self.slots[right]].key() < nodes[self.slots[left]].key() {
                smallest = right;
            }

            if nodes[self.slots[smallest]].key() >= nodes[self.slots[index]].key() {
                break;
            }
            self.swap(nodes, index, smallest);
            index = smallest;
        }
    }

    fn swap<N: HeapNode>(&mut self, nodes: &mut [N], a: usize, b: usize) {
        self.slots.swap(a, b);
        nodes[self.slots[a]].set_heap_index(a);
        nodes[self.slots[b]].set_heap_index(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand_pcg::Pcg32;

    #[derive(Debug, Clone, Default)]
    struct Entry {
        f: f32,
        heap_index: usize,
    }

    impl HeapNode for Entry {
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

    fn entries(keys: &[f32]) -> Vec<Entry> {
        keys.iter()
            .map(|&f| Entry { f, heap_index: 0 })
            .collect()
    }

    fn drain(heap: &mut IndexedMinHeap, nodes: &mut [Entry]) -> Vec<f32> {
        let mut keys = Vec::new();
        while let Some(id) = heap.pop(nodes) {
            keys.push(nodes[id].f);
        }
        keys
    }

    #[test]
    fn test_pop_in_key_order() {
        let mut nodes = entries(&[5.0, 2.0, -1.0, 6.0, 1.0]);
        let mut heap = IndexedMinHeap::new();
        for id in 0..nodes.len() {
            heap.push(&mut nodes, id);
        }

        assert_eq!(heap.len(), 5);
        assert_eq!(drain(&mut heap, &mut nodes), vec![-1.0, 1.0, 2.0, 5.0, 6.0]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_decrease_key_moves_node_to_front() {
        let mut nodes = entries(&[3.0, 4.0, 5.0, 6.0]);
        let mut heap = IndexedMinHeap::new();
        for id in 0..nodes.len() {
            heap.push(&mut nodes, id);
        }

        nodes[3].f = 0.5;
        heap.decrease_key(&mut nodes, 3);
        assert_eq!(heap.pop(&mut nodes), Some(3));
        assert_eq!(heap.pop(&mut nodes), Some(0));
    }

    #[test]
    fn test_decrease_key_ignores_popped_node() {
        let mut nodes = entries(&[1.0, 2.0, 3.0]);
        let mut heap = IndexedMinHeap::new();
        for id in 0..nodes.len() {
            heap.push(&mut nodes, id);
        }

        let popped = heap.pop(&mut nodes).unwrap();
        nodes[popped].f = -10.0;
        heap.decrease_key(&mut nodes, popped);
        assert!(!heap.contains(&nodes, popped));
        assert_eq!(drain(&mut heap, &mut nodes), vec![2.0, 3.0]);
    }

    #[test]
    fn test_heap_indices_track_positions() {
        let mut nodes = entries(&[9.0, 8.0, 7.0, 6.0, 5.0, 4.0]);
        let mut heap = IndexedMinHeap::new();
        for id in 0..nodes.len() {
            heap.push(&mut nodes, id);
        }
        heap.pop(&mut nodes);

        for id in 0..nodes.len() {
            if heap.contains(&nodes, id) {
                assert_eq!(heap.slots[nodes[id].heap_index], id);
            }
        }
    }

    #[test]
    fn test_random_operations_stay_ordered() {
        let mut rng = Pcg32::new(0x5eed, 0xa02bdbf7bb3c0a7);

        for _ in 0..50 {
            let mut nodes = entries(&[0.0; 64]);
            let mut heap = IndexedMinHeap::with_capacity(64);
            let mut queued = Vec::new();
            let mut next_id = 0;

            for _ in 0..200 {
                match rng.gen_range(0..3) {
                    0 if next_id < nodes.len() => {
                        nodes[next_id].f = rng.gen_range(0.0..100.0);
                        heap.push(&mut nodes, next_id);
                        queued.push(next_id);
                        next_id += 1;
                    }
                    1 if !heap.is_empty() => {
                        let id = heap.pop(&mut nodes).unwrap();
                        let min = queued
                            .iter()
                            .map(|&q| nodes[q].f)
                            .fold(f32::INFINITY, f32::min);
                        assert_eq!(nodes[id].f, min);
                        queued.retain(|&q| q != id);
                    }
                    _ if !queued.is_empty() => {
                        let id = queued[rng.gen_range(0..queued.len())];
                        nodes[id].f -= rng.gen_range(0.0..50.0);
                        heap.decrease_key(&mut nodes, id);
                    }
                    _ => {}
                }
            }

            let remaining = drain(&mut heap, &mut nodes);
            assert!(remaining.windows(2).all(|pair| pair[0] <= pair[1]));
            assert_eq!(remaining.len(), queued.len());
        }
    }
}
