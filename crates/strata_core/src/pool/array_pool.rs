use std::sync::Mutex;

/// Pool of reusable `Vec<T>` buffers, shelved by power-of-two capacity class.
///
/// `rent(min_capacity)` returns a cleared buffer with at least the requested
/// capacity; `give_back` shelves it for reuse. Returned buffers are always
/// cleared, which drops any element payloads they still hold. Returning the
/// same buffer twice is a programming error and is caught by a debug-only
/// guard rather than runtime recovery.
#[derive(Debug)]
pub struct ArrayPool<T> {
    shelves: Mutex<Shelves<T>>,
}

#[derive(Debug)]
struct Shelves<T> {
    // Index = log2 of the class capacity; every buffer on shelf `c` has
    // capacity >= 1 << c.
    by_class: Vec<Vec<Vec<T>>>,
    #[cfg(debug_assertions)]
    shelved_ptrs: std::collections::HashSet<usize>,
}

fn class_for_request(min_capacity: usize) -> usize {
    min_capacity.max(1).next_power_of_two().trailing_zeros() as usize
}

fn class_for_return(capacity: usize) -> usize {
    // Largest class whose capacity the buffer still satisfies.
    (usize::BITS - 1 - capacity.leading_zeros()) as usize
}

impl<T> ArrayPool<T> {
    pub fn new() -> Self {
        Self {
            shelves: Mutex::new(Shelves {
                by_class: Vec::new(),
                #[cfg(debug_assertions)]
                shelved_ptrs: std::collections::HashSet::new(),
            }),
        }
    }

    /// Take a cleared buffer with capacity >= `min_capacity`.
    pub fn rent(&self, min_capacity: usize) -> Vec<T> {
        let class = class_for_request(min_capacity);
        let mut guard = self.shelves.lock().expect("array pool poisoned");
        let shelves = &mut *guard;
        let upper = shelves.by_class.len();
        for c in class..upper {
            if let Some(buffer) = shelves.by_class[c].pop() {
                #[cfg(debug_assertions)]
                shelves.shelved_ptrs.remove(&(buffer.as_ptr() as usize));
                debug_assert!(buffer.is_empty());
                return buffer;
            }
        }
        // Shelving rounds capacity down, so a non-power-of-two buffer may sit
        // one class below the requested one and still be large enough. Any
        // satisfying buffer is at most one class down, since
        // floor(log2 cap) >= ceil(log2 min) - 1 whenever cap >= min.
        if class > 0 && class - 1 < upper {
            let shelf = &mut shelves.by_class[class - 1];
            if let Some(found) = shelf
                .iter()
                .position(|buffer| buffer.capacity() >= min_capacity)
            {
                let buffer = shelf.swap_remove(found);
                #[cfg(debug_assertions)]
                shelves.shelved_ptrs.remove(&(buffer.as_ptr() as usize));
                debug_assert!(buffer.is_empty());
                return buffer;
            }
        }
        drop(guard);
        Vec::with_capacity(1 << class)
    }

    /// Return a buffer for reuse. Contents are cleared (dropping elements).
    pub fn give_back(&self, mut buffer: Vec<T>) {
        buffer.clear();
        if buffer.capacity() == 0 {
            return;
        }
        let class = class_for_return(buffer.capacity());
        let mut shelves = self.shelves.lock().expect("array pool poisoned");
        #[cfg(debug_assertions)]
        {
            let inserted = shelves.shelved_ptrs.insert(buffer.as_ptr() as usize);
            debug_assert!(inserted, "buffer returned to the pool twice");
        }
        if shelves.by_class.len() <= class {
            shelves.by_class.resize_with(class + 1, Vec::new);
        }
        shelves.by_class[class].push(buffer);
    }

    /// Total number of shelved buffers (test/introspection aid).
    pub fn shelved(&self) -> usize {
        let shelves = self.shelves.lock().expect("array pool poisoned");
        shelves.by_class.iter().map(|shelf| shelf.len()).sum()
    }
}

impl<T> Default for ArrayPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
