use crate::arith::Element;

/// Direction of a register sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    Forward,
    Reverse,
}

/// Load slots caching aligned chunks of `load_vsize` samples
///
/// A miss loads into the slot under the cursor. Forward sweeps load then
/// advance, reverse sweeps step back first, so a monotonic sweep always
/// overwrites the chunk it touched longest ago.
#[derive(Debug, Clone)]
pub struct DataRegister<D> {
    load_vsize: usize,
    /// Chunk index held by each slot
    slots: Vec<Option<usize>>,
    data: Vec<D>,
    cursor: usize,
    /// Chunks that must not be evicted, inclusive
    pinned: Option<(usize, usize)>,
    loads: u64,
}

impl<D: Element> DataRegister<D> {
    pub fn new(load_vsize: usize, register_loads: usize) -> Self {
        Self {
            load_vsize,
            slots: vec![None; register_loads],
            data: vec![D::default(); load_vsize * register_loads],
            cursor: 0,
            pinned: None,
            loads: 0,
        }
    }

    /// Drop every resident chunk, keeping the load count
    pub fn invalidate(&mut self) {
        self.slots.fill(None);
        self.cursor = 0;
        self.pinned = None;
    }

    /// Protect the chunks covering samples `lo..=hi` from eviction
    pub fn pin(&mut self, lo: usize, hi: usize) {
        self.pinned = Some((lo / self.load_vsize, hi / self.load_vsize));
    }

    pub fn loads(&self) -> u64 {
        self.loads
    }

    /// Read sample `index` of `source`, loading its chunk on a miss.
    /// Samples past the end of `source` read as zero.
    pub fn read(&mut self, source: &[D], index: usize, sweep: Sweep) -> D {
        let chunk = index / self.load_vsize;
        let slot = match self.slots.iter().position(|s| *s == Some(chunk)) {
            Some(slot) => slot,
            None => self.load(source, chunk, sweep),
        };
        self.data[slot * self.load_vsize + index % self.load_vsize]
    }

    /// Make samples `lo..=hi` resident, walking in `sweep` order
    pub fn prefetch(&mut self, source: &[D], lo: usize, hi: usize, sweep: Sweep) {
        let first = lo / self.load_vsize;
        let last = hi / self.load_vsize;
        let mut touch = |chunk: usize| {
            if !self.slots.contains(&Some(chunk)) {
                self.load(source, chunk, sweep);
            }
        };
        match sweep {
            Sweep::Forward => (first..=last).for_each(&mut touch),
            Sweep::Reverse => (first..=last).rev().for_each(&mut touch),
        }
    }

    fn is_pinned(&self, slot: usize) -> bool {
        match (self.pinned, self.slots[slot]) {
            (Some((lo, hi)), Some(chunk)) => (lo..=hi).contains(&chunk),
            _ => false,
        }
    }

    fn step(&mut self, sweep: Sweep) -> usize {
        let n = self.slots.len();
        match sweep {
            Sweep::Forward => {
                let slot = self.cursor;
                self.cursor = (self.cursor + 1) % n;
                slot
            }
            Sweep::Reverse => {
                self.cursor = (self.cursor + n - 1) % n;
                self.cursor
            }
        }
    }

    fn load(&mut self, source: &[D], chunk: usize, sweep: Sweep) -> usize {
        let n = self.slots.len();
        let mut slot = self.step(sweep);
        for _ in 1..n {
            if !self.is_pinned(slot) {
                break;
            }
            slot = self.step(sweep);
        }

        let start = chunk * self.load_vsize;
        let dest = &mut self.data[slot * self.load_vsize..(slot + 1) * self.load_vsize];
        for (i, d) in dest.iter_mut().enumerate() {
            *d = source.get(start + i).copied().unwrap_or_default();
        }
        self.slots[slot] = Some(chunk);
        self.loads += 1;
        slot
    }
}
