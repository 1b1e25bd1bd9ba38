//! Fixed-size ring of per-frame resources
//!
//! The ring length is the number of frames that may be in flight at once. Slots
//! are created together, never resized, and dropped together; the active index
//! only ever moves forward by one.

use std::num::NonZeroUsize;

/// Round-robin collection of frame slots
pub struct FrameRing<S> {
    slots: Box<[S]>,
    index: usize,
}

impl<S> FrameRing<S> {
    /// Create exactly `count` slots with `create(slot_index)`
    ///
    /// The first failure aborts construction; slots built so far are dropped
    /// (and release their resources) before the error is returned.
    pub fn init<E, F>(count: NonZeroUsize, create: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<S, E>,
    {
        let slots = (0..count.get()).map(create).collect::<Result<Vec<_>, E>>()?;
        Ok(Self {
            slots: slots.into_boxed_slice(),
            index: 0,
        })
    }

    /// Slot at the active index
    pub fn current(&self) -> &S {
        &self.slots[self.index]
    }

    /// Mutable slot at the active index
    pub fn current_mut(&mut self) -> &mut S {
        &mut self.slots[self.index]
    }

    /// Active index, always in `0..len()`
    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next slot, wrapping at the end
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.slots.len();
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a ring holds at least one slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot by index
    pub fn slot(&self, index: usize) -> Option<&S> {
        self.slots.get(index)
    }

    /// All slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked {
        id: usize,
        live: Rc<Cell<usize>>,
    }

    impl Tracked {
        fn new(id: usize, live: &Rc<Cell<usize>>) -> Self {
            live.set(live.get() + 1);
            Self { id, live: Rc::clone(live) }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    fn count(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_init_creates_exactly_n_slots() {
        let live = Rc::new(Cell::new(0));
        let ring: FrameRing<Tracked> = FrameRing::init(count(3), |i| Ok::<_, ()>(Tracked::new(i, &live))).unwrap();

        assert_eq!(ring.len(), 3);
        assert_eq!(live.get(), 3);
        assert_eq!(ring.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(ring.index(), 0);
    }

    #[test]
    fn test_index_cycles_modulo_len() {
        for n in 1..=4 {
            let mut ring = FrameRing::init(count(n), Ok::<usize, ()>).unwrap();
            let mut seen = Vec::new();
            for _ in 0..(3 * n) {
                seen.push(ring.index());
                assert_eq!(*ring.current(), ring.index());
                ring.advance();
            }
            let expected: Vec<_> = (0..3 * n).map(|i| i % n).collect();
            assert_eq!(seen, expected);
        }
    }

    #[test]
    fn test_failed_init_releases_partial_slots() {
        let live = Rc::new(Cell::new(0));
        let result = FrameRing::init(count(4), |i| {
            if i == 2 {
                Err("slot 2 failed")
            } else {
                Ok(Tracked::new(i, &live))
            }
        });

        assert_eq!(result.err(), Some("slot 2 failed"));
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_drop_releases_all_slots() {
        let live = Rc::new(Cell::new(0));
        let ring = FrameRing::init(count(2), |i| Ok::<_, ()>(Tracked::new(i, &live))).unwrap();
        assert_eq!(live.get(), 2);
        drop(ring);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_current_mut_targets_active_slot() {
        let mut ring = FrameRing::init(count(2), |_| Ok::<u32, ()>(0)).unwrap();
        ring.advance();
        *ring.current_mut() = 7;
        assert_eq!(ring.slot(0), Some(&0));
        assert_eq!(ring.slot(1), Some(&7));
        assert_eq!(ring.slot(2), None);
    }
}
