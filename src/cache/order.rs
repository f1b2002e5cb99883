//! Touch Order Module
//!
//! Arena-backed doubly linked sequence. Entries live in a `Vec` of slots and
//! are linked by index, so a [`Handle`] stays valid until its entry is removed
//! and there are no ownership cycles.
//!
//! - Front = least recently inserted or refreshed
//! - Back = most recently inserted or refreshed

/// Null link.
const NIL: usize = usize::MAX;

// == Handle ==
/// Stable position of an entry in a [`TouchOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
}

// == Touch Order ==
/// Ordered sequence with O(1) append, removal by handle and move-to-back.
#[derive(Debug)]
pub struct TouchOrder<T> {
    slots: Vec<Slot<T>>,
    head: usize,
    tail: usize,
    /// Head of the free-slot chain, linked through `next`
    free: usize,
    len: usize,
}

impl<T> Default for TouchOrder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TouchOrder<T> {
    // == Constructor ==
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
            len: 0,
        }
    }

    /// Creates an empty sequence with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Push Back ==
    /// Appends `value` at the back and returns its handle.
    pub fn push_back(&mut self, value: T) -> Handle {
        let idx = self.alloc(value);
        self.link_back(idx);
        self.len += 1;
        Handle(idx)
    }

    // == Front ==
    /// Returns the oldest entry without removing it.
    pub fn front(&self) -> Option<(Handle, &T)> {
        if self.head == NIL {
            return None;
        }
        self.slots[self.head]
            .value
            .as_ref()
            .map(|value| (Handle(self.head), value))
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.head == NIL {
            return None;
        }
        self.remove(Handle(self.head))
    }

    // == Remove ==
    /// Removes the entry at `handle`, freeing its slot.
    ///
    /// Returns None if the handle does not point at a live entry.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let idx = handle.0;
        let value = self.slots.get_mut(idx)?.value.take()?;
        self.unlink(idx);
        self.slots[idx].next = self.free;
        self.free = idx;
        self.len -= 1;
        Some(value)
    }

    // == Move To Back ==
    /// Repositions the entry at `handle` to the back.
    pub fn move_to_back(&mut self, handle: Handle) {
        let idx = handle.0;
        if idx == self.tail || !self.is_live(idx) {
            return;
        }
        self.unlink(idx);
        self.link_back(idx);
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0)?.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)?.value.as_mut()
    }

    /// Iterates from front (oldest) to back (newest).
    #[allow(dead_code)]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            current: self.head,
        }
    }

    // == Retain ==
    /// Removes every entry for which `keep` returns false, front to back.
    ///
    /// Returns the removed entries in sequence order.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = Vec::new();
        let mut current = self.head;
        while current != NIL {
            let next = self.slots[current].next;
            let drop_it = self.slots[current]
                .value
                .as_ref()
                .is_some_and(|value| !keep(value));
            if drop_it {
                removed.extend(self.remove(Handle(current)));
            }
            current = next;
        }
        removed
    }

    /// Drops every entry and releases the arena.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // --- Internal linked-list operations ---

    fn is_live(&self, idx: usize) -> bool {
        self.slots.get(idx).is_some_and(|slot| slot.value.is_some())
    }

    /// Takes a slot from the free chain, or grows the arena.
    fn alloc(&mut self, value: T) -> usize {
        let slot = Slot {
            value: Some(value),
            prev: NIL,
            next: NIL,
        };
        if self.free != NIL {
            let idx = self.free;
            self.free = self.slots[idx].next;
            self.slots[idx] = slot;
            idx
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        }
    }

    /// Detaches `idx` from its neighbours (does NOT free the slot).
    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;

        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn link_back(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = NIL;

        if self.tail != NIL {
            self.slots[self.tail].next = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
    }
}

/// Front-to-back iterator over a [`TouchOrder`].
#[allow(dead_code)]
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    current: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NIL {
            return None;
        }
        let idx = self.current;
        let slot = &self.slots[idx];
        self.current = slot.next;
        slot.value.as_ref().map(|value| (Handle(idx), value))
    }
}
