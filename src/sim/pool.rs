//! Stop-and-copy object pool
//!
//! Transient objects (particles, notes) are never removed while they are being
//! scanned. Instead they are flagged as destroyed, and `reclaim` copies the
//! survivors into a backing buffer and swaps the two. One pass, no per-element
//! removal, and no invalidated iterators mid-frame.

/// Something a pool can reclaim
pub trait Reclaim {
    /// True once the object should be dropped at the next reclaim
    fn is_reclaimable(&self) -> bool;
}

/// How `add` treats objects already in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolPolicy {
    /// Objects accumulate until reclaimed
    #[default]
    Accumulate,
    /// Only the newest object is kept; adding clears the pool first
    SingleLive,
}

/// Stop-and-copy container
#[derive(Debug, Clone)]
pub struct Pool<T> {
    live: Vec<T>,
    /// Disjoint from `live`; empty between reclaims
    backing: Vec<T>,
    policy: PoolPolicy,
}

impl<T: Reclaim> Default for Pool<T> {
    fn default() -> Self {
        Self::new(PoolPolicy::Accumulate)
    }
}

impl<T: Reclaim> Pool<T> {
    pub fn new(policy: PoolPolicy) -> Self {
        Self {
            live: Vec::new(),
            backing: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: PoolPolicy) {
        self.policy = policy;
    }

    /// Add an object, honouring the pool policy
    pub fn add(&mut self, item: T) {
        if self.policy == PoolPolicy::SingleLive {
            self.live.clear();
        }
        self.live.push(item);
    }

    /// Run `f` over every live object (including ones flagged but not yet reclaimed)
    pub fn for_each(&mut self, f: impl FnMut(&mut T)) {
        self.live.iter_mut().for_each(f);
    }

    /// Drop every reclaimable object
    pub fn reclaim(&mut self) {
        debug_assert!(self.backing.is_empty());
        for item in self.live.drain(..) {
            if !item.is_reclaimable() {
                self.backing.push(item);
            }
        }
        std::mem::swap(&mut self.live, &mut self.backing);
        self.backing.clear();
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.live.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.live.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live objects in insertion order
    pub fn as_slice(&self) -> &[T] {
        &self.live
    }
}

impl<'a, T: Reclaim> IntoIterator for &'a Pool<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Reclaim> IntoIterator for &'a mut Pool<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
