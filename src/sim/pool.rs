//! Reusable object pools for high-churn entities
//!
//! Instances move in and out of the pool by value: `acquire` hands ownership
//! to the caller, `release` takes it back. A released instance cannot be
//! released again or used afterwards without the borrow checker objecting.

/// An entity that can be recycled through an [`ObjectPool`]
///
/// `reset` must overwrite every field from `params`; the pool never clears
/// anything itself.
pub trait Poolable: Default {
    type Params;

    fn reset(&mut self, params: Self::Params);
}

/// Acquire/release accounting for leak checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances handed out
    pub acquired: u64,
    /// Instances returned
    pub released: u64,
    /// Instances created because the free list was empty
    pub allocated: u64,
}

impl PoolStats {
    /// Instances currently outside the pool
    pub fn outstanding(&self) -> u64 {
        self.acquired - self.released
    }
}

#[derive(Debug)]
pub struct ObjectPool<T: Poolable> {
    free: Vec<T>,
    stats: PoolStats,
}

impl<T: Poolable> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    /// Take an instance (recycled or fresh) and reset it from `params`
    pub fn acquire(&mut self, params: T::Params) -> T {
        let mut obj = match self.free.pop() {
            Some(obj) => obj,
            None => {
                self.stats.allocated += 1;
                T::default()
            }
        };
        obj.reset(params);
        self.stats.acquired += 1;
        obj
    }

    /// Return an instance for reuse
    pub fn release(&mut self, obj: T) {
        self.stats.released += 1;
        self.free.push(obj);
    }

    /// Release every instance yielded by `objs`
    pub fn release_all(&mut self, objs: impl IntoIterator<Item = T>) {
        for obj in objs {
            self.release(obj);
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

/// Split `items` by a removal mask, releasing removed items to `pool`.
///
/// `removed[i]` refers to `items[i]`; entries past the end of the mask are kept.
pub fn release_marked<T: Poolable>(items: &mut Vec<T>, removed: &[bool], pool: &mut ObjectPool<T>) {
    if !removed.iter().any(|&r| r) {
        return;
    }
    let old = std::mem::take(items);
    items.reserve(old.len());
    for (i, item) in old.into_iter().enumerate() {
        if removed.get(i).copied().unwrap_or(false) {
            pool.release(item);
        } else {
            items.push(item);
        }
    }
}

/// Release every item for which `dead` returns true, keeping order
pub fn release_where<T: Poolable>(
    items: &mut Vec<T>,
    pool: &mut ObjectPool<T>,
    mut dead: impl FnMut(&T) -> bool,
) {
    let old = std::mem::take(items);
    items.reserve(old.len());
    for item in old {
        if dead(&item) {
            pool.release(item);
        } else {
            items.push(item);
        }
    }
}
