/// Derived value memoized against a bonus tree version.
///
/// The value is recomputed only when the version passed to
/// [`VersionedCache::get_or_update`] differs from the stored stamp.
#[derive(Clone, Debug)]
pub struct VersionedCache<T> {
    stamp: Option<i64>,
    value: Option<T>,
}

impl<T: Clone> VersionedCache<T> {
    pub fn new() -> Self {
        Self {
            stamp: None,
            value: None,
        }
    }

    pub fn is_fresh(&self, version: i64) -> bool {
        self.stamp == Some(version) && self.value.is_some()
    }

    pub fn get_or_update(&mut self, version: i64, compute: impl FnOnce() -> T) -> T {
        if let (Some(stamp), Some(value)) = (self.stamp, &self.value) {
            if stamp == version {
                return value.clone();
            }
        }
        let value = compute();
        self.value = Some(value.clone());
        self.stamp = Some(version);
        value
    }

    pub fn invalidate(&mut self) {
        self.stamp = None;
        self.value = None;
    }
}

impl<T: Clone> Default for VersionedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
