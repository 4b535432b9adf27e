/// A strict weak ordering over keys of type `K`.
///
/// Two keys `a` and `b` are considered equivalent when neither `less(a, b)` nor `less(b, a)`
/// holds, so keys never need to implement `PartialEq`.
pub trait Compare<K: ?Sized> {
    /// Returns `true` if `a` is ordered strictly before `b`.
    fn less(&self, a: &K, b: &K) -> bool;

    /// Returns `true` if neither key is ordered before the other.
    #[inline]
    fn equivalent(&self, a: &K, b: &K) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

/// The default comparator, ordering keys by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Less;

impl<K: Ord + ?Sized> Compare<K> for Less {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        a < b
    }
}

impl<K: ?Sized, F> Compare<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_uses_ord() {
        assert!(Less.less(&1, &2));
        assert!(!Less.less(&2, &1));
        assert!(Less.equivalent(&3, &3));
        assert!(Less.less("apple", "banana"));
    }

    #[test]
    fn closures_compare() {
        let greater = |a: &i32, b: &i32| a > b;
        assert!(greater.less(&2, &1));
        assert!(!greater.less(&1, &2));

        // Case-insensitive keys are equivalent without being equal.
        let nocase = |a: &String, b: &String| a.to_lowercase() < b.to_lowercase();
        assert!(nocase.equivalent(&"Key".to_owned(), &"KEY".to_owned()));
    }
}
