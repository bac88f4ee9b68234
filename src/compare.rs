//! Comparators for the ordered containers.
//!
//! A comparator answers one question, "does `a` strictly precede `b`?", and
//! must be a strict weak ordering. Equivalence is derived from it:
//! `!less(a, b) && !less(b, a)`.

/// Strict "precedes" relation over `T`.
pub trait Compare<T: ?Sized> {
    fn less(&self, a: &T, b: &T) -> bool;

    fn equivalent(&self, a: &T, b: &T) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

/// Ascending order by `Ord`. The default comparator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Less;

impl<T: Ord + ?Sized> Compare<T> for Less {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Descending order by `Ord`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Greater;

impl<T: Ord + ?Sized> Compare<T> for Greater {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

/// Adapts a caller-supplied `(a, b) -> bool` function.
#[derive(Copy, Clone, Default)]
pub struct FnCompare<F>(pub F);

impl<T: ?Sized, F> Compare<T> for FnCompare<F>
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}

impl<F> core::fmt::Debug for FnCompare<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnCompare(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_is_derived() {
        assert!(Less.less(&1, &2));
        assert!(!Less.less(&2, &2));
        assert!(Less.equivalent(&2, &2));
        assert!(Greater.less(&3, &1));
        assert!(Compare::<str>::less(&Less, "a", "b"));

        let by_len = FnCompare(|a: &String, b: &String| a.len() < b.len());
        assert!(by_len.less(&"a".to_string(), &"bb".to_string()));
        assert!(by_len.equivalent(&"ab".to_string(), &"cd".to_string()));
    }
}
