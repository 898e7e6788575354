//! One-or-many alternatives
//!
//! Rules, key rules and range specs may each be given as a single value or as
//! a list of alternatives, of which only one has to succeed.

use std::slice;

/// A single value or a list of alternative values (OR semantics)
#[derive(Debug, Clone)]
pub enum Alternatives<T> {
    /// Exactly one alternative
    One(T),
    /// Any number of alternatives, tried in order
    Many(Vec<T>),
}

/// Values that can be "empty" at an alternative position
pub trait Emptiable {
    fn is_empty(&self) -> bool;
}

impl<T> Alternatives<T> {
    /// Normalized view: always a list
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => slice::from_ref(item),
            Self::Many(items) => items,
        }
    }

    /// Number of alternatives
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Iterate over alternatives in order
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<T: Emptiable> Alternatives<T> {
    /// True for an empty list or a single empty alternative
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(item) => item.is_empty(),
            Self::Many(items) => items.is_empty(),
        }
    }
}

impl<T> From<T> for Alternatives<T> {
    fn from(item: T) -> Self {
        Self::One(item)
    }
}

impl<T> From<Vec<T>> for Alternatives<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items)
    }
}

impl<'a, T> IntoIterator for &'a Alternatives<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(bool);

    impl Emptiable for Marker {
        fn is_empty(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_one_normalizes_to_single_element() {
        let alts: Alternatives<i32> = 7.into();
        assert_eq!(alts.as_slice(), &[7]);
        assert_eq!(alts.len(), 1);
    }

    #[test]
    fn test_many_keeps_order() {
        let alts: Alternatives<i32> = vec![3, 1, 2].into();
        assert_eq!(alts.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(alts.len(), 3);
    }

    #[test]
    fn test_emptiness() {
        assert!(Alternatives::<Marker>::Many(Vec::new()).is_empty());
        assert!(Alternatives::One(Marker(true)).is_empty());
        assert!(!Alternatives::One(Marker(false)).is_empty());
        // a list holding an empty alternative is still a real list
        assert!(!Alternatives::Many(vec![Marker(true)]).is_empty());
    }
}
