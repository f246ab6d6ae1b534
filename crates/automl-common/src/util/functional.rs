//! Set operations over collections of identifiers.

use std::collections::BTreeSet;

/// Items present in every collection, in sorted order.
///
/// Intersecting zero collections yields nothing.
pub fn intersection<I, C, T>(collections: I) -> BTreeSet<T>
where
    I: IntoIterator<Item = C>,
    C: IntoIterator<Item = T>,
    T: Ord,
{
    let mut iter = collections.into_iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };
    let mut acc: BTreeSet<T> = first.into_iter().collect();
    for collection in iter {
        let next: BTreeSet<T> = collection.into_iter().collect();
        acc.retain(|item| next.contains(item));
    }
    acc
}

/// Items present in any collection, in sorted order.
pub fn union<I, C, T>(collections: I) -> BTreeSet<T>
where
    I: IntoIterator<Item = C>,
    C: IntoIterator<Item = T>,
    T: Ord,
{
    collections.into_iter().flatten().collect()
}
