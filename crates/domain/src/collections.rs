//! Pure list-patching functions applied at settlement.
//!
//! Every function takes the canonical list by shared reference and returns a
//! new list; the input is never touched. `replace_by_id` and `remove_by_id`
//! return `None` when the id is absent so callers can treat a reconcile miss
//! as a tolerated no-op.

/// An entity addressable by id inside a canonical list.
pub trait Identified {
    type Id: PartialEq;

    fn id(&self) -> &Self::Id;
}

/// Position of the entity with `id`, if present.
fn position_of<T: Identified>(items: &[T], id: &T::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Borrow the entity with `id`, if present.
pub fn find_by_id<'a, T: Identified>(items: &'a [T], id: &T::Id) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

pub fn contains_id<T: Identified>(items: &[T], id: &T::Id) -> bool {
    position_of(items, id).is_some()
}

/// Replace the entity sharing `item`'s id, keeping its position.
///
/// Returns `None` if no entity with that id exists.
pub fn replace_by_id<T: Identified + Clone>(items: &[T], item: T) -> Option<Vec<T>> {
    let index = position_of(items, item.id())?;
    let mut next = items.to_vec();
    next[index] = item;
    Some(next)
}

/// Remove the entity with `id`, preserving the order of the remainder.
///
/// Returns `None` if no entity with that id exists.
pub fn remove_by_id<T: Identified + Clone>(items: &[T], id: &T::Id) -> Option<Vec<T>> {
    position_of(items, id)?;
    Some(items.iter().filter(|item| item.id() != id).cloned().collect())
}

/// Replace the entity sharing `item`'s id, or append it when absent.
pub fn upsert_by_id<T: Identified + Clone>(items: &[T], item: T) -> Vec<T> {
    match position_of(items, item.id()) {
        Some(index) => {
            let mut next = items.to_vec();
            next[index] = item;
            next
        }
        None => {
            let mut next = Vec::with_capacity(items.len() + 1);
            next.extend_from_slice(items);
            next.push(item);
            next
        }
    }
}
