//! Intrusive, insertion-ordered registries of `'static` entries.
//!
//! Entries carry their own [`Link`], so registering one never allocates. Appending goes through a
//! tail pointer and removal through the entry's back-pointer to its predecessor, making both
//! O(1). Iteration is read-only and restartable.
//!
//! Registration is meant to happen from a single known entry point before tests start running
//! (typically before the scheduler is started). The links are atomics only so that entries can be
//! placed in `static`s; concurrent registration is not supported.

use core::{
    fmt,
    fmt::{Display, Formatter},
    marker::PhantomData,
    ptr,
    sync::atomic::{AtomicBool, AtomicPtr, Ordering},
};

/// Errors returned when modifying a registry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RegistryError {
    /// The entry is already linked into a registry.
    AlreadyRegistered,
    /// The entry is not linked into this registry.
    NotRegistered,
}

impl Display for RegistryError {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match self {
            Self::AlreadyRegistered => formatter.write_str("entry is already registered"),
            Self::NotRegistered => formatter.write_str("entry is not registered"),
        }
    }
}

impl core::error::Error for RegistryError {}

/// The links embedded in every registry entry.
pub struct Link<T> {
    next: AtomicPtr<T>,
    prev: AtomicPtr<T>,
    linked: AtomicBool,
}

impl<T> Link<T> {
    /// Creates an unlinked link.
    pub const fn new() -> Self {
        Self {
            next: AtomicPtr::new(ptr::null_mut()),
            prev: AtomicPtr::new(ptr::null_mut()),
            linked: AtomicBool::new(false),
        }
    }

    /// Returns whether the owning entry is currently in a registry.
    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }
}

impl<T> Default for Link<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("Link")
            .field("linked", &self.is_linked())
            .finish()
    }
}

/// Types that can be stored in a [`List`].
pub trait Linked: Sized + Sync + 'static {
    /// The link embedded in this entry.
    fn link(&self) -> &Link<Self>;
}

/// An ordered registry of `'static` entries.
pub struct List<T: Linked> {
    head: AtomicPtr<T>,
    tail: AtomicPtr<T>,
}

impl<T: Linked> List<T> {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
            tail: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Appends `entry` to the end of the registry.
    pub fn register(&self, entry: &'static T) -> Result<(), RegistryError> {
        let link = entry.link();
        if link
            .linked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RegistryError::AlreadyRegistered);
        }

        let entry_ptr = as_ptr(entry);
        let tail = self.tail.load(Ordering::Acquire);
        link.next.store(ptr::null_mut(), Ordering::Release);
        link.prev.store(tail, Ordering::Release);
        // SAFETY: Every pointer stored in this list was created from a `&'static T`.
        match unsafe { tail.as_ref() } {
            Some(tail) => tail.link().next.store(entry_ptr, Ordering::Release),
            None => self.head.store(entry_ptr, Ordering::Release),
        }
        self.tail.store(entry_ptr, Ordering::Release);

        Ok(())
    }

    /// Removes `entry` from the registry, wherever it is.
    ///
    /// The entry must belong to this registry. Entries at either end of another registry are
    /// detected and rejected; an entry in the middle of another registry is not, since its links
    /// do not name the registry they belong to.
    pub fn unregister(&self, entry: &'static T) -> Result<(), RegistryError> {
        let link = entry.link();
        if !link.is_linked() {
            return Err(RegistryError::NotRegistered);
        }

        let entry_ptr = as_ptr(entry);
        let prev = link.prev.load(Ordering::Acquire);
        let next = link.next.load(Ordering::Acquire);
        if (prev.is_null() && self.head.load(Ordering::Acquire) != entry_ptr)
            || (next.is_null() && self.tail.load(Ordering::Acquire) != entry_ptr)
        {
            return Err(RegistryError::NotRegistered);
        }

        // SAFETY: Every pointer stored in this list was created from a `&'static T`.
        match unsafe { prev.as_ref() } {
            Some(prev) => prev.link().next.store(next, Ordering::Release),
            None => self.head.store(next, Ordering::Release),
        }
        // SAFETY: As above.
        match unsafe { next.as_ref() } {
            Some(next) => next.link().prev.store(prev, Ordering::Release),
            None => self.tail.store(prev, Ordering::Release),
        }

        link.next.store(ptr::null_mut(), Ordering::Release);
        link.prev.store(ptr::null_mut(), Ordering::Release);
        link.linked.store(false, Ordering::Release);

        Ok(())
    }

    /// Returns an iterator over the entries, in registration order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.load(Ordering::Acquire),
            list: PhantomData,
        }
    }

    /// Returns the number of registered entries.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns whether no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }
}

impl<T: Linked> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Linked> IntoIterator for &'a List<T> {
    type Item = &'static T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over a [`List`], in registration order.
pub struct Iter<'a, T: Linked> {
    next: *mut T,
    list: PhantomData<&'a List<T>>,
}

impl<T: Linked> Iterator for Iter<'_, T> {
    type Item = &'static T;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: Every pointer stored in a list was created from a `&'static T`.
        let current: &'static T = unsafe { self.next.as_ref() }?;
        self.next = current.link().next.load(Ordering::Acquire);
        Some(current)
    }
}

fn as_ptr<T>(entry: &'static T) -> *mut T {
    ptr::from_ref(entry).cast_mut()
}

#[cfg(test)]
mod tests {
    use super::{Link, Linked, List, RegistryError};
    use claims::{assert_err_eq, assert_ok};
    use std::vec::Vec;

    struct Entry {
        id: u32,
        link: Link<Entry>,
    }

    impl Entry {
        const fn new(id: u32) -> Self {
            Self {
                id,
                link: Link::new(),
            }
        }
    }

    impl Linked for Entry {
        fn link(&self) -> &Link<Self> {
            &self.link
        }
    }

    fn ids(list: &List<Entry>) -> Vec<u32> {
        list.iter().map(|entry| entry.id).collect()
    }

    #[test]
    fn empty() {
        let list = List::<Entry>::new();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(ids(&list).is_empty());
    }

    #[test]
    fn registration_order() {
        static A: Entry = Entry::new(1);
        static B: Entry = Entry::new(2);
        static C: Entry = Entry::new(3);
        let list = List::new();

        assert_ok!(list.register(&A));
        assert_ok!(list.register(&B));
        assert_ok!(list.register(&C));

        assert_eq!(ids(&list), [1, 2, 3]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn iteration_is_restartable() {
        static A: Entry = Entry::new(1);
        static B: Entry = Entry::new(2);
        let list = List::new();
        assert_ok!(list.register(&A));
        assert_ok!(list.register(&B));

        assert_eq!(ids(&list), [1, 2]);
        assert_eq!(ids(&list), [1, 2]);
    }

    #[test]
    fn register_twice() {
        static A: Entry = Entry::new(1);
        let list = List::new();

        assert_ok!(list.register(&A));
        assert_err_eq!(list.register(&A), RegistryError::AlreadyRegistered);
        assert_eq!(ids(&list), [1]);
    }

    #[test]
    fn unregister_middle() {
        static A: Entry = Entry::new(1);
        static B: Entry = Entry::new(2);
        static C: Entry = Entry::new(3);
        let list = List::new();
        assert_ok!(list.register(&A));
        assert_ok!(list.register(&B));
        assert_ok!(list.register(&C));

        assert_ok!(list.unregister(&B));

        assert_eq!(ids(&list), [1, 3]);
        assert!(!B.link.is_linked());
    }

    #[test]
    fn unregister_head_and_tail() {
        static A: Entry = Entry::new(1);
        static B: Entry = Entry::new(2);
        static C: Entry = Entry::new(3);
        static D: Entry = Entry::new(4);
        let list = List::new();
        assert_ok!(list.register(&A));
        assert_ok!(list.register(&B));
        assert_ok!(list.register(&C));

        assert_ok!(list.unregister(&A));
        assert_ok!(list.unregister(&C));
        assert_eq!(ids(&list), [2]);

        // The tail must have moved back, so appending still works.
        assert_ok!(list.register(&D));
        assert_eq!(ids(&list), [2, 4]);
    }

    #[test]
    fn unregister_all_then_register() {
        static A: Entry = Entry::new(1);
        let list = List::new();
        assert_ok!(list.register(&A));

        assert_ok!(list.unregister(&A));
        assert!(list.is_empty());

        assert_ok!(list.register(&A));
        assert_eq!(ids(&list), [1]);
    }

    #[test]
    fn unregister_unknown() {
        static A: Entry = Entry::new(1);
        let list = List::<Entry>::new();

        assert_err_eq!(list.unregister(&A), RegistryError::NotRegistered);
    }

    #[test]
    fn unregister_from_other_list() {
        static A: Entry = Entry::new(1);
        let first = List::new();
        let second = List::new();
        assert_ok!(first.register(&A));

        assert_err_eq!(second.unregister(&A), RegistryError::NotRegistered);
        assert_eq!(ids(&first), [1]);
        assert_ok!(first.unregister(&A));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            std::format!("{}", RegistryError::AlreadyRegistered),
            "entry is already registered"
        );
        assert_eq!(
            std::format!("{}", RegistryError::NotRegistered),
            "entry is not registered"
        );
    }
}
