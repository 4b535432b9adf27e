use core::{pin::Pin, ptr::NonNull};

use crate::{BstTree, Compare, Dir, Links, TreeNode};

/// A view into a single entry in a [`BstTree`], which may be either vacant or occupied.
///
/// Looking up an entry descends the tree once; inserting into a vacant entry links the new node
/// at the position found by that descent without searching again.
pub enum Entry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T, C>),
    Occupied(OccupiedEntry<'tree, T, C>),
}

impl<'tree, T, C> Entry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) unsafe fn vacant_root(tree: &'tree mut BstTree<T, C>) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            insert_as: InsertAs::Root,
        })
    }

    pub(crate) unsafe fn vacant_child(
        tree: &'tree mut BstTree<T, C>,
        parent: NonNull<T>,
        dir: Dir,
    ) -> Self {
        Entry::Vacant(VacantEntry {
            tree,
            insert_as: InsertAs::Child { parent, dir },
        })
    }

    pub(crate) unsafe fn occupied(tree: &'tree mut BstTree<T, C>, node: NonNull<T>) -> Self {
        Entry::Occupied(OccupiedEntry { tree, node })
    }
}

pub(crate) enum InsertAs<T: ?Sized> {
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

pub struct VacantEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut BstTree<T, C>,
    pub(crate) insert_as: InsertAs<T>,
}

impl<'tree, T, C> VacantEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
    C: Compare<T::Key>,
{
    /// Inserts `item` at the key associated with this entry.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the key returned by `item.key()` is equivalent to the key used
    /// to retrieve this entry.
    pub unsafe fn insert(self, item: T::Handle) -> Pin<&'tree mut T> {
        let mut ptr = T::into_ptr(item);

        if let InsertAs::Child { parent, dir } = self.insert_as {
            let (key, parent_key) = unsafe { (ptr.as_ref().key(), parent.as_ref().key()) };
            let cmp = self.tree.comparator();
            debug_assert!(
                match dir {
                    Dir::Left => cmp.less(key, parent_key),
                    Dir::Right => cmp.less(parent_key, key),
                },
                "inserted item's key does not belong at this entry"
            );
        }

        unsafe {
            self.tree.link_at(self.insert_as, ptr);
            Pin::new_unchecked(ptr.as_mut())
        }
    }
}

pub struct OccupiedEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) tree: &'tree mut BstTree<T, C>,
    pub(crate) node: NonNull<T>,
}

impl<'tree, T, C> OccupiedEntry<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a reference to the item in the entry.
    pub fn get(&self) -> &T {
        // SAFETY: `self.tree` is mutably borrowed for as long as `self` lives.
        unsafe { self.node.as_ref() }
    }

    /// Returns a pinned mutable reference to the item in the entry.
    ///
    /// # Safety
    ///
    /// The caller must ensure that neither the links nor the key of the mutably borrowed item are
    /// modified, as doing so may result in undefined behavior.
    pub unsafe fn get_mut(&mut self) -> Pin<&mut T> {
        // SAFETY: `self.tree` is mutably borrowed for as long as `self` lives, and `self.node` is
        // guaranteed pinned by contract with `Linked`.
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a pinned mutable reference to its item, borrowed for `'tree`.
    ///
    /// # Safety
    ///
    /// The same requirements as [`OccupiedEntry::get_mut`] apply.
    pub unsafe fn into_mut(self) -> Pin<&'tree mut T> {
        let mut node = self.node;
        // SAFETY: `self.tree` is mutably borrowed for `'tree`.
        unsafe { Pin::new_unchecked(node.as_mut()) }
    }

    /// Inserts a new item into the entry, returning the previous item.
    ///
    /// The new item takes over the old item's position in the tree.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `item`'s key is equivalent to the key of the existing item.
    pub unsafe fn insert(&mut self, item: T::Handle) -> T::Handle {
        let new_ptr = T::into_ptr(item);
        let old_ptr = self.node;

        // Point this entry at the new item.
        self.node = new_ptr;

        unsafe {
            // Read the old item's links.
            let old_links = self.tree.links(old_ptr);
            let parent = old_links.parent();
            let left = old_links.left();
            let right = old_links.right();

            // Link the new item into the tree.
            self.tree
                .replace_child_or_set_root(parent, old_ptr, Some(new_ptr));
            self.tree.maybe_set_parent(left, Some(new_ptr));
            self.tree.maybe_set_parent(right, Some(new_ptr));

            let new_links = self.tree.links_mut(new_ptr);
            new_links.set_parent(parent);
            new_links.set_left(left);
            new_links.set_right(right);

            // Deinit the old item's links.
            self.tree.links_mut(old_ptr).clear();

            T::from_ptr(old_ptr)
        }
    }

    /// Removes and returns the item pointed to by this entry.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}
