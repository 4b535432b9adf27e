use core::{fmt, marker::PhantomData, pin::Pin};

use crate::{successor, BstTree, Less, Link, Links, TreeNode};

/// A forward-only cursor over a [`BstTree`].
///
/// A cursor points either to an element of the tree or past the maximum element (the "end").
/// Advancing the end cursor leaves it at the end. Two cursors are equal when they point to the
/// same node, or are both at the end.
///
/// The cursor borrows the tree, so it cannot be held across a structural change.
pub struct Cursor<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    ptr: Link<T>,
    phantom: PhantomData<&'tree T>,
}

impl<'tree, T> Cursor<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn at(ptr: Link<T>) -> Cursor<'tree, T> {
        Cursor {
            ptr,
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the tree.
    ///
    /// If the cursor is pointing to the maximum element, it moves to the end.
    pub fn move_next(&mut self) {
        if let Some(p) = self.ptr {
            self.ptr = unsafe { successor(p) };
        }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is at the end.
    pub fn get(&self) -> Option<&'tree T> {
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the maximum element or to the end, this returns `None`.
    pub fn peek_next(&self) -> Option<&'tree T> {
        let next = unsafe { successor(self.ptr?) }?;
        Some(unsafe { next.as_ref() })
    }

    /// Returns `true` if the cursor is past the maximum element.
    pub fn is_end(&self) -> bool {
        self.ptr.is_none()
    }
}

impl<T> Clone for Cursor<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> where T: TreeNode<Links<T>> + ?Sized {}

impl<T> PartialEq for Cursor<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Cursor<'_, T> where T: TreeNode<Links<T>> + ?Sized {}

impl<T> fmt::Debug for Cursor<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.ptr).finish()
    }
}

/// A forward-only cursor over a [`BstTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or past the maximum element (the "end").
pub struct CursorMut<'tree, T, C = Less>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree mut BstTree<T, C>,
    ptr: Link<T>,
}

impl<'tree, T, C> CursorMut<'tree, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn at(tree: &'tree mut BstTree<T, C>, ptr: Link<T>) -> CursorMut<'tree, T, C> {
        CursorMut { tree, ptr }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::at(self.ptr)
    }

    /// Moves the cursor to the next element of the tree.
    ///
    /// If the cursor is pointing to the maximum element, it moves to the end.
    pub fn move_next(&mut self) {
        if let Some(p) = self.ptr {
            self.ptr = unsafe { successor(p) };
        }
    }

    /// Returns a reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is at the end.
    pub fn get(&self) -> Option<&T> {
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a pinned mutable reference to the item pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is at the end.
    ///
    /// # Safety
    ///
    /// The caller must ensure that modifications to the returned value do not violate the
    /// invariants of the tree. In particular, the result of comparisons between the key of the
    /// returned item and the keys of other items in the tree must not change.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    /// Converts the cursor into a pinned mutable reference to the current item, borrowed for the
    /// lifetime of the tree borrow.
    ///
    /// # Safety
    ///
    /// The same requirements as [`CursorMut::get_mut`] apply.
    pub unsafe fn into_mut(self) -> Option<Pin<&'tree mut T>> {
        self.ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    /// Returns a reference to the next item.
    ///
    /// If the cursor is pointing to the maximum element or to the end, this returns `None`.
    pub fn peek_next(&self) -> Option<&T> {
        let next = unsafe { successor(self.ptr?) }?;
        Some(unsafe { next.as_ref() })
    }

    /// Returns `true` if the cursor is past the maximum element.
    pub fn is_end(&self) -> bool {
        self.ptr.is_none()
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed element and leaves the cursor at the element that followed it.
    /// If the cursor is at the end, this method returns `None`, and neither the tree nor the
    /// cursor is modified.
    ///
    /// When the current node has two children it stays in the tree holding its successor's
    /// element, so the cursor does not move; in every other case the node is unlinked and the
    /// cursor moves on to the successor.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        let remove = self.ptr?;

        let has_two_children = unsafe {
            let links = T::links(remove).as_ref();
            links.left().is_some() && links.right().is_some()
        };

        if !has_two_children {
            self.move_next();
        }

        Some(unsafe { self.tree.remove_at(remove) })
    }
}

impl<T, C> fmt::Debug for CursorMut<'_, T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.ptr).finish()
    }
}
