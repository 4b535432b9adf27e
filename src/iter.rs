use core::{iter::FusedIterator, marker::PhantomData, ptr::NonNull};

use crate::{successor, BstTree, Link, Links, TreeNode};

// An in-order walk over raw node pointers, shared by the borrowing iterators of the tree and the
// map. It holds no borrow itself; the wrappers tie it to one.
pub(crate) struct RawIter<T: ?Sized> {
    next: Link<T>,
    len: usize,
}

impl<T> RawIter<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new<C>(tree: &BstTree<T, C>) -> Self {
        RawIter {
            next: tree.first_raw(),
            len: tree.len(),
        }
    }

    pub(crate) fn next(&mut self) -> Option<NonNull<T>> {
        let cur = self.next?;

        self.next = unsafe { successor(cur) };
        self.len -= 1;

        debug_assert_eq!(self.next.is_none(), self.len == 0);

        Some(cur)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

/// An iterator over the elements of a [`BstTree`], in ascending key order.
pub struct Iter<'tree, T: TreeNode<Links<T>> + ?Sized> {
    raw: RawIter<T>,
    phantom: PhantomData<&'tree T>,
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iter<'tree, T> {
    pub(crate) fn new<C>(tree: &'tree BstTree<T, C>) -> Self {
        Iter {
            raw: RawIter::new(tree),
            phantom: PhantomData,
        }
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|node| unsafe { node.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.len(), Some(self.raw.len()))
    }
}

impl<T: TreeNode<Links<T>> + ?Sized> ExactSizeIterator for Iter<'_, T> {}

impl<T: TreeNode<Links<T>> + ?Sized> FusedIterator for Iter<'_, T> {}

impl<'tree, T, C> IntoIterator for &'tree BstTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(self)
    }
}
