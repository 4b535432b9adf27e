//! An intrusive binary search tree with parent links, balanced on demand.
//!
//! The tree never rebalances itself while inserting or removing. Its shape is entirely determined
//! by the order of insertions and removals until [`BstTree::balance`] is called, which rebuilds it
//! into a tree of minimal height in _O(n log(n))_ time.
//!
//! [`BstMap`] is an owning ordered map built on top of the intrusive tree.

// Conventions used in comments:
// - The parent of a node `x` is denoted `p(x)`.
// - The successor of `x` is the node with the least key greater than `x`'s key.
// - A node is unary if it has exactly one child.
//
// The invariants of the tree are:
// 1. Every key in the left subtree of `x` is ordered strictly before `x`'s key, and every key in
//    the right subtree strictly after it.
// 2. If `c` is a child of `x`, then `p(c) = x`. The root has no parent.
// 3. `len` is the number of nodes reachable from the root.
//
// Child links own the node they point to: the tree reconstitutes a node's handle only when the
// node is unlinked. Parent links never own.

extern crate alloc;

use alloc::{vec, vec::Vec};
use core::{
    borrow::Borrow, cell::UnsafeCell, fmt, marker::PhantomPinned, mem, pin::Pin, ptr::NonNull,
};

use cordyceps::Linked;

mod compare;
mod cursor;
mod debug;
mod entry;
pub mod error;
mod iter;
pub mod map;

#[cfg(any(test, feature = "model"))]
pub mod model;


pub use compare::{Compare, Less};
pub use cursor::{Cursor, CursorMut};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use error::{Error, Result};
pub use iter::Iter;
pub use map::BstMap;

use entry::InsertAs;

pub trait TreeNode<L>: Linked<L> {
    type Key;

    fn key(&self) -> &Self::Key;

    /// Exchanges the payloads (everything except the links) of two nodes.
    ///
    /// This is used when a node with two children is removed: the node stays in place and takes
    /// over its successor's payload, and the successor is unlinked instead.
    ///
    /// Implementations must not move or modify the links of either node.
    fn swap_payload(self: Pin<&mut Self>, other: Pin<&mut Self>);
}

/// An intrusive binary search tree.
///
/// Nodes are ordered by the comparator `C`, which defaults to [`Less`]. The tree is not
/// self-balancing; see [`BstTree::balance`].
pub struct BstTree<T, C = Less>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
    cmp: C,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

// The outcome of descending the tree in search of a key.
enum Search<T: ?Sized> {
    Found(NonNull<T>),
    Vacant(InsertAs<T>),
}

impl<T> BstTree<T, Less>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by [`Ord`].
    pub const fn new() -> BstTree<T, Less> {
        BstTree {
            root: None,
            len: 0,
            cmp: Less,
        }
    }
}

impl<T> Default for BstTree<T, Less>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> BstTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> BstTree<T, C> {
        BstTree {
            root: None,
            len: 0,
            cmp,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the comparator ordering this tree.
    pub const fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// An empty tree has height 0.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = Vec::new();
        stack.extend(self.root.map(|root| (root, 1)));

        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = unsafe { self.links(node).child(dir) } {
                    stack.push((child, depth + 1));
                }
            }
        }

        height
    }

    /// Returns a reference to the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns a reference to the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root.map(|root| unsafe { min_in_subtree(root) })
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        let mut cur = self.root?;

        while let Some(right) = unsafe { self.links(cur).right() } {
            cur = right;
        }

        Some(cur)
    }

    /// Returns an iterator over the elements of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor pointing to the minimum element, or to the end if the tree is empty.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::at(self.first_raw())
    }

    /// Returns a mutable cursor pointing to the minimum element, or to the end if the tree is
    /// empty.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T, C> {
        let first = self.first_raw();
        CursorMut::at(self, first)
    }

    /// Returns a cursor pointing past the maximum element.
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        Cursor::at(None)
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Returns a deep copy of the tree, producing each new node with `clone_node`.
    ///
    /// The copy has exactly the same shape as `self`. Nodes are copied top-down, right subtree
    /// before left, using an explicit stack rather than recursion.
    pub fn clone_with<F>(&self, mut clone_node: F) -> BstTree<T, C>
    where
        C: Clone,
        F: FnMut(&T) -> T::Handle,
    {
        let mut tree = BstTree::with_comparator(self.cmp.clone());

        let mut stack: Vec<(NonNull<T>, Option<(NonNull<T>, Dir)>)> = Vec::new();
        stack.extend(self.root.map(|root| (root, None)));

        while let Some((src, slot)) = stack.pop() {
            let dst = T::into_ptr(clone_node(unsafe { src.as_ref() }));

            unsafe {
                let links = tree.links_mut(dst);
                links.clear();
                links.set_parent(slot.map(|(parent, _)| parent));

                match slot {
                    Some((parent, dir)) => {
                        tree.links_mut(parent).set_child(dir, Some(dst));
                    }
                    None => tree.root = Some(dst),
                }

                // Pushed left first so that the right subtree is copied first.
                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = self.links(src).child(dir) {
                        stack.push((child, Some((dst, dir))));
                    }
                }
            }

            tree.len += 1;
        }

        tracing::trace!(len = tree.len, "cloned tree");

        tree
    }

    /// Moves the contents of the tree into a new tree, leaving `self` empty.
    ///
    /// Both trees keep a copy of the comparator, so `self` remains usable afterwards.
    pub fn take(&mut self) -> BstTree<T, C>
    where
        C: Clone,
    {
        let cmp = self.cmp.clone();
        mem::replace(self, BstTree::with_comparator(cmp))
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        C: Compare<T::Key>,
    {
        let mut count = 0;
        let mut stack = Vec::new();

        if let Some(root) = self.root {
            assert!(
                unsafe { self.links(root).parent() }.is_none(),
                "root must not have a parent"
            );
            stack.push(root);
        }

        while let Some(node) = stack.pop() {
            count += 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = unsafe { self.links(node).child(dir) } {
                    // Ensure child's parent link points to this node.
                    let parent = unsafe { self.links(child).parent() }
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent);

                    stack.push(child);
                }
            }
        }

        assert_eq!(count, self.len, "length does not match reachable nodes");

        // The ordering invariant holds iff the in-order sequence is strictly ascending.
        let mut prev: Option<&T> = None;
        for node in self.iter() {
            if let Some(prev) = prev {
                assert!(
                    self.cmp.less(prev.key(), node.key()),
                    "in-order keys must be strictly ascending"
                );
            }
            prev = Some(node);
        }
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let len = self.len;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let cur = min_in_subtree(cur);
                let parent = self.links(cur).parent();
                let right = self.links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);

        if len > 0 {
            tracing::trace!(len, "cleared tree");
        }
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// If `node` has two children, it is not unlinked: it takes over the payload of its successor,
    /// and the successor's node is unlinked and returned in its place, now holding `node`'s former
    /// payload. Either way, the returned handle holds the removed element.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub(crate) unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            let parent = self.links(node).parent();
            let left = self.links(node).left();
            let right = self.links(node).right();

            let removed = match (left, right) {
                (Some(_), Some(right)) => {
                    // The successor has no left child, so it can be spliced out like a leaf or a
                    // unary node. Its parent is `node` or a descendant of `node`.
                    let mut successor = min_in_subtree(right);
                    self.splice(successor);

                    let mut node = node;
                    T::swap_payload(
                        Pin::new_unchecked(node.as_mut()),
                        Pin::new_unchecked(successor.as_mut()),
                    );

                    successor
                }

                (Some(child), None) | (None, Some(child)) => {
                    self.replace_child_or_set_root(parent, node, Some(child));
                    self.links_mut(child).set_parent(parent);
                    node
                }

                (None, None) => {
                    self.replace_child_or_set_root(parent, node, None);
                    node
                }
            };

            self.links_mut(removed).clear();
            self.len -= 1;

            T::from_ptr(removed)
        }
    }

    // Unlinks a node with at most one child, elevating the child (if any) into its place.
    unsafe fn splice(&mut self, node: NonNull<T>) {
        unsafe {
            let links = self.links(node);
            debug_assert!(
                links.left().is_none() || links.right().is_none(),
                "only nodes with at most one child can be spliced"
            );

            let parent = links.parent();
            let child = links.left().or(links.right());

            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);
        }
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { self.links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Option<NonNull<T>>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);
            debug_assert_eq!(
                self.links(parent).child(dir),
                Some(old_child),
                "`old_child` must be a child of `parent`"
            );

            self.links_mut(parent).set_child(dir, new_child);
        }
    }

    #[inline]
    unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { self.links(parent).left() } == Some(child) {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    // Links a detached node into the slot described by `at`.
    unsafe fn link_at(&mut self, at: InsertAs<T>, ptr: NonNull<T>) {
        unsafe {
            let links = self.links_mut(ptr);
            links.set_left(None);
            links.set_right(None);

            match at {
                InsertAs::Root => {
                    debug_assert!(self.root.is_none());
                    links.set_parent(None);
                    self.root = Some(ptr);
                }
                InsertAs::Child { parent, dir } => {
                    debug_assert!(self.links(parent).child(dir).is_none());
                    links.set_parent(Some(parent));
                    self.links_mut(parent).set_child(dir, Some(ptr));
                }
            }
        }

        self.len += 1;
    }
}

impl<T, C> BstTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
    C: Compare<T::Key>,
{
    /// Inserts an item into the tree.
    ///
    /// Returns a cursor to the element stored under the item's key. If an element with an
    /// equivalent key was already present, the tree is left unchanged and `item` is handed back
    /// alongside a cursor to the existing element.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    pub fn insert(&mut self, item: T::Handle) -> (CursorMut<'_, T, C>, Option<T::Handle>) {
        let ptr = T::into_ptr(item);

        let (node, rejected) = match self.search(unsafe { ptr.as_ref().key() }) {
            Search::Found(existing) => (existing, Some(unsafe { T::from_ptr(ptr) })),
            Search::Vacant(at) => {
                unsafe { self.link_at(at, ptr) };
                (ptr, None)
            }
        };

        (CursorMut::at(self, Some(node)), rejected)
    }

    /// Rebuilds the tree into a tree of minimal height.
    ///
    /// The nodes are collected in order, detached, and reinserted by recursively choosing the
    /// median of each range, which yields a height of `ceil(log2(n + 1))`. Nodes are relinked
    /// rather than reallocated.
    ///
    /// This operation completes in _O(n log(n))_ time.
    pub fn balance(&mut self) {
        let mut nodes = Vec::with_capacity(self.len);

        let mut opt_cur = self.first_raw();
        while let Some(cur) = opt_cur {
            nodes.push(cur);
            opt_cur = unsafe { successor(cur) };
        }

        self.root = None;
        self.len = 0;

        // Inclusive ranges are awkward with `usize`, so ranges are half-open here. The median of
        // `lo..hi` is the element the inclusive `(lo + (hi - 1)) / 2` would pick.
        let mut pending = Unlinked {
            nodes: &nodes,
            ranges: vec![(0, nodes.len())],
            current: None,
        };
        while let Some((lo, hi)) = pending.ranges.pop() {
            if lo >= hi {
                continue;
            }
            pending.current = Some((lo, hi));

            let mid = lo + (hi - lo - 1) / 2;
            unsafe { self.insert_detached(nodes[mid]) };
            pending.current = None;

            // The lower half is popped, and thus inserted, first.
            pending.ranges.push((mid + 1, hi));
            pending.ranges.push((lo, mid));
        }

        tracing::debug!(len = self.len, height = self.height(), "balanced tree");
    }

    // Inserts a node whose key is known not to be present in the tree.
    unsafe fn insert_detached(&mut self, ptr: NonNull<T>) {
        match self.search(unsafe { ptr.as_ref().key() }) {
            Search::Found(_) => unreachable!("detached node's key is already in the tree"),
            Search::Vacant(at) => unsafe { self.link_at(at, ptr) },
        }
    }
}

impl<T, C> BstTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the node corresponding to `key`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that neither the links nor the key of the returned node are
    /// modified.
    pub unsafe fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains an element with a key equivalent to `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a cursor pointing to the element with a key equivalent to `key`, or to the end if
    /// there is none.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, T>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        Cursor::at(self.get_raw(key))
    }

    /// Returns a mutable cursor pointing to the element with a key equivalent to `key`, or to the
    /// end if there is none.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let ptr = self.get_raw(key);
        CursorMut::at(self, ptr)
    }

    /// Returns the entry corresponding to `key`.
    pub fn entry<Q>(&mut self, key: &Q) -> Entry<'_, T, C>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => unsafe { Entry::occupied(self, node) },
            Search::Vacant(InsertAs::Root) => unsafe { Entry::vacant_root(self) },
            Search::Vacant(InsertAs::Child { parent, dir }) => unsafe {
                Entry::vacant_child(self, parent, dir)
            },
        }
    }

    /// Removes the element with a key equivalent to `key` from the tree.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => Some(node),
            Search::Vacant(_) => None,
        }
    }

    // Descends from the root towards `key`, returning either the node holding an equivalent key
    // or the empty slot where such a node would be linked.
    fn search<Q>(&self, key: &Q) -> Search<T>
    where
        T::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Search::Vacant(InsertAs::Root);
        };

        loop {
            let dir = unsafe {
                let cur_key: &Q = cur.as_ref().key().borrow();

                if self.cmp.less(key, cur_key) {
                    Dir::Left
                } else if self.cmp.less(cur_key, key) {
                    Dir::Right
                } else {
                    return Search::Found(cur);
                }
            };

            match unsafe { self.links(cur).child(dir) } {
                Some(child) => cur = child,
                None => return Search::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }
}

// The nodes `balance` has detached but not yet relinked. If the comparator panics midway, they are
// released here; the relinked ones are released by the tree.
struct Unlinked<'a, T: TreeNode<Links<T>> + ?Sized> {
    nodes: &'a [NonNull<T>],
    ranges: Vec<(usize, usize)>,
    current: Option<(usize, usize)>,
}

impl<T> Drop for Unlinked<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        for (lo, hi) in self.current.take().into_iter().chain(self.ranges.drain(..)) {
            for &node in &self.nodes[lo..hi] {
                drop(unsafe { T::from_ptr(node) });
            }
        }
    }
}

impl<T, C> Drop for BstTree<T, C>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

// Returns the minimum node in the subtree rooted at `root`.
#[inline]
pub(crate) unsafe fn min_in_subtree<T>(root: NonNull<T>) -> NonNull<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let mut cur = root;

    while let Some(left) = unsafe { T::links(cur).as_ref().left() } {
        cur = left;
    }

    cur
}

// Returns the in-order successor of `node`, or `None` if `node` is the maximum.
//
// If `node` has a right subtree, the successor is its minimum. Otherwise, ascend until arriving at
// a parent from its left child; that parent is the successor.
pub(crate) unsafe fn successor<T>(node: NonNull<T>) -> Link<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe {
        if let Some(right) = T::links(node).as_ref().right() {
            return Some(min_in_subtree(right));
        }

        let mut cur = node;
        while let Some(parent) = T::links(cur).as_ref().parent() {
            if T::links(parent).as_ref().left() == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}
