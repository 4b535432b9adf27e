use alloc::boxed::Box;
use core::{
    borrow::Borrow,
    fmt,
    iter::FusedIterator,
    marker::{PhantomData, PhantomPinned},
    mem,
    pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;

use crate::{
    error::{Error, Result},
    iter::RawIter,
    BstTree, Compare, Entry, Less, Links, TreeNode,
};

/// An ordered map based on an on-demand balanced binary search tree.
///
/// Keys are ordered by the comparator `C`, which defaults to [`Less`]. Insertion and removal never
/// restructure the tree beyond the nodes they touch, so the tree's height depends on the order of
/// operations; [`BstMap::balance`] rebuilds it to minimal height.
///
/// Cursors returned by [`BstMap::find`], [`BstMap::insert`] and friends borrow the map, so they
/// remain valid exactly until the next mutating call.
pub struct BstMap<K, V, C = Less> {
    tree: BstTree<MapNode<K, V>, C>,
}

struct MapNode<K, V> {
    links: Links<MapNode<K, V>>,
    key: K,
    value: V,
    _unpin: PhantomPinned,
}

impl<K, V> MapNode<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(MapNode {
            links: Links::new(),
            key,
            value,
            _unpin: PhantomPinned,
        })
    }

    #[allow(clippy::boxed_local)]
    fn into_pair(node: Box<Self>) -> (K, V) {
        let MapNode { key, value, .. } = *node;
        (key, value)
    }

    fn value_mut(self: Pin<&mut Self>) -> &mut V {
        // SAFETY: Pinning is not structural for `node.value`.
        unsafe { &mut self.get_unchecked_mut().value }
    }
}

unsafe impl<K, V> Linked<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<MapNode<K, V>>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(core::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl<K, V> TreeNode<Links<MapNode<K, V>>> for MapNode<K, V> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.key
    }

    fn swap_payload(self: Pin<&mut Self>, other: Pin<&mut Self>) {
        // SAFETY: Pinning is not structural for `key` or `value`, and the links are untouched.
        let (this, other) = unsafe { (self.get_unchecked_mut(), other.get_unchecked_mut()) };
        mem::swap(&mut this.key, &mut other.key);
        mem::swap(&mut this.value, &mut other.value);
    }
}

// SAFETY: The map exclusively owns its nodes; the raw links never escape it, so sending or sharing
// the map is exactly as safe as sending or sharing its keys, values and comparator.
unsafe impl<K: Send, V: Send, C: Send> Send for BstMap<K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for BstMap<K, V, C> {}

impl<K, V> BstMap<K, V, Less> {
    /// Creates a new, empty `BstMap` ordered by [`Ord`].
    pub const fn new() -> Self {
        Self {
            tree: BstTree::new(),
        }
    }
}

impl<K, V> Default for BstMap<K, V, Less> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> BstMap<K, V, C> {
    /// Creates a new, empty `BstMap` ordered by `cmp`.
    ///
    /// Any `Fn(&K, &K) -> bool` implementing a strict weak ordering can be used as a comparator.
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            tree: BstTree::with_comparator(cmp),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the comparator ordering this map.
    pub const fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns a cursor pointing to the entry with the minimum key, or to the end if the map is
    /// empty.
    pub fn cursor_first(&self) -> Cursor<'_, K, V> {
        Cursor {
            inner: self.tree.cursor_first(),
        }
    }

    /// Returns a mutable cursor pointing to the entry with the minimum key, or to the end if the
    /// map is empty.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V, C> {
        CursorMut {
            inner: self.tree.cursor_first_mut(),
        }
    }

    /// Returns a cursor pointing past the entry with the maximum key.
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor {
            inner: self.tree.cursor_end(),
        }
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first().map(MapNode::into_pair)
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|node| {
            let node = node.get_ref();
            (&node.key, &node.value)
        })
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last().map(MapNode::into_pair)
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Moves the contents of the map into a new map, leaving `self` empty but usable.
    pub fn take(&mut self) -> Self
    where
        C: Clone,
    {
        Self {
            tree: self.tree.take(),
        }
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            raw: RawIter::new(&self.tree),
            phantom: PhantomData,
        }
    }

    /// Returns an iterator over the entries of the map with mutable references to the values,
    /// sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            raw: RawIter::new(&self.tree),
            phantom: PhantomData,
        }
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Writes the shape of the underlying tree to `w` as a Graphviz `digraph`.
    pub fn dotgraph<W>(&self, name: &str, w: W) -> fmt::Result
    where
        K: fmt::Display,
        W: fmt::Write,
    {
        self.tree.dotgraph(name, w)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        C: Compare<K>,
    {
        self.tree.assert_invariants();
    }
}

impl<K, V, C: Compare<K>> BstMap<K, V, C> {
    /// Inserts a key-value pair into the map.
    ///
    /// Returns a cursor to the entry stored under the key, and whether the pair was inserted. If
    /// the map already contains an equivalent key, the existing entry is left untouched (the first
    /// value inserted for a key wins) and `pair` is dropped.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    pub fn insert(&mut self, pair: (K, V)) -> (CursorMut<'_, K, V, C>, bool) {
        let (key, value) = pair;
        let (inner, rejected) = self.tree.insert(MapNode::new(key, value));

        (CursorMut { inner }, rejected.is_none())
    }

    /// Builds a key-value pair from `key` and `value` and inserts it into the map.
    ///
    /// This behaves exactly like [`BstMap::insert`].
    pub fn emplace<A, B>(&mut self, key: A, value: B) -> (CursorMut<'_, K, V, C>, bool)
    where
        A: Into<K>,
        B: Into<V>,
    {
        self.insert((key.into(), value.into()))
    }

    /// Returns a mutable reference to the value stored under `key`, inserting `V::default()` first
    /// if the key is absent.
    ///
    /// The lookup and the insertion share a single descent of the tree.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let node = match self.tree.entry(&key) {
            // SAFETY: Only the value is handed out; the key and links stay untouched.
            Entry::Occupied(entry) => unsafe { entry.into_mut() },
            // SAFETY: The new node is stored under the key used for the lookup.
            Entry::Vacant(entry) => unsafe { entry.insert(MapNode::new(key, V::default())) },
        };

        node.value_mut()
    }

    /// Rebuilds the underlying tree to minimal height, preserving its contents.
    ///
    /// This operation completes in _O(n log(n))_ time.
    pub fn balance(&mut self) {
        self.tree.balance();
    }
}

impl<K, V, C> BstMap<K, V, C> {
    /// Returns a cursor pointing to the entry with a key equivalent to `key`, or to the end if
    /// there is none.
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        Cursor {
            inner: self.tree.find(key),
        }
    }

    /// Returns a mutable cursor pointing to the entry with a key equivalent to `key`, or to the
    /// end if there is none.
    pub fn find_mut<Q>(&mut self, key: &Q) -> CursorMut<'_, K, V, C>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        CursorMut {
            inner: self.tree.find_mut(key),
        }
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.get(key).map(|node| &node.get_ref().value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        // SAFETY: Only the value is handed out; the key and links stay untouched.
        unsafe { self.tree.get_mut(key) }.map(MapNode::value_mut)
    }

    /// Removes the entry associated with `key` from the map, returning its value.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the entry associated with `key` from the map, returning the stored key and value.
    #[inline]
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.remove(key).map(MapNode::into_pair)
    }

    /// Erases the entry associated with `key`.
    ///
    /// Returns [`Error::KeyNotFound`] and leaves the map unchanged if there is no such entry.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    pub fn erase<Q>(&mut self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        match self.remove_entry(key) {
            Some(_) => Ok(()),
            None => {
                tracing::debug!(len = self.len(), "erase: no entry for key");
                Err(Error::KeyNotFound)
            }
        }
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for BstMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self
                .tree
                .clone_with(|node| MapNode::new(node.key.clone(), node.value.clone())),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        *self = source.clone();
    }
}

impl<K, V, C> fmt::Debug for BstMap<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Writes the keys of the map in ascending order, separated by single spaces, or `empty tree` if
/// the map is empty.
impl<K, V, C> fmt::Display for BstMap<K, V, C>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.keys();

        let Some(first) = keys.next() else {
            return f.write_str("empty tree");
        };

        write!(f, "{first}")?;
        for key in keys {
            write!(f, " {key}")?;
        }

        Ok(())
    }
}

impl<K, V, C> PartialEq for BstMap<K, V, C>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for BstMap<K, V, C> {}

impl<K: Ord, V> FromIterator<(K, V)> for BstMap<K, V, Less> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = BstMap::new();
        map.extend(iter);
        map
    }
}

/// Inserts every pair in turn. As with [`BstMap::insert`], the first value for a key wins.
impl<K, V, C: Compare<K>> Extend<(K, V)> for BstMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for pair in iter {
            self.insert(pair);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a BstMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut BstMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C> IntoIterator for BstMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { map: self }
    }
}

/// A forward-only cursor over the entries of a [`BstMap`].
///
/// Dereferencing yields the key; [`Cursor::value`] yields the value. Two cursors are equal when
/// they point to the same entry, or are both at the end.
pub struct Cursor<'a, K, V> {
    inner: crate::Cursor<'a, MapNode<K, V>>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Returns the key of the current entry, or `None` at the end.
    pub fn key(&self) -> Option<&'a K> {
        self.inner.get().map(|node| &node.key)
    }

    /// Returns the value of the current entry, or `None` at the end.
    pub fn value(&self) -> Option<&'a V> {
        self.inner.get().map(|node| &node.value)
    }

    /// Returns the key and value of the current entry, or `None` at the end.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.inner.get().map(|node| (&node.key, &node.value))
    }

    /// Moves the cursor to the entry with the next greater key, or to the end.
    pub fn move_next(&mut self) {
        self.inner.move_next();
    }

    /// Returns the key and value of the next entry without moving the cursor.
    pub fn peek_next(&self) -> Option<(&'a K, &'a V)> {
        self.inner.peek_next().map(|node| (&node.key, &node.value))
    }

    /// Returns `true` if the cursor is past the entry with the maximum key.
    pub fn is_end(&self) -> bool {
        self.inner.is_end()
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

// SAFETY: A cursor only hands out shared references to keys and values.
unsafe impl<K: Sync, V: Sync> Send for Cursor<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key()).finish()
    }
}

/// A forward-only cursor over the entries of a [`BstMap`] which can modify values and remove
/// entries.
pub struct CursorMut<'a, K, V, C = Less> {
    inner: crate::CursorMut<'a, MapNode<K, V>, C>,
}

impl<'a, K, V, C> CursorMut<'a, K, V, C> {
    /// Returns a read-only cursor pointing to the current entry.
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor {
            inner: self.inner.as_cursor(),
        }
    }

    /// Returns the key of the current entry, or `None` at the end.
    pub fn key(&self) -> Option<&K> {
        self.inner.get().map(|node| &node.key)
    }

    /// Returns the value of the current entry, or `None` at the end.
    pub fn value(&self) -> Option<&V> {
        self.inner.get().map(|node| &node.value)
    }

    /// Returns a mutable reference to the value of the current entry, or `None` at the end.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        // SAFETY: Only the value is handed out; the key and links stay untouched.
        unsafe { self.inner.get_mut() }.map(MapNode::value_mut)
    }

    /// Converts the cursor into a mutable reference to the value of the current entry, borrowed
    /// for as long as the map is.
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        // SAFETY: Only the value is handed out; the key and links stay untouched.
        unsafe { self.inner.into_mut() }.map(MapNode::value_mut)
    }

    /// Moves the cursor to the entry with the next greater key, or to the end.
    pub fn move_next(&mut self) {
        self.inner.move_next();
    }

    /// Returns the key and value of the next entry without moving the cursor.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        self.inner.peek_next().map(|node| (&node.key, &node.value))
    }

    /// Returns `true` if the cursor is past the entry with the maximum key.
    pub fn is_end(&self) -> bool {
        self.inner.is_end()
    }

    /// Removes the current entry, returning its key and value and leaving the cursor at the entry
    /// that followed it.
    ///
    /// Returns `None`, and changes nothing, if the cursor is at the end.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        self.inner.remove_current().map(MapNode::into_pair)
    }
}

impl<K: fmt::Debug, V, C> fmt::Debug for CursorMut<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.key()).finish()
    }
}

// SAFETY: A mutable cursor behaves like `&mut BstMap`: it can move entries out of the map.
unsafe impl<K: Send, V: Send, C: Send> Send for CursorMut<'_, K, V, C> {}
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for CursorMut<'_, K, V, C> {}

/// An iterator over the entries of a [`BstMap`], sorted by key.
pub struct Iter<'a, K, V> {
    raw: RawIter<MapNode<K, V>>,
    phantom: PhantomData<&'a MapNode<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next()?.as_ref() };
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.len(), Some(self.raw.len()))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

// SAFETY: `Iter` behaves like `&BstMap`.
unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`BstMap`], sorted by key.
pub struct IterMut<'a, K, V> {
    raw: RawIter<MapNode<K, V>>,
    phantom: PhantomData<&'a mut MapNode<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: Each node is yielded once, and the map is mutably borrowed for `'a`. Pinning is
        // not structural for `node.value`.
        let node = unsafe { self.raw.next()?.as_mut() };
        Some((&node.key, &mut node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.raw.len(), Some(self.raw.len()))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

// SAFETY: `IterMut` hands out shared keys and exclusive values, each at most once.
unsafe impl<K: Sync, V: Send> Send for IterMut<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

/// An owning iterator over the entries of a [`BstMap`], sorted by key.
pub struct IntoIter<K, V, C = Less> {
    map: BstMap<K, V, C>,
}

impl<K, V, C> Iterator for IntoIter<K, V, C> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.map.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V, C> ExactSizeIterator for IntoIter<K, V, C> {}

impl<K, V, C> FusedIterator for IntoIter<K, V, C> {}

/// An iterator over the keys of a [`BstMap`], in sorted order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`BstMap`], in order by key.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a [`BstMap`], in order by key.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        panic::{self, AssertUnwindSafe},
        sync::Mutex,
        thread,
    };

    use super::*;

    fn sample() -> BstMap<i32, i32> {
        let mut map = BstMap::new();
        for key in [8, 3, 1, 6, 4, 7, 10, 14, 13] {
            map.insert((key, key * 10));
        }
        map
    }

    #[test]
    fn display_lists_keys_in_order() {
        let mut map = sample();
        map.assert_invariants();
        assert_eq!(map.to_string(), "1 3 4 6 7 8 10 13 14");

        map.erase(&8).unwrap();
        map.assert_invariants();
        assert_eq!(map.to_string(), "1 3 4 6 7 10 13 14");
    }

    #[test]
    fn display_empty() {
        let map: BstMap<i32, ()> = BstMap::new();
        assert_eq!(map.to_string(), "empty tree");
    }

    #[test]
    fn insert_keeps_first_value() {
        let mut map = BstMap::new();

        let (cursor, inserted) = map.insert((1, "first"));
        assert!(inserted);
        assert_eq!(cursor.key(), Some(&1));
        assert_eq!(cursor.value(), Some(&"first"));

        let (cursor, inserted) = map.insert((1, "second"));
        assert!(!inserted);
        assert_eq!(cursor.value(), Some(&"first"));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"first"));
    }

    #[test]
    fn emplace_converts() {
        let mut map: BstMap<String, u64> = BstMap::new();

        let (_, inserted) = map.emplace("one", 1u8);
        assert!(inserted);
        let (_, inserted) = map.emplace("one", 2u32);
        assert!(!inserted);

        assert_eq!(map.get("one"), Some(&1));
    }

    #[test]
    fn subscript_inserts_default() {
        let mut map = sample();

        assert_eq!(*map.get_or_insert_default(3), 30);
        assert_eq!(map.len(), 9);

        *map.get_or_insert_default(30) += 5;
        assert_eq!(map.get(&30), Some(&5));
        assert_eq!(map.len(), 10);
        map.assert_invariants();
    }

    #[test]
    fn find_and_end() {
        let map = sample();

        let cursor = map.find(&6);
        assert_eq!(cursor.key_value(), Some((&6, &60)));
        assert_eq!(cursor.peek_next(), Some((&7, &70)));

        assert_eq!(map.find(&5), map.cursor_end());
        assert!(map.find(&5).is_end());
        assert_eq!(map.find(&1), map.cursor_first());
    }

    #[test]
    fn cursor_iterates_in_order() {
        let map = sample();

        let mut keys = Vec::new();
        let mut cursor = map.cursor_first();
        while let Some(key) = cursor.key() {
            keys.push(*key);
            cursor.move_next();
        }

        assert_eq!(keys, map.keys().copied().collect::<Vec<_>>());
        assert_eq!(cursor, map.cursor_end());
    }

    #[test]
    fn erase_missing_key() {
        let mut map = sample();

        assert_eq!(map.erase(&5), Err(Error::KeyNotFound));
        assert_eq!(map.len(), 9);

        assert_eq!(map.erase(&1), Ok(()));
        assert_eq!(map.erase(&1), Err(Error::KeyNotFound));
        assert_eq!(Error::KeyNotFound.to_string(), "no entry found for key");
    }

    #[test]
    fn erase_every_shape() {
        let mut map = sample();

        // Leaf, unary, two children, then the root.
        for key in [13, 10, 3, 8] {
            map.erase(&key).unwrap();
            map.assert_invariants();
            assert!(!map.contains_key(&key));
        }

        assert_eq!(map.to_string(), "1 4 6 7 14");
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [10, 40, 60, 70, 140]);
    }

    #[test]
    fn erase_down_to_empty() {
        let mut map = sample();
        let keys: Vec<i32> = map.keys().copied().collect();

        for key in keys {
            map.erase(&key).unwrap();
            map.assert_invariants();
        }

        assert!(map.is_empty());
        assert_eq!(map.to_string(), "empty tree");
    }

    #[test]
    fn clone_is_deep() {
        let mut map = sample();
        let mut copy = map.clone();

        assert_eq!(copy, map);
        assert_eq!(copy.height(), map.height());

        copy.erase(&8).unwrap();
        *copy.get_mut(&1).unwrap() = 0;

        assert_eq!(map.get(&8), Some(&80));
        assert_eq!(map.get(&1), Some(&10));
        assert_ne!(copy, map);

        // And the other way round.
        map.erase(&3).unwrap();
        map.insert((5, 50));
        *map.get_or_insert_default(14) = -1;
        map.balance();

        assert_eq!(copy.to_string(), "1 3 4 6 7 10 13 14");
        assert_eq!(copy.get(&3), Some(&30));
        assert_eq!(copy.get(&14), Some(&140));
        assert!(!copy.contains_key(&5));
        copy.assert_invariants();
        map.assert_invariants();
    }

    #[test]
    fn clone_from_replaces_contents() {
        let source = sample();
        let mut dest: BstMap<i32, i32> = [(100, 0), (200, 0)].into_iter().collect();

        dest.clone_from(&source);
        dest.assert_invariants();
        assert_eq!(dest, source);
        assert!(!dest.contains_key(&100));
    }

    #[test]
    fn take_moves_contents() {
        let mut map = sample();

        let moved = map.take();
        assert!(map.is_empty());
        assert_eq!(map.to_string(), "empty tree");
        assert_eq!(moved.len(), 9);

        let mut moved = moved;
        let moved_again = mem::take(&mut moved);
        assert!(moved.is_empty());
        assert_eq!(moved_again.to_string(), "1 3 4 6 7 8 10 13 14");

        // The source is still usable.
        map.insert((1, 1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn balance_preserves_contents() {
        let mut map: BstMap<u32, u32> = (0..100).map(|k| (k, k * 2)).collect();
        assert_eq!(map.height(), 100);

        let before = map.clone();
        map.balance();
        map.assert_invariants();

        assert_eq!(map.height(), 7);
        assert_eq!(map, before);

        map.balance();
        assert_eq!(map.height(), 7);
        assert_eq!(map, before);
    }

    #[test]
    fn balance_empty_and_single() {
        let mut map: BstMap<u32, ()> = BstMap::new();
        map.balance();
        assert!(map.is_empty());

        map.insert((1, ()));
        map.balance();
        assert_eq!(map.height(), 1);
        map.assert_invariants();
    }

    #[test]
    fn reverse_comparator() {
        let mut map = BstMap::with_comparator(|a: &i32, b: &i32| b < a);
        map.extend([(1, 'a'), (3, 'c'), (2, 'b')]);
        map.assert_invariants();

        assert_eq!(map.to_string(), "3 2 1");
        assert_eq!(map.first_key_value(), Some((&3, &'c')));
        assert_eq!(map.last_key_value(), Some((&1, &'a')));

        map.balance();
        assert_eq!(map.find(&2).key(), Some(&2));
    }

    #[test]
    fn borrowed_lookup() {
        let mut map: BstMap<String, usize> = BstMap::new();
        map.insert(("apple".to_string(), 1));
        map.insert(("cherry".to_string(), 3));

        assert!(map.contains_key("apple"));
        assert_eq!(map.find("cherry").value(), Some(&3));
        assert_eq!(map.remove("apple"), Some(1));
        assert!(map.erase("banana").is_err());
    }

    #[test]
    fn cursor_mut_edits_and_removes() {
        let mut map = sample();

        let mut cursor = map.find_mut(&3);
        *cursor.value_mut().unwrap() += 1;

        // 3 has two children, so the cursor stays on its node, now holding 4.
        assert_eq!(cursor.remove_current(), Some((3, 31)));
        assert_eq!(cursor.key(), Some(&4));
        assert_eq!(cursor.peek_next().map(|(k, _)| *k), Some(6));

        cursor.move_next();
        assert_eq!(cursor.remove_current(), Some((6, 60)));
        assert_eq!(cursor.key(), Some(&7));

        let value = cursor.into_value_mut().unwrap();
        *value = 0;

        map.assert_invariants();
        assert_eq!(map.get(&7), Some(&0));
        assert_eq!(map.to_string(), "1 4 7 8 10 13 14");
    }

    #[test]
    fn pop_first_and_last() {
        let mut map = sample();

        assert_eq!(map.pop_first(), Some((1, 10)));
        assert_eq!(map.pop_last(), Some((14, 140)));
        assert_eq!(map.first_key_value(), Some((&3, &30)));
        assert_eq!(map.last_key_value(), Some((&13, &130)));
        map.assert_invariants();

        map.clear();
        assert_eq!(map.pop_first(), None);
        assert_eq!(map.pop_last(), None);
    }

    #[test]
    fn iterators() {
        let mut map = sample();

        assert_eq!(map.iter().len(), 9);
        assert_eq!(map.iter().next(), Some((&1, &10)));

        for value in map.values_mut() {
            *value += 1;
        }
        for (_, value) in &mut map {
            *value *= 2;
        }
        assert_eq!(map.get(&4), Some(&82));

        let pairs: Vec<(i32, i32)> = map.into_iter().collect();
        assert_eq!(pairs.len(), 9);
        assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn debug_format() {
        let map: BstMap<i32, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
        assert_eq!(format!("{map:?}"), "{1: 'a', 2: 'b'}");
    }

    #[test]
    fn balance_panicking_comparator_frees_nodes() {
        struct Tracked<'a>(&'a Cell<usize>);

        impl Drop for Tracked<'_> {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let dropped = Cell::new(0);
        let calls = Cell::new(0);
        let armed = Cell::new(false);

        let mut map = BstMap::with_comparator(|a: &u32, b: &u32| {
            if armed.get() {
                calls.set(calls.get() + 1);
                assert!(calls.get() < 40, "comparator gave up");
            }
            a < b
        });
        for key in 0..32 {
            map.insert((key, Tracked(&dropped)));
        }

        armed.set(true);
        let result = panic::catch_unwind(AssertUnwindSafe(|| map.balance()));
        assert!(result.is_err());
        armed.set(false);

        // The nodes relinked before the panic still form a valid tree; the rest were freed.
        map.assert_invariants();
        assert!(map.len() < 32);
        assert_eq!(dropped.get(), 32 - map.len());

        drop(map);
        assert_eq!(dropped.get(), 32);
    }

    #[test]
    fn iterators_and_cursors_cross_threads() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}

        let mut map = sample();

        assert_send_sync(&map.iter());
        assert_send_sync(&map.keys());
        assert_send_sync(&map.values());
        assert_send_sync(&map.cursor_first());
        assert_send_sync(&map.iter_mut());
        assert_send_sync(&map.values_mut());
        assert_send_sync(&map.cursor_first_mut());

        let (sum, mut cursor) = (map.values().sum::<i32>(), map.find(&6));
        thread::scope(|s| {
            s.spawn(|| {
                assert_eq!(map.iter().map(|(_, v)| v).sum::<i32>(), sum);
                cursor.move_next();
                assert_eq!(cursor.key(), Some(&7));
            });
        });

        thread::scope(|s| {
            let values = map.values_mut();
            s.spawn(move || {
                for value in values {
                    *value += 1;
                }
            });
        });
        assert_eq!(map.get(&1), Some(&11));

        thread::scope(|s| {
            let mut cursor = map.cursor_first_mut();
            s.spawn(move || {
                assert_eq!(cursor.remove_current(), Some((1, 11)));
            });
        });
        assert_eq!(map.first_key_value(), Some((&3, &31)));
    }

    #[test]
    fn shared_across_threads() {
        let map = Mutex::new(BstMap::new());

        thread::scope(|s| {
            for t in 0..4u32 {
                let map = &map;
                s.spawn(move || {
                    for k in 0..25 {
                        map.lock().unwrap().insert((t * 25 + k, t));
                    }
                });
            }
        });

        let mut map = map.into_inner().unwrap();
        assert_eq!(map.len(), 100);
        map.balance();
        map.assert_invariants();
        assert_eq!(map.height(), 7);
    }
}
