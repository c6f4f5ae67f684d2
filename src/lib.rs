#![doc = include_str!("../README.md")]
#![no_std]
#![cfg_attr(feature = "allocator_api", feature(allocator_api))]

extern crate alloc;

use core::alloc::Layout;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

pub use allocator_api2::alloc::AllocError;
pub use allocator_api2::alloc::Allocator;
pub use allocator_api2::alloc::Global;

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// SUBMODULES                                                                 //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

mod ptr;

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// PUBLIC TYPE AND TRAIT DEFINITIONS                                          //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

/// A singly linked list owning a chain of heap allocated nodes.
///
/// Values are appended at the tail and iterated from the first node to the
/// last, so iteration order is insertion order.

pub struct List<T, A: Allocator = Global> {
  root: Option<NonNull<Node<T>>>,
  len: usize,
  allocator: A,
  marker: PhantomData<Node<T>>,
}

unsafe impl<T, A: Allocator> Send for List<T, A> where T: Send, A: Send { }

unsafe impl<T, A: Allocator> Sync for List<T, A> where T: Sync, A: Sync { }

/// An iterator over references to the values of a [`List`], in insertion
/// order.

pub struct Iter<'a, T> {
  curr: Option<NonNull<Node<T>>>,
  len: usize,
  marker: PhantomData<&'a Node<T>>,
}

unsafe impl<'a, T> Send for Iter<'a, T> where T: Sync { }

unsafe impl<'a, T> Sync for Iter<'a, T> where T: Sync { }

/// An iterator over mutable references to the values of a [`List`], in
/// insertion order.

pub struct IterMut<'a, T> {
  curr: Option<NonNull<Node<T>>>,
  len: usize,
  marker: PhantomData<&'a mut Node<T>>,
}

unsafe impl<'a, T> Send for IterMut<'a, T> where T: Send { }

unsafe impl<'a, T> Sync for IterMut<'a, T> where T: Sync { }

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// PRIVATE TYPE AND TRAIT DEFINITIONS                                         //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

// NB: A node is owned by exactly one `next` link, or by the list `root` for
// the first node. The chain is acyclic because a node's `next` is `None` when
// it is attached and only ever assigned a freshly allocated node afterwards.

struct Node<T> {
  value: T,
  next: Option<NonNull<Node<T>>>,
}

enum Error {
  AllocatorFailed(Layout),
}

enum Panicked { }

trait Fail: Sized {
  fn fail<T>(_: Error) -> Result<T, Self>;
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// UTILITY FUNCTIONS                                                          //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

#[inline(always)]
fn unwrap<T>(x: Result<T, Panicked>) -> T {
  match x { Ok(x) => x, Err(e) => match e { } }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// Fail                                                                       //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl Fail for Panicked {
  #[inline(never)]
  #[cold]
  fn fail<T>(e: Error) -> Result<T, Self> {
    match e {
      Error::AllocatorFailed(layout) =>
        alloc::alloc::handle_alloc_error(layout),
    }
  }
}

impl Fail for AllocError {
  #[inline(always)]
  fn fail<T>(_: Error) -> Result<T, Self> {
    Err(AllocError)
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// List                                                                       //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

#[inline(always)]
fn new_node<T, A, E>(allocator: &A, value: T) -> Result<NonNull<Node<T>>, E>
where
  A: Allocator,
  E: Fail,
{
  let l = Layout::new::<Node<T>>();

  let Ok(p) = allocator.allocate(l) else {
    return E::fail(Error::AllocatorFailed(l));
  };

  let p = ptr::cast(p);
  unsafe { ptr::write(p, Node { value, next: None }) };
  Ok(p)
}

fn push<'a, T, A, E>(list: &'a mut List<T, A>, value: T) -> Result<&'a mut T, E>
where
  A: Allocator,
  E: Fail,
{
  // The node is allocated before the chain is touched, so a failed push
  // leaves the list exactly as it was.

  let node = new_node(&list.allocator, value)?;

  let mut curr = &mut list.root;

  while let Some(p) = *curr {
    curr = unsafe { &mut ptr::as_mut_ref(p).next };
  }

  *curr = Some(node);
  list.len = list.len + 1;

  Ok(unsafe { &mut ptr::as_mut_ref(node).value })
}

impl<T> List<T, Global> {
  /// Creates an empty list backed by the global allocator.

  pub const fn new() -> Self {
    Self {
      root: None,
      len: 0,
      allocator: Global,
      marker: PhantomData,
    }
  }
}

impl<T, A: Allocator> List<T, A> {
  /// Creates an empty list backed by the given allocator.

  pub fn new_in(allocator: A) -> Self {
    Self {
      root: None,
      len: 0,
      allocator,
      marker: PhantomData,
    }
  }

  /// The number of values in the list.

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.len
  }

  /// Whether the list holds no values.

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// A reference to the parent allocator.

  pub fn allocator(&self) -> &A {
    &self.allocator
  }

  /// Appends a value at the tail of the list and returns a reference to it.
  ///
  /// Takes time proportional to the current length of the list.
  ///
  /// # Panics
  ///
  /// Panics on failure to allocate memory.

  pub fn push(&mut self, value: T) -> &mut T {
    unwrap(push(self, value))
  }

  /// Appends a value at the tail of the list and returns a reference to it.
  ///
  /// Takes time proportional to the current length of the list.
  ///
  /// # Errors
  ///
  /// An error is returned on failure to allocate memory. The list is left
  /// unchanged.

  pub fn try_push(&mut self, value: T) -> Result<&mut T, AllocError> {
    push(self, value)
  }

  /// An iterator over the values of the list, from first to last.

  pub fn iter(&self) -> Iter<'_, T> {
    Iter {
      curr: self.root,
      len: self.len,
      marker: PhantomData,
    }
  }

  /// An iterator over the values of the list yielding mutable references,
  /// from first to last.

  pub fn iter_mut(&mut self) -> IterMut<'_, T> {
    IterMut {
      curr: self.root,
      len: self.len,
      marker: PhantomData,
    }
  }
}

impl<T, A: Allocator> Drop for List<T, A> {
  fn drop(&mut self) {
    let l = Layout::new::<Node<T>>();

    // STACK SPACE:
    //
    // The chain is freed with a loop, not recursion, so dropping a long list
    // uses constant stack.

    let mut curr = self.root;

    while let Some(p) = curr {
      curr = unsafe { ptr::as_ref(p) }.next;
      unsafe { ptr::drop_in_place(p) };
      unsafe { self.allocator.deallocate(ptr::cast(p), l) };
    }
  }
}

impl<T> Default for List<T, Global> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, A> fmt::Debug for List<T, A>
where
  T: fmt::Debug,
  A: Allocator,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T> FromIterator<T> for List<T, Global> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut list = Self::new();
    list.extend(iter);
    list
  }
}

impl<T, A: Allocator> Extend<T> for List<T, A> {
  fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
    // Walks to the tail once and keeps appending there. The observable order
    // is the same as with repeated `push` calls.

    let mut curr = &mut self.root;

    while let Some(p) = *curr {
      curr = unsafe { &mut ptr::as_mut_ref(p).next };
    }

    for value in iter {
      let node = unwrap(new_node(&self.allocator, value));
      *curr = Some(node);
      self.len = self.len + 1;
      curr = unsafe { &mut ptr::as_mut_ref(node).next };
    }
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a List<T, A> {
  type Item = &'a T;

  type IntoIter = Iter<'a, T>;

  #[inline(always)]
  fn into_iter(self) -> Iter<'a, T> {
    self.iter()
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut List<T, A> {
  type Item = &'a mut T;

  type IntoIter = IterMut<'a, T>;

  #[inline(always)]
  fn into_iter(self) -> IterMut<'a, T> {
    self.iter_mut()
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// Iter                                                                       //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl<'a, T> Iterator for Iter<'a, T> {
  type Item = &'a T;

  #[inline(always)]
  fn next(&mut self) -> Option<&'a T> {
    let p = self.curr?;
    let node = unsafe { ptr::as_ref(p) };
    self.curr = node.next;
    self.len = self.len - 1;
    Some(&node.value)
  }

  #[inline(always)]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.len, Some(self.len))
  }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> { }

impl<'a, T> FusedIterator for Iter<'a, T> { }

impl<'a, T> Clone for Iter<'a, T> {
  fn clone(&self) -> Self {
    Self {
      curr: self.curr,
      len: self.len,
      marker: PhantomData,
    }
  }
}

impl<'a, T> fmt::Debug for Iter<'a, T>
where
  T: fmt::Debug
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.clone()).finish()
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                                                            //
// IterMut                                                                    //
//                                                                            //
////////////////////////////////////////////////////////////////////////////////

impl<'a, T> Iterator for IterMut<'a, T> {
  type Item = &'a mut T;

  #[inline(always)]
  fn next(&mut self) -> Option<&'a mut T> {
    let p = self.curr?;
    let node = unsafe { ptr::as_mut_ref(p) };
    self.curr = node.next;
    self.len = self.len - 1;
    Some(&mut node.value)
  }

  #[inline(always)]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.len, Some(self.len))
  }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> { }

impl<'a, T> FusedIterator for IterMut<'a, T> { }

impl<'a, T> fmt::Debug for IterMut<'a, T>
where
  T: fmt::Debug
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // NB: Only the values not yet yielded are shown. None of them has an
    // outstanding mutable borrow, because handing one out advances `curr`
    // past it.

    let iter = Iter {
      curr: self.curr,
      len: self.len,
      marker: PhantomData,
    };

    f.debug_list().entries(iter).finish()
  }
}
