//! Fixed-width scalar slabs, either memory-mapped or owned.

use std::marker::PhantomData;
use std::sync::Arc;

use memmap2::Mmap;

use crate::storage::Dtype;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for i64 {}
}

/// Scalar element types the store can hold. Sealed: the on-disk format
/// enumerates exactly these widths.
pub trait Scalar: Copy + Send + Sync + sealed::Sealed + 'static {
    const DTYPE: Dtype;
}

impl Scalar for u8 {
    const DTYPE: Dtype = Dtype::U8;
}
impl Scalar for u16 {
    const DTYPE: Dtype = Dtype::U16;
}
impl Scalar for u32 {
    const DTYPE: Dtype = Dtype::U32;
}
impl Scalar for u64 {
    const DTYPE: Dtype = Dtype::U64;
}
impl Scalar for i64 {
    const DTYPE: Dtype = Dtype::I64;
}

/// A typed window into a memory-mapped file.
///
/// The mapping is read-only and the backing file is immutable by store
/// contract, so handing out `&[T]` views is sound as long as offset,
/// length and alignment were validated against the file header first.
#[derive(Clone, Debug)]
pub struct MappedSlice<T> {
    mmap: Arc<Mmap>,
    offset: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Scalar> MappedSlice<T> {
    /// Caller must have verified `offset + len * size_of::<T>()` is in
    /// bounds and `offset` is a multiple of `align_of::<T>()`.
    pub(crate) fn new(mmap: Arc<Mmap>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len * std::mem::size_of::<T>() <= mmap.len());
        debug_assert_eq!(offset % std::mem::align_of::<T>(), 0);
        Self {
            mmap,
            offset,
            len,
            _marker: PhantomData,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        // Safety: bounds and alignment validated at construction; the
        // mapping is private+read-only and outlives `self`.
        unsafe {
            std::slice::from_raw_parts(
                self.mmap.as_ptr().add(self.offset) as *const T,
                self.len,
            )
        }
    }
}

/// An immutable scalar slab.
///
/// `Mapped` is the normal case: a zero-copy view of a store file. `Owned`
/// backs computed indices that were (re)built in memory because the store
/// predates them. Cloning is cheap in both cases.
#[derive(Clone, Debug)]
pub enum Array<T: Scalar> {
    Mapped(MappedSlice<T>),
    Owned(Arc<[T]>),
}

impl<T: Scalar> Array<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Array::Mapped(m) => m.as_slice(),
            Array::Owned(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Array::Mapped(m) => m.len,
            Array::Owned(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }
}

impl<T: Scalar> From<Vec<T>> for Array<T> {
    fn from(values: Vec<T>) -> Self {
        Array::Owned(values.into())
    }
}
