//! Fixed-width element encoding for the file-backed store.
//!
//! Elements serialize to a fixed byte width in little-endian order, so a
//! chunk of N elements occupies exactly `N * WIDTH` bytes and any element
//! offset can be computed without scanning. Implemented for the primitive
//! integers, floats, and fixed-size byte arrays.

/// Element with a fixed little-endian byte encoding.
pub trait FixedElement: Sized {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Writes the encoding into `out`, which is exactly `WIDTH` bytes.
    fn encode_into(&self, out: &mut [u8]);

    /// Reads an element back from exactly `WIDTH` bytes.
    fn decode_from(src: &[u8]) -> Self;
}

macro_rules! fixed_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedElement for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn encode_into(&self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn decode_from(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(src);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

fixed_numeric!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<const N: usize> FixedElement for [u8; N] {
    const WIDTH: usize = N;

    fn encode_into(&self, out: &mut [u8]) {
        out.copy_from_slice(self);
    }

    fn decode_from(src: &[u8]) -> Self {
        let mut raw = [0u8; N];
        raw.copy_from_slice(src);
        raw
    }
}

/// Encodes a slice of elements into a contiguous byte buffer.
pub fn encode_slice<T: FixedElement>(items: &[T], out: &mut Vec<u8>) {
    out.clear();
    out.resize(items.len() * T::WIDTH, 0);
    for (item, raw) in items.iter().zip(out.chunks_exact_mut(T::WIDTH)) {
        item.encode_into(raw);
    }
}

/// Decodes a contiguous byte buffer into `out`, one element per `WIDTH`
/// bytes. `src.len()` must be `out.len() * WIDTH`.
pub fn decode_slice<T: FixedElement>(src: &[u8], out: &mut [T]) {
    debug_assert_eq!(src.len(), out.len() * T::WIDTH);
    for (slot, raw) in out.iter_mut().zip(src.chunks_exact(T::WIDTH)) {
        *slot = T::decode_from(raw);
    }
}
