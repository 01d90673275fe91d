//! Pixel encoding.
//!
//! Image caches store rows as raw bytes. The [`Pixel`] trait converts typed
//! pixel values to and from their little-endian byte form so consumers can
//! work with `u8`, `f32`, `[u16; 3]` and similar without touching the layout.

/// A fixed-size pixel value that can be stored in a cache row.
pub trait Pixel: Copy {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Encodes `self` into the first [`Self::SIZE`] bytes of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`Self::SIZE`].
    fn write_bytes(self, out: &mut [u8]);

    /// Decodes a value from the first [`Self::SIZE`] bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`Self::SIZE`].
    fn read_bytes(bytes: &[u8]) -> Self;

    /// Returns the encoded bytes as a fresh vector.
    fn to_bytes(self) -> Vec<u8> {
        let mut out = vec![0; Self::SIZE];
        self.write_bytes(&mut out);
        out
    }
}

macro_rules! impl_pixel_for_number {
    ($($t:ty),* $(,)?) => {
        $(
            impl Pixel for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn write_bytes(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                fn read_bytes(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_pixel_for_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<T: Pixel, const N: usize> Pixel for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn write_bytes(self, out: &mut [u8]) {
        for (chunk, channel) in out[..Self::SIZE].chunks_exact_mut(T::SIZE).zip(self) {
            channel.write_bytes(chunk);
        }
    }

    fn read_bytes(bytes: &[u8]) -> Self {
        std::array::from_fn(|i| T::read_bytes(&bytes[i * T::SIZE..(i + 1) * T::SIZE]))
    }
}
