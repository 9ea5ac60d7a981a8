//! Fixed-size symbol payloads.
//!
//! Every symbol stores a value of constant byte width. Values are encoded
//! little-endian so an object's data block is a plain byte vector and a
//! transaction backup is a byte copy.

use crate::ids::{Atom, ObjectId};

/// A value that can live in a symbol slot.
///
/// `encode` is always handed a slice of exactly [`Payload::SIZE`] bytes, and
/// `decode` always receives one.
pub trait Payload: Copy + Send + Sync + 'static {
	/// Width of the encoded value in bytes.
	const SIZE: usize;

	/// Writes the value into `out`.
	fn encode(self, out: &mut [u8]);

	/// Reads a value back from `bytes`.
	fn decode(bytes: &[u8]) -> Self;

	/// Encodes into a freshly allocated buffer.
	fn to_bytes(self) -> Vec<u8> {
		let mut out = vec![0; Self::SIZE];
		self.encode(&mut out);
		out
	}
}

macro_rules! int_payload {
	($($ty:ty),* $(,)?) => {
		$(
			impl Payload for $ty {
				const SIZE: usize = core::mem::size_of::<$ty>();

				#[inline]
				fn encode(self, out: &mut [u8]) {
					out.copy_from_slice(&self.to_le_bytes());
				}

				#[inline]
				fn decode(bytes: &[u8]) -> Self {
					let mut raw = [0u8; core::mem::size_of::<$ty>()];
					raw.copy_from_slice(bytes);
					<$ty>::from_le_bytes(raw)
				}
			}
		)*
	};
}

int_payload!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Payload for usize {
	const SIZE: usize = 8;

	fn encode(self, out: &mut [u8]) {
		(self as u64).encode(out);
	}

	fn decode(bytes: &[u8]) -> Self {
		u64::decode(bytes) as usize
	}
}

impl Payload for bool {
	const SIZE: usize = 1;

	fn encode(self, out: &mut [u8]) {
		out[0] = self as u8;
	}

	fn decode(bytes: &[u8]) -> Self {
		bytes[0] != 0
	}
}

impl Payload for char {
	const SIZE: usize = 4;

	fn encode(self, out: &mut [u8]) {
		(self as u32).encode(out);
	}

	fn decode(bytes: &[u8]) -> Self {
		char::from_u32(u32::decode(bytes)).unwrap_or(char::REPLACEMENT_CHARACTER)
	}
}

impl Payload for Atom {
	const SIZE: usize = 4;

	fn encode(self, out: &mut [u8]) {
		self.as_u32().encode(out);
	}

	fn decode(bytes: &[u8]) -> Self {
		Atom::from_u32(u32::decode(bytes))
	}
}

impl Payload for ObjectId {
	const SIZE: usize = 4;

	fn encode(self, out: &mut [u8]) {
		self.as_u32().encode(out);
	}

	fn decode(bytes: &[u8]) -> Self {
		ObjectId::from_u32(u32::decode(bytes))
	}
}

/// Zero encodes `None`, so a zero-initialized slot reads as no object.
impl Payload for Option<ObjectId> {
	const SIZE: usize = 4;

	fn encode(self, out: &mut [u8]) {
		let raw = self.map_or(0, |id| id.as_u32() + 1);
		raw.encode(out);
	}

	fn decode(bytes: &[u8]) -> Self {
		match u32::decode(bytes) {
			0 => None,
			raw => Some(ObjectId::from_u32(raw - 1)),
		}
	}
}
