//! # ltfec - Luby Transform Fountain Codes
//!
//! A rateless erasure code over XOR. The encoder turns a payload of `K`
//! equal-sized chunks into an unbounded stream of encoded packets; any
//! sufficient subset of those packets (slightly more than `K`, in any
//! order) reconstructs the payload. No retransmission requests flow in
//! either direction: recovery is driven purely by packet arrival.
//!
//! Each packet XORs together a pseudo-random set of source chunks. The
//! set is derived from a 32-bit seed carried in the packet, so the
//! decoder can recompute it bit-for-bit. The decoder is a peeling
//! (belief-propagation) decoder: packets with a single unknown chunk
//! resolve immediately, everything else parks in a deferred pool that is
//! swept again after every new resolution.
//!
//! The crate never opens files or sockets. The encoder reads a borrowed
//! byte slice; the decoder writes a borrowed mutable byte region. Wire
//! framing and transport are the caller's business.
//!
//! # Example
//!
//! ```rust
//! use ltfec::{Decoder, Encoder};
//!
//! let payload = b"abcdefghijklmnop";
//! let mut encoder = Encoder::new(payload, 14, 4).unwrap();
//!
//! let mut destination = vec![0u8; payload.len()];
//! let mut decoder = Decoder::new(&mut destination, payload.len() as u64, 4).unwrap();
//!
//! let report = decoder.run(&mut encoder.by_ref().take(64));
//! assert!(report.complete);
//!
//! drop(decoder);
//! assert_eq!(&destination[..], payload);
//! ```

pub mod chunks;
pub mod decoder;
pub mod encoder;
pub mod rng;
pub mod select;
pub mod source;

pub use chunks::{chunk_count, ChunkView, ChunkViewMut};
pub use decoder::{DecodeReport, Decoder, PacketOutcome, PreparedPacket};
pub use encoder::{transform, Encoder, Packet};
pub use rng::{Distribution, Xoshiro256};
pub use select::{chunk_set, select};
pub use source::{PacketChannel, PacketSender, PacketSource};

/// Error type for fountain code operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid parameter values (zero chunk size, or chunk count overflow)
    InvalidParams,
    /// Destination region is smaller than the payload it must hold
    ShortDestination,
    /// Packet's payload_size or chunk_size disagrees with the decoder
    PacketMismatch,
    /// Packet data is longer than the configured chunk size
    OversizedData,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParams => write!(f, "invalid codec parameters"),
            Error::ShortDestination => write!(f, "destination region shorter than payload"),
            Error::PacketMismatch => write!(f, "packet geometry disagrees with decoder"),
            Error::OversizedData => write!(f, "packet data exceeds chunk size"),
        }
    }
}

impl std::error::Error for Error {}

/// Encoder/decoder parameters.
///
/// Both sides derive the chunk count `K = ceil(payload_size / chunk_size)`
/// from the same pair of values, so a `Params` built from a packet's
/// header fields is identical to the encoder's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Total payload size in bytes.
    payload_size: u64,
    /// Size of each chunk in bytes (the last chunk may be shorter).
    chunk_size: u32,
    /// Number of chunks the payload divides into.
    chunk_count: u32,
}

impl Params {
    /// Default chunk size in bytes, sized for common datagram MTUs.
    pub const DEFAULT_CHUNK_SIZE: u32 = 1024;

    /// Create new codec parameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParams` if `chunk_size` is zero or the
    /// derived chunk count does not fit in a `u32`.
    pub fn new(payload_size: u64, chunk_size: u32) -> Result<Self, Error> {
        if chunk_size == 0 {
            return Err(Error::InvalidParams);
        }
        let count = chunk_count(payload_size, chunk_size);
        if count > u32::MAX as u64 {
            return Err(Error::InvalidParams);
        }
        Ok(Self {
            payload_size,
            chunk_size,
            chunk_count: count as u32,
        })
    }

    #[inline]
    pub fn payload_size(&self) -> u64 {
        self.payload_size
    }

    #[inline]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    #[inline]
    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }
}

// =============================================================================
// XOR Primitives
// =============================================================================

/// XOR two byte arrays into a fresh array.
///
/// The result has length `max(a.len(), b.len())`. Overlapping bytes are
/// XORed; the tail of the longer input is copied through unchanged.
/// Neither input is mutated.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    let (longer, shorter) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = longer.to_vec();
    for (o, s) in out.iter_mut().zip(shorter.iter()) {
        *o ^= s;
    }
    out
}

/// Left-fold a sequence of byte arrays with [`xor`].
///
/// Returns `None` for an empty sequence. The fold is commutative and
/// associative, and the result's length equals the maximum length in the
/// sequence.
pub fn combine<I>(parts: I) -> Option<Vec<u8>>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut iter = parts.into_iter();
    let first = iter.next()?.as_ref().to_vec();
    Some(iter.fold(first, |acc, part| xor(&acc, part.as_ref())))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_equal_lengths() {
        let out = xor(b"abcd", b"efgh");
        assert_eq!(out.len(), 4);
        for i in 0..4 {
            assert_eq!(out[i] ^ b"abcd"[i], b"efgh"[i]);
        }
    }

    #[test]
    fn test_xor_disparate_lengths() {
        let out = xor(b"abcd", b"efg");
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], b'a' ^ b'e');
        assert_eq!(out[1], b'b' ^ b'f');
        assert_eq!(out[2], b'c' ^ b'g');
        assert_eq!(out[3], b'd');

        // Argument order does not matter
        assert_eq!(xor(b"efg", b"abcd"), out);
    }

    #[test]
    fn test_xor_involution() {
        let a = b"some payload bytes";
        let b = b"other bytes, equals";
        let folded = xor(&xor(a, b), b);
        assert_eq!(&folded[..a.len()], a);
    }

    #[test]
    fn test_combine_empty() {
        let parts: Vec<Vec<u8>> = vec![];
        assert_eq!(combine(parts), None);
    }

    #[test]
    fn test_combine_single() {
        assert_eq!(combine([b"abc"]).unwrap(), b"abc");
    }

    #[test]
    fn test_combine_recovers_member() {
        let one = b"rnmen";
        let two = b"there";
        let three = b"nt, t";

        let x = combine([&one[..], &two[..], &three[..]]).unwrap();
        assert_eq!(x, vec![0x68, 0x72, 0x24, 0x37, 0x7F]);

        // XORing the fold with two members recovers the third
        let recovered = combine([&one[..], &two[..], &x[..]]).unwrap();
        assert_eq!(recovered, three);
    }

    #[test]
    fn test_combine_commutative() {
        let parts = [&b"abcd"[..], b"ef", b"ghijk", b"l"];
        let forward = combine(parts).unwrap();
        let reversed = combine(parts.iter().rev()).unwrap();
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 5);
    }

    #[test]
    fn test_params_validation() {
        assert_eq!(Params::new(100, 0), Err(Error::InvalidParams));

        let params = Params::new(113, 5).unwrap();
        assert_eq!(params.chunk_count(), 23);
        assert_eq!(params.chunk_size(), 5);
        assert_eq!(params.payload_size(), 113);

        // Empty payload is valid and has zero chunks
        assert_eq!(Params::new(0, 4).unwrap().chunk_count(), 0);
    }

    #[test]
    fn test_params_chunk_count_overflow() {
        assert_eq!(Params::new(u64::MAX, 1), Err(Error::InvalidParams));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::InvalidParams.to_string(), "invalid codec parameters");
        assert_eq!(
            Error::PacketMismatch.to_string(),
            "packet geometry disagrees with decoder"
        );
    }
}
