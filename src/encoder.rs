//! Rateless packet encoder.
//!
//! [`Encoder`] is a lazy infinite iterator over [`Packet`]s. Each step
//! pulls one 32-bit seed from a stream keyed by the top-level seed,
//! derives that seed's chunk set, and XOR-combines the selected source
//! chunks. Nothing is computed until the consumer asks for the next
//! packet, so cancellation is simply ceasing to pull.

use rand::Rng;

use crate::chunks::ChunkView;
use crate::rng::Xoshiro256;
use crate::select::chunk_set;
use crate::{combine, Error, Params};

/// One encoded block.
///
/// `seed` and the payload geometry are everything the decoder needs to
/// recompute which source chunks were XORed into `data`. Wire framing of
/// these fields is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Per-packet seed; reproduces the chunk-index set.
    pub seed: u32,
    /// Total payload size in bytes.
    pub payload_size: u64,
    /// Chunk size in bytes.
    pub chunk_size: u32,
    /// XOR of the source chunks in this packet's index set.
    /// Length is at most `chunk_size`.
    pub data: Vec<u8>,
}

/// Lazy infinite packet stream over a borrowed source payload.
///
/// The stream is empty when the payload is empty (`K = 0`) and infinite
/// otherwise. Pulling a packet reads the selected chunks and allocates
/// one output array; the source is never copied wholesale.
#[derive(Debug, Clone)]
pub struct Encoder<'a> {
    view: ChunkView<'a>,
    params: Params,
    /// Top-level seed the per-packet seed stream was keyed with.
    seed: u32,
    /// Per-packet seed stream.
    seeds: Xoshiro256,
}

impl<'a> Encoder<'a> {
    /// Create an encoder over `source` with the given top-level seed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParams` if `chunk_size` is zero.
    pub fn new(source: &'a [u8], seed: u32, chunk_size: u32) -> Result<Self, Error> {
        let params = Params::new(source.len() as u64, chunk_size)?;
        Ok(Self {
            view: ChunkView::new(source, chunk_size),
            params,
            seed,
            seeds: Xoshiro256::from_seed(seed),
        })
    }

    /// Create an encoder with a randomly chosen top-level seed.
    pub fn with_random_seed(source: &'a [u8], chunk_size: u32) -> Result<Self, Error> {
        Self::new(source, rand::thread_rng().gen(), chunk_size)
    }

    /// The top-level seed this stream was keyed with.
    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    pub fn params(&self) -> Params {
        self.params
    }
}

impl Iterator for Encoder<'_> {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        let k = self.params.chunk_count();
        if k == 0 {
            return None;
        }

        let seed = self.seeds.next_u32();
        let indices = chunk_set(seed, k);

        // Empty when every draw cancelled; such a packet carries nothing
        // and the decoder discards it as redundant.
        let data = combine(indices.iter().map(|&i| self.view.read(i))).unwrap_or_default();

        Some(Packet {
            seed,
            payload_size: self.params.payload_size(),
            chunk_size: self.params.chunk_size(),
            data,
        })
    }
}

/// Open a lazy packet stream over `source`.
///
/// Equivalent to [`Encoder::new`]; named entry point for the encode
/// operation.
pub fn transform(source: &[u8], seed: u32, chunk_size: u32) -> Result<Encoder<'_>, Error> {
    Encoder::new(source, seed, chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::chunk_set;
    use crate::xor;

    #[test]
    fn test_empty_payload_yields_empty_stream() {
        let mut encoder = Encoder::new(b"", 7, 4).unwrap();
        assert_eq!(encoder.next(), None);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(Encoder::new(b"abc", 7, 0), Err(Error::InvalidParams)));
    }

    #[test]
    fn test_deterministic_stream() {
        let payload = b"abcdefghijklmnop";
        let first: Vec<Packet> = Encoder::new(payload, 14, 4).unwrap().take(10).collect();
        let again: Vec<Packet> = Encoder::new(payload, 14, 4).unwrap().take(10).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_packet_seed_stream_matches_generator() {
        let payload = b"abcdefghijklmnop";
        let seeds: Vec<u32> = Encoder::new(payload, 14, 4)
            .unwrap()
            .take(4)
            .map(|p| p.seed)
            .collect();
        assert_eq!(seeds, [3_100_139_927, 2_688_647_961, 3_976_212_099, 4_049_240_913]);
    }

    #[test]
    fn test_packet_data_is_combine_of_chunk_set() {
        let payload = b"abcdefghijklmnop";
        let encoder = Encoder::new(payload, 14, 4).unwrap();
        let params = encoder.params();

        for packet in encoder.take(16) {
            assert_eq!(packet.payload_size, 16);
            assert_eq!(packet.chunk_size, 4);
            assert!(packet.data.len() <= 4);

            let indices = chunk_set(packet.seed, params.chunk_count());
            let mut expected = Vec::new();
            for &i in &indices {
                let start = i as usize * 4;
                expected = xor(&expected, &payload[start..start + 4]);
            }
            assert_eq!(packet.data, expected);
        }
    }

    #[test]
    fn test_degree_one_packets_carry_a_chunk_verbatim() {
        let payload = b"abcdefghijklmnop";
        for packet in Encoder::new(payload, 14, 4).unwrap().take(32) {
            let indices = chunk_set(packet.seed, 4);
            if indices.len() == 1 {
                let i = *indices.iter().next().unwrap() as usize;
                assert_eq!(packet.data, &payload[i * 4..i * 4 + 4]);
            }
        }
    }

    #[test]
    fn test_single_chunk_payload() {
        // K = 1: every packet is chunk 0 verbatim
        let payload = b"xyz";
        for packet in Encoder::new(payload, 5, 4).unwrap().take(8) {
            assert_eq!(packet.data, b"xyz");
        }
    }

    #[test]
    fn test_short_final_chunk_data_length() {
        // 11 bytes, C=4: chunks are 4, 4, 3 bytes. A degree-1 packet of
        // chunk 2 must carry 3 bytes, not 4.
        let payload = b"abcdefghijk";
        for packet in Encoder::new(payload, 21, 4).unwrap().take(64) {
            let indices = chunk_set(packet.seed, 3);
            if indices.iter().all(|&i| i == 2) && indices.len() == 1 {
                assert_eq!(packet.data, b"ijk");
            }
        }
    }

    #[test]
    fn test_random_seed_constructor() {
        let encoder = Encoder::with_random_seed(b"abcdefgh", 4).unwrap();
        // The chosen seed is observable so the caller can transmit it
        let _ = encoder.seed();
    }
}
