//! Peeling (belief-propagation) decoder.
//!
//! The decoder owns three pieces of state: the set of chunk indices it
//! has already resolved, a deferred pool of packets that still reference
//! two or more unknown chunks, and a mutable chunk view over the
//! caller's destination region.
//!
//! Every incoming packet's index set is recomputed from its seed and
//! partitioned against the resolved set. A packet with no unknown
//! indices is redundant and dropped. A packet with exactly one unknown
//! index resolves that chunk immediately: XORing the packet data with
//! the already-resolved chunks it references leaves the missing chunk's
//! bytes. Anything else parks in the deferred pool with its original
//! data intact; the pool is re-partitioned against the live resolved set
//! on every cascade pass, so contributions are folded in only at the
//! moment a deferred packet finally resolves.
//!
//! Decoding has no failure state of its own. If the packet source dries
//! up early the decoder simply stops, leaving the destination partially
//! populated; the caller reads the report to detect under-delivery.

use std::collections::BTreeSet;

use crate::chunks::ChunkViewMut;
use crate::select::chunk_set;
use crate::source::PacketSource;
use crate::{xor, Error, Packet, Params};

/// A packet whose index set has been computed but which is not yet
/// resolvable.
///
/// `data` stays exactly as received; known-chunk contributions are
/// folded in only when the packet resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPacket {
    /// Effective chunk-index set, deduplicated.
    pub indices: BTreeSet<u32>,
    /// XOR of the source chunks at `indices`.
    pub data: Vec<u8>,
}

/// What the decoder did with one accepted packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// Every referenced chunk was already resolved; nothing to learn.
    Redundant,
    /// The packet resolved `index` directly and the cascade resolved
    /// `cascaded` further chunks out of the deferred pool.
    Resolved { index: u32, cascaded: u32 },
    /// Two or more referenced chunks are unknown; parked for later.
    Deferred,
}

/// Summary of a [`Decoder::run`] drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Packets pulled from the source, including rejected ones.
    pub packets_consumed: u64,
    /// Packets rejected as malformed.
    pub rejected: u64,
    /// Packets discarded as redundant.
    pub redundant: u64,
    /// Chunks resolved so far (out of `K`).
    pub resolved: u32,
    /// Packets still parked in the deferred pool.
    pub deferred: usize,
    /// True when every chunk has been resolved.
    pub complete: bool,
}

/// Peeling decoder over a borrowed destination region.
///
/// The decoder holds exclusive mutable access to the destination for its
/// lifetime. Resolved chunks are written exactly once and never
/// rewritten.
#[derive(Debug)]
pub struct Decoder<'a> {
    view: ChunkViewMut<'a>,
    params: Params,
    resolved: BTreeSet<u32>,
    deferred: Vec<PreparedPacket>,
}

impl<'a> Decoder<'a> {
    /// Create a decoder writing into `destination`.
    ///
    /// `payload_size` and `chunk_size` are the expected geometry; every
    /// packet must carry the same values.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParams` if `chunk_size` is zero, or
    /// `Error::ShortDestination` if the region cannot hold the payload.
    pub fn new(
        destination: &'a mut [u8],
        payload_size: u64,
        chunk_size: u32,
    ) -> Result<Self, Error> {
        let params = Params::new(payload_size, chunk_size)?;
        if (destination.len() as u64) < payload_size {
            return Err(Error::ShortDestination);
        }
        let region = &mut destination[..payload_size as usize];
        Ok(Self {
            view: ChunkViewMut::new(region, chunk_size),
            params,
            resolved: BTreeSet::new(),
            deferred: Vec::new(),
        })
    }

    #[inline]
    pub fn params(&self) -> Params {
        self.params
    }

    /// True once every chunk has been resolved.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.resolved.len() as u32 == self.params.chunk_count()
    }

    /// Number of chunks resolved so far.
    #[inline]
    pub fn resolved_count(&self) -> u32 {
        self.resolved.len() as u32
    }

    /// Number of chunks still unknown.
    #[inline]
    pub fn missing_count(&self) -> u32 {
        self.params.chunk_count() - self.resolved_count()
    }

    /// Number of packets parked in the deferred pool.
    #[inline]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Forget all progress. Destination bytes are left as written.
    pub fn reset(&mut self) {
        self.resolved.clear();
        self.deferred.clear();
    }

    /// Feed one packet to the decoder.
    ///
    /// # Errors
    ///
    /// Rejects the packet without touching any state when its geometry
    /// disagrees with the decoder (`Error::PacketMismatch`) or its data
    /// exceeds the chunk size (`Error::OversizedData`). The caller
    /// decides whether to keep feeding.
    pub fn absorb(&mut self, packet: &Packet) -> Result<PacketOutcome, Error> {
        if packet.payload_size != self.params.payload_size()
            || packet.chunk_size != self.params.chunk_size()
        {
            return Err(Error::PacketMismatch);
        }
        if packet.data.len() as u64 > self.params.chunk_size() as u64 {
            return Err(Error::OversizedData);
        }

        let indices = chunk_set(packet.seed, self.params.chunk_count());
        let unknown: Vec<u32> = indices.difference(&self.resolved).copied().collect();

        match unknown.as_slice() {
            [] => Ok(PacketOutcome::Redundant),
            [index] => {
                let index = *index;
                self.resolve(index, &packet.data, &indices);
                let cascaded = self.cascade();
                Ok(PacketOutcome::Resolved { index, cascaded })
            }
            _ => {
                self.deferred.push(PreparedPacket {
                    indices,
                    data: packet.data.clone(),
                });
                Ok(PacketOutcome::Deferred)
            }
        }
    }

    /// Drive the decoder from a packet source until the payload is
    /// complete or the source is exhausted.
    ///
    /// Malformed packets are counted and skipped; the report carries
    /// everything needed to diagnose an under-delivered stream.
    pub fn run<S: PacketSource>(&mut self, source: &mut S) -> DecodeReport {
        let mut report = DecodeReport::default();

        while !self.is_complete() {
            let Some(packet) = source.next_packet() else {
                break;
            };
            report.packets_consumed += 1;
            match self.absorb(&packet) {
                Ok(PacketOutcome::Redundant) => report.redundant += 1,
                Ok(_) => {}
                Err(_) => report.rejected += 1,
            }
        }

        report.resolved = self.resolved_count();
        report.deferred = self.deferred.len();
        report.complete = self.is_complete();
        report
    }

    /// Write the bytes for `index`, recovered from `data` by folding in
    /// the packet's already-resolved chunks.
    fn resolve(&mut self, index: u32, data: &[u8], indices: &BTreeSet<u32>) {
        debug_assert!(!self.resolved.contains(&index));

        let mut bytes = data.to_vec();
        for &known in indices {
            if known != index && self.resolved.contains(&known) {
                bytes = xor(&bytes, &self.view.read(known));
            }
        }
        self.view.write(index, &bytes);
        self.resolved.insert(index);
    }

    /// Sweep the deferred pool until a full pass resolves nothing.
    ///
    /// Returns the number of chunks resolved. Each pass re-partitions
    /// every parked packet against the live resolved set; newly resolved
    /// chunks can unlock further packets, hence the outer loop.
    fn cascade(&mut self) -> u32 {
        let mut total = 0;
        loop {
            let mut progressed = false;
            let mut i = 0;
            while i < self.deferred.len() {
                let mut remaining = self
                    .deferred[i]
                    .indices
                    .difference(&self.resolved)
                    .copied();
                let first = remaining.next();
                let second = remaining.next();
                drop(remaining);

                match (first, second) {
                    // Fully covered by now: the packet carries nothing new
                    (None, _) => {
                        self.deferred.swap_remove(i);
                    }
                    (Some(index), None) => {
                        let packet = self.deferred.swap_remove(i);
                        self.resolve(index, &packet.data, &packet.indices);
                        total += 1;
                        progressed = true;
                    }
                    _ => i += 1,
                }
            }
            if !progressed {
                return total;
            }
        }
    }
}
