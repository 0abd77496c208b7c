//! Packet delivery seam.
//!
//! The decoder pulls packets through the [`PacketSource`] trait, so it
//! can be driven by an in-process encoder, a replayed capture, or bytes
//! arriving off a transport the caller owns. Any `Iterator` over
//! [`Packet`]s is a source; [`PacketChannel::pair`] provides an
//! in-memory conduit for tests and demos.

use std::sync::mpsc;

use crate::Packet;

/// A pull-based source of encoded packets.
pub trait PacketSource {
    /// Next packet, or `None` when the stream is exhausted.
    fn next_packet(&mut self) -> Option<Packet>;
}

impl<I: Iterator<Item = Packet>> PacketSource for I {
    fn next_packet(&mut self) -> Option<Packet> {
        self.next()
    }
}

/// Sending half of an in-memory packet conduit.
#[derive(Debug, Clone)]
pub struct PacketSender {
    tx: mpsc::Sender<Packet>,
}

impl PacketSender {
    /// Queue a packet for the receiving half.
    ///
    /// Returns the packet back if the receiver is gone.
    pub fn send(&self, packet: Packet) -> Result<(), Packet> {
        self.tx.send(packet).map_err(|err| err.0)
    }
}

/// Receiving half of an in-memory packet conduit.
///
/// Iterating blocks until a packet arrives and ends once every sender
/// has been dropped, so a decoder driven from a channel terminates when
/// the feeding side hangs up. Being an `Iterator`, the channel is a
/// [`PacketSource`] through the blanket impl.
#[derive(Debug)]
pub struct PacketChannel {
    rx: mpsc::Receiver<Packet>,
}

impl PacketChannel {
    /// Create a connected sender/receiver pair.
    pub fn pair() -> (PacketSender, PacketChannel) {
        let (tx, rx) = mpsc::channel();
        (PacketSender { tx }, PacketChannel { rx })
    }

    /// Non-blocking poll for a queued packet.
    pub fn poll_packet(&mut self) -> Option<Packet> {
        self.rx.try_recv().ok()
    }
}

impl Iterator for PacketChannel {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform;

    #[test]
    fn test_iterator_is_a_source() {
        let packets: Vec<Packet> = transform(b"abcdefgh", 3, 4).unwrap().take(3).collect();
        let mut source = packets.clone().into_iter();
        assert_eq!(source.next_packet(), Some(packets[0].clone()));
        assert_eq!(source.next_packet(), Some(packets[1].clone()));
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (tx, mut rx) = PacketChannel::pair();
        let packets: Vec<Packet> = transform(b"abcdefgh", 3, 4).unwrap().take(4).collect();
        for p in &packets {
            tx.send(p.clone()).unwrap();
        }
        drop(tx);

        let mut received = Vec::new();
        while let Some(p) = rx.next_packet() {
            received.push(p);
        }
        assert_eq!(received, packets);
    }

    #[test]
    fn test_poll_on_empty_channel() {
        let (_tx, mut rx) = PacketChannel::pair();
        assert!(rx.poll_packet().is_none());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = PacketChannel::pair();
        drop(rx);
        let packet = transform(b"abcd", 1, 4).unwrap().next().unwrap();
        assert_eq!(tx.send(packet.clone()), Err(packet));
    }
}
