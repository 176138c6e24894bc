//! Length-prefixed MySQL packet framing with sequence discipline.
//!
//! Layout: `[len:u24 LE][seq:u8][payload]`. Payloads of `0xFFFFFF` bytes
//! continue in the next packet; the chain ends at the first shorter packet
//! (possibly empty). Sequence numbers increment per packet and wrap at 256;
//! any mismatch is fatal to the connection.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::declar::{MAX_PACKET_PAYLOAD, PACKET_HEADER_SIZE};
use crate::error::{SResult, ServerError};

#[derive(Debug)]
pub struct PacketReader<R> {
    reader: R,
    expected_sequence: u8,
}

impl<R: AsyncRead + Unpin> PacketReader<R> {
    pub fn new(reader: R) -> Self {
        PacketReader {
            reader,
            expected_sequence: 0,
        }
    }

    pub fn reset_seq(&mut self) {
        self.expected_sequence = 0;
    }

    pub fn set_seq(&mut self, seq: u8) {
        self.expected_sequence = seq;
    }

    pub fn expected_seq(&self) -> u8 {
        self.expected_sequence
    }

    /// One logical payload, reassembled across a multi-packet chain.
    pub async fn read_packet(&mut self) -> SResult<Vec<u8>> {
        let mut payload = Vec::new();
        loop {
            let mut header = [0u8; PACKET_HEADER_SIZE];
            self.reader.read_exact(&mut header).await?;

            let len =
                header[0] as usize | (header[1] as usize) << 8 | (header[2] as usize) << 16;
            let seq = header[3];

            if seq != self.expected_sequence {
                return Err(ServerError::Protocol(format!(
                    "packet out of order: expected seq {}, got {}",
                    self.expected_sequence, seq
                )));
            }
            self.expected_sequence = self.expected_sequence.wrapping_add(1);

            let start = payload.len();
            payload.resize(start + len, 0);
            self.reader.read_exact(&mut payload[start..]).await?;

            if len < MAX_PACKET_PAYLOAD {
                return Ok(payload);
            }
        }
    }
}

#[derive(Debug)]
pub struct PacketWriter<W> {
    writer: W,
    sequence: u8,
}

impl<W: AsyncWrite + Unpin> PacketWriter<W> {
    pub fn new(writer: W) -> Self {
        PacketWriter {
            writer,
            sequence: 0,
        }
    }

    pub fn reset_seq(&mut self) {
        self.sequence = 0;
    }

    pub fn set_seq(&mut self, seq: u8) {
        self.sequence = seq;
    }

    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Split oversized payloads into maximal chunks; a payload that is an
    /// exact multiple of the chunk size gets an empty terminator packet.
    pub async fn write_packet(&mut self, payload: &[u8]) -> SResult<()> {
        let mut chunks = payload.chunks(MAX_PACKET_PAYLOAD);
        let mut wrote_max = false;

        loop {
            let chunk = match chunks.next() {
                Some(chunk) => chunk,
                None => {
                    if payload.is_empty() || wrote_max {
                        // empty payload, or terminator after an exact multiple
                        self.write_chunk(&[]).await?;
                    }
                    break;
                }
            };
            self.write_chunk(chunk).await?;
            wrote_max = chunk.len() == MAX_PACKET_PAYLOAD;
        }

        self.writer.flush().await?;
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> SResult<()> {
        let len = chunk.len();
        let header = [
            (len & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            ((len >> 16) & 0xFF) as u8,
            self.sequence,
        ];
        self.sequence = self.sequence.wrapping_add(1);
        self.writer.write_all(&header).await?;
        self.writer.write_all(chunk).await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> SResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use tokio::io::AsyncWriteExt;

    use crate::declar::MAX_PACKET_PAYLOAD;

    use super::{PacketReader, PacketWriter};

    #[tokio::test]
    async fn test_round_trip_small() {
        let (client, server) = tokio::io::duplex(1 << 20);
        let mut writer = PacketWriter::new(client);
        let mut reader = PacketReader::new(server);

        writer.write_packet(b"hello").await.unwrap();
        writer.write_packet(b"").await.unwrap();

        assert_eq!(b"hello".to_vec(), reader.read_packet().await.unwrap());
        assert_eq!(Vec::<u8>::new(), reader.read_packet().await.unwrap());
    }

    #[tokio::test]
    async fn test_sequence_discipline() {
        let (client, server) = tokio::io::duplex(1 << 16);
        let mut writer = PacketWriter::new(client);
        let mut reader = PacketReader::new(server);

        for i in 0..5u8 {
            writer.write_packet(&[i]).await.unwrap();
        }
        assert_eq!(5, writer.sequence());
        for i in 0..5u8 {
            assert_eq!(vec![i], reader.read_packet().await.unwrap());
        }

        // a stale sequence number on either side is fatal
        writer.reset_seq();
        writer.write_packet(b"x").await.unwrap();
        let err = reader.read_packet().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_sequence_wraps_at_256() {
        let (client, server) = tokio::io::duplex(1 << 16);
        let mut writer = PacketWriter::new(client);
        let mut reader = PacketReader::new(server);

        writer.set_seq(254);
        reader.set_seq(254);
        for _ in 0..4 {
            writer.write_packet(b"a").await.unwrap();
            reader.read_packet().await.unwrap();
        }
        // 254, 255, 0, 1
        assert_eq!(2, writer.sequence());
    }

    #[tokio::test]
    async fn test_multi_packet_payload() {
        let (client, server) = tokio::io::duplex(1 << 20);
        let mut writer = PacketWriter::new(client);
        let mut reader = PacketReader::new(server);

        let big = vec![0xABu8; MAX_PACKET_PAYLOAD + 17];
        let expected = big.clone();
        let handle = tokio::spawn(async move {
            writer.write_packet(&big).await.unwrap();
            writer
        });

        let seen = reader.read_packet().await.unwrap();
        assert_eq!(expected.len(), seen.len());
        assert_eq!(expected, seen);
        // two packets consumed
        let writer = handle.await.unwrap();
        assert_eq!(2, writer.sequence());
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_empty_terminator() {
        let (client, server) = tokio::io::duplex(1 << 20);
        let mut writer = PacketWriter::new(client);
        let mut reader = PacketReader::new(server);

        let big = vec![7u8; MAX_PACKET_PAYLOAD];
        let handle = tokio::spawn(async move {
            writer.write_packet(&big).await.unwrap();
            writer
        });

        let seen = reader.read_packet().await.unwrap();
        assert_eq!(MAX_PACKET_PAYLOAD, seen.len());
        // max-sized chunk plus the empty terminator
        let writer = handle.await.unwrap();
        assert_eq!(2, writer.sequence());
    }

    #[tokio::test]
    async fn test_short_header_is_fatal() {
        let (mut client, server) = tokio::io::duplex(1 << 16);
        let mut reader = PacketReader::new(server);

        client.write_all(&[1, 0]).await.unwrap();
        client.shutdown().await.unwrap();
        drop(client);

        assert!(reader.read_packet().await.is_err());
    }
}
