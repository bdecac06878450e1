//! Length-delimited framing of the TCP byte stream
//!
//! Every frame on the wire is laid out big-endian as
//!
//! ```text
//! +-----------+-------------+------------------+
//! | type: u16 | length: u32 | body: length B   |
//! +-----------+-------------+------------------+
//! ```
//!
//! The decoder accumulates partial reads and only yields a frame once the
//! header and the complete declared body are buffered. A declared length
//! above [`MAX_FRAME_BODY`] is a protocol violation; the stream is not
//! resynchronized.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the fixed header: 2 bytes of type plus 4 bytes of length
pub const HEADER_LEN: usize = 6;

/// Largest body the codec accepts
pub const MAX_FRAME_BODY: usize = 4 * 1024 * 1024;

/// One length-delimited protocol unit. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    msg_type: u16,
    body: Bytes,
}

impl Frame {
    pub fn new(msg_type: u16, body: impl Into<Bytes>) -> Result<Self, ProtocolError> {
        let body = body.into();
        if body.len() > MAX_FRAME_BODY {
            return Err(ProtocolError::FrameTooLarge {
                declared: body.len() as u64,
                max: MAX_FRAME_BODY,
            });
        }
        Ok(Self { msg_type, body })
    }

    pub fn msg_type(&self) -> u16 {
        self.msg_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.body.len()
    }

    /// Appends the wire representation of this frame to `dst`
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u16(self.msg_type);
        dst.put_u32(self.body.len() as u32);
        dst.extend_from_slice(&self.body);
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

/// Incremental frame decoder over an accumulating buffer
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Appends freshly received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Number of bytes received but not yet consumed by a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the next complete frame, or `Ok(None)` if more data is needed
    pub fn decode(&mut self) -> Result<Option<Frame>, ProtocolError> {
        if self.buffer.len() < HEADER_LEN {
            return Ok(None);
        }

        let msg_type = u16::from_be_bytes([self.buffer[0], self.buffer[1]]);
        let declared =
            u32::from_be_bytes([self.buffer[2], self.buffer[3], self.buffer[4], self.buffer[5]]);

        // Peers may write the length as a signed int; a set top bit is a
        // negative length there and is also over the limit.
        if declared as usize > MAX_FRAME_BODY {
            return Err(ProtocolError::FrameTooLarge {
                declared: declared as u64,
                max: MAX_FRAME_BODY,
            });
        }

        let length = declared as usize;
        if self.buffer.len() < HEADER_LEN + length {
            self.buffer.reserve(HEADER_LEN + length - self.buffer.len());
            return Ok(None);
        }

        self.buffer.advance(HEADER_LEN);
        let body = self.buffer.split_to(length).freeze();

        Ok(Some(Frame { msg_type, body }))
    }
}

/// Reads frames from any async byte stream
pub struct FrameReader<R> {
    inner: R,
    decoder: FrameDecoder,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(),
        }
    }

    /// Waits for the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly between
    /// frames, and [`ProtocolError::TruncatedFrame`] when it closed mid-frame.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        loop {
            if let Some(frame) = self.decoder.decode()? {
                return Ok(Some(frame));
            }

            let read = self.inner.read_buf(self.decoder.buffer_mut()).await?;
            if read == 0 {
                if self.decoder.buffered() == 0 {
                    return Ok(None);
                }
                return Err(ProtocolError::TruncatedFrame {
                    buffered: self.decoder.buffered(),
                });
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes one frame and flushes it
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &Frame,
) -> std::io::Result<()> {
    writer.write_all(&frame.encode()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big_body() -> Vec<u8> {
        let mut body = Vec::with_capacity(8192);
        body.extend(std::iter::repeat(b's').take(1024));
        body.extend(std::iter::repeat(b'v').take(2048));
        body.extend(std::iter::repeat(b'e').take(2048));
        body.extend(std::iter::repeat(b'n').take(3072));
        body
    }

    #[test]
    fn test_encode_layout() {
        let frame = Frame::new(6, &b"say hello"[..]).unwrap();
        let encoded = frame.encode();

        assert_eq!(encoded.len(), HEADER_LEN + 9);
        assert_eq!(&encoded[0..2], &[0, 6]);
        assert_eq!(&encoded[2..6], &[0, 0, 0, 9]);
        assert_eq!(&encoded[6..], b"say hello");
    }

    #[test]
    fn test_decode_two_frames_in_order() {
        let first = Frame::new(0, &b"say hello"[..]).unwrap();
        let second = Frame::new(1, big_body()).unwrap();

        let mut decoder = FrameDecoder::new();
        decoder.extend(&first.encode());
        decoder.extend(&second.encode());

        assert_eq!(decoder.decode().unwrap(), Some(first));
        assert_eq!(decoder.decode().unwrap(), Some(second));
        assert_eq!(decoder.decode().unwrap(), None);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decode_needs_more_data() {
        let frame = Frame::new(3, &b"partial body"[..]).unwrap();
        let encoded = frame.encode();

        let mut decoder = FrameDecoder::new();
        decoder.extend(&encoded[..4]);
        assert_eq!(decoder.decode().unwrap(), None);

        decoder.extend(&encoded[4..10]);
        assert_eq!(decoder.decode().unwrap(), None);

        decoder.extend(&encoded[10..]);
        assert_eq!(decoder.decode().unwrap(), Some(frame));
    }

    #[test]
    fn test_decode_byte_by_byte() {
        let frame = Frame::new(5, &b"one byte at a time"[..]).unwrap();
        let encoded = frame.encode();

        let mut decoder = FrameDecoder::new();
        let mut decoded = None;
        for byte in encoded.iter() {
            assert!(decoded.is_none());
            decoder.extend(&[*byte]);
            decoded = decoder.decode().unwrap();
        }

        assert_eq!(decoded, Some(frame));
    }

    #[test]
    fn test_empty_body_is_valid() {
        let frame = Frame::new(5, Bytes::new()).unwrap();
        assert!(frame.is_empty());

        let mut decoder = FrameDecoder::new();
        decoder.extend(&frame.encode());
        let decoded = decoder.decode().unwrap().unwrap();
        assert_eq!(decoded.msg_type(), 5);
        assert_eq!(decoded.len(), 0);
    }

    #[test]
    fn test_oversized_length_is_protocol_error() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0, 1]);
        decoder.extend(&((MAX_FRAME_BODY as u32) + 1).to_be_bytes());

        match decoder.decode() {
            Err(ProtocolError::FrameTooLarge { declared, max }) => {
                assert_eq!(declared, MAX_FRAME_BODY as u64 + 1);
                assert_eq!(max, MAX_FRAME_BODY);
            }
            other => panic!("expected FrameTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_signed_length_is_protocol_error() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&[0, 1]);
        decoder.extend(&(-1i32).to_be_bytes());
        assert!(matches!(
            decoder.decode(),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_frame_new_rejects_oversized_body() {
        let body = vec![0u8; MAX_FRAME_BODY + 1];
        assert!(Frame::new(0, body).is_err());
    }

    #[tokio::test]
    async fn test_reader_reassembles_fragmented_reads() {
        let first = Frame::new(4, &b"move"[..]).unwrap().encode();
        let second = Frame::new(5, &b"fire"[..]).unwrap().encode();

        let mock = tokio_test::io::Builder::new()
            .read(&first[..3])
            .read(&first[3..])
            .read(&second[..7])
            .read(&second[7..])
            .build();

        let mut reader = FrameReader::new(mock);

        let frame = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(frame.msg_type(), 4);
        assert_eq!(&frame.body()[..], b"move");

        let frame = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(frame.msg_type(), 5);
        assert_eq!(&frame.body()[..], b"fire");

        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_reports_truncated_frame() {
        let encoded = Frame::new(2, &b"cut short"[..]).unwrap().encode();

        let mock = tokio_test::io::Builder::new()
            .read(&encoded[..8])
            .build();

        let mut reader = FrameReader::new(mock);
        assert!(matches!(
            reader.read_frame().await,
            Err(ProtocolError::TruncatedFrame { buffered: 8 })
        ));
    }

    #[tokio::test]
    async fn test_write_frame() {
        let frame = Frame::new(1, &b"hello"[..]).unwrap();
        let expected = frame.encode();

        let mut mock = tokio_test::io::Builder::new().write(&expected).build();
        write_frame(&mut mock, &frame).await.unwrap();
    }
}
