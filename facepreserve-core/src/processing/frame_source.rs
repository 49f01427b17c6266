//! Raw frame reading from a decoder byte stream.
//!
//! The decoder writes headerless rgb24 frames back to back, so framing is pure
//! arithmetic: every frame is exactly `width * height * 3` bytes. A clean end
//! of stream is a read that returns nothing at a frame boundary; anything
//! between zero and a full frame is a [`CoreError::Framing`] error.

use std::io::{self, Read};

use crate::error::{CoreError, CoreResult};
use crate::media::VideoInfo;

/// One decoded frame, interleaved 8-bit RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based position in decode order
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Exactly `width * height * 3` bytes, row-major
    pub data: Vec<u8>,
}

impl Frame {
    /// RGB triple at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }
}

/// Anything that yields frames in decode order.
pub trait FrameReader {
    /// Returns the next frame, or `Ok(None)` once the stream is exhausted.
    fn next_frame(&mut self) -> CoreResult<Option<Frame>>;
}

/// Frame reader over any byte stream (a decoder pipe in production).
///
/// Holds at most one frame at a time; each call hands ownership of a fresh
/// buffer to the caller.
pub struct FrameSource<R: Read> {
    reader: R,
    width: u32,
    height: u32,
    frame_size: usize,
    frames_read: u64,
    exhausted: bool,
}

impl<R: Read> FrameSource<R> {
    pub fn new(reader: R, info: &VideoInfo) -> Self {
        Self {
            reader,
            width: info.width,
            height: info.height,
            frame_size: info.frame_size(),
            frames_read: 0,
            exhausted: false,
        }
    }

    /// Number of complete frames handed out so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Whether end-of-stream has been observed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Discards everything left in the stream and marks it exhausted.
    ///
    /// Returns the number of bytes thrown away.
    pub fn drain(&mut self) -> CoreResult<u64> {
        if self.exhausted {
            return Ok(0);
        }
        let discarded = io::copy(&mut self.reader, &mut io::sink())?;
        self.exhausted = true;
        if discarded > 0 {
            log::debug!("Discarded {} unread bytes from decoder output", discarded);
        }
        Ok(discarded)
    }

    /// Fills `buf` as far as the stream allows, retrying short and interrupted reads.
    fn read_full(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FrameReader for FrameSource<R> {
    fn next_frame(&mut self) -> CoreResult<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut data = vec![0u8; self.frame_size];
        let filled = self.read_full(&mut data)?;

        if filled == 0 {
            self.exhausted = true;
            log::debug!("Decoder stream ended after {} frames", self.frames_read);
            return Ok(None);
        }
        if filled < self.frame_size {
            self.exhausted = true;
            log::error!(
                "Short read after frame {}: got {} of {} bytes",
                self.frames_read,
                filled,
                self.frame_size
            );
            return Err(CoreError::Framing {
                expected: self.frame_size,
                received: filled,
            });
        }

        let frame = Frame {
            index: self.frames_read,
            width: self.width,
            height: self.height,
            data,
        };
        self.frames_read += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FrameRate;
    use std::io::Cursor;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            width,
            height,
            duration_s: 1.0,
            fps: FrameRate::integer(10).unwrap(),
        }
    }

    /// A reader that returns at most `chunk` bytes per call, like a pipe.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_reads_whole_frames_in_order() {
        let info = info(2, 2);
        let mut bytes = vec![1u8; 12];
        bytes.extend(vec![2u8; 12]);
        let mut source = FrameSource::new(Cursor::new(bytes), &info);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.data, vec![1u8; 12]);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.pixel(1, 1), Some([2, 2, 2]));
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.is_exhausted());
        assert_eq!(source.frames_read(), 2);
        // Stays exhausted.
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_stream_is_clean_end() {
        let mut source = FrameSource::new(Cursor::new(Vec::new()), &info(4, 4));
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.frames_read(), 0);
    }

    #[test]
    fn test_short_trailing_frame_is_framing_error() {
        let info = info(2, 2);
        let mut source = FrameSource::new(Cursor::new(vec![0u8; 12 + 5]), &info);
        assert!(source.next_frame().unwrap().is_some());
        match source.next_frame() {
            Err(CoreError::Framing { expected, received }) => {
                assert_eq!(expected, 12);
                assert_eq!(received, 5);
            }
            other => panic!("expected framing error, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_pipe_reads_are_reassembled() {
        let info = info(4, 4);
        let reader = Trickle {
            data: Cursor::new(vec![7u8; 48 * 3]),
            chunk: 5,
        };
        let mut source = FrameSource::new(reader, &info);
        let mut count = 0;
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.data.len(), 48);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_drain_discards_remaining_bytes() {
        let info = info(2, 2);
        let mut source = FrameSource::new(Cursor::new(vec![0u8; 36]), &info);
        source.next_frame().unwrap();
        assert_eq!(source.drain().unwrap(), 24);
        assert!(source.is_exhausted());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let frame = Frame {
            index: 0,
            width: 1,
            height: 1,
            data: vec![1, 2, 3],
        };
        assert_eq!(frame.pixel(0, 0), Some([1, 2, 3]));
        assert_eq!(frame.pixel(1, 0), None);
    }
}
