use std::io::SeekFrom;

use bytes::Bytes;
use futures::stream::Stream;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use dirvault_objectstore::DEFAULT_PART_SIZE;

/// A contiguous slice of the source stream.
#[derive(Debug)]
pub struct Chunk {
    pub data: Bytes,
    /// Zero-based position of this chunk in the sequence.
    pub index: u64,
    pub is_final: bool,
}

/// Turn an [`AsyncRead`] into a sequence of fixed-size [`Chunk`]s.
///
/// Every chunk but the last is exactly `chunk_size` bytes long; the last one is between 1 and
/// `chunk_size` bytes. An empty source yields no chunks at all.
///
/// To know whether a full chunk is also the last one, the reader looks one byte ahead and carries
/// that byte over into the next chunk, so at most `chunk_size + 1` bytes are held at any time.
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    index: u64,
    peeked: Option<u8>,
    done: bool,
}

impl<R> ChunkReader<R>
where
    R: AsyncRead + Unpin,
{
    /// If `chunk_size` is 0, [`DEFAULT_PART_SIZE`] (20 MiB) is used.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_PART_SIZE
        } else {
            chunk_size
        };
        Self {
            reader,
            chunk_size,
            index: 0,
            peeked: None,
            done: false,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Reads the next chunk. Returns `None` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Chunk>> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        if let Some(b) = self.peeked.take() {
            buf[0] = b;
            filled = 1;
        }
        while filled < self.chunk_size {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.done = true;
            return Ok(None);
        }

        let is_final = if filled < self.chunk_size {
            true
        } else {
            let mut peek = [0u8; 1];
            match self.reader.read(&mut peek).await? {
                0 => true,
                _ => {
                    self.peeked = Some(peek[0]);
                    false
                }
            }
        };
        self.done = is_final;

        buf.truncate(filled);
        let chunk = Chunk {
            data: Bytes::from(buf),
            index: self.index,
            is_final,
        };
        self.index += 1;
        Ok(Some(chunk))
    }

    pub fn into_stream(self) -> impl Stream<Item = std::io::Result<Chunk>> {
        futures::stream::try_unfold(self, |mut reader| async move {
            Ok::<_, std::io::Error>(reader.next_chunk().await?.map(|chunk| (chunk, reader)))
        })
    }
}

impl<R> ChunkReader<R>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    /// Rewinds the source so the sequence can be replayed from the first chunk.
    pub async fn restart(&mut self) -> std::io::Result<()> {
        self.reader.seek(SeekFrom::Start(0)).await?;
        self.index = 0;
        self.peeked = None;
        self.done = false;
        Ok(())
    }
}
