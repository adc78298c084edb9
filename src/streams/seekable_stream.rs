use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A random-access byte source an extraction reads from
pub trait SeekableStream: Read + Seek {
    /// Total length in bytes, leaving the position where it was
    fn stream_len(&mut self) -> io::Result<u64> {
        let current = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if current != end {
            self.seek(SeekFrom::Start(current))?;
        }
        Ok(end)
    }

    /// Seek to `offset` and fill `buf` completely
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    /// Filesystem path backing the stream, when there is one
    fn source_path(&self) -> Option<&Path> {
        None
    }
}

/// Local file wrapper
pub struct LocalSeekableStream {
    file: std::fs::File,
    path: PathBuf,
}

impl LocalSeekableStream {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        Ok(LocalSeekableStream {
            file: std::fs::File::open(&path)?,
            path,
        })
    }
}

impl Read for LocalSeekableStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for LocalSeekableStream {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl SeekableStream for LocalSeekableStream {
    fn stream_len(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn source_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

// In-memory sources (extracted tool output, tests)
impl<T: AsRef<[u8]>> SeekableStream for Cursor<T> {}

/// Fill `buf` as far as the stream allows, returning the byte count.
/// Unlike `read_exact`, a short read at end of stream is not an error.
pub fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_stream_len_keeps_position() {
        let mut c = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        c.seek(SeekFrom::Start(2)).unwrap();
        assert_eq!(c.stream_len().unwrap(), 5);
        assert_eq!(c.stream_position().unwrap(), 2);
    }

    #[test]
    fn test_read_exact_at() {
        let mut c = Cursor::new(b"abcdef".to_vec());
        let mut buf = [0u8; 3];
        c.read_exact_at(2, &mut buf).unwrap();
        assert_eq!(&buf, b"cde");
        assert!(c.read_exact_at(5, &mut buf).is_err());
    }

    #[test]
    fn test_local_stream_reports_path_and_len() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[0u8; 42]).unwrap();
        let mut stream = LocalSeekableStream::open(tmp.path()).unwrap();
        assert_eq!(stream.stream_len().unwrap(), 42);
        assert_eq!(stream.source_path(), Some(tmp.path()));
    }

    #[test]
    fn test_read_up_to_short_source() {
        let mut c = Cursor::new(vec![9u8; 3]);
        let mut buf = [0u8; 8];
        assert_eq!(read_up_to(&mut c, &mut buf).unwrap(), 3);
    }
}
