use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_BYTES: usize = 8 * 1024;

#[derive(Debug, Default)]
pub(crate) struct Captured {
    pub(crate) text: String,
    pub(crate) truncated: bool,
}

#[derive(Debug, Default)]
struct Kept {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Bytes kept so far for one stream. Shared with the reader task so a run that is cut short
/// can still report what arrived before the cut.
#[derive(Debug, Clone, Default)]
pub(crate) struct CaptureBuffer {
    kept: Arc<Mutex<Kept>>,
}

impl CaptureBuffer {
    fn push(&self, chunk: &[u8], limit: usize) {
        let mut kept = self.kept.lock().unwrap_or_else(|poison| poison.into_inner());
        let room = limit.saturating_sub(kept.bytes.len());
        if chunk.len() > room {
            kept.truncated = true;
        }
        kept.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    pub(crate) fn snapshot(&self) -> Captured {
        let kept = self.kept.lock().unwrap_or_else(|poison| poison.into_inner());
        Captured {
            text: String::from_utf8_lossy(&kept.bytes).into_owned(),
            truncated: kept.truncated,
        }
    }
}

/// Read `reader` to EOF as data arrives, keeping at most `limit` bytes in `buffer`.
///
/// Bytes past the cap are still drained so the child never stalls on a full pipe.
pub(crate) async fn capture<R>(
    reader: Option<R>,
    limit: usize,
    buffer: CaptureBuffer,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(());
    };

    let mut chunk = vec![0u8; CHUNK_BYTES];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.push(&chunk[..read], limit);
    }
}
