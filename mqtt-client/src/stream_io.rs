use std::io::ErrorKind;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::time::Instant;

use crate::error::{ClientError, ClientErrorKind};
use crate::platform::PlatformProfile;
use crate::socket::Socket;

/// How often a pending read/write is retried while waiting on the socket.
const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// `ErrorKind`s treated as "try again", not a fatal I/O error. Platforms may
/// widen this set via [`PlatformProfile::extra_busy_errors`], which carries
/// raw OS errno values rather than `ErrorKind`s — those are checked
/// separately in [`is_busy`].
fn is_busy_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

fn is_busy(err: &std::io::Error, profile: &PlatformProfile) -> bool {
    if is_busy_kind(err.kind()) {
        return true;
    }
    match err.raw_os_error() {
        Some(code) => profile.extra_busy_errors.contains(&code),
        None => false,
    }
}

/// Reads exactly `n` bytes from `socket`, retrying transient errors and
/// failing with `TimeoutError` once `deadline` passes.
pub async fn read_exact(
    socket: &mut impl Socket,
    n: usize,
    deadline: Instant,
    profile: &PlatformProfile,
) -> Result<Bytes, ClientError> {
    let mut have = BytesMut::with_capacity(n);

    while have.len() < n {
        if Instant::now() >= deadline {
            return Err(ClientError::new(
                ClientErrorKind::TimeoutError,
                format!("read_exact timed out with {}/{n} bytes", have.len()),
            ));
        }

        match socket.read(n - have.len()).await {
            Ok(None) => {}
            Ok(Some(chunk)) if chunk.is_empty() => {
                return Err(ClientError::new(
                    ClientErrorKind::IoError,
                    "connection closed by peer",
                ));
            }
            Ok(Some(chunk)) => {
                have.extend_from_slice(&chunk);
                if profile.post_read_pause_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(profile.post_read_pause_ms)).await;
                }
                continue;
            }
            Err(err) if is_busy(&err, profile) => {}
            Err(err) => return Err(ClientError::from(err)),
        }

        tokio::time::sleep(SOCKET_POLL_INTERVAL).await;
    }

    Ok(have.freeze())
}

/// Writes all of `bytes` to `socket`, retrying transient errors and short
/// writes until the full buffer has gone out or `deadline` passes.
pub async fn write_all(
    socket: &mut impl Socket,
    mut bytes: &[u8],
    deadline: Instant,
    profile: &PlatformProfile,
) -> Result<(), ClientError> {
    while !bytes.is_empty() {
        if Instant::now() >= deadline {
            return Err(ClientError::new(
                ClientErrorKind::TimeoutError,
                format!("write_all timed out with {} bytes remaining", bytes.len()),
            ));
        }

        match socket.write(bytes).await {
            Ok(0) => {}
            Ok(n) => {
                bytes = &bytes[n..];
                continue;
            }
            Err(err) if is_busy(&err, profile) => {}
            Err(err) => return Err(ClientError::from(err)),
        }

        tokio::time::sleep(SOCKET_POLL_INTERVAL).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct MockSocket {
        reads: VecDeque<std::io::Result<Option<Bytes>>>,
        written: Vec<u8>,
    }

    impl Socket for MockSocket {
        async fn read(&mut self, _max_n: usize) -> std::io::Result<Option<Bytes>> {
            self.reads.pop_front().unwrap_or(Ok(None))
        }

        async fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        async fn close(&mut self) {}
    }

    #[tokio::test]
    async fn read_exact_accumulates_partial_reads() {
        let mut socket = MockSocket {
            reads: VecDeque::from([
                Ok(None),
                Ok(Some(Bytes::from_static(b"ab"))),
                Ok(Some(Bytes::from_static(b"c"))),
            ]),
            written: vec![],
        };
        let profile = PlatformProfile::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        let got = read_exact(&mut socket, 3, deadline, &profile).await.unwrap();
        assert_eq!(&got[..], b"abc");
    }

    #[tokio::test]
    async fn read_exact_reports_eof_on_empty_chunk() {
        let mut socket = MockSocket {
            reads: VecDeque::from([Ok(Some(Bytes::new()))]),
            written: vec![],
        };
        let profile = PlatformProfile::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        let err = read_exact(&mut socket, 3, deadline, &profile).await.unwrap_err();
        assert_eq!(err.kind(), ClientErrorKind::IoError);
    }

    #[tokio::test]
    async fn read_exact_times_out_when_no_data_arrives() {
        let mut socket = MockSocket {
            reads: VecDeque::new(),
            written: vec![],
        };
        let profile = PlatformProfile::new();
        let deadline = Instant::now() + Duration::from_millis(20);
        let err = read_exact(&mut socket, 3, deadline, &profile).await.unwrap_err();
        assert_eq!(err.kind(), ClientErrorKind::TimeoutError);
    }

    #[tokio::test]
    async fn write_all_sends_full_buffer() {
        let mut socket = MockSocket {
            reads: VecDeque::new(),
            written: vec![],
        };
        let profile = PlatformProfile::new();
        let deadline = Instant::now() + Duration::from_secs(1);
        write_all(&mut socket, b"hello", deadline, &profile).await.unwrap();
        assert_eq!(socket.written, b"hello");
    }
}
