//! POSIX message queue client.
//!
//! The production [`MessageQueue`] backend on 64-bit Linux. Spans are handed
//! to the collector sidecar through a kernel message queue, so delivery
//! survives the producer exiting and the collector can be restarted
//! independently.
//!
//! The queue is opened write-only: the producer side never drains it, that
//! is the collector's job. Kernel-specific types stay inside this module.

use crate::error::{TransportError, TransportResult};
use crate::transport::{MessageQueue, QueueConfig, MAX_QUEUE_SIZE};
use std::ffi::CString;
use std::io;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Namespace prefix applied to every queue name so unrelated POSIX queues
/// on the host cannot collide with ours.
const QUEUE_NAME_PREFIX: &str = "/spanq-";

/// How many times an interrupted send is retried before the raw `EINTR`
/// surfaces. Retries reuse the original absolute deadline so they can never
/// extend the caller's budget.
const MAX_EINTR_RETRIES: u32 = 3;

/// Sentinel stored in place of the descriptor once the queue is closed.
const CLOSED: i32 = -1;

/// A write-only handle to a kernel message queue.
///
/// `send` is safe under concurrent callers; the kernel serializes access to
/// the underlying queue.
#[derive(Debug)]
pub struct PosixMessageQueue {
    mqd: AtomicI32,
    max_message_size: usize,
}

impl PosixMessageQueue {
    /// Create or open the named queue for write-only access.
    ///
    /// The logical name is prefixed with a fixed namespace and the requested
    /// depth is clamped to [`MAX_QUEUE_SIZE`]. OS failures surface verbatim.
    pub fn open(config: &QueueConfig) -> TransportResult<Self> {
        let name = CString::new(format!("{QUEUE_NAME_PREFIX}{}", config.name))
            .map_err(|e| TransportError::Os(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let mut attr: libc::mq_attr = unsafe { std::mem::zeroed() };
        attr.mq_maxmsg = config.max_queue_size.min(MAX_QUEUE_SIZE) as libc::c_long;
        attr.mq_msgsize = config.max_message_size as libc::c_long;

        let mqd = unsafe {
            libc::mq_open(
                name.as_ptr(),
                libc::O_CREAT | libc::O_WRONLY,
                0o644 as libc::c_uint,
                &mut attr as *mut libc::mq_attr,
            )
        };
        if mqd == -1 {
            return Err(TransportError::Os(io::Error::last_os_error()));
        }

        Ok(PosixMessageQueue {
            mqd: AtomicI32::new(mqd as i32),
            max_message_size: config.max_message_size,
        })
    }
}

impl MessageQueue for PosixMessageQueue {
    fn send(&self, payload: &[u8], deadline: Option<Instant>) -> TransportResult<()> {
        let mqd = self.mqd.load(Ordering::Acquire);
        if mqd == CLOSED {
            return Err(TransportError::Closed);
        }

        // The kernel timeout is absolute, so retries after EINTR reuse it
        // unchanged and the caller's budget stays intact.
        let abs_timeout = absolute_timeout(deadline);
        let mut interrupts = 0;
        loop {
            // Fail fast on an already-elapsed deadline, distinct from a
            // kernel ETIMEDOUT.
            if let Some(d) = deadline {
                if Instant::now() >= d && interrupts > 0 {
                    return Err(TransportError::deadline_elapsed());
                }
            }

            let rc = unsafe {
                libc::mq_timedsend(
                    mqd as libc::mqd_t,
                    payload.as_ptr() as *const libc::c_char,
                    payload.len(),
                    0,
                    &abs_timeout,
                )
            };
            if rc == 0 {
                return Ok(());
            }

            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) if interrupts < MAX_EINTR_RETRIES => {
                    interrupts += 1;
                }
                // Retries exhausted but the deadline has not elapsed: the
                // raw interrupt error surfaces, not a timeout, so callers
                // can tell the two apart.
                Some(libc::EINTR) => return Err(TransportError::Os(err)),
                Some(libc::ETIMEDOUT) | Some(libc::EAGAIN) => {
                    return Err(TransportError::TimedOut(err))
                }
                Some(libc::EMSGSIZE) => {
                    return Err(TransportError::MessageTooLarge {
                        size: payload.len(),
                        max: self.max_message_size,
                    })
                }
                Some(libc::EBADF) => return Err(TransportError::Closed),
                _ => return Err(TransportError::Os(err)),
            }
        }
    }

    fn receive(&self, _deadline: Option<Instant>) -> TransportResult<Vec<u8>> {
        // The producer opens the queue write-only; draining is the
        // collector's side of the contract.
        Err(TransportError::Os(io::Error::new(
            io::ErrorKind::Unsupported,
            "queue is opened write-only; receive is not available",
        )))
    }

    fn close(&self) -> TransportResult<()> {
        let mqd = self.mqd.swap(CLOSED, Ordering::AcqRel);
        if mqd == CLOSED {
            return Ok(());
        }
        let rc = unsafe { libc::mq_close(mqd as libc::mqd_t) };
        if rc == -1 {
            return Err(TransportError::Os(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Drop for PosixMessageQueue {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Convert a monotonic deadline into the absolute `CLOCK_REALTIME`
/// `timespec` that `mq_timedsend` expects. `None` maps to "now", turning
/// the send into a single non-blocking attempt.
fn absolute_timeout(deadline: Option<Instant>) -> libc::timespec {
    let now = Instant::now();
    let remaining = deadline
        .and_then(|d| d.checked_duration_since(now))
        .unwrap_or_default();
    let abs = SystemTime::now() + remaining;
    let since_epoch = abs
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    libc::timespec {
        tv_sec: since_epoch.as_secs() as libc::time_t,
        tv_nsec: since_epoch.subsec_nanos() as libc::c_long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn absolute_timeout_reflects_deadline() {
        let before = SystemTime::now();
        let ts = absolute_timeout(Some(Instant::now() + Duration::from_secs(2)));
        let after = SystemTime::now() + Duration::from_secs(2);

        let lower = before.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let upper = after.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64 + 1;
        assert!(ts.tv_sec >= lower + 1, "{} < {}", ts.tv_sec, lower + 1);
        assert!(ts.tv_sec <= upper, "{} > {}", ts.tv_sec, upper);
        assert!(ts.tv_nsec < 1_000_000_000);
    }

    #[test]
    fn absolute_timeout_without_deadline_is_now() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let ts = absolute_timeout(None);
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        assert!(ts.tv_sec >= before.as_secs() as i64);
        assert!(ts.tv_sec <= after.as_secs() as i64 + 1);
    }

    #[test]
    fn absolute_timeout_with_elapsed_deadline_is_now() {
        let past = Instant::now() - Duration::from_millis(50);
        let ts = absolute_timeout(Some(past));
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        assert!(ts.tv_sec <= now.as_secs() as i64 + 1);
    }
}
