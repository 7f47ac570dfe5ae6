//! Session operations abstraction
//!
//! HTTP code is written against `SessionOps` rather than a concrete TLS
//! stream, so the exchange and the shutdown sequence can be driven by any
//! secure byte stream.

use super::{Error, Result};

/// Session operations trait
///
/// End of stream is reported as `Err(Error::EndOfStream)` by both `read` and
/// `shutdown`, never as a silent zero; deciding whether it is benign belongs
/// to the caller.
pub trait SessionOps {
    /// Read decrypted application data into `buf`
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `buf`; a failure is final, nothing is retried
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Send the protocol-level close notification
    fn shutdown(&mut self) -> Result<()>;
}

impl<S: SessionOps + ?Sized> SessionOps for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }
}

/// Close the session once, gracefully
///
/// A peer that already dropped the transport without a close notification
/// makes the close fail with end of stream. That one outcome counts as a
/// successful close; every other failure is returned.
pub fn shutdown_gracefully<S: SessionOps + ?Sized>(session: &mut S) -> Result<()> {
    match session.shutdown() {
        Err(Error::EndOfStream) => {
            tracing::debug!("peer closed the transport without close_notify");
            Ok(())
        }
        other => other,
    }
}

/// Scripted in-memory session for exercising the HTTP layer
#[cfg(test)]
pub(crate) mod mock {
    use super::SessionOps;
    use crate::http::{Error, Result};
    use std::collections::VecDeque;
    use std::io;

    /// What the next read returns
    #[derive(Debug, Clone)]
    pub enum Step {
        Data(Vec<u8>),
        Eof,
        Fail(io::ErrorKind),
    }

    impl Step {
        fn into_result(self, buf: &mut [u8]) -> Result<usize> {
            match self {
                Step::Data(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Step::Eof => Err(Error::EndOfStream),
                Step::Fail(kind) => Err(Error::Io(io::Error::from(kind))),
            }
        }
    }

    /// Calls observed by the session, in order
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Write(Vec<u8>),
        Read,
        Shutdown,
    }

    #[derive(Debug)]
    pub struct ScriptedSession {
        reads: VecDeque<Step>,
        write_failure: Option<io::ErrorKind>,
        shutdown_result: Option<Step>,
        pub calls: Vec<Call>,
    }

    impl ScriptedSession {
        pub fn new(reads: impl IntoIterator<Item = Step>) -> Self {
            ScriptedSession {
                reads: reads.into_iter().collect(),
                write_failure: None,
                shutdown_result: None,
                calls: Vec::new(),
            }
        }

        /// Response bytes delivered in pieces of `piece` bytes
        pub fn serving(response: &[u8], piece: usize) -> Self {
            Self::new(response.chunks(piece).map(|c| Step::Data(c.to_vec())))
        }

        pub fn failing_writes(mut self, kind: io::ErrorKind) -> Self {
            self.write_failure = Some(kind);
            self
        }

        /// `Step::Eof` or `Step::Fail` make the shutdown fail accordingly
        pub fn shutdown_with(mut self, step: Step) -> Self {
            self.shutdown_result = Some(step);
            self
        }

        pub fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }

        pub fn written(&self) -> Vec<u8> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Write(data) => Some(data.clone()),
                    _ => None,
                })
                .flatten()
                .collect()
        }
    }

    impl SessionOps for ScriptedSession {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.calls.push(Call::Read);
            self.reads.pop_front().unwrap_or(Step::Eof).into_result(buf)
        }

        fn write_all(&mut self, buf: &[u8]) -> Result<()> {
            self.calls.push(Call::Write(buf.to_vec()));
            match self.write_failure {
                Some(kind) => Err(Error::Io(io::Error::from(kind))),
                None => Ok(()),
            }
        }

        fn shutdown(&mut self) -> Result<()> {
            self.calls.push(Call::Shutdown);
            match self.shutdown_result.clone() {
                None | Some(Step::Data(_)) => Ok(()),
                Some(step) => step.into_result(&mut []).map(|_| ()),
            }
        }
    }
}
