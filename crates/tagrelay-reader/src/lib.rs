//! Reader session for tagrelay: the TCP connection to the RFID reader's
//! host interface and the task that turns its line-oriented report
//! stream into pipeline events.

pub mod protocol;
pub mod session;

pub use protocol::{ReportParseError, parse_report};
pub use session::{DEFAULT_READER_PORT, ReaderError, ReaderHandle, ReaderSession};
