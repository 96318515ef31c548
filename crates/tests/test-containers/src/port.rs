use std::fmt;

/// Docker notation of an exposed tcp port, e.g. `9200/tcp`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TcpPort(pub u16);

impl fmt::Display for TcpPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/tcp", self.0)
    }
}
