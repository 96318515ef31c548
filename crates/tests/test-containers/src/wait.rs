use std::time::Duration;

/// A condition to meet before a container is considered ready
pub enum ReadyCondition {
    /// Wait for a message on an http endpoint
    HttpPull {
        url: String,
        expect: String,
        interval: Duration,
    },
}
