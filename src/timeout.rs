use std::io;

/// Returns `true` when a read failed only because its deadline elapsed.
///
/// Everything else is a genuine transport failure and must be reported,
/// never folded into "no server found".
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
