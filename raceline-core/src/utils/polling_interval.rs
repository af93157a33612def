use std::time::Duration;

/// Returns the next polling interval based on how long ago the listener last
/// saw an event.
///
/// Polls fast while events are flowing and backs off when the ledger is
/// idle. The result never exceeds `cap`, and is at least one second.
pub fn polling_freq(
    last_event: time::OffsetDateTime,
    now: time::OffsetDateTime,
    cap: Duration,
) -> Duration {
    let idle = now - last_event;
    let interval = match idle {
        d if d < time::Duration::seconds(5) => Duration::from_secs(1),
        d if d < time::Duration::seconds(30) => Duration::from_secs(2),
        d if d < time::Duration::seconds(120) => Duration::from_secs(5),
        _ => Duration::from_secs(10),
    };
    interval.min(cap).max(Duration::from_secs(1))
}
