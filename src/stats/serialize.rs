pub mod instant_to_epoch_ms {
    // Serializes a `tokio::time::Instant` as integer milliseconds since the Unix
    // epoch. An `Instant` is not tied to wall-clock time, so the value is an
    // approximation taken against `SystemTime::now()`.
    use std::time::{SystemTime, UNIX_EPOCH};

    use serde::{Serialize, Serializer};
    use tokio::time::Instant;

    pub fn serialize<S>(instant: &Instant, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let system_now = SystemTime::now();
        let instant_now = Instant::now();
        let approx = system_now - instant_now.saturating_duration_since(*instant);
        let epoch_ms = approx
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        epoch_ms.serialize(serializer)
    }
}
