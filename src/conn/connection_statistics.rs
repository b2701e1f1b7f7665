/// Observable counters of a connection.
///
/// The byte counts and the last-read/last-write instants are fed by the
/// transport layer; the roundtrip counters by the request dispatch.
#[derive(Debug, Clone)]
pub struct ConnectionStatistics {
    sequence_number: u32,
    reset_base: u32,
    bytes_read: u64,
    bytes_written: u64,
    created_at: time::OffsetDateTime,
    last_reset_at: time::OffsetDateTime,
    wait_time: std::time::Duration,
}
impl Default for ConnectionStatistics {
    fn default() -> Self {
        let timestamp = time::OffsetDateTime::now_utc();
        Self {
            created_at: timestamp,
            last_reset_at: timestamp,
            sequence_number: 0,
            reset_base: 0,
            bytes_read: 0,
            bytes_written: 0,
            wait_time: std::time::Duration::default(),
        }
    }
}
impl ConnectionStatistics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self {
            created_at: self.created_at,
            last_reset_at: time::OffsetDateTime::now_utc(),
            ..Default::default()
        };
    }

    pub(crate) fn add_wait_time(&mut self, wait_time: std::time::Duration) {
        self.sequence_number += 1;
        self.wait_time += wait_time;
    }

    pub(crate) fn set_transfer_bytes(&mut self, bytes_read: u64, bytes_written: u64) {
        self.bytes_read = bytes_read;
        self.bytes_written = bytes_written;
    }

    /// Returns the number of roundtrips to the database that were done
    /// through this connection since the last reset.
    pub fn call_count(&self) -> u32 {
        self.sequence_number - self.reset_base
    }

    /// Returns the total wait time, from start of serializing a request
    /// until receiving a reply, for all roundtrips to the database that were
    /// done through this connection since the last reset.
    pub fn accumulated_wait_time(&self) -> std::time::Duration {
        self.wait_time
    }

    /// Returns the number of bytes that were received through this
    /// connection.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the number of bytes that were sent through this connection.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl std::fmt::Display for ConnectionStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Connection statistics")?;
        writeln!(f, "Created at:     {}", self.created_at)?;
        writeln!(f, "Last reset at:  {}", self.last_reset_at)?;
        writeln!(f, "Total number of roundtrips: {}", self.sequence_number)?;
        writeln!(f, "Total wait time:            {:?}", self.wait_time)?;
        writeln!(f, "Bytes read:                 {}", self.bytes_read)?;
        writeln!(f, "Bytes written:              {}", self.bytes_written)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::ConnectionStatistics;

    #[test]
    fn test_statistics() {
        let mut stat = ConnectionStatistics::default();
        stat.add_wait_time(std::time::Duration::from_millis(3));
        stat.add_wait_time(std::time::Duration::from_millis(2));
        stat.set_transfer_bytes(100, 200);
        assert_eq!(stat.call_count(), 2);
        assert_eq!(stat.accumulated_wait_time(), std::time::Duration::from_millis(5));
        assert_eq!(stat.bytes_read(), 100);

        std::thread::sleep(std::time::Duration::from_millis(10));
        stat.reset();
        assert_eq!(stat.call_count(), 0);
        assert_ne!(stat.created_at, stat.last_reset_at);
    }
}
