use crate::conn::{command_options::CommandOptions, CursorHoldability};
use crate::protocol::util::Cesu8DecodePolicy;
use std::time::Duration;

/// The configurable knobs of a connection, with their defaults and bounds.
///
/// An instance can be given to
/// [`Connection::with_configuration`](crate::Connection::with_configuration);
/// most values can also be changed on a living connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfiguration {
    auto_commit: bool,
    command_options: CommandOptions,
    buffer_size: usize,
    fetch_size: u32,
    bulk_size: usize,
    lob_chunk_size: u32,
    timeout: Option<Duration>,
    ping_interval: Option<Duration>,
    tcp_keepalive: Option<Duration>,
    data_format_version: u8,
    emptydate_as_null: bool,
    cesu8_decode_policy: Cesu8DecodePolicy,
}

impl Default for ConnectionConfiguration {
    fn default() -> Self {
        Self {
            auto_commit: true,
            command_options: CommandOptions::default(),
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            fetch_size: Self::DEFAULT_FETCH_SIZE,
            bulk_size: Self::DEFAULT_BULK_SIZE,
            lob_chunk_size: Self::DEFAULT_LOB_CHUNK_SIZE,
            timeout: Some(Self::DEFAULT_TIMEOUT),
            ping_interval: None,
            tcp_keepalive: Some(Self::DEFAULT_TCP_KEEPALIVE),
            data_format_version: Self::DEFAULT_DATA_FORMAT_VERSION,
            emptydate_as_null: false,
            cesu8_decode_policy: Cesu8DecodePolicy::Fail,
        }
    }
}

impl ConnectionConfiguration {
    /// Default size of the read and write buffers of the connection.
    pub const DEFAULT_BUFFER_SIZE: usize = 16_276;

    /// Default number of result set rows that are fetched with a single
    /// FETCH roundtrip.
    pub const DEFAULT_FETCH_SIZE: u32 = 128;
    /// Minimum fetch size.
    pub const MIN_FETCH_SIZE: u32 = 1;

    /// Default number of rows of a bulk execution that are sent to the
    /// server in a single roundtrip.
    pub const DEFAULT_BULK_SIZE: usize = 10_000;
    /// Minimum bulk size.
    pub const MIN_BULK_SIZE: usize = 1;
    /// Maximum bulk size (the row count of a part is a signed 16-bit value).
    pub const MAX_BULK_SIZE: usize = i16::MAX as usize;

    /// Default number of bytes (or 1-2-3-byte sequences for NCLOBs) that
    /// are transferred in a single LOB READ or LOB WRITE roundtrip.
    pub const DEFAULT_LOB_CHUNK_SIZE: u32 = 8_192;
    /// Minimum LOB chunk size.
    pub const MIN_LOB_CHUNK_SIZE: u32 = 128;
    /// Maximum LOB chunk size.
    pub const MAX_LOB_CHUNK_SIZE: u32 = 16_384;

    /// Default socket read/write timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Default TCP keepalive time.
    pub const DEFAULT_TCP_KEEPALIVE: Duration = Duration::from_secs(15);

    /// Default data format version.
    pub const DEFAULT_DATA_FORMAT_VERSION: u8 = 8;

    /// Returns whether the connection uses auto-commit.
    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }
    /// Defines whether the connection should use auto-commit.
    pub fn set_auto_commit(&mut self, ac: bool) {
        self.auto_commit = ac;
    }
    /// Builder-method for the auto-commit behavior.
    #[must_use]
    pub fn with_auto_commit(mut self, ac: bool) -> Self {
        self.set_auto_commit(ac);
        self
    }

    /// Returns the connection's cursor holdability.
    pub fn cursor_holdability(&self) -> CursorHoldability {
        self.command_options.into()
    }
    /// Sets the connection's cursor holdability.
    pub fn set_cursor_holdability(&mut self, holdability: CursorHoldability) {
        self.command_options = holdability.into();
    }
    /// Builder-method for the cursor holdability.
    #[must_use]
    pub fn with_cursor_holdability(mut self, holdability: CursorHoldability) -> Self {
        self.set_cursor_holdability(holdability);
        self
    }
    pub(crate) fn command_options(&self) -> CommandOptions {
        self.command_options
    }

    /// Returns the size of the connection's read and write buffers.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
    /// Sets the size of the connection's read and write buffers.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size;
    }
    /// Builder-method for the buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.set_buffer_size(buffer_size);
        self
    }

    /// Returns the connection's fetch size.
    pub fn fetch_size(&self) -> u32 {
        self.fetch_size
    }
    /// Sets the connection's fetch size.
    pub fn set_fetch_size(&mut self, fetch_size: u32) {
        self.fetch_size = fetch_size.max(Self::MIN_FETCH_SIZE);
    }
    /// Builder-method for the fetch size.
    #[must_use]
    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.set_fetch_size(fetch_size);
        self
    }

    /// Returns the connection's bulk size.
    pub fn bulk_size(&self) -> usize {
        self.bulk_size
    }
    /// Sets the connection's bulk size.
    pub fn set_bulk_size(&mut self, bulk_size: usize) {
        self.bulk_size = bulk_size.clamp(Self::MIN_BULK_SIZE, Self::MAX_BULK_SIZE);
    }
    /// Builder-method for the bulk size.
    #[must_use]
    pub fn with_bulk_size(mut self, bulk_size: usize) -> Self {
        self.set_bulk_size(bulk_size);
        self
    }

    /// Returns the connection's LOB chunk size.
    pub fn lob_chunk_size(&self) -> u32 {
        self.lob_chunk_size
    }
    /// Sets the connection's LOB chunk size.
    pub fn set_lob_chunk_size(&mut self, lob_chunk_size: u32) {
        self.lob_chunk_size =
            lob_chunk_size.clamp(Self::MIN_LOB_CHUNK_SIZE, Self::MAX_LOB_CHUNK_SIZE);
    }
    /// Builder-method for the LOB chunk size.
    #[must_use]
    pub fn with_lob_chunk_size(mut self, lob_chunk_size: u32) -> Self {
        self.set_lob_chunk_size(lob_chunk_size);
        self
    }

    /// Returns the socket read/write timeout; `None` means no deadline.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
    /// Sets the socket read/write timeout; `None` switches deadlines off.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout.filter(|t| !t.is_zero());
    }
    /// Builder-method for the socket timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.set_timeout(timeout);
        self
    }

    /// Returns the ping interval; `None` (the default) means no pings.
    pub fn ping_interval(&self) -> Option<Duration> {
        self.ping_interval
    }
    /// Sets the ping interval: a session reset probes the connection with a
    /// cheap query when this interval has elapsed since the last read.
    pub fn set_ping_interval(&mut self, ping_interval: Option<Duration>) {
        self.ping_interval = ping_interval;
    }
    /// Builder-method for the ping interval.
    #[must_use]
    pub fn with_ping_interval(mut self, ping_interval: Option<Duration>) -> Self {
        self.set_ping_interval(ping_interval);
        self
    }

    /// Returns the TCP keepalive time.
    pub fn tcp_keepalive(&self) -> Option<Duration> {
        self.tcp_keepalive
    }
    /// Sets the TCP keepalive time; `None` switches keepalive off.
    pub fn set_tcp_keepalive(&mut self, tcp_keepalive: Option<Duration>) {
        self.tcp_keepalive = tcp_keepalive;
    }
    /// Builder-method for the TCP keepalive time.
    #[must_use]
    pub fn with_tcp_keepalive(mut self, tcp_keepalive: Option<Duration>) -> Self {
        self.set_tcp_keepalive(tcp_keepalive);
        self
    }

    /// Returns the data format version that is requested from the server.
    pub fn data_format_version(&self) -> u8 {
        self.data_format_version
    }
    /// Sets the data format version to request from the server.
    ///
    /// Supported values are 1, 4, 6, and 8 (the default); 2 and 3 are
    /// reserved and rejected.
    pub fn set_data_format_version(&mut self, dfv: u8) {
        if matches!(dfv, 1 | 4 | 6 | 8) {
            self.data_format_version = dfv;
        } else {
            warn!("unsupported data format version {dfv} ignored");
        }
    }
    /// Builder-method for the data format version.
    #[must_use]
    pub fn with_data_format_version(mut self, dfv: u8) -> Self {
        self.set_data_format_version(dfv);
        self
    }

    /// Returns whether HANA's "empty date" (`0000-00-00`) is normalized to
    /// NULL.
    pub fn is_emptydate_as_null(&self) -> bool {
        self.emptydate_as_null
    }
    /// Defines whether HANA's "empty date" (`0000-00-00`) is normalized to
    /// NULL.
    ///
    /// With data format version 1 the server does this normalization itself;
    /// with higher versions an empty date arrives as a date value that sorts
    /// one day before `0001-01-01`, unless this toggle is set.
    pub fn set_emptydate_as_null(&mut self, emptydate_as_null: bool) {
        self.emptydate_as_null = emptydate_as_null;
    }
    /// Builder-method for the empty-date handling.
    #[must_use]
    pub fn with_emptydate_as_null(mut self, emptydate_as_null: bool) -> Self {
        self.set_emptydate_as_null(emptydate_as_null);
        self
    }

    /// Returns the policy for invalid CESU-8 coming from the server.
    pub fn cesu8_decode_policy(&self) -> Cesu8DecodePolicy {
        self.cesu8_decode_policy
    }
    /// Sets the policy for invalid CESU-8 coming from the server.
    pub fn set_cesu8_decode_policy(&mut self, policy: Cesu8DecodePolicy) {
        self.cesu8_decode_policy = policy;
    }
    /// Builder-method for the CESU-8 decode policy.
    #[must_use]
    pub fn with_cesu8_decode_policy(mut self, policy: Cesu8DecodePolicy) -> Self {
        self.set_cesu8_decode_policy(policy);
        self
    }
}

#[cfg(test)]
mod test {
    use super::ConnectionConfiguration;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfiguration::default();
        assert!(config.is_auto_commit());
        assert_eq!(config.buffer_size(), 16_276);
        assert_eq!(config.fetch_size(), 128);
        assert_eq!(config.bulk_size(), 10_000);
        assert_eq!(config.lob_chunk_size(), 8_192);
        assert_eq!(config.data_format_version(), 8);
        assert_eq!(
            config.timeout(),
            Some(std::time::Duration::from_secs(300))
        );
        assert!(config.ping_interval().is_none());
    }

    #[test]
    fn test_bounds() {
        let mut config = ConnectionConfiguration::default();
        config.set_bulk_size(0);
        assert_eq!(config.bulk_size(), 1);
        config.set_bulk_size(1_000_000);
        assert_eq!(config.bulk_size(), i16::MAX as usize);
        config.set_lob_chunk_size(1);
        assert_eq!(config.lob_chunk_size(), 128);
        config.set_lob_chunk_size(1_000_000);
        assert_eq!(config.lob_chunk_size(), 16_384);
        config.set_fetch_size(0);
        assert_eq!(config.fetch_size(), 1);
        config.set_data_format_version(3);
        assert_eq!(config.data_format_version(), 8);
        config.set_data_format_version(1);
        assert_eq!(config.data_format_version(), 1);
        config.set_timeout(Some(std::time::Duration::ZERO));
        assert!(config.timeout().is_none());
    }
}
