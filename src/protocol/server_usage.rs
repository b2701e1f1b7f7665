use std::time::Duration;

/// Describes the server-side resource consumption.
///
/// The server reports these numbers with most replies; the driver
/// accumulates them per connection and per statement object.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerUsage {
    /// The server-side processing time of the last request.
    pub proc_time: Duration,
    /// The accumulated server-side processing time.
    pub accum_proc_time: Duration,
    /// The server-side CPU time of the last request.
    pub cpu_time: Duration,
    /// The accumulated server-side CPU time.
    pub accum_cpu_time: Duration,
    /// The server-side memory consumption of the last request.
    pub server_memory_usage: u64,
}

impl ServerUsage {
    pub(crate) fn update(
        &mut self,
        o_proc_time: Option<Duration>,
        o_cpu_time: Option<Duration>,
        o_server_memory_usage: Option<u64>,
    ) {
        if let Some(proc_time) = o_proc_time {
            self.proc_time = proc_time;
            self.accum_proc_time += proc_time;
        }
        if let Some(cpu_time) = o_cpu_time {
            self.cpu_time = cpu_time;
            self.accum_cpu_time += cpu_time;
        }
        if let Some(server_memory_usage) = o_server_memory_usage {
            self.server_memory_usage = server_memory_usage;
        }
    }
}

impl std::fmt::Display for ServerUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "proc_time: {:?}, accum_proc_time: {:?}, cpu_time: {:?}, \
             accum_cpu_time: {:?}, server_memory_usage: {}",
            self.proc_time,
            self.accum_proc_time,
            self.cpu_time,
            self.accum_cpu_time,
            self.server_memory_usage
        )
    }
}
