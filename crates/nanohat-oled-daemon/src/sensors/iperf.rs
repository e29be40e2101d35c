//! Network throughput measurement with iperf3.
//!
//! The probe never fails: anything that goes wrong while running the
//! measurement shows up as placeholder rows.

use futures::future::BoxFuture;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ThroughputConfig;

/// Rows produced by one measurement.
pub const RATE_ROWS: usize = 5;

/// Row for an interval report without a readable rate.
pub const UNPARSED: &str = "N/A";

/// Row for a missing interval report.
pub const PENDING: &str = "...";

const RATE_UNIT: &str = "Mbits/sec";

/// Direction of a throughput test, seen from this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Download => "Download",
            Direction::Upload => "Upload",
        }
    }
}

/// Runs a bandwidth measurement and returns its raw text output.
pub trait ThroughputProbe {
    /// Returns an empty string if the measurement could not be run.
    fn run(&self, direction: Direction) -> BoxFuture<'_, String>;
}

/// iperf3 client against a fixed server.
pub struct IperfProbe {
    program: String,
    host: String,
    duration: Duration,
    timeout: Duration,
}

impl IperfProbe {
    pub fn new(config: &ThroughputConfig) -> Self {
        Self {
            program: config.program.clone(),
            host: config.host.clone(),
            duration: Duration::from_secs(config.duration_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Builds the command line; download uses reverse mode (server sends).
    pub fn args(&self, direction: Direction) -> Vec<String> {
        let mut args = vec![
            "-c".to_string(),
            self.host.clone(),
            "-t".to_string(),
            self.duration.as_secs().to_string(),
        ];
        if direction == Direction::Download {
            args.push("-R".to_string());
        }
        args
    }
}

impl ThroughputProbe for IperfProbe {
    fn run(&self, direction: Direction) -> BoxFuture<'_, String> {
        Box::pin(async move {
            info!("{} test against {}", direction.label(), self.host);
            run_command(&self.program, &self.args(direction), self.timeout).await
        })
    }
}

/// Runs a program and returns its stdout.
///
/// Spawn failure, a non-zero exit or hitting `timeout` all yield an empty
/// string. The child is killed when the timeout fires.
pub async fn run_command(program: &str, args: &[String], timeout: Duration) -> String {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            debug!("{} finished ({} bytes)", program, output.stdout.len());
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
        Ok(Ok(output)) => {
            warn!("{} exited with {}", program, output.status);
            String::new()
        }
        Ok(Err(e)) => {
            warn!("Failed to run {}: {}", program, e);
            String::new()
        }
        Err(_) => {
            warn!("{} timed out after {:?}", program, timeout);
            String::new()
        }
    }
}

/// Runs one measurement and parses it into display rows.
pub async fn measure(probe: &dyn ThroughputProbe, direction: Direction) -> [String; RATE_ROWS] {
    let output = probe.run(direction).await;
    parse_interval_rates(&output)
}

/// Extracts per-interval rates from iperf3 output.
///
/// Interval reports look like
/// `[  5]   1.00-2.00   sec  11.0 MBytes  92.3 Mbits/sec`. Each becomes
/// `"92.3 Mb/s"`, or [`UNPARSED`] if it has no Mbits/sec rate. Missing rows
/// are [`PENDING`]; reports past the fifth are dropped.
pub fn parse_interval_rates(output: &str) -> [String; RATE_ROWS] {
    let mut rates = output
        .lines()
        .filter(|line| is_interval_report(line))
        .map(|line| match mbits_rate(line) {
            Some(value) => format!("{} Mb/s", value),
            None => UNPARSED.to_string(),
        });

    std::array::from_fn(|_| rates.next().unwrap_or_else(|| PENDING.to_string()))
}

/// True if the line contains a stream id in brackets followed by a number,
/// e.g. `[  5]   0.00-1.00`.
fn is_interval_report(line: &str) -> bool {
    line.match_indices('[')
        .any(|(i, _)| stream_id_then_number(&line[i + 1..]))
}

fn stream_id_then_number(rest: &str) -> bool {
    let rest = rest.trim_start();
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return false;
    }
    let Some(after) = rest[digits..].strip_prefix(']') else {
        return false;
    };
    let next = after.trim_start();
    next.len() < after.len() && next.starts_with(|c: char| c.is_ascii_digit())
}

/// Returns the first decimal number directly followed by whitespace and the
/// Mbits/sec unit.
fn mbits_rate(line: &str) -> Option<&str> {
    line.match_indices(RATE_UNIT).find_map(|(i, _)| {
        let before = &line[..i];
        let number = before.trim_end();
        if number.len() == before.len() {
            return None;
        }
        decimal_suffix(number)
    })
}

/// Returns the trailing `<digits>.<digits>` of `s`, if any.
fn decimal_suffix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut start = bytes.len();

    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == bytes.len() || start == 0 || bytes[start - 1] != b'.' {
        return None;
    }
    start -= 1;

    let point = start;
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == point {
        return None;
    }
    Some(&s[start..])
}
