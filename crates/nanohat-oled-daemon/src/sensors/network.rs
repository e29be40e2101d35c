//! Network configuration queries for the network info screen.
//!
//! Each field is looked up independently so one failing lookup only blanks
//! its own line.

use std::ffi::CStr;
use std::fmt::Display;
use std::fs;
use std::io;
use std::net::{Ipv4Addr, UdpSocket};
use std::process::Command;
use thiserror::Error;

use crate::config::NetworkConfig;

/// Text shown in place of a value that could not be looked up.
pub const UNKNOWN: &str = "?";

/// Errors from a single network lookup.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{program} failed: {status}")]
    Command {
        program: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("malformed {what}: {value}")]
    Malformed { what: &'static str, value: String },
}

pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Source of network configuration values.
pub trait NetworkQuery {
    /// Primary IPv4 address (the one used for outgoing traffic).
    fn ipv4_address(&self) -> QueryResult<String>;

    /// IPv4 prefix length of the monitored interface.
    fn prefix_length(&self) -> QueryResult<u8>;

    /// Default gateway address.
    fn default_gateway(&self) -> QueryResult<String>;

    /// Current DNS server.
    fn dns_server(&self) -> QueryResult<String>;

    /// DNS search domain.
    fn dns_domain(&self) -> QueryResult<String>;
}

/// One snapshot of all network fields.
#[derive(Debug)]
pub struct NetworkInfo {
    pub ipv4: QueryResult<String>,
    pub prefix_length: QueryResult<u8>,
    pub gateway: QueryResult<String>,
    pub dns_server: QueryResult<String>,
    pub dns_domain: QueryResult<String>,
}

impl NetworkInfo {
    /// Queries every field. Never fails as a whole.
    pub fn query(source: &dyn NetworkQuery) -> Self {
        Self {
            ipv4: source.ipv4_address(),
            prefix_length: source.prefix_length(),
            gateway: source.default_gateway(),
            dns_server: source.dns_server(),
            dns_domain: source.dns_domain(),
        }
    }

    /// Collapses a field to display text.
    pub fn field<T: Display>(value: &QueryResult<T>) -> String {
        match value {
            Ok(v) => v.to_string(),
            Err(_) => UNKNOWN.to_string(),
        }
    }
}

/// Network queries against the running system.
pub struct SystemNetwork {
    interface: String,
    route_probe: String,
}

impl SystemNetwork {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            interface: config.interface.clone(),
            route_probe: config.route_probe.clone(),
        }
    }

    fn resolvectl_status() -> QueryResult<String> {
        let output = Command::new("resolvectl").arg("status").output()?;
        if !output.status.success() {
            return Err(QueryError::Command {
                program: "resolvectl",
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Gets the first IPv4 netmask of an interface using getifaddrs.
    fn ipv4_netmask(interface: &str) -> QueryResult<Ipv4Addr> {
        let mut netmask = None;

        // SAFETY: getifaddrs is a standard POSIX function. We properly free the
        // list with freeifaddrs when done.
        unsafe {
            let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();
            if libc::getifaddrs(&mut ifaddrs) != 0 {
                return Err(io::Error::last_os_error().into());
            }

            let mut current = ifaddrs;
            while !current.is_null() {
                let ifa = &*current;

                if !ifa.ifa_name.is_null() && !ifa.ifa_addr.is_null() && !ifa.ifa_netmask.is_null()
                {
                    let name = CStr::from_ptr(ifa.ifa_name).to_string_lossy();
                    let family = (*ifa.ifa_addr).sa_family as i32;
                    if name == interface && family == libc::AF_INET {
                        let sockaddr_in = ifa.ifa_netmask as *const libc::sockaddr_in;
                        let addr_bytes = (*sockaddr_in).sin_addr.s_addr.to_ne_bytes();
                        netmask = Some(Ipv4Addr::from(addr_bytes));
                        break;
                    }
                }

                current = ifa.ifa_next;
            }

            libc::freeifaddrs(ifaddrs);
        }

        netmask.ok_or(QueryError::NotFound("IPv4 netmask"))
    }
}

impl NetworkQuery for SystemNetwork {
    fn ipv4_address(&self) -> QueryResult<String> {
        // Connecting a UDP socket only selects a route; nothing is sent.
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(self.route_probe.as_str())?;
        Ok(socket.local_addr()?.ip().to_string())
    }

    fn prefix_length(&self) -> QueryResult<u8> {
        let netmask = Self::ipv4_netmask(&self.interface)?;
        Ok(u32::from(netmask).count_ones() as u8)
    }

    fn default_gateway(&self) -> QueryResult<String> {
        let table = fs::read_to_string("/proc/net/route")?;
        parse_default_gateway(&table).map(|gw| gw.to_string())
    }

    fn dns_server(&self) -> QueryResult<String> {
        parse_resolvectl_field(&Self::resolvectl_status()?, "Current DNS Server:")
    }

    fn dns_domain(&self) -> QueryResult<String> {
        parse_resolvectl_field(&Self::resolvectl_status()?, "DNS Domain:")
    }
}

/// Finds the gateway of the default route in `/proc/net/route` format.
pub fn parse_default_gateway(table: &str) -> QueryResult<Ipv4Addr> {
    for line in table.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 3 && fields[1] == "00000000" {
            let raw = u32::from_str_radix(fields[2], 16).map_err(|_| QueryError::Malformed {
                what: "gateway",
                value: fields[2].to_string(),
            })?;
            // The kernel prints the address in host byte order
            return Ok(Ipv4Addr::from(raw.to_le_bytes()));
        }
    }
    Err(QueryError::NotFound("default route"))
}

/// Returns the first word after `label` on the first line containing it.
pub fn parse_resolvectl_field(status: &str, label: &'static str) -> QueryResult<String> {
    status
        .lines()
        .find_map(|line| line.split_once(label))
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(str::to_string)
        .ok_or(QueryError::NotFound(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_TABLE: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
end0\t0003A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
end0\t00000000\t0103A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
";

    const RESOLVECTL: &str = "\
Global
         Protocols: +LLMNR +mDNS -DNSOverTLS DNSSEC=no/unsupported
  resolv.conf mode: stub

Link 2 (end0)
    Current Scopes: DNS LLMNR/IPv4
         Protocols: +DefaultRoute +LLMNR -mDNS -DNSOverTLS
Current DNS Server: 192.168.3.1
       DNS Servers: 192.168.3.1 1.1.1.1
        DNS Domain: lan home
";

    #[test]
    fn test_parse_default_gateway() {
        assert_eq!(
            parse_default_gateway(ROUTE_TABLE).unwrap(),
            Ipv4Addr::new(192, 168, 3, 1)
        );
    }

    #[test]
    fn test_no_default_route() {
        let table = ROUTE_TABLE.lines().take(2).collect::<Vec<_>>().join("\n");
        assert!(matches!(
            parse_default_gateway(&table),
            Err(QueryError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_gateway() {
        let table = "Iface Destination Gateway\neth0 00000000 zz\n";
        assert!(matches!(
            parse_default_gateway(table),
            Err(QueryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_resolvectl_fields() {
        assert_eq!(
            parse_resolvectl_field(RESOLVECTL, "Current DNS Server:").unwrap(),
            "192.168.3.1"
        );
        assert_eq!(
            parse_resolvectl_field(RESOLVECTL, "DNS Domain:").unwrap(),
            "lan"
        );
    }

    #[test]
    fn test_missing_resolvectl_field() {
        assert!(parse_resolvectl_field("Global\n  DNS Domain:\n", "DNS Domain:").is_err());
        assert!(parse_resolvectl_field("", "Current DNS Server:").is_err());
    }

    #[test]
    fn test_field_collapses_errors() {
        assert_eq!(NetworkInfo::field(&Ok::<_, QueryError>(24u8)), "24");
        assert_eq!(
            NetworkInfo::field::<String>(&Err(QueryError::NotFound("x"))),
            "?"
        );
    }
}
