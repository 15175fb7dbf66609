//! Engine tunables and submission metadata
//!
//! `ScanInfo` carries everything the `SCAN(...)` pseudo-test of a
//! fingerprint submission needs; the collaborators that probed the target
//! fill it in, the emitter only formats it.

use chrono::{DateTime, Local};
use std::net::IpAddr;

/// Accuracy a candidate needs to enter the ranked list by default.
pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.85;

/// Capacity of the ranked match list.
pub const MAX_OS_MATCHES: usize = 36;

/// Once the list is full, newcomers must beat the lowest accuracy by this.
pub const MATCH_FLOOR_EPSILON: f64 = 0.00001;

/// Payload width of one wrapped submission line (excluding the `OS:` prefix).
pub const FP_WRAP_COLUMN: usize = 72;

/// Most observations of one host a merged submission will accept.
pub const MAX_MERGE_FPS: usize = 32;

/// Engine identifier reported in the `E=` field.
pub const ENGINE_ID: &str = "4";

/// How the hop distance in a submission header was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMethod {
    #[default]
    None,
    Localhost,
    Direct,
    Icmp,
    Traceroute,
}

impl DistanceMethod {
    /// Single-letter code used in the `DC=` field.
    pub fn letter(&self) -> &'static str {
        match self {
            DistanceMethod::None => "",
            DistanceMethod::Localhost => "L",
            DistanceMethod::Direct => "D",
            DistanceMethod::Icmp => "I",
            DistanceMethod::Traceroute => "T",
        }
    }
}

/// Metadata for the synthetic `SCAN(...)` header of a submission.
#[derive(Debug, Clone)]
pub struct ScanInfo {
    /// Engine version reported in `V=`.
    pub version: String,
    /// Engine id reported in `E=`.
    pub engine_id: String,
    /// Target address, used only for the `PV=` private-address flag.
    pub addr: Option<IpAddr>,
    /// Sample open TCP port, if one was found.
    pub open_tcp_port: Option<u16>,
    /// Sample closed TCP port, if one was found.
    pub closed_tcp_port: Option<u16>,
    /// Sample closed UDP port, if one was found.
    pub closed_udp_port: Option<u16>,
    /// Hop distance to the target, if known.
    pub distance: Option<u32>,
    pub distance_method: DistanceMethod,
    /// Whether the scan conditions were good enough to trust this print.
    pub good_fp: bool,
    /// First three bytes of the target MAC, when on the same segment.
    pub mac_prefix: Option<[u8; 3]>,
    /// Header time; `None` means "now". Injectable for deterministic output.
    pub timestamp: Option<DateTime<Local>>,
    /// Build platform token reported in `P=`.
    pub platform: String,
}

impl Default for ScanInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            engine_id: ENGINE_ID.to_string(),
            addr: None,
            open_tcp_port: None,
            closed_tcp_port: None,
            closed_udp_port: None,
            distance: None,
            distance_method: DistanceMethod::None,
            good_fp: false,
            mac_prefix: None,
            timestamp: None,
            platform: env!("DEIMOS_TARGET").to_string(),
        }
    }
}

impl ScanInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addr(mut self, addr: IpAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Set the sample ports observed open/closed during probing.
    pub fn with_ports(
        mut self,
        open_tcp: Option<u16>,
        closed_tcp: Option<u16>,
        closed_udp: Option<u16>,
    ) -> Self {
        self.open_tcp_port = open_tcp;
        self.closed_tcp_port = closed_tcp;
        self.closed_udp_port = closed_udp;
        self
    }

    pub fn with_distance(mut self, distance: u32, method: DistanceMethod) -> Self {
        self.distance = Some(distance);
        self.distance_method = method;
        self
    }

    pub fn with_good_fp(mut self, good: bool) -> Self {
        self.good_fp = good;
        self
    }

    pub fn with_mac_prefix(mut self, oui: [u8; 3]) -> Self {
        self.mac_prefix = Some(oui);
        self
    }

    pub fn with_timestamp(mut self, when: DateTime<Local>) -> Self {
        self.timestamp = Some(when);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Is the target address private/non-routable? IPv4 RFC1918, loopback
    /// and link-local count; IPv6 and unknown addresses do not.
    pub fn is_private_addr(&self) -> bool {
        match self.addr {
            Some(IpAddr::V4(v4)) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
            _ => false,
        }
    }
}
