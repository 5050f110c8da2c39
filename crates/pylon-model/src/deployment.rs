use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    LocationId,
    error::{ModelError, ModelResult},
};

/// Constraints handed to the scheduler that picks a node and allocation automatically.
///
/// Built only when the creation request carried a `deploy` block.
/// The default is the least constrained deployment: shared IP, any location, any port.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct DeploymentSpec {
    /// Chosen allocation must not share its IP with other servers.
    pub dedicated_ip: bool,
    /// Candidate locations, in request order, without duplicates.
    pub locations: Vec<LocationId>,
    /// Port or port-range hints, e.g. `"25565"` or `"25565-25570"`.
    pub port_range: Vec<String>,
}

impl DeploymentSpec {
    pub fn with_dedicated_ip(mut self, dedicated: bool) -> Self {
        self.dedicated_ip = dedicated;
        self
    }

    /// Replace the candidate locations, keeping the first occurrence of each id.
    pub fn with_locations<I>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = LocationId>,
    {
        self.locations.clear();
        for id in locations {
            if !self.locations.contains(&id) {
                self.locations.push(id);
            }
        }
        self
    }

    pub fn with_port_range<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.port_range = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Parse the port hints into typed ranges.
    ///
    /// Fails on the first hint that is not a port or a `start-end` range.
    pub fn port_ranges(&self) -> ModelResult<Vec<PortRange>> {
        self.port_range.iter().map(|s| s.parse()).collect()
    }
}

/// Inclusive range of TCP/UDP ports.
///
/// Always non-empty and never starts at port 0. Serialized in its textual form,
/// `"25565"` or `"25565-25570"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> ModelResult<Self> {
        if start == 0 || start > end {
            return Err(ModelError::InvalidPortRange(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    /// Range covering one port. Port 0 is rejected.
    pub fn single(port: u16) -> ModelResult<Self> {
        Self::new(port, port)
    }

    pub const fn start(&self) -> u16 {
        self.start
    }

    pub const fn end(&self) -> u16 {
        self.end
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    /// Number of ports covered.
    pub fn len(&self) -> usize {
        usize::from(self.end.saturating_sub(self.start)) + 1
    }

    /// A range always covers at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl FromStr for PortRange {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        let invalid = || ModelError::InvalidPortRange(s.to_string());
        let port = |p: &str| p.trim().parse::<u16>().map_err(|_| invalid());

        let (start, end) = match s.split_once('-') {
            Some((start, end)) => (port(start)?, port(end)?),
            None => {
                let single = port(s)?;
                (single, single)
            }
        };
        Self::new(start, end).map_err(|_| invalid())
    }
}

impl TryFrom<String> for PortRange {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PortRange> for String {
    fn from(range: PortRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
