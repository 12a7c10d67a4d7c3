use serde::{Deserialize, Serialize};

use crate::error::{BaselineError, LinkField};

pub const DEFAULT_BANDWIDTH_MBPS: f64 = 5.0;
pub const DEFAULT_DELAY_MS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub src: u32,
    pub dst: u32,
    #[serde(default)]
    pub bandwidth: Option<String>,
    #[serde(default)]
    pub delay: Option<String>,
}

impl Link {
    pub fn new(src: u32, dst: u32, bandwidth: &str, delay: &str) -> Self {
        Self {
            src,
            dst,
            bandwidth: Some(bandwidth.to_string()),
            delay: Some(delay.to_string()),
        }
    }

    /// Capacity in Mbps; an absent string falls back to the 5 Mbps default.
    pub fn capacity_mbps(&self) -> Result<f64, BaselineError> {
        match self.bandwidth.as_deref() {
            None => Ok(DEFAULT_BANDWIDTH_MBPS),
            Some(raw) => parse_bandwidth_mbps(raw).ok_or_else(|| BaselineError::Parse {
                src: self.src,
                dst: self.dst,
                field: LinkField::Bandwidth,
                raw: raw.to_string(),
            }),
        }
    }

    /// Delay in milliseconds; an absent string falls back to the 2 ms default.
    pub fn delay_ms(&self) -> Result<f64, BaselineError> {
        match self.delay.as_deref() {
            None => Ok(DEFAULT_DELAY_MS),
            Some(raw) => parse_delay_ms(raw).ok_or_else(|| BaselineError::Parse {
                src: self.src,
                dst: self.dst,
                field: LinkField::Delay,
                raw: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub nodes: u32,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Topology {
    pub fn new(nodes: u32, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn contains_node(&self, node: u32) -> bool {
        node < self.nodes
    }

    pub fn validate(&self) -> Result<(), BaselineError> {
        for link in &self.links {
            if link.src == link.dst {
                return Err(BaselineError::ModelInit(format!(
                    "self-loop link on node {}",
                    link.src
                )));
            }
            if !self.contains_node(link.src) || !self.contains_node(link.dst) {
                return Err(BaselineError::ModelInit(format!(
                    "link {}-{} references a node outside [0, {})",
                    link.src, link.dst, self.nodes
                )));
            }
        }
        Ok(())
    }
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Parses "10Mbps", "1Gbps" or a bare number (Mbps) into Mbps.
pub fn parse_bandwidth_mbps(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let (number, scale) = if let Some(stripped) = text.strip_suffix("Gbps") {
        (stripped, 1000.0)
    } else if let Some(stripped) = text.strip_suffix("Mbps") {
        (stripped, 1.0)
    } else {
        (text, 1.0)
    };
    let value = number.trim().parse::<f64>().ok()?;
    positive(value * scale)
}

/// Parses "2ms", "0.5s" or a bare number (ms) into milliseconds.
pub fn parse_delay_ms(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let (number, scale) = if let Some(stripped) = text.strip_suffix("ms") {
        (stripped, 1.0)
    } else if let Some(stripped) = text.strip_suffix('s') {
        (stripped, 1000.0)
    } else {
        (text, 1.0)
    };
    let value = number.trim().parse::<f64>().ok()?;
    positive(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandwidth_units_scale_to_mbps() {
        assert_eq!(parse_bandwidth_mbps("5Mbps"), Some(5.0));
        assert_eq!(parse_bandwidth_mbps("1Gbps"), Some(1000.0));
        assert_eq!(parse_bandwidth_mbps(" 2.5 "), Some(2.5));
        assert_eq!(parse_bandwidth_mbps("fastMbps"), None);
        assert_eq!(parse_bandwidth_mbps("0Mbps"), None);
        assert_eq!(parse_bandwidth_mbps("-3Mbps"), None);
    }

    #[test]
    fn delay_units_scale_to_ms() {
        assert_eq!(parse_delay_ms("2ms"), Some(2.0));
        assert_eq!(parse_delay_ms("1s"), Some(1000.0));
        assert_eq!(parse_delay_ms("0.5s"), Some(500.0));
        assert_eq!(parse_delay_ms("7"), Some(7.0));
        assert_eq!(parse_delay_ms("ms"), None);
        assert_eq!(parse_delay_ms("inf"), None);
    }

    #[test]
    fn absent_link_attributes_use_defaults() {
        let link = Link {
            src: 0,
            dst: 1,
            bandwidth: None,
            delay: None,
        };
        assert_eq!(link.capacity_mbps().ok(), Some(DEFAULT_BANDWIDTH_MBPS));
        assert_eq!(link.delay_ms().ok(), Some(DEFAULT_DELAY_MS));
    }

    #[test]
    fn malformed_link_attribute_is_a_parse_error() {
        let link = Link::new(0, 1, "lots", "2ms");
        let err = link.capacity_mbps().expect_err("malformed bandwidth");
        assert!(matches!(
            err,
            BaselineError::Parse {
                field: LinkField::Bandwidth,
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_self_loops_and_out_of_range_nodes() {
        let looped = Topology::new(2, vec![Link::new(1, 1, "5Mbps", "2ms")]);
        assert!(matches!(looped.validate(), Err(BaselineError::ModelInit(_))));

        let outside = Topology::new(2, vec![Link::new(0, 2, "5Mbps", "2ms")]);
        assert!(matches!(outside.validate(), Err(BaselineError::ModelInit(_))));

        let ok = Topology::new(2, vec![Link::new(0, 1, "5Mbps", "2ms")]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn topology_deserializes_with_optional_link_strings() {
        let raw = r#"{"nodes": 3, "links": [{"src": 0, "dst": 1, "bandwidth": "10Mbps"}, {"src": 1, "dst": 2}]}"#;
        let topology: Topology = serde_json::from_str(raw).expect("topology json");
        assert_eq!(topology.nodes, 3);
        assert_eq!(topology.links[0].bandwidth.as_deref(), Some("10Mbps"));
        assert_eq!(topology.links[1].delay, None);
    }
}
