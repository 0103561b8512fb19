//! Facility type shared by the network, delay, and demand crates.

use serde::{Deserialize, Serialize};

/// What kind of facility a network node represents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Warehouse,
    Hub,
    #[default]
    Customer,
    Port,
    /// Customs or weight-station stop; entering one adds a fixed inspection
    /// time on top of ordinary handling.
    Inspection,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Warehouse,
        NodeKind::Hub,
        NodeKind::Customer,
        NodeKind::Port,
        NodeKind::Inspection,
    ];

    /// `true` for facilities where freight originates.
    #[inline]
    pub fn is_supply(self) -> bool {
        matches!(self, NodeKind::Warehouse | NodeKind::Hub | NodeKind::Port)
    }

    /// Inclusive range of concurrent service slots a facility of this kind
    /// is given when a network is generated.
    pub fn capacity_range(self) -> (u32, u32) {
        match self {
            NodeKind::Warehouse => (3, 5),
            NodeKind::Hub       => (2, 4),
            NodeKind::Port      => (2, 3),
            NodeKind::Customer | NodeKind::Inspection => (1, 2),
        }
    }

    /// Label used in CSV/Parquet column values and config files.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Warehouse  => "warehouse",
            NodeKind::Hub        => "hub",
            NodeKind::Customer   => "customer",
            NodeKind::Port       => "port",
            NodeKind::Inspection => "inspection",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warehouse"  => Ok(NodeKind::Warehouse),
            "hub"        => Ok(NodeKind::Hub),
            "customer"   => Ok(NodeKind::Customer),
            "port"       => Ok(NodeKind::Port),
            "inspection" => Ok(NodeKind::Inspection),
            other        => Err(format!("unknown node kind {other:?}")),
        }
    }
}
