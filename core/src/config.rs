//! Per-instance configuration, deserialized from the process's configuration the way the rest
//! of the workspace's applications deserialize their sections: a plain `serde`-derived struct,
//! no bespoke parser.

use serde::{Deserialize, Serialize};

use crate::hash::{BlockHeight, Hash32};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Identifies which connector implementation to connect through (e.g. `"bitcoin"`,
    /// `"ethereum"`); meaningful only to whatever wires up the concrete
    /// [`crate::connector::ParentChainConnector`].
    pub connector_id: String,
    /// Connector-specific connect parameters, opaque to this crate.
    #[serde(default)]
    pub connector_args: serde_json::Value,
    /// Hex-encoded 32-byte hash identifying the tracker's history origin.
    pub pointer_hex: String,
    /// The configured lower height bound below which a reorg is declared fatal.
    pub genesis: BlockHeight,
}

impl TrackerConfig {
    pub fn pointer(&self) -> Result<Hash32, crate::hash::Hash32ParseError> {
        Hash32::from_hex(&self.pointer_hex)
    }
}
