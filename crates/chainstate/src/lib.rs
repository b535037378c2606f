//! Header index, genesis construction and network selection.

pub mod genesis;
pub mod index;
pub mod network;
pub mod versionbits;

pub use genesis::{find_devnet_genesis, network_genesis, GenesisError};
pub use index::{BlockId, BlockIndex, BlockIndexNode, IndexError};
pub use network::{select_network, NetworkError, SelectedNetwork};
pub use versionbits::{deployment_state, ThresholdState};
