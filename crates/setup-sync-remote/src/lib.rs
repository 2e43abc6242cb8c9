mod payload;

pub mod http;
pub mod snapshot;

pub use http::{HttpRemote, HttpRemoteConfig};
pub use snapshot::SnapshotRemote;
