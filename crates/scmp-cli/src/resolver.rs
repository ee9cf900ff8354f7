//! Path resolution from command-line provided paths.

use async_trait::async_trait;
use scmp_core::{ConfigError, PathEntry, PathResolver, ScmpError};
use scmp_proto::{Path, IA};
use std::net::SocketAddr;
use tracing::debug;

/// Resolver serving a fixed set of raw paths.
///
/// Traffic within one AS uses the empty path; anything else gets the
/// configured paths in order.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    paths: Vec<Path>,
    next_hop: Option<SocketAddr>,
    mtu: u16,
}

impl StaticResolver {
    /// Builds a resolver from hex-encoded raw paths.
    pub fn from_hex<S: AsRef<str>>(
        paths: &[S],
        next_hop: Option<SocketAddr>,
        mtu: u16,
    ) -> Result<Self, ConfigError> {
        let paths = paths
            .iter()
            .map(|s| {
                let s = s.as_ref();
                hex::decode(s)
                    .map(Path::new)
                    .map_err(|e| ConfigError::InvalidPath(format!("{}: {}", s, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            paths,
            next_hop,
            mtu,
        })
    }
}

#[async_trait]
impl PathResolver for StaticResolver {
    async fn paths(&self, src: IA, dst: IA) -> Result<Vec<PathEntry>, ScmpError> {
        if src == dst {
            debug!(ia = %dst, "Destination is in the local AS");
            return Ok(vec![PathEntry {
                next_hop: self.next_hop,
                ..PathEntry::local(self.mtu)
            }]);
        }
        Ok(self
            .paths
            .iter()
            .map(|path| PathEntry {
                path: path.clone(),
                next_hop: self.next_hop,
                mtu: self.mtu,
            })
            .collect())
    }
}
