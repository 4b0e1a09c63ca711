use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

/// Resolved `--bind` value for `serve`. The session tree is served without
/// authentication, so anything reachable beyond loopback needs `--public`.
#[derive(Debug, Clone)]
pub(crate) struct BindTarget {
    requested: String,
    addrs: Vec<SocketAddr>,
}

impl BindTarget {
    pub(crate) async fn resolve(bind: &str, public: bool) -> Result<Self> {
        // Tokio lookup so "localhost:7700" works.
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
            .await
            .with_context(|| format!("Failed to resolve bind address: {bind}"))?
            .collect();
        Self::from_addrs(bind, addrs, public)
    }

    fn from_addrs(bind: &str, addrs: Vec<SocketAddr>, public: bool) -> Result<Self> {
        if addrs.is_empty() {
            anyhow::bail!("Bind address resolved to zero socket addrs: {bind}")
        }
        let target = Self {
            requested: bind.to_string(),
            addrs,
        };
        if target.is_exposed() && !public {
            anyhow::bail!(
                "Refusing to bind to non-loopback address without --public: {bind}. The session tree has no authentication; pass --public only on trusted networks."
            )
        }
        Ok(target)
    }

    pub(crate) fn is_exposed(&self) -> bool {
        self.addrs.iter().any(|addr| !addr.ip().is_loopback())
    }

    pub(crate) fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// One line for the startup banner.
    pub(crate) fn describe(&self) -> String {
        let addrs = self
            .addrs
            .iter()
            .map(SocketAddr::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} -> {addrs}", self.requested)
    }
}
