//! DNS Resolution

use async_std::net::{SocketAddr, ToSocketAddrs};

use super::results::{FetchError, FetchResult};

pub struct Resolver {
    ipv4: bool,
    ipv6: bool,
}

impl Resolver {
    /// Both flags set, or both unset, accept any address family.
    pub fn new(ipv4: bool, ipv6: bool) -> Self {
        Resolver { ipv4, ipv6 }
    }

    fn accept(&self, addr: &SocketAddr) -> bool {
        match (self.ipv4, self.ipv6) {
            (true, false) => addr.is_ipv4(),
            (false, true) => addr.is_ipv6(),
            _ => true,
        }
    }

    pub async fn get_addr(&self, authority: &str) -> FetchResult<SocketAddr> {
        debug!("Resolving TCP Endpoint for authority {}", authority);
        let addrs = authority
            .to_socket_addrs()
            .await
            .map_err(|err| FetchError::DNSLookupError(format!("{}", err)))?;
        let mut addrs = addrs;
        let addr = addrs
            .find(|addr| self.accept(addr))
            .ok_or_else(|| FetchError::DNSLookupError("Host does not exists".to_owned()))?;
        info!("Authority {} has been resolved to {}", authority, addr);
        Ok(addr)
    }
}
