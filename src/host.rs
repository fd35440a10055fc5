//! Platform model: hosts, links and routes.

/// Reserved host name designating the ingress/egress node of a platform.
pub const MASTER_HOST_NAME: &str = "master";

/// A sharing policy for a [`Link`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SharingPolicy {
    /// Bandwidth is shared between concurrent transfers using this link.
    Shared,
    /// Each transfer gets the full bandwidth of the link (no sharing).
    FatPipe,
}

/// A compute host. Immutable after platform load.
#[derive(Clone, Debug)]
pub struct Host {
    pub name: String,
    /// Compute speed in flop/s.
    pub speed: f64,
}

impl Host {
    pub fn new(name: &str, speed: f64) -> Self {
        Self {
            name: name.to_string(),
            speed,
        }
    }

    /// Whether this host is the reserved `master` ingress/egress node.
    pub fn is_master(&self) -> bool {
        self.name == MASTER_HOST_NAME
    }
}

/// A network link. Immutable after platform load.
#[derive(Clone, Debug)]
pub struct Link {
    pub name: String,
    /// Bandwidth in bytes/sec.
    pub bandwidth: f64,
    /// Latency in seconds.
    pub latency: f64,
    pub sharing_policy: SharingPolicy,
}

impl Link {
    pub fn new(name: &str, bandwidth: f64, latency: f64, sharing_policy: SharingPolicy) -> Self {
        Self {
            name: name.to_string(),
            bandwidth,
            latency,
            sharing_policy,
        }
    }
}

/// An ordered path of links between two hosts.
///
/// Derived bandwidth is the minimum bandwidth along the path; derived latency is the sum of
/// per-link latencies. A loopback link permits a host to route to itself.
#[derive(Clone, Debug)]
pub struct Route {
    pub src: usize,
    pub dst: usize,
    pub links: Vec<usize>,
}

impl Route {
    pub fn new(src: usize, dst: usize, links: Vec<usize>) -> Self {
        Self { src, dst, links }
    }

    pub fn bandwidth(&self, link_table: &[Link]) -> f64 {
        self.links
            .iter()
            .map(|&l| link_table[l].bandwidth)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn latency(&self, link_table: &[Link]) -> f64 {
        self.links.iter().map(|&l| link_table[l].latency).sum()
    }
}

/// A platform: a set of hosts connected by a set of links, with explicit routes between them.
#[derive(Clone, Debug, Default)]
pub struct Platform {
    pub hosts: Vec<Host>,
    pub links: Vec<Link>,
    pub routes: Vec<Route>,
}

impl Platform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&mut self, name: &str, speed: f64) -> usize {
        let id = self.hosts.len();
        self.hosts.push(Host::new(name, speed));
        id
    }

    pub fn add_link(&mut self, name: &str, bandwidth: f64, latency: f64, sharing_policy: SharingPolicy) -> usize {
        let id = self.links.len();
        self.links.push(Link::new(name, bandwidth, latency, sharing_policy));
        id
    }

    pub fn add_route(&mut self, src: usize, dst: usize, links: Vec<usize>, symmetric: bool) {
        self.routes.push(Route::new(src, dst, links.clone()));
        if symmetric && src != dst {
            let mut reversed = links;
            reversed.reverse();
            self.routes.push(Route::new(dst, src, reversed));
        }
    }

    pub fn master_host(&self) -> Option<usize> {
        self.hosts.iter().position(|h| h.is_master())
    }

    fn route(&self, src: usize, dst: usize) -> Option<&Route> {
        self.routes.iter().find(|r| r.src == src && r.dst == dst)
    }

    /// Bandwidth between `src` and `dst`, or `f64::INFINITY` for a self-route with no declared route.
    pub fn bandwidth(&self, src: usize, dst: usize) -> f64 {
        if src == dst {
            return self.route(src, dst).map(|r| r.bandwidth(&self.links)).unwrap_or(f64::INFINITY);
        }
        self.route(src, dst)
            .unwrap_or_else(|| panic!("no route between hosts {} and {}", src, dst))
            .bandwidth(&self.links)
    }

    /// Latency between `src` and `dst`, or `0` for a self-route with no declared route.
    pub fn latency(&self, src: usize, dst: usize) -> f64 {
        if src == dst {
            return self.route(src, dst).map(|r| r.latency(&self.links)).unwrap_or(0.);
        }
        self.route(src, dst)
            .unwrap_or_else(|| panic!("no route between hosts {} and {}", src, dst))
            .latency(&self.links)
    }
}
