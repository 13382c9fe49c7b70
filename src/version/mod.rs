use std::fmt;

/// Name, version and build profile of the running binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    name: &'static str,
    version: &'static str,
    meta: &'static str,
}

impl Version {
    pub fn build() -> Self {
        let meta = if cfg!(debug_assertions) {
            "dev"
        } else {
            "release"
        };

        Version {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            meta,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/v{}-{}", self.name, self.version, self.meta)
    }
}
