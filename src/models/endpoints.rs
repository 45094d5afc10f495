//! Endpoint views

use k8s_openapi::api::core::v1::Endpoints;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub protocol: String,
    pub port: i32,
}

/// One backend address of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointAddress {
    /// Kind of the target object (usually `Pod`)
    pub kind: String,
    pub name: String,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSubset {
    pub addresses: Vec<EndpointAddress>,
    pub ports: Vec<PortInfo>,
}

impl EndpointSubset {
    /// Parse every subset of a raw endpoints object.
    ///
    /// Ready and not-ready addresses are both kept, in that order.
    pub fn parse_all(endpoints: &Endpoints) -> Vec<Self> {
        endpoints
            .subsets
            .iter()
            .flatten()
            .map(|subset| {
                let addresses = subset
                    .addresses
                    .iter()
                    .flatten()
                    .chain(subset.not_ready_addresses.iter().flatten())
                    .map(|a| {
                        let target = a.target_ref.as_ref();
                        EndpointAddress {
                            kind: target.and_then(|t| t.kind.clone()).unwrap_or_default(),
                            name: target.and_then(|t| t.name.clone()).unwrap_or_default(),
                            ip: a.ip.clone(),
                        }
                    })
                    .collect();

                let ports = subset
                    .ports
                    .iter()
                    .flatten()
                    .map(|p| PortInfo {
                        name: p.name.clone().unwrap_or_default(),
                        protocol: p.protocol.clone().unwrap_or_default(),
                        port: p.port,
                    })
                    .collect();

                Self { addresses, ports }
            })
            .collect()
    }

    pub fn ips(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(|a| a.ip.as_str())
    }
}
