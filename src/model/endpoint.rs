use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// The service endpoint stamped on published annotations, identifying which
/// process produced the span.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Logical service name.
    pub service_name: String,
    /// Address the service is reachable at, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipv4: Option<Ipv4Addr>,
    /// Port the service listens on, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port: Option<u16>,
}

impl Endpoint {
    /// An endpoint with only a service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Endpoint {
            service_name: service_name.into(),
            ipv4: None,
            port: None,
        }
    }

    /// Set the address.
    pub fn with_ipv4(mut self, ipv4: Ipv4Addr) -> Self {
        self.ipv4 = Some(ipv4);
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::new("unknown_service")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let bare = serde_json::to_string(&Endpoint::new("web")).unwrap();
        assert_eq!(bare, r#"{"serviceName":"web"}"#);

        let full = Endpoint::new("web")
            .with_ipv4(Ipv4Addr::new(10, 0, 0, 1))
            .with_port(8080);
        assert_eq!(
            serde_json::to_string(&full).unwrap(),
            r#"{"serviceName":"web","ipv4":"10.0.0.1","port":8080}"#
        );
    }
}
