//! Streaming endpoint addresses

use thiserror::Error;
use url::Url;

use swarmtail_types::StreamFilter;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("unsupported API scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("API base URL cannot be a base: {0}")]
    NotABase(String),

    #[error("service id must not be empty")]
    EmptyServiceId,
}

/// Derive the socket base from the HTTP API base (`https` -> `wss`,
/// `http` -> `ws`). Path and query are kept.
pub fn socket_base(api_base: &Url) -> Result<Url, EndpointError> {
    let scheme = match api_base.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };

    if api_base.cannot_be_a_base() {
        return Err(EndpointError::NotABase(api_base.to_string()));
    }

    let mut url = api_base.clone();
    url.set_scheme(scheme)
        .map_err(|_| EndpointError::UnsupportedScheme(api_base.scheme().to_string()))?;
    Ok(url)
}

/// Maps a filter to the address a channel is opened against
pub trait EndpointBuilder: Send + Sync {
    fn build(&self, filter: &StreamFilter) -> Result<Url, EndpointError>;
}

fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, EndpointError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| EndpointError::NotABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `/swarm/logs?stack=<scope>&service=<service>`, merged across services
#[derive(Clone, Debug)]
pub struct SwarmLogsEndpoint {
    base: Url,
}

impl SwarmLogsEndpoint {
    pub fn new(api_base: &Url) -> Result<Self, EndpointError> {
        Ok(Self {
            base: socket_base(api_base)?,
        })
    }
}

impl EndpointBuilder for SwarmLogsEndpoint {
    fn build(&self, filter: &StreamFilter) -> Result<Url, EndpointError> {
        let mut url = with_segments(&self.base, &["swarm", "logs"])?;
        url.set_query(None);

        if filter.scope().is_some() || filter.service().is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(scope) = filter.scope() {
                query.append_pair("stack", scope);
            }
            if let Some(service) = filter.service() {
                query.append_pair("service", service);
            }
        }

        Ok(url)
    }
}

/// `/services/<id>/logs`, a single service's tasks
#[derive(Clone, Debug)]
pub struct ServiceLogsEndpoint {
    base: Url,
    service_id: String,
}

impl ServiceLogsEndpoint {
    pub fn new(api_base: &Url, service_id: impl Into<String>) -> Result<Self, EndpointError> {
        let service_id = service_id.into();
        if service_id.trim().is_empty() {
            return Err(EndpointError::EmptyServiceId);
        }

        Ok(Self {
            base: socket_base(api_base)?,
            service_id,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }
}

impl EndpointBuilder for ServiceLogsEndpoint {
    /// The filter is ignored: the service is fixed at construction
    fn build(&self, _filter: &StreamFilter) -> Result<Url, EndpointError> {
        with_segments(&self.base, &["services", &self.service_id, "logs"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> Url {
        Url::parse(base).unwrap()
    }

    #[test]
    fn test_socket_base_switches_scheme() {
        let wss = socket_base(&api("https://swarm.example.com/api")).unwrap();
        assert_eq!(wss.as_str(), "wss://swarm.example.com/api");

        let ws = socket_base(&api("http://localhost:5000/api/")).unwrap();
        assert_eq!(ws.as_str(), "ws://localhost:5000/api/");
    }

    #[test]
    fn test_socket_base_rejects_other_schemes() {
        let err = socket_base(&api("ftp://files.example.com")).unwrap_err();
        assert!(matches!(err, EndpointError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn test_swarm_endpoint_without_filter_has_no_query() {
        let endpoint = SwarmLogsEndpoint::new(&api("http://localhost:5000/api")).unwrap();
        let url = endpoint.build(&StreamFilter::all()).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5000/api/swarm/logs");
    }

    #[test]
    fn test_swarm_endpoint_encodes_filter() {
        let endpoint = SwarmLogsEndpoint::new(&api("https://swarm.example.com/api/")).unwrap();

        let stack = endpoint.build(&StreamFilter::stack("web")).unwrap();
        assert_eq!(stack.as_str(), "wss://swarm.example.com/api/swarm/logs?stack=web");

        let filter =
            StreamFilter::new(Some("my stack".to_string()), Some("web_api".to_string())).unwrap();
        let both = endpoint.build(&filter).unwrap();
        assert_eq!(
            both.as_str(),
            "wss://swarm.example.com/api/swarm/logs?stack=my+stack&service=web_api"
        );
    }

    #[test]
    fn test_service_endpoint() {
        let endpoint = ServiceLogsEndpoint::new(&api("http://localhost:5000/api"), "x1y2").unwrap();
        let url = endpoint.build(&StreamFilter::all()).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5000/api/services/x1y2/logs");

        assert!(matches!(
            ServiceLogsEndpoint::new(&api("http://localhost:5000/api"), " "),
            Err(EndpointError::EmptyServiceId)
        ));
    }
}
