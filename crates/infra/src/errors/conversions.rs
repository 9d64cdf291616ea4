//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use agentmetrics_domain::AdapterError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AdapterError);

impl From<InfraError> for AdapterError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AdapterError> for InfraError {
    fn from(value: AdapterError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAdapterError {
    fn into_adapter(self) -> AdapterError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AdapterError */
/* -------------------------------------------------------------------------- */

impl IntoAdapterError for HttpError {
    fn into_adapter(self) -> AdapterError {
        if self.is_timeout() {
            return AdapterError::UpstreamUnreachable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AdapterError::UpstreamUnreachable("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return AdapterError::UpstreamRejected { status: status.as_u16() };
        }

        if self.is_decode() {
            return AdapterError::UpstreamMalformed(self.to_string());
        }

        if self.is_builder() {
            return AdapterError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        AdapterError::UpstreamUnreachable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_adapter())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AdapterError */
/* -------------------------------------------------------------------------- */

impl IntoAdapterError for JsonError {
    fn into_adapter(self) -> AdapterError {
        AdapterError::UpstreamMalformed(format!("invalid JSON body: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_adapter())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → AdapterError */
/* -------------------------------------------------------------------------- */

impl IntoAdapterError for IoError {
    fn into_adapter(self) -> AdapterError {
        AdapterError::Config(format!("I/O error: {self}"))
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_adapter())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_maps_to_rejected_with_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: AdapterError = InfraError::from(error).into();
        assert_eq!(mapped, AdapterError::UpstreamRejected { status: 401 });
    }

    #[tokio::test]
    async fn refused_connection_maps_to_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: AdapterError = InfraError::from(error).into();
        assert!(matches!(mapped, AdapterError::UpstreamUnreachable(_)), "{mapped:?}");
    }

    #[test]
    fn json_error_maps_to_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: AdapterError = InfraError::from(err).into();
        assert!(matches!(mapped, AdapterError::UpstreamMalformed(_)));
    }

    #[test]
    fn io_error_maps_to_config() {
        let err = IoError::new(std::io::ErrorKind::NotFound, "token file missing");
        let mapped: AdapterError = InfraError::from(err).into();
        match mapped {
            AdapterError::Config(msg) => assert!(msg.contains("token file missing")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
