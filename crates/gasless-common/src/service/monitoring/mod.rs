use std::collections::HashMap;

use opentelemetry::trace::TracerProvider;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::{MetricExporter, Protocol, SpanExporter, WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::service::Error;

const SERVICE_NAME: &str = "gasless-relayer";

/// OTLP collector reached over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub endpoint: String,
    pub token: Option<String>,
}

impl Configuration {
    fn headers(&self) -> HashMap<String, String> {
        self.token
            .iter()
            .map(|token| ("Authorization".to_string(), format!("Basic {}", token)))
            .collect()
    }

    fn resource(&self) -> Resource {
        Resource::builder()
            .with_service_name(SERVICE_NAME)
            .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

/// Turns the events emitted by [`crate::metric`] into OTLP metrics
pub struct Metric;

impl Metric {
    pub fn layer<S>(configuration: &Configuration) -> Result<impl Layer<S>, Error>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let exporter = MetricExporter::builder()
            .with_http()
            .with_endpoint(format!("{}/v1/metrics", configuration.endpoint))
            .with_protocol(Protocol::HttpBinary)
            .with_headers(configuration.headers())
            .build()
            .map_err(Error::from)?;

        let provider = SdkMeterProvider::builder()
            .with_periodic_exporter(exporter)
            .with_resource(configuration.resource())
            .build();

        global::set_meter_provider(provider.clone());

        Ok(MetricsLayer::new(provider))
    }
}

/// Exports the spans opened by `#[instrument]` to an OTLP collector
pub struct Tracer;

impl Tracer {
    pub fn layer<S>(configuration: &Configuration) -> Result<impl Layer<S>, Error>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let exporter = SpanExporter::builder()
            .with_http()
            .with_endpoint(format!("{}/v1/traces", configuration.endpoint))
            .with_protocol(Protocol::HttpBinary)
            .with_headers(configuration.headers())
            .build()
            .map_err(Error::from)?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(configuration.resource())
            .build();

        let tracer = provider.tracer(SERVICE_NAME);
        Ok(tracing_opentelemetry::layer().with_tracer(tracer).with_filter(LevelFilter::TRACE))
    }
}

#[cfg(test)]
mod tests {
    use super::Configuration;

    #[test]
    fn token_is_sent_as_basic_authorization() {
        let configuration = Configuration {
            endpoint: "http://localhost:4318".to_string(),
            token: Some("dXNlcjpwYXNz".to_string()),
        };

        let headers = configuration.headers();
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn no_token_means_no_headers() {
        let configuration = Configuration {
            endpoint: "http://localhost:4318".to_string(),
            token: None,
        };

        assert!(configuration.headers().is_empty());
    }
}
