use std::borrow::Cow;

use futures::future::BoxFuture;
use jsonrpsee::server::middleware::rpc::RpcServiceT;
use jsonrpsee::types::Request;
use jsonrpsee::MethodResponse;

/// Accept the request object of a method as is. Every method takes a single parameter, so a named
/// payload such as `{"amount": "5"}` is wrapped into `[{"amount": "5"}]` before dispatch.
#[derive(Clone)]
pub struct PayloadFormatter<S> {
    service: S,
}

impl<S> PayloadFormatter<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    fn wrap_parameters<'a>(&self, mut request: Request<'a>) -> Request<'a> {
        let Some(params) = request.params.clone() else {
            return request;
        };

        let payload = params.get().trim();
        if payload.starts_with('[') && payload.ends_with(']') {
            return request;
        }

        let Ok(payload) = serde_json::value::to_raw_value(&vec![params]) else {
            return request;
        };

        request.params = Some(Cow::Owned(payload));
        request
    }
}

impl<'a, S> RpcServiceT<'a> for PayloadFormatter<S>
where
    S: RpcServiceT<'a> + Send + Sync + Clone + 'static,
{
    type Future = BoxFuture<'a, MethodResponse>;

    fn call(&self, request: Request<'a>) -> Self::Future {
        let service = self.service.clone();
        let request = self.wrap_parameters(request);

        Box::pin(async move { service.call(request).await })
    }
}
