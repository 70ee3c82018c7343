//! HMAC middleware for the webhook scope.
//!
//! The gateway signs every webhook delivery with an HMAC-SHA256 hex digest over the *exact raw request body*,
//! carried in a detached header. Verification must therefore happen on the raw bytes, before any JSON parsing,
//! since a re-serialized body would spuriously fail. This middleware extracts the payload, verifies it, and replays
//! the untouched bytes to the downstream extractors on success.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::signature::SignatureVerifier;

pub struct HmacMiddlewareFactory {
    signature_header: String,
    verifier: SignatureVerifier,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl HmacMiddlewareFactory {
    pub fn new(signature_header: &str, verifier: SignatureVerifier, enabled: bool) -> Self {
        HmacMiddlewareFactory { signature_header: signature_header.into(), verifier, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService {
            signature_header: self.signature_header.clone(),
            verifier: self.verifier.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct HmacMiddlewareService<S> {
    signature_header: String,
    verifier: SignatureVerifier,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        let signature_header = self.signature_header.clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let signature = req
                .headers()
                .get(&signature_header)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    warn!("🔐️ No webhook signature found in request. Denying access.");
                    ErrorForbidden("No signature found.")
                })?;
            match verifier.verify(data.as_ref(), &signature) {
                Ok(()) => {
                    trace!("🔐️ Webhook signature check ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Webhook signature verification failed ({e}). Denying access.");
                    Err(ErrorForbidden("Invalid signature."))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
