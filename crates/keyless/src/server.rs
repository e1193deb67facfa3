use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{KeylessError, KeylessResult};
use crate::hash::HashRegistry;
use crate::protocol::SigningRequest;
use crate::signing::{DigestSigner, RsaSigner};

/// Largest accepted request body. A request is a small integer and at most
/// 128 hex characters, so anything near this is not a signing request.
pub const MAX_REQUEST_BODY: usize = 64 * 1024;

/// The sign and decrypt endpoints of a keyless signing service.
///
/// Holds no per-request state; the signer is shared read-only by every
/// in-flight request.
#[derive(Clone)]
pub struct SigningEndpoint {
    sign_path: String,
    decrypt_path: String,
    signer: Arc<dyn DigestSigner>,
    registry: HashRegistry,
}

impl SigningEndpoint {
    pub fn new(
        sign_path: impl Into<String>,
        decrypt_path: impl Into<String>,
        signer: Arc<dyn DigestSigner>,
    ) -> Self {
        Self {
            sign_path: sign_path.into(),
            decrypt_path: decrypt_path.into(),
            signer,
            registry: HashRegistry::standard(),
        }
    }

    pub fn registry(&self) -> &HashRegistry {
        &self.registry
    }

    /// Signs the digest carried by a sign-endpoint request.
    pub async fn sign(&self, body: Body) -> KeylessResult<Vec<u8>> {
        let bytes = axum::body::to_bytes(body, MAX_REQUEST_BODY)
            .await
            .map_err(|e| KeylessError::Io(std::io::Error::other(format!("read body error: {e}"))))?;
        let request: SigningRequest = serde_json::from_slice(&bytes)
            .map_err(|e| KeylessError::MalformedRequest(e.to_string()))?;
        let hash = self.registry.decode(request.hash)?;
        let digest = request.decode_digest()?;

        let signer = Arc::clone(&self.signer);
        let signature = tokio::task::spawn_blocking(move || signer.sign_digest(hash, &digest))
            .await
            .map_err(|e| KeylessError::SignOperation(format!("signing task failed: {e}")))??;

        debug!(%hash, signature_len = signature.len(), "signed digest");
        Ok(signature)
    }
}

/// Pipeline stage in front of the host's own routes.
///
/// Anything that is not a POST to one of the two endpoint paths passes
/// through untouched. The decrypt endpoint accepts and does nothing.
pub async fn signing_stage(
    State(endpoint): State<Arc<SigningEndpoint>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let path = request.uri().path();
    if path == endpoint.sign_path {
        match endpoint.sign(request.into_body()).await {
            Ok(signature) => (StatusCode::OK, signature).into_response(),
            Err(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    error!(%status, error = %err, "sign request failed");
                } else {
                    warn!(%status, error = %err, "rejected sign request");
                }
                err.into_response()
            }
        }
    } else if path == endpoint.decrypt_path {
        debug!("decrypt request accepted without effect");
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    }
}

/// Installs the signing stage in front of every route of `router`.
pub fn install<S>(router: Router<S>, endpoint: SigningEndpoint) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        Arc::new(endpoint),
        signing_stage,
    ))
}

/// Minimal host: a health check, 404 for everything else, and the signing
/// stage in front of both.
pub fn router(endpoint: SigningEndpoint) -> Router {
    let host = Router::new()
        .route("/healthcheck", get(|| async move { (StatusCode::OK, "Ok").into_response() }))
        .fallback(|| async move { StatusCode::NOT_FOUND.into_response() });
    install(host, endpoint)
}

pub async fn run(config: ServerConfig) -> Result<()> {
    config.validate()?;

    let signer = RsaSigner::from_pkcs1_pem_file(&config.private_key)
        .with_context(|| format!("loading private key {}", config.private_key.display()))?;
    info!(
        algorithm = signer.algorithm(),
        fingerprint = %hex::encode(Sha256::digest(signer.public_key_bytes())),
        "loaded signing key"
    );

    let endpoint = SigningEndpoint::new(
        config.sign_endpoint.clone(),
        config.decrypt_endpoint.clone(),
        Arc::new(signer),
    );

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    info!(
        listen = %listener.local_addr()?,
        sign_endpoint = %config.sign_endpoint,
        decrypt_endpoint = %config.decrypt_endpoint,
        "keyless signing service ready"
    );

    axum::serve(listener, router(endpoint))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving signing endpoint")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
