// Identity Resolver - stable per-participant keys
// The one-upload and one-vote rules key on whatever this module resolves

/// Raw identity material extracted from a request by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity {
    /// Opaque token the client generated and stored locally
    pub client_token: Option<String>,

    /// Peer network address as observed by the transport
    pub remote_addr: Option<String>,
}

impl RequestIdentity {
    pub fn from_token(token: &str) -> Self {
        RequestIdentity {
            client_token: Some(token.to_string()),
            remote_addr: None,
        }
    }

    pub fn from_addr(addr: &str) -> Self {
        RequestIdentity {
            client_token: None,
            remote_addr: Some(addr.to_string()),
        }
    }
}

/// Maps a request to the stable key used by the uniqueness rules.
///
/// Returns `None` when the request carries nothing usable; the transport
/// treats that as a validation failure.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, request: &RequestIdentity) -> Option<String>;
}

/// Uses only the client-supplied opaque token.
pub struct ClientTokenResolver;

impl IdentityResolver for ClientTokenResolver {
    fn resolve(&self, request: &RequestIdentity) -> Option<String> {
        request
            .client_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
    }
}

/// Uses only the transport-observed peer address.
pub struct RemoteAddrResolver;

impl IdentityResolver for RemoteAddrResolver {
    fn resolve(&self, request: &RequestIdentity) -> Option<String> {
        request
            .remote_addr
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| format!("addr:{}", a))
    }
}

/// Default server behavior: client token when present, peer address otherwise.
pub struct TokenOrAddrResolver;

impl IdentityResolver for TokenOrAddrResolver {
    fn resolve(&self, request: &RequestIdentity) -> Option<String> {
        ClientTokenResolver
            .resolve(request)
            .or_else(|| RemoteAddrResolver.resolve(request))
    }
}
