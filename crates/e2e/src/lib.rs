//! Test harness for end-to-end tests
//!
//! Spins up the real axum router on an ephemeral port with a static name
//! oracle and a disk-backed store wrapped in a write counter, so tests can
//! assert not only responses but also what reached the storage network.

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiregrant_common::eth::{address_from_pubkey, personal_message_digest};
use wiregrant_common::{
    AddressPool, ContentStore, DiskStore, EthAddress, Result, ServerParams, StaticNameOracle,
};
use wiregrant_web::server::AppState;

/// A wallet key for signing test claims
pub struct TestSigner {
    key: SigningKey,
}

impl TestSigner {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    pub fn address(&self) -> EthAddress {
        address_from_pubkey(self.key.verifying_key())
    }

    /// Sign a personal message, returning the 65-byte signature as 0x-hex.
    pub fn sign_personal(&self, message: &str) -> String {
        let digest = personal_message_digest(message.as_bytes());
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(&digest)
            .expect("signing cannot fail for a valid key");
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(27 + recid.to_byte());
        format!("0x{}", hex::encode(bytes))
    }
}

/// Store decorator counting writes that reach the backend
pub struct CountingStore {
    inner: DiskStore,
    writes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ContentStore for CountingStore {
    async fn put(&self, data: &[u8]) -> Result<String> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(data).await
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>> {
        self.inner.get(address).await
    }

    async fn pin(&self, address: &str) -> Result<()> {
        self.inner.pin(address).await
    }
}

/// Running service plus everything a test needs to poke at it
pub struct TestService {
    pub base_url: String,
    pub store_writes: Arc<AtomicUsize>,
    _tmp: TempDir,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn writes(&self) -> usize {
        self.store_writes.load(Ordering::SeqCst)
    }
}

fn test_params() -> ServerParams {
    ServerParams {
        public_key: "HIgo9xNzJMWLKASShiTqIybxZ0U3wGLiUeJ1PKf8ykw=".to_string(),
        endpoint: "vpn.example.net:51820".to_string(),
        dns: "10.9.0.1".to_string(),
        keepalive_secs: 25,
    }
}

/// Start the service with the given registered names.
pub async fn spawn_service(names: &[(&str, EthAddress)]) -> TestService {
    let mut oracle = StaticNameOracle::new();
    for (name, address) in names {
        oracle = oracle.with_name(name, *address);
    }

    let tmp = TempDir::new().expect("tempdir");
    let writes = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(CountingStore {
        inner: DiskStore::open(tmp.path()).await.expect("disk store"),
        writes: writes.clone(),
    });
    let pool = Arc::new(AddressPool::new("10.9.0.0/24".parse().unwrap()).expect("pool"));

    let state = Arc::new(AppState::new(
        Arc::new(oracle),
        store,
        pool,
        test_params(),
        "http://gateway.test".to_string(),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, wiregrant_web::router(state))
            .await
            .expect("server loop");
    });

    TestService {
        base_url: format!("http://{}", addr),
        store_writes: writes,
        _tmp: tmp,
    }
}
