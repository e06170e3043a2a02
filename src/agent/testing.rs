//! Test doubles for the agent

use crate::agent::{AgentManifest, CacheAgent, LocalHost};
use crate::cache::{AppId, CacheStorage, Generation, MemoryStorage, VersionToken};
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Request, Response};
use crate::network::Network;
use crate::seed::SeedList;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const ORIGIN: &str = "https://pufferfishes.test";

#[derive(Debug, Clone)]
enum Route {
    Status(u16, Vec<u8>),
    Fail,
}

/// Network that answers from a route table and counts calls
#[derive(Debug, Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Route>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `path`
    pub fn serve(&self, path: &str, body: &str) {
        self.status(path, 200, body);
    }

    pub fn status(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Status(status, body.as_bytes().to_vec()));
    }

    /// Transport failure for one path
    pub fn fail(&self, path: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Route::Fail);
    }

    /// Transport failure for every request
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = request.url.to_string();

        if self.offline.load(Ordering::SeqCst) {
            return Err(ShellcacheError::network(url, "network unreachable"));
        }

        let route = self.routes.lock().unwrap().get(request.url.path()).cloned();
        match route {
            Some(Route::Status(status, body)) => Ok(Response::new(url, status, body)),
            Some(Route::Fail) => Err(ShellcacheError::network(url, "connection reset")),
            None => Ok(Response::new(url, 404, "not found")),
        }
    }
}

/// Agent wired to in-memory doubles
pub struct Harness {
    pub agent: CacheAgent,
    pub storage: Arc<MemoryStorage>,
    pub network: Arc<StubNetwork>,
    pub host: Arc<LocalHost>,
}

impl Harness {
    /// Fresh agent for `app` at `version` seeding `seeds`
    pub fn new(app: &str, version: u64, seeds: &[&str]) -> Self {
        Self::on(
            Arc::new(MemoryStorage::new()),
            Arc::new(StubNetwork::new()),
            app,
            version,
            seeds,
        )
    }

    /// Agent sharing existing storage and network (a later build)
    pub fn on(
        storage: Arc<MemoryStorage>,
        network: Arc<StubNetwork>,
        app: &str,
        version: u64,
        seeds: &[&str],
    ) -> Self {
        let host = Arc::new(LocalHost::with_clients(2));
        let agent = CacheAgent::new(
            manifest(app, version, seeds),
            storage.clone() as Arc<dyn CacheStorage>,
            network.clone() as Arc<dyn Network>,
            host.clone(),
        );
        Self {
            agent,
            storage,
            network,
            host,
        }
    }

    /// Install then activate, panicking on failure
    pub async fn bring_up(&self) {
        self.agent.install().wait().await.unwrap();
        self.agent.activate().wait().await.unwrap();
    }
}

pub fn manifest(app: &str, version: u64, seeds: &[&str]) -> AgentManifest {
    let app_id = AppId::new(app).unwrap();
    AgentManifest {
        seeds: SeedList::from_paths(&app_id, seeds.iter().copied()).unwrap(),
        generation: Generation::new(app_id, VersionToken::new(version)),
        origin: Url::parse(ORIGIN).unwrap(),
    }
}

/// GET request for a path on the test origin
pub fn get(path: &str) -> Request {
    Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
}

pub fn key(path: &str) -> String {
    get(path).cache_key()
}
