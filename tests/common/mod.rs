/// Local mock of the Panoptes backend for integration tests.
///
/// Serves on an ephemeral loopback port via `tiny_http`, answers every
/// request through a caller-supplied route function, and records what it
/// received so tests can assert on method, path and body.
use std::io::Read;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use panoptes::api::HttpSetupApi;
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

type Route = dyn Fn(&str, &str) -> (u16, String) + Send + Sync;

pub struct MockBackend {
    server: Arc<Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    worker: Option<JoinHandle<()>>,
}

impl MockBackend {
    /// Start a backend whose replies come from `route(method, path)`.
    pub fn start(route: impl Fn(&str, &str) -> (u16, String) + Send + Sync + 'static) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let worker = {
            let server = server.clone();
            let requests = requests.clone();
            thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let method = request.method().to_string();
                    let url = request.url().to_string();
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);

                    let path = url.split('?').next().unwrap_or(&url).to_string();
                    let (status, reply) = route(&method, &path);
                    requests.lock().unwrap().push(Recorded { method, url, body });

                    let header =
                        Header::from_bytes("Content-Type", "application/json").unwrap();
                    let _ = request.respond(
                        Response::from_string(reply)
                            .with_header(header)
                            .with_status_code(status),
                    );
                }
            })
        };

        Self {
            server,
            base_url: format!("http://{addr}"),
            requests,
            worker: Some(worker),
        }
    }

    pub fn api(&self) -> HttpSetupApi {
        HttpSetupApi::new(&self.base_url, Duration::from_secs(5))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// An API client pointed at a loopback port nothing listens on.
#[allow(dead_code)]
pub fn unreachable_api() -> HttpSetupApi {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    HttpSetupApi::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2))
}

/// Fresh per-test scratch directory.
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("panoptes-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[allow(dead_code)]
pub const STATUS_JSON: &str = r#"{
    "isConfigured": true,
    "activeNetwork": "mainnet",
    "activeEndpoint": "https://mainnet.utxorpc-v0.demeter.run",
    "configuredNetworks": ["mainnet", "preprod"]
}"#;
