use std::error::Error as _;
use std::thread;

use reqwest::blocking::Client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Status(u16),
    Failed(String),
}

/// Issues GET requests and logs the status code or failure for each URL.
pub struct UrlProbe {
    http: Client,
}

impl Default for UrlProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlProbe {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    pub fn probe(&self, url: &str) -> ProbeOutcome {
        match self.http.get(url).send() {
            Ok(response) => {
                let code = response.status().as_u16();
                log::info!("{url}: {code}");
                ProbeOutcome::Status(code)
            }
            Err(e) => {
                let reason = error_chain(&e);
                log::error!("{url}: Error {reason}");
                ProbeOutcome::Failed(reason)
            }
        }
    }

    /// Probe every URL concurrently. Results keep the input order.
    pub fn probe_all(&self, urls: &[&str]) -> Vec<ProbeOutcome> {
        thread::scope(|s| {
            let probes: Vec<_> = urls
                .iter()
                .map(|url| s.spawn(move || self.probe(url)))
                .collect();
            probes
                .into_iter()
                .map(|p| {
                    p.join()
                        .unwrap_or_else(|_| ProbeOutcome::Failed("probe panicked".to_string()))
                })
                .collect()
        })
    }
}

/// The error message followed by each underlying cause, e.g. the OS-level
/// "Connection refused" hidden behind reqwest's generic request error.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
