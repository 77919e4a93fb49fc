//! Shared fixtures for integration tests.

#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use statesandbox::config::{SandboxConfig, SandboxToml};
use statesandbox::generator::{Effort, TextGenerator};
use statesandbox::guard::{AdvisoryTurnGuard, TurnGuard};
use statesandbox::server::{self, SharedState};
use statesandbox::store::{MemoryStore, SnapshotStore};
use statesandbox::stream::ProgressRecord;

pub const EVENTS_REPLY: &str = "```markdown
# Environmental and Weather Events
- 60% No notable events
- 40% Severe flooding in the delta

# Economic and International Events
- 70% No notable events
- 30% Recession begins
```";

/// Answers each prompt kind with a canned, well-formed reply.
#[derive(Default)]
pub struct ScriptedGenerator {
    calls: AtomicUsize,
    efforts: Mutex<Vec<Effort>>,
    narrative_gate: Option<Arc<Notify>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block narrative generation until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            narrative_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn efforts(&self) -> Vec<Effort> {
        self.efforts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, effort: Effort) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.efforts.lock().unwrap().push(effort);

        const SECTION_TAG: &str = "<section-template title=\"";
        if prompt.contains("<policy-request>") {
            Ok("Policy: Build a high-speed rail line.".to_string())
        } else if prompt.contains("<new-events>") {
            if let Some(gate) = &self.narrative_gate {
                gate.notified().await;
            }
            Ok("Rail construction starts and employment rises.".to_string())
        } else if let Some(start) = prompt.find(SECTION_TAG) {
            let rest = &prompt[start + SECTION_TAG.len()..];
            let title = &rest[..rest.find('"').unwrap_or(0)];
            Ok(format!(
                "```markdown\n## {title} Metrics\n- Index: 42\n- Share: 5%\n```"
            ))
        } else if prompt.contains("<report-template>") {
            Ok("```markdown\n### Executive Summary\n\nRail is coming.\n```".to_string())
        } else if prompt.contains("<events-template>") {
            Ok(EVENTS_REPLY.to_string())
        } else if prompt.contains("<flag-request>") {
            Ok("Here you go:\n```svg\n<svg viewBox=\"0 0 3 2\"></svg>\n```".to_string())
        } else if prompt.contains("<advice-template>") {
            Ok("```markdown\n- Expand rail\n- Cut tariffs\n```".to_string())
        } else {
            bail!("unexpected prompt")
        }
    }
}

pub struct TestApp {
    pub state: SharedState,
    pub store: Arc<MemoryStore>,
    pub guard: Arc<dyn TurnGuard>,
    pub generator: Arc<ScriptedGenerator>,
}

impl TestApp {
    pub fn new(generator: ScriptedGenerator) -> Self {
        let mut toml = SandboxToml::default();
        toml.turn.sampler_seed = Some(11);
        toml.stream.heartbeat_interval_ms = 60_000;
        let config = SandboxConfig::from_toml_with_env(toml, |_| None).unwrap();

        let generator = Arc::new(generator);
        let store = Arc::new(MemoryStore::new());
        let guard: Arc<dyn TurnGuard> = Arc::new(AdvisoryTurnGuard::new());
        let state = server::app_state(&config, generator.clone(), store.clone(), guard.clone())
            .unwrap();
        Self {
            state,
            store,
            guard,
            generator,
        }
    }

    pub fn router(&self) -> axum::Router {
        server::build_router(self.state.clone())
    }

    pub async fn snapshot_count(&self, id: &str) -> usize {
        self.store.snapshots(id).await.unwrap().len()
    }
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn records(resp: axum::response::Response) -> Vec<ProgressRecord> {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

pub async fn json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
