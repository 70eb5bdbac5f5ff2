//! Shared test doubles for the model client and cache store.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use nutrigate::cache::CacheStore;
use nutrigate::providers::ModelClient;
use nutrigate::types::{ModelTier, ModelTiers, PromptSpec};
use nutrigate::{GatewayError, Result};

pub const VISION_PRIMARY: &str = "vision-primary-model";
pub const VISION_FALLBACK: &str = "vision-fallback-model";
pub const LOGIC: &str = "logic-model";
pub const LITE: &str = "lite-model";

/// Tiers with distinct identifiers so calls can be told apart.
pub fn test_tiers() -> ModelTiers {
    let tier = |id: &str| ModelTier::new(id, format!("http://unused.test/{id}"));
    ModelTiers {
        vision_primary: tier(VISION_PRIMARY),
        vision_fallback: tier(VISION_FALLBACK),
        logic: tier(LOGIC),
        lite: tier(LITE),
    }
}

// ============================================================================
// Scripted model client
// ============================================================================

/// Model client that answers from per-model scripts and records every call.
#[derive(Default)]
pub struct ScriptedClient {
    queued: Mutex<HashMap<String, VecDeque<Result<String>>>>,
    sticky: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    prompts: Mutex<Vec<PromptSpec>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one result for `model`. Queued results are used before sticky ones.
    pub fn then(self, model: &str, result: Result<String>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Always answer `model` with `text` once its queue is empty.
    pub fn always(self, model: &str, text: impl Into<String>) -> Self {
        self.sticky
            .lock()
            .unwrap()
            .insert(model.to_string(), text.into());
        self
    }

    /// Model identifiers in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<PromptSpec> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, tier: &ModelTier, prompt: &PromptSpec) -> Result<String> {
        self.calls.lock().unwrap().push(tier.identifier.clone());
        self.prompts.lock().unwrap().push(prompt.clone());

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&tier.identifier)
            .and_then(VecDeque::pop_front);
        if let Some(result) = queued {
            return result;
        }
        match self.sticky.lock().unwrap().get(&tier.identifier) {
            Some(text) => Ok(text.clone()),
            None => Err(GatewayError::Upstream {
                status: None,
                message: format!("unscripted call to {}", tier.identifier),
            }),
        }
    }
}

pub fn quota_exceeded() -> GatewayError {
    GatewayError::QuotaExceeded("RESOURCE_EXHAUSTED".to_string())
}

// ============================================================================
// Cache store doubles
// ============================================================================

/// In-memory store that counts operations and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    entries: Mutex<HashMap<String, Value>>,
    fail_get: bool,
    fail_insert: bool,
    pub gets: AtomicUsize,
    pub inserts: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_get: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_insert: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get(&self, image_hash: &str) -> Result<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(GatewayError::Cache("store unreachable".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(image_hash).cloned())
    }

    async fn insert(&self, image_hash: &str, analysis: &Value) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(GatewayError::Cache("write rejected".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .entry(image_hash.to_string())
            .or_insert_with(|| analysis.clone());
        Ok(())
    }
}

// ============================================================================
// Payload fixtures
// ============================================================================

/// Base64 of a fake JPEG body; distinct seeds give distinct images.
pub fn photo(seed: u8) -> String {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend(std::iter::repeat_n(seed, 256));
    STANDARD.encode(bytes)
}

pub fn food_analysis() -> Value {
    json!({
        "isFood": true,
        "error": null,
        "mealName": "Grilled chicken salad",
        "items": [
            {"name": "chicken breast", "portion": "120 g", "calories": 198,
             "protein": 37, "carbs": 0, "fat": 4.3}
        ],
        "totals": {"calories": 198, "protein": 37, "carbs": 0, "fat": 4.3},
        "confidence": "high"
    })
}

pub fn not_food_analysis() -> Value {
    json!({
        "isFood": false,
        "error": "NOT_FOOD",
        "items": [],
        "totals": {"calories": 0, "protein": 0, "carbs": 0, "fat": 0},
        "confidence": "low"
    })
}
