//! Logical targets, command names, and parameter builders for each typed
//! operation.

use sage_types::AnalysisDepth;
use serde_json::{Map, Value, json};

pub const TARGET_SYSTEM: &str = "system";
pub const TARGET_PYTHON_INTELLIGENCE: &str = "python_intelligence";
pub const TARGET_GIT_SEMANTIC: &str = "git_semantic";
pub const TARGET_LLM_PROVIDER: &str = "llm_provider";

pub const CMD_HEALTH_CHECK: &str = "health_check";
pub const CMD_GET_STATUS: &str = "get_status";
pub const CMD_ANALYZE_FILE: &str = "analyze_file";
pub const CMD_ANALYZE_CODEBASE: &str = "analyze_codebase";
pub const CMD_GET_CODE_METRICS: &str = "get_code_metrics";
pub const CMD_GENERATE_COMMIT: &str = "generate_commit";
pub const CMD_GENERATE: &str = "generate";
pub const CMD_FIND_SIMILAR_CODE: &str = "find_similar_code";

const LLM_MODEL_PREFERENCE: &str = "medium";
const LLM_MAX_TOKENS: u32 = 1000;
const LLM_TEMPERATURE: f64 = 0.3;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn analyze_file_params(file_path: &str, depth: AnalysisDepth) -> Map<String, Value> {
    object(json!({
        "file_path": file_path,
        "depth": depth.as_str(),
    }))
}

pub(crate) fn project_params(project_path: &str) -> Map<String, Value> {
    object(json!({ "project_path": project_path }))
}

pub(crate) fn generate_commit_params(repository_path: Option<&str>) -> Map<String, Value> {
    let mut params = object(json!({ "staged_only": true }));
    if let Some(path) = repository_path {
        params.insert("repository_path".to_string(), json!(path));
    }
    params
}

pub(crate) fn generate_params(prompt: &str, context: Option<&str>) -> Map<String, Value> {
    let mut params = object(json!({
        "prompt": prompt,
        "model_preference": LLM_MODEL_PREFERENCE,
        "max_tokens": LLM_MAX_TOKENS,
        "temperature": LLM_TEMPERATURE,
    }));
    if let Some(context) = context {
        params.insert("context".to_string(), json!(context));
    }
    params
}

pub(crate) fn find_similar_params(code_snippet: &str, limit: usize) -> Map<String, Value> {
    object(json!({
        "code_snippet": code_snippet,
        "limit": limit,
    }))
}
