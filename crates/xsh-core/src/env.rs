//! Names and defaults for every environment variable the shell consults.
//! Centralized so front-ends and tests don't each hardcode the strings.

use std::{env, path::PathBuf, time::Duration};

pub const HOME: &str = "HOME";
pub const HISTORY_FILE: &str = "XSH_HISTORY_FILE";
pub const AI_PROVIDER: &str = "XSH_AI_PROVIDER";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const LLAMA_BASE_URL: &str = "LLAMA_BASE_URL";
pub const LLAMA_SERVER: &str = "LLAMA_SERVER";
pub const LLAMA_URL: &str = "LLAMA_URL";
pub const LLAMA_MODEL: &str = "LLAMA_MODEL";
pub const LANG: &str = "LANG";
pub const ENGLISH_ONLY: &str = "XSH_ENGLISH_ONLY";
pub const AUTO_MOUNT: &str = "XSH_AUTOMOUNT";

pub const DEFAULT_IDLE_FLUSH: Duration = Duration::from_secs(10);
pub const DEFAULT_CRASH_SNAPSHOT: Duration = Duration::from_secs(180);

/// `~/.xsh_history` unless overridden by [`HISTORY_FILE`].
pub fn history_path() -> PathBuf {
    if let Some(path) = env::var_os(HISTORY_FILE) {
        return PathBuf::from(path);
    }
    home_dir().join(".xsh_history")
}

/// `~/.cache/xsh/ai`, the content-addressed cache root for the LLM bridge.
pub fn ai_cache_root() -> PathBuf {
    home_dir().join(".cache").join("xsh").join("ai")
}

fn home_dir() -> PathBuf {
    env::var_os(HOME).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Llama,
}

/// Provider selection heuristic from §6.2: an explicit override wins;
/// otherwise prefer llama when its URL is configured and no OpenAI key is
/// set, and fall back to OpenAI.
pub fn resolve_ai_provider() -> AiProvider {
    match env::var(AI_PROVIDER).as_deref() {
        Ok("openai") => return AiProvider::OpenAi,
        Ok("llama") => return AiProvider::Llama,
        _ => {}
    }
    let has_llama_url =
        env::var_os(LLAMA_BASE_URL).is_some() || env::var_os(LLAMA_SERVER).is_some() || env::var_os(LLAMA_URL).is_some();
    let has_openai_key = env::var_os(OPENAI_API_KEY).is_some();
    if has_llama_url && !has_openai_key {
        AiProvider::Llama
    } else {
        AiProvider::OpenAi
    }
}

pub fn english_only() -> bool {
    env::var(ENGLISH_ONLY).as_deref() == Ok("1")
}

/// Directories from `UPP`, colon-separated, auto-mounted at startup.
pub fn auto_mount_dirs() -> Vec<PathBuf> {
    match env::var_os(AUTO_MOUNT) {
        Some(value) => env::split_paths(&value).collect(),
        None => Vec::new(),
    }
}
