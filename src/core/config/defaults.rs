pub const CHROMA_HOST: &str = "localhost";
pub const CHROMA_PORT: u16 = 8000;
pub const CHROMA_COLLECTION: &str = "conversations";

pub const RAG_ENGINE_HOST: &str = "rag-engine";
pub const RAG_ENGINE_PORT: u16 = 5050;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_MODEL: &str = "openai/gpt-5-nano";

pub const DEFAULT_TOP_K: usize = 5;
pub const HTTP_TIMEOUT_SECS: u64 = 60;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const SERVER_HOST: &str = "127.0.0.1";
pub const SERVER_PORT: u16 = 3000;
