use std::io::Write;

use serial_test::serial;

use super::*;
use crate::vault::MockVaultProvider;

const ENV_KEYS: [&str; 13] = [
    "RAGSTOW_DATA_DIR",
    "RAGSTOW_DATA_RECURSIVE",
    "RAGSTOW_CHUNK_SIZE",
    "RAGSTOW_CHUNK_OVERLAP",
    "RAGSTOW_EMBEDDING_BASE_URL",
    "RAGSTOW_EMBEDDING_MODEL",
    "RAGSTOW_EMBEDDING_DIMENSIONS",
    "RAGSTOW_INDEX_NAME",
    "RAGSTOW_INDEX_DIMENSION",
    "RAGSTOW_NAMESPACE",
    "RAGSTOW_PINECONE_URL",
    "RAGSTOW_TIMEOUT_EMBEDDING",
    "RAGSTOW_TIMEOUT_STORE",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn with_secrets(mut config: Config) -> Config {
    config.secrets.pinecone_api_key = Some(Secret::new("pc-key"));
    config.secrets.openai_api_key = Some(Secret::new("sk-key"));
    config
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.documents.path, "data/");
    assert!(!config.documents.recursive);
    assert_eq!(config.splitter.chunk_size, 500);
    assert_eq!(config.splitter.chunk_overlap, 20);
    assert_eq!(config.embedding.model, "text-embedding-3-small");
    assert_eq!(config.embedding.dimensions, 384);
    assert_eq!(config.index.name, "medical-chatbot");
    assert_eq!(config.index.dimension, 384);
    assert_eq!(config.index.metric, ragstow_store::Metric::Cosine);
    assert_eq!(config.index.cloud, "aws");
    assert_eq!(config.index.region, "us-east-1");
    assert_eq!(config.index.namespace, "default");
    assert!(config.secrets.pinecone_api_key.is_none());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/ragstow.toml")).unwrap();
    assert_eq!(config.index.name, "medical-chatbot");
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[documents]
path = "./pdfs"
recursive = true

[splitter]
chunk_size = 800
chunk_overlap = 80

[index]
name = "handbook"
metric = "dotproduct"
namespace = "v2"
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.documents.path, "./pdfs");
    assert!(config.documents.recursive);
    assert_eq!(config.splitter.chunk_size, 800);
    assert_eq!(config.splitter.chunk_overlap, 80);
    assert_eq!(config.index.name, "handbook");
    assert_eq!(config.index.metric, ragstow_store::Metric::Dotproduct);
    assert_eq!(config.index.namespace, "v2");
    assert_eq!(config.index.dimension, 384);
    assert_eq!(config.embedding.batch_size, 64);
}

#[test]
#[serial]
fn malformed_toml_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[splitter\nchunk_size = ").unwrap();

    clear_env();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides_apply_after_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    std::fs::write(&path, "[index]\nname = \"from-file\"\n").unwrap();

    clear_env();
    unsafe {
        std::env::set_var("RAGSTOW_INDEX_NAME", "from-env");
        std::env::set_var("RAGSTOW_CHUNK_SIZE", "1000");
        std::env::set_var("RAGSTOW_DATA_RECURSIVE", "true");
        std::env::set_var("RAGSTOW_PINECONE_URL", "http://localhost:5080");
    }

    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.index.name, "from-env");
    assert_eq!(config.splitter.chunk_size, 1000);
    assert!(config.documents.recursive);
    assert_eq!(config.index.control_url, "http://localhost:5080");
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("RAGSTOW_CHUNK_SIZE", "lots");
        std::env::set_var("RAGSTOW_TIMEOUT_STORE", "-5");
    }

    let config = Config::load(Path::new("/nonexistent/ragstow.toml")).unwrap();
    clear_env();

    assert_eq!(config.splitter.chunk_size, 500);
    assert_eq!(config.timeouts.store_seconds, 30);
}

#[tokio::test]
async fn resolve_secrets_from_vault() {
    let vault = MockVaultProvider::new()
        .with_secret(PINECONE_API_KEY, "pc-123")
        .with_secret(OPENAI_API_KEY, "sk-456");

    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();

    assert_eq!(
        config.secrets.pinecone_api_key.as_ref().unwrap().expose(),
        "pc-123"
    );
    assert_eq!(
        config.secrets.openai_api_key.as_ref().unwrap().expose(),
        "sk-456"
    );
}

#[tokio::test]
async fn resolve_secrets_leaves_missing_as_none() {
    let vault = MockVaultProvider::new().with_secret(OPENAI_API_KEY, "sk-456");
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert!(config.secrets.pinecone_api_key.is_none());
}

#[test]
fn validate_accepts_defaults_with_secrets() {
    assert!(with_secrets(Config::default()).validate().is_ok());
}

#[test]
fn validate_rejects_missing_pinecone_key() {
    let mut config = with_secrets(Config::default());
    config.secrets.pinecone_api_key = None;
    let err = config.validate().unwrap_err();
    assert!(matches!(&err, IngestError::Config(msg) if msg.contains(PINECONE_API_KEY)));
}

#[test]
fn validate_rejects_blank_openai_key() {
    let mut config = with_secrets(Config::default());
    config.secrets.openai_api_key = Some(Secret::new("   "));
    let err = config.validate().unwrap_err();
    assert!(matches!(&err, IngestError::Config(msg) if msg.contains(OPENAI_API_KEY)));
}

#[test]
fn validate_rejects_overlap_not_less_than_size() {
    let mut config = with_secrets(Config::default());
    config.splitter.chunk_size = 100;
    config.splitter.chunk_overlap = 100;
    assert!(matches!(config.validate(), Err(IngestError::Config(_))));
}

#[test]
fn validate_rejects_zero_sizes() {
    let mut config = with_secrets(Config::default());
    config.splitter.chunk_size = 0;
    assert!(config.validate().is_err());

    let mut config = with_secrets(Config::default());
    config.index.upsert_batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = with_secrets(Config::default());
    config.embedding.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_does_not_compare_embedding_and_index_dimensions() {
    let mut config = with_secrets(Config::default());
    config.embedding.dimensions = 1536;
    assert!(config.validate().is_ok());
}

#[test]
fn debug_never_prints_secrets() {
    let config = with_secrets(Config::default());
    let debug = format!("{config:?}");
    assert!(!debug.contains("pc-key"));
    assert!(!debug.contains("sk-key"));
}

#[test]
fn derived_settings() {
    let config = Config::default();
    assert_eq!(config.data_dir(), PathBuf::from("data/"));
    assert_eq!(config.splitter_config().chunk_size, 500);
    let spec = config.index_spec();
    assert_eq!(spec.name, "medical-chatbot");
    assert_eq!(spec.dimension, 384);
    assert_eq!(config.embedding_timeout(), Duration::from_secs(30));
}
