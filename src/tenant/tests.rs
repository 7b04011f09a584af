use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

const SAMPLE: &str = r#"
tenants:
  acme:
    default_backend: postgres
    default_llm: bedrock
    upstreams:
      postgres_api: http://pg.internal:8000
      opensearch_api: http://os.internal:8000
    auth:
      user: svc
      pass: secret
  beta:
    upstreams:
      oracle_api: http://oracle.internal:8000
default:
  default_backend: opensearch
  upstreams:
    opensearch_api: http://os.shared:8000
"#;

#[test]
fn parses_tenants_and_default_block() {
    let registry = TenantRegistry::from_yaml(SAMPLE).expect("sample should parse");
    assert_eq!(registry.len(), 3);

    let acme = registry.get("acme").expect("acme registered");
    assert_eq!(acme.default_backend, Backend::Postgres);
    assert_eq!(acme.default_llm, LlmSource::Bedrock);
    assert_eq!(
        acme.upstream_for(Backend::Postgres).expect("postgres url"),
        "http://pg.internal:8000"
    );
    let auth = acme.auth.as_ref().expect("auth configured");
    assert_eq!(auth.user, "svc");
    assert_eq!(auth.pass, "secret");
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let registry = TenantRegistry::from_yaml(SAMPLE).expect("sample should parse");
    let beta = registry.get("beta").expect("beta registered");
    assert_eq!(beta.default_backend, Backend::Opensearch);
    assert_eq!(beta.default_llm, LlmSource::Ollama);
    assert!(beta.auth.is_none());
}

#[test]
fn unconfigured_backend_is_unavailable() {
    let registry = TenantRegistry::from_yaml(SAMPLE).expect("sample should parse");
    let beta = registry.get("beta").expect("beta registered");
    assert!(matches!(
        beta.upstream_for(Backend::Postgres),
        Err(TenantError::BackendUnavailable { backend: "postgres" })
    ));
}

#[test]
fn unknown_tenant_is_none() {
    let registry = TenantRegistry::from_yaml(SAMPLE).expect("sample should parse");
    assert!(registry.get("nope").is_none());
}

#[test]
fn default_descriptor_prefers_default_block() {
    let registry = TenantRegistry::from_yaml(SAMPLE).expect("sample should parse");
    let (id, descriptor) = registry.default_descriptor().expect("default resolvable");
    assert_eq!(id, "default");
    assert_eq!(
        descriptor.upstream_for(Backend::Opensearch).expect("url"),
        "http://os.shared:8000"
    );
}

#[test]
fn default_descriptor_falls_back_to_single_tenant() {
    let yaml = r#"
tenants:
  solo:
    upstreams:
      opensearch_api: http://solo:8000
"#;
    let registry = TenantRegistry::from_yaml(yaml).expect("yaml should parse");
    let (id, _) = registry.default_descriptor().expect("fallback resolvable");
    assert_eq!(id, "solo");
}

#[test]
fn empty_document_has_no_default() {
    let registry = TenantRegistry::from_yaml("{}").expect("empty doc parses");
    assert!(registry.is_empty());
    assert!(registry.default_descriptor().is_none());
}

#[test]
fn reload_swaps_snapshot() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(SAMPLE.as_bytes()).expect("write sample");
    let path = file.path().to_str().expect("utf8 path").to_string();

    let registry = TenantRegistry::load(&path).expect("file should load");
    assert!(registry.get("acme").is_some());

    let mut replacement = NamedTempFile::new().expect("temp file");
    replacement
        .write_all(b"tenants:\n  gamma:\n    upstreams:\n      oracle_api: http://g:1\n")
        .expect("write replacement");
    std::fs::copy(replacement.path(), &path).expect("swap contents");

    registry.reload().expect("reload should succeed");
    assert!(registry.get("acme").is_none());
    assert!(registry.get("gamma").is_some());
}

#[test]
fn backend_and_llm_labels_parse_case_insensitively() {
    assert_eq!(Backend::parse("Postgres"), Some(Backend::Postgres));
    assert_eq!(Backend::parse("OPENSEARCH"), Some(Backend::Opensearch));
    assert_eq!(Backend::parse("sqlite"), None);
    assert_eq!(LlmSource::parse("OCI_GenAI"), Some(LlmSource::OciGenai));
    assert_eq!(LlmSource::parse("claude"), None);
}
