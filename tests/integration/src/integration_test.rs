//! End-to-end tests for the publishing flow
//!
//! Each test loads a configuration file, builds the engine from it and
//! publishes to a temporary directory: config loading -> sources ->
//! transforms -> file output.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use pretty_assertions::assert_eq;
use repo_core::index::address::{package_template, provider_template, resolve};
use repo_core::{IndexEngine, PackageRef};
use repo_fs::NormalizedPath;
use repo_meta::{Repository, load_config};
use repo_test_utils::output::TestOutput;
use serde_json::json;
use tiny_http::{Header, Response, Server};

fn static_config(output: &TestOutput, providers: bool, widget_versions: &str) -> String {
    format!(
        r#"
providers: {providers}
inputs:
  local:
    type: static
    packages:
      acme/widget:
{widget_versions}
output:
  type: file
  dir: {dir}
  base-path: /composer
"#,
        dir = output.public_dir().display()
    )
}

fn engine_for(output: &TestOutput, config: &str) -> IndexEngine {
    let path = output.write_config("repo.yml", config);
    let config = load_config(&NormalizedPath::new(&path)).unwrap();
    IndexEngine::from_config(&config).unwrap()
}

fn provider(output: &TestOutput, root: &Repository, source_id: &str) -> (String, Repository) {
    let template = provider_template(source_id);
    let hash = root.provider_includes.as_ref().unwrap()[&template].sha256.clone();
    let name = resolve(&template, &hash);
    let document = output.read_document(&name);
    (name, document)
}

fn package_shard(output: &TestOutput, provider: &Repository, name: &str) -> (String, Repository) {
    let hash = provider.providers.as_ref().unwrap()[name].sha256.clone();
    let shard = resolve(&package_template(name), &hash);
    let document = output.read_document(&shard);
    (shard, document)
}

#[test]
fn test_flat_index_from_static_input() {
    let output = TestOutput::new();
    let engine = engine_for(
        &output,
        &static_config(&output, false, "        1.0.0: { description: \"A widget\" }"),
    );

    engine.generate().unwrap();

    let root = output.read_json("packages.json");
    assert_eq!(root["packages"]["acme/widget"]["1.0.0"]["version"], "1.0.0");
    assert!(root.get("providers").is_none());
    assert_eq!(output.published_files(), vec!["packages.json".to_string()]);
}

#[test]
fn test_sharded_index_from_static_input() {
    let output = TestOutput::new();
    let engine = engine_for(&output, &static_config(&output, true, "        1.0.0: {}"));

    engine.generate().unwrap();

    let root = output.root_document();
    assert_eq!(
        root.providers_url.as_deref(),
        Some("/composer/p/%package%$%hash%.json")
    );
    let (_, provider) = provider(&output, &root, "local");
    let (_, shard) = package_shard(&output, &provider, "acme/widget");
    let package = &shard.packages.as_ref().unwrap()["acme/widget"]["1.0.0"];
    assert_eq!(package.version, "1.0.0");
    assert_eq!(package.uid.as_deref(), Some("acme/widget@1.0.0"));
}

#[test]
fn test_update_after_upstream_change() {
    let output = TestOutput::new();
    let engine = engine_for(&output, &static_config(&output, true, "        1.0.0: {}"));
    engine.generate().unwrap();

    let root_before = output.root_document();
    let (provider_before, provider_doc) = provider(&output, &root_before, "local");
    let (old_shard, _) = package_shard(&output, &provider_doc, "acme/widget");
    let old_shard_bytes = std::fs::read(output.public_dir().join(&old_shard)).unwrap();

    // The source now reports 1.1.0 instead of 1.0.0
    let engine = engine_for(&output, &static_config(&output, true, "        1.1.0: {}"));
    engine
        .update(&[PackageRef::new("local", "acme/widget")])
        .unwrap();

    let root_after = output.root_document();
    let (provider_after, provider_doc) = provider(&output, &root_after, "local");
    assert_ne!(provider_after, provider_before);

    let (_, shard) = package_shard(&output, &provider_doc, "acme/widget");
    let versions: Vec<_> = shard.packages.unwrap()["acme/widget"].keys().cloned().collect();
    assert_eq!(versions, vec!["1.1.0".to_string()]);

    // The superseded shard is orphaned, not deleted
    assert_eq!(
        std::fs::read(output.public_dir().join(&old_shard)).unwrap(),
        old_shard_bytes
    );
    assert!(engine.verify().unwrap().is_healthy());
}

#[test]
fn test_transform_chain_from_config() {
    let output = TestOutput::new();
    let config = format!(
        r#"
inputs:
  local:
    type: static
    packages:
      acme/widget:
        1.0.0: {{}}
      acme/internal-tools:
        1.0.0: {{}}
transformers:
  - type: static
    packages: [acme/widget]
    values:
      type: drupal-module
  - type: exclude
    pattern: "^acme/internal-"
output:
  type: file
  dir: {}
"#,
        output.public_dir().display()
    );

    engine_for(&output, &config).generate().unwrap();

    let root = output.read_json("packages.json");
    assert_eq!(root["packages"]["acme/widget"]["1.0.0"]["type"], "drupal-module");
    assert!(root["packages"].get("acme/internal-tools").is_none());
}

// ============================================================================
// GitLab input
// ============================================================================

type Routes = Arc<Mutex<HashMap<String, (String, Option<u32>)>>>;

/// Fake GitLab API keyed by path plus `page`/`ref` query value.
fn serve_gitlab(routes: Routes) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::from_listener(listener, None).unwrap();

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let (path, query) = request.url().split_once('?').unwrap_or((request.url(), ""));
            let mut key = path.to_string();
            for pair in query.split('&') {
                if pair.starts_with("page=") || pair.starts_with("ref=") {
                    key.push('?');
                    key.push_str(pair);
                }
            }

            let canned = routes.lock().unwrap().get(&key).cloned();
            let response = match canned {
                Some((body, total_pages)) => {
                    let mut response = Response::from_string(body);
                    if let Some(total) = total_pages {
                        response = response.with_header(
                            Header::from_bytes(&b"X-Total-Pages"[..], total.to_string().as_bytes())
                                .unwrap(),
                        );
                    }
                    response
                }
                None => Response::from_string("{\"message\":\"404 Not Found\"}").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    format!("http://{addr}")
}

fn gitlab_routes(tags: serde_json::Value) -> HashMap<String, (String, Option<u32>)> {
    let project = json!({
        "id": 11,
        "path_with_namespace": "acme/widget",
        "web_url": "https://gitlab.example.com/acme/widget"
    });
    HashMap::from([
        (
            "/api/v4/groups/acme".to_string(),
            (json!({"id": 3, "full_path": "acme"}).to_string(), None),
        ),
        (
            "/api/v4/groups/3/projects?page=1".to_string(),
            (json!([project]).to_string(), Some(1)),
        ),
        (
            "/api/v4/projects/acme%2Fwidget".to_string(),
            (project.to_string(), None),
        ),
        (
            "/api/v4/projects/11/repository/branches?page=1".to_string(),
            (json!([]).to_string(), Some(1)),
        ),
        (
            "/api/v4/projects/11/repository/tags?page=1".to_string(),
            (tags.to_string(), Some(1)),
        ),
        (
            "/api/v4/projects/11/repository/files/composer.json/raw?ref=1.0.0".to_string(),
            (json!({"description": "A widget"}).to_string(), None),
        ),
        (
            "/api/v4/projects/11/repository/files/composer.json/raw?ref=1.1.0".to_string(),
            (json!({"description": "A widget"}).to_string(), None),
        ),
    ])
}

#[test]
fn test_gitlab_generate_then_update() {
    let routes: Routes = Arc::new(Mutex::new(gitlab_routes(json!([
        {"name": "1.0.0", "commit": {"id": "aaa111"}}
    ]))));
    let base_url = serve_gitlab(Arc::clone(&routes));

    let output = TestOutput::new();
    let config = format!(
        r#"
providers: true
inputs:
  acme:
    type: gitlab
    url: {base_url}
    group: acme
    token: secret
output:
  type: file
  dir: {}
"#,
        output.public_dir().display()
    );
    let engine = engine_for(&output, &config);

    let report = engine.generate().unwrap();
    assert_eq!(report.packages, 1);

    let root = output.root_document();
    let (_, provider_doc) = provider(&output, &root, "acme");
    let (_, shard) = package_shard(&output, &provider_doc, "acme/widget");
    let package = &shard.packages.as_ref().unwrap()["acme/widget"]["1.0.0"];
    assert_eq!(package.source.as_ref().unwrap().reference, "aaa111");
    assert_eq!(
        package.source.as_ref().unwrap().url,
        "https://gitlab.example.com/acme/widget.git"
    );

    // A new tag upstream
    *routes.lock().unwrap() = gitlab_routes(json!([
        {"name": "1.0.0", "commit": {"id": "aaa111"}},
        {"name": "1.1.0", "commit": {"id": "bbb222"}}
    ]));
    let report = engine
        .update(&[PackageRef::new("acme", "acme/widget")])
        .unwrap();
    assert_eq!(report.updated.len(), 1);

    let root = output.root_document();
    let (_, provider_doc) = provider(&output, &root, "acme");
    let (_, shard) = package_shard(&output, &provider_doc, "acme/widget");
    let versions: Vec<_> = shard.packages.unwrap()["acme/widget"].keys().cloned().collect();
    assert_eq!(versions, vec!["1.0.0".to_string(), "1.1.0".to_string()]);
    assert!(engine.verify().unwrap().is_healthy());
}
