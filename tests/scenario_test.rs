#![cfg(unix)]

use anyhow::Result;
use dev_ready::utils::validation::Validate;
use dev_ready::{DevReadyError, ScenarioConfig, ScenarioRunner};
use httpmock::prelude::*;
use tempfile::TempDir;

fn scenario(project_dir: &str, body: &str) -> Result<ScenarioConfig> {
    let normalized_path = project_dir.replace('\\', "/");
    let content = format!(
        r#"
[scenario]
name = "hmr-loop"
project_dir = "{}"
{}
"#,
        normalized_path, body
    );
    Ok(ScenarioConfig::from_toml_str(&content)?)
}

/// Edits a route and waits for the watcher to notice, like an HMR round trip.
#[tokio::test]
async fn test_edit_triggers_rebuild() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let project_dir = temp_dir.path().join("fixture");
    let project_dir = project_dir.to_str().unwrap();

    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("<main><h1>Index</h1></main>");
    });

    let body = format!(
        r#"
[[files]]
path = "app/routes/index.tsx"
contents = "<h1>Index</h1>"

[[processes]]
name = "dev"
command = "sh"
args = ["-c", "echo '💿 Built in 12ms'; while ! grep -q Changed app/routes/index.tsx; do sleep 0.05; done; echo '💿 Rebuilt in 3ms'; sleep 30"]
ready_pattern = "💿 Built in "
ready_timeout_ms = 3000

[[processes]]
name = "app"
command = "sh"
args = ["-c", "echo '✅ app ready: http://localhost:3099'; sleep 30"]
ready_pattern = "✅ app ready: "
ready_timeout_ms = 3000

[[steps]]
action = "expect_http"
url = "{}"
contains = "Index"
timeout_ms = 2000

[[steps]]
action = "write_file"
path = "app/routes/index.tsx"
contents = "<h1 className=\"text-white bg-black\">Changed</h1>"

[[steps]]
action = "wait_for_log"
process = "dev"
pattern = "Rebuilt in "
timeout_ms = 3000
"#,
        server.url("/")
    );

    let config = scenario(project_dir, &body)?;
    config.validate()?;

    let report = ScenarioRunner::new(config).run().await?;

    assert_eq!(report.name, "hmr-loop");
    assert_eq!(report.processes_started, 2);
    assert_eq!(report.steps_run, 3);
    page.assert();

    let edited = std::fs::read_to_string(temp_dir.path().join("fixture/app/routes/index.tsx"))?;
    assert!(edited.contains("Changed"));
    Ok(())
}

#[tokio::test]
async fn test_process_that_never_gets_ready() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = scenario(
        temp_dir.path().to_str().unwrap(),
        r#"
[[processes]]
name = "dev"
command = "sh"
args = ["-c", "echo 'compiling...'; sleep 30"]
ready_pattern = "💿 Built in "
ready_timeout_ms = 300
"#,
    )?;

    let err = ScenarioRunner::new(config).run().await.unwrap_err();
    assert!(matches!(err, DevReadyError::Process { ref name, .. } if name == "dev"));
    Ok(())
}

#[tokio::test]
async fn test_failed_step_reports_its_number() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("<h1>Index</h1>");
    });

    let body = format!(
        r#"
[[steps]]
action = "sleep"
ms = 10

[[steps]]
action = "expect_http"
url = "{}"
contains = "Changed"
timeout_ms = 200
interval_ms = 50
"#,
        server.url("/")
    );
    let config = scenario(temp_dir.path().to_str().unwrap(), &body)?;

    let err = ScenarioRunner::new(config).run().await.unwrap_err();
    assert!(matches!(err, DevReadyError::Scenario { step: 2, .. }));
    Ok(())
}

#[tokio::test]
async fn test_stalled_page_respects_step_timeout() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200)
            .body("<h1>Changed</h1>")
            .delay(std::time::Duration::from_secs(4));
    });

    let body = format!(
        r#"
[[steps]]
action = "expect_http"
url = "{}"
contains = "Changed"
timeout_ms = 200
interval_ms = 50
"#,
        server.url("/")
    );
    let config = scenario(temp_dir.path().to_str().unwrap(), &body)?;

    let start = std::time::Instant::now();
    let err = ScenarioRunner::new(config).run().await.unwrap_err();

    assert!(matches!(err, DevReadyError::Scenario { step: 1, .. }));
    assert!(start.elapsed() < std::time::Duration::from_secs(2));
    Ok(())
}
