//! End-to-end suite runs against the scripted automation server.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use mobile_harness::capabilities::CapabilityValue;
use mobile_harness::{
    By, Configuration, ElementRef, ElementScript, Error, Level, MemoryWriter, ReportSettings,
    Reporter, Result, Scenario, ScenarioContext, ScenarioState, ScriptedServer, SuiteParameters,
    SuiteRunner, SuiteState, TestOutcome,
};

// ============================================================================
// Fixture
// ============================================================================

struct Harness {
    server: ScriptedServer,
    writer: Arc<MemoryWriter>,
    reporter: Arc<Reporter>,
    runner: SuiteRunner,
    shots: TempDir,
}

fn harness(extra: &[(&str, &str)]) -> Harness {
    harness_with_runtime(extra, &[])
}

fn harness_with_runtime(extra: &[(&str, &str)], runtime: &[(&str, &str)]) -> Harness {
    let shots = tempfile::tempdir().expect("tempdir");
    let shots_dir = shots.path().display().to_string();

    let mut pairs = vec![
        ("appium.server.url", "http://127.0.0.1:4723"),
        ("test.platform", "android"),
        ("android.platform.version", "14"),
        ("android.device.name", "Pixel 8"),
        ("android.app.path", "/apps/demo.apk"),
        ("android.app.package", "com.example.demo"),
        ("android.app.activity", ".MainActivity"),
        ("ios.platform.version", "17.4"),
        ("ios.device.name", "iPhone 15"),
        ("ios.app.path", "/apps/Demo.app"),
        ("ios.bundle.id", "com.example.demo"),
        ("test.timeout.explicit", "5"),
        ("test.retry.count", "2"),
        ("screenshot.dir", shots_dir.as_str()),
    ];
    pairs.extend_from_slice(extra);
    let config = Configuration::from_pairs(pairs).with_runtime_overrides(runtime.iter().copied());

    let server = ScriptedServer::new();
    let writer = Arc::new(MemoryWriter::new());
    let reporter = Arc::new(Reporter::new(ReportSettings::default(), writer.clone()));
    let runner = SuiteRunner::new(config, Arc::new(server.clone()), reporter.clone());

    Harness {
        server,
        writer,
        reporter,
        runner,
        shots,
    }
}

fn levels(events: &[mobile_harness::ReportEvent]) -> Vec<Level> {
    events.iter().map(|e| e.level).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

struct Login;

#[async_trait]
impl Scenario for Login {
    fn name(&self) -> &str {
        "Valid login"
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
        let username = ElementRef::new("Username").any(By::id("username"));
        let login = ElementRef::new("Login").any(By::id("login"));
        let home = ElementRef::new("Home Screen").any(By::accessibility_id("home"));

        let ui = ctx.interactor();
        ui.wait_visible(&username).await.into_result()?;
        ui.type_text(&username, "user1").await?;
        ui.click(&login).await?;
        ui.with_timeout(Duration::from_secs(30))
            .wait_visible(&home)
            .await
            .into_result()?;
        Ok(())
    }
}

struct AlwaysFails;

#[async_trait]
impl Scenario for AlwaysFails {
    fn name(&self) -> &str {
        "Broken checkout"
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
        ctx.ensure(false, "cart total mismatch")
    }
}

struct HomeNeverAppears;

#[async_trait]
impl Scenario for HomeNeverAppears {
    fn name(&self) -> &str {
        "Login lands on home"
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
        let login = ElementRef::new("Login").any(By::id("login"));
        let home = ElementRef::new("Home Screen").any(By::accessibility_id("home"));

        let ui = ctx.interactor();
        ui.click(&login).await?;
        ui.wait_visible(&home).await.into_result()?;
        Ok(())
    }
}

struct Panics;

#[async_trait]
impl Scenario for Panics {
    fn name(&self) -> &str {
        "Panicking scenario"
    }

    async fn run(&self, _ctx: &ScenarioContext) -> Result<()> {
        panic!("index out of bounds");
    }
}

struct SkipsItself;

#[async_trait]
impl Scenario for SkipsItself {
    fn name(&self) -> &str {
        "Unsupported feature"
    }

    async fn run(&self, _ctx: &ScenarioContext) -> Result<()> {
        Err(Error::skipped("feature flag off"))
    }
}

struct Steps;

#[async_trait]
impl Scenario for Steps {
    fn name(&self) -> &str {
        "Profile steps"
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
        let name = ElementRef::new("Profile name").any(By::id("profile_name"));
        let text = ctx
            .step("Read profile name", ctx.interactor().read_text(&name))
            .await?;
        ctx.step("Open missing tab", async {
            Err::<(), _>(Error::assertion(format!("no tab for {text}")))
        })
        .await
    }
}

struct Named(String);

#[async_trait]
impl Scenario for Named {
    fn name(&self) -> &str {
        &self.0
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
        ctx.session()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_android_login_end_to_end() {
    let h = harness(&[]);
    h.server.add_element(By::id("username"), ElementScript::visible());
    h.server.add_element(By::id("login"), ElementScript::visible());
    h.server.add_element(
        By::accessibility_id("home"),
        ElementScript::visible().appearing_after(3),
    );

    let summary = h
        .runner
        .run(SuiteParameters::new("Login"), vec![Arc::new(Login)])
        .await
        .expect("suite");

    assert!(summary.is_success());
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.scenarios[0].state, ScenarioState::Passed);
    assert_eq!(h.runner.state(), SuiteState::Done);

    let tests = h.reporter.tests();
    assert_eq!(tests.len(), 1);
    let events = tests[0].events();
    assert_eq!(
        levels(&events),
        [
            Level::Info,
            Level::Pass,
            Level::Pass,
            Level::Pass,
            Level::Pass,
            Level::Pass
        ]
    );
    assert_eq!(events[0].message, "Scenario started: Valid login");
    assert_eq!(events[2].message, "Entered text 'user1' in: Username");
    assert_eq!(events[3].message, "Clicked on: Login");
    assert_eq!(events[5].message, "Scenario passed: Valid login");
    assert_eq!(tests[0].status(), Some(Level::Pass));

    assert_eq!(h.server.value(&By::id("username")).as_deref(), Some("user1"));
    assert_eq!(h.server.sessions_created(), 1);
    assert_eq!(h.server.sessions_quit(), 1);

    let caps = h.server.capabilities();
    assert_eq!(
        caps[0].get("deviceName"),
        Some(&CapabilityValue::from("Pixel 8"))
    );

    let document = h.writer.last().expect("flushed");
    assert_eq!(h.writer.writes(), 1);
    assert_eq!(document.tests.len(), 1);
    assert_eq!(document.system_info.get("platform").map(String::as_str), Some("Android"));
    assert!(
        document
            .suite_events
            .iter()
            .any(|e| e.message.starts_with("Test Suite: Login finished - Total: 1, Passed: 1"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_retried_per_scenario_teardown() {
    let h = harness(&[("session.teardown", "scenario")]);

    let summary = h
        .runner
        .run(SuiteParameters::new("Checkout"), vec![Arc::new(AlwaysFails)])
        .await
        .expect("suite");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.retried, 2);
    assert_eq!(summary.scenarios[0].attempts, 3);
    assert!(!summary.is_success());

    let statuses = h
        .reporter
        .tests()
        .iter()
        .map(|t| t.status())
        .collect::<Vec<_>>();
    assert_eq!(
        statuses,
        [Some(Level::Skip), Some(Level::Skip), Some(Level::Fail)]
    );

    let last = h.reporter.tests()[2].events();
    let fail = last.last().expect("final event");
    assert_eq!(
        fail.message,
        "Scenario failed: Broken checkout - Assertion failed: cart total mismatch"
    );
    let shot = fail.artifact.as_ref().expect("failure screenshot");
    assert!(shot.starts_with(h.shots.path()));
    assert!(shot.exists());

    assert_eq!(h.server.sessions_created(), 3);
    assert_eq!(h.server.sessions_quit(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failure_retried_per_suite_teardown() {
    let h = harness(&[("session.teardown", "suite")]);

    let summary = h
        .runner
        .run(SuiteParameters::new("Checkout"), vec![Arc::new(AlwaysFails)])
        .await
        .expect("suite");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.scenarios[0].attempts, 3);

    let first = h.reporter.tests()[0].events();
    let retried = first.last().expect("retry event");
    assert_eq!(retried.level, Level::Skip);
    assert!(retried.message.contains("Retry 1/2 after failure"));

    assert_eq!(h.server.sessions_created(), 1);
    assert_eq!(h.server.sessions_quit(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_setup_failure_still_flushes() {
    let h = harness(&[]);

    let err = h
        .runner
        .run(
            SuiteParameters::new("Desktop").platform("windows"),
            vec![Arc::new(Login)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    assert_eq!(h.runner.state(), SuiteState::Done);
    assert_eq!(h.server.sessions_created(), 0);

    let document = h.writer.last().expect("flushed");
    assert!(document.tests.is_empty());
    assert!(
        document
            .suite_events
            .iter()
            .any(|e| e.level == Level::Fail && e.message.starts_with("Suite setup failed"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_panic_reported_as_failure() {
    let h = harness(&[("test.retry.count", "0")]);

    let summary = h
        .runner
        .run(SuiteParameters::new("Panics"), vec![Arc::new(Panics)])
        .await
        .expect("suite");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.scenarios[0].attempts, 1);

    let events = h.reporter.tests()[0].events();
    let fail = events.last().expect("event");
    assert_eq!(fail.level, Level::Fail);
    assert!(fail.message.contains("Scenario panicked: index out of bounds"));
    assert_eq!(h.server.sessions_quit(), h.server.sessions_created());
}

#[tokio::test(start_paused = true)]
async fn test_skip_is_not_retried() {
    let h = harness(&[]);

    let summary = h
        .runner
        .run(SuiteParameters::new("Skips"), vec![Arc::new(SkipsItself)])
        .await
        .expect("suite");

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.retried, 0);
    assert!(summary.is_success());
    assert_eq!(h.reporter.tests()[0].status(), Some(Level::Skip));
}

#[tokio::test(start_paused = true)]
async fn test_parallel_workers_drain_queue() {
    let h = harness(&[("test.parallel.workers", "3"), ("session.teardown", "suite")]);

    let scenarios = (0..6)
        .map(|n| Arc::new(Named(format!("scenario-{n}"))) as Arc<dyn Scenario>)
        .collect::<Vec<_>>();

    let summary = h
        .runner
        .run(SuiteParameters::new("Parallel"), scenarios)
        .await
        .expect("suite");

    assert_eq!(summary.total, 6);
    assert_eq!(summary.passed, 6);

    let names = summary
        .scenarios
        .iter()
        .map(|r| r.scenario.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        (0..6).map(|n| format!("scenario-{n}")).collect::<Vec<_>>()
    );
    assert!(
        summary
            .scenarios
            .iter()
            .all(|r| (1..=3).contains(&r.worker.as_u32()))
    );

    let created = h.server.sessions_created();
    assert!((1..=3).contains(&created));
    assert_eq!(h.server.sessions_quit(), created);
}

#[tokio::test(start_paused = true)]
async fn test_suite_parameters_override_device() {
    let h = harness(&[]);

    h.runner
        .run(
            SuiteParameters::new("Overrides").device_name("Galaxy S24"),
            vec![Arc::new(Named("device".to_string()))],
        )
        .await
        .expect("suite");

    let caps = h.server.capabilities();
    assert_eq!(
        caps[0].get("deviceName"),
        Some(&CapabilityValue::from("Galaxy S24"))
    );
    assert_eq!(
        h.writer
            .last()
            .expect("flushed")
            .system_info
            .get("device")
            .map(String::as_str),
        Some("Galaxy S24")
    );
}

#[tokio::test(start_paused = true)]
async fn test_steps_report_pass_and_fail() {
    let h = harness(&[("test.retry.count", "0")]);
    h.server.add_element(
        By::id("profile_name"),
        ElementScript::visible().with_text("Ada"),
    );

    let summary = h
        .runner
        .run(SuiteParameters::new("Steps"), vec![Arc::new(Steps)])
        .await
        .expect("suite");

    assert_eq!(summary.failed, 1);

    let events = h.reporter.tests()[0].events();
    let messages = events.iter().map(|e| (e.level, e.message.as_str())).collect::<Vec<_>>();
    assert_eq!(messages[0], (Level::Info, "Scenario started: Profile steps"));
    assert_eq!(messages[1], (Level::Info, "Got text 'Ada' from: Profile name"));
    assert_eq!(messages[2], (Level::Pass, "Read profile name"));
    assert_eq!(
        messages[3],
        (Level::Fail, "Open missing tab - Assertion failed: no tab for Ada")
    );
    assert_eq!(messages[4].0, Level::Fail);
}

#[tokio::test(start_paused = true)]
async fn test_home_timeout_retried_then_failed() {
    let h = harness(&[("test.timeout.explicit", "10")]);
    h.server.add_element(By::id("login"), ElementScript::visible());

    let summary = h
        .runner
        .run(SuiteParameters::new("Login"), vec![Arc::new(HomeNeverAppears)])
        .await
        .expect("suite");

    let cause = "Timed out after 10000ms waiting for 'Home Screen' to become visible";
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.scenarios[0].attempts, 3);
    assert_eq!(summary.scenarios[0].outcome, TestOutcome::failed(cause));

    let tests = h.reporter.tests();
    assert_eq!(tests.len(), 3);
    for (attempt, test) in tests.iter().enumerate() {
        let events = test.events();
        let terminal = if attempt < 2 { Level::Skip } else { Level::Fail };
        assert_eq!(
            levels(&events),
            [Level::Info, Level::Pass, Level::Fail, terminal],
            "attempt {attempt}"
        );
        assert_eq!(events[1].message, "Clicked on: Login");
        assert_eq!(
            events[2].message,
            format!("Element not visible: Home Screen - {cause}")
        );
        assert!(events[2].artifact.as_ref().is_some_and(|p| p.exists()));
        assert!(events[3].message.contains(cause));
        assert!(events[3].artifact.is_some());
        assert_eq!(test.status(), Some(terminal));
    }
    assert!(tests[0].events()[3].message.contains("Retry 1/2 after failure"));

    assert_eq!(h.server.clicks(&By::id("login")), 3);
    assert_eq!(h.server.sessions_created(), 3);
    assert_eq!(h.server.sessions_quit(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_platform_outranks_suite_parameter() {
    let h = harness_with_runtime(&[], &[("TEST_PLATFORM", "android")]);

    let summary = h
        .runner
        .run(
            SuiteParameters::new("Overrides")
                .platform("ios")
                .device_name("Galaxy S24"),
            vec![Arc::new(Named("platform".to_string()))],
        )
        .await
        .expect("suite");
    assert!(summary.is_success());

    let caps = h.server.capabilities();
    assert_eq!(caps[0].get("platformName"), Some(&CapabilityValue::from("Android")));
    assert_eq!(caps[0].get("deviceName"), Some(&CapabilityValue::from("Galaxy S24")));

    let document = h.writer.last().expect("flushed");
    assert_eq!(document.system_info.get("platform").map(String::as_str), Some("Android"));
    assert_eq!(document.system_info.get("device").map(String::as_str), Some("Galaxy S24"));
    assert!(
        document
            .suite_events
            .iter()
            .any(|e| e.message == "Platform set to: Android")
    );
}

#[tokio::test(start_paused = true)]
async fn test_suite_parameter_platform_applies_without_runtime_override() {
    let h = harness(&[]);

    h.runner
        .run(
            SuiteParameters::new("iOS").platform("ios"),
            vec![Arc::new(Named("platform".to_string()))],
        )
        .await
        .expect("suite");

    let caps = h.server.capabilities();
    assert_eq!(caps[0].get("platformName"), Some(&CapabilityValue::from("iOS")));
    assert_eq!(caps[0].get("deviceName"), Some(&CapabilityValue::from("iPhone 15")));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_scenario_names_rejected() {
    let h = harness(&[]);

    let scenarios: Vec<Arc<dyn Scenario>> = vec![
        Arc::new(Named("checkout".to_string())),
        Arc::new(Named("checkout".to_string())),
    ];
    let err = h
        .runner
        .run(SuiteParameters::new("Dupes"), scenarios)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("duplicate scenario name 'checkout'"));
    assert_eq!(h.server.sessions_created(), 0);
    assert_eq!(h.writer.writes(), 1);
}
