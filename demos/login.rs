//! Login flow demonstration.
//!
//! Demonstrates:
//! - Page objects built from platform-aware element refs
//! - Scenarios with reported steps
//! - Suite execution with retries and a JSON report
//!
//! Usage:
//!   cargo run --example login
//!   cargo run --example login -- --dry-run
//!   cargo run --example login -- --platform ios --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use common::Args;
use mobile_harness::{
    AutomationServer, By, Configuration, ElementRef, ElementScript, Error, HarnessSettings,
    Interactor, Reporter, Result, Scenario, ScenarioContext, ScriptedServer, SuiteParameters,
    SuiteRunner, WebDriverServer,
};

// ============================================================================
// Page Objects
// ============================================================================

struct LoginPage {
    interactor: Interactor,
    username: ElementRef,
    password: ElementRef,
    submit: ElementRef,
}

impl LoginPage {
    fn new(interactor: Interactor) -> Self {
        Self {
            interactor,
            username: ElementRef::new("Username field")
                .android(By::id("com.example.demo:id/username"))
                .ios(By::accessibility_id("username")),
            password: ElementRef::new("Password field")
                .android(By::id("com.example.demo:id/password"))
                .ios(By::accessibility_id("password")),
            submit: ElementRef::new("Login button")
                .android(By::id("com.example.demo:id/login"))
                .ios(By::ios_predicate("label == 'Log in'")),
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.interactor.wait_visible(&self.username).await.into_result()?;
        self.interactor.type_text(&self.username, username).await?;
        self.interactor.type_text(&self.password, password).await?;
        self.interactor.click(&self.submit).await
    }
}

struct HomeScreen {
    interactor: Interactor,
    greeting: ElementRef,
}

impl HomeScreen {
    fn new(interactor: Interactor) -> Self {
        Self {
            interactor,
            greeting: ElementRef::new("Home greeting").any(By::accessibility_id("home_greeting")),
        }
    }

    async fn greeting(&self) -> Result<String> {
        self.interactor.read_text(&self.greeting).await
    }
}

// ============================================================================
// Scenarios
// ============================================================================

struct ValidLogin;

#[async_trait]
impl Scenario for ValidLogin {
    fn name(&self) -> &str {
        "Valid login"
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<()> {
        let login = LoginPage::new(ctx.interactor().clone());
        ctx.step("Log in as demo user", login.login("demo", "secret"))
            .await?;

        let home = HomeScreen::new(ctx.interactor().with_timeout(Duration::from_secs(30)));
        let greeting = home.greeting().await?;
        ctx.ensure(
            greeting.contains("demo"),
            format!("unexpected greeting '{greeting}'"),
        )
    }
}

struct ForgotPassword;

#[async_trait]
impl Scenario for ForgotPassword {
    fn name(&self) -> &str {
        "Forgot password"
    }

    async fn run(&self, _ctx: &ScenarioContext) -> Result<()> {
        Err(Error::skipped("password reset is not deployed on this build"))
    }
}

// ============================================================================
// Dry Run
// ============================================================================

fn scripted_server() -> ScriptedServer {
    let server = ScriptedServer::new();
    for by in [
        By::id("com.example.demo:id/username"),
        By::id("com.example.demo:id/password"),
        By::id("com.example.demo:id/login"),
        By::accessibility_id("username"),
        By::accessibility_id("password"),
        By::ios_predicate("label == 'Log in'"),
    ] {
        server.add_element(by, ElementScript::visible());
    }
    server.add_element(
        By::accessibility_id("home_greeting"),
        ElementScript::visible()
            .appearing_after(3)
            .with_text("Welcome, demo"),
    );
    server
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Configuration::from_default_sources()?;
    let settings = HarnessSettings::from_config(&config)?;

    let server: Arc<dyn AutomationServer> = if args.dry_run {
        println!("[dry-run] Using scripted automation server");
        Arc::new(scripted_server())
    } else {
        Arc::new(WebDriverServer::from_config(&config)?)
    };

    let reporter = Reporter::global(settings.report.clone());
    let runner = SuiteRunner::new(config, server, reporter);

    let mut params = SuiteParameters::new("Login");
    if let Some(platform) = args.platform {
        params = params.platform(platform);
    }

    let scenarios: Vec<Arc<dyn Scenario>> = vec![Arc::new(ValidLogin), Arc::new(ForgotPassword)];
    let summary = runner.run(params, scenarios).await?;

    println!("[Suite] {summary}");
    println!("[Report] {}", settings.report.path.display());

    for report in &summary.scenarios {
        println!(
            "        {} - {} ({} attempt(s))",
            report.scenario, report.outcome, report.attempts
        );
    }

    Ok(())
}
