use std::{
    env, fs,
    process::Command,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use devkit_config::{DEVKIT_CONF_ENV, OTLP_ENDPOINT_ENV};
use devkit_probe::{ProbeContext, ProbeError, Prober, Requirement, RunContext, CI_ENV};
use tracing::{debug, info, trace};

use super::*;

const CHILD_ENV: &str = "DEVKIT_LOGGER_CHILD";

fn ci() -> ProbeContext {
    ProbeContext::new(RunContext::Ci, "tests/ci")
}

fn local() -> ProbeContext {
    ProbeContext::new(RunContext::Local, "tests/local")
}

fn memory_stub(name: &str) -> (MemoryConsole, StubLogger) {
    let console = MemoryConsole::new();
    let logger = StubLogger::new(name, Arc::new(console.clone()));
    (console, logger)
}

#[derive(Default)]
struct RecordingBackend {
    created: Mutex<Vec<String>>,
    console: MemoryConsole,
}

impl LogBackend for RecordingBackend {
    fn create_logger(&self, name: &str) -> Box<dyn Logger> {
        self.created.lock().unwrap().push(name.to_owned());
        Box::new(StubLogger::new(
            format!("cloud:{name}"),
            Arc::new(self.console.clone()),
        ))
    }
}

#[test]
fn test_stub_line_format() {
    let (console, logger) = memory_stub("api");
    logger.info("server started", None);
    logger.warn("slow request", Some(&fields!({ "ms": 812 })));

    assert_eq!(
        console.lines(),
        vec![
            (ConsoleStream::Stdout, "info - [api] server started".to_owned()),
            (
                ConsoleStream::Stderr,
                "warn - [api] slow request {\"ms\":812}".to_owned()
            ),
        ]
    );
}

#[test]
fn test_stub_levels_map_to_streams() {
    let (console, logger) = memory_stub("x");
    logger.debug("d", None);
    logger.info("i", None);
    logger.warn("w", None);
    logger.error("e", None);

    // debug is emitted, not silenced
    assert_eq!(
        console.stream(ConsoleStream::Stdout),
        vec!["debug - [x] d", "info - [x] i"]
    );
    assert_eq!(
        console.stream(ConsoleStream::Stderr),
        vec!["warn - [x] w", "error - [x] e"]
    );
}

#[test]
fn test_child_fields_are_rendered() {
    let (console, logger) = memory_stub("worker");
    let child = logger.child(fields!({ "job": "sync", "attempt": 1 }));
    child.info("started", None);

    let line = console.stream(ConsoleStream::Stdout).pop().unwrap();
    let (prefix, json) = line.split_once(" {").unwrap();
    assert_eq!(prefix, "info - [worker] started");
    let rendered: serde_json::Value = serde_json::from_str(&format!("{{{json}")).unwrap();
    assert_eq!(rendered["job"], "sync");
    assert_eq!(rendered["attempt"], 1);
}

#[test]
fn test_child_merging_keeps_order_and_overrides() {
    let (console, logger) = memory_stub("svc");
    let child = logger
        .child(fields!({ "a": 1, "b": 2 }))
        .child(fields!({ "a": 10, "c": 3 }));
    child.error("boom", Some(&fields!({ "b": 20 })));

    assert_eq!(
        console.stream(ConsoleStream::Stderr),
        vec!["error - [svc] boom {\"a\":10,\"b\":20,\"c\":3}"]
    );
}

#[test]
fn test_child_does_not_touch_parent() {
    let (console, logger) = memory_stub("svc");
    let child = logger.child(fields!({ "request_id": "r-1" }));
    logger.info("parent", None);
    child.info("child", None);
    assert_eq!(child.name(), "svc");

    assert_eq!(
        console.stream(ConsoleStream::Stdout),
        vec![
            "info - [svc] parent",
            "info - [svc] child {\"request_id\":\"r-1\"}"
        ]
    );
}

#[tokio::test]
async fn test_stub_flush_is_silent() {
    let (console, logger) = memory_stub("flush");
    logger.flush().await.unwrap();
    logger.child(fields!({ "k": "v" })).flush().await.unwrap();
    assert!(console.lines().is_empty());
}

#[test]
fn test_ci_without_backend_degrades_to_stub() {
    let console = MemoryConsole::new();
    let prober: Prober<Arc<dyn LogBackend>> = Prober::new("cloud logging backend", "enable it");
    let factory = LoggerFactory::resolve(
        &prober,
        &ci(),
        Requirement::Required,
        Arc::new(console.clone()),
        || Err::<Arc<dyn LogBackend>, _>("built without the `cloud` feature"),
    )
    .unwrap();
    assert!(factory.is_degraded());
    assert!(prober.announced());

    factory.create_logger("x").error("boom", None);
    assert_eq!(console.stream(ConsoleStream::Stderr), vec!["error - [x] boom"]);
}

#[test]
fn test_local_without_backend_is_missing() {
    let prober: Prober<Arc<dyn LogBackend>> = Prober::new("cloud logging backend", "enable it");
    let result = LoggerFactory::resolve(
        &prober,
        &local(),
        Requirement::Required,
        Arc::new(MemoryConsole::new()),
        || Err::<Arc<dyn LogBackend>, _>(LoggerError::NotConfigured("no endpoint".to_owned())),
    );
    match result {
        Err(ProbeError::Missing {
            dependency, reason, ..
        }) => {
            assert_eq!(dependency, "cloud logging backend");
            assert_eq!(reason, "Not configured: no endpoint");
        }
        Ok(_) => panic!("a missing backend must not yield a factory"),
    }
}

#[test]
fn test_present_backend_is_delegated_to() {
    let backend = Arc::new(RecordingBackend::default());
    let shared: Arc<dyn LogBackend> = backend.clone();
    let prober: Prober<Arc<dyn LogBackend>> = Prober::new("cloud logging backend", "enable it");
    let factory = LoggerFactory::resolve(
        &prober,
        &local(),
        Requirement::Required,
        Arc::new(MemoryConsole::new()),
        || Ok::<_, LoggerError>(shared),
    )
    .unwrap();
    assert!(!factory.is_degraded());

    factory.create_logger("billing").info("charged", None);
    assert_eq!(*backend.created.lock().unwrap(), vec!["billing".to_owned()]);
    assert_eq!(
        backend.console.stream(ConsoleStream::Stdout),
        vec!["info - [cloud:billing] charged"]
    );
}

#[test]
fn test_backend_is_probed_once() {
    let loads = AtomicUsize::new(0);
    let prober: Prober<Arc<dyn LogBackend>> = Prober::new("cloud logging backend", "enable it");
    for _ in 0..2 {
        let factory = LoggerFactory::resolve(
            &prober,
            &ci(),
            Requirement::Required,
            Arc::new(MemoryConsole::new()),
            || {
                loads.fetch_add(1, Ordering::SeqCst);
                Err::<Arc<dyn LogBackend>, _>("absent")
            },
        )
        .unwrap();
        assert!(factory.is_degraded());
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(prober.attempts(), 1);
}

#[test]
fn test_optional_backend_never_fails_locally() {
    let prober: Prober<Arc<dyn LogBackend>> = Prober::new("cloud logging backend", "enable it");
    let factory = LoggerFactory::resolve(
        &prober,
        &local(),
        Requirement::Optional,
        Arc::new(MemoryConsole::new()),
        || Err::<Arc<dyn LogBackend>, _>("absent"),
    )
    .unwrap();
    assert!(factory.is_degraded());
}

#[cfg(not(feature = "cloud"))]
#[test]
fn test_cloud_backend_needs_the_feature() {
    let config = devkit_config::DevkitConfig {
        cloud_log: Some(devkit_config::CloudLogConfig::new("http://localhost:4317")),
        ..Default::default()
    };
    assert!(matches!(
        load_cloud_backend(&config),
        Err(LoggerError::NotCompiled(_))
    ));
}

/// Re-run this test binary on the ignored test `name` only
fn child_test(name: &str) -> Command {
    let mut command = Command::new(env::current_exe().unwrap());
    command
        .args([name, "--exact", "--ignored", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1");
    command
}

#[test]
fn test_create_logger_exits_outside_ci() {
    let dir = env::temp_dir().join(format!("devkit_logger_exit_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let conf_path = dir.join("devkit.toml");
    fs::write(&conf_path, "service_name = \"exit-test\"\n").unwrap();

    let output = child_test("tests::exit_child_create_logger")
        .env(DEVKIT_CONF_ENV, &conf_path)
        .env_remove(CI_ENV)
        .env_remove(OTLP_ENDPOINT_ENV)
        .output()
        .unwrap();
    fs::remove_dir_all(dir).unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}\nstderr: {stderr}");
    assert!(stderr.contains("[devkit] FATAL: cloud logging backend not available"));
    assert!(stderr.contains("features = [\"cloud\"]"));
    assert!(!stdout.contains("logger created"));
}

#[test]
#[ignore = "spawned by test_create_logger_exits_outside_ci"]
fn exit_child_create_logger() {
    if env::var_os(CHILD_ENV).is_none() {
        return;
    }
    let _logger = create_logger("child");
    println!("logger created");
}

/// The cloud tests install the global subscriber, once per process: each one
/// runs alone in a child process.
#[cfg(feature = "cloud")]
mod cloud {
    use std::path::{Path, PathBuf};

    use devkit_config::{CloudLogConfig, DevkitConfig};

    use super::*;

    const LOG_DIR_ENV: &str = "DEVKIT_LOGGER_TEST_LOG_DIR";

    // nothing listens there: exports fail fast
    const UNREACHABLE_OTLP_URL: &str = "http://127.0.0.1:1";

    fn cloud_config(log_dir: &Path) -> DevkitConfig {
        DevkitConfig {
            service_name: "cloud-test".to_owned(),
            cloud_log: Some(CloudLogConfig {
                rust_log: Some("info".to_owned()),
                log_to_stdout: false,
                log_dir: Some(log_dir.to_path_buf()),
                ..CloudLogConfig::new(UNREACHABLE_OTLP_URL)
            }),
            ..Default::default()
        }
    }

    fn log_dir_from_env() -> Option<PathBuf> {
        env::var_os(CHILD_ENV)?;
        env::var_os(LOG_DIR_ENV).map(PathBuf::from)
    }

    fn rolling_file_contents(dir: &Path) -> String {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with("cloud-test"))
            })
            .map(|path| fs::read_to_string(path).unwrap())
            .collect()
    }

    fn run_cloud_child(name: &str) {
        let dir = env::temp_dir().join(format!(
            "devkit_logger_{}_{}",
            name.replace("::", "_"),
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();

        let output = child_test(name)
            .env(LOG_DIR_ENV, &dir)
            .env_remove("RUST_LOG")
            .output()
            .unwrap();
        let contents = rolling_file_contents(&dir);
        fs::remove_dir_all(dir).unwrap();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(output.status.success(), "stdout: {stdout}\nstderr: {stderr}");
        assert!(stdout.contains("cloud child done"), "stdout: {stdout}");
        assert!(contents.contains("request handled"), "log file: {contents}");
        assert!(contents.contains("\"request\":\"r1\""), "log file: {contents}");
        assert!(!contents.contains("filtered out"), "log file: {contents}");
    }

    #[test]
    fn test_cloud_backend_without_runtime() {
        run_cloud_child("tests::cloud::child_cloud_backend_without_runtime");
    }

    #[test]
    fn test_cloud_backend_lifecycle() {
        run_cloud_child("tests::cloud::child_cloud_backend_lifecycle");
    }

    #[test]
    #[ignore = "spawned by test_cloud_backend_without_runtime"]
    fn child_cloud_backend_without_runtime() {
        let Some(dir) = log_dir_from_env() else {
            return;
        };
        assert!(tokio::runtime::Handle::try_current().is_err());

        let config = cloud_config(&dir);
        let prober: Prober<Arc<dyn LogBackend>> =
            Prober::new("cloud logging backend", "enable it");
        let factory = LoggerFactory::resolve(
            &prober,
            &ci(),
            Requirement::Required,
            Arc::new(MemoryConsole::new()),
            || load_cloud_backend(&config),
        )
        .unwrap();
        assert!(!factory.is_degraded());

        let logger = factory
            .create_logger("api")
            .child(fields!({ "request": "r1" }));
        logger.info("request handled", None);
        let shut_down = factory.shutdown();
        assert!(
            matches!(shut_down, Ok(()) | Err(LoggerError::Otlp(_))),
            "{shut_down:?}"
        );
        println!("cloud child done");
    }

    #[tokio::test]
    #[ignore = "spawned by test_cloud_backend_lifecycle"]
    async fn child_cloud_backend_lifecycle() {
        let Some(dir) = log_dir_from_env() else {
            return;
        };
        let config = cloud_config(&dir);
        let backend = load_cloud_backend(&config).unwrap();

        let logger = backend.create_logger("api");
        let child = logger.child(fields!({ "request": "r1" }));
        child.info("request handled", Some(&fields!({ "ms": 3 })));
        child.error("request failed", None);
        logger.debug("filtered out by rust_log", None);

        let flushed = child.flush().await;
        assert!(
            matches!(flushed, Ok(()) | Err(LoggerError::Otlp(_))),
            "{flushed:?}"
        );

        // the global subscriber is taken
        assert!(matches!(
            load_cloud_backend(&config),
            Err(LoggerError::TracingSubscriber(_))
        ));
        // the first backend still works
        logger.warn("after failed install", None);

        let first = backend.shutdown();
        assert!(matches!(first, Ok(()) | Err(LoggerError::Otlp(_))), "{first:?}");
        backend.shutdown().unwrap();
        // records after shutdown are dropped, not a panic
        child.info("after shutdown", None);
        println!("cloud child done");
    }
}

#[tokio::test]
async fn test_shutdown_without_factory() {
    // nothing in this process resolved the global factory
    shutdown().await.unwrap();
}

#[test]
fn test_log_init() {
    log_init(Some("debug"));
    info!("This is an INFO test log message");
    debug!("This is a DEBUG test log message");
    // The next message is a TRACE level and should be ignored
    trace!("This is a TRACE test log message");
    // second call is a no-op
    log_init(None);
}

#[test]
fn test_level_display() {
    assert_eq!(Level::Debug.to_string(), "debug");
    assert_eq!(Level::Error.as_str(), "error");
    assert_eq!(ConsoleStream::from(Level::Info), ConsoleStream::Stdout);
    assert_eq!(ConsoleStream::from(Level::Warn), ConsoleStream::Stderr);
}
