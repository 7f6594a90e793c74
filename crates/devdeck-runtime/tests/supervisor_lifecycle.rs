//! End-to-end lifecycle tests driving real child processes through `sh`.
#![cfg(unix)]

use devdeck_core::{
    ExitError, ProcessState, ServiceDescriptor, SupervisorError, SupervisorObserver,
    SupervisorSettings,
};
use devdeck_runtime::{DotenvEnvironment, InMemoryServiceCatalog, ProcessManager};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

fn sh(name: &str, script: &str) -> ServiceDescriptor {
    ServiceDescriptor::new(name, "sh").with_args(["-c", script])
}

fn fast_settings() -> SupervisorSettings {
    SupervisorSettings {
        start_grace_ms: 300,
        stop_timeout_secs: 2,
        kill_wait_secs: 2,
        ..SupervisorSettings::default()
    }
}

fn manager(services: Vec<ServiceDescriptor>) -> ProcessManager {
    ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(services)))
        .settings(fast_settings())
        .build()
}

async fn wait_done(manager: &ProcessManager, name: &str) {
    let mut done = manager.done_signal(name).await.expect("service never started");
    timeout(Duration::from_secs(5), done.wait())
        .await
        .expect("process did not exit in time");
}

#[derive(Default)]
struct RecordingObserver {
    exits: Mutex<Vec<(String, Option<ExitError>, Vec<String>)>>,
}

impl SupervisorObserver for RecordingObserver {
    fn on_exit(&self, service: &str, error: Option<&ExitError>, last_lines: &[String]) {
        self.exits.lock().unwrap().push((
            service.to_string(),
            error.cloned(),
            last_lines.to_vec(),
        ));
    }
}

#[tokio::test]
async fn test_start_and_stop_long_running_service() {
    let manager = manager(vec![sh("api", "exec sleep 30")]);

    manager.start("api").await.unwrap();
    assert_eq!(manager.status("api").await, ProcessState::Running);
    assert!(manager.pid("api").await.is_some());

    manager.stop("api").await.unwrap();
    assert_eq!(manager.status("api").await, ProcessState::Stopped);
    assert_eq!(manager.pid("api").await, None);
    assert_eq!(manager.last_error("api").await, None);
}

#[tokio::test]
async fn test_double_start_is_rejected() {
    let manager = manager(vec![sh("api", "exec sleep 30")]);

    manager.start("api").await.unwrap();
    let err = manager.start("api").await.unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyRunning(ref name) if name == "api"));

    manager.stop_all().await.unwrap();
}

#[tokio::test]
async fn test_stop_escalates_when_term_is_ignored() {
    let services = vec![sh(
        "stubborn",
        "trap '' TERM; echo ready; while true; do sleep 1; done",
    )];
    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(services)))
        .settings(SupervisorSettings {
            stop_timeout_secs: 1,
            ..fast_settings()
        })
        .build();

    manager.start("stubborn").await.unwrap();
    let started = Instant::now();
    manager.stop("stubborn").await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(manager.status("stubborn").await, ProcessState::Stopped);
}

#[tokio::test]
async fn test_last_output_keeps_most_recent_lines() {
    let manager = manager(vec![sh(
        "chatty",
        "i=1; while [ $i -le 60 ]; do echo line$i; i=$((i+1)); done",
    )]);

    manager.start("chatty").await.unwrap();
    wait_done(&manager, "chatty").await;

    let lines = manager.last_output("chatty").await;
    assert_eq!(lines.len(), 50);
    assert_eq!(lines.first().map(String::as_str), Some("line11"));
    assert_eq!(lines.last().map(String::as_str), Some("line60"));
}

#[tokio::test]
async fn test_clean_exit_after_grace_is_stopped() {
    let manager = manager(vec![sh("api", "sleep 1")]);

    manager.start("api").await.unwrap();
    assert_eq!(manager.status("api").await, ProcessState::Running);

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(manager.status("api").await, ProcessState::Stopped);
    assert_eq!(manager.last_error("api").await, None);
}

#[tokio::test]
async fn test_missing_executable_is_launch_failure() {
    let manager = manager(vec![ServiceDescriptor::new(
        "broken",
        "/nonexistent/devdeck-missing-binary",
    )]);

    let err = manager.start("broken").await.unwrap_err();
    assert!(matches!(err, SupervisorError::LaunchFailure { ref name, .. } if name == "broken"));
    assert_eq!(manager.status("broken").await, ProcessState::Error);
    assert!(manager.last_error("broken").await.is_some());
}

#[tokio::test]
async fn test_error_exit_within_grace_reports_output() {
    let manager = manager(vec![sh("crashy", "echo boom >&2; exit 3")]);

    let err = manager.start("crashy").await.unwrap_err();
    assert!(err.captured_output().iter().any(|line| line == "boom"));
    assert_eq!(manager.status("crashy").await, ProcessState::Error);
    assert_eq!(
        manager.last_error("crashy").await.as_deref(),
        Some("exited with status 3")
    );
}

#[tokio::test]
async fn test_group_start_collects_failures() {
    let manager = manager(vec![
        sh("ok", "exec sleep 30").with_group("mesh"),
        ServiceDescriptor::new("broken", "/nonexistent/devdeck-missing-binary").with_group("mesh"),
        sh("other", "exec sleep 30").with_group("elsewhere"),
    ]);

    let err = manager.start_group("mesh").await.unwrap_err();
    assert_eq!(err.failed_services(), vec!["broken"]);
    assert_eq!(manager.status("ok").await, ProcessState::Running);
    assert_eq!(manager.status("other").await, ProcessState::Stopped);

    // Already running members count as success
    let err = manager.start_group("mesh").await.unwrap_err();
    assert_eq!(err.failed_services(), vec!["broken"]);

    manager.stop_group("mesh").await.unwrap();
    assert_eq!(manager.status("ok").await, ProcessState::Stopped);
}

#[tokio::test]
async fn test_subscriber_sees_exit_sentinel_then_close() {
    let manager = manager(vec![sh("api", "echo hello; exec sleep 30")]);

    manager.start("api").await.unwrap();
    let (mut rx, _handle) = manager.subscribe_logs("api").await;
    manager.stop("api").await.unwrap();

    let mut received = Vec::new();
    while let Some(line) = timeout(Duration::from_secs(2), rx.recv()).await.unwrap() {
        received.push(line);
    }
    assert_eq!(received.last().map(String::as_str), Some("[api exited]"));

    // Later subscribers get a closed stream
    let (mut late, _late_handle) = manager.subscribe_logs("api").await;
    assert!(late.recv().await.is_none());
}

#[tokio::test]
async fn test_subscribers_receive_every_line_in_order() {
    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(vec![sh(
        "counter",
        "sleep 0.5; i=1; while [ $i -le 100 ]; do echo $i; i=$((i+1)); done",
    )])))
    .settings(SupervisorSettings {
        start_grace_ms: 50,
        ..fast_settings()
    })
    .build();

    manager.start("counter").await.unwrap();
    let (mut first, _h1) = manager.subscribe_logs("counter").await;
    let (mut second, _h2) = manager.subscribe_logs("counter").await;

    let mut expected: Vec<String> = (1..=100).map(|i| i.to_string()).collect();
    expected.push("[counter exited]".to_string());

    for rx in [&mut first, &mut second] {
        let mut lines = Vec::new();
        while let Some(line) = timeout(Duration::from_secs(5), rx.recv()).await.unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, expected);
    }
}

#[tokio::test]
async fn test_observer_receives_exit_status_and_output() {
    let observer = Arc::new(RecordingObserver::default());
    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(vec![sh(
        "worker",
        "echo working; sleep 0.5; exit 4",
    )])))
    .settings(SupervisorSettings {
        start_grace_ms: 50,
        ..fast_settings()
    })
    .observer(observer.clone())
    .build();

    manager.start("worker").await.unwrap();
    wait_done(&manager, "worker").await;

    let exits = observer.exits.lock().unwrap();
    assert_eq!(exits.len(), 1);
    let (service, error, lines) = &exits[0];
    assert_eq!(service, "worker");
    assert_eq!(error, &Some(ExitError::Status(4)));
    assert_eq!(lines, &vec!["working".to_string()]);
    drop(exits);

    assert_eq!(manager.status("worker").await, ProcessState::Error);
}

#[tokio::test]
async fn test_requested_stop_reports_no_error_to_observer() {
    let observer = Arc::new(RecordingObserver::default());
    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(vec![sh(
        "api",
        "exec sleep 30",
    )])))
    .settings(fast_settings())
    .observer(observer.clone())
    .build();

    manager.start("api").await.unwrap();
    manager.stop("api").await.unwrap();

    let exits = observer.exits.lock().unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].1, None);
}

#[tokio::test]
async fn test_child_receives_dotenv_variables() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join(".env");
    std::fs::write(&env_path, "DEVDECK_GREETING=hello-from-env\n").unwrap();

    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(vec![sh(
        "greeter",
        "echo $DEVDECK_GREETING",
    )])))
    .settings(fast_settings())
    .environment(Arc::new(DotenvEnvironment::new(&env_path)))
    .build();

    manager.start("greeter").await.unwrap();
    wait_done(&manager, "greeter").await;
    assert_eq!(manager.last_output("greeter").await, vec!["hello-from-env"]);
}

#[tokio::test]
async fn test_working_dir_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let manager = manager(vec![sh("pwd", "pwd -P").with_working_dir(&canonical)]);

    manager.start("pwd").await.unwrap();
    wait_done(&manager, "pwd").await;
    assert_eq!(
        manager.last_output("pwd").await,
        vec![canonical.display().to_string()]
    );
}

#[tokio::test]
async fn test_exited_service_can_be_restarted() {
    let manager = manager(vec![sh("oneshot", "echo run")]);

    manager.start("oneshot").await.unwrap();
    wait_done(&manager, "oneshot").await;
    assert_eq!(manager.status("oneshot").await, ProcessState::Stopped);

    manager.start("oneshot").await.unwrap();
    wait_done(&manager, "oneshot").await;
    assert_eq!(manager.list().await.len(), 1);
}

#[tokio::test]
async fn test_events_track_transitions() {
    let manager = manager(vec![sh("api", "exec sleep 30")]);
    let mut events = manager.events();

    manager.start("api").await.unwrap();
    manager.stop("api").await.unwrap();

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.service, "api");
        states.push(event.state);
    }
    assert_eq!(
        states,
        vec![
            ProcessState::Starting,
            ProcessState::Running,
            ProcessState::Stopping,
            ProcessState::Stopped,
        ]
    );
}

#[tokio::test]
async fn test_list_reports_known_services() {
    let manager = manager(vec![
        sh("b", "exec sleep 30").with_port(4100),
        sh("a", "exec sleep 30"),
    ]);

    manager.start("b").await.unwrap();
    manager.start("a").await.unwrap();

    let infos = manager.list().await;
    let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(infos[1].port, Some(4100));
    assert!(infos.iter().all(|i| i.started_at.is_some()));

    manager.stop_all().await.unwrap();
    assert!(
        manager
            .list()
            .await
            .iter()
            .all(|i| i.state == ProcessState::Stopped)
    );
}

#[tokio::test]
async fn test_kill_on_free_port_finds_nothing() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let manager = manager(Vec::new());
    assert!(manager.kill_process_on_port(port).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stalled_subscriber_still_sees_exit_line() {
    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(vec![sh(
        "burst",
        "i=1; while [ $i -le 40 ]; do echo $i; i=$((i+1)); done",
    )])))
    .settings(SupervisorSettings {
        subscriber_capacity: 16,
        ..fast_settings()
    })
    .build();

    let (mut rx, _handle) = manager.start_subscribed("burst").await.unwrap();
    wait_done(&manager, "burst").await;

    // Drain only after the child is long gone
    let mut lines = Vec::new();
    while let Some(line) = timeout(Duration::from_secs(2), rx.recv()).await.unwrap() {
        lines.push(line);
    }

    let mut expected: Vec<String> = (1..=16).map(|i| i.to_string()).collect();
    expected.push("[burst exited]".to_string());
    assert_eq!(lines, expected);
    assert_eq!(manager.last_output("burst").await.len(), 40);
}

#[tokio::test]
async fn test_start_subscribed_includes_startup_output() {
    let manager = manager(vec![sh("api", "echo booting; exec sleep 30")]);

    let (mut rx, _handle) = manager.start_subscribed("api").await.unwrap();
    let first = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    assert_eq!(first.as_deref(), Some("booting"));

    manager.stop("api").await.unwrap();
}

#[tokio::test]
async fn test_zero_capacities_do_not_panic() {
    let manager = ProcessManager::builder(Arc::new(InMemoryServiceCatalog::new(vec![sh(
        "api",
        "exec sleep 30",
    )])))
    .settings(SupervisorSettings {
        subscriber_capacity: 0,
        output_buffer_lines: 0,
        ..fast_settings()
    })
    .build();

    manager.start("api").await.unwrap();
    let (mut rx, _handle) = manager.subscribe_logs("api").await;
    manager.stop("api").await.unwrap();

    let last = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    assert_eq!(last.as_deref(), Some("[api exited]"));
    assert!(manager.last_output("api").await.is_empty());
}

#[tokio::test]
async fn test_kill_on_port_signals_listener() {
    if which::which("lsof").is_err() || which::which("python3").is_err() {
        eprintln!("lsof or python3 not installed, skipping");
        return;
    }

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let script = format!(
        "import socket, time\n\
         s = socket.socket()\n\
         s.setsockopt(socket.SOL_SOCKET, socket.SO_REUSEADDR, 1)\n\
         s.bind(('127.0.0.1', {port}))\n\
         s.listen()\n\
         time.sleep(30)\n"
    );
    let manager = manager(vec![
        ServiceDescriptor::new("listener", "python3").with_args(["-c", script.as_str()]),
    ]);

    manager.start("listener").await.unwrap();
    let pid = manager.pid("listener").await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err() {
        assert!(Instant::now() < deadline, "listener never bound port {port}");
        sleep(Duration::from_millis(50)).await;
    }

    let pids = manager.kill_process_on_port(port).await.unwrap();
    assert_eq!(pids, vec![pid]);

    wait_done(&manager, "listener").await;
    assert_eq!(manager.status("listener").await, ProcessState::Error);
    assert_eq!(
        manager.last_error("listener").await.as_deref(),
        Some("terminated by signal 15")
    );
}
