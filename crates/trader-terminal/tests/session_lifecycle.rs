//! Session manager lifecycle against the simulated terminal.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use trader_core::{Credential, CredentialVault};
use trader_terminal::{
    codes, SessionError, SessionManager, SessionState, SimulatedTerminal, TerminalClient, TerminalStatus,
};

fn credential(login: &str, password: &str, server: &str) -> Credential {
    Credential::new(login, SecretString::from(password.to_string()), server)
}

#[test]
fn test_successful_connect() {
    let terminal = SimulatedTerminal::accepting("12345678", "secret", "MetaQuotes-Demo");
    let mut manager = SessionManager::new(terminal);
    assert_eq!(manager.state(), &SessionState::Disconnected);

    let state = manager.connect(credential("12345678", "secret", "MetaQuotes-Demo"), 30000, false);

    assert_eq!(state, SessionState::Connected);
    assert!(manager.is_connected());
    assert!(manager.connected_since().is_some());
    assert!(manager.report().is_none());
    assert!(manager.ensure_connected().is_ok());
    assert_eq!(manager.client().initialize_calls(), 1);
    assert_eq!(manager.client().shutdown_calls(), 0);
}

#[test]
fn test_failed_connect_shuts_down_client() {
    let terminal = SimulatedTerminal::accepting("12345678", "secret", "MetaQuotes-Demo");
    let mut manager = SessionManager::new(terminal);

    let state = manager.connect(credential("12345678", "wrong", "MetaQuotes-Demo"), 30000, true);

    match &state {
        SessionState::Failed(reason) => assert_eq!(reason.code, codes::AUTH_FAILED),
        other => panic!("expected failure, got {}", other),
    }
    assert_eq!(manager.client().shutdown_calls(), 1);
    assert!(manager.report().is_none());
    assert!(manager.connected_since().is_none());

    match manager.ensure_connected() {
        Err(SessionError::InitFailed(reason)) => assert_eq!(reason.code, codes::AUTH_FAILED),
        other => panic!("unexpected {:?}", other),
    }

    manager.disconnect();
    assert_eq!(manager.state(), &SessionState::Disconnected);
    assert_eq!(manager.client().shutdown_calls(), 1);
}

#[test]
fn test_rejecting_terminal_reports_code() {
    let terminal = SimulatedTerminal::rejecting(codes::IPC_INIT_FAILED, "Terminal not found");
    let mut manager = SessionManager::new(terminal);

    let state = manager.connect(credential("1", "p", "s"), 1000, false);
    assert_eq!(state.failure().map(|r| r.code), Some(codes::IPC_INIT_FAILED));
    assert!(!manager.ensure_connected().unwrap_err().is_retryable());
}

#[test]
fn test_timeout_is_reported_as_failure() {
    let terminal = SimulatedTerminal::permissive().with_latency(Duration::from_millis(200));
    let mut manager = SessionManager::new(terminal);

    let state = manager.connect(credential("1", "p", "s"), 20, false);

    assert_eq!(state.failure().map(|r| r.code), Some(codes::IPC_TIMEOUT));
    assert!(manager.ensure_connected().unwrap_err().is_retryable());
    assert_eq!(manager.client().initialize_calls(), 1);
}

#[test]
fn test_disconnect_is_idempotent() {
    let mut manager = SessionManager::new(SimulatedTerminal::permissive());

    manager.disconnect();
    manager.disconnect();

    assert_eq!(manager.state(), &SessionState::Disconnected);
    assert_eq!(manager.client().shutdown_calls(), 0);
    assert!(matches!(manager.ensure_connected(), Err(SessionError::NotConnected)));
}

#[test]
fn test_disconnect_from_connected_releases_client() {
    let mut manager = SessionManager::new(SimulatedTerminal::permissive());
    manager.connect(credential("1", "p", "s"), 1000, false);

    manager.disconnect();

    assert_eq!(manager.state(), &SessionState::Disconnected);
    assert_eq!(manager.client().shutdown_calls(), 1);
    assert!(!manager.client().is_connected());
    assert!(manager.connected_since().is_none());
}

#[test]
fn test_reconnect_releases_previous_session() {
    let mut manager = SessionManager::new(SimulatedTerminal::permissive());
    manager.connect(credential("1", "p", "s"), 1000, false);
    manager.connect(credential("2", "p", "s"), 1000, false);

    assert!(manager.is_connected());
    assert_eq!(manager.client().initialize_calls(), 2);
    assert_eq!(manager.client().shutdown_calls(), 1);
    assert_eq!(manager.client().last_login(), Some("2"));
}

#[test]
fn test_connect_after_failure() {
    let terminal = SimulatedTerminal::accepting("1", "right", "s");
    let mut manager = SessionManager::new(terminal);

    manager.connect(credential("1", "wrong", "s"), 1000, false);
    assert!(manager.state().is_failed());

    let state = manager.connect(credential("1", "right", "s"), 1000, false);
    assert_eq!(state, SessionState::Connected);
}

#[test]
fn test_verbose_report_contains_exchange_directory() {
    let status = TerminalStatus::new()
        .with("connected", "true")
        .with(TerminalStatus::DATA_PATH, "/opt/terminal/data");
    let terminal = SimulatedTerminal::permissive().with_status(status);
    let mut manager = SessionManager::new(terminal);

    manager.connect(credential("1", "p", "s"), 1000, true);

    let report = manager.report().expect("verbose connect builds a report");
    assert_eq!(
        report.exchange_dir.as_deref(),
        Some(Path::new("/opt/terminal/data").join("MQL5").join("Files").as_path())
    );
    assert_eq!(report.version.as_ref().map(|v| v.build), Some(4150));
    assert!(report.render().contains("File exchange directory"));
}

#[test]
fn test_report_without_data_path() {
    let terminal = SimulatedTerminal::permissive().with_status(TerminalStatus::new().with("connected", "true"));
    let mut manager = SessionManager::new(terminal);

    manager.connect(credential("1", "p", "s"), 1000, true);

    let report = manager.report().unwrap();
    assert!(report.status.is_some());
    assert!(report.exchange_dir.is_none());
}

#[test]
fn test_terminal_path_is_forwarded() {
    let mut manager = SessionManager::new(SimulatedTerminal::permissive())
        .with_terminal_path("/opt/terminal/terminal64.exe");

    manager.connect(credential("1", "p", "s"), 1000, false);

    assert_eq!(
        manager.client().last_terminal_path().map(|p| p.as_path()),
        Some(Path::new("/opt/terminal/terminal64.exe"))
    );
}

/// 공유 카운터로 드롭 이후 shutdown 호출을 관찰하는 클라이언트.
struct CountingTerminal {
    inner: SimulatedTerminal,
    shutdowns: std::rc::Rc<std::cell::Cell<usize>>,
}

impl TerminalClient for CountingTerminal {
    fn initialize(&mut self, request: &trader_terminal::InitRequest<'_>) -> bool {
        self.inner.initialize(request)
    }

    fn last_error(&self) -> trader_terminal::TerminalError {
        self.inner.last_error()
    }

    fn shutdown(&mut self) {
        self.shutdowns.set(self.shutdowns.get() + 1);
        self.inner.shutdown();
    }

    fn version_info(&mut self) -> Option<trader_terminal::TerminalVersion> {
        self.inner.version_info()
    }

    fn terminal_status(&mut self) -> Option<TerminalStatus> {
        self.inner.terminal_status()
    }
}

#[test]
fn test_drop_connected_manager_shuts_down() {
    let shutdowns = std::rc::Rc::new(std::cell::Cell::new(0));
    {
        let client = CountingTerminal {
            inner: SimulatedTerminal::permissive(),
            shutdowns: shutdowns.clone(),
        };
        let mut manager = SessionManager::new(client);
        manager.connect(credential("1", "p", "s"), 1000, false);
        assert_eq!(shutdowns.get(), 0);
    }
    assert_eq!(shutdowns.get(), 1);
}

#[test]
fn test_drop_disconnected_manager_makes_no_call() {
    let shutdowns = std::rc::Rc::new(std::cell::Cell::new(0));
    {
        let client = CountingTerminal {
            inner: SimulatedTerminal::permissive(),
            shutdowns: shutdowns.clone(),
        };
        let _manager = SessionManager::new(client);
    }
    assert_eq!(shutdowns.get(), 0);
}

#[test]
fn test_boxed_client() {
    let client: Box<dyn TerminalClient> = Box::new(SimulatedTerminal::permissive());
    let mut manager = SessionManager::new(client);

    assert!(manager.connect(credential("1", "p", "s"), 1000, false).is_connected());
}

#[test]
fn test_vault_to_session() {
    let dir = tempfile::tempdir().unwrap();
    let vault = CredentialVault::new(dir.path());
    vault
        .store("demo", "5001234", "pa ss", "Broker-Demo")
        .unwrap();

    let credential = vault.load("demo").unwrap();
    assert_eq!(credential.identifier().as_number(), Some(5001234));

    let terminal = SimulatedTerminal::accepting("5001234", "pa ss", "Broker-Demo");
    let mut manager = SessionManager::new(terminal);
    assert!(manager.connect(credential, 1000, true).is_connected());
}
