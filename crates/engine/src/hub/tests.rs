// debughub - Debugger Coordination Hub
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    path::PathBuf,
    time::Duration,
};

use debughub_common::{Breakpoint, Capabilities, WatchTrigger, Watchpoint};
use tokio::{sync::mpsc::UnboundedReceiver, time::Instant};

use super::*;
use crate::{
    protocol::{BackendEvent, HubRequest},
    registry::LanguageRegistration,
    test_utils::{failing_factory, recording_factory, CommandLog},
};

fn python_registry(factory: crate::registry::InterfaceFactory) -> InterfaceRegistry {
    let mut registry = InterfaceRegistry::new();
    registry.register(
        "python",
        || vec![LanguageRegistration::new("Python3", Capabilities::ALL, [".py"], factory)],
        false,
    );
    registry
}

fn hub_with_config(
    log: &CommandLog,
    config: HubConfig,
) -> (DebugServer, UnboundedReceiver<HubEvent>) {
    DebugServer::builder()
        .config(config)
        .registry(python_registry(recording_factory(log.clone())))
        .build()
}

fn hub(log: &CommandLog) -> (DebugServer, UnboundedReceiver<HubEvent>) {
    hub_with_config(log, HubConfig::default())
}

fn drain(rx: &mut UnboundedReceiver<HubEvent>) -> Vec<HubEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn report(hub: &mut DebugServer, debugger_id: &str, event: BackendEvent) {
    let generation = hub.interface_generation();
    hub.handle_interface_event(InterfaceEvent::new(debugger_id, event).with_generation(generation));
}

fn attach(hub: &mut DebugServer, debugger_id: &str) {
    report(hub, debugger_id, BackendEvent::DebuggerId { debugger_id: debugger_id.to_string() });
}

/// Loads `main.py`, attaches `b1` and clears the command log.
fn debugging(log: &CommandLog, hub: &mut DebugServer) {
    hub.remote_load(LaunchRequest::new("main.py")).unwrap();
    attach(hub, "b1");
    assert_eq!(hub.state(), SessionState::Debugging);
    log.take();
}

fn set_bp(file: &str, line: u32) -> RemoteCommand {
    RemoteCommand::Breakpoint {
        file: PathBuf::from(file),
        line,
        set: true,
        condition: None,
        temporary: false,
    }
}

fn clear_bp(file: &str, line: u32) -> RemoteCommand {
    RemoteCommand::Breakpoint {
        file: PathBuf::from(file),
        line,
        set: false,
        condition: None,
        temporary: false,
    }
}

fn broadcast(command: RemoteCommand) -> (String, RemoteCommand) {
    (String::new(), command)
}

fn to(debugger_id: &str, command: RemoteCommand) -> (String, RemoteCommand) {
    (debugger_id.to_string(), command)
}

#[test]
fn test_launch_sends_environment_then_load() {
    debughub_common::logging::ensure_test_logging(None);
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);

    let mut request = LaunchRequest::new("main.py");
    request.environment.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
    hub.remote_load(request.clone()).unwrap();

    assert_eq!(hub.state(), SessionState::Launching);
    assert_eq!(hub.language(), Some("Python3"));
    assert!(hub.launch_deadline().is_some());
    assert_eq!(log.starts(), 1);
    assert_eq!(
        log.take(),
        vec![
            broadcast(RemoteCommand::Environment { vars: request.environment.clone() }),
            broadcast(request.command(LaunchMode::Debug)),
        ]
    );

    attach(&mut hub, "b1");
    assert_eq!(hub.state(), SessionState::Debugging);
    assert!(hub.launch_deadline().is_none());
    assert_eq!(hub.debugger_ids(), vec!["b1"]);
    assert_eq!(hub.session("b1").unwrap().capabilities, Capabilities::ALL);

    assert_eq!(
        drain(&mut events),
        vec![
            HubEvent::StateChanged { state: SessionState::Launching },
            HubEvent::StateChanged { state: SessionState::Debugging },
            HubEvent::NewBackendAttached { debugger_id: "b1".to_string() },
        ]
    );
}

#[test]
fn test_run_mode_reaches_running_no_stop() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);

    hub.remote_coverage(LaunchRequest::new("main.py"), true).unwrap();
    report(
        &mut hub,
        "",
        BackendEvent::Banner {
            version: "1.0".to_string(),
            platform: "linux".to_string(),
            interpreter: "python3".to_string(),
        },
    );
    assert_eq!(hub.state(), SessionState::RunningNoStop);

    // No propagation while running without stops.
    log.take();
    hub.edit_breakpoints(|store| store.add(Breakpoint::new("main.py", 3)));
    assert!(log.take().is_empty());
}

#[test]
fn test_unsupported_language_changes_nothing() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);

    let mut request = LaunchRequest::new("prog.cob");
    request.language = Some("Cobol85".to_string());
    assert!(matches!(
        hub.remote_load(request.clone()),
        Err(HubError::UnsupportedLanguage(l)) if l == "Cobol85"
    ));
    assert_eq!(hub.state(), SessionState::Idle);
    assert_eq!(log.starts(), 0);
    assert!(drain(&mut events).is_empty());

    // A running session survives the rejected launch.
    debugging(&log, &mut hub);
    assert!(hub.remote_load(request).is_err());
    assert_eq!(hub.state(), SessionState::Debugging);
    assert_eq!(log.shutdowns(), 0);
    assert_eq!(hub.debugger_ids(), vec!["b1"]);
}

#[test]
fn test_unknown_extension_falls_back_to_default_language() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);

    hub.remote_run(LaunchRequest::new("script.unknown")).unwrap();
    assert_eq!(hub.language(), Some("Python3"));

    let mut config = HubConfig::default();
    config.default_language = "Cobol85".to_string();
    let (mut hub, _events) = hub_with_config(&log, config);
    assert!(matches!(
        hub.remote_run(LaunchRequest::new("script.unknown")),
        Err(HubError::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_launch_without_process_fails() {
    let log = CommandLog::default();
    let (mut hub, mut events) = DebugServer::builder()
        .registry(python_registry(failing_factory(log.clone())))
        .build();

    let result = hub.remote_load(LaunchRequest::new("main.py"));
    assert!(matches!(result, Err(HubError::Start(_))));
    assert_eq!(hub.state(), SessionState::Idle);
    assert!(!hub.is_connected());

    let events = drain(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        HubEvent::LaunchFailed { reason } if reason.contains("no interpreter configured")
    )));
    assert_eq!(events.last(), Some(&HubEvent::LaunchFailed {
        reason: "no interpreter configured for Python3".to_string()
    }));
}

#[test]
fn test_passive_hub_refuses_to_launch() {
    let log = CommandLog::default();
    let (mut hub, _events) = DebugServer::builder()
        .registry(python_registry(recording_factory(log.clone())))
        .passive(true)
        .build();

    assert!(matches!(hub.remote_load(LaunchRequest::new("main.py")), Err(HubError::PassiveMode)));
    assert_eq!(log.starts(), 0);
}

#[test]
fn test_launch_deadline_expires() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);

    hub.remote_load(LaunchRequest::new("main.py")).unwrap();
    let deadline = hub.launch_deadline().unwrap();

    assert!(!hub.expire_launch(deadline - Duration::from_secs(1)));
    assert_eq!(hub.state(), SessionState::Launching);

    assert!(hub.expire_launch(deadline));
    assert_eq!(hub.state(), SessionState::Idle);
    assert_eq!(log.shutdowns(), 1);
    assert!(drain(&mut events).iter().any(|event| matches!(event, HubEvent::LaunchFailed { .. })));

    // Nothing pending any more.
    assert!(!hub.expire_launch(Instant::now() + Duration::from_secs(3600)));
}

#[test]
fn test_out_of_range_launch_timeout_has_no_deadline() {
    debughub_common::logging::ensure_test_logging(None);
    let log = CommandLog::default();
    let config = HubConfig { launch_timeout_secs: u64::MAX, ..Default::default() };
    let (mut hub, _events) = hub_with_config(&log, config);

    hub.remote_load(LaunchRequest::new("main.py")).unwrap();
    assert_eq!(hub.state(), SessionState::Launching);
    assert!(hub.launch_deadline().is_none());
    assert!(!hub.expire_launch(Instant::now() + Duration::from_secs(3600)));

    attach(&mut hub, "b1");
    assert_eq!(hub.state(), SessionState::Debugging);
}

#[test]
fn test_breakpoint_lifecycle_scenario() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);
    debugging(&log, &mut hub);

    let position = hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 10)));
    assert_eq!(position, 0);
    assert_eq!(log.take(), vec![broadcast(set_bp("a.py", 10))]);

    hub.edit_breakpoints(|store| store.set_enabled_at(0, false));
    let disable =
        RemoteCommand::BreakpointEnable { file: PathBuf::from("a.py"), line: 10, enable: false };
    assert_eq!(
        log.take(),
        vec![
            broadcast(clear_bp("a.py", 10)),
            broadcast(set_bp("a.py", 10)),
            broadcast(disable.clone()),
        ]
    );

    attach(&mut hub, "b2");
    assert_eq!(log.take(), vec![to("b2", set_bp("a.py", 10)), to("b2", disable)]);

    hub.edit_breakpoints(|store| store.delete_at(0));
    assert_eq!(log.take(), vec![broadcast(clear_bp("a.py", 10))]);
    assert!(hub.breakpoints().is_empty());

    attach(&mut hub, "b3");
    assert!(log.take().is_empty());
}

#[test]
fn test_watchpoint_broadcast_and_targeted_commands() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);
    debugging(&log, &mut hub);
    attach(&mut hub, "b2");
    log.take();

    hub.edit_watchpoints(|store| {
        store.add(Watchpoint::new("x==1").with_trigger(WatchTrigger::OnChange))
    });
    assert_eq!(
        log.take(),
        vec![broadcast(RemoteCommand::Watchpoint {
            condition: "x==1 ??changed??".to_string(),
            set: true,
            temporary: false,
        })]
    );

    hub.remote_step("b1").unwrap();
    assert_eq!(log.take(), vec![to("b1", RemoteCommand::Step)]);

    assert!(matches!(hub.remote_step("b9"), Err(HubError::UnknownBackend(id)) if id == "b9"));
    assert!(log.take().is_empty());
}

#[test]
fn test_replay_matches_incremental_propagation() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);
    debugging(&log, &mut hub);

    hub.edit_breakpoints(|store| {
        store.add_batch(vec![
            Breakpoint::new("a.py", 1).with_enabled(false),
            Breakpoint::new("a.py", 2).with_ignore_count(2).with_condition("x > 0"),
        ])
    });
    hub.edit_watchpoints(|store| {
        store.add(Watchpoint::new("y").with_trigger(WatchTrigger::OnCreate).with_ignore_count(1))
    });
    let incremental: Vec<RemoteCommand> = log.take().into_iter().map(|(_, cmd)| cmd).collect();

    attach(&mut hub, "b2");
    let replayed = log.take();
    assert!(replayed.iter().all(|(id, _)| id == "b2"));
    let replayed: Vec<RemoteCommand> = replayed.into_iter().map(|(_, cmd)| cmd).collect();

    assert_eq!(incremental, replayed);
    assert_eq!(incremental.len(), 6);
}

#[test]
fn test_replay_ends_with_no_debug_list() {
    let log = CommandLog::default();
    let mut config = HubConfig::default();
    config.multiprocess_no_debug = vec!["pip*".to_string()];
    let (mut hub, _events) = hub_with_config(&log, config);

    hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 1)));
    hub.remote_load(LaunchRequest::new("main.py")).unwrap();
    log.take();
    attach(&mut hub, "b1");

    assert_eq!(
        log.take(),
        vec![
            to("b1", set_bp("a.py", 1)),
            to("b1", RemoteCommand::NoDebugList { patterns: vec!["pip*".to_string()] }),
        ]
    );
}

#[test]
fn test_edits_while_idle_are_replayed_later() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);

    hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 5)));
    assert!(log.take().is_empty());

    hub.remote_load(LaunchRequest::new("main.py")).unwrap();
    log.take();
    attach(&mut hub, "b1");
    assert_eq!(log.take(), vec![to("b1", set_bp("a.py", 5))]);
}

#[test]
fn test_condition_errors_are_deduplicated() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    debugging(&log, &mut hub);
    hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 7).with_condition("x +")));
    hub.edit_watchpoints(|store| store.add(Watchpoint::new("z +")));
    drain(&mut events);

    let error = || BackendEvent::BreakConditionError { file: PathBuf::from("a.py"), line: 7 };
    report(&mut hub, "b1", error());
    report(&mut hub, "b1", error());
    assert_eq!(drain(&mut events).len(), 1);

    hub.edit_breakpoints(|store| store.set_condition_at(0, "x + 1"));
    report(&mut hub, "b1", error());
    assert_eq!(
        drain(&mut events),
        vec![HubEvent::BreakConditionError {
            debugger_id: "b1".to_string(),
            file: PathBuf::from("a.py"),
            line: 7
        }]
    );

    let watch_error = || BackendEvent::WatchConditionError { condition: "z +".to_string() };
    report(&mut hub, "b1", watch_error());
    report(&mut hub, "b1", watch_error());
    assert_eq!(drain(&mut events).len(), 1);
    hub.edit_watchpoints(|store| store.delete_all());
    report(&mut hub, "b1", watch_error());
    assert_eq!(drain(&mut events).len(), 1);
}

#[test]
fn test_temporary_hits_delete_store_entries() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);
    debugging(&log, &mut hub);
    hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 3).with_temporary(true)));
    hub.edit_watchpoints(|store| {
        store.add(Watchpoint::new("n").with_trigger(WatchTrigger::OnChange).with_temporary(true))
    });
    log.take();

    report(&mut hub, "b1", BackendEvent::ClearBreak { file: PathBuf::from("a.py"), line: 3 });
    assert!(hub.breakpoints().is_empty());
    assert_eq!(log.take(), vec![broadcast(clear_bp("a.py", 3))]);

    report(&mut hub, "b1", BackendEvent::ClearWatch { condition: "n ??changed??".to_string() });
    assert!(hub.watchpoints().is_empty());
    assert_eq!(log.take().len(), 1);

    // Already gone: nothing happens.
    report(&mut hub, "b1", BackendEvent::ClearBreak { file: PathBuf::from("a.py"), line: 3 });
    assert!(log.take().is_empty());
}

#[test]
fn test_disconnects_and_last_client_exit() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    debugging(&log, &mut hub);
    attach(&mut hub, "b2");
    drain(&mut events);

    report(&mut hub, "b1", BackendEvent::Disconnected);
    assert_eq!(
        drain(&mut events),
        vec![
            HubEvent::BackendDetached { debugger_id: "b1".to_string() },
            HubEvent::ClientExit {
                debugger_id: "b1".to_string(),
                status: -1,
                message: "connection closed unexpectedly".to_string(),
                unplanned: true,
            },
        ]
    );
    assert_eq!(hub.state(), SessionState::Debugging);

    report(&mut hub, "b2", BackendEvent::Exit { status: 0, message: String::new() });
    report(&mut hub, "b2", BackendEvent::Disconnected);
    let events = drain(&mut events);
    assert!(events.contains(&HubEvent::ClientExit {
        debugger_id: "b2".to_string(),
        status: 0,
        message: String::new(),
        unplanned: false,
    }));
    assert!(events.contains(&HubEvent::LastClientExited));
    assert_eq!(events.last(), Some(&HubEvent::StateChanged { state: SessionState::Idle }));
    assert_eq!(hub.state(), SessionState::Idle);
    assert_eq!(log.shutdowns(), 1);
    assert!(hub.debugger_ids().is_empty());
}

#[test]
fn test_events_from_replaced_interface_are_dropped() {
    debughub_common::logging::ensure_test_logging(None);
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    debugging(&log, &mut hub);
    let stale = hub.interface_generation();

    hub.remote_load(LaunchRequest::new("main.py")).unwrap();
    assert_ne!(hub.interface_generation(), stale);
    assert_eq!(hub.state(), SessionState::Launching);
    drain(&mut events);

    // Still queued from the interface that was just shut down.
    let queued = BackendEvent::DebuggerId { debugger_id: "b2".to_string() };
    hub.handle_interface_event(InterfaceEvent::new("b2", queued).with_generation(stale));
    hub.handle_interface_event(
        InterfaceEvent::new("b1", BackendEvent::Disconnected).with_generation(stale),
    );

    assert_eq!(hub.state(), SessionState::Launching);
    assert!(hub.debugger_ids().is_empty());
    assert!(hub.launch_deadline().is_some());
    assert!(drain(&mut events).is_empty());

    attach(&mut hub, "b3");
    assert_eq!(hub.state(), SessionState::Debugging);
    assert_eq!(hub.debugger_ids(), vec!["b3"]);
}

#[test]
fn test_auto_relaunch_after_last_exit() {
    let log = CommandLog::default();
    let mut config = HubConfig::default();
    config.auto_relaunch = true;
    let (mut hub, _events) = hub_with_config(&log, config);
    debugging(&log, &mut hub);

    report(&mut hub, "b1", BackendEvent::Disconnected);
    assert_eq!(log.starts(), 2);
    assert_eq!(hub.state(), SessionState::Launching);
}

#[test]
fn test_syntax_error_in_main_script_ends_session() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    debugging(&log, &mut hub);
    drain(&mut events);

    report(
        &mut hub,
        "b1",
        BackendEvent::SyntaxError {
            message: "invalid syntax".to_string(),
            file: PathBuf::from("other.py"),
            line: 1,
            column: 4,
        },
    );
    assert_eq!(hub.state(), SessionState::Debugging);

    report(
        &mut hub,
        "b1",
        BackendEvent::SyntaxError {
            message: "invalid syntax".to_string(),
            file: PathBuf::from("main.py"),
            line: 2,
            column: 0,
        },
    );
    assert_eq!(hub.state(), SessionState::Idle);
    let events = drain(&mut events);
    assert!(events.contains(&HubEvent::StateChanged { state: SessionState::Terminating }));
    assert!(events.contains(&HubEvent::BackendDetached { debugger_id: "b1".to_string() }));
}

#[test]
fn test_stop_tears_everything_down() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    debugging(&log, &mut hub);
    drain(&mut events);

    hub.stop();
    assert_eq!(hub.state(), SessionState::Idle);
    assert_eq!(log.shutdowns(), 1);
    assert_eq!(
        drain(&mut events),
        vec![
            HubEvent::StateChanged { state: SessionState::Terminating },
            HubEvent::BackendDetached { debugger_id: "b1".to_string() },
            HubEvent::StateChanged { state: SessionState::Idle },
        ]
    );

    // Idle without interface: a second stop is silent.
    hub.stop();
    assert!(drain(&mut events).is_empty());
    assert!(matches!(hub.remote_step(""), Err(HubError::NoInterface)));
}

#[test]
fn test_events_are_tagged_with_backend_id() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    debugging(&log, &mut hub);
    drain(&mut events);

    report(&mut hub, "b1", BackendEvent::Line { file: PathBuf::from("main.py"), line: 4 });
    report(
        &mut hub,
        "b1",
        BackendEvent::Capabilities {
            capabilities: Capabilities::DEBUGGER,
            language: "Python3".to_string(),
        },
    );
    assert_eq!(hub.session("b1").unwrap().capabilities, Capabilities::DEBUGGER);
    assert_eq!(
        drain(&mut events),
        vec![
            HubEvent::ClientLine {
                debugger_id: "b1".to_string(),
                file: PathBuf::from("main.py"),
                line: 4
            },
            HubEvent::ClientCapabilities {
                debugger_id: "b1".to_string(),
                capabilities: Capabilities::DEBUGGER,
                language: "Python3".to_string(),
            },
        ]
    );
}

#[test]
fn test_admission_allow_list() {
    let log = CommandLog::default();
    let (mut hub, mut events) = hub(&log);
    let remote = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));

    assert_eq!(hub.admit(IpAddr::V4(Ipv4Addr::LOCALHOST)), Admission::Allowed);
    assert_eq!(hub.admit(IpAddr::V6(Ipv6Addr::LOCALHOST)), Admission::Allowed);
    assert_eq!(
        hub.admit(IpAddr::V6(Ipv4Addr::LOCALHOST.to_ipv6_mapped())),
        Admission::Allowed
    );

    let Admission::Pending(ticket) = hub.admit(remote) else { panic!("expected a ticket") };
    assert_eq!(drain(&mut events), vec![HubEvent::ConnectionRequest { ticket, peer: remote }]);

    assert_eq!(hub.resolve_admission(ticket, true), Some(remote));
    assert!(hub.is_allowed(remote));
    assert_eq!(hub.admit(remote), Admission::Allowed);

    let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6));
    let Admission::Pending(ticket) = hub.admit(other) else { panic!("expected a ticket") };
    drain(&mut events);
    assert_eq!(hub.resolve_admission(ticket, false), Some(other));
    assert_eq!(drain(&mut events), vec![HubEvent::ConnectionRejected { ticket, peer: other }]);
    assert!(!hub.is_allowed(other));

    assert_eq!(hub.resolve_admission(ticket, true), None);
    assert!(matches!(
        hub.handle_request(HubRequest::ResolveConnection { ticket: 99, accept: true }),
        Err(HubError::UnknownTicket(99))
    ));
}

#[test]
fn test_requests_drive_the_stores() {
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);

    hub.handle_request(HubRequest::AddBreakpoint { breakpoint: Breakpoint::new("a.py", 1) })
        .unwrap();
    hub.handle_request(HubRequest::AddBreakpoint { breakpoint: Breakpoint::new("a.py", 2) })
        .unwrap();
    hub.handle_request(HubRequest::IgnoreBreakpoint { position: 1, count: 4 }).unwrap();
    hub.handle_request(HubRequest::SetBreakpointTemporary { position: 1, temporary: true })
        .unwrap();
    hub.handle_request(HubRequest::SetBreakpointCondition {
        position: 0,
        condition: "x".to_string(),
    })
    .unwrap();
    // Out of range edits are ignored.
    hub.handle_request(HubRequest::EnableBreakpoint { position: 9, enabled: false }).unwrap();

    let all = hub.breakpoints().get_all();
    assert_eq!(all[0].condition.as_deref(), Some("x"));
    assert_eq!(all[1].ignore_count, 4);
    assert!(all[1].temporary);
    assert!(!all[0].temporary);

    hub.handle_request(HubRequest::DeleteBreakpoints { positions: vec![0, 1] }).unwrap();
    assert!(hub.breakpoints().is_empty());

    hub.handle_request(HubRequest::AddWatchpoint { watchpoint: Watchpoint::new("w") }).unwrap();
    hub.handle_request(HubRequest::ClearWatchpoints).unwrap();
    assert!(hub.watchpoints().is_empty());

    assert!(matches!(
        hub.handle_request(HubRequest::Step { debugger_id: String::new() }),
        Err(HubError::NoInterface)
    ));
}

#[test]
fn test_environment_and_no_debug_requests_reach_backends() {
    debughub_common::logging::ensure_test_logging(None);
    let log = CommandLog::default();
    let (mut hub, _events) = hub(&log);
    debugging(&log, &mut hub);

    let vars = BTreeMap::from([("LANG".to_string(), "C".to_string())]);
    hub.handle_request(HubRequest::Environment {
        debugger_id: "b1".to_string(),
        vars: vars.clone(),
    })
    .unwrap();
    let patterns = vec!["make".to_string()];
    hub.handle_request(HubRequest::NoDebugList {
        debugger_id: String::new(),
        patterns: patterns.clone(),
    })
    .unwrap();
    assert_eq!(
        log.take(),
        vec![
            to("b1", RemoteCommand::Environment { vars }),
            broadcast(RemoteCommand::NoDebugList { patterns }),
        ]
    );

    assert!(matches!(
        hub.handle_request(HubRequest::Environment {
            debugger_id: "ghost".to_string(),
            vars: BTreeMap::new(),
        }),
        Err(HubError::UnknownBackend(id)) if id == "ghost"
    ));
    assert!(log.take().is_empty());
}

#[tokio::test]
async fn test_passive_connection_starts_debugging() {
    let log = CommandLog::default();
    let (mut hub, mut events) = DebugServer::builder()
        .registry(python_registry(recording_factory(log.clone())))
        .passive(true)
        .build();
    hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 10)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _client = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (stream, peer) = listener.accept().await.unwrap();

    hub.accept_connection(BackendConnection { stream, peer });
    assert_eq!(log.connections(), 1);
    assert_eq!(hub.language(), Some("Python3"));
    assert_eq!(hub.state(), SessionState::Idle);

    attach(&mut hub, "p1");
    assert_eq!(hub.state(), SessionState::Debugging);
    assert_eq!(log.take(), vec![to("p1", set_bp("a.py", 10))]);

    report(
        &mut hub,
        "p1",
        BackendEvent::PassiveStartup { file: PathBuf::from("app.py"), exceptions: true },
    );
    assert!(drain(&mut events).contains(&HubEvent::PassiveDebugStarted {
        debugger_id: "p1".to_string(),
        file: PathBuf::from("app.py"),
        exceptions: true,
    }));

    // The passive interface outlives its last backend.
    report(&mut hub, "p1", BackendEvent::Disconnected);
    assert_eq!(hub.state(), SessionState::Idle);
    assert_eq!(log.shutdowns(), 0);
    attach(&mut hub, "p2");
    assert_eq!(hub.state(), SessionState::Debugging);
}

#[tokio::test]
async fn test_passive_sessions_report_condition_errors_again() {
    debughub_common::logging::ensure_test_logging(None);
    let log = CommandLog::default();
    let (mut hub, mut events) = DebugServer::builder()
        .registry(python_registry(recording_factory(log.clone())))
        .passive(true)
        .build();
    hub.edit_breakpoints(|store| store.add(Breakpoint::new("a.py", 7).with_condition("x +")));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let _client = tokio::net::TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
    let (stream, peer) = listener.accept().await.unwrap();
    hub.accept_connection(BackendConnection { stream, peer });

    let error = || BackendEvent::BreakConditionError { file: PathBuf::from("a.py"), line: 7 };
    let reported = |events: &[HubEvent]| {
        events.iter().filter(|event| matches!(event, HubEvent::BreakConditionError { .. })).count()
    };

    for debugger_id in ["p1", "p2"] {
        attach(&mut hub, debugger_id);
        assert_eq!(hub.state(), SessionState::Debugging);
        report(&mut hub, debugger_id, error());
        report(&mut hub, debugger_id, error());
        assert_eq!(reported(&drain(&mut events)), 1, "{debugger_id}");

        report(&mut hub, debugger_id, BackendEvent::Disconnected);
        assert_eq!(hub.state(), SessionState::Idle);
        assert!(drain(&mut events).contains(&HubEvent::LastClientExited));
    }
    assert_eq!(log.shutdowns(), 0);
    assert_eq!(log.connections(), 1);
}
