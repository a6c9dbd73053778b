//! Whole-agent runs over in-memory streams: JSON lines in, JSON lines out.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use futures_lite::future::{block_on, zip};
use serde_json::Value;

use cheesecave::adapters::hardware::{PinActuator, SimulatedCave};
use cheesecave::app::commands::{CommandHandler, CommandRequest, SET_FAN_STATE};
use cheesecave::app::fan::{FanController, FanState};
use cheesecave::app::ports::ReportChannel;
use cheesecave::app::telemetry::{Reading, Snapshot, TelemetryLoop};
use cheesecave::rpc::channels::{CMD_DEPTH, CommandMsg, Link, OUT_DEPTH, Outbound};
use cheesecave::rpc::engine::RpcEngine;
use cheesecave::rpc::io_task::{command_loop, read_loop, run_io_loop};

const DEVICE: &str = "cave-01";

struct Run {
    lines: Vec<Value>,
    cave: SimulatedCave,
    final_state: FanState,
}

impl Run {
    fn responses(&self) -> Vec<&Value> {
        self.lines.iter().filter(|l| l["type"] == "response").collect()
    }

    fn reports(&self) -> Vec<&Value> {
        self.lines.iter().filter(|l| l["type"] == "reported").collect()
    }

    fn response(&self, id: u64) -> &Value {
        self.responses()
            .into_iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response for id {id}"))
    }
}

/// Feed `input` through the reader, then run the agent until the input's
/// end-of-stream shutdown has drained every task.
fn run_agent(input: &str) -> Run {
    let link = Link::new();
    read_loop(Cursor::new(input.as_bytes().to_vec()), &link);

    let cave = SimulatedCave::new(50.0, 85.0);
    let fan = Arc::new(FanController::new(PinActuator::new(cave.fan_pin(), 21)));
    fan.sync_output().unwrap();
    let engine = RpcEngine::new(CommandHandler::new(Arc::clone(&fan)));
    let telemetry = TelemetryLoop::new(cave.sensor(), link.reporter(), Arc::clone(&fan));

    let mut out = Vec::new();
    run_io_loop(&link, telemetry, Duration::from_millis(10), engine, &mut out, DEVICE);

    let lines = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    Run {
        lines,
        cave,
        final_state: fan.current(),
    }
}

#[test]
fn commands_get_responses_with_matching_ids() {
    let run = run_agent(concat!(
        r#"{"id":1,"method":"SetFanState","payload":"on"}"#,
        "\n",
        r#"{"id":2,"method":"SetFanState","payload":"sideways"}"#,
        "\n",
        r#"{"id":3,"method":"Reboot"}"#,
        "\n",
    ));

    assert_eq!(run.responses().len(), 3);

    let ok = run.response(1);
    assert_eq!(ok["status"], 200);
    assert_eq!(ok["payload"]["result"], "Executed direct method: SetFanState");

    let bad = run.response(2);
    assert_eq!(bad["status"], 400);
    assert_eq!(bad["payload"]["result"], "Invalid parameter");

    let unknown = run.response(3);
    assert_eq!(unknown["status"], 501);
    assert_eq!(unknown["payload"]["result"], "Method not implemented: Reboot");

    assert_eq!(run.final_state, FanState::On);
    assert!(run.cave.fan_on());
}

#[test]
fn report_carries_device_and_snapshot() {
    let run = run_agent("");

    let reports = run.reports();
    assert_eq!(reports.len(), 1, "one immediate cycle before shutdown");
    let report = reports[0];
    assert_eq!(report["device"], DEVICE);
    assert_eq!(report["properties"]["fanstate"], "off");
    assert!(report["properties"]["temperature"].is_f64());
    assert!(report["properties"]["humidity"].is_f64());
    assert!(run.responses().is_empty());
}

#[test]
fn malformed_lines_are_dropped_without_a_response() {
    let run = run_agent(concat!(
        "not json\n",
        "\r\n",
        r#"{"method":"SetFanState","payload":"on"}"#,
        "\n",
        r#"{"id":7,"method":"SetFanState","payload":"off"}"#,
        "\r\n",
    ));

    let responses = run.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 7);
    assert_eq!(responses[0]["status"], 200);
    assert_eq!(run.final_state, FanState::Off);
}

#[test]
fn oversized_line_does_not_poison_the_stream() {
    let huge = format!(
        r#"{{"id":1,"method":"SetFanState","payload":"{}"}}"#,
        "x".repeat(4096)
    );
    let input = format!("{huge}\n{}\n", r#"{"id":2,"method":"SetFanState","payload":"on"}"#);
    let run = run_agent(&input);

    let responses = run.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 2);
    assert_eq!(run.final_state, FanState::On);
}

#[test]
fn failed_fan_is_reported_and_rejects_commands() {
    let link = Link::new();
    read_loop(
        Cursor::new(b"{\"id\":9,\"method\":\"SetFanState\",\"payload\":\"on\"}\n".to_vec()),
        &link,
    );

    let cave = SimulatedCave::default();
    let fan = Arc::new(FanController::new(PinActuator::new(cave.fan_pin(), 21)));
    fan.fail("stalled");
    let engine = RpcEngine::new(CommandHandler::new(Arc::clone(&fan)));
    let telemetry = TelemetryLoop::new(cave.sensor(), link.reporter(), Arc::clone(&fan));

    let mut out = Vec::new();
    let (telemetry_stats, engine_stats) =
        run_io_loop(&link, telemetry, Duration::from_millis(10), engine, &mut out, DEVICE);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(r#""fanstate":"failed""#));
    assert!(text.contains(r#""result":"Fan failed""#));
    assert_eq!(telemetry_stats.published, 1);
    assert_eq!(engine_stats.rejected, 1);
    assert!(!cave.fan_on());
}

#[test]
fn response_waits_for_room_in_full_outbound_channel() {
    let link = Link::new();
    let cave = SimulatedCave::default();
    let fan = Arc::new(FanController::new(PinActuator::new(cave.fan_pin(), 21)));
    let mut engine = RpcEngine::new(CommandHandler::new(Arc::clone(&fan)));

    let snapshot = Snapshot::new(
        FanState::Off,
        &Reading {
            temperature_f: 50.0,
            humidity_pct: 85.0,
        },
    );
    let mut reporter = link.reporter();
    for _ in 0..OUT_DEPTH {
        reporter.publish(&snapshot).unwrap();
    }
    block_on(link.submit(CommandMsg {
        id: 1,
        request: CommandRequest::new(SET_FAN_STATE, "\"on\""),
    }));
    link.stop_commands.signal(());

    let ((), frames) = block_on(zip(command_loop(&link, &mut engine), async {
        let mut frames = Vec::new();
        for _ in 0..=OUT_DEPTH {
            frames.push(link.outbound.receive().await);
        }
        frames
    }));

    assert_eq!(fan.current(), FanState::On);
    assert_eq!(frames.len(), OUT_DEPTH + 1);
    assert!(matches!(
        frames.last(),
        Some(Outbound::Response { id: 1, result }) if result.is_success()
    ));
}

#[test]
fn burst_larger_than_command_channel_is_fully_answered() {
    let total = CMD_DEPTH as u64 + 4;
    let input: String = (1..=total)
        .map(|id| format!("{{\"id\":{id},\"method\":\"SetFanState\",\"payload\":\"on\"}}\n"))
        .collect();

    let link = Link::new();
    let cave = SimulatedCave::default();
    let fan = Arc::new(FanController::new(PinActuator::new(cave.fan_pin(), 21)));
    let engine = RpcEngine::new(CommandHandler::new(Arc::clone(&fan)));
    let telemetry = TelemetryLoop::new(cave.sensor(), link.reporter(), Arc::clone(&fan));

    let mut out = Vec::new();
    let (_, engine_stats) = std::thread::scope(|s| {
        let reader = s.spawn(|| read_loop(Cursor::new(input.into_bytes()), &link));
        let stats = run_io_loop(&link, telemetry, Duration::from_millis(10), engine, &mut out, DEVICE);
        reader.join().unwrap();
        stats
    });

    let ids: Vec<u64> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap())
        .filter(|v| v["type"] == "response")
        .map(|v| v["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (1..=total).collect::<Vec<_>>());
    assert_eq!(engine_stats.handled, total);
}
