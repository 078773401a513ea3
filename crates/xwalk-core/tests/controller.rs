//! End-to-end tests of the controller service without a bus.
//!
//! Payloads are built with the wire types and fed in as bytes, exactly as
//! the bus loop would deliver them.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::HashMap;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use xwalk_core::{ControlSink, Controller, ControllerService, FireOutcome};
use xwalk_library::{AnimationLibrary, AssetError, AudioAssets, config};
use xwalk_types::{
    ApiRequest, ApiResponse, ButtonPress, ControllerState, Heartbeat, Message, Reset, TimerExpired,
};

struct FixedAssets(HashMap<String, f64>);

impl AudioAssets for FixedAssets {
    fn duration(&self, name: &str) -> Result<f64, AssetError> {
        self.0.get(name).copied().ok_or_else(|| AssetError {
            name: name.to_owned(),
            dir: "memory".to_owned(),
            tried: "none".to_owned(),
        })
    }
}

const CATALOGUE: &str = r#"
intros: [wait]
outros: [stop]
walks:
  walk:
    category: standard
  walk-slow:
    category: standard
  walk-danish:
    category: language
  walk-german:
    category: language
  walk-cat:
    category: cat
weights:
  default:
    standard: 2
    language: 1
    cat: 1
"#;

fn all_audio() -> FixedAssets {
    let names = [
        "wait", "stop", "wait-slow", "wait-danish", "wait-german", "wait-cat", "walk",
        "walk-slow", "walk-danish", "walk-german", "walk-cat",
    ];
    FixedAssets(names.iter().map(|n| ((*n).to_owned(), 2.0)).collect())
}

fn service_with(assets: FixedAssets) -> ControllerService {
    let config = config::parse(CATALOGUE).unwrap();
    let library =
        AnimationLibrary::with_rng(config, Box::new(assets), StdRng::seed_from_u64(99)).unwrap();
    ControllerService::new(Controller::new(library))
}

fn service() -> ControllerService {
    service_with(all_audio())
}

fn api(service: &mut ControllerService, request: &ApiRequest) -> ApiResponse {
    service.handle_api_request(&request.to_json().unwrap())
}

fn heartbeat(component: &str, initial: bool) -> Vec<u8> {
    Message::Heartbeat(Heartbeat {
        host: "pi-1".to_owned(),
        component: component.to_owned(),
        sent_at: Utc::now(),
        initial,
    })
    .to_json()
    .unwrap()
}

fn button_press() -> Vec<u8> {
    Message::ButtonPress(ButtonPress {
        host: "pi-1".to_owned(),
        component: "button_switch".to_owned(),
        press_duration: 120,
        sent_at: Utc::now(),
    })
    .to_json()
    .unwrap()
}

#[test]
fn status_before_any_press_is_ready() {
    let mut service = service();
    let response = api(&mut service, &ApiRequest::Status);
    assert!(response.success);
    assert_eq!(response.state, ControllerState::Ready);
    assert!(!response.playing);
    assert!(response.walk_queue.is_empty());
    assert!(response.walk_history.is_empty());
    assert_eq!(response.animations.unwrap().walks.len(), 5);
    assert!(response.active_menu.is_none());
}

#[test]
fn walk_history_keeps_every_play() {
    let mut service = service();
    for _ in 0..150 {
        assert!(api(&mut service, &ApiRequest::PressButton).success);
        assert!(api(&mut service, &ApiRequest::TimerExpired).success);
    }
    let plays = service
        .take_outbox()
        .iter()
        .filter(|m| matches!(m, Message::PlayScene(_)))
        .count();
    assert_eq!(plays, 150);

    let response = api(&mut service, &ApiRequest::Status);
    assert_eq!(response.walk_history.len(), 150);
    assert!(
        response
            .walk_history
            .windows(2)
            .all(|pair| pair[0].played_at <= pair[1].played_at)
    );
}

#[test]
fn press_then_timer_emits_play_then_end() {
    let mut service = service();

    let pressed = api(&mut service, &ApiRequest::PressButton);
    assert!(pressed.success);
    assert!(pressed.playing);
    assert_eq!(pressed.state, ControllerState::Walk);
    assert_eq!(pressed.walk_history.len(), 1);

    let expired = api(&mut service, &ApiRequest::TimerExpired);
    assert!(expired.success);
    assert!(!expired.playing);
    assert_eq!(expired.state, ControllerState::Ready);

    let outbox = service.take_outbox();
    assert_eq!(outbox.len(), 2);
    let Message::PlayScene(scene) = &outbox[0] else {
        panic!("expected play_scene first, got {:?}", outbox[0]);
    };
    assert!((scene.total_duration - 6.0).abs() < 1e-9);
    let expected_intro = scene
        .walk
        .strip_prefix("walk-")
        .map_or_else(|| "wait".to_owned(), |suffix| format!("wait-{suffix}"));
    assert_eq!(scene.intro, expected_intro);
    assert!(matches!(outbox[1], Message::EndScene(_)));
    assert!(service.take_outbox().is_empty());
}

#[test]
fn second_press_while_walking_is_ignored() {
    let mut service = service();
    api(&mut service, &ApiRequest::PressButton);
    service.take_outbox();

    let again = api(&mut service, &ApiRequest::PressButton);
    assert!(again.success);
    assert!(again.message.contains("ignored"));
    assert_eq!(again.state, ControllerState::Walk);
    assert_eq!(again.walk_history.len(), 1);
    assert!(service.take_outbox().is_empty());
}

#[test]
fn timer_while_ready_is_ignored() {
    let mut service = service();
    let response = api(&mut service, &ApiRequest::TimerExpired);
    assert!(response.success);
    assert!(response.message.contains("ignored"));
    assert!(service.take_outbox().is_empty());
}

#[test]
fn queue_all_walks() {
    let mut service = service();
    let response = api(
        &mut service,
        &ApiRequest::QueueWalk {
            walk: "_".to_owned(),
        },
    );
    assert!(response.success);
    assert_eq!(response.message, "Queued 5 walks");
    assert_eq!(
        response.walk_queue,
        vec!["walk", "walk-cat", "walk-danish", "walk-german", "walk-slow"]
    );
}

#[test]
fn queue_unknown_walk_fails_without_change() {
    let mut service = service();
    api(
        &mut service,
        &ApiRequest::QueueWalk {
            walk: "walk-cat".to_owned(),
        },
    );
    let response = api(
        &mut service,
        &ApiRequest::QueueWalk {
            walk: "walk-moon".to_owned(),
        },
    );
    assert!(!response.success);
    assert!(response.message.contains("walk-moon"));
    assert_eq!(response.walk_queue, vec!["walk-cat"]);
}

#[test]
fn queue_clear_reports_removed_count() {
    let mut service = service();
    api(
        &mut service,
        &ApiRequest::QueueWalk {
            walk: "_".to_owned(),
        },
    );
    let response = api(&mut service, &ApiRequest::QueueClear);
    assert!(response.success);
    assert_eq!(response.message, "Cleared 5 queued walks");
    assert!(response.walk_queue.is_empty());
}

#[test]
fn queued_walk_plays_next_and_is_consumed() {
    let mut service = service();
    for walk in ["walk-danish", "walk-cat"] {
        api(
            &mut service,
            &ApiRequest::QueueWalk {
                walk: walk.to_owned(),
            },
        );
    }
    let response = api(&mut service, &ApiRequest::PressButton);
    assert_eq!(response.walk_queue, vec!["walk-cat"]);
    assert_eq!(response.walk_history[0].walk, "walk-danish");

    let outbox = service.take_outbox();
    let Message::PlayScene(scene) = &outbox[0] else {
        panic!("expected play_scene, got {outbox:?}");
    };
    assert_eq!(scene.walk, "walk-danish");
    assert_eq!(scene.intro, "wait-danish");
    assert_eq!(scene.outro, "stop");
}

#[test]
fn failed_selection_leaves_state_untouched() {
    let mut assets = all_audio();
    assets.0.remove("walk-cat");
    let mut service = service_with(assets);
    api(
        &mut service,
        &ApiRequest::QueueWalk {
            walk: "walk-cat".to_owned(),
        },
    );

    let response = api(&mut service, &ApiRequest::PressButton);
    assert!(!response.success);
    assert!(response.message.contains("walk-cat"));
    assert_eq!(response.state, ControllerState::Ready);
    assert!(!response.playing);
    assert_eq!(response.walk_queue, vec!["walk-cat"]);
    assert!(response.walk_history.is_empty());
    assert!(service.take_outbox().is_empty());
}

#[test]
fn malformed_api_request_still_gets_a_reply() {
    let mut service = service();
    let response = service.handle_api_request(br#"{"type":"launch_rocket"}"#);
    assert!(!response.success);
    assert_eq!(response.state, ControllerState::Ready);

    let response = service.handle_api_request(b"not json");
    assert!(!response.success);
}

#[test]
fn new_and_restarted_components_get_current_state() {
    let mut service = service();

    assert!(service.handle_heartbeat(&heartbeat("button_light", false)));
    assert!(!service.handle_heartbeat(&heartbeat("button_light", false)));
    assert!(service.handle_heartbeat(&heartbeat("button_light", true)));
    assert!(service.handle_heartbeat(&heartbeat("matrix", false)));

    let outbox = service.take_outbox();
    assert_eq!(outbox.len(), 3);
    assert!(outbox.iter().all(|m| matches!(
        m,
        Message::CurrentState(current) if current.state == ControllerState::Ready
    )));
    assert_eq!(service.components().len(), 2);
    assert!(service.components().contains_key("button_light@pi-1"));
}

#[test]
fn malformed_heartbeat_is_dropped() {
    let mut service = service();
    assert!(!service.handle_heartbeat(b"{\"type\":\"heartbeat\"}"));
    assert!(!service.handle_heartbeat(&button_press()));
    assert!(service.components().is_empty());
    assert!(service.take_outbox().is_empty());
}

#[test]
fn interactions_drive_the_state_machine() {
    let mut service = service();

    service.handle_interaction(b"garbage");
    assert!(!service.playing());

    service.handle_interaction(&button_press());
    assert!(service.playing());

    let expired = Message::TimerExpired(TimerExpired {
        timer_id: "scene_timer_1".to_owned(),
        duration: 6.0,
    });
    service.handle_interaction(&expired.to_json().unwrap());
    assert!(!service.playing());

    service.handle_interaction(&button_press());
    service.handle_interaction(&Message::Reset(Reset {}).to_json().unwrap());
    assert_eq!(service.controller().state(), ControllerState::Ready);

    let kinds: Vec<&str> = service.take_outbox().iter().map(Message::kind).collect();
    assert_eq!(kinds, vec!["play_scene", "end_scene", "play_scene", "end_scene"]);
}

#[test]
fn reset_from_ready_still_ends_the_scene() {
    let config = config::parse(CATALOGUE).unwrap();
    let library =
        AnimationLibrary::with_rng(config, Box::new(all_audio()), StdRng::seed_from_u64(1)).unwrap();
    let mut controller = Controller::new(library);

    struct Recorder(Vec<&'static str>);
    impl ControlSink for Recorder {
        fn emit(&mut self, message: Message) {
            self.0.push(message.kind());
        }
    }

    let mut sink = Recorder(Vec::new());
    let outcome = controller.reset(&mut sink).unwrap();
    assert_eq!(
        outcome,
        FireOutcome::Transitioned {
            from: ControllerState::Ready,
            to: ControllerState::Ready,
        }
    );
    assert_eq!(sink.0, vec!["end_scene"]);
}

#[test]
fn failed_scene_does_not_start_cooldown() {
    let yaml = format!("{CATALOGUE}reselection:\n  walk_cooldown: 3\n");
    let config = config::parse(&yaml).unwrap();
    let assets = FixedAssets(HashMap::from([("stop".to_owned(), 1.0)]));
    let library =
        AnimationLibrary::with_rng(config, Box::new(assets), StdRng::seed_from_u64(5)).unwrap();
    let mut service = ControllerService::new(Controller::new(library));

    let response = api(&mut service, &ApiRequest::PressButton);
    assert!(!response.success);
    assert_eq!(response.state, ControllerState::Ready);
    assert!(service.controller().library().walk_history().is_empty());
}
