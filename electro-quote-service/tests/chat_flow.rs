mod common;

use common::{RecordingMailer, orchestrator};
use dialog_flow::{
    Answer, Answers, CONTACT_FORM_MARKER, Calculator, DialogEngine, Session, Stage,
};
use electro_quote_service::calculators::{
    ALL_CALCULATORS, DesignCalculator, IndustrialCalculator, PanelCalculator, SocketCalculator,
    build_registry, panel, socket,
};
use electro_quote_service::dispatcher::{Dispatcher, GENERAL, MULTI};
use regex::Regex;
use std::sync::Arc;

fn answers(pairs: &[(&str, Answer)]) -> Answers {
    pairs
        .iter()
        .map(|(key, answer)| (key.to_string(), answer.clone()))
        .collect()
}

fn quoted_total(reply: &str) -> i64 {
    let total = Regex::new(r"Общая стоимость монтажа: (\d+) руб\.").unwrap();
    total.captures(reply).unwrap()[1].parse().unwrap()
}

#[tokio::test]
async fn socket_quote_end_to_end() {
    let mailer = Arc::new(RecordingMailer::default());
    let chat = orchestrator(mailer.clone());

    let first = chat.handle_turn("s1", "нужны розетки").await;
    assert!(first.starts_with("Выберите тип объекта:"));

    let second = chat.handle_turn("s1", "1").await;
    assert!(second.starts_with("Выберите материал стен:"));

    let mut reply = String::new();
    for answer in ["2", "5", "0", "0", "2", "0", "0", "2"] {
        reply = chat.handle_turn("s1", answer).await;
    }
    assert!(quoted_total(&reply) >= socket::MIN_PRICE);
    assert!(reply.ends_with(CONTACT_FORM_MARKER));

    let session = chat
        .dispatcher()
        .runner()
        .active_session("s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.stage, Stage::AwaitingContact);

    let thanks = chat.handle_turn("s1", "Иван, +7 922 825 8279").await;
    assert!(thanks.contains("+7 922 825 8279"));
    assert!(chat.dispatcher().runner().active_session("s1").await.unwrap().is_none());
    assert!(chat.history().get_all_messages("s1").await.is_empty());

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name.as_deref(), Some("Иван"));
    let calculation = sent[0].calculation.as_ref().unwrap();
    assert_eq!(calculation.total_price(), quoted_total(&reply));
}

#[tokio::test]
async fn contact_stage_asks_for_phone() {
    let mailer = Arc::new(RecordingMailer::default());
    let chat = orchestrator(mailer.clone());

    chat.handle_turn("s1", "нужны розетки").await;
    for answer in ["1", "2", "5", "0", "0", "2", "0", "0", "2"] {
        chat.handle_turn("s1", answer).await;
    }

    let reply = chat.handle_turn("s1", "Иван").await;
    assert!(reply.contains("укажите номер телефона"));
    assert!(chat.dispatcher().runner().active_session("s1").await.unwrap().is_some());
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn service_questions_do_not_start_calculator() {
    let chat = orchestrator(Arc::new(RecordingMailer::default()));

    let reply = chat.handle_turn("s1", "какие услуги вы предоставляете").await;
    assert!(!reply.is_empty());
    assert!(chat.dispatcher().runner().active_session("s1").await.unwrap().is_none());
}

#[tokio::test]
async fn bad_answer_repeats_step() {
    let chat = orchestrator(Arc::new(RecordingMailer::default()));

    chat.handle_turn("s1", "нужны розетки").await;
    let reply = chat.handle_turn("s1", "не знаю").await;
    assert!(reply.contains("Выберите тип объекта:"));

    let session = chat.dispatcher().runner().active_session("s1").await.unwrap().unwrap();
    assert_eq!(session.current_step(), Some("property_type"));
}

#[tokio::test]
async fn sessions_do_not_share_dialogs() {
    let chat = orchestrator(Arc::new(RecordingMailer::default()));

    chat.handle_turn("a", "нужны розетки").await;
    chat.handle_turn("b", "нужен щит").await;
    chat.handle_turn("a", "1").await;

    let runner = chat.dispatcher().runner();
    let a = runner.active_session("a").await.unwrap().unwrap();
    let b = runner.active_session("b").await.unwrap().unwrap();
    assert_eq!(a.calculator_id, "socket");
    assert_eq!(a.current_step(), Some("wall_material"));
    assert_eq!(b.calculator_id, "panel");
    assert_eq!(b.current_step(), Some("property_type"));
}

#[test]
fn classification_follows_keyword_domains() {
    assert_eq!(Dispatcher::classify("Хочу повесить светильники"), "lighting");
    assert_eq!(Dispatcher::classify("Светильники и новый щит"), MULTI);
    assert_eq!(Dispatcher::classify("Добрый день"), GENERAL);
}

#[test]
fn zero_means_no_extras_on_every_multi_select() {
    let calculators: Vec<(Box<dyn Calculator>, &str)> = vec![
        (Box::new(SocketCalculator) as Box<dyn Calculator>, "other_devices"),
        (Box::new(PanelCalculator) as Box<dyn Calculator>, "other_devices"),
        (Box::new(IndustrialCalculator) as Box<dyn Calculator>, "equipment"),
        (Box::new(DesignCalculator) as Box<dyn Calculator>, "additional_features"),
    ];
    for (calculator, key) in calculators {
        let step = calculator
            .steps()
            .iter()
            .find(|step| step.key == key)
            .unwrap();
        assert_eq!(
            calculator.parse(step, "0").unwrap(),
            Answer::Selection(Vec::new()),
            "{} {}",
            calculator.id(),
            key
        );
    }
}

#[test]
fn totals_never_fall_below_minimum_order() {
    let empty_sockets = answers(&[
        ("property_type", Answer::choice("apartment")),
        ("wall_material", Answer::choice("drywall")),
        ("complexity", Answer::choice("easy")),
    ]);
    let calculation = SocketCalculator.calculate(&empty_sockets).unwrap();
    assert_eq!(calculation.total_price(), socket::MIN_PRICE);

    let bare_panel = answers(&[
        ("property_type", Answer::choice("apartment")),
        ("wall_material", Answer::choice("drywall")),
        ("panel_type", Answer::choice("apartment")),
        ("complexity", Answer::choice("easy")),
    ]);
    let calculation = PanelCalculator.calculate(&bare_panel).unwrap();
    assert_eq!(calculation.total_price(), panel::MIN_PRICE);
}

fn selection(codes: &[&str]) -> Answer {
    Answer::Selection(codes.iter().map(|code| code.to_string()).collect())
}

/// A complete answer set per calculator type.
fn complete_answers() -> Vec<(&'static str, Answers)> {
    vec![
        (
            "socket",
            answers(&[
                ("property_type", Answer::choice("house")),
                ("wall_material", Answer::choice("concrete")),
                ("socket_singles", Answer::Count(12)),
                ("socket_doubles", Answer::Count(4)),
                ("socket_power", Answer::Count(1)),
                ("switch_singles", Answer::Count(6)),
                ("switch_doubles", Answer::Count(2)),
                ("other_devices", selection(&["usb_socket"])),
                ("complexity", Answer::choice("complex")),
            ]),
        ),
        (
            "lighting",
            answers(&[
                ("property_type", Answer::choice("apartment")),
                ("wall_material", Answer::choice("brick")),
                ("ceiling_height", Answer::Measure(2.9)),
                ("ceiling_type", Answer::choice("stretch")),
                ("light_fixtures", Answer::Count(14)),
                ("chandelier", Answer::Count(2)),
                ("spot_lights", Answer::Count(10)),
                ("wall_lights", Answer::Count(2)),
                ("complexity", Answer::choice("very_complex")),
            ]),
        ),
        (
            "panel",
            answers(&[
                ("property_type", Answer::choice("house")),
                ("wall_material", Answer::choice("wood")),
                ("panel_type", Answer::choice("house")),
                ("circuit_breakers", Answer::Count(18)),
                ("rcd_count", Answer::Count(2)),
                ("diff_auto_count", Answer::Count(3)),
                ("meter_installation", Answer::Flag(true)),
                ("other_devices", selection(&["voltage_relay", "timer"])),
                ("complexity", Answer::choice("standard")),
            ]),
        ),
        (
            "cabling",
            answers(&[
                ("property_type", Answer::choice("office")),
                ("area", Answer::Measure(80.0)),
                ("wall_material", Answer::choice("block")),
                ("cabling_type", Answer::choice("hidden")),
                ("cable_length", Answer::Measure(150.0)),
                ("cable_section", Answer::Measure(4.0)),
                ("complexity", Answer::choice("complex")),
            ]),
        ),
        (
            "industrial",
            answers(&[
                ("industrial_type", Answer::choice("workshop")),
                ("area", Answer::Measure(300.0)),
                ("power", Answer::choice("50_to_150")),
                ("equipment", selection(&["grounding", "ups"])),
                ("complexity", Answer::choice("complex")),
                ("power_cable_length", Answer::Measure(40.0)),
            ]),
        ),
        (
            "design",
            answers(&[
                ("property_type", Answer::choice("apartment")),
                ("area", Answer::Measure(72.5)),
                ("design_complexity", Answer::choice("complex")),
                ("has_project", Answer::Flag(false)),
                ("implementation_complexity", Answer::choice("standard")),
                ("additional_features", selection(&["smart_home_basic"])),
            ]),
        ),
        (
            "multi",
            answers(&[
                ("property_type", Answer::choice("house")),
                ("area", Answer::Measure(120.0)),
                ("is_new_construction", Answer::Flag(true)),
                ("has_panel", Answer::Flag(false)),
                ("has_cabling", Answer::Flag(false)),
                ("select_services", selection(&["socket", "lighting"])),
                ("lighting_count", Answer::Blank),
                ("panel_breakers", Answer::Count(16)),
                ("socket_points", Answer::Count(30)),
                ("cabling_length", Answer::Measure(250.0)),
            ]),
        ),
    ]
}

#[test]
fn every_calculation_is_pure_and_formatting_idempotent() {
    let enabled: Vec<String> = ALL_CALCULATORS.iter().map(|tag| tag.to_string()).collect();
    let registry = build_registry(&enabled);

    let cases = complete_answers();
    let covered: Vec<&str> = cases.iter().map(|(tag, _)| *tag).collect();
    assert_eq!(covered, ALL_CALCULATORS);

    for (tag, filled) in cases {
        let calculator = registry.get(tag).unwrap();
        let first = calculator.calculate(&filled).unwrap();
        let second = calculator.calculate(&filled).unwrap();
        assert_eq!(first, second, "{tag}");
        assert!(first.total_price() > 0, "{tag}");
        assert_eq!(
            calculator.format(&first).unwrap(),
            calculator.format(&second).unwrap(),
            "{tag}"
        );

        let mut session = Session::new_for_calculator("s1", tag);
        session.answers = filled.clone();
        let once = DialogEngine::complete(calculator.as_ref(), &mut session);
        let twice = DialogEngine::complete(calculator.as_ref(), &mut session);
        assert_eq!(once.response, twice.response, "{tag}");
        assert!(once.response.ends_with(CONTACT_FORM_MARKER), "{tag}");
        assert_eq!(session.answers, filled, "{tag}");
    }
}
