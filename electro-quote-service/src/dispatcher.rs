//! Picks the calculator for a free-text request and forwards dialog turns to it.

use dialog_flow::{Answer, Answers, DialogRunner, FlowError, TurnResult, TurnStatus};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, info, warn};

use crate::calculators::ALL_CALCULATORS;

/// Tag returned by [`Dispatcher::classify`] when several domains are mentioned.
pub const MULTI: &str = "multi";
/// Tag returned by [`Dispatcher::classify`] when no domain keyword is present.
pub const GENERAL: &str = "general";

pub const UNKNOWN_SERVICE: &str =
    "Извините, не могу определить тип услуги. Опишите подробнее, что вам нужно?";
pub const CALCULATOR_UNAVAILABLE: &str =
    "Извините, этот калькулятор временно недоступен. Попробуйте позже.";
pub const START_FAILED: &str = "Произошла техническая ошибка. Попробуйте переформулировать ваш \
запрос или обратитесь к специалисту.";
pub const START_OVER: &str = "Произошла ошибка. Пожалуйста, начните расчет заново.";
pub const TURN_FAILED: &str =
    "Произошла ошибка при обработке вашего запроса. Пожалуйста, попробуйте еще раз.";

/// Keyword lists per domain, in tie-break order.
const DOMAINS: &[(&str, &[&str])] = &[
    (
        "socket",
        &["розетк", "выключател", "переключател", "диммер", "usb розетк"],
    ),
    (
        "lighting",
        &["светильник", "свет", "освещени", "лампочк", "люстр", "бра", "спот", "трек"],
    ),
    (
        "panel",
        &["щит", "электрощит", "автомат", "узо", "счетчик", "дифавтомат", "рубильник"],
    ),
    (
        "cabling",
        &["кабель", "проводк", "провод", "штроб", "канал", "гофр", "трасс"],
    ),
];

const PROPERTY_HINTS: &[(&[&str], &str)] = &[
    (&["квартир", "комнат"], "apartment"),
    (&["дом", "коттедж", "частн"], "house"),
    (&["офис", "кабинет"], "office"),
];

const WALL_HINTS: &[(&[&str], &str)] = &[
    (&["кирпич"], "brick"),
    (&["бетон"], "concrete"),
    (&["гипсокартон", "гкл"], "drywall"),
];

static AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:кв\.?\s?м|м2|м²|квадрат)").expect("Invalid regex")
});
static ROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)[\s-]*(?:комнат|комн)").expect("Invalid regex"));

/// What a free-text request already tells us.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDetails {
    pub calculator: &'static str,
    /// Pre-filled answers keyed by step name; steps not named here are asked interactively.
    pub answers: Answers,
}

#[derive(Clone)]
pub struct Dispatcher {
    runner: DialogRunner,
}

impl Dispatcher {
    pub fn new(runner: DialogRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &DialogRunner {
        &self.runner
    }

    /// Domain with the most keyword hits. More than one domain hit gives [`MULTI`], none gives
    /// [`GENERAL`]; equal counts keep the first domain in list order.
    pub fn classify(message: &str) -> &'static str {
        let lowered = message.to_lowercase();
        let counts: Vec<(&'static str, usize)> = DOMAINS
            .iter()
            .map(|(tag, keywords)| {
                let hits = keywords
                    .iter()
                    .map(|keyword| lowered.matches(keyword).count())
                    .sum();
                (*tag, hits)
            })
            .collect();

        let hit_domains = counts.iter().filter(|(_, hits)| *hits > 0).count();
        let tag = match hit_domains {
            0 => GENERAL,
            1 => counts
                .iter()
                .find(|(_, hits)| *hits > 0)
                .map(|(tag, _)| *tag)
                .unwrap_or(GENERAL),
            _ => MULTI,
        };
        info!(counts = ?counts, calculator = %tag, "Classified request");
        tag
    }

    /// Classification plus any object type, area, room count or wall material found in the text.
    pub fn extract_details(message: &str) -> RequestDetails {
        let lowered = message.to_lowercase();
        let mut answers = Answers::new();

        let hint = |table: &[(&[&str], &'static str)]| {
            table
                .iter()
                .find(|(words, _)| words.iter().any(|word| lowered.contains(word)))
                .map(|(_, code)| *code)
        };
        if let Some(property_type) = hint(PROPERTY_HINTS) {
            answers.insert("property_type".to_string(), Answer::choice(property_type));
        }
        if let Some(wall_material) = hint(WALL_HINTS) {
            answers.insert("wall_material".to_string(), Answer::choice(wall_material));
        }

        let area = AREA
            .captures(&lowered)
            .and_then(|caps| caps[1].replace(',', ".").parse::<f64>().ok())
            .filter(|area| *area > 0.0);
        if let Some(area) = area {
            answers.insert("area".to_string(), Answer::Measure(area));
        }
        if let Some(rooms) = ROOMS
            .captures(&lowered)
            .and_then(|caps| caps[1].parse::<u32>().ok())
        {
            answers.insert("rooms".to_string(), Answer::Count(rooms));
        }

        let calculator = Self::classify(message);
        info!(calculator = %calculator, extracted = ?answers, "Extracted request details");
        RequestDetails {
            calculator,
            answers,
        }
    }

    /// Start the calculator tagged `tag` for `session_id` and return its first reply.
    pub async fn route(&self, tag: &str, session_id: &str, initial: Answers) -> TurnResult {
        if !ALL_CALCULATORS.contains(&tag) {
            warn!(session_id = %session_id, calculator = %tag, "No calculator for request type");
            return notice(UNKNOWN_SERVICE);
        }
        match self.runner.start(tag, session_id, initial).await {
            Ok(result) => result,
            Err(FlowError::CalculatorNotFound(_)) => {
                warn!(session_id = %session_id, calculator = %tag, "Calculator is disabled");
                notice(CALCULATOR_UNAVAILABLE)
            }
            Err(e) => {
                error!(
                    session_id = %session_id,
                    calculator = %tag,
                    error = %e,
                    "Failed to start calculator"
                );
                failure(START_FAILED)
            }
        }
    }

    /// Feed `input` to the calculator that owns the active dialog of `session_id`.
    pub async fn continue_dialog(&self, session_id: &str, input: &str) -> TurnResult {
        match self.runner.advance(session_id, input).await {
            Ok(result) => result,
            Err(e @ (FlowError::SessionNotFound(_) | FlowError::CalculatorNotFound(_))) => {
                warn!(session_id = %session_id, error = %e, "Cannot continue dialog");
                if let Err(e) = self.runner.discard(session_id).await {
                    warn!(session_id = %session_id, error = %e, "Failed to discard session");
                }
                notice(START_OVER)
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Dialog turn failed");
                failure(TURN_FAILED)
            }
        }
    }
}

/// Reply when no calculator is running for the request.
fn notice(text: &str) -> TurnResult {
    TurnResult {
        response: text.to_string(),
        status: TurnStatus::Unhandled,
    }
}

fn failure(text: &str) -> TurnResult {
    TurnResult {
        response: text.to_string(),
        status: TurnStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::build_registry;
    use dialog_flow::InMemorySessionStorage;
    use std::sync::Arc;

    fn dispatcher(enabled: &[&str]) -> Dispatcher {
        let enabled: Vec<String> = enabled.iter().map(|s| s.to_string()).collect();
        let runner = DialogRunner::new(
            Arc::new(build_registry(&enabled)),
            Arc::new(InMemorySessionStorage::new()),
        );
        Dispatcher::new(runner)
    }

    #[test]
    fn single_domain_wins() {
        assert_eq!(Dispatcher::classify("Нужны розетки в спальне"), "socket");
        assert_eq!(Dispatcher::classify("Повесить люстру"), "lighting");
        assert_eq!(Dispatcher::classify("нужен электрощит"), "panel");
    }

    #[test]
    fn several_domains_give_multi() {
        assert_eq!(Dispatcher::classify("Люстра и щит с автоматами"), MULTI);
    }

    #[test]
    fn no_keywords_give_general() {
        assert_eq!(Dispatcher::classify("Здравствуйте, сколько стоит?"), GENERAL);
    }

    #[test]
    fn details_are_extracted_opportunistically() {
        let details =
            Dispatcher::extract_details("Розетки в 2-комнатной квартире 54,5 кв.м, стены кирпич");
        assert_eq!(details.calculator, "socket");
        assert_eq!(details.answers["property_type"], Answer::choice("apartment"));
        assert_eq!(details.answers["area"], Answer::Measure(54.5));
        assert_eq!(details.answers["rooms"], Answer::Count(2));
        assert_eq!(details.answers["wall_material"], Answer::choice("brick"));

        let details = Dispatcher::extract_details("нужны розетки");
        assert!(details.answers.is_empty());
    }

    #[tokio::test]
    async fn route_starts_known_calculators_only() {
        let dispatcher = dispatcher(&["socket"]);

        let result = dispatcher.route("socket", "s1", Answers::new()).await;
        assert_eq!(result.status, TurnStatus::AwaitingAnswer);
        assert!(result.response.starts_with("Выберите тип объекта:"));

        let result = dispatcher.route(GENERAL, "s2", Answers::new()).await;
        assert_eq!(result.response, UNKNOWN_SERVICE);
        assert_eq!(result.status, TurnStatus::Unhandled);

        let result = dispatcher.route("lighting", "s3", Answers::new()).await;
        assert_eq!(result.response, CALCULATOR_UNAVAILABLE);
        assert_eq!(result.status, TurnStatus::Unhandled);
    }

    #[tokio::test]
    async fn continue_without_session_asks_to_start_over() {
        let dispatcher = dispatcher(&["socket"]);
        let result = dispatcher.continue_dialog("missing", "1").await;
        assert_eq!(result.response, START_OVER);
        assert_eq!(result.status, TurnStatus::Unhandled);
    }

    #[tokio::test]
    async fn prefilled_answers_skip_their_steps() {
        let dispatcher = dispatcher(&["socket"]);
        let details = Dispatcher::extract_details("розетки в квартире, стены из бетона");
        let result = dispatcher.route(details.calculator, "s1", details.answers).await;
        assert!(result.response.starts_with("Сколько требуется одинарных розеток"));
    }
}
