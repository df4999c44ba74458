//! The seven calculator variants plus the step prompts and parsers they share.

pub mod cabling;
pub mod design;
pub mod industrial;
pub mod lighting;
pub mod multi;
pub mod panel;
pub mod socket;

use dialog_flow::{Answer, Calculator, CalculatorRegistry, FlowError, RegistryBuilder, Result, Step};
use dialog_flow::parse::{self, Keywords};
use std::sync::Arc;
use tracing::{info, warn};

pub use cabling::CablingCalculator;
pub use design::DesignCalculator;
pub use industrial::IndustrialCalculator;
pub use lighting::LightingCalculator;
pub use multi::MultiCalculator;
pub use panel::PanelCalculator;
pub use socket::SocketCalculator;

/// Every calculator type tag, in registration order.
pub const ALL_CALCULATORS: &[&str] = &[
    "socket",
    "lighting",
    "panel",
    "cabling",
    "industrial",
    "design",
    "multi",
];

/// Sub-services offered by the multi-service calculator, in menu order.
pub const MULTI_SERVICES: &[&str] = &["lighting", "panel", "socket", "cabling"];

pub const PROPERTY_TYPE_STEP: Step = Step::new(
    "property_type",
    "Выберите тип объекта:\n1. Квартира\n2. Дом/коттедж\n3. Офис\n4. Коммерческое помещение\n\
     5. Промышленное помещение",
);

pub const WALL_MATERIAL_STEP: Step = Step::new(
    "wall_material",
    "Выберите материал стен:\n1. Гипсокартон\n2. Кирпич\n3. Бетон\n4. Дерево\n\
     5. Газоблок/пеноблок",
);

pub const PROPERTY_KEYWORDS: &Keywords = &[
    ("1", "apartment"),
    ("квартир", "apartment"),
    ("2", "house"),
    ("дом", "house"),
    ("коттедж", "house"),
    ("3", "office"),
    ("офис", "office"),
    ("4", "commercial"),
    ("коммерческ", "commercial"),
    ("5", "industrial"),
    ("промышлен", "industrial"),
];

pub const WALL_KEYWORDS: &Keywords = &[
    ("1", "drywall"),
    ("гипсокартон", "drywall"),
    ("2", "brick"),
    ("кирпич", "brick"),
    ("3", "concrete"),
    ("бетон", "concrete"),
    ("4", "wood"),
    ("дерев", "wood"),
    ("5", "block"),
    ("газоблок", "block"),
    ("пеноблок", "block"),
];

/// Ordinal digits of the three-level complexity menus.
pub const COMPLEXITY_DIGITS_3: &Keywords = &[("1", "easy"), ("2", "standard"), ("3", "complex")];
/// Ordinal digits of the four-level complexity menus.
pub const COMPLEXITY_DIGITS_4: &Keywords = &[
    ("1", "easy"),
    ("2", "standard"),
    ("3", "complex"),
    ("4", "very_complex"),
];

// "очень" must be checked before "сложн".
pub const COMPLEXITY_KEYWORDS: &Keywords = &[
    ("прост", "easy"),
    ("стандарт", "standard"),
    ("очень", "very_complex"),
    ("сложн", "complex"),
];

/// Enumerated answer; fails when no keyword matches.
pub fn parse_choice(step: &Step, input: &str, keywords: &Keywords) -> Result<Answer> {
    parse::match_keyword(input, keywords)
        .map(Answer::choice)
        .ok_or_else(|| FlowError::parse_failure(step.key))
}

/// Complexity answer. An exact ordinal digit wins, then keywords; anything else is `standard`.
pub fn parse_complexity(input: &str, digits: &Keywords, keywords: &Keywords) -> Answer {
    let trimmed = input.trim();
    let code = digits
        .iter()
        .find(|(digit, _)| *digit == trimmed)
        .map(|(_, code)| *code)
        .or_else(|| parse::match_keyword(trimmed, keywords))
        .unwrap_or("standard");
    Answer::choice(code)
}

pub fn parse_count(step: &Step, input: &str) -> Result<Answer> {
    parse::parse_count(input)
        .map(Answer::Count)
        .ok_or_else(|| FlowError::parse_failure(step.key))
}

pub fn parse_measure(step: &Step, input: &str) -> Result<Answer> {
    parse::parse_decimal(input)
        .map(Answer::Measure)
        .ok_or_else(|| FlowError::parse_failure(step.key))
}

/// Blank input is an explicit "unknown" answer.
pub fn parse_optional_measure(step: &Step, input: &str) -> Result<Answer> {
    match parse::parse_optional_decimal(input) {
        Some(Some(value)) => Ok(Answer::Measure(value)),
        Some(None) => Ok(Answer::Blank),
        None => Err(FlowError::parse_failure(step.key)),
    }
}

pub fn parse_flag(step: &Step, input: &str, keywords: &[(&str, bool)]) -> Result<Answer> {
    parse::match_flag(input, keywords)
        .map(Answer::Flag)
        .ok_or_else(|| FlowError::parse_failure(step.key))
}

/// Area as shown to the user: whole numbers without a fractional part.
pub fn format_area(area: f64) -> String {
    if area.fract() == 0.0 {
        format!("{area:.0}")
    } else {
        format!("{area}")
    }
}

fn single_service(tag: &str) -> Option<Arc<dyn Calculator>> {
    let calculator: Arc<dyn Calculator> = match tag {
        "socket" => Arc::new(SocketCalculator),
        "lighting" => Arc::new(LightingCalculator),
        "panel" => Arc::new(PanelCalculator),
        "cabling" => Arc::new(CablingCalculator),
        "industrial" => Arc::new(IndustrialCalculator),
        "design" => Arc::new(DesignCalculator),
        _ => return None,
    };
    Some(calculator)
}

/// Build the registry of enabled calculators. Unknown tags are logged and skipped.
///
/// The multi-service calculator only offers sub-services that are enabled themselves.
pub fn build_registry(enabled: &[String]) -> CalculatorRegistry {
    for tag in enabled {
        if !ALL_CALCULATORS.contains(&tag.as_str()) {
            warn!(calculator = %tag, "Ignoring unknown calculator type");
        }
    }
    let is_enabled = |tag: &str| enabled.iter().any(|e| e == tag);

    let mut builder = RegistryBuilder::new();
    for tag in ALL_CALCULATORS.iter().copied().filter(|tag| is_enabled(tag)) {
        let calculator = match tag {
            "multi" => {
                let services = MULTI_SERVICES
                    .iter()
                    .filter(|service| is_enabled(service))
                    .filter_map(|service| single_service(service))
                    .collect();
                Some(Arc::new(MultiCalculator::new(services)) as Arc<dyn Calculator>)
            }
            other => single_service(other),
        };
        if let Some(calculator) = calculator {
            builder = builder.add_calculator(calculator);
        }
    }

    let registry = builder.build();
    info!(calculators = ?registry.ids(), "Calculator registry ready");
    registry
}
