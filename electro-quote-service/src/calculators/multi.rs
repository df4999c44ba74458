use dialog_flow::parse::{self, Keywords};
use dialog_flow::{
    Answer, Answers, AnswersExt, Calculation, Calculator, FlowError, Result, Step,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{PROPERTY_KEYWORDS, format_area, parse_choice, parse_flag, parse_measure};
use crate::pricing::{self, NameTable, PROPERTY_TYPE_NAMES};

const SELECT_SERVICES: &str = "select_services";

const STEPS: &[Step] = &[
    Step::new(
        "property_type",
        "Выберите тип объекта для комплексного расчета:\n1. Квартира\n2. Дом/коттедж\n3. Офис\n\
         4. Коммерческое помещение\n5. Промышленное помещение",
    ),
    Step::new("area", "Укажите общую площадь помещения в квадратных метрах:"),
    Step::new(
        "is_new_construction",
        "Это новая постройка или ремонт существующего помещения?\n\
         1. Новостройка / новое помещение\n2. Ремонт существующего помещения",
    ),
    Step::new(
        "has_panel",
        "Сейчас я задам несколько вопросов о текущем состоянии электрики объекта.\n\n\
         У вас уже есть установленный и подключенный электрощит с необходимым количеством \
         автоматов?",
    ),
    Step::new(
        "has_cabling",
        "Кабели уже проложены к местам установки розеток и светильников?",
    ),
    Step::new(SELECT_SERVICES, "Выберите услуги для расчета (введите номера через запятую):"),
    Step::new("lighting_count", ""),
    Step::new("panel_breakers", ""),
    Step::new("socket_points", ""),
    Step::new("cabling_length", ""),
];

/// Detail step asked for each selected sub-service.
const DETAIL_STEPS: &[(&str, &str)] = &[
    ("lighting", "lighting_count"),
    ("panel", "panel_breakers"),
    ("socket", "socket_points"),
    ("cabling", "cabling_length"),
];

const SERVICE_NAMES: &NameTable = &[
    ("lighting", "Монтаж освещения"),
    ("panel", "Монтаж электрощита"),
    ("socket", "Монтаж розеток и выключателей"),
    ("cabling", "Прокладка кабелей и проводки"),
];

const NEW_CONSTRUCTION_KEYWORDS: &[(&str, bool)] = &[
    ("1", true),
    ("новостройка", true),
    ("новая", true),
    ("новое", true),
    ("2", false),
    ("ремонт", false),
    ("старое", false),
    ("существующее", false),
];

// Negatives first: "не установлен" contains "установлен".
const HAS_PANEL_KEYWORDS: &[(&str, bool)] = &[
    ("нет", false),
    ("отсутствует", false),
    ("не установлен", false),
    ("нужен", false),
    ("да", true),
    ("есть", true),
    ("установлен", true),
    ("имеется", true),
];

const HAS_CABLING_KEYWORDS: &[(&str, bool)] = &[
    ("нет", false),
    ("отсутствуют", false),
    ("не проложены", false),
    ("нужны", false),
    ("да", true),
    ("есть", true),
    ("проложены", true),
    ("имеются", true),
];

const SERVICE_FAILED: &str = "не удалось рассчитать автоматически, стоимость уточнит специалист";

const ALL_SERVICES_WORDS: &[&str] = &["все", "всё", "комплекс", "полный"];

const SERVICE_WORDS: &Keywords = &[
    ("розетк", "socket"),
    ("свет", "lighting"),
    ("освещен", "lighting"),
    ("светильник", "lighting"),
    ("щит", "panel"),
    ("электрощит", "panel"),
    ("кабел", "cabling"),
    ("проводк", "cabling"),
    ("провод", "cabling"),
];

/// Services pulled in by a selected one.
const REQUIRED_SERVICES: &[(&str, &[&str])] = &[
    ("socket", &["cabling", "panel"]),
    ("lighting", &["cabling", "panel"]),
];

const SERVICE_NOTES: &[(&str, &str)] = &[
    (
        "socket",
        "Для установки розеток потребуется прокладка кабелей и подключение к электрощиту.",
    ),
    (
        "lighting",
        "Для монтажа освещения потребуется прокладка кабелей и подключение к электрощиту.",
    ),
    ("panel", "Для электрощита рекомендуется также установка системы заземления."),
];

/// Per-type scaling of the typical quantities: sockets, lights, breakers, cable metres.
const TYPICAL_MULTIPLIERS: &[(&str, [f64; 4])] = &[
    ("apartment", [1.0, 1.0, 1.0, 1.0]),
    ("house", [1.2, 1.3, 1.5, 1.5]),
    ("office", [1.5, 1.2, 1.3, 1.3]),
    ("commercial", [1.3, 1.5, 1.4, 1.4]),
    ("industrial", [0.8, 1.1, 1.8, 1.7]),
];

/// Quantities for a 50 m² apartment.
const TYPICAL_BASE: [f64; 4] = [10.0, 5.0, 6.0, 100.0];
const TYPICAL_AREA: f64 = 50.0;

const DEFAULT_WALL_MATERIAL: &str = "brick";
const DEFAULT_COMPLEXITY: &str = "standard";
const DEFAULT_CEILING_HEIGHT: f64 = 2.7;
const DEFAULT_CABLE_SECTION: f64 = 2.5;

/// Typical installation for an object, used in the selection prompt and for automatic details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypicalQuantities {
    pub sockets: u32,
    pub lights: u32,
    pub breakers: u32,
    pub cable_meters: u32,
}

impl TypicalQuantities {
    pub fn for_object(property_type: &str, area: f64) -> Self {
        let multipliers = TYPICAL_MULTIPLIERS
            .iter()
            .find(|(code, _)| *code == property_type)
            .map(|(_, m)| *m)
            .unwrap_or([1.0; 4]);
        let factor = area / TYPICAL_AREA;
        let scaled = |i: usize| (TYPICAL_BASE[i] * multipliers[i] * factor).round().max(0.0) as u32;
        Self {
            sockets: scaled(0),
            lights: scaled(1),
            breakers: scaled(2),
            cable_meters: scaled(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub service: String,
    pub price: i64,
    /// The sub-calculator failed; the line contributes nothing and the details are only logged.
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiQuote {
    pub property_type: String,
    pub area: f64,
    pub is_new_construction: bool,
    pub has_panel: bool,
    pub has_cabling: bool,
    pub selected_services: Vec<String>,
    pub services: Vec<ServiceLine>,
    pub total_price: i64,
}

/// Combined quote over several single-service calculators.
pub struct MultiCalculator {
    services: Vec<Arc<dyn Calculator>>,
}

impl MultiCalculator {
    /// `services` are the enabled sub-calculators, in menu order.
    pub fn new(services: Vec<Arc<dyn Calculator>>) -> Self {
        Self { services }
    }

    fn service(&self, id: &str) -> Option<&Arc<dyn Calculator>> {
        self.services.iter().find(|service| service.id() == id)
    }

    fn service_ids(&self) -> Vec<String> {
        self.services.iter().map(|s| s.id().to_string()).collect()
    }

    /// Selection plus required dependencies, restricted to enabled services, in menu order.
    pub fn effective_services(&self, selected: &[String]) -> Vec<String> {
        let wanted = |id: &str| {
            selected.iter().any(|s| s == id)
                || REQUIRED_SERVICES.iter().any(|(service, required)| {
                    required.contains(&id) && selected.iter().any(|s| s.as_str() == *service)
                })
        };
        self.services
            .iter()
            .map(|service| service.id())
            .filter(|id| wanted(id))
            .map(str::to_string)
            .collect()
    }

    fn parse_services(&self, input: &str) -> Vec<String> {
        let count = self.services.len();
        let mut selected: Vec<String> = Vec::new();

        for number in input
            .split(|c: char| !c.is_ascii_digit())
            .filter_map(|part| part.parse::<usize>().ok())
        {
            if (1..=count).contains(&number) {
                let id = self.services[number - 1].id().to_string();
                if !selected.contains(&id) {
                    selected.push(id);
                }
            } else if number == count + 1 {
                return self.service_ids();
            }
        }
        if !selected.is_empty() {
            return selected;
        }

        let lowered = input.to_lowercase();
        if ALL_SERVICES_WORDS.iter().any(|word| lowered.contains(word)) {
            return self.service_ids();
        }
        parse::match_keyword(&lowered, SERVICE_WORDS)
            .filter(|id| self.service(id).is_some())
            .map(|id| vec![id.to_string()])
            .unwrap_or_default()
    }

    fn selection_prompt(&self, answers: &Answers) -> String {
        let property_type = answers.choice_or("property_type", "apartment");
        let area = answers.measure("area").unwrap_or(TYPICAL_AREA);
        let typical = TypicalQuantities::for_object(property_type, area);

        let mut text = format!(
            "📏 Для объекта '{}' площадью {} кв.м обычно требуется:\n\n\
             • Электрощит с {} автоматами\n• Прокладка около {} метров кабеля\n\
             • Установка около {} розеток\n• Монтаж около {} светильников\n\n\
             🔧 Выберите услуги для расчета (введите номера через запятую):\n\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, property_type),
            format_area(area),
            typical.breakers,
            typical.cable_meters,
            typical.sockets,
            typical.lights,
        );
        for (i, service) in self.services.iter().enumerate() {
            text.push_str(&format!(
                "{}. {}\n",
                i + 1,
                pricing::display_name(SERVICE_NAMES, service.id())
            ));
        }
        text.push_str(&format!(
            "\n{}. Все услуги (комплексный расчет)\n",
            self.services.len() + 1
        ));
        text
    }

    fn detail_prompt(service: &str) -> String {
        let (icon, question) = match service {
            "socket" => (
                "🔌",
                "Укажите количество точек (розеток, выключателей) или нажмите Enter для \
                 автоматического расчета:",
            ),
            "lighting" => (
                "💡",
                "Укажите количество светильников или нажмите Enter для автоматического расчета:",
            ),
            "panel" => (
                "⚡",
                "Укажите требуемое количество автоматов в щите или нажмите Enter для \
                 автоматического расчета:",
            ),
            _ => (
                "🔗",
                "Укажите примерную длину кабелей в метрах или нажмите Enter для \
                 автоматического расчета:",
            ),
        };
        format!(
            "{icon} Детали для услуги '{}':\n\n{question}",
            pricing::display_name(SERVICE_NAMES, service)
        )
    }

    fn selection_acknowledgement(&self, selected: &[String]) -> String {
        let mut text = String::from("✅ Выбранные услуги:\n");
        for id in self.effective_services(selected) {
            text.push_str(&format!("• {}\n", pricing::display_name(SERVICE_NAMES, &id)));
        }
        let notes: Vec<&str> = selected
            .iter()
            .filter_map(|id| {
                SERVICE_NOTES
                    .iter()
                    .find(|(service, _)| service == id)
                    .map(|(_, note)| *note)
            })
            .collect();
        if !notes.is_empty() {
            text.push_str("\n💡 Информация:\n");
            for note in notes {
                text.push_str(&format!("• {note}\n"));
            }
        }
        text.trim_end().to_string()
    }

    /// Answers handed to one sub-calculator.
    fn service_answers(
        service: &str,
        property_type: &str,
        area: f64,
        detail: Option<f64>,
        typical: &TypicalQuantities,
    ) -> Answers {
        let count = |typical: u32| detail.map(|n| n.round() as u32).unwrap_or(typical);
        let mut answers = Answers::new();
        answers.insert("property_type".to_string(), Answer::choice(property_type));
        answers.insert("wall_material".to_string(), Answer::choice(DEFAULT_WALL_MATERIAL));
        answers.insert("complexity".to_string(), Answer::choice(DEFAULT_COMPLEXITY));

        match service {
            "socket" => {
                answers.insert("socket_singles".to_string(), Answer::Count(count(typical.sockets)));
            }
            "lighting" => {
                answers.insert(
                    "ceiling_height".to_string(),
                    Answer::Measure(DEFAULT_CEILING_HEIGHT),
                );
                answers.insert("ceiling_type".to_string(), Answer::choice("regular"));
                answers.insert("light_fixtures".to_string(), Answer::Count(count(typical.lights)));
            }
            "panel" => {
                let panel_type = match property_type {
                    "house" => "house",
                    "office" | "commercial" => "floor",
                    "industrial" => "industrial",
                    _ => "apartment",
                };
                answers.insert("panel_type".to_string(), Answer::choice(panel_type));
                answers.insert(
                    "circuit_breakers".to_string(),
                    Answer::Count(count(typical.breakers)),
                );
            }
            _ => {
                let length = detail.unwrap_or(f64::from(typical.cable_meters));
                answers.insert("area".to_string(), Answer::Measure(area));
                answers.insert("cabling_type".to_string(), Answer::choice("hidden"));
                answers.insert("cable_length".to_string(), Answer::Measure(length));
                answers.insert("cable_section".to_string(), Answer::Measure(DEFAULT_CABLE_SECTION));
            }
        }
        answers
    }
}

fn detail_service(step_key: &str) -> Option<&'static str> {
    DETAIL_STEPS
        .iter()
        .find(|(_, key)| *key == step_key)
        .map(|(service, _)| *service)
}

impl Calculator for MultiCalculator {
    fn id(&self) -> &str {
        "multi"
    }

    fn name(&self) -> &str {
        "Комплексный расчет"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn prompt(&self, step: &Step, answers: &Answers) -> String {
        if step.key == SELECT_SERVICES {
            return self.selection_prompt(answers);
        }
        match detail_service(step.key) {
            Some(service) => Self::detail_prompt(service),
            None => step.prompt.to_string(),
        }
    }

    fn applies(&self, step: &Step, answers: &Answers) -> bool {
        match detail_service(step.key) {
            Some(service) => self
                .effective_services(&answers.selection(SELECT_SERVICES))
                .iter()
                .any(|id| id == service),
            None => true,
        }
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "property_type" => parse_choice(step, input, PROPERTY_KEYWORDS),
            "area" => parse_measure(step, input),
            "is_new_construction" => parse_flag(step, input, NEW_CONSTRUCTION_KEYWORDS),
            "has_panel" => parse_flag(step, input, HAS_PANEL_KEYWORDS),
            "has_cabling" => parse_flag(step, input, HAS_CABLING_KEYWORDS),
            SELECT_SERVICES => {
                let selected = self.parse_services(input);
                if selected.is_empty() {
                    return Err(FlowError::parse_failure(step.key));
                }
                Ok(Answer::Selection(selected))
            }
            "cabling_length" => Ok(parse::parse_decimal(input)
                .map(Answer::Measure)
                .unwrap_or(Answer::Blank)),
            // Anything but a positive number means "calculate automatically".
            _ => Ok(parse::parse_count(input)
                .filter(|n| *n > 0)
                .map(Answer::Count)
                .unwrap_or(Answer::Blank)),
        }
    }

    fn acknowledge(&self, step: &Step, answers: &Answers) -> Option<String> {
        match step.key {
            "property_type" => Some(format!(
                "✅ Выбран тип объекта: {}",
                pricing::display_name(PROPERTY_TYPE_NAMES, answers.choice_or("property_type", ""))
            )),
            "area" => answers
                .measure("area")
                .map(|area| format!("✅ Площадь: {} кв.м", format_area(area))),
            "is_new_construction" => Some(if answers.flag_or("is_new_construction", true) {
                "✅ Тип работ: новостройка".to_string()
            } else {
                "✅ Тип работ: ремонт существующего помещения".to_string()
            }),
            "has_panel" => Some(if answers.flag_or("has_panel", false) {
                "✅ Электрощит: есть".to_string()
            } else {
                "✅ Электрощит: нужен".to_string()
            }),
            SELECT_SERVICES => {
                Some(self.selection_acknowledgement(&answers.selection(SELECT_SERVICES)))
            }
            _ => None,
        }
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let property_type = answers.require_choice("property_type")?;
        let area = answers.require_measure("area")?;
        pricing::ensure_known(PROPERTY_TYPE_NAMES, "property_type", property_type)?;

        let selected = answers.selection(SELECT_SERVICES);
        let effective = self.effective_services(&selected);
        if effective.is_empty() {
            return Err(FlowError::MissingParameter(SELECT_SERVICES.to_string()));
        }

        let typical = TypicalQuantities::for_object(property_type, area);
        let mut services = Vec::with_capacity(effective.len());
        for id in &effective {
            let Some(calculator) = self.service(id) else {
                continue;
            };
            let detail = DETAIL_STEPS
                .iter()
                .find(|(service, _)| service == id)
                .and_then(|(_, key)| answers.measure(key));
            let sub_answers = Self::service_answers(id, property_type, area, detail, &typical);

            let line = match calculator.calculate(&sub_answers) {
                Ok(calculation) => {
                    debug!(service = %id, price = calculation.total_price(), "Sub-service priced");
                    ServiceLine {
                        service: id.clone(),
                        price: calculation.total_price(),
                        failed: false,
                    }
                }
                Err(e) => {
                    warn!(service = %id, error = %e, "Sub-service calculation failed");
                    ServiceLine {
                        service: id.clone(),
                        price: 0,
                        failed: true,
                    }
                }
            };
            services.push(line);
        }

        let quote = MultiQuote {
            property_type: property_type.to_string(),
            area,
            is_new_construction: answers.flag_or("is_new_construction", true),
            has_panel: answers.flag_or("has_panel", false),
            has_cabling: answers.flag_or("has_cabling", false),
            selected_services: effective,
            total_price: services.iter().map(|line| line.price).sum(),
            services,
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: MultiQuote = calculation.breakdown()?;

        let mut text = String::from("📋 Комплексный расчет стоимости электромонтажных работ:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Площадь помещения: {} кв.м\n\nРасчет по выбранным услугам:\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, &quote.property_type),
            format_area(quote.area),
        ));
        for line in &quote.services {
            let name = pricing::display_name(SERVICE_NAMES, &line.service);
            if line.failed {
                text.push_str(&format!("\n🔴 {name}: {SERVICE_FAILED}\n"));
            } else {
                text.push_str(&format!("\n🔹 {name}: {} руб.\n", line.price));
            }
        }
        text.push_str(&format!(
            "\n💰 Общая стоимость всех работ: {} руб.\n",
            quote.total_price
        ));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка. Точная стоимость определяется только \
             после выезда специалиста и составления детальной сметы. Окончательная цена может \
             отличаться в зависимости от особенностей объекта.",
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::{
        CablingCalculator, LightingCalculator, PanelCalculator, SocketCalculator,
    };

    fn calculator() -> MultiCalculator {
        MultiCalculator::new(vec![
            Arc::new(LightingCalculator),
            Arc::new(PanelCalculator),
            Arc::new(SocketCalculator),
            Arc::new(CablingCalculator),
        ])
    }

    /// Panel stand-in whose pricing always fails.
    struct BrokenPanel;

    impl Calculator for BrokenPanel {
        fn id(&self) -> &str {
            "panel"
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn steps(&self) -> &[Step] {
            &[]
        }

        fn parse(&self, step: &Step, _input: &str) -> Result<Answer> {
            Err(FlowError::parse_failure(step.key))
        }

        fn calculate(&self, _answers: &Answers) -> Result<Calculation> {
            Err(FlowError::MissingParameter("area".to_string()))
        }

        fn format(&self, _calculation: &Calculation) -> Result<String> {
            Ok(String::new())
        }
    }

    fn step(key: &str) -> Step {
        *STEPS.iter().find(|s| s.key == key).unwrap()
    }

    fn answers(selected: &[&str]) -> Answers {
        [
            ("property_type", Answer::choice("apartment")),
            ("area", Answer::Measure(50.0)),
            ("is_new_construction", Answer::Flag(true)),
            ("has_panel", Answer::Flag(false)),
            ("has_cabling", Answer::Flag(false)),
            (
                SELECT_SERVICES,
                Answer::Selection(selected.iter().map(|s| s.to_string()).collect()),
            ),
        ]
        .into_iter()
        .map(|(key, answer)| (key.to_string(), answer))
        .collect()
    }

    #[test]
    fn typical_quantities_scale_with_type_and_area() {
        let typical = TypicalQuantities::for_object("house", 100.0);
        assert_eq!(typical.sockets, 24);
        assert_eq!(typical.lights, 13);
        assert_eq!(typical.breakers, 18);
        assert_eq!(typical.cable_meters, 300);
    }

    #[test]
    fn sockets_pull_in_cabling_and_panel() {
        let multi = calculator();
        assert_eq!(
            multi.effective_services(&["socket".to_string()]),
            vec!["panel", "socket", "cabling"]
        );
        assert_eq!(multi.effective_services(&["panel".to_string()]), vec!["panel"]);
    }

    #[test]
    fn selection_accepts_numbers_all_and_words() {
        let multi = calculator();
        let select = step(SELECT_SERVICES);
        assert_eq!(
            multi.parse(&select, "1, 3").unwrap(),
            Answer::Selection(vec!["lighting".to_string(), "socket".to_string()])
        );
        assert_eq!(
            multi.parse(&select, "5").unwrap(),
            Answer::Selection(multi.service_ids())
        );
        assert_eq!(
            multi.parse(&select, "нужен щит").unwrap(),
            Answer::Selection(vec!["panel".to_string()])
        );
        assert!(multi.parse(&select, "0").is_err());
    }

    #[test]
    fn detail_steps_follow_the_selection() {
        let multi = calculator();
        let answers = answers(&["panel"]);
        assert!(multi.applies(&step("panel_breakers"), &answers));
        assert!(!multi.applies(&step("socket_points"), &answers));
        assert!(!multi.applies(&step("cabling_length"), &answers));
    }

    #[test]
    fn blank_details_use_typical_quantities() {
        let multi = calculator();
        let mut answers = answers(&["panel"]);
        answers.insert("panel_breakers".to_string(), Answer::Blank);
        let calculation = multi.calculate(&answers).unwrap();
        // (5000 + 6 × 350) × 1.2 for brick walls
        assert_eq!(calculation.total_price(), 8520);

        answers.insert("panel_breakers".to_string(), Answer::Count(10));
        assert_eq!(multi.calculate(&answers).unwrap().total_price(), 10200);
    }

    #[test]
    fn total_sums_every_service_line() {
        let multi = calculator();
        let calculation = multi.calculate(&answers(&["socket"])).unwrap();
        let quote: MultiQuote = calculation.breakdown().unwrap();
        assert_eq!(quote.services.len(), 3);
        let sum: i64 = quote.services.iter().map(|line| line.price).sum();
        assert_eq!(quote.total_price, sum);

        let text = multi.format(&calculation).unwrap();
        assert!(text.contains("🔹 Монтаж розеток и выключателей:"));
        assert!(text.contains(&format!("💰 Общая стоимость всех работ: {sum} руб.")));
    }

    #[test]
    fn failed_service_is_reported_without_internal_details() {
        let multi = MultiCalculator::new(vec![Arc::new(BrokenPanel), Arc::new(SocketCalculator)]);
        let calculation = multi.calculate(&answers(&["panel", "socket"])).unwrap();
        let quote: MultiQuote = calculation.breakdown().unwrap();
        let panel = quote.services.iter().find(|line| line.service == "panel").unwrap();
        assert!(panel.failed);
        assert_eq!(panel.price, 0);

        let internal = FlowError::MissingParameter("area".to_string()).to_string();
        let text = multi.format(&calculation).unwrap();
        assert!(text.contains(&format!("🔴 Монтаж электрощита: {SERVICE_FAILED}")));
        assert!(!text.contains(&internal));
        assert!(!text.contains("Missing"));
        assert!(text.contains("🔹 Монтаж розеток и выключателей:"));
    }

    #[test]
    fn selection_prompt_lists_enabled_services() {
        let multi =
            MultiCalculator::new(vec![Arc::new(PanelCalculator), Arc::new(SocketCalculator)]);
        let prompt = multi.prompt(&step(SELECT_SERVICES), &answers(&[]));
        assert!(prompt.contains("📏 Для объекта 'Квартира' площадью 50 кв.м"));
        assert!(prompt.contains("1. Монтаж электрощита\n2. Монтаж розеток и выключателей\n"));
        assert!(prompt.contains("3. Все услуги (комплексный расчет)"));

        let full = calculator().prompt(&step(SELECT_SERVICES), &answers(&[]));
        assert!(full.contains("4. Прокладка кабелей и проводки\n\n5. Все услуги"));
        assert!(!full.contains("Общий электромонтаж"));
    }

    #[test]
    fn acknowledgement_lists_dependency_notes() {
        let multi = calculator();
        let ack = multi
            .acknowledge(&step(SELECT_SERVICES), &answers(&["lighting"]))
            .unwrap();
        assert!(ack.starts_with("✅ Выбранные услуги:\n• Монтаж освещения\n"));
        assert!(ack.contains("• Прокладка кабелей и проводки"));
        assert!(ack.contains("💡 Информация:"));
    }
}
