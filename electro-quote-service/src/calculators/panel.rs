use dialog_flow::parse::{self, Keywords};
use dialog_flow::{Answer, Answers, AnswersExt, Calculation, Calculator, Result, Step};
use serde::{Deserialize, Serialize};

use super::{
    COMPLEXITY_DIGITS_4, COMPLEXITY_KEYWORDS, PROPERTY_KEYWORDS, PROPERTY_TYPE_STEP, WALL_KEYWORDS,
    WALL_MATERIAL_STEP, parse_choice, parse_complexity, parse_count,
};
use crate::pricing::{
    self, COMPLEXITY_COEFFICIENTS, COMPLEXITY_NAMES, PANEL_BASE_PRICES, PANEL_DEVICE_NAMES,
    PANEL_DEVICE_PRICES, PANEL_TYPE_NAMES, PROPERTY_TYPE_NAMES, WALL_MATERIAL_COEFFICIENTS,
    WALL_MATERIAL_NAMES,
};

/// Minimum order for panel assembly.
pub const MIN_PRICE: i64 = 5000;

const STEPS: &[Step] = &[
    PROPERTY_TYPE_STEP,
    WALL_MATERIAL_STEP,
    Step::new(
        "panel_type",
        "Выберите тип электрощита:\n1. Квартирный щиток\n2. Щит для частного дома\n\
         3. Этажный щит\n4. Промышленный щит",
    ),
    Step::new(
        "circuit_breakers",
        "Укажите количество обычных автоматов (однополюсных и двухполюсных), которые необходимо \
         установить:",
    ),
    Step::new(
        "rcd_count",
        "Укажите количество УЗО (устройств защитного отключения), которые необходимо установить \
         (или 0, если не требуется):",
    ),
    Step::new(
        "diff_auto_count",
        "Укажите количество дифавтоматов, которые необходимо установить (или 0, если не \
         требуется):",
    ),
    Step::new("meter_installation", "Требуется ли установка электросчетчика? (Да/Нет)"),
    Step::new(
        "other_devices",
        "Выберите дополнительные устройства (можно выбрать несколько, введите номера через \
         запятую):\n1. Контактор\n2. Реле напряжения\n3. Таймер\n4. Устройство контроля фаз\n\
         0. Не требуются",
    ),
    Step::new(
        "complexity",
        "Выберите сложность монтажа:\n1. Простой монтаж (стандартная схема)\n\
         2. Стандартная сложность\n\
         3. Сложный монтаж (нестандартная схема, много устройств)\n\
         4. Очень сложный монтаж (промышленное исполнение, сложное программирование)",
    ),
];

const PANEL_KEYWORDS: &Keywords = &[
    ("1", "apartment"),
    ("квартирн", "apartment"),
    ("2", "house"),
    ("частн", "house"),
    ("дом", "house"),
    ("3", "floor"),
    ("этаж", "floor"),
    ("4", "industrial"),
    ("промышл", "industrial"),
];

// Negatives first: "не нужно" contains "нужно".
const METER_KEYWORDS: &[(&str, bool)] = &[
    ("не нужно", false),
    ("не требу", false),
    ("нет", false),
    ("no", false),
    ("да", true),
    ("yes", true),
    ("нужно", true),
    ("требу", true),
    ("установить", true),
];

const EXTRA_DEVICES: &Keywords = &[
    ("1", "contactor"),
    ("2", "voltage_relay"),
    ("3", "timer"),
    ("4", "phase_control"),
];

const EXTRA_DEVICE_WORDS: &Keywords = &[
    ("контактор", "contactor"),
    ("реле", "voltage_relay"),
    ("таймер", "timer"),
    ("контрол", "phase_control"),
];

const NONE_WORDS: &[&str] = &["не треб", "нет"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelQuote {
    pub property_type: String,
    pub wall_material: String,
    pub panel_type: String,
    pub complexity: String,
    pub circuit_breakers: u32,
    pub rcd_count: u32,
    pub diff_auto_count: u32,
    pub meter_installation: bool,
    pub other_devices: Vec<String>,
    pub base_price: i64,
    pub devices_price: i64,
    pub total_devices: u32,
    pub total_price: i64,
}

/// Electrical panel assembly and installation.
pub struct PanelCalculator;

impl Calculator for PanelCalculator {
    fn id(&self) -> &str {
        "panel"
    }

    fn name(&self) -> &str {
        "Монтаж электрощита"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "property_type" => parse_choice(step, input, PROPERTY_KEYWORDS),
            "wall_material" => parse_choice(step, input, WALL_KEYWORDS),
            "panel_type" => parse_choice(step, input, PANEL_KEYWORDS),
            // An unclear answer means no meter.
            "meter_installation" => {
                Ok(Answer::Flag(parse::match_flag(input, METER_KEYWORDS).unwrap_or(false)))
            }
            "other_devices" => Ok(Answer::Selection(parse::parse_selection(
                input,
                EXTRA_DEVICES,
                EXTRA_DEVICE_WORDS,
                NONE_WORDS,
            ))),
            "complexity" => Ok(parse_complexity(input, COMPLEXITY_DIGITS_4, COMPLEXITY_KEYWORDS)),
            _ => parse_count(step, input),
        }
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let property_type = answers.require_choice("property_type")?;
        let wall_material = answers.require_choice("wall_material")?;
        let panel_type = answers.require_choice("panel_type")?;
        let complexity = answers.choice_or("complexity", "standard");

        pricing::ensure_known(PROPERTY_TYPE_NAMES, "property_type", property_type)?;
        let wall =
            pricing::coefficient(WALL_MATERIAL_COEFFICIENTS, "wall_material", wall_material)?;
        let complexity_coefficient =
            pricing::coefficient(COMPLEXITY_COEFFICIENTS, "complexity", complexity)?;
        let base_price = pricing::price(PANEL_BASE_PRICES, "panel_type", panel_type)?;

        let circuit_breakers = answers.count_or("circuit_breakers", 0);
        let rcd_count = answers.count_or("rcd_count", 0);
        let diff_auto_count = answers.count_or("diff_auto_count", 0);
        let meter_installation = answers.flag_or("meter_installation", false);
        let other_devices = answers.selection("other_devices");

        let device = |code: &str| pricing::price(PANEL_DEVICE_PRICES, "device", code);
        let mut devices_price = device("circuit_breaker_1p")? * i64::from(circuit_breakers)
            + device("rcd_2p")? * i64::from(rcd_count)
            + device("diff_auto")? * i64::from(diff_auto_count);
        if meter_installation {
            devices_price += device("counter")?;
        }
        for code in &other_devices {
            devices_price += device(code)?;
        }

        let subtotal = (base_price + devices_price) as f64 * complexity_coefficient * wall;
        let total_devices = [
            circuit_breakers,
            rcd_count,
            diff_auto_count,
            u32::try_from(other_devices.len()).unwrap_or(u32::MAX),
            u32::from(meter_installation),
        ]
        .into_iter()
        .fold(0u32, u32::saturating_add);

        let quote = PanelQuote {
            property_type: property_type.to_string(),
            wall_material: wall_material.to_string(),
            panel_type: panel_type.to_string(),
            complexity: complexity.to_string(),
            circuit_breakers,
            rcd_count,
            diff_auto_count,
            meter_installation,
            other_devices,
            base_price,
            devices_price,
            total_devices,
            total_price: pricing::round_price(subtotal).max(MIN_PRICE),
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: PanelQuote = calculation.breakdown()?;

        let mut text = String::from("⚡ Расчет стоимости монтажа электрощита:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Материал стен: {}\n• Тип щита: {}\n• Сложность монтажа: {}\n\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, &quote.property_type),
            pricing::display_name(WALL_MATERIAL_NAMES, &quote.wall_material),
            pricing::display_name(PANEL_TYPE_NAMES, &quote.panel_type),
            pricing::display_name(COMPLEXITY_NAMES, &quote.complexity),
        ));

        text.push_str("Устройства:\n");
        if quote.circuit_breakers > 0 {
            text.push_str(&format!("• Автоматы: {} шт.\n", quote.circuit_breakers));
        }
        if quote.rcd_count > 0 {
            text.push_str(&format!("• УЗО: {} шт.\n", quote.rcd_count));
        }
        if quote.diff_auto_count > 0 {
            text.push_str(&format!("• Дифавтоматы: {} шт.\n", quote.diff_auto_count));
        }
        if quote.meter_installation {
            text.push_str("• Установка счетчика: Да\n");
        }
        if !quote.other_devices.is_empty() {
            text.push_str("• Дополнительные устройства:\n");
            for code in &quote.other_devices {
                text.push_str(&format!(
                    "  - {}: 1 шт.\n",
                    pricing::display_name(PANEL_DEVICE_NAMES, code)
                ));
            }
        }

        text.push_str(&format!("\n💰 Общая стоимость монтажа: {} руб.\n", quote.total_price));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка стоимости монтажа электрощита. Точная \
             стоимость определяется после выезда специалиста на объект и уточнения деталей заказа. \
             Цена может измениться в зависимости от сложности работ и других особенностей объекта.",
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Answers {
        [
            ("property_type", Answer::choice("house")),
            ("wall_material", Answer::choice("wood")),
            ("panel_type", Answer::choice("house")),
            ("circuit_breakers", Answer::Count(12)),
            ("rcd_count", Answer::Count(2)),
            ("diff_auto_count", Answer::Count(1)),
            ("meter_installation", Answer::Flag(true)),
            ("complexity", Answer::choice("standard")),
        ]
        .into_iter()
        .map(|(key, answer)| (key.to_string(), answer))
        .collect()
    }

    #[test]
    fn panel_total_adds_devices_to_base() {
        let calculation = PanelCalculator.calculate(&base()).unwrap();
        // 8000 + 12 × 350 + 2 × 500 + 800 + 1500
        assert_eq!(calculation.total_price(), 15500);
        let quote: PanelQuote = calculation.breakdown().unwrap();
        assert_eq!(quote.total_devices, 16);
    }

    #[test]
    fn small_panels_are_raised_to_the_floor() {
        let mut answers = base();
        answers.insert("panel_type".to_string(), Answer::choice("apartment"));
        answers.insert("wall_material".to_string(), Answer::choice("drywall"));
        answers.insert("complexity".to_string(), Answer::choice("easy"));
        for key in ["circuit_breakers", "rcd_count", "diff_auto_count"] {
            answers.insert(key.to_string(), Answer::Count(0));
        }
        answers.insert("meter_installation".to_string(), Answer::Flag(false));
        // 5000 × 0.9 × 0.9 = 4050
        assert_eq!(PanelCalculator.calculate(&answers).unwrap().total_price(), MIN_PRICE);
    }

    #[test]
    fn huge_counts_are_re_asked_and_never_overflow() {
        let step = STEPS.iter().find(|step| step.key == "circuit_breakers").unwrap();
        assert!(PanelCalculator.parse(step, "4000000000").is_err());
        assert_eq!(PanelCalculator.parse(step, "24").unwrap(), Answer::Count(24));

        let mut answers = base();
        for key in ["circuit_breakers", "rcd_count", "diff_auto_count"] {
            answers.insert(key.to_string(), Answer::Count(u32::MAX));
        }
        let quote: PanelQuote = PanelCalculator.calculate(&answers).unwrap().breakdown().unwrap();
        assert_eq!(quote.total_devices, u32::MAX);
        assert!(quote.total_price > MIN_PRICE);
    }

    #[test]
    fn meter_answer_checks_negatives_first() {
        let step = STEPS[6];
        assert_eq!(PanelCalculator.parse(&step, "Да").unwrap(), Answer::Flag(true));
        assert_eq!(PanelCalculator.parse(&step, "не нужно").unwrap(), Answer::Flag(false));
        assert_eq!(PanelCalculator.parse(&step, "может быть").unwrap(), Answer::Flag(false));
    }

    #[test]
    fn format_lists_extra_devices() {
        let mut answers = base();
        answers.insert(
            "other_devices".to_string(),
            Answer::Selection(vec!["timer".to_string()]),
        );
        let calculation = PanelCalculator.calculate(&answers).unwrap();
        let text = PanelCalculator.format(&calculation).unwrap();
        assert!(text.contains("• Тип щита: Щит для частного дома"));
        assert!(text.contains("  - Таймер: 1 шт."));
        assert!(text.contains("• Установка счетчика: Да"));
    }
}
