use dialog_flow::parse::{self, Keywords};
use dialog_flow::{Answer, Answers, AnswersExt, Calculation, Calculator, Result, Step};
use serde::{Deserialize, Serialize};

use super::{
    COMPLEXITY_DIGITS_3, COMPLEXITY_KEYWORDS, PROPERTY_KEYWORDS, PROPERTY_TYPE_STEP, WALL_KEYWORDS,
    WALL_MATERIAL_STEP, parse_choice, parse_complexity, parse_count,
};
use crate::pricing::{
    self, COMPLEXITY_COEFFICIENTS, COMPLEXITY_NAMES, PROPERTY_TYPE_NAMES, SOCKET_DEVICE_NAMES,
    SOCKET_PRICES, WALL_MATERIAL_COEFFICIENTS, WALL_MATERIAL_NAMES,
};

/// Minimum order for socket and switch installation.
pub const MIN_PRICE: i64 = 2000;

const STEPS: &[Step] = &[
    PROPERTY_TYPE_STEP,
    WALL_MATERIAL_STEP,
    Step::new(
        "socket_singles",
        "Сколько требуется одинарных розеток? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "socket_doubles",
        "Сколько требуется двойных розеток? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "socket_power",
        "Сколько требуется силовых розеток? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "switch_singles",
        "Сколько требуется одноклавишных выключателей? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "switch_doubles",
        "Сколько требуется двухклавишных выключателей? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "other_devices",
        "Выберите дополнительные устройства (можно выбрать несколько, введите номера через \
         запятую):\n1. Диммер\n2. ТВ розетка\n3. Интернет розетка\n4. Телефонная розетка\n\
         5. USB розетка\n0. Не требуются",
    ),
    Step::new(
        "complexity",
        "Выберите сложность монтажа:\n1. Простой монтаж (стандартное расположение)\n\
         2. Стандартная сложность\n\
         3. Сложный монтаж (нестандартное расположение, дополнительные работы)",
    ),
];

/// Count steps and the device each one prices.
const COUNTED_DEVICES: &[(&str, &str)] = &[
    ("socket_singles", "socket_single"),
    ("socket_doubles", "socket_double"),
    ("socket_power", "socket_power"),
    ("switch_singles", "switch_single"),
    ("switch_doubles", "switch_double"),
];

const EXTRA_DEVICES: &Keywords = &[
    ("1", "dimmer"),
    ("2", "tv_socket"),
    ("3", "network_socket"),
    ("4", "phone_socket"),
    ("5", "usb_socket"),
];

const EXTRA_DEVICE_WORDS: &Keywords = &[
    ("диммер", "dimmer"),
    ("тв", "tv_socket"),
    ("телевиз", "tv_socket"),
    ("интернет", "network_socket"),
    ("телефон", "phone_socket"),
    ("usb", "usb_socket"),
];

const EXTRA_DEVICE_LABELS: &[(&str, &str)] = &[
    ("dimmer", "Диммер"),
    ("tv_socket", "ТВ розетка"),
    ("network_socket", "Интернет розетка"),
    ("phone_socket", "Телефонная розетка"),
    ("usb_socket", "USB розетка"),
];

const NONE_WORDS: &[&str] = &["не треб", "нет"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLine {
    pub device: String,
    pub count: u32,
    pub price_per_unit: i64,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketQuote {
    pub property_type: String,
    pub wall_material: String,
    pub complexity: String,
    pub device_prices: Vec<DeviceLine>,
    pub devices_total: u32,
    pub complexity_coefficient: f64,
    pub wall_coefficient: f64,
    pub total_price: i64,
}

/// Installation of sockets and switches.
pub struct SocketCalculator;

impl Calculator for SocketCalculator {
    fn id(&self) -> &str {
        "socket"
    }

    fn name(&self) -> &str {
        "Монтаж розеток и выключателей"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "property_type" => parse_choice(step, input, PROPERTY_KEYWORDS),
            "wall_material" => parse_choice(step, input, WALL_KEYWORDS),
            "other_devices" => Ok(Answer::Selection(parse::parse_selection(
                input,
                EXTRA_DEVICES,
                EXTRA_DEVICE_WORDS,
                NONE_WORDS,
            ))),
            "complexity" => Ok(parse_complexity(input, COMPLEXITY_DIGITS_3, COMPLEXITY_KEYWORDS)),
            _ => parse_count(step, input),
        }
    }

    fn acknowledge(&self, step: &Step, answers: &Answers) -> Option<String> {
        if step.key != "other_devices" {
            return None;
        }
        let selected = answers.selection("other_devices");
        if selected.is_empty() {
            return Some("Дополнительные устройства не выбраны.".to_string());
        }
        let names: Vec<&str> = selected
            .iter()
            .map(|code| pricing::display_name(EXTRA_DEVICE_LABELS, code))
            .collect();
        Some(format!("Выбраны дополнительные устройства: {}", names.join(", ")))
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let property_type = answers.require_choice("property_type")?;
        let wall_material = answers.require_choice("wall_material")?;
        let complexity = answers.choice_or("complexity", "standard");

        pricing::ensure_known(PROPERTY_TYPE_NAMES, "property_type", property_type)?;
        let wall_coefficient =
            pricing::coefficient(WALL_MATERIAL_COEFFICIENTS, "wall_material", wall_material)?;
        let complexity_coefficient =
            pricing::coefficient(COMPLEXITY_COEFFICIENTS, "complexity", complexity)?;

        let mut devices: Vec<(String, u32)> = COUNTED_DEVICES
            .iter()
            .map(|(key, device)| (device.to_string(), answers.count_or(key, 0)))
            .collect();
        devices.extend(answers.selection("other_devices").into_iter().map(|code| (code, 1)));

        let mut device_prices = Vec::new();
        for (device, count) in devices.into_iter().filter(|(_, count)| *count > 0) {
            let price_per_unit = pricing::price(SOCKET_PRICES, "device", &device)?;
            device_prices.push(DeviceLine {
                device,
                count,
                price_per_unit,
                total_price: price_per_unit * i64::from(count),
            });
        }

        let subtotal: i64 = device_prices.iter().map(|line| line.total_price).sum();
        let total =
            pricing::round_price(subtotal as f64 * complexity_coefficient * wall_coefficient);

        let quote = SocketQuote {
            property_type: property_type.to_string(),
            wall_material: wall_material.to_string(),
            complexity: complexity.to_string(),
            devices_total: device_prices
                .iter()
                .fold(0u32, |sum, line| sum.saturating_add(line.count)),
            device_prices,
            complexity_coefficient,
            wall_coefficient,
            total_price: total.max(MIN_PRICE),
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: SocketQuote = calculation.breakdown()?;

        let mut text = String::from("🔌 Расчет стоимости монтажа розеток и выключателей:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Материал стен: {}\n• Сложность монтажа: {}\n\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, &quote.property_type),
            pricing::display_name(WALL_MATERIAL_NAMES, &quote.wall_material),
            pricing::display_name(COMPLEXITY_NAMES, &quote.complexity),
        ));

        text.push_str("Устройства:\n");
        for line in &quote.device_prices {
            text.push_str(&format!(
                "• {}: {} шт. x {} руб. = {} руб.\n",
                pricing::display_name(SOCKET_DEVICE_NAMES, &line.device),
                line.count,
                line.price_per_unit,
                line.total_price
            ));
        }
        text.push_str(&format!("\nВсего устройств: {} шт. 💡\n", quote.devices_total));
        text.push_str(&format!("\n💰 Общая стоимость монтажа: {} руб.\n", quote.total_price));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка стоимости монтажа розеток и выключателей. \
             Точная стоимость определяется после выезда специалиста на объект и уточнения деталей \
             заказа. Цена может измениться в зависимости от сложности работ и других особенностей \
             объекта.",
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_flow::FlowError;

    fn answers(pairs: &[(&str, Answer)]) -> Answers {
        pairs
            .iter()
            .map(|(key, answer)| (key.to_string(), answer.clone()))
            .collect()
    }

    fn base() -> Answers {
        answers(&[
            ("property_type", Answer::choice("apartment")),
            ("wall_material", Answer::choice("brick")),
            ("socket_singles", Answer::Count(5)),
            ("switch_singles", Answer::Count(2)),
            ("complexity", Answer::choice("standard")),
        ])
    }

    #[test]
    fn total_is_priced_devices_times_coefficients() {
        let calculation = SocketCalculator.calculate(&base()).unwrap();
        // (5 × 350 + 2 × 300) × 1.0 × 1.2
        assert_eq!(calculation.total_price(), 2820);
        assert_eq!(calculation.values["price"], 2820);

        let quote: SocketQuote = calculation.breakdown().unwrap();
        assert_eq!(quote.devices_total, 7);
        assert_eq!(quote.device_prices.len(), 2);
    }

    #[test]
    fn small_orders_are_raised_to_the_floor() {
        let mut answers = base();
        answers.insert("socket_singles".to_string(), Answer::Count(1));
        answers.insert("switch_singles".to_string(), Answer::Count(0));
        let calculation = SocketCalculator.calculate(&answers).unwrap();
        assert_eq!(calculation.total_price(), MIN_PRICE);

        let nothing = answers_without_devices();
        assert_eq!(SocketCalculator.calculate(&nothing).unwrap().total_price(), MIN_PRICE);
    }

    fn answers_without_devices() -> Answers {
        answers(&[
            ("property_type", Answer::choice("office")),
            ("wall_material", Answer::choice("drywall")),
        ])
    }

    #[test]
    fn extra_devices_are_added_once_each() {
        let mut answers = base();
        answers.insert(
            "other_devices".to_string(),
            Answer::Selection(vec!["dimmer".to_string(), "usb_socket".to_string()]),
        );
        let calculation = SocketCalculator.calculate(&answers).unwrap();
        // (1750 + 600 + 600 + 550) × 1.2
        assert_eq!(calculation.total_price(), 4200);
    }

    #[test]
    fn missing_and_unknown_codes_are_reported() {
        let err = SocketCalculator.calculate(&Answers::new()).unwrap_err();
        assert!(matches!(err, FlowError::MissingParameter(key) if key == "property_type"));

        let mut answers = base();
        answers.insert("wall_material".to_string(), Answer::choice("glass"));
        let err = SocketCalculator.calculate(&answers).unwrap_err();
        assert!(matches!(err, FlowError::UnknownCategory { .. }));
    }

    #[test]
    fn none_answer_to_extras_is_an_empty_selection() {
        let step = STEPS[7];
        assert_eq!(SocketCalculator.parse(&step, "0").unwrap(), Answer::Selection(vec![]));
        assert_eq!(
            SocketCalculator.parse(&step, "не требуются").unwrap(),
            Answer::Selection(vec![])
        );
        let ack = SocketCalculator.acknowledge(&step, &Answers::new()).unwrap();
        assert_eq!(ack, "Дополнительные устройства не выбраны.");
    }

    #[test]
    fn huge_counts_are_re_asked_and_never_overflow() {
        let step = STEPS.iter().find(|step| step.key == "socket_singles").unwrap();
        assert!(SocketCalculator.parse(step, "4000000000").is_err());

        let mut answers = base();
        for (key, _) in COUNTED_DEVICES {
            answers.insert(key.to_string(), Answer::Count(u32::MAX));
        }
        let quote: SocketQuote = SocketCalculator.calculate(&answers).unwrap().breakdown().unwrap();
        assert_eq!(quote.devices_total, u32::MAX);
        assert!(quote.total_price > MIN_PRICE);
    }

    #[test]
    fn format_lists_devices_and_total() {
        let calculation = SocketCalculator.calculate(&base()).unwrap();
        let text = SocketCalculator.format(&calculation).unwrap();
        assert!(text.contains("• Тип объекта: Квартира"));
        assert!(text.contains("• розетка одинарная: 5 шт. x 350 руб. = 1750 руб."));
        assert!(text.contains("Всего устройств: 7 шт."));
        assert!(text.contains("Общая стоимость монтажа: 2820 руб."));
    }
}
