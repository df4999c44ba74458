use dialog_flow::parse::{self, Keywords};
use dialog_flow::{Answer, Answers, AnswersExt, Calculation, Calculator, FlowError, Result, Step};
use serde::{Deserialize, Serialize};

use super::{format_area, parse_choice, parse_complexity, parse_measure, parse_optional_measure};
use crate::pricing::{
    self, AREA_RATES, COMPLEXITY_COEFFICIENTS, COMPLEXITY_NAMES, INDUSTRIAL_EQUIPMENT_NAMES,
    INDUSTRIAL_EQUIPMENT_PRICES, INDUSTRIAL_TYPE_COEFFICIENTS, INDUSTRIAL_TYPE_NAMES, MIN_AREAS,
    POWER_CABLE_PRICE, POWER_COEFFICIENTS, POWER_NAMES,
};

const STEPS: &[Step] = &[
    Step::new(
        "industrial_type",
        "Выберите тип промышленного объекта:\n1. Производственный цех\n2. Склад\n\
         3. Лаборатория\n4. Завод/крупное предприятие\n5. Логистический центр",
    ),
    Step::new("area", "Укажите площадь объекта в квадратных метрах:"),
    Step::new(
        "power",
        "Выберите потребляемую мощность объекта:\n1. До 50 кВт\n2. От 50 до 150 кВт\n\
         3. От 150 до 400 кВт\n4. Более 400 кВт",
    ),
    Step::new(
        "equipment",
        "Выберите необходимое оборудование (можно выбрать несколько, введите номера через \
         запятую):\n1. Трансформаторная подстанция\n2. Распределительный щит\n\
         3. Резервный генератор\n4. Система бесперебойного питания (ИБП)\n5. Система заземления\n\
         6. Система молниезащиты\n7. Система автоматизации\n0. Ничего из вышеперечисленного",
    ),
    Step::new(
        "complexity",
        "Выберите сложность монтажа:\n1. Стандартная сложность\n\
         2. Повышенная сложность (специфические требования)\n\
         3. Высокая сложность (особые условия, специальное оборудование)",
    ),
    Step::new(
        "power_cable_length",
        "Укажите примерную длину силового кабеля в метрах (если неизвестно, оставьте пустым):",
    ),
];

const TYPE_KEYWORDS: &Keywords = &[
    ("1", "workshop"),
    ("цех", "workshop"),
    ("производств", "workshop"),
    ("2", "warehouse"),
    ("склад", "warehouse"),
    ("3", "laboratory"),
    ("лаборатор", "laboratory"),
    ("4", "plant"),
    ("завод", "plant"),
    ("предприя", "plant"),
    ("5", "logistics"),
    ("логистич", "logistics"),
];

// Phrases before digits: "от 150 до 400" contains "1".
const POWER_KEYWORDS: &Keywords = &[
    ("более 400", "400_plus"),
    ("выше 400", "400_plus"),
    ("от 150 до 400", "150_to_400"),
    ("от 50 до 150", "50_to_150"),
    ("до 50", "up_to_50"),
    ("1", "up_to_50"),
    ("2", "50_to_150"),
    ("3", "150_to_400"),
    ("4", "400_plus"),
];

const COMPLEXITY_DIGITS: &Keywords = &[("1", "standard"), ("2", "complex"), ("3", "very_complex")];
const COMPLEXITY_WORDS: &Keywords = &[
    ("стандарт", "standard"),
    ("повышен", "complex"),
    ("специфич", "complex"),
    ("высок", "very_complex"),
    ("особ", "very_complex"),
];

const EQUIPMENT: &Keywords = &[
    ("1", "transformer"),
    ("2", "distribution_panel"),
    ("3", "standby_generator"),
    ("4", "ups"),
    ("5", "grounding"),
    ("6", "lightning_protection"),
    ("7", "automation"),
];

const EQUIPMENT_WORDS: &Keywords = &[
    ("трансформатор", "transformer"),
    ("подстанц", "transformer"),
    ("распредел", "distribution_panel"),
    ("щит", "distribution_panel"),
    ("генератор", "standby_generator"),
    ("резерв", "standby_generator"),
    ("ибп", "ups"),
    ("бесперебой", "ups"),
    ("заземлен", "grounding"),
    ("земл", "grounding"),
    ("молни", "lightning_protection"),
    ("грозо", "lightning_protection"),
    ("автоматиз", "automation"),
    ("автоматик", "automation"),
];

const NONE_WORDS: &[&str] = &["ничего", "нет"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub equipment: String,
    pub price: i64,
    /// Metres, for equipment priced per metre.
    pub length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustrialQuote {
    pub industrial_type: String,
    pub area: f64,
    pub power: String,
    pub complexity: String,
    pub equipment: Vec<EquipmentLine>,
    pub base_price: i64,
    pub equipment_price: i64,
    pub total_price: i64,
}

/// Power supply for industrial sites.
pub struct IndustrialCalculator;

impl Calculator for IndustrialCalculator {
    fn id(&self) -> &str {
        "industrial"
    }

    fn name(&self) -> &str {
        "Электроснабжение промышленных объектов"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "industrial_type" => parse_choice(step, input, TYPE_KEYWORDS),
            "area" => parse_measure(step, input),
            "power" => parse_choice(step, input, POWER_KEYWORDS),
            "equipment" => Ok(Answer::Selection(parse::parse_selection(
                input,
                EQUIPMENT,
                EQUIPMENT_WORDS,
                NONE_WORDS,
            ))),
            "complexity" => Ok(parse_complexity(input, COMPLEXITY_DIGITS, COMPLEXITY_WORDS)),
            "power_cable_length" => parse_optional_measure(step, input),
            _ => Err(FlowError::parse_failure(step.key)),
        }
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let industrial_type = answers.require_choice("industrial_type")?;
        let area = answers.require_measure("area")?;
        let power = answers.require_choice("power")?;
        let complexity = answers.choice_or("complexity", "standard");

        let type_coefficient =
            pricing::coefficient(INDUSTRIAL_TYPE_COEFFICIENTS, "industrial_type", industrial_type)?;
        let power_coefficient = pricing::coefficient(POWER_COEFFICIENTS, "power", power)?;
        let complexity_coefficient =
            pricing::coefficient(COMPLEXITY_COEFFICIENTS, "complexity", complexity)?;
        let rate = pricing::price(AREA_RATES, "property_type", "industrial")?;
        let min_area = pricing::coefficient(MIN_AREAS, "property_type", "industrial")?;

        let area = area.max(min_area);
        let base_price = pricing::round_price(
            area * rate as f64 * type_coefficient * power_coefficient * complexity_coefficient,
        );

        let mut equipment = Vec::new();
        for code in answers.selection("equipment") {
            let price = pricing::price(INDUSTRIAL_EQUIPMENT_PRICES, "equipment", &code)?;
            equipment.push(EquipmentLine {
                equipment: code,
                price,
                length: None,
            });
        }
        if let Some(length) = answers.measure("power_cable_length") {
            equipment.push(EquipmentLine {
                equipment: "power_cable".to_string(),
                price: pricing::round_price(POWER_CABLE_PRICE as f64 * length),
                length: Some(length),
            });
        }
        let equipment_price: i64 = equipment.iter().map(|line| line.price).sum();

        let quote = IndustrialQuote {
            industrial_type: industrial_type.to_string(),
            area,
            power: power.to_string(),
            complexity: complexity.to_string(),
            equipment,
            base_price,
            equipment_price,
            total_price: base_price + equipment_price,
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: IndustrialQuote = calculation.breakdown()?;

        let mut text =
            String::from("📋 Расчет стоимости электроснабжения промышленного объекта:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Площадь: {} кв.м\n• Потребляемая мощность: {}\n\
             • Сложность монтажа: {}\n",
            pricing::display_name(INDUSTRIAL_TYPE_NAMES, &quote.industrial_type),
            format_area(quote.area),
            pricing::display_name(POWER_NAMES, &quote.power),
            pricing::display_name(COMPLEXITY_NAMES, &quote.complexity),
        ));

        if !quote.equipment.is_empty() {
            text.push_str("\nВыбранное оборудование:\n");
            for line in &quote.equipment {
                let name = pricing::display_name(INDUSTRIAL_EQUIPMENT_NAMES, &line.equipment);
                match line.length {
                    Some(length) => text.push_str(&format!(
                        "• {name} ({} м): {} руб.\n",
                        format_area(length),
                        line.price
                    )),
                    None => text.push_str(&format!("• {name}: {} руб.\n", line.price)),
                }
            }
        }

        text.push_str(&format!("\n• Базовая стоимость работ: {} руб.\n", quote.base_price));
        if quote.equipment_price > 0 {
            text.push_str(&format!("• Стоимость оборудования: {} руб.\n", quote.equipment_price));
        }
        text.push_str(&format!("• Общая стоимость: {} руб.\n", quote.total_price));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка стоимости электроснабжения промышленного \
             объекта. Для составления точной сметы необходим выезд специалистов на объект, изучение \
             документации и проведение технического обследования. Окончательная стоимость может \
             существенно отличаться в зависимости от особенностей объекта, требований к \
             электроснабжению и других факторов.",
        );
        Ok(text)
    }
}
