use dialog_flow::parse::{self, Keywords};
use dialog_flow::{Answer, Answers, AnswersExt, Calculation, Calculator, FlowError, Result, Step};
use serde::{Deserialize, Serialize};

use super::{
    COMPLEXITY_DIGITS_3, COMPLEXITY_KEYWORDS, PROPERTY_KEYWORDS, PROPERTY_TYPE_STEP, WALL_KEYWORDS,
    WALL_MATERIAL_STEP, format_area, parse_choice, parse_complexity, parse_measure,
    parse_optional_measure,
};
use crate::pricing::{
    self, CABLE_SECTION_COEFFICIENTS, CABLING_PRICES, CABLING_TYPE_NAMES, COMPLEXITY_COEFFICIENTS,
    COMPLEXITY_NAMES, MIN_AREAS, PROPERTY_TYPE_NAMES, WALL_MATERIAL_COEFFICIENTS,
    WALL_MATERIAL_NAMES,
};

const STEPS: &[Step] = &[
    PROPERTY_TYPE_STEP,
    Step::new("area", "Укажите площадь помещения в квадратных метрах:"),
    WALL_MATERIAL_STEP,
    Step::new(
        "cabling_type",
        "Выберите тип прокладки кабеля:\n1. Открытая проводка\n2. Скрытая проводка\n\
         3. Проводка в кабель-канале\n4. Проводка в гофре\n5. Подземная прокладка\n\
         6. Воздушная прокладка",
    ),
    Step::new(
        "cable_length",
        "Укажите примерную длину кабеля в метрах (если неизвестно, оставьте пустым):",
    ),
    Step::new(
        "cable_section",
        "Выберите сечение кабеля:\n1. 1.5 мм²\n2. 2.5 мм²\n3. 4.0 мм²\n4. 6.0 мм²\n5. 10.0 мм²",
    ),
    Step::new(
        "complexity",
        "Выберите сложность прокладки кабеля:\n\
         1. Простой монтаж (прямые пути, хороший доступ)\n2. Стандартная сложность\n\
         3. Сложный монтаж (труднодоступные места, препятствия)",
    ),
];

const CABLING_KEYWORDS: &Keywords = &[
    ("1", "open"),
    ("открыт", "open"),
    ("2", "hidden"),
    ("скрыт", "hidden"),
    ("3", "cable_channel"),
    ("канал", "cable_channel"),
    ("короб", "cable_channel"),
    ("4", "corrugation"),
    ("гофр", "corrugation"),
    ("5", "ground"),
    ("подземн", "ground"),
    ("земл", "ground"),
    ("6", "overhead"),
    ("воздуш", "overhead"),
];

/// Menu ordinal to cross-section in mm².
const SECTION_ORDINALS: &[(&str, f64)] = &[
    ("1", 1.5),
    ("2", 2.5),
    ("3", 4.0),
    ("4", 6.0),
    ("5", 10.0),
];

/// Cable length per square metre when the user does not know it.
const HIDDEN_LENGTH_FACTOR: f64 = 1.2;
const OPEN_LENGTH_FACTOR: f64 = 0.8;

/// A lone menu digit is an ordinal; anything else must name a listed section.
fn parse_section(step: &Step, input: &str) -> Result<Answer> {
    let trimmed = input.trim();
    if let Some((_, section)) = SECTION_ORDINALS.iter().find(|(digit, _)| *digit == trimmed) {
        return Ok(Answer::Measure(*section));
    }
    parse::parse_decimal(trimmed)
        .filter(|value| {
            CABLE_SECTION_COEFFICIENTS
                .iter()
                .any(|(section, _)| (section - value).abs() < f64::EPSILON)
        })
        .map(Answer::Measure)
        .ok_or_else(|| FlowError::parse_failure(step.key))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CablingQuote {
    pub property_type: String,
    pub area: f64,
    pub wall_material: String,
    pub cabling_type: String,
    pub cable_length: f64,
    pub cable_section: f64,
    pub complexity: String,
    pub price_per_meter: i64,
    pub total_price: i64,
}

/// Cable and wiring runs.
pub struct CablingCalculator;

impl Calculator for CablingCalculator {
    fn id(&self) -> &str {
        "cabling"
    }

    fn name(&self) -> &str {
        "Прокладка кабеля и проводки"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "property_type" => parse_choice(step, input, PROPERTY_KEYWORDS),
            "area" => parse_measure(step, input),
            "wall_material" => parse_choice(step, input, WALL_KEYWORDS),
            "cabling_type" => parse_choice(step, input, CABLING_KEYWORDS),
            "cable_length" => parse_optional_measure(step, input),
            "cable_section" => parse_section(step, input),
            "complexity" => Ok(parse_complexity(input, COMPLEXITY_DIGITS_3, COMPLEXITY_KEYWORDS)),
            _ => Err(FlowError::parse_failure(step.key)),
        }
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let property_type = answers.require_choice("property_type")?;
        let wall_material = answers.require_choice("wall_material")?;
        let cabling_type = answers.require_choice("cabling_type")?;
        let area = answers.require_measure("area")?;
        let cable_section = answers.measure("cable_section").unwrap_or(2.5);
        let complexity = answers.choice_or("complexity", "standard");

        let min_area = pricing::coefficient(MIN_AREAS, "property_type", property_type)?;
        let wall =
            pricing::coefficient(WALL_MATERIAL_COEFFICIENTS, "wall_material", wall_material)?;
        let complexity_coefficient =
            pricing::coefficient(COMPLEXITY_COEFFICIENTS, "complexity", complexity)?;
        let price_per_meter = pricing::price(CABLING_PRICES, "cabling_type", cabling_type)?;
        let section = pricing::section_coefficient(cable_section)?;

        let area = area.max(min_area);
        let cable_length = match answers.measure("cable_length") {
            Some(length) => length,
            None if cabling_type == "hidden" => area * HIDDEN_LENGTH_FACTOR,
            None => area * OPEN_LENGTH_FACTOR,
        };
        let price =
            cable_length * price_per_meter as f64 * complexity_coefficient * wall * section;

        let quote = CablingQuote {
            property_type: property_type.to_string(),
            area,
            wall_material: wall_material.to_string(),
            cabling_type: cabling_type.to_string(),
            cable_length,
            cable_section,
            complexity: complexity.to_string(),
            price_per_meter,
            total_price: pricing::round_price(price),
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: CablingQuote = calculation.breakdown()?;

        let mut text = String::from("📋 Расчет стоимости прокладки кабеля и проводки:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Площадь: {} кв.м\n• Материал стен: {}\n\
             • Тип прокладки кабеля: {}\n• Примерная длина кабеля: {} м\n\
             • Сечение кабеля: {:.1} мм²\n• Сложность монтажа: {}\n\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, &quote.property_type),
            format_area(quote.area),
            pricing::display_name(WALL_MATERIAL_NAMES, &quote.wall_material),
            pricing::display_name(CABLING_TYPE_NAMES, &quote.cabling_type),
            quote.cable_length.round(),
            quote.cable_section,
            pricing::display_name(COMPLEXITY_NAMES, &quote.complexity),
        ));
        text.push_str(&format!(
            "• Базовая стоимость за метр: {} руб.\n• Общая стоимость: {} руб.\n",
            quote.price_per_meter, quote.total_price
        ));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка стоимости прокладки кабеля. Для более \
             точного расчета необходим выезд специалиста на объект для оценки фактических условий \
             работы. Окончательная стоимость может отличаться в зависимости от особенностей объекта \
             и дополнительных работ.",
        );
        Ok(text)
    }
}
