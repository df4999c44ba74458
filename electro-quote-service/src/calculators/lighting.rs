use dialog_flow::parse::Keywords;
use dialog_flow::{Answer, Answers, AnswersExt, Calculation, Calculator, Result, Step};
use serde::{Deserialize, Serialize};

use super::{
    COMPLEXITY_DIGITS_4, COMPLEXITY_KEYWORDS, PROPERTY_KEYWORDS, PROPERTY_TYPE_STEP, WALL_KEYWORDS,
    WALL_MATERIAL_STEP, parse_choice, parse_complexity, parse_count, parse_measure,
};
use crate::pricing::{
    self, CEILING_TYPE_COEFFICIENTS, CEILING_TYPE_NAMES, COMPLEXITY_COEFFICIENTS, COMPLEXITY_NAMES,
    LIGHTING_NAMES, LIGHTING_PRICES, PROPERTY_TYPE_NAMES, WALL_MATERIAL_COEFFICIENTS,
    WALL_MATERIAL_NAMES,
};

const DEFAULT_CEILING_HEIGHT: f64 = 2.7;

const STEPS: &[Step] = &[
    PROPERTY_TYPE_STEP,
    WALL_MATERIAL_STEP,
    Step::new("ceiling_height", "Укажите высоту потолков в метрах:"),
    Step::new(
        "ceiling_type",
        "Выберите тип потолка:\n1. Обычный (бетонная плита)\n2. Гипсокартонный\n3. Натяжной\n\
         4. Подвесной (Армстронг и т.п.)",
    ),
    Step::new("light_fixtures", "Сколько всего светильников нужно установить?"),
    Step::new(
        "chandelier",
        "Сколько люстр или подвесных светильников нужно установить? (введите число или 0 если \
         не требуются):",
    ),
    Step::new(
        "spot_lights",
        "Сколько точечных светильников нужно установить? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "wall_lights",
        "Сколько настенных светильников нужно установить? (введите число или 0 если не требуются):",
    ),
    Step::new(
        "complexity",
        "Выберите сложность монтажа:\n1. Простой монтаж (стандартное расположение)\n\
         2. Стандартная сложность\n\
         3. Сложный монтаж (нестандартное расположение, дополнительные работы)\n\
         4. Очень сложный монтаж (фигурные потолки, сложная схема подключения)",
    ),
];

const CEILING_KEYWORDS: &Keywords = &[
    ("1", "regular"),
    ("обычн", "regular"),
    ("бетон", "regular"),
    ("2", "drywall"),
    ("гипсокартон", "drywall"),
    ("3", "stretch"),
    ("натяжн", "stretch"),
    ("4", "suspended"),
    ("подвесн", "suspended"),
    ("армстронг", "suspended"),
];

/// Count steps and the fixture each one prices.
const FIXTURES: &[(&str, &str)] = &[
    ("chandelier", "chandelier"),
    ("spot_lights", "spot_light"),
    ("wall_lights", "wall_light"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureLine {
    pub fixture: String,
    pub count: u32,
    pub price_per_unit: i64,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingQuote {
    pub property_type: String,
    pub wall_material: String,
    pub ceiling_type: String,
    pub ceiling_height: f64,
    pub complexity: String,
    pub total_lights: u32,
    pub fixture_prices: Vec<FixtureLine>,
    pub height_coefficient: f64,
    pub ceiling_coefficient: f64,
    pub total_price: i64,
}

fn height_coefficient(height: f64) -> f64 {
    if height > 3.0 {
        1.3
    } else if height > 2.7 {
        1.15
    } else {
        1.0
    }
}

/// Installation of light fixtures.
pub struct LightingCalculator;

impl Calculator for LightingCalculator {
    fn id(&self) -> &str {
        "lighting"
    }

    fn name(&self) -> &str {
        "Монтаж освещения"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "property_type" => parse_choice(step, input, PROPERTY_KEYWORDS),
            "wall_material" => parse_choice(step, input, WALL_KEYWORDS),
            "ceiling_height" => parse_measure(step, input),
            "ceiling_type" => parse_choice(step, input, CEILING_KEYWORDS),
            "complexity" => Ok(parse_complexity(input, COMPLEXITY_DIGITS_4, COMPLEXITY_KEYWORDS)),
            _ => parse_count(step, input),
        }
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let property_type = answers.require_choice("property_type")?;
        let wall_material = answers.require_choice("wall_material")?;
        let ceiling_type = answers.choice_or("ceiling_type", "regular");
        let complexity = answers.choice_or("complexity", "standard");
        let ceiling_height = answers
            .measure("ceiling_height")
            .unwrap_or(DEFAULT_CEILING_HEIGHT);

        pricing::ensure_known(PROPERTY_TYPE_NAMES, "property_type", property_type)?;
        let wall =
            pricing::coefficient(WALL_MATERIAL_COEFFICIENTS, "wall_material", wall_material)?;
        let ceiling =
            pricing::coefficient(CEILING_TYPE_COEFFICIENTS, "ceiling_type", ceiling_type)?;
        let complexity_coefficient =
            pricing::coefficient(COMPLEXITY_COEFFICIENTS, "complexity", complexity)?;
        let height = height_coefficient(ceiling_height);
        let multiplier = complexity_coefficient * wall * height * ceiling;

        let mut fixture_prices = Vec::new();
        let mut total = 0.0;
        for (key, fixture) in FIXTURES {
            let count = answers.count_or(key, 0);
            if count == 0 {
                continue;
            }
            let price_per_unit = pricing::price(LIGHTING_PRICES, "fixture", fixture)?;
            let line = price_per_unit as f64 * f64::from(count) * multiplier;
            total += line;
            fixture_prices.push(FixtureLine {
                fixture: fixture.to_string(),
                count,
                price_per_unit,
                total_price: pricing::round_price(line),
            });
        }

        let itemised = fixture_prices
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.count));
        let total_lights = match answers.count_or("light_fixtures", 0) {
            0 => itemised,
            n => n,
        };

        if fixture_prices.is_empty() && total_lights > 0 {
            let price_per_unit = pricing::price(LIGHTING_PRICES, "fixture", "spot_light")?;
            let line = price_per_unit as f64 * f64::from(total_lights) * multiplier;
            total += line;
            fixture_prices.push(FixtureLine {
                fixture: "general".to_string(),
                count: total_lights,
                price_per_unit,
                total_price: pricing::round_price(line),
            });
        }

        let quote = LightingQuote {
            property_type: property_type.to_string(),
            wall_material: wall_material.to_string(),
            ceiling_type: ceiling_type.to_string(),
            ceiling_height,
            complexity: complexity.to_string(),
            total_lights,
            fixture_prices,
            height_coefficient: height,
            ceiling_coefficient: ceiling,
            total_price: pricing::round_price(total),
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: LightingQuote = calculation.breakdown()?;

        let mut text = String::from("📋 Расчет стоимости монтажа освещения:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Материал стен: {}\n• Тип потолка: {}\n• Высота потолков: {} м\n\
             • Сложность монтажа: {}\n\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, &quote.property_type),
            pricing::display_name(WALL_MATERIAL_NAMES, &quote.wall_material),
            pricing::display_name(CEILING_TYPE_NAMES, &quote.ceiling_type),
            quote.ceiling_height,
            pricing::display_name(COMPLEXITY_NAMES, &quote.complexity),
        ));

        if quote.fixture_prices.is_empty() {
            text.push_str("Светильники не выбраны.\n");
        } else {
            text.push_str("Светильники:\n");
            for line in &quote.fixture_prices {
                text.push_str(&format!(
                    "• {}: {} шт. x {} руб. = {} руб.\n",
                    pricing::display_name(LIGHTING_NAMES, &line.fixture),
                    line.count,
                    line.price_per_unit,
                    line.total_price
                ));
            }
            text.push_str(&format!("\nВсего светильников: {} шт.\n", quote.total_lights));
        }

        text.push_str(&format!("\n💰 Общая стоимость монтажа: {} руб.\n", quote.total_price));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка стоимости монтажа освещения. Точная \
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
            ("property_type", Answer::choice("apartment")),
            ("wall_material", Answer::choice("wood")),
            ("ceiling_height", Answer::Measure(2.5)),
            ("ceiling_type", Answer::choice("regular")),
            ("complexity", Answer::choice("standard")),
        ]
        .into_iter()
        .map(|(key, answer)| (key.to_string(), answer))
        .collect()
    }

    #[test]
    fn fixtures_are_priced_per_line() {
        let mut answers = base();
        answers.insert("chandelier".to_string(), Answer::Count(2));
        answers.insert("spot_lights".to_string(), Answer::Count(10));
        let calculation = LightingCalculator.calculate(&answers).unwrap();

        assert_eq!(calculation.total_price(), 2 * 1500 + 10 * 600);
        let quote: LightingQuote = calculation.breakdown().unwrap();
        assert_eq!(quote.total_lights, 12);
    }

    #[test]
    fn high_stretch_ceiling_raises_the_price() {
        let mut answers = base();
        answers.insert("ceiling_height".to_string(), Answer::Measure(3.2));
        answers.insert("ceiling_type".to_string(), Answer::choice("stretch"));
        answers.insert("wall_lights".to_string(), Answer::Count(1));
        let calculation = LightingCalculator.calculate(&answers).unwrap();
        // 900 × 1.3 × 1.1
        assert_eq!(calculation.total_price(), 1287);
    }

    #[test]
    fn total_count_without_breakdown_uses_general_line() {
        let mut answers = base();
        answers.insert("light_fixtures".to_string(), Answer::Count(4));
        let calculation = LightingCalculator.calculate(&answers).unwrap();
        assert_eq!(calculation.total_price(), 2400);

        let text = LightingCalculator.format(&calculation).unwrap();
        assert!(text.contains("• Светильники: 4 шт. x 600 руб. = 2400 руб."));
    }

    #[test]
    fn huge_counts_are_re_asked_and_never_overflow() {
        let step = STEPS.iter().find(|step| step.key == "spot_lights").unwrap();
        assert!(LightingCalculator.parse(step, "4000000000").is_err());

        let mut answers = base();
        for (key, _) in FIXTURES {
            answers.insert(key.to_string(), Answer::Count(u32::MAX));
        }
        let calculation = LightingCalculator.calculate(&answers).unwrap();
        let quote: LightingQuote = calculation.breakdown().unwrap();
        assert_eq!(quote.total_lights, u32::MAX);
        assert!(quote.total_price > 0);
    }

    #[test]
    fn no_fixtures_formats_without_lines() {
        let calculation = LightingCalculator.calculate(&base()).unwrap();
        assert_eq!(calculation.total_price(), 0);
        let text = LightingCalculator.format(&calculation).unwrap();
        assert!(text.contains("Светильники не выбраны."));
    }

    #[test]
    fn ceiling_keywords_are_understood() {
        let step = STEPS[3];
        assert_eq!(LightingCalculator.parse(&step, "натяжной").unwrap(), Answer::choice("stretch"));
        assert_eq!(LightingCalculator.parse(&step, "4").unwrap(), Answer::choice("suspended"));
        assert!(LightingCalculator.parse(&step, "деревянный").is_err());
    }
}
