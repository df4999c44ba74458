use dialog_flow::parse::{self, Keywords};
use dialog_flow::{Answer, Answers, AnswersExt, Calculation, Calculator, FlowError, Result, Step};
use serde::{Deserialize, Serialize};

use super::{
    COMPLEXITY_DIGITS_3, COMPLEXITY_KEYWORDS, PROPERTY_KEYWORDS, PROPERTY_TYPE_STEP, format_area,
    parse_choice, parse_complexity, parse_flag, parse_measure,
};
use crate::pricing::{
    self, AREA_RATES, COMPLEXITY_COEFFICIENTS, COMPLEXITY_NAMES, DESIGN_COMPLEXITY_COEFFICIENTS,
    DESIGN_COMPLEXITY_NAMES, DESIGN_FEATURE_NAMES, DESIGN_FEATURE_PRICES, DESIGN_PROJECT_RATE,
    MIN_AREAS, PROPERTY_TYPE_NAMES,
};

const STEPS: &[Step] = &[
    PROPERTY_TYPE_STEP,
    Step::new("area", "Укажите площадь помещения в квадратных метрах:"),
    Step::new(
        "design_complexity",
        "Выберите сложность дизайн-проекта:\n\
         1. Простой (стандартные решения, минимум декоративных элементов)\n\
         2. Стандартный (средний уровень сложности)\n\
         3. Сложный (нестандартные решения, много декоративных элементов)\n\
         4. Премиальный (авторский дизайн, уникальные решения)",
    ),
    Step::new("has_project", "У вас уже есть готовый дизайн-проект? (да/нет)"),
    Step::new(
        "implementation_complexity",
        "Выберите сложность реализации проекта:\n\
         1. Простая (стандартное расположение, хороший доступ)\n2. Стандартная\n\
         3. Сложная (нестандартное расположение, ограниченный доступ)",
    ),
    Step::new(
        "additional_features",
        "Выберите дополнительные элементы (можно выбрать несколько, введите номера через \
         запятую):\n1. Сложное декоративное освещение\n2. Умный дом (базовая комплектация)\n\
         3. Мультимедиа системы\n4. Нестандартные выключатели/розетки\n\
         5. Индивидуальная подсветка мебели/ниш\n0. Не требуются",
    ),
];

const DESIGN_KEYWORDS: &Keywords = &[
    ("1", "simple"),
    ("прост", "simple"),
    ("2", "standard"),
    ("стандарт", "standard"),
    ("3", "complex"),
    ("сложн", "complex"),
    ("4", "premium"),
    ("премиал", "premium"),
    ("авторск", "premium"),
];

// Negatives first: "не имеется" contains "имеется".
const HAS_PROJECT_KEYWORDS: &[(&str, bool)] = &[
    ("нет", false),
    ("не имеется", false),
    ("отсутств", false),
    ("да", true),
    ("есть", true),
    ("готов", true),
    ("имеется", true),
];

const FEATURES: &Keywords = &[
    ("1", "decorative_lighting"),
    ("2", "smart_home_basic"),
    ("3", "multimedia"),
    ("4", "custom_switches"),
    ("5", "furniture_lighting"),
];

const FEATURE_WORDS: &Keywords = &[
    ("декоратив", "decorative_lighting"),
    ("освещен", "decorative_lighting"),
    ("умн", "smart_home_basic"),
    ("мультимед", "multimedia"),
    ("медиа", "multimedia"),
    ("нестандарт", "custom_switches"),
    ("выключат", "custom_switches"),
    ("розет", "custom_switches"),
    ("подсвет", "furniture_lighting"),
    ("мебел", "furniture_lighting"),
    ("ниш", "furniture_lighting"),
];

const NONE_WORDS: &[&str] = &["не треб", "нет"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLine {
    pub feature: String,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignQuote {
    pub property_type: String,
    pub area: f64,
    pub design_complexity: String,
    pub implementation_complexity: String,
    pub has_project: bool,
    pub features: Vec<FeatureLine>,
    pub base_price: i64,
    pub project_price: i64,
    pub additional_price: i64,
    pub total_price: i64,
}

/// Electrical work following an interior design project.
pub struct DesignCalculator;

impl Calculator for DesignCalculator {
    fn id(&self) -> &str {
        "design"
    }

    fn name(&self) -> &str {
        "Электромонтаж по дизайн-проекту"
    }

    fn steps(&self) -> &[Step] {
        STEPS
    }

    fn parse(&self, step: &Step, input: &str) -> Result<Answer> {
        match step.key {
            "property_type" => parse_choice(step, input, PROPERTY_KEYWORDS),
            "area" => parse_measure(step, input),
            "design_complexity" => parse_choice(step, input, DESIGN_KEYWORDS),
            "has_project" => parse_flag(step, input, HAS_PROJECT_KEYWORDS),
            "implementation_complexity" => Ok(parse_complexity(
                input,
                COMPLEXITY_DIGITS_3,
                COMPLEXITY_KEYWORDS,
            )),
            "additional_features" => Ok(Answer::Selection(parse::parse_selection(
                input,
                FEATURES,
                FEATURE_WORDS,
                NONE_WORDS,
            ))),
            _ => Err(FlowError::parse_failure(step.key)),
        }
    }

    fn calculate(&self, answers: &Answers) -> Result<Calculation> {
        let property_type = answers.require_choice("property_type")?;
        let area = answers.require_measure("area")?;
        let design_complexity = answers.require_choice("design_complexity")?;
        let implementation_complexity = answers.choice_or("implementation_complexity", "standard");
        let has_project = answers.flag_or("has_project", false);

        let rate = pricing::price(AREA_RATES, "property_type", property_type)?;
        let min_area = pricing::coefficient(MIN_AREAS, "property_type", property_type)?;
        let design = pricing::coefficient(
            DESIGN_COMPLEXITY_COEFFICIENTS,
            "design_complexity",
            design_complexity,
        )?;
        let implementation = pricing::coefficient(
            COMPLEXITY_COEFFICIENTS,
            "implementation_complexity",
            implementation_complexity,
        )?;

        let area = area.max(min_area);
        let base = area * rate as f64 * design * implementation;
        let project = if has_project {
            0.0
        } else {
            area * DESIGN_PROJECT_RATE as f64
        };

        let mut features = Vec::new();
        for code in answers.selection("additional_features") {
            let price = pricing::price(DESIGN_FEATURE_PRICES, "feature", &code)?;
            features.push(FeatureLine { feature: code, price });
        }
        let additional_price: i64 = features.iter().map(|line| line.price).sum();

        let quote = DesignQuote {
            property_type: property_type.to_string(),
            area,
            design_complexity: design_complexity.to_string(),
            implementation_complexity: implementation_complexity.to_string(),
            has_project,
            features,
            base_price: pricing::round_price(base),
            project_price: pricing::round_price(project),
            additional_price,
            total_price: pricing::round_price(base + project) + additional_price,
        };
        Calculation::new(self.id(), &quote)
    }

    fn format(&self, calculation: &Calculation) -> Result<String> {
        let quote: DesignQuote = calculation.breakdown()?;

        let mut text = String::from("📋 Расчет стоимости электромонтажа по дизайн-проекту:\n\n");
        text.push_str(&format!(
            "• Тип объекта: {}\n• Площадь: {} кв.м\n• Сложность дизайн-проекта: {}\n\
             • Сложность реализации: {}\n",
            pricing::display_name(PROPERTY_TYPE_NAMES, &quote.property_type),
            format_area(quote.area),
            pricing::display_name(DESIGN_COMPLEXITY_NAMES, &quote.design_complexity),
            pricing::display_name(COMPLEXITY_NAMES, &quote.implementation_complexity),
        ));
        if quote.has_project {
            text.push_str("• Дизайн-проект: уже имеется\n");
        } else {
            text.push_str(&format!(
                "• Создание дизайн-проекта: {} руб.\n",
                quote.project_price
            ));
        }

        if !quote.features.is_empty() {
            text.push_str("\nДополнительные элементы:\n");
            for line in &quote.features {
                text.push_str(&format!(
                    "• {}: {} руб.\n",
                    pricing::display_name(DESIGN_FEATURE_NAMES, &line.feature),
                    line.price
                ));
            }
        }

        text.push_str(&format!(
            "\n• Базовая стоимость реализации: {} руб.\n",
            quote.base_price
        ));
        if quote.project_price > 0 {
            text.push_str(&format!(
                "• Стоимость создания дизайн-проекта: {} руб.\n",
                quote.project_price
            ));
        }
        if quote.additional_price > 0 {
            text.push_str(&format!(
                "• Стоимость дополнительных элементов: {} руб.\n",
                quote.additional_price
            ));
        }
        text.push_str(&format!("• Общая стоимость: {} руб.\n", quote.total_price));
        text.push_str(
            "\n⚠️ ВНИМАНИЕ: Это предварительная оценка стоимости работ по дизайн-проекту. Для \
             составления точной сметы необходим выезд специалиста на объект и детальное изучение \
             дизайн-проекта. Окончательная стоимость может отличаться в зависимости от особенностей \
             проекта и дополнительных требований.",
        );
        Ok(text)
    }
}
