//! Static price lists, coefficients and display names.
//!
//! Every table maps a category code to a value. Lookups that feed a formula go through
//! [`price`] / [`coefficient`], which reject unknown codes; lookups that only feed text go
//! through [`display_name`], which never fails.

use dialog_flow::{FlowError, Result};

pub type PriceTable = [(&'static str, i64)];
pub type CoefficientTable = [(&'static str, f64)];
pub type NameTable = [(&'static str, &'static str)];

/// Label used when a code has no entry in a name table.
pub const FALLBACK_NAME: &str = "Не указано";

pub const PROPERTY_TYPE_NAMES: &NameTable = &[
    ("apartment", "Квартира"),
    ("house", "Дом/коттедж"),
    ("office", "Офис"),
    ("commercial", "Коммерческое помещение"),
    ("industrial", "Промышленное помещение"),
];

pub const WALL_MATERIAL_COEFFICIENTS: &CoefficientTable = &[
    ("drywall", 0.9),
    ("brick", 1.2),
    ("concrete", 1.4),
    ("wood", 1.0),
    ("block", 1.1),
];

pub const WALL_MATERIAL_NAMES: &NameTable = &[
    ("drywall", "Гипсокартон"),
    ("brick", "Кирпич"),
    ("concrete", "Бетон"),
    ("wood", "Дерево"),
    ("block", "Газоблок/пеноблок"),
];

pub const COMPLEXITY_COEFFICIENTS: &CoefficientTable = &[
    ("easy", 0.9),
    ("standard", 1.0),
    ("complex", 1.3),
    ("very_complex", 1.6),
];

pub const COMPLEXITY_NAMES: &NameTable = &[
    ("easy", "Простой монтаж"),
    ("standard", "Стандартная сложность"),
    ("complex", "Сложный монтаж"),
    ("very_complex", "Очень сложный монтаж"),
];

/// Installation price per square metre by property type.
pub const AREA_RATES: &PriceTable = &[
    ("apartment", 1200),
    ("house", 1400),
    ("office", 1300),
    ("commercial", 1500),
    ("industrial", 1800),
];

/// Smallest billable area by property type.
pub const MIN_AREAS: &CoefficientTable = &[
    ("apartment", 20.0),
    ("house", 50.0),
    ("office", 30.0),
    ("commercial", 40.0),
    ("industrial", 20.0),
];

pub const SOCKET_PRICES: &PriceTable = &[
    ("socket_single", 350),
    ("socket_double", 450),
    ("socket_power", 600),
    ("switch_single", 300),
    ("switch_double", 400),
    ("dimmer", 600),
    ("tv_socket", 450),
    ("network_socket", 500),
    ("phone_socket", 400),
    ("usb_socket", 550),
];

pub const SOCKET_DEVICE_NAMES: &NameTable = &[
    ("socket_single", "розетка одинарная"),
    ("socket_double", "розетка двойная"),
    ("socket_power", "розетка силовая"),
    ("switch_single", "выключатель одноклавишный"),
    ("switch_double", "выключатель двухклавишный"),
    ("dimmer", "диммер"),
    ("tv_socket", "ТВ розетка"),
    ("network_socket", "интернет розетка"),
    ("phone_socket", "телефонная розетка"),
    ("usb_socket", "USB розетка"),
];

pub const LIGHTING_PRICES: &PriceTable = &[
    ("chandelier", 1500),
    ("spot_light", 600),
    ("wall_light", 900),
];

pub const LIGHTING_NAMES: &NameTable = &[
    ("chandelier", "Люстры/подвесные светильники"),
    ("spot_light", "Точечные светильники"),
    ("wall_light", "Настенные светильники"),
    ("general", "Светильники"),
];

pub const CEILING_TYPE_COEFFICIENTS: &CoefficientTable = &[
    ("regular", 1.0),
    ("drywall", 1.2),
    ("stretch", 1.1),
    ("suspended", 1.3),
];

pub const CEILING_TYPE_NAMES: &NameTable = &[
    ("regular", "Обычный (бетонная плита)"),
    ("drywall", "Гипсокартонный"),
    ("stretch", "Натяжной"),
    ("suspended", "Подвесной (Армстронг и т.п.)"),
];

/// Base assembly price of an empty panel.
pub const PANEL_BASE_PRICES: &PriceTable = &[
    ("apartment", 5000),
    ("house", 8000),
    ("floor", 7000),
    ("industrial", 15000),
];

pub const PANEL_TYPE_NAMES: &NameTable = &[
    ("apartment", "Квартирный щиток"),
    ("house", "Щит для частного дома"),
    ("floor", "Этажный щит"),
    ("industrial", "Промышленный щит"),
];

pub const PANEL_DEVICE_PRICES: &PriceTable = &[
    ("circuit_breaker_1p", 350),
    ("rcd_2p", 500),
    ("diff_auto", 800),
    ("counter", 1500),
    ("contactor", 1200),
    ("voltage_relay", 900),
    ("timer", 800),
    ("phase_control", 1100),
];

pub const PANEL_DEVICE_NAMES: &NameTable = &[
    ("contactor", "Контактор"),
    ("voltage_relay", "Реле напряжения"),
    ("timer", "Таймер"),
    ("phase_control", "Устройство контроля фаз"),
];

/// Laying price per metre of cable.
pub const CABLING_PRICES: &PriceTable = &[
    ("open", 120),
    ("hidden", 180),
    ("cable_channel", 150),
    ("corrugation", 140),
    ("ground", 350),
    ("overhead", 250),
];

pub const CABLING_TYPE_NAMES: &NameTable = &[
    ("open", "Открытая проводка"),
    ("hidden", "Скрытая проводка"),
    ("cable_channel", "Проводка в кабель-канале"),
    ("corrugation", "Проводка в гофре"),
    ("ground", "Подземная прокладка"),
    ("overhead", "Воздушная прокладка"),
];

/// Cross-section in mm² to price coefficient.
pub const CABLE_SECTION_COEFFICIENTS: &[(f64, f64)] =
    &[(1.5, 0.9), (2.5, 1.0), (4.0, 1.2), (6.0, 1.4), (10.0, 1.8)];

pub const INDUSTRIAL_TYPE_COEFFICIENTS: &CoefficientTable = &[
    ("workshop", 1.0),
    ("warehouse", 0.85),
    ("laboratory", 1.2),
    ("plant", 1.5),
    ("logistics", 0.9),
];

pub const INDUSTRIAL_TYPE_NAMES: &NameTable = &[
    ("workshop", "производственный цех"),
    ("warehouse", "склад"),
    ("laboratory", "лаборатория"),
    ("plant", "завод/крупное предприятие"),
    ("logistics", "логистический центр"),
];

pub const POWER_COEFFICIENTS: &CoefficientTable = &[
    ("up_to_50", 0.8),
    ("50_to_150", 1.0),
    ("150_to_400", 1.3),
    ("400_plus", 1.6),
];

pub const POWER_NAMES: &NameTable = &[
    ("up_to_50", "до 50 кВт"),
    ("50_to_150", "от 50 до 150 кВт"),
    ("150_to_400", "от 150 до 400 кВт"),
    ("400_plus", "более 400 кВт"),
];

pub const INDUSTRIAL_EQUIPMENT_PRICES: &PriceTable = &[
    ("transformer", 85000),
    ("distribution_panel", 45000),
    ("standby_generator", 120000),
    ("ups", 65000),
    ("grounding", 35000),
    ("lightning_protection", 30000),
    ("automation", 70000),
];

pub const INDUSTRIAL_EQUIPMENT_NAMES: &NameTable = &[
    ("transformer", "Трансформаторная подстанция"),
    ("distribution_panel", "Распределительный щит"),
    ("standby_generator", "Резервный генератор"),
    ("ups", "Система бесперебойного питания (ИБП)"),
    ("grounding", "Система заземления"),
    ("lightning_protection", "Система молниезащиты"),
    ("automation", "Система автоматизации"),
    ("power_cable", "Силовой кабель (за метр погонный)"),
];

/// Power cable price per metre.
pub const POWER_CABLE_PRICE: i64 = 2500;

pub const DESIGN_COMPLEXITY_COEFFICIENTS: &CoefficientTable = &[
    ("simple", 1.2),
    ("standard", 1.5),
    ("complex", 2.0),
    ("premium", 2.5),
];

pub const DESIGN_COMPLEXITY_NAMES: &NameTable = &[
    ("simple", "простой дизайн-проект"),
    ("standard", "стандартный дизайн-проект"),
    ("complex", "сложный дизайн-проект"),
    ("premium", "премиальный дизайн-проект"),
];

pub const DESIGN_FEATURE_PRICES: &PriceTable = &[
    ("decorative_lighting", 15000),
    ("smart_home_basic", 45000),
    ("multimedia", 25000),
    ("custom_switches", 8000),
    ("furniture_lighting", 12000),
];

pub const DESIGN_FEATURE_NAMES: &NameTable = &[
    ("decorative_lighting", "Сложное декоративное освещение"),
    ("smart_home_basic", "Умный дом (базовая комплектация)"),
    ("multimedia", "Мультимедиа системы"),
    ("custom_switches", "Нестандартные выключатели/розетки"),
    ("furniture_lighting", "Индивидуальная подсветка мебели/ниш"),
];

/// Design project creation price per square metre, charged when the client has none.
pub const DESIGN_PROJECT_RATE: i64 = 300;

fn lookup<T: Copy>(table: &[(&'static str, T)], kind: &str, code: &str) -> Result<T> {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, value)| *value)
        .ok_or_else(|| FlowError::unknown_category(kind, code))
}

/// Price for `code`, or [`FlowError::UnknownCategory`] naming `kind`.
pub fn price(table: &PriceTable, kind: &str, code: &str) -> Result<i64> {
    lookup(table, kind, code)
}

/// Coefficient for `code`, or [`FlowError::UnknownCategory`] naming `kind`.
pub fn coefficient(table: &CoefficientTable, kind: &str, code: &str) -> Result<f64> {
    lookup(table, kind, code)
}

pub fn display_name(table: &NameTable, code: &str) -> &'static str {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, name)| *name)
        .unwrap_or(FALLBACK_NAME)
}

/// Fails with [`FlowError::UnknownCategory`] when `code` has no label in `table`.
pub fn ensure_known(table: &NameTable, kind: &str, code: &str) -> Result<()> {
    lookup(table, kind, code).map(|_| ())
}

pub fn section_coefficient(section: f64) -> Result<f64> {
    CABLE_SECTION_COEFFICIENTS
        .iter()
        .find(|(mm2, _)| (mm2 - section).abs() < f64::EPSILON)
        .map(|(_, coefficient)| *coefficient)
        .ok_or_else(|| FlowError::unknown_category("cable_section", section.to_string()))
}

/// Round a computed amount to whole roubles.
pub fn round_price(amount: f64) -> i64 {
    amount.round() as i64
}
