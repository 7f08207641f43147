// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Carbon footprint questionnaire answers and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Transport habits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportAnswers {
    /// Kilometres driven per week
    pub car_miles: f64,
    /// Flight hours per year
    pub flight_hours: f64,
    /// Public transport trips per week
    pub public_transport: f64,
}

/// Home energy use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyAnswers {
    /// Monthly electricity in kWh
    pub electricity: f64,
    /// Monthly heating/AC spend
    pub heating: f64,
    pub renewable: bool,
}

/// Diet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodAnswers {
    /// Meat meals per week
    pub meat: f64,
    /// Percent of food sourced locally
    pub local: f64,
    pub organic: bool,
}

/// Household waste.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteAnswers {
    /// Percent of waste recycled
    pub recycling: f64,
    pub composting: bool,
    /// Single-use plastic items per day
    pub plastic: f64,
}

/// A completed questionnaire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FootprintAnswers {
    pub transport: TransportAnswers,
    pub energy: EnergyAnswers,
    pub food: FoodAnswers,
    pub waste: WasteAnswers,
}

/// Per-category breakdown in tonnes CO2 per year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoryScores {
    pub transport: f64,
    pub energy: f64,
    pub food: f64,
    pub waste: f64,
}

/// Qualitative band for the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    NeedsImprovement,
}

/// Scored questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FootprintResult {
    /// Tonnes CO2 per year, one decimal, never below 0.5
    pub total: f64,
    pub categories: CategoryScores,
    pub tips: Vec<String>,
    pub rating: Rating,
    /// Trees needed per year to offset the total
    pub trees_to_offset: u32,
}

/// Questionnaire steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Transport,
    Energy,
    Food,
    Waste,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Transport, Step::Energy, Step::Food, Step::Waste];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Transport => "transport",
            Step::Energy => "energy",
            Step::Food => "food",
            Step::Waste => "waste",
        }
    }

    /// Zero-based position in the wizard.
    pub fn index(&self) -> usize {
        match self {
            Step::Transport => 0,
            Step::Energy => 1,
            Step::Food => 2,
            Step::Waste => 3,
        }
    }

    pub fn next(&self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::ALL[i])
    }

    pub fn questions(&self) -> [Question; 3] {
        match self {
            Step::Transport => [
                Question::CarMiles,
                Question::FlightHours,
                Question::PublicTransport,
            ],
            Step::Energy => [
                Question::Electricity,
                Question::Heating,
                Question::Renewable,
            ],
            Step::Food => [Question::Meat, Question::Local, Question::Organic],
            Step::Waste => [
                Question::Recycling,
                Question::Composting,
                Question::Plastic,
            ],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown step: {s}"))
    }
}

/// How an answer is entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerKind {
    Number { unit: &'static str },
    YesNo,
}

/// One questionnaire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Question {
    CarMiles,
    FlightHours,
    PublicTransport,
    Electricity,
    Heating,
    Renewable,
    Meat,
    Local,
    Organic,
    Recycling,
    Composting,
    Plastic,
}

impl Question {
    /// Form key, as sent by the browser.
    pub fn key(&self) -> &'static str {
        match self {
            Question::CarMiles => "carMiles",
            Question::FlightHours => "flightHours",
            Question::PublicTransport => "publicTransport",
            Question::Electricity => "electricity",
            Question::Heating => "heating",
            Question::Renewable => "renewable",
            Question::Meat => "meat",
            Question::Local => "local",
            Question::Organic => "organic",
            Question::Recycling => "recycling",
            Question::Composting => "composting",
            Question::Plastic => "plastic",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Question::CarMiles => "¿Cuántos kilómetros manejas por semana?",
            Question::FlightHours => "¿Cuántas horas de vuelo tomas al año?",
            Question::PublicTransport => "¿Cuántas veces usas transporte público por semana?",
            Question::Electricity => "¿Cuál es tu consumo mensual de electricidad?",
            Question::Heating => "¿Cuánto gastas en calefacción/AC al mes?",
            Question::Renewable => "¿Usas energías renovables?",
            Question::Meat => "¿Cuántas veces comes carne por semana?",
            Question::Local => "¿Qué porcentaje de tu comida es local?",
            Question::Organic => "¿Prefieres alimentos orgánicos?",
            Question::Recycling => "¿Qué porcentaje de tus residuos reciclas?",
            Question::Composting => "¿Haces compostaje?",
            Question::Plastic => "¿Cuántos productos de plástico de un solo uso usas por día?",
        }
    }

    pub fn kind(&self) -> AnswerKind {
        match self {
            Question::CarMiles => AnswerKind::Number { unit: "km" },
            Question::FlightHours => AnswerKind::Number { unit: "horas" },
            Question::PublicTransport | Question::Meat => AnswerKind::Number { unit: "veces" },
            Question::Electricity => AnswerKind::Number { unit: "kWh" },
            Question::Heating => AnswerKind::Number { unit: "USD" },
            Question::Local | Question::Recycling => AnswerKind::Number { unit: "%" },
            Question::Plastic => AnswerKind::Number { unit: "productos" },
            Question::Renewable | Question::Organic | Question::Composting => AnswerKind::YesNo,
        }
    }

    pub fn is_percent(&self) -> bool {
        matches!(self.kind(), AnswerKind::Number { unit: "%" })
    }
}
