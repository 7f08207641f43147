// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Carbon footprint scoring and the four-step questionnaire.
//!
//! Scoring is a pure function of the answers. The wizard parses raw form
//! input one step at a time and only advances when the step validates.

use std::collections::HashMap;

use crate::error::FieldErrors;
use crate::models::footprint::{
    AnswerKind, CategoryScores, EnergyAnswers, FoodAnswers, FootprintAnswers, FootprintResult,
    Question, Rating, Step, TransportAnswers, WasteAnswers,
};

/// Raw category score (kg) above which a tip is shown.
const TRANSPORT_TIP_THRESHOLD: f64 = 500.0;
const ENERGY_TIP_THRESHOLD: f64 = 400.0;
const FOOD_TIP_THRESHOLD: f64 = 300.0;
const WASTE_TIP_THRESHOLD: f64 = 200.0;

/// Lowest total ever reported, in tonnes.
const MIN_TOTAL: f64 = 0.5;

/// Trees needed to absorb one tonne of CO2 per year.
const TREES_PER_TONNE: f64 = 40.0;

const TRANSPORT_TIP: &str = "Considera usar más transporte público o bicicleta";
const ENERGY_TIP: &str = "Invierte en electrodomésticos eficientes y energía renovable";
const FOOD_TIP: &str = "Reduce el consumo de carne y compra productos locales";
const WASTE_TIP: &str = "Aumenta el reciclaje y reduce el uso de plásticos de un solo uso";
const FALLBACK_TIPS: [&str; 2] = [
    "¡Excelente! Mantén tus hábitos sostenibles",
    "Comparte tu experiencia con otros para inspirar el cambio",
];

/// Round half up to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0 + 0.5).floor() / 10.0
}

/// Raw per-category scores, before scaling and rounding.
fn raw_scores(answers: &FootprintAnswers) -> CategoryScores {
    let FootprintAnswers {
        transport,
        energy,
        food,
        waste,
    } = answers;

    CategoryScores {
        transport: transport.car_miles * 0.2 + transport.flight_hours * 90.0
            - transport.public_transport * 0.1,
        energy: energy.electricity * 0.5 + energy.heating * 0.8
            - if energy.renewable { 500.0 } else { 0.0 },
        food: food.meat * 6.5 - food.local * 0.02 - if food.organic { 100.0 } else { 0.0 },
        waste: waste.plastic * 0.5 - waste.recycling * 0.01
            - if waste.composting { 50.0 } else { 0.0 },
    }
}

fn tips_for(raw: &CategoryScores) -> Vec<String> {
    let mut tips: Vec<String> = [
        (raw.transport > TRANSPORT_TIP_THRESHOLD, TRANSPORT_TIP),
        (raw.energy > ENERGY_TIP_THRESHOLD, ENERGY_TIP),
        (raw.food > FOOD_TIP_THRESHOLD, FOOD_TIP),
        (raw.waste > WASTE_TIP_THRESHOLD, WASTE_TIP),
    ]
    .into_iter()
    .filter(|(fired, _)| *fired)
    .map(|(_, tip)| tip.to_string())
    .collect();

    if tips.is_empty() {
        tips = FALLBACK_TIPS.iter().map(|t| t.to_string()).collect();
    }
    tips
}

fn rating_for(total: f64) -> Rating {
    if total < 2.0 {
        Rating::Excellent
    } else if total < 4.0 {
        Rating::Good
    } else {
        Rating::NeedsImprovement
    }
}

/// Score a completed questionnaire.
///
/// Category values are tonnes per year, clamped at zero. The total is
/// never below 0.5 tonnes.
pub fn score(answers: &FootprintAnswers) -> FootprintResult {
    let raw = raw_scores(answers);

    let sum = raw.transport + raw.energy + raw.food + raw.waste;
    let total = round1((sum / 1000.0).max(MIN_TOTAL));

    let categories = CategoryScores {
        transport: round1((raw.transport / 100.0).max(0.0)),
        energy: round1((raw.energy / 100.0).max(0.0)),
        food: round1((raw.food / 100.0).max(0.0)),
        waste: round1((raw.waste / 100.0).max(0.0)),
    };

    FootprintResult {
        total,
        categories,
        tips: tips_for(&raw),
        rating: rating_for(total),
        trees_to_offset: (total * TREES_PER_TONNE).ceil() as u32,
    }
}

/// Answers for a single step, parsed and validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAnswers {
    Transport(TransportAnswers),
    Energy(EnergyAnswers),
    Food(FoodAnswers),
    Waste(WasteAnswers),
}

impl FootprintAnswers {
    pub fn apply(&mut self, step: StepAnswers) {
        match step {
            StepAnswers::Transport(a) => self.transport = a,
            StepAnswers::Energy(a) => self.energy = a,
            StepAnswers::Food(a) => self.food = a,
            StepAnswers::Waste(a) => self.waste = a,
        }
    }
}

fn parse_number(question: Question, raw: &str) -> Result<f64, &'static str> {
    let value: f64 = raw.trim().parse().map_err(|_| "Enter a valid number")?;
    if !value.is_finite() {
        return Err("Enter a valid number");
    }
    if value < 0.0 {
        return Err("Must not be negative");
    }
    if question.is_percent() && value > 100.0 {
        return Err("Must be between 0 and 100");
    }
    Ok(value)
}

fn parse_yes_no(raw: &str) -> Result<bool, &'static str> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "si" | "sí" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err("Answer yes or no"),
    }
}

enum Answer {
    Number(f64),
    YesNo(bool),
}

impl Answer {
    fn number(&self) -> f64 {
        match self {
            Answer::Number(v) => *v,
            Answer::YesNo(_) => 0.0,
        }
    }

    fn yes(&self) -> bool {
        matches!(self, Answer::YesNo(true))
    }
}

/// Parse and validate one step of raw form input keyed by question key.
///
/// Every question in the step is required. On failure the map holds one
/// message per offending field.
pub fn parse_step(step: Step, form: &HashMap<String, String>) -> Result<StepAnswers, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut parsed = Vec::with_capacity(3);

    for question in step.questions() {
        let raw = form
            .get(question.key())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());

        let Some(raw) = raw else {
            errors.insert(question.key().to_string(), "This field is required".to_string());
            continue;
        };

        let result = match question.kind() {
            AnswerKind::Number { .. } => parse_number(question, raw).map(Answer::Number),
            AnswerKind::YesNo => parse_yes_no(raw).map(Answer::YesNo),
        };

        match result {
            Ok(answer) => parsed.push(answer),
            Err(msg) => {
                errors.insert(question.key().to_string(), msg.to_string());
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let [a, b, c] = <[Answer; 3]>::try_from(parsed).map_err(|_| {
        FieldErrors::from([(step.as_str().to_string(), "Incomplete step".to_string())])
    })?;

    Ok(match step {
        Step::Transport => StepAnswers::Transport(TransportAnswers {
            car_miles: a.number(),
            flight_hours: b.number(),
            public_transport: c.number(),
        }),
        Step::Energy => StepAnswers::Energy(EnergyAnswers {
            electricity: a.number(),
            heating: b.number(),
            renewable: c.yes(),
        }),
        Step::Food => StepAnswers::Food(FoodAnswers {
            meat: a.number(),
            local: b.number(),
            organic: c.yes(),
        }),
        Step::Waste => StepAnswers::Waste(WasteAnswers {
            recycling: a.number(),
            composting: b.yes(),
            plastic: c.number(),
        }),
    })
}

/// Parse a whole questionnaire at once. Errors from every step are merged.
pub fn parse_answers(form: &HashMap<String, String>) -> Result<FootprintAnswers, FieldErrors> {
    let mut answers = FootprintAnswers::default();
    let mut errors = FieldErrors::new();

    for step in Step::ALL {
        match parse_step(step, form) {
            Ok(parsed) => answers.apply(parsed),
            Err(e) => errors.extend(e),
        }
    }

    if errors.is_empty() {
        Ok(answers)
    } else {
        Err(errors)
    }
}

/// Where the wizard currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    Question(Step),
    Result(FootprintResult),
}

/// Step-by-step questionnaire.
#[derive(Debug, Clone)]
pub struct FootprintWizard {
    state: WizardState,
    answers: FootprintAnswers,
}

impl Default for FootprintWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl FootprintWizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::Question(Step::Transport),
            answers: FootprintAnswers::default(),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn answers(&self) -> &FootprintAnswers {
        &self.answers
    }

    /// Validate the current step and advance. Submitting the last step
    /// scores the questionnaire. On error the wizard stays where it is.
    pub fn next(&mut self, form: &HashMap<String, String>) -> Result<&WizardState, FieldErrors> {
        let step = match &self.state {
            WizardState::Question(step) => *step,
            WizardState::Result(_) => return Ok(&self.state),
        };

        let parsed = parse_step(step, form)?;
        self.answers.apply(parsed);

        self.state = match step.next() {
            Some(next) => WizardState::Question(next),
            None => WizardState::Result(score(&self.answers)),
        };
        Ok(&self.state)
    }

    /// Go back one step. Does nothing on the first step.
    pub fn back(&mut self) {
        self.state = match &self.state {
            WizardState::Question(step) => WizardState::Question(step.previous().unwrap_or(*step)),
            WizardState::Result(_) => WizardState::Question(Step::Waste),
        };
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
