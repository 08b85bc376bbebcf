use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundInterestInputs {
    pub principal: f64,
    pub monthly_contribution: f64,
    pub annual_rate_pct: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundYear {
    pub year: u32,
    pub balance: f64,
    pub total_contributions: f64,
    pub yearly_interest: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundInterestResult {
    pub final_balance: f64,
    pub total_contributions: f64,
    pub total_interest: f64,
    pub breakdown: Vec<CompoundYear>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanInputs {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub monthly_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanYear {
    pub year: u32,
    pub total_payments: f64,
    pub total_principal: f64,
    pub total_interest: f64,
    pub end_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayoffResult {
    pub total_months: u32,
    pub total_interest: f64,
    pub total_payments: f64,
    pub annual_summary: Vec<LoanYear>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetirementInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    pub expected_return_pct: f64,
    pub withdrawal_rate_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementYear {
    pub age: u32,
    pub year: u32,
    pub balance: f64,
    pub total_contributions: f64,
    pub yearly_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementResult {
    pub retirement_corpus: f64,
    pub total_contributions: f64,
    pub total_growth: f64,
    pub annual_withdrawal: f64,
    pub monthly_withdrawal: f64,
    pub projection: Vec<RetirementYear>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationInputs {
    pub current_value: f64,
    pub years: u32,
    pub annual_rate_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationYear {
    pub year: u32,
    pub future_value: f64,
    pub purchasing_power: f64,
    pub value_eroded: f64,
    pub cumulative_inflation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationResult {
    pub current_value: f64,
    pub future_equivalent: f64,
    pub future_purchasing_power: f64,
    /// Fraction, not percent: 0.5 means prices rose by half.
    pub total_inflation: f64,
    pub breakdown: Vec<InflationYear>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub name: String,
    pub balance: f64,
    #[serde(alias = "rate")]
    pub annual_rate_pct: f64,
    pub min_payment: f64,
}

impl Debt {
    pub fn new(
        name: impl Into<String>,
        balance: f64,
        annual_rate_pct: f64,
        min_payment: f64,
    ) -> Self {
        Self {
            name: name.into(),
            balance,
            annual_rate_pct,
            min_payment,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoffStrategy {
    Snowball,
    Avalanche,
    MinimumOnly,
}

impl PayoffStrategy {
    pub fn applies_rollover(self) -> bool {
        !matches!(self, PayoffStrategy::MinimumOnly)
    }
}

impl fmt::Display for PayoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayoffStrategy::Snowball => "snowball",
            PayoffStrategy::Avalanche => "avalanche",
            PayoffStrategy::MinimumOnly => "minimum-only",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub month: u32,
    pub total_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub strategy: PayoffStrategy,
    pub total_months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub payoff_order: Vec<String>,
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoffResult {
    pub snowball: StrategyResult,
    pub avalanche: StrategyResult,
    pub minimum_only: StrategyResult,
    pub interest_saved_snowball: f64,
    pub interest_saved_avalanche: f64,
}
