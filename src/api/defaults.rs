use crate::core::{CompoundInterestInputs, Debt, InflationInputs, LoanInputs, RetirementInputs};

pub const COMPOUND: CompoundInterestInputs = CompoundInterestInputs {
    principal: 10_000.0,
    monthly_contribution: 500.0,
    annual_rate_pct: 7.0,
    years: 20,
};

pub const COMPOUND_COMPARE: CompoundInterestInputs = CompoundInterestInputs {
    annual_rate_pct: 10.0,
    ..COMPOUND
};

pub const LOAN: LoanInputs = LoanInputs {
    principal: 250_000.0,
    annual_rate_pct: 6.5,
    monthly_payment: 2_000.0,
};

pub const RETIREMENT: RetirementInputs = RetirementInputs {
    current_age: 30,
    retirement_age: 65,
    current_savings: 50_000.0,
    monthly_contribution: 1_000.0,
    expected_return_pct: 7.0,
    withdrawal_rate_pct: 4.0,
};

pub const INFLATION: InflationInputs = InflationInputs {
    current_value: 100_000.0,
    years: 25,
    annual_rate_pct: 3.0,
};

pub const INFLATION_COMPARE_RATE: f64 = 5.0;

pub const DEBT_EXTRA_PAYMENT: f64 = 200.0;

pub const SOLVER_TOLERANCE: f64 = 0.01;
pub const SOLVER_MAX_ITERATIONS: u32 = 64;

pub fn debts() -> Vec<Debt> {
    vec![
        Debt::new("Credit Card", 5_000.0, 22.99, 150.0),
        Debt::new("Car Loan", 15_000.0, 6.5, 350.0),
        Debt::new("Student Loan", 25_000.0, 5.0, 280.0),
    ]
}

/// Contribution that reaches the target even with no growth and no savings.
pub fn contribution_search_max(inputs: &RetirementInputs, target_corpus: f64) -> f64 {
    let years = inputs.retirement_age.saturating_sub(inputs.current_age).max(1);
    let months = f64::from(years) * 12.0;
    (target_corpus / months).max(0.0) + 1.0
}

/// A payment that clears the loan in its first month.
pub fn payment_search_max(principal: f64, annual_rate_pct: f64) -> f64 {
    (principal * (1.0 + annual_rate_pct / 1_200.0)).max(0.0) + 1.0
}
