mod debt;
mod engine;
mod error;
pub mod report;
pub mod simulator;
mod solver;
mod types;

pub use debt::{DEBT_MONTH_CAP, compute_debt_payoff, simulate_strategy};
pub use engine::{
    LOAN_MONTH_CAP, MAX_PROJECTION_YEARS, compute_amortized_payment, compute_compound_interest,
    compute_inflation, compute_loan_payoff, compute_retirement,
};
pub use error::CalcError;
pub use report::{Cell, Report, Tabular};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, solve_required_contribution,
    solve_required_payment,
};
pub use types::{
    CompoundInterestInputs, CompoundInterestResult, CompoundYear, Debt, DebtPayoffResult,
    InflationInputs, InflationResult, InflationYear, LoanInputs, LoanPayoffResult, LoanYear,
    PayoffStrategy, RetirementInputs, RetirementResult, RetirementYear, StrategyResult,
    TimelinePoint,
};
