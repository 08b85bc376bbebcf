use serde::Serialize;

use super::engine::{compute_loan_payoff, compute_retirement};
use super::error::{CalcError, require_non_negative, require_positive};
use super::types::{LoanInputs, RetirementInputs};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    RequiredContribution,
    RequiredPayment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSolveConfig {
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub achieved_value: Option<f64>,
    pub meets_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub achieved_value: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    achieved_value: Option<f64>,
    meets_goal: bool,
}

pub fn solve_required_contribution(
    inputs: &RetirementInputs,
    target_corpus: f64,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, CalcError> {
    validate_config(config)?;
    require_positive("target_corpus", target_corpus)?;
    // Surface age/rate problems up front instead of as an infeasible search.
    compute_retirement(&RetirementInputs {
        monthly_contribution: config.search_min,
        ..*inputs
    })?;

    let evaluate = |contribution: f64| {
        let corpus = compute_retirement(&RetirementInputs {
            monthly_contribution: contribution,
            ..*inputs
        })
        .map(|r| r.retirement_corpus)
        .ok();
        CandidateEval {
            achieved_value: corpus,
            meets_goal: corpus.is_some_and(|c| c + 1e-9 >= target_corpus),
        }
    };

    Ok(bisect_smallest(
        GoalType::RequiredContribution,
        target_corpus,
        config,
        evaluate,
    ))
}

pub fn solve_required_payment(
    principal: f64,
    annual_rate_pct: f64,
    target_months: u32,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, CalcError> {
    validate_config(config)?;
    require_positive("principal", principal)?;
    require_non_negative("annual_rate_pct", annual_rate_pct)?;
    if target_months == 0 {
        return Err(CalcError::invalid("target_months", "must be > 0"));
    }

    let evaluate = |payment: f64| {
        let months = compute_loan_payoff(&LoanInputs {
            principal,
            annual_rate_pct,
            monthly_payment: payment,
        })
        .map(|r| r.total_months)
        .ok();
        CandidateEval {
            achieved_value: months.map(f64::from),
            meets_goal: months.is_some_and(|m| m <= target_months),
        }
    };

    Ok(bisect_smallest(
        GoalType::RequiredPayment,
        target_months as f64,
        config,
        evaluate,
    ))
}

/// Finds the smallest candidate in the search bounds that meets the goal,
/// assuming `evaluate` is monotone: once a value meets, every larger one does.
fn bisect_smallest<F>(
    goal_type: GoalType,
    target: f64,
    config: GoalSolveConfig,
    evaluate: F,
) -> GoalSolveResult
where
    F: Fn(f64) -> CandidateEval,
{
    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_eval = evaluate(config.search_min);
    let high_eval = evaluate(config.search_max);

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_eval.meets_goal {
        solved_value = Some(config.search_min);
        converged = true;
        feasible = true;
        message = "Already meets target at lower search bound.".to_string();
    } else if !high_eval.meets_goal {
        feasible = false;
        message = "No feasible value found within the search bounds.".to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let eval = evaluate(mid);
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                achieved_value: eval.achieved_value,
                meets_goal: eval.meets_goal,
            });

            if eval.meets_goal {
                hi = mid;
            } else {
                lo = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(hi);
        feasible = true;
        message = if converged {
            match goal_type {
                GoalType::RequiredContribution => "Solved required contribution.".to_string(),
                GoalType::RequiredPayment => "Solved required payment.".to_string(),
            }
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        };
    }

    let achieved_value = solved_value.and_then(|value| evaluate(value).achieved_value);

    GoalSolveResult {
        goal_type,
        target,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_value,
        iterations,
        converged,
        feasible,
        message,
    }
}

fn validate_config(config: GoalSolveConfig) -> Result<(), CalcError> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(CalcError::invalid("search bounds", "must be finite"));
    }
    if config.search_min < 0.0 {
        return Err(CalcError::invalid("search_min", "must be >= 0"));
    }
    if config.search_max <= config.search_min {
        return Err(CalcError::invalid(
            "search_max",
            "must be greater than search_min",
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(CalcError::invalid("tolerance", "must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(CalcError::invalid("max_iterations", "must be > 0"));
    }
    Ok(())
}
