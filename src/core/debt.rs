//! Every month each open debt accrues interest and pays its minimum. The pool
//! of extra budget plus minimums freed by closed debts then goes to one target,
//! the first open debt in strategy order.

use super::error::{CalcError, require_finite, require_non_negative, require_positive};
use super::simulator::{accrue_and_pay, monthly_rate};
use super::types::{Debt, DebtPayoffResult, PayoffStrategy, StrategyResult, TimelinePoint};

pub const DEBT_MONTH_CAP: u32 = 1200;

#[derive(Debug, Clone)]
struct DebtState {
    name: String,
    balance: f64,
    annual_rate_pct: f64,
    monthly_rate: f64,
    min_payment: f64,
    paid_off_month: Option<u32>,
}

impl DebtState {
    fn from_debt(debt: &Debt) -> Self {
        Self {
            name: debt.name.clone(),
            balance: debt.balance,
            annual_rate_pct: debt.annual_rate_pct,
            monthly_rate: monthly_rate(debt.annual_rate_pct),
            min_payment: debt.min_payment,
            paid_off_month: None,
        }
    }

    fn is_open(&self) -> bool {
        self.balance > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MonthOutcome {
    interest: f64,
    paid: f64,
    pool: f64,
    rollover_target: Option<usize>,
    rollover_applied: f64,
}

#[derive(Debug, Clone)]
struct PayoffPlan {
    strategy: PayoffStrategy,
    extra_payment: f64,
    debts: Vec<DebtState>,
}

impl PayoffPlan {
    fn new(debts: &[Debt], extra_payment: f64, strategy: PayoffStrategy) -> Self {
        let mut working = debts.iter().map(DebtState::from_debt).collect::<Vec<_>>();
        // sort_by is stable, so ties keep their input order.
        match strategy {
            PayoffStrategy::Snowball => {
                working.sort_by(|a, b| a.balance.total_cmp(&b.balance));
            }
            PayoffStrategy::Avalanche => {
                working.sort_by(|a, b| b.annual_rate_pct.total_cmp(&a.annual_rate_pct));
            }
            PayoffStrategy::MinimumOnly => {}
        }

        Self {
            strategy,
            extra_payment: if strategy.applies_rollover() {
                extra_payment
            } else {
                0.0
            },
            debts: working,
        }
    }

    fn has_open_debt(&self) -> bool {
        self.debts.iter().any(DebtState::is_open)
    }

    fn total_balance(&self) -> f64 {
        self.debts.iter().map(|d| d.balance).sum()
    }

    fn freed_minimums(&self) -> f64 {
        if !self.strategy.applies_rollover() {
            return 0.0;
        }
        self.debts
            .iter()
            .filter(|d| !d.is_open())
            .map(|d| d.min_payment)
            .sum()
    }

    fn step_month(&mut self) -> MonthOutcome {
        let pool = self.extra_payment + self.freed_minimums();
        let mut interest = 0.0;
        let mut paid = 0.0;

        for debt in self.debts.iter_mut().filter(|d| d.is_open()) {
            let step = accrue_and_pay(debt.balance, debt.monthly_rate, debt.min_payment);
            interest += step.interest;
            paid += step.paid;
            debt.balance = step.closing_balance;
        }

        let mut rollover_target = None;
        let mut rollover_applied = 0.0;
        if pool > 0.0 {
            if let Some((idx, target)) = self
                .debts
                .iter_mut()
                .enumerate()
                .find(|(_, d)| d.is_open())
            {
                rollover_applied = pool.min(target.balance);
                target.balance = (target.balance - rollover_applied).max(0.0);
                rollover_target = Some(idx);
                paid += rollover_applied;
            }
        }

        MonthOutcome {
            interest,
            paid,
            pool,
            rollover_target,
            rollover_applied,
        }
    }

    fn record_payoffs(&mut self, month: u32, payoff_order: &mut Vec<String>) {
        for debt in self.debts.iter_mut() {
            if !debt.is_open() && debt.paid_off_month.is_none() {
                debt.balance = 0.0;
                debt.paid_off_month = Some(month);
                payoff_order.push(debt.name.clone());
            }
        }
    }

    fn run(mut self) -> Result<StrategyResult, CalcError> {
        let mut month = 0_u32;
        let mut total_interest = 0.0;
        let mut total_paid = 0.0;
        let mut payoff_order = Vec::with_capacity(self.debts.len());
        let mut timeline = Vec::new();

        while self.has_open_debt() {
            if month >= DEBT_MONTH_CAP {
                return Err(CalcError::Unresolvable {
                    context: format!("{} debt payoff", self.strategy),
                    cap_months: DEBT_MONTH_CAP,
                });
            }
            month += 1;

            let outcome = self.step_month();
            debug_assert!(outcome.rollover_applied <= outcome.pool + 1e-9);
            debug_assert!(outcome.rollover_target.is_some() || outcome.rollover_applied == 0.0);
            total_interest += outcome.interest;
            total_paid += outcome.paid;
            self.record_payoffs(month, &mut payoff_order);
            timeline.push(TimelinePoint {
                month,
                total_balance: self.total_balance(),
            });
        }

        Ok(StrategyResult {
            strategy: self.strategy,
            total_months: month,
            total_interest,
            total_paid,
            payoff_order,
            timeline,
        })
    }
}

fn validate_debts(debts: &[Debt], extra_payment: f64) -> Result<(), CalcError> {
    if debts.is_empty() {
        return Err(CalcError::invalid("debts", "must contain at least one debt"));
    }
    for debt in debts {
        require_positive("debt.balance", debt.balance)?;
        require_positive("debt.min_payment", debt.min_payment)?;
        require_non_negative("debt.annual_rate_pct", debt.annual_rate_pct)?;
    }
    require_finite("extra_payment", extra_payment)?;
    require_non_negative("extra_payment", extra_payment)?;
    Ok(())
}

pub fn simulate_strategy(
    debts: &[Debt],
    extra_payment: f64,
    strategy: PayoffStrategy,
) -> Result<StrategyResult, CalcError> {
    validate_debts(debts, extra_payment)?;
    PayoffPlan::new(debts, extra_payment, strategy).run()
}

/// Fails when any strategy, including the minimum-only baseline, hits the month cap.
pub fn compute_debt_payoff(
    debts: &[Debt],
    extra_payment: f64,
) -> Result<DebtPayoffResult, CalcError> {
    validate_debts(debts, extra_payment)?;

    let snowball = PayoffPlan::new(debts, extra_payment, PayoffStrategy::Snowball).run()?;
    let avalanche = PayoffPlan::new(debts, extra_payment, PayoffStrategy::Avalanche).run()?;
    let minimum_only = PayoffPlan::new(debts, extra_payment, PayoffStrategy::MinimumOnly).run()?;

    Ok(DebtPayoffResult {
        interest_saved_snowball: minimum_only.total_interest - snowball.total_interest,
        interest_saved_avalanche: minimum_only.total_interest - avalanche.total_interest,
        snowball,
        avalanche,
        minimum_only,
    })
}
