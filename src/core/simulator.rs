#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FlowDirection {
    Deposit,
    Repayment,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonthStep {
    pub month: u32,
    pub opening_balance: f64,
    pub interest: f64,
    pub flow: f64,
    pub closing_balance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct YearStep {
    pub year: u32,
    pub months: u32,
    pub opening_balance: f64,
    pub interest: f64,
    pub flow: f64,
    pub closing_balance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RepaymentStep {
    pub interest: f64,
    pub paid: f64,
    pub closing_balance: f64,
}

pub fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

/// The payment is clipped so the balance never goes negative.
pub fn accrue_and_pay(balance: f64, monthly_rate: f64, payment: f64) -> RepaymentStep {
    let interest = balance * monthly_rate;
    let due = balance + interest;
    let payment = payment.max(0.0);
    if payment >= due {
        RepaymentStep {
            interest,
            paid: due,
            closing_balance: 0.0,
        }
    } else {
        RepaymentStep {
            interest,
            paid: payment,
            closing_balance: due - payment,
        }
    }
}

pub fn simulate(
    initial_balance: f64,
    monthly_rate: f64,
    monthly_flow: f64,
    max_months: u32,
    direction: FlowDirection,
) -> Vec<MonthStep> {
    let mut steps = Vec::with_capacity(max_months as usize);
    let mut balance = initial_balance;

    for month in 1..=max_months {
        if direction == FlowDirection::Repayment && balance <= 0.0 {
            break;
        }

        let step = match direction {
            FlowDirection::Deposit => {
                let interest = balance * monthly_rate;
                MonthStep {
                    month,
                    opening_balance: balance,
                    interest,
                    flow: monthly_flow,
                    closing_balance: balance + interest + monthly_flow,
                }
            }
            FlowDirection::Repayment => {
                let repaid = accrue_and_pay(balance, monthly_rate, monthly_flow);
                MonthStep {
                    month,
                    opening_balance: balance,
                    interest: repaid.interest,
                    flow: repaid.paid,
                    closing_balance: repaid.closing_balance,
                }
            }
        };

        balance = step.closing_balance;
        steps.push(step);
    }

    steps
}

/// The last bucket may be partial when a repayment finishes mid-year.
pub fn aggregate_years(steps: &[MonthStep]) -> Vec<YearStep> {
    steps
        .chunks(12)
        .enumerate()
        .filter_map(|(idx, chunk)| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            Some(YearStep {
                year: idx as u32 + 1,
                months: chunk.len() as u32,
                opening_balance: first.opening_balance,
                interest: chunk.iter().map(|s| s.interest).sum(),
                flow: chunk.iter().map(|s| s.flow).sum(),
                closing_balance: last.closing_balance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn monthly_rate_divides_annual_percentage() {
        assert_approx(monthly_rate(12.0), 0.01);
        assert_approx(monthly_rate(0.0), 0.0);
    }

    #[test]
    fn zero_rate_deposit_grows_linearly() {
        let steps = simulate(1_000.0, 0.0, 100.0, 24, FlowDirection::Deposit);
        assert_eq!(steps.len(), 24);
        assert!(steps.iter().all(|s| s.interest == 0.0));
        assert_approx(steps[23].closing_balance, 3_400.0);
    }

    #[test]
    fn zero_rate_repayment_is_linear_and_clips_last_payment() {
        let steps = simulate(1_000.0, 0.0, 300.0, 100, FlowDirection::Repayment);
        assert_eq!(steps.len(), 4);
        assert_approx(steps[3].flow, 100.0);
        assert_eq!(steps[3].closing_balance, 0.0);
    }

    #[test]
    fn deposit_runs_full_horizon() {
        let steps = simulate(0.0, monthly_rate(5.0), 50.0, 36, FlowDirection::Deposit);
        assert_eq!(steps.len(), 36);
        assert_eq!(steps[0].month, 1);
        assert_eq!(steps[35].month, 36);
    }

    #[test]
    fn repayment_stops_at_max_months_when_not_paid_off() {
        let steps = simulate(10_000.0, monthly_rate(6.0), 60.0, 12, FlowDirection::Repayment);
        assert_eq!(steps.len(), 12);
        assert!(steps[11].closing_balance > 0.0);
    }

    #[test]
    fn accrue_and_pay_clips_to_balance_plus_interest() {
        let step = accrue_and_pay(100.0, 0.01, 500.0);
        assert_approx(step.interest, 1.0);
        assert_approx(step.paid, 101.0);
        assert_eq!(step.closing_balance, 0.0);
    }

    #[test]
    fn aggregate_years_keeps_partial_final_year() {
        let steps = simulate(1_300.0, 0.0, 100.0, 100, FlowDirection::Repayment);
        let years = aggregate_years(&steps);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].months, 12);
        assert_eq!(years[1].months, 1);
        assert_approx(years[0].flow, 1_200.0);
        assert_approx(years[1].flow, 100.0);
        assert_eq!(years[1].closing_balance, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_repayment_balances_never_go_negative(
            balance in 1u32..500_000,
            rate_bp in 0u32..3_000,
            payment in 1u32..20_000,
        ) {
            let rate = monthly_rate(rate_bp as f64 / 100.0);
            let steps = simulate(
                balance as f64,
                rate,
                payment as f64,
                600,
                FlowDirection::Repayment,
            );
            for step in &steps {
                prop_assert!(step.closing_balance >= 0.0);
                prop_assert!(step.flow <= step.opening_balance + step.interest + 1e-9);
            }
        }

        #[test]
        fn prop_yearly_aggregate_preserves_totals(
            balance in 0u32..200_000,
            rate_bp in 0u32..2_000,
            flow in 0u32..5_000,
            months in 1u32..400,
        ) {
            let rate = monthly_rate(rate_bp as f64 / 100.0);
            let steps = simulate(balance as f64, rate, flow as f64, months, FlowDirection::Deposit);
            let years = aggregate_years(&steps);
            prop_assert_eq!(years.iter().map(|y| y.months).sum::<u32>(), months);
            let monthly_interest: f64 = steps.iter().map(|s| s.interest).sum();
            let yearly_interest: f64 = years.iter().map(|y| y.interest).sum();
            let tolerance = 1e-6 * monthly_interest.max(1.0);
            prop_assert!((monthly_interest - yearly_interest).abs() <= tolerance);
        }
    }
}
