use super::error::{CalcError, require_finite, require_non_negative, require_positive};
use super::simulator::{FlowDirection, aggregate_years, monthly_rate, simulate};
use super::types::{
    CompoundInterestInputs, CompoundInterestResult, CompoundYear, InflationInputs,
    InflationResult, InflationYear, LoanInputs, LoanPayoffResult, LoanYear, RetirementInputs,
    RetirementResult, RetirementYear,
};

pub const MAX_PROJECTION_YEARS: u32 = 100;
pub const LOAN_MONTH_CAP: u32 = 1200;

#[derive(Debug, Clone, Copy)]
struct GrowthYear {
    year: u32,
    balance: f64,
    total_contributions: f64,
    yearly_interest: f64,
}

fn accumulate(
    principal: f64,
    monthly_contribution: f64,
    annual_rate_pct: f64,
    years: u32,
) -> Vec<GrowthYear> {
    let steps = simulate(
        principal,
        monthly_rate(annual_rate_pct),
        monthly_contribution,
        years * 12,
        FlowDirection::Deposit,
    );

    let mut total_contributions = principal;
    aggregate_years(&steps)
        .into_iter()
        .map(|y| {
            total_contributions += y.flow;
            GrowthYear {
                year: y.year,
                balance: y.closing_balance,
                total_contributions,
                yearly_interest: y.interest,
            }
        })
        .collect()
}

fn validate_years(field: &'static str, years: u32) -> Result<u32, CalcError> {
    if !(1..=MAX_PROJECTION_YEARS).contains(&years) {
        return Err(CalcError::invalid(
            field,
            format!("must be between 1 and {MAX_PROJECTION_YEARS}"),
        ));
    }
    Ok(years)
}

pub fn compute_compound_interest(
    inputs: &CompoundInterestInputs,
) -> Result<CompoundInterestResult, CalcError> {
    require_non_negative("principal", inputs.principal)?;
    require_non_negative("monthly_contribution", inputs.monthly_contribution)?;
    require_non_negative("annual_rate_pct", inputs.annual_rate_pct)?;
    validate_years("years", inputs.years)?;

    let growth = accumulate(
        inputs.principal,
        inputs.monthly_contribution,
        inputs.annual_rate_pct,
        inputs.years,
    );

    let breakdown = growth
        .iter()
        .map(|g| CompoundYear {
            year: g.year,
            balance: g.balance,
            total_contributions: g.total_contributions,
            yearly_interest: g.yearly_interest,
            total_interest: g.balance - g.total_contributions,
        })
        .collect::<Vec<_>>();

    let (final_balance, total_contributions) = breakdown
        .last()
        .map(|y| (y.balance, y.total_contributions))
        .unwrap_or((inputs.principal, inputs.principal));

    Ok(CompoundInterestResult {
        final_balance,
        total_contributions,
        total_interest: final_balance - total_contributions,
        breakdown,
    })
}

pub fn compute_loan_payoff(inputs: &LoanInputs) -> Result<LoanPayoffResult, CalcError> {
    let principal = require_positive("principal", inputs.principal)?;
    let payment = require_positive("monthly_payment", inputs.monthly_payment)?;
    require_non_negative("annual_rate_pct", inputs.annual_rate_pct)?;

    let rate = monthly_rate(inputs.annual_rate_pct);
    let first_month_interest = principal * rate;
    if payment <= first_month_interest {
        return Err(CalcError::InsufficientPayment {
            payment,
            first_month_interest,
        });
    }

    let steps = simulate(
        principal,
        rate,
        payment,
        LOAN_MONTH_CAP,
        FlowDirection::Repayment,
    );
    if steps.last().is_none_or(|s| s.closing_balance > 0.0) {
        return Err(CalcError::Unresolvable {
            context: "loan amortization".to_string(),
            cap_months: LOAN_MONTH_CAP,
        });
    }

    let annual_summary = aggregate_years(&steps)
        .into_iter()
        .map(|y| LoanYear {
            year: y.year,
            total_payments: y.flow,
            total_principal: y.flow - y.interest,
            total_interest: y.interest,
            end_balance: y.closing_balance,
        })
        .collect::<Vec<_>>();

    Ok(LoanPayoffResult {
        total_months: steps.len() as u32,
        total_interest: steps.iter().map(|s| s.interest).sum(),
        total_payments: steps.iter().map(|s| s.flow).sum(),
        annual_summary,
    })
}

/// Fixed monthly payment that retires `principal` in exactly `months` payments.
pub fn compute_amortized_payment(
    principal: f64,
    annual_rate_pct: f64,
    months: u32,
) -> Result<f64, CalcError> {
    require_positive("principal", principal)?;
    require_non_negative("annual_rate_pct", annual_rate_pct)?;
    if months == 0 {
        return Err(CalcError::invalid("months", "must be > 0"));
    }

    let r = monthly_rate(annual_rate_pct);
    if r == 0.0 {
        return Ok(principal / months as f64);
    }
    let growth = (1.0 + r).powi(months as i32);
    Ok(principal * r * growth / (growth - 1.0))
}

pub fn compute_retirement(inputs: &RetirementInputs) -> Result<RetirementResult, CalcError> {
    if inputs.retirement_age <= inputs.current_age {
        return Err(CalcError::invalid(
            "retirement_age",
            "must be greater than current_age",
        ));
    }
    require_non_negative("current_savings", inputs.current_savings)?;
    require_non_negative("monthly_contribution", inputs.monthly_contribution)?;
    require_non_negative("expected_return_pct", inputs.expected_return_pct)?;
    require_non_negative("withdrawal_rate_pct", inputs.withdrawal_rate_pct)?;

    let years = validate_years("retirement_age", inputs.retirement_age - inputs.current_age)?;
    let projection = accumulate(
        inputs.current_savings,
        inputs.monthly_contribution,
        inputs.expected_return_pct,
        years,
    )
    .into_iter()
    .map(|g| RetirementYear {
        age: inputs.current_age + g.year,
        year: g.year,
        balance: g.balance,
        total_contributions: g.total_contributions,
        yearly_growth: g.yearly_interest,
    })
    .collect::<Vec<_>>();

    let (retirement_corpus, total_contributions) = projection
        .last()
        .map(|y| (y.balance, y.total_contributions))
        .unwrap_or((inputs.current_savings, inputs.current_savings));
    let annual_withdrawal = retirement_corpus * inputs.withdrawal_rate_pct / 100.0;

    Ok(RetirementResult {
        retirement_corpus,
        total_contributions,
        total_growth: retirement_corpus - total_contributions,
        annual_withdrawal,
        monthly_withdrawal: annual_withdrawal / 12.0,
        projection,
    })
}

pub fn compute_inflation(inputs: &InflationInputs) -> Result<InflationResult, CalcError> {
    let current_value = require_positive("current_value", inputs.current_value)?;
    validate_years("years", inputs.years)?;
    require_non_negative("annual_rate_pct", inputs.annual_rate_pct)?;

    let r = inputs.annual_rate_pct / 100.0;
    let breakdown = (1..=inputs.years)
        .map(|year| {
            let factor = (1.0 + r).powi(year as i32);
            let purchasing_power = current_value / factor;
            InflationYear {
                year,
                future_value: current_value * factor,
                purchasing_power,
                value_eroded: current_value - purchasing_power,
                cumulative_inflation: factor - 1.0,
            }
        })
        .collect::<Vec<_>>();

    let last = breakdown
        .last()
        .copied()
        .ok_or_else(|| CalcError::invalid("years", "must be > 0"))?;
    require_finite("future_equivalent", last.future_value)?;

    Ok(InflationResult {
        current_value,
        future_equivalent: last.future_value,
        future_purchasing_power: last.purchasing_power,
        total_inflation: last.cumulative_inflation,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_assume, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_compound() -> CompoundInterestInputs {
        CompoundInterestInputs {
            principal: 10_000.0,
            monthly_contribution: 500.0,
            annual_rate_pct: 7.0,
            years: 20,
        }
    }

    fn sample_retirement() -> RetirementInputs {
        RetirementInputs {
            current_age: 30,
            retirement_age: 65,
            current_savings: 50_000.0,
            monthly_contribution: 1_000.0,
            expected_return_pct: 7.0,
            withdrawal_rate_pct: 4.0,
        }
    }

    #[test]
    fn compound_interest_contributions_and_growth() {
        let result = compute_compound_interest(&sample_compound()).expect("valid inputs");
        assert_approx(result.total_contributions, 10_000.0 + 500.0 * 12.0 * 20.0);
        assert!(result.final_balance > result.total_contributions);
        assert_eq!(result.breakdown.len(), 20);
        assert_approx(
            result.total_interest,
            result.final_balance - result.total_contributions,
        );
    }

    #[test]
    fn compound_interest_matches_closed_form_annuity() {
        let result = compute_compound_interest(&sample_compound()).expect("valid inputs");
        let r = 0.07 / 12.0;
        let n = 240;
        let growth = (1.0_f64 + r).powi(n);
        let expected = 10_000.0 * growth + 500.0 * (growth - 1.0) / r;
        assert_approx_tol(result.final_balance, expected, 1e-4);
    }

    #[test]
    fn compound_yearly_interest_is_growth_minus_contributions() {
        let result = compute_compound_interest(&sample_compound()).expect("valid inputs");
        let mut previous = 10_000.0;
        for row in &result.breakdown {
            assert_approx_tol(row.yearly_interest, row.balance - previous - 6_000.0, 1e-6);
            previous = row.balance;
        }
        let summed: f64 = result.breakdown.iter().map(|r| r.yearly_interest).sum();
        assert_approx_tol(summed, result.total_interest, 1e-6);
    }

    #[test]
    fn compound_interest_zero_rate_is_linear() {
        let inputs = CompoundInterestInputs {
            annual_rate_pct: 0.0,
            ..sample_compound()
        };
        let result = compute_compound_interest(&inputs).expect("valid inputs");
        assert_approx(result.final_balance, result.total_contributions);
        assert_approx(result.total_interest, 0.0);
    }

    #[test]
    fn compound_interest_rejects_out_of_range_inputs() {
        for inputs in [
            CompoundInterestInputs {
                years: 0,
                ..sample_compound()
            },
            CompoundInterestInputs {
                years: 101,
                ..sample_compound()
            },
            CompoundInterestInputs {
                annual_rate_pct: -1.0,
                ..sample_compound()
            },
            CompoundInterestInputs {
                principal: -5.0,
                ..sample_compound()
            },
            CompoundInterestInputs {
                monthly_contribution: f64::NAN,
                ..sample_compound()
            },
        ] {
            let err = compute_compound_interest(&inputs).expect_err("must reject");
            assert!(matches!(err, CalcError::InvalidInput { .. }), "{err:?}");
        }
    }

    #[test]
    fn loan_payoff_rejects_payment_at_or_below_first_interest() {
        let first_interest = 100_000.0 * 0.05 / 12.0;
        for payment in [first_interest, first_interest - 1.0, 10.0] {
            let err = compute_loan_payoff(&LoanInputs {
                principal: 100_000.0,
                annual_rate_pct: 5.0,
                monthly_payment: payment,
            })
            .expect_err("must reject insufficient payment");
            assert!(
                matches!(err, CalcError::InsufficientPayment { .. }),
                "{err:?}"
            );
        }
    }

    #[test]
    fn loan_payoff_reconciles_principal() {
        let result = compute_loan_payoff(&LoanInputs {
            principal: 250_000.0,
            annual_rate_pct: 6.5,
            monthly_payment: 2_000.0,
        })
        .expect("payment is sufficient");

        assert_approx_tol(
            result.total_payments - result.total_interest,
            250_000.0,
            250_000.0 * 1e-9,
        );
        let last = result.annual_summary.last().expect("non-empty summary");
        assert_eq!(last.end_balance, 0.0);
        assert_eq!(
            result.annual_summary.len() as u32,
            result.total_months.div_ceil(12)
        );
        let principal_paid: f64 = result.annual_summary.iter().map(|y| y.total_principal).sum();
        assert_approx_tol(principal_paid, 250_000.0, 1e-4);
    }

    #[test]
    fn loan_payoff_months_agree_with_amortized_payment() {
        let payment = compute_amortized_payment(200_000.0, 6.0, 360).expect("valid");
        assert_approx_tol(payment, 1_199.101_050_2, 1e-6);

        let result = compute_loan_payoff(&LoanInputs {
            principal: 200_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: payment + 1e-6,
        })
        .expect("payment is sufficient");
        assert_eq!(result.total_months, 360);
    }

    #[test]
    fn loan_payoff_zero_rate_is_linear() {
        let result = compute_loan_payoff(&LoanInputs {
            principal: 12_000.0,
            annual_rate_pct: 0.0,
            monthly_payment: 1_000.0,
        })
        .expect("valid");
        assert_eq!(result.total_months, 12);
        assert_approx(result.total_interest, 0.0);
        assert_approx(result.total_payments, 12_000.0);
    }

    #[test]
    fn loan_payoff_reports_unresolvable_beyond_cap() {
        let err = compute_loan_payoff(&LoanInputs {
            principal: 100_000.0,
            annual_rate_pct: 5.0,
            monthly_payment: 100_000.0 * 0.05 / 12.0 + 0.01,
        })
        .expect_err("payment barely above interest");
        assert!(matches!(err, CalcError::Unresolvable { .. }), "{err:?}");
    }

    #[test]
    fn loan_payoff_rejects_non_positive_principal() {
        let err = compute_loan_payoff(&LoanInputs {
            principal: 0.0,
            annual_rate_pct: 5.0,
            monthly_payment: 100.0,
        })
        .expect_err("must reject");
        assert!(matches!(err, CalcError::InvalidInput { field: "principal", .. }));
    }

    #[test]
    fn retirement_projection_tracks_ages_and_withdrawals() {
        let result = compute_retirement(&sample_retirement()).expect("valid inputs");
        assert_eq!(result.projection.len(), 35);
        assert_eq!(result.projection[0].age, 31);
        assert_eq!(result.projection[34].age, 65);
        assert_approx(result.total_contributions, 50_000.0 + 1_000.0 * 12.0 * 35.0);
        assert_approx(result.annual_withdrawal, result.retirement_corpus * 0.04);
        assert_approx(result.monthly_withdrawal, result.annual_withdrawal / 12.0);
        assert_approx(
            result.total_growth,
            result.retirement_corpus - result.total_contributions,
        );
    }

    #[test]
    fn retirement_accumulation_matches_compound_engine() {
        let retirement = compute_retirement(&sample_retirement()).expect("valid");
        let compound = compute_compound_interest(&CompoundInterestInputs {
            principal: 50_000.0,
            monthly_contribution: 1_000.0,
            annual_rate_pct: 7.0,
            years: 35,
        })
        .expect("valid");
        assert_eq!(retirement.retirement_corpus, compound.final_balance);
    }

    #[test]
    fn retirement_rejects_retirement_age_not_after_current_age() {
        for retirement_age in [29, 30] {
            let err = compute_retirement(&RetirementInputs {
                retirement_age,
                ..sample_retirement()
            })
            .expect_err("must reject");
            assert!(matches!(err, CalcError::InvalidInput { .. }));
        }
    }

    #[test]
    fn retirement_rejects_horizon_beyond_projection_limit() {
        for (current_age, retirement_age) in [(0, 101), (30, 400_000_000), (0, u32::MAX)] {
            let err = compute_retirement(&RetirementInputs {
                current_age,
                retirement_age,
                ..sample_retirement()
            })
            .expect_err("horizon too long");
            assert!(matches!(
                err,
                CalcError::InvalidInput {
                    field: "retirement_age",
                    ..
                }
            ));
        }

        let longest = compute_retirement(&RetirementInputs {
            current_age: 0,
            retirement_age: MAX_PROJECTION_YEARS,
            ..sample_retirement()
        })
        .expect("100 years is allowed");
        assert_eq!(longest.projection.len(), MAX_PROJECTION_YEARS as usize);
    }

    #[test]
    fn inflation_matches_closed_form() {
        let result = compute_inflation(&InflationInputs {
            current_value: 100_000.0,
            years: 25,
            annual_rate_pct: 3.0,
        })
        .expect("valid");
        let factor = 1.03_f64.powi(25);
        assert_approx(result.future_purchasing_power, 100_000.0 / factor);
        assert_approx(result.future_equivalent, 100_000.0 * factor);
        assert_approx_tol(result.future_purchasing_power, 47_760.0, 1.0);
        assert_approx_tol(result.future_equivalent, 209_378.0, 1.0);
        assert_approx(result.total_inflation, factor - 1.0);
        assert_eq!(result.breakdown.len(), 25);
    }

    #[test]
    fn inflation_zero_rate_keeps_value_flat() {
        let result = compute_inflation(&InflationInputs {
            current_value: 5_000.0,
            years: 10,
            annual_rate_pct: 0.0,
        })
        .expect("valid");
        for row in &result.breakdown {
            assert_eq!(row.future_value, 5_000.0);
            assert_eq!(row.purchasing_power, 5_000.0);
            assert_eq!(row.value_eroded, 0.0);
            assert_eq!(row.cumulative_inflation, 0.0);
        }
    }

    #[test]
    fn inflation_rejects_invalid_inputs() {
        for inputs in [
            InflationInputs {
                current_value: 0.0,
                years: 10,
                annual_rate_pct: 3.0,
            },
            InflationInputs {
                current_value: 100.0,
                years: 0,
                annual_rate_pct: 3.0,
            },
            InflationInputs {
                current_value: 100.0,
                years: 10,
                annual_rate_pct: -2.0,
            },
        ] {
            assert!(compute_inflation(&inputs).is_err());
        }
    }

    #[test]
    fn amortized_payment_handles_zero_rate_and_zero_months() {
        assert_approx(compute_amortized_payment(1_200.0, 0.0, 12).expect("valid"), 100.0);
        assert!(compute_amortized_payment(1_200.0, 5.0, 0).is_err());
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let inputs = sample_compound();
        assert_eq!(
            compute_compound_interest(&inputs),
            compute_compound_interest(&inputs)
        );
        let loan = LoanInputs {
            principal: 30_000.0,
            annual_rate_pct: 4.5,
            monthly_payment: 600.0,
        };
        assert_eq!(compute_loan_payoff(&loan), compute_loan_payoff(&loan));
        let retirement = sample_retirement();
        assert_eq!(
            compute_retirement(&retirement),
            compute_retirement(&retirement)
        );
        let inflation = InflationInputs {
            current_value: 1_000.0,
            years: 30,
            annual_rate_pct: 2.5,
        };
        assert_eq!(compute_inflation(&inflation), compute_inflation(&inflation));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_loan_principal_reconciles(
            principal in 1_000u32..1_000_000,
            rate_bp in 0u32..2_500,
            payment_bump in 1u32..50_000,
        ) {
            let principal = principal as f64;
            let annual_rate_pct = rate_bp as f64 / 100.0;
            let first_interest = principal * monthly_rate(annual_rate_pct);
            let monthly_payment = first_interest + principal / 600.0 + payment_bump as f64;
            let inputs = LoanInputs { principal, annual_rate_pct, monthly_payment };

            let result = compute_loan_payoff(&inputs);
            prop_assume!(result.is_ok());
            let result = result.expect("checked above");
            let principal_paid = result.total_payments - result.total_interest;
            prop_assert!((principal_paid - principal).abs() <= principal * 1e-6);
            prop_assert!(result.total_months <= LOAN_MONTH_CAP);
            for year in &result.annual_summary {
                prop_assert!(year.end_balance >= 0.0);
            }
        }

        #[test]
        fn prop_compound_balance_never_below_contributions(
            principal in 0u32..500_000,
            monthly in 0u32..10_000,
            rate_bp in 0u32..5_000,
            years in 1u32..=100,
        ) {
            let result = compute_compound_interest(&CompoundInterestInputs {
                principal: principal as f64,
                monthly_contribution: monthly as f64,
                annual_rate_pct: rate_bp as f64 / 100.0,
                years,
            }).expect("valid inputs");
            prop_assert_eq!(result.breakdown.len() as u32, years);
            prop_assert!(result.final_balance + 1e-6 >= result.total_contributions);
            for pair in result.breakdown.windows(2) {
                prop_assert!(pair[1].balance >= pair[0].balance);
            }
        }

        #[test]
        fn prop_inflation_future_and_present_are_reciprocal(
            value in 1u32..10_000_000,
            years in 1u32..=100,
            rate_bp in 0u32..2_000,
        ) {
            let result = compute_inflation(&InflationInputs {
                current_value: value as f64,
                years,
                annual_rate_pct: rate_bp as f64 / 100.0,
            }).expect("valid inputs");
            let v = value as f64;
            let product = result.future_equivalent * result.future_purchasing_power;
            prop_assert!((product - v * v).abs() <= v * v * 1e-9);
            prop_assert!(result.future_purchasing_power <= v);
        }
    }
}
