use serde::Serialize;

use super::types::{
    CompoundInterestInputs, CompoundInterestResult, CompoundYear, DebtPayoffResult, Debt,
    InflationInputs, InflationResult, InflationYear, LoanInputs, LoanPayoffResult, LoanYear,
    RetirementInputs, RetirementResult, RetirementYear,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Count(u32),
    Amount(f64),
    /// Fraction, e.g. 0.25 for 25%.
    Ratio(f64),
}

impl Cell {
    fn csv_text(self) -> String {
        match self {
            Cell::Count(v) => v.to_string(),
            Cell::Amount(v) => format!("{v:.2}"),
            Cell::Ratio(v) => format!("{v:.6}"),
        }
    }
}

pub struct Column<R> {
    pub header: &'static str,
    pub accessor: fn(&R) -> Cell,
}

pub trait Tabular: Sized {
    fn columns() -> Vec<Column<Self>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    pub label: String,
    pub value: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub summary: Vec<SummaryItem>,
    pub table: Option<Table>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: Vec::new(),
            table: None,
        }
    }

    pub fn with_summary(mut self, label: impl Into<String>, value: Cell) -> Self {
        self.summary.push(SummaryItem {
            label: label.into(),
            value,
        });
        self
    }

    pub fn with_rows<R: Tabular>(mut self, rows: &[R]) -> Self {
        let columns = R::columns();
        self.table = Some(Table {
            headers: columns.iter().map(|c| c.header).collect(),
            rows: rows
                .iter()
                .map(|row| columns.iter().map(|c| (c.accessor)(row)).collect())
                .collect(),
        });
        self
    }

    /// Renders the table as CSV, or the summary as label,value pairs when
    /// there is no table.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        match &self.table {
            Some(table) => {
                out.push_str(&table.headers.join(","));
                out.push('\n');
                for row in &table.rows {
                    let line = row.iter().map(|c| c.csv_text()).collect::<Vec<_>>();
                    out.push_str(&line.join(","));
                    out.push('\n');
                }
            }
            None => {
                out.push_str("Label,Value\n");
                for item in &self.summary {
                    out.push_str(&csv_escape(&item.label));
                    out.push(',');
                    out.push_str(&item.value.csv_text());
                    out.push('\n');
                }
            }
        }
        out
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl Tabular for CompoundYear {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column {
                header: "Year",
                accessor: |r: &Self| Cell::Count(r.year),
            },
            Column {
                header: "Balance",
                accessor: |r: &Self| Cell::Amount(r.balance),
            },
            Column {
                header: "Contributions",
                accessor: |r: &Self| Cell::Amount(r.total_contributions),
            },
            Column {
                header: "Interest Earned",
                accessor: |r: &Self| Cell::Amount(r.yearly_interest),
            },
            Column {
                header: "Total Interest",
                accessor: |r: &Self| Cell::Amount(r.total_interest),
            },
        ]
    }
}

impl Tabular for LoanYear {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column {
                header: "Year",
                accessor: |r: &Self| Cell::Count(r.year),
            },
            Column {
                header: "Payments",
                accessor: |r: &Self| Cell::Amount(r.total_payments),
            },
            Column {
                header: "Principal",
                accessor: |r: &Self| Cell::Amount(r.total_principal),
            },
            Column {
                header: "Interest",
                accessor: |r: &Self| Cell::Amount(r.total_interest),
            },
            Column {
                header: "Remaining",
                accessor: |r: &Self| Cell::Amount(r.end_balance),
            },
        ]
    }
}

impl Tabular for RetirementYear {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column {
                header: "Age",
                accessor: |r: &Self| Cell::Count(r.age),
            },
            Column {
                header: "Year",
                accessor: |r: &Self| Cell::Count(r.year),
            },
            Column {
                header: "Balance",
                accessor: |r: &Self| Cell::Amount(r.balance),
            },
            Column {
                header: "Contributions",
                accessor: |r: &Self| Cell::Amount(r.total_contributions),
            },
            Column {
                header: "Growth",
                accessor: |r: &Self| Cell::Amount(r.yearly_growth),
            },
        ]
    }
}

impl Tabular for InflationYear {
    fn columns() -> Vec<Column<Self>> {
        vec![
            Column {
                header: "Year",
                accessor: |r: &Self| Cell::Count(r.year),
            },
            Column {
                header: "Future Cost",
                accessor: |r: &Self| Cell::Amount(r.future_value),
            },
            Column {
                header: "Purchasing Power",
                accessor: |r: &Self| Cell::Amount(r.purchasing_power),
            },
            Column {
                header: "Value Eroded",
                accessor: |r: &Self| Cell::Amount(r.value_eroded),
            },
            Column {
                header: "Cumulative Inflation",
                accessor: |r: &Self| Cell::Ratio(r.cumulative_inflation),
            },
        ]
    }
}

impl CompoundInterestResult {
    pub fn report(&self, inputs: &CompoundInterestInputs) -> Report {
        Report::new("Compound Interest Results")
            .with_summary("Final Balance", Cell::Amount(self.final_balance))
            .with_summary("Total Contributions", Cell::Amount(self.total_contributions))
            .with_summary("Total Interest Earned", Cell::Amount(self.total_interest))
            .with_summary("Initial Principal", Cell::Amount(inputs.principal))
            .with_summary("Monthly Contribution", Cell::Amount(inputs.monthly_contribution))
            .with_summary("Annual Rate", Cell::Ratio(inputs.annual_rate_pct / 100.0))
            .with_summary("Time Period (years)", Cell::Count(inputs.years))
            .with_rows(&self.breakdown)
    }
}

impl LoanPayoffResult {
    pub fn report(&self, inputs: &LoanInputs) -> Report {
        Report::new("Loan Payoff Schedule")
            .with_summary("Loan Amount", Cell::Amount(inputs.principal))
            .with_summary("Interest Rate", Cell::Ratio(inputs.annual_rate_pct / 100.0))
            .with_summary("Monthly Payment", Cell::Amount(inputs.monthly_payment))
            .with_summary("Payoff Time (months)", Cell::Count(self.total_months))
            .with_summary("Total Interest Paid", Cell::Amount(self.total_interest))
            .with_summary("Total Amount Paid", Cell::Amount(self.total_payments))
            .with_rows(&self.annual_summary)
    }
}

impl RetirementResult {
    pub fn report(&self, inputs: &RetirementInputs) -> Report {
        Report::new("Retirement Projection")
            .with_summary("Retirement Corpus", Cell::Amount(self.retirement_corpus))
            .with_summary("Total Contributions", Cell::Amount(self.total_contributions))
            .with_summary("Investment Growth", Cell::Amount(self.total_growth))
            .with_summary("Annual Withdrawal", Cell::Amount(self.annual_withdrawal))
            .with_summary("Monthly Withdrawal", Cell::Amount(self.monthly_withdrawal))
            .with_summary("Current Age", Cell::Count(inputs.current_age))
            .with_summary("Retirement Age", Cell::Count(inputs.retirement_age))
            .with_rows(&self.projection)
    }
}

impl InflationResult {
    pub fn report(&self, inputs: &InflationInputs) -> Report {
        Report::new("Inflation Impact Analysis")
            .with_summary("Current Value", Cell::Amount(self.current_value))
            .with_summary("Future Equivalent Cost", Cell::Amount(self.future_equivalent))
            .with_summary("Future Purchasing Power", Cell::Amount(self.future_purchasing_power))
            .with_summary("Total Inflation", Cell::Ratio(self.total_inflation))
            .with_summary("Inflation Rate", Cell::Ratio(inputs.annual_rate_pct / 100.0))
            .with_summary("Time Period (years)", Cell::Count(inputs.years))
            .with_rows(&self.breakdown)
    }
}

impl DebtPayoffResult {
    /// Summary only; the per-strategy timelines are chart data.
    pub fn report(&self, debts: &[Debt], extra_payment: f64) -> Report {
        let total_debt = debts.iter().map(|d| d.balance).sum();
        Report::new("Debt Payoff Strategy")
            .with_summary("Total Debt", Cell::Amount(total_debt))
            .with_summary("Extra Monthly Payment", Cell::Amount(extra_payment))
            .with_summary("Snowball Payoff Time (months)", Cell::Count(self.snowball.total_months))
            .with_summary("Snowball Interest", Cell::Amount(self.snowball.total_interest))
            .with_summary(
                "Avalanche Payoff Time (months)",
                Cell::Count(self.avalanche.total_months),
            )
            .with_summary("Avalanche Interest", Cell::Amount(self.avalanche.total_interest))
            .with_summary("Interest Saved (Snowball)", Cell::Amount(self.interest_saved_snowball))
            .with_summary("Interest Saved (Avalanche)", Cell::Amount(self.interest_saved_avalanche))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{compute_debt_payoff, compute_loan_payoff};

    fn sample_loan() -> LoanInputs {
        LoanInputs {
            principal: 12_000.0,
            annual_rate_pct: 0.0,
            monthly_payment: 500.0,
        }
    }

    #[test]
    fn rows_follow_column_order() {
        let inputs = sample_loan();
        let result = compute_loan_payoff(&inputs).expect("valid");
        let report = result.report(&inputs);

        let table = report.table.expect("loan report has a table");
        assert_eq!(
            table.headers,
            ["Year", "Payments", "Principal", "Interest", "Remaining"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Count(1));
        assert_eq!(table.rows[0][1], Cell::Amount(6_000.0));
        assert_eq!(table.rows[1][4], Cell::Amount(0.0));
        assert_eq!(report.title, "Loan Payoff Schedule");
        assert_eq!(report.summary[3].value, Cell::Count(24));
    }

    #[test]
    fn csv_renders_table_rows() {
        let inputs = sample_loan();
        let csv = compute_loan_payoff(&inputs).expect("valid").report(&inputs).to_csv();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Year,Payments,Principal,Interest,Remaining");
        assert_eq!(lines[1], "1,6000.00,6000.00,0.00,6000.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn summary_only_report_renders_label_value_csv() {
        let debts = vec![Debt::new("Card, gold", 1_000.0, 10.0, 100.0)];
        let result = compute_debt_payoff(&debts, 50.0).expect("resolvable");
        let report = result.report(&debts, 50.0);
        assert!(report.table.is_none());
        let csv = report.to_csv();
        assert!(csv.starts_with("Label,Value\nTotal Debt,1000.00\n"));
    }

    #[test]
    fn cells_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&vec![Cell::Count(3), Cell::Amount(1.5)])
            .expect("serializes");
        assert_eq!(json, "[3,1.5]");
        assert_eq!(csv_escape("a \"b\""), "\"a \"\"b\"\"\"");
    }
}
