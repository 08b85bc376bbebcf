use std::net::IpAddr;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use fincalc::api::{ServerConfig, defaults};
use fincalc::core::{
    CompoundInterestInputs, Debt, InflationInputs, LoanInputs, Report, RetirementInputs,
    compute_compound_interest, compute_debt_payoff, compute_inflation, compute_loan_payoff,
    compute_retirement,
};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "fincalc",
    about = "Compound interest, loan, retirement, inflation and debt payoff calculators"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the JSON HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    Compound {
        #[arg(long, default_value_t = defaults::COMPOUND.principal)]
        principal: f64,
        #[arg(long, default_value_t = defaults::COMPOUND.monthly_contribution)]
        monthly: f64,
        #[arg(
            long,
            help = "Annual rate in percent, e.g. 7",
            default_value_t = defaults::COMPOUND.annual_rate_pct
        )]
        rate: f64,
        #[arg(long, default_value_t = defaults::COMPOUND.years)]
        years: u32,
        #[command(flatten)]
        output: OutputArgs,
    },
    Loan {
        #[arg(long, default_value_t = defaults::LOAN.principal)]
        amount: f64,
        #[arg(long, default_value_t = defaults::LOAN.annual_rate_pct)]
        rate: f64,
        #[arg(long, default_value_t = defaults::LOAN.monthly_payment)]
        payment: f64,
        #[command(flatten)]
        output: OutputArgs,
    },
    Retirement {
        #[arg(long, default_value_t = defaults::RETIREMENT.current_age)]
        current_age: u32,
        #[arg(long, default_value_t = defaults::RETIREMENT.retirement_age)]
        retirement_age: u32,
        #[arg(long, default_value_t = defaults::RETIREMENT.current_savings)]
        current_savings: f64,
        #[arg(long, default_value_t = defaults::RETIREMENT.monthly_contribution)]
        monthly_contribution: f64,
        #[arg(long, default_value_t = defaults::RETIREMENT.expected_return_pct)]
        expected_return: f64,
        #[arg(long, default_value_t = defaults::RETIREMENT.withdrawal_rate_pct)]
        withdrawal_rate: f64,
        #[command(flatten)]
        output: OutputArgs,
    },
    Inflation {
        #[arg(long, default_value_t = defaults::INFLATION.current_value)]
        current_value: f64,
        #[arg(long, default_value_t = defaults::INFLATION.years)]
        years: u32,
        #[arg(long, default_value_t = defaults::INFLATION.annual_rate_pct)]
        rate: f64,
        #[command(flatten)]
        output: OutputArgs,
    },
    Debts {
        #[arg(
            long = "debt",
            value_parser = parse_debt,
            help = "NAME:BALANCE:RATE:MIN, repeatable; defaults to the sample debts"
        )]
        debts: Vec<Debt>,
        #[arg(long, default_value_t = defaults::DEBT_EXTRA_PAYMENT)]
        extra_payment: f64,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct OutputArgs {
    /// Print the export report instead of the raw result.
    #[arg(long)]
    report: bool,
    /// Print the report as CSV.
    #[arg(long, conflicts_with = "report")]
    csv: bool,
}

fn parse_debt(raw: &str) -> Result<Debt, String> {
    // Split from the right so names may contain ':'.
    let mut parts = raw.rsplitn(4, ':');
    let min = parts.next();
    let rate = parts.next();
    let balance = parts.next();
    let name = parts.next();
    let (Some(name), Some(balance), Some(rate), Some(min)) = (name, balance, rate, min) else {
        return Err(format!("expected NAME:BALANCE:RATE:MIN, got '{raw}'"));
    };
    let number = |field: &str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid {field} '{value}': {e}"))
    };
    Ok(Debt::new(
        name.trim(),
        number("balance", balance)?,
        number("rate", rate)?,
        number("min payment", min)?,
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fincalc=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn emit<T: Serialize>(
    result: &T,
    report: impl FnOnce() -> Report,
    output: OutputArgs,
) -> Result<(), String> {
    if output.csv {
        print!("{}", report().to_csv());
        Ok(())
    } else if output.report {
        print_json(&report())
    } else {
        print_json(result)
    }
}

fn run_calculator(command: Command) -> Result<(), String> {
    match command {
        Command::Serve { .. } => Err("serve is not a calculator".to_string()),
        Command::Compound {
            principal,
            monthly,
            rate,
            years,
            output,
        } => {
            let inputs = CompoundInterestInputs {
                principal,
                monthly_contribution: monthly,
                annual_rate_pct: rate,
                years,
            };
            let result = compute_compound_interest(&inputs).map_err(|e| e.to_string())?;
            emit(&result, || result.report(&inputs), output)
        }
        Command::Loan {
            amount,
            rate,
            payment,
            output,
        } => {
            let inputs = LoanInputs {
                principal: amount,
                annual_rate_pct: rate,
                monthly_payment: payment,
            };
            let result = compute_loan_payoff(&inputs).map_err(|e| e.to_string())?;
            emit(&result, || result.report(&inputs), output)
        }
        Command::Retirement {
            current_age,
            retirement_age,
            current_savings,
            monthly_contribution,
            expected_return,
            withdrawal_rate,
            output,
        } => {
            let inputs = RetirementInputs {
                current_age,
                retirement_age,
                current_savings,
                monthly_contribution,
                expected_return_pct: expected_return,
                withdrawal_rate_pct: withdrawal_rate,
            };
            let result = compute_retirement(&inputs).map_err(|e| e.to_string())?;
            emit(&result, || result.report(&inputs), output)
        }
        Command::Inflation {
            current_value,
            years,
            rate,
            output,
        } => {
            let inputs = InflationInputs {
                current_value,
                years,
                annual_rate_pct: rate,
            };
            let result = compute_inflation(&inputs).map_err(|e| e.to_string())?;
            emit(&result, || result.report(&inputs), output)
        }
        Command::Debts {
            debts,
            extra_payment,
            output,
        } => {
            let debts = if debts.is_empty() {
                defaults::debts()
            } else {
                debts
            };
            let result = compute_debt_payoff(&debts, extra_payment).map_err(|e| e.to_string())?;
            emit(&result, || result.report(&debts, extra_payment), output)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let outcome = match cli.command {
        Command::Serve { bind, port } => {
            fincalc::api::run_http_server(ServerConfig { bind, port })
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "server error");
                    e.to_string()
                })
        }
        command => run_calculator(command),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
