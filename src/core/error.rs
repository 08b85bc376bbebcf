use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error(
        "monthly payment {payment:.2} must exceed first-month interest {first_month_interest:.2}"
    )]
    InsufficientPayment {
        payment: f64,
        first_month_interest: f64,
    },

    #[error("{context} did not resolve within {cap_months} months")]
    Unresolvable { context: String, cap_months: u32 },
}

impl CalcError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "invalid-input",
            CalcError::InsufficientPayment { .. } => "insufficient-payment",
            CalcError::Unresolvable { .. } => "unresolvable",
        }
    }
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::invalid(field, "must be a finite number"))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<f64, CalcError> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(CalcError::invalid(field, "must be >= 0"));
    }
    Ok(value)
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, CalcError> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(CalcError::invalid(field, "must be > 0"));
    }
    Ok(value)
}
