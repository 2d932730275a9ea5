use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TeaError;
use crate::types::{Money, Rate};
use crate::TeaResult;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Every optional parameter's default in one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaDefaults {
    pub inflation_rate: Rate,
    pub annual_operating_hours: Decimal,
    pub income_tax: Rate,
    pub incentives: Money,
    pub lang_factor: Decimal,
    pub construction_schedule: Vec<Rate>,
    pub startup_months: Decimal,
    pub startup_foc_frac: Rate,
    pub startup_voc_frac: Rate,
    pub startup_sales_frac: Rate,
    pub wc_over_fci: Rate,
    pub finance_interest: Rate,
    pub finance_years: u32,
    pub finance_fraction: Rate,
    pub property_tax: Rate,
    pub property_insurance: Rate,
    pub maintenance: Rate,
    pub administration: Rate,
    pub labor_cost: Money,
    pub fringe_benefits: Rate,
    pub supplies: Rate,
    pub other_costs_treatment: OtherCostTreatment,
}

impl Default for TeaDefaults {
    fn default() -> Self {
        TeaDefaults {
            inflation_rate: Decimal::ZERO,
            // 90% uptime
            annual_operating_hours: dec!(0.9) * dec!(365) * dec!(24),
            income_tax: dec!(0.35),
            incentives: Decimal::ZERO,
            lang_factor: Decimal::ONE,
            construction_schedule: vec![Decimal::ONE],
            startup_months: dec!(6),
            startup_foc_frac: dec!(0.1),
            startup_voc_frac: dec!(0.1),
            startup_sales_frac: dec!(0.1),
            wc_over_fci: dec!(0.05),
            finance_interest: dec!(0.05),
            finance_years: 8,
            finance_fraction: dec!(0.2),
            property_tax: dec!(0.05),
            property_insurance: dec!(0.02),
            maintenance: dec!(0.04),
            administration: dec!(0.01),
            labor_cost: dec!(1_000_000),
            fringe_benefits: dec!(0.40),
            supplies: dec!(0.20),
            other_costs_treatment: OtherCostTreatment::Taxable,
        }
    }
}

mod defaults {
    use super::*;

    macro_rules! default_fn {
        ($($name:ident: $ty:ty),* $(,)?) => {
            $(pub fn $name() -> $ty { TeaDefaults::default().$name })*
        };
    }

    default_fn!(
        inflation_rate: Rate,
        annual_operating_hours: Decimal,
        income_tax: Rate,
        incentives: Money,
        lang_factor: Decimal,
        construction_schedule: Vec<Rate>,
        startup_months: Decimal,
        startup_foc_frac: Rate,
        startup_voc_frac: Rate,
        startup_sales_frac: Rate,
        wc_over_fci: Rate,
        finance_interest: Rate,
        finance_years: u32,
        finance_fraction: Rate,
        property_tax: Rate,
        property_insurance: Rate,
        maintenance: Rate,
        administration: Rate,
        labor_cost: Money,
        fringe_benefits: Rate,
        supplies: Rate,
        other_costs_treatment: OtherCostTreatment,
    );
}

// ---------------------------------------------------------------------------
// Schedules and flags
// ---------------------------------------------------------------------------

/// How fixed capital is written off across the project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "DepreciationScheduleRepr", into = "DepreciationScheduleRepr")]
pub enum DepreciationSchedule {
    /// Equal fraction `1 / project_duration` every year
    #[default]
    Linear,
    /// Explicit fraction of FCI per project year
    Explicit(Vec<Rate>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DepreciationScheduleRepr {
    Tag(String),
    Fractions(Vec<Rate>),
    Other(serde_json::Value),
}

impl DepreciationSchedule {
    /// Parse the textual tag form. Only `linear` (any case) is recognised.
    pub fn from_tag(tag: &str) -> TeaResult<Self> {
        if tag.trim().eq_ignore_ascii_case("linear") {
            Ok(DepreciationSchedule::Linear)
        } else {
            Err(TeaError::UnsupportedDepreciationSchedule(format!("\"{tag}\"")))
        }
    }
}

impl TryFrom<DepreciationScheduleRepr> for DepreciationSchedule {
    type Error = TeaError;

    fn try_from(repr: DepreciationScheduleRepr) -> Result<Self, Self::Error> {
        match repr {
            DepreciationScheduleRepr::Tag(tag) => DepreciationSchedule::from_tag(&tag),
            DepreciationScheduleRepr::Fractions(fractions) => {
                Ok(DepreciationSchedule::Explicit(fractions))
            }
            DepreciationScheduleRepr::Other(value) => {
                Err(TeaError::UnsupportedDepreciationSchedule(value.to_string()))
            }
        }
    }
}

impl From<DepreciationSchedule> for DepreciationScheduleRepr {
    fn from(schedule: DepreciationSchedule) -> Self {
        match schedule {
            DepreciationSchedule::Linear => DepreciationScheduleRepr::Tag("linear".into()),
            DepreciationSchedule::Explicit(fractions) => {
                DepreciationScheduleRepr::Fractions(fractions)
            }
        }
    }
}

/// Whether `other_costs_across_project_duration` reduces taxable income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtherCostTreatment {
    #[default]
    Taxable,
    Nontaxable,
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Full parameter set of a techno-economic analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeaParams {
    /// Internal rate of return used for discounting (fraction)
    pub irr: Rate,
    /// Number of annual periods
    pub project_duration: u32,
    /// Total purchase cost of all equipment
    pub purchase_cost: Money,
    /// Hourly cost from the facility's material and energy balance
    pub hourly_variable_operating_cost: Money,
    /// Hourly product flows (mass, energy or other units)
    pub hourly_product_flows: Vec<Decimal>,
    /// Price per unit of each product flow, same order as the flows
    pub product_prices: Vec<Money>,
    /// Additional costs per project year not otherwise modelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_costs_across_project_duration: Option<Vec<Money>>,
    #[serde(default = "defaults::other_costs_treatment")]
    pub other_costs_treatment: OtherCostTreatment,
    /// Hourly fixed operating cost; when absent or zero FOC is estimated
    /// from FCI-based charges and labor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_fixed_operating_cost: Option<Money>,
    #[serde(default = "defaults::inflation_rate")]
    pub inflation_rate: Rate,
    #[serde(default)]
    pub depreciation_schedule: DepreciationSchedule,
    #[serde(default = "defaults::annual_operating_hours")]
    pub annual_operating_hours: Decimal,
    /// Combined federal and state income tax rate
    #[serde(default = "defaults::income_tax")]
    pub income_tax: Rate,
    /// Annual incentives
    #[serde(default = "defaults::incentives")]
    pub incentives: Money,
    /// Purchase cost multiplied by the Lang factor gives FCI
    #[serde(default = "defaults::lang_factor")]
    pub lang_factor: Decimal,
    /// Fraction of FCI spent in each construction year
    #[serde(default = "defaults::construction_schedule")]
    pub construction_schedule: Vec<Rate>,
    /// Months of the first operating year spent starting up
    #[serde(default = "defaults::startup_months")]
    pub startup_months: Decimal,
    #[serde(default = "defaults::startup_foc_frac")]
    pub startup_foc_frac: Rate,
    #[serde(default = "defaults::startup_voc_frac")]
    pub startup_voc_frac: Rate,
    #[serde(default = "defaults::startup_sales_frac")]
    pub startup_sales_frac: Rate,
    /// Working capital as a fraction of FCI
    #[serde(default = "defaults::wc_over_fci")]
    pub wc_over_fci: Rate,
    /// Yearly loan interest
    #[serde(default = "defaults::finance_interest")]
    pub finance_interest: Rate,
    /// Last year (exclusive) in which loan payments are made
    #[serde(default = "defaults::finance_years")]
    pub finance_years: u32,
    /// Fraction of FCI that is financed
    #[serde(default = "defaults::finance_fraction")]
    pub finance_fraction: Rate,
    #[serde(default = "defaults::property_tax")]
    pub property_tax: Rate,
    #[serde(default = "defaults::property_insurance")]
    pub property_insurance: Rate,
    #[serde(default = "defaults::maintenance")]
    pub maintenance: Rate,
    #[serde(default = "defaults::administration")]
    pub administration: Rate,
    #[serde(default = "defaults::labor_cost")]
    pub labor_cost: Money,
    /// Fraction of labor cost
    #[serde(default = "defaults::fringe_benefits")]
    pub fringe_benefits: Rate,
    /// Fraction of labor cost
    #[serde(default = "defaults::supplies")]
    pub supplies: Rate,
}

impl TeaParams {
    /// Build a parameter set from the required inputs, taking every other
    /// value from [`TeaDefaults`].
    pub fn new(
        irr: Rate,
        project_duration: u32,
        purchase_cost: Money,
        hourly_variable_operating_cost: Money,
        hourly_product_flows: Vec<Decimal>,
        product_prices: Vec<Money>,
    ) -> Self {
        let d = TeaDefaults::default();
        TeaParams {
            irr,
            project_duration,
            purchase_cost,
            hourly_variable_operating_cost,
            hourly_product_flows,
            product_prices,
            other_costs_across_project_duration: None,
            other_costs_treatment: d.other_costs_treatment,
            hourly_fixed_operating_cost: None,
            inflation_rate: d.inflation_rate,
            depreciation_schedule: DepreciationSchedule::Linear,
            annual_operating_hours: d.annual_operating_hours,
            income_tax: d.income_tax,
            incentives: d.incentives,
            lang_factor: d.lang_factor,
            construction_schedule: d.construction_schedule,
            startup_months: d.startup_months,
            startup_foc_frac: d.startup_foc_frac,
            startup_voc_frac: d.startup_voc_frac,
            startup_sales_frac: d.startup_sales_frac,
            wc_over_fci: d.wc_over_fci,
            finance_interest: d.finance_interest,
            finance_years: d.finance_years,
            finance_fraction: d.finance_fraction,
            property_tax: d.property_tax,
            property_insurance: d.property_insurance,
            maintenance: d.maintenance,
            administration: d.administration,
            labor_cost: d.labor_cost,
            fringe_benefits: d.fringe_benefits,
            supplies: d.supplies,
        }
    }

    pub fn duration(&self) -> usize {
        self.project_duration as usize
    }

    /// Last construction year, zero-indexed.
    pub fn startup_year(&self) -> usize {
        self.construction_schedule.len().saturating_sub(1)
    }

    /// Validate the parameter set, returning non-fatal warnings.
    pub fn validate(&self) -> TeaResult<Vec<String>> {
        let mut warnings = Vec::new();
        let n = self.duration();

        if self.project_duration < 1 {
            return Err(TeaError::invalid(
                "project_duration",
                "Project duration must be at least 1 year",
            ));
        }
        if self.irr <= dec!(-1) {
            return Err(TeaError::invalid("irr", "IRR must be greater than -100%"));
        }
        if self.inflation_rate <= dec!(-1) {
            return Err(TeaError::invalid(
                "inflation_rate",
                "Inflation rate must be greater than -100%",
            ));
        }
        if self.annual_operating_hours < Decimal::ZERO {
            return Err(TeaError::invalid(
                "annual_operating_hours",
                "Operating hours cannot be negative",
            ));
        }
        if self.startup_months < Decimal::ZERO || self.startup_months > dec!(12) {
            return Err(TeaError::invalid(
                "startup_months",
                "Startup period must be between 0 and 12 months",
            ));
        }

        // Products
        if self.hourly_product_flows.len() != self.product_prices.len() {
            return Err(TeaError::invalid(
                "product_prices",
                format!(
                    "{} prices supplied for {} product flows",
                    self.product_prices.len(),
                    self.hourly_product_flows.len()
                ),
            ));
        }

        // Construction and startup
        if self.construction_schedule.is_empty() {
            return Err(TeaError::invalid(
                "construction_schedule",
                "At least one construction year is required",
            ));
        }
        if self.startup_year() + 1 >= n {
            return Err(TeaError::invalid(
                "construction_schedule",
                format!(
                    "{} construction years leave no operating year within a {}-year project",
                    self.construction_schedule.len(),
                    n
                ),
            ));
        }
        let construction_total: Decimal = self.construction_schedule.iter().sum();
        if construction_total != Decimal::ONE {
            warnings.push(format!(
                "Construction schedule sums to {construction_total}, not 1; \
                 FCI flow will not equal FCI"
            ));
        }

        // Depreciation
        if let DepreciationSchedule::Explicit(fractions) = &self.depreciation_schedule {
            if fractions.len() != n {
                return Err(TeaError::invalid(
                    "depreciation_schedule",
                    format!(
                        "Explicit schedule has {} entries, expected one per project year ({n})",
                        fractions.len()
                    ),
                ));
            }
            let total: Decimal = fractions.iter().sum();
            if total != Decimal::ONE {
                warnings.push(format!(
                    "Depreciation schedule sums to {total}, not 1"
                ));
            }
        }

        // Other costs
        if let Some(other) = &self.other_costs_across_project_duration {
            if other.len() != n {
                return Err(TeaError::invalid(
                    "other_costs_across_project_duration",
                    format!("Expected {n} entries, got {}", other.len()),
                ));
            }
        }

        // Financing
        if self.finance_fraction > Decimal::ZERO {
            let start = self.loan_payment_start_year();
            if self.finance_years as usize <= start {
                return Err(TeaError::invalid(
                    "finance_years",
                    format!(
                        "Loan term of {} years leaves no repayment period after construction",
                        self.finance_years
                    ),
                ));
            }
            if self.finance_years as usize > n {
                return Err(TeaError::invalid(
                    "finance_years",
                    format!(
                        "Loan term of {} years extends beyond the {n}-year project",
                        self.finance_years
                    ),
                ));
            }
        }

        if matches!(self.hourly_fixed_operating_cost, Some(h) if !h.is_zero()) {
            warnings.push(
                "Hourly fixed operating cost override in use; FCI-based charges and labor ignored"
                    .into(),
            );
        }

        Ok(warnings)
    }

    /// First year of level loan payments: interest-only payments run while
    /// construction continues, capped by the loan term.
    pub fn loan_payment_start_year(&self) -> usize {
        self.construction_schedule
            .len()
            .min(self.finance_years as usize)
    }

    pub(crate) fn check_product_index(&self, product_index: usize) -> TeaResult<()> {
        if product_index >= self.product_prices.len() {
            return Err(TeaError::invalid(
                "product_index",
                format!(
                    "Product index {product_index} out of range for {} products",
                    self.product_prices.len()
                ),
            ));
        }
        Ok(())
    }
}
