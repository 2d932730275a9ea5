//! Extension points of the cash-flow chain.
//!
//! [`VariableCostModel`] supplies the annual VOC and [`CashFlowComposition`]
//! splits the annual flows into a taxable and a nontaxable part. The
//! defaults below are working formulas; replace them when a facility needs
//! a different cost basis or tax treatment.

use rust_decimal::Decimal;

use super::params::{OtherCostTreatment, TeaParams};
use crate::types::{AnnualFlow, Money};

/// Annual flows by category before taxation, all as positive amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualFlows {
    pub fci: AnnualFlow,
    pub working_capital: AnnualFlow,
    pub foc: AnnualFlow,
    pub voc: AnnualFlow,
    pub other_costs: AnnualFlow,
    pub loan_principal: AnnualFlow,
    pub loan_interest_only_payments: AnnualFlow,
    pub loan_payments: AnnualFlow,
    /// Interest share of `loan_payments`
    pub loan_payment_interest: AnnualFlow,
    pub depreciation: AnnualFlow,
    pub incentives: AnnualFlow,
    pub sales: AnnualFlow,
}

/// Source of the annual variable operating cost.
pub trait VariableCostModel {
    /// Annual VOC at full production. Must be non-negative for a cost.
    fn annual_voc(&self, params: &TeaParams) -> Money;
}

/// Annualises `hourly_variable_operating_cost` over the operating hours,
/// the same way FOC overrides and sales are annualised.
#[derive(Debug, Clone, Copy, Default)]
pub struct HourlyVariableCost;

impl VariableCostModel for HourlyVariableCost {
    fn annual_voc(&self, params: &TeaParams) -> Money {
        params.hourly_variable_operating_cost * params.annual_operating_hours
    }
}

impl<F> VariableCostModel for F
where
    F: Fn(&TeaParams) -> Money,
{
    fn annual_voc(&self, params: &TeaParams) -> Money {
        self(params)
    }
}

/// Split of annual flows into taxable and nontaxable cash flow.
///
/// Both vectors must have one entry per project year. Tax is levied on the
/// positive part of the taxable flow only; incentives are added after tax.
pub trait CashFlowComposition {
    fn taxable_cashflow(&self, params: &TeaParams, flows: &AnnualFlows) -> AnnualFlow;

    fn nontaxable_cashflow(&self, params: &TeaParams, flows: &AnnualFlows) -> AnnualFlow;
}

/// Revenue less operating costs, depreciation and loan interest (during
/// construction and within repayments) is taxable. Capital, working capital
/// and loan principal movements are not; depreciation is added back there
/// since it is a non-cash charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalComposition;

impl CashFlowComposition for ConventionalComposition {
    fn taxable_cashflow(&self, params: &TeaParams, flows: &AnnualFlows) -> AnnualFlow {
        let taxable_other = params.other_costs_treatment == OtherCostTreatment::Taxable;
        (0..flows.sales.len())
            .map(|i| {
                let other = if taxable_other {
                    flows.other_costs[i]
                } else {
                    Decimal::ZERO
                };
                flows.sales[i]
                    - flows.foc[i]
                    - flows.voc[i]
                    - flows.depreciation[i]
                    - flows.loan_interest_only_payments[i]
                    - flows.loan_payment_interest[i]
                    - other
            })
            .collect()
    }

    fn nontaxable_cashflow(&self, params: &TeaParams, flows: &AnnualFlows) -> AnnualFlow {
        let nontaxable_other = params.other_costs_treatment == OtherCostTreatment::Nontaxable;
        (0..flows.sales.len())
            .map(|i| {
                let other = if nontaxable_other {
                    flows.other_costs[i]
                } else {
                    Decimal::ZERO
                };
                flows.depreciation[i] + flows.loan_principal[i]
                    - (flows.loan_payments[i] - flows.loan_payment_interest[i])
                    - flows.fci[i]
                    - flows.working_capital[i]
                    - other
            })
            .collect()
    }
}
