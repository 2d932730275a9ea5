use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::composition::{
    AnnualFlows, CashFlowComposition, ConventionalComposition, HourlyVariableCost,
    VariableCostModel,
};
use super::flows;
use super::params::TeaParams;
use crate::error::TeaError;
use crate::solver::{solve_bracketed, DEFAULT_XTOL};
use crate::time_value::{checked_total, discount_factors, discounted};
use crate::types::{AnnualFlow, Money, Rate};
use crate::TeaResult;

// ---------------------------------------------------------------------------
// Computed table
// ---------------------------------------------------------------------------

/// Every annual series of one evaluation, aligned by project year.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowTable {
    pub irr: Rate,
    pub discount_rate: Rate,
    pub loan_payment_start_year: usize,
    pub flows: AnnualFlows,
    pub taxable_cashflow: AnnualFlow,
    pub nontaxable_cashflow: AnnualFlow,
    pub tax: AnnualFlow,
    pub net_earnings: AnnualFlow,
    pub total_cash_flow: AnnualFlow,
    pub discount_factor: AnnualFlow,
    pub present_value: AnnualFlow,
    pub cumulative_present_value: AnnualFlow,
    pub npv: Money,
}

/// One report row per project year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub year: u32,
    pub fixed_capital_investment: Money,
    pub working_capital: Money,
    pub fixed_operating_cost: Money,
    pub variable_operating_cost: Money,
    pub other_costs: Money,
    pub loan: Money,
    pub loan_interest_only_payment: Money,
    pub loan_payment: Money,
    pub loan_payment_interest: Money,
    pub depreciation: Money,
    pub taxable_cash_flow: Money,
    pub tax: Money,
    pub incentives: Money,
    pub sales: Money,
    pub net_earnings: Money,
    pub cash_flow: Money,
    pub discount_factor: Decimal,
    pub present_value: Money,
    pub cumulative_present_value: Money,
}

impl CashFlowTable {
    pub fn rows(&self) -> Vec<CashFlowRow> {
        let f = &self.flows;
        (0..self.total_cash_flow.len())
            .map(|i| CashFlowRow {
                year: i as u32,
                fixed_capital_investment: f.fci[i],
                working_capital: f.working_capital[i],
                fixed_operating_cost: f.foc[i],
                variable_operating_cost: f.voc[i],
                other_costs: f.other_costs[i],
                loan: f.loan_principal[i],
                loan_interest_only_payment: f.loan_interest_only_payments[i],
                loan_payment: f.loan_payments[i],
                loan_payment_interest: f.loan_payment_interest[i],
                depreciation: f.depreciation[i],
                taxable_cash_flow: self.taxable_cashflow[i],
                tax: self.tax[i],
                incentives: f.incentives[i],
                sales: f.sales[i],
                net_earnings: self.net_earnings[i],
                cash_flow: self.total_cash_flow[i],
                discount_factor: self.discount_factor[i],
                present_value: self.present_value[i],
                cumulative_present_value: self.cumulative_present_value[i],
            })
            .collect()
    }
}

/// Run the full cash-flow chain for `params` at `params.irr`.
///
/// Pure: nothing outside the returned table is touched, which is what lets
/// the solvers evaluate candidates on a snapshot.
pub fn compute_table<C, V>(
    params: &TeaParams,
    composition: &C,
    variable_cost: &V,
) -> TeaResult<CashFlowTable>
where
    C: CashFlowComposition + ?Sized,
    V: VariableCostModel + ?Sized,
{
    let n = params.duration();

    let interest = flows::loan_interest_only_payments_flow(params);
    let loan_payments = flows::loan_payments_flow(params, interest.loan_payment_start_year)?;
    let loan_payment_interest =
        flows::loan_payment_interest_flow(params, interest.loan_payment_start_year, &loan_payments);
    let annual = AnnualFlows {
        fci: flows::fci_flow(params),
        working_capital: flows::working_capital_flow(params),
        foc: flows::foc_flow(params)?,
        voc: flows::voc_flow(params, variable_cost.annual_voc(params))?,
        other_costs: flows::other_costs_flow(params),
        loan_principal: flows::loan_principal_flow(params),
        loan_interest_only_payments: interest.flow,
        loan_payments,
        loan_payment_interest,
        depreciation: flows::depreciation_flow(params)?,
        incentives: flows::incentives_flow(params),
        sales: flows::sales_flow(params)?,
    };

    let taxable = composition.taxable_cashflow(params, &annual);
    let nontaxable = composition.nontaxable_cashflow(params, &annual);
    if taxable.len() != n || nontaxable.len() != n {
        return Err(TeaError::invalid(
            "composition",
            format!(
                "Composition returned {} taxable and {} nontaxable entries for {n} years",
                taxable.len(),
                nontaxable.len()
            ),
        ));
    }

    let tax: AnnualFlow = taxable
        .iter()
        .map(|t| {
            if *t > Decimal::ZERO {
                params.income_tax * t
            } else {
                Decimal::ZERO
            }
        })
        .collect();

    let net_earnings: AnnualFlow = (0..n)
        .map(|i| taxable[i] + annual.incentives[i] - tax[i])
        .collect();
    let total_cash_flow: AnnualFlow = (0..n).map(|i| net_earnings[i] + nontaxable[i]).collect();

    let discount_rate = flows::discount_rate(params.irr, params.inflation_rate)?;
    let discount_factor = discount_factors(discount_rate, n)?;
    let present_value = discounted(&total_cash_flow, &discount_factor)?;

    let mut cumulative_present_value: AnnualFlow = Vec::with_capacity(n);
    for (year, pv) in present_value.iter().enumerate() {
        let previous = cumulative_present_value.last().copied().unwrap_or(Decimal::ZERO);
        let running = checked_total(&[previous, *pv]).map_err(|_| {
            TeaError::invalid(
                "discount_rate",
                format!("Cumulative present value overflows decimal range in year {year}"),
            )
        })?;
        cumulative_present_value.push(running);
    }
    let npv = cumulative_present_value.last().copied().unwrap_or(Decimal::ZERO);

    Ok(CashFlowTable {
        irr: params.irr,
        discount_rate,
        loan_payment_start_year: interest.loan_payment_start_year,
        flows: annual,
        taxable_cashflow: taxable,
        nontaxable_cashflow: nontaxable,
        tax,
        net_earnings,
        total_cash_flow,
        discount_factor,
        present_value,
        npv,
        cumulative_present_value,
    })
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Bounds for the IRR search.
pub const DEFAULT_IRR_BOUNDS: (Rate, Rate) = (Decimal::ZERO, Decimal::TEN);

/// Bounds for the selling-price search.
pub const DEFAULT_PRICE_BOUNDS: (Money, Money) = (Decimal::ZERO, Decimal::ONE_HUNDRED);

/// Cash-flow model over a validated parameter set.
///
/// Solves record their outcome in the model: the IRR used or found, and for
/// the selling-price solve the price written into `product_prices`. Failed
/// solves leave the model unchanged. Not meant for shared concurrent use;
/// clone it per scenario instead.
#[derive(Debug, Clone)]
pub struct TeaModel<C = ConventionalComposition, V = HourlyVariableCost> {
    params: TeaParams,
    composition: C,
    variable_cost: V,
    warnings: Vec<String>,
    last_table: Option<CashFlowTable>,
}

impl TeaModel {
    /// Validate `params` and build a model with the default hooks.
    pub fn new(params: TeaParams) -> TeaResult<Self> {
        TeaModel::with_hooks(params, ConventionalComposition, HourlyVariableCost)
    }
}

impl<C, V> TeaModel<C, V>
where
    C: CashFlowComposition,
    V: VariableCostModel,
{
    pub fn with_hooks(params: TeaParams, composition: C, variable_cost: V) -> TeaResult<Self> {
        let mut warnings = params.validate()?;
        if variable_cost.annual_voc(&params).is_zero() {
            warnings.push("Annual variable operating cost is zero".into());
        }
        Ok(TeaModel {
            params,
            composition,
            variable_cost,
            warnings,
            last_table: None,
        })
    }

    pub fn params(&self) -> &TeaParams {
        &self.params
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Table of the most recent successful evaluation or solve.
    pub fn cash_flow_table(&self) -> Option<&CashFlowTable> {
        self.last_table.as_ref()
    }

    /// Report rows of the most recent evaluation, if any.
    pub fn report_rows(&self) -> Option<Vec<CashFlowRow>> {
        self.last_table.as_ref().map(CashFlowTable::rows)
    }

    pub fn fci(&self) -> Money {
        flows::fci(&self.params)
    }

    pub fn foc(&self) -> Money {
        flows::foc(&self.params)
    }

    pub fn voc(&self) -> Money {
        self.variable_cost.annual_voc(&self.params)
    }

    pub fn annual_sales(&self) -> Money {
        flows::annual_sales(&self.params)
    }

    pub fn discount_rate(&self) -> TeaResult<Rate> {
        flows::discount_rate(self.params.irr, self.params.inflation_rate)
    }

    /// Overwrite one product price, e.g. to check a solved MPSP.
    pub fn set_product_price(&mut self, product_index: usize, price: Money) -> TeaResult<()> {
        self.params.check_product_index(product_index)?;
        self.params.product_prices[product_index] = price;
        Ok(())
    }

    fn evaluate(&self, params: &TeaParams) -> TeaResult<CashFlowTable> {
        compute_table(params, &self.composition, &self.variable_cost)
    }

    /// NPV at `irr` without touching the model.
    pub fn evaluate_npv(&self, irr: Rate) -> TeaResult<Money> {
        let mut snapshot = self.params.clone();
        snapshot.irr = irr;
        Ok(self.evaluate(&snapshot)?.npv)
    }

    /// Store `irr`, recompute every flow and return the NPV.
    pub fn npv_given_irr(&mut self, irr: Rate) -> TeaResult<Money> {
        let mut snapshot = self.params.clone();
        snapshot.irr = irr;
        let table = self.evaluate(&snapshot)?;
        let npv = table.npv;
        self.params = snapshot;
        self.last_table = Some(table);
        Ok(npv)
    }

    /// IRR in `[lower_bound, upper_bound]` at which NPV equals `target_npv`.
    pub fn irr_given_npv(
        &mut self,
        target_npv: Money,
        lower_bound: Rate,
        upper_bound: Rate,
    ) -> TeaResult<Rate> {
        let snapshot = self.params.clone();
        let irr = solve_bracketed(
            "IRR",
            target_npv,
            lower_bound,
            upper_bound,
            DEFAULT_XTOL,
            |candidate| {
                let mut p = snapshot.clone();
                p.irr = candidate;
                Ok(self.evaluate(&p)?.npv)
            },
        )?;
        self.npv_given_irr(irr)?;
        Ok(irr)
    }

    /// Selling price of `product_index` at which NPV at `irr` equals
    /// `target_npv`. The solved price is written into the model.
    pub fn mpsp_given_irr(
        &mut self,
        irr: Rate,
        product_index: usize,
        target_npv: Money,
        lower_bound: Money,
        upper_bound: Money,
    ) -> TeaResult<Money> {
        self.params.check_product_index(product_index)?;
        let mut snapshot = self.params.clone();
        snapshot.irr = irr;

        let price = solve_bracketed(
            "MPSP",
            target_npv,
            lower_bound,
            upper_bound,
            DEFAULT_XTOL,
            |candidate| {
                let mut p = snapshot.clone();
                p.product_prices[product_index] = candidate;
                Ok(self.evaluate(&p)?.npv)
            },
        )?;

        snapshot.product_prices[product_index] = price;
        let table = self.evaluate(&snapshot)?;
        self.params = snapshot;
        self.last_table = Some(table);
        Ok(price)
    }
}
