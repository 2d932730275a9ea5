use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tea_core::cash_flow::{
    flows, run_tea, ConventionalComposition, DepreciationSchedule, OtherCostTreatment,
    TeaInput, TeaModel, TeaParams, TeaSolve,
};
use tea_core::time_value::discount_factors;
use tea_core::TeaError;

/// Two-product reactor facility: products C and D at 300 and 200 kg/h,
/// three construction years, 40-year life.
fn worked_example() -> TeaParams {
    let mut p = TeaParams::new(
        dec!(0.10),
        40,
        dec!(5_000_000),
        // A and B feeds plus electricity, $/h
        dec!(250) * dec!(1.5) + dec!(250) * dec!(1.2) + dec!(100) * dec!(0.07),
        vec![dec!(300), dec!(200)],
        vec![dec!(4.2), dec!(1.1)],
    );
    p.income_tax = dec!(0.15);
    p.lang_factor = dec!(1.5);
    p.construction_schedule = vec![dec!(0.5), dec!(0.25), dec!(0.25)];
    p.labor_cost = dec!(10) * dec!(140_000);
    p
}

// ===========================================================================
// Flow properties
// ===========================================================================

#[test]
fn test_fci_flow_sums_to_fci_for_any_schedule() {
    let schedules = vec![
        vec![dec!(1)],
        vec![dec!(0.5), dec!(0.5)],
        vec![dec!(0.5), dec!(0.25), dec!(0.25)],
        vec![dec!(0.1), dec!(0.2), dec!(0.3), dec!(0.4)],
    ];
    for schedule in schedules {
        let mut p = worked_example();
        p.construction_schedule = schedule.clone();
        let flow = flows::fci_flow(&p);
        assert_eq!(flow.len(), 40);
        assert_eq!(flow.iter().sum::<Decimal>(), dec!(7_500_000));
        assert!(flow[schedule.len()..].iter().all(|v| v.is_zero()));
    }
}

#[test]
fn test_depreciation_sums_to_fci() {
    let mut p = worked_example();
    let linear = flows::depreciation_flow(&p).unwrap();
    assert_eq!(linear.iter().sum::<Decimal>(), flows::fci(&p));

    let mut fractions = vec![dec!(0.02); 40];
    fractions[0] = dec!(0.22);
    p.depreciation_schedule = DepreciationSchedule::Explicit(fractions);
    let explicit = flows::depreciation_flow(&p).unwrap();
    assert_eq!(explicit[0], dec!(1_650_000));
    assert_eq!(explicit.iter().sum::<Decimal>(), flows::fci(&p));
}

#[test]
fn test_startup_ramp_for_each_construction_length() {
    for k in 1..=4usize {
        let mut p = worked_example();
        p.construction_schedule = vec![Decimal::ONE / Decimal::from(k as u64); k];
        let annual_foc = flows::foc(&p);
        let annual_sales = flows::annual_sales(&p);
        let factor = flows::startup_factor(p.startup_months, dec!(0.1));

        for (flow, annual) in [
            (flows::foc_flow(&p).unwrap(), annual_foc),
            (flows::sales_flow(&p).unwrap(), annual_sales),
            (flows::voc_flow(&p, dec!(1000)).unwrap(), dec!(1000)),
        ] {
            assert!(flow[..k].iter().all(|v| v.is_zero()), "k = {k}");
            assert_eq!(flow[k], factor * annual);
            assert!(flow[k + 1..].iter().all(|v| *v == annual));
        }
    }
}

#[test]
fn test_loan_start_year_passed_between_flows() {
    let p = worked_example();
    let interest = flows::loan_interest_only_payments_flow(&p);
    assert_eq!(interest.loan_payment_start_year, 3);
    let payments = flows::loan_payments_flow(&p, interest.loan_payment_start_year).unwrap();
    assert_eq!(payments.iter().filter(|v| !v.is_zero()).count(), 5);
    assert!(payments[..3].iter().all(|v| v.is_zero()));
}

#[test]
fn test_repayment_interest_is_deducted_from_taxable_income() {
    let mut model = TeaModel::new(worked_example()).unwrap();
    model.npv_given_irr(dec!(0.10)).unwrap();
    let table = model.cash_flow_table().unwrap();
    let f = &table.flows;

    for year in [4usize, 7] {
        let interest = f.loan_payment_interest[year];
        assert!(interest > Decimal::ZERO, "year {year}");
        assert!(interest < f.loan_payments[year]);
        let operating = f.sales[year] - f.foc[year] - f.voc[year] - f.depreciation[year];
        assert_eq!(table.taxable_cashflow[year], operating - interest);
    }
    // after the loan term neither interest nor payments remain
    assert!(f.loan_payment_interest[8..].iter().all(|v| v.is_zero()));

    let principal_repaid: Decimal = f
        .loan_payments
        .iter()
        .zip(f.loan_payment_interest.iter())
        .map(|(pay, interest)| pay - interest)
        .sum();
    let principal: Decimal = f.loan_principal.iter().sum();
    assert!((principal_repaid - principal).abs() < dec!(0.000001));
}

// ===========================================================================
// NPV
// ===========================================================================

#[test]
fn test_all_zero_model_npv_is_zero() {
    let mut p = TeaParams::new(
        Decimal::ZERO,
        10,
        Decimal::ZERO,
        Decimal::ZERO,
        vec![Decimal::ZERO],
        vec![Decimal::ZERO],
    );
    p.labor_cost = Decimal::ZERO;
    let mut model = TeaModel::new(p).unwrap();
    assert_eq!(model.npv_given_irr(Decimal::ZERO).unwrap(), Decimal::ZERO);
}

#[test]
fn test_incentives_add_their_present_value() {
    let mut base = TeaModel::new(worked_example()).unwrap();
    let npv_base = base.npv_given_irr(dec!(0.10)).unwrap();

    let mut p = worked_example();
    p.incentives = dec!(50_000);
    let mut with_incentives = TeaModel::new(p).unwrap();
    let npv_incentives = with_incentives.npv_given_irr(dec!(0.10)).unwrap();

    let pv_incentives: Decimal = discount_factors(dec!(0.10), 40)
        .unwrap()
        .iter()
        .map(|f| f * dec!(50_000))
        .sum();
    assert!((npv_incentives - npv_base - pv_incentives).abs() < dec!(0.0000001));
}

#[test]
fn test_taxable_other_costs_carry_a_tax_shield() {
    let mut p = worked_example();
    p.other_costs_across_project_duration = Some(vec![dec!(100_000); 40]);

    p.other_costs_treatment = OtherCostTreatment::Taxable;
    let npv_taxable = TeaModel::new(p.clone())
        .unwrap()
        .npv_given_irr(dec!(0.10))
        .unwrap();

    p.other_costs_treatment = OtherCostTreatment::Nontaxable;
    let npv_nontaxable = TeaModel::new(p).unwrap().npv_given_irr(dec!(0.10)).unwrap();

    assert!(npv_taxable > npv_nontaxable);
}

#[test]
fn test_inflation_lowers_discount_rate() {
    let mut p = worked_example();
    p.inflation_rate = dec!(0.02);
    let model = TeaModel::new(p).unwrap();
    let r = model.discount_rate().unwrap();
    assert!(r < dec!(0.10) && r > dec!(0.07));
}

// ===========================================================================
// Solves
// ===========================================================================

#[test]
fn test_irr_round_trip() {
    for x in [dec!(0.05), dec!(0.2), dec!(0.45)] {
        let mut model = TeaModel::new(worked_example()).unwrap();
        let target = model.npv_given_irr(x).unwrap();
        let irr = model.irr_given_npv(target, dec!(0), dec!(10)).unwrap();
        assert!((irr - x).abs() < dec!(0.00001), "x = {x}, irr = {irr}");
    }
}

#[test]
fn test_mpsp_round_trip() {
    let mut model = TeaModel::new(worked_example()).unwrap();
    let target = dec!(1_000_000);
    let price = model
        .mpsp_given_irr(dec!(0.15), 0, target, dec!(0), dec!(100))
        .unwrap();

    let mut check = TeaModel::new(worked_example()).unwrap();
    check.set_product_price(0, price).unwrap();
    let npv = check.npv_given_irr(dec!(0.15)).unwrap();
    assert!((npv - target).abs() < dec!(0.00001), "npv = {npv}");
}

#[test]
fn test_unreachable_npv_is_a_solve_error() {
    let mut model = TeaModel::new(worked_example()).unwrap();
    let err = model
        .irr_given_npv(dec!(1_000_000_000_000), dec!(0), dec!(10))
        .unwrap_err();
    match err {
        TeaError::BracketFailure {
            target,
            lower_bound,
            upper_bound,
            objective_at_lower,
            objective_at_upper,
            ..
        } => {
            assert_eq!(target, dec!(1_000_000_000_000));
            assert_eq!(lower_bound, dec!(0));
            assert_eq!(upper_bound, dec!(10));
            assert!(objective_at_lower < Decimal::ZERO);
            assert!(objective_at_upper < Decimal::ZERO);
        }
        other => panic!("expected BracketFailure, got {other:?}"),
    }
}

#[test]
fn test_deeply_negative_irr_is_an_error_not_a_panic() {
    let mut model = TeaModel::new(worked_example()).unwrap();
    let err = model.npv_given_irr(dec!(-0.9)).unwrap_err();
    assert!(matches!(err, TeaError::InvalidInput { .. }), "{err:?}");
    assert!(model.cash_flow_table().is_none());
    assert_eq!(model.params().irr, dec!(0.10));
}

#[test]
fn test_widened_irr_bracket_overflow_is_an_error() {
    let mut model = TeaModel::new(worked_example()).unwrap();
    assert!(model
        .irr_given_npv(Decimal::ZERO, dec!(-0.95), dec!(10))
        .is_err());
    assert!(model.cash_flow_table().is_none());

    // a negative bound that stays in range still solves
    let irr = model
        .irr_given_npv(Decimal::ZERO, dec!(-0.5), dec!(10))
        .unwrap();
    assert!(irr > Decimal::ZERO && irr < dec!(10), "irr = {irr}");
}

#[test]
fn test_worked_example() {
    let mut model = TeaModel::new(worked_example()).unwrap();
    let irr = model.irr_given_npv(Decimal::ZERO, dec!(0), dec!(10)).unwrap();
    assert!(irr > Decimal::ZERO && irr < dec!(10), "irr = {irr}");

    let mpsp = model
        .mpsp_given_irr(dec!(0.15), 0, Decimal::ZERO, dec!(0), dec!(100))
        .unwrap();
    assert!(mpsp > Decimal::ZERO && mpsp < dec!(100), "mpsp = {mpsp}");
    assert_eq!(model.params().product_prices[0], mpsp);
    assert_eq!(model.report_rows().unwrap().len(), 40);
}

#[test]
fn test_variable_cost_hook_matches_hourly_default() {
    let p = worked_example();
    let hourly = p.hourly_variable_operating_cost;
    let mut default_model = TeaModel::new(p.clone()).unwrap();
    let mut hooked = TeaModel::with_hooks(p, ConventionalComposition, move |params: &TeaParams| {
        hourly * params.annual_operating_hours
    })
    .unwrap();
    assert_eq!(
        default_model.npv_given_irr(dec!(0.1)).unwrap(),
        hooked.npv_given_irr(dec!(0.1)).unwrap()
    );
}

// ===========================================================================
// Envelope
// ===========================================================================

#[test]
fn test_run_tea_from_json() {
    let json = r#"{
        "parameters": {
            "irr": 0.10,
            "project_duration": 40,
            "purchase_cost": 5000000,
            "hourly_variable_operating_cost": 682,
            "hourly_product_flows": [300, 200],
            "product_prices": [4.2, 1.1],
            "income_tax": 0.15,
            "lang_factor": 1.5,
            "construction_schedule": [0.5, 0.25, 0.25],
            "labor_cost": 1400000,
            "depreciation_schedule": "Linear"
        },
        "solve": { "type": "irr" }
    }"#;
    let input: TeaInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.parameters, worked_example());

    let result = run_tea(&input).unwrap();
    assert_eq!(result.result.solved_for, "irr");
    assert!(result.result.npv.abs() < dec!(1));
    assert_eq!(result.result.cash_flows.len(), 40);

    let npv_input = TeaInput {
        solve: TeaSolve::Npv {
            irr: Some(dec!(0.10)),
        },
        ..input
    };
    let result = run_tea(&npv_input).unwrap();
    assert!(result.result.npv > Decimal::ZERO);
    assert!(result.result.discounted_payback_year.is_some());
}

#[test]
fn test_run_tea_rejects_unsupported_depreciation() {
    let json = r#"{
        "parameters": {
            "irr": 0.10,
            "project_duration": 10,
            "purchase_cost": 1000,
            "hourly_variable_operating_cost": 1,
            "hourly_product_flows": [1],
            "product_prices": [1],
            "depreciation_schedule": "MACRS"
        }
    }"#;
    assert!(serde_json::from_str::<TeaInput>(json).is_err());
}
