use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use tea_core::cash_flow::{self, TeaDefaults, TeaInput, TeaParams, TeaSolve};

use crate::input;
use crate::output;

/// Arguments for an NPV evaluation
#[derive(Args)]
pub struct NpvArgs {
    /// Path to a JSON or YAML parameter file (stdin JSON when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// IRR to discount at (defaults to the parameter file's irr)
    #[arg(long, allow_hyphen_values = true)]
    pub irr: Option<Decimal>,

    /// Write the year-by-year cash-flow table to this CSV file
    #[arg(long)]
    pub report: Option<String>,
}

/// Arguments for an IRR solve
#[derive(Args)]
pub struct IrrArgs {
    /// Path to a JSON or YAML parameter file (stdin JSON when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// NPV the solved IRR must produce
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub target_npv: Decimal,

    /// Lower IRR bound of the search
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub lower_bound: Decimal,

    /// Upper IRR bound of the search
    #[arg(long, default_value = "10")]
    pub upper_bound: Decimal,

    /// Write the year-by-year cash-flow table to this CSV file
    #[arg(long)]
    pub report: Option<String>,
}

/// Arguments for a minimum product selling price solve
#[derive(Args)]
pub struct MpspArgs {
    /// Path to a JSON or YAML parameter file (stdin JSON when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// IRR held fixed during the search (defaults to the parameter file's irr)
    #[arg(long, allow_hyphen_values = true)]
    pub irr: Option<Decimal>,

    /// Index of the product whose price is solved
    #[arg(long, default_value = "0")]
    pub product_index: usize,

    /// NPV the solved price must produce
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub target_npv: Decimal,

    /// Lower price bound of the search
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub lower_bound: Decimal,

    /// Upper price bound of the search
    #[arg(long, default_value = "100")]
    pub upper_bound: Decimal,

    /// Write the year-by-year cash-flow table to this CSV file
    #[arg(long)]
    pub report: Option<String>,
}

fn load_parameters(path: Option<&str>) -> Result<TeaParams, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_config(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input <file.json|file.yaml> or stdin required for cash-flow analysis".into())
    }
}

fn solve(
    parameters: TeaParams,
    solve: TeaSolve,
    report: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let result = cash_flow::run_tea(&TeaInput { parameters, solve })?;
    if let Some(path) = report {
        output::csv_out::write_report(path, &result.result.cash_flows)?;
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parameters = load_parameters(args.input.as_deref())?;
    solve(
        parameters,
        TeaSolve::Npv { irr: args.irr },
        args.report.as_deref(),
    )
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parameters = load_parameters(args.input.as_deref())?;
    solve(
        parameters,
        TeaSolve::Irr {
            target_npv: args.target_npv,
            lower_bound: args.lower_bound,
            upper_bound: args.upper_bound,
        },
        args.report.as_deref(),
    )
}

pub fn run_mpsp(args: MpspArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parameters = load_parameters(args.input.as_deref())?;
    solve(
        parameters,
        TeaSolve::Mpsp {
            irr: args.irr,
            product_index: args.product_index,
            target_npv: args.target_npv,
            lower_bound: args.lower_bound,
            upper_bound: args.upper_bound,
        },
        args.report.as_deref(),
    )
}

pub fn run_defaults() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(TeaDefaults::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const JSON_DEMO: &str = "demos/two_product_plant.json";
    const YAML_DEMO: &str = "demos/two_product_plant.yaml";

    fn result_field(value: &Value, key: &str) -> Decimal {
        value["result"][key]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("missing {key}"))
    }

    #[test]
    fn test_npv_from_json_file() {
        let value = run_npv(NpvArgs {
            input: Some(JSON_DEMO.into()),
            irr: Some(dec!(0.10)),
            report: None,
        })
        .unwrap();
        assert_eq!(value["result"]["solved_for"], "npv");
        assert_eq!(result_field(&value, "irr"), dec!(0.10));
        assert_eq!(value["result"]["cash_flows"].as_array().unwrap().len(), 40);
    }

    #[test]
    fn test_yaml_and_json_parameters_agree_on_capital() {
        let json = load_parameters(Some(JSON_DEMO)).unwrap();
        let yaml = load_parameters(Some(YAML_DEMO)).unwrap();
        assert_eq!(json.purchase_cost, yaml.purchase_cost);
        assert_eq!(json.construction_schedule, yaml.construction_schedule);
        assert_ne!(json.other_costs_treatment, yaml.other_costs_treatment);
    }

    #[test]
    fn test_irr_solve_hits_target() {
        let value = run_irr(IrrArgs {
            input: Some(JSON_DEMO.into()),
            target_npv: Decimal::ZERO,
            lower_bound: dec!(0),
            upper_bound: dec!(10),
            report: None,
        })
        .unwrap();
        assert!(result_field(&value, "npv").abs() < dec!(1));
    }

    #[test]
    fn test_mpsp_rejects_unknown_product() {
        let err = run_mpsp(MpspArgs {
            input: Some(JSON_DEMO.into()),
            irr: None,
            product_index: 5,
            target_npv: Decimal::ZERO,
            lower_bound: dec!(0),
            upper_bound: dec!(100),
            report: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("product"));
    }

    #[test]
    fn test_defaults_lists_operating_hours() {
        let value = run_defaults().unwrap();
        let hours: Decimal = value["annual_operating_hours"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap();
        assert_eq!(hours, dec!(7884));
    }
}
