use crate::error::ConvertError;
use crate::formats::schema::FormatSpec;
use crate::formats::validate_format;

const ABC_DEBIT_JSON: &str = include_str!("../../../../formats/abc-debit.json");
const BOC_CREDIT_JSON: &str = include_str!("../../../../formats/boc-credit.json");
const BOC_DEBIT_JSON: &str = include_str!("../../../../formats/boc-debit.json");
const BOCOM_CREDIT_JSON: &str = include_str!("../../../../formats/bocom-credit.json");
const BOCOM_DEBIT_JSON: &str = include_str!("../../../../formats/bocom-debit.json");
const CMB_CREDIT_JSON: &str = include_str!("../../../../formats/cmb-credit.json");
const CMB_DEBIT_JSON: &str = include_str!("../../../../formats/cmb-debit.json");

/// Built-in format keys.
pub const BUILTIN_KEYS: &[&str] = &[
    "abc_debit",
    "boc_credit",
    "boc_debit",
    "bocom_credit",
    "bocom_debit",
    "cmb_credit",
    "cmb_debit",
];

/// Load a built-in format by key.
pub fn load_builtin(key: &str) -> Result<FormatSpec, ConvertError> {
    let json = match key {
        "abc_debit" => ABC_DEBIT_JSON,
        "boc_credit" => BOC_CREDIT_JSON,
        "boc_debit" => BOC_DEBIT_JSON,
        "bocom_credit" => BOCOM_CREDIT_JSON,
        "bocom_debit" => BOCOM_DEBIT_JSON,
        "cmb_credit" => CMB_CREDIT_JSON,
        "cmb_debit" => CMB_DEBIT_JSON,
        _ => {
            return Err(ConvertError::UnknownAdapter(format!(
                "{}. Available: {}",
                key,
                BUILTIN_KEYS.join(", ")
            )))
        }
    };
    let spec: FormatSpec = serde_json::from_str(json)?;
    validate_format(&spec)?;
    Ok(spec)
}
