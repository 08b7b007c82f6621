mod usdt;

pub mod op;
mod secret;

pub use secret::Secret;
pub use usdt::{UsdtAmount, UsdtConversionError, USDT_CURRENCY_CODE, USDT_CURRENCY_CODE_LOWER, USDT_DECIMALS};
