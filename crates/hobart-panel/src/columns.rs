//! Column names of the firm-year panel.
//!
//! Names follow the Compustat Fundamentals Annual mnemonics so raw extracts
//! can be used without renaming.

/// Firm identifier.
pub const FIRM: &str = "gvkey";
/// Fiscal year.
pub const YEAR: &str = "fyear";
/// Company name.
pub const COMPANY_NAME: &str = "conm";
/// Fama-French 12 industry code.
pub const FF12: &str = "ff12_ind";
/// Fama-French 48 industry code, the estimation industry.
pub const FF48: &str = "ff48_ind";

/// Total assets.
pub const TOTAL_ASSETS: &str = "at";
/// Net sales.
pub const SALES: &str = "sale";
/// Operating activities net cash flow.
pub const OPERATING_CASH_FLOW: &str = "oancf";
/// Income before extraordinary items (cash flow statement).
pub const INCOME_CF: &str = "ibc";
/// Income before extraordinary items.
pub const INCOME: &str = "ib";
/// Accounts receivable, decrease (increase).
pub const RECEIVABLES_CHANGE: &str = "recch";
/// Inventory, decrease (increase).
pub const INVENTORY_CHANGE: &str = "invch";
/// Accounts payable and accrued liabilities, increase (decrease).
pub const PAYABLES_CHANGE: &str = "apalch";
/// Income taxes, accrued, increase (decrease).
pub const TAXES_CHANGE: &str = "txach";
/// Other assets and liabilities, net change.
pub const OTHER_CHANGE: &str = "aoloch";
/// Property, plant and equipment, gross.
pub const PPE_GROSS: &str = "ppegt";
/// Property, plant and equipment, net.
pub const PPE_NET: &str = "ppent";
/// Common shares outstanding.
pub const SHARES: &str = "csho";
/// Price at fiscal year end.
pub const PRICE: &str = "prcc_f";
/// Common equity.
pub const COMMON_EQUITY: &str = "ceq";
/// Total liabilities.
pub const LIABILITIES: &str = "lt";
/// Intangible assets.
pub const INTANGIBLES: &str = "intan";
/// Goodwill.
pub const GOODWILL: &str = "gdwl";
/// Acquisitions (investing cash flow).
pub const ACQUISITIONS: &str = "aqs";
/// Acquisitions, sales contribution.
pub const ACQUISITIONS_SALES: &str = "acqsc";
/// Cost of goods sold.
pub const COGS: &str = "cogs";
/// Interest and related expense.
pub const INTEREST: &str = "xint";

/// Industry format.
pub const INDUSTRY_FORMAT: &str = "indfmt";
/// Country of incorporation.
pub const COUNTRY: &str = "fic";
/// Header SIC code.
pub const SIC: &str = "sic";
/// Historical SIC code.
pub const SIC_HISTORICAL: &str = "sich";

/// Keys of the cross-sectional estimation unit.
pub const INDUSTRY_YEAR: [&str; 2] = [FF48, YEAR];
