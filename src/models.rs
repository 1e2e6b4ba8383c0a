use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A cached session token and when it was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// An account as returned by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub institution: Option<Institution>,
    #[serde(default)]
    pub balance: Option<Balance>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Institution {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    pub current: Option<Decimal>,
}

impl Account {
    pub fn institution_name(&self) -> &str {
        self.institution.as_ref().map(|i| i.name.as_str()).unwrap_or("")
    }

    pub fn current_balance(&self) -> Option<Decimal> {
        self.balance.as_ref().and_then(|b| b.current)
    }
}

/// A transaction node as returned by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub account: AccountRef,
    #[serde(default)]
    pub source: Option<TransactionSource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountRef {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSource {
    #[serde(default)]
    pub check_number: Option<String>,
}

impl Transaction {
    pub fn check_number(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.check_number.as_deref())
    }
}

/// One AutoCategory row. Rules are evaluated in sheet order.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub pattern: regex::Regex,
    pub category: String,
    pub sub_category: String,
}
