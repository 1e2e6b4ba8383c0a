//! Account and transaction queries against the provider's GraphQL API.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::http::{HttpClient, HttpRequest, Method};
use crate::models::{Account, Transaction};

const OPERATION_NAME: &str = "SpendingAccountsWithTransactionsQuery";
const MAX_LOG_BODY_CHARS: usize = 512;

const ACCOUNTS_QUERY: &str = "
query SpendingAccountsWithTransactionsQuery {
  connections {
    accounts {
      name
      id
      institution { name }
      balance { current }
    }
  }
}";

fn transactions_query(account_ids: &[String], cursor: &str) -> Result<String> {
    let ids = serde_json::to_string(account_ids)?;
    let after = serde_json::to_string(cursor)?;
    Ok(format!(
        "
query SpendingAccountsWithTransactionsQuery {{
  transactionsConnection(
    filter: {{accountIds: {ids}}}
    sort: DATE_DESC
    after: {after}
  ) {{
    nodes {{
      id
      amount
      date
      description
      account {{ name id }}
      source(type: PLAID) {{
        ... on PlaidTransaction {{ checkNumber }}
      }}
    }}
    pageInfo {{ endCursor }}
  }}
}}"
    ))
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct ConnectionsData {
    connections: Vec<Connection>,
}

#[derive(Deserialize)]
struct Connection {
    accounts: Option<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsData {
    transactions_connection: TransactionsPage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsPage {
    nodes: Vec<Value>,
    page_info: Option<PageInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
}

/// Decode the `data` member, or `None` when the response has another shape.
fn data<T: DeserializeOwned>(response: Value) -> Option<T> {
    match serde_json::from_value::<GraphQlResponse<T>>(response) {
        Ok(parsed) => parsed.data,
        Err(err) => {
            tracing::warn!("unexpected response shape: {err}");
            None
        }
    }
}

/// Decode items one by one so a single bad item does not sink its siblings.
fn decode_each<T: DeserializeOwned>(items: Vec<Value>, kind: &str) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!("skipping {kind}: {err}");
                None
            }
        })
        .collect()
}

fn preview(body: &str) -> String {
    let mut out: String = body.chars().take(MAX_LOG_BODY_CHARS).collect();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        out.push_str("...");
    }
    out
}

pub struct GraphQlClient<'a> {
    http: &'a dyn HttpClient,
    url: String,
    token: String,
}

impl<'a> GraphQlClient<'a> {
    pub fn new(http: &'a dyn HttpClient, url: &str, token: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
            token: token.to_string(),
        }
    }

    /// Send one authenticated query. A non-success status or a body that is
    /// not JSON is logged and yields `None`; transport failures are errors.
    pub fn query(&self, query: &str) -> Result<Option<Value>> {
        let body = json!({
            "operationName": OPERATION_NAME,
            "query": query,
        });
        let request = HttpRequest::json(Method::Post, &self.url, &body).with_bearer(&self.token);
        let response = self.http.send(&request)?;
        if !response.is_success() {
            tracing::warn!(status = response.status, body = %preview(&response.body), "query failed");
            return Ok(None);
        }
        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!("query returned invalid JSON: {err}");
                Ok(None)
            }
        }
    }

    /// Every account across all of the user's connections. Empty when the
    /// response is missing or malformed.
    pub fn fetch_accounts(&self) -> Result<Vec<Account>> {
        let Some(response) = self.query(ACCOUNTS_QUERY)? else {
            return Ok(Vec::new());
        };
        let Some(found) = data::<ConnectionsData>(response) else {
            tracing::warn!("no accounts in response");
            return Ok(Vec::new());
        };
        let accounts: Vec<Account> = found
            .connections
            .into_iter()
            .flat_map(|c| decode_each::<Account>(c.accounts.unwrap_or_default(), "account"))
            .collect();
        tracing::info!(count = accounts.len(), "fetched accounts");
        Ok(accounts)
    }

    /// Walk the transaction pages for `account_ids`, newest first, until the
    /// server stops returning a cursor. A missing or malformed page ends the
    /// walk with whatever was collected so far.
    pub fn fetch_transactions(&self, account_ids: &[String]) -> Result<Vec<Transaction>> {
        let mut all: Vec<Transaction> = Vec::new();
        let mut cursor = String::new();
        let mut pages = 0usize;

        loop {
            let query = transactions_query(account_ids, &cursor)?;
            let Some(response) = self.query(&query)? else {
                break;
            };
            let Some(found) = data::<TransactionsData>(response) else {
                tracing::warn!(pages, "transaction page was malformed, stopping");
                break;
            };
            let page = found.transactions_connection;
            pages += 1;
            tracing::debug!(page = pages, nodes = page.nodes.len(), "fetched transaction page");
            all.extend(decode_each::<Transaction>(page.nodes, "transaction node"));

            match page.page_info.and_then(|p| p.end_cursor).filter(|c| !c.is_empty()) {
                Some(next) => cursor = next,
                None => break,
            }
        }

        tracing::info!(pages, count = all.len(), "fetched transactions");
        Ok(all)
    }
}
