//! Currency conversion tool backed by the Frankfurter exchange-rate API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use parley_core::tools::Tool;
use parley_types::tool::{ToolError, ToolSpec};

const RATES_URL: &str = "https://api.frankfurter.app/latest";

#[derive(Debug, Deserialize)]
struct CurrencyArgs {
    from: String,
    to: String,
    #[serde(default = "default_amount")]
    amount: f64,
}

fn default_amount() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    date: String,
    rates: std::collections::HashMap<String, f64>,
}

/// ISO 4217 shape check: three ASCII letters.
fn valid_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Exchange rates and conversion between two currencies.
pub struct CurrencyTool {
    client: reqwest::Client,
    spec: ToolSpec,
    rates_url: String,
}

impl CurrencyTool {
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| ToolError::Execution(format!("client construction: {e}")))?;

        Ok(Self {
            client,
            spec: ToolSpec {
                name: "currency".to_string(),
                description: "Convert an amount between two currencies at today's rate."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "from": {
                            "type": "string",
                            "description": "Source currency code, e.g. 'EUR'"
                        },
                        "to": {
                            "type": "string",
                            "description": "Target currency code, e.g. 'USD'"
                        },
                        "amount": {
                            "type": "number",
                            "description": "Amount to convert (default 1)"
                        }
                    },
                    "required": ["from", "to"]
                }),
            },
            rates_url: RATES_URL.to_string(),
        })
    }

    /// Override the upstream URL (tests and proxies).
    #[allow(dead_code)]
    pub fn with_url(mut self, rates_url: String) -> Self {
        self.rates_url = rates_url;
        self
    }
}

impl Tool for CurrencyTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn invoke(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CurrencyArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let from = args.from.to_uppercase();
        let to = args.to.to_uppercase();
        if !valid_code(&from) || !valid_code(&to) {
            return Err(ToolError::InvalidArguments(format!(
                "currency codes must be three letters, got '{}' and '{}'",
                args.from, args.to
            )));
        }
        if from == to {
            return Ok(json!({
                "from": from,
                "to": to,
                "rate": 1.0,
                "amount": args.amount,
                "converted": args.amount,
            }));
        }

        let response = self
            .client
            .get(&self.rates_url)
            .query(&[("from", from.as_str()), ("to", to.as_str())])
            .send()
            .await
            .map_err(|e| ToolError::Upstream(format!("rates: {e}")))?
            .error_for_status()
            .map_err(|e| ToolError::Upstream(format!("rates: {e}")))?;

        let rates: RatesResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("rates body: {e}")))?;

        let rate = rates.rates.get(&to).copied().ok_or_else(|| {
            ToolError::Execution(format!("no rate published for '{from}' -> '{to}'"))
        })?;
        debug!(%from, %to, rate, date = %rates.date, "Rate fetched");

        Ok(json!({
            "from": from,
            "to": to,
            "rate": rate,
            "amount": args.amount,
            "converted": args.amount * rate,
            "date": rates.date,
        }))
    }
}
