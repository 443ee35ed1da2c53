// Path: crates/cli/src/testing/account.rs

use super::exec::{CommandOutput, CommandRunner, NodeCli};
use super::status::{decode_json, u64_from_str_or_int};
use crate::error::CliError;
use pylons_test_utils::{fields, Fields, TestContext, TestHandle};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct BaseAccount {
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "u64_from_str_or_int")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_int")]
    pub sequence: u64,
    #[serde(default)]
    pub pub_key: Option<serde_json::Value>,
}

// Legacy amino output wraps the account as {"type": .., "value": {..}}.
#[derive(Deserialize)]
#[serde(untagged)]
enum AccountJson {
    Amino { value: BaseAccount },
    Plain(BaseAccount),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Balances {
    #[serde(default)]
    pub balances: Vec<Coin>,
}

impl Balances {
    /// Amount held in `denom`; zero when the denom is absent.
    pub fn amount_of(&self, denom: &str) -> Option<u128> {
        match self.balances.iter().find(|coin| coin.denom == denom) {
            Some(coin) => coin.amount.parse().ok(),
            None => Some(0),
        }
    }
}

pub fn decode_account(bytes: &[u8]) -> Result<BaseAccount, CliError> {
    decode_json::<AccountJson>("account", bytes).map(|json| match json {
        AccountJson::Amino { value } => value,
        AccountJson::Plain(account) => account,
    })
}

/// Fails the test on a command error, attaching the call log.
#[track_caller]
fn require_output<H: TestHandle>(
    t: &TestContext<H>,
    fields: Fields,
    result: Result<CommandOutput, CliError>,
) -> CommandOutput {
    let log = match &result {
        Ok(output) => output.log.clone(),
        Err(err) => err.command_log().unwrap_or_default().to_string(),
    };
    t.with_fields(fields.with("log", &log)).must_be_ok(result)
}

impl<R: CommandRunner> NodeCli<R> {
    /// Address of the local key `account`.
    #[track_caller]
    pub fn get_account_addr<H: TestHandle>(&self, account: &str, t: &TestContext<H>) -> String {
        let output = require_output(
            t,
            fields! { "account" => account },
            self.invoke(&["keys", "show", account, "-a"], ""),
        );
        output
            .text()
            .trim_matches(|c| c == '\n' || c == ' ')
            .to_string()
    }

    #[track_caller]
    pub fn get_account_info_from_addr<H: TestHandle>(
        &self,
        addr: &str,
        t: &TestContext<H>,
    ) -> BaseAccount {
        let output = require_output(
            t,
            fields! { "address" => addr },
            self.invoke(&["query", "account", addr], ""),
        );
        t.with_fields(fields! { "acc_bytes" => output.text() })
            .must_be_ok(decode_account(&output.output))
    }

    #[track_caller]
    pub fn get_account_info_from_name<H: TestHandle>(
        &self,
        account: &str,
        t: &TestContext<H>,
    ) -> BaseAccount {
        let addr = self.get_account_addr(account, t);
        self.get_account_info_from_addr(&addr, t)
    }

    #[track_caller]
    pub fn get_account_balance_from_addr<H: TestHandle>(
        &self,
        addr: &str,
        t: &TestContext<H>,
    ) -> Balances {
        let output = require_output(
            t,
            fields! { "address" => addr },
            self.invoke(&["query", "bank", "balances", addr], ""),
        );
        t.with_fields(fields! { "acc_bytes" => output.text() })
            .must_be_ok(decode_json("balances", &output.output))
    }
}
