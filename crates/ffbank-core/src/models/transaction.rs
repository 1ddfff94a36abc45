//! Balance and transfer history as returned by the bank API.

use serde::{Deserialize, Serialize};

use crate::utils::{format_currency, format_date};

/// Transfer type the API uses for money coming in.
const INCOMING_KIND: &str = "recebida";

/// Response of `GET /contas/saldo`.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(rename = "saldo", default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

/// The other side of a transfer.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    #[serde(rename = "apelido", default)]
    pub nickname: String,
    #[serde(rename = "nome", default)]
    pub name: String,
}

/// Which way the money moved, from the signed-in user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A single entry from `GET /transferencias`.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "contraparte", default)]
    pub counterparty: Counterparty,
    #[serde(rename = "data", default)]
    pub date: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "tipo", default)]
    pub kind: String,
    #[serde(rename = "valor", default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

// Amounts arrive as JSON numbers or as numeric strings ("1500.75", "1500,75")
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct AmountVisitor;

    impl<'de> de::Visitor<'de> for AmountVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number or numeric string")
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v as f64)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v as f64)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(0.0)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

impl Transaction {
    pub fn direction(&self) -> Direction {
        if self.kind == INCOMING_KIND {
            Direction::Incoming
        } else {
            Direction::Outgoing
        }
    }

    /// Signed amount for display, e.g. `+R$ 10,00` or `-R$ 3,50`.
    pub fn signed_amount(&self) -> String {
        let sign = match self.direction() {
            Direction::Incoming => '+',
            Direction::Outgoing => '-',
        };
        format!("{}{}", sign, format_currency(self.amount))
    }

    /// `From: x` for incoming transfers, `To: x` for outgoing ones.
    pub fn counterparty_label(&self) -> String {
        match self.direction() {
            Direction::Incoming => format!("From: {}", self.counterparty.nickname),
            Direction::Outgoing => format!("To: {}", self.counterparty.nickname),
        }
    }

    pub fn display_date(&self) -> String {
        format_date(&self.date)
    }

    /// Multi-line summary shown when a transaction is opened.
    pub fn details(&self) -> String {
        format!(
            "Transaction: {}\nAmount: {}\nDate: {}",
            self.description,
            format_currency(self.amount),
            self.display_date()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transactions() -> Vec<Transaction> {
        let json = r#"[
            {
                "categoria": "pix",
                "contraparte": {"apelido": "maria", "nome": "Maria Lima"},
                "data": "2025-03-07T14:30:00.000Z",
                "descricao": "Almoço",
                "id": 1,
                "tipo": "recebida",
                "valor": 42.5
            },
            {
                "categoria": "pix",
                "contraparte": {"apelido": "joao", "nome": "João Alves"},
                "data": "2025-03-08T09:00:00.000Z",
                "descricao": "Aluguel",
                "id": 2,
                "tipo": "enviada",
                "valor": 1200
            }
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_transactions() {
        let txs = sample_transactions();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].counterparty.name, "Maria Lima");
        assert_eq!(txs[1].amount, 1200.0);
    }

    #[test]
    fn test_direction_and_labels() {
        let txs = sample_transactions();
        assert_eq!(txs[0].direction(), Direction::Incoming);
        assert_eq!(txs[0].signed_amount(), "+R$ 42,50");
        assert_eq!(txs[0].counterparty_label(), "From: maria");

        assert_eq!(txs[1].direction(), Direction::Outgoing);
        assert_eq!(txs[1].signed_amount(), "-R$ 1200,00");
        assert_eq!(txs[1].counterparty_label(), "To: joao");
    }

    #[test]
    fn test_details() {
        let txs = sample_transactions();
        assert_eq!(
            txs[0].details(),
            format!(
                "Transaction: Almoço\nAmount: R$ 42,50\nDate: {}",
                format_date("2025-03-07T14:30:00.000Z")
            )
        );
    }

    #[test]
    fn test_parse_balance() {
        let balance: Balance = serde_json::from_str(r#"{"saldo": 1500.75}"#).unwrap();
        assert_eq!(balance.amount, 1500.75);
    }

    #[test]
    fn test_parse_balance_from_string() {
        let balance: Balance = serde_json::from_str(r#"{"saldo": "1500.75"}"#).unwrap();
        assert_eq!(balance.amount, 1500.75);

        let balance: Balance = serde_json::from_str(r#"{"saldo": "1500,75"}"#).unwrap();
        assert_eq!(balance.amount, 1500.75);

        let balance: Balance = serde_json::from_str(r#"{"saldo": null}"#).unwrap();
        assert_eq!(balance.amount, 0.0);
    }

    #[test]
    fn test_parse_transaction_with_string_amount() {
        let json = r#"[{"id": 3, "tipo": "enviada", "valor": "99.90"}]"#;
        let txs: Vec<Transaction> = serde_json::from_str(json).unwrap();
        assert_eq!(txs[0].amount, 99.9);
        assert_eq!(txs[0].signed_amount(), "-R$ 99,90");
    }

    #[test]
    fn test_parse_balance_rejects_non_numeric_string() {
        assert!(serde_json::from_str::<Balance>(r#"{"saldo": "lots"}"#).is_err());
        assert!(serde_json::from_str::<Balance>(r#"{"saldo": true}"#).is_err());
    }
}
