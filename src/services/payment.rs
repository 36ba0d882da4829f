//! payment.rs
//!
//! Разбор формы оплаты записи: суммы вводятся свободным текстом
//! ("200 000"), недостающие части достраиваются, в заметку записи
//! добавляется строка с разбивкой, а в CRM уходит платёж.

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::models::payment::PaymentStatus;
use crate::models::{BookingEvent, PaymentCreate};

/// Поля формы оплаты в том виде, в котором их ввёл администратор.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub cash: String,
    #[serde(default)]
    pub card: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentBreakdown {
    pub total: i64,
    pub cash: i64,
    pub card: i64,
}

/// Верхняя граница одного платежа, в сумах.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

fn too_large() -> BoardError {
    BoardError::BadRequest(format!(
        "Сумма оплаты превышает {} сум",
        format_amount(MAX_AMOUNT)
    ))
}

fn parse_amount(field: &str, input: &str) -> Result<i64, BoardError> {
    let clean: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if clean.is_empty() {
        return Ok(0);
    }
    match clean.parse::<i64>() {
        Ok(value) if value > MAX_AMOUNT => Err(too_large()),
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(BoardError::BadRequest(format!(
            "Сумма \"{}\" в поле {} не является числом",
            input.trim(),
            field
        ))),
    }
}

/// Группирует разряды пробелами: 1250000 -> "1 250 000".
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

impl PaymentBreakdown {
    /// Если общая сумма пуста, она равна сумме частей.
    /// Если указана только общая сумма, вся она считается наличными.
    pub fn from_form(form: &PaymentForm) -> Result<Self, BoardError> {
        let mut total = parse_amount("total", &form.total)?;
        let mut cash = parse_amount("cash", &form.cash)?;
        let card = parse_amount("card", &form.card)?;

        if total == 0 && (cash > 0 || card > 0) {
            total = cash
                .checked_add(card)
                .filter(|sum| *sum <= MAX_AMOUNT)
                .ok_or_else(too_large)?;
        }
        if total > 0 && cash == 0 && card == 0 {
            cash = total;
        }
        if total == 0 {
            return Err(BoardError::BadRequest("Укажите сумму оплаты".to_string()));
        }

        Ok(Self { total, cash, card })
    }

    /// "Оплата: 200 000 сум (наличные 150 000 сум, карта 50 000 сум)"
    pub fn note(&self) -> String {
        let mut parts = Vec::new();
        if self.cash > 0 {
            parts.push(format!("наличные {} сум", format_amount(self.cash)));
        }
        if self.card > 0 {
            parts.push(format!("карта {} сум", format_amount(self.card)));
        }
        let breakdown = if parts.is_empty() {
            String::new()
        } else {
            format!(" ({})", parts.join(", "))
        };
        format!("Оплата: {} сум{}", format_amount(self.total), breakdown)
    }

    pub fn append_to(&self, note: Option<&str>) -> String {
        match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(existing) => format!("{} · {}", existing, self.note()),
            None => self.note(),
        }
    }

    pub fn to_payment(
        &self,
        event: &BookingEvent,
        category: Option<&str>,
        client_id: Option<String>,
    ) -> PaymentCreate {
        PaymentCreate {
            client_id,
            client_name: event.clients.first().cloned(),
            client_phone: event.phone.clone(),
            service_name: event.title.clone(),
            service_category: category.map(str::to_string),
            total_amount: self.total,
            cash_amount: self.cash,
            transfer_amount: self.card,
            quantity: 1,
            hours: None,
            comment: Some(self.note()),
            status: PaymentStatus::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(total: &str, cash: &str, card: &str) -> PaymentForm {
        PaymentForm {
            total: total.into(),
            cash: cash.into(),
            card: card.into(),
        }
    }

    #[test]
    fn total_only_is_cash() {
        let b = PaymentBreakdown::from_form(&form("200 000", "", "")).unwrap();
        assert_eq!(b, PaymentBreakdown { total: 200_000, cash: 200_000, card: 0 });
        assert_eq!(b.note(), "Оплата: 200 000 сум (наличные 200 000 сум)");
    }

    #[test]
    fn parts_sum_into_total() {
        let b = PaymentBreakdown::from_form(&form("", "150 000", "50000")).unwrap();
        assert_eq!(b.total, 200_000);
        assert_eq!(
            b.note(),
            "Оплата: 200 000 сум (наличные 150 000 сум, карта 50 000 сум)"
        );
    }

    #[test]
    fn card_only_payment_keeps_cash_empty() {
        let b = PaymentBreakdown::from_form(&form("", "", "90 000")).unwrap();
        assert_eq!(b.cash, 0);
        assert_eq!(b.note(), "Оплата: 90 000 сум (карта 90 000 сум)");
    }

    #[test]
    fn note_is_appended_after_existing_text() {
        let b = PaymentBreakdown::from_form(&form("1000", "", "")).unwrap();
        assert_eq!(
            b.append_to(Some("Постоянный клиент")),
            "Постоянный клиент · Оплата: 1 000 сум (наличные 1 000 сум)"
        );
        assert_eq!(b.append_to(Some("  ")), b.note());
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(PaymentBreakdown::from_form(&form("", "", "")).is_err());
        assert!(PaymentBreakdown::from_form(&form("сто", "", "")).is_err());
        assert!(PaymentBreakdown::from_form(&form("-5", "", "")).is_err());
    }

    #[test]
    fn huge_amounts_are_rejected_instead_of_wrapping() {
        let max = i64::MAX.to_string();
        assert!(matches!(
            PaymentBreakdown::from_form(&form("", &max, "1")),
            Err(BoardError::BadRequest(_))
        ));
        assert!(PaymentBreakdown::from_form(&form(&max, "", "")).is_err());

        let half = (MAX_AMOUNT / 2 + 1).to_string();
        assert!(PaymentBreakdown::from_form(&form("", &half, &half)).is_err());

        let b = PaymentBreakdown::from_form(&form("", &MAX_AMOUNT.to_string(), "")).unwrap();
        assert_eq!(b.total, MAX_AMOUNT);
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1_250_000), "1 250 000");
    }
}
