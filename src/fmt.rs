/// Format an amount as dollars with thousands separators: $1,234.56
pub fn money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as i64;
    let dollars = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i != 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{sign}${grouped}.{fraction:02}")
}

/// Money with an explicit currency code: $1,234.56 CAD
pub fn money_in(amount: f64, currency: &str) -> String {
    format!("{} {currency}", money(amount))
}
