// ₹ Currency display - Indian digit grouping (12,34,567)

/// Rupees in one lakh
pub const RUPEES_PER_LAKH: f64 = 100_000.0;

/// Group digits the Indian way: last three, then pairs.
///
/// `9817500` → `98,17,500`
pub fn group_indian(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// `₹ 98,17,500`
pub fn format_inr(amount: u64) -> String {
    format!("₹ {}", group_indian(amount))
}

/// Backend prices arrive in lakh, shown whole and grouped: `₹ 1,235 lakh`
pub fn format_lakh(lakh: f64) -> String {
    if !lakh.is_finite() || lakh <= 0.0 {
        return "₹ 0 lakh".to_string();
    }
    format!("₹ {} lakh", group_indian(lakh.round() as u64))
}

pub fn rupees_to_lakh(rupees: u64) -> f64 {
    (rupees as f64 / RUPEES_PER_LAKH * 100.0).round() / 100.0
}

pub fn lakh_to_rupees(lakh: f64) -> u64 {
    if !lakh.is_finite() || lakh <= 0.0 {
        return 0;
    }
    (lakh * RUPEES_PER_LAKH).round() as u64
}
