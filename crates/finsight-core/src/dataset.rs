use serde::{Deserialize, Serialize, Serializer};

/// One fiscal quarter of reported figures. Currency amounts are whole dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetric {
    pub period: String,
    pub revenue: u64,
    pub net_income: u64,
    pub expenses: u64,
    #[serde(serialize_with = "serialize_percent")]
    pub profit_margin: f64,
}

/// Whole percentages are written without a fraction (`20`, not `20.0`)
fn serialize_percent<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl FinancialMetric {
    fn new(period: &str, revenue: u64, net_income: u64, expenses: u64, profit_margin: f64) -> Self {
        Self {
            period: period.to_string(),
            revenue,
            net_income,
            expenses,
            profit_margin,
        }
    }
}

/// Suggestion chips shown under the chat
pub const PREDEFINED_QUERIES: [&str; 4] = [
    "What is the total revenue for 2023?",
    "How has net income changed over the year?",
    "Show me the expense trend.",
    "Which quarter had the highest profit margin?",
];

/// The analyzed quarterly figures. Built once at startup and never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    fiscal_year: u16,
    records: Vec<FinancialMetric>,
}

impl Dataset {
    pub fn fiscal_2023() -> Self {
        Self {
            fiscal_year: 2023,
            records: vec![
                FinancialMetric::new("Q1 2023", 1_200_000, 150_000, 1_050_000, 12.5),
                FinancialMetric::new("Q2 2023", 1_350_000, 210_000, 1_140_000, 15.5),
                FinancialMetric::new("Q3 2023", 1_100_000, 90_000, 1_010_000, 8.1),
                FinancialMetric::new("Q4 2023", 1_600_000, 320_000, 1_280_000, 20.0),
            ],
        }
    }

    pub fn records(&self) -> &[FinancialMetric] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fiscal_year_label(&self) -> String {
        format!("fiscal year {}", self.fiscal_year)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiscal_2023_has_four_ordered_quarters() {
        let data = Dataset::fiscal_2023();
        let periods: Vec<&str> = data.records().iter().map(|m| m.period.as_str()).collect();
        assert_eq!(periods, vec!["Q1 2023", "Q2 2023", "Q3 2023", "Q4 2023"]);
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn test_expenses_plus_income_equal_revenue() {
        for m in Dataset::fiscal_2023().records() {
            assert_eq!(m.expenses + m.net_income, m.revenue, "{}", m.period);
        }
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = Dataset::fiscal_2023().to_json().unwrap();
        assert!(json.starts_with(r#"[{"period":"Q1 2023","revenue":1200000,"netIncome":150000"#));
        assert!(json.contains(r#""profitMargin":12.5"#));
    }

    #[test]
    fn test_json_numbers_have_no_spurious_fractions() {
        let json = Dataset::fiscal_2023().to_json().unwrap();
        assert!(json.ends_with(r#""expenses":1280000,"profitMargin":20}]"#));
        assert!(!json.contains(".0,"));
        assert!(!json.contains(".0}"));
    }
}
