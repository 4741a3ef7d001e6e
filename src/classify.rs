/// Operator and connector classification of free-text feed fields.

use crate::model::{ConnectorType, Operator};
use crate::registry::{find_operator_pattern, CONNECTOR_PATTERNS};

/// Classifies one free-text field. Matching is case-insensitive and the
/// first pattern in `OPERATOR_PATTERNS` that matches wins.
pub fn classify_operator(text: &str) -> Operator {
    let upper = text.trim().to_uppercase();
    if upper.is_empty() {
        return Operator::Other;
    }
    find_operator_pattern(&upper)
        .map(|p| p.operator)
        .unwrap_or(Operator::Other)
}

/// Classifies a station from its `owned_by`, `name` and `user_comment`
/// fields, in that order, stopping at the first field naming a known
/// operator.
pub fn classify_station_owner(owned_by: &str, name: &str, user_comment: &str) -> Operator {
    [owned_by, name, user_comment]
        .into_iter()
        .map(classify_operator)
        .find(|op| op.is_known())
        .unwrap_or(Operator::Other)
}

/// Classifies one connector-type attribute text.
pub fn classify_connector(text: &str) -> ConnectorType {
    let upper = text.to_uppercase();
    CONNECTOR_PATTERNS
        .iter()
        .find(|(pattern, _)| upper.contains(pattern))
        .map(|(_, ty)| *ty)
        .unwrap_or(ConnectorType::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_by_takes_priority_over_name() {
        let owner = classify_station_owner("Recharge Infrastructure", "Clever Lysaker", "");
        assert_eq!(owner, Operator::Fortum);
    }

    #[test]
    fn test_falls_back_to_name_then_comment() {
        assert_eq!(
            classify_station_owner("Oslo kommune", "Ionity Dal", ""),
            Operator::Ionity
        );
        assert_eq!(
            classify_station_owner("", "Rema 1000 Sandvika", "Drives av Grønn Kontakt"),
            Operator::GronnKontakt
        );
        assert_eq!(
            classify_station_owner("Ukjent", "Parkering", "Ingen kommentar"),
            Operator::Other
        );
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(classify_operator("clever as"), Operator::Clever);
        assert_eq!(classify_operator("grønn kontakt"), Operator::GronnKontakt);
        assert_eq!(classify_operator("Tesla Motors Norway"), Operator::Tesla);
        assert_eq!(classify_operator("E.ON Drive"), Operator::Eon);
        assert_eq!(classify_operator("  Mer "), Operator::GronnKontakt);
    }

    #[test]
    fn test_empty_field_is_other() {
        assert_eq!(classify_operator(""), Operator::Other);
        assert_eq!(classify_operator("   "), Operator::Other);
    }

    #[test]
    fn test_connector_patterns() {
        assert_eq!(classify_connector("CCS/Combo"), ConnectorType::Ccs);
        assert_eq!(classify_connector("CHAdeMO"), ConnectorType::Chademo);
        assert_eq!(classify_connector("Type 2 Mennekes"), ConnectorType::Type2);
        assert_eq!(classify_connector("Tesla Connector Model S"), ConnectorType::Tesla);
        assert_eq!(classify_connector("Schuko CEE 7/4"), ConnectorType::Other);
        assert_eq!(classify_connector(""), ConnectorType::Other);
    }
}
