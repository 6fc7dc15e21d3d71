//! Parser type names to datastore field types

use datapusher_common::{Field, TargetType};

use crate::format::ParsedField;

/// Translate a parser column type name.
///
/// Integers map to `numeric` rather than a fixed-width integer so that large
/// values cannot overflow the column. Unknown names map to `None`, which the
/// datastore treats as its default type.
pub fn map_type_name(type_name: &str) -> Option<TargetType> {
    match type_name {
        "String" => Some(TargetType::Text),
        "Integer" => Some(TargetType::Numeric),
        "Float" => Some(TargetType::Float),
        "Decimal" => Some(TargetType::Numeric),
        "DateTime" => Some(TargetType::Timestamp),
        _ => None,
    }
}

/// Datastore fields for a parsed column list, in column order
pub fn datastore_fields(columns: &[ParsedField]) -> Vec<Field> {
    columns
        .iter()
        .map(|c| Field::new(c.id.clone(), map_type_name(&c.type_name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_type_names() {
        assert_eq!(map_type_name("String"), Some(TargetType::Text));
        assert_eq!(map_type_name("Integer"), Some(TargetType::Numeric));
        assert_eq!(map_type_name("Float"), Some(TargetType::Float));
        assert_eq!(map_type_name("Decimal"), Some(TargetType::Numeric));
        assert_eq!(map_type_name("DateTime"), Some(TargetType::Timestamp));
    }

    #[test]
    fn test_unknown_type_names_have_no_type() {
        assert_eq!(map_type_name("Boolean"), None);
        assert_eq!(map_type_name("integer"), None);
        assert_eq!(map_type_name(""), None);
    }

    #[test]
    fn test_datastore_fields_keep_order() {
        let columns = vec![
            ParsedField::new("when", "DateTime"),
            ParsedField::new("flag", "Boolean"),
            ParsedField::new("count", "Integer"),
        ];

        let fields = datastore_fields(&columns);
        let ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["when", "flag", "count"]);
        assert_eq!(fields[0].field_type, Some(TargetType::Timestamp));
        assert_eq!(fields[1].field_type, None);
        assert_eq!(fields[2].field_type, Some(TargetType::Numeric));
    }
}
